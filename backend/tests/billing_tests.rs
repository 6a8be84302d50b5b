//! Billing engine tests
//!
//! Covers bill totals and profit, the stock-reservation round trip across
//! create/edit/delete, and the net-delta arithmetic behind bill edits.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

use shared::{
    bill_deletion_movement, edit_deltas, suggested_sell_price, total_purchase_cost, BillLineItem,
    LogReason, QuotedLine,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn quoted(item_id: Uuid, qty: i64, sell: &str, cost: &str) -> QuotedLine {
    QuotedLine {
        item_id,
        item_name: "item".to_string(),
        quantity: qty,
        selling_price: dec(sell),
        purchase_price: dec(cost),
    }
}

fn line(item_id: Uuid, qty: i64) -> BillLineItem {
    BillLineItem {
        item_id,
        item_name: "item".to_string(),
        quantity: qty,
        selling_price: dec("80"),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    /// The worked example: 10 on hand at cost 50, one bill of 3 sold for a
    /// total of 240, then deleted.
    #[test]
    fn create_then_delete_round_trip() {
        let item = Uuid::new_v4();
        let mut on_hand = 10i64;
        let purchase_price = dec("50");

        // Create: snapshot, reserve, compute profit
        let quotes = vec![quoted(item, 3, "80", "50")];
        let cost = total_purchase_cost(&quotes);
        let total_sell = dec("240");
        let profit = total_sell - cost;
        on_hand -= 3;

        assert_eq!(on_hand, 7);
        assert_eq!(cost, dec("150"));
        assert_eq!(profit, dec("90"));

        // Delete: stock returns, reversal logged at current purchase price
        on_hand += 3;
        let reversal = bill_deletion_movement(purchase_price, 3);

        assert_eq!(on_hand, 10);
        assert_eq!(reversal.reason, LogReason::BillDeletionReversal);
        assert_eq!(reversal.quantity_change, 3);
        assert_eq!(reversal.purchase_cost_change, dec("150"));
    }

    #[test]
    fn persisted_lines_carry_no_purchase_price() {
        let quotes = vec![quoted(Uuid::new_v4(), 2, "80", "50")];
        let lines: Vec<BillLineItem> = quotes.into_iter().map(QuotedLine::into_line).collect();

        // The line type has no cost field at all; only the sell side survives
        assert_eq!(lines[0].selling_price, dec("80"));
        assert_eq!(lines[0].quantity, 2);
    }

    #[test]
    fn suggested_price_sums_the_sell_side() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let quotes = vec![quoted(a, 3, "80", "50"), quoted(b, 1, "120", "90")];

        assert_eq!(suggested_sell_price(&quotes), dec("360"));
        assert_eq!(total_purchase_cost(&quotes), dec("240"));
    }

    #[test]
    fn at_cost_sale_has_zero_profit() {
        let quotes = vec![quoted(Uuid::new_v4(), 4, "80", "50")];
        let cost = total_purchase_cost(&quotes);

        // Selling at cost: the override equals the purchase total
        let profit = cost - cost;
        assert_eq!(profit, Decimal::ZERO);
    }

    #[test]
    fn editing_to_identical_lines_is_a_net_noop() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lines = vec![line(a, 3), line(b, 2)];

        assert!(edit_deltas(&lines, &lines).is_empty());
    }

    #[test]
    fn edit_releases_dropped_lines_and_reserves_new_ones() {
        let kept = Uuid::new_v4();
        let dropped = Uuid::new_v4();
        let added = Uuid::new_v4();

        let original = vec![line(kept, 3), line(dropped, 2)];
        let updated = vec![line(kept, 5), line(added, 1)];

        let deltas = edit_deltas(&original, &updated);
        assert_eq!(deltas.get(&kept), Some(&-2));
        assert_eq!(deltas.get(&dropped), Some(&2));
        assert_eq!(deltas.get(&added), Some(&-1));
    }

    #[test]
    fn repeated_item_lines_are_netted_together() {
        let item = Uuid::new_v4();
        let original = vec![line(item, 2), line(item, 3)];
        let updated = vec![line(item, 5)];

        assert!(edit_deltas(&original, &updated).is_empty());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100_000).prop_map(|n| Decimal::new(n, 2))
    }

    fn lines_strategy() -> impl Strategy<Value = Vec<(u8, i64)>> {
        // Item identities drawn from a small pool so edits overlap
        prop::collection::vec(((0u8..5), (1i64..=10)), 1..8)
    }

    /// Materialize (pool index, qty) pairs against a fixed item-id pool
    fn materialize(pool: &[Uuid], spec: &[(u8, i64)]) -> Vec<BillLineItem> {
        spec.iter()
            .map(|(idx, qty)| line(pool[*idx as usize], *qty))
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Profit is exactly the override minus the cost of goods
        #[test]
        fn profit_is_sell_minus_cost(
            qty in 1i64..=100,
            sell in price_strategy(),
            cost in price_strategy(),
            override_total in price_strategy()
        ) {
            let quotes = vec![QuotedLine {
                item_id: Uuid::new_v4(),
                item_name: "item".to_string(),
                quantity: qty,
                selling_price: sell,
                purchase_price: cost,
            }];

            let total_cost = total_purchase_cost(&quotes);
            let profit = override_total - total_cost;

            prop_assert_eq!(total_cost, cost * Decimal::from(qty));
            prop_assert_eq!(profit + total_cost, override_total);
        }

        /// Creating a bill and then deleting it restores every item's
        /// quantity to its pre-creation value
        #[test]
        fn create_delete_round_trips_stock(
            spec in lines_strategy(),
            initial in 100i64..=200
        ) {
            let pool: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
            let lines = materialize(&pool, &spec);

            let mut stock: BTreeMap<Uuid, i64> =
                pool.iter().map(|id| (*id, initial)).collect();

            // Reserve on create
            for l in &lines {
                *stock.get_mut(&l.item_id).unwrap() -= l.quantity;
            }
            // Release on delete
            for l in &lines {
                *stock.get_mut(&l.item_id).unwrap() += l.quantity;
            }

            for id in &pool {
                prop_assert_eq!(stock[id], initial);
            }
        }

        /// Applying edit deltas is equivalent to releasing the old
        /// reservation and taking the new one
        #[test]
        fn edit_deltas_equal_release_then_reserve(
            old_spec in lines_strategy(),
            new_spec in lines_strategy(),
            initial in 100i64..=200
        ) {
            let pool: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
            let original = materialize(&pool, &old_spec);
            let updated = materialize(&pool, &new_spec);

            // Path 1: apply the net deltas
            let mut via_deltas: BTreeMap<Uuid, i64> =
                pool.iter().map(|id| (*id, initial)).collect();
            for (id, delta) in edit_deltas(&original, &updated) {
                *via_deltas.get_mut(&id).unwrap() += delta;
            }

            // Path 2: release everything, then reserve the new lines
            let mut via_two_steps: BTreeMap<Uuid, i64> =
                pool.iter().map(|id| (*id, initial)).collect();
            for l in &original {
                *via_two_steps.get_mut(&l.item_id).unwrap() += l.quantity;
            }
            for l in &updated {
                *via_two_steps.get_mut(&l.item_id).unwrap() -= l.quantity;
            }

            prop_assert_eq!(via_deltas, via_two_steps);
        }

        /// The reversal entry always matches the deleted line exactly
        #[test]
        fn reversal_entry_matches_line(
            qty in 1i64..=100,
            price in price_strategy()
        ) {
            let movement = bill_deletion_movement(price, qty);
            prop_assert_eq!(movement.quantity_change, qty);
            prop_assert_eq!(movement.purchase_cost_change, price * Decimal::from(qty));
        }
    }
}
