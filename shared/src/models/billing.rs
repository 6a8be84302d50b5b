//! Bill models and billing arithmetic
//!
//! A bill is a reservation of stock: creating one decrements item
//! quantities, editing re-reserves, deleting releases. Persisted line items
//! deliberately omit the purchase price; the cost side lives only in the
//! bill totals and in the inventory ledger.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment modes accepted at the counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Upi,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Upi => "upi",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMode::Cash),
            "upi" => Some(PaymentMode::Upi),
            _ => None,
        }
    }
}

/// Whether a bill has been settled; orthogonal to stock reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Unpaid => "unpaid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "paid" => Some(PaymentStatus::Paid),
            "unpaid" => Some(PaymentStatus::Unpaid),
            _ => None,
        }
    }
}

/// A persisted bill line: a snapshot taken at bill-write time.
/// The purchase price is stripped before persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillLineItem {
    pub item_id: Uuid,
    pub item_name: String,
    pub quantity: i64,
    pub selling_price: Decimal,
}

/// A bill line as quoted from the inventory at write time, purchase price
/// still attached for cost computation
#[derive(Debug, Clone, PartialEq)]
pub struct QuotedLine {
    pub item_id: Uuid,
    pub item_name: String,
    pub quantity: i64,
    pub selling_price: Decimal,
    pub purchase_price: Decimal,
}

impl QuotedLine {
    /// Strip the purchase price for persistence
    pub fn into_line(self) -> BillLineItem {
        BillLineItem {
            item_id: self.item_id,
            item_name: self.item_name,
            quantity: self.quantity,
            selling_price: self.selling_price,
        }
    }
}

/// A persisted bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: Uuid,
    pub items: Vec<BillLineItem>,
    pub total_purchase_cost: Decimal,
    pub total_sell_price: Decimal,
    pub profit: Decimal,
    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_edited_by: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Cost of goods for a set of quoted lines
pub fn total_purchase_cost(lines: &[QuotedLine]) -> Decimal {
    lines
        .iter()
        .map(|l| l.purchase_price * Decimal::from(l.quantity))
        .sum()
}

/// The sell price suggested to the biller before any override
pub fn suggested_sell_price(lines: &[QuotedLine]) -> Decimal {
    lines
        .iter()
        .map(|l| l.selling_price * Decimal::from(l.quantity))
        .sum()
}

/// Net per-item stock deltas for a bill edit.
///
/// Positive means stock returns to the shelf, negative means more is
/// reserved. An item appearing on both sides contributes its old quantity
/// minus its new quantity. Items whose net change is zero are omitted, so
/// editing a bill back to its own lines yields an empty map.
pub fn edit_deltas(original: &[BillLineItem], updated: &[BillLineItem]) -> BTreeMap<Uuid, i64> {
    let mut deltas: BTreeMap<Uuid, i64> = BTreeMap::new();
    for line in original {
        *deltas.entry(line.item_id).or_insert(0) += line.quantity;
    }
    for line in updated {
        *deltas.entry(line.item_id).or_insert(0) -= line.quantity;
    }
    deltas.retain(|_, d| *d != 0);
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn quoted(id: Uuid, qty: i64, sell: &str, cost: &str) -> QuotedLine {
        QuotedLine {
            item_id: id,
            item_name: "widget".to_string(),
            quantity: qty,
            selling_price: dec(sell),
            purchase_price: dec(cost),
        }
    }

    #[test]
    fn totals_sum_over_lines() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lines = vec![quoted(a, 3, "80", "50"), quoted(b, 2, "120", "90")];

        assert_eq!(total_purchase_cost(&lines), dec("330"));
        assert_eq!(suggested_sell_price(&lines), dec("480"));
    }

    #[test]
    fn stripping_a_quote_drops_only_the_purchase_price() {
        let id = Uuid::new_v4();
        let line = quoted(id, 3, "80", "50").into_line();
        assert_eq!(line.item_id, id);
        assert_eq!(line.quantity, 3);
        assert_eq!(line.selling_price, dec("80"));
    }

    #[test]
    fn identical_edit_has_no_net_deltas() {
        let id = Uuid::new_v4();
        let lines = vec![BillLineItem {
            item_id: id,
            item_name: "widget".to_string(),
            quantity: 4,
            selling_price: dec("80"),
        }];
        assert!(edit_deltas(&lines, &lines).is_empty());
    }

    #[test]
    fn edit_deltas_net_across_both_sides() {
        let kept = Uuid::new_v4();
        let dropped = Uuid::new_v4();
        let added = Uuid::new_v4();
        let line = |id, qty| BillLineItem {
            item_id: id,
            item_name: "widget".to_string(),
            quantity: qty,
            selling_price: dec("80"),
        };

        let original = vec![line(kept, 5), line(dropped, 2)];
        let updated = vec![line(kept, 3), line(added, 4)];

        let deltas = edit_deltas(&original, &updated);
        assert_eq!(deltas.get(&kept), Some(&2)); // 5 reserved, now 3: 2 return
        assert_eq!(deltas.get(&dropped), Some(&2)); // fully released
        assert_eq!(deltas.get(&added), Some(&-4)); // newly reserved
    }
}
