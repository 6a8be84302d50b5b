//! Inventory item and ledger models
//!
//! The ledger is append-only: every non-sale quantity or cost-basis movement
//! is recorded as an [`InventoryLogEntry`]. Sale-driven decrements are
//! intentionally absent from the log; the one sale-side movement that does
//! log is the reversal written when a bill is deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stock item owned by the inventory ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

/// Reason codes for ledger entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogReason {
    InitialStock,
    Restock,
    Correction,
    PriceRevaluation,
    BillDeletionReversal,
}

impl LogReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogReason::InitialStock => "initial_stock",
            LogReason::Restock => "restock",
            LogReason::Correction => "correction",
            LogReason::PriceRevaluation => "price_revaluation",
            LogReason::BillDeletionReversal => "bill_deletion_reversal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "initial_stock" => Some(LogReason::InitialStock),
            "restock" => Some(LogReason::Restock),
            "correction" => Some(LogReason::Correction),
            "price_revaluation" => Some(LogReason::PriceRevaluation),
            "bill_deletion_reversal" => Some(LogReason::BillDeletionReversal),
            _ => None,
        }
    }
}

/// Reasons a user may give for a manual quantity adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustReason {
    Restock,
    Correction,
}

impl AdjustReason {
    pub fn log_reason(&self) -> LogReason {
        match self {
            AdjustReason::Restock => LogReason::Restock,
            AdjustReason::Correction => LogReason::Correction,
        }
    }
}

/// An immutable, append-only ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryLogEntry {
    pub id: Uuid,
    pub item_id: Uuid,
    /// Denormalized snapshot of the item name at write time
    pub item_name: String,
    pub quantity_change: i64,
    pub purchase_cost_change: Decimal,
    pub reason: LogReason,
    pub timestamp: DateTime<Utc>,
}

/// A planned ledger movement, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerMovement {
    pub quantity_change: i64,
    pub purchase_cost_change: Decimal,
    pub reason: LogReason,
}

/// Plan the ledger entry for a manual quantity adjustment.
///
/// Cost is attributed to procurement only: a Restock costs at `unit_cost`
/// when the delta is positive and carries no cost otherwise. A Correction
/// costs at `unit_cost * delta` regardless of sign. Movements whose cost
/// change works out to zero are log-silent, as is a zero delta.
pub fn plan_adjustment(
    reason: AdjustReason,
    unit_cost: Decimal,
    delta: i64,
) -> Option<LedgerMovement> {
    if delta == 0 {
        return None;
    }

    let cost_change = match reason {
        AdjustReason::Restock if delta > 0 => unit_cost * Decimal::from(delta),
        AdjustReason::Restock => Decimal::ZERO,
        AdjustReason::Correction => unit_cost * Decimal::from(delta),
    };

    if cost_change.is_zero() {
        return None;
    }

    Some(LedgerMovement {
        quantity_change: delta,
        purchase_cost_change: cost_change,
        reason: reason.log_reason(),
    })
}

/// Plan the ledger entry for a purchase-price revaluation.
///
/// Uses the pre-change quantity: the revaluation is recorded logically
/// before any simultaneous quantity delta in the same update. Returns
/// `None` when the price is unchanged or the resulting cost change is zero
/// (e.g. revaluing an item with no stock on hand).
pub fn plan_revaluation(
    old_price: Decimal,
    new_price: Decimal,
    quantity: i64,
) -> Option<LedgerMovement> {
    if new_price == old_price {
        return None;
    }

    let cost_change = (new_price - old_price) * Decimal::from(quantity);
    if cost_change.is_zero() {
        return None;
    }

    Some(LedgerMovement {
        quantity_change: 0,
        purchase_cost_change: cost_change,
        reason: LogReason::PriceRevaluation,
    })
}

/// The ledger entry written when an item is first created
pub fn initial_stock_movement(purchase_price: Decimal, quantity: i64) -> LedgerMovement {
    LedgerMovement {
        quantity_change: quantity,
        purchase_cost_change: purchase_price * Decimal::from(quantity),
        reason: LogReason::InitialStock,
    }
}

/// The ledger entry written when a bill is deleted and its stock re-acquired.
///
/// Costed at the item's purchase price at reversal time, not at the price
/// in effect when the bill was created.
pub fn bill_deletion_movement(current_purchase_price: Decimal, quantity: i64) -> LedgerMovement {
    LedgerMovement {
        quantity_change: quantity,
        purchase_cost_change: current_purchase_price * Decimal::from(quantity),
        reason: LogReason::BillDeletionReversal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn zero_delta_is_log_silent() {
        assert!(plan_adjustment(AdjustReason::Restock, dec("50"), 0).is_none());
        assert!(plan_adjustment(AdjustReason::Correction, dec("50"), 0).is_none());
    }

    #[test]
    fn negative_restock_is_log_silent() {
        assert!(plan_adjustment(AdjustReason::Restock, dec("50"), -3).is_none());
    }

    #[test]
    fn correction_costs_both_directions() {
        let up = plan_adjustment(AdjustReason::Correction, dec("50"), 2).unwrap();
        assert_eq!(up.purchase_cost_change, dec("100"));

        let down = plan_adjustment(AdjustReason::Correction, dec("50"), -2).unwrap();
        assert_eq!(down.purchase_cost_change, dec("-100"));
        assert_eq!(down.quantity_change, -2);
    }

    #[test]
    fn revaluation_uses_prechange_quantity() {
        let m = plan_revaluation(dec("50"), dec("60"), 10).unwrap();
        assert_eq!(m.quantity_change, 0);
        assert_eq!(m.purchase_cost_change, dec("100"));
        assert_eq!(m.reason, LogReason::PriceRevaluation);
    }

    #[test]
    fn unchanged_price_revalues_nothing() {
        assert!(plan_revaluation(dec("50"), dec("50"), 10).is_none());
        assert!(plan_revaluation(dec("50"), dec("60"), 0).is_none());
    }

    #[test]
    fn reason_round_trips_through_storage_form() {
        for reason in [
            LogReason::InitialStock,
            LogReason::Restock,
            LogReason::Correction,
            LogReason::PriceRevaluation,
            LogReason::BillDeletionReversal,
        ] {
            assert_eq!(LogReason::from_str(reason.as_str()), Some(reason));
        }
        assert_eq!(LogReason::from_str("sale"), None);
    }
}
