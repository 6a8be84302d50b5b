//! Inventory ledger service
//!
//! Owns the stock table and the append-only inventory log. Every operation
//! that touches both runs in a single transaction: the item mutation and its
//! log entries commit together or not at all. Log entries are never updated
//! or deleted once written.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::{
    bill_deletion_movement, initial_stock_movement, plan_adjustment, plan_revaluation, validation,
    AdjustReason, BillLineItem, InventoryItem, InventoryLogEntry, LedgerMovement, LogReason,
};

use crate::error::{AppError, AppResult};

/// Inventory ledger service
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
    /// Whether the bulk stock reset writes reversal entries to the log
    log_stock_resets: bool,
}

/// Input for creating a new item
#[derive(Debug, Deserialize)]
pub struct CreateItemInput {
    pub name: String,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub quantity: i64,
}

/// Input for the combined stock/price update form.
///
/// A quantity delta must carry a reason; price fields left as `None` are
/// unchanged. All-empty input is a no-op success.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemInput {
    #[serde(default)]
    pub quantity_delta: i64,
    pub reason: Option<AdjustReason>,
    pub new_purchase_price: Option<Decimal>,
    pub new_selling_price: Option<Decimal>,
}

/// Outcome of a bulk stock reset
#[derive(Debug, serde::Serialize)]
pub struct ResetSummary {
    pub bills_deleted: u64,
    pub lines_restored: u64,
}

/// Row for the inventory table
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    name: String,
    purchase_price: Decimal,
    selling_price: Decimal,
    quantity: i64,
    created_at: DateTime<Utc>,
}

impl From<ItemRow> for InventoryItem {
    fn from(row: ItemRow) -> Self {
        InventoryItem {
            id: row.id,
            name: row.name,
            purchase_price: row.purchase_price,
            selling_price: row.selling_price,
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

/// Row for the inventory log table
#[derive(Debug, sqlx::FromRow)]
struct LogRow {
    id: Uuid,
    item_id: Uuid,
    item_name: String,
    quantity_change: i64,
    purchase_cost_change: Decimal,
    reason: String,
    timestamp: DateTime<Utc>,
}

impl TryFrom<LogRow> for InventoryLogEntry {
    type Error = AppError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        let reason = LogReason::from_str(&row.reason)
            .ok_or_else(|| AppError::Internal(format!("Unknown log reason: {}", row.reason)))?;
        Ok(InventoryLogEntry {
            id: row.id,
            item_id: row.item_id,
            item_name: row.item_name,
            quantity_change: row.quantity_change,
            purchase_cost_change: row.purchase_cost_change,
            reason,
            timestamp: row.timestamp,
        })
    }
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool, log_stock_resets: bool) -> Self {
        Self {
            db,
            log_stock_resets,
        }
    }

    /// Create a new item and its opening ledger entry
    pub async fn create_item(&self, input: CreateItemInput) -> AppResult<InventoryItem> {
        validation::validate_item_name(&input.name)
            .map_err(|e| AppError::validation("name", e))?;
        validation::validate_creation_prices(input.purchase_price, input.selling_price)
            .map_err(|e| AppError::validation("selling_price", e))?;
        validation::validate_initial_quantity(input.quantity)
            .map_err(|e| AppError::validation("quantity", e))?;

        let mut tx = self.db.begin().await?;

        let item = sqlx::query_as::<_, ItemRow>(
            r#"
            INSERT INTO inventory (name, purchase_price, selling_price, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, purchase_price, selling_price, quantity, created_at
            "#,
        )
        .bind(input.name.trim())
        .bind(input.purchase_price)
        .bind(input.selling_price)
        .bind(input.quantity)
        .fetch_one(&mut *tx)
        .await?;

        let movement = initial_stock_movement(item.purchase_price, item.quantity);
        Self::append_log(&mut tx, item.id, &item.name, &movement).await?;

        tx.commit().await?;

        tracing::info!(item_id = %item.id, name = %item.name, "item created");
        Ok(item.into())
    }

    /// Adjust an item's quantity with a reason code.
    /// A delta of 0 is a no-op success.
    pub async fn adjust_quantity(
        &self,
        item_id: Uuid,
        delta: i64,
        reason: AdjustReason,
    ) -> AppResult<InventoryItem> {
        self.update_item(
            item_id,
            UpdateItemInput {
                quantity_delta: delta,
                reason: Some(reason),
                new_purchase_price: None,
                new_selling_price: None,
            },
        )
        .await
    }

    /// Combined stock and price update.
    ///
    /// A purchase-price change is logged as a revaluation against the
    /// pre-change quantity before any quantity delta applies. A Restock
    /// delta costs at the new purchase price, a Correction at the old one.
    pub async fn update_item(
        &self,
        item_id: Uuid,
        input: UpdateItemInput,
    ) -> AppResult<InventoryItem> {
        if input.quantity_delta != 0 && input.reason.is_none() {
            return Err(AppError::validation(
                "reason",
                "A reason is required for quantity changes",
            ));
        }
        if let Some(price) = input.new_purchase_price {
            validation::validate_price(price)
                .map_err(|e| AppError::validation("new_purchase_price", e))?;
        }
        if let Some(price) = input.new_selling_price {
            validation::validate_price(price)
                .map_err(|e| AppError::validation("new_selling_price", e))?;
        }

        let mut tx = self.db.begin().await?;

        let item = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, name, purchase_price, selling_price, quantity, created_at
            FROM inventory
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        let new_purchase = input.new_purchase_price.unwrap_or(item.purchase_price);
        let new_selling = input.new_selling_price.unwrap_or(item.selling_price);
        let delta = input.quantity_delta;

        if new_purchase == item.purchase_price && new_selling == item.selling_price && delta == 0 {
            return Ok(item.into());
        }

        let new_quantity = item.quantity + delta;
        if new_quantity < 0 {
            return Err(AppError::InsufficientStock(format!(
                "'{}' has only {} on hand",
                item.name, item.quantity
            )));
        }

        // Revaluation first, against the pre-change quantity
        let revaluation = plan_revaluation(item.purchase_price, new_purchase, item.quantity);

        // Restock attributes cost at the freshly set purchase price;
        // Correction at the price the stock was carried at
        let adjustment = input.reason.and_then(|reason| {
            let unit_cost = match reason {
                AdjustReason::Restock => new_purchase,
                AdjustReason::Correction => item.purchase_price,
            };
            plan_adjustment(reason, unit_cost, delta)
        });

        let updated = sqlx::query_as::<_, ItemRow>(
            r#"
            UPDATE inventory
            SET purchase_price = $1, selling_price = $2, quantity = $3
            WHERE id = $4
            RETURNING id, name, purchase_price, selling_price, quantity, created_at
            "#,
        )
        .bind(new_purchase)
        .bind(new_selling)
        .bind(new_quantity)
        .bind(item_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(movement) = revaluation {
            Self::append_log(&mut tx, item.id, &item.name, &movement).await?;
        }
        if let Some(movement) = adjustment {
            Self::append_log(&mut tx, item.id, &item.name, &movement).await?;
        }

        tx.commit().await?;

        tracing::info!(item_id = %item_id, delta, "item updated");
        Ok(updated.into())
    }

    /// Reverse one bill line during bill deletion: put the stock back and
    /// record the re-acquired cost basis, priced at the item's current
    /// purchase price. Runs inside the caller's transaction.
    pub async fn reverse_for_bill_deletion(
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
        item_name: &str,
        quantity: i64,
    ) -> AppResult<()> {
        let purchase_price = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE inventory
            SET quantity = quantity + $2
            WHERE id = $1
            RETURNING purchase_price
            "#,
        )
        .bind(item_id)
        .bind(quantity)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        let movement = bill_deletion_movement(purchase_price, quantity);
        Self::append_log(tx, item_id, item_name, &movement).await?;

        Ok(())
    }

    /// Release every reservation held by open bills, then delete the bills.
    ///
    /// Log-silent by default; with `ledger.log_stock_resets` enabled each
    /// restored line writes the same reversal entry a one-by-one bill
    /// deletion would have produced.
    pub async fn reset_all_stock(&self) -> AppResult<ResetSummary> {
        let mut tx = self.db.begin().await?;

        let bills = sqlx::query_as::<_, (Uuid, sqlx::types::Json<Vec<BillLineItem>>)>(
            "SELECT id, items FROM bills",
        )
        .fetch_all(&mut *tx)
        .await?;

        let mut lines_restored = 0u64;
        for (_, items) in &bills {
            for line in &items.0 {
                let purchase_price = sqlx::query_scalar::<_, Decimal>(
                    r#"
                    UPDATE inventory
                    SET quantity = quantity + $2
                    WHERE id = $1
                    RETURNING purchase_price
                    "#,
                )
                .bind(line.item_id)
                .bind(line.quantity)
                .fetch_optional(&mut *tx)
                .await?;

                let Some(purchase_price) = purchase_price else {
                    continue;
                };
                lines_restored += 1;

                if self.log_stock_resets {
                    let movement = bill_deletion_movement(purchase_price, line.quantity);
                    Self::append_log(&mut tx, line.item_id, &line.item_name, &movement).await?;
                }
            }
        }

        let deleted = sqlx::query("DELETE FROM bills").execute(&mut *tx).await?;

        tx.commit().await?;

        let summary = ResetSummary {
            bills_deleted: deleted.rows_affected(),
            lines_restored,
        };
        tracing::warn!(
            bills_deleted = summary.bills_deleted,
            lines_restored = summary.lines_restored,
            "all bills deleted and stock reset"
        );
        Ok(summary)
    }

    /// Delete all inventory, bills, and history
    pub async fn purge_all_data(&self) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM inventory_log")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM bills").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM inventory")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::warn!("all inventory, bills, and history purged");
        Ok(())
    }

    /// List all items
    pub async fn list_items(&self) -> AppResult<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, name, purchase_price, selling_price, quantity, created_at
            FROM inventory
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(InventoryItem::from).collect())
    }

    /// Get a single item
    pub async fn get_item(&self, item_id: Uuid) -> AppResult<InventoryItem> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, name, purchase_price, selling_price, quantity, created_at
            FROM inventory
            WHERE id = $1
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        Ok(row.into())
    }

    /// Full inventory history, newest first
    pub async fn history(&self) -> AppResult<Vec<InventoryLogEntry>> {
        let rows = sqlx::query_as::<_, LogRow>(
            r#"
            SELECT id, item_id, item_name, quantity_change, purchase_cost_change, reason, "timestamp"
            FROM inventory_log
            ORDER BY "timestamp" DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(InventoryLogEntry::try_from).collect()
    }

    /// History for a single item, newest first
    pub async fn item_history(&self, item_id: Uuid) -> AppResult<Vec<InventoryLogEntry>> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM inventory WHERE id = $1)")
                .bind(item_id)
                .fetch_one(&self.db)
                .await?;

        if !exists {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let rows = sqlx::query_as::<_, LogRow>(
            r#"
            SELECT id, item_id, item_name, quantity_change, purchase_cost_change, reason, "timestamp"
            FROM inventory_log
            WHERE item_id = $1
            ORDER BY "timestamp" DESC
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(InventoryLogEntry::try_from).collect()
    }

    /// Append a ledger entry inside an open transaction
    async fn append_log(
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
        item_name: &str,
        movement: &LedgerMovement,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_log (item_id, item_name, quantity_change, purchase_cost_change, reason)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(item_id)
        .bind(item_name)
        .bind(movement.quantity_change)
        .bind(movement.purchase_cost_change)
        .bind(movement.reason.as_str())
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
