//! Billing engine
//!
//! A bill reserves stock: creation decrements item quantities, editing
//! re-reserves the net difference, deletion releases everything. Sale-driven
//! decrements write no inventory log entries; the one logging path is the
//! reversal recorded when a bill is deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::{
    edit_deltas, total_purchase_cost, validation, Bill, BillLineItem, PaymentMode, PaymentStatus,
    QuotedLine,
};

use crate::error::{AppError, AppResult};
use crate::services::inventory::InventoryService;

/// Billing service
#[derive(Clone)]
pub struct BillingService {
    db: PgPool,
}

/// One requested bill line
#[derive(Debug, Deserialize)]
pub struct BillLineInput {
    pub item_id: Uuid,
    pub quantity: i64,
}

/// Input for creating or editing a bill
#[derive(Debug, Deserialize)]
pub struct BillInput {
    pub lines: Vec<BillLineInput>,
    /// Final sell price; may differ from the suggested sum of line prices
    pub total_sell_price: Decimal,
    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
    pub customer_name: Option<String>,
}

/// An item as seen by a bill editor: on-hand stock plus whatever the bill
/// being edited already holds
#[derive(Debug, Serialize)]
pub struct AvailableItem {
    pub item_id: Uuid,
    pub name: String,
    pub selling_price: Decimal,
    pub available: i64,
}

/// Row for the bills table
#[derive(Debug, sqlx::FromRow)]
struct BillRow {
    id: Uuid,
    items: Json<Vec<BillLineItem>>,
    total_purchase_cost: Decimal,
    total_sell_price: Decimal,
    profit: Decimal,
    payment_mode: String,
    payment_status: String,
    customer_name: Option<String>,
    created_by: String,
    last_edited_by: Option<String>,
    timestamp: DateTime<Utc>,
}

impl TryFrom<BillRow> for Bill {
    type Error = AppError;

    fn try_from(row: BillRow) -> Result<Self, Self::Error> {
        let payment_mode = PaymentMode::from_str(&row.payment_mode)
            .ok_or_else(|| AppError::Internal(format!("Unknown payment mode: {}", row.payment_mode)))?;
        let payment_status = PaymentStatus::from_str(&row.payment_status).ok_or_else(|| {
            AppError::Internal(format!("Unknown payment status: {}", row.payment_status))
        })?;
        Ok(Bill {
            id: row.id,
            items: row.items.0,
            total_purchase_cost: row.total_purchase_cost,
            total_sell_price: row.total_sell_price,
            profit: row.profit,
            payment_mode,
            payment_status,
            customer_name: row.customer_name,
            created_by: row.created_by,
            last_edited_by: row.last_edited_by,
            timestamp: row.timestamp,
        })
    }
}

const BILL_COLUMNS: &str = r#"id, items, total_purchase_cost, total_sell_price, profit,
payment_mode, payment_status, customer_name, created_by, last_edited_by, "timestamp""#;

impl BillingService {
    /// Create a new BillingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a bill and reserve its stock
    pub async fn create_bill(&self, input: BillInput, actor: &str) -> AppResult<Bill> {
        Self::validate_input(&input)?;

        let mut tx = self.db.begin().await?;

        let quotes = Self::quote_lines(&mut tx, &input.lines).await?;
        for quote in &quotes {
            Self::reserve(&mut tx, quote.item_id, &quote.item_name, quote.quantity).await?;
        }

        let cost = total_purchase_cost(&quotes);
        let profit = input.total_sell_price - cost;
        let lines: Vec<BillLineItem> = quotes.into_iter().map(QuotedLine::into_line).collect();

        let row = sqlx::query_as::<_, BillRow>(&format!(
            r#"
            INSERT INTO bills (items, total_purchase_cost, total_sell_price, profit,
                               payment_mode, payment_status, customer_name, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {BILL_COLUMNS}
            "#,
        ))
        .bind(Json(&lines))
        .bind(cost)
        .bind(input.total_sell_price)
        .bind(profit)
        .bind(input.payment_mode.as_str())
        .bind(input.payment_status.as_str())
        .bind(&input.customer_name)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(bill_id = %row.id, actor, profit = %profit, "bill created");
        row.try_into()
    }

    /// Edit a bill in place, re-reserving stock for the net difference
    pub async fn edit_bill(&self, bill_id: Uuid, input: BillInput, actor: &str) -> AppResult<Bill> {
        Self::validate_input(&input)?;

        let mut tx = self.db.begin().await?;

        let original = sqlx::query_scalar::<_, Json<Vec<BillLineItem>>>(
            "SELECT items FROM bills WHERE id = $1 FOR UPDATE",
        )
        .bind(bill_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Bill".to_string()))?;

        let quotes = Self::quote_lines(&mut tx, &input.lines).await?;
        let cost = total_purchase_cost(&quotes);
        let profit = input.total_sell_price - cost;
        let lines: Vec<BillLineItem> = quotes.into_iter().map(QuotedLine::into_line).collect();

        // Add back what the bill held, subtract what it now holds; only the
        // net per-item difference touches stock.
        for (item_id, delta) in edit_deltas(&original.0, &lines) {
            let updated = sqlx::query(
                r#"
                UPDATE inventory
                SET quantity = quantity + $2
                WHERE id = $1 AND quantity + $2 >= 0
                "#,
            )
            .bind(item_id)
            .bind(delta)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 && delta < 0 {
                return Err(AppError::InsufficientStock(format!(
                    "Not enough stock to reserve {} more of item {}",
                    -delta, item_id
                )));
            }
        }

        let row = sqlx::query_as::<_, BillRow>(&format!(
            r#"
            UPDATE bills
            SET items = $1, total_purchase_cost = $2, total_sell_price = $3, profit = $4,
                payment_mode = $5, payment_status = $6, customer_name = $7,
                last_edited_by = $8, "timestamp" = NOW()
            WHERE id = $9
            RETURNING {BILL_COLUMNS}
            "#,
        ))
        .bind(Json(&lines))
        .bind(cost)
        .bind(input.total_sell_price)
        .bind(profit)
        .bind(input.payment_mode.as_str())
        .bind(input.payment_status.as_str())
        .bind(&input.customer_name)
        .bind(actor)
        .bind(bill_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(bill_id = %bill_id, actor, "bill edited");
        row.try_into()
    }

    /// Items as a bill editor should see them: this bill's reservations are
    /// added back so true availability shows
    pub async fn available_for_edit(&self, bill_id: Uuid) -> AppResult<Vec<AvailableItem>> {
        let reserved = sqlx::query_scalar::<_, Json<Vec<BillLineItem>>>(
            "SELECT items FROM bills WHERE id = $1",
        )
        .bind(bill_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Bill".to_string()))?;

        let items = sqlx::query_as::<_, (Uuid, String, Decimal, i64)>(
            "SELECT id, name, selling_price, quantity FROM inventory ORDER BY name ASC",
        )
        .fetch_all(&self.db)
        .await?;

        let available = items
            .into_iter()
            .map(|(item_id, name, selling_price, on_hand)| {
                let held: i64 = reserved
                    .0
                    .iter()
                    .filter(|line| line.item_id == item_id)
                    .map(|line| line.quantity)
                    .sum();
                AvailableItem {
                    item_id,
                    name,
                    selling_price,
                    available: on_hand + held,
                }
            })
            .filter(|item| item.available > 0)
            .collect();

        Ok(available)
    }

    /// Delete a bill, releasing its stock and recording the reversal in the
    /// inventory log
    pub async fn delete_bill(&self, bill_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let items = sqlx::query_scalar::<_, Json<Vec<BillLineItem>>>(
            "SELECT items FROM bills WHERE id = $1 FOR UPDATE",
        )
        .bind(bill_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Bill".to_string()))?;

        for line in &items.0 {
            InventoryService::reverse_for_bill_deletion(
                &mut tx,
                line.item_id,
                &line.item_name,
                line.quantity,
            )
            .await?;
        }

        sqlx::query("DELETE FROM bills WHERE id = $1")
            .bind(bill_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(bill_id = %bill_id, "bill deleted, stock released");
        Ok(())
    }

    /// Mark a bill as paid; no stock or ledger effect
    pub async fn mark_paid(&self, bill_id: Uuid) -> AppResult<()> {
        let updated = sqlx::query("UPDATE bills SET payment_status = $1 WHERE id = $2")
            .bind(PaymentStatus::Paid.as_str())
            .bind(bill_id)
            .execute(&self.db)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Bill".to_string()));
        }

        Ok(())
    }

    /// List bills, newest first, optionally filtered by payment status
    pub async fn list_bills(&self, status: Option<PaymentStatus>) -> AppResult<Vec<Bill>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, BillRow>(&format!(
                    r#"SELECT {BILL_COLUMNS} FROM bills WHERE payment_status = $1 ORDER BY "timestamp" DESC"#,
                ))
                .bind(status.as_str())
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, BillRow>(&format!(
                    r#"SELECT {BILL_COLUMNS} FROM bills ORDER BY "timestamp" DESC"#,
                ))
                .fetch_all(&self.db)
                .await?
            }
        };

        rows.into_iter().map(Bill::try_from).collect()
    }

    /// Get a single bill
    pub async fn get_bill(&self, bill_id: Uuid) -> AppResult<Bill> {
        let row = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE id = $1",
        ))
        .bind(bill_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Bill".to_string()))?;

        row.try_into()
    }

    fn validate_input(input: &BillInput) -> AppResult<()> {
        if input.lines.is_empty() {
            return Err(AppError::validation(
                "lines",
                "At least one line item is required",
            ));
        }
        for line in &input.lines {
            validation::validate_line_quantity(line.quantity)
                .map_err(|e| AppError::validation("quantity", e))?;
        }
        validation::validate_total_sell_price(input.total_sell_price)
            .map_err(|e| AppError::validation("total_sell_price", e))?;
        Ok(())
    }

    /// Snapshot name and prices for each requested line at call time
    async fn quote_lines(
        tx: &mut Transaction<'_, Postgres>,
        lines: &[BillLineInput],
    ) -> AppResult<Vec<QuotedLine>> {
        let mut quotes = Vec::with_capacity(lines.len());
        for line in lines {
            let (name, selling_price, purchase_price) =
                sqlx::query_as::<_, (String, Decimal, Decimal)>(
                    r#"
                    SELECT name, selling_price, purchase_price
                    FROM inventory
                    WHERE id = $1
                    FOR UPDATE
                    "#,
                )
                .bind(line.item_id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

            quotes.push(QuotedLine {
                item_id: line.item_id,
                item_name: name,
                quantity: line.quantity,
                selling_price,
                purchase_price,
            });
        }
        Ok(quotes)
    }

    /// Conditional decrement; refuses to drive stock negative
    async fn reserve(
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
        item_name: &str,
        quantity: i64,
    ) -> AppResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity = quantity - $2
            WHERE id = $1 AND quantity >= $2
            "#,
        )
        .bind(item_id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::InsufficientStock(format!(
                "Not enough stock of '{}' to bill {}",
                item_name, quantity
            )));
        }

        Ok(())
    }
}
