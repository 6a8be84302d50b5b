//! Reporting service for profit analysis and data export
//!
//! Pure read-side aggregation over bills and the inventory log, recomputable
//! at any time. Aggregates bucket by business day: the trading date with a
//! 06:00 cutoff, so early-morning sales belong to the previous day.
//! Grouping happens in-process over fetched rows, keeping the bucketing rule
//! in one place.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::{business_date, prior_business_day_window, PaymentStatus};

use crate::error::AppResult;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Realized profit for one business day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyProfit {
    pub business_date: NaiveDate,
    pub profit: Decimal,
}

/// Paid sales vs ledger purchases for one business day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTradeSummary {
    pub business_date: NaiveDate,
    pub sales: Decimal,
    pub purchases: Decimal,
}

/// One row of the profit-per-bill table
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct BillProfitRow {
    pub bill_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub total_sell_price: Decimal,
    pub total_purchase_cost: Decimal,
    pub profit: Decimal,
    pub payment_status: String,
}

/// One row of the bill audit log
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct BillAuditRow {
    pub bill_id: Uuid,
    pub created_by: String,
    pub last_edited_by: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// The downloadable daily report: a stock snapshot and the prior business
/// day's bills, each rendered as CSV
#[derive(Debug, Serialize)]
pub struct DailyReport {
    pub generated_at: DateTime<Utc>,
    pub inventory_csv: String,
    pub bills_csv: String,
}

/// Row for the inventory snapshot sheet
#[derive(Debug, Serialize, sqlx::FromRow)]
struct InventorySnapshotRow {
    item_id: Uuid,
    name: String,
    quantity: i64,
    purchase_price: Decimal,
    selling_price: Decimal,
    created_at: DateTime<Utc>,
}

/// Row for the prior-day bills sheet
#[derive(Debug, Serialize, sqlx::FromRow)]
struct BillExportRow {
    bill_id: Uuid,
    timestamp: DateTime<Utc>,
    total_sell_price: Decimal,
    total_purchase_cost: Decimal,
    profit: Decimal,
    payment_mode: String,
    payment_status: String,
    created_by: String,
}

impl ReportingService {
    /// Create a new ReportingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Realized profit per business day, Paid bills only
    pub async fn daily_profit(&self) -> AppResult<Vec<DailyProfit>> {
        let rows = sqlx::query_as::<_, (DateTime<Utc>, Decimal)>(
            r#"SELECT "timestamp", profit FROM bills WHERE payment_status = $1"#,
        )
        .bind(PaymentStatus::Paid.as_str())
        .fetch_all(&self.db)
        .await?;

        Ok(bucket_by_day(rows)
            .into_iter()
            .map(|(business_date, profit)| DailyProfit {
                business_date,
                profit,
            })
            .collect())
    }

    /// Paid sales vs ledger purchases per business day.
    /// Purchases sum `purchase_cost_change` across all log reasons.
    pub async fn daily_sales_and_purchases(&self) -> AppResult<Vec<DailyTradeSummary>> {
        let sales = sqlx::query_as::<_, (DateTime<Utc>, Decimal)>(
            r#"SELECT "timestamp", total_sell_price FROM bills WHERE payment_status = $1"#,
        )
        .bind(PaymentStatus::Paid.as_str())
        .fetch_all(&self.db)
        .await?;

        let purchases = sqlx::query_as::<_, (DateTime<Utc>, Decimal)>(
            r#"SELECT "timestamp", purchase_cost_change FROM inventory_log"#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut days: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
        for (ts, amount) in sales {
            days.entry(business_date(ts)).or_default().0 += amount;
        }
        for (ts, amount) in purchases {
            days.entry(business_date(ts)).or_default().1 += amount;
        }

        Ok(days
            .into_iter()
            .map(|(business_date, (sales, purchases))| DailyTradeSummary {
                business_date,
                sales,
                purchases,
            })
            .collect())
    }

    /// Total revenue still outstanding on Unpaid bills
    pub async fn outstanding_revenue(&self) -> AppResult<Decimal> {
        let total = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT SUM(total_sell_price) FROM bills WHERE payment_status = $1",
        )
        .bind(PaymentStatus::Unpaid.as_str())
        .fetch_one(&self.db)
        .await?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }

    /// Per-bill profit table, newest first, optionally filtered by status
    pub async fn profit_per_bill(
        &self,
        status: Option<PaymentStatus>,
    ) -> AppResult<Vec<BillProfitRow>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, BillProfitRow>(
                    r#"
                    SELECT id AS bill_id, "timestamp", total_sell_price, total_purchase_cost,
                           profit, payment_status
                    FROM bills
                    WHERE payment_status = $1
                    ORDER BY "timestamp" DESC
                    "#,
                )
                .bind(status.as_str())
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, BillProfitRow>(
                    r#"
                    SELECT id AS bill_id, "timestamp", total_sell_price, total_purchase_cost,
                           profit, payment_status
                    FROM bills
                    ORDER BY "timestamp" DESC
                    "#,
                )
                .fetch_all(&self.db)
                .await?
            }
        };

        Ok(rows)
    }

    /// Who created and last edited each bill, newest first
    pub async fn bill_audit_log(&self) -> AppResult<Vec<BillAuditRow>> {
        let rows = sqlx::query_as::<_, BillAuditRow>(
            r#"
            SELECT id AS bill_id, created_by, last_edited_by, "timestamp"
            FROM bills
            ORDER BY "timestamp" DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Current stock snapshot plus the prior business day's bills
    /// (06:00 to 06:00), as two CSV documents
    pub async fn daily_report(&self, now: DateTime<Utc>) -> AppResult<DailyReport> {
        let (start, end) = prior_business_day_window(now);

        let inventory = sqlx::query_as::<_, InventorySnapshotRow>(
            r#"
            SELECT id AS item_id, name, quantity, purchase_price, selling_price, created_at
            FROM inventory
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let bills = sqlx::query_as::<_, BillExportRow>(
            r#"
            SELECT id AS bill_id, "timestamp", total_sell_price, total_purchase_cost,
                   profit, payment_mode, payment_status, created_by
            FROM bills
            WHERE "timestamp" >= $1 AND "timestamp" < $2
            ORDER BY "timestamp" ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        Ok(DailyReport {
            generated_at: now,
            inventory_csv: Self::export_to_csv(&inventory)?,
            bills_csv: Self::export_to_csv(&bills)?,
        })
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record).map_err(|e| {
                crate::error::AppError::Internal(format!("CSV serialization error: {}", e))
            })?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| crate::error::AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| crate::error::AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}

/// Sum amounts into business-day buckets, oldest first
fn bucket_by_day(rows: Vec<(DateTime<Utc>, Decimal)>) -> BTreeMap<NaiveDate, Decimal> {
    let mut days: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for (ts, amount) in rows {
        *days.entry(business_date(ts)).or_default() += amount;
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn night_shift_amounts_roll_into_the_prior_day() {
        let days = bucket_by_day(vec![
            (ts("2024-03-01T12:00:00Z"), dec("100")),
            (ts("2024-03-02T05:30:00Z"), dec("40")),
            (ts("2024-03-02T06:01:00Z"), dec("25")),
        ]);

        let march_1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let march_2 = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(days.get(&march_1), Some(&dec("140")));
        assert_eq!(days.get(&march_2), Some(&dec("25")));
    }

    #[test]
    fn empty_input_yields_no_buckets() {
        assert!(bucket_by_day(vec![]).is_empty());
    }
}
