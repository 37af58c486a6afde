//! # Sale Repository
//!
//! Database operations for sales.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  commit_sale()          ──► completed   (stock reserved in same tx)    │
//! │                                                                         │
//! │  create_pending_sale()  ──► pending     (stock untouched)              │
//! │       │                                                                 │
//! │       └── complete_pending_sale() ──► completed (reserve + status, tx) │
//! │                                                                         │
//! │  cancel_sale()  pending | completed ──► cancelled  (status write only) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line items are stored as a JSON array in the `items` column, in entry
//! order. They are snapshots and never rewritten after insert.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::guarded_status_write;
use mostrador_core::{Money, Sale, SaleLineItem, SaleStatus};

const SALE_COLUMNS: &str =
    "id, items, total, customer_name, customer_email, status, created, updated";

/// A `sales` row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SaleRecord {
    id: String,
    items: String,
    total: Money,
    customer_name: Option<String>,
    customer_email: Option<String>,
    status: SaleStatus,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

impl TryFrom<SaleRecord> for Sale {
    type Error = DbError;

    fn try_from(record: SaleRecord) -> Result<Self, Self::Error> {
        let items: Vec<SaleLineItem> = serde_json::from_str(&record.items)
            .map_err(|e| DbError::invalid_data("Sale", &record.id, e))?;

        Ok(Sale {
            id: record.id,
            items,
            total: record.total,
            customer_name: record.customer_name,
            customer_email: record.customer_email,
            status: record.status,
            created: record.created,
            updated: record.updated,
        })
    }
}

/// Filter for [`SaleRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    /// Only sales in this status.
    pub status: Option<SaleStatus>,
    /// At most this many rows.
    pub limit: Option<u32>,
}

impl SaleFilter {
    pub fn status(status: SaleStatus) -> Self {
        SaleFilter {
            status: Some(status),
            limit: None,
        }
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_in(&mut conn, id).await
    }

    /// Lists sales newest first.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        debug!(status = ?filter.status, limit = ?filter.limit, "Listing sales");

        // LIMIT -1 means no limit in SQLite
        let sql = format!(
            r#"
            SELECT {}
            FROM sales
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY created DESC, rowid DESC
            LIMIT ?2
            "#,
            SALE_COLUMNS
        );

        let records = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(filter.status)
            .bind(filter.limit.map(i64::from).unwrap_or(-1))
            .fetch_all(&self.pool)
            .await?;

        records.into_iter().map(Sale::try_from).collect()
    }

    /// Counts sales in `status`.
    pub async fn count_by_status(&self, status: SaleStatus) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE status = ?1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Sum of `total` over completed sales.
    pub async fn completed_revenue(&self) -> DbResult<Money> {
        let cents: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(total), 0) FROM sales WHERE status = ?1")
                .bind(SaleStatus::Completed)
                .fetch_one(&self.pool)
                .await?;

        Ok(Money::from_cents(cents))
    }

    /// Reads a sale on the caller's connection.
    pub async fn find_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);

        let record = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        record.map(Sale::try_from).transpose()
    }

    /// Inserts a sale on the caller's connection (normally a transaction).
    pub async fn insert_in(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, status = %sale.status, lines = sale.items.len(), "Inserting sale");

        let items = serde_json::to_string(&sale.items)
            .map_err(|e| DbError::invalid_data("Sale", &sale.id, e))?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, items, total,
                customer_name, customer_email,
                status, created, updated
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&sale.id)
        .bind(items)
        .bind(sale.total)
        .bind(&sale.customer_name)
        .bind(&sale.customer_email)
        .bind(sale.status)
        .bind(sale.created)
        .bind(sale.updated)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Moves a sale to `next` if its current status allows it.
    ///
    /// The allowed current statuses come from the transition table, and the
    /// check happens in the `UPDATE` itself. Returns `false` if nothing
    /// matched.
    pub async fn transition_in(
        conn: &mut SqliteConnection,
        id: &str,
        next: SaleStatus,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let allowed_from: Vec<&'static str> = SaleStatus::ALL
            .into_iter()
            .filter(|from| from.can_transition_to(next))
            .map(|from| from.as_str())
            .collect();

        debug!(id = %id, next = %next, "Writing sale status");
        guarded_status_write(conn, "sales", id, next.as_str(), &allowed_from, now).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use uuid::Uuid;

    fn sale(status: SaleStatus, total_cents: i64) -> Sale {
        let now = Utc::now();
        Sale {
            id: Uuid::new_v4().to_string(),
            items: vec![SaleLineItem {
                product_id: "p-1".to_string(),
                product_name: "Alfajor".to_string(),
                quantity: 2,
                unit_price: Money::from_cents(total_cents / 2),
                line_total: Money::from_cents(total_cents),
            }],
            total: Money::from_cents(total_cents),
            customer_name: Some("Ana".to_string()),
            customer_email: None,
            status,
            created: now,
            updated: now,
        }
    }

    async fn insert(db: &Database, sale: &Sale) {
        let mut conn = db.pool().acquire().await.unwrap();
        SaleRepository::insert_in(&mut conn, sale).await.unwrap();
    }

    #[tokio::test]
    async fn test_items_survive_storage() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let original = sale(SaleStatus::Completed, 3000);
        insert(&db, &original).await;

        let stored = db.sales().get_by_id(&original.id).await.unwrap().unwrap();

        assert_eq!(stored.items, original.items);
        assert_eq!(stored.total, original.total);
        assert_eq!(stored.status, SaleStatus::Completed);
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let first = sale(SaleStatus::Completed, 1000);
        let second = sale(SaleStatus::Pending, 2000);
        let third = sale(SaleStatus::Completed, 3000);
        for s in [&first, &second, &third] {
            insert(&db, s).await;
        }

        let all = db.sales().list(&SaleFilter::default()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![third.id.as_str(), second.id.as_str(), first.id.as_str()]);

        let completed = db
            .sales()
            .list(&SaleFilter::status(SaleStatus::Completed))
            .await
            .unwrap();
        assert_eq!(completed.len(), 2);

        let limited = db
            .sales()
            .list(&SaleFilter {
                status: None,
                limit: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(limited[0].id, third.id);

        assert_eq!(db.sales().count_by_status(SaleStatus::Completed).await.unwrap(), 2);
        assert_eq!(db.sales().completed_revenue().await.unwrap().cents(), 4000);
    }

    #[tokio::test]
    async fn test_transition_follows_table() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let pending = sale(SaleStatus::Pending, 1000);
        insert(&db, &pending).await;
        let mut conn = db.pool().acquire().await.unwrap();

        // pending -> pending is not a transition
        assert!(!SaleRepository::transition_in(&mut conn, &pending.id, SaleStatus::Pending, Utc::now())
            .await
            .unwrap());
        assert!(SaleRepository::transition_in(&mut conn, &pending.id, SaleStatus::Completed, Utc::now())
            .await
            .unwrap());
        assert!(SaleRepository::transition_in(&mut conn, &pending.id, SaleStatus::Cancelled, Utc::now())
            .await
            .unwrap());
        // cancelled is terminal
        assert!(!SaleRepository::transition_in(&mut conn, &pending.id, SaleStatus::Completed, Utc::now())
            .await
            .unwrap());
        assert!(!SaleRepository::transition_in(&mut conn, "missing", SaleStatus::Cancelled, Utc::now())
            .await
            .unwrap());
    }
}
