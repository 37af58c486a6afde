//! # Invoice Repository
//!
//! Database operations for invoices.
//!
//! Monetary columns (`subtotal`, `tax_rate`, `tax_amount`, `total`) are
//! written once on insert. The only later write is the guarded status change.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::guarded_status_write;
use mostrador_core::{Invoice, InvoiceStatus};

const INVOICE_COLUMNS: &str = "id, invoice_number, sale_id, customer_name, customer_email, \
     customer_address, customer_cuit, iban_code, subtotal, tax_rate, tax_amount, total, \
     status, due_date, created, updated";

/// Filter for [`InvoiceRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub sale_id: Option<String>,
    pub limit: Option<u32>,
}

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_in(&mut conn, id).await
    }

    pub async fn get_by_number(&self, invoice_number: &str) -> DbResult<Option<Invoice>> {
        let sql = format!(
            "SELECT {} FROM invoices WHERE invoice_number = ?1",
            INVOICE_COLUMNS
        );

        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(invoice_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invoice)
    }

    /// Lists invoices newest first.
    pub async fn list(&self, filter: &InvoiceFilter) -> DbResult<Vec<Invoice>> {
        debug!(status = ?filter.status, sale_id = ?filter.sale_id, "Listing invoices");

        let sql = format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR sale_id = ?2)
            ORDER BY created DESC, rowid DESC
            LIMIT ?3
            "#,
            INVOICE_COLUMNS
        );

        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(filter.status)
            .bind(filter.sale_id.as_deref())
            .bind(filter.limit.map(i64::from).unwrap_or(-1))
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Reads an invoice on the caller's connection.
    pub async fn find_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Invoice>> {
        let sql = format!("SELECT {} FROM invoices WHERE id = ?1", INVOICE_COLUMNS);

        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(invoice)
    }

    /// True if the sale already has an invoice.
    pub async fn exists_for_sale_in(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM invoices WHERE sale_id = ?1)")
                .bind(sale_id)
                .fetch_one(&mut *conn)
                .await?;

        Ok(exists)
    }

    /// Inserts an invoice on the caller's connection.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` on `invoices.invoice_number` or
    /// `invoices.sale_id`.
    pub async fn insert_in(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
        debug!(
            id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            sale_id = %invoice.sale_id,
            "Inserting invoice"
        );

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, sale_id,
                customer_name, customer_email, customer_address, customer_cuit, iban_code,
                subtotal, tax_rate, tax_amount, total,
                status, due_date, created, updated
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6, ?7, ?8,
                ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16
            )
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.sale_id)
        .bind(&invoice.customer_name)
        .bind(&invoice.customer_email)
        .bind(&invoice.customer_address)
        .bind(&invoice.customer_cuit)
        .bind(&invoice.iban_code)
        .bind(invoice.subtotal)
        .bind(invoice.tax_rate)
        .bind(invoice.tax_amount)
        .bind(invoice.total)
        .bind(invoice.status)
        .bind(invoice.due_date)
        .bind(invoice.created)
        .bind(invoice.updated)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Moves an invoice to `next` if the transition table allows it from
    /// the stored status. Returns `false` if nothing matched.
    pub async fn transition_in(
        conn: &mut SqliteConnection,
        id: &str,
        next: InvoiceStatus,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let allowed_from: Vec<&'static str> = InvoiceStatus::ALL
            .into_iter()
            .filter(|from| from.can_transition_to(next))
            .map(|from| from.as_str())
            .collect();

        debug!(id = %id, next = %next, "Writing invoice status");
        guarded_status_write(conn, "invoices", id, next.as_str(), &allowed_from, now).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::sale::SaleRepository;
    use chrono::NaiveDate;
    use mostrador_core::{Money, Sale, SaleStatus, TaxRate};
    use uuid::Uuid;

    async fn seeded_sale(db: &Database) -> Sale {
        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            items: Vec::new(),
            total: Money::from_cents(100_000),
            customer_name: None,
            customer_email: None,
            status: SaleStatus::Completed,
            created: now,
            updated: now,
        };
        let mut conn = db.pool().acquire().await.unwrap();
        SaleRepository::insert_in(&mut conn, &sale).await.unwrap();
        sale
    }

    fn invoice(sale_id: &str, number: &str) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: Uuid::new_v4().to_string(),
            invoice_number: number.to_string(),
            sale_id: sale_id.to_string(),
            customer_name: "Ana".to_string(),
            customer_email: None,
            customer_address: Some("Av. Corrientes 1234".to_string()),
            customer_cuit: Some("20-12345678-9".to_string()),
            iban_code: None,
            subtotal: Money::from_cents(100_000),
            tax_rate: TaxRate::from_bps(2100),
            tax_amount: Money::from_cents(21_000),
            total: Money::from_cents(121_000),
            status: InvoiceStatus::Draft,
            due_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            created: now,
            updated: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sale = seeded_sale(&db).await;
        let original = invoice(&sale.id, "INV-1");

        {
            let mut conn = db.pool().acquire().await.unwrap();
            InvoiceRepository::insert_in(&mut conn, &original).await.unwrap();
            assert!(InvoiceRepository::exists_for_sale_in(&mut conn, &sale.id).await.unwrap());
        }

        let stored = db.invoices().get_by_number("INV-1").await.unwrap().unwrap();
        assert_eq!(stored, original);
        assert_eq!(db.invoices().count().await.unwrap(), 1);

        let by_sale = db
            .invoices()
            .list(&InvoiceFilter {
                sale_id: Some(sale.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_sale.len(), 1);
    }

    #[tokio::test]
    async fn test_unique_indexes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sale_a = seeded_sale(&db).await;
        let sale_b = seeded_sale(&db).await;
        let mut conn = db.pool().acquire().await.unwrap();

        InvoiceRepository::insert_in(&mut conn, &invoice(&sale_a.id, "INV-1"))
            .await
            .unwrap();

        let err = InvoiceRepository::insert_in(&mut conn, &invoice(&sale_b.id, "INV-1"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on("invoices.invoice_number"));

        let err = InvoiceRepository::insert_in(&mut conn, &invoice(&sale_a.id, "INV-2"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on("invoices.sale_id"));
    }

    #[tokio::test]
    async fn test_transition_follows_table() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sale = seeded_sale(&db).await;
        let draft = invoice(&sale.id, "INV-1");
        let mut conn = db.pool().acquire().await.unwrap();
        InvoiceRepository::insert_in(&mut conn, &draft).await.unwrap();

        let now = Utc::now();
        assert!(!InvoiceRepository::transition_in(&mut conn, &draft.id, InvoiceStatus::Paid, now)
            .await
            .unwrap());
        assert!(InvoiceRepository::transition_in(&mut conn, &draft.id, InvoiceStatus::Sent, now)
            .await
            .unwrap());
        assert!(InvoiceRepository::transition_in(&mut conn, &draft.id, InvoiceStatus::Overdue, now)
            .await
            .unwrap());
        assert!(InvoiceRepository::transition_in(&mut conn, &draft.id, InvoiceStatus::Paid, now)
            .await
            .unwrap());

        let stored = InvoiceRepository::find_in(&mut conn, &draft.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InvoiceStatus::Paid);
        assert_eq!(stored.total, draft.total);
    }
}
