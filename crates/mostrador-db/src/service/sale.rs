//! # Sale Transaction Processor
//!
//! Turns a cart into a committed sale.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  commit_sale(lines, customer)                                          │
//! │       │                                                                 │
//! │       ▼  aggregate_lines      validate + merge duplicates (core)       │
//! │       ▼  get_many             resolve products (UnknownProduct)        │
//! │       ▼  price_lines          snapshot name/price, recompute total     │
//! │       │                                                                 │
//! │  BEGIN ─────────────────────────────────────────────────────────┐      │
//! │       ▼  reserve_in           guarded stock decrements          │      │
//! │       ▼  insert_in            sale row, status = completed      │      │
//! │  COMMIT ────────────────────────────────────────────────────────┘      │
//! │                                                                         │
//! │  Any failure before COMMIT: no sale row, no stock change               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::repository::invoice::InvoiceRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use crate::service::stock::reserve_in;
use mostrador_core::cart::{aggregate_lines, price_lines, CartLine, PricedCart};
use mostrador_core::{CoreError, Customer, Sale, SaleStatus};

/// Validates, prices and commits sales.
#[derive(Debug, Clone)]
pub struct SaleProcessor {
    pool: SqlitePool,
    products: ProductRepository,
}

impl SaleProcessor {
    pub fn new(pool: SqlitePool) -> Self {
        SaleProcessor {
            products: ProductRepository::new(pool.clone()),
            pool,
        }
    }

    /// Commits a sale and its stock reservation as one unit.
    ///
    /// ## Errors
    /// - [`CoreError::EmptyCart`], [`CoreError::Validation`],
    ///   [`CoreError::QuantityTooLarge`], [`CoreError::CartTooLarge`]
    /// - [`CoreError::UnknownProduct`]
    /// - [`CoreError::InsufficientStock`]
    #[instrument(skip(self, lines, customer), fields(lines = lines.len()))]
    pub async fn commit_sale(&self, lines: &[CartLine], customer: Customer) -> ServiceResult<Sale> {
        let priced = self.price(lines).await?;
        let requests = priced.stock_requests();
        let sale = new_sale(priced, customer, SaleStatus::Completed);

        let mut tx = self.pool.begin().await?;
        reserve_in(&mut *tx, &requests).await?;
        SaleRepository::insert_in(&mut *tx, &sale).await?;
        tx.commit().await?;

        info!(sale_id = %sale.id, total = %sale.total, "Sale committed");
        Ok(sale)
    }

    /// Records a priced sale without touching stock.
    #[instrument(skip(self, lines, customer), fields(lines = lines.len()))]
    pub async fn create_pending_sale(
        &self,
        lines: &[CartLine],
        customer: Customer,
    ) -> ServiceResult<Sale> {
        let priced = self.price(lines).await?;
        let sale = new_sale(priced, customer, SaleStatus::Pending);

        let mut conn = self.pool.acquire().await?;
        SaleRepository::insert_in(&mut conn, &sale).await?;

        info!(sale_id = %sale.id, total = %sale.total, "Pending sale recorded");
        Ok(sale)
    }

    /// Moves a pending sale to completed and reserves its stock.
    ///
    /// Prices stay as captured when the sale was created.
    #[instrument(skip(self))]
    pub async fn complete_pending_sale(&self, sale_id: &str) -> ServiceResult<Sale> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Status write first so this transaction holds the write lock
        // before it reads the lines.
        if !SaleRepository::transition_in(&mut *tx, sale_id, SaleStatus::Completed, now).await? {
            return Err(refused_transition(&mut *tx, sale_id, SaleStatus::Completed).await);
        }

        let sale = SaleRepository::find_in(&mut *tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        let requests: Vec<CartLine> = sale
            .items
            .iter()
            .map(|item| CartLine::new(item.product_id.clone(), item.quantity))
            .collect();
        reserve_in(&mut *tx, &requests).await?;

        tx.commit().await?;

        info!(sale_id = %sale.id, total = %sale.total, "Pending sale completed");
        Ok(sale)
    }

    /// Cancels a pending or completed sale.
    ///
    /// Status write only: stock is not returned. Refused once the sale has
    /// an invoice.
    #[instrument(skip(self))]
    pub async fn cancel_sale(&self, sale_id: &str) -> ServiceResult<Sale> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        if !SaleRepository::transition_in(&mut *tx, sale_id, SaleStatus::Cancelled, now).await? {
            return Err(refused_transition(&mut *tx, sale_id, SaleStatus::Cancelled).await);
        }

        // Checked under the write lock; dropping tx rolls the status back
        if InvoiceRepository::exists_for_sale_in(&mut *tx, sale_id).await? {
            warn!("Refusing to cancel an invoiced sale");
            return Err(CoreError::SaleAlreadyInvoiced(sale_id.to_string()).into());
        }

        let sale = SaleRepository::find_in(&mut *tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        tx.commit().await?;

        info!(sale_id = %sale.id, "Sale cancelled");
        Ok(sale)
    }

    /// Validation, aggregation, resolution and pricing shared by both paths.
    async fn price(&self, lines: &[CartLine]) -> ServiceResult<PricedCart> {
        let aggregated = aggregate_lines(lines)?;

        let ids: Vec<String> = aggregated.iter().map(|l| l.product_id.clone()).collect();
        let catalog = self.products.get_many(&ids).await?;

        Ok(price_lines(&aggregated, &catalog)?)
    }
}

fn new_sale(priced: PricedCart, customer: Customer, status: SaleStatus) -> Sale {
    let now = Utc::now();
    Sale {
        id: Uuid::new_v4().to_string(),
        items: priced.items,
        total: priced.total,
        customer_name: customer.name,
        customer_email: customer.email,
        status,
        created: now,
        updated: now,
    }
}

/// Explains why a guarded sale status write matched nothing.
async fn refused_transition(
    conn: &mut SqliteConnection,
    sale_id: &str,
    next: SaleStatus,
) -> ServiceError {
    let current = match SaleRepository::find_in(conn, sale_id).await {
        Ok(Some(sale)) => sale.status,
        Ok(None) => return CoreError::SaleNotFound(sale_id.to_string()).into(),
        Err(err) => return err.into(),
    };

    warn!(sale_id = %sale_id, from = %current, to = %next, "Sale status change refused");
    match current.ensure_transition(next) {
        Err(err) => err.into(),
        // Allowed by the table but the row changed under us
        Ok(()) => CoreError::InvalidStatusTransition {
            entity: "Sale",
            from: current.to_string(),
            to: next.to_string(),
        }
        .into(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
