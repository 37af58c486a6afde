//! # Invoice Generator
//!
//! Derives exactly one invoice from a completed sale and manages its status.
//!
//! ## Generation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  generate_invoice(sale_id, details)                                    │
//! │                                                                         │
//! │  find sale                   SaleNotFound                              │
//! │  details.resolve()           SaleNotBillable, ValidationError          │
//! │                                                                         │
//! │  attempt 0..invoice_number_attempts                                    │
//! │  │  BEGIN                                                              │
//! │  │    INSERT                 invoices.sale_id  → SaleAlreadyInvoiced   │
//! │  │                           invoices.invoice_number                   │
//! │  │                                             → DuplicateInvoiceNumber│
//! │  │    sale still completed?  SaleNotBillable (rolled back)             │
//! │  │  COMMIT                                                             │
//! │  │                                                                      │
//! │  └─ DuplicateInvoiceNumber on a generated number → next attempt        │
//! │     DuplicateInvoiceNumber on a caller's number  → returned as is      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The INSERT is the first statement of the transaction, so it waits for the
//! write lock under the busy timeout instead of failing on a stale read
//! snapshot. The status re-check then runs while the lock is held.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};

use crate::error::{DbError, ServiceError, ServiceResult};
use crate::repository::invoice::InvoiceRepository;
use crate::repository::sale::SaleRepository;
use mostrador_core::invoice::{BillingDetails, InvoiceDraft, InvoiceNumbering, TimestampNumbering};
use mostrador_core::{non_blank, BillingConfig, CoreError, Invoice, InvoiceStatus, SaleStatus};

/// Creates invoices and writes their status.
#[derive(Clone)]
pub struct InvoiceGenerator {
    pool: SqlitePool,
    sales: SaleRepository,
    config: BillingConfig,
    numbering: Arc<dyn InvoiceNumbering>,
}

impl std::fmt::Debug for InvoiceGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvoiceGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl InvoiceGenerator {
    /// Generator with `INV-<unix millis>` numbering.
    pub fn new(pool: SqlitePool, config: BillingConfig) -> Self {
        InvoiceGenerator {
            sales: SaleRepository::new(pool.clone()),
            pool,
            config,
            numbering: Arc::new(TimestampNumbering),
        }
    }

    /// Replaces the number source.
    pub fn with_numbering(mut self, numbering: impl InvoiceNumbering + 'static) -> Self {
        self.numbering = Arc::new(numbering);
        self
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    /// Generates the invoice for a completed sale.
    ///
    /// ## Errors
    /// - [`CoreError::SaleNotFound`]
    /// - [`CoreError::SaleNotBillable`] unless the sale is `completed`
    /// - [`CoreError::SaleAlreadyInvoiced`]
    /// - [`CoreError::DuplicateInvoiceNumber`] for a caller-supplied number
    ///   that is taken, or when every generated number collided
    /// - [`CoreError::Validation`] for bad billing details
    #[instrument(skip(self, details))]
    pub async fn generate_invoice(
        &self,
        sale_id: &str,
        details: &BillingDetails,
    ) -> ServiceResult<Invoice> {
        let caller_number = non_blank(details.invoice_number.clone()).is_some();
        let attempts = self.config.invoice_number_attempts.max(1);

        let sale = self
            .sales
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        let draft = details.resolve(&sale, &self.config, Utc::now().date_naive())?;

        let mut attempt = 0;
        loop {
            match self.try_insert(&draft, attempt).await {
                Err(ServiceError::Core(CoreError::DuplicateInvoiceNumber(number)))
                    if !caller_number && attempt + 1 < attempts =>
                {
                    warn!(%number, attempt, "Generated invoice number taken, retrying");
                    attempt += 1;
                }
                Ok(invoice) => {
                    info!(
                        invoice_id = %invoice.id,
                        invoice_number = %invoice.invoice_number,
                        total = %invoice.total,
                        "Invoice generated"
                    );
                    return Ok(invoice);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_insert(&self, draft: &InvoiceDraft, attempt: u32) -> ServiceResult<Invoice> {
        let number = match &draft.invoice_number {
            Some(number) => number.clone(),
            None => self.numbering.next(attempt),
        };
        let invoice = draft.clone().into_invoice(number, Utc::now());

        let mut tx = self.pool.begin().await?;

        InvoiceRepository::insert_in(&mut *tx, &invoice)
            .await
            .map_err(|err| unique_to_core(err, &invoice))?;

        // A cancel may have committed since the sale was read
        let status = SaleRepository::find_in(&mut *tx, &invoice.sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(invoice.sale_id.clone()))?
            .status;
        if status != SaleStatus::Completed {
            return Err(CoreError::SaleNotBillable {
                sale_id: invoice.sale_id.clone(),
                status: status.to_string(),
            }
            .into());
        }

        tx.commit().await?;
        Ok(invoice)
    }

    /// Writes a new invoice status. Monetary fields are never touched.
    ///
    /// ## Errors
    /// - [`CoreError::InvoiceNotFound`]
    /// - [`CoreError::InvalidStatusTransition`] when the table forbids it
    #[instrument(skip(self))]
    pub async fn transition_invoice(
        &self,
        invoice_id: &str,
        next: InvoiceStatus,
    ) -> ServiceResult<Invoice> {
        let mut tx = self.pool.begin().await?;

        if !InvoiceRepository::transition_in(&mut *tx, invoice_id, next, Utc::now()).await? {
            let current = InvoiceRepository::find_in(&mut *tx, invoice_id)
                .await?
                .ok_or_else(|| CoreError::InvoiceNotFound(invoice_id.to_string()))?
                .status;

            warn!(from = %current, to = %next, "Invoice status change refused");
            return Err(CoreError::InvalidStatusTransition {
                entity: "Invoice",
                from: current.to_string(),
                to: next.to_string(),
            }
            .into());
        }

        let invoice = InvoiceRepository::find_in(&mut *tx, invoice_id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(invoice_id.to_string()))?;

        tx.commit().await?;

        info!(invoice_number = %invoice.invoice_number, status = %invoice.status, "Invoice status updated");
        Ok(invoice)
    }
}

/// Maps a unique-index failure on insert back to the business error.
fn unique_to_core(err: DbError, invoice: &Invoice) -> ServiceError {
    if err.is_unique_violation_on("invoices.invoice_number") {
        CoreError::DuplicateInvoiceNumber(invoice.invoice_number.clone()).into()
    } else if err.is_unique_violation_on("invoices.sale_id") {
        CoreError::SaleAlreadyInvoiced(invoice.sale_id.clone()).into()
    } else {
        err.into()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
