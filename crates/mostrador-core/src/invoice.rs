//! # Invoice Module
//!
//! Invoice arithmetic, billing-detail resolution and invoice numbering.
//!
//! ## Generation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Completed Sale → Invoice                            │
//! │                                                                         │
//! │  Sale { total: 1000.00, status: completed }                            │
//! │       │                                                                 │
//! │       ▼  BillingDetails::resolve(sale, config, today)                   │
//! │  InvoiceDraft                                                           │
//! │  ├── customer_name   (given, else the sale's, else Required)           │
//! │  ├── tax_rate        (given, else config default 21%)                  │
//! │  ├── due_date        (given and >= today, else today + 30 days)        │
//! │  └── totals          subtotal 1000.00, tax 210.00, total 1210.00       │
//! │       │                                                                 │
//! │       ▼  mostrador-db InvoiceGenerator                                  │
//! │  Invoice (numbered, persisted, monetary fields frozen)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::config::BillingConfig;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, TaxRate};
use crate::types::{amount_overflow, non_blank, Invoice, InvoiceStatus, Sale, SaleStatus};
use crate::validation::{
    normalize_bank_code, validate_customer_name, validate_email, validate_tax_rate,
};

/// Prefix of generated invoice numbers.
pub const INVOICE_NUMBER_PREFIX: &str = "INV";

/// Maximum length of an invoice number.
pub const MAX_INVOICE_NUMBER_LEN: usize = 50;

// =============================================================================
// Totals
// =============================================================================

/// The frozen monetary fields of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub tax_rate: TaxRate,
    pub tax_amount: Money,
    pub total: Money,
}

impl InvoiceTotals {
    /// `tax_amount` is rounded half up to the cent; `total = subtotal + tax_amount`.
    pub fn compute(subtotal: Money, tax_rate: TaxRate) -> CoreResult<Self> {
        let tax_amount = subtotal.calculate_tax(tax_rate);
        let total = subtotal
            .checked_add(tax_amount)
            .ok_or_else(|| amount_overflow("total"))?;

        Ok(InvoiceTotals {
            subtotal,
            tax_rate,
            tax_amount,
            total,
        })
    }
}

// =============================================================================
// Billing Details
// =============================================================================

/// Caller input for invoice generation. Unset fields take defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingDetails {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub customer_cuit: Option<String>,
    pub iban_code: Option<String>,
    pub tax_rate: Option<TaxRate>,
    pub due_date: Option<NaiveDate>,
    /// Caller-chosen number. When set, a collision is an error, not a retry.
    pub invoice_number: Option<String>,
    /// Initial status, `draft` when unset.
    pub status: Option<InvoiceStatus>,
}

impl BillingDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn customer_email(mut self, email: impl Into<String>) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    pub fn customer_address(mut self, address: impl Into<String>) -> Self {
        self.customer_address = Some(address.into());
        self
    }

    pub fn customer_cuit(mut self, cuit: impl Into<String>) -> Self {
        self.customer_cuit = Some(cuit.into());
        self
    }

    pub fn iban_code(mut self, code: impl Into<String>) -> Self {
        self.iban_code = Some(code.into());
        self
    }

    pub fn tax_rate(mut self, rate: TaxRate) -> Self {
        self.tax_rate = Some(rate);
        self
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn invoice_number(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = Some(number.into());
        self
    }

    pub fn status(mut self, status: InvoiceStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Applies defaults and checks every billing rule that does not need the
    /// database.
    ///
    /// ## Errors
    /// - [`CoreError::SaleNotBillable`] unless the sale is `completed`
    /// - [`ValidationError::Required`] when neither the details nor the sale
    ///   carry a customer name
    /// - [`ValidationError`] for a malformed email, bank code, tax rate,
    ///   invoice number or a due date before `today`
    pub fn resolve(
        &self,
        sale: &Sale,
        config: &BillingConfig,
        today: NaiveDate,
    ) -> CoreResult<InvoiceDraft> {
        if sale.status != SaleStatus::Completed {
            return Err(CoreError::SaleNotBillable {
                sale_id: sale.id.clone(),
                status: sale.status.to_string(),
            });
        }

        let customer_name = non_blank(self.customer_name.clone())
            .or_else(|| non_blank(sale.customer_name.clone()))
            .ok_or_else(|| ValidationError::Required {
                field: "customer_name".to_string(),
            })?;
        validate_customer_name(&customer_name)?;

        let customer_email = non_blank(self.customer_email.clone())
            .or_else(|| non_blank(sale.customer_email.clone()));
        if let Some(email) = &customer_email {
            validate_email(email)?;
        }

        let iban_code = match non_blank(self.iban_code.clone()) {
            Some(raw) => Some(normalize_bank_code(&raw)?),
            None => None,
        };

        let tax_rate = self.tax_rate.unwrap_or(config.default_tax_rate);
        validate_tax_rate(tax_rate)?;

        let due_date = match self.due_date {
            Some(date) if date < today => {
                return Err(ValidationError::InvalidFormat {
                    field: "due_date".to_string(),
                    reason: format!("must not be before {}", today),
                }
                .into());
            }
            Some(date) => date,
            None => default_due_date(today, config.payment_term_days)?,
        };

        let invoice_number = match non_blank(self.invoice_number.clone()) {
            Some(number) => {
                validate_invoice_number(&number)?;
                Some(number)
            }
            None => None,
        };

        Ok(InvoiceDraft {
            sale_id: sale.id.clone(),
            customer_name,
            customer_email,
            customer_address: non_blank(self.customer_address.clone()),
            customer_cuit: non_blank(self.customer_cuit.clone()),
            iban_code,
            totals: InvoiceTotals::compute(sale.total, tax_rate)?,
            due_date,
            status: self.status.unwrap_or_default(),
            invoice_number,
        })
    }
}

/// Billing details after defaults and validation, not yet numbered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub sale_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub customer_cuit: Option<String>,
    pub iban_code: Option<String>,
    pub totals: InvoiceTotals,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    /// `None` means the number is generated.
    pub invoice_number: Option<String>,
}

impl InvoiceDraft {
    /// Builds the invoice record with a fresh id.
    pub fn into_invoice(self, invoice_number: String, now: DateTime<Utc>) -> Invoice {
        Invoice {
            id: Uuid::new_v4().to_string(),
            invoice_number,
            sale_id: self.sale_id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_address: self.customer_address,
            customer_cuit: self.customer_cuit,
            iban_code: self.iban_code,
            subtotal: self.totals.subtotal,
            tax_rate: self.totals.tax_rate,
            tax_amount: self.totals.tax_amount,
            total: self.totals.total,
            status: self.status,
            due_date: self.due_date,
            created: now,
            updated: now,
        }
    }
}

/// `today + term_days`.
pub fn default_due_date(today: NaiveDate, term_days: u32) -> CoreResult<NaiveDate> {
    today
        .checked_add_signed(Duration::days(i64::from(term_days)))
        .ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "payment_term_days".to_string(),
                min: 0,
                max: i64::from(u32::MAX),
            }
            .into()
        })
}

/// Invoice numbers: non-empty, at most 50 characters, no whitespace.
pub fn validate_invoice_number(number: &str) -> Result<(), ValidationError> {
    if number.is_empty() {
        return Err(ValidationError::Required {
            field: "invoice_number".to_string(),
        });
    }
    if number.chars().count() > MAX_INVOICE_NUMBER_LEN {
        return Err(ValidationError::TooLong {
            field: "invoice_number".to_string(),
            max: MAX_INVOICE_NUMBER_LEN,
        });
    }
    if number.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "invoice_number".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numbering
// =============================================================================

/// Source of generated invoice numbers.
///
/// `attempt` starts at 0 and increases each time the previous number was
/// already taken.
pub trait InvoiceNumbering: Send + Sync {
    fn next(&self, attempt: u32) -> String;
}

impl<T: InvoiceNumbering + ?Sized> InvoiceNumbering for Arc<T> {
    fn next(&self, attempt: u32) -> String {
        (**self).next(attempt)
    }
}

/// `INV-<unix millis>`, with a random suffix on retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampNumbering;

impl InvoiceNumbering for TimestampNumbering {
    fn next(&self, attempt: u32) -> String {
        generate_invoice_number(Utc::now(), attempt)
    }
}

/// Generates an invoice number.
///
/// ## Format
/// ```text
/// attempt 0:  INV-1760875200000
/// attempt 1+: INV-1760875200000-3fa9
/// ```
pub fn generate_invoice_number(now: DateTime<Utc>, attempt: u32) -> String {
    let base = format!("{}-{}", INVOICE_NUMBER_PREFIX, now.timestamp_millis());
    if attempt == 0 {
        return base;
    }
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", base, &suffix[..4])
}

// =============================================================================
// Unit Tests
// =============================================================================
