//! # Domain Types
//!
//! Core domain types used throughout Mostrador.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Invoice      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  items[]        │◄──│  sale_id        │       │
//! │  │  code (unique)  │   │  total          │   │  invoice_number │       │
//! │  │  price          │   │  status         │   │  subtotal, tax  │       │
//! │  │  stock >= 0     │   └─────────────────┘   │  status         │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │   SaleStatus    │   │  InvoiceStatus  │                             │
//! │  │  pending        │   │  draft          │                             │
//! │  │  completed      │   │  sent           │                             │
//! │  │  cancelled      │   │  paid, overdue  │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Writes
//! Both status enums are closed and carry an explicit transition table.
//! Every status write in the database layer goes through
//! [`SaleStatus::ensure_transition`] / [`InvoiceStatus::ensure_transition`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, TaxRate};
use crate::validation::{
    validate_category, validate_code, validate_price, validate_product_name, validate_stock,
};

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business code (barcode or internal code), unique in the catalog.
    pub code: String,

    pub name: String,

    pub description: Option<String>,

    /// Unit price, never negative.
    pub price: Money,

    /// Units on hand, never negative.
    pub stock: i64,

    pub category: String,

    #[ts(as = "String")]
    pub created: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated: DateTime<Utc>,
}

impl Product {
    /// Creates a validated product with a fresh id and timestamps.
    pub fn new(
        code: &str,
        name: &str,
        price: Money,
        stock: i64,
        category: &str,
    ) -> CoreResult<Self> {
        validate_code(code)?;
        validate_product_name(name)?;
        validate_price(price)?;
        validate_stock(stock)?;
        validate_category(category)?;

        let now = Utc::now();
        Ok(Product {
            id: Uuid::new_v4().to_string(),
            code: code.trim().to_string(),
            name: name.trim().to_string(),
            description: None,
            price,
            stock,
            category: category.trim().to_string(),
            created: now,
            updated: now,
        })
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = non_blank(description);
        self
    }

    /// Re-checks field rules after a catalog edit.
    pub fn validate(&self) -> CoreResult<()> {
        validate_code(&self.code)?;
        validate_product_name(&self.name)?;
        validate_price(self.price)?;
        validate_stock(self.stock)?;
        validate_category(&self.category)?;
        Ok(())
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Cart recorded but not fulfilled; stock untouched.
    Pending,
    /// Stock reserved and sale committed.
    Completed,
    Cancelled,
}

impl SaleStatus {
    pub const ALL: [SaleStatus; 3] = [
        SaleStatus::Pending,
        SaleStatus::Completed,
        SaleStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }

    /// Allowed transitions:
    /// ```text
    /// pending ──► completed ──► cancelled
    ///    │                         ▲
    ///    └─────────────────────────┘
    /// ```
    pub const fn can_transition_to(&self, next: SaleStatus) -> bool {
        matches!(
            (self, next),
            (SaleStatus::Pending, SaleStatus::Completed)
                | (SaleStatus::Pending, SaleStatus::Cancelled)
                | (SaleStatus::Completed, SaleStatus::Cancelled)
        )
    }

    pub fn ensure_transition(&self, next: SaleStatus) -> CoreResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::InvalidStatusTransition {
                entity: "Sale",
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Pending
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SaleStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: SaleStatus::ALL.iter().map(|s| s.to_string()).collect(),
            })
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One line of a sale.
///
/// Snapshot pattern: name and price are copied from the product when the
/// sale is created and never re-read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLineItem {
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price: Money,
    /// `unit_price × quantity`.
    pub line_total: Money,
}

impl SaleLineItem {
    /// Builds a line from a product snapshot, computing the line total.
    ///
    /// ## Errors
    /// [`ValidationError::OutOfRange`] when the line total overflows.
    pub fn from_product(product: &Product, quantity: i64) -> CoreResult<Self> {
        let line_total = product
            .price
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| amount_overflow("line_total"))?;

        Ok(SaleLineItem {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
            line_total,
        })
    }
}

/// A computed amount that does not fit in `i64` cents.
pub(crate) fn amount_overflow(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

/// Optional customer data captured at the counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Customer {
    /// Blank strings are treated as absent.
    pub fn new(name: Option<String>, email: Option<String>) -> Self {
        Customer {
            name: non_blank(name),
            email: non_blank(email),
        }
    }
}

/// A sale transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Lines in entry order.
    pub items: Vec<SaleLineItem>,
    pub total: Money,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub created: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated: DateTime<Utc>,
}

impl Sale {
    /// Sum of the line totals.
    pub fn lines_total(&self) -> Money {
        self.items.iter().map(|item| item.line_total).sum()
    }
}

// =============================================================================
// Invoice Status
// =============================================================================

/// The status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 4] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Paid,
        InvoiceStatus::Overdue,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    /// Allowed transitions:
    /// ```text
    /// draft ──► sent ──► paid
    ///             │       ▲
    ///             ▼       │
    ///          overdue ───┘
    /// ```
    pub const fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        matches!(
            (self, next),
            (InvoiceStatus::Draft, InvoiceStatus::Sent)
                | (InvoiceStatus::Sent, InvoiceStatus::Paid)
                | (InvoiceStatus::Sent, InvoiceStatus::Overdue)
                | (InvoiceStatus::Overdue, InvoiceStatus::Paid)
        )
    }

    pub fn ensure_transition(&self, next: InvoiceStatus) -> CoreResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::InvalidStatusTransition {
                entity: "Invoice",
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Draft
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: InvoiceStatus::ALL.iter().map(|s| s.to_string()).collect(),
            })
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A billing document derived from exactly one completed sale.
///
/// `subtotal`, `tax_amount` and `total` are frozen at generation time and
/// never follow later changes to the sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub sale_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    /// Argentine tax id (CUIT), free text.
    pub customer_cuit: Option<String>,
    /// Bank account code, normalized (uppercase, no whitespace).
    pub iban_code: Option<String>,
    pub subtotal: Money,
    pub tax_rate: TaxRate,
    pub tax_amount: Money,
    pub total: Money,
    pub status: InvoiceStatus,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    #[ts(as = "String")]
    pub created: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated: DateTime<Utc>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Trims a string and maps empty results to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_transitions() {
        assert!(SaleStatus::Pending.can_transition_to(SaleStatus::Completed));
        assert!(SaleStatus::Pending.can_transition_to(SaleStatus::Cancelled));
        assert!(SaleStatus::Completed.can_transition_to(SaleStatus::Cancelled));

        assert!(!SaleStatus::Completed.can_transition_to(SaleStatus::Pending));
        assert!(!SaleStatus::Cancelled.can_transition_to(SaleStatus::Completed));
        assert!(!SaleStatus::Completed.can_transition_to(SaleStatus::Completed));
    }

    #[test]
    fn test_invoice_transitions() {
        use InvoiceStatus::*;

        let allowed = [(Draft, Sent), (Sent, Paid), (Sent, Overdue), (Overdue, Paid)];
        for from in InvoiceStatus::ALL {
            for to in InvoiceStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_ensure_transition_error() {
        let err = InvoiceStatus::Paid
            .ensure_transition(InvoiceStatus::Draft)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invoice cannot move from paid to draft");
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("completed".parse::<SaleStatus>().unwrap(), SaleStatus::Completed);
        assert_eq!(" Overdue ".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Overdue);
        assert!("archived".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn test_status_serde_is_lowercase() {
        let json = serde_json::to_string(&InvoiceStatus::Overdue).unwrap();
        assert_eq!(json, "\"overdue\"");
        let status: SaleStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, SaleStatus::Cancelled);
    }

    #[test]
    fn test_product_new_validates() {
        let product = Product::new(" YERBA-500 ", "Yerba Mate 500g", Money::from_cents(350_000), 12, "almacen")
            .unwrap()
            .with_description(Some("  ".to_string()));
        assert_eq!(product.code, "YERBA-500");
        assert_eq!(product.description, None);
        assert_eq!(product.stock, 12);

        assert!(Product::new("", "x", Money::zero(), 0, "c").is_err());
        assert!(Product::new("A", "x", Money::from_cents(-1), 0, "c").is_err());
        assert!(Product::new("A", "x", Money::zero(), -1, "c").is_err());
    }

    #[test]
    fn test_customer_blank_fields_are_absent() {
        let customer = Customer::new(Some("  ".to_string()), Some(" ana@example.com ".to_string()));
        assert_eq!(customer.name, None);
        assert_eq!(customer.email.as_deref(), Some("ana@example.com"));
    }
}
