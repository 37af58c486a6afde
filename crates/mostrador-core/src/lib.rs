//! # mostrador-core: Pure Business Logic for Mostrador
//!
//! Everything that decides whether a sale or an invoice is *correct* lives
//! here, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mostrador Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Web UI / CLI (external collaborators)              │   │
//! │  │      Cart picker ──► New sale ──► New invoice ──► Mark paid     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ mostrador-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │  invoice  │  │   │
//! │  │   │  Product  │  │   Money   │  │ aggregate │  │  totals   │  │   │
//! │  │   │   Sale    │  │  TaxRate  │  │  pricing  │  │  numbers  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  mostrador-db (Database Layer)                  │   │
//! │  │     repositories, stock ledger, sale and invoice services       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, Invoice, status enums)
//! - [`money`] - Money and TaxRate with integer arithmetic (no floating point!)
//! - [`cart`] - Cart validation, aggregation and pricing
//! - [`invoice`] - Invoice arithmetic, billing details and numbering
//! - [`config`] - Billing defaults
//! - [`error`] - Domain error types
//! - [`validation`] - Field and bank-code validation
//!
//! ## Example Usage
//!
//! ```rust
//! use mostrador_core::money::{Money, TaxRate};
//! use mostrador_core::invoice::InvoiceTotals;
//!
//! let subtotal = Money::from_cents(100_000); // 1000.00
//! let totals = InvoiceTotals::compute(subtotal, TaxRate::from_bps(2100)).unwrap();
//!
//! assert_eq!(totals.tax_amount.to_decimal_string(), "210.00");
//! assert_eq!(totals.total.to_decimal_string(), "1210.00");
//! ```

pub mod cart;
pub mod config;
pub mod error;
pub mod invoice;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::BillingConfig;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, TaxRate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products allowed in a single sale.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product in a sale (after aggregation).
///
/// Guards against typing 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum catalog unit price in cents (1,000,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;
