//! # mostrador-db: Persistence and Engine Services for Mostrador
//!
//! SQLite storage through sqlx, plus the transactional operations that keep
//! stock, sales and invoices consistent.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mostrador Data Flow                              │
//! │                                                                         │
//! │  backoffice command (sell, invoice, ...)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   mostrador-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │    Services    │    │ Repositories │  │   │
//! │  │   │   (pool.rs)   │───►│ StockLedger    │───►│ Product      │  │   │
//! │  │   │               │    │ SaleProcessor  │    │ Sale         │  │   │
//! │  │   │ SqlitePool    │    │ InvoiceGen     │    │ Invoice      │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL) with embedded migrations                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mostrador_db::{Database, DbConfig};
//! use mostrador_core::cart::CartLine;
//! use mostrador_core::invoice::BillingDetails;
//!
//! let db = Database::new(DbConfig::new("mostrador.db")).await?;
//!
//! let sale = db
//!     .sale_processor()
//!     .commit_sale(&[CartLine::new(product_id, 2)], Customer::default())
//!     .await?;
//!
//! let invoice = db
//!     .invoice_generator()
//!     .generate_invoice(&sale.id, &BillingDetails::new().customer_name("Ana"))
//!     .await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;
pub mod service;
pub mod summary;

pub use error::{DbError, DbResult, ServiceError, ServiceResult};
pub use pool::{Database, DbConfig};
pub use summary::DashboardSummary;

pub use repository::invoice::{InvoiceFilter, InvoiceRepository};
pub use repository::product::ProductRepository;
pub use repository::sale::{SaleFilter, SaleRepository};
pub use service::{InvoiceGenerator, SaleProcessor, StockLedger};
