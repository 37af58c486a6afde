//! # Engine Services
//!
//! The transactional operations of the back-office.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleProcessor ──────────► StockLedger::reserve_in(&mut tx, lines)      │
//! │   commit_sale                  guarded decrements, all-or-nothing       │
//! │   create_pending_sale                                                   │
//! │   complete_pending_sale                                                 │
//! │   cancel_sale                                                           │
//! │                                                                         │
//! │  InvoiceGenerator                                                       │
//! │   generate_invoice     completed sale → numbered invoice (one per sale) │
//! │   transition_invoice   status write only                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation runs in a single transaction. Queries inside that
//! transaction always go through it, never through the pool.

pub mod invoice;
pub mod sale;
pub mod stock;

pub use invoice::InvoiceGenerator;
pub use sale::SaleProcessor;
pub use stock::StockLedger;
