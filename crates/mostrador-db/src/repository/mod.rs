//! # Repository Module
//!
//! Database repository implementations for Mostrador.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and Transactions                        │
//! │                                                                         │
//! │  Command / engine service                                              │
//! │       │                                                                 │
//! │       ├── db.products().list()            ← pool-backed methods        │
//! │       │                                                                 │
//! │       └── SaleRepository::insert_in(&mut tx, &sale)                    │
//! │                                           ← *_in functions run on the  │
//! │                                             caller's connection, so a  │
//! │                                             service can group several  │
//! │                                             writes in one transaction  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pool-backed read methods acquire a connection and delegate to the same
//! `*_in` function, so each query is written once.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog reads and edits
//! - [`SaleRepository`](sale::SaleRepository) - Sale records and status writes
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Invoice records and status writes

pub mod invoice;
pub mod product;
pub mod sale;

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::DbResult;

/// Writes `next` to `table.status` only if the row is currently in one of
/// `allowed_from`.
///
/// Returns `false` when no row matched (missing id or disallowed current
/// status); the caller decides which error that is.
pub(crate) async fn guarded_status_write(
    conn: &mut SqliteConnection,
    table: &str,
    id: &str,
    next: &'static str,
    allowed_from: &[&'static str],
    now: DateTime<Utc>,
) -> DbResult<bool> {
    if allowed_from.is_empty() {
        return Ok(false);
    }

    let placeholders = vec!["?"; allowed_from.len()].join(", ");
    let sql = format!(
        "UPDATE {} SET status = ?, updated = ? WHERE id = ? AND status IN ({})",
        table, placeholders
    );

    let mut query = sqlx::query(&sql).bind(next).bind(now).bind(id);
    for status in allowed_from {
        query = query.bind(*status);
    }

    let result = query.execute(&mut *conn).await?;
    Ok(result.rows_affected() == 1)
}
