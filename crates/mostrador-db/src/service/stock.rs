//! # Stock Ledger
//!
//! Enforces `stock >= 0` and applies multi-line decrements atomically.
//!
//! ## Reservation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reserve_in(tx, [(A, 2), (B, 5)])                                      │
//! │                                                                         │
//! │  for each line:                                                        │
//! │    UPDATE products SET stock = stock - q                               │
//! │     WHERE id = ? AND stock >= q          ← check and decrement in one  │
//! │       │                                    statement                   │
//! │       ├── 1 row  → next line                                           │
//! │       └── 0 rows → SELECT stock                                        │
//! │                     ├── no row → UnknownProduct                        │
//! │                     └── n      → InsufficientStock { requested, n }    │
//! │                                                                         │
//! │  Any error: the caller drops the transaction, earlier lines roll back  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite serialises writers, so two reservations for the last unit cannot
//! both pass the guard.

use std::collections::HashSet;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, instrument, warn};

use crate::error::ServiceResult;
use mostrador_core::cart::CartLine;
use mostrador_core::{CoreError, ValidationError};

/// Atomic stock decrements and replenishment.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    /// Reserves every line in one transaction and commits.
    ///
    /// Lines must already be aggregated (one per product).
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn reserve_and_commit(&self, lines: &[CartLine]) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        reserve_in(&mut *tx, lines).await?;
        tx.commit().await?;

        info!("Stock reserved");
        Ok(())
    }

    /// Adds `quantity` units to a product. Returns the new stock level.
    #[instrument(skip(self))]
    pub async fn restock(&self, product_id: &str, quantity: i64) -> ServiceResult<i64> {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let stock: Option<i64> = sqlx::query_scalar(
            "UPDATE products SET stock = stock + ?2, updated = ?3 WHERE id = ?1 RETURNING stock",
        )
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        let stock = stock.ok_or_else(|| CoreError::UnknownProduct(product_id.to_string()))?;
        info!(stock, "Product restocked");
        Ok(stock)
    }
}

/// Decrements stock for every line on the caller's connection.
///
/// Does not commit. On error some lines may already be decremented inside
/// the transaction; dropping it without commit discards them.
///
/// ## Errors
/// - [`CoreError::Validation`] for an empty list, a non-positive quantity
///   or the same product twice
/// - [`CoreError::UnknownProduct`] if a product does not exist
/// - [`CoreError::InsufficientStock`] if a product has fewer units than asked
pub async fn reserve_in(conn: &mut SqliteConnection, lines: &[CartLine]) -> ServiceResult<()> {
    check_lines(lines)?;

    let now = Utc::now();

    for line in lines {
        let result = sqlx::query(
            "UPDATE products SET stock = stock - ?2, updated = ?3 WHERE id = ?1 AND stock >= ?2",
        )
        .bind(&line.product_id)
        .bind(line.quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 1 {
            debug!(product_id = %line.product_id, quantity = line.quantity, "Stock decremented");
            continue;
        }

        let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(&line.product_id)
            .fetch_optional(&mut *conn)
            .await?;

        let err = match available {
            None => CoreError::UnknownProduct(line.product_id.clone()),
            Some(available) => CoreError::InsufficientStock {
                product_id: line.product_id.clone(),
                requested: line.quantity,
                available,
            },
        };
        warn!(error = %err, "Stock reservation rejected");
        return Err(err.into());
    }

    Ok(())
}

fn check_lines(lines: &[CartLine]) -> Result<(), ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }
        if !seen.insert(line.product_id.as_str()) {
            return Err(ValidationError::InvalidFormat {
                field: "lines".to_string(),
                reason: format!(
                    "product {} appears more than once; aggregate lines first",
                    line.product_id
                ),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::pool::{Database, DbConfig};
    use mostrador_core::{Money, Product};

    async fn setup(stocks: &[(&str, i64)]) -> (Database, Vec<Product>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut products = Vec::new();
        for (code, stock) in stocks {
            let product = Product::new(code, code, Money::from_cents(1000), *stock, "general").unwrap();
            products.push(db.products().insert(&product).await.unwrap());
        }
        (db, products)
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_reserve_decrements_every_line() {
        let (db, p) = setup(&[("A", 5), ("B", 3)]).await;

        db.stock_ledger()
            .reserve_and_commit(&[CartLine::new(&p[0].id, 2), CartLine::new(&p[1].id, 3)])
            .await
            .unwrap();

        assert_eq!(stock_of(&db, &p[0].id).await, 3);
        assert_eq!(stock_of(&db, &p[1].id).await, 0);
    }

    #[tokio::test]
    async fn test_insufficient_line_leaves_all_stock_untouched() {
        let (db, p) = setup(&[("A", 5), ("B", 3)]).await;

        let err = db
            .stock_ledger()
            .reserve_and_commit(&[CartLine::new(&p[0].id, 2), CartLine::new(&p[1].id, 4)])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InsufficientStock { requested: 4, available: 3, .. })
        ));
        assert_eq!(stock_of(&db, &p[0].id).await, 5);
        assert_eq!(stock_of(&db, &p[1].id).await, 3);
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let (db, p) = setup(&[("A", 5)]).await;

        let err = db
            .stock_ledger()
            .reserve_and_commit(&[CartLine::new(&p[0].id, 1), CartLine::new("nope", 1)])
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Core(CoreError::UnknownProduct(ref id)) if id == "nope"));
        assert_eq!(stock_of(&db, &p[0].id).await, 5);
    }

    #[tokio::test]
    async fn test_rejects_unaggregated_lines() {
        let (db, p) = setup(&[("A", 5)]).await;

        let err = db
            .stock_ledger()
            .reserve_and_commit(&[CartLine::new(&p[0].id, 1), CartLine::new(&p[0].id, 1)])
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Core(CoreError::Validation(_))));
        assert_eq!(stock_of(&db, &p[0].id).await, 5);

        assert!(db.stock_ledger().reserve_and_commit(&[]).await.is_err());
    }

    #[tokio::test]
    async fn test_restock() {
        let (db, p) = setup(&[("A", 0)]).await;

        assert_eq!(db.stock_ledger().restock(&p[0].id, 12).await.unwrap(), 12);
        assert!(db.stock_ledger().restock(&p[0].id, 0).await.is_err());
        assert!(matches!(
            db.stock_ledger().restock("nope", 1).await,
            Err(ServiceError::Core(CoreError::UnknownProduct(_)))
        ));
    }
}
