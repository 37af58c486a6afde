//! # Sale Commands
//!
//! ## Sell Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sell { lines: [YER-1:2, FID-3:1, YER-1:3], pending: false }           │
//! │       │                                                                 │
//! │       ▼  resolve each product reference (id or code)                   │
//! │  [(id₁, 2), (id₂, 1), (id₁, 3)]                                        │
//! │       │                                                                 │
//! │       ▼  SaleProcessor::commit_sale   (or create_pending_sale)         │
//! │  Sale { items: [(id₁, 5), (id₂, 1)], total, status: completed }        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::commands::product::find_product;
use crate::error::ApiError;
use mostrador_core::cart::CartLine;
use mostrador_core::validation::validate_email;
use mostrador_core::{Customer, Sale, SaleLineItem, SaleStatus};
use mostrador_db::{Database, SaleFilter};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineDto {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: String,
    pub line_total: String,
}

impl From<SaleLineItem> for SaleLineDto {
    fn from(item: SaleLineItem) -> Self {
        SaleLineDto {
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            unit_price: item.unit_price.to_decimal_string(),
            line_total: item.line_total.to_decimal_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDto {
    pub id: String,
    pub items: Vec<SaleLineDto>,
    pub total: String,
    pub total_cents: i64,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub status: SaleStatus,
    pub created: DateTime<Utc>,
}

impl From<Sale> for SaleDto {
    fn from(sale: Sale) -> Self {
        SaleDto {
            id: sale.id,
            items: sale.items.into_iter().map(SaleLineDto::from).collect(),
            total: sale.total.to_decimal_string(),
            total_cents: sale.total.cents(),
            customer_name: sale.customer_name,
            customer_email: sale.customer_email,
            status: sale.status,
            created: sale.created,
        }
    }
}

/// One requested line. `product` is an id or a business code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub product: String,
    pub quantity: i64,
}

impl FromStr for LineRequest {
    type Err = ApiError;

    /// `PRODUCT:QTY`, or just `PRODUCT` for one unit.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (product, quantity) = match raw.rsplit_once(':') {
            Some((product, qty)) => {
                let quantity = qty.trim().parse().map_err(|_| {
                    ApiError::validation(format!("line '{}' must look like PRODUCT:QTY", raw))
                })?;
                (product.trim(), quantity)
            }
            None => (raw, 1),
        };

        if product.is_empty() {
            return Err(ApiError::validation(format!("line '{}' has no product", raw)));
        }

        Ok(LineRequest {
            product: product.to_string(),
            quantity,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellRequest {
    pub lines: Vec<LineRequest>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    /// Record the sale without reserving stock.
    #[serde(default)]
    pub pending: bool,
}

/// Commits a sale, or records it as pending.
pub async fn sell(db: &Database, request: SellRequest) -> Result<SaleDto, ApiError> {
    let customer = Customer::new(request.customer_name, request.customer_email);
    if let Some(email) = &customer.email {
        validate_email(email)?;
    }

    let mut lines = Vec::with_capacity(request.lines.len());
    for line in &request.lines {
        let product = find_product(db, &line.product).await?;
        lines.push(CartLine::new(product.id, line.quantity));
    }

    let processor = db.sale_processor();
    let sale = if request.pending {
        processor.create_pending_sale(&lines, customer).await?
    } else {
        processor.commit_sale(&lines, customer).await?
    };

    Ok(sale.into())
}

pub async fn complete_sale(db: &Database, sale_id: &str) -> Result<SaleDto, ApiError> {
    let sale = db.sale_processor().complete_pending_sale(sale_id).await?;
    Ok(sale.into())
}

pub async fn cancel_sale(db: &Database, sale_id: &str) -> Result<SaleDto, ApiError> {
    let sale = db.sale_processor().cancel_sale(sale_id).await?;
    Ok(sale.into())
}

pub async fn get_sale(db: &Database, sale_id: &str) -> Result<SaleDto, ApiError> {
    db.sales()
        .get_by_id(sale_id)
        .await?
        .map(SaleDto::from)
        .ok_or_else(|| ApiError::not_found("Sale", sale_id))
}

/// Sales newest first, optionally only those in `status`.
pub async fn list_sales(
    db: &Database,
    status: Option<&str>,
    limit: Option<u32>,
) -> Result<Vec<SaleDto>, ApiError> {
    let filter = SaleFilter {
        status: status.map(SaleStatus::from_str).transpose()?,
        limit,
    };

    let sales = db.sales().list(&filter).await?;
    Ok(sales.into_iter().map(SaleDto::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::product::{create_product, CreateProductRequest};
    use crate::error::ErrorCode;
    use mostrador_db::DbConfig;

    async fn shop() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for (code, price, stock) in [("YER-1", "2500", 10), ("FID-1", "900.50", 2)] {
            create_product(
                &db,
                CreateProductRequest {
                    code: code.to_string(),
                    name: code.to_string(),
                    price: price.to_string(),
                    stock,
                    category: "almacen".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();
        }
        db
    }

    fn lines(raw: &[&str]) -> Vec<LineRequest> {
        raw.iter().map(|l| l.parse().unwrap()).collect()
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            "YER-1:3".parse::<LineRequest>().unwrap(),
            LineRequest {
                product: "YER-1".to_string(),
                quantity: 3
            }
        );
        assert_eq!("YER-1".parse::<LineRequest>().unwrap().quantity, 1);
        assert!("YER-1:x".parse::<LineRequest>().is_err());
        assert!(":2".parse::<LineRequest>().is_err());
    }

    #[tokio::test]
    async fn test_sell_by_code_merges_lines() {
        let db = shop().await;

        let sale = sell(
            &db,
            SellRequest {
                lines: lines(&["YER-1:2", "FID-1:1", "YER-1:3"]),
                customer_name: Some("Ana".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.items.len(), 2);
        assert_eq!(sale.items[0].quantity, 5);
        assert_eq!(sale.total, "13400.50");

        let listed = list_sales(&db, Some("completed"), None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(list_sales(&db, Some("bogus"), None).await.is_err());
    }

    #[tokio::test]
    async fn test_pending_then_complete_then_cancel() {
        let db = shop().await;

        let pending = sell(
            &db,
            SellRequest {
                lines: lines(&["FID-1:2"]),
                pending: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(pending.status, SaleStatus::Pending);

        let completed = complete_sale(&db, &pending.id).await.unwrap();
        assert_eq!(completed.status, SaleStatus::Completed);

        let err = complete_sale(&db, &pending.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let cancelled = cancel_sale(&db, &pending.id).await.unwrap();
        assert_eq!(cancelled.status, SaleStatus::Cancelled);
        assert_eq!(get_sale(&db, &pending.id).await.unwrap().status, SaleStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_sell_errors() {
        let db = shop().await;

        let err = sell(
            &db,
            SellRequest {
                lines: lines(&["FID-1:3"]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err = sell(
            &db,
            SellRequest {
                lines: lines(&["NOPE:1"]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = sell(&db, SellRequest::default()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        let err = sell(
            &db,
            SellRequest {
                lines: lines(&["YER-1:1"]),
                customer_email: Some("not-an-email".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
