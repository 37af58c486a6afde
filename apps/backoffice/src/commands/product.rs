//! # Product Commands
//!
//! Catalog listing, lookup, creation and restocking.
//!
//! Products are referenced either by id or by business code: the id is tried
//! first, then the code.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use mostrador_core::{Money, Product};
use mostrador_db::Database;

/// Product DTO for the UI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// Two-decimal text, e.g. `"2500.00"`.
    pub price: String,
    pub price_cents: i64,
    pub stock: i64,
    pub category: String,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            id: p.id,
            code: p.code,
            name: p.name,
            description: p.description,
            price: p.price.to_decimal_string(),
            price_cents: p.price.cents(),
            stock: p.stock,
            category: p.category,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub code: String,
    pub name: String,
    /// Decimal text, at most two places.
    pub price: String,
    pub stock: i64,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// All products ordered by name.
pub async fn list_products(db: &Database) -> Result<Vec<ProductDto>, ApiError> {
    let products = db.products().list().await?;
    Ok(products.into_iter().map(ProductDto::from).collect())
}

/// Products at or below `threshold`, lowest stock first.
pub async fn low_stock_products(db: &Database, threshold: i64) -> Result<Vec<ProductDto>, ApiError> {
    let products = db.products().low_stock(threshold).await?;
    Ok(products.into_iter().map(ProductDto::from).collect())
}

pub async fn get_product(db: &Database, reference: &str) -> Result<ProductDto, ApiError> {
    Ok(find_product(db, reference).await?.into())
}

pub async fn create_product(
    db: &Database,
    request: CreateProductRequest,
) -> Result<ProductDto, ApiError> {
    let price = Money::parse_decimal(&request.price)?;
    let product = Product::new(
        &request.code,
        &request.name,
        price,
        request.stock,
        &request.category,
    )?
    .with_description(request.description);

    let product = db.products().insert(&product).await?;
    info!(code = %product.code, "Product created");

    Ok(product.into())
}

/// Adds `quantity` units and returns the updated product.
pub async fn restock_product(
    db: &Database,
    reference: &str,
    quantity: i64,
) -> Result<ProductDto, ApiError> {
    let product = find_product(db, reference).await?;
    let stock = db.stock_ledger().restock(&product.id, quantity).await?;

    Ok(ProductDto {
        stock,
        ..product.into()
    })
}

/// Resolves a product by id, then by code.
pub(crate) async fn find_product(db: &Database, reference: &str) -> Result<Product, ApiError> {
    let reference = reference.trim();
    let products = db.products();

    if let Some(product) = products.get_by_id(reference).await? {
        return Ok(product);
    }

    products
        .get_by_code(reference)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", reference))
}
