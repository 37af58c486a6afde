//! Dashboard and demo-data commands.

use serde::Serialize;

use crate::error::ApiError;
use mostrador_db::seed::seed_demo_catalog;
use mostrador_db::Database;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
    pub store_name: String,
    pub product_count: i64,
    pub low_stock_count: i64,
    pub completed_sales: i64,
    pub pending_sales: i64,
    pub invoice_count: i64,
    pub revenue: String,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub inserted: usize,
}

pub async fn dashboard(
    db: &Database,
    store_name: &str,
    low_stock_threshold: i64,
) -> Result<DashboardDto, ApiError> {
    let summary = db.dashboard_summary(low_stock_threshold).await?;

    Ok(DashboardDto {
        store_name: store_name.to_string(),
        product_count: summary.product_count,
        low_stock_count: summary.low_stock_count,
        completed_sales: summary.completed_sales,
        pending_sales: summary.pending_sales,
        invoice_count: summary.invoice_count,
        revenue: summary.revenue.to_decimal_string(),
        revenue_cents: summary.revenue.cents(),
    })
}

/// Seeds the demo catalog if the database has no products yet.
pub async fn seed_catalog(db: &Database, count: usize) -> Result<SeedReport, ApiError> {
    let inserted = seed_demo_catalog(db, count).await?;
    Ok(SeedReport { inserted })
}
