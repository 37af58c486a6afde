//! Dashboard read model.

use mostrador_core::Money;
use serde::Serialize;

/// Headline numbers for the back-office dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub product_count: i64,
    /// Products at or below the low-stock threshold.
    pub low_stock_count: i64,
    pub completed_sales: i64,
    pub pending_sales: i64,
    pub invoice_count: i64,
    /// Sum of completed sale totals.
    pub revenue: Money,
}
