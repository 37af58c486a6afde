//! # Commands
//!
//! The boundary a UI calls: plain async functions over a [`Database`]
//! handle that return camelCase-serialisable DTOs or an [`ApiError`].
//!
//! | Module | Commands |
//! |---|---|
//! | [`product`] | `list_products`, `low_stock_products`, `get_product`, `create_product`, `restock_product` |
//! | [`sale`] | `sell`, `complete_sale`, `cancel_sale`, `get_sale`, `list_sales` |
//! | [`invoice`] | `generate_invoice`, `mark_invoice`, `get_invoice`, `list_invoices` |
//! | [`dashboard`] | `dashboard`, `seed_catalog` |
//!
//! [`Database`]: mostrador_db::Database
//! [`ApiError`]: crate::error::ApiError

pub mod dashboard;
pub mod invoice;
pub mod product;
pub mod sale;
