//! # Cart Module
//!
//! Turns raw cart input into priced sale lines.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     From Cart to Sale Lines                             │
//! │                                                                         │
//! │  [(A, 2), (B, 1), (A, 3)]      raw lines, entry order                  │
//! │       │                                                                 │
//! │       ▼  aggregate_lines()                                              │
//! │  [(A, 5), (B, 1)]              duplicates merged, first position kept  │
//! │       │                                                                 │
//! │       ▼  price_lines(catalog snapshot)                                  │
//! │  [A × 5 @ 10.00 = 50.00,                                               │
//! │   B × 1 @  2.50 =  2.50]       total = 52.50 (recomputed, never input) │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{amount_overflow, Product, SaleLineItem};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A requested (product, quantity) pair.
///
/// Used both for cart input and for stock ledger reservations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        CartLine {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Validates raw lines and merges duplicates by summing quantities.
///
/// The merged line keeps the position of the first occurrence.
///
/// ## Errors
/// - [`CoreError::EmptyCart`] when there are no lines
/// - [`CoreError::Validation`] for a blank product id or a quantity < 1
/// - [`CoreError::QuantityTooLarge`] when a line or merged quantity exceeds
///   the cap, including sums past `i64::MAX`
/// - [`CoreError::CartTooLarge`] for too many distinct products
pub fn aggregate_lines(lines: &[CartLine]) -> CoreResult<Vec<CartLine>> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    let mut index: HashMap<&str, usize> = HashMap::new();

    for line in lines {
        let product_id = line.product_id.trim();
        if product_id.is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            }
            .into());
        }
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        match index.get(product_id) {
            // saturates so an overflowing sum still trips the cap below
            Some(&i) => merged[i].quantity = merged[i].quantity.saturating_add(line.quantity),
            None => {
                index.insert(product_id, merged.len());
                merged.push(CartLine::new(product_id, line.quantity));
            }
        }
    }

    if merged.len() > MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }

    if let Some(line) = merged.iter().find(|l| l.quantity > MAX_ITEM_QUANTITY) {
        return Err(CoreError::QuantityTooLarge {
            requested: line.quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(merged)
}

/// Priced lines ready to be written as a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedCart {
    pub items: Vec<SaleLineItem>,
    pub total: Money,
}

impl PricedCart {
    /// The stock the sale needs, one entry per product.
    pub fn stock_requests(&self) -> Vec<CartLine> {
        self.items
            .iter()
            .map(|item| CartLine::new(item.product_id.clone(), item.quantity))
            .collect()
    }
}

/// Snapshots name and price from `catalog` for each aggregated line.
///
/// `lines` must already be aggregated; the total is always recomputed here.
///
/// ## Errors
/// - [`CoreError::UnknownProduct`] for a line missing from `catalog`
/// - [`CoreError::Validation`] when a line total or the sale total overflows
pub fn price_lines(lines: &[CartLine], catalog: &HashMap<String, Product>) -> CoreResult<PricedCart> {
    let items = lines
        .iter()
        .map(|line| {
            let product = catalog
                .get(&line.product_id)
                .ok_or_else(|| CoreError::UnknownProduct(line.product_id.clone()))?;
            SaleLineItem::from_product(product, line.quantity)
        })
        .collect::<CoreResult<Vec<_>>>()?;

    let total = items
        .iter()
        .try_fold(Money::zero(), |acc, item| acc.checked_add(item.line_total))
        .ok_or_else(|| amount_overflow("total"))?;

    Ok(PricedCart { items, total })
}

// =============================================================================
// Unit Tests
// =============================================================================
