//! # Demo Catalog
//!
//! Fills an empty database with a realistic shop catalog for development.
//!
//! Each product gets:
//! - Code `{CATEGORY}-{NAME3}-{SEQ}` (e.g. `ALM-YER-003`)
//! - Name with a size variant
//! - Price from 350.00 up, plus a size surcharge
//! - Stock 0..=40, so some products start below the low-stock threshold

use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use mostrador_core::{Money, Product};

/// Category code, category name and product names.
const CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "ALM",
        "almacen",
        &[
            "Yerba Mate",
            "Fideos Tirabuzon",
            "Arroz Largo Fino",
            "Harina 000",
            "Aceite de Girasol",
            "Azucar",
            "Dulce de Leche",
            "Pure de Tomate",
            "Lentejas",
            "Polenta",
        ],
    ),
    (
        "BEB",
        "bebidas",
        &[
            "Agua Mineral",
            "Soda",
            "Gaseosa Cola",
            "Gaseosa Lima",
            "Jugo de Naranja",
            "Cerveza Rubia",
            "Vino Malbec",
            "Fernet",
        ],
    ),
    (
        "LAC",
        "lacteos",
        &[
            "Leche Entera",
            "Leche Descremada",
            "Yogur Bebible",
            "Queso Cremoso",
            "Manteca",
            "Crema de Leche",
        ],
    ),
    (
        "LIM",
        "limpieza",
        &[
            "Lavandina",
            "Detergente",
            "Jabon en Polvo",
            "Esponja",
            "Papel Higienico",
        ],
    ),
];

/// Size variant and surcharge in cents.
const SIZES: &[(&str, i64)] = &[
    ("Chico", 0),
    ("Mediano", 25_000),
    ("Grande", 60_000),
];

/// Inserts up to `count` demo products. Returns how many were inserted.
///
/// Does nothing if the catalog already has products.
pub async fn seed_demo_catalog(db: &Database, count: usize) -> DbResult<usize> {
    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Catalog not empty, skipping seed");
        return Ok(0);
    }

    let products = db.products();
    let mut inserted = 0;

    'outer: for (category_code, category, names) in CATEGORIES {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, surcharge)) in SIZES.iter().enumerate() {
                if inserted >= count {
                    break 'outer;
                }

                let seq = name_idx * SIZES.len() + size_idx;
                let product = demo_product(category_code, category, name, size, *surcharge, seq);
                products.insert(&product?).await?;
                inserted += 1;
            }
        }
    }

    info!(inserted, "Demo catalog seeded");
    Ok(inserted)
}

fn demo_product(
    category_code: &str,
    category: &str,
    name: &str,
    size: &str,
    surcharge: i64,
    seq: usize,
) -> DbResult<Product> {
    let short: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    let code = format!("{}-{}-{:03}", category_code, short, seq);

    let base = 35_000 + ((seq as i64 * 7_919) % 150_000);
    let price = Money::from_cents(base + surcharge);
    let stock = (seq as i64 * 13) % 41;

    let full_name = format!("{} {}", name, size);

    Product::new(&code, &full_name, price, stock, category)
        .map_err(|err| DbError::invalid_data("Product", code, err))
}
