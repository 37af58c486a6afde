//! `mostrador` - back-office CLI.
//!
//! Every subcommand prints the command response as pretty JSON on stdout.
//! Failures print the `ApiError` JSON on stderr and exit with status 1.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use mostrador_backoffice::commands::invoice::InvoiceRequest;
use mostrador_backoffice::commands::product::CreateProductRequest;
use mostrador_backoffice::commands::sale::{LineRequest, SellRequest};
use mostrador_backoffice::commands::{dashboard, invoice, product, sale};
use mostrador_backoffice::{init_tracing, ApiError, AppConfig};
use mostrador_db::{Database, DbConfig};

#[derive(Parser)]
#[command(name = "mostrador", version, about = "Stock, sales and invoices for a small shop")]
struct Cli {
    /// Database file (overrides MOSTRADOR_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the catalog
    Products,

    /// Products at or below the low-stock threshold
    LowStock {
        #[arg(long)]
        threshold: Option<i64>,
    },

    /// Add a product to the catalog
    AddProduct {
        code: String,
        name: String,
        /// Unit price, e.g. 2500 or 2500.50
        price: String,
        #[arg(long, default_value_t = 0)]
        stock: i64,
        #[arg(long, default_value = "general")]
        category: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Add units to a product (id or code)
    Restock { product: String, quantity: i64 },

    /// Sell lines given as PRODUCT:QTY (product id or code)
    Sell {
        #[arg(required = true)]
        lines: Vec<LineRequest>,
        /// Record without reserving stock
        #[arg(long)]
        pending: bool,
        #[arg(long)]
        customer: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },

    /// Complete a pending sale
    Complete { sale_id: String },

    /// Cancel a sale that has no invoice
    Cancel { sale_id: String },

    /// List sales, newest first
    Sales {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Generate the invoice for a completed sale
    Invoice {
        sale_id: String,
        #[arg(long)]
        customer: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        cuit: Option<String>,
        /// Bank account code, spaces allowed
        #[arg(long)]
        iban: Option<String>,
        /// Percentage, e.g. 21 or 10.5
        #[arg(long)]
        tax_rate: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        due_date: Option<NaiveDate>,
        #[arg(long)]
        number: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },

    /// List invoices, newest first
    Invoices {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show one invoice (id or number)
    ShowInvoice { invoice: String },

    /// Change an invoice status (sent, paid, overdue)
    Mark { invoice_id: String, status: String },

    /// Dashboard numbers
    Summary,

    /// Fill an empty catalog with demo products
    Seed {
        #[arg(long, default_value_t = 60)]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(path) = cli.db {
        config.database_path = path;
    }

    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    info!(path = %config.database_path.display(), "Opening database");
    let db = Database::new(DbConfig::new(&config.database_path)).await?;

    let outcome = run(&db, &config, cli.command).await;
    db.close().await;

    match outcome {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", serde_json::to_string_pretty(&err)?);
            std::process::exit(1);
        }
    }
}

async fn run(db: &Database, config: &AppConfig, command: Command) -> Result<Value, ApiError> {
    let threshold = config.billing.low_stock_threshold;

    match command {
        Command::Products => json(product::list_products(db).await?),
        Command::LowStock { threshold: t } => {
            json(product::low_stock_products(db, t.unwrap_or(threshold)).await?)
        }
        Command::AddProduct {
            code,
            name,
            price,
            stock,
            category,
            description,
        } => json(
            product::create_product(
                db,
                CreateProductRequest {
                    code,
                    name,
                    price,
                    stock,
                    category,
                    description,
                },
            )
            .await?,
        ),
        Command::Restock { product: reference, quantity } => {
            json(product::restock_product(db, &reference, quantity).await?)
        }
        Command::Sell {
            lines,
            pending,
            customer,
            email,
        } => json(
            sale::sell(
                db,
                SellRequest {
                    lines,
                    customer_name: customer,
                    customer_email: email,
                    pending,
                },
            )
            .await?,
        ),
        Command::Complete { sale_id } => json(sale::complete_sale(db, &sale_id).await?),
        Command::Cancel { sale_id } => json(sale::cancel_sale(db, &sale_id).await?),
        Command::Sales { status, limit } => {
            json(sale::list_sales(db, status.as_deref(), limit).await?)
        }
        Command::Invoice {
            sale_id,
            customer,
            email,
            address,
            cuit,
            iban,
            tax_rate,
            due_date,
            number,
            status,
        } => json(
            invoice::generate_invoice(
                db,
                &config.billing,
                InvoiceRequest {
                    sale_id,
                    customer_name: customer,
                    customer_email: email,
                    customer_address: address,
                    customer_cuit: cuit,
                    iban_code: iban,
                    tax_rate,
                    due_date,
                    invoice_number: number,
                    status,
                },
            )
            .await?,
        ),
        Command::Invoices { status, limit } => {
            json(invoice::list_invoices(db, status.as_deref(), limit).await?)
        }
        Command::ShowInvoice { invoice: reference } => {
            json(invoice::get_invoice(db, &reference).await?)
        }
        Command::Mark { invoice_id, status } => {
            json(invoice::mark_invoice(db, &invoice_id, &status).await?)
        }
        Command::Summary => json(dashboard::dashboard(db, &config.store_name, threshold).await?),
        Command::Seed { count } => json(dashboard::seed_catalog(db, count).await?),
    }
}

fn json(value: impl Serialize) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(e.to_string()))
}
