//! Back-office configuration.
//!
//! Loaded from environment variables with fallback to defaults.
//!
//! | Variable | Default |
//! |---|---|
//! | `MOSTRADOR_DB_PATH` | platform data dir + `mostrador.db` |
//! | `MOSTRADOR_STORE_NAME` | `Mostrador` |
//! | `MOSTRADOR_TAX_RATE` | `21` (percent) |
//! | `MOSTRADOR_PAYMENT_TERM_DAYS` | `30` |
//! | `MOSTRADOR_INVOICE_NUMBER_ATTEMPTS` | `3` |
//! | `MOSTRADOR_LOW_STOCK_THRESHOLD` | `5` |

use directories::ProjectDirs;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use mostrador_core::{BillingConfig, TaxRate};

/// Back-office configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,

    /// Shown in the dashboard header.
    pub store_name: String,

    pub billing: BillingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns the raw value of a
    /// variable if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = BillingConfig::default();

        let database_path = match lookup("MOSTRADOR_DB_PATH").filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_database_path()?,
        };

        let default_tax_rate = match lookup("MOSTRADOR_TAX_RATE") {
            Some(raw) => TaxRate::parse_percentage(&raw)
                .map_err(|_| ConfigError::InvalidValue("MOSTRADOR_TAX_RATE".to_string()))?,
            None => defaults.default_tax_rate,
        };

        let billing = BillingConfig {
            default_tax_rate,
            payment_term_days: parse_or(
                &lookup,
                "MOSTRADOR_PAYMENT_TERM_DAYS",
                defaults.payment_term_days,
            )?,
            invoice_number_attempts: parse_or(
                &lookup,
                "MOSTRADOR_INVOICE_NUMBER_ATTEMPTS",
                defaults.invoice_number_attempts,
            )?,
            low_stock_threshold: parse_or(
                &lookup,
                "MOSTRADOR_LOW_STOCK_THRESHOLD",
                defaults.low_stock_threshold,
            )?,
        };

        billing
            .validate()
            .map_err(|e| ConfigError::InvalidBilling(e.to_string()))?;

        Ok(AppConfig {
            database_path,
            store_name: lookup("MOSTRADOR_STORE_NAME").unwrap_or_else(|| "Mostrador".to_string()),
            billing,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Platform data directory.
///
/// - **macOS**: `~/Library/Application Support/com.mostrador.backoffice/mostrador.db`
/// - **Windows**: `%APPDATA%\mostrador\backoffice\data\mostrador.db`
/// - **Linux**: `~/.local/share/backoffice/mostrador.db`
fn default_database_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("com", "mostrador", "backoffice")
        .ok_or_else(|| ConfigError::MissingRequired("MOSTRADOR_DB_PATH".to_string()))?;

    Ok(dirs.data_dir().join("mostrador.db"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Invalid billing configuration: {0}")]
    InvalidBilling(String),

    #[error("Missing required configuration: {0} (no platform data directory)")]
    MissingRequired(String),
}
