//! Billing defaults shared by the engine and the app.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::TaxRate;
use crate::validation::{validate_tax_rate, ValidationResult};

/// Defaults applied when billing details leave a field unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Tax rate used when none is given (21% IVA).
    pub default_tax_rate: TaxRate,

    /// Days from invoice creation to the default due date.
    pub payment_term_days: u32,

    /// How many generated invoice numbers to try before giving up.
    pub invoice_number_attempts: u32,

    /// Products at or below this stock show up in the low-stock list.
    pub low_stock_threshold: i64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            default_tax_rate: TaxRate::from_bps(2100),
            payment_term_days: 30,
            invoice_number_attempts: 3,
            low_stock_threshold: 5,
        }
    }
}

impl BillingConfig {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_tax_rate(self.default_tax_rate)?;

        if self.invoice_number_attempts == 0 {
            return Err(ValidationError::MustBePositive {
                field: "invoice_number_attempts".to_string(),
            });
        }

        if self.low_stock_threshold < 0 {
            return Err(ValidationError::OutOfRange {
                field: "low_stock_threshold".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }

        Ok(())
    }
}
