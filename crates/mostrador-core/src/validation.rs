//! # Validation Module
//!
//! Input validation for catalog edits, carts and billing details.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Input adapters (UI forms, code scanner, CLI)                 │
//! │  └── normalize_bank_code() on scanned/typed bank codes                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine services (mostrador-db)                               │
//! │  └── THIS MODULE: field and quantity rules                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (price >= 0)                            │
//! │  └── UNIQUE (code), UNIQUE (invoice_number), UNIQUE (sale_id)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mostrador_core::validation::{normalize_bank_code, validate_quantity};
//!
//! let code = normalize_bank_code("es91 2100 0418 4502 0005 1332").unwrap();
//! assert_eq!(code, "ES9121000418450200051332");
//!
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::{Money, TaxRate};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code (barcode or internal code).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only letters, digits, hyphens and underscores
///
/// ## Example
/// ```rust
/// use mostrador_core::validation::validate_code;
///
/// assert!(validate_code("7790895000997").is_ok());
/// assert!(validate_code("YERBA-500").is_ok());
/// assert!(validate_code("has space").is_err());
/// ```
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name: non-empty, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required_with_max("name", name, 200)
}

/// Validates a category label: non-empty, at most 50 characters.
pub fn validate_category(category: &str) -> ValidationResult<()> {
    required_with_max("category", category, 50)
}

/// Validates a customer name on an invoice.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    required_with_max("customer_name", name, 200)
}

/// Light email check: one `@` with text on both sides and a dot in the domain.
///
/// Deliverability is not our problem; this only catches obvious typos.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    let invalid = || ValidationError::InvalidFormat {
        field: "customer_email".to_string(),
        reason: "must look like name@domain.tld".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }

    Ok(())
}

fn required_with_max(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Bank Code
// =============================================================================

/// Normalizes and validates a bank account code.
///
/// Accepts the code as typed or scanned, with any spacing and casing, and
/// returns the canonical form: whitespace removed, uppercased.
///
/// ## Rules (after normalization)
/// - 2 ASCII letters (country)
/// - 2 ASCII digits (check digits)
/// - 4 to 30 ASCII letters or digits (account identifier)
///
/// Checksum digits are not verified.
///
/// ## Example
/// ```rust
/// use mostrador_core::validation::normalize_bank_code;
///
/// assert!(normalize_bank_code("ES91 2100 0418 4502 0005 1332").is_ok());
/// assert!(normalize_bank_code("1234").is_err());
/// ```
pub fn normalize_bank_code(raw: &str) -> ValidationResult<String> {
    let code: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "iban_code".to_string(),
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "iban_code".to_string(),
        reason: reason.to_string(),
    };

    let bytes = code.as_bytes();
    if bytes.len() < 8 || bytes.len() > 34 {
        return Err(invalid("must be between 8 and 34 characters"));
    }
    if !bytes[..2].iter().all(u8::is_ascii_uppercase) {
        return Err(invalid("must start with a two-letter country code"));
    }
    if !bytes[2..4].iter().all(u8::is_ascii_digit) {
        return Err(invalid("country code must be followed by two check digits"));
    }
    if !bytes[4..]
        .iter()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    {
        return Err(invalid("account identifier must be letters and digits only"));
    }

    Ok(code)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a product price. Zero is allowed (free items).
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price.cents() > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a stock level set through a catalog edit.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a tax rate: 0% to 100%.
pub fn validate_tax_rate(rate: TaxRate) -> ValidationResult<()> {
    if rate.bps() > TaxRate::MAX_BPS {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: TaxRate::MAX_BPS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code() {
        assert!(validate_code("COKE-330").is_ok());
        assert!(validate_code("7790895000997").is_ok());
        assert!(validate_code("mate_1").is_ok());

        assert!(validate_code("").is_err());
        assert!(validate_code("   ").is_err());
        assert!(validate_code("has space").is_err());
        assert!(validate_code(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_names() {
        assert!(validate_product_name("Yerba Mate 500g").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
        assert!(validate_category("bebidas").is_ok());
        assert!(validate_category(" ").is_err());
        assert!(validate_customer_name("Ana Pérez").is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("  ana@example.com ").is_ok());

        assert!(validate_email("ana").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@example").is_err());
        assert!(validate_email("ana@@example.com").is_err());
        assert!(validate_email("a na@example.com").is_err());
    }

    #[test]
    fn test_bank_code_accepts_spaced_input() {
        let code = normalize_bank_code("ES91 2100 0418 4502 0005 1332").unwrap();
        assert_eq!(code, "ES9121000418450200051332");

        let code = normalize_bank_code(" gb29nwbk60161331926819\n").unwrap();
        assert_eq!(code, "GB29NWBK60161331926819");
    }

    #[test]
    fn test_bank_code_rejects_malformed_input() {
        assert!(matches!(
            normalize_bank_code("1234"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            normalize_bank_code("   "),
            Err(ValidationError::Required { .. })
        ));
        // digits where the country code goes
        assert!(normalize_bank_code("1291 2100 0418").is_err());
        // letters where the check digits go
        assert!(normalize_bank_code("ESAB 2100 0418").is_err());
        // punctuation in the account part
        assert!(normalize_bank_code("ES91-2100-0418").is_err());
        // account part too short (3) and too long (31)
        assert!(normalize_bank_code("ES91ABC").is_err());
        assert!(normalize_bank_code(&format!("ES91{}", "1".repeat(31))).is_err());
        assert!(normalize_bank_code(&format!("ES91{}", "1".repeat(30))).is_ok());
        assert!(normalize_bank_code("ES91ABCD").is_ok());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_and_stock() {
        assert!(validate_price(Money::zero()).is_ok());
        assert!(validate_price(Money::from_cents(1099)).is_ok());
        assert!(validate_price(Money::from_cents(-100)).is_err());
        assert!(validate_price(Money::from_cents(MAX_PRICE_CENTS)).is_ok());
        assert!(validate_price(Money::from_cents(MAX_PRICE_CENTS + 1)).is_err());

        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
    }

    #[test]
    fn test_validate_tax_rate() {
        assert!(validate_tax_rate(TaxRate::zero()).is_ok());
        assert!(validate_tax_rate(TaxRate::from_bps(2100)).is_ok());
        assert!(validate_tax_rate(TaxRate::from_bps(10_000)).is_ok());
        assert!(validate_tax_rate(TaxRate::from_bps(10_001)).is_err());
    }

}
