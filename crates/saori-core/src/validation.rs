//! # Validation Module
//!
//! Input validation utilities for Saori.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP (axum)                                                  │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business rule validation, before any transaction opens            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (email, product code, folios)                  │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::ValidationError;
use crate::types::Percent;
use crate::{MAX_DOCUMENT_LINES, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum password length for user accounts.
pub const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// String Validators
// =============================================================================

/// Returns the trimmed value, or `Required` when it is missing or blank.
pub fn require_text(value: Option<&str>, field: &str) -> ValidationResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::required(field)),
    }
}

/// Trims an optional text field, mapping blank strings to `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Trims and lowercases an email, then checks its shape.
///
/// ## Rules
/// - no whitespace
/// - exactly one `@` with a non-empty local part
/// - the domain contains a dot with text on both sides
///
/// ## Example
/// ```rust
/// use saori_core::validation::normalize_email;
///
/// assert_eq!(normalize_email("  Admin@Saori.Local ").unwrap(), "admin@saori.local");
/// assert!(normalize_email("admin@localhost").is_err());
/// ```
pub fn normalize_email(email: &str) -> ValidationResult<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@domain.tld".to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let has_inner_dot = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    if !has_inner_dot {
        return Err(invalid());
    }

    Ok(email)
}

pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all/default results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query, or `None` when blank.
pub fn validate_search_query(query: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(query) = optional_text(query) else {
        return Ok(None);
    };
    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }
    Ok(Some(query))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: `1..=MAX_ITEM_QUANTITY`.
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

/// Validates a price or cost in cents: `0..=MAX_PRICE_CENTS`. Zero is
/// allowed (free items).
pub fn validate_price(cents: i64, field: &str) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// Validates the number of lines on a document: `1..=MAX_DOCUMENT_LINES`.
pub fn validate_line_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::required("items"));
    }
    if count > MAX_DOCUMENT_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_DOCUMENT_LINES as i64,
        });
    }
    Ok(())
}

/// Validates an amount that must be strictly positive (expenses, salaries).
pub fn validate_positive_amount(cents: i64, field: &str) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Converts a wire discount (`0..=100`, may be fractional) into basis points.
///
/// ## Example
/// ```rust
/// use saori_core::validation::parse_discount_percent;
///
/// assert_eq!(parse_discount_percent(Some(12.5)).unwrap().bps(), 1250);
/// assert_eq!(parse_discount_percent(None).unwrap().bps(), 0);
/// assert!(parse_discount_percent(Some(120.0)).is_err());
/// ```
pub fn parse_discount_percent(value: Option<f64>) -> ValidationResult<Percent> {
    let pct = value.unwrap_or(0.0);
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: "discountPercent".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(Percent::from_percentage(pct))
}

// =============================================================================
// Date Validators
// =============================================================================

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str, field: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        }
    })
}

/// Parses an RFC 3339 timestamp, or a bare `YYYY-MM-DD` taken as midnight UTC.
pub fn parse_timestamp(value: &str, field: &str) -> ValidationResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = parse_date(value, field).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "expected an RFC 3339 timestamp or YYYY-MM-DD".to_string(),
    })?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// [`parse_timestamp`] for optional fields; blank strings count as absent.
pub fn parse_optional_timestamp(
    value: Option<&str>,
    field: &str,
) -> ValidationResult<Option<DateTime<Utc>>> {
    optional_text(value)
        .map(|v| parse_timestamp(&v, field))
        .transpose()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert_eq!(require_text(Some("  Ana "), "name").unwrap(), "Ana");
        assert!(require_text(Some("   "), "name").is_err());
        assert!(require_text(None, "name").is_err());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some(" x ")), Some("x".to_string()));
        assert_eq!(optional_text(Some("")), None);
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("VENTAS@saori.local").unwrap(), "ventas@saori.local");
        assert!(normalize_email("").is_err());
        assert!(normalize_email("no-at-sign.com").is_err());
        assert!(normalize_email("a@b@c.com").is_err());
        assert!(normalize_email("@saori.local").is_err());
        assert!(normalize_email("ana@.local").is_err());
        assert!(normalize_email("ana maria@saori.local").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("admin123").is_ok());
        assert!(matches!(
            validate_password("short"),
            Err(ValidationError::TooShort { min: 8, .. })
        ));
        assert!(matches!(
            validate_password(""),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity(MAX_ITEM_QUANTITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_price(0, "priceCents").is_ok());
        assert!(validate_price(-1, "priceCents").is_err());
        assert!(validate_price(MAX_PRICE_CENTS, "priceCents").is_ok());
        assert!(validate_price(MAX_PRICE_CENTS + 1, "priceCents").is_err());
        assert!(validate_positive_amount(1, "amountCents").is_ok());
        assert!(validate_positive_amount(0, "amountCents").is_err());
    }

    #[test]
    fn test_parse_discount_percent() {
        assert_eq!(parse_discount_percent(Some(100.0)).unwrap(), Percent::FULL);
        assert!(parse_discount_percent(Some(-0.5)).is_err());
        assert!(parse_discount_percent(Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_parse_date() {
        let d = parse_date("2026-03-15", "dateFrom").unwrap();
        assert_eq!(d.to_string(), "2026-03-15");
        assert!(parse_date("15/03/2026", "dateFrom").is_err());
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2026-03-15T10:30:00-06:00", "validUntil").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-03-15T16:30:00+00:00");

        let midnight = parse_timestamp("2026-03-15", "validUntil").unwrap();
        assert_eq!(midnight.to_rfc3339(), "2026-03-15T00:00:00+00:00");

        assert!(parse_timestamp("tomorrow", "validUntil").is_err());
        assert_eq!(parse_optional_timestamp(Some(" "), "validUntil").unwrap(), None);
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query(Some("  mac ")).unwrap(), Some("mac".to_string()));
        assert_eq!(validate_search_query(Some("  ")).unwrap(), None);
        assert!(validate_search_query(Some(&"x".repeat(101))).is_err());
    }
}
