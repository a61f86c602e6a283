//! Request payload validation
//!
//! Each payload implements [`Validate`] by running its fields through a
//! [`FieldErrors`] collector. The first failing rule of a field decides its
//! detail code; the whole payload is rejected with a single
//! [`ErrorCode::Validation`](crate::error::ErrorCode::Validation) error whose
//! details map field names to codes.
//!
//! ```rust
//! use travel_service::validation::{FieldErrors, Rule};
//!
//! let mut errors = FieldErrors::new();
//! errors.check("name", Some(""), &[Rule::Required, Rule::MaxLength(255)]);
//! errors.check("price", Some("-3"), &[Rule::Required, Rule::PositiveDecimal]);
//!
//! let err = errors.finish().unwrap_err();
//! let details = err.details.unwrap();
//! assert_eq!(details["name"], "IS_REQUIRED");
//! assert_eq!(details["price"], "VALUE_TOO_LOW");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::{AppError, DetailCode, Details};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("valid email pattern")
});

/// A payload that can check itself
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// A single field rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Present and not blank
    Required,
    /// At least this many characters
    MinLength(usize),
    /// At most this many characters
    MaxLength(usize),
    Email,
    /// One of a fixed set of values
    OneOf(&'static [&'static str]),
    /// A decimal number greater than zero
    PositiveDecimal,
    /// A decimal that fits a SQL `NUMERIC(precision, scale)` column
    /// without rounding
    Numeric { precision: u32, scale: u32 },
}

impl Rule {
    fn check(&self, value: &str) -> Option<DetailCode> {
        match self {
            Rule::Required => None,
            Rule::MinLength(min) => (value.chars().count() < *min).then_some(DetailCode::LengthTooShort),
            Rule::MaxLength(max) => (value.chars().count() > *max).then_some(DetailCode::LengthTooLong),
            Rule::Email => (!EMAIL.is_match(value)).then_some(DetailCode::InvalidFormat),
            Rule::OneOf(choices) => (!choices.contains(&value)).then_some(DetailCode::InvalidChoice),
            Rule::PositiveDecimal => match value.trim().parse::<Decimal>() {
                Err(_) => Some(DetailCode::InvalidFormat),
                Ok(d) if d <= Decimal::ZERO => Some(DetailCode::ValueTooLow),
                Ok(_) => None,
            },
            Rule::Numeric { precision, scale } => match value.trim().parse::<Decimal>() {
                Err(_) => Some(DetailCode::InvalidFormat),
                Ok(d) if d.normalize().scale() > *scale => Some(DetailCode::InvalidFormat),
                Ok(d) => numeric_limit(*precision, *scale)
                    .filter(|limit| d.abs() >= *limit)
                    .map(|_| DetailCode::ValueTooHigh),
            },
        }
    }
}

/// Smallest magnitude a `NUMERIC(precision, scale)` column cannot hold
fn numeric_limit(precision: u32, scale: u32) -> Option<Decimal> {
    10_u64
        .checked_pow(precision.saturating_sub(scale))
        .map(Decimal::from)
}

/// Collects one detail code per failing field
#[derive(Debug, Default)]
pub struct FieldErrors {
    details: Details,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure; the first one per field is kept
    pub fn add(&mut self, field: &str, code: DetailCode) {
        self.details
            .entry(field.to_string())
            .or_insert_with(|| Value::String(code.as_str().to_string()));
    }

    /// Run `rules` over an optional string field
    ///
    /// An absent or blank value fails only when [`Rule::Required`] is listed;
    /// otherwise the remaining rules are skipped.
    pub fn check(&mut self, field: &str, value: Option<&str>, rules: &[Rule]) {
        let value = value.filter(|v| !v.trim().is_empty());
        let Some(value) = value else {
            if rules.contains(&Rule::Required) {
                self.add(field, DetailCode::IsRequired);
            }
            return;
        };

        if let Some(code) = rules.iter().find_map(|rule| rule.check(value)) {
            self.add(field, code);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    /// `Ok` when nothing failed, otherwise a validation error
    pub fn finish(self) -> Result<(), AppError> {
        if self.details.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(self.details))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, VALIDATION_MESSAGE};

    fn single(value: Option<&str>, rules: &[Rule]) -> Option<String> {
        let mut errors = FieldErrors::new();
        errors.check("field", value, rules);
        errors
            .details
            .get("field")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    #[test]
    fn test_required() {
        assert_eq!(single(None, &[Rule::Required]).as_deref(), Some("IS_REQUIRED"));
        assert_eq!(single(Some("  "), &[Rule::Required]).as_deref(), Some("IS_REQUIRED"));
        assert_eq!(single(Some("x"), &[Rule::Required]), None);
    }

    #[test]
    fn test_optional_absent_skips_rules() {
        assert_eq!(single(None, &[Rule::MaxLength(1), Rule::Email]), None);
    }

    #[test]
    fn test_lengths_count_characters() {
        assert_eq!(single(Some("أحمد"), &[Rule::MaxLength(4)]), None);
        assert_eq!(
            single(Some("abcde"), &[Rule::MaxLength(4)]).as_deref(),
            Some("LENGTH_TOO_LONG")
        );
        assert_eq!(
            single(Some("short"), &[Rule::MinLength(8)]).as_deref(),
            Some("LENGTH_TOO_SHORT")
        );
    }

    #[test]
    fn test_email() {
        assert_eq!(single(Some("fatimah@example.com"), &[Rule::Email]), None);
        assert_eq!(
            single(Some("fatimah@"), &[Rule::Email]).as_deref(),
            Some("INVALID_FORMAT")
        );
        assert_eq!(
            single(Some("no-at-sign.com"), &[Rule::Email]).as_deref(),
            Some("INVALID_FORMAT")
        );
    }

    #[test]
    fn test_one_of() {
        const GENDERS: &[&str] = &["male", "female"];
        assert_eq!(single(Some("female"), &[Rule::OneOf(GENDERS)]), None);
        assert_eq!(
            single(Some("Female"), &[Rule::OneOf(GENDERS)]).as_deref(),
            Some("INVALID_CHOICE")
        );
    }

    #[test]
    fn test_positive_decimal() {
        assert_eq!(single(Some("2500.50"), &[Rule::PositiveDecimal]), None);
        assert_eq!(
            single(Some("0"), &[Rule::PositiveDecimal]).as_deref(),
            Some("VALUE_TOO_LOW")
        );
        assert_eq!(
            single(Some("abc"), &[Rule::PositiveDecimal]).as_deref(),
            Some("INVALID_FORMAT")
        );
    }

    #[test]
    fn test_numeric_scale() {
        let money = [Rule::Numeric { precision: 18, scale: 2 }];
        assert_eq!(single(Some("10.05"), &money), None);
        assert_eq!(single(Some("10.500"), &money), None);
        assert_eq!(single(Some("10.005"), &money).as_deref(), Some("INVALID_FORMAT"));
        assert_eq!(single(Some("0.001"), &money).as_deref(), Some("INVALID_FORMAT"));
    }

    #[test]
    fn test_numeric_magnitude() {
        let money = [Rule::Numeric { precision: 18, scale: 2 }];
        assert_eq!(single(Some("9999999999999999.99"), &money), None);
        assert_eq!(
            single(Some("10000000000000000"), &money).as_deref(),
            Some("VALUE_TOO_HIGH")
        );
        assert_eq!(
            single(Some("12345678901234567890"), &money).as_deref(),
            Some("VALUE_TOO_HIGH")
        );
        assert_eq!(
            single(Some("-10000000000000000"), &money).as_deref(),
            Some("VALUE_TOO_HIGH")
        );
    }

    #[test]
    fn test_first_failure_wins() {
        assert_eq!(
            single(Some("x"), &[Rule::MinLength(3), Rule::Email]).as_deref(),
            Some("LENGTH_TOO_SHORT")
        );
    }

    #[test]
    fn test_finish() {
        assert!(FieldErrors::new().finish().is_ok());

        let mut errors = FieldErrors::new();
        errors.add("email", DetailCode::InvalidFormat);
        errors.add("email", DetailCode::IsRequired);
        let err = errors.finish().unwrap_err();

        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.message, VALIDATION_MESSAGE);
        assert_eq!(err.details.unwrap()["email"], "INVALID_FORMAT");
    }
}
