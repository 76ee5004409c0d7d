//! Field validators shared by request payloads.
//!
//! These plug into `#[validate(custom(function = "..."))]`.

use validator::ValidationError;

/// Upper bound for a single money amount in cents (ten million units).
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000;

/// Validates a money amount in cents: non-negative and below [`MAX_AMOUNT_CENTS`].
pub fn validate_amount_cents(cents: i64) -> Result<(), ValidationError> {
    if cents < 0 {
        let mut err = ValidationError::new("amount_negative");
        err.message = Some("Amount must be non-negative".into());
        return Err(err);
    }
    if cents > MAX_AMOUNT_CENTS {
        let mut err = ValidationError::new("amount_too_large");
        err.message = Some("Amount is too large".into());
        return Err(err);
    }
    Ok(())
}

/// Rejects strings that are empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}
