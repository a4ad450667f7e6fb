use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

/// Amounts are stored as NUMERIC(12, 2)
const MAX_AMOUNT_SCALE: u32 = 2;
const AMOUNT_LIMIT: i64 = 10_000_000_000;

fn invalid_amount(message: &'static str) -> ValidationError {
    let mut error = ValidationError::new("invalid_amount");
    error.message = Some(message.into());
    error
}

/// Validates that an amount fits the stored column: not negative (zero is
/// allowed), at most two decimal places and below 10^10
pub fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount < Decimal::ZERO {
        return Err(invalid_amount("Amount cannot be negative"));
    }
    // Trailing zeros do not count, so 12.500 is accepted as 12.5
    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(invalid_amount("Amount can have at most 2 decimal places"));
    }
    if *amount >= Decimal::from(AMOUNT_LIMIT) {
        return Err(invalid_amount("Amount must be less than 10000000000"));
    }
    Ok(())
}

/// Validates that a string has content besides whitespace
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Value cannot be empty".into());
        return Err(error);
    }
    Ok(())
}

/// Validates a `#rgb` or `#rrggbb` hex color
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let digits = color.strip_prefix('#').unwrap_or("");
    let valid = matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        let mut error = ValidationError::new("invalid_color");
        error.message = Some(format!("'{}' is not a hex color like #ff6b35", color).into());
        return Err(error);
    }
    Ok(())
}

/// Flattens validator errors into `field: message, message; field: message`
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect();
    fields.sort();
    fields.join("; ")
}
