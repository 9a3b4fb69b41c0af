//! Card value normalization.
//!
//! Physical access cards carry a decimal number; operators enter it with
//! separators, whitespace, or leading zeros. The remote system stores the
//! normalized form: digits only, leading zeros stripped, `"0"` if nothing
//! is left after stripping.

use crate::errors::WardenError;

/// Normalize a raw card value to its canonical digits-only form.
///
/// Extracts ASCII digits, strips leading zeros, and returns `"0"` when the
/// extraction is empty or all zeros. Never returns an empty string.
#[must_use]
pub fn normalize_card_value(input: &str) -> String {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() {
        "0".to_owned()
    } else {
        stripped.to_owned()
    }
}

/// Normalize a card value, rejecting inputs that contain no digits at all.
///
/// Workflows call this before issuing any remote call, so a malformed card
/// value fails fast with [`WardenError::Validation`].
pub fn validate_card_value(input: &str) -> Result<String, WardenError> {
    if !input.chars().any(|c| c.is_ascii_digit()) {
        return Err(WardenError::Validation(format!(
            "card value contains no digits: {input:?}"
        )));
    }
    Ok(normalize_card_value(input))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn strips_non_digits_and_leading_zeros() {
        assert_eq!(normalize_card_value("00123-456"), "123456");
        assert_eq!(normalize_card_value(" 42 "), "42");
        assert_eq!(normalize_card_value("0x0009"), "9");
    }

    #[test]
    fn all_zeros_becomes_single_zero() {
        assert_eq!(normalize_card_value("000"), "0");
        assert_eq!(normalize_card_value("0"), "0");
    }

    #[test]
    fn no_digits_becomes_zero() {
        assert_eq!(normalize_card_value(""), "0");
        assert_eq!(normalize_card_value("abc"), "0");
        assert_eq!(normalize_card_value("---"), "0");
    }

    #[test]
    fn never_returns_empty() {
        for input in ["", "x", "0", "000", "  ", "0a0b"] {
            assert!(!normalize_card_value(input).is_empty());
        }
    }

    #[test]
    fn validate_accepts_digit_bearing_input() {
        assert_eq!(validate_card_value("007").unwrap(), "7");
        assert_eq!(validate_card_value("0").unwrap(), "0");
    }

    #[test]
    fn validate_rejects_digitless_input() {
        assert_matches!(validate_card_value(""), Err(WardenError::Validation(_)));
        assert_matches!(validate_card_value("abc"), Err(WardenError::Validation(_)));
    }
}
