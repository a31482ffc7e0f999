//! Raw Value Parsing
//!
//! Field-collection submissions arrive as text. Blank cells mean "not
//! measured"; anything else must parse as a number.

use crate::error::EstimationError;

/// Parse an optional numeric field
///
/// - None, empty or whitespace-only text → `Ok(None)`
/// - numeric text (surrounding whitespace ignored) → `Ok(Some(value))`
/// - anything else, including NaN and infinities → `InvalidInput`
pub fn parse_optional_number(
    field: &'static str,
    text: Option<&str>,
) -> Result<Option<f64>, EstimationError> {
    let Some(text) = parse_optional_text(text) else {
        return Ok(None);
    };

    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        Ok(_) => Err(EstimationError::invalid(field, format!("'{}' is not a finite number", text))),
        Err(_) => Err(EstimationError::invalid(field, format!("'{}' is not numeric", text))),
    }
}

/// Trim an optional text field, treating blank text as absent
pub fn parse_optional_text(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_is_absent() {
        assert_eq!(parse_optional_number("dbh_cm", None), Ok(None));
        assert_eq!(parse_optional_number("dbh_cm", Some("")), Ok(None));
        assert_eq!(parse_optional_number("dbh_cm", Some("   ")), Ok(None));
    }

    #[test]
    fn test_numeric_text() {
        assert_eq!(parse_optional_number("dbh_cm", Some("12.5")), Ok(Some(12.5)));
        assert_eq!(parse_optional_number("dbh_cm", Some(" 7 ")), Ok(Some(7.0)));
        assert_eq!(parse_optional_number("dbh_cm", Some("-3")), Ok(Some(-3.0)));
    }

    #[test]
    fn test_non_numeric_is_invalid() {
        let err = parse_optional_number("height_m", Some("tall")).unwrap_err();
        assert_eq!(err.field(), "height_m");

        assert!(parse_optional_number("height_m", Some("NaN")).is_err());
        assert!(parse_optional_number("height_m", Some("inf")).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(parse_optional_text(Some("  Grevillea robusta ")), Some("Grevillea robusta"));
        assert_eq!(parse_optional_text(Some(" ")), None);
        assert_eq!(parse_optional_text(None), None);
    }
}
