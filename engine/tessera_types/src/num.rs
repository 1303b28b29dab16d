//! Numeric parsing and canonical formatting.
//!
//! Numbers are IEEE-754 doubles. The safe-integer boundary is the
//! largest interval on which a double represents every integer exactly;
//! integer types track it so a digit string that silently rounded would
//! be rejected instead of accepted with a changed value.

/// Largest magnitude at which every integer is exactly representable.
pub const SAFE_INT: f64 = 9_007_199_254_740_992.0; // 2^53

/// Whether `v` is mathematically integral.
pub fn is_integral(v: f64) -> bool {
    v.is_finite() && v.fract() == 0.0
}

/// Parse a finite number from cell text.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

/// Canonical form of a number: integral values within the safe range
/// render without a decimal point, everything else uses the shortest
/// round-tripping decimal form.
pub fn format_number(v: f64) -> String {
    if is_integral(v) && v.abs() <= SAFE_INT {
        format_integer(v)
    } else {
        format!("{v}")
    }
}

/// Canonical form of a float: always carries a decimal point, so
/// integral values render as `N.0`.
pub fn format_float(v: f64) -> String {
    if is_integral(v) && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

/// Canonical digit form of an integral value.
pub fn format_integer(v: f64) -> String {
    let formatted = format!("{v:.0}");
    if formatted == "-0" {
        "0".to_owned()
    } else {
        formatted
    }
}

/// Whether `text` is a plain decimal integer literal (optional sign,
/// digits only: no exponent, no decimal point).
pub fn is_plain_integer_literal(text: &str) -> bool {
    let digits = text
        .strip_prefix(['-', '+'])
        .unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Normalise a plain integer literal for exactness comparison: drop a
/// leading `+`, strip leading zeros, collapse `-0` to `0`.
pub fn normalize_integer_literal(text: &str) -> String {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let stripped = digits.trim_start_matches('0');
    let magnitude = if stripped.is_empty() { "0" } else { stripped };
    if negative && magnitude != "0" {
        format!("-{magnitude}")
    } else {
        magnitude.to_owned()
    }
}

/// Whether the parsed double `v` is the exact value of the plain integer
/// literal `text`. Detects digit strings beyond double precision, e.g.
/// `9007199254740993` parsing to `9007199254740992.0`.
pub fn literal_is_exact(text: &str, v: f64) -> bool {
    if !is_plain_integer_literal(text.trim()) {
        // Exponent or decimal forms are accepted as-is.
        return true;
    }
    normalize_integer_literal(text.trim()) == format_integer(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_number_integral() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-7.0), "-7");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(9_007_199_254_740_992.0), "9007199254740992");
    }

    #[test]
    fn test_format_number_fractional() {
        assert_eq!(format_number(3.5), "3.5");
        assert_eq!(format_number(-0.25), "-0.25");
    }

    #[test]
    fn test_format_float_always_has_point() {
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(3.25), "3.25");
    }

    #[test]
    fn test_literal_exactness() {
        assert!(literal_is_exact("42", 42.0));
        assert!(literal_is_exact("007", 7.0));
        assert!(literal_is_exact("9007199254740992", 9_007_199_254_740_992.0));
        // 2^53 + 1 rounds down to 2^53.
        assert!(!literal_is_exact(
            "9007199254740993",
            "9007199254740993".parse::<f64>().unwrap_or(0.0)
        ));
    }

    #[test]
    fn test_parse_number_rejects_non_finite() {
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("nan"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number(" 2.5 "), Some(2.5));
    }
}
