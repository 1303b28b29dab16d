//! Classification of identifiers used in type specs.
//!
//! Keyword parser names (`nil`, `true`, `false`) may only be registered
//! during engine initialisation; reserved names and tuple-slot names
//! (`_N`) are never valid user type names or record field names.

/// Parser names that double as value keywords.
pub fn is_keyword(name: &str) -> bool {
    matches!(name, "nil" | "true" | "false")
}

/// Names with grammatical meaning inside braced specs.
pub fn is_reserved(name: &str) -> bool {
    matches!(name, "enum" | "extends" | "self")
}

/// Tuple-slot names: an underscore followed by one or more digits.
pub fn is_slot_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('_')
        && name.len() > 1
        && chars.all(|c| c.is_ascii_digit())
}

/// A single identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A well-formed user type name: dot-separated identifiers, none of
/// which is a keyword, reserved, or a tuple-slot name.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            is_identifier(segment)
                && !is_keyword(segment)
                && !is_reserved(segment)
                && !is_slot_name(segment)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert!(is_keyword("nil"));
        assert!(is_keyword("true"));
        assert!(is_keyword("false"));
        assert!(!is_keyword("integer"));
    }

    #[test]
    fn test_slot_names() {
        assert!(is_slot_name("_1"));
        assert!(is_slot_name("_42"));
        assert!(!is_slot_name("_"));
        assert!(!is_slot_name("_x"));
        assert!(!is_slot_name("x1"));
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("integer"));
        assert!(is_valid_name("game.item"));
        assert!(!is_valid_name("self"));
        assert!(!is_valid_name("game.extends"));
        assert!(!is_valid_name("_1"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("a..b"));
    }
}
