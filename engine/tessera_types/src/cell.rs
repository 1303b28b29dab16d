//! Cell-literal splitting for container values in tsv context.
//!
//! A container cell is a braced literal mirroring the type grammar:
//! `{1,2,3}` for arrays and tuples, `{a:1,b:2}` for records and maps,
//! with nesting allowed. The splitter hands each item back as a slice
//! of the original cell text, so element parsers see plain tsv strings
//! all the way down. There is no quoting: scalar items simply may not
//! contain top-level braces or commas.

/// Whether trimmed cell text looks like a container literal.
pub fn is_braced(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with('{') && trimmed.ends_with('}') && trimmed.len() >= 2
}

/// Split a braced literal into its top-level comma-separated items.
///
/// Returns `None` when the text is not a balanced braced literal.
/// `{}` yields an empty list. Items are trimmed.
pub fn split_items(text: &str) -> Option<Vec<&str>> {
    let trimmed = text.trim();
    let inner = trimmed.strip_prefix('{')?.strip_suffix('}')?;
    if !is_balanced(inner) {
        return None;
    }
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, b) in inner.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => depth = depth.checked_sub(1)?,
            b',' if depth == 0 => {
                items.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    items.push(inner[start..].trim());
    Some(items)
}

/// Split an item at its first top-level colon into a key/value pair.
///
/// Returns `None` when the item carries no top-level colon (a plain
/// list element). Later colons stay inside the value, so scalar values
/// such as URLs survive intact.
pub fn split_kv(item: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, b) in item.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b':' if depth == 0 => {
                return Some((item[..i].trim(), item[i + 1..].trim()));
            }
            _ => {}
        }
    }
    None
}

fn is_balanced(text: &str) -> bool {
    let mut depth = 0i64;
    for b in text.bytes() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
