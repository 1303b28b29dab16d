//! Structurally composed total orders.
//!
//! Every installed type gets one comparator, cached by canonical spec.
//! Composite comparators are built from their children's comparators at
//! construction time; values of mismatched shape fall back to comparing
//! variant rank, then serialised form, so the order is always total.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::registry::Comparator;
use crate::value::Value;

fn fallback(a: &Value, b: &Value) -> Ordering {
    a.variant_rank()
        .cmp(&b.variant_rank())
        .then_with(|| a.serialized().cmp(&b.serialized()))
}

pub fn number_comparator() -> Comparator {
    Arc::new(|a, b| match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
        _ => fallback(a, b),
    })
}

pub fn string_comparator() -> Comparator {
    Arc::new(|a, b| match (a, b) {
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        _ => fallback(a, b),
    })
}

pub fn bool_comparator() -> Comparator {
    Arc::new(|a, b| match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => fallback(a, b),
    })
}

/// Case-insensitive label order for enums.
pub fn enum_comparator() -> Comparator {
    Arc::new(|a, b| match (a, b) {
        (Value::Str(x), Value::Str(y)) => x
            .to_ascii_lowercase()
            .cmp(&y.to_ascii_lowercase())
            .then_with(|| x.cmp(y)),
        _ => fallback(a, b),
    })
}

/// Order by serialised form; the comparator of last resort for tables.
pub fn serialized_comparator() -> Comparator {
    Arc::new(fallback)
}

/// Lexicographic element order for arrays; shorter sequences first on a
/// shared prefix.
pub fn sequence_comparator(elem: Comparator) -> Comparator {
    Arc::new(move |a, b| match (a, b) {
        (Value::Seq(xs), Value::Seq(ys)) => {
            for (x, y) in xs.iter().zip(ys.iter()) {
                let ord = elem(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            xs.len().cmp(&ys.len())
        }
        _ => fallback(a, b),
    })
}

/// Slot-wise order for tuples.
pub fn tuple_comparator(slots: Vec<Comparator>) -> Comparator {
    Arc::new(move |a, b| match (a, b) {
        (Value::Seq(xs), Value::Seq(ys)) => {
            for (i, slot) in slots.iter().enumerate() {
                match (xs.get(i), ys.get(i)) {
                    (Some(x), Some(y)) => {
                        let ord = slot(x, y);
                        if ord != Ordering::Equal {
                            return ord;
                        }
                    }
                    (None, None) => break,
                    (None, Some(_)) => return Ordering::Less,
                    (Some(_), None) => return Ordering::Greater,
                }
            }
            xs.len().cmp(&ys.len())
        }
        _ => fallback(a, b),
    })
}

/// Entry-wise order for maps: by key, then value.
pub fn map_comparator(key: Comparator, value: Comparator) -> Comparator {
    Arc::new(move |a, b| match (a, b) {
        (Value::Map(xs), Value::Map(ys)) => {
            for ((xk, xv), (yk, yv)) in xs.iter().zip(ys.iter()) {
                let ord = key(xk, yk).then_with(|| value(xv, yv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            xs.len().cmp(&ys.len())
        }
        _ => fallback(a, b),
    })
}

/// Nil sorts before every other value; non-nil values use `inner`.
pub fn nil_aware_comparator(inner: Comparator) -> Comparator {
    Arc::new(move |a, b| match (a.is_nil(), b.is_nil()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => inner(a, b),
    })
}
