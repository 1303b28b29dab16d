//! Default-value synthesis.
//!
//! Used to seed rows for columns with no cell value. Unions start from
//! their recorded first member; composite types recurse member-wise.
//! Types with no sensible default (patterned strings, unconstrained
//! type names) yield `None`.

use crate::entry::{TypeFlags, TypeKind, TypeNaming};
use crate::registry::TypeRegistry;
use crate::subtype::same_or_extends;
use crate::value::Value;

const MAX_DEPTH: usize = 32;

pub fn create_default_value(reg: &TypeRegistry, spec: &str) -> Option<Value> {
    default_for(reg, reg.resolve_alias(spec), 0)
}

fn default_for(reg: &TypeRegistry, spec: &str, depth: usize) -> Option<Value> {
    if depth > MAX_DEPTH {
        return None;
    }
    let entry = reg.entry(spec)?;
    match &entry.kind {
        TypeKind::Scalar => scalar_default(reg, spec, entry.naming.as_ref(), depth),
        TypeKind::Table | TypeKind::Map { .. } => Some(Value::Map(Vec::new())),
        TypeKind::Array { .. } => Some(Value::Seq(Vec::new())),
        TypeKind::Tuple { slots } => {
            let mut values = Vec::with_capacity(slots.len());
            for slot in slots {
                let value = match (&slot.self_ref, &slot.ancestor) {
                    // A self-ref slot defaults to its ancestor's default,
                    // alongside the ancestor's name in the target slot.
                    (Some(_), Some(ancestor)) => default_for(reg, ancestor, depth + 1)?,
                    (Some(_), None) => return None,
                    (None, _) => default_for(reg, &slot.spec, depth + 1)?,
                };
                values.push(value);
            }
            Some(Value::Seq(values))
        }
        TypeKind::Record { fields } => {
            let mut entries = Vec::new();
            for (name, field) in fields {
                if field.optional {
                    continue;
                }
                let value = match (&field.self_ref, &field.ancestor) {
                    (Some(_), Some(ancestor)) => default_for(reg, ancestor, depth + 1)?,
                    (Some(_), None) => return None,
                    (None, _) => default_for(reg, &field.spec, depth + 1)?,
                };
                entries.push((Value::str(name.clone()), value));
            }
            Some(Value::Map(entries))
        }
        TypeKind::Union { .. } => {
            if reg.has_flag(spec, TypeFlags::OPTIONAL) {
                // An optional union defaults to absent.
                return Some(Value::Nil);
            }
            let first = reg.union_first_type(spec)?.to_owned();
            default_for(reg, &first, depth + 1)
        }
        TypeKind::Enum { labels } => labels.first().map(|l| Value::str(l.clone())),
    }
}

fn scalar_default(
    reg: &TypeRegistry,
    spec: &str,
    naming: Option<&TypeNaming>,
    _depth: usize,
) -> Option<Value> {
    if spec == "nil" {
        return Some(Value::Nil);
    }
    if spec == "boolean" {
        return Some(Value::Bool(false));
    }
    if spec == "percent" {
        return Some(Value::Number(0.0));
    }
    if same_or_extends(reg, spec, "number") {
        let n = match reg.effective_number_limits(spec) {
            Some(limits) => 0.0_f64.clamp(limits.min, limits.max),
            None => 0.0,
        };
        return Some(Value::Number(n));
    }
    match naming {
        Some(TypeNaming::Extending(ancestor)) => return Some(Value::str(ancestor.clone())),
        Some(TypeNaming::TagMember(tag)) => {
            return reg.tag_ancestor(tag).map(Value::str);
        }
        Some(TypeNaming::Any) | None => {}
    }
    if same_or_extends(reg, spec, "string") {
        // A patterned or length-bounded string has no safe default.
        let empty_allowed = match reg.str_limits(spec) {
            Some(limits) => limits.regex.is_none() && limits.min_len.unwrap_or(0) == 0,
            None => reg.effective_str_lengths(spec).0.unwrap_or(0) == 0,
        };
        if empty_allowed && matches!(spec, "string" | "ascii") {
            return Some(Value::str(""));
        }
        return None;
    }
    None
}
