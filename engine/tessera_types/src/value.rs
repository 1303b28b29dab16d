//! Dynamic value model for cell contents.
//!
//! Every cell value flowing through a value parser is a [`Value`].
//! Arrays and tuples share [`Value::Seq`]; maps and records share
//! [`Value::Map`] with entries kept sorted by the serialised form of the
//! key, so equal values always serialise identically.

use std::fmt::Write as _;

use crate::num::format_number;

/// A dynamically typed cell value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    /// Array or tuple contents, in element order.
    Seq(Vec<Value>),
    /// Map or record entries, sorted by serialised key.
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// The string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Look up a record field by name.
    pub fn record_get(&self, field: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find_map(|(k, v)| match k {
                Value::Str(name) if name == field => Some(v),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Deterministic serialised form, used for table comparison and as
    /// the last-resort total order on mixed values.
    pub fn serialized(&self) -> String {
        let mut out = String::new();
        self.write_serialized(&mut out);
        out
    }

    fn write_serialized(&self, out: &mut String) {
        match self {
            Value::Nil => {}
            Value::Bool(b) => {
                let _ = write!(out, "{b}");
            }
            Value::Number(n) => out.push_str(&format_number(*n)),
            Value::Str(s) => out.push_str(s),
            Value::Seq(items) => {
                out.push('{');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_serialized(out);
                }
                out.push('}');
            }
            Value::Map(entries) => {
                out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    key.write_serialized(out);
                    out.push(':');
                    value.write_serialized(out);
                }
                out.push('}');
            }
        }
    }

    /// Rank used to order values of different variants.
    pub(crate) fn variant_rank(&self) -> u8 {
        match self {
            Value::Nil => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::Str(_) => 3,
            Value::Seq(_) => 4,
            Value::Map(_) => 5,
        }
    }
}
