//! Factory-generated value parsers for composite and derived types.
//!
//! Each parser holds the canonical specs of its children and looks the
//! child parsers up through the registry at parse time; children are
//! always installed before the parent publishes, so the lookups cannot
//! miss. Restriction parsers delegate to their parent parser first,
//! which makes every inherited constraint apply automatically.

use std::sync::Arc;

use tessera_diagnostic::{DiagnosticSink, ErrorKind};

use crate::cell;
use crate::contract::{ParseOutcome, ParserRef, ValueContext, ValueParser};
use crate::entry::{FieldInfo, TupleSlot};
use crate::expr::{CompiledExpr, EXPR_EVAL_QUOTA, ExprFailure};
use crate::registry::{NumberLimits, TypeRegistry};
use crate::subtype::{is_member_of_tag, same_or_extends};
use crate::value::Value;

/// Native validation predicate for [`restrict_with_validator`].
///
/// [`restrict_with_validator`]: crate::Schema::restrict_with_validator
pub type ValidatorFn = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Post-transform hook for [`extend_parser`].
///
/// Receives the parent's parsed value and reformatted string; must log
/// its own diagnostic when it fails.
///
/// [`extend_parser`]: crate::Schema::extend_parser
pub type TransformFn =
    Arc<dyn Fn(&mut DiagnosticSink, Value, String, ValueContext) -> ParseOutcome + Send + Sync>;

/// Extract cell text in tsv context.
pub(crate) fn tsv_str<'v>(
    sink: &mut DiagnosticSink,
    raw: &'v Value,
    ty: &str,
) -> Option<&'v str> {
    match raw {
        Value::Str(text) => Some(text),
        Value::Nil => {
            sink.error(ErrorKind::Parse, format!("missing value for `{ty}`"));
            None
        }
        other => {
            sink.error(
                ErrorKind::Internal,
                format!("tsv input for `{ty}` must be cell text, got {}", other.serialized()),
            );
            None
        }
    }
}

/// Elements of a sequence-shaped cell, as child raw values.
fn sequence_items(
    sink: &mut DiagnosticSink,
    raw: &Value,
    ctx: ValueContext,
    ty: &str,
) -> Option<Vec<Value>> {
    match ctx {
        ValueContext::Tsv => {
            let text = tsv_str(sink, raw, ty)?;
            match cell::split_items(text) {
                Some(items) => Some(items.into_iter().map(Value::str).collect()),
                None => {
                    sink.error(ErrorKind::Parse, format!("`{ty}` expects a braced list"));
                    None
                }
            }
        }
        ValueContext::Parsed => match raw {
            Value::Seq(items) => Some(items.clone()),
            other => {
                sink.error(
                    ErrorKind::Parse,
                    format!("`{ty}` expects a sequence, got {}", other.serialized()),
                );
                None
            }
        },
    }
}

/// Entries of a map-shaped cell, as child raw key/value pairs.
fn map_pairs(
    sink: &mut DiagnosticSink,
    raw: &Value,
    ctx: ValueContext,
    ty: &str,
) -> Option<Vec<(Value, Value)>> {
    match ctx {
        ValueContext::Tsv => {
            let text = tsv_str(sink, raw, ty)?;
            let Some(items) = cell::split_items(text) else {
                sink.error(ErrorKind::Parse, format!("`{ty}` expects a braced literal"));
                return None;
            };
            let mut pairs = Vec::with_capacity(items.len());
            for item in items {
                match cell::split_kv(item) {
                    Some((key, value)) => pairs.push((Value::str(key), Value::str(value))),
                    None => {
                        sink.error(
                            ErrorKind::Parse,
                            format!("`{ty}` expects `key:value` entries, got `{item}`"),
                        );
                        return None;
                    }
                }
            }
            Some(pairs)
        }
        ValueContext::Parsed => match raw {
            Value::Map(entries) => Some(entries.clone()),
            other => {
                sink.error(
                    ErrorKind::Parse,
                    format!("`{ty}` expects a mapping, got {}", other.serialized()),
                );
                None
            }
        },
    }
}

fn brace_join(parts: &[String]) -> String {
    format!("{{{}}}", parts.join(","))
}

/// Resolve a type named by a cell value (self-refs, `any`, bare extends).
///
/// Checks registration and, when an ancestor is required, the subtype
/// relation. Logs and returns `None` on failure.
fn resolve_named_type(
    reg: &TypeRegistry,
    sink: &mut DiagnosticSink,
    name: &str,
    ancestor: Option<&str>,
) -> Option<ParserRef> {
    let Some(parser) = reg.parser(name) else {
        sink.error(ErrorKind::UnknownType, format!("unknown/bad type `{name}`"));
        return None;
    };
    if let Some(ancestor) = ancestor {
        if !same_or_extends(reg, name, ancestor) {
            sink.error(
                ErrorKind::UnknownType,
                format!("type `{name}` does not extend `{ancestor}`"),
            );
            return None;
        }
    }
    Some(parser)
}

// === Arrays ===

pub(crate) struct ArrayParser {
    pub spec: String,
    pub elem: String,
}

impl ValueParser for ArrayParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let Some(items) = sequence_items(sink, raw, ctx, &self.spec) else {
            return ParseOutcome::fail(raw.serialized());
        };
        let Some(elem_parser) = reg.parser(&self.elem) else {
            sink.error(
                ErrorKind::Internal,
                format!("element parser `{}` missing", self.elem),
            );
            return ParseOutcome::fail(raw.serialized());
        };

        let mut values = Vec::with_capacity(items.len());
        let mut parts = Vec::with_capacity(items.len());
        let mut ok = true;
        for item in &items {
            let outcome = sink.with_col_type(&self.elem, |sink| {
                elem_parser.parse(reg, sink, item, ctx)
            });
            let (value, reformatted) = outcome.into_parts();
            match value {
                Some(value) => values.push(value),
                None => ok = false,
            }
            parts.push(reformatted);
        }
        let reformatted = brace_join(&parts);
        if ok {
            ParseOutcome::ok(Value::Seq(values), reformatted)
        } else {
            ParseOutcome::fail(reformatted)
        }
    }
}

// === Tuples ===

pub(crate) struct TupleParser {
    pub spec: String,
    pub slots: Vec<TupleSlot>,
}

impl ValueParser for TupleParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let Some(items) = sequence_items(sink, raw, ctx, &self.spec) else {
            return ParseOutcome::fail(raw.serialized());
        };
        if items.len() != self.slots.len() {
            sink.error(
                ErrorKind::Parse,
                format!(
                    "`{}` expects {} elements, got {}",
                    self.spec,
                    self.slots.len(),
                    items.len()
                ),
            );
            return ParseOutcome::fail(raw.serialized());
        }

        let mut values: Vec<Option<Value>> = vec![None; items.len()];
        let mut parts: Vec<String> = vec![String::new(); items.len()];
        let mut ok = true;

        // Plain slots first, left to right; self-referencing slots need
        // their target's parsed value and run in a second pass.
        for (i, slot) in self.slots.iter().enumerate() {
            if slot.self_ref.is_some() {
                continue;
            }
            let Some(parser) = reg.parser(&slot.spec) else {
                sink.error(ErrorKind::Internal, format!("slot parser `{}` missing", slot.spec));
                return ParseOutcome::fail(raw.serialized());
            };
            let outcome =
                sink.with_col_type(&slot.spec, |sink| parser.parse(reg, sink, &items[i], ctx));
            let (value, reformatted) = outcome.into_parts();
            match value {
                Some(value) => values[i] = Some(value),
                None => ok = false,
            }
            parts[i] = reformatted;
        }

        for (i, slot) in self.slots.iter().enumerate() {
            let Some(target) = slot.self_ref else { continue };
            let Some(Value::Str(type_name)) = values.get(target).and_then(Option::as_ref)
            else {
                // Target slot failed; its parser already reported.
                ok = false;
                parts[i] = items[i].serialized();
                continue;
            };
            let type_name = type_name.clone();
            let Some(parser) =
                resolve_named_type(reg, sink, &type_name, slot.ancestor.as_deref())
            else {
                ok = false;
                parts[i] = items[i].serialized();
                continue;
            };
            let outcome =
                sink.with_col_type(&type_name, |sink| parser.parse(reg, sink, &items[i], ctx));
            let (value, reformatted) = outcome.into_parts();
            match value {
                Some(value) => values[i] = Some(value),
                None => ok = false,
            }
            parts[i] = reformatted;
        }

        let reformatted = brace_join(&parts);
        if ok {
            let values = values.into_iter().flatten().collect();
            ParseOutcome::ok(Value::Seq(values), reformatted)
        } else {
            ParseOutcome::fail(reformatted)
        }
    }
}

// === Maps ===

pub(crate) struct MapParser {
    pub spec: String,
    pub key: String,
    pub value: String,
}

impl ValueParser for MapParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let Some(pairs) = map_pairs(sink, raw, ctx, &self.spec) else {
            return ParseOutcome::fail(raw.serialized());
        };
        let (Some(key_parser), Some(value_parser)) =
            (reg.parser(&self.key), reg.parser(&self.value))
        else {
            sink.error(ErrorKind::Internal, format!("entry parsers for `{}` missing", self.spec));
            return ParseOutcome::fail(raw.serialized());
        };

        // (key reformat, value reformat, parsed pair)
        let mut entries: Vec<(String, String, Option<(Value, Value)>)> =
            Vec::with_capacity(pairs.len());
        let mut ok = true;
        for (raw_key, raw_value) in &pairs {
            let key_outcome =
                sink.with_col_type(&self.key, |sink| key_parser.parse(reg, sink, raw_key, ctx));
            let value_outcome = sink.with_col_type(&self.value, |sink| {
                value_parser.parse(reg, sink, raw_value, ctx)
            });
            let (key, key_ref) = key_outcome.into_parts();
            let (value, value_ref) = value_outcome.into_parts();
            let pair = match (key, value) {
                (Some(key), Some(value)) => Some((key, value)),
                _ => {
                    ok = false;
                    None
                }
            };
            entries.push((key_ref, value_ref, pair));
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for window in entries.windows(2) {
            if window[0].0 == window[1].0 {
                sink.error(
                    ErrorKind::Parse,
                    format!("duplicate key `{}` in `{}`", window[0].0, self.spec),
                );
                ok = false;
                break;
            }
        }

        let parts: Vec<String> = entries
            .iter()
            .map(|(k, v, _)| format!("{k}:{v}"))
            .collect();
        let reformatted = brace_join(&parts);
        if ok {
            let map = entries.into_iter().filter_map(|(_, _, pair)| pair).collect();
            ParseOutcome::ok(Value::Map(map), reformatted)
        } else {
            ParseOutcome::fail(reformatted)
        }
    }
}

// === Records ===

pub(crate) struct RecordParser {
    pub spec: String,
    pub fields: std::collections::BTreeMap<String, FieldInfo>,
}

impl ValueParser for RecordParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let Some(pairs) = map_pairs(sink, raw, ctx, &self.spec) else {
            return ParseOutcome::fail(raw.serialized());
        };

        // Index provided values by field name, rejecting unknown and
        // duplicate keys.
        let mut provided: std::collections::BTreeMap<&str, &Value> =
            std::collections::BTreeMap::new();
        let mut ok = true;
        for (raw_key, raw_value) in &pairs {
            let Some(name) = raw_key.as_str() else {
                sink.error(
                    ErrorKind::Parse,
                    format!("field name in `{}` must be a string", self.spec),
                );
                ok = false;
                continue;
            };
            if !self.fields.contains_key(name) {
                sink.error(
                    ErrorKind::Parse,
                    format!("unknown field `{name}` in `{}`", self.spec),
                );
                ok = false;
                continue;
            }
            if provided.insert(name, raw_value).is_some() {
                sink.error(
                    ErrorKind::Parse,
                    format!("duplicate field `{name}` in `{}`", self.spec),
                );
                ok = false;
            }
        }

        let mut parsed: std::collections::BTreeMap<String, (Value, String)> =
            std::collections::BTreeMap::new();

        // Plain fields in canonical order; self-referencing fields after.
        for (name, field) in &self.fields {
            if field.self_ref.is_some() {
                continue;
            }
            match provided.get(name.as_str()) {
                Some(raw_value) => {
                    let Some(parser) = reg.parser(&field.spec) else {
                        sink.error(
                            ErrorKind::Internal,
                            format!("field parser `{}` missing", field.spec),
                        );
                        ok = false;
                        continue;
                    };
                    let outcome = sink.with_col_type(&field.spec, |sink| {
                        parser.parse(reg, sink, raw_value, ctx)
                    });
                    match outcome {
                        ParseOutcome::Ok { value, reformatted } => {
                            if !value.is_nil() {
                                parsed.insert(name.clone(), (value, reformatted));
                            }
                        }
                        ParseOutcome::Fail { .. } => ok = false,
                    }
                }
                None if field.optional => {}
                None => {
                    sink.error(
                        ErrorKind::Parse,
                        format!("missing field `{name}` in `{}`", self.spec),
                    );
                    ok = false;
                }
            }
        }

        for (name, field) in &self.fields {
            let Some(target) = field.self_ref.as_deref() else { continue };
            let Some(raw_value) = provided.get(name.as_str()) else {
                if !field.optional {
                    sink.error(
                        ErrorKind::Parse,
                        format!("missing field `{name}` in `{}`", self.spec),
                    );
                    ok = false;
                }
                continue;
            };
            let type_name = match parsed.get(target) {
                Some((Value::Str(type_name), _)) => type_name.clone(),
                Some(_) => {
                    sink.error(
                        ErrorKind::Internal,
                        format!("field `{target}` of `{}` is not a type name", self.spec),
                    );
                    ok = false;
                    continue;
                }
                // Either the target failed (already reported) or it was
                // never provided.
                None => {
                    if !provided.contains_key(target) {
                        sink.error(
                            ErrorKind::Parse,
                            format!("field `{name}` of `{}` requires field `{target}`", self.spec),
                        );
                    }
                    ok = false;
                    continue;
                }
            };
            let Some(parser) =
                resolve_named_type(reg, sink, &type_name, field.ancestor.as_deref())
            else {
                ok = false;
                continue;
            };
            let outcome =
                sink.with_col_type(&type_name, |sink| parser.parse(reg, sink, raw_value, ctx));
            match outcome {
                ParseOutcome::Ok { value, reformatted } => {
                    if !value.is_nil() {
                        parsed.insert(name.clone(), (value, reformatted));
                    }
                }
                ParseOutcome::Fail { .. } => ok = false,
            }
        }

        let parts: Vec<String> = parsed
            .iter()
            .map(|(name, (_, reformatted))| format!("{name}:{reformatted}"))
            .collect();
        let reformatted = brace_join(&parts);
        if ok {
            let map = parsed
                .into_iter()
                .map(|(name, (value, _))| (Value::Str(name), value))
                .collect();
            ParseOutcome::ok(Value::Map(map), reformatted)
        } else {
            ParseOutcome::fail(reformatted)
        }
    }
}

// === Unions ===

pub(crate) struct UnionParser {
    pub spec: String,
    pub members: Vec<String>,
    pub optional: bool,
}

impl ValueParser for UnionParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let empty = raw.is_nil() || (ctx == ValueContext::Tsv && raw.as_str() == Some(""));
        if empty {
            if self.optional {
                return ParseOutcome::ok(Value::Nil, "");
            }
            sink.error(ErrorKind::Parse, format!("missing value for `{}`", self.spec));
            return ParseOutcome::fail("");
        }

        // Trials run against isolated null sinks so member failures stay
        // invisible; only the aggregate failure is reported.
        for member in &self.members {
            let Some(parser) = reg.parser(member) else { continue };
            let mut trial = DiagnosticSink::null();
            let outcome = trial.with_col_type(member, |trial| {
                parser.parse(reg, trial, raw, ctx)
            });
            if outcome.is_ok() && trial.errors() == 0 {
                return outcome;
            }
        }

        sink.error(
            ErrorKind::UnionMember,
            format!("value does not match any member of `{}`", self.spec),
        );
        let reformatted = match raw.as_str() {
            Some(text) => text.to_owned(),
            None => raw.serialized(),
        };
        ParseOutcome::fail(reformatted)
    }
}

// === Enums ===

pub(crate) struct EnumParser {
    pub spec: String,
    /// Original-case labels, sorted by their case-folded form.
    pub labels: Vec<String>,
}

impl ValueParser for EnumParser {
    fn parse(
        &self,
        _reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let text = match ctx {
            ValueContext::Tsv => match tsv_str(sink, raw, &self.spec) {
                Some(text) => text,
                None => return ParseOutcome::fail(""),
            },
            ValueContext::Parsed => match raw.as_str() {
                Some(text) => text,
                None => {
                    sink.error(
                        ErrorKind::EnumLabel,
                        format!("`{}` expects a label string", self.spec),
                    );
                    return ParseOutcome::fail(raw.serialized());
                }
            },
        };
        let trimmed = text.trim();
        match self
            .labels
            .iter()
            .find(|label| label.eq_ignore_ascii_case(trimmed))
        {
            Some(label) => ParseOutcome::ok(Value::str(label.clone()), label.clone()),
            None => {
                sink.error(
                    ErrorKind::EnumLabel,
                    format!("`{trimmed}` is not a label of `{}`", self.spec),
                );
                ParseOutcome::fail(trimmed.to_owned())
            }
        }
    }
}

// === Bare extends ===

/// `{extends,T}`: a string naming a type equal to or extending `T`.
pub(crate) struct BareExtendsParser {
    pub spec: String,
    pub ancestor: String,
}

impl ValueParser for BareExtendsParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let text = match ctx {
            ValueContext::Tsv => match tsv_str(sink, raw, &self.spec) {
                Some(text) => text.trim(),
                None => return ParseOutcome::fail(""),
            },
            ValueContext::Parsed => match raw.as_str() {
                Some(text) => text.trim(),
                None => {
                    sink.error(
                        ErrorKind::Parse,
                        format!("`{}` expects a type name", self.spec),
                    );
                    return ParseOutcome::fail(raw.serialized());
                }
            },
        };
        if resolve_named_type(reg, sink, text, Some(&self.ancestor)).is_none() {
            return ParseOutcome::fail(text.to_owned());
        }
        ParseOutcome::ok(Value::str(text), text.to_owned())
    }
}

/// A type tag used as a column type: accepts names of member types.
pub(crate) struct TagParser {
    pub tag: String,
}

impl ValueParser for TagParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let text = match ctx {
            ValueContext::Tsv => match tsv_str(sink, raw, &self.tag) {
                Some(text) => text.trim(),
                None => return ParseOutcome::fail(""),
            },
            ValueContext::Parsed => match raw.as_str() {
                Some(text) => text.trim(),
                None => {
                    sink.error(ErrorKind::Parse, format!("`{}` expects a type name", self.tag));
                    return ParseOutcome::fail(raw.serialized());
                }
            },
        };
        if !is_member_of_tag(reg, text, &self.tag) {
            sink.error(
                ErrorKind::UnknownType,
                format!("`{text}` is not a member of `{}`", self.tag),
            );
            return ParseOutcome::fail(text.to_owned());
        }
        ParseOutcome::ok(Value::str(text), text.to_owned())
    }
}

// === Restrictions ===

pub(crate) struct RangeParser {
    pub spec: String,
    pub parent: String,
    pub limits: NumberLimits,
}

impl ValueParser for RangeParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let Some(parent) = reg.parser(&self.parent) else {
            sink.error(ErrorKind::Internal, format!("parent parser `{}` missing", self.parent));
            return ParseOutcome::fail(raw.serialized());
        };
        let outcome = parent.parse(reg, sink, raw, ctx);
        let ParseOutcome::Ok { value, reformatted } = outcome else {
            return outcome;
        };
        let Some(n) = value.as_number() else {
            sink.error(
                ErrorKind::Internal,
                format!("`{}` produced a non-numeric value", self.parent),
            );
            return ParseOutcome::fail(reformatted);
        };
        if n < self.limits.min || n > self.limits.max {
            sink.error(
                ErrorKind::OutOfRange,
                format!(
                    "value {n} outside [{}, {}] for `{}`",
                    self.limits.min, self.limits.max, self.spec
                ),
            );
            return ParseOutcome::fail(reformatted);
        }
        ParseOutcome::Ok { value, reformatted }
    }
}

pub(crate) struct StrRestrictParser {
    pub spec: String,
    pub parent: String,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub regex: Option<regex::Regex>,
}

impl ValueParser for StrRestrictParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let Some(parent) = reg.parser(&self.parent) else {
            sink.error(ErrorKind::Internal, format!("parent parser `{}` missing", self.parent));
            return ParseOutcome::fail(raw.serialized());
        };
        let outcome = parent.parse(reg, sink, raw, ctx);
        let ParseOutcome::Ok { value, reformatted } = outcome else {
            return outcome;
        };
        let Some(text) = value.as_str() else {
            sink.error(
                ErrorKind::Internal,
                format!("`{}` produced a non-string value", self.parent),
            );
            return ParseOutcome::fail(reformatted);
        };

        // Length first, then pattern.
        let len = text.chars().count();
        if let Some(min) = self.min_len {
            if len < min {
                sink.error(
                    ErrorKind::OutOfRange,
                    format!("length {len} below minimum {min} for `{}`", self.spec),
                );
                return ParseOutcome::fail(reformatted);
            }
        }
        if let Some(max) = self.max_len {
            if len > max {
                sink.error(
                    ErrorKind::OutOfRange,
                    format!("length {len} above maximum {max} for `{}`", self.spec),
                );
                return ParseOutcome::fail(reformatted);
            }
        }
        if let Some(regex) = &self.regex {
            if !regex.is_match(text) {
                sink.error(
                    ErrorKind::PatternMismatch,
                    format!("`{text}` does not match the pattern of `{}`", self.spec),
                );
                return ParseOutcome::fail(reformatted);
            }
        }
        ParseOutcome::Ok { value, reformatted }
    }
}

pub(crate) struct ExpressionParser {
    pub spec: String,
    pub parent: String,
    pub expr: Arc<dyn CompiledExpr>,
}

impl ValueParser for ExpressionParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let Some(parent) = reg.parser(&self.parent) else {
            sink.error(ErrorKind::Internal, format!("parent parser `{}` missing", self.parent));
            return ParseOutcome::fail(raw.serialized());
        };
        let outcome = parent.parse(reg, sink, raw, ctx);
        let ParseOutcome::Ok { value, reformatted } = outcome else {
            return outcome;
        };
        match self.expr.eval(&value, EXPR_EVAL_QUOTA) {
            Ok(Value::Bool(true)) => ParseOutcome::Ok { value, reformatted },
            Ok(Value::Str(s)) if s.is_empty() => ParseOutcome::Ok { value, reformatted },
            Ok(Value::Bool(false) | Value::Nil) => {
                sink.error(
                    ErrorKind::ExpressionRuntime,
                    format!("value rejected by `{}`", self.spec),
                );
                ParseOutcome::fail(reformatted)
            }
            Ok(other) => {
                sink.error(ErrorKind::ExpressionRuntime, other.serialized());
                ParseOutcome::fail(reformatted)
            }
            Err(ExprFailure::Quota) => {
                sink.error(
                    ErrorKind::Quota,
                    format!("validator of `{}` exhausted its operation quota", self.spec),
                );
                ParseOutcome::fail(reformatted)
            }
            Err(ExprFailure::Runtime(message) | ExprFailure::Compile(message)) => {
                sink.error(ErrorKind::ExpressionRuntime, message);
                ParseOutcome::fail(reformatted)
            }
        }
    }
}

pub(crate) struct ValidatorParser {
    pub spec: String,
    pub parent: String,
    pub predicate: ValidatorFn,
}

impl ValueParser for ValidatorParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let Some(parent) = reg.parser(&self.parent) else {
            sink.error(ErrorKind::Internal, format!("parent parser `{}` missing", self.parent));
            return ParseOutcome::fail(raw.serialized());
        };
        let outcome = parent.parse(reg, sink, raw, ctx);
        let ParseOutcome::Ok { value, reformatted } = outcome else {
            return outcome;
        };
        match (self.predicate)(&value) {
            Ok(()) => ParseOutcome::Ok { value, reformatted },
            Err(message) => {
                sink.error(
                    ErrorKind::ExpressionRuntime,
                    format!("`{}`: {message}", self.spec),
                );
                ParseOutcome::fail(reformatted)
            }
        }
    }
}

pub(crate) struct TransformParser {
    pub parent: String,
    pub transform: TransformFn,
}

impl ValueParser for TransformParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let Some(parent) = reg.parser(&self.parent) else {
            sink.error(ErrorKind::Internal, format!("parent parser `{}` missing", self.parent));
            return ParseOutcome::fail(raw.serialized());
        };
        let outcome = parent.parse(reg, sink, raw, ctx);
        let ParseOutcome::Ok { value, reformatted } = outcome else {
            return outcome;
        };
        (self.transform)(sink, value, reformatted, ctx)
    }
}

/// `restrict_to_type_extending`: a string type whose values must name
/// a type equal to or extending a fixed ancestor.
pub(crate) struct TypeExtendingParser {
    pub spec: String,
    pub parent: String,
    pub ancestor: String,
}

impl ValueParser for TypeExtendingParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let Some(parent) = reg.parser(&self.parent) else {
            sink.error(ErrorKind::Internal, format!("parent parser `{}` missing", self.parent));
            return ParseOutcome::fail(raw.serialized());
        };
        let outcome = parent.parse(reg, sink, raw, ctx);
        let ParseOutcome::Ok { value, reformatted } = outcome else {
            return outcome;
        };
        let Some(name) = value.as_str() else {
            sink.error(
                ErrorKind::Internal,
                format!("`{}` produced a non-string value", self.parent),
            );
            return ParseOutcome::fail(reformatted);
        };
        if resolve_named_type(reg, sink, name.trim(), Some(&self.ancestor)).is_none() {
            return ParseOutcome::fail(reformatted);
        }
        ParseOutcome::Ok { value, reformatted }
    }
}

/// `ratio`: a `{name:percent}` map whose values sum to one.
pub(crate) struct RatioParser {
    pub spec: String,
    pub map_spec: String,
}

impl ValueParser for RatioParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let Some(map_parser) = reg.parser(&self.map_spec) else {
            sink.error(ErrorKind::Internal, format!("map parser `{}` missing", self.map_spec));
            return ParseOutcome::fail(raw.serialized());
        };
        let outcome = map_parser.parse(reg, sink, raw, ctx);
        let ParseOutcome::Ok { value, reformatted } = outcome else {
            return outcome;
        };
        let sum: f64 = match &value {
            Value::Map(entries) => entries
                .iter()
                .filter_map(|(_, v)| v.as_number())
                .sum(),
            _ => 0.0,
        };
        if (sum - 1.0).abs() > 1e-4 {
            sink.error(
                ErrorKind::OutOfRange,
                format!("`{}` values sum to {sum}, expected 1", self.spec),
            );
            return ParseOutcome::fail(reformatted);
        }
        ParseOutcome::Ok { value, reformatted }
    }
}
