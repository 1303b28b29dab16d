//! Built-in types, registered during engine initialisation.
//!
//! Keyword parser names (`nil`, `true`, `false`) may only be registered
//! while `setting_up` holds; the built-in snapshot is taken when
//! initialisation ends.

use std::sync::Arc;

use base64::Engine as _;
use tessera_diagnostic::{DiagnosticSink, ErrorKind};
use tessera_parse::{is_identifier, parse_spec, TypeAst};
use url::Url;

use crate::build::build_type;
use crate::cell;
use crate::compare::{
    bool_comparator, number_comparator, sequence_comparator, serialized_comparator,
    string_comparator,
};
use crate::contract::{ParseOutcome, ValueContext, ValueParser};
use crate::entry::{TypeEntry, TypeFlags, TypeKind, TypeNaming};
use crate::num::{
    format_float, format_integer, format_number, is_integral, literal_is_exact, parse_number,
    SAFE_INT,
};
use crate::parsers::{tsv_str, RangeParser, RatioParser, TagParser};
use crate::registry::{NumberLimits, TypeRegistry};
use crate::subtype::is_member_of_tag;
use crate::value::Value;

/// The tag every numeric built-in belongs to.
pub const NUMBER_TYPE_TAG: &str = "number_type";

// === nil ===

struct NilParser;

impl ValueParser for NilParser {
    fn parse(
        &self,
        _reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        _ctx: ValueContext,
    ) -> ParseOutcome {
        match raw {
            Value::Nil => ParseOutcome::ok(Value::Nil, ""),
            Value::Str(s) if s.trim().is_empty() => ParseOutcome::ok(Value::Nil, ""),
            other => {
                sink.error(ErrorKind::Parse, format!("expected nil, got {}", other.serialized()));
                ParseOutcome::fail(other.serialized())
            }
        }
    }
}

// === boolean ===

struct BooleanParser;

impl ValueParser for BooleanParser {
    fn parse(
        &self,
        _reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let flag = match ctx {
            ValueContext::Tsv => {
                let Some(text) = tsv_str(sink, raw, "boolean") else {
                    return ParseOutcome::fail("");
                };
                match text.trim().to_ascii_lowercase().as_str() {
                    "true" | "yes" | "1" => true,
                    "false" | "no" | "0" => false,
                    other => {
                        sink.error(ErrorKind::Parse, format!("`{other}` is not a boolean"));
                        return ParseOutcome::fail(text.trim().to_owned());
                    }
                }
            }
            ValueContext::Parsed => match raw {
                Value::Bool(flag) => *flag,
                other => {
                    sink.error(
                        ErrorKind::Parse,
                        format!("expected a boolean, got {}", other.serialized()),
                    );
                    return ParseOutcome::fail(other.serialized());
                }
            },
        };
        ParseOutcome::ok(Value::Bool(flag), if flag { "true" } else { "false" })
    }
}

// === numbers ===

struct NumberParser;

impl ValueParser for NumberParser {
    fn parse(
        &self,
        _reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let Some(n) = numeric_input(sink, raw, ctx, "number") else {
            return ParseOutcome::fail(raw.serialized());
        };
        ParseOutcome::ok(Value::Number(n), format_number(n))
    }
}

/// `integer` and `long` share the integral/precision checks; they differ
/// in the diagnostic for values beyond the safe range. `long` logically
/// spans the full signed 64-bit interval, but this host has no native
/// 64-bit integers, so an out-of-precision value is a `PrecisionLoss`
/// failure rather than an out-of-range one.
struct IntegerParser {
    spec: &'static str,
    beyond_safe: ErrorKind,
}

impl ValueParser for IntegerParser {
    fn parse(
        &self,
        _reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let literal = match (ctx, raw) {
            (ValueContext::Tsv, Value::Str(text)) => Some(text.trim().to_owned()),
            _ => None,
        };
        let Some(n) = numeric_input(sink, raw, ctx, self.spec) else {
            return ParseOutcome::fail(raw.serialized());
        };
        if !is_integral(n) {
            sink.error(
                ErrorKind::OutOfRange,
                format!("`{}` expects an integer, got {}", self.spec, format_number(n)),
            );
            return ParseOutcome::fail(format_number(n));
        }
        if n.abs() > SAFE_INT {
            sink.error(
                self.beyond_safe,
                format!("{} is beyond the safe integer range of `{}`", format_number(n), self.spec),
            );
            return ParseOutcome::fail(format_number(n));
        }
        if let Some(literal) = literal {
            if !literal_is_exact(&literal, n) {
                sink.error(
                    self.beyond_safe,
                    format!("`{literal}` is beyond exact integer precision"),
                );
                return ParseOutcome::fail(literal);
            }
        }
        ParseOutcome::ok(Value::Number(n), format_integer(n))
    }
}

struct FloatParser;

impl ValueParser for FloatParser {
    fn parse(
        &self,
        _reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let Some(n) = numeric_input(sink, raw, ctx, "float") else {
            return ParseOutcome::fail(raw.serialized());
        };
        ParseOutcome::ok(Value::Number(n), format_float(n))
    }
}

fn numeric_input(
    sink: &mut DiagnosticSink,
    raw: &Value,
    ctx: ValueContext,
    ty: &str,
) -> Option<f64> {
    match ctx {
        ValueContext::Tsv => {
            let text = tsv_str(sink, raw, ty)?;
            match parse_number(text) {
                Some(n) => Some(n),
                None => {
                    sink.error(ErrorKind::Parse, format!("`{}` is not a number", text.trim()));
                    None
                }
            }
        }
        ValueContext::Parsed => match raw {
            Value::Number(n) => Some(*n),
            other => {
                sink.error(
                    ErrorKind::Parse,
                    format!("`{ty}` expects a number, got {}", other.serialized()),
                );
                None
            }
        },
    }
}

// === strings ===

/// Cell text is guaranteed UTF-8 by construction; `string` accepts it
/// unchanged.
struct StringParser;

impl ValueParser for StringParser {
    fn parse(
        &self,
        _reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        _ctx: ValueContext,
    ) -> ParseOutcome {
        match raw {
            Value::Str(text) => ParseOutcome::ok(Value::str(text.clone()), text.clone()),
            other => {
                sink.error(
                    ErrorKind::Parse,
                    format!("expected a string, got {}", other.serialized()),
                );
                ParseOutcome::fail(other.serialized())
            }
        }
    }
}

/// A string parser defined by a predicate over the cell text.
struct StrCheckParser {
    spec: String,
    /// Returns the canonical form, or an error message.
    check: fn(&str) -> Result<String, String>,
}

impl ValueParser for StrCheckParser {
    fn parse(
        &self,
        _reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        _ctx: ValueContext,
    ) -> ParseOutcome {
        let Some(text) = string_input(sink, raw, &self.spec) else {
            return ParseOutcome::fail(raw.serialized());
        };
        match (self.check)(text) {
            Ok(canonical) => ParseOutcome::ok(Value::str(canonical.clone()), canonical),
            Err(message) => {
                sink.error(ErrorKind::Parse, message);
                ParseOutcome::fail(text.to_owned())
            }
        }
    }
}

fn string_input<'v>(sink: &mut DiagnosticSink, raw: &'v Value, ty: &str) -> Option<&'v str> {
    match raw {
        Value::Str(text) => Some(text),
        Value::Nil => {
            sink.error(ErrorKind::Parse, format!("missing value for `{ty}`"));
            None
        }
        other => {
            sink.error(
                ErrorKind::Parse,
                format!("`{ty}` expects a string, got {}", other.serialized()),
            );
            None
        }
    }
}

fn check_ascii(text: &str) -> Result<String, String> {
    if text.is_ascii() {
        Ok(text.to_owned())
    } else {
        Err("string contains non-ASCII characters".to_owned())
    }
}

fn check_name(text: &str) -> Result<String, String> {
    let trimmed = text.trim();
    if !trimmed.is_empty() && trimmed.split('.').all(is_identifier) {
        Ok(trimmed.to_owned())
    } else {
        Err(format!("`{trimmed}` is not a dotted identifier"))
    }
}

fn check_identifier(text: &str) -> Result<String, String> {
    let trimmed = text.trim();
    if is_identifier(trimmed) {
        Ok(trimmed.to_owned())
    } else {
        Err(format!("`{trimmed}` is not an identifier"))
    }
}

fn check_http(text: &str) -> Result<String, String> {
    let trimmed = text.trim();
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(trimmed.to_owned()),
        _ => Err(format!("`{trimmed}` is not an http(s) URL")),
    }
}

fn check_hexbytes(text: &str) -> Result<String, String> {
    let trimmed = text.trim();
    if trimmed.len() % 2 == 0 && hex::decode(trimmed).is_ok() {
        Ok(trimmed.to_ascii_uppercase())
    } else {
        Err(format!("`{trimmed}` is not an even-length hex string"))
    }
}

fn check_base64bytes(text: &str) -> Result<String, String> {
    let trimmed = text.trim();
    match base64::engine::general_purpose::STANDARD.decode(trimmed) {
        Ok(bytes) => Ok(base64::engine::general_purpose::STANDARD.encode(bytes)),
        Err(_) => Err(format!("`{trimmed}` is not standard base64")),
    }
}

// === type names and type specs ===

struct TypeNameParser;

impl ValueParser for TypeNameParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        _ctx: ValueContext,
    ) -> ParseOutcome {
        let Some(text) = string_input(sink, raw, "type") else {
            return ParseOutcome::fail(raw.serialized());
        };
        let trimmed = text.trim();
        if reg.parser(trimmed).is_none() {
            sink.error(ErrorKind::UnknownType, format!("unknown/bad type `{trimmed}`"));
            return ParseOutcome::fail(trimmed.to_owned());
        }
        ParseOutcome::ok(Value::str(trimmed), trimmed.to_owned())
    }
}

struct TypeSpecParser;

impl ValueParser for TypeSpecParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        _ctx: ValueContext,
    ) -> ParseOutcome {
        let Some(text) = string_input(sink, raw, "type_spec") else {
            return ParseOutcome::fail(raw.serialized());
        };
        let ast = match parse_spec(text) {
            Ok(ast) => ast,
            Err(err) => {
                sink.error(ErrorKind::Parse, format!("bad type spec: {err}"));
                return ParseOutcome::fail(text.trim().to_owned());
            }
        };
        let mut names = Vec::new();
        referenced_names(&ast, &mut names);
        for name in names {
            if reg.parser(&name).is_none() {
                sink.error(ErrorKind::UnknownType, format!("unknown/bad type `{name}`"));
                return ParseOutcome::fail(text.trim().to_owned());
            }
        }
        let canonical = ast.canonical();
        ParseOutcome::ok(Value::str(canonical.clone()), canonical)
    }
}

/// Type names referenced by a spec, honoring the `extends` conventions.
fn referenced_names(ast: &TypeAst, out: &mut Vec<String>) {
    match ast {
        TypeAst::Name(name) => out.push(name.clone()),
        TypeAst::Array(elem) => referenced_names(elem, out),
        TypeAst::Tuple(slots) => {
            let skip_first = slots.first().is_some_and(|s| s.is_name("extends"));
            for (i, slot) in slots.iter().enumerate() {
                if i == 0 && skip_first {
                    continue;
                }
                referenced_names(slot, out);
            }
        }
        TypeAst::Map(key, value) => {
            if !key.is_name("extends") {
                referenced_names(key, out);
            }
            referenced_names(value, out);
        }
        TypeAst::Record(fields) => {
            for (_, spec) in fields {
                referenced_names(spec, out);
            }
        }
        TypeAst::Union(members) => {
            for member in members {
                referenced_names(member, out);
            }
        }
        TypeAst::Table | TypeAst::Enum(_) | TypeAst::SelfRef(_) => {}
    }
}

// === version ===

struct VersionParser;

impl ValueParser for VersionParser {
    fn parse(
        &self,
        _reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        match ctx {
            ValueContext::Tsv => {
                let Some(text) = string_input(sink, raw, "version") else {
                    return ParseOutcome::fail(raw.serialized());
                };
                match semver::Version::parse(text.trim()) {
                    Ok(version) => {
                        let triple = version_triple(&version);
                        ParseOutcome::ok(triple, version.to_string())
                    }
                    Err(err) => {
                        sink.error(
                            ErrorKind::Parse,
                            format!("`{}` is not a version: {err}", text.trim()),
                        );
                        ParseOutcome::fail(text.trim().to_owned())
                    }
                }
            }
            ValueContext::Parsed => match raw {
                Value::Seq(parts) if parts.len() == 3 => {
                    let numbers: Vec<f64> =
                        parts.iter().filter_map(Value::as_number).collect();
                    if numbers.len() == 3
                        && numbers.iter().all(|n| is_integral(*n) && *n >= 0.0)
                    {
                        let canonical = format!(
                            "{}.{}.{}",
                            format_integer(numbers[0]),
                            format_integer(numbers[1]),
                            format_integer(numbers[2])
                        );
                        ParseOutcome::ok(raw.clone(), canonical)
                    } else {
                        sink.error(ErrorKind::Parse, "version parts must be non-negative integers");
                        ParseOutcome::fail(raw.serialized())
                    }
                }
                other => {
                    sink.error(
                        ErrorKind::Parse,
                        format!("`version` expects a triple, got {}", other.serialized()),
                    );
                    ParseOutcome::fail(other.serialized())
                }
            },
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn version_triple(version: &semver::Version) -> Value {
    Value::Seq(vec![
        Value::Number(version.major as f64),
        Value::Number(version.minor as f64),
        Value::Number(version.patch as f64),
    ])
}

// === cmp_version ===

const CMP_OPS: [&str; 8] = ["==", ">=", "<=", "=", ">", "<", "~", "^"];

struct CmpVersionParser;

impl ValueParser for CmpVersionParser {
    fn parse(
        &self,
        _reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        match ctx {
            ValueContext::Tsv => {
                let Some(text) = string_input(sink, raw, "cmp_version") else {
                    return ParseOutcome::fail(raw.serialized());
                };
                let trimmed = text.trim();
                let Some(op) = CMP_OPS.iter().find(|op| trimmed.starts_with(**op)) else {
                    sink.error(
                        ErrorKind::Parse,
                        format!("`{trimmed}` does not start with a comparison operator"),
                    );
                    return ParseOutcome::fail(trimmed.to_owned());
                };
                // `==` canonicalises to `=`.
                let canon_op = if *op == "==" { "=" } else { op };
                match semver::Version::parse(trimmed[op.len()..].trim()) {
                    Ok(version) => {
                        let canonical = format!("{canon_op}{version}");
                        let value = Value::Seq(vec![
                            Value::str(canon_op),
                            Value::str(version.to_string()),
                        ]);
                        ParseOutcome::ok(value, canonical)
                    }
                    Err(err) => {
                        sink.error(ErrorKind::Parse, format!("`{trimmed}` is not a version comparison: {err}"));
                        ParseOutcome::fail(trimmed.to_owned())
                    }
                }
            }
            ValueContext::Parsed => match raw {
                Value::Seq(parts) if parts.len() == 2 => {
                    let op = parts[0].as_str().unwrap_or_default();
                    let version = parts[1].as_str().unwrap_or_default();
                    let valid_op = matches!(op, "=" | ">" | ">=" | "<" | "<=" | "~" | "^");
                    match (valid_op, semver::Version::parse(version)) {
                        (true, Ok(version)) => {
                            ParseOutcome::ok(raw.clone(), format!("{op}{version}"))
                        }
                        _ => {
                            sink.error(
                                ErrorKind::Parse,
                                format!("invalid version comparison {}", raw.serialized()),
                            );
                            ParseOutcome::fail(raw.serialized())
                        }
                    }
                }
                other => {
                    sink.error(
                        ErrorKind::Parse,
                        format!("`cmp_version` expects an operator/version pair, got {}", other.serialized()),
                    );
                    ParseOutcome::fail(other.serialized())
                }
            },
        }
    }
}

// === percent ===

struct PercentParser;

impl ValueParser for PercentParser {
    fn parse(
        &self,
        _reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        match ctx {
            ValueContext::Tsv => {
                let Some(text) = string_input(sink, raw, "percent") else {
                    return ParseOutcome::fail(raw.serialized());
                };
                let trimmed = text.trim();
                if let Some(number) = trimmed.strip_suffix('%') {
                    if let Some(n) = parse_number(number) {
                        return ParseOutcome::ok(
                            Value::Number(n / 100.0),
                            format!("{}%", format_number(n)),
                        );
                    }
                } else if let Some((p, q)) = trimmed.split_once('/') {
                    if let (Some(p), Some(q)) = (parse_number(p), parse_number(q)) {
                        if q != 0.0 {
                            return ParseOutcome::ok(
                                Value::Number(p / q),
                                format!("{}/{}", format_number(p), format_number(q)),
                            );
                        }
                    }
                }
                sink.error(
                    ErrorKind::Parse,
                    format!("`{trimmed}` is not a percentage (`N%`) or fraction (`P/Q`)"),
                );
                ParseOutcome::fail(trimmed.to_owned())
            }
            ValueContext::Parsed => match raw {
                Value::Number(n) => {
                    ParseOutcome::ok(Value::Number(*n), format!("{}%", format_number(n * 100.0)))
                }
                other => {
                    sink.error(
                        ErrorKind::Parse,
                        format!("`percent` expects a number, got {}", other.serialized()),
                    );
                    ParseOutcome::fail(other.serialized())
                }
            },
        }
    }
}

// === quantity ===

struct QuantityParser;

impl ValueParser for QuantityParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let (number_raw, unit) = match ctx {
            ValueContext::Tsv => {
                let Some(text) = string_input(sink, raw, "quantity") else {
                    return ParseOutcome::fail(raw.serialized());
                };
                let trimmed = text.trim();
                let split = trimmed
                    .char_indices()
                    .find(|(_, c)| c.is_ascii_alphabetic() || *c == '_')
                    .map(|(i, _)| i);
                let Some(split) = split.filter(|i| *i > 0) else {
                    sink.error(
                        ErrorKind::Parse,
                        format!("`{trimmed}` is not a `<number><numeric type>` quantity"),
                    );
                    return ParseOutcome::fail(trimmed.to_owned());
                };
                (Value::str(&trimmed[..split]), trimmed[split..].to_owned())
            }
            ValueContext::Parsed => match raw {
                Value::Seq(parts) if parts.len() == 2 => {
                    let Some(unit) = parts[0].as_str() else {
                        sink.error(ErrorKind::Parse, "quantity unit must be a type name");
                        return ParseOutcome::fail(raw.serialized());
                    };
                    (parts[1].clone(), unit.to_owned())
                }
                other => {
                    sink.error(
                        ErrorKind::Parse,
                        format!("`quantity` expects a unit/number pair, got {}", other.serialized()),
                    );
                    return ParseOutcome::fail(other.serialized());
                }
            },
        };

        let Some(unit_parser) = reg.parser(&unit) else {
            sink.error(ErrorKind::UnknownType, format!("unknown/bad type `{unit}`"));
            return ParseOutcome::fail(raw.serialized());
        };
        if !is_member_of_tag(reg, &unit, NUMBER_TYPE_TAG) {
            sink.error(
                ErrorKind::UnknownType,
                format!("`{unit}` is not a numeric type"),
            );
            return ParseOutcome::fail(raw.serialized());
        }
        let outcome =
            sink.with_col_type(&unit, |sink| unit_parser.parse(reg, sink, &number_raw, ctx));
        match outcome {
            ParseOutcome::Ok { value, reformatted } => {
                let canonical = format!("{reformatted}{unit}");
                ParseOutcome::ok(Value::Seq(vec![Value::str(unit), value]), canonical)
            }
            ParseOutcome::Fail { reformatted } => {
                ParseOutcome::fail(format!("{reformatted}{unit}"))
            }
        }
    }
}

// === any ===

struct AnyParser;

impl ValueParser for AnyParser {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        let (type_name, inner_raw) = match ctx {
            ValueContext::Tsv => {
                let Some(text) = string_input(sink, raw, "any") else {
                    return ParseOutcome::fail(raw.serialized());
                };
                match cell::split_items(text) {
                    Some(items) if items.len() == 2 => {
                        (items[0].to_owned(), Value::str(items[1]))
                    }
                    _ => {
                        sink.error(
                            ErrorKind::Parse,
                            format!("`any` expects `{{type,value}}`, got `{}`", text.trim()),
                        );
                        return ParseOutcome::fail(text.trim().to_owned());
                    }
                }
            }
            ValueContext::Parsed => match raw {
                Value::Seq(parts) if parts.len() == 2 => {
                    let Some(name) = parts[0].as_str() else {
                        sink.error(ErrorKind::Parse, "`any` tag must be a type name");
                        return ParseOutcome::fail(raw.serialized());
                    };
                    (name.to_owned(), parts[1].clone())
                }
                other => {
                    sink.error(
                        ErrorKind::Parse,
                        format!("`any` expects a tagged pair, got {}", other.serialized()),
                    );
                    return ParseOutcome::fail(other.serialized());
                }
            },
        };

        let Some(parser) = reg.parser(&type_name) else {
            sink.error(ErrorKind::UnknownType, format!("unknown/bad type `{type_name}`"));
            return ParseOutcome::fail(raw.serialized());
        };
        let outcome =
            sink.with_col_type(&type_name, |sink| parser.parse(reg, sink, &inner_raw, ctx));
        match outcome {
            ParseOutcome::Ok { value, reformatted } => {
                let canonical = format!("{{{type_name},{reformatted}}}");
                ParseOutcome::ok(Value::Seq(vec![Value::str(type_name), value]), canonical)
            }
            ParseOutcome::Fail { reformatted } => {
                ParseOutcome::fail(format!("{{{type_name},{reformatted}}}"))
            }
        }
    }
}

// === table ===

struct TableParser;

impl ValueParser for TableParser {
    fn parse(
        &self,
        _reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        match ctx {
            ValueContext::Tsv => {
                let Some(text) = string_input(sink, raw, "table") else {
                    return ParseOutcome::fail(raw.serialized());
                };
                match generic_table_value(text) {
                    Some(value) => {
                        let canonical = value.serialized();
                        ParseOutcome::ok(value, canonical)
                    }
                    None => {
                        sink.error(
                            ErrorKind::Parse,
                            format!("`{}` is not a table literal", text.trim()),
                        );
                        ParseOutcome::fail(text.trim().to_owned())
                    }
                }
            }
            ValueContext::Parsed => match raw {
                Value::Seq(_) | Value::Map(_) => {
                    ParseOutcome::ok(raw.clone(), raw.serialized())
                }
                other => {
                    sink.error(
                        ErrorKind::Parse,
                        format!("`table` expects a table value, got {}", other.serialized()),
                    );
                    ParseOutcome::fail(other.serialized())
                }
            },
        }
    }
}

/// Parse an untyped cell literal: nested braces become sequences or
/// maps, everything else stays a string.
fn generic_table_value(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if !cell::is_braced(trimmed) {
        return None;
    }
    Some(generic_item(trimmed))
}

fn generic_item(text: &str) -> Value {
    let Some(items) = cell::split_items(text) else {
        return Value::str(text);
    };
    let kvs: Vec<Option<(&str, &str)>> = items.iter().map(|i| cell::split_kv(i)).collect();
    if !items.is_empty() && kvs.iter().all(Option::is_some) {
        let mut entries: Vec<(Value, Value)> = kvs
            .into_iter()
            .flatten()
            .map(|(k, v)| (generic_item(k), generic_item(v)))
            .collect();
        entries.sort_by(|a, b| a.0.serialized().cmp(&b.0.serialized()));
        Value::Map(entries)
    } else {
        Value::Seq(items.into_iter().map(generic_item).collect())
    }
}

// === installation ===

/// Install every built-in type. Runs once, inside the initialisation
/// phase.
pub(crate) fn install(reg: &mut TypeRegistry) {
    debug_assert!(reg.is_setting_up());

    install_scalar(reg, "nil", Arc::new(NilParser), serialized_comparator());
    install_scalar(reg, "boolean", Arc::new(BooleanParser), bool_comparator());

    // Numeric tower.
    install_scalar(reg, "number", Arc::new(NumberParser), number_comparator());
    install_scalar(
        reg,
        "integer",
        Arc::new(IntegerParser {
            spec: "integer",
            beyond_safe: ErrorKind::OutOfRange,
        }),
        number_comparator(),
    );
    reg.set_parent("integer", "number");
    reg.set_number_limits(
        "integer",
        NumberLimits {
            min: -SAFE_INT,
            max: SAFE_INT,
        },
    );
    // `long` extends `number` directly: its logical range is the full
    // signed 64-bit interval, not the safe-integer one.
    install_scalar(
        reg,
        "long",
        Arc::new(IntegerParser {
            spec: "long",
            beyond_safe: ErrorKind::PrecisionLoss,
        }),
        number_comparator(),
    );
    reg.set_parent("long", "number");
    // Hosts without 64-bit integers can only carry a long faithfully as
    // its canonical string.
    reg.add_flags("long", TypeFlags::FORCE_STRING);
    install_scalar(reg, "float", Arc::new(FloatParser), number_comparator());
    reg.set_parent("float", "number");

    install_int_range(reg, "byte", -128.0, 127.0);
    install_int_range(reg, "ubyte", 0.0, 255.0);
    install_int_range(reg, "short", -32_768.0, 32_767.0);
    install_int_range(reg, "ushort", 0.0, 65_535.0);
    install_int_range(reg, "int", -2_147_483_648.0, 2_147_483_647.0);
    install_int_range(reg, "uint", 0.0, 4_294_967_295.0);

    // String tower.
    install_scalar(reg, "string", Arc::new(StringParser), string_comparator());
    install_str_check(reg, "ascii", "string", check_ascii);
    install_str_check(reg, "name", "ascii", check_name);
    install_str_check(reg, "identifier", "ascii", check_identifier);
    install_str_check(reg, "http", "ascii", check_http);
    install_str_check(reg, "hexbytes", "ascii", check_hexbytes);
    install_str_check(reg, "base64bytes", "ascii", check_base64bytes);

    install_scalar(reg, "type", Arc::new(TypeNameParser), string_comparator());
    reg.set_parent("type", "ascii");
    reg.set_entry(TypeEntry::new("type", TypeKind::Scalar).with_naming(TypeNaming::Any));
    install_scalar(reg, "type_spec", Arc::new(TypeSpecParser), string_comparator());
    reg.set_parent("type_spec", "ascii");
    reg.set_entry(TypeEntry::new("type_spec", TypeKind::Scalar).with_naming(TypeNaming::Any));
    // `name` values may name types too (self-ref targets).
    reg.set_entry(TypeEntry::new("name", TypeKind::Scalar).with_naming(TypeNaming::Any));

    install_scalar(reg, "percent", Arc::new(PercentParser), number_comparator());
    reg.set_parent("percent", "ascii");

    // Structured scalars: their parsed values are tables, so they never
    // carry NEVER_TABLE.
    install_table_valued(
        reg,
        "version",
        Arc::new(VersionParser),
        sequence_comparator(number_comparator()),
    );
    reg.set_parent("version", "ascii");
    install_table_valued(reg, "cmp_version", Arc::new(CmpVersionParser), serialized_comparator());
    reg.set_parent("cmp_version", "ascii");
    install_table_valued(reg, "quantity", Arc::new(QuantityParser), serialized_comparator());
    reg.set_parent("quantity", "ascii");
    install_table_valued(reg, "any", Arc::new(AnyParser), serialized_comparator());

    reg.install_parser("table", Arc::new(TableParser));
    reg.set_entry(TypeEntry::new("table", TypeKind::Table));
    reg.set_comparator("table", serialized_comparator());
    reg.set_alias("{}", "table");

    // The numeric type tag.
    let members = [
        "number", "integer", "byte", "ubyte", "short", "ushort", "int", "uint", "long", "float",
    ];
    reg.set_tag(
        NUMBER_TYPE_TAG,
        members.iter().map(|m| (*m).to_owned()).collect(),
        Some("number".to_owned()),
    );
    reg.install_parser(
        NUMBER_TYPE_TAG,
        Arc::new(TagParser {
            tag: NUMBER_TYPE_TAG.to_owned(),
        }),
    );
    reg.set_entry(
        TypeEntry::new(NUMBER_TYPE_TAG, TypeKind::Scalar)
            .with_naming(TypeNaming::TagMember(NUMBER_TYPE_TAG.to_owned())),
    );
    reg.add_flags(NUMBER_TYPE_TAG, TypeFlags::NEVER_TABLE);
    reg.set_comparator(NUMBER_TYPE_TAG, string_comparator());

    // `ratio` restricts the `{name:percent}` map.
    let ratio_map = TypeAst::Map(
        Box::new(TypeAst::Name("name".to_owned())),
        Box::new(TypeAst::Name("percent".to_owned())),
    );
    let mut setup_sink = DiagnosticSink::null();
    if let Some((_, map_spec)) = build_type(reg, &mut setup_sink, &ratio_map) {
        reg.install_parser(
            "ratio",
            Arc::new(RatioParser {
                spec: "ratio".to_owned(),
                map_spec: map_spec.clone(),
            }),
        );
        reg.set_entry(TypeEntry::new(
            "ratio",
            TypeKind::Map {
                key: "name".to_owned(),
                value: "percent".to_owned(),
            },
        ));
        let comparator = reg.comparator(&map_spec).unwrap_or_else(serialized_comparator);
        reg.set_comparator("ratio", comparator);
        reg.set_parent("ratio", map_spec);
    }
    debug_assert_eq!(setup_sink.errors(), 0, "ratio map failed to build");
}

fn install_scalar(
    reg: &mut TypeRegistry,
    name: &str,
    parser: Arc<dyn ValueParser>,
    comparator: crate::registry::Comparator,
) {
    reg.install_parser(name, parser);
    reg.set_entry(TypeEntry::new(name, TypeKind::Scalar));
    reg.add_flags(name, TypeFlags::NEVER_TABLE);
    reg.set_comparator(name, comparator);
}

fn install_table_valued(
    reg: &mut TypeRegistry,
    name: &str,
    parser: Arc<dyn ValueParser>,
    comparator: crate::registry::Comparator,
) {
    reg.install_parser(name, parser);
    reg.set_entry(TypeEntry::new(name, TypeKind::Scalar));
    reg.set_comparator(name, comparator);
}

fn install_int_range(reg: &mut TypeRegistry, name: &str, min: f64, max: f64) {
    let limits = NumberLimits { min, max };
    install_scalar(
        reg,
        name,
        Arc::new(RangeParser {
            spec: name.to_owned(),
            parent: "integer".to_owned(),
            limits,
        }),
        number_comparator(),
    );
    reg.set_parent(name, "integer");
    reg.set_number_limits(name, limits);
}

fn install_str_check(
    reg: &mut TypeRegistry,
    name: &str,
    parent: &str,
    check: fn(&str) -> Result<String, String>,
) {
    install_scalar(
        reg,
        name,
        Arc::new(StrCheckParser {
            spec: name.to_owned(),
            check,
        }),
        string_comparator(),
    );
    reg.set_parent(name, parent);
}
