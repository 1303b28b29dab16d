//! Built-in value parser tests.

use pretty_assertions::assert_eq;
use tessera_diagnostic::{DiagnosticSink, ErrorKind};

use super::{parse_err, parse_ok, schema};
use crate::{ParseOutcome, Value, ValueContext};

// === integer ===

#[test]
fn test_integer_basic() {
    let mut schema = schema();
    assert_eq!(
        parse_ok(&mut schema, "integer", "0"),
        (Value::Number(0.0), "0".to_owned())
    );
    assert_eq!(
        parse_ok(&mut schema, "integer", " 42 "),
        (Value::Number(42.0), "42".to_owned())
    );
    assert_eq!(
        parse_ok(&mut schema, "integer", "007"),
        (Value::Number(7.0), "7".to_owned())
    );
}

#[test]
fn test_integer_safe_boundary() {
    let mut schema = schema();
    // The boundary itself is representable.
    assert_eq!(
        parse_ok(&mut schema, "integer", "9007199254740992").1,
        "9007199254740992"
    );
    // One past it silently rounds in a double, so it must be rejected.
    assert_eq!(
        parse_err(&mut schema, "integer", "9007199254740993"),
        ErrorKind::OutOfRange
    );
}

#[test]
fn test_integer_rejects_fractions() {
    let mut schema = schema();
    assert_eq!(parse_err(&mut schema, "integer", "3.5"), ErrorKind::OutOfRange);
    assert_eq!(parse_err(&mut schema, "integer", "abc"), ErrorKind::Parse);
}

#[test]
fn test_sized_integers() {
    let mut schema = schema();
    assert_eq!(parse_ok(&mut schema, "ubyte", "255").0, Value::Number(255.0));
    assert_eq!(parse_err(&mut schema, "ubyte", "256"), ErrorKind::OutOfRange);
    assert_eq!(parse_err(&mut schema, "uint", "-1"), ErrorKind::OutOfRange);
    assert_eq!(parse_ok(&mut schema, "byte", "-128").1, "-128");
}

#[test]
fn test_long_precision_loss() {
    let mut schema = schema();
    assert_eq!(parse_ok(&mut schema, "long", "123456789").1, "123456789");
    assert_eq!(
        parse_err(&mut schema, "long", "9223372036854775807"),
        ErrorKind::PrecisionLoss
    );
}

// === number / float ===

#[test]
fn test_number_and_float_canonical_forms() {
    let mut schema = schema();
    assert_eq!(parse_ok(&mut schema, "number", "3").1, "3");
    assert_eq!(parse_ok(&mut schema, "number", "3.25").1, "3.25");
    // float always carries a decimal point.
    assert_eq!(parse_ok(&mut schema, "float", "3").1, "3.0");
    assert_eq!(parse_ok(&mut schema, "float", "3.25").1, "3.25");
}

#[test]
fn test_number_rejects_non_finite() {
    let mut schema = schema();
    assert_eq!(parse_err(&mut schema, "number", "inf"), ErrorKind::Parse);
}

// === boolean ===

#[test]
fn test_boolean_spellings() {
    let mut schema = schema();
    for input in ["true", "YES", "1"] {
        assert_eq!(
            parse_ok(&mut schema, "boolean", input),
            (Value::Bool(true), "true".to_owned())
        );
    }
    for input in ["false", "No", "0"] {
        assert_eq!(
            parse_ok(&mut schema, "boolean", input),
            (Value::Bool(false), "false".to_owned())
        );
    }
    assert_eq!(parse_err(&mut schema, "boolean", "maybe"), ErrorKind::Parse);
}

#[test]
fn test_boolean_parsed_context() {
    let schema = schema();
    let mut sink = DiagnosticSink::new();
    let outcome = schema.parse_value(
        &mut sink,
        "boolean",
        &Value::Bool(true),
        ValueContext::Parsed,
    );
    assert_eq!(
        outcome,
        ParseOutcome::ok(Value::Bool(true), "true")
    );
    // A string is not a parsed boolean.
    let outcome = schema.parse_value(
        &mut sink,
        "boolean",
        &Value::str("true"),
        ValueContext::Parsed,
    );
    assert!(!outcome.is_ok());
}

// === string family ===

#[test]
fn test_ascii_and_name() {
    let mut schema = schema();
    assert_eq!(parse_ok(&mut schema, "ascii", "plain").1, "plain");
    assert_eq!(parse_err(&mut schema, "ascii", "naïve"), ErrorKind::Parse);
    assert_eq!(parse_ok(&mut schema, "name", "game.item").1, "game.item");
    assert_eq!(parse_err(&mut schema, "name", "a..b"), ErrorKind::Parse);
    assert_eq!(parse_ok(&mut schema, "identifier", "foo_1").1, "foo_1");
    assert_eq!(parse_err(&mut schema, "identifier", "1foo"), ErrorKind::Parse);
}

#[test]
fn test_http() {
    let mut schema = schema();
    assert_eq!(
        parse_ok(&mut schema, "http", "https://example.com/x").1,
        "https://example.com/x"
    );
    assert_eq!(parse_err(&mut schema, "http", "ftp://example.com"), ErrorKind::Parse);
}

#[test]
fn test_hexbytes_canonical_uppercase() {
    let mut schema = schema();
    assert_eq!(parse_ok(&mut schema, "hexbytes", "a1b2").1, "A1B2");
    assert_eq!(parse_err(&mut schema, "hexbytes", "a1b"), ErrorKind::Parse);
    assert_eq!(parse_err(&mut schema, "hexbytes", "zz"), ErrorKind::Parse);
}

#[test]
fn test_base64bytes_round_trips_through_decode() {
    let mut schema = schema();
    assert_eq!(parse_ok(&mut schema, "base64bytes", "aGk=").1, "aGk=");
    assert_eq!(parse_err(&mut schema, "base64bytes", "not base64!"), ErrorKind::Parse);
}

// === type names ===

#[test]
fn test_type_accepts_registered_names() {
    let mut schema = schema();
    assert_eq!(parse_ok(&mut schema, "type", "integer").1, "integer");
    assert_eq!(parse_err(&mut schema, "type", "nope"), ErrorKind::UnknownType);
}

#[test]
fn test_type_spec_validates_structurally() {
    let mut schema = schema();
    assert_eq!(parse_ok(&mut schema, "type_spec", "{integer}").1, "{integer}");
    assert_eq!(
        parse_ok(&mut schema, "type_spec", "{b:integer,a:string}").1,
        "{a:string,b:integer}"
    );
    assert_eq!(
        parse_err(&mut schema, "type_spec", "{missingType}"),
        ErrorKind::UnknownType
    );
    assert_eq!(parse_err(&mut schema, "type_spec", "{a:"), ErrorKind::Parse);
}

// === version / cmp_version ===

#[test]
fn test_version_triple() {
    let mut schema = schema();
    let (value, reformatted) = parse_ok(&mut schema, "version", "1.2.3");
    assert_eq!(
        value,
        Value::Seq(vec![
            Value::Number(1.0),
            Value::Number(2.0),
            Value::Number(3.0)
        ])
    );
    assert_eq!(reformatted, "1.2.3");
    assert_eq!(parse_err(&mut schema, "version", "1.2"), ErrorKind::Parse);
}

#[test]
fn test_cmp_version_canonicalises_double_equals() {
    let mut schema = schema();
    assert_eq!(parse_ok(&mut schema, "cmp_version", "==1.2.3").1, "=1.2.3");
    assert_eq!(parse_ok(&mut schema, "cmp_version", ">=2.0.0").1, ">=2.0.0");
    assert_eq!(parse_ok(&mut schema, "cmp_version", "~1.0.0").1, "~1.0.0");
    assert_eq!(parse_err(&mut schema, "cmp_version", "1.2.3"), ErrorKind::Parse);
}

// === percent ===

#[test]
fn test_percent_forms() {
    let mut schema = schema();
    assert_eq!(
        parse_ok(&mut schema, "percent", "50%"),
        (Value::Number(0.5), "50%".to_owned())
    );
    assert_eq!(
        parse_ok(&mut schema, "percent", "3/2"),
        (Value::Number(1.5), "3/2".to_owned())
    );
    assert_eq!(parse_err(&mut schema, "percent", "200"), ErrorKind::Parse);
    assert_eq!(parse_err(&mut schema, "percent", "1/0"), ErrorKind::Parse);
}

// === quantity ===

#[test]
fn test_quantity_splits_number_and_unit() {
    let mut schema = schema();
    let (value, reformatted) = parse_ok(&mut schema, "quantity", "3.5float");
    assert_eq!(
        value,
        Value::Seq(vec![Value::str("float"), Value::Number(3.5)])
    );
    assert_eq!(reformatted, "3.5float");
    // The unit's own parser validates the number.
    assert_eq!(parse_err(&mut schema, "quantity", "3.5integer"), ErrorKind::OutOfRange);
    assert_eq!(parse_err(&mut schema, "quantity", "3kg"), ErrorKind::UnknownType);
    assert_eq!(parse_err(&mut schema, "quantity", "kg"), ErrorKind::Parse);
}

// === ratio ===

#[test]
fn test_ratio_must_sum_to_one() {
    let mut schema = schema();
    let (_, reformatted) = parse_ok(&mut schema, "ratio", "{a:50%,b:50%}");
    assert_eq!(reformatted, "{a:50%,b:50%}");
    assert_eq!(
        parse_err(&mut schema, "ratio", "{a:50%,b:20%}"),
        ErrorKind::OutOfRange
    );
}

// === any ===

#[test]
fn test_any_tagged_pair() {
    let mut schema = schema();
    let (value, reformatted) = parse_ok(&mut schema, "any", "{integer,42}");
    assert_eq!(
        value,
        Value::Seq(vec![Value::str("integer"), Value::Number(42.0)])
    );
    assert_eq!(reformatted, "{integer,42}");
    assert_eq!(parse_err(&mut schema, "any", "{nope,42}"), ErrorKind::UnknownType);
    assert_eq!(parse_err(&mut schema, "any", "{integer,x}"), ErrorKind::Parse);
}

// === table ===

#[test]
fn test_table_accepts_any_braced_literal() {
    let mut schema = schema();
    assert_eq!(parse_ok(&mut schema, "table", "{1,2,3}").1, "{1,2,3}");
    assert_eq!(parse_ok(&mut schema, "table", "{b:2,a:1}").1, "{a:1,b:2}");
    assert_eq!(parse_err(&mut schema, "table", "scalar"), ErrorKind::Parse);
}
