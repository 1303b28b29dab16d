//! Composite type construction and parsing.

use pretty_assertions::assert_eq;
use tessera_diagnostic::{DiagnosticSink, ErrorKind, Severity};

use super::{parse_err, parse_ok, schema};
use crate::{Value, ValueContext};

// === Arrays ===

#[test]
fn test_array_of_integers() {
    let mut schema = schema();
    let (value, reformatted) = parse_ok(&mut schema, "{integer}", "{1, 2, 3}");
    assert_eq!(
        value,
        Value::Seq(vec![
            Value::Number(1.0),
            Value::Number(2.0),
            Value::Number(3.0)
        ])
    );
    assert_eq!(reformatted, "{1,2,3}");
}

#[test]
fn test_empty_array() {
    let mut schema = schema();
    assert_eq!(
        parse_ok(&mut schema, "{integer}", "{}"),
        (Value::Seq(vec![]), "{}".to_owned())
    );
}

#[test]
fn test_array_element_failure() {
    let mut schema = schema();
    assert_eq!(parse_err(&mut schema, "{integer}", "{1,x,3}"), ErrorKind::Parse);
    assert_eq!(parse_err(&mut schema, "{integer}", "1,2"), ErrorKind::Parse);
}

#[test]
fn test_nested_arrays() {
    let mut schema = schema();
    let (_, reformatted) = parse_ok(&mut schema, "{{integer}}", "{{1,2},{3}}");
    assert_eq!(reformatted, "{{1,2},{3}}");
}

// === Tuples ===

#[test]
fn test_tuple_parses_slots_in_order() {
    let mut schema = schema();
    let (value, reformatted) = parse_ok(&mut schema, "{integer,string}", "{7,hello}");
    assert_eq!(
        value,
        Value::Seq(vec![Value::Number(7.0), Value::str("hello")])
    );
    assert_eq!(reformatted, "{7,hello}");
}

#[test]
fn test_tuple_arity_mismatch() {
    let mut schema = schema();
    assert_eq!(
        parse_err(&mut schema, "{integer,string}", "{7}"),
        ErrorKind::Parse
    );
}

// === Maps ===

#[test]
fn test_map_sorts_entries() {
    let mut schema = schema();
    let (_, reformatted) = parse_ok(&mut schema, "{name:integer}", "{zed:2,alpha:1}");
    assert_eq!(reformatted, "{alpha:1,zed:2}");
}

#[test]
fn test_map_rejects_duplicate_keys() {
    let mut schema = schema();
    assert_eq!(
        parse_err(&mut schema, "{name:integer}", "{a:1,a:2}"),
        ErrorKind::Parse
    );
}

#[test]
fn test_map_key_must_be_scalar() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    // An array key type can hold tables and cannot key a map.
    assert!(schema.parse_type(&mut sink, "{{integer}:string}").is_none());
    assert!(sink.has_errors());
}

#[test]
fn test_map_forbids_nil_value_type() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema.parse_type(&mut sink, "{name:nil}").is_none());
    assert!(sink.has_errors());
}

// === Records ===

#[test]
fn test_record_with_optional_field() {
    let mut schema = schema();
    let spec = "{id:integer,tag:string|nil}";
    let (value, reformatted) = parse_ok(&mut schema, spec, "{id:5}");
    assert_eq!(value.record_get("id"), Some(&Value::Number(5.0)));
    assert_eq!(value.record_get("tag"), None);
    assert_eq!(reformatted, "{id:5}");

    let (value, reformatted) = parse_ok(&mut schema, spec, "{tag:hot,id:5}");
    assert_eq!(value.record_get("tag"), Some(&Value::str("hot")));
    assert_eq!(reformatted, "{id:5,tag:hot}");
}

#[test]
fn test_record_missing_required_field() {
    let mut schema = schema();
    assert_eq!(
        parse_err(&mut schema, "{id:integer,tag:string|nil}", "{tag:hot}"),
        ErrorKind::Parse
    );
}

#[test]
fn test_record_unknown_field() {
    let mut schema = schema();
    assert_eq!(
        parse_err(&mut schema, "{id:integer,tag:string|nil}", "{id:5,bogus:1}"),
        ErrorKind::Parse
    );
}

// === Record inheritance ===

#[test]
fn test_record_inheritance_with_narrowing() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema.register_alias(&mut sink, "baseRow", "{id:integer,tag:string|nil}"));

    // Narrowing both fields is fine.
    let child = "{extends:baseRow,id:ubyte,tag:string}";
    let (_, child_spec) = schema
        .parse_type(&mut sink, child)
        .expect("narrowing child should build");
    assert_eq!(sink.errors(), 0);
    assert!(schema.extends_or_restrict(&child_spec, "baseRow"));

    // The child requires tag now.
    assert_eq!(parse_err(&mut schema, child, "{id:5}"), ErrorKind::Parse);
    let (value, _) = parse_ok(&mut schema, child, "{id:5,tag:hot}");
    assert_eq!(value.record_get("id"), Some(&Value::Number(5.0)));
}

#[test]
fn test_record_inheritance_rejects_widening() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema.register_alias(&mut sink, "baseRow2", "{id:integer,tag:string|nil}"));
    assert!(schema
        .parse_type(&mut sink, "{extends:baseRow2,id:float}")
        .is_none());
    assert!(sink
        .diagnostics()
        .iter()
        .any(|d| d.kind == ErrorKind::IncompatibleRedefinition));
}

#[test]
fn test_record_nil_field_suppresses_inherited_optional() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema.register_alias(&mut sink, "baseRow3", "{id:integer,tag:string|nil}"));
    let child = "{extends:baseRow3,tag:nil}";
    schema
        .parse_type(&mut sink, child)
        .expect("suppressing child should build");
    // `tag` no longer exists on the child.
    assert_eq!(parse_err(&mut schema, child, "{id:1,tag:hot}"), ErrorKind::Parse);
    parse_ok(&mut schema, child, "{id:1}");
}

#[test]
fn test_plain_record_nil_field_warns() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    schema
        .parse_type(&mut sink, "{id:integer,ghost:nil}")
        .expect("record should still build");
    assert_eq!(sink.errors(), 0);
    assert!(sink.warnings() > 0);
}

// === Unions ===

#[test]
fn test_union_disambiguation_order() {
    let mut schema = schema();
    let spec = "integer|float|string";
    assert_eq!(
        parse_ok(&mut schema, spec, "42"),
        (Value::Number(42.0), "42".to_owned())
    );
    assert_eq!(
        parse_ok(&mut schema, spec, "3.14"),
        (Value::Number(3.14), "3.14".to_owned())
    );
    assert_eq!(
        parse_ok(&mut schema, spec, "hello"),
        (Value::str("hello"), "hello".to_owned())
    );
}

#[test]
fn test_union_misordered_string_warns() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    // string matches everything, so a parser is still returned, with a
    // diagnostic about the ordering.
    let built = schema.parse_type(&mut sink, "string|integer|float");
    assert!(built.is_some());
    assert!(sink
        .diagnostics()
        .iter()
        .any(|d| d.severity == Severity::Warning));
}

#[test]
fn test_union_misordered_nil_warns() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema.parse_type(&mut sink, "nil|integer").is_some());
    assert!(sink.warnings() > 0);
}

#[test]
fn test_optional_union_accepts_empty() {
    let mut schema = schema();
    assert_eq!(
        parse_ok(&mut schema, "integer|nil", ""),
        (Value::Nil, String::new())
    );
    assert_eq!(parse_ok(&mut schema, "integer|nil", "7").1, "7");
}

#[test]
fn test_union_no_member_matches() {
    let mut schema = schema();
    assert_eq!(
        parse_err(&mut schema, "integer|float", "hello"),
        ErrorKind::UnionMember
    );
}

#[test]
fn test_union_trial_failures_do_not_leak() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    schema.parse_type(&mut sink, "integer|float|string").expect("union");
    let outcome = schema.parse_value(
        &mut sink,
        "integer|float|string",
        &Value::str("3.14"),
        ValueContext::Tsv,
    );
    assert!(outcome.is_ok());
    // The failed integer trial must not have touched the caller's sink.
    assert_eq!(sink.errors(), 0);
}

// === Enums ===

#[test]
fn test_enum_case_insensitive_original_case_out() {
    let mut schema = schema();
    let spec = "{enum:Alpha|Beta}";
    assert_eq!(
        parse_ok(&mut schema, spec, "alpha"),
        (Value::str("Alpha"), "Alpha".to_owned())
    );
    assert_eq!(parse_ok(&mut schema, spec, "BETA").1, "Beta");
    assert_eq!(parse_err(&mut schema, spec, "gamma"), ErrorKind::EnumLabel);
}

#[test]
fn test_enum_duplicate_labels_rejected() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema.parse_type(&mut sink, "{enum:Alpha|Beta|beta}").is_none());
    assert!(sink
        .diagnostics()
        .iter()
        .any(|d| d.kind == ErrorKind::DuplicateName));
}

#[test]
fn test_enum_keyword_label_rejected() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema.parse_type(&mut sink, "{enum:nil|other}").is_none());
}

// === Self-references ===

#[test]
fn test_self_ref_tuple() {
    let mut schema = schema();
    let spec = "{{extends,number},self._1}";
    let (value, reformatted) = parse_ok(&mut schema, spec, "{integer,7}");
    assert_eq!(
        value,
        Value::Seq(vec![Value::str("integer"), Value::Number(7.0)])
    );
    assert_eq!(reformatted, "{integer,7}");

    assert_eq!(parse_err(&mut schema, spec, "{integer,7.5}"), ErrorKind::OutOfRange);
    assert_eq!(
        parse_err(&mut schema, spec, "{unknownType,1}"),
        ErrorKind::UnknownType
    );
    // The named type must extend the slot's ancestor.
    assert_eq!(parse_err(&mut schema, spec, "{string,1}"), ErrorKind::UnknownType);
}

#[test]
fn test_self_ref_record() {
    let mut schema = schema();
    let spec = "{kind:{extends,number},value:self.kind}";
    let (value, _) = parse_ok(&mut schema, spec, "{kind:ubyte,value:200}");
    assert_eq!(value.record_get("value"), Some(&Value::Number(200.0)));
    assert_eq!(
        parse_err(&mut schema, spec, "{kind:ubyte,value:300}"),
        ErrorKind::OutOfRange
    );
}

#[test]
fn test_self_ref_validation_errors() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    // Referencing itself.
    assert!(schema.parse_type(&mut sink, "{a:{extends,number},b:self.b}").is_none());
    // Referencing another self-ref.
    assert!(schema
        .parse_type(&mut sink, "{a:{extends,number},b:self.a,c:self.b}")
        .is_none());
    // Target does not produce type names.
    assert!(schema.parse_type(&mut sink, "{a:integer,b:self.a}").is_none());
    // Missing target.
    assert!(schema.parse_type(&mut sink, "{a:integer,b:self.zzz}").is_none());
    // Top-level self-ref.
    assert!(schema.parse_type(&mut sink, "self.a").is_none());
    assert!(sink
        .diagnostics()
        .iter()
        .all(|d| d.kind == ErrorKind::SelfRef));
}

// === Tuple extension ===

#[test]
fn test_tuple_extension_prepends_parent_slots() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema.register_alias(&mut sink, "pair", "{integer,string}"));
    let spec = "{extends,pair,boolean}";
    let (value, _) = parse_ok(&mut schema, spec, "{1,x,true}");
    assert_eq!(
        value,
        Value::Seq(vec![
            Value::Number(1.0),
            Value::str("x"),
            Value::Bool(true)
        ])
    );
    let (_, child_spec) = schema.parse_type(&mut sink, spec).expect("memoised");
    assert!(schema.extends_or_restrict(&child_spec, "pair"));
}

#[test]
fn test_tuple_extension_parent_must_be_tuple() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema.parse_type(&mut sink, "{extends,integer,string}").is_none());
    assert!(sink.has_errors());
}

// === Bare extends ===

#[test]
fn test_bare_extends_accepts_extending_type_names() {
    let mut schema = schema();
    let spec = "{extends,number}";
    assert_eq!(parse_ok(&mut schema, spec, "integer").1, "integer");
    assert_eq!(parse_ok(&mut schema, spec, "number").1, "number");
    assert_eq!(parse_err(&mut schema, spec, "string"), ErrorKind::UnknownType);
}

// === Canonicalisation through the registry ===

#[test]
fn test_alias_spelling_memoises_to_canonical() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema.register_alias(&mut sink, "score", "integer"));
    let (_, resolved) = schema.parse_type(&mut sink, "{score}").expect("array of alias");
    assert_eq!(resolved, "{integer}");
}

#[test]
fn test_unknown_type_error_logged_once() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema.parse_type(&mut sink, "noSuchType").is_none());
    assert_eq!(sink.errors(), 1);
    // Negative cache: the second attempt stays silent.
    assert!(schema.parse_type(&mut sink, "noSuchType").is_none());
    assert_eq!(sink.errors(), 1);
}

#[test]
fn test_empty_braces_alias_table() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    let (_, resolved) = schema.parse_type(&mut sink, "{}").expect("empty table");
    assert_eq!(resolved, "table");
}
