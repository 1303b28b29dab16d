//! Subtyping, introspection and default values.

use pretty_assertions::assert_eq;
use tessera_diagnostic::DiagnosticSink;

use super::schema;
use crate::{Value, NUMBER_TYPE_TAG};

// === Nominal chain ===

#[test]
fn test_subtyping_is_strict() {
    let schema = schema();
    assert!(!schema.extends_or_restrict("integer", "integer"));
    assert!(!schema.extends_or_restrict("number", "integer"));
}

#[test]
fn test_nominal_chain_is_transitive() {
    let schema = schema();
    assert!(schema.extends_or_restrict("integer", "number"));
    assert!(schema.extends_or_restrict("byte", "integer"));
    assert!(schema.extends_or_restrict("byte", "number"));
    assert!(schema.extends_or_restrict("hexbytes", "string"));
}

#[test]
fn test_long_skips_integer() {
    let schema = schema();
    assert!(schema.extends_or_restrict("long", "number"));
    assert!(!schema.extends_or_restrict("long", "integer"));
}

// === Tags ===

#[test]
fn test_tag_membership() {
    let schema = schema();
    assert!(schema.is_member_of_tag("integer", NUMBER_TYPE_TAG));
    assert!(schema.is_member_of_tag("float", NUMBER_TYPE_TAG));
    assert!(!schema.is_member_of_tag("string", NUMBER_TYPE_TAG));
    assert!(schema.extends_or_restrict("integer", NUMBER_TYPE_TAG));

    let members = schema.list_members_of_tag(NUMBER_TYPE_TAG).expect("tag exists");
    assert!(members.contains(&"byte".to_owned()));
    assert!(members.contains(&"long".to_owned()));
}

#[test]
fn test_restriction_is_tag_member_through_chain() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    schema
        .restrict_number(&mut sink, "integer", Some(1.0), None, Some("posInt"))
        .expect("restriction");
    assert!(schema.is_member_of_tag("posInt", NUMBER_TYPE_TAG));
}

// === Structural rules ===

#[test]
fn test_record_structural_subtyping() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    let (_, child) = schema
        .parse_type(&mut sink, "{id:ubyte,tag:string,extra:boolean}")
        .expect("child record");
    let (_, parent) = schema
        .parse_type(&mut sink, "{id:integer,tag:string|nil}")
        .expect("parent record");
    assert!(schema.extends_or_restrict(&child, &parent));
    assert!(!schema.extends_or_restrict(&parent, &child));
}

#[test]
fn test_tuple_structural_subtyping() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    let (_, longer) = schema
        .parse_type(&mut sink, "{ubyte,string,boolean}")
        .expect("longer tuple");
    let (_, shorter) = schema
        .parse_type(&mut sink, "{integer,string}")
        .expect("shorter tuple");
    assert!(schema.extends_or_restrict(&longer, &shorter));
    assert!(!schema.extends_or_restrict(&shorter, &longer));
}

#[test]
fn test_enum_label_subset_subtyping() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    let (_, small) = schema.parse_type(&mut sink, "{enum:a|b}").expect("subset");
    let (_, big) = schema.parse_type(&mut sink, "{enum:A|B|C}").expect("superset");
    assert!(schema.extends_or_restrict(&small, &big));
    assert!(!schema.extends_or_restrict(&big, &small));
}

#[test]
fn test_union_subtyping_rules() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    schema.parse_type(&mut sink, "integer|string").expect("union");
    schema.parse_type(&mut sink, "integer|float").expect("union");

    // A member extends the union.
    assert!(schema.extends_or_restrict("integer", "integer|string"));
    // A union extends a non-union when every member does.
    assert!(schema.extends_or_restrict("integer|float", "number"));
    // And not when one member escapes.
    assert!(!schema.extends_or_restrict("integer|string", "number"));
}

// === Transitivity across rule kinds ===

#[test]
fn test_restriction_chains_into_structural() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    schema
        .restrict_number(&mut sink, "integer", Some(0.0), Some(255.0), Some("level"))
        .expect("restriction");
    // The restriction participates in structural record narrowing.
    let (_, child) = schema
        .parse_type(&mut sink, "{hp:level,mp:level}")
        .expect("restricted record");
    let (_, parent) = schema
        .parse_type(&mut sink, "{hp:integer,mp:number}")
        .expect("wider record");
    assert!(schema.extends_or_restrict(&child, &parent));
    assert!(schema.extends_or_restrict("level", "number"));
}

// === Introspection ===

#[test]
fn test_introspection_accessors() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();

    schema
        .parse_type(&mut sink, "{id:integer,tag:string|nil}")
        .expect("record");
    assert_eq!(
        schema.record_field_names("{id:integer,tag:string|nil}"),
        Some(vec!["id".to_owned(), "tag".to_owned()])
    );
    assert_eq!(
        schema.record_optional_field_names("{id:integer,tag:string|nil}"),
        Some(vec!["tag".to_owned()])
    );

    schema.parse_type(&mut sink, "{integer}").expect("array");
    assert_eq!(
        schema.array_element_type("{integer}"),
        Some("integer".to_owned())
    );

    schema.parse_type(&mut sink, "{name:percent}").expect("map");
    assert_eq!(
        schema.map_kv_type("{name:percent}"),
        Some(("name".to_owned(), "percent".to_owned()))
    );

    schema.parse_type(&mut sink, "{integer,string}").expect("tuple");
    assert_eq!(
        schema.tuple_field_types("{integer,string}"),
        Some(vec!["integer".to_owned(), "string".to_owned()])
    );

    schema.parse_type(&mut sink, "{enum:On|Off}").expect("enum");
    assert_eq!(
        schema.enum_labels("{enum:off|on}"),
        Some(vec!["Off".to_owned(), "On".to_owned()])
    );

    schema.parse_type(&mut sink, "integer|nil").expect("union");
    assert_eq!(
        schema.union_types("integer|nil"),
        Some(vec!["integer".to_owned(), "nil".to_owned()])
    );

    assert_eq!(schema.get_type_kind("integer"), Some("name"));
    assert_eq!(schema.get_type_kind("{integer}"), Some("array"));
    assert_eq!(schema.get_type_kind("table"), Some("table"));
    assert_eq!(schema.type_parent("integer"), Some("number"));
    assert!(schema.is_never_table("integer"));
    assert!(!schema.is_never_table("{integer}"));
    assert!(schema.is_built_in_type("integer"));
    assert!(!schema.is_built_in_type("{id:integer,tag:string|nil}"));
}

// === Comparators ===

#[test]
fn test_comparators_compose() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();

    let numeric = schema.get_comparator("integer").expect("integer comparator");
    assert_eq!(
        numeric(&Value::Number(2.0), &Value::Number(10.0)),
        std::cmp::Ordering::Less
    );

    schema.parse_type(&mut sink, "{integer}").expect("array");
    let seq = schema.get_comparator("{integer}").expect("array comparator");
    assert_eq!(
        seq(
            &Value::Seq(vec![Value::Number(1.0), Value::Number(2.0)]),
            &Value::Seq(vec![Value::Number(1.0), Value::Number(3.0)])
        ),
        std::cmp::Ordering::Less
    );
    assert_eq!(
        seq(
            &Value::Seq(vec![Value::Number(1.0)]),
            &Value::Seq(vec![Value::Number(1.0), Value::Number(0.0)])
        ),
        std::cmp::Ordering::Less
    );

    schema.parse_type(&mut sink, "integer|nil").expect("optional");
    let optional = schema.get_comparator("integer|nil").expect("nil-aware comparator");
    assert_eq!(
        optional(&Value::Nil, &Value::Number(-100.0)),
        std::cmp::Ordering::Less
    );
    assert_eq!(optional(&Value::Nil, &Value::Nil), std::cmp::Ordering::Equal);
}

// === Default values ===

#[test]
fn test_default_values() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();

    assert_eq!(schema.create_default_value("integer"), Some(Value::Number(0.0)));
    assert_eq!(schema.create_default_value("boolean"), Some(Value::Bool(false)));
    assert_eq!(schema.create_default_value("string"), Some(Value::str("")));
    assert_eq!(schema.create_default_value("nil"), Some(Value::Nil));

    // A restricted range pulls the default inside its bounds.
    schema
        .restrict_number(&mut sink, "integer", Some(5.0), Some(10.0), Some("five"))
        .expect("restriction");
    assert_eq!(schema.create_default_value("five"), Some(Value::Number(5.0)));

    schema.parse_type(&mut sink, "{integer}").expect("array");
    assert_eq!(
        schema.create_default_value("{integer}"),
        Some(Value::Seq(vec![]))
    );

    schema.parse_type(&mut sink, "{enum:Mid|Low}").expect("enum");
    assert_eq!(
        schema.create_default_value("{enum:low|mid}"),
        Some(Value::str("Low"))
    );

    schema.parse_type(&mut sink, "integer|nil").expect("optional");
    assert_eq!(schema.create_default_value("integer|nil"), Some(Value::Nil));

    schema
        .parse_type(&mut sink, "{id:integer,tag:string|nil}")
        .expect("record");
    assert_eq!(
        schema.create_default_value("{id:integer,tag:string|nil}"),
        Some(Value::Map(vec![(Value::str("id"), Value::Number(0.0))]))
    );
}
