//! Restriction API tests.

use pretty_assertions::assert_eq;
use tessera_diagnostic::{DiagnosticSink, ErrorKind};

use super::{parse_err, parse_ok, schema};
use crate::{TypeDecl, Value};

#[test]
fn test_restrict_number_basic() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    let (_, name) = schema
        .restrict_number(&mut sink, "integer", Some(1.0), Some(10.0), Some("dieRoll"))
        .expect("range should register");
    assert_eq!(name, "integer._R1_10");
    assert_eq!(sink.errors(), 0);

    assert_eq!(parse_ok(&mut schema, "dieRoll", "10").0, Value::Number(10.0));
    assert_eq!(parse_err(&mut schema, "dieRoll", "0"), ErrorKind::OutOfRange);
    assert_eq!(parse_err(&mut schema, "dieRoll", "11"), ErrorKind::OutOfRange);
    assert!(schema.extends_or_restrict("dieRoll", "integer"));
    assert!(schema.extends_or_restrict("dieRoll", "number"));
}

#[test]
fn test_restrict_number_defaults_to_safe_range() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    let (_, name) = schema
        .restrict_number(&mut sink, "integer", Some(0.0), None, None)
        .expect("open-ended range should register");
    assert_eq!(name, "integer._R0_9007199254740992");
}

#[test]
fn test_restrict_number_explicit_bound_outside_parent_fails() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    schema
        .restrict_number(&mut sink, "integer", Some(1.0), None, Some("positiveInt"))
        .expect("positiveInt should register");

    // An explicit bound below the parent's minimum is refused.
    assert!(schema
        .restrict_number(&mut sink, "positiveInt", Some(-5.0), Some(10.0), Some("x"))
        .is_none());
    assert!(sink
        .diagnostics()
        .iter()
        .any(|d| d.kind == ErrorKind::OutOfRange));
}

#[test]
fn test_restrict_number_integer_bounds_must_be_integral() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema
        .restrict_number(&mut sink, "integer", Some(0.5), Some(2.0), None)
        .is_none());
}

#[test]
fn test_restrict_number_rejects_non_numeric_parent() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema
        .restrict_number(&mut sink, "string", Some(0.0), Some(1.0), None)
        .is_none());
}

#[test]
fn test_restrict_number_idempotent() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    let (_, first) = schema
        .restrict_number(&mut sink, "integer", Some(1.0), Some(6.0), None)
        .expect("first registration");
    let (_, second) = schema
        .restrict_number(&mut sink, "integer", Some(1.0), Some(6.0), None)
        .expect("identical re-registration is idempotent");
    assert_eq!(first, second);
    assert_eq!(sink.errors(), 0);
}

#[test]
fn test_restrict_string_length_and_pattern() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    schema
        .restrict_string(
            &mut sink,
            "ascii",
            Some(2),
            Some(4),
            Some("[a-z]+"),
            Some("shortWord"),
        )
        .expect("string restriction should register");

    assert_eq!(parse_ok(&mut schema, "shortWord", "ab").1, "ab");
    assert_eq!(parse_err(&mut schema, "shortWord", "a"), ErrorKind::OutOfRange);
    assert_eq!(parse_err(&mut schema, "shortWord", "abcde"), ErrorKind::OutOfRange);
    assert_eq!(parse_err(&mut schema, "shortWord", "AB"), ErrorKind::PatternMismatch);
    assert!(schema.extends_or_restrict("shortWord", "string"));
}

#[test]
fn test_restrict_string_needs_a_constraint() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema
        .restrict_string(&mut sink, "string", None, None, None, None)
        .is_none());
}

#[test]
fn test_restrict_string_bad_pattern() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema
        .restrict_string(&mut sink, "string", None, None, Some("[unclosed"), None)
        .is_none());
    assert!(sink.has_errors());
}

#[test]
fn test_restrict_enum_subset() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    let labels = ["Up", "Down", "Left", "Right"].map(String::from);
    let (_, parent) = schema
        .register_enum_parser(&mut sink, &labels, Some("direction"))
        .expect("enum should register");

    let subset = ["up", "down"].map(String::from);
    let (_, child) = schema
        .restrict_enum(&mut sink, "direction", &subset, Some("vertical"))
        .expect("subset should register");
    assert_eq!(child, "{enum:down|up}");
    assert!(schema.extends_or_restrict(&child, &parent));

    // Original case comes back out.
    assert_eq!(parse_ok(&mut schema, "vertical", "UP").1, "Up");
    assert_eq!(parse_err(&mut schema, "vertical", "Left"), ErrorKind::EnumLabel);

    // A label the parent does not have is refused.
    let bogus = ["sideways".to_owned()];
    assert!(schema
        .restrict_enum(&mut sink, "direction", &bogus, None)
        .is_none());
}

#[test]
fn test_restrict_union_subset() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema.register_alias(&mut sink, "anyScalar", "integer|float|string|nil"));

    let allowed = ["integer".to_owned(), "nil".to_owned()];
    let (_, child) = schema
        .restrict_union(&mut sink, "anyScalar", &allowed, Some("maybeInt"))
        .expect("union subset should register");
    // Parent order is kept, so nil stays last.
    assert_eq!(child, "integer|nil");
    assert!(schema.extends_or_restrict(&child, "anyScalar"));

    let bogus = ["boolean".to_owned()];
    assert!(schema
        .restrict_union(&mut sink, "anyScalar", &bogus, None)
        .is_none());
    assert!(sink
        .diagnostics()
        .iter()
        .any(|d| d.kind == ErrorKind::UnionMember));
}

#[test]
fn test_restrict_with_expression_needs_engine() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    // No sandbox attached: registration fails with a compile error.
    assert!(schema
        .restrict_with_expression(&mut sink, "integer", "even", "value % 2 == 0")
        .is_none());
    assert!(sink
        .diagnostics()
        .iter()
        .any(|d| d.kind == ErrorKind::ExpressionCompile));
}

#[test]
fn test_restrict_with_validator() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    schema
        .restrict_with_validator(
            &mut sink,
            "integer",
            "evenNative",
            std::sync::Arc::new(|value: &Value| match value.as_number() {
                Some(n) if n % 2.0 == 0.0 => Ok(()),
                _ => Err("value is odd".to_owned()),
            }),
        )
        .expect("validator should register");

    assert_eq!(parse_ok(&mut schema, "evenNative", "4").0, Value::Number(4.0));
    assert_eq!(
        parse_err(&mut schema, "evenNative", "5"),
        ErrorKind::ExpressionRuntime
    );
}

#[test]
fn test_extend_parser_post_transform() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    schema
        .extend_parser(
            &mut sink,
            "ascii",
            "upper",
            std::sync::Arc::new(|_sink, value, _reformatted, _ctx| {
                let text = value.as_str().unwrap_or_default().to_ascii_uppercase();
                crate::ParseOutcome::ok(Value::str(text.clone()), text)
            }),
        )
        .expect("transform should register");
    assert_eq!(parse_ok(&mut schema, "upper", "abc").1, "ABC");
}

#[test]
fn test_restrict_to_type_extending() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    schema
        .restrict_to_type_extending(&mut sink, "name", "numericTypeName", "number")
        .expect("should register");
    assert_eq!(parse_ok(&mut schema, "numericTypeName", "integer").1, "integer");
    assert_eq!(
        parse_err(&mut schema, "numericTypeName", "string"),
        ErrorKind::UnknownType
    );
    assert_eq!(
        parse_err(&mut schema, "numericTypeName", "noSuch"),
        ErrorKind::UnknownType
    );
}

#[test]
fn test_register_alias_idempotent_and_conflicting() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    assert!(schema.register_alias(&mut sink, "score", "integer"));
    assert!(schema.register_alias(&mut sink, "score", "integer"));
    assert_eq!(sink.errors(), 0);

    assert!(!schema.register_alias(&mut sink, "score", "float"));
    assert!(sink
        .diagnostics()
        .iter()
        .any(|d| d.kind == ErrorKind::DuplicateName));
}

#[test]
fn test_register_alias_rejects_bad_names() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    for name in ["nil", "extends", "_1", "a b"] {
        assert!(!schema.register_alias(&mut sink, name, "integer"), "{name}");
    }
}

#[test]
fn test_register_type_tag() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    let members = ["byte", "ubyte"].map(String::from);
    assert!(schema.register_type_tag(&mut sink, "smallInt", &members));
    assert!(schema.is_member_of_tag("byte", "smallInt"));
    assert!(!schema.is_member_of_tag("float", "smallInt"));
    assert_eq!(
        schema.list_members_of_tag("smallInt"),
        Some(vec!["byte".to_owned(), "ubyte".to_owned()])
    );
    // Both members chain to integer, the deepest common ancestor.
    assert_eq!(parse_ok(&mut schema, "smallInt", "ubyte").1, "ubyte");
    assert_eq!(parse_err(&mut schema, "smallInt", "float"), ErrorKind::UnknownType);
}

// === Data-driven registration ===

#[test]
fn test_decl_batch_continues_past_failures() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    let decls = [
        TypeDecl {
            name: "hp".to_owned(),
            parent: Some("integer".to_owned()),
            min: Some(0.0),
            max: Some(9999.0),
            ..TypeDecl::default()
        },
        TypeDecl {
            // Mixes two constraint families.
            name: "broken".to_owned(),
            min: Some(0.0),
            pattern: Some("x".to_owned()),
            ..TypeDecl::default()
        },
        TypeDecl {
            name: "slot".to_owned(),
            values: Some(vec!["head".to_owned(), "chest".to_owned()]),
            ..TypeDecl::default()
        },
    ];
    // One bad declaration fails the batch but not its neighbours.
    assert!(!schema.register_types_from_decls(&mut sink, &decls));
    assert_eq!(parse_ok(&mut schema, "hp", "100").1, "100");
    assert_eq!(parse_ok(&mut schema, "slot", "HEAD").1, "head");
}

#[test]
fn test_decl_plain_alias() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    let decls = [TypeDecl {
        name: "rowId".to_owned(),
        parent: Some("integer".to_owned()),
        ..TypeDecl::default()
    }];
    assert!(schema.register_types_from_decls(&mut sink, &decls));
    assert_eq!(parse_ok(&mut schema, "rowId", "9").1, "9");
}

// === Schema export ===

#[test]
fn test_schema_model_rows() {
    let mut schema = schema();
    let mut sink = DiagnosticSink::new();
    schema
        .restrict_number(&mut sink, "integer", Some(0.0), Some(100.0), Some("pct"))
        .expect("restriction");

    let rows = schema.get_schema_model();
    let integer = rows.iter().find(|r| r.name == "integer").expect("integer row");
    assert!(integer.is_builtin);
    assert_eq!(integer.kind, "name");
    assert_eq!(integer.parent.as_deref(), Some("number"));

    let pct = rows.iter().find(|r| r.name == "pct").expect("pct alias row");
    assert!(!pct.is_builtin);
    assert_eq!(pct.definition, "integer._R0_100");
    assert_eq!(pct.min, Some(0.0));
    assert_eq!(pct.max, Some(100.0));

    let direction = rows.iter().find(|r| r.name == "boolean").expect("boolean row");
    assert!(direction.is_builtin);
}
