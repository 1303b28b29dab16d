//! Parser and canonical-form tests.

use pretty_assertions::assert_eq;

use crate::{parse_spec, parse_spec_prefix, TypeAst};

fn canon(input: &str) -> String {
    match parse_spec(input) {
        Ok(ast) => ast.canonical(),
        Err(err) => panic!("spec `{input}` failed to parse: {err}"),
    }
}

// === Basic shapes ===

#[test]
fn test_parse_name() {
    assert_eq!(parse_spec("integer"), Ok(TypeAst::Name("integer".into())));
}

#[test]
fn test_parse_dotted_name() {
    assert_eq!(
        parse_spec("game.item"),
        Ok(TypeAst::Name("game.item".into()))
    );
}

#[test]
fn test_parse_empty_table() {
    assert_eq!(parse_spec("{}"), Ok(TypeAst::Table));
}

#[test]
fn test_parse_array() {
    assert_eq!(
        parse_spec("{integer}"),
        Ok(TypeAst::Array(Box::new(TypeAst::Name("integer".into()))))
    );
}

#[test]
fn test_parse_tuple() {
    assert_eq!(
        parse_spec("{integer,string}"),
        Ok(TypeAst::Tuple(vec![
            TypeAst::Name("integer".into()),
            TypeAst::Name("string".into()),
        ]))
    );
}

#[test]
fn test_parse_single_kv_is_map() {
    assert_eq!(
        parse_spec("{name:percent}"),
        Ok(TypeAst::Map(
            Box::new(TypeAst::Name("name".into())),
            Box::new(TypeAst::Name("percent".into())),
        ))
    );
}

#[test]
fn test_parse_multi_kv_is_record() {
    assert_eq!(
        parse_spec("{id:integer,tag:string|nil}"),
        Ok(TypeAst::Record(vec![
            ("id".into(), TypeAst::Name("integer".into())),
            (
                "tag".into(),
                TypeAst::Union(vec![
                    TypeAst::Name("string".into()),
                    TypeAst::Name("nil".into()),
                ])
            ),
        ]))
    );
}

#[test]
fn test_parse_union() {
    assert_eq!(
        parse_spec("integer|float|string"),
        Ok(TypeAst::Union(vec![
            TypeAst::Name("integer".into()),
            TypeAst::Name("float".into()),
            TypeAst::Name("string".into()),
        ]))
    );
}

#[test]
fn test_parse_enum_convention() {
    assert_eq!(
        parse_spec("{enum:Alpha|Beta}"),
        Ok(TypeAst::Enum(vec!["Alpha".into(), "Beta".into()]))
    );
}

#[test]
fn test_parse_self_ref() {
    assert_eq!(
        parse_spec("{{extends,number},self._1}"),
        Ok(TypeAst::Tuple(vec![
            TypeAst::Tuple(vec![
                TypeAst::Name("extends".into()),
                TypeAst::Name("number".into()),
            ]),
            TypeAst::SelfRef("_1".into()),
        ]))
    );
}

#[test]
fn test_parse_comments_and_whitespace() {
    assert_eq!(
        canon("{ id : integer , # the row id\n  tag : string }"),
        "{id:integer,tag:string}"
    );
}

// === Parse errors ===

#[test]
fn test_error_on_trailing_input() {
    assert!(parse_spec("integer extra").is_err());
}

#[test]
fn test_error_on_illegal_character() {
    assert!(parse_spec("integer;").is_err());
}

#[test]
fn test_error_on_empty_input() {
    assert!(parse_spec("").is_err());
    assert!(parse_spec("   # just a comment").is_err());
}

#[test]
fn test_error_on_unclosed_brace() {
    assert!(parse_spec("{integer").is_err());
}

#[test]
fn test_error_on_mixed_list_and_kv() {
    assert!(parse_spec("{a:integer,string}").is_err());
}

#[test]
fn test_error_on_duplicate_field() {
    assert!(parse_spec("{a:integer,a:string}").is_err());
}

#[test]
fn test_error_on_bad_self_ref() {
    assert!(parse_spec("self").is_err());
    assert!(parse_spec("self.a.b").is_err());
}

#[test]
fn test_error_on_non_identifier_record_key() {
    assert!(parse_spec("{a.b:integer,c:string}").is_err());
}

#[test]
fn test_error_on_enum_with_non_name_labels() {
    assert!(parse_spec("{enum:{a}|b}").is_err());
}

// === Partial parse ===

#[test]
fn test_prefix_parse_returns_rest() {
    let (ast, rest) = match parse_spec_prefix("integer|nil = 42") {
        Ok(pair) => pair,
        Err(err) => panic!("prefix parse failed: {err}"),
    };
    assert_eq!(ast.canonical(), "integer|nil");
    assert_eq!(rest, " = 42");
}

#[test]
fn test_prefix_parse_consumes_whole_spec() {
    let (ast, rest) = match parse_spec_prefix("{id:integer,tag:string}") {
        Ok(pair) => pair,
        Err(err) => panic!("prefix parse failed: {err}"),
    };
    assert_eq!(ast.canonical(), "{id:integer,tag:string}");
    assert_eq!(rest, "");
}

// === Canonical form ===

#[test]
fn test_canonical_sorts_record_fields() {
    assert_eq!(canon("{zed:string,alpha:integer}"), "{alpha:integer,zed:string}");
}

#[test]
fn test_canonical_enum_labels_folded_sorted_deduped() {
    assert_eq!(canon("{enum:Beta|Alpha|beta}"), "{enum:alpha|beta}");
}

#[test]
fn test_canonical_preserves_union_order() {
    assert_eq!(canon("string|integer"), "string|integer");
}

#[test]
fn test_canonical_round_trip_is_stable() {
    for spec in [
        "integer",
        "{integer}",
        "{b:integer,a:{string}|nil}",
        "{enum:Up|Down|LEFT}",
        "{integer:string}",
        "{extends,number}",
        "{{extends,number},self._1}",
        "integer|float|string",
        "{}",
    ] {
        let once = canon(spec);
        assert_eq!(canon(&once), once, "canonical form of `{spec}` not stable");
    }
}
