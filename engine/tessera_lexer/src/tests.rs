use pretty_assertions::assert_eq;

use crate::{lex_prefix, TokenKind};

fn kinds(input: &str) -> Vec<TokenKind> {
    lex_prefix(input).tokens.iter().map(|t| t.kind).collect()
}

#[test]
fn test_lex_simple_name() {
    assert_eq!(kinds("integer"), [TokenKind::Ident]);
}

#[test]
fn test_lex_union() {
    assert_eq!(
        kinds("integer|nil"),
        [TokenKind::Ident, TokenKind::Pipe, TokenKind::Ident]
    );
}

#[test]
fn test_lex_braced_record() {
    assert_eq!(
        kinds("{id:integer,tag:string}"),
        [
            TokenKind::LBrace,
            TokenKind::Ident,
            TokenKind::Colon,
            TokenKind::Ident,
            TokenKind::Comma,
            TokenKind::Ident,
            TokenKind::Colon,
            TokenKind::Ident,
            TokenKind::RBrace,
        ]
    );
}

#[test]
fn test_lex_dotted_name() {
    assert_eq!(
        kinds("self._1"),
        [TokenKind::Ident, TokenKind::Dot, TokenKind::Ident]
    );
}

#[test]
fn test_whitespace_and_comments_skipped() {
    let output = lex_prefix("integer # the id column\n | nil");
    let ks: Vec<_> = output.tokens.iter().map(|t| t.kind).collect();
    assert_eq!(ks, [TokenKind::Ident, TokenKind::Pipe, TokenKind::Ident]);
    assert!(output.is_complete("integer # the id column\n | nil"));
}

#[test]
fn test_spans_slice_source() {
    let input = "{ weight : number }";
    let output = lex_prefix(input);
    let names: Vec<_> = output
        .tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Ident)
        .map(|t| t.span.text(input))
        .collect();
    assert_eq!(names, ["weight", "number"]);
}

#[test]
fn test_stops_at_illegal_byte() {
    let input = "integer;rest of the line";
    let output = lex_prefix(input);
    assert_eq!(output.tokens.len(), 1);
    assert_eq!(output.end, 7);
    assert!(!output.is_complete(input));
}

#[test]
fn test_empty_input() {
    let output = lex_prefix("");
    assert!(output.tokens.is_empty());
    assert!(output.is_complete(""));
}
