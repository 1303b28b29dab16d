use smallvec::SmallVec;
use thiserror::Error;

use tessera_lexer::{lex_prefix, LexOutput, Token, TokenKind};

use crate::ast::TypeAst;
use crate::names::is_identifier;

/// Error produced when a type-spec string does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {offset}")]
pub struct SpecParseError {
    pub message: String,
    pub offset: usize,
}

/// Parse a complete type spec. The entire input must be consumed.
pub fn parse_spec(input: &str) -> Result<TypeAst, SpecParseError> {
    let lexed = lex_prefix(input);
    if !lexed.is_complete(input) {
        return Err(SpecParseError {
            message: "unexpected character in type spec".to_owned(),
            offset: lexed.end,
        });
    }
    let mut cursor = Cursor::new(input, lexed);
    let ast = parse_union(&mut cursor)?;
    match cursor.peek() {
        None => Ok(ast),
        Some(_) => Err(cursor.error_here("trailing input after type spec")),
    }
}

/// Parse a single type spec off the front of `input`.
///
/// Returns the parsed spec and the unconsumed remainder, which starts
/// right after the last token of the spec.
pub fn parse_spec_prefix(input: &str) -> Result<(TypeAst, &str), SpecParseError> {
    let lexed = lex_prefix(input);
    let mut cursor = Cursor::new(input, lexed);
    let ast = parse_union(&mut cursor)?;
    let rest = &input[cursor.consumed_end()..];
    Ok((ast, rest))
}

/// Cursor over the lexed token list.
struct Cursor<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    lex_end: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str, lexed: LexOutput) -> Self {
        Cursor {
            input,
            tokens: lexed.tokens,
            pos: 0,
            lex_end: lexed.end,
        }
    }

    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, SpecParseError> {
        match self.tokens.get(self.pos) {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(*token)
            }
            _ => Err(self.error_here(format!("expected {}", kind.describe()))),
        }
    }

    fn text(&self, token: Token) -> &'a str {
        token.span.text(self.input)
    }

    /// Byte offset just past the last consumed token.
    fn consumed_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    /// Offset of the current token, or of the end of the lexed region.
    fn offset_here(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.lex_end, |t| t.span.start)
    }

    fn error_here(&self, message: impl Into<String>) -> SpecParseError {
        SpecParseError {
            message: message.into(),
            offset: self.offset_here(),
        }
    }
}

/// `Union := Base ('|' Base)*`
fn parse_union(cursor: &mut Cursor<'_>) -> Result<TypeAst, SpecParseError> {
    let first = parse_base(cursor)?;
    if cursor.peek() != Some(TokenKind::Pipe) {
        return Ok(first);
    }
    let mut members = vec![first];
    while cursor.eat(TokenKind::Pipe) {
        members.push(parse_base(cursor)?);
    }
    Ok(TypeAst::Union(members))
}

/// `Base := Name | '{' '}' | '{' List '}'`
fn parse_base(cursor: &mut Cursor<'_>) -> Result<TypeAst, SpecParseError> {
    match cursor.peek() {
        Some(TokenKind::Ident) => parse_name(cursor),
        Some(TokenKind::LBrace) => parse_braced(cursor),
        _ => Err(cursor.error_here("expected type name or `{`")),
    }
}

/// `Name := Ident ('.' Ident)*`, with `self.X` recognised as a self-reference.
fn parse_name(cursor: &mut Cursor<'_>) -> Result<TypeAst, SpecParseError> {
    let first = cursor.expect(TokenKind::Ident)?;
    let mut segments: SmallVec<[&str; 2]> = SmallVec::new();
    segments.push(cursor.text(first));
    while cursor.peek() == Some(TokenKind::Dot) {
        cursor.bump();
        let segment = cursor.expect(TokenKind::Ident)?;
        segments.push(cursor.text(segment));
    }
    if segments[0] == "self" {
        if segments.len() != 2 {
            return Err(cursor.error_here("self-reference must be `self.<field>`"));
        }
        return Ok(TypeAst::SelfRef(segments[1].to_owned()));
    }
    Ok(TypeAst::Name(segments.join(".")))
}

fn parse_braced(cursor: &mut Cursor<'_>) -> Result<TypeAst, SpecParseError> {
    cursor.expect(TokenKind::LBrace)?;
    if cursor.eat(TokenKind::RBrace) {
        return Ok(TypeAst::Table);
    }

    let key_offset = cursor.offset_here();
    let first = parse_union(cursor)?;

    if cursor.peek() == Some(TokenKind::Colon) {
        return parse_kv_list(cursor, first, key_offset);
    }

    // Plain list: array if one element, tuple if two or more.
    let mut items: SmallVec<[TypeAst; 4]> = SmallVec::new();
    items.push(first);
    while cursor.eat(TokenKind::Comma) {
        items.push(parse_union(cursor)?);
    }
    cursor.expect(TokenKind::RBrace)?;

    if items.len() == 1 {
        let elem = items.into_iter().next().unwrap_or(TypeAst::Table);
        Ok(TypeAst::Array(Box::new(elem)))
    } else {
        Ok(TypeAst::Tuple(items.into_vec()))
    }
}

/// Key/value list: a map with exactly one pair, a record otherwise.
fn parse_kv_list(
    cursor: &mut Cursor<'_>,
    first_key: TypeAst,
    first_key_offset: usize,
) -> Result<TypeAst, SpecParseError> {
    cursor.expect(TokenKind::Colon)?;
    let first_value = parse_union(cursor)?;
    let mut pairs: SmallVec<[(TypeAst, TypeAst, usize); 4]> = SmallVec::new();
    pairs.push((first_key, first_value, first_key_offset));

    while cursor.eat(TokenKind::Comma) {
        let key_offset = cursor.offset_here();
        let key = parse_union(cursor)?;
        cursor.expect(TokenKind::Colon)?;
        let value = parse_union(cursor)?;
        pairs.push((key, value, key_offset));
    }
    cursor.expect(TokenKind::RBrace)?;

    if pairs.len() == 1 {
        let (key, value, offset) = pairs.into_iter().next().unwrap_or((
            TypeAst::Table,
            TypeAst::Table,
            0,
        ));
        if key.is_name("enum") {
            return enum_from_labels(value, offset);
        }
        return Ok(TypeAst::Map(Box::new(key), Box::new(value)));
    }

    let mut fields = Vec::with_capacity(pairs.len());
    for (key, value, offset) in pairs {
        let name = match key {
            TypeAst::Name(name) if is_identifier(&name) => name,
            _ => {
                return Err(SpecParseError {
                    message: "record field key must be an identifier".to_owned(),
                    offset,
                })
            }
        };
        if fields.iter().any(|(existing, _)| *existing == name) {
            return Err(SpecParseError {
                message: format!("duplicate record field `{name}`"),
                offset,
            });
        }
        fields.push((name, value));
    }
    Ok(TypeAst::Record(fields))
}

/// Convert the value of `{enum:...}` into a label list.
fn enum_from_labels(value: TypeAst, offset: usize) -> Result<TypeAst, SpecParseError> {
    let members = match value {
        TypeAst::Union(members) => members,
        single => vec![single],
    };
    let mut labels = Vec::with_capacity(members.len());
    for member in members {
        match member {
            TypeAst::Name(name) if is_identifier(&name) => labels.push(name),
            _ => {
                return Err(SpecParseError {
                    message: "enum labels must be identifiers".to_owned(),
                    offset,
                })
            }
        }
    }
    Ok(TypeAst::Enum(labels))
}
