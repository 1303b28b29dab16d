//! Lexer for tessera type-spec strings, using logos.
//!
//! Type specs are short (`integer|nil`, `{name:percent}`), so the lexer
//! produces a plain token vector rather than streaming. Lexing is
//! *greedy*: it stops at the first byte it cannot tokenize and reports
//! how far it got, which lets the parser offer both a full entry point
//! (whole input must lex and parse) and a prefix entry point (peel one
//! spec off the front of a larger string).

use logos::Logos;

#[cfg(test)]
mod tests;

/// Raw token from logos (before span bookkeeping).
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")] // Whitespace between tokens is discarded
#[logos(skip r"#[^\n]*")] // Line comments run to end of line
enum RawToken {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("|")]
    Pipe,
    #[token(".")]
    Dot,
}

/// Kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Pipe,
    Dot,
}

impl TokenKind {
    /// Human-readable description for parse errors.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Comma => "`,`",
            TokenKind::Colon => "`:`",
            TokenKind::Pipe => "`|`",
            TokenKind::Dot => "`.`",
        }
    }
}

/// Byte range of a token in the source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Slice the source text covered by this span.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// A token with its source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Result of lexing a (prefix of a) type-spec string.
#[derive(Debug, Clone, Default)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    /// Byte offset up to which the input lexed cleanly. Equals the input
    /// length when the whole string consists of valid tokens, whitespace
    /// and comments.
    pub end: usize,
}

impl LexOutput {
    /// Whether the entire input was tokenized.
    pub fn is_complete(&self, input: &str) -> bool {
        self.end == input.len()
    }
}

/// Lex as much of `input` as possible.
///
/// Stops at the first unlexable byte; `LexOutput::end` records how far
/// the lexer got (the offset of the offending byte, or the input length).
pub fn lex_prefix(input: &str) -> LexOutput {
    let mut lexer = RawToken::lexer(input);
    let mut tokens = Vec::new();
    let mut end = input.len();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(raw) => {
                tokens.push(Token {
                    kind: convert(raw),
                    span: Span::new(span.start, span.end),
                });
            }
            Err(()) => {
                end = span.start;
                break;
            }
        }
    }

    LexOutput { tokens, end }
}

fn convert(raw: RawToken) -> TokenKind {
    match raw {
        RawToken::Ident => TokenKind::Ident,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Pipe => TokenKind::Pipe,
        RawToken::Dot => TokenKind::Dot,
    }
}
