//! Tokens produced by the lexer.

use luaparse_ast::syntax_kind::TokenType;
use luaparse_core::text::{Location, Position, TextRange};
use serde::Serialize;

/// The interpreted value of a token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TokenValue {
    /// Names, punctuators, decoded string contents, comment text.
    Text(String),
    Number(f64),
    Boolean(bool),
    Nil,
}

/// A scanned token with its source span.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenType,
    pub value: TokenValue,
    /// The exact source text of the token. Empty for EOF.
    #[serde(rename = "rawValue")]
    pub raw: String,
    pub start: Position,
    pub end: Position,
    #[serde(flatten)]
    pub range: TextRange,
}

impl Token {
    /// The text used when quoting this token in a message.
    ///
    /// This is the interpreted text for names and punctuators, `<eof>` at the
    /// end of input, and the raw source text for everything else.
    pub fn text(&self) -> &str {
        match (&self.kind, &self.value) {
            (TokenType::StringLiteral | TokenType::Comment, _) => &self.raw,
            (_, TokenValue::Text(text)) => text,
            _ => &self.raw,
        }
    }

    /// Whether this is the punctuator `text`.
    #[inline]
    pub fn is_punctuator(&self, text: &str) -> bool {
        self.kind == TokenType::Punctuator && self.raw == text
    }

    /// Whether this is the keyword `text`.
    #[inline]
    pub fn is_keyword(&self, text: &str) -> bool {
        self.kind == TokenType::Keyword && self.raw == text
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.kind == TokenType::EOF
    }

    pub fn location(&self) -> Location {
        Location::new(self.start, self.end, self.range)
    }

    /// The length of this token in bytes.
    pub fn len(&self) -> u32 {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}
