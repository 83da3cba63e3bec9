//! Token types and node kinds.

use serde::Serialize;
use std::fmt;

/// The classification of a scanned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenType {
    Unexpected,
    EOF,
    StringLiteral,
    Keyword,
    Identifier,
    NumericLiteral,
    Punctuator,
    BooleanLiteral,
    NilLiteral,
    VarargLiteral,
    Comment,
}

impl TokenType {
    /// Whether the grammar ever sees this token.
    ///
    /// Comments and unexpected characters stay in the full token list but are
    /// filtered out of the stream the parser consumes.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenType::Comment | TokenType::Unexpected)
    }

    /// The short kind name used in "unexpected ..." messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenType::StringLiteral => "string",
            TokenType::Keyword => "keyword",
            TokenType::Identifier => "identifier",
            TokenType::NumericLiteral => "number",
            TokenType::BooleanLiteral => "boolean",
            _ => "symbol",
        }
    }
}

/// Lua keywords. `true`, `false` and `nil` are literals, not keywords.
pub const KEYWORDS: &[&str] = &[
    "do", "if", "in", "or", "and", "end", "for", "not", "else", "goto", "then", "break", "local",
    "until", "while", "elseif", "repeat", "return", "function",
];

/// Classify identifier-shaped text as a keyword, literal, or plain identifier.
pub fn classify_word(text: &str) -> TokenType {
    match text {
        "true" | "false" => TokenType::BooleanLiteral,
        "nil" => TokenType::NilLiteral,
        _ if KEYWORDS.contains(&text) => TokenType::Keyword,
        _ => TokenType::Identifier,
    }
}

/// The kind of an AST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum SyntaxKind {
    Chunk,
    Block,

    // Statements
    BreakStatement,
    ReturnStatement,
    IfStatement,
    IfClause,
    ElseifClause,
    ElseClause,
    WhileStatement,
    DoStatement,
    RepeatStatement,
    LocalStatement,
    AssignmentStatement,
    CallStatement,
    FunctionDeclaration,
    ForNumericStatement,
    ForGenericStatement,

    // Literals and names
    Identifier,
    StringLiteral,
    NumericLiteral,
    BooleanLiteral,
    NilLiteral,
    VarargLiteral,

    // Tables
    TableKey,
    TableKeyString,
    TableValue,
    TableConstructorExpression,

    // Expressions
    LogicalExpression,
    BinaryExpression,
    UnaryExpression,
    MemberExpression,
    IndexExpression,
    CallExpression,
    TableCallExpression,
    StringCallExpression,

    Comment,
    ErroneousNode,
}

impl SyntaxKind {
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            SyntaxKind::BreakStatement
                | SyntaxKind::ReturnStatement
                | SyntaxKind::IfStatement
                | SyntaxKind::WhileStatement
                | SyntaxKind::DoStatement
                | SyntaxKind::RepeatStatement
                | SyntaxKind::LocalStatement
                | SyntaxKind::AssignmentStatement
                | SyntaxKind::CallStatement
                | SyntaxKind::FunctionDeclaration
                | SyntaxKind::ForNumericStatement
                | SyntaxKind::ForGenericStatement
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::StringLiteral
                | SyntaxKind::NumericLiteral
                | SyntaxKind::BooleanLiteral
                | SyntaxKind::NilLiteral
                | SyntaxKind::VarargLiteral
        )
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_word() {
        assert_eq!(classify_word("local"), TokenType::Keyword);
        assert_eq!(classify_word("goto"), TokenType::Keyword);
        assert_eq!(classify_word("true"), TokenType::BooleanLiteral);
        assert_eq!(classify_word("nil"), TokenType::NilLiteral);
        assert_eq!(classify_word("self"), TokenType::Identifier);
        assert_eq!(classify_word("Local"), TokenType::Identifier);
    }

    #[test]
    fn test_trivia() {
        assert!(TokenType::Comment.is_trivia());
        assert!(TokenType::Unexpected.is_trivia());
        assert!(!TokenType::EOF.is_trivia());
    }
}
