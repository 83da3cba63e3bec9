//! Parser utility functions.

use luaparse_ast::syntax_kind::TokenType;
use luaparse_scanner::Token;

/// Check if a token ends the current block.
pub fn is_block_follow(token: &Token) -> bool {
    match token.kind {
        TokenType::EOF => true,
        TokenType::Keyword => matches!(token.raw.as_str(), "else" | "elseif" | "end" | "until"),
        _ => false,
    }
}

/// Check if a token can start a statement.
///
/// Error recovery skips forward to the next such token.
pub fn can_start_statement(token: &Token) -> bool {
    match token.kind {
        TokenType::Identifier => true,
        TokenType::Punctuator => matches!(token.raw.as_str(), "(" | ";"),
        TokenType::Keyword => matches!(
            token.raw.as_str(),
            "local" | "if" | "return" | "function" | "while" | "for" | "repeat" | "break" | "do"
        ),
        _ => false,
    }
}
