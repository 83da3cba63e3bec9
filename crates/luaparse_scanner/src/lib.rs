//! luaparse_scanner: Lexer/tokenizer for Lua source code.
//!
//! Produces classified tokens with byte ranges and line/column positions:
//! - Names, keywords, and the `true`/`false`/`nil` literals
//! - Numbers, including `_` digit separators and hex integers
//! - Quoted and long-bracket strings
//! - Line and long comments (kept as tokens)

mod char_codes;
mod scanner;
mod token;

pub use scanner::{parse_number, tokenize, Lexer};
pub use token::{Token, TokenValue};
