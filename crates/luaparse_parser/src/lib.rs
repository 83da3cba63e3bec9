//! luaparse_parser: Error-tolerant recursive descent parser for Lua.
//!
//! Parses Lua source into an arena-allocated AST. Parsing never fails: every
//! syntax error is collected, the tree is completed with erroneous nodes, and
//! each block records the locals it declares.
//!
//! ```
//! let arena = bumpalo::Bump::new();
//! let result = luaparse_parser::parse(&arena, "local x = 1\nprint(x)");
//! assert!(result.is_valid());
//! assert_eq!(result.globals[0].name, "print");
//! ```

mod hints;
mod parser;
mod precedence;
mod scope;
mod utilities;

pub use parser::Parser;
pub use precedence::{binary_operator, unary_operator, Operator, UNARY_PRIORITY};
pub use utilities::{can_start_statement, is_block_follow};

use bumpalo::Bump;
use luaparse_ast::node::{Chunk, Identifier};
use luaparse_core::text::TextPos;
use luaparse_diagnostics::SyntaxError;
use luaparse_scanner::Token;
use serde::Serialize;

/// Everything one parse produces.
#[derive(Debug, Serialize)]
pub struct ParseResult<'a> {
    /// Every scanned token in source order, comments included, ending with EOF.
    pub tokens: Vec<Token>,
    pub ast: Chunk<'a>,
    /// Identifiers read without a visible local binding, first occurrence
    /// of each name only.
    pub globals: Vec<Identifier<'a>>,
    /// Syntax errors ordered by start offset.
    pub errors: Vec<SyntaxError>,
}

impl<'a> ParseResult<'a> {
    /// Whether the source parsed without errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The token covering `offset`, if any. Whitespace has no token.
    pub fn token_at(&self, offset: TextPos) -> Option<&Token> {
        let index = self.tokens.partition_point(|token| token.range.end <= offset);
        self.tokens.get(index).filter(|token| token.range.contains(offset))
    }
}

/// Parse `source` into a tree allocated in `arena`.
pub fn parse<'a>(arena: &'a Bump, source: &str) -> ParseResult<'a> {
    Parser::new(arena, source).parse()
}
