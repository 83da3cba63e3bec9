//! luaparse_ast: Abstract Syntax Tree definitions for Lua source.
//!
//! This module defines the token and node kinds, the arena-allocated node
//! sum types, the child-visitation protocol, and the offset queries built on
//! top of it.

pub mod node;
pub mod query;
pub mod syntax_kind;
pub mod types;
pub mod visitor;

// Re-export key types
pub use node::*;
pub use syntax_kind::{SyntaxKind, TokenType};
pub use types::*;
pub use visitor::{walk, Node, VisitAction};
