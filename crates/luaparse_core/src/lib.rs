//! luaparse_core: Core utilities for the luaparse Lua front end.
//!
//! Provides source positions, text ranges, column math, and the ordered
//! collections used throughout the scanner and parser.

pub mod collections;
pub mod text;

// Re-export commonly used types
pub use collections::FxIndexMap;
pub use text::{Location, Position, TextPos, TextRange};
