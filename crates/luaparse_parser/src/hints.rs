//! Type hints and descriptions read from comments above a declaration.
//!
//! ```lua
//! -- Number of retries before giving up.
//! -- retries: number
//! local retries = 3
//! ```
//!
//! A comment line of the form `name: Type` hints the type of the binding
//! called `name`. Every other line becomes part of the description.

use bumpalo::Bump;
use luaparse_ast::node::{Expression, ScopedIdentifierInfo};
use once_cell::sync::Lazy;
use regex::Regex;

static TYPE_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*-*\s*([A-Za-z_][A-Za-z0-9_]*)\s*:\s*([A-Za-z_][A-Za-z0-9_.]*(?:\[\])?)\s*$").unwrap()
});

/// Hints gathered from one run of adjacent comments.
#[derive(Debug, Default)]
pub struct CommentHints<'a> {
    types: Vec<(&'a str, &'a str)>,
    description: Option<&'a str>,
}

impl<'a> CommentHints<'a> {
    /// Read hints from comment values, first line first.
    pub fn parse(arena: &'a Bump, lines: &[&str]) -> Self {
        let mut types = Vec::new();
        let mut description: Vec<&str> = Vec::new();

        for text in lines.iter().flat_map(|comment| comment.lines()) {
            let captures = TYPE_HINT.captures(text);
            match captures.as_ref().and_then(|c| Some((c.get(1)?, c.get(2)?))) {
                Some((name, type_name)) => {
                    let name: &'a str = arena.alloc_str(name.as_str());
                    let type_name: &'a str = arena.alloc_str(type_name.as_str());
                    types.push((name, type_name));
                }
                None => {
                    let text = text.trim_start_matches('-').trim();
                    if !text.is_empty() {
                        description.push(text);
                    }
                }
            }
        }

        let description = if description.is_empty() {
            None
        } else {
            let joined: &'a str = arena.alloc_str(&description.join("\n"));
            Some(joined)
        };
        Self { types, description }
    }

    /// The hinted type for `name`; the last hint wins.
    pub fn type_for(&self, name: &str) -> Option<&'a str> {
        self.types.iter().rev().find(|(hinted, _)| *hinted == name).map(|(_, ty)| *ty)
    }

    /// Apply the type hint for this binding's name, if any.
    pub fn apply_type(&self, info: &mut ScopedIdentifierInfo<'a>) {
        if let Some(type_name) = self.type_for(info.name) {
            info.type_name = Some(type_name);
            info.type_hinted = true;
        }
    }

    /// Apply both the type hint and the description.
    pub fn apply(&self, info: &mut ScopedIdentifierInfo<'a>) {
        self.apply_type(info);
        if let Some(description) = self.description {
            info.description = Some(description);
        }
    }
}

/// A type guess for a binding initialized with `value`.
///
/// Only literal forms are recognized. A guess never overrides a hint.
pub fn guess_type<'a>(info: &mut ScopedIdentifierInfo<'a>, value: Option<&Expression<'a>>) {
    if info.type_hinted {
        return;
    }
    if let Some(guess) = value.and_then(literal_type) {
        info.type_name = Some(guess);
    }
}

fn literal_type(value: &Expression<'_>) -> Option<&'static str> {
    match value {
        Expression::StringLiteral(_) => Some("string"),
        Expression::NumericLiteral(_) => Some("number"),
        Expression::BooleanLiteral(_) => Some("boolean"),
        Expression::NilLiteral(_) => Some("nil"),
        Expression::Table(_) => Some("table"),
        Expression::Function(_) => Some("function"),
        _ => None,
    }
}
