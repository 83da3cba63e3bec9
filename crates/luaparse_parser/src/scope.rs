//! Lexical scope tracking during parsing.
//!
//! Frames are pushed for the chunk and every block body. Each frame records
//! the locals bound in it, in declaration order. Identifier reads consult the
//! stack at the moment they are parsed, so a `local` later in the source can
//! never capture an earlier read.

use luaparse_ast::node::{Identifier, ScopedIdentifierInfo};
use luaparse_core::collections::FxIndexMap;
use luaparse_core::text::TextPos;

type Frame<'a> = FxIndexMap<&'a str, ScopedIdentifierInfo<'a>>;

/// The stack of open scope frames, innermost last.
#[derive(Debug, Default)]
pub struct ScopeStack<'a> {
    frames: Vec<Frame<'a>>,
}

impl<'a> ScopeStack<'a> {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Pop the innermost frame and return its bindings in declaration order.
    pub fn pop(&mut self) -> Vec<ScopedIdentifierInfo<'a>> {
        self.frames
            .pop()
            .map(|frame| frame.into_values().collect())
            .unwrap_or_default()
    }

    /// Register `identifier` as a local of the innermost frame.
    ///
    /// The identifier node is marked local. If the frame already binds the
    /// name, the existing entry is returned so the caller can refine it.
    pub fn scope_identifier(
        &mut self,
        identifier: &mut Identifier<'a>,
        visible_from: TextPos,
    ) -> Option<&mut ScopedIdentifierInfo<'a>> {
        identifier.is_local = true;
        let frame = self.frames.last_mut()?;
        let snapshot = *identifier;
        Some(frame.entry(identifier.name).or_insert_with(|| ScopedIdentifierInfo {
            name: snapshot.name,
            identifier: snapshot,
            initialize_parse_node: None,
            description: None,
            type_name: None,
            type_hinted: false,
            visible_from,
        }))
    }

    /// Whether any open frame binds `name`.
    pub fn has_name(&self, name: &str) -> bool {
        self.frames.iter().rev().any(|frame| frame.contains_key(name))
    }

    /// The innermost binding of `name`.
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut ScopedIdentifierInfo<'a>> {
        self.frames.iter_mut().rev().find_map(|frame| frame.get_mut(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luaparse_ast::syntax_kind::SyntaxKind;
    use luaparse_ast::types::NodeId;
    use luaparse_ast::NodeData;
    use luaparse_core::text::Location;

    fn ident(name: &str) -> Identifier<'_> {
        Identifier {
            data: NodeData::new(SyntaxKind::Identifier, Location::default(), NodeId(0)),
            name,
            is_local: false,
        }
    }

    #[test]
    fn test_lookup_searches_outward() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        let mut a = ident("a");
        scopes.scope_identifier(&mut a, 0);
        scopes.push();
        assert!(scopes.has_name("a"));
        assert!(!scopes.has_name("b"));
        assert!(a.is_local);
        assert!(scopes.pop().is_empty());
        assert_eq!(scopes.pop().len(), 1);
        assert!(!scopes.has_name("a"));
    }

    #[test]
    fn test_rebinding_in_same_frame_returns_existing_entry() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        let mut first = ident("x");
        if let Some(info) = scopes.scope_identifier(&mut first, 3) {
            info.type_name = Some("number");
        }
        let mut second = ident("x");
        let info = scopes.scope_identifier(&mut second, 9);
        assert_eq!(info.map(|i| (i.type_name, i.visible_from)), Some((Some("number"), 3)));
        assert_eq!(scopes.pop().len(), 1);
    }

    #[test]
    fn test_inner_binding_shadows_outer() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        scopes.scope_identifier(&mut ident("v"), 0);
        scopes.push();
        scopes.scope_identifier(&mut ident("v"), 5);
        assert_eq!(scopes.lookup_mut("v").map(|i| i.visible_from), Some(5));
        scopes.pop();
        assert_eq!(scopes.lookup_mut("v").map(|i| i.visible_from), Some(0));
    }

    #[test]
    fn test_scope_identifier_without_frame() {
        let mut scopes = ScopeStack::new();
        assert!(scopes.scope_identifier(&mut ident("x"), 0).is_none());
        assert_eq!(scopes.depth(), 0);
    }
}
