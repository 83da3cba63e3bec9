//! Position and id lookups over a finished AST.

use crate::node::{Chunk, ScopedIdentifierInfo};
use crate::types::NodeId;
use crate::visitor::{walk, Node, VisitAction};
use luaparse_core::collections::FxIndexMap;
use luaparse_core::text::TextPos;

/// Find the innermost node whose range contains `offset`.
///
/// Ranges are half-open, so an offset equal to a node's end belongs to the
/// following node. Returns the chunk itself when no child matches.
pub fn node_at_offset<'n, 'a>(chunk: &'n Chunk<'a>, offset: TextPos) -> Option<Node<'n, 'a>> {
    if !chunk.data.range().contains_inclusive(offset) {
        return None;
    }
    let mut found = Some(Node::Chunk(chunk));
    Node::Chunk(chunk).visit_children(&mut |node| {
        if node.data().range().contains(offset) {
            found = Some(node);
            VisitAction::Continue
        } else {
            VisitAction::SkipNode
        }
    });
    found
}

/// Find a node by its id.
pub fn find_node<'n, 'a>(chunk: &'n Chunk<'a>, id: NodeId) -> Option<Node<'n, 'a>> {
    let mut found = None;
    walk(Node::Chunk(chunk), |node| {
        if node.data().id == id {
            found = Some(node);
            VisitAction::Stop
        } else {
            VisitAction::Continue
        }
    });
    found
}

/// The local bindings visible at `offset`, outermost first.
///
/// Walks every block whose range touches `offset` and collects the entries
/// of its frozen scope that became visible at or before `offset`. A later
/// binding of the same name shadows an earlier one and takes its place at
/// the end of the list.
pub fn locals_at_offset<'a>(chunk: &Chunk<'a>, offset: TextPos) -> Vec<ScopedIdentifierInfo<'a>> {
    let mut visible: FxIndexMap<&'a str, ScopedIdentifierInfo<'a>> = FxIndexMap::default();
    walk(Node::Chunk(chunk), |node| {
        if !node.data().range().contains_inclusive(offset) {
            return VisitAction::SkipNode;
        }
        if let Node::Block(block) = node {
            for info in block.scope.iter().filter(|info| info.visible_from <= offset) {
                visible.shift_remove(info.name);
                visible.insert(info.name, *info);
            }
        }
        VisitAction::Continue
    });
    visible.into_values().collect()
}
