//! Node identifiers, flags, and operator enums.

use crate::syntax_kind::SyntaxKind;
use serde::Serialize;
use std::fmt;

/// Unique node identifier within one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const INVALID: NodeId = NodeId(u32::MAX);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// A non-owning reference to a node: its id and kind.
///
/// Scope entries use this to point at the node that introduced a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeRef {
    pub id: NodeId,
    pub kind: SyntaxKind,
}

bitflags::bitflags! {
    /// Flags for AST nodes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct NodeFlags: u8 {
        const NONE          = 0;
        /// The expression was written inside `( )`.
        const PARENTHESIZED = 1 << 0;
        /// The function accepts `...`.
        const VARARG        = 1 << 1;
        /// The function was declared with `:` and binds `self`.
        const METHOD        = 1 << 2;
    }
}

/// Arithmetic, concatenation, and comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => "^",
            BinaryOperator::Concat => "..",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "~=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
        }
    }
}

/// Short-circuit operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOperator {
    Not,
    Neg,
    Len,
}

impl UnaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOperator::Not => "not",
            UnaryOperator::Neg => "-",
            UnaryOperator::Len => "#",
        }
    }
}

/// The separator of a member expression: `a.b` or `a:b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Indexer {
    Dot,
    Colon,
}

impl fmt::Display for Indexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Indexer::Dot => ".",
            Indexer::Colon => ":",
        })
    }
}
