//! AST node definitions for Lua.
//!
//! Nodes are allocated in a `bumpalo` arena owned by the caller and refer to
//! their children through `&'a` references and `&'a [T]` slices. Every node
//! starts with a [`NodeData`] carrying its kind, finished location, id, and
//! flags.

use crate::syntax_kind::SyntaxKind;
use crate::types::*;
use luaparse_core::text::{Location, TextPos, TextRange};
use serde::Serialize;

// ============================================================================
// Core Node Wrapper
// ============================================================================

/// Common data shared by all AST nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeData {
    /// The kind of this node.
    #[serde(rename = "type")]
    pub kind: SyntaxKind,
    /// Finished source location.
    #[serde(rename = "loc")]
    pub location: Location,
    /// Unique node ID within its parse.
    pub id: NodeId,
    /// Node flags.
    #[serde(skip_serializing_if = "NodeFlags::is_empty")]
    pub flags: NodeFlags,
}

impl NodeData {
    pub fn new(kind: SyntaxKind, location: Location, id: NodeId) -> Self {
        Self {
            kind,
            location,
            id,
            flags: NodeFlags::NONE,
        }
    }

    #[inline]
    pub fn range(&self) -> TextRange {
        self.location.range
    }
}

/// A list of nodes, allocated in the arena.
pub type NodeList<'a, T> = &'a [T];

/// Placeholder for a statement, expression, or if-clause that could not be
/// parsed. Carries a location and nothing else.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ErroneousNode {
    #[serde(flatten)]
    pub data: NodeData,
}

// ============================================================================
// Chunk and Block
// ============================================================================

/// The root node of a parsed source file.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub body: Block<'a>,
    pub comments: NodeList<'a, Comment<'a>>,
}

/// A sequence of statements sharing one scope frame.
///
/// The range runs from the end of the token that opened the block to the
/// start of the token that closed it, so empty bodies still have a range.
#[derive(Debug, Clone, Serialize)]
pub struct Block<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub statements: NodeList<'a, Statement<'a>>,
    /// The scope frame this block owned, frozen when the frame was destroyed.
    pub scope: NodeList<'a, ScopedIdentifierInfo<'a>>,
}

/// A local binding recorded in a scope frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedIdentifierInfo<'a> {
    pub name: &'a str,
    /// The identifier node at the binding site (a copy, not an owner).
    pub identifier: Identifier<'a>,
    /// The node that introduced the binding.
    pub initialize_parse_node: Option<NodeRef>,
    pub description: Option<&'a str>,
    #[serde(rename = "type")]
    pub type_name: Option<&'a str>,
    pub type_hinted: bool,
    /// Offset from which the binding is in scope.
    pub visible_from: TextPos,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Comment<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    /// Comment text without the `--` marker or long brackets.
    pub value: &'a str,
    pub raw: &'a str,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Statement<'a> {
    Break(BreakStatement),
    Return(ReturnStatement<'a>),
    If(IfStatement<'a>),
    While(WhileStatement<'a>),
    Do(DoStatement<'a>),
    Repeat(RepeatStatement<'a>),
    Local(LocalStatement<'a>),
    Assignment(AssignmentStatement<'a>),
    Call(CallStatement<'a>),
    Function(FunctionDeclaration<'a>),
    ForNumeric(ForNumericStatement<'a>),
    ForGeneric(ForGenericStatement<'a>),
    Error(ErroneousNode),
}

impl<'a> Statement<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            Statement::Break(n) => &n.data,
            Statement::Return(n) => &n.data,
            Statement::If(n) => &n.data,
            Statement::While(n) => &n.data,
            Statement::Do(n) => &n.data,
            Statement::Repeat(n) => &n.data,
            Statement::Local(n) => &n.data,
            Statement::Assignment(n) => &n.data,
            Statement::Call(n) => &n.data,
            Statement::Function(n) => &n.data,
            Statement::ForNumeric(n) => &n.data,
            Statement::ForGeneric(n) => &n.data,
            Statement::Error(n) => &n.data,
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Statement::Error(_))
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BreakStatement {
    #[serde(flatten)]
    pub data: NodeData,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReturnStatement<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub arguments: NodeList<'a, Expression<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IfStatement<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub clauses: NodeList<'a, IfStatementClause<'a>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum IfStatementClause<'a> {
    If(ConditionalClause<'a>),
    Elseif(ConditionalClause<'a>),
    Else(ElseClause<'a>),
    Error(ErroneousNode),
}

impl<'a> IfStatementClause<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            IfStatementClause::If(n) | IfStatementClause::Elseif(n) => &n.data,
            IfStatementClause::Else(n) => &n.data,
            IfStatementClause::Error(n) => &n.data,
        }
    }

    pub fn body(&self) -> Option<&Block<'a>> {
        match self {
            IfStatementClause::If(n) | IfStatementClause::Elseif(n) => Some(&n.body),
            IfStatementClause::Else(n) => Some(&n.body),
            IfStatementClause::Error(_) => None,
        }
    }
}

/// An `if` or `elseif` clause.
#[derive(Debug, Clone, Serialize)]
pub struct ConditionalClause<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub condition: &'a Expression<'a>,
    pub body: Block<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElseClause<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub body: Block<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhileStatement<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub condition: &'a Expression<'a>,
    pub body: Block<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoStatement<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub body: Block<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepeatStatement<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub body: Block<'a>,
    pub condition: &'a Expression<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocalStatement<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub variables: NodeList<'a, Identifier<'a>>,
    pub init: NodeList<'a, Expression<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentStatement<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub variables: NodeList<'a, Expression<'a>>,
    pub init: NodeList<'a, Expression<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallStatement<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub expression: &'a Expression<'a>,
}

/// A function declaration statement, `local function`, or anonymous
/// function expression (`identifier` is `None`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDeclaration<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    /// An `Identifier`, or a `MemberExpression` chain for `a.b:c`.
    pub identifier: Option<&'a Expression<'a>>,
    pub is_local: bool,
    /// `Identifier`s, optionally ending with a `VarargLiteral`.
    pub parameters: NodeList<'a, Expression<'a>>,
    pub body: Block<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForNumericStatement<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub variable: Identifier<'a>,
    pub start: &'a Expression<'a>,
    pub end: &'a Expression<'a>,
    pub step: Option<&'a Expression<'a>>,
    pub body: Block<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForGenericStatement<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub variables: NodeList<'a, Identifier<'a>>,
    pub iterators: NodeList<'a, Expression<'a>>,
    pub body: Block<'a>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Expression<'a> {
    Identifier(Identifier<'a>),
    StringLiteral(StringLiteral<'a>),
    NumericLiteral(NumericLiteral<'a>),
    BooleanLiteral(BooleanLiteral<'a>),
    NilLiteral(NilLiteral<'a>),
    VarargLiteral(VarargLiteral<'a>),
    Function(FunctionDeclaration<'a>),
    Table(TableConstructorExpression<'a>),
    Logical(LogicalExpression<'a>),
    Binary(BinaryExpression<'a>),
    Unary(UnaryExpression<'a>),
    Member(MemberExpression<'a>),
    Index(IndexExpression<'a>),
    Call(CallExpression<'a>),
    TableCall(TableCallExpression<'a>),
    StringCall(StringCallExpression<'a>),
    Error(ErroneousNode),
}

impl<'a> Expression<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            Expression::Identifier(n) => &n.data,
            Expression::StringLiteral(n) => &n.data,
            Expression::NumericLiteral(n) => &n.data,
            Expression::BooleanLiteral(n) => &n.data,
            Expression::NilLiteral(n) => &n.data,
            Expression::VarargLiteral(n) => &n.data,
            Expression::Function(n) => &n.data,
            Expression::Table(n) => &n.data,
            Expression::Logical(n) => &n.data,
            Expression::Binary(n) => &n.data,
            Expression::Unary(n) => &n.data,
            Expression::Member(n) => &n.data,
            Expression::Index(n) => &n.data,
            Expression::Call(n) => &n.data,
            Expression::TableCall(n) => &n.data,
            Expression::StringCall(n) => &n.data,
            Expression::Error(n) => &n.data,
        }
    }

    pub fn data_mut(&mut self) -> &mut NodeData {
        match self {
            Expression::Identifier(n) => &mut n.data,
            Expression::StringLiteral(n) => &mut n.data,
            Expression::NumericLiteral(n) => &mut n.data,
            Expression::BooleanLiteral(n) => &mut n.data,
            Expression::NilLiteral(n) => &mut n.data,
            Expression::VarargLiteral(n) => &mut n.data,
            Expression::Function(n) => &mut n.data,
            Expression::Table(n) => &mut n.data,
            Expression::Logical(n) => &mut n.data,
            Expression::Binary(n) => &mut n.data,
            Expression::Unary(n) => &mut n.data,
            Expression::Member(n) => &mut n.data,
            Expression::Index(n) => &mut n.data,
            Expression::Call(n) => &mut n.data,
            Expression::TableCall(n) => &mut n.data,
            Expression::StringCall(n) => &mut n.data,
            Expression::Error(n) => &mut n.data,
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn is_parenthesized(&self) -> bool {
        self.data().flags.contains(NodeFlags::PARENTHESIZED)
    }

    /// Whether this expression may appear on the left of `=`.
    ///
    /// Names, `a.b` members, and `a[b]` indexes qualify; a parenthesized
    /// expression never does.
    pub fn is_assignable(&self) -> bool {
        if self.is_parenthesized() {
            return false;
        }
        match self {
            Expression::Identifier(_) | Expression::Index(_) => true,
            Expression::Member(m) => m.indexer == Indexer::Dot,
            _ => false,
        }
    }

    /// Whether this expression may stand alone as a call statement.
    pub fn is_call(&self) -> bool {
        !self.is_parenthesized()
            && matches!(
                self,
                Expression::Call(_) | Expression::TableCall(_) | Expression::StringCall(_)
            )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Expression::Error(_))
    }

    pub fn as_identifier(&self) -> Option<&Identifier<'a>> {
        match self {
            Expression::Identifier(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub name: &'a str,
    /// Whether this occurrence resolved to a local binding when parsed.
    pub is_local: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StringLiteral<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub value: &'a str,
    pub raw: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct NumericLiteral<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub value: f64,
    pub raw: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BooleanLiteral<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub value: bool,
    pub raw: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct NilLiteral<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub raw: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct VarargLiteral<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub raw: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableConstructorExpression<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub fields: NodeList<'a, TableField<'a>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TableField<'a> {
    /// `[key] = value`
    Key(TableKey<'a>),
    /// `name = value`
    KeyString(TableKeyString<'a>),
    /// `value`
    Value(TableValue<'a>),
}

impl<'a> TableField<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            TableField::Key(n) => &n.data,
            TableField::KeyString(n) => &n.data,
            TableField::Value(n) => &n.data,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableKey<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub key: &'a Expression<'a>,
    pub value: &'a Expression<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableKeyString<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub key: Identifier<'a>,
    pub value: &'a Expression<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableValue<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub value: &'a Expression<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogicalExpression<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub operator: LogicalOperator,
    pub left: &'a Expression<'a>,
    pub right: &'a Expression<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BinaryExpression<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub operator: BinaryOperator,
    pub left: &'a Expression<'a>,
    pub right: &'a Expression<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnaryExpression<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub operator: UnaryOperator,
    pub argument: &'a Expression<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberExpression<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub base: &'a Expression<'a>,
    pub indexer: Indexer,
    pub identifier: Identifier<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexExpression<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub base: &'a Expression<'a>,
    pub index: &'a Expression<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallExpression<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub base: &'a Expression<'a>,
    pub arguments: NodeList<'a, Expression<'a>>,
}

/// `f { ... }`; `argument` is always a table constructor.
#[derive(Debug, Clone, Serialize)]
pub struct TableCallExpression<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub base: &'a Expression<'a>,
    pub argument: &'a Expression<'a>,
}

/// `f "..."`; `argument` is always a string literal.
#[derive(Debug, Clone, Serialize)]
pub struct StringCallExpression<'a> {
    #[serde(flatten)]
    pub data: NodeData,
    pub base: &'a Expression<'a>,
    pub argument: &'a Expression<'a>,
}
