//! Generic child visitation over the AST.
//!
//! [`Node`] is a borrowed view over any node variant. `visit_children` calls a
//! visitor on each direct child in source order and recurses according to the
//! [`VisitAction`] the visitor returns.

use crate::node::*;
use crate::syntax_kind::SyntaxKind;
use luaparse_core::text::Location;

/// What the walk should do after the visitor has seen a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitAction {
    /// Descend into the node's children, then carry on.
    Continue,
    /// Do not descend into this node, but carry on with its siblings.
    SkipNode,
    /// Abort the whole walk.
    Stop,
}

/// A borrowed reference to any AST node.
#[derive(Debug, Clone, Copy)]
pub enum Node<'n, 'a> {
    Chunk(&'n Chunk<'a>),
    Block(&'n Block<'a>),
    Statement(&'n Statement<'a>),
    IfClause(&'n IfStatementClause<'a>),
    Expression(&'n Expression<'a>),
    TableField(&'n TableField<'a>),
    Identifier(&'n Identifier<'a>),
    Comment(&'n Comment<'a>),
}

impl<'n, 'a> Node<'n, 'a> {
    pub fn data(&self) -> &'n NodeData {
        match *self {
            Node::Chunk(n) => &n.data,
            Node::Block(n) => &n.data,
            Node::Statement(n) => n.data(),
            Node::IfClause(n) => n.data(),
            Node::Expression(n) => n.data(),
            Node::TableField(n) => n.data(),
            Node::Identifier(n) => &n.data,
            Node::Comment(n) => &n.data,
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn location(&self) -> Location {
        self.data().location
    }

    /// Visit each direct child of this node in source order, recursing into
    /// children whose visit returned [`VisitAction::Continue`].
    ///
    /// Returns [`VisitAction::Stop`] if any visit stopped the walk, otherwise
    /// [`VisitAction::Continue`].
    pub fn visit_children<F>(&self, visitor: &mut F) -> VisitAction
    where
        F: FnMut(Node<'n, 'a>) -> VisitAction,
    {
        macro_rules! visit {
            ($node:expr) => {
                if visit_node($node, visitor) == VisitAction::Stop {
                    return VisitAction::Stop;
                }
            };
        }
        macro_rules! visit_block {
            ($block:expr) => {
                visit!(Node::Block($block))
            };
        }
        macro_rules! visit_exprs {
            ($list:expr) => {
                for expr in $list.iter() {
                    visit!(Node::Expression(expr));
                }
            };
        }

        match *self {
            Node::Chunk(chunk) => {
                visit_block!(&chunk.body);
                for comment in chunk.comments.iter() {
                    visit!(Node::Comment(comment));
                }
            }
            Node::Block(block) => {
                for stmt in block.statements.iter() {
                    visit!(Node::Statement(stmt));
                }
            }
            Node::Statement(stmt) => match stmt {
                Statement::Break(_) | Statement::Error(_) => {}
                Statement::Return(n) => visit_exprs!(n.arguments),
                Statement::If(n) => {
                    for clause in n.clauses.iter() {
                        visit!(Node::IfClause(clause));
                    }
                }
                Statement::While(n) => {
                    visit!(Node::Expression(n.condition));
                    visit_block!(&n.body);
                }
                Statement::Do(n) => visit_block!(&n.body),
                Statement::Repeat(n) => {
                    visit_block!(&n.body);
                    visit!(Node::Expression(n.condition));
                }
                Statement::Local(n) => {
                    for variable in n.variables.iter() {
                        visit!(Node::Identifier(variable));
                    }
                    visit_exprs!(n.init);
                }
                Statement::Assignment(n) => {
                    visit_exprs!(n.variables);
                    visit_exprs!(n.init);
                }
                Statement::Call(n) => visit!(Node::Expression(n.expression)),
                Statement::Function(n) => return visit_function(n, visitor),
                Statement::ForNumeric(n) => {
                    visit!(Node::Identifier(&n.variable));
                    visit!(Node::Expression(n.start));
                    visit!(Node::Expression(n.end));
                    if let Some(step) = n.step {
                        visit!(Node::Expression(step));
                    }
                    visit_block!(&n.body);
                }
                Statement::ForGeneric(n) => {
                    for variable in n.variables.iter() {
                        visit!(Node::Identifier(variable));
                    }
                    visit_exprs!(n.iterators);
                    visit_block!(&n.body);
                }
            },
            Node::IfClause(clause) => match clause {
                IfStatementClause::If(n) | IfStatementClause::Elseif(n) => {
                    visit!(Node::Expression(n.condition));
                    visit_block!(&n.body);
                }
                IfStatementClause::Else(n) => visit_block!(&n.body),
                IfStatementClause::Error(_) => {}
            },
            Node::Expression(expr) => match expr {
                Expression::Identifier(_)
                | Expression::StringLiteral(_)
                | Expression::NumericLiteral(_)
                | Expression::BooleanLiteral(_)
                | Expression::NilLiteral(_)
                | Expression::VarargLiteral(_)
                | Expression::Error(_) => {}
                Expression::Function(n) => return visit_function(n, visitor),
                Expression::Table(n) => {
                    for field in n.fields.iter() {
                        visit!(Node::TableField(field));
                    }
                }
                Expression::Logical(n) => {
                    visit!(Node::Expression(n.left));
                    visit!(Node::Expression(n.right));
                }
                Expression::Binary(n) => {
                    visit!(Node::Expression(n.left));
                    visit!(Node::Expression(n.right));
                }
                Expression::Unary(n) => visit!(Node::Expression(n.argument)),
                Expression::Member(n) => {
                    visit!(Node::Expression(n.base));
                    visit!(Node::Identifier(&n.identifier));
                }
                Expression::Index(n) => {
                    visit!(Node::Expression(n.base));
                    visit!(Node::Expression(n.index));
                }
                Expression::Call(n) => {
                    visit!(Node::Expression(n.base));
                    visit_exprs!(n.arguments);
                }
                Expression::TableCall(n) => {
                    visit!(Node::Expression(n.base));
                    visit!(Node::Expression(n.argument));
                }
                Expression::StringCall(n) => {
                    visit!(Node::Expression(n.base));
                    visit!(Node::Expression(n.argument));
                }
            },
            Node::TableField(field) => match field {
                TableField::Key(n) => {
                    visit!(Node::Expression(n.key));
                    visit!(Node::Expression(n.value));
                }
                TableField::KeyString(n) => {
                    visit!(Node::Identifier(&n.key));
                    visit!(Node::Expression(n.value));
                }
                TableField::Value(n) => visit!(Node::Expression(n.value)),
            },
            Node::Identifier(_) | Node::Comment(_) => {}
        }
        VisitAction::Continue
    }
}

fn visit_function<'n, 'a, F>(node: &'n FunctionDeclaration<'a>, visitor: &mut F) -> VisitAction
where
    F: FnMut(Node<'n, 'a>) -> VisitAction,
{
    if let Some(identifier) = node.identifier {
        if visit_node(Node::Expression(identifier), visitor) == VisitAction::Stop {
            return VisitAction::Stop;
        }
    }
    for param in node.parameters.iter() {
        if visit_node(Node::Expression(param), visitor) == VisitAction::Stop {
            return VisitAction::Stop;
        }
    }
    visit_node(Node::Block(&node.body), visitor)
}

fn visit_node<'n, 'a, F>(node: Node<'n, 'a>, visitor: &mut F) -> VisitAction
where
    F: FnMut(Node<'n, 'a>) -> VisitAction,
{
    match visitor(node) {
        VisitAction::Stop => VisitAction::Stop,
        VisitAction::SkipNode => VisitAction::Continue,
        VisitAction::Continue => node.visit_children(visitor),
    }
}

/// Walk `root` and all its descendants in pre-order.
pub fn walk<'n, 'a, F>(root: Node<'n, 'a>, mut visitor: F) -> VisitAction
where
    F: FnMut(Node<'n, 'a>) -> VisitAction,
{
    visit_node(root, &mut visitor)
}
