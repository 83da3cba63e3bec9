//! Operator precedence for binary and unary operators.

use luaparse_ast::syntax_kind::{SyntaxKind, TokenType};
use luaparse_ast::types::{BinaryOperator, LogicalOperator, UnaryOperator};
use luaparse_scanner::Token;

/// The precedence unary operands are parsed at. Higher than every binary
/// operator except `^`, so `-x^2` is `-(x^2)` and `-x*y` is `(-x)*y`.
pub const UNARY_PRIORITY: u8 = 10;

/// A binary operator as it appears between two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Binary(BinaryOperator),
    Logical(LogicalOperator),
}

impl Operator {
    /// Binding strength, from `or` (1) up to `^` (12).
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Logical(LogicalOperator::Or) => 1,
            Operator::Logical(LogicalOperator::And) => 2,
            Operator::Binary(op) => match op {
                BinaryOperator::Lt
                | BinaryOperator::Gt
                | BinaryOperator::Le
                | BinaryOperator::Ge
                | BinaryOperator::Eq
                | BinaryOperator::Ne => 3,
                BinaryOperator::Concat => 8,
                BinaryOperator::Add | BinaryOperator::Sub => 9,
                BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => 10,
                BinaryOperator::Pow => 12,
            },
        }
    }

    pub fn is_right_associative(self) -> bool {
        matches!(self, Operator::Binary(BinaryOperator::Pow | BinaryOperator::Concat))
    }

    /// The node kind this operator produces.
    pub fn kind(self) -> SyntaxKind {
        match self {
            Operator::Binary(_) => SyntaxKind::BinaryExpression,
            Operator::Logical(_) => SyntaxKind::LogicalExpression,
        }
    }
}

/// The binary operator `token` spells, if any.
pub fn binary_operator(token: &Token) -> Option<Operator> {
    if !matches!(token.kind, TokenType::Punctuator | TokenType::Keyword) {
        return None;
    }
    let op = match token.raw.as_str() {
        "+" => Operator::Binary(BinaryOperator::Add),
        "-" => Operator::Binary(BinaryOperator::Sub),
        "*" => Operator::Binary(BinaryOperator::Mul),
        "/" => Operator::Binary(BinaryOperator::Div),
        "%" => Operator::Binary(BinaryOperator::Mod),
        "^" => Operator::Binary(BinaryOperator::Pow),
        ".." => Operator::Binary(BinaryOperator::Concat),
        "==" => Operator::Binary(BinaryOperator::Eq),
        "~=" => Operator::Binary(BinaryOperator::Ne),
        "<" => Operator::Binary(BinaryOperator::Lt),
        "<=" => Operator::Binary(BinaryOperator::Le),
        ">" => Operator::Binary(BinaryOperator::Gt),
        ">=" => Operator::Binary(BinaryOperator::Ge),
        "and" => Operator::Logical(LogicalOperator::And),
        "or" => Operator::Logical(LogicalOperator::Or),
        _ => return None,
    };
    Some(op)
}

/// The unary operator `token` spells, if any.
pub fn unary_operator(token: &Token) -> Option<UnaryOperator> {
    match (token.kind, token.raw.as_str()) {
        (TokenType::Keyword, "not") => Some(UnaryOperator::Not),
        (TokenType::Punctuator, "-") => Some(UnaryOperator::Neg),
        (TokenType::Punctuator, "#") => Some(UnaryOperator::Len),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luaparse_scanner::Lexer;

    fn op(text: &str) -> Option<Operator> {
        binary_operator(&Lexer::new(text).next_token())
    }

    #[test]
    fn test_precedence_order() {
        let order = ["or", "and", "<", "..", "+", "*", "^"];
        let levels: Vec<u8> = order.iter().filter_map(|t| op(t)).map(Operator::precedence).collect();
        assert_eq!(levels, vec![1, 2, 3, 8, 9, 10, 12]);
    }

    #[test]
    fn test_unary_sits_between_multiplicative_and_power() {
        assert!(op("*").map_or(false, |o| o.precedence() <= UNARY_PRIORITY));
        assert!(op("^").map_or(false, |o| o.precedence() > UNARY_PRIORITY));
    }

    #[test]
    fn test_right_associative_operators() {
        assert!(op("^").is_some_and(Operator::is_right_associative));
        assert!(op("..").is_some_and(Operator::is_right_associative));
        assert!(!op("-").is_some_and(Operator::is_right_associative));
    }

    #[test]
    fn test_logical_operators_build_logical_nodes() {
        assert_eq!(op("and").map(Operator::kind), Some(SyntaxKind::LogicalExpression));
        assert_eq!(op("==").map(Operator::kind), Some(SyntaxKind::BinaryExpression));
        assert_eq!(op("x"), None);
    }

    #[test]
    fn test_unary_operators() {
        let unary = |text: &str| unary_operator(&Lexer::new(text).next_token());
        assert_eq!(unary("not"), Some(UnaryOperator::Not));
        assert_eq!(unary("#"), Some(UnaryOperator::Len));
        assert_eq!(unary("+"), None);
    }
}
