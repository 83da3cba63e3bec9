//! Parser integration tests.
//!
//! Verifies statement and expression shapes, operator precedence, node
//! ranges, and the errors reported for malformed input.

use bumpalo::Bump;
use luaparse_ast::node::*;
use luaparse_ast::types::{Indexer, NodeFlags};
use luaparse_ast::{Node, SyntaxKind, VisitAction};
use luaparse_core::text::TextRange;
use luaparse_diagnostics::SyntaxErrorKind;
use luaparse_parser::parse;

/// Helper: the error messages for `source`, in order.
fn error_messages(source: &str) -> Vec<String> {
    let arena = Bump::new();
    parse(&arena, source).errors.into_iter().map(|e| e.message).collect()
}

/// Helper: render an expression as a prefix s-expression.
fn shape(expr: &Expression<'_>) -> String {
    match expr {
        Expression::Identifier(n) => n.name.to_string(),
        Expression::NumericLiteral(n) => n.raw.to_string(),
        Expression::StringLiteral(n) => n.raw.to_string(),
        Expression::Binary(n) => format!("({} {} {})", n.operator.as_str(), shape(n.left), shape(n.right)),
        Expression::Logical(n) => format!("({} {} {})", n.operator.as_str(), shape(n.left), shape(n.right)),
        Expression::Unary(n) => format!("({} {})", n.operator.as_str(), shape(n.argument)),
        Expression::Call(n) => format!("{}()", shape(n.base)),
        Expression::Member(n) => format!("{}{}{}", shape(n.base), n.indexer, n.identifier.name),
        other => format!("<{}>", other.kind()),
    }
}

/// Helper: the shape of the single value assigned by `x = <expr>`.
fn assigned_shape(expression: &str) -> String {
    let arena = Bump::new();
    let source = format!("x = {expression}");
    let result = parse(&arena, &source);
    assert!(result.is_valid(), "{source}: {:?}", result.errors);
    match &result.ast.body.statements[0] {
        Statement::Assignment(assignment) => shape(&assignment.init[0]),
        other => panic!("expected assignment, got {:?}", other.kind()),
    }
}

/// Helper: assert every child's range lies inside its parent's.
fn assert_nested(node: Node<'_, '_>) {
    let parent = node.data().range();
    node.visit_children(&mut |child| {
        let range = child.data().range();
        assert!(parent.encloses(&range), "{} {:?} escapes {} {:?}", child.kind(), range, node.kind(), parent);
        assert_nested(child);
        VisitAction::SkipNode
    });
}

#[test]
fn test_empty_chunk() {
    let arena = Bump::new();
    let result = parse(&arena, "");
    assert!(result.is_valid());
    assert!(result.ast.body.statements.is_empty());
    assert_eq!(result.ast.data.range(), TextRange::new(0, 0));
    assert_eq!(result.tokens.len(), 1);
}

#[test]
fn test_local_with_number_name() {
    let arena = Bump::new();
    let result = parse(&arena, "local 123 = 1");
    assert_eq!(result.errors.len(), 1);
    let error = &result.errors[0];
    assert_eq!(error.message, "<name> expected near 'local'");
    assert_eq!(error.range, TextRange::new(0, 5));
    assert!(matches!(result.ast.body.statements[0], Statement::Error(_)));
}

#[test]
fn test_statement_kinds() {
    let arena = Bump::new();
    let source = "\
local a, b = 1
a = 2
print(a)
function f(x) return x end
local function g() end
while a do break end
repeat a = a - 1 until a < 0
for i = 1, 3 do end
for k, v in pairs(t) do end
do end
if a then elseif b then else end
;;";
    let result = parse(&arena, source);
    assert!(result.is_valid(), "{:?}", result.errors);
    let kinds: Vec<SyntaxKind> = result.ast.body.statements.iter().map(Statement::kind).collect();
    assert_eq!(
        kinds,
        vec![
            SyntaxKind::LocalStatement,
            SyntaxKind::AssignmentStatement,
            SyntaxKind::CallStatement,
            SyntaxKind::FunctionDeclaration,
            SyntaxKind::FunctionDeclaration,
            SyntaxKind::WhileStatement,
            SyntaxKind::RepeatStatement,
            SyntaxKind::ForNumericStatement,
            SyntaxKind::ForGenericStatement,
            SyntaxKind::DoStatement,
            SyntaxKind::IfStatement,
        ]
    );
}

#[test]
fn test_operator_precedence() {
    assert_eq!(assigned_shape("1 + 2 * 3 ^ 2 ^ 0.5"), "(+ 1 (* 2 (^ 3 (^ 2 0.5))))");
    assert_eq!(assigned_shape("-a ^ 2"), "(- (^ a 2))");
    assert_eq!(assigned_shape("-a * 2"), "(* (- a) 2)");
    assert_eq!(assigned_shape("a or b and c"), "(or a (and b c))");
    assert_eq!(assigned_shape("a .. b .. c"), "(.. a (.. b c))");
    assert_eq!(assigned_shape("a - b - c"), "(- (- a b) c)");
    assert_eq!(assigned_shape("not a == b"), "(== (not a) b)");
    assert_eq!(assigned_shape("2 ^ -3"), "(^ 2 (- 3))");
    assert_eq!(assigned_shape("a < b and #t > 0"), "(and (< a b) (> (# t) 0))");
}

#[test]
fn test_parenthesized_expression() {
    let arena = Bump::new();
    let result = parse(&arena, "x = (a + b) * c");
    let Statement::Assignment(assignment) = &result.ast.body.statements[0] else {
        panic!("expected assignment");
    };
    let Expression::Binary(product) = &assignment.init[0] else {
        panic!("expected binary expression");
    };
    assert_eq!(shape(&assignment.init[0]), "(* (+ a b) c)");
    assert!(product.left.is_parenthesized());
    assert!(product.left.data().flags.contains(NodeFlags::PARENTHESIZED));
    assert_eq!(assignment.init[0].data().range(), TextRange::new(4, 15));
}

#[test]
fn test_assignment_targets_and_calls() {
    let arena = Bump::new();
    let result = parse(&arena, "a.b, c[1] = f(), g 's'\nobj:method{1}");
    assert!(result.is_valid(), "{:?}", result.errors);

    let Statement::Assignment(assignment) = &result.ast.body.statements[0] else {
        panic!("expected assignment");
    };
    let targets: Vec<SyntaxKind> = assignment.variables.iter().map(Expression::kind).collect();
    assert_eq!(targets, vec![SyntaxKind::MemberExpression, SyntaxKind::IndexExpression]);
    let values: Vec<SyntaxKind> = assignment.init.iter().map(Expression::kind).collect();
    assert_eq!(values, vec![SyntaxKind::CallExpression, SyntaxKind::StringCallExpression]);

    let Statement::Call(call) = &result.ast.body.statements[1] else {
        panic!("expected call statement");
    };
    let Expression::TableCall(table_call) = call.expression else {
        panic!("expected table call");
    };
    let Expression::Member(member) = table_call.base else {
        panic!("expected member base");
    };
    assert_eq!(member.indexer, Indexer::Colon);
    assert_eq!(member.identifier.name, "method");
}

#[test]
fn test_invalid_assignment_target() {
    let arena = Bump::new();
    let result = parse(&arena, "f() = 1");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, SyntaxErrorKind::InvalidAssignmentTarget);
    assert_eq!(result.errors[0].message, "invalid left-hand side of assignment near '='");
    assert_eq!(result.errors[0].range, TextRange::new(0, 3));
}

#[test]
fn test_parenthesized_call_is_not_a_statement() {
    let messages = error_messages("(f())");
    assert_eq!(messages, vec!["unexpected symbol ')' near '<eof>'"]);
}

#[test]
fn test_expression_statement_is_rejected() {
    assert_eq!(error_messages("x"), vec!["unexpected identifier 'x' near '<eof>'"]);
}

#[test]
fn test_method_reference_requires_call() {
    let messages = error_messages("a:b\nx = 1");
    assert_eq!(messages, vec!["function arguments expected near 'x'"]);
}

#[test]
fn test_vararg_checks() {
    assert!(error_messages("local t = {...}").is_empty());
    assert!(error_messages("function g(a, ...) return ... end").is_empty());
    assert_eq!(
        error_messages("function f() return ... end"),
        vec!["cannot use '...' outside a vararg function near '...'"]
    );
    // Nested functions do not inherit the outer `...`.
    assert_eq!(
        error_messages("function f(...) return function() return ... end end"),
        vec!["cannot use '...' outside a vararg function near '...'"]
    );
}

#[test]
fn test_function_flags_and_parameters() {
    let arena = Bump::new();
    let result = parse(&arena, "local M = {}\nfunction M:get(a, ...) end");
    let Statement::Function(function) = &result.ast.body.statements[1] else {
        panic!("expected function declaration");
    };
    assert!(!function.is_local);
    assert!(function.data.flags.contains(NodeFlags::METHOD | NodeFlags::VARARG));
    let params: Vec<SyntaxKind> = function.parameters.iter().map(Expression::kind).collect();
    assert_eq!(params, vec![SyntaxKind::Identifier, SyntaxKind::VarargLiteral]);
    assert_eq!(function.identifier.map(shape), Some("M:get".to_string()));
}

#[test]
fn test_missing_end_names_opener() {
    assert_eq!(
        error_messages("function f()\n  x = 1\n"),
        vec!["'end' expected (to close 'function' at line 1) near '<eof>'"]
    );
    assert_eq!(error_messages("if x then"), vec!["'end' expected near '<eof>'"]);
    assert_eq!(
        error_messages("t = {\n1,\n"),
        vec!["'}' expected (to close '{' at line 1) near '<eof>'"]
    );
}

#[test]
fn test_missing_then() {
    assert_eq!(error_messages("if x y() end"), vec!["'then' expected near 'y'"]);
}

#[test]
fn test_missing_expression() {
    let arena = Bump::new();
    let result = parse(&arena, "x = ");
    assert_eq!(result.errors[0].message, "<expression> expected near '<eof>'");
    let Statement::Assignment(assignment) = &result.ast.body.statements[0] else {
        panic!("expected assignment");
    };
    // A zero-width error node at the end of the previous token.
    assert!(assignment.init[0].is_error());
    assert_eq!(assignment.init[0].data().range(), TextRange::new(3, 3));
}

#[test]
fn test_stray_end_does_not_stop_parsing() {
    let arena = Bump::new();
    let result = parse(&arena, "x = 1\nend\ny = 2");
    let messages: Vec<&str> = result.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["'<eof>' expected near 'end'"]);
    assert_eq!(result.ast.body.statements.len(), 2);
}

#[test]
fn test_elseif_after_else() {
    let arena = Bump::new();
    let result = parse(&arena, "if a then\nelse\nelseif b then\nend");
    let messages: Vec<&str> = result.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["'end' expected near 'elseif'"]);
    let Statement::If(statement) = &result.ast.body.statements[0] else {
        panic!("expected if statement");
    };
    let kinds: Vec<SyntaxKind> = statement.clauses.iter().map(|c| c.data().kind).collect();
    assert_eq!(kinds, vec![SyntaxKind::IfClause, SyntaxKind::ElseClause, SyntaxKind::ErroneousNode]);
}

#[test]
fn test_unexpected_keyword() {
    assert_eq!(error_messages("goto = 1"), vec!["unexpected keyword 'goto' near '='"]);
}

#[test]
fn test_errors_are_sorted_by_offset() {
    let messages = error_messages("local = 1\nx = 5x");
    assert_eq!(
        messages,
        vec![
            "<name> expected near 'local'",
            "malformed number near '5x'",
            "<expression> expected near '<eof>'",
        ]
    );
}

#[test]
fn test_block_ranges() {
    let arena = Bump::new();
    let result = parse(&arena, "do\n  local a = 1\nend");
    let Statement::Do(statement) = &result.ast.body.statements[0] else {
        panic!("expected do statement");
    };
    assert_eq!(statement.data.range(), TextRange::new(0, 20));
    // From the end of `do` to the start of `end`.
    assert_eq!(statement.body.data.range(), TextRange::new(2, 17));
    assert_eq!(result.ast.body.data.range(), TextRange::new(0, 20));
}

#[test]
fn test_node_ranges_nest() {
    let arena = Bump::new();
    let source = "\
-- setup
local M = { name = 'm', [1] = true; 3 }

function M:greet(who, ...)
  if who == nil then
    return 'hi ' .. self.name
  elseif #who > 0 then
    print(('x'):rep(2), ...)
  else
    return nil
  end
end

for i = 10, 1, -1 do
  repeat local j = i until j
end
";
    let result = parse(&arena, source);
    assert!(result.is_valid(), "{:?}", result.errors);
    assert_nested(Node::Chunk(&result.ast));
}

#[test]
fn test_table_constructor_fields() {
    let arena = Bump::new();
    let result = parse(&arena, "t = { a = 1, [k] = 2; 3, f(), }");
    assert!(result.is_valid(), "{:?}", result.errors);
    let Statement::Assignment(assignment) = &result.ast.body.statements[0] else {
        panic!("expected assignment");
    };
    let Expression::Table(table) = &assignment.init[0] else {
        panic!("expected table");
    };
    let kinds: Vec<SyntaxKind> = table.fields.iter().map(|f| f.data().kind).collect();
    assert_eq!(
        kinds,
        vec![SyntaxKind::TableKeyString, SyntaxKind::TableKey, SyntaxKind::TableValue, SyntaxKind::TableValue]
    );
}

#[test]
fn test_comments_are_collected() {
    let arena = Bump::new();
    let result = parse(&arena, "-- one\nx = 1 --[[ two ]]");
    let values: Vec<&str> = result.ast.comments.iter().map(|c| c.value).collect();
    assert_eq!(values, vec![" one", " two "]);
    assert_eq!(result.ast.comments[1].raw, "--[[ two ]]");
}

#[test]
fn test_token_at_offset() {
    let arena = Bump::new();
    let result = parse(&arena, "local x = 1");
    assert_eq!(result.token_at(0).map(|t| t.raw.as_str()), Some("local"));
    assert_eq!(result.token_at(6).map(|t| t.raw.as_str()), Some("x"));
    assert!(result.token_at(5).is_none());
    assert!(result.token_at(11).is_none());
}

#[test]
fn test_deep_nesting_is_reported_once() {
    let source = format!("x = {}1{}", "(".repeat(300), ")".repeat(300));
    let messages = error_messages(&source);
    let count = messages.iter().filter(|m| *m == "chunk has too many syntax levels").count();
    assert_eq!(count, 1, "{messages:?}");
}

#[test]
fn test_deep_function_nesting_is_guarded() {
    let source = format!("f = {}{}", "function() return ".repeat(120), " end".repeat(120));
    let messages = error_messages(&source);
    assert!(messages.iter().any(|m| m == "chunk has too many syntax levels"), "{messages:?}");
}

#[test]
fn test_stray_characters_are_reported() {
    assert_eq!(error_messages("x = 1 @"), vec!["unexpected symbol '@' near '<eof>'"]);
    assert_eq!(
        error_messages("x = `y`"),
        vec!["unexpected symbol '`' near 'y'", "unexpected symbol '`' near '<eof>'"]
    );
    assert_eq!(error_messages("print(1) $"), vec!["unexpected symbol '$' near '<eof>'"]);
    assert!(!error_messages("local t = {} !").is_empty());
}

#[test]
fn test_stray_character_anchored_at_itself() {
    let arena = Bump::new();
    let result = parse(&arena, "x = a ~ b");
    assert_eq!(result.errors[0].message, "unexpected symbol '~' near 'b'");
    assert_eq!((result.errors[0].range.start, result.errors[0].range.end), (6, 7));
}

#[test]
fn test_malformed_number_is_not_reported_twice() {
    let messages = error_messages("x = 123fg12");
    assert_eq!(messages.iter().filter(|m| m.starts_with("malformed number")).count(), 1);
    assert!(!messages.iter().any(|m| m.starts_with("unexpected symbol '123fg12'")));
}

#[test]
fn test_chunk_recovery_skips_to_next_statement() {
    assert_eq!(error_messages("return 1 x = 2"), vec!["'<eof>' expected near 'x'"]);
}

#[test]
fn test_parse_is_deterministic() {
    let source = "local a = {1, 2}\nfor _, v in ipairs(a) do print(v) end\nx = = 1";
    let first_arena = Bump::new();
    let second_arena = Bump::new();
    let first = serde_json::to_string(&parse(&first_arena, source)).expect("serialize");
    let second = serde_json::to_string(&parse(&second_arena, source)).expect("serialize");
    assert_eq!(first, second);
}
