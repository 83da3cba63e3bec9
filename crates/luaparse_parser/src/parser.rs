//! The Lua parser implementation.
//!
//! A recursive descent parser over the pre-lexed token stream. Statements are
//! dispatched on their leading keyword and expressions use precedence
//! climbing. No rule ever aborts the parse: a missing piece is reported,
//! replaced by an erroneous node, and parsing carries on from the current
//! token.
//!
//! Node locations come from a stack of start markers. A rule pushes a marker
//! at its first token and the node is finished at the end of the last token
//! consumed.

use bumpalo::Bump;
use luaparse_ast::node::*;
use luaparse_ast::syntax_kind::{SyntaxKind, TokenType};
use luaparse_ast::types::*;
use luaparse_core::collections::FxIndexMap;
use luaparse_core::text::{Location, Position, TextPos, TextRange};
use luaparse_diagnostics::{messages, DiagnosticCollection, DiagnosticMessage, SyntaxError};
use luaparse_scanner::{tokenize, Token, TokenValue};

use crate::hints::{guess_type, CommentHints};
use crate::precedence::{binary_operator, unary_operator, Operator, UNARY_PRIORITY};
use crate::scope::ScopeStack;
use crate::utilities::{can_start_statement, is_block_follow};
use crate::ParseResult;

/// Maximum recursion depth to prevent stack overflow on deeply nested input.
const MAX_RECURSION_DEPTH: u32 = 200;

/// The start of a node under construction.
#[derive(Debug, Clone, Copy)]
struct Marker {
    start: Position,
    offset: TextPos,
}

/// Widen a clause to cover its body, which runs up to the next keyword.
fn covering_block(mut data: NodeData, body: &Block<'_>) -> NodeData {
    if body.data.location.range.end > data.location.range.end {
        data.location = data.location.to(&body.data.location);
    }
    data
}

/// Unexpected characters never reach the grammar, so they are reported
/// here unless the lexer already explained them.
fn report_stray_tokens(tokens: &[Token], diagnostics: &mut DiagnosticCollection) {
    for (i, token) in tokens.iter().enumerate() {
        if token.kind != TokenType::Unexpected {
            continue;
        }
        if diagnostics.diagnostics().iter().any(|error| error.range.start == token.range.start) {
            continue;
        }
        let near = tokens[i + 1..]
            .iter()
            .find(|next| !next.kind.is_trivia())
            .map_or("<eof>", |next| next.text());
        let error = SyntaxError::new(
            &messages::UNEXPECTED_0_1_NEAR_2,
            &[token.kind.describe(), token.text(), near],
            token.location(),
        );
        diagnostics.add(error);
    }
}

/// The parser produces a Chunk AST from Lua source text.
pub struct Parser<'a> {
    arena: &'a Bump,
    /// Every token the lexer produced, comments included.
    all_tokens: Vec<Token>,
    /// Indexes into `all_tokens` of the tokens the grammar consumes.
    stream: Vec<usize>,
    index: usize,
    markers: Vec<Marker>,
    scopes: ScopeStack<'a>,
    globals: FxIndexMap<&'a str, Identifier<'a>>,
    /// Whether each enclosing function accepts `...`, innermost last.
    vararg: Vec<bool>,
    diagnostics: DiagnosticCollection,
    node_count: u32,
    /// Tracks recursion depth to prevent stack overflow on deeply nested input.
    recursion_depth: u32,
    depth_reported: bool,
}

impl<'a> Parser<'a> {
    pub fn new(arena: &'a Bump, source: &str) -> Self {
        let (all_tokens, mut diagnostics) = tokenize(source);
        report_stray_tokens(&all_tokens, &mut diagnostics);
        let stream = all_tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| !token.kind.is_trivia())
            .map(|(i, _)| i)
            .collect();
        Self {
            arena,
            all_tokens,
            stream,
            index: 0,
            markers: Vec::new(),
            scopes: ScopeStack::new(),
            globals: FxIndexMap::default(),
            vararg: Vec::new(),
            diagnostics,
            node_count: 0,
            recursion_depth: 0,
            depth_reported: false,
        }
    }

    pub fn parse(mut self) -> ParseResult<'a> {
        tracing::debug!(tokens = self.all_tokens.len(), "parsing chunk");
        let chunk = self.parse_chunk();

        if !self.markers.is_empty() {
            tracing::warn!(remaining = self.markers.len(), "location markers left on the stack");
        }
        if self.scopes.depth() != 0 {
            tracing::warn!(depth = self.scopes.depth(), "scope frames left open");
        }

        let mut diagnostics = self.diagnostics;
        diagnostics.sort();
        let errors = diagnostics.into_diagnostics();
        let globals: Vec<Identifier<'a>> = self.globals.into_values().collect();
        tracing::debug!(nodes = self.node_count, errors = errors.len(), globals = globals.len(), "parsed chunk");

        ParseResult { tokens: self.all_tokens, ast: chunk, globals, errors }
    }

    // ========================================================================
    // Token management
    // ========================================================================

    #[inline]
    fn token(&self) -> &Token {
        &self.all_tokens[self.stream[self.index]]
    }

    fn peek(&self, n: usize) -> &Token {
        let index = (self.index + n).min(self.stream.len() - 1);
        &self.all_tokens[self.stream[index]]
    }

    fn previous(&self) -> Option<&Token> {
        self.index.checked_sub(1).map(|i| &self.all_tokens[self.stream[i]])
    }

    /// Move to the next grammar token. The EOF token is never passed.
    fn advance(&mut self) {
        if self.index + 1 < self.stream.len() {
            self.index += 1;
        }
    }

    fn is(&self, text: &str) -> bool {
        let token = self.token();
        matches!(token.kind, TokenType::Punctuator | TokenType::Keyword) && token.raw == text
    }

    fn consume(&mut self, text: &str) -> bool {
        if self.is(text) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, text: &str) -> bool {
        if self.consume(text) {
            return true;
        }
        let near = self.token().text().to_string();
        self.raise_at_current(&messages::_0_EXPECTED_NEAR_1, &[text, &near]);
        false
    }

    /// Expect the token closing a construct opened on `line`.
    ///
    /// When the opener is on another line the message names it.
    fn expect_match(&mut self, close: &str, open: &str, line: u32) -> bool {
        if self.consume(close) {
            return true;
        }
        let near = self.token().text().to_string();
        if self.token().start.line == line {
            self.raise_at_current(&messages::_0_EXPECTED_NEAR_1, &[close, &near]);
        } else {
            let line = line.to_string();
            self.raise_at_current(&messages::_0_EXPECTED_TO_CLOSE_1_AT_LINE_2_NEAR_3, &[close, open, &line, &near]);
        }
        false
    }

    fn current_start(&self) -> (Position, TextPos) {
        let token = self.token();
        (token.start, token.range.start)
    }

    /// The end of the last consumed grammar token.
    fn previous_end(&self) -> (Position, TextPos) {
        match self.previous() {
            Some(token) => (token.end, token.range.end),
            None => (Position::new(1, 1), 0),
        }
    }

    // ========================================================================
    // Locations and node ids
    // ========================================================================

    fn current_marker(&self) -> Marker {
        let (start, offset) = self.current_start();
        Marker { start, offset }
    }

    fn mark(&mut self) {
        let marker = self.current_marker();
        self.markers.push(marker);
    }

    fn push_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    fn finish(&mut self, kind: SyntaxKind) -> Location {
        let Some(marker) = self.markers.pop() else {
            return self.missing_location(kind);
        };
        let (end, end_offset) = self.previous_end();
        if end_offset < marker.offset {
            Location::point(marker.start, marker.offset)
        } else {
            Location::new(marker.start, end, TextRange::new(marker.offset, end_offset))
        }
    }

    fn missing_location(&mut self, kind: SyntaxKind) -> Location {
        let (start, offset) = self.current_start();
        let location = Location::point(start, offset);
        tracing::error!(kind = %kind, offset, "node finished without a location marker");
        let kind = kind.to_string();
        self.raise_at(location, &messages::MISSING_LOCATION_FOR_0, &[&kind]);
        location
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.node_count);
        self.node_count += 1;
        id
    }

    fn finish_node(&mut self, kind: SyntaxKind) -> NodeData {
        let location = self.finish(kind);
        let id = self.next_id();
        NodeData::new(kind, location, id)
    }

    fn finish_node_with_id(&mut self, kind: SyntaxKind, id: NodeId) -> NodeData {
        NodeData::new(kind, self.finish(kind), id)
    }

    // ========================================================================
    // Arena helpers
    // ========================================================================

    fn alloc<T>(&self, value: T) -> &'a T {
        let arena: &'a Bump = self.arena;
        arena.alloc(value)
    }

    fn alloc_list<T>(&self, items: Vec<T>) -> NodeList<'a, T> {
        let arena: &'a Bump = self.arena;
        arena.alloc_slice_fill_iter(items)
    }

    fn alloc_str(&self, text: &str) -> &'a str {
        let arena: &'a Bump = self.arena;
        arena.alloc_str(text)
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    fn raise_at(&mut self, location: Location, message: &DiagnosticMessage, args: &[&str]) {
        self.diagnostics.add(SyntaxError::new(message, args, location));
    }

    fn raise_at_current(&mut self, message: &DiagnosticMessage, args: &[&str]) {
        let location = self.token().location();
        self.raise_at(location, message, args);
    }

    /// Report the grammar token at `stream_index` as unexpected, quoting the
    /// token after it.
    fn raise_unexpected(&mut self, stream_index: usize) {
        let found = &self.all_tokens[self.stream[stream_index]];
        let location = found.location();
        if found.is_eof() {
            self.raise_at(location, &messages::UNEXPECTED_EOF, &[]);
            return;
        }
        let next_index = (stream_index + 1).min(self.stream.len() - 1);
        let next = &self.all_tokens[self.stream[next_index]];
        let kind = found.kind.describe();
        let text = found.text().to_string();
        let near = next.text().to_string();
        self.raise_at(location, &messages::UNEXPECTED_0_1_NEAR_2, &[kind, &text, &near]);
    }

    /// A missing name is reported at the token before it.
    fn raise_name_expected(&mut self) {
        let token = self.previous().unwrap_or_else(|| self.token());
        let location = token.location();
        let near = token.text().to_string();
        self.raise_at(location, &messages::_0_EXPECTED_NEAR, &["<name>", &near]);
    }

    /// Run `rule` one level deeper, or `fallback` once nesting is too deep.
    fn guarded<T>(&mut self, rule: impl FnOnce(&mut Self) -> T, fallback: impl FnOnce(&mut Self) -> T) -> T {
        if self.recursion_depth >= MAX_RECURSION_DEPTH {
            if !self.depth_reported {
                tracing::debug!(depth = self.recursion_depth, "recursion limit reached");
                self.raise_at_current(&messages::CHUNK_HAS_TOO_MANY_SYNTAX_LEVELS, &[]);
                self.depth_reported = true;
            }
            return fallback(self);
        }
        self.recursion_depth += 1;
        let result = rule(self);
        self.recursion_depth -= 1;
        result
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    /// Run `f` inside a fresh scope frame. The frame is always popped and
    /// returned frozen, ready to attach to a block.
    fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> (T, NodeList<'a, ScopedIdentifierInfo<'a>>) {
        self.scopes.push();
        let result = f(self);
        let frame = self.scopes.pop();
        (result, self.alloc_list(frame))
    }

    /// Mark a read identifier as local, or record it as a global.
    fn attach_scope(&mut self, identifier: &mut Identifier<'a>, is_local: bool) {
        if is_local {
            identifier.is_local = true;
        } else {
            self.globals.entry(identifier.name).or_insert(*identifier);
        }
    }

    /// Bind `identifier` in the innermost frame.
    fn bind_local(
        &mut self,
        identifier: &mut Identifier<'a>,
        visible_from: TextPos,
        introduced_by: NodeRef,
        value: Option<&Expression<'a>>,
        hints: &CommentHints<'a>,
    ) {
        if let Some(info) = self.scopes.scope_identifier(identifier, visible_from) {
            info.initialize_parse_node = Some(introduced_by);
            guess_type(info, value);
            hints.apply(info);
        }
    }

    /// Hints from the run of comments directly above the token at
    /// `anchor` in `all_tokens`.
    fn leading_hints(&self, anchor: usize) -> CommentHints<'a> {
        let mut lines: Vec<&str> = Vec::new();
        let mut next_line = self.all_tokens[anchor].start.line;
        let mut i = anchor;
        while i > 0 {
            let comment = &self.all_tokens[i - 1];
            if comment.kind != TokenType::Comment || comment.end.line + 1 < next_line {
                break;
            }
            // A comment trailing code on its line belongs to that code.
            if i >= 2 {
                let before = &self.all_tokens[i - 2];
                if before.kind != TokenType::Comment && before.end.line == comment.start.line {
                    break;
                }
            }
            if let TokenValue::Text(text) = &comment.value {
                lines.push(text.as_str());
            }
            next_line = comment.start.line;
            i -= 1;
        }
        if lines.is_empty() {
            return CommentHints::default();
        }
        lines.reverse();
        CommentHints::parse(self.arena, &lines)
    }

    // ========================================================================
    // Chunk and blocks
    // ========================================================================

    fn parse_chunk(&mut self) -> Chunk<'a> {
        self.vararg.push(true);
        let (statements, scope) = self.with_scope(|p| p.parse_chunk_statements());
        self.vararg.pop();

        let (end, end_offset) = self.current_start();
        let location = Location::new(Position::new(1, 1), end, TextRange::new(0, end_offset));
        let body = Block {
            data: NodeData::new(SyntaxKind::Block, location, self.next_id()),
            statements: self.alloc_list(statements),
            scope,
        };
        let comments = self.collect_comments();
        Chunk { data: NodeData::new(SyntaxKind::Chunk, location, self.next_id()), body, comments }
    }

    fn parse_chunk_statements(&mut self) -> Vec<Statement<'a>> {
        let mut statements = self.parse_statements();
        while !self.token().is_eof() {
            // A block terminator with no open block.
            let near = self.token().text().to_string();
            self.raise_at_current(&messages::_0_EXPECTED_NEAR_1, &["<eof>", &near]);
            self.advance();
            self.skip_to_next_statement();
            statements.extend(self.parse_statements());
        }
        statements
    }

    /// Parse statements up to the end of the current block.
    fn parse_statements(&mut self) -> Vec<Statement<'a>> {
        let mut statements = Vec::new();
        while !is_block_follow(self.token()) {
            if self.is("return") {
                statements.push(self.parse_return_statement());
                break;
            }
            if self.consume(";") {
                continue;
            }
            let before = self.index;
            let statement = self.parse_statement();
            let failed = statement.is_error();
            statements.push(statement);
            if self.index == before && !is_block_follow(self.token()) {
                self.advance();
            }
            if failed {
                self.skip_to_next_statement();
            }
        }
        statements
    }

    fn skip_to_next_statement(&mut self) {
        let from = self.index;
        while !can_start_statement(self.token()) && !is_block_follow(self.token()) {
            self.advance();
        }
        if self.index != from {
            tracing::trace!(skipped = self.index - from, "skipped tokens after a syntax error");
        }
    }

    /// Parse a block body that starts right after the last consumed token.
    ///
    /// `bind` runs first inside the new frame, to declare parameters or loop
    /// variables before the statements.
    fn parse_scoped_block(&mut self, bind: impl FnOnce(&mut Self)) -> Block<'a> {
        let start = self.previous_end();
        let (statements, scope) = self.with_scope(|p| {
            bind(p);
            p.parse_statements()
        });
        let end = self.current_start();
        self.make_block(start, end, statements, scope)
    }

    fn make_block(
        &mut self,
        start: (Position, TextPos),
        end: (Position, TextPos),
        statements: Vec<Statement<'a>>,
        scope: NodeList<'a, ScopedIdentifierInfo<'a>>,
    ) -> Block<'a> {
        let location = if end.1 < start.1 {
            Location::point(start.0, start.1)
        } else {
            Location::new(start.0, end.0, TextRange::new(start.1, end.1))
        };
        Block {
            data: NodeData::new(SyntaxKind::Block, location, self.next_id()),
            statements: self.alloc_list(statements),
            scope,
        }
    }

    fn collect_comments(&mut self) -> NodeList<'a, Comment<'a>> {
        let mut comments = Vec::new();
        for i in 0..self.all_tokens.len() {
            let token = &self.all_tokens[i];
            if token.kind != TokenType::Comment {
                continue;
            }
            let value = match &token.value {
                TokenValue::Text(text) => self.alloc_str(text),
                _ => "",
            };
            let raw = self.alloc_str(&token.raw);
            let location = token.location();
            let id = self.next_id();
            comments.push(Comment { data: NodeData::new(SyntaxKind::Comment, location, id), value, raw });
        }
        self.alloc_list(comments)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_statement(&mut self) -> Statement<'a> {
        self.guarded(Self::parse_statement_worker, |p| {
            p.mark();
            p.error_statement()
        })
    }

    fn parse_statement_worker(&mut self) -> Statement<'a> {
        let anchor = self.stream[self.index];
        if self.token().kind == TokenType::Keyword {
            match self.token().raw.as_str() {
                "local" => return self.parse_local_statement(anchor),
                "if" => return self.parse_if_statement(),
                "return" => return self.parse_return_statement(),
                "function" => return self.parse_function_statement(anchor),
                "while" => return self.parse_while_statement(),
                "for" => return self.parse_for_statement(),
                "repeat" => return self.parse_repeat_statement(),
                "break" => return self.parse_break_statement(),
                "do" => return self.parse_do_statement(),
                _ => {
                    self.raise_unexpected(self.index);
                    self.mark();
                    self.advance();
                    return self.error_statement();
                }
            }
        }
        self.parse_assignment_or_call_statement(anchor)
    }

    /// Finish the pushed marker as an erroneous statement.
    fn error_statement(&mut self) -> Statement<'a> {
        Statement::Error(ErroneousNode { data: self.finish_node(SyntaxKind::ErroneousNode) })
    }

    fn parse_break_statement(&mut self) -> Statement<'a> {
        self.mark();
        self.advance();
        Statement::Break(BreakStatement { data: self.finish_node(SyntaxKind::BreakStatement) })
    }

    fn parse_return_statement(&mut self) -> Statement<'a> {
        self.mark();
        self.advance();
        let arguments = if is_block_follow(self.token()) || self.is(";") {
            Vec::new()
        } else {
            self.parse_expression_list()
        };
        self.consume(";");
        let data = self.finish_node(SyntaxKind::ReturnStatement);
        Statement::Return(ReturnStatement { data, arguments: self.alloc_list(arguments) })
    }

    fn parse_do_statement(&mut self) -> Statement<'a> {
        self.mark();
        let line = self.token().start.line;
        self.advance();
        let body = self.parse_scoped_block(|_| {});
        self.expect_match("end", "do", line);
        Statement::Do(DoStatement { data: self.finish_node(SyntaxKind::DoStatement), body })
    }

    fn parse_while_statement(&mut self) -> Statement<'a> {
        self.mark();
        let line = self.token().start.line;
        self.advance();
        let condition = self.parse_required_expression();
        self.expect("do");
        let body = self.parse_scoped_block(|_| {});
        self.expect_match("end", "while", line);
        let data = self.finish_node(SyntaxKind::WhileStatement);
        Statement::While(WhileStatement { data, condition: self.alloc(condition), body })
    }

    /// `repeat ... until cond`. The condition sees the body's locals.
    fn parse_repeat_statement(&mut self) -> Statement<'a> {
        self.mark();
        let line = self.token().start.line;
        self.advance();
        let start = self.previous_end();
        let ((statements, end, condition), scope) = self.with_scope(|p| {
            let statements = p.parse_statements();
            let end = p.current_start();
            p.expect_match("until", "repeat", line);
            let condition = p.parse_required_expression();
            (statements, end, condition)
        });
        let body = self.make_block(start, end, statements, scope);
        let data = self.finish_node(SyntaxKind::RepeatStatement);
        Statement::Repeat(RepeatStatement { data, body, condition: self.alloc(condition) })
    }

    fn parse_if_statement(&mut self) -> Statement<'a> {
        self.mark();
        let line = self.token().start.line;
        let mut clauses = vec![IfStatementClause::If(self.parse_conditional_clause(SyntaxKind::IfClause))];
        while self.is("elseif") {
            clauses.push(IfStatementClause::Elseif(self.parse_conditional_clause(SyntaxKind::ElseifClause)));
        }
        if self.is("else") {
            self.mark();
            self.advance();
            let body = self.parse_scoped_block(|_| {});
            let data = covering_block(self.finish_node(SyntaxKind::ElseClause), &body);
            clauses.push(IfStatementClause::Else(ElseClause { data, body }));

            while self.is("elseif") {
                self.raise_at_current(&messages::_0_EXPECTED_NEAR_1, &["end", "elseif"]);
                let clause = self.parse_conditional_clause(SyntaxKind::ElseifClause);
                let data = NodeData { kind: SyntaxKind::ErroneousNode, ..clause.data };
                clauses.push(IfStatementClause::Error(ErroneousNode { data }));
            }
        }
        self.expect_match("end", "if", line);
        let data = self.finish_node(SyntaxKind::IfStatement);
        Statement::If(IfStatement { data, clauses: self.alloc_list(clauses) })
    }

    /// `if cond then block` or `elseif cond then block`.
    fn parse_conditional_clause(&mut self, kind: SyntaxKind) -> ConditionalClause<'a> {
        self.mark();
        self.advance();
        let condition = self.parse_required_expression();
        self.expect("then");
        let body = self.parse_scoped_block(|_| {});
        let data = covering_block(self.finish_node(kind), &body);
        ConditionalClause { data, condition: self.alloc(condition), body }
    }

    fn parse_for_statement(&mut self) -> Statement<'a> {
        self.mark();
        let line = self.token().start.line;
        self.advance();
        let id = self.next_id();
        let Some(first) = self.parse_name() else {
            return self.error_statement();
        };

        if self.consume("=") {
            let start = self.parse_required_expression();
            self.expect(",");
            let end = self.parse_required_expression();
            let step = if self.consume(",") { Some(self.parse_required_expression()) } else { None };
            self.expect("do");

            let mut variable = first;
            let introduced_by = NodeRef { id, kind: SyntaxKind::ForNumericStatement };
            let body = self.parse_scoped_block(|p| {
                let (_, visible_from) = p.previous_end();
                p.bind_local(&mut variable, visible_from, introduced_by, None, &CommentHints::default());
            });
            self.expect_match("end", "for", line);

            let data = self.finish_node_with_id(SyntaxKind::ForNumericStatement, id);
            return Statement::ForNumeric(ForNumericStatement {
                data,
                variable,
                start: self.alloc(start),
                end: self.alloc(end),
                step: step.map(|step| self.alloc(step)),
                body,
            });
        }

        let mut variables = vec![first];
        while self.consume(",") {
            match self.parse_name() {
                Some(name) => variables.push(name),
                None => break,
            }
        }
        self.expect("in");
        let iterators = self.parse_expression_list();
        self.expect("do");

        let introduced_by = NodeRef { id, kind: SyntaxKind::ForGenericStatement };
        let body = self.parse_scoped_block(|p| {
            let (_, visible_from) = p.previous_end();
            for variable in variables.iter_mut() {
                p.bind_local(variable, visible_from, introduced_by, None, &CommentHints::default());
            }
        });
        self.expect_match("end", "for", line);

        let data = self.finish_node_with_id(SyntaxKind::ForGenericStatement, id);
        Statement::ForGeneric(ForGenericStatement {
            data,
            variables: self.alloc_list(variables),
            iterators: self.alloc_list(iterators),
            body,
        })
    }

    fn parse_local_statement(&mut self, anchor: usize) -> Statement<'a> {
        self.mark();
        self.advance();
        if self.consume("function") {
            return self.parse_local_function(anchor);
        }

        let id = self.next_id();
        let mut variables = Vec::new();
        loop {
            match self.parse_name() {
                Some(name) => variables.push(name),
                None if variables.is_empty() => return self.error_statement(),
                None => break,
            }
            if !self.consume(",") {
                break;
            }
        }
        let init = if self.consume("=") { self.parse_expression_list() } else { Vec::new() };
        let data = self.finish_node_with_id(SyntaxKind::LocalStatement, id);

        // The new bindings only become visible once the statement is complete.
        let visible_from = data.location.range.end;
        let introduced_by = NodeRef { id, kind: SyntaxKind::LocalStatement };
        let hints = self.leading_hints(anchor);
        for (i, variable) in variables.iter_mut().enumerate() {
            self.bind_local(variable, visible_from, introduced_by, init.get(i), &hints);
        }

        Statement::Local(LocalStatement {
            data,
            variables: self.alloc_list(variables),
            init: self.alloc_list(init),
        })
    }

    /// `local function name body`, entered after `function`. The name is
    /// bound before the body so the function can call itself.
    fn parse_local_function(&mut self, anchor: usize) -> Statement<'a> {
        let line = self.previous().map_or(1, |token| token.start.line);
        let id = self.next_id();
        let Some(mut name) = self.parse_name() else {
            return self.error_statement();
        };

        let hints = self.leading_hints(anchor);
        let introduced_by = NodeRef { id, kind: SyntaxKind::FunctionDeclaration };
        let visible_from = name.data.location.range.end;
        self.bind_local(&mut name, visible_from, introduced_by, None, &hints);
        if let Some(info) = self.scopes.lookup_mut(name.name) {
            if !info.type_hinted {
                info.type_name = Some("function");
            }
        }

        let identifier = self.alloc(Expression::Identifier(name));
        let (parameters, body, flags) = self.parse_function_body(id, None, line, &hints);
        let mut data = self.finish_node_with_id(SyntaxKind::FunctionDeclaration, id);
        data.flags |= flags;
        Statement::Function(FunctionDeclaration { data, identifier: Some(identifier), is_local: true, parameters, body })
    }

    /// `function a.b.c:m() ... end`
    fn parse_function_statement(&mut self, anchor: usize) -> Statement<'a> {
        self.mark();
        let line = self.token().start.line;
        self.advance();
        let id = self.next_id();

        let marker = self.current_marker();
        let Some(mut base) = self.parse_name() else {
            return self.error_statement();
        };
        let is_local = self.scopes.has_name(base.name);
        self.attach_scope(&mut base, is_local);

        let mut name = Expression::Identifier(base);
        let mut method_self = None;
        while self.is(".") || self.is(":") {
            let indexer = if self.is(".") { Indexer::Dot } else { Indexer::Colon };
            self.advance();
            let Some(identifier) = self.parse_name() else {
                return self.error_statement();
            };
            if indexer == Indexer::Colon {
                method_self = Some(Identifier {
                    data: NodeData::new(SyntaxKind::Identifier, identifier.data.location, self.next_id()),
                    name: "self",
                    is_local: false,
                });
            }
            self.push_marker(marker);
            let data = self.finish_node(SyntaxKind::MemberExpression);
            name = Expression::Member(MemberExpression { data, base: self.alloc(name), indexer, identifier });
            if indexer == Indexer::Colon {
                break;
            }
        }

        let hints = self.leading_hints(anchor);
        let identifier = self.alloc(name);
        let (parameters, body, flags) = self.parse_function_body(id, method_self, line, &hints);
        let mut data = self.finish_node_with_id(SyntaxKind::FunctionDeclaration, id);
        data.flags |= flags;
        Statement::Function(FunctionDeclaration { data, identifier: Some(identifier), is_local: false, parameters, body })
    }

    /// `(params) block end`, shared by every function form.
    ///
    /// Parameters are bound in the body's frame and attributed to the
    /// function node `id`.
    fn parse_function_body(
        &mut self,
        id: NodeId,
        method_self: Option<Identifier<'a>>,
        line: u32,
        hints: &CommentHints<'a>,
    ) -> (NodeList<'a, Expression<'a>>, Block<'a>, NodeFlags) {
        let paren_line = self.token().start.line;
        self.expect("(");

        let mut params: Vec<Identifier<'a>> = Vec::new();
        let mut vararg = None;
        if !self.is(")") {
            loop {
                match self.token().kind {
                    TokenType::Identifier => {
                        if let Some(name) = self.parse_name() {
                            params.push(name);
                        }
                    }
                    TokenType::VarargLiteral => {
                        self.mark();
                        self.advance();
                        let data = self.finish_node(SyntaxKind::VarargLiteral);
                        vararg = Some(VarargLiteral { data, raw: "..." });
                        break;
                    }
                    _ => {
                        self.raise_name_expected();
                        break;
                    }
                }
                if !self.consume(",") {
                    break;
                }
            }
        }
        self.expect_match(")", "(", paren_line);

        let introduced_by = NodeRef { id, kind: SyntaxKind::FunctionDeclaration };
        let mut method_self = method_self;
        self.vararg.push(vararg.is_some());
        let body = self.parse_scoped_block(|p| {
            let (_, visible_from) = p.previous_end();
            if let Some(self_param) = method_self.as_mut() {
                p.bind_local(self_param, visible_from, introduced_by, None, &CommentHints::default());
            }
            for param in params.iter_mut() {
                if let Some(info) = p.scopes.scope_identifier(param, visible_from) {
                    info.initialize_parse_node = Some(introduced_by);
                    hints.apply_type(info);
                }
            }
        });
        self.vararg.pop();
        self.expect_match("end", "function", line);

        let mut flags = NodeFlags::NONE;
        if vararg.is_some() {
            flags |= NodeFlags::VARARG;
        }
        if method_self.is_some() {
            flags |= NodeFlags::METHOD;
        }
        let mut parameters: Vec<Expression<'a>> = params.into_iter().map(Expression::Identifier).collect();
        if let Some(vararg) = vararg {
            parameters.push(Expression::VarargLiteral(vararg));
        }
        (self.alloc_list(parameters), body, flags)
    }

    fn parse_assignment_or_call_statement(&mut self, anchor: usize) -> Statement<'a> {
        self.mark();
        let Some(first) = self.parse_prefix_expression() else {
            self.raise_unexpected(self.index);
            return self.error_statement();
        };

        if self.is(",") || self.is("=") {
            return self.parse_assignment_statement(first, anchor);
        }
        if first.is_call() {
            let data = self.finish_node(SyntaxKind::CallStatement);
            return Statement::Call(CallStatement { data, expression: self.alloc(first) });
        }
        if !first.is_error() {
            // An expression on its own is not a statement.
            self.raise_unexpected(self.index.saturating_sub(1));
        }
        self.error_statement()
    }

    fn parse_assignment_statement(&mut self, first: Expression<'a>, anchor: usize) -> Statement<'a> {
        self.check_assignment_target(&first);
        let mut variables = vec![first];
        while self.consume(",") {
            let target = match self.parse_prefix_expression() {
                Some(target) => target,
                None => {
                    self.raise_unexpected(self.index);
                    self.error_expression()
                }
            };
            self.check_assignment_target(&target);
            variables.push(target);
        }
        self.expect("=");
        let init = self.parse_expression_list();
        let data = self.finish_node(SyntaxKind::AssignmentStatement);

        // Assigning to a known local refines what its scope entry knows.
        let hints = self.leading_hints(anchor);
        for (i, variable) in variables.iter().enumerate() {
            let Some(identifier) = variable.as_identifier().filter(|ident| ident.is_local) else {
                continue;
            };
            if let Some(info) = self.scopes.lookup_mut(identifier.name) {
                guess_type(info, init.get(i));
                hints.apply(info);
            }
        }

        Statement::Assignment(AssignmentStatement {
            data,
            variables: self.alloc_list(variables),
            init: self.alloc_list(init),
        })
    }

    fn check_assignment_target(&mut self, target: &Expression<'a>) {
        if target.is_assignable() || target.is_error() {
            return;
        }
        let near = self.token().text().to_string();
        self.raise_at(target.data().location, &messages::INVALID_LEFT_HAND_SIDE_NEAR_0, &[&near]);
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expression(&mut self) -> Option<Expression<'a>> {
        self.parse_sub_expression(0)
    }

    fn parse_expression_list(&mut self) -> Vec<Expression<'a>> {
        let mut expressions = vec![self.parse_required_expression()];
        while self.consume(",") {
            expressions.push(self.parse_required_expression());
        }
        expressions
    }

    /// An expression that must be present; a zero-width error node stands in
    /// when it is not.
    fn parse_required_expression(&mut self) -> Expression<'a> {
        match self.parse_expression() {
            Some(expression) => expression,
            None => self.expression_expected(),
        }
    }

    fn expression_expected(&mut self) -> Expression<'a> {
        let near = self.token().text().to_string();
        self.raise_at_current(&messages::_0_EXPECTED_NEAR, &["<expression>", &near]);
        self.error_expression()
    }

    fn error_expression(&mut self) -> Expression<'a> {
        let (end, end_offset) = self.previous_end();
        let data = NodeData::new(SyntaxKind::ErroneousNode, Location::point(end, end_offset), self.next_id());
        Expression::Error(ErroneousNode { data })
    }

    fn parse_sub_expression(&mut self, min_precedence: u8) -> Option<Expression<'a>> {
        self.guarded(
            |p| p.parse_sub_expression_worker(min_precedence),
            |p| Some(p.error_expression()),
        )
    }

    /// Precedence climbing. Right-associative operators parse their right
    /// operand one level lower so an equal operator binds to the right.
    fn parse_sub_expression_worker(&mut self, min_precedence: u8) -> Option<Expression<'a>> {
        let marker = self.current_marker();
        let mut expression = if let Some(operator) = unary_operator(self.token()) {
            self.push_marker(marker);
            self.advance();
            let argument = match self.parse_sub_expression(UNARY_PRIORITY) {
                Some(argument) => argument,
                None => self.expression_expected(),
            };
            let data = self.finish_node(SyntaxKind::UnaryExpression);
            Expression::Unary(UnaryExpression { data, operator, argument: self.alloc(argument) })
        } else {
            self.parse_simple_expression()?
        };

        while let Some(operator) = binary_operator(self.token()) {
            let precedence = operator.precedence();
            if precedence <= min_precedence {
                break;
            }
            let right_precedence = if operator.is_right_associative() { precedence - 1 } else { precedence };
            self.advance();
            let right = match self.parse_sub_expression(right_precedence) {
                Some(right) => right,
                None => self.expression_expected(),
            };
            self.push_marker(marker);
            let data = self.finish_node(operator.kind());
            let left = self.alloc(expression);
            let right = self.alloc(right);
            expression = match operator {
                Operator::Binary(operator) => Expression::Binary(BinaryExpression { data, operator, left, right }),
                Operator::Logical(operator) => Expression::Logical(LogicalExpression { data, operator, left, right }),
            };
        }
        Some(expression)
    }

    /// Literals, function expressions, table constructors, and prefix
    /// expressions.
    fn parse_simple_expression(&mut self) -> Option<Expression<'a>> {
        let token = self.token();
        let expression = match token.kind {
            TokenType::StringLiteral => self.parse_string_literal(),
            TokenType::NumericLiteral => {
                let value = match token.value {
                    TokenValue::Number(value) => value,
                    _ => 0.0,
                };
                let raw = self.alloc_str(&token.raw);
                self.mark();
                self.advance();
                Expression::NumericLiteral(NumericLiteral { data: self.finish_node(SyntaxKind::NumericLiteral), value, raw })
            }
            TokenType::BooleanLiteral => {
                let value = matches!(token.value, TokenValue::Boolean(true));
                let raw = self.alloc_str(&token.raw);
                self.mark();
                self.advance();
                Expression::BooleanLiteral(BooleanLiteral { data: self.finish_node(SyntaxKind::BooleanLiteral), value, raw })
            }
            TokenType::NilLiteral => {
                self.mark();
                self.advance();
                Expression::NilLiteral(NilLiteral { data: self.finish_node(SyntaxKind::NilLiteral), raw: "nil" })
            }
            TokenType::VarargLiteral => {
                if !self.vararg.last().copied().unwrap_or(true) {
                    self.raise_at_current(&messages::CANNOT_USE_VARARG_OUTSIDE_FUNCTION, &["..."]);
                }
                self.mark();
                self.advance();
                Expression::VarargLiteral(VarargLiteral { data: self.finish_node(SyntaxKind::VarargLiteral), raw: "..." })
            }
            TokenType::Keyword if token.raw == "function" => {
                let line = token.start.line;
                self.mark();
                self.advance();
                let id = self.next_id();
                let (parameters, body, flags) = self.parse_function_body(id, None, line, &CommentHints::default());
                let mut data = self.finish_node_with_id(SyntaxKind::FunctionDeclaration, id);
                data.flags |= flags;
                Expression::Function(FunctionDeclaration { data, identifier: None, is_local: false, parameters, body })
            }
            TokenType::Punctuator if token.raw == "{" => self.parse_table_constructor(),
            _ => return self.parse_prefix_expression(),
        };
        Some(expression)
    }

    fn parse_string_literal(&mut self) -> Expression<'a> {
        let token = self.token();
        let value = match &token.value {
            TokenValue::Text(text) => self.alloc_str(text),
            _ => "",
        };
        let raw = self.alloc_str(&token.raw);
        self.mark();
        self.advance();
        Expression::StringLiteral(StringLiteral { data: self.finish_node(SyntaxKind::StringLiteral), value, raw })
    }

    /// A name or parenthesized expression followed by any number of `.name`,
    /// `[expr]`, `:name args`, and call suffixes.
    fn parse_prefix_expression(&mut self) -> Option<Expression<'a>> {
        let marker = self.current_marker();
        let mut base = if self.token().kind == TokenType::Identifier {
            let mut identifier = self.parse_name()?;
            let is_local = self.scopes.has_name(identifier.name);
            self.attach_scope(&mut identifier, is_local);
            Expression::Identifier(identifier)
        } else if self.is("(") {
            let line = self.token().start.line;
            self.advance();
            let mut inner = self.parse_required_expression();
            self.expect_match(")", "(", line);
            inner.data_mut().flags |= NodeFlags::PARENTHESIZED;
            inner
        } else {
            return None;
        };

        loop {
            if self.is(".") || self.is(":") {
                let indexer = if self.is(".") { Indexer::Dot } else { Indexer::Colon };
                self.advance();
                let Some(identifier) = self.parse_name() else {
                    return Some(self.error_chain(marker));
                };
                self.push_marker(marker);
                let data = self.finish_node(SyntaxKind::MemberExpression);
                let member = Expression::Member(MemberExpression { data, base: self.alloc(base), indexer, identifier });
                if indexer == Indexer::Dot {
                    base = member;
                    continue;
                }
                // A method reference must be called.
                match self.parse_call_arguments(member, marker) {
                    Ok(call) => base = call,
                    Err(_) => {
                        let near = self.token().text().to_string();
                        self.raise_at_current(&messages::_0_EXPECTED_NEAR, &["function arguments", &near]);
                        return Some(self.error_chain(marker));
                    }
                }
            } else if self.is("[") {
                self.advance();
                let index = self.parse_required_expression();
                self.expect("]");
                self.push_marker(marker);
                let data = self.finish_node(SyntaxKind::IndexExpression);
                base = Expression::Index(IndexExpression { data, base: self.alloc(base), index: self.alloc(index) });
            } else {
                match self.parse_call_arguments(base, marker) {
                    Ok(call) => base = call,
                    Err(done) => return Some(done),
                }
            }
        }
    }

    /// Apply call arguments to `base`, or hand `base` back when no argument
    /// list starts here.
    fn parse_call_arguments(&mut self, base: Expression<'a>, marker: Marker) -> Result<Expression<'a>, Expression<'a>> {
        if self.is("(") {
            let line = self.token().start.line;
            self.advance();
            let arguments = if self.is(")") { Vec::new() } else { self.parse_expression_list() };
            self.expect_match(")", "(", line);
            self.push_marker(marker);
            let data = self.finish_node(SyntaxKind::CallExpression);
            Ok(Expression::Call(CallExpression { data, base: self.alloc(base), arguments: self.alloc_list(arguments) }))
        } else if self.is("{") {
            let argument = self.parse_table_constructor();
            self.push_marker(marker);
            let data = self.finish_node(SyntaxKind::TableCallExpression);
            Ok(Expression::TableCall(TableCallExpression { data, base: self.alloc(base), argument: self.alloc(argument) }))
        } else if self.token().kind == TokenType::StringLiteral {
            let argument = self.parse_string_literal();
            self.push_marker(marker);
            let data = self.finish_node(SyntaxKind::StringCallExpression);
            Ok(Expression::StringCall(StringCallExpression { data, base: self.alloc(base), argument: self.alloc(argument) }))
        } else {
            Err(base)
        }
    }

    /// Replace a broken suffix chain with one erroneous node.
    fn error_chain(&mut self, marker: Marker) -> Expression<'a> {
        self.push_marker(marker);
        Expression::Error(ErroneousNode { data: self.finish_node(SyntaxKind::ErroneousNode) })
    }

    fn parse_table_constructor(&mut self) -> Expression<'a> {
        self.mark();
        let line = self.token().start.line;
        self.advance();

        let mut fields = Vec::new();
        while !self.is("}") {
            if self.is("[") {
                self.mark();
                self.advance();
                let key = self.parse_required_expression();
                self.expect("]");
                self.expect("=");
                let value = self.parse_required_expression();
                let data = self.finish_node(SyntaxKind::TableKey);
                fields.push(TableField::Key(TableKey { data, key: self.alloc(key), value: self.alloc(value) }));
            } else if self.token().kind == TokenType::Identifier && self.peek(1).is_punctuator("=") {
                self.mark();
                let Some(key) = self.parse_name() else {
                    self.markers.pop();
                    break;
                };
                self.advance();
                let value = self.parse_required_expression();
                let data = self.finish_node(SyntaxKind::TableKeyString);
                fields.push(TableField::KeyString(TableKeyString { data, key, value: self.alloc(value) }));
            } else {
                self.mark();
                let Some(value) = self.parse_expression() else {
                    self.markers.pop();
                    break;
                };
                let data = self.finish_node(SyntaxKind::TableValue);
                fields.push(TableField::Value(TableValue { data, value: self.alloc(value) }));
            }

            if !(self.consume(",") || self.consume(";")) {
                break;
            }
        }

        self.expect_match("}", "{", line);
        let data = self.finish_node(SyntaxKind::TableConstructorExpression);
        Expression::Table(TableConstructorExpression { data, fields: self.alloc_list(fields) })
    }

    /// A bare name. Scope resolution is left to the caller.
    fn parse_name(&mut self) -> Option<Identifier<'a>> {
        if self.token().kind != TokenType::Identifier {
            self.raise_name_expected();
            return None;
        }
        let name = self.alloc_str(&self.token().raw);
        self.mark();
        self.advance();
        Some(Identifier { data: self.finish_node(SyntaxKind::Identifier), name, is_local: false })
    }
}
