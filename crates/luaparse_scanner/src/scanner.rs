//! The Lua lexer.
//!
//! The lexer converts source text into classified tokens with byte ranges and
//! line/column positions. Problems found while scanning (malformed numbers,
//! unfinished strings) are recorded as diagnostics and a best-effort token is
//! still returned, so the stream always runs to an EOF token.

use crate::char_codes::*;
use crate::token::{Token, TokenValue};
use luaparse_ast::syntax_kind::{classify_word, TokenType};
use luaparse_core::text::{column_at, Location, Position, TextPos, TextRange};
use luaparse_diagnostics::{messages, DiagnosticCollection, DiagnosticMessage, SyntaxError};

/// A parsed long-bracket literal: `[==[ ... ]==]`.
struct LongBracket {
    content: String,
    terminated: bool,
}

/// The lexer converts Lua source text into tokens.
pub struct Lexer<'s> {
    /// The source text being scanned.
    source: &'s str,
    bytes: &'s [u8],
    /// Current byte offset.
    pos: usize,
    /// Current 1-based line.
    line: u32,
    /// Byte offset where the current line starts.
    line_start: usize,
    /// Set once the EOF token has been produced.
    finished: bool,
    /// Accumulated diagnostics.
    diagnostics: DiagnosticCollection,
}

impl<'s> Lexer<'s> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            line_start: 0,
            finished: false,
            diagnostics: DiagnosticCollection::new(),
        }
    }

    /// The source text being scanned.
    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Get the accumulated diagnostics.
    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }

    /// Take the accumulated diagnostics, leaving an empty collection.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    /// Record an error anchored at `token`, or at the cursor when no token
    /// could be formed.
    pub fn raise_error(&mut self, token: Option<&Token>, message: &DiagnosticMessage, args: &[&str]) {
        let location = match token {
            Some(token) => token.location(),
            None => Location::point(self.position_at(self.pos), self.pos as TextPos),
        };
        self.diagnostics.add(SyntaxError::new(message, args, location));
    }

    // ========================================================================
    // Positions
    // ========================================================================

    /// The line/column of `pos` relative to the current line start.
    ///
    /// Recomputed on demand: a token spanning several lines has its end
    /// column measured from the line the lexer is on now.
    fn position_at(&self, pos: usize) -> Position {
        Position::new(self.line, column_at(self.bytes, self.line_start, pos))
    }

    #[inline]
    fn current(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    /// Consume one line break at the cursor. `\r\n` and `\n\r` count once.
    fn consume_line_break(&mut self) {
        let first = self.bytes[self.pos];
        self.pos += 1;
        if let Some(next) = self.current() {
            if is_line_break(next) && next != first {
                self.pos += 1;
            }
        }
        self.line += 1;
        self.line_start = self.pos;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current() {
            if is_white_space_single_line(ch) {
                self.pos += 1;
            } else if is_line_break(ch) {
                self.consume_line_break();
            } else {
                break;
            }
        }
    }

    fn make_token(&self, kind: TokenType, value: TokenValue, start: usize, start_pos: Position) -> Token {
        Token {
            kind,
            value,
            raw: self.source[start..self.pos].to_string(),
            start: start_pos,
            end: self.position_at(self.pos),
            range: TextRange::new(start as TextPos, self.pos as TextPos),
        }
    }

    // ========================================================================
    // Core scanning
    // ========================================================================

    /// Scan the next token. Once EOF has been returned, keeps returning EOF.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.pos;
        let start_pos = self.position_at(start);

        let Some(ch) = self.current() else {
            self.finished = true;
            return Token {
                kind: TokenType::EOF,
                value: TokenValue::Text("<eof>".to_string()),
                raw: String::new(),
                start: start_pos,
                end: start_pos,
                range: TextRange::empty(start as TextPos),
            };
        };

        match ch {
            b'\'' | b'"' => self.scan_string(ch, start, start_pos),
            b'0'..=b'9' => self.scan_number(start, start_pos),
            b'.' => {
                if self.peek(1) == Some(b'.') {
                    if self.peek(2) == Some(b'.') {
                        self.pos += 3;
                        let value = TokenValue::Text("...".to_string());
                        return self.make_token(TokenType::VarargLiteral, value, start, start_pos);
                    }
                    self.scan_punctuator(2, start, start_pos)
                } else if self.peek(1).is_some_and(is_digit) {
                    self.scan_number(start, start_pos)
                } else {
                    self.scan_punctuator(1, start, start_pos)
                }
            }
            b'-' if self.peek(1) == Some(b'-') => self.scan_comment(start, start_pos),
            b'[' => match self.peek(1) {
                Some(b'[') | Some(b'=') => self.scan_long_string(start, start_pos),
                _ => self.scan_punctuator(1, start, start_pos),
            },
            b'=' | b'<' | b'>' => {
                let len = if self.peek(1) == Some(b'=') { 2 } else { 1 };
                self.scan_punctuator(len, start, start_pos)
            }
            b'~' => {
                if self.peek(1) == Some(b'=') {
                    self.scan_punctuator(2, start, start_pos)
                } else {
                    self.scan_unexpected(start, start_pos)
                }
            }
            b':' => {
                let len = if self.peek(1) == Some(b':') { 2 } else { 1 };
                self.scan_punctuator(len, start, start_pos)
            }
            b'+' | b'-' | b'*' | b'/' | b'%' | b'^' | b'#' | b'(' | b')' | b'{' | b'}' | b']'
            | b';' | b',' => self.scan_punctuator(1, start, start_pos),
            _ if is_identifier_start(ch) => self.scan_identifier(start, start_pos),
            _ => self.scan_unexpected(start, start_pos),
        }
    }

    fn scan_punctuator(&mut self, len: usize, start: usize, start_pos: Position) -> Token {
        self.pos += len;
        let text = self.source[start..self.pos].to_string();
        self.make_token(TokenType::Punctuator, TokenValue::Text(text), start, start_pos)
    }

    /// A character that starts no token. The whole UTF-8 character is
    /// consumed; whether it is an error is left to the parser.
    fn scan_unexpected(&mut self, start: usize, start_pos: Position) -> Token {
        let width = self.source[start..].chars().next().map_or(1, char::len_utf8);
        self.pos += width;
        let text = self.source[start..self.pos].to_string();
        self.make_token(TokenType::Unexpected, TokenValue::Text(text), start, start_pos)
    }

    fn scan_identifier(&mut self, start: usize, start_pos: Position) -> Token {
        while self.current().is_some_and(is_identifier_part) {
            self.pos += 1;
        }
        let word = &self.source[start..self.pos];
        let kind = classify_word(word);
        let value = match kind {
            TokenType::BooleanLiteral => TokenValue::Boolean(word == "true"),
            TokenType::NilLiteral => TokenValue::Nil,
            _ => TokenValue::Text(word.to_string()),
        };
        self.make_token(kind, value, start, start_pos)
    }

    fn scan_number(&mut self, start: usize, start_pos: Position) -> Token {
        while self.current().is_some_and(|c| is_digit(c) || c == b'.') {
            self.pos += 1;
        }
        if matches!(self.current(), Some(b'e') | Some(b'E')) {
            self.pos += 1;
            if matches!(self.current(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
        }
        while self.current().is_some_and(is_identifier_part) {
            self.pos += 1;
        }

        let source = self.source;
        let raw = &source[start..self.pos];
        match parse_number(raw) {
            Some(value) => self.make_token(TokenType::NumericLiteral, TokenValue::Number(value), start, start_pos),
            None => {
                let token = self.make_token(TokenType::Unexpected, TokenValue::Text(raw.to_string()), start, start_pos);
                self.raise_error(Some(&token), &messages::MALFORMED_NUMBER_NEAR_0, &[raw]);
                token
            }
        }
    }

    fn scan_string(&mut self, quote: u8, start: usize, start_pos: Position) -> Token {
        self.pos += 1;
        let mut value: Vec<u8> = Vec::new();
        let mut terminated = false;

        while let Some(ch) = self.current() {
            if ch == quote {
                self.pos += 1;
                terminated = true;
                break;
            }
            if is_line_break(ch) {
                break;
            }
            if ch != BACKSLASH {
                value.push(ch);
                self.pos += 1;
                continue;
            }

            // Escape sequence.
            let Some(escaped) = self.peek(1) else {
                self.pos += 1;
                break;
            };
            match escaped {
                b'n' => value.push(b'\n'),
                b'r' => value.push(b'\r'),
                b't' => value.push(b'\t'),
                b'v' => value.push(0x0B),
                b'b' => value.push(0x08),
                b'f' => value.push(0x0C),
                b'z' => {
                    self.pos += 2;
                    self.skip_whitespace();
                    continue;
                }
                b'x' => {
                    let digits = self.bytes[self.pos + 2..]
                        .iter()
                        .take(2)
                        .take_while(|c| is_hex_digit(**c))
                        .count();
                    value.extend_from_slice(&self.bytes[self.pos..self.pos + 2 + digits]);
                    self.pos += 2 + digits;
                    continue;
                }
                b'0'..=b'9' => {
                    let digits = self.bytes[self.pos + 1..]
                        .iter()
                        .take(3)
                        .take_while(|c| is_digit(**c))
                        .count();
                    value.extend_from_slice(&self.bytes[self.pos..self.pos + 1 + digits]);
                    self.pos += 1 + digits;
                    continue;
                }
                b'\n' | b'\r' => {
                    self.pos += 1;
                    self.consume_line_break();
                    value.push(b'\n');
                    continue;
                }
                other => value.push(other),
            }
            self.pos += 2;
        }

        let value = String::from_utf8_lossy(&value).into_owned();
        let partial = (!terminated).then(|| value.clone());
        let token = self.make_token(TokenType::StringLiteral, TokenValue::Text(value), start, start_pos);
        if let Some(partial) = partial {
            self.raise_error(Some(&token), &messages::UNFINISHED_STRING_NEAR_0, &[&partial]);
        }
        token
    }

    fn scan_long_string(&mut self, start: usize, start_pos: Position) -> Token {
        let start_line = self.line;
        let Some(bracket) = self.read_long_bracket() else {
            return self.scan_punctuator(1, start, start_pos);
        };
        let token = self.make_token(TokenType::StringLiteral, TokenValue::Text(bracket.content), start, start_pos);
        if !bracket.terminated {
            self.raise_error(Some(&token), &messages::UNFINISHED_LONG_STRING, &[&start_line.to_string(), "<eof>"]);
        }
        token
    }

    fn scan_comment(&mut self, start: usize, start_pos: Position) -> Token {
        let start_line = self.line;
        self.pos += 2;

        if self.current() == Some(OPEN_BRACKET) {
            if let Some(bracket) = self.read_long_bracket() {
                let token = self.make_token(TokenType::Comment, TokenValue::Text(bracket.content), start, start_pos);
                if !bracket.terminated {
                    self.raise_error(Some(&token), &messages::UNFINISHED_LONG_COMMENT, &[&start_line.to_string(), "<eof>"]);
                }
                return token;
            }
        }

        let rest = &self.bytes[self.pos..];
        let len = memchr::memchr2(LINE_FEED, CARRIAGE_RETURN, rest).unwrap_or(rest.len());
        let text_start = self.pos;
        self.pos += len;
        let value = self.source[text_start..self.pos].to_string();
        self.make_token(TokenType::Comment, TokenValue::Text(value), start, start_pos)
    }

    /// Read a long bracket starting at the cursor's `[`.
    ///
    /// Returns `None` without consuming anything if the opener is not
    /// `[` followed by zero or more `=` and another `[`.
    fn read_long_bracket(&mut self) -> Option<LongBracket> {
        let level = self.bytes[self.pos + 1..].iter().take_while(|c| **c == EQUALS).count();
        if self.peek(1 + level) != Some(OPEN_BRACKET) {
            return None;
        }
        self.pos += level + 2;

        // A line break directly after the opener is not part of the content.
        if self.current().is_some_and(is_line_break) {
            self.consume_line_break();
        }

        let content_start = self.pos;
        while let Some(ch) = self.current() {
            if ch == CLOSE_BRACKET && self.closes_long_bracket(level) {
                let content = self.source[content_start..self.pos].to_string();
                self.pos += level + 2;
                return Some(LongBracket { content, terminated: true });
            }
            if is_line_break(ch) {
                self.consume_line_break();
            } else {
                self.pos += 1;
            }
        }

        Some(LongBracket {
            content: self.source[content_start..].to_string(),
            terminated: false,
        })
    }

    /// Whether the `]` at the cursor is followed by `level` `=` and `]`.
    fn closes_long_bracket(&self, level: usize) -> bool {
        let after = &self.bytes[self.pos + 1..];
        after.len() > level && after[..level].iter().all(|c| *c == EQUALS) && after[level] == CLOSE_BRACKET
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    /// Yields every token up to and including EOF, then `None`.
    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        Some(self.next_token())
    }
}

/// Convert the raw text of a numeric literal.
///
/// Underscores are digit separators only when a decimal digit sits on both
/// sides; anywhere else they are left in place and the conversion fails.
/// Decimal, float, exponent, and `0x` hexadecimal integer forms are accepted.
pub fn parse_number(raw: &str) -> Option<f64> {
    let bytes = raw.as_bytes();
    let underscores_valid = bytes.iter().enumerate().all(|(i, &c)| {
        c != UNDERSCORE
            || (i > 0 && is_digit(bytes[i - 1]) && bytes.get(i + 1).copied().is_some_and(is_digit))
    });
    let cleaned: String = if underscores_valid {
        raw.chars().filter(|c| *c != '_').collect()
    } else {
        raw.to_string()
    };

    if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        if hex.is_empty() || !hex.bytes().all(is_hex_digit) {
            return None;
        }
        return Some(hex.bytes().fold(0f64, |acc, c| {
            acc * 16.0 + f64::from((c as char).to_digit(16).unwrap_or(0))
        }));
    }

    if !is_decimal_literal(cleaned.as_bytes()) {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// `digits [. digits] [(e|E) [+|-] digits]` with at least one mantissa digit.
fn is_decimal_literal(text: &[u8]) -> bool {
    let mut i = 0;
    let int_digits = text.iter().take_while(|c| is_digit(**c)).count();
    i += int_digits;
    let mut frac_digits = 0;
    if text.get(i) == Some(&b'.') {
        i += 1;
        frac_digits = text[i..].iter().take_while(|c| is_digit(**c)).count();
        i += frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return false;
    }
    if matches!(text.get(i), Some(b'e') | Some(b'E')) {
        i += 1;
        if matches!(text.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        let exp_digits = text[i..].iter().take_while(|c| is_digit(**c)).count();
        if exp_digits == 0 {
            return false;
        }
        i += exp_digits;
    }
    i == text.len()
}

/// Run the lexer to completion.
///
/// Returns every token, including comments, unexpected tokens, and the final
/// EOF token, along with the diagnostics raised while scanning.
pub fn tokenize(source: &str) -> (Vec<Token>, DiagnosticCollection) {
    let mut lexer = Lexer::new(source);
    let tokens: Vec<Token> = lexer.by_ref().collect();
    tracing::trace!(tokens = tokens.len(), errors = lexer.diagnostics().len(), "tokenized source");
    (tokens, lexer.take_diagnostics())
}
