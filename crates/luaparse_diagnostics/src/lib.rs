//! luaparse_diagnostics: Syntax error messages and the diagnostics collector.
//!
//! Every problem the scanner or parser finds is recorded here as a structured
//! [`SyntaxError`]; nothing is ever thrown. Message texts follow the reference
//! Lua interpreter's wording (`'end' expected near 'x'`) so hosts can show
//! them as-is.

use luaparse_core::text::{Location, TextRange};
use serde::Serialize;
use std::fmt;

/// The taxonomy of syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SyntaxErrorKind {
    MalformedNumber,
    UnfinishedString,
    UnfinishedLongString,
    UnexpectedToken,
    ExpectedToken,
    InvalidAssignmentTarget,
    InvalidVararg,
    /// A node was finished without a pushed location marker. This is a parser
    /// fault rather than a problem with the input.
    MissingLocation,
}

impl SyntaxErrorKind {
    /// Whether this kind signals an internal contract violation.
    pub fn is_internal(self) -> bool {
        matches!(self, SyntaxErrorKind::MissingLocation)
    }
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyntaxErrorKind::MalformedNumber => "malformed number",
            SyntaxErrorKind::UnfinishedString => "unfinished string",
            SyntaxErrorKind::UnfinishedLongString => "unfinished long string",
            SyntaxErrorKind::UnexpectedToken => "unexpected token",
            SyntaxErrorKind::ExpectedToken => "expected token",
            SyntaxErrorKind::InvalidAssignmentTarget => "invalid assignment target",
            SyntaxErrorKind::InvalidVararg => "invalid vararg",
            SyntaxErrorKind::MissingLocation => "missing location",
        };
        f.write_str(name)
    }
}

/// A diagnostic message template with a code and kind.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    /// The diagnostic code (scanner 1000-1099, parser 1100-1199, internal 9000+).
    pub code: u32,
    /// The error kind this template reports.
    pub kind: SyntaxErrorKind,
    /// The message template string. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized syntax error with its span and resolved message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("[{line}:{column}] {message}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub code: u32,
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    #[serde(flatten)]
    pub range: TextRange,
}

impl SyntaxError {
    /// Create a syntax error anchored at `location`.
    pub fn new(message: &DiagnosticMessage, args: &[&str], location: Location) -> Self {
        Self {
            kind: message.kind,
            code: message.code,
            message: format_message(message.message, args),
            line: location.start.line,
            column: location.start.column,
            end_line: location.end.line,
            end_column: location.end.column,
            range: location.range,
        }
    }

    /// Whether this error indicates a parser bug rather than bad input.
    pub fn is_internal(&self) -> bool {
        self.kind.is_internal()
    }
}

/// Format a message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// Syntax errors accumulated during one scan/parse.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    errors: Vec<SyntaxError>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: SyntaxError) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn diagnostics(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn into_diagnostics(self) -> Vec<SyntaxError> {
        self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.errors.extend(other.errors);
    }

    /// Stable-sort errors by source position.
    ///
    /// Errors at the same offset keep their emission order.
    pub fn sort(&mut self) {
        self.errors
            .sort_by(|a, b| a.range.start.cmp(&b.range.start));
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, $kind:ident, $msg:expr) => {
            DiagnosticMessage { code: $code, kind: SyntaxErrorKind::$kind, message: $msg }
        };
    }

    // ========================================================================
    // Scanner errors (1000-1099)
    // ========================================================================
    pub const MALFORMED_NUMBER_NEAR_0: DiagnosticMessage = diag!(1001, MalformedNumber, "malformed number near '{0}'");
    pub const UNFINISHED_STRING_NEAR_0: DiagnosticMessage = diag!(1002, UnfinishedString, "unfinished string near '{0}'");
    pub const UNFINISHED_LONG_STRING: DiagnosticMessage = diag!(1003, UnfinishedLongString, "unfinished long string (starting at line {0}) near '{1}'");
    pub const UNFINISHED_LONG_COMMENT: DiagnosticMessage = diag!(1004, UnfinishedLongString, "unfinished long comment (starting at line {0}) near '{1}'");

    // ========================================================================
    // Parser errors (1100-1199)
    // ========================================================================
    pub const UNEXPECTED_0_1_NEAR_2: DiagnosticMessage = diag!(1101, UnexpectedToken, "unexpected {0} '{1}' near '{2}'");
    pub const UNEXPECTED_EOF: DiagnosticMessage = diag!(1102, UnexpectedToken, "unexpected symbol near '<eof>'");
    pub const _0_EXPECTED_NEAR_1: DiagnosticMessage = diag!(1103, ExpectedToken, "'{0}' expected near '{1}'");
    pub const _0_EXPECTED_TO_CLOSE_1_AT_LINE_2_NEAR_3: DiagnosticMessage = diag!(1104, ExpectedToken, "'{0}' expected (to close '{1}' at line {2}) near '{3}'");
    pub const _0_EXPECTED_NEAR: DiagnosticMessage = diag!(1105, ExpectedToken, "{0} expected near '{1}'");
    pub const INVALID_LEFT_HAND_SIDE_NEAR_0: DiagnosticMessage = diag!(1106, InvalidAssignmentTarget, "invalid left-hand side of assignment near '{0}'");
    pub const CANNOT_USE_VARARG_OUTSIDE_FUNCTION: DiagnosticMessage = diag!(1107, InvalidVararg, "cannot use '...' outside a vararg function near '{0}'");
    pub const CHUNK_HAS_TOO_MANY_SYNTAX_LEVELS: DiagnosticMessage = diag!(1108, UnexpectedToken, "chunk has too many syntax levels");

    // ========================================================================
    // Internal errors (9000+)
    // ========================================================================
    pub const MISSING_LOCATION_FOR_0: DiagnosticMessage = diag!(9001, MissingLocation, "internal error: {0} was finished without a location marker");
}
