//! Rendering syntax errors as `miette` reports.

use luaparse_diagnostics::SyntaxError;
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, LabeledSpan, NamedSource, Severity, SourceCode, SourceSpan};
use std::fmt;

/// One syntax error paired with the file it came from.
#[derive(Debug)]
struct SyntaxReport<'s> {
    error: &'s SyntaxError,
    source: &'s NamedSource<String>,
}

impl fmt::Display for SyntaxReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.error.message)
    }
}

impl std::error::Error for SyntaxReport<'_> {}

impl Diagnostic for SyntaxReport<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("E{}", self.error.code)))
    }

    fn severity(&self) -> Option<Severity> {
        Some(Severity::Error)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        if self.error.is_internal() {
            Some(Box::new("this is a bug in the parser, not in the input"))
        } else {
            None
        }
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(self.source)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let range = self.error.range;
        let span = SourceSpan::from((range.start as usize, (range.end - range.start) as usize));
        let label = LabeledSpan::new_with_span(Some(self.error.kind.to_string()), span);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Render every error of one file into a single string.
pub fn render_errors(path: &str, source: &str, errors: &[SyntaxError], color: bool) -> String {
    let theme = if color {
        GraphicalTheme::unicode()
    } else {
        GraphicalTheme::unicode_nocolor()
    };
    let handler = GraphicalReportHandler::new_themed(theme);
    let named = NamedSource::new(path, source.to_string());

    let mut out = String::new();
    for error in errors {
        let report = SyntaxReport { error, source: &named };
        if handler.render_report(&mut out, &report).is_err() {
            // Fall back to the plain `[line:column] message` form.
            out.push_str(&format!("{path}:{error}\n"));
        }
    }
    out
}
