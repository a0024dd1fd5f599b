//! Structured error reports produced by the scanner and the parser.

use std::fmt;
use std::slice;

use crate::token::Token;

/// How bad a diagnostic is.  Only errors are produced for now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
        }
    }
}

/// File name, line and column (both starting at one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> SourceLocation {
        SourceLocation {
            file: file.into(),
            line,
            column,
        }
    }

    /// Location of the first character of `token`.
    pub fn of_token(file: &str, token: &Token) -> SourceLocation {
        SourceLocation::new(file, token.line, token.column)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,

    /// Source line `location` points into, when known.
    pub context: Option<String>,
}

/// Renders as `file:line:col: severity: message`, followed by the source line and a caret
/// under the offending column when the context is known.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.location, self.severity, self.message)?;
        if let Some(context) = &self.context {
            let column = self.location.column.max(1) as usize;
            write!(f, "\n    {}\n    {:>column$}", context, "^", column = column)?;
        }
        Ok(())
    }
}

/// Ordered collection of reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics(Vec::new())
    }

    pub fn report(&mut self, severity: Severity, message: impl Into<String>, location: SourceLocation) {
        let diagnostic = Diagnostic {
            severity,
            message: message.into(),
            location,
            context: None,
        };
        tracing::debug!(%diagnostic, "diagnostic reported");
        self.0.push(diagnostic);
    }

    pub fn error(&mut self, message: impl Into<String>, location: SourceLocation) {
        self.report(Severity::Error, message, location)
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Quote `lines[line - 1]` in every report that has no context yet.
    pub fn attach_context(&mut self, lines: &[String]) {
        for d in self.0.iter_mut().filter(|d| d.context.is_none()) {
            let index = (d.location.line as usize).checked_sub(1);
            d.context = index.and_then(|i| lines.get(i)).cloned();
        }
    }

    /// Append all reports of `other` after ours.
    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0)
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}
