//! Non-fatal parser findings.
//!
//! Warnings and notes are reported through `tracing` and recorded on the
//! parser; they never change the tree it produces.

use std::fmt;

use crate::ast::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Note,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Whitespace-only text after a macro, dropped instead of becoming an argument
    WhitespaceArgument,
    /// A line holding nothing but indentation
    IndentOnlyLine,
    /// The line after a bare macro held only indentation, so no block was opened
    BlockOpeningCancelled,
    EmptyLine,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::EmptyLine => Severity::Note,
            _ => Severity::Warning,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            DiagnosticKind::WhitespaceArgument => {
                "text with only whitespace is not passed to the macro"
            }
            DiagnosticKind::IndentOnlyLine => "line contains only indent",
            DiagnosticKind::BlockOpeningCancelled => {
                "block starting line contains only indent, its indentation is ignored"
            }
            DiagnosticKind::EmptyLine => "empty line",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub position: Position,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, position: Position) -> Self {
        Self { kind, position }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    /// Forwards the diagnostic to the `tracing` subscriber, if any
    pub(crate) fn emit(&self) {
        let message = self.kind.message();
        match self.severity() {
            Severity::Warning => {
                tracing::warn!(position = %self.position, "[syntax warning] {message}")
            }
            Severity::Note => tracing::info!(position = %self.position, "[syntax note] {message}"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity() {
            Severity::Warning => "warning",
            Severity::Note => "note",
        };
        write!(f, "{label} at {}: {}", self.position, self.kind.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_by_kind() {
        assert_eq!(DiagnosticKind::EmptyLine.severity(), Severity::Note);
        assert_eq!(DiagnosticKind::IndentOnlyLine.severity(), Severity::Warning);
        assert_eq!(
            DiagnosticKind::BlockOpeningCancelled.severity(),
            Severity::Warning
        );
    }

    #[test]
    fn test_display() {
        let diag = Diagnostic::new(DiagnosticKind::EmptyLine, Position::new(2, 1));
        assert_eq!(diag.to_string(), "note at 2:1: empty line");
    }
}
