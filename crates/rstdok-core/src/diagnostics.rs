//! Build diagnostics for rstdok
//!
//! Recoverable problems found while parsing, compiling or rendering are
//! reported as [`Diagnostic`]s. The [`Reporter`] forwards every diagnostic to
//! `tracing` with its file/line context and keeps a copy, so a build can be
//! configured to fail when anything was logged.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Diagnostic codes emitted by rstdok
pub mod codes {
    pub const UNKNOWN_DIRECTIVE: &str = "RST001";
    pub const INVALID_OPTION: &str = "RST002";
    pub const MISSING_INCLUDE: &str = "RST003";
    pub const DUPLICATE_ANCHOR: &str = "RST004";
    pub const UNRESOLVED_REFERENCE: &str = "RST005";
    pub const MALFORMED_TABLE: &str = "RST006";
    pub const MISSING_TOCTREE_ENTRY: &str = "RST007";
    pub const ORPHAN_DOCUMENT: &str = "RST008";
    pub const UNSUPPORTED_NODE: &str = "RST009";
    pub const PARSE_FAILURE: &str = "RST010";
    pub const WORKER_TIMEOUT: &str = "RST011";
    pub const UNKNOWN_SUBSTITUTION: &str = "RST012";
    pub const MISSING_FILE: &str = "RST013";
}

/// A diagnostic message from the build
///
/// # Example
///
/// ```
/// use rstdok_core::diagnostics::{codes, Diagnostic, Severity};
///
/// let diag = Diagnostic::warning("Reference to unknown anchor \"intro\"")
///     .with_code(codes::UNRESOLVED_REFERENCE)
///     .with_file("guide/setup")
///     .with_line(12);
/// assert_eq!(diag.severity, Severity::Warning);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level of the diagnostic
    pub severity: Severity,

    /// The diagnostic message
    pub message: String,

    /// Diagnostic code (e.g., "RST001")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Document or file the issue occurred in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// 1-based source line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    /// Additional help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning, output is still produced
    Warning,

    /// Error, something the author asked for could not be produced
    Error,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            code: None,
            file: None,
            line: None,
            help: None,
        }
    }

    /// Create an error diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create an info diagnostic
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Set the diagnostic code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the file
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set the line
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Check if this is an error-level diagnostic
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    /// Check if this is a warning-level diagnostic
    pub fn is_warning(&self) -> bool {
        matches!(self.severity, Severity::Warning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: severity[code]: message
        write!(f, "{}", self.severity)?;
        if let Some(ref code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)?;

        if let Some(ref file) = self.file {
            write!(f, "\n  --> {}", file)?;
            if let Some(line) = self.line {
                write!(f, ":{}", line)?;
            }
        }

        if let Some(ref help) = self.help {
            write!(f, "\n  = help: {}", help)?;
        }

        Ok(())
    }
}

/// Shared diagnostic sink
///
/// Cloning a reporter yields a handle to the same collection, which lets
/// parallel parse workers and the compiler report into one place.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
}

impl Reporter {
    /// Create an empty reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a diagnostic and keep it
    pub fn report(&self, diagnostic: Diagnostic) {
        let file = diagnostic.file.as_deref().unwrap_or("-");
        let line = diagnostic.line.unwrap_or(0);
        let code = diagnostic.code.as_deref().unwrap_or("-");
        match diagnostic.severity {
            Severity::Info => tracing::info!(file, line, code, "{}", diagnostic.message),
            Severity::Warning => tracing::warn!(file, line, code, "{}", diagnostic.message),
            Severity::Error => tracing::error!(file, line, code, "{}", diagnostic.message),
        }
        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.push(diagnostic);
        }
    }

    /// Report a warning
    pub fn warning(&self, code: &str, file: &str, line: Option<usize>, message: impl Into<String>) {
        self.report(located(Diagnostic::warning(message), code, file, line));
    }

    /// Report an error
    pub fn error(&self, code: &str, file: &str, line: Option<usize>, message: impl Into<String>) {
        self.report(located(Diagnostic::error(message), code, file, line));
    }

    /// Snapshot of everything reported so far
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    /// Number of warnings and errors reported so far
    pub fn problem_count(&self) -> usize {
        self.diagnostics
            .lock()
            .map(|d| d.iter().filter(|d| d.severity >= Severity::Warning).count())
            .unwrap_or(0)
    }

    /// Check if any error was reported
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .lock()
            .map(|d| d.iter().any(Diagnostic::is_error))
            .unwrap_or(false)
    }

    /// Drop everything reported so far
    pub fn clear(&self) {
        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.clear();
        }
    }
}

fn located(diagnostic: Diagnostic, code: &str, file: &str, line: Option<usize>) -> Diagnostic {
    let diagnostic = diagnostic.with_code(code).with_file(file);
    match line {
        Some(line) => diagnostic.with_line(line),
        None => diagnostic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_builder() {
        let diag = Diagnostic::error("Include file not found")
            .with_code(codes::MISSING_INCLUDE)
            .with_file("index")
            .with_line(4)
            .with_help("Check the include path");

        assert!(diag.is_error());
        assert_eq!(diag.code.as_deref(), Some("RST003"));
        assert_eq!(diag.line, Some(4));
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::warning("Unknown directive \"foo\"")
            .with_code(codes::UNKNOWN_DIRECTIVE)
            .with_file("guide")
            .with_line(3)
            .with_help("Register a handler for it");

        let display = format!("{}", diag);
        assert!(display.contains("warning[RST001]"));
        assert!(display.contains("guide:3"));
        assert!(display.contains("help: Register a handler for it"));
    }

    #[test]
    fn test_reporter_shares_state_between_clones() {
        let reporter = Reporter::new();
        let handle = reporter.clone();
        handle.warning(codes::UNRESOLVED_REFERENCE, "a", Some(1), "missing");
        reporter.report(Diagnostic::info("note"));

        assert_eq!(reporter.diagnostics().len(), 2);
        assert_eq!(reporter.problem_count(), 1);
        assert!(!reporter.has_errors());

        handle.error(codes::MISSING_INCLUDE, "a", None, "gone");
        assert!(reporter.has_errors());

        reporter.clear();
        assert!(handle.diagnostics().is_empty());
    }

    #[test]
    fn test_diagnostic_serialize() {
        let diag = Diagnostic::warning("Duplicate anchor").with_code(codes::DUPLICATE_ANCHOR);

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"severity\":\"warning\""));
        assert!(!json.contains("\"line\""));

        let restored: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, diag);
    }
}
