//! Error types for rstdok-core

use thiserror::Error;

/// Fatal parse failure
///
/// Everything recoverable is reported through the [`Reporter`](crate::Reporter)
/// instead; this is only raised when no production rule applies at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// No production rule accepted the line at the cursor
    #[error("No rule applies to line {line} of {file}: {content:?}")]
    NoRuleApplies {
        file: String,
        line: usize,
        content: String,
    },

    /// The input format was compiled out
    #[error("Input format '{format}' is not supported by this build ({file})")]
    UnsupportedFormat { file: String, format: String },
}

/// A compiler pass failed; the compile is aborted
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Compiler pass '{pass}' failed: {message}")]
pub struct CompilerError {
    /// Name of the failing pass
    pub pass: String,
    /// Failure description
    pub message: String,
}

impl CompilerError {
    pub fn new(pass: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pass: pass.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur in rstdok operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A file requested from the filesystem capability does not exist
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Fatal parse error
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Compiler pass failure
    #[error(transparent)]
    Compile(#[from] CompilerError),

    /// Rendering failed
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Template engine failure
    #[error("Template error: {0}")]
    Template(String),

    /// Invalid glob pattern
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Serialisation failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The build logged warnings or errors and is configured to fail on them
    #[error("Build failed: {0} problem(s) were logged")]
    FailOnLog(usize),
}

/// Result type for rstdok operations
pub type Result<T> = std::result::Result<T, Error>;
