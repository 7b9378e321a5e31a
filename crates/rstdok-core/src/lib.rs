//! rstdok-core - reStructuredText documentation toolchain
//!
//! Core library for rstdok: parses reStructuredText (and Markdown) into the
//! `rstdok_ast` node model, runs the compiler pass pipeline that resolves
//! directives, link targets, tables of contents and references, and renders
//! the result to HTML.
//!
//! # Example
//!
//! ```
//! use rstdok_core::parser::{InputFormat, Parser};
//! use rstdok_ast::Node;
//!
//! let parser = Parser::new();
//! let doc = parser
//!     .parse("Hello\n=====\n\nSome *emphasis* here.\n", InputFormat::Rst)
//!     .unwrap();
//!
//! assert_eq!(doc.title().map(|t| t.text()), Some("Hello".to_string()));
//! assert!(matches!(doc.children[0], Node::Section(_)));
//! ```

pub mod batch;
pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod directives;
pub mod error;
pub mod events;
pub mod fs;
pub mod incremental;
pub mod parser;
pub mod project;
pub mod render;

// Re-export main types and functions
pub use batch::{parse_directory, BatchOptions, BatchResult};
pub use compiler::{Compiler, CompilerPass, NodeTransformer, UrlGenerator};
pub use config::ProjectSettings;
pub use diagnostics::{Diagnostic, Reporter, Severity};
pub use error::{CompilerError, Error, ParseError, Result};
pub use fs::{Filesystem, LocalFilesystem, MemoryFilesystem};
pub use incremental::BuildCache;
pub use parser::{InputFormat, Parser};
pub use project::{BuildOutcome, ProjectBuilder};
pub use render::{render_project, RendererRegistry};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }
}
