//! rstdok CLI - Command-line interface library
//!
//! This library provides the CLI functionality for rstdok:
//! - Build: parse, compile and render a source tree to HTML
//! - Check: parse and compile a source tree, reporting diagnostics
//!
//! # Library Usage
//!
//! ```ignore
//! use rstdok_cli::{build_command, BuildArgs};
//!
//! let outcome = build_command(&BuildArgs::new("docs", "_build/html"))?;
//! println!("{} pages written", outcome.written.len());
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Render docs/ into _build/html
//! rstdok build docs --output _build/html
//!
//! # Report problems as JSON
//! rstdok check docs --format json
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{build_command, check_command, load_settings};
pub use app::{run_cli, BuildArgs, OutputFormat, SourceFormat, CONFIG_FILE};
