//! reStructuredText and Markdown parsing
//!
//! The parser is line oriented: a [`Grammar`] holds two ordered containers of
//! production [`Rule`]s (one for document/section level, one for nested
//! bodies) and the inline parser used for paragraphs, titles and cells.
//!
//! # Example
//!
//! ```
//! use rstdok_core::parser::{InputFormat, Parser};
//!
//! let doc = Parser::new()
//!     .parse("Title\n=====\n\nHello *world*.\n", InputFormat::Rst)
//!     .unwrap();
//! assert_eq!(doc.title().map(|t| t.text()), Some("Title".to_string()));
//! ```

pub mod context;
pub mod document;
pub mod inline;
pub mod lines;
#[cfg(feature = "markdown")]
pub mod markdown;
pub mod rules;

use std::sync::Arc;

use rstdok_ast::{DocumentNode, Node};
use serde::{Deserialize, Serialize};

use crate::diagnostics::Reporter;
use crate::error::{ParseError, Result};
use crate::fs::{strip_extension, Filesystem};

pub use context::{BlockContext, DocumentParserContext};
pub use document::{DocumentParser, IncludedContent};
pub use inline::InlineParser;
pub use rules::{Grammar, Rule, RuleContainer};

/// Source markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InputFormat {
    /// reStructuredText
    #[default]
    #[serde(rename = "rst", alias = "rest")]
    Rst,
    /// CommonMark with tables
    #[serde(rename = "md", alias = "markdown")]
    Markdown,
}

impl InputFormat {
    /// Format of a source path, by extension
    pub fn from_path(path: &str) -> Option<Self> {
        let extension = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())?;
        match extension.as_str() {
            "rst" | "rest" | "txt" => Some(InputFormat::Rst),
            "md" | "markdown" => Some(InputFormat::Markdown),
            _ => None,
        }
    }

    /// Whether `path` is a source document of this format. Only the
    /// canonical extension counts, so included `.txt` files and the like
    /// are not published as pages.
    pub fn is_source(self, path: &str) -> bool {
        path.rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(self.extension()))
    }

    /// Canonical file extension
    pub fn extension(self) -> &'static str {
        match self {
            InputFormat::Rst => "rst",
            InputFormat::Markdown => "md",
        }
    }
}

/// Document parser entry point
///
/// Cloning is cheap: clones share the grammar and the reporter.
#[derive(Debug, Clone)]
pub struct Parser {
    grammar: Arc<Grammar>,
    reporter: Reporter,
    default_code_language: Option<String>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Parser with the default grammar
    pub fn new() -> Self {
        Self::with_grammar(Grammar::new())
    }

    /// Parser with a custom grammar
    pub fn with_grammar(grammar: Grammar) -> Self {
        Self {
            grammar: Arc::new(grammar),
            reporter: Reporter::new(),
            default_code_language: None,
        }
    }

    /// Report recoverable problems into `reporter`
    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Language assigned to literal blocks
    pub fn with_default_code_language(mut self, language: Option<String>) -> Self {
        self.default_code_language = language;
        self
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Parse source text that has no path
    pub fn parse(&self, text: &str, format: InputFormat) -> std::result::Result<DocumentNode, ParseError> {
        self.parse_document("", text, format)
    }

    /// Parse source text as the document at `file_path` (extension-less)
    pub fn parse_document(
        &self,
        file_path: &str,
        text: &str,
        format: InputFormat,
    ) -> std::result::Result<DocumentNode, ParseError> {
        tracing::debug!(file = file_path, ?format, "Parsing document");
        match format {
            InputFormat::Rst => self.document_parser().parse(file_path, text),
            #[cfg(feature = "markdown")]
            InputFormat::Markdown => Ok(markdown::parse(file_path, text)),
            #[cfg(not(feature = "markdown"))]
            InputFormat::Markdown => Err(ParseError::UnsupportedFormat {
                file: file_path.to_string(),
                format: "md".to_string(),
            }),
        }
    }

    /// Read and parse a source file; the format follows the extension
    pub fn parse_file(&self, fs: &dyn Filesystem, path: &str) -> Result<DocumentNode> {
        let text = fs.read(path)?;
        let format = InputFormat::from_path(path).unwrap_or_default();
        Ok(self.parse_document(&strip_extension(path), &text, format)?)
    }

    /// Parse reStructuredText body content, as found in directive bodies.
    /// Sections are not recognised.
    pub fn parse_fragment(
        &self,
        text: &str,
        file_path: &str,
    ) -> std::result::Result<Vec<Node>, ParseError> {
        self.document_parser().parse_fragment(file_path, text)
    }

    /// Parse the text of an included file, sections included, continuing
    /// the adornment hierarchy in `title_letters`
    pub fn parse_included(
        &self,
        text: &str,
        file_path: &str,
        title_letters: &mut Vec<char>,
    ) -> std::result::Result<IncludedContent, ParseError> {
        self.document_parser()
            .parse_included(file_path, text, title_letters)
    }

    fn document_parser(&self) -> DocumentParser<'_> {
        DocumentParser::new(&self.grammar, self.reporter.clone())
            .with_default_code_language(self.default_code_language.clone())
    }
}

/// Anchor id for a title or label: lower-case alphanumerics separated by
/// single dashes
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Reference name normalisation: case-folded, whitespace collapsed
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
