//! Parser state
//!
//! A [`DocumentParserContext`] lives for one top-level parse (or one
//! recursive sub-parse) and collects what the production rules learn about
//! the document. A [`BlockContext`] is the line cursor a rule container
//! works on; nested blocks get their own cursor over the same document
//! context.

use std::collections::BTreeMap;

use crate::diagnostics::Reporter;
use crate::fs::dirname;
use crate::parser::lines::LinesIterator;

/// State shared by every rule while one document is parsed
#[derive(Debug, Clone, Default)]
pub struct DocumentParserContext {
    /// Document path without extension
    pub file_path: String,
    /// Directory of the document, relative to the source root
    pub directory: String,
    /// Title adornment characters in order of first appearance
    pub title_letters: Vec<char>,
    /// External hyperlink targets
    pub links: BTreeMap<String, String>,
    /// Sink for recoverable problems
    pub reporter: Reporter,
    /// Language given to literal blocks
    pub default_code_language: Option<String>,
}

impl DocumentParserContext {
    pub fn new(file_path: impl Into<String>, reporter: Reporter) -> Self {
        let file_path = file_path.into();
        Self {
            directory: dirname(&file_path),
            file_path,
            title_letters: Vec::new(),
            links: BTreeMap::new(),
            reporter,
            default_code_language: None,
        }
    }

    /// Section level of an adornment character, 1-based.
    ///
    /// Characters that were not seen yet get the next free level without
    /// being registered.
    pub fn title_level(&self, letter: char) -> usize {
        self.title_letters
            .iter()
            .position(|c| *c == letter)
            .map(|p| p + 1)
            .unwrap_or(self.title_letters.len() + 1)
    }

    /// Register an adornment character and return its level
    pub fn register_title_letter(&mut self, letter: char) -> usize {
        if !self.title_letters.contains(&letter) {
            self.title_letters.push(letter);
        }
        self.title_level(letter)
    }
}

/// Line cursor for one block context
pub struct BlockContext<'a> {
    pub document: &'a mut DocumentParserContext,
    pub lines: LinesIterator,
    /// The previous paragraph ended with `::`
    pub next_literal: bool,
}

impl<'a> BlockContext<'a> {
    pub fn new(document: &'a mut DocumentParserContext, lines: Vec<String>, offset: usize) -> Self {
        Self {
            document,
            lines: LinesIterator::new(lines, offset),
            next_literal: false,
        }
    }

    /// Cursor over a nested block sharing this document context
    pub fn child(&mut self, lines: Vec<String>, offset: usize) -> BlockContext<'_> {
        BlockContext::new(&mut *self.document, lines, offset)
    }

    /// Current line
    pub fn current(&self) -> Option<&str> {
        self.lines.current()
    }

    /// 1-based source line of the cursor, for diagnostics
    pub fn line_number(&self) -> usize {
        self.lines.source_line() + 1
    }

    /// Report a warning at the cursor
    pub fn warning(&self, code: &str, message: impl Into<String>) {
        self.document.reporter.warning(
            code,
            &self.document.file_path,
            Some(self.line_number()),
            message,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_levels_follow_first_appearance() {
        let mut context = DocumentParserContext::new("guide/index", Reporter::new());
        assert_eq!(context.directory, "guide");
        assert_eq!(context.register_title_letter('='), 1);
        assert_eq!(context.register_title_letter('-'), 2);
        assert_eq!(context.register_title_letter('='), 1);
        assert_eq!(context.title_level('~'), 3);
        assert_eq!(context.title_letters, vec!['=', '-']);
    }
}
