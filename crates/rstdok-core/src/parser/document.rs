//! Whole-document parsing

use std::collections::BTreeMap;

use rstdok_ast::{DocumentNode, InlineCompoundNode, MetadataNode, Node};
use sha2::{Digest, Sha256};

use super::context::{BlockContext, DocumentParserContext};
use super::lines::expand_tabs;
use super::rules::Grammar;
use crate::diagnostics::Reporter;
use crate::error::ParseError;

/// Compute SHA-256 hash of source text, hex encoded
pub fn compute_source_hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let result = hasher.finalize();
    result.iter().map(|b| format!("{:02x}", b)).collect::<String>()
}

/// Normalise line endings, drop a byte order mark and expand tabs
pub fn split_lines(text: &str) -> Vec<String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(|line| expand_tabs(line).trim_end().to_string())
        .collect()
}

/// Runs the grammar over one document
pub struct DocumentParser<'a> {
    grammar: &'a Grammar,
    reporter: Reporter,
    default_code_language: Option<String>,
}

impl<'a> DocumentParser<'a> {
    pub fn new(grammar: &'a Grammar, reporter: Reporter) -> Self {
        Self {
            grammar,
            reporter,
            default_code_language: None,
        }
    }

    pub fn with_default_code_language(mut self, language: Option<String>) -> Self {
        self.default_code_language = language;
        self
    }

    fn context(&self, file_path: &str) -> DocumentParserContext {
        let mut context = DocumentParserContext::new(file_path, self.reporter.clone());
        context.default_code_language = self.default_code_language.clone();
        context
    }

    /// Parse a complete document, sections included
    pub fn parse(&self, file_path: &str, text: &str) -> Result<DocumentNode, ParseError> {
        let mut document = DocumentNode::new(file_path, compute_source_hash(text));
        let mut context = self.context(file_path);

        let children = {
            let mut block = BlockContext::new(&mut context, split_lines(text), 0);
            self.grammar.structural.parse(&mut block, self.grammar)?
        };

        document.children = children;
        document.links = context.links;
        document.title_letters = context.title_letters;
        extract_docinfo(&mut document);

        tracing::debug!(
            file = file_path,
            nodes = document.children.len(),
            title_levels = document.title_letters.len(),
            "Parsed document"
        );
        Ok(document)
    }

    /// Parse an included file. Sections are recognised and continue the
    /// adornment hierarchy of the including document, which `title_letters`
    /// carries in and out.
    pub fn parse_included(
        &self,
        file_path: &str,
        text: &str,
        title_letters: &mut Vec<char>,
    ) -> Result<IncludedContent, ParseError> {
        let mut context = self.context(file_path);
        context.title_letters = std::mem::take(title_letters);

        let result = {
            let mut block = BlockContext::new(&mut context, split_lines(text), 0);
            self.grammar.structural.parse(&mut block, self.grammar)
        };
        *title_letters = context.title_letters;

        Ok(IncludedContent {
            nodes: result?,
            links: context.links,
        })
    }

    /// Parse body content only; section titles are not recognised
    pub fn parse_fragment(&self, file_path: &str, text: &str) -> Result<Vec<Node>, ParseError> {
        let mut context = self.context(file_path);
        let mut block = BlockContext::new(&mut context, split_lines(text), 0);
        self.grammar.body.parse(&mut block, self.grammar)
    }
}

/// Nodes and hyperlink targets read from an included file
#[derive(Debug, Default)]
pub struct IncludedContent {
    pub nodes: Vec<Node>,
    pub links: BTreeMap<String, String>,
}

/// Move a leading field list (the docinfo block) into the document headers.
///
/// The block may precede the title or directly follow it. `:orphan:` marks
/// the document instead of becoming a header.
fn extract_docinfo(document: &mut DocumentNode) {
    let fields = match take_leading_field_list(&mut document.children) {
        Some(fields) => fields,
        None => match document.children.iter_mut().find(|n| !matches!(n, Node::Comment(_))) {
            Some(Node::Section(section)) => match take_leading_field_list(&mut section.children) {
                Some(fields) => fields,
                None => return,
            },
            _ => return,
        },
    };

    for field in fields {
        let name = field.name.to_lowercase();
        if name == "orphan" {
            document.orphan = true;
            continue;
        }
        let value = field
            .value
            .into_iter()
            .filter_map(|node| match node {
                Node::Paragraph(paragraph) => Some(paragraph.content.children),
                _ => None,
            })
            .flatten()
            .collect();
        document.headers.push(MetadataNode {
            name,
            value: InlineCompoundNode::new(value),
        });
    }
}

fn take_leading_field_list(children: &mut Vec<Node>) -> Option<Vec<rstdok_ast::FieldListItem>> {
    let index = children.iter().position(|n| !matches!(n, Node::Comment(_)))?;
    if !matches!(children[index], Node::FieldList(_)) {
        return None;
    }
    match children.remove(index) {
        Node::FieldList(list) => Some(list.fields),
        _ => None,
    }
}
