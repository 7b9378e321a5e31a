//! Document root and metadata definitions
//!
//! This module defines the root of one parsed source file, together with the
//! header metadata collected from its docinfo field list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::block::{Node, SectionNode, TitleNode, TocNode};
use crate::inline::InlineCompoundNode;

/// A header metadata field (author, date, version, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataNode {
    /// Lower-cased field name
    pub name: String,
    /// Field value
    pub value: InlineCompoundNode,
}

/// Root of one parsed source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    /// Path relative to the source root, without extension
    pub file_path: String,
    /// SHA-256 of the source text, hex encoded
    pub hash: String,
    /// Document content
    pub children: Vec<Node>,
    /// Header metadata
    pub headers: Vec<MetadataNode>,
    /// Toctrees declared in this document, collected by the compiler
    pub toc_declarations: Vec<TocNode>,
    /// Files this document depends on (includes, diagrams, ...)
    pub dependencies: Vec<String>,
    /// Substitution definitions
    pub variables: BTreeMap<String, InlineCompoundNode>,
    /// External hyperlink targets (`.. _name: url`)
    pub links: BTreeMap<String, String>,
    /// Documents marked `:orphan:` are allowed outside any toctree
    pub orphan: bool,
    /// Section adornment characters in the order they were first seen;
    /// included files continue this hierarchy
    #[serde(default)]
    pub title_letters: Vec<char>,
}

impl DocumentNode {
    /// Create an empty document
    pub fn new(file_path: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            hash: hash.into(),
            children: Vec::new(),
            headers: Vec::new(),
            toc_declarations: Vec::new(),
            dependencies: Vec::new(),
            variables: BTreeMap::new(),
            links: BTreeMap::new(),
            orphan: false,
            title_letters: Vec::new(),
        }
    }

    /// Add a node to the document
    pub fn push(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Check if the document has no content
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The first top-level section title
    pub fn title(&self) -> Option<&TitleNode> {
        self.children.iter().find_map(|node| match node {
            Node::Section(section) => Some(&section.title),
            _ => None,
        })
    }

    /// Top-level sections
    pub fn sections(&self) -> impl Iterator<Item = &SectionNode> {
        self.children.iter().filter_map(|node| match node {
            Node::Section(section) => Some(section),
            _ => None,
        })
    }

    /// Header value by name
    pub fn header(&self, name: &str) -> Option<&MetadataNode> {
        self.headers.iter().find(|h| h.name == name)
    }

    /// Record a dependency once
    pub fn add_dependency(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.dependencies.contains(&path) {
            self.dependencies.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ParagraphNode;

    fn section(title: &str) -> Node {
        Node::Section(SectionNode {
            title: TitleNode {
                level: 1,
                id: title.to_lowercase(),
                content: InlineCompoundNode::plain(title),
            },
            children: vec![],
        })
    }

    #[test]
    fn test_empty_document() {
        let doc = DocumentNode::new("index", "abc");
        assert!(doc.is_empty());
        assert!(doc.title().is_none());
    }

    #[test]
    fn test_document_title_is_first_section() {
        let mut doc = DocumentNode::new("index", "abc");
        doc.push(Node::Paragraph(ParagraphNode::default()));
        doc.push(section("Intro"));
        doc.push(section("Second"));
        assert_eq!(doc.title().map(|t| t.text()), Some("Intro".to_string()));
        assert_eq!(doc.sections().count(), 2);
    }

    #[test]
    fn test_dependencies_are_unique() {
        let mut doc = DocumentNode::new("index", "abc");
        doc.add_dependency("part.rst");
        doc.add_dependency("part.rst");
        assert_eq!(doc.dependencies, vec!["part.rst".to_string()]);
    }

    #[test]
    fn test_header_lookup() {
        let mut doc = DocumentNode::new("index", "abc");
        doc.headers.push(MetadataNode {
            name: "author".to_string(),
            value: InlineCompoundNode::plain("Ada"),
        });
        assert_eq!(
            doc.header("author").map(|h| h.value.to_plain_text()),
            Some("Ada".to_string())
        );
        assert!(doc.header("date").is_none());
    }
}
