//! Inline elements for document content
//!
//! This module defines inline-level elements that appear within blocks,
//! such as text, emphasis, roles, hyperlinks and cross-references.

use serde::{Deserialize, Serialize};

/// Inline-level content element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum InlineNode {
    /// Plain text content
    Plain(String),
    /// Emphasised text (`*text*`)
    Emphasis(String),
    /// Strongly emphasised text (`**text**`)
    Strong(String),
    /// Inline literal (``` ``text`` ```)
    Literal(String),
    /// A text role that is not resolved into another inline kind
    Role(RoleNode),
    /// An external hyperlink
    Hyperlink(HyperlinkNode),
    /// A cross-reference resolved by the compiler
    Reference(ReferenceNode),
    /// A substitution reference (`|name|`)
    Variable(VariableNode),
    /// An inline image (Markdown only)
    Image(InlineImageNode),
    /// A no-break space
    Nbsp,
    /// A hard line break
    LineBreak,
}

/// A text role such as `:abbreviation:` or `:py:func:`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleNode {
    /// Optional domain (`py` in `:py:func:`)
    pub domain: Option<String>,
    /// Role name
    pub role: String,
    /// Raw content between the backticks
    pub content: String,
    /// Optional expanded text (e.g. abbreviation definitions)
    pub title: Option<String>,
}

/// An external hyperlink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperlinkNode {
    /// Link text
    pub text: String,
    /// Target URL
    pub url: String,
}

/// How a reference names its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// `:ref:` role, resolved against the project's anchor table
    Ref,
    /// `:doc:` role, resolved against document entries
    Doc,
    /// `name_` or `` `phrase`_ ``
    Named,
    /// `name__` or `` `phrase`__ ``
    Anonymous,
}

/// A cross-reference to an anchor, a document or a named link target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceNode {
    /// Reference kind
    pub kind: ReferenceKind,
    /// Target as written in the source
    pub target: String,
    /// Explicit link text, if any
    pub text: Option<String>,
    /// URL filled in by the reference resolver pass
    pub url: Option<String>,
    /// Title of the resolved target, used when no explicit text is given
    pub resolved_title: Option<String>,
}

impl ReferenceNode {
    /// Create an unresolved reference
    pub fn new(kind: ReferenceKind, target: impl Into<String>, text: Option<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            text,
            url: None,
            resolved_title: None,
        }
    }

    /// Whether a resolver has produced a URL for this reference
    pub fn is_resolved(&self) -> bool {
        self.url.is_some()
    }

    /// Text to display for this reference
    pub fn display_text(&self) -> &str {
        self.text
            .as_deref()
            .or(self.resolved_title.as_deref())
            .unwrap_or(&self.target)
    }
}

/// A substitution reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableNode {
    /// Substitution name
    pub name: String,
    /// Substituted content, once resolved
    pub value: Option<Vec<InlineNode>>,
}

/// An inline image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineImageNode {
    /// Image source
    pub src: String,
    /// Alternative text
    pub alt: String,
}

/// A sequence of inline nodes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InlineCompoundNode {
    /// Inline children in source order
    pub children: Vec<InlineNode>,
}

impl InlineCompoundNode {
    /// Create a compound from a list of inlines
    pub fn new(children: Vec<InlineNode>) -> Self {
        Self { children }
    }

    /// Create a compound holding a single plain text node
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            children: vec![InlineNode::Plain(text.into())],
        }
    }

    /// Check if the compound is empty
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Flatten the compound to plain text
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            push_plain_text(child, &mut out);
        }
        out
    }
}

fn push_plain_text(node: &InlineNode, out: &mut String) {
    match node {
        InlineNode::Plain(text)
        | InlineNode::Emphasis(text)
        | InlineNode::Strong(text)
        | InlineNode::Literal(text) => out.push_str(text),
        InlineNode::Role(role) => out.push_str(&role.content),
        InlineNode::Hyperlink(link) => out.push_str(&link.text),
        InlineNode::Reference(reference) => out.push_str(reference.display_text()),
        InlineNode::Variable(variable) => match &variable.value {
            Some(value) => value.iter().for_each(|inline| push_plain_text(inline, out)),
            None => {
                out.push('|');
                out.push_str(&variable.name);
                out.push('|');
            }
        },
        InlineNode::Image(image) => out.push_str(&image.alt),
        InlineNode::Nbsp => out.push('\u{a0}'),
        InlineNode::LineBreak => out.push('\n'),
    }
}
