//! Inline markup parsing
//!
//! [`InlineParser`] tokenizes a run of text and feeds it through the
//! [`InlineRule`] list until every token has been turned into a node.

pub mod lexer;
pub mod roles;
pub mod rules;

use std::fmt;
use std::sync::Arc;

use rstdok_ast::{InlineCompoundNode, InlineNode};

pub use lexer::{Token, TokenKind, TokenStream};
pub use rules::InlineRule;

/// Parses inline markup with a fixed, ordered rule set
#[derive(Clone)]
pub struct InlineParser {
    rules: Arc<Vec<Box<dyn InlineRule>>>,
}

impl fmt::Debug for InlineParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.rules.iter().map(|r| r.name()).collect();
        f.debug_struct("InlineParser").field("rules", &names).finish()
    }
}

impl Default for InlineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InlineParser {
    /// Parser with the default rules
    pub fn new() -> Self {
        Self::with_rules(rules::default_rules())
    }

    /// Parser with a custom rule list, tried in order
    pub fn with_rules(rules: Vec<Box<dyn InlineRule>>) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    /// Parse inline text
    pub fn parse(&self, text: &str) -> InlineCompoundNode {
        let mut stream = TokenStream::from_text(text);
        let mut nodes = Vec::new();

        while !stream.is_at_end() {
            let mut produced = None;
            for rule in self.rules.iter() {
                if !rule.applies(&stream) {
                    continue;
                }
                if let Some(node) = rule.apply(&mut stream) {
                    produced = Some(node);
                    break;
                }
            }
            let node = match produced {
                Some(node) => node,
                // no fallback configured: keep the raw token
                None => match stream.next_token() {
                    Some(token) => InlineNode::Plain(token.value().to_string()),
                    None => break,
                },
            };
            push_merged(&mut nodes, node);
        }

        InlineCompoundNode::new(nodes)
    }
}

fn push_merged(nodes: &mut Vec<InlineNode>, node: InlineNode) {
    if let InlineNode::Plain(text) = &node {
        if let Some(InlineNode::Plain(previous)) = nodes.last_mut() {
            previous.push_str(text);
            return;
        }
    }
    nodes.push(node);
}
