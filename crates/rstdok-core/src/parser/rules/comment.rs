use rstdok_ast::{CommentNode, Node};

use super::{Grammar, Rule};
use crate::error::ParseError;
use crate::parser::context::BlockContext;
use crate::parser::lines::{dedent, is_blank, trim_blank_edges};

/// Whether a line starts explicit markup (`..` followed by whitespace)
pub fn is_explicit_markup(line: &str) -> bool {
    line == ".." || line.starts_with(".. ")
}

/// Explicit markup that is neither a directive nor a target
pub struct CommentRule;

impl Rule for CommentRule {
    fn name(&self) -> &'static str {
        "comment"
    }

    fn applies(&self, context: &BlockContext<'_>) -> bool {
        context.current().is_some_and(|l| is_explicit_markup(l.trim_end()))
    }

    fn apply(
        &self,
        context: &mut BlockContext<'_>,
        _grammar: &Grammar,
    ) -> Result<Option<Node>, ParseError> {
        let first = context.lines.advance().unwrap_or_default();
        let first = first
            .trim_end()
            .strip_prefix("..")
            .unwrap_or_default()
            .trim()
            .to_string();

        // an empty comment followed by a blank line ends right there
        if first.is_empty() && context.current().map_or(true, is_blank) {
            return Ok(Some(Node::Comment(CommentNode {
                value: String::new(),
            })));
        }

        let mut lines = vec![first];
        lines.extend(dedent(&context.lines.take_indented(1)));
        Ok(Some(Node::Comment(CommentNode {
            value: trim_blank_edges(lines).join("\n"),
        })))
    }
}
