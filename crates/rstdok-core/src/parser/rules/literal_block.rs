use rstdok_ast::{CodeNode, Node};

use super::{Grammar, Rule};
use crate::error::ParseError;
use crate::parser::context::BlockContext;
use crate::parser::lines::{dedent, indentation, trim_blank_edges};

/// Indented block following a paragraph that ended with `::`
pub struct LiteralBlockRule;

impl Rule for LiteralBlockRule {
    fn name(&self) -> &'static str {
        "literal_block"
    }

    fn applies(&self, context: &BlockContext<'_>) -> bool {
        context.next_literal && context.current().is_some_and(|l| indentation(l) > 0)
    }

    fn apply(
        &self,
        context: &mut BlockContext<'_>,
        _grammar: &Grammar,
    ) -> Result<Option<Node>, ParseError> {
        let block = context.lines.take_indented(1);
        let value = trim_blank_edges(dedent(&block)).join("\n");

        Ok(Some(Node::Code(CodeNode {
            value,
            language: context.document.default_code_language.clone(),
            ..Default::default()
        })))
    }
}
