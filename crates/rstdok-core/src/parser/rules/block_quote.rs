use rstdok_ast::{Node, QuoteNode};

use super::{Grammar, Rule};
use crate::error::ParseError;
use crate::parser::context::BlockContext;
use crate::parser::lines::{dedent, indentation};

/// Indented block not announced as literal
pub struct BlockQuoteRule;

impl Rule for BlockQuoteRule {
    fn name(&self) -> &'static str {
        "block_quote"
    }

    fn applies(&self, context: &BlockContext<'_>) -> bool {
        context.current().is_some_and(|l| indentation(l) > 0)
    }

    fn apply(
        &self,
        context: &mut BlockContext<'_>,
        grammar: &Grammar,
    ) -> Result<Option<Node>, ParseError> {
        let offset = context.lines.source_line();
        let block = dedent(&context.lines.take_indented(1));
        let children = grammar.parse_nested(context, block, offset)?;
        Ok(Some(Node::Quote(QuoteNode { children })))
    }
}
