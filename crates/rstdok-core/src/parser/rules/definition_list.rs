use rstdok_ast::{DefinitionListItem, DefinitionListNode, Node};

use super::{Grammar, Rule};
use crate::error::ParseError;
use crate::parser::context::BlockContext;
use crate::parser::lines::{dedent, indentation, is_blank, LinesIterator};

/// Term line directly followed by an indented definition
fn is_term_at(lines: &LinesIterator, n: usize) -> bool {
    match (lines.peek(n), lines.peek(n + 1)) {
        (Some(term), Some(definition)) => {
            !is_blank(term)
                && indentation(term) == 0
                && !is_blank(definition)
                && indentation(definition) > 0
        }
        _ => false,
    }
}

/// `term : classifier` lines with indented definitions
pub struct DefinitionListRule;

impl Rule for DefinitionListRule {
    fn name(&self) -> &'static str {
        "definition_list"
    }

    fn applies(&self, context: &BlockContext<'_>) -> bool {
        is_term_at(&context.lines, 0)
    }

    fn apply(
        &self,
        context: &mut BlockContext<'_>,
        grammar: &Grammar,
    ) -> Result<Option<Node>, ParseError> {
        let mut items = Vec::new();

        while is_term_at(&context.lines, 0) {
            let term_line = context.lines.advance().unwrap_or_default();
            let mut parts = term_line.split(" : ").map(str::trim);
            let term = grammar.inline.parse(parts.next().unwrap_or_default());
            let classifiers = parts.map(|c| grammar.inline.parse(c)).collect();

            let offset = context.lines.source_line();
            let definition = dedent(&context.lines.take_indented(1));
            let definitions = grammar.parse_nested(context, definition, offset)?;

            items.push(DefinitionListItem {
                term,
                classifiers,
                definitions,
            });

            let blanks = context.lines.remaining().iter().take_while(|l| is_blank(l)).count();
            if !is_term_at(&context.lines, blanks) {
                break;
            }
            context.lines.skip(blanks);
        }

        Ok(Some(Node::DefinitionList(DefinitionListNode { items })))
    }
}
