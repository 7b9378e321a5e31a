use rstdok_ast::{Node, ParagraphNode};

use super::{Grammar, Rule};
use crate::error::ParseError;
use crate::parser::context::BlockContext;

/// Contiguous non-blank lines; the fallback rule
///
/// A trailing `::` announces a literal block: `text::` keeps one colon,
/// `text ::` drops both and a lone `::` produces no paragraph at all.
pub struct ParagraphRule;

impl Rule for ParagraphRule {
    fn name(&self) -> &'static str {
        "paragraph"
    }

    fn applies(&self, context: &BlockContext<'_>) -> bool {
        context.current().is_some()
    }

    fn apply(
        &self,
        context: &mut BlockContext<'_>,
        grammar: &Grammar,
    ) -> Result<Option<Node>, ParseError> {
        let lines = context.lines.take_until_blank();
        let mut text = lines
            .iter()
            .map(|l| l.trim())
            .collect::<Vec<_>>()
            .join("\n");

        if let Some(stripped) = text.strip_suffix("::") {
            context.next_literal = true;
            if stripped.trim().is_empty() {
                return Ok(None);
            }
            text = if stripped.ends_with(char::is_whitespace) {
                stripped.trim_end().to_string()
            } else {
                format!("{}:", stripped)
            };
        }

        Ok(Some(Node::Paragraph(ParagraphNode {
            content: grammar.inline.parse(&text),
        })))
    }
}
