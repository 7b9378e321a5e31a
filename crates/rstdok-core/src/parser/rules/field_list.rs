use std::sync::OnceLock;

use regex::Regex;
use rstdok_ast::{FieldListItem, FieldListNode, Node};

use super::{Grammar, Rule};
use crate::error::ParseError;
use crate::parser::context::BlockContext;
use crate::parser::lines::{dedent, is_blank};

static FIELD_RE: OnceLock<Regex> = OnceLock::new();

fn field_re() -> &'static Regex {
    FIELD_RE.get_or_init(|| Regex::new(r"^:([^:\s][^:]*):(?:\s+(.*))?$").unwrap())
}

/// `:name: value` fields; the value may continue on indented lines
pub struct FieldListRule;

impl Rule for FieldListRule {
    fn name(&self) -> &'static str {
        "field_list"
    }

    fn applies(&self, context: &BlockContext<'_>) -> bool {
        context.current().is_some_and(|l| field_re().is_match(l))
    }

    fn apply(
        &self,
        context: &mut BlockContext<'_>,
        grammar: &Grammar,
    ) -> Result<Option<Node>, ParseError> {
        let mut fields = Vec::new();

        while let Some(caps) = context.current().and_then(|l| field_re().captures(l)) {
            let name = caps[1].trim().to_string();
            let first = caps.get(2).map(|m| m.as_str().trim().to_string()).unwrap_or_default();

            let offset = context.lines.source_line();
            context.lines.advance();
            let mut lines = vec![first];
            lines.extend(dedent(&context.lines.take_indented(1)));
            let value = grammar.parse_nested(context, lines, offset)?;
            fields.push(FieldListItem { name, value });

            let blanks = context.lines.remaining().iter().take_while(|l| is_blank(l)).count();
            let next_is_field = context
                .lines
                .peek(blanks)
                .is_some_and(|l| field_re().is_match(l));
            if !next_is_field {
                break;
            }
            context.lines.skip(blanks);
        }

        Ok(Some(Node::FieldList(FieldListNode { fields })))
    }
}
