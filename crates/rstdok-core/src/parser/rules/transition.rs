use rstdok_ast::Node;

use super::section::adornment;
use super::{Grammar, Rule};
use crate::error::ParseError;
use crate::parser::context::BlockContext;
use crate::parser::lines::is_blank;

/// Minimum length of a transition line
const MIN_TRANSITION_LENGTH: usize = 4;

/// A line of four or more repeated punctuation characters, standing alone
pub struct TransitionRule;

impl Rule for TransitionRule {
    fn name(&self) -> &'static str {
        "transition"
    }

    fn applies(&self, context: &BlockContext<'_>) -> bool {
        let Some(line) = context.current() else {
            return false;
        };
        let long_enough = adornment(line).is_some_and(|(_, len)| len >= MIN_TRANSITION_LENGTH);
        long_enough && context.lines.peek(1).map_or(true, is_blank)
    }

    fn apply(
        &self,
        context: &mut BlockContext<'_>,
        _grammar: &Grammar,
    ) -> Result<Option<Node>, ParseError> {
        context.lines.advance();
        Ok(Some(Node::Separator))
    }
}
