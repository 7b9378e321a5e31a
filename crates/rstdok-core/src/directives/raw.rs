use rstdok_ast::{DirectiveNode, Node, RawNode};

use super::{DirectiveContext, DirectiveHandler};
use crate::diagnostics::codes;
use crate::error::ParseError;

/// `.. raw:: html` passes its body through for one output format
pub struct RawDirective;

impl DirectiveHandler for RawDirective {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError> {
        let format = directive.data.trim().to_lowercase();
        if format.is_empty() {
            context.warning(
                codes::INVALID_OPTION,
                directive,
                "The raw directive requires an output format",
            );
            return Ok(None);
        }

        Ok(Some(Node::Raw(RawNode {
            format,
            content: directive.content.clone(),
        })))
    }
}
