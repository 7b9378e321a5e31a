use rstdok_ast::{ContentsNode, DirectiveNode, Node};

use super::{DirectiveContext, DirectiveHandler};
use crate::error::ParseError;

/// `.. contents:: Title`; entries are filled in by the compiler
pub struct ContentsDirective;

impl DirectiveHandler for ContentsDirective {
    fn name(&self) -> &'static str {
        "contents"
    }

    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError> {
        Ok(Some(Node::Contents(ContentsNode {
            title: Some(directive.data.trim().to_string()).filter(|t| !t.is_empty()),
            depth: context.option_usize(directive, "depth"),
            local: directive.has_option("local"),
            entries: Vec::new(),
        })))
    }
}
