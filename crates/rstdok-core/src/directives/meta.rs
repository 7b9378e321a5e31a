use rstdok_ast::{DirectiveNode, InlineCompoundNode, MetadataNode, Node};

use super::{DirectiveContext, DirectiveHandler};
use crate::error::ParseError;

/// `.. meta::` options become document header metadata
pub struct MetaDirective;

impl DirectiveHandler for MetaDirective {
    fn name(&self) -> &'static str {
        "meta"
    }

    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError> {
        for (name, value) in &directive.options {
            context.state.headers.push(MetadataNode {
                name: name.clone(),
                value: InlineCompoundNode::plain(value.clone()),
            });
        }
        Ok(None)
    }
}
