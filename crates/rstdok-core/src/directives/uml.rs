use rstdok_ast::{DirectiveNode, Node, UmlNode};

use super::{classes, DirectiveContext, DirectiveHandler};
use crate::diagnostics::codes;
use crate::error::ParseError;

/// `.. uml::` with an inline diagram body, or the file named by the argument
/// when the body is empty. Rendering the diagram is left to the renderer.
pub struct UmlDirective;

impl DirectiveHandler for UmlDirective {
    fn name(&self) -> &'static str {
        "uml"
    }

    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError> {
        let mut caption = directive.option("caption").map(str::to_string);

        let source = if directive.content.trim().is_empty() {
            let path = context.resolve_path(&directive.data);
            match context.filesystem.read(&path) {
                Ok(source) => {
                    context.state.add_dependency(path);
                    source
                }
                Err(err) => {
                    context.error(
                        codes::MISSING_FILE,
                        directive,
                        format!("Cannot read diagram '{}': {}", path, err),
                    );
                    return Ok(None);
                }
            }
        } else {
            // with an inline body the argument is the caption
            if caption.is_none() && !directive.data.trim().is_empty() {
                caption = Some(directive.data.trim().to_string());
            }
            directive.content.clone()
        };

        Ok(Some(Node::Uml(UmlNode {
            source: source.trim_end().to_string(),
            caption,
            classes: classes(directive),
        })))
    }
}
