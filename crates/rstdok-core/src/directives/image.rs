use rstdok_ast::{
    DirectiveNode, FigureNode, ImageNode, InlineCompoundNode, InlineImageNode, InlineNode, Node,
};

use super::{classes, DirectiveContext, DirectiveHandler};
use crate::diagnostics::codes;
use crate::error::ParseError;

const ALIGNMENTS: &[&str] = &["left", "center", "right", "top", "middle", "bottom"];

fn image_node(directive: &DirectiveNode, context: &DirectiveContext<'_>) -> ImageNode {
    let option = |name: &str| directive.option(name).map(str::to_string).filter(|v| !v.is_empty());

    let align = option("align").filter(|align| {
        let valid = ALIGNMENTS.contains(&align.as_str());
        if !valid {
            context.warning(
                codes::INVALID_OPTION,
                directive,
                format!("Invalid :align: value '{}'", align),
            );
        }
        valid
    });

    ImageNode {
        src: directive.data.trim().to_string(),
        alt: option("alt"),
        width: option("width"),
        height: option("height"),
        align,
        target: option("target"),
        classes: classes(directive),
    }
}

/// `.. image:: path`; as `.. |name| image::` it defines an inline image
pub struct ImageDirective;

impl DirectiveHandler for ImageDirective {
    fn name(&self) -> &'static str {
        "image"
    }

    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError> {
        let image = image_node(directive, context);

        if let Some(name) = &directive.variable {
            let inline = InlineNode::Image(InlineImageNode {
                alt: image.alt.clone().unwrap_or_else(|| name.clone()),
                src: image.src,
            });
            context
                .state
                .variables
                .insert(name.clone(), InlineCompoundNode::new(vec![inline]));
            return Ok(None);
        }

        Ok(Some(Node::Image(image)))
    }
}

/// `.. figure:: path` with the body as caption and legend
pub struct FigureDirective;

impl DirectiveHandler for FigureDirective {
    fn name(&self) -> &'static str {
        "figure"
    }

    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError> {
        let image = image_node(directive, context);
        let caption = context.parse_nested(&directive.content, directive.line)?;
        Ok(Some(Node::Figure(FigureNode { image, caption })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::tests::{directive, run};
    use crate::fs::MemoryFilesystem;

    #[test]
    fn test_image_options() {
        let mut raw = directive("image", "img/logo.png", "");
        raw.options.insert("alt".to_string(), "Logo".to_string());
        raw.options.insert("align".to_string(), "sideways".to_string());
        let (node, _, reporter) = run(&raw, &MemoryFilesystem::new(), "index");

        let Some(Node::Image(image)) = node else {
            panic!("expected an image");
        };
        assert_eq!(image.src, "img/logo.png");
        assert_eq!(image.alt.as_deref(), Some("Logo"));
        assert_eq!(image.align, None);
        assert_eq!(reporter.problem_count(), 1);
    }

    #[test]
    fn test_substitution_image() {
        let mut raw = directive("image", "logo.png", "");
        raw.variable = Some("logo".to_string());
        let (node, state, _) = run(&raw, &MemoryFilesystem::new(), "index");
        assert!(node.is_none());
        assert!(state.variables.contains_key("logo"));
    }

    #[test]
    fn test_figure_caption() {
        let raw = directive("figure", "chart.svg", "The *chart*.");
        let (node, _, _) = run(&raw, &MemoryFilesystem::new(), "index");
        let Some(Node::Figure(figure)) = node else {
            panic!("expected a figure");
        };
        assert_eq!(figure.image.src, "chart.svg");
        assert_eq!(figure.caption.len(), 1);
    }
}
