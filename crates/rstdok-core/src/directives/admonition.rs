use std::sync::Arc;

use rstdok_ast::{AdmonitionNode, DirectiveNode, Node};

use super::{classes, DirectiveContext, DirectiveHandler};
use crate::diagnostics::codes;
use crate::error::ParseError;

/// Admonition kinds with a fixed title
pub const ADMONITIONS: &[&str] = &[
    "attention",
    "caution",
    "danger",
    "error",
    "hint",
    "important",
    "note",
    "seealso",
    "tip",
    "warning",
];

/// `.. note::` and friends; the argument, if any, is the first paragraph
pub struct AdmonitionDirective {
    name: &'static str,
}

impl AdmonitionDirective {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl DirectiveHandler for AdmonitionDirective {
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError> {
        let mut body = directive.data.clone();
        if !directive.content.is_empty() {
            if !body.is_empty() {
                body.push_str("\n\n");
            }
            body.push_str(&directive.content);
        }

        Ok(Some(Node::Admonition(AdmonitionNode {
            name: self.name.to_string(),
            title: None,
            classes: classes(directive),
            children: context.parse_nested(&body, directive.line)?,
        })))
    }
}

/// `.. admonition:: Title` with a custom title
pub struct GenericAdmonitionDirective;

impl DirectiveHandler for GenericAdmonitionDirective {
    fn name(&self) -> &'static str {
        "admonition"
    }

    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError> {
        if directive.data.trim().is_empty() {
            context.warning(
                codes::INVALID_OPTION,
                directive,
                "The admonition directive requires a title",
            );
        }
        let title = Some(directive.data.trim())
            .filter(|t| !t.is_empty())
            .map(|t| context.parse_inline(t));

        Ok(Some(Node::Admonition(AdmonitionNode {
            name: "admonition".to_string(),
            title,
            classes: classes(directive),
            children: context.parse_nested(&directive.content, directive.line)?,
        })))
    }
}

/// Every admonition handler
pub fn all() -> Vec<Arc<dyn DirectiveHandler>> {
    let mut handlers: Vec<Arc<dyn DirectiveHandler>> = ADMONITIONS
        .iter()
        .map(|name| Arc::new(AdmonitionDirective::new(name)) as Arc<dyn DirectiveHandler>)
        .collect();
    handlers.push(Arc::new(GenericAdmonitionDirective));
    handlers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::tests::{directive, run};
    use crate::fs::MemoryFilesystem;

    #[test]
    fn test_argument_joins_the_body() {
        let raw = directive("warning", "Mind the gap.", "Second paragraph.");
        let (node, _, _) = run(&raw, &MemoryFilesystem::new(), "index");
        let Some(Node::Admonition(warning)) = node else {
            panic!("expected an admonition");
        };
        assert_eq!(warning.name, "warning");
        assert_eq!(warning.children.len(), 2);
    }

    #[test]
    fn test_generic_admonition_title() {
        let mut raw = directive("admonition", "Read *this*", "Body.");
        raw.options.insert("class".to_string(), "special wide".to_string());
        let (node, _, _) = run(&raw, &MemoryFilesystem::new(), "index");
        let Some(Node::Admonition(admonition)) = node else {
            panic!("expected an admonition");
        };
        assert_eq!(
            admonition.title.map(|t| t.to_plain_text()),
            Some("Read this".to_string())
        );
        assert_eq!(admonition.classes, vec!["special", "wide"]);
    }
}
