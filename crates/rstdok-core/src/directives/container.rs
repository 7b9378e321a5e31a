use rstdok_ast::{ContainerNode, DirectiveNode, Node};

use super::{classes, DirectiveContext, DirectiveHandler};
use crate::diagnostics::codes;
use crate::error::ParseError;

fn container(
    name: &str,
    title: Option<&str>,
    classes: Vec<String>,
    directive: &DirectiveNode,
    context: &mut DirectiveContext<'_>,
) -> Result<Option<Node>, ParseError> {
    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| context.parse_inline(t));
    Ok(Some(Node::Container(ContainerNode {
        name: name.to_string(),
        title,
        classes,
        children: context.parse_nested(&directive.content, directive.line)?,
    })))
}

/// `.. container:: class names`
pub struct ContainerDirective;

impl DirectiveHandler for ContainerDirective {
    fn name(&self) -> &'static str {
        "container"
    }

    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError> {
        let mut names: Vec<String> = directive.data.split_whitespace().map(str::to_string).collect();
        names.extend(classes(directive));
        container("container", None, names, directive, context)
    }
}

/// `.. class:: names` wraps its body in the given classes
pub struct ClassDirective;

impl DirectiveHandler for ClassDirective {
    fn name(&self) -> &'static str {
        "class"
    }

    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError> {
        let names = directive.data.split_whitespace().map(str::to_string).collect();
        container("class", None, names, directive, context)
    }
}

/// `.. topic:: Title` and `.. sidebar:: Title`
pub struct TopicDirective;

impl DirectiveHandler for TopicDirective {
    fn name(&self) -> &'static str {
        "topic"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["sidebar"]
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
                format!("The {} directive requires a title", directive.name),
            );
        }
        let name = directive.name.to_lowercase();
        container(&name, Some(directive.data.as_str()), classes(directive), directive, context)
    }
}

/// `.. rubric:: Heading`, an informal heading outside the section tree
pub struct RubricDirective;

impl DirectiveHandler for RubricDirective {
    fn name(&self) -> &'static str {
        "rubric"
    }

    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError> {
        container("rubric", Some(directive.data.as_str()), classes(directive), directive, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::tests::{directive, run};
    use crate::fs::MemoryFilesystem;

    #[test]
    fn test_sidebar_is_a_titled_container() {
        let raw = directive("sidebar", "Aside", "Side note.");
        let (node, _, _) = run(&raw, &MemoryFilesystem::new(), "index");
        let Some(Node::Container(container)) = node else {
            panic!("expected a container");
        };
        assert_eq!(container.name, "sidebar");
        assert_eq!(container.title.map(|t| t.to_plain_text()), Some("Aside".to_string()));
        assert_eq!(container.children.len(), 1);
    }

    #[test]
    fn test_container_classes() {
        let mut raw = directive("container", "wide dark", "Body.");
        raw.options.insert("class".to_string(), "extra".to_string());
        let (node, _, _) = run(&raw, &MemoryFilesystem::new(), "index");
        let Some(Node::Container(container)) = node else {
            panic!("expected a container");
        };
        assert_eq!(container.classes, vec!["wide", "dark", "extra"]);
    }
}
