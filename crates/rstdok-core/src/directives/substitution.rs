use rstdok_ast::{DirectiveNode, Node};

use super::{DirectiveContext, DirectiveHandler};
use crate::diagnostics::codes;
use crate::error::ParseError;

/// `.. |name| replace:: text` defines a substitution
pub struct ReplaceDirective;

impl DirectiveHandler for ReplaceDirective {
    fn name(&self) -> &'static str {
        "replace"
    }

    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError> {
        let Some(name) = &directive.variable else {
            context.warning(
                codes::INVALID_OPTION,
                directive,
                "The replace directive is only valid in a substitution definition",
            );
            return Ok(None);
        };

        let text = [directive.data.trim(), directive.content.trim()]
            .iter()
            .filter(|t| !t.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        let value = context.parse_inline(&text);
        context.state.variables.insert(name.clone(), value);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::tests::{directive, run};
    use crate::fs::MemoryFilesystem;

    #[test]
    fn test_defines_variable() {
        let mut raw = directive("replace", "the **Rust**", "language");
        raw.variable = Some("rust".to_string());
        let (node, state, _) = run(&raw, &MemoryFilesystem::new(), "index");
        assert!(node.is_none());
        assert_eq!(
            state.variables.get("rust").map(|v| v.to_plain_text()),
            Some("the Rust language".to_string())
        );
    }

    #[test]
    fn test_requires_a_name() {
        let raw = directive("replace", "text", "");
        let (node, state, reporter) = run(&raw, &MemoryFilesystem::new(), "index");
        assert!(node.is_none());
        assert!(state.variables.is_empty());
        assert_eq!(reporter.problem_count(), 1);
    }
}
