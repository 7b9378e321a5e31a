use std::collections::BTreeMap;

use rstdok_ast::{DocumentNode, InlineCompoundNode, InlineNode, Node};

use crate::compiler::{CompilerContext, NodeTransformer};
use crate::diagnostics::codes;
use crate::error::CompilerError;

/// Substitutes `|name|` references with their definitions
///
/// Lookup is exact first, then case-insensitive. `|version|`, `|release|`
/// and `|project|` fall back to the project settings.
#[derive(Debug, Default)]
pub struct VariableInlineTransformer {
    variables: BTreeMap<String, InlineCompoundNode>,
}

impl VariableInlineTransformer {
    fn lookup(&self, name: &str) -> Option<&InlineCompoundNode> {
        self.variables.get(name).or_else(|| {
            let lower = name.to_lowercase();
            self.variables
                .iter()
                .find(|(key, _)| key.to_lowercase() == lower)
                .map(|(_, value)| value)
        })
    }

    fn substitute(&self, inlines: &mut [InlineNode], context: &CompilerContext<'_>) {
        for inline in inlines {
            let InlineNode::Variable(variable) = inline else {
                continue;
            };
            if variable.value.is_some() {
                continue;
            }
            match self.lookup(&variable.name) {
                Some(value) => variable.value = Some(value.children.clone()),
                None => context.warning(
                    codes::UNKNOWN_SUBSTITUTION,
                    format!("Undefined substitution referenced: '{}'", variable.name),
                ),
            }
        }
    }
}

impl NodeTransformer for VariableInlineTransformer {
    fn name(&self) -> &'static str {
        "variable_inline"
    }

    fn priority(&self) -> i32 {
        30
    }

    fn supports(&self, node: &Node) -> bool {
        matches!(
            node,
            Node::Section(_)
                | Node::Paragraph(_)
                | Node::DefinitionList(_)
                | Node::Admonition(_)
                | Node::Container(_)
        )
    }

    fn enter_document(
        &mut self,
        document: &DocumentNode,
        context: &mut CompilerContext<'_>,
    ) -> Result<(), CompilerError> {
        self.variables = document.variables.clone();
        let builtins = [
            ("version", context.project.version.clone()),
            ("release", context.project.version.clone()),
            ("project", context.project.title.clone()),
        ];
        for (name, value) in builtins {
            if let Some(value) = value {
                self.variables
                    .entry(name.to_string())
                    .or_insert_with(|| InlineCompoundNode::plain(value));
            }
        }
        Ok(())
    }

    fn enter_node(
        &mut self,
        node: &mut Node,
        context: &mut CompilerContext<'_>,
    ) -> Result<(), CompilerError> {
        for compound in node.inline_compounds_mut() {
            self.substitute(&mut compound.children, context);
        }
        Ok(())
    }
}
