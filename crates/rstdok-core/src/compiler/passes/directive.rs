use std::sync::Arc;

use rstdok_ast::DocumentNode;

use crate::compiler::{CompilerContext, CompilerPass};
use crate::directives::{DirectiveContext, DirectiveRegistry, DocumentState};
use crate::error::CompilerError;
use crate::fs::Filesystem;
use crate::parser::Parser;

/// Replaces every raw directive with the node its handler produces
pub struct DirectiveProcessPass {
    parser: Parser,
    registry: DirectiveRegistry,
    filesystem: Arc<dyn Filesystem>,
}

impl DirectiveProcessPass {
    pub fn new(parser: Parser, registry: DirectiveRegistry, filesystem: Arc<dyn Filesystem>) -> Self {
        Self {
            parser,
            registry,
            filesystem,
        }
    }

    fn process(
        &self,
        mut document: DocumentNode,
        context: &CompilerContext<'_>,
    ) -> Result<DocumentNode, CompilerError> {
        let mut state = DocumentState::new(document.file_path.clone());
        state.variables = std::mem::take(&mut document.variables);
        state.headers = std::mem::take(&mut document.headers);
        state.dependencies = std::mem::take(&mut document.dependencies);
        state.title_letters = std::mem::take(&mut document.title_letters);
        state.links = std::mem::take(&mut document.links);

        let nodes = std::mem::take(&mut document.children);
        let children = {
            let mut directives = DirectiveContext::new(
                &self.parser,
                &self.registry,
                self.filesystem.as_ref(),
                &context.reporter,
                &mut state,
            );
            directives
                .dispatch_nodes(nodes)
                .map_err(|e| CompilerError::new(self.name(), e.to_string()))?
        };

        document.children = children;
        document.variables = state.variables;
        document.headers = state.headers;
        document.dependencies = state.dependencies;
        document.title_letters = state.title_letters;
        document.links = state.links;
        if document.header("orphan").is_some() {
            document.orphan = true;
        }
        Ok(document)
    }
}

impl CompilerPass for DirectiveProcessPass {
    fn name(&self) -> &'static str {
        "directive_process"
    }

    fn priority(&self) -> i32 {
        i32::MAX
    }

    fn run(
        &mut self,
        documents: Vec<DocumentNode>,
        context: &mut CompilerContext<'_>,
    ) -> Result<Vec<DocumentNode>, CompilerError> {
        let mut output = Vec::with_capacity(documents.len());
        for document in documents {
            context.current_document = Some(document.file_path.clone());
            output.push(self.process(document, context)?);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Reporter;
    use crate::fs::MemoryFilesystem;
    use crate::parser::InputFormat;
    use rstdok_ast::{Node, NodeKind, ProjectNode};

    fn contains_directive(nodes: &[Node]) -> bool {
        nodes.iter().any(|node| {
            node.kind() == NodeKind::Directive
                || node.child_lists().iter().any(|c| contains_directive(c))
        })
    }

    #[test]
    fn test_no_raw_directive_survives() {
        let source = "Title\n=====\n\n.. note::\n\n   .. code-block:: rust\n\n      fn main() {}\n\n.. |name| replace:: rstdok\n\n.. include:: part.rst\n\n.. made-up:: arg\n\n   body\n";
        let fs = Arc::new(MemoryFilesystem::with_files([(
            "part.rst",
            "Included paragraph.\n\n.. tip:: nested\n",
        )]));
        let parser = Parser::new();
        let document = parser.parse_document("index", source, InputFormat::Rst).unwrap();
        assert!(contains_directive(&document.children));

        let mut pass = DirectiveProcessPass::new(parser, DirectiveRegistry::with_defaults(), fs);
        let mut project = ProjectNode::default();
        let mut context = CompilerContext::new(&mut project, Reporter::new());
        let documents = pass.run(vec![document], &mut context).unwrap();

        let document = &documents[0];
        assert!(!contains_directive(&document.children));
        assert!(document.variables.contains_key("name"));
        assert_eq!(document.dependencies, vec!["part.rst".to_string()]);
    }
}
