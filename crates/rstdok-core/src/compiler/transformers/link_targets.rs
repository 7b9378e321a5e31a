use std::collections::HashSet;

use rstdok_ast::{DocumentNode, InternalTarget, Node};

use crate::compiler::{CompilerContext, NodeTransformer};
use crate::diagnostics::codes;
use crate::error::CompilerError;

/// Fills the project's link-target table
///
/// Explicit anchors (`.. _name:`) take the title of the section that
/// directly follows them, or their own name otherwise. A second explicit
/// anchor with the same name is reported and ignored. Section ids are
/// registered as well unless an explicit anchor already uses the name; an
/// explicit anchor replaces a section id registered earlier.
#[derive(Debug, Default)]
pub struct CollectLinkTargetsTransformer {
    /// Explicit anchors waiting for the node they point at
    pending: Vec<String>,
    /// Anchors that came from section ids
    implicit: HashSet<String>,
}

impl CollectLinkTargetsTransformer {
    fn flush(&mut self, title: Option<&str>, context: &mut CompilerContext<'_>) {
        for anchor in std::mem::take(&mut self.pending) {
            let target = InternalTarget {
                document: context.document().to_string(),
                anchor: anchor.clone(),
                title: title.unwrap_or(&anchor).to_string(),
            };
            if self.implicit.remove(&anchor) {
                context.project.link_targets.insert(anchor, target);
                continue;
            }
            if let Err(existing) = context.project.add_link_target(target) {
                context.warning(
                    codes::DUPLICATE_ANCHOR,
                    format!(
                        "Duplicate anchor '{}', already defined in '{}'",
                        anchor, existing.document
                    ),
                );
            }
        }
    }
}

impl NodeTransformer for CollectLinkTargetsTransformer {
    fn name(&self) -> &'static str {
        "collect_link_targets"
    }

    fn priority(&self) -> i32 {
        40
    }

    fn supports(&self, _node: &Node) -> bool {
        true
    }

    fn prepare(&mut self, _context: &mut CompilerContext<'_>) -> Result<(), CompilerError> {
        self.implicit.clear();
        Ok(())
    }

    fn enter_document(
        &mut self,
        _document: &DocumentNode,
        _context: &mut CompilerContext<'_>,
    ) -> Result<(), CompilerError> {
        self.pending.clear();
        Ok(())
    }

    fn enter_node(
        &mut self,
        node: &mut Node,
        context: &mut CompilerContext<'_>,
    ) -> Result<(), CompilerError> {
        match node {
            Node::Anchor(anchor) => {
                if !self.pending.contains(&anchor.name) {
                    self.pending.push(anchor.name.clone());
                }
            }
            Node::Section(section) => {
                let title = section.title.text();
                self.flush(Some(&title), context);

                let target = InternalTarget {
                    document: context.document().to_string(),
                    anchor: section.title.id.clone(),
                    title,
                };
                if context.project.add_link_target(target).is_ok() {
                    self.implicit.insert(section.title.id.clone());
                }
            }
            _ => self.flush(None, context),
        }
        Ok(())
    }

    fn leave_document(
        &mut self,
        document: DocumentNode,
        context: &mut CompilerContext<'_>,
    ) -> Result<Option<DocumentNode>, CompilerError> {
        self.flush(None, context);
        Ok(Some(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::TreeWalker;
    use crate::diagnostics::Reporter;
    use crate::parser::{InputFormat, Parser};
    use rstdok_ast::ProjectNode;

    fn collect(sources: &[(&str, &str)]) -> (ProjectNode, Reporter) {
        let parser = Parser::new();
        let mut project = ProjectNode::default();
        let reporter = Reporter::new();
        {
            let mut context = CompilerContext::new(&mut project, reporter.clone());
            let mut transformer = CollectLinkTargetsTransformer::default();
            transformer.prepare(&mut context).unwrap();
            for (path, source) in sources {
                let doc = parser.parse_document(path, source, InputFormat::Rst).unwrap();
                TreeWalker::new(&mut transformer)
                    .walk_document(doc, &mut context)
                    .unwrap();
            }
        }
        (project, reporter)
    }

    #[test]
    fn test_anchor_takes_following_section_title() {
        let (project, reporter) = collect(&[(
            "a",
            ".. _setup-guide:\n\nInstalling things\n=================\n\n.. _plain:\n\nJust text.\n",
        )]);

        let target = project.link_target("setup-guide").unwrap();
        assert_eq!(target.document, "a");
        assert_eq!(target.title, "Installing things");
        assert_eq!(project.link_target("plain").unwrap().title, "plain");
        assert_eq!(project.link_target("installing-things").unwrap().document, "a");
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn test_duplicate_explicit_anchor_is_reported() {
        let (project, reporter) = collect(&[
            ("a", ".. _foo:\n\nText.\n"),
            ("b", ".. _foo:\n\nOther text.\n"),
        ]);

        assert_eq!(project.link_target("foo").unwrap().document, "a");
        let diagnostics = reporter.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_deref(), Some(codes::DUPLICATE_ANCHOR));
        assert_eq!(diagnostics[0].file.as_deref(), Some("b"));
    }

    #[test]
    fn test_explicit_anchor_replaces_section_id() {
        let (project, reporter) = collect(&[
            ("a", "Usage\n=====\n\nText.\n"),
            ("b", ".. _usage:\n\nText.\n"),
        ]);
        assert_eq!(project.link_target("usage").unwrap().document, "b");
        assert!(reporter.diagnostics().is_empty());
    }
}
