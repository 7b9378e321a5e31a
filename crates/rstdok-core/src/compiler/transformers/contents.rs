use rstdok_ast::{ContentsEntry, DocumentNode, Node, SectionEntryNode};

use crate::compiler::passes::metas::section_entries;
use crate::compiler::{CompilerContext, NodeTransformer};
use crate::error::CompilerError;

/// Fills `.. contents::` with the document's section tree
///
/// The document title is not listed. `local` lists the sections below the
/// section holding the directive.
#[derive(Debug, Default)]
pub struct ContentsTransformer {
    sections: Vec<SectionEntryNode>,
    /// Ids of the sections enclosing the visited node
    enclosing: Vec<String>,
}

fn find<'s>(sections: &'s [SectionEntryNode], anchor: &str) -> Option<&'s SectionEntryNode> {
    sections.iter().find_map(|s| {
        if s.anchor == anchor {
            Some(s)
        } else {
            find(&s.children, anchor)
        }
    })
}

fn entries(sections: &[SectionEntryNode], depth: Option<usize>) -> Vec<ContentsEntry> {
    if depth == Some(0) {
        return Vec::new();
    }
    sections
        .iter()
        .map(|s| ContentsEntry {
            title: s.title.clone(),
            anchor: s.anchor.clone(),
            children: entries(&s.children, depth.map(|d| d - 1)),
        })
        .collect()
}

impl NodeTransformer for ContentsTransformer {
    fn name(&self) -> &'static str {
        "contents"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn supports(&self, node: &Node) -> bool {
        matches!(node, Node::Section(_) | Node::Contents(_))
    }

    fn enter_document(
        &mut self,
        document: &DocumentNode,
        _context: &mut CompilerContext<'_>,
    ) -> Result<(), CompilerError> {
        self.sections = section_entries(&document.children);
        self.enclosing.clear();
        Ok(())
    }

    fn enter_node(
        &mut self,
        node: &mut Node,
        _context: &mut CompilerContext<'_>,
    ) -> Result<(), CompilerError> {
        match node {
            Node::Section(section) => self.enclosing.push(section.title.id.clone()),
            Node::Contents(contents) => {
                let listed: &[SectionEntryNode] = match self.enclosing.last() {
                    Some(anchor) if contents.local => find(&self.sections, anchor)
                        .map(|s| s.children.as_slice())
                        .unwrap_or_default(),
                    _ => match self.sections.as_slice() {
                        [title] => &title.children,
                        sections => sections,
                    },
                };
                contents.entries = entries(listed, contents.depth);
            }
            _ => {}
        }
        Ok(())
    }

    fn leave_node(
        &mut self,
        node: Node,
        _context: &mut CompilerContext<'_>,
    ) -> Result<Option<Node>, CompilerError> {
        if matches!(node, Node::Section(_)) {
            self.enclosing.pop();
        }
        Ok(Some(node))
    }
}
