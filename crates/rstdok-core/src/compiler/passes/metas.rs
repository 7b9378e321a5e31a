use rstdok_ast::{DocumentEntryNode, DocumentNode, Node, SectionEntryNode, TocNode};

use crate::compiler::{CompilerContext, CompilerPass};
use crate::error::CompilerError;

/// Collects titles, section trees, toctrees and dependencies into the
/// project's document entries
pub struct MetasPass;

/// Section tree of a node list
pub fn section_entries(nodes: &[Node]) -> Vec<SectionEntryNode> {
    nodes
        .iter()
        .filter_map(|node| match node {
            Node::Section(section) => Some(SectionEntryNode {
                title: section.title.text(),
                anchor: section.title.id.clone(),
                level: section.title.level,
                children: section_entries(&section.children),
            }),
            _ => None,
        })
        .collect()
}

fn collect_toctrees(nodes: &[Node], out: &mut Vec<TocNode>) {
    for node in nodes {
        if let Node::Toctree(toc) = node {
            out.push(toc.clone());
        }
        for children in node.child_lists() {
            collect_toctrees(children, out);
        }
    }
}

/// Title shown for a document: first section, `:title:` field, or the path
pub fn document_title(document: &DocumentNode) -> String {
    document
        .title()
        .map(|t| t.text())
        .or_else(|| document.header("title").map(|h| h.value.to_plain_text()))
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| document.file_path.clone())
}

impl CompilerPass for MetasPass {
    fn name(&self) -> &'static str {
        "metas"
    }

    fn priority(&self) -> i32 {
        10000
    }

    fn run(
        &mut self,
        mut documents: Vec<DocumentNode>,
        context: &mut CompilerContext<'_>,
    ) -> Result<Vec<DocumentNode>, CompilerError> {
        for document in documents.iter_mut() {
            let mut toctrees = Vec::new();
            collect_toctrees(&document.children, &mut toctrees);

            let mut entry = DocumentEntryNode::new(&document.file_path, document_title(document));
            entry.sections = section_entries(&document.children);
            entry.toctrees = toctrees.iter().map(|t| t.files.clone()).collect();
            entry.dependencies = document.dependencies.clone();
            entry.orphan = document.orphan;

            tracing::trace!(
                document = document.file_path.as_str(),
                toctrees = toctrees.len(),
                "Collected document metadata"
            );
            document.toc_declarations = toctrees;
            context.project.add_document_entry(entry);
        }
        Ok(documents)
    }
}
