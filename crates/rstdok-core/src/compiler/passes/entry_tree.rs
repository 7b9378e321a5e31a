use std::collections::{BTreeMap, HashSet, VecDeque};

use rstdok_ast::{DocumentNode, ProjectNode};

use crate::compiler::{CompilerContext, CompilerPass};
use crate::error::CompilerError;

/// Links document entries into a tree along their toctrees
///
/// The root is `index` when present, otherwise the first document no toctree
/// refers to. Each document gets the first parent that reaches it
/// breadth-first from the root; documents the root never reaches keep no
/// parent.
pub struct DocumentEntryTreePass;

/// Document name treated as the navigation root
pub const ROOT_DOCUMENT: &str = "index";

fn find_root(project: &ProjectNode, toctrees: &BTreeMap<String, Vec<String>>) -> Option<String> {
    if project.documents.contains_key(ROOT_DOCUMENT) {
        return Some(ROOT_DOCUMENT.to_string());
    }
    let referenced: HashSet<&String> = toctrees
        .iter()
        .flat_map(|(file, children)| children.iter().filter(move |c| *c != file))
        .collect();
    project
        .documents
        .keys()
        .find(|file| !referenced.contains(file))
        .or_else(|| project.documents.keys().next())
        .cloned()
}

pub fn link_entries(project: &mut ProjectNode) {
    let toctrees: BTreeMap<String, Vec<String>> = project
        .documents
        .iter()
        .map(|(file, entry)| (file.clone(), entry.toctrees.concat()))
        .collect();

    for entry in project.documents.values_mut() {
        entry.parent = None;
        entry.children.clear();
        entry.is_root = false;
    }

    let root = find_root(project, &toctrees);
    let starts = root
        .iter()
        .cloned()
        .chain(project.documents.keys().cloned())
        .collect::<Vec<_>>();

    let mut visited: HashSet<String> = HashSet::new();
    for start in starts {
        if !visited.insert(start.clone()) {
            continue;
        }
        let mut queue = VecDeque::from([start]);
        while let Some(file) = queue.pop_front() {
            let Some(children) = toctrees.get(&file) else {
                continue;
            };
            for child in children {
                if !project.documents.contains_key(child) || !visited.insert(child.clone()) {
                    continue;
                }
                if let Some(entry) = project.document_entry_mut(child) {
                    entry.parent = Some(file.clone());
                }
                if let Some(entry) = project.document_entry_mut(&file) {
                    entry.children.push(child.clone());
                }
                queue.push_back(child.clone());
            }
        }
    }

    if let Some(root) = &root {
        if let Some(entry) = project.document_entry_mut(root) {
            entry.is_root = true;
        }
    }
    project.root = root;
}

impl CompilerPass for DocumentEntryTreePass {
    fn name(&self) -> &'static str {
        "document_entry_tree"
    }

    fn priority(&self) -> i32 {
        5000
    }

    fn run(
        &mut self,
        documents: Vec<DocumentNode>,
        context: &mut CompilerContext<'_>,
    ) -> Result<Vec<DocumentNode>, CompilerError> {
        link_entries(context.project);
        tracing::debug!(root = ?context.project.root, "Built document entry tree");
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstdok_ast::DocumentEntryNode;

    fn entry(file: &str, toctree: &[&str]) -> DocumentEntryNode {
        let mut entry = DocumentEntryNode::new(file, file);
        if !toctree.is_empty() {
            entry.toctrees.push(toctree.iter().map(|s| s.to_string()).collect());
        }
        entry
    }

    fn project(entries: Vec<DocumentEntryNode>) -> ProjectNode {
        let mut project = ProjectNode::default();
        for e in entries {
            project.add_document_entry(e);
        }
        project
    }

    #[test]
    fn test_tree_from_index() {
        let mut project = project(vec![
            entry("index", &["guide", "faq", "missing"]),
            entry("guide", &["guide/install", "faq"]),
            entry("guide/install", &[]),
            entry("faq", &[]),
        ]);
        link_entries(&mut project);

        assert_eq!(project.root.as_deref(), Some("index"));
        let index = project.document_entry("index").unwrap();
        assert!(index.is_root);
        assert_eq!(index.children, vec!["guide", "faq"]);
        // faq is claimed by index first
        assert_eq!(project.document_entry("faq").unwrap().parent.as_deref(), Some("index"));
        assert!(project.document_entry("guide").unwrap().children == vec!["guide/install"]);
        assert_eq!(project.reading_order(), vec!["index", "guide", "guide/install", "faq"]);
    }

    #[test]
    fn test_root_without_index() {
        let mut project = project(vec![entry("b", &[]), entry("a", &["b"]), entry("c", &[])]);
        link_entries(&mut project);
        assert_eq!(project.root.as_deref(), Some("a"));
        assert_eq!(project.document_entry("b").unwrap().parent.as_deref(), Some("a"));
        assert_eq!(project.document_entry("c").unwrap().parent, None);
    }

    #[test]
    fn test_self_reference_and_cycles_terminate() {
        let mut project = project(vec![entry("index", &["index", "a"]), entry("a", &["index"])]);
        link_entries(&mut project);
        assert_eq!(project.document_entry("index").unwrap().parent, None);
        assert_eq!(project.document_entry("index").unwrap().children, vec!["a"]);
    }
}
