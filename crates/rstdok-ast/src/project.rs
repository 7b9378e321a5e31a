//! Project-wide aggregate and navigation entry tree
//!
//! The `ProjectNode` is the build-scoped object the compiler passes share:
//! document entries keyed by path (the entry tree used for navigation) and
//! the link-target table used to resolve cross-references.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A section in a document's table of contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionEntryNode {
    /// Section title
    pub title: String,
    /// Section anchor
    pub anchor: String,
    /// Section level
    pub level: usize,
    /// Nested sections
    pub children: Vec<SectionEntryNode>,
}

/// Per-document entry in the project's navigation tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntryNode {
    /// Document path
    pub file: String,
    /// Document title (falls back to the path)
    pub title: String,
    /// Section tree
    pub sections: Vec<SectionEntryNode>,
    /// Resolved file lists, one per toctree in the document
    pub toctrees: Vec<Vec<String>>,
    /// Dependencies (includes and similar)
    pub dependencies: Vec<String>,
    /// Parent document in the toctree hierarchy
    pub parent: Option<String>,
    /// Child documents in toctree order
    pub children: Vec<String>,
    /// Whether this document is the root of the navigation tree
    pub is_root: bool,
    /// Documents marked orphan are not expected in any toctree
    pub orphan: bool,
}

impl DocumentEntryNode {
    /// Create an entry without navigation links
    pub fn new(file: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            title: title.into(),
            sections: Vec::new(),
            toctrees: Vec::new(),
            dependencies: Vec::new(),
            parent: None,
            children: Vec::new(),
            is_root: false,
            orphan: false,
        }
    }
}

/// An anchor registered in the link-target table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalTarget {
    /// Document containing the anchor
    pub document: String,
    /// Anchor id
    pub anchor: String,
    /// Human-readable title (section title or anchor name)
    pub title: String,
}

/// Previous/next/breadcrumb links for a document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Navigation {
    pub previous: Option<String>,
    pub next: Option<String>,
    /// Ancestors from the root down to (excluding) the document
    pub breadcrumbs: Vec<String>,
}

/// Aggregate of every document in one build
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectNode {
    pub title: Option<String>,
    pub version: Option<String>,
    /// Document entries keyed by document path
    pub documents: BTreeMap<String, DocumentEntryNode>,
    /// Anchor id -> target
    pub link_targets: BTreeMap<String, InternalTarget>,
    /// Root document of the navigation tree
    pub root: Option<String>,
}

impl ProjectNode {
    /// Create an empty project
    pub fn new(title: Option<String>, version: Option<String>) -> Self {
        Self {
            title,
            version,
            ..Default::default()
        }
    }

    /// Add or replace a document entry
    pub fn add_document_entry(&mut self, entry: DocumentEntryNode) {
        self.documents.insert(entry.file.clone(), entry);
    }

    /// Document entry by path
    pub fn document_entry(&self, file: &str) -> Option<&DocumentEntryNode> {
        self.documents.get(file)
    }

    /// Mutable document entry by path
    pub fn document_entry_mut(&mut self, file: &str) -> Option<&mut DocumentEntryNode> {
        self.documents.get_mut(file)
    }

    /// Register an anchor. Returns the previous target when the id was
    /// already taken; the new target does not replace it.
    pub fn add_link_target(&mut self, target: InternalTarget) -> Result<(), InternalTarget> {
        match self.link_targets.get(&target.anchor) {
            Some(existing) => Err(existing.clone()),
            None => {
                self.link_targets.insert(target.anchor.clone(), target);
                Ok(())
            }
        }
    }

    /// Anchor lookup
    pub fn link_target(&self, anchor: &str) -> Option<&InternalTarget> {
        self.link_targets.get(anchor)
    }

    /// Forget everything collected by a previous compile
    pub fn reset(&mut self) {
        self.documents.clear();
        self.link_targets.clear();
        self.root = None;
    }

    /// Documents in navigation order: depth-first from the root through
    /// toctree children.
    pub fn reading_order(&self) -> Vec<String> {
        let mut order = Vec::new();
        if let Some(root) = &self.root {
            self.collect_order(root, &mut order);
        }
        order
    }

    fn collect_order(&self, file: &str, order: &mut Vec<String>) {
        if order.iter().any(|f| f == file) {
            return;
        }
        order.push(file.to_string());
        if let Some(entry) = self.documents.get(file) {
            for child in &entry.children {
                self.collect_order(child, order);
            }
        }
    }

    /// Navigation links for a document
    pub fn navigation(&self, file: &str) -> Navigation {
        let order = self.reading_order();
        let position = order.iter().position(|f| f == file);

        let previous = position
            .and_then(|p| p.checked_sub(1))
            .and_then(|p| order.get(p))
            .cloned();
        let next = position.and_then(|p| order.get(p + 1)).cloned();

        let mut breadcrumbs = Vec::new();
        let mut current = self.documents.get(file).and_then(|e| e.parent.clone());
        while let Some(parent) = current {
            if breadcrumbs.contains(&parent) {
                break;
            }
            current = self.documents.get(&parent).and_then(|e| e.parent.clone());
            breadcrumbs.push(parent);
        }
        breadcrumbs.reverse();

        Navigation {
            previous,
            next,
            breadcrumbs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> ProjectNode {
        let mut project = ProjectNode::new(Some("Docs".to_string()), None);
        let mut index = DocumentEntryNode::new("index", "Home");
        index.is_root = true;
        index.children = vec!["guide".to_string(), "faq".to_string()];
        let mut guide = DocumentEntryNode::new("guide", "Guide");
        guide.parent = Some("index".to_string());
        guide.children = vec!["guide/install".to_string()];
        let mut install = DocumentEntryNode::new("guide/install", "Install");
        install.parent = Some("guide".to_string());
        let mut faq = DocumentEntryNode::new("faq", "FAQ");
        faq.parent = Some("index".to_string());

        for entry in [index, guide, install, faq] {
            project.add_document_entry(entry);
        }
        project.root = Some("index".to_string());
        project
    }

    #[test]
    fn test_reading_order_is_depth_first() {
        assert_eq!(
            project().reading_order(),
            vec!["index", "guide", "guide/install", "faq"]
        );
    }

    #[test]
    fn test_navigation() {
        let nav = project().navigation("guide/install");
        assert_eq!(nav.previous.as_deref(), Some("guide"));
        assert_eq!(nav.next.as_deref(), Some("faq"));
        assert_eq!(nav.breadcrumbs, vec!["index", "guide"]);
    }

    #[test]
    fn test_navigation_of_root() {
        let nav = project().navigation("index");
        assert_eq!(nav.previous, None);
        assert_eq!(nav.next.as_deref(), Some("guide"));
        assert!(nav.breadcrumbs.is_empty());
    }

    #[test]
    fn test_link_target_collision_keeps_first() {
        let mut project = ProjectNode::default();
        let target = |doc: &str| InternalTarget {
            document: doc.to_string(),
            anchor: "intro".to_string(),
            title: "Intro".to_string(),
        };
        assert!(project.add_link_target(target("a")).is_ok());
        let existing = project.add_link_target(target("b")).unwrap_err();
        assert_eq!(existing.document, "a");
        assert_eq!(project.link_target("intro").unwrap().document, "a");
    }
}
