use rstdok_ast::{MenuEntry, Node, ProjectNode, SectionEntryNode, TocNode};

use crate::compiler::{CompilerContext, NodeTransformer};
use crate::error::CompilerError;

/// Resolves each toctree into a menu of document entries
///
/// A document's children are its sections below the title followed by the
/// documents of its own toctrees, down to the toctree's `maxdepth` (0 means
/// unlimited). `titlesonly` keeps documents only.
pub struct MenuNodeTransformer;

struct MenuBuilder<'a> {
    project: &'a ProjectNode,
    max_depth: usize,
    titles_only: bool,
}

impl MenuBuilder<'_> {
    fn within_depth(&self, level: usize) -> bool {
        self.max_depth == 0 || level <= self.max_depth
    }

    fn document(
        &self,
        file: &str,
        title: Option<&String>,
        level: usize,
        stack: &mut Vec<String>,
    ) -> Option<MenuEntry> {
        if stack.iter().any(|f| f == file) {
            return None;
        }
        let entry = self.project.document_entry(file)?;
        let mut menu = MenuEntry {
            file: file.to_string(),
            anchor: None,
            title: title.cloned().unwrap_or_else(|| entry.title.clone()),
            children: Vec::new(),
        };
        if !self.within_depth(level + 1) {
            return Some(menu);
        }

        stack.push(file.to_string());
        if !self.titles_only {
            let sections = match entry.sections.as_slice() {
                [title] => &title.children[..],
                sections => sections,
            };
            menu.children
                .extend(sections.iter().map(|s| self.section(file, s, level + 1)));
        }
        for child in entry.toctrees.iter().flatten() {
            if let Some(child) = self.document(child, None, level + 1, stack) {
                menu.children.push(child);
            }
        }
        stack.pop();
        Some(menu)
    }

    fn section(&self, file: &str, section: &SectionEntryNode, level: usize) -> MenuEntry {
        let children = if self.within_depth(level + 1) {
            section
                .children
                .iter()
                .map(|s| self.section(file, s, level + 1))
                .collect()
        } else {
            Vec::new()
        };
        MenuEntry {
            file: file.to_string(),
            anchor: Some(section.anchor.clone()),
            title: section.title.clone(),
            children,
        }
    }
}

/// Menu for one toctree as seen from `current`
pub fn build_menu(project: &ProjectNode, current: &str, toc: &TocNode) -> Vec<MenuEntry> {
    let builder = MenuBuilder {
        project,
        max_depth: toc.max_depth,
        titles_only: toc.titles_only,
    };
    let mut stack = vec![current.to_string()];
    toc.files
        .iter()
        .filter_map(|file| builder.document(file, toc.titles.get(file), 1, &mut stack))
        .collect()
}

impl NodeTransformer for MenuNodeTransformer {
    fn name(&self) -> &'static str {
        "menu_node"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn supports(&self, node: &Node) -> bool {
        matches!(node, Node::Toctree(_))
    }

    fn enter_node(
        &mut self,
        node: &mut Node,
        context: &mut CompilerContext<'_>,
    ) -> Result<(), CompilerError> {
        if let Node::Toctree(toc) = node {
            toc.menu = build_menu(&*context.project, context.document(), toc);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstdok_ast::DocumentEntryNode;

    fn section(title: &str, children: Vec<SectionEntryNode>) -> SectionEntryNode {
        SectionEntryNode {
            title: title.to_string(),
            anchor: title.to_lowercase(),
            level: 1,
            children,
        }
    }

    fn project() -> ProjectNode {
        let mut project = ProjectNode::default();
        let mut index = DocumentEntryNode::new("index", "Home");
        index.toctrees.push(vec!["guide".to_string()]);
        let mut guide = DocumentEntryNode::new("guide", "Guide");
        guide.sections = vec![section(
            "Guide",
            vec![section("Install", vec![section("Linux", vec![])]), section("Usage", vec![])],
        )];
        guide.toctrees.push(vec!["guide/advanced".to_string(), "index".to_string()]);
        let advanced = DocumentEntryNode::new("guide/advanced", "Advanced");
        for entry in [index, guide, advanced] {
            project.add_document_entry(entry);
        }
        project
    }

    fn titles(entries: &[MenuEntry]) -> Vec<String> {
        entries.iter().map(|e| e.title.clone()).collect()
    }

    #[test]
    fn test_unlimited_depth() {
        let toc = TocNode {
            files: vec!["guide".to_string()],
            ..Default::default()
        };
        let menu = build_menu(&project(), "index", &toc);
        assert_eq!(titles(&menu), vec!["Guide"]);
        // the title section is skipped, index is not revisited
        assert_eq!(titles(&menu[0].children), vec!["Install", "Usage", "Advanced"]);
        assert_eq!(menu[0].children[0].anchor.as_deref(), Some("install"));
        assert_eq!(titles(&menu[0].children[0].children), vec!["Linux"]);
    }

    #[test]
    fn test_depth_and_titles_only() {
        let mut toc = TocNode {
            files: vec!["guide".to_string()],
            max_depth: 1,
            ..Default::default()
        };
        let menu = build_menu(&project(), "index", &toc);
        assert!(menu[0].children.is_empty());

        toc.max_depth = 2;
        toc.titles_only = true;
        let menu = build_menu(&project(), "index", &toc);
        assert_eq!(titles(&menu[0].children), vec!["Advanced"]);
    }

    #[test]
    fn test_explicit_title_and_missing_document() {
        let mut toc = TocNode {
            files: vec!["guide".to_string(), "missing".to_string()],
            ..Default::default()
        };
        toc.titles.insert("guide".to_string(), "The Guide".to_string());
        let menu = build_menu(&project(), "index", &toc);
        assert_eq!(titles(&menu), vec!["The Guide"]);
    }
}
