use std::collections::HashSet;

use rstdok_ast::DocumentNode;

use super::visit_sections_mut;
use crate::compiler::{CompilerContext, CompilerPass};
use crate::error::CompilerError;

/// Makes section ids unique within each document
///
/// Repeated titles get `-1`, `-2`, ... suffixes in document order; titles
/// without any alphanumeric character get the id `section`.
pub struct ImplicitHyperlinkTargetPass;

fn unique_id(id: &str, used: &mut HashSet<String>) -> String {
    let base = if id.is_empty() { "section" } else { id };
    if used.insert(base.to_string()) {
        return base.to_string();
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}-{}", base, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

impl CompilerPass for ImplicitHyperlinkTargetPass {
    fn name(&self) -> &'static str {
        "implicit_hyperlink_targets"
    }

    fn priority(&self) -> i32 {
        20000
    }

    fn run(
        &mut self,
        mut documents: Vec<DocumentNode>,
        _context: &mut CompilerContext<'_>,
    ) -> Result<Vec<DocumentNode>, CompilerError> {
        for document in documents.iter_mut() {
            let mut used = HashSet::new();
            visit_sections_mut(&mut document.children, &mut |section| {
                section.title.id = unique_id(&section.title.id, &mut used);
            });
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Reporter;
    use crate::parser::{InputFormat, Parser};
    use rstdok_ast::ProjectNode;

    #[test]
    fn test_repeated_titles_get_suffixes() {
        let source = "Guide\n=====\n\nExample\n-------\n\nExample\n-------\n\nExample\n-------\n\n(?)\n---\n";
        let document = Parser::new().parse_document("guide", source, InputFormat::Rst).unwrap();

        let mut project = ProjectNode::default();
        let mut context = CompilerContext::new(&mut project, Reporter::new());
        let documents = ImplicitHyperlinkTargetPass.run(vec![document], &mut context).unwrap();

        let mut ids = Vec::new();
        crate::compiler::passes::visit_sections(&documents[0].children, &mut |s| {
            ids.push(s.title.id.clone())
        });
        assert_eq!(ids, vec!["guide", "example", "example-1", "example-2", "section"]);
    }
}
