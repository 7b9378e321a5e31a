//! `.. include::` splices another file into the document.
//!
//! # Options
//!
//! - `:literal:` includes the file as a literal block
//! - `:code: language` includes it as a code block
//! - `:start-after: text` / `:end-before: text` cut the file down first

use rstdok_ast::{CodeNode, CollectionNode, DirectiveNode, Node};

use super::{DirectiveContext, DirectiveHandler};
use crate::diagnostics::codes;
use crate::error::ParseError;

/// Cut `text` to the part between the `start-after` and `end-before`
/// markers
fn select(text: &str, directive: &DirectiveNode) -> String {
    let mut selected = text;
    if let Some(marker) = directive.option("start-after").filter(|m| !m.is_empty()) {
        if let Some(pos) = selected.find(marker) {
            selected = &selected[pos + marker.len()..];
        }
    }
    if let Some(marker) = directive.option("end-before").filter(|m| !m.is_empty()) {
        if let Some(pos) = selected.find(marker) {
            selected = &selected[..pos];
        }
    }
    selected.to_string()
}

pub struct IncludeDirective;

impl DirectiveHandler for IncludeDirective {
    fn name(&self) -> &'static str {
        "include"
    }

    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError> {
        let path = context.resolve_path(&directive.data);

        if context.state.include_stack.contains(&path) {
            context.error(
                codes::MISSING_INCLUDE,
                directive,
                format!("Recursive include of '{}'", path),
            );
            return Ok(None);
        }

        let text = match context.filesystem.read(&path) {
            Ok(text) => text,
            Err(err) => {
                context.error(
                    codes::MISSING_INCLUDE,
                    directive,
                    format!("Include file '{}' could not be read: {}", path, err),
                );
                return Ok(None);
            }
        };
        context.state.add_dependency(path.clone());
        let text = select(&text, directive);

        if directive.has_option("literal") || directive.has_option("code") {
            let language = directive
                .option("code")
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string);
            return Ok(Some(Node::Code(CodeNode {
                value: text.trim_matches('\n').to_string(),
                language,
                ..Default::default()
            })));
        }

        context.state.include_stack.push(path);
        let children = context.parse_included(&text, directive.line);
        context.state.include_stack.pop();

        Ok(Some(Node::Collection(CollectionNode {
            children: children?,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Reporter;
    use crate::directives::tests::{directive, run};
    use crate::directives::{DirectiveRegistry, DocumentState};
    use crate::fs::MemoryFilesystem;
    use crate::parser::Parser;

    #[test]
    fn test_include_parses_nested_content() {
        let fs = MemoryFilesystem::with_files([(
            "guide/part.rst",
            "Included paragraph.\n\n.. note:: Nested note.\n",
        )]);
        let raw = directive("include", "part.rst", "");
        let (node, state, _) = run(&raw, &fs, "guide/index");

        let Some(Node::Collection(collection)) = node else {
            panic!("expected a collection");
        };
        assert_eq!(collection.children.len(), 2);
        assert!(matches!(collection.children[1], Node::Admonition(_)));
        assert_eq!(state.dependencies, vec!["guide/part.rst".to_string()]);
        assert!(state.include_stack.is_empty());
    }

    #[test]
    fn test_included_headings_continue_host_hierarchy() {
        let fs = MemoryFilesystem::with_files([(
            "guide/part.rst",
            "Part\n----\n\nBody.\n\n.. _home: https://example.org\n",
        )]);
        let raw = directive("include", "part.rst", "");
        let parser = Parser::new();
        let registry = DirectiveRegistry::with_defaults();
        let reporter = Reporter::new();
        let mut state = DocumentState::new("guide/index");
        state.title_letters = vec!['='];
        let node = {
            let mut context = DirectiveContext::new(&parser, &registry, &fs, &reporter, &mut state);
            registry.process(&raw, &mut context).unwrap()
        };

        let Some(Node::Collection(collection)) = node else {
            panic!("expected a collection");
        };
        let Node::Section(section) = &collection.children[0] else {
            panic!("expected a section, got {:?}", collection.children[0]);
        };
        assert_eq!(section.title.level, 2);
        assert!(matches!(section.children[0], Node::Paragraph(_)));
        assert_eq!(state.title_letters, vec!['=', '-']);
        assert_eq!(state.links.get("home").map(String::as_str), Some("https://example.org"));
    }

    #[test]
    fn test_missing_include_is_dropped_with_error() {
        let raw = directive("include", "nope.rst", "");
        let (node, _, reporter) = run(&raw, &MemoryFilesystem::new(), "index");
        assert!(node.is_none());
        let diagnostics = reporter.diagnostics();
        assert!(diagnostics[0].is_error());
        assert_eq!(diagnostics[0].code.as_deref(), Some(codes::MISSING_INCLUDE));
    }

    #[test]
    fn test_recursive_include_is_stopped() {
        let fs = MemoryFilesystem::with_files([("loop.rst", "Text.\n\n.. include:: loop.rst\n")]);
        let raw = directive("include", "loop.rst", "");
        let (node, _, reporter) = run(&raw, &fs, "index");

        let Some(Node::Collection(collection)) = node else {
            panic!("expected a collection");
        };
        assert_eq!(collection.children.len(), 1);
        assert!(reporter.has_errors());
    }

    #[test]
    fn test_literal_include_with_markers() {
        let fs = MemoryFilesystem::with_files([("snippet.txt", "skip\n# start\nkeep me\n# end\nskip")]);
        let mut raw = directive("include", "snippet.txt", "");
        raw.options.insert("literal".to_string(), String::new());
        raw.options.insert("start-after".to_string(), "# start".to_string());
        raw.options.insert("end-before".to_string(), "# end".to_string());
        let (node, _, _) = run(&raw, &fs, "index");

        let Some(Node::Code(code)) = node else {
            panic!("expected code");
        };
        assert_eq!(code.value, "keep me");
    }
}
