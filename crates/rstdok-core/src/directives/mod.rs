//! Directive dispatch
//!
//! The parser leaves every `.. name::` block as a raw [`DirectiveNode`]. The
//! [`DirectiveRegistry`] maps a case-insensitive name (or alias) to a
//! [`DirectiveHandler`] that turns it into a typed node. Unknown names fall
//! back to a [`GeneralDirectiveNode`] keeping the body verbatim.
//!
//! # Example
//!
//! ```
//! use rstdok_core::directives::DirectiveRegistry;
//!
//! let registry = DirectiveRegistry::with_defaults();
//! assert!(registry.get("Code-Block").is_some());
//! assert!(registry.get("sourcecode").is_some());
//! assert!(registry.get("no-such-directive").is_none());
//! ```

pub mod admonition;
pub mod code;
pub mod container;
pub mod contents;
pub mod image;
pub mod include;
pub mod meta;
pub mod raw;
pub mod substitution;
pub mod toctree;
pub mod uml;

use std::collections::BTreeMap;
use std::sync::Arc;

use rstdok_ast::{
    DirectiveNode, GeneralDirectiveNode, InlineCompoundNode, MetadataNode, Node,
};

use crate::diagnostics::{codes, Reporter};
use crate::error::ParseError;
use crate::fs::{dirname, join, Filesystem};
use crate::parser::Parser;

pub use toctree::ToctreeBuilder;

/// Turns one raw directive into a typed node
pub trait DirectiveHandler: Send + Sync {
    /// Primary directive name
    fn name(&self) -> &'static str;

    /// Additional names dispatched to this handler
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Produce the replacement node. `Ok(None)` removes the directive from
    /// the tree (definitions, dropped includes).
    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError>;
}

/// Registered handlers keyed by lower-cased name and alias
#[derive(Clone, Default)]
pub struct DirectiveRegistry {
    handlers: BTreeMap<String, Arc<dyn DirectiveHandler>>,
}

impl std::fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

impl DirectiveRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in handler
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for handler in admonition::all() {
            registry.register(handler);
        }
        registry.register(Arc::new(code::CodeBlockDirective));
        registry.register(Arc::new(code::LiteralIncludeDirective));
        registry.register(Arc::new(image::ImageDirective));
        registry.register(Arc::new(image::FigureDirective));
        registry.register(Arc::new(include::IncludeDirective));
        registry.register(Arc::new(toctree::ToctreeDirective));
        registry.register(Arc::new(uml::UmlDirective));
        registry.register(Arc::new(raw::RawDirective));
        registry.register(Arc::new(container::ContainerDirective));
        registry.register(Arc::new(container::ClassDirective));
        registry.register(Arc::new(container::TopicDirective));
        registry.register(Arc::new(container::RubricDirective));
        registry.register(Arc::new(contents::ContentsDirective));
        registry.register(Arc::new(substitution::ReplaceDirective));
        registry.register(Arc::new(meta::MetaDirective));
        registry
    }

    /// Register a handler under its name and aliases, replacing earlier ones
    pub fn register(&mut self, handler: Arc<dyn DirectiveHandler>) {
        for alias in handler.aliases() {
            self.handlers.insert(alias.to_lowercase(), handler.clone());
        }
        self.handlers.insert(handler.name().to_lowercase(), handler);
    }

    /// Handler for a directive name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn DirectiveHandler>> {
        self.handlers.get(&name.to_lowercase())
    }

    /// All registered names, aliases included
    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Dispatch one directive
    pub fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError> {
        match self.get(&directive.name) {
            Some(handler) => {
                tracing::trace!(
                    directive = directive.name.as_str(),
                    handler = handler.name(),
                    "Dispatching directive"
                );
                handler.process(directive, context)
            }
            None => general_directive(directive, context).map(Some),
        }
    }
}

/// Fallback for unknown directives: body kept verbatim and parsed as nested
/// content
fn general_directive(
    directive: &DirectiveNode,
    context: &mut DirectiveContext<'_>,
) -> Result<Node, ParseError> {
    context.warning(
        codes::UNKNOWN_DIRECTIVE,
        directive,
        format!("Unknown directive '{}'", directive.name),
    );
    let children = context.parse_nested(&directive.content, directive.line)?;
    Ok(Node::GeneralDirective(GeneralDirectiveNode {
        name: directive.name.clone(),
        data: directive.data.clone(),
        options: directive.options.clone(),
        raw_content: directive.content.clone(),
        children,
    }))
}

/// Per-document data directives may read and extend
#[derive(Debug, Clone, Default)]
pub struct DocumentState {
    /// Path of the document being processed (extension-less)
    pub file_path: String,
    /// Substitution definitions
    pub variables: BTreeMap<String, InlineCompoundNode>,
    /// Files read while processing the document
    pub dependencies: Vec<String>,
    /// Header metadata
    pub headers: Vec<MetadataNode>,
    /// Files currently being included, innermost last
    pub include_stack: Vec<String>,
    /// Section adornment characters of the document, in level order
    pub title_letters: Vec<char>,
    /// External hyperlink targets
    pub links: BTreeMap<String, String>,
}

impl DocumentState {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    /// Record a dependency once
    pub fn add_dependency(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.dependencies.contains(&path) {
            self.dependencies.push(path);
        }
    }
}

/// What a handler can reach while it processes a directive
pub struct DirectiveContext<'a> {
    pub parser: &'a Parser,
    pub registry: &'a DirectiveRegistry,
    pub filesystem: &'a dyn Filesystem,
    pub reporter: &'a Reporter,
    pub state: &'a mut DocumentState,
}

impl<'a> DirectiveContext<'a> {
    pub fn new(
        parser: &'a Parser,
        registry: &'a DirectiveRegistry,
        filesystem: &'a dyn Filesystem,
        reporter: &'a Reporter,
        state: &'a mut DocumentState,
    ) -> Self {
        Self {
            parser,
            registry,
            filesystem,
            reporter,
            state,
        }
    }

    /// Path of the document being processed
    pub fn file_path(&self) -> &str {
        &self.state.file_path
    }

    /// Directory of the document, relative to the source root
    pub fn directory(&self) -> String {
        dirname(&self.state.file_path)
    }

    /// Resolve a path written in the document; `/path` is source-root
    /// relative
    pub fn resolve_path(&self, path: &str) -> String {
        join(&self.directory(), path.trim())
    }

    pub fn warning(&self, code: &str, directive: &DirectiveNode, message: impl Into<String>) {
        self.reporter
            .warning(code, &self.state.file_path, Some(directive.line), message);
    }

    pub fn error(&self, code: &str, directive: &DirectiveNode, message: impl Into<String>) {
        self.reporter
            .error(code, &self.state.file_path, Some(directive.line), message);
    }

    /// Parse inline markup (titles, captions, substitution values)
    pub fn parse_inline(&self, text: &str) -> InlineCompoundNode {
        self.parser.grammar().inline.parse(text)
    }

    /// Parse body content and dispatch the directives it contains
    pub fn parse_nested(&mut self, text: &str, line: usize) -> Result<Vec<Node>, ParseError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut nodes = self.parser.parse_fragment(text, &self.state.file_path)?;
        // nested directive lines count from the directive marker
        shift_lines(&mut nodes, line);
        self.dispatch_nodes(nodes)
    }

    /// Parse the text of an included file and dispatch its directives.
    /// Section titles join the hierarchy of the including document.
    pub fn parse_included(&mut self, text: &str, line: usize) -> Result<Vec<Node>, ParseError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let content = self.parser.parse_included(
            text,
            &self.state.file_path,
            &mut self.state.title_letters,
        )?;
        for (name, url) in content.links {
            self.state.links.entry(name).or_insert(url);
        }
        let mut nodes = content.nodes;
        shift_lines(&mut nodes, line);
        self.dispatch_nodes(nodes)
    }

    /// Replace every raw directive in `nodes`, depth first. Collections
    /// returned by handlers are spliced into the surrounding list.
    pub fn dispatch_nodes(&mut self, nodes: Vec<Node>) -> Result<Vec<Node>, ParseError> {
        let registry = self.registry;
        let mut output = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Directive(directive) => match registry.process(&directive, self)? {
                    Some(Node::Collection(collection)) => output.extend(collection.children),
                    Some(node) => output.push(node),
                    None => {}
                },
                mut node => {
                    for children in node.child_lists_mut() {
                        let taken = std::mem::take(children);
                        *children = self.dispatch_nodes(taken)?;
                    }
                    output.push(node);
                }
            }
        }
        Ok(output)
    }

    /// Integer option; invalid values are reported and ignored
    pub fn option_usize(&self, directive: &DirectiveNode, name: &str) -> Option<usize> {
        let value = directive.option(name)?;
        match value.trim().parse() {
            Ok(number) => Some(number),
            Err(_) => {
                self.warning(
                    codes::INVALID_OPTION,
                    directive,
                    format!(
                        "Option '{}' of directive '{}' expects a number, got '{}'",
                        name, directive.name, value
                    ),
                );
                None
            }
        }
    }
}

/// Space separated `:class:` values
pub fn classes(directive: &DirectiveNode) -> Vec<String> {
    directive
        .option("class")
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

fn shift_lines(nodes: &mut [Node], offset: usize) {
    for node in nodes {
        if let Node::Directive(directive) = node {
            directive.line += offset;
        }
        for children in node.child_lists_mut() {
            shift_lines(children, offset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFilesystem;

    pub(crate) fn directive(name: &str, data: &str, content: &str) -> DirectiveNode {
        DirectiveNode {
            name: name.to_string(),
            data: data.to_string(),
            content: content.to_string(),
            line: 1,
            ..Default::default()
        }
    }

    pub(crate) fn run(
        directive: &DirectiveNode,
        fs: &MemoryFilesystem,
        file_path: &str,
    ) -> (Option<Node>, DocumentState, Reporter) {
        let parser = Parser::new();
        let registry = DirectiveRegistry::with_defaults();
        let reporter = Reporter::new();
        let mut state = DocumentState::new(file_path);
        let node = {
            let mut context = DirectiveContext::new(&parser, &registry, fs, &reporter, &mut state);
            registry.process(directive, &mut context).unwrap()
        };
        (node, state, reporter)
    }

    #[test]
    fn test_lookup_is_case_insensitive_with_aliases() {
        let registry = DirectiveRegistry::with_defaults();
        assert_eq!(registry.get("CODE").map(|h| h.name()), Some("code-block"));
        assert_eq!(registry.get("Note").map(|h| h.name()), Some("note"));
        assert!(registry.names().contains(&"sidebar"));
    }

    #[test]
    fn test_unknown_directive_keeps_body_verbatim() {
        let body = "Some *text*\n\n   indented  stays\n:not: an option";
        let raw = directive("py:function", "main()", body);
        let (node, _, reporter) = run(&raw, &MemoryFilesystem::new(), "index");

        let Some(Node::GeneralDirective(general)) = node else {
            panic!("expected a general directive");
        };
        assert_eq!(general.name, "py:function");
        assert_eq!(general.data, "main()");
        assert_eq!(general.raw_content, body);
        assert!(!general.children.is_empty());
        assert_eq!(reporter.diagnostics()[0].code.as_deref(), Some(codes::UNKNOWN_DIRECTIVE));
    }

    #[test]
    fn test_nested_directives_are_dispatched() {
        let raw = directive("note", "", "Before.\n\n.. code-block:: rust\n\n   fn main() {}\n");
        let (node, _, _) = run(&raw, &MemoryFilesystem::new(), "index");

        let Some(Node::Admonition(note)) = node else {
            panic!("expected an admonition");
        };
        assert!(matches!(note.children[1], Node::Code(_)));
    }

    #[test]
    fn test_invalid_number_option_is_reported() {
        let mut raw = directive("toctree", "", "");
        raw.options.insert("maxdepth".to_string(), "two".to_string());
        let (node, _, reporter) = run(&raw, &MemoryFilesystem::new(), "index");

        let Some(Node::Toctree(toc)) = node else {
            panic!("expected a toctree");
        };
        assert_eq!(toc.max_depth, 0);
        assert_eq!(reporter.diagnostics()[0].code.as_deref(), Some(codes::INVALID_OPTION));
    }
}
