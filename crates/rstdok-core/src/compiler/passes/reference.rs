//! Cross-reference resolution
//!
//! Each [`ReferenceResolver`] handles some reference kinds; the first one
//! that produces a URL wins. Unresolved references stay in the tree without
//! a URL and are reported once.

use std::collections::BTreeMap;
use std::sync::Arc;

use rstdok_ast::{DocumentNode, InlineNode, Node, ProjectNode, ReferenceKind, ReferenceNode};

use crate::compiler::{CompilerContext, CompilerPass, NodeTransformer, TreeWalker, UrlGenerator};
use crate::diagnostics::codes;
use crate::error::CompilerError;
use crate::fs::{dirname, join, strip_extension};
use crate::parser::inline::roles::is_external;
use crate::parser::slugify;

/// A resolved reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub url: String,
    /// Title of the target, when it has one
    pub title: Option<String>,
}

/// What a resolver can look at
pub struct ResolveScope<'a> {
    /// Document containing the reference
    pub document: &'a str,
    /// External targets of that document
    pub links: &'a BTreeMap<String, String>,
    pub project: &'a ProjectNode,
    pub urls: &'a UrlGenerator,
}

impl ResolveScope<'_> {
    /// URL of an anchor from the link-target table
    pub fn anchor(&self, anchor: &str) -> Option<ResolvedReference> {
        let target = self.project.link_target(anchor)?;
        Some(ResolvedReference {
            url: self
                .urls
                .relative_url(self.document, &target.document, Some(&target.anchor)),
            title: Some(target.title.clone()),
        })
    }
}

pub trait ReferenceResolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn supports(&self, reference: &ReferenceNode) -> bool;

    fn resolve(&self, reference: &ReferenceNode, scope: &ResolveScope<'_>) -> Option<ResolvedReference>;
}

/// `:ref:` against the project's anchor table
pub struct AnchorResolver;

impl ReferenceResolver for AnchorResolver {
    fn name(&self) -> &'static str {
        "anchor"
    }

    fn supports(&self, reference: &ReferenceNode) -> bool {
        reference.kind == ReferenceKind::Ref
    }

    fn resolve(&self, reference: &ReferenceNode, scope: &ResolveScope<'_>) -> Option<ResolvedReference> {
        scope.anchor(&reference.target)
    }
}

/// `:doc:` against the document entries. Relative to the referring
/// document; a leading `/` starts from the source root.
pub struct DocumentResolver;

impl ReferenceResolver for DocumentResolver {
    fn name(&self) -> &'static str {
        "document"
    }

    fn supports(&self, reference: &ReferenceNode) -> bool {
        reference.kind == ReferenceKind::Doc
    }

    fn resolve(&self, reference: &ReferenceNode, scope: &ResolveScope<'_>) -> Option<ResolvedReference> {
        let (path, anchor) = match reference.target.split_once('#') {
            Some((path, anchor)) => (path, Some(anchor)),
            None => (reference.target.as_str(), None),
        };
        let mut file = join(&dirname(scope.document), path);
        if !scope.project.documents.contains_key(&file) {
            file = strip_extension(&file);
        }
        let entry = scope.project.document_entry(&file)?;
        Some(ResolvedReference {
            url: scope.urls.relative_url(scope.document, &entry.file, anchor),
            title: Some(entry.title.clone()),
        })
    }
}

/// `name_` references: the document's external targets, inline URLs, then
/// anchors
pub struct NamedResolver;

impl ReferenceResolver for NamedResolver {
    fn name(&self) -> &'static str {
        "named"
    }

    fn supports(&self, reference: &ReferenceNode) -> bool {
        matches!(reference.kind, ReferenceKind::Named | ReferenceKind::Anonymous)
    }

    fn resolve(&self, reference: &ReferenceNode, scope: &ResolveScope<'_>) -> Option<ResolvedReference> {
        if let Some(url) = scope.links.get(&reference.target) {
            return Some(ResolvedReference {
                url: url.clone(),
                title: None,
            });
        }
        if is_external(&reference.target) {
            return Some(ResolvedReference {
                url: reference.target.clone(),
                title: None,
            });
        }
        scope.anchor(&slugify(&reference.target))
    }
}

/// Resolves every reference of the compiled documents
pub struct ReferenceResolverPass {
    resolvers: Vec<Arc<dyn ReferenceResolver>>,
    urls: UrlGenerator,
}

impl ReferenceResolverPass {
    pub fn new(urls: UrlGenerator) -> Self {
        Self {
            resolvers: Vec::new(),
            urls,
        }
    }

    pub fn with_defaults(urls: UrlGenerator) -> Self {
        let mut pass = Self::new(urls);
        pass.add_resolver(Arc::new(AnchorResolver));
        pass.add_resolver(Arc::new(DocumentResolver));
        pass.add_resolver(Arc::new(NamedResolver));
        pass
    }

    pub fn add_resolver(&mut self, resolver: Arc<dyn ReferenceResolver>) {
        self.resolvers.push(resolver);
    }

    pub fn resolver_names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }
}

impl CompilerPass for ReferenceResolverPass {
    fn name(&self) -> &'static str {
        "reference_resolver"
    }

    fn priority(&self) -> i32 {
        500
    }

    fn run(
        &mut self,
        documents: Vec<DocumentNode>,
        context: &mut CompilerContext<'_>,
    ) -> Result<Vec<DocumentNode>, CompilerError> {
        let mut transformer = ResolveTransformer {
            resolvers: self.resolvers.clone(),
            urls: self.urls.clone(),
            links: BTreeMap::new(),
        };
        let mut walker = TreeWalker::new(&mut transformer);
        let mut output = Vec::with_capacity(documents.len());
        for document in documents {
            if let Some(document) = walker.walk_document(document, context)? {
                output.push(document);
            }
        }
        Ok(output)
    }
}

struct ResolveTransformer {
    resolvers: Vec<Arc<dyn ReferenceResolver>>,
    urls: UrlGenerator,
    links: BTreeMap<String, String>,
}

impl ResolveTransformer {
    fn resolve_inlines(&self, inlines: &mut [InlineNode], context: &CompilerContext<'_>) {
        for inline in inlines {
            match inline {
                InlineNode::Reference(reference) if !reference.is_resolved() => {
                    self.resolve(reference, context)
                }
                InlineNode::Variable(variable) => {
                    if let Some(value) = variable.value.as_mut() {
                        self.resolve_inlines(value, context);
                    }
                }
                _ => {}
            }
        }
    }

    fn resolve(&self, reference: &mut ReferenceNode, context: &CompilerContext<'_>) {
        let scope = ResolveScope {
            document: context.document(),
            links: &self.links,
            project: &*context.project,
            urls: &self.urls,
        };
        let target: &ReferenceNode = reference;
        let resolved = self
            .resolvers
            .iter()
            .filter(|r| r.supports(target))
            .find_map(|r| r.resolve(target, &scope));

        match resolved {
            Some(resolved) => {
                reference.url = Some(resolved.url);
                reference.resolved_title = resolved.title;
            }
            None => context.warning(
                codes::UNRESOLVED_REFERENCE,
                format!(
                    "Unable to resolve {:?} reference to '{}'",
                    reference.kind, reference.target
                ),
            ),
        }
    }
}

impl NodeTransformer for ResolveTransformer {
    fn name(&self) -> &'static str {
        "reference_resolver"
    }

    fn supports(&self, node: &Node) -> bool {
        matches!(
            node,
            Node::Section(_)
                | Node::Paragraph(_)
                | Node::DefinitionList(_)
                | Node::Admonition(_)
                | Node::Container(_)
        )
    }

    fn enter_document(
        &mut self,
        document: &DocumentNode,
        _context: &mut CompilerContext<'_>,
    ) -> Result<(), CompilerError> {
        self.links = document.links.clone();
        Ok(())
    }

    fn enter_node(
        &mut self,
        node: &mut Node,
        context: &mut CompilerContext<'_>,
    ) -> Result<(), CompilerError> {
        for compound in node.inline_compounds_mut() {
            self.resolve_inlines(&mut compound.children, context);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Reporter;
    use rstdok_ast::{DocumentEntryNode, InlineCompoundNode, InternalTarget, ParagraphNode};

    fn project() -> ProjectNode {
        let mut project = ProjectNode::default();
        project.add_document_entry(DocumentEntryNode::new("a", "Page A"));
        project.add_document_entry(DocumentEntryNode::new("guide/setup", "Setup"));
        project
            .add_link_target(InternalTarget {
                document: "a".to_string(),
                anchor: "foo".to_string(),
                title: "Foo".to_string(),
            })
            .unwrap();
        project
    }

    fn document(path: &str, references: Vec<ReferenceNode>) -> DocumentNode {
        let mut doc = DocumentNode::new(path, "");
        doc.push(Node::Paragraph(ParagraphNode {
            content: InlineCompoundNode::new(
                references.into_iter().map(InlineNode::Reference).collect(),
            ),
        }));
        doc
    }

    fn references(doc: &DocumentNode) -> Vec<ReferenceNode> {
        let Node::Paragraph(paragraph) = &doc.children[0] else {
            panic!("expected a paragraph");
        };
        paragraph
            .content
            .children
            .iter()
            .filter_map(|i| match i {
                InlineNode::Reference(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    fn resolve(path: &str, refs: Vec<ReferenceNode>) -> (Vec<ReferenceNode>, Reporter) {
        let mut project = project();
        let reporter = Reporter::new();
        let mut context = CompilerContext::new(&mut project, reporter.clone());
        let mut pass = ReferenceResolverPass::with_defaults(UrlGenerator::default());
        let docs = pass.run(vec![document(path, refs)], &mut context).unwrap();
        (references(&docs[0]), reporter)
    }

    #[test]
    fn test_anchor_from_sibling_and_subdirectory() {
        let (refs, _) = resolve("b", vec![ReferenceNode::new(ReferenceKind::Ref, "foo", None)]);
        assert_eq!(refs[0].url.as_deref(), Some("a.html#foo"));
        assert_eq!(refs[0].display_text(), "Foo");

        let (refs, _) = resolve("sub/b", vec![ReferenceNode::new(ReferenceKind::Ref, "foo", None)]);
        assert_eq!(refs[0].url.as_deref(), Some("../a.html#foo"));
    }

    #[test]
    fn test_unresolved_anchor_is_reported_and_left_alone() {
        let (refs, reporter) = resolve("b", vec![ReferenceNode::new(ReferenceKind::Ref, "nope", None)]);
        assert_eq!(refs[0].url, None);
        let diagnostics = reporter.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_deref(), Some(codes::UNRESOLVED_REFERENCE));
        assert_eq!(diagnostics[0].file.as_deref(), Some("b"));
    }

    #[test]
    fn test_document_references() {
        let (refs, reporter) = resolve(
            "guide/index",
            vec![
                ReferenceNode::new(ReferenceKind::Doc, "setup", None),
                ReferenceNode::new(ReferenceKind::Doc, "/a", None),
                ReferenceNode::new(ReferenceKind::Doc, "../a.rst", None),
            ],
        );
        assert_eq!(refs[0].url.as_deref(), Some("setup.html"));
        assert_eq!(refs[0].display_text(), "Setup");
        assert_eq!(refs[1].url.as_deref(), Some("../a.html"));
        assert_eq!(refs[2].url.as_deref(), Some("../a.html"));
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn test_named_references() {
        let mut project = project();
        let reporter = Reporter::new();
        let mut context = CompilerContext::new(&mut project, reporter.clone());
        let mut doc = document(
            "b",
            vec![
                ReferenceNode::new(ReferenceKind::Named, "rust", None),
                ReferenceNode::new(ReferenceKind::Named, "foo", None),
            ],
        );
        doc.links
            .insert("rust".to_string(), "https://rust-lang.org".to_string());

        let mut pass = ReferenceResolverPass::with_defaults(UrlGenerator::default());
        let docs = pass.run(vec![doc], &mut context).unwrap();
        let refs = references(&docs[0]);
        assert_eq!(refs[0].url.as_deref(), Some("https://rust-lang.org"));
        assert_eq!(refs[1].url.as_deref(), Some("a.html#foo"));
    }
}
