//! Rendering dispatch
//!
//! A [`RendererRegistry`] maps each [`NodeKind`] to the [`NodeRenderer`]
//! registered last for it. Kinds nobody renders go to a placeholder that
//! emits an HTML comment and reports the gap. [`PreNodeRenderer`]s may
//! adjust a copy of a node right before it is rendered.

pub mod html;
pub mod output;
pub mod template;

use std::sync::Arc;

use rstdok_ast::{DocumentNode, Node, NodeKind, ProjectNode};

use crate::compiler::UrlGenerator;
use crate::diagnostics::{codes, Reporter};
use crate::error::Result;

pub use html::{html_escape, HtmlRenderer};
pub use output::{render_project, RenderOptions};
pub use template::{TemplateNodeRenderer, TemplateRenderer};

/// Renders nodes of the kinds it supports
pub trait NodeRenderer: Send + Sync {
    fn name(&self) -> &'static str;

    fn supports(&self, kind: NodeKind) -> bool;

    fn render(&self, node: &Node, context: &RenderContext<'_>) -> Result<String>;
}

/// Adjusts a node right before rendering
pub trait PreNodeRenderer: Send + Sync {
    fn supports(&self, kind: NodeKind) -> bool;

    fn prepare(&self, node: &mut Node, context: &RenderContext<'_>);
}

/// Everything a renderer can see
pub struct RenderContext<'a> {
    pub registry: &'a RendererRegistry,
    pub project: &'a ProjectNode,
    pub document: &'a DocumentNode,
    pub urls: &'a UrlGenerator,
    pub reporter: &'a Reporter,
}

impl RenderContext<'_> {
    /// Render a node through the registry
    pub fn render_node(&self, node: &Node) -> Result<String> {
        self.registry.render_node(node, self)
    }

    /// Render a child list, one node per line
    pub fn render_nodes(&self, nodes: &[Node]) -> Result<String> {
        let mut parts = Vec::with_capacity(nodes.len());
        for node in nodes {
            let html = self.render_node(node)?;
            if !html.is_empty() {
                parts.push(html);
            }
        }
        Ok(parts.join("\n"))
    }

    /// Path of the document being rendered
    pub fn file_path(&self) -> &str {
        &self.document.file_path
    }
}

/// Emits a comment for nodes without a renderer
pub struct PlaceholderRenderer;

impl NodeRenderer for PlaceholderRenderer {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn supports(&self, _kind: NodeKind) -> bool {
        true
    }

    fn render(&self, node: &Node, context: &RenderContext<'_>) -> Result<String> {
        context.reporter.warning(
            codes::UNSUPPORTED_NODE,
            context.file_path(),
            None,
            format!("No renderer registered for node kind '{}'", node.kind()),
        );
        Ok(format!("<!-- unsupported node: {} -->", node.kind()))
    }
}

/// Makes source-root image paths (`/img/a.png`) relative to the page
pub struct RelativeUrlPreRenderer;

impl RelativeUrlPreRenderer {
    fn relative(src: &str, context: &RenderContext<'_>) -> Option<String> {
        let rooted = src.strip_prefix('/')?;
        if src.starts_with("//") {
            return None;
        }
        Some(format!("{}{}", context.urls.root_prefix(context.file_path()), rooted))
    }
}

impl PreNodeRenderer for RelativeUrlPreRenderer {
    fn supports(&self, kind: NodeKind) -> bool {
        matches!(kind, NodeKind::Image | NodeKind::Figure)
    }

    fn prepare(&self, node: &mut Node, context: &RenderContext<'_>) {
        let image = match node {
            Node::Image(image) => image,
            Node::Figure(figure) => &mut figure.image,
            _ => return,
        };
        if let Some(src) = Self::relative(&image.src, context) {
            image.src = src;
        }
    }
}

/// Node renderers and pre-renderers by kind
#[derive(Clone)]
pub struct RendererRegistry {
    renderers: Vec<Arc<dyn NodeRenderer>>,
    pre_renderers: Vec<Arc<dyn PreNodeRenderer>>,
    fallback: Arc<dyn NodeRenderer>,
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("renderers", &self.renderer_names())
            .field("pre_renderers", &self.pre_renderers.len())
            .finish()
    }
}

impl RendererRegistry {
    /// Registry with the placeholder fallback only
    pub fn new() -> Self {
        Self {
            renderers: Vec::new(),
            pre_renderers: Vec::new(),
            fallback: Arc::new(PlaceholderRenderer),
        }
    }

    /// HTML for every node kind, relative image URLs
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(HtmlRenderer));
        registry.register_pre(Arc::new(RelativeUrlPreRenderer));
        registry
    }

    /// Later registrations take precedence for the kinds they support
    pub fn register(&mut self, renderer: Arc<dyn NodeRenderer>) {
        self.renderers.push(renderer);
    }

    pub fn register_pre(&mut self, pre_renderer: Arc<dyn PreNodeRenderer>) {
        self.pre_renderers.push(pre_renderer);
    }

    pub fn renderer_names(&self) -> Vec<&'static str> {
        self.renderers.iter().map(|r| r.name()).collect()
    }

    /// Renderer for a kind, the placeholder when none supports it
    pub fn renderer_for(&self, kind: NodeKind) -> &dyn NodeRenderer {
        self.renderers
            .iter()
            .rev()
            .find(|r| r.supports(kind))
            .unwrap_or(&self.fallback)
            .as_ref()
    }

    /// Run the pre-renderers, then the node's renderer
    pub fn render_node(&self, node: &Node, context: &RenderContext<'_>) -> Result<String> {
        let kind = node.kind();
        let renderer = self.renderer_for(kind);
        let pre: Vec<_> = self.pre_renderers.iter().filter(|p| p.supports(kind)).collect();
        if pre.is_empty() {
            return renderer.render(node, context);
        }

        let mut prepared = node.clone();
        for pre_renderer in pre {
            pre_renderer.prepare(&mut prepared, context);
        }
        renderer.render(&prepared, context)
    }

    /// Body HTML of a whole document
    pub fn render_document(
        &self,
        document: &DocumentNode,
        project: &ProjectNode,
        urls: &UrlGenerator,
        reporter: &Reporter,
    ) -> Result<String> {
        let context = RenderContext {
            registry: self,
            project,
            document,
            urls,
            reporter,
        };
        context.render_nodes(&document.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstdok_ast::{ImageNode, InlineCompoundNode, ParagraphNode};

    struct Shouting;

    impl NodeRenderer for Shouting {
        fn name(&self) -> &'static str {
            "shouting"
        }

        fn supports(&self, kind: NodeKind) -> bool {
            kind == NodeKind::Paragraph
        }

        fn render(&self, node: &Node, _context: &RenderContext<'_>) -> Result<String> {
            let Node::Paragraph(p) = node else {
                return Ok(String::new());
            };
            Ok(p.content.to_plain_text().to_uppercase())
        }
    }

    fn document(children: Vec<Node>) -> DocumentNode {
        let mut doc = DocumentNode::new("guide/page", "");
        doc.children = children;
        doc
    }

    fn paragraph(text: &str) -> Node {
        Node::Paragraph(ParagraphNode {
            content: InlineCompoundNode::plain(text),
        })
    }

    #[test]
    fn test_unknown_kind_renders_placeholder_and_reports() {
        let registry = RendererRegistry::new();
        let reporter = Reporter::new();
        let html = registry
            .render_document(
                &document(vec![Node::Separator]),
                &ProjectNode::default(),
                &UrlGenerator::default(),
                &reporter,
            )
            .unwrap();
        assert_eq!(html, "<!-- unsupported node: separator -->");
        assert_eq!(
            reporter.diagnostics()[0].code.as_deref(),
            Some(codes::UNSUPPORTED_NODE)
        );
    }

    #[test]
    fn test_later_registration_wins() {
        let mut registry = RendererRegistry::with_defaults();
        registry.register(Arc::new(Shouting));
        assert_eq!(registry.renderer_for(NodeKind::Paragraph).name(), "shouting");
        assert_eq!(registry.renderer_for(NodeKind::Separator).name(), "html");

        let html = registry
            .render_document(
                &document(vec![paragraph("hi"), Node::Separator]),
                &ProjectNode::default(),
                &UrlGenerator::default(),
                &Reporter::new(),
            )
            .unwrap();
        assert_eq!(html, "HI\n<hr />");
    }

    #[test]
    fn test_rooted_image_paths_become_relative() {
        let registry = RendererRegistry::with_defaults();
        let image = Node::Image(ImageNode {
            src: "/static/logo.png".to_string(),
            ..Default::default()
        });
        let html = registry
            .render_document(
                &document(vec![image]),
                &ProjectNode::default(),
                &UrlGenerator::default(),
                &Reporter::new(),
            )
            .unwrap();
        assert!(html.contains("src=\"../static/logo.png\""), "{}", html);
    }
}
