//! Template-backed node rendering
//!
//! The template engine itself is opaque: anything that can render a named
//! template with JSON data implements [`TemplateRenderer`].

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use rstdok_ast::{Node, NodeKind};
use serde_json::json;

use super::{NodeRenderer, RenderContext};
use crate::error::{Error, Result};

/// A template engine
pub trait TemplateRenderer: Send + Sync {
    /// Render `template` with `data`
    fn render_template(&self, template: &str, data: &serde_json::Value) -> Result<String>;

    /// Whether `template` exists
    fn is_template_found(&self, template: &str) -> bool;
}

/// Renders node kinds that have a `nodes/<kind>.html` template
///
/// Templates receive the node serialised as `node`, the document path as
/// `document`, and the rendered child lists as `children`.
pub struct TemplateNodeRenderer {
    engine: Arc<dyn TemplateRenderer>,
}

impl TemplateNodeRenderer {
    pub fn new(engine: Arc<dyn TemplateRenderer>) -> Self {
        Self { engine }
    }

    /// Template name for a node kind
    pub fn template_name(kind: NodeKind) -> String {
        format!("nodes/{}.html", kind.as_str())
    }
}

impl NodeRenderer for TemplateNodeRenderer {
    fn name(&self) -> &'static str {
        "template"
    }

    fn supports(&self, kind: NodeKind) -> bool {
        self.engine.is_template_found(&Self::template_name(kind))
    }

    fn render(&self, node: &Node, context: &RenderContext<'_>) -> Result<String> {
        let mut children = Vec::new();
        for list in node.child_lists() {
            children.push(context.render_nodes(list)?);
        }
        let data = json!({
            "node": serde_json::to_value(node)?,
            "document": context.file_path(),
            "children": children,
        });
        self.engine
            .render_template(&Self::template_name(node.kind()), &data)
    }
}

/// Template engine replacing `{{ path.to.value }}` placeholders with JSON
/// values; used for tests and as a minimal page layout engine
#[derive(Debug, Default)]
pub struct SimpleTemplateEngine {
    templates: RwLock<BTreeMap<String, String>>,
}

impl SimpleTemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a template
    pub fn add_template(&self, name: impl Into<String>, source: impl Into<String>) {
        if let Ok(mut templates) = self.templates.write() {
            templates.insert(name.into(), source.into());
        }
    }

    fn lookup<'v>(data: &'v serde_json::Value, path: &str) -> Option<&'v serde_json::Value> {
        path.split('.')
            .try_fold(data, |value, key| match key.parse::<usize>() {
                Ok(index) => value.get(index),
                Err(_) => value.get(key),
            })
    }
}

impl TemplateRenderer for SimpleTemplateEngine {
    fn render_template(&self, template: &str, data: &serde_json::Value) -> Result<String> {
        let templates = self
            .templates
            .read()
            .map_err(|_| Error::Template("template store lock poisoned".to_string()))?;
        let source = templates
            .get(template)
            .ok_or_else(|| Error::Template(format!("template '{}' not found", template)))?;

        let mut out = String::with_capacity(source.len());
        let mut rest = source.as_str();
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or_else(|| Error::Template(format!("unclosed placeholder in '{}'", template)))?;
            let path = after[..end].trim();
            match Self::lookup(data, path) {
                Some(serde_json::Value::String(s)) => out.push_str(s),
                Some(serde_json::Value::Null) | None => {}
                Some(other) => out.push_str(&other.to_string()),
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn is_template_found(&self, template: &str) -> bool {
        self.templates
            .read()
            .map(|t| t.contains_key(template))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::UrlGenerator;
    use crate::diagnostics::Reporter;
    use crate::render::RendererRegistry;
    use rstdok_ast::{
        AdmonitionNode, DocumentNode, InlineCompoundNode, ParagraphNode, ProjectNode,
    };

    #[test]
    fn test_simple_engine_placeholders() {
        let engine = SimpleTemplateEngine::new();
        engine.add_template("t", "<b>{{ a.b }}</b>{{ list.1 }}{{ missing }}{{ n }}");
        let out = engine
            .render_template("t", &json!({"a": {"b": "x"}, "list": ["p", "q"], "n": 3}))
            .unwrap();
        assert_eq!(out, "<b>x</b>q3");
        assert!(engine.render_template("other", &json!({})).is_err());
    }

    #[test]
    fn test_template_overrides_html_for_its_kind() {
        let engine = Arc::new(SimpleTemplateEngine::new());
        engine.add_template(
            "nodes/admonition.html",
            "<aside data-kind=\"{{ node.name }}\">{{ children.0 }}</aside>",
        );
        let mut registry = RendererRegistry::with_defaults();
        registry.register(Arc::new(TemplateNodeRenderer::new(engine)));

        let mut document = DocumentNode::new("index", "");
        document.push(Node::Admonition(AdmonitionNode {
            name: "tip".to_string(),
            title: None,
            classes: vec![],
            children: vec![Node::Paragraph(ParagraphNode {
                content: InlineCompoundNode::plain("Inner"),
            })],
        }));

        let html = registry
            .render_document(&document, &ProjectNode::default(), &UrlGenerator::default(), &Reporter::new())
            .unwrap();
        assert_eq!(html, "<aside data-kind=\"tip\"><p>Inner</p></aside>");
        assert_eq!(registry.renderer_for(NodeKind::Paragraph).name(), "html");
    }
}
