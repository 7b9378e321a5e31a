//! Writing rendered pages

use std::collections::BTreeMap;
use std::sync::Arc;

use rstdok_ast::{DocumentNode, ProjectNode};
use serde::Serialize;

use super::{html_escape, RendererRegistry, TemplateRenderer};
use crate::compiler::passes::metas::document_title;
use crate::compiler::UrlGenerator;
use crate::diagnostics::Reporter;
use crate::error::Result;
use crate::events::{Event, EventDispatcher};
use crate::fs::Filesystem;

/// Template used for whole pages when the engine provides it
pub const PAGE_TEMPLATE: &str = "page.html";

/// How pages are produced
#[derive(Clone, Default)]
pub struct RenderOptions {
    pub urls: UrlGenerator,
    /// Page layout engine; a built-in layout is used without one
    pub templates: Option<Arc<dyn TemplateRenderer>>,
    pub events: EventDispatcher,
}

/// A link to another page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLink {
    pub url: String,
    pub title: String,
}

/// Data handed to the page layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub document: String,
    pub title: String,
    pub body: String,
    pub project: Option<String>,
    pub version: Option<String>,
    pub previous: Option<PageLink>,
    pub next: Option<PageLink>,
    pub breadcrumbs: Vec<PageLink>,
    /// Prefix leading back to the output root
    pub root: String,
}

impl Page {
    fn link(project: &ProjectNode, urls: &UrlGenerator, from: &str, to: &str) -> PageLink {
        PageLink {
            url: urls.relative_url(from, to, None),
            title: project
                .document_entry(to)
                .map(|e| e.title.clone())
                .unwrap_or_else(|| to.to_string()),
        }
    }

    pub fn new(document: &DocumentNode, body: String, project: &ProjectNode, urls: &UrlGenerator) -> Self {
        let from = document.file_path.as_str();
        let navigation = project.navigation(from);
        Self {
            document: from.to_string(),
            title: document_title(document),
            body,
            project: project.title.clone(),
            version: project.version.clone(),
            previous: navigation
                .previous
                .map(|p| Self::link(project, urls, from, &p)),
            next: navigation.next.map(|n| Self::link(project, urls, from, &n)),
            breadcrumbs: navigation
                .breadcrumbs
                .iter()
                .map(|b| Self::link(project, urls, from, b))
                .collect(),
            root: urls.root_prefix(from),
        }
    }

    /// Built-in layout
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        out.push_str("<meta charset=\"utf-8\">\n");
        let title = match &self.project {
            Some(project) => format!("{} - {}", self.title, project),
            None => self.title.clone(),
        };
        out.push_str(&format!("<title>{}</title>\n", html_escape(&title)));
        out.push_str("</head>\n<body>\n");

        if !self.breadcrumbs.is_empty() {
            out.push_str("<nav class=\"breadcrumbs\">\n");
            let crumbs: Vec<String> = self
                .breadcrumbs
                .iter()
                .map(|b| format!("<a href=\"{}\">{}</a>", html_escape(&b.url), html_escape(&b.title)))
                .collect();
            out.push_str(&crumbs.join(" &raquo; "));
            out.push_str("\n</nav>\n");
        }

        out.push_str("<main>\n");
        out.push_str(&self.body);
        out.push_str("\n</main>\n");

        if self.previous.is_some() || self.next.is_some() {
            out.push_str("<nav class=\"related\">\n");
            if let Some(previous) = &self.previous {
                out.push_str(&format!(
                    "<a rel=\"prev\" href=\"{}\">{}</a>\n",
                    html_escape(&previous.url),
                    html_escape(&previous.title)
                ));
            }
            if let Some(next) = &self.next {
                out.push_str(&format!(
                    "<a rel=\"next\" href=\"{}\">{}</a>\n",
                    html_escape(&next.url),
                    html_escape(&next.title)
                ));
            }
            out.push_str("</nav>\n");
        }

        out.push_str("</body>\n</html>\n");
        out
    }
}

/// Render every document to `<path>.<ext>` through `filesystem`; returns the
/// written paths
pub fn render_project(
    documents: &BTreeMap<String, DocumentNode>,
    project: &ProjectNode,
    registry: &RendererRegistry,
    filesystem: &dyn Filesystem,
    options: &RenderOptions,
    reporter: &Reporter,
) -> Result<Vec<String>> {
    let page_template = options
        .templates
        .as_ref()
        .filter(|t| t.is_template_found(PAGE_TEMPLATE));

    let mut written = Vec::with_capacity(documents.len());
    for document in documents.values() {
        let mut document = document.clone();
        options.events.dispatch(&mut Event::PreRender {
            document: &mut document,
        });

        let body = registry.render_document(&document, project, &options.urls, reporter)?;
        let page = Page::new(&document, body, project, &options.urls);
        let mut output = match page_template {
            Some(engine) => engine.render_template(PAGE_TEMPLATE, &serde_json::to_value(&page)?)?,
            None => page.to_html(),
        };

        let path = options.urls.output_path(&document.file_path);
        options.events.dispatch(&mut Event::PostRender {
            file: &path,
            output: &mut output,
        });
        filesystem.write(&path, &output)?;
        tracing::debug!(document = document.file_path.as_str(), output = path.as_str(), "Rendered page");
        written.push(path);
    }
    Ok(written)
}
