//! Whole-project builds
//!
//! [`ProjectBuilder`] wires the pieces together: batch parsing, the compiler
//! pipeline and page rendering, with a [`BuildCache`] kept between builds so
//! [`ProjectBuilder::rebuild`] only re-parses what changed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rstdok_core::config::ProjectSettings;
//! use rstdok_core::fs::{Filesystem, MemoryFilesystem};
//! use rstdok_core::project::ProjectBuilder;
//!
//! let source = Arc::new(MemoryFilesystem::with_files([
//!     ("index.rst", "Home\n====\n\n.. toctree::\n\n   guide\n"),
//!     ("guide.rst", "Guide\n=====\n\nBack to :doc:`index`.\n"),
//! ]));
//! let output = Arc::new(MemoryFilesystem::new());
//!
//! let mut builder = ProjectBuilder::new(ProjectSettings::default(), source, output.clone());
//! let outcome = builder.build().unwrap();
//! assert_eq!(outcome.written, vec!["guide.html", "index.html"]);
//! assert!(output.read("guide.html").unwrap().contains("href=\"index.html\""));
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use rstdok_ast::{DocumentNode, ProjectNode};

use crate::batch::{parse_directory, parse_sources, BatchFailure, BatchOptions, BatchResult};
use crate::compiler::{Compiler, UrlGenerator};
use crate::config::ProjectSettings;
use crate::diagnostics::Reporter;
use crate::directives::DirectiveRegistry;
use crate::error::{Error, Result};
use crate::events::EventDispatcher;
use crate::fs::Filesystem;
use crate::incremental::BuildCache;
use crate::parser::Parser;
use crate::render::{render_project, RenderOptions, RendererRegistry, TemplateRenderer};

/// Result of one build
#[derive(Debug, Default)]
pub struct BuildOutcome {
    /// Compiled documents
    pub documents: BTreeMap<String, DocumentNode>,
    /// Output paths written, empty for checks
    pub written: Vec<String>,
    /// Documents that could not be parsed
    pub failures: Vec<BatchFailure>,
    /// Sources parsed in this run
    pub parsed: Vec<String>,
    /// Warnings and errors logged
    pub problems: usize,
}

/// Parses, compiles and renders a project.
///
/// The source filesystem is rooted at the source directory: document paths,
/// includes and toctree entries are relative to it.
pub struct ProjectBuilder {
    settings: ProjectSettings,
    source: Arc<dyn Filesystem>,
    output: Arc<dyn Filesystem>,
    parser: Parser,
    directives: DirectiveRegistry,
    renderers: RendererRegistry,
    templates: Option<Arc<dyn TemplateRenderer>>,
    events: EventDispatcher,
    reporter: Reporter,
    cache: BuildCache,
    project: ProjectNode,
}

impl std::fmt::Debug for ProjectBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectBuilder")
            .field("settings", &self.settings)
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl ProjectBuilder {
    pub fn new(settings: ProjectSettings, source: Arc<dyn Filesystem>, output: Arc<dyn Filesystem>) -> Self {
        let reporter = Reporter::new();
        let parser = Parser::new()
            .with_reporter(reporter.clone())
            .with_default_code_language(settings.build.default_code_language.clone());
        let project = ProjectNode::new(
            settings.project.title.clone(),
            settings.project.version.clone(),
        );
        Self {
            settings,
            source,
            output,
            parser,
            directives: DirectiveRegistry::with_defaults(),
            renderers: RendererRegistry::with_defaults(),
            templates: None,
            events: EventDispatcher::new(),
            reporter,
            cache: BuildCache::new(),
            project,
        }
    }

    /// Use a template engine for page layouts
    pub fn with_templates(mut self, templates: Arc<dyn TemplateRenderer>) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn with_renderers(mut self, renderers: RendererRegistry) -> Self {
        self.renderers = renderers;
        self
    }

    pub fn with_directives(mut self, directives: DirectiveRegistry) -> Self {
        self.directives = directives;
        self
    }

    /// Lifecycle events, for subscribing listeners
    pub fn events_mut(&mut self) -> &mut EventDispatcher {
        &mut self.events
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn project(&self) -> &ProjectNode {
        &self.project
    }

    pub fn cache(&self) -> &BuildCache {
        &self.cache
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    fn urls(&self) -> UrlGenerator {
        UrlGenerator::new(self.settings.build.output_extension.clone())
    }

    fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            events: self.events.clone(),
            ..BatchOptions::from_settings(&self.settings.build)
        }
    }

    /// Parse and render every source
    pub fn build(&mut self) -> Result<BuildOutcome> {
        self.run_full(true)
    }

    /// Parse and compile every source without writing output
    pub fn check(&mut self) -> Result<BuildOutcome> {
        self.run_full(false)
    }

    fn run_full(&mut self, render: bool) -> Result<BuildOutcome> {
        self.reporter.clear();
        self.cache = BuildCache::new();
        let batch = parse_directory(
            &self.parser,
            Arc::clone(&self.source),
            "",
            self.settings.build.input_format,
            &self.batch_options(),
        )?;
        let parsed = batch.sources.values().map(|s| s.source.clone()).collect();
        let failures = self.absorb(batch);
        self.finish(parsed, failures, render)
    }

    /// Rebuild after `changed` source paths were touched.
    ///
    /// Only modified documents and their dependents are parsed again; the
    /// whole project is compiled and rendered.
    pub fn rebuild(&mut self, changed: &[String]) -> Result<BuildOutcome> {
        if self.cache.is_empty() {
            return self.build();
        }
        self.reporter.clear();

        let plan = self
            .cache
            .plan(self.source.as_ref(), self.settings.build.input_format, changed);
        tracing::info!(
            reparse = plan.reparse.len(),
            removed = plan.removed.len(),
            "Rebuilding"
        );
        for path in &plan.removed {
            self.cache.remove(path);
        }
        let batch = parse_sources(
            &self.parser,
            Arc::clone(&self.source),
            "",
            plan.reparse.clone(),
            &self.batch_options(),
        );
        let failures = self.absorb(batch);
        self.finish(plan.reparse, failures, true)
    }

    /// Move parsed documents into the cache
    fn absorb(&mut self, batch: BatchResult) -> Vec<BatchFailure> {
        let BatchResult {
            documents,
            mut sources,
            failures,
            ..
        } = batch;
        for (path, document) in documents {
            if let Some(info) = sources.remove(&path) {
                self.cache.store(info.source, info.hash, document);
            }
        }
        failures
    }

    fn finish(&mut self, parsed: Vec<String>, failures: Vec<BatchFailure>, render: bool) -> Result<BuildOutcome> {
        let urls = self.urls();
        let mut compiler = Compiler::with_default_passes(
            self.parser.clone(),
            self.directives.clone(),
            Arc::clone(&self.source),
            urls.clone(),
        );
        let documents = compiler.compile(self.cache.documents(), &mut self.project, &self.reporter)?;
        for (path, document) in &documents {
            self.cache.set_dependencies(path, document.dependencies.clone());
        }

        let written = if render {
            let options = RenderOptions {
                urls,
                templates: self.templates.clone(),
                events: self.events.clone(),
            };
            render_project(
                &documents,
                &self.project,
                &self.renderers,
                self.output.as_ref(),
                &options,
                &self.reporter,
            )?
        } else {
            Vec::new()
        };

        let problems = self.reporter.problem_count();
        tracing::info!(
            documents = documents.len(),
            written = written.len(),
            problems,
            "Build finished"
        );
        if self.settings.build.fail_on_log && problems > 0 {
            return Err(Error::FailOnLog(problems));
        }

        Ok(BuildOutcome {
            documents,
            written,
            failures,
            parsed,
            problems,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::codes;
    use crate::fs::MemoryFilesystem;

    fn sources() -> Arc<MemoryFilesystem> {
        Arc::new(MemoryFilesystem::with_files([
            (
                "index.rst",
                "Home\n====\n\n.. toctree::\n   :maxdepth: 2\n\n   guide\n   api/index\n",
            ),
            (
                "guide.rst",
                "Guide\n=====\n\n.. include:: snippets/intro.inc\n\nSee :ref:`api-start`.\n",
            ),
            ("snippets/intro.inc", "Welcome to the guide.\n"),
            (
                "api/index.rst",
                ".. _api-start:\n\nAPI\n===\n\nBack to :doc:`../guide`.\n",
            ),
        ]))
    }

    #[test]
    fn test_build_writes_linked_pages() {
        let output = Arc::new(MemoryFilesystem::new());
        let mut builder = ProjectBuilder::new(ProjectSettings::default(), sources(), output.clone());
        let outcome = builder.build().unwrap();

        assert_eq!(outcome.written, vec!["api/index.html", "guide.html", "index.html"]);
        assert_eq!(outcome.problems, 0, "{:?}", builder.reporter().diagnostics());
        let guide = output.read("guide.html").unwrap();
        assert!(guide.contains("Welcome to the guide."));
        assert!(guide.contains("href=\"api/index.html#api-start\""));
        let api = output.read("api/index.html").unwrap();
        assert!(api.contains("href=\"../guide.html\""));
        assert_eq!(builder.project().root.as_deref(), Some("index"));
    }

    #[test]
    fn test_rebuild_reparses_dependents_only() {
        let source = sources();
        let output = Arc::new(MemoryFilesystem::new());
        let mut builder = ProjectBuilder::new(ProjectSettings::default(), source.clone(), output.clone());
        builder.build().unwrap();

        source.write("snippets/intro.inc", "Hello again.\n").unwrap();
        let outcome = builder.rebuild(&["snippets/intro.inc".to_string()]).unwrap();
        assert_eq!(outcome.parsed, vec!["guide.rst"]);
        assert_eq!(outcome.documents.len(), 3);
        assert!(output.read("guide.html").unwrap().contains("Hello again."));

        let outcome = builder.rebuild(&["index.rst".to_string()]).unwrap();
        assert!(outcome.parsed.is_empty());
    }

    #[test]
    fn test_included_text_files_are_not_pages() {
        let source = Arc::new(MemoryFilesystem::with_files([
            (
                "index.rst",
                "Home\n====\n\n.. literalinclude:: examples/requirements.txt\n",
            ),
            ("examples/requirements.txt", "serde==1.0\nregex==1.10\n"),
        ]));
        let output = Arc::new(MemoryFilesystem::new());
        let mut builder = ProjectBuilder::new(ProjectSettings::default(), source, output.clone());
        let outcome = builder.build().unwrap();

        assert_eq!(outcome.written, vec!["index.html"]);
        assert_eq!(outcome.documents.len(), 1);
        assert!(!builder
            .reporter()
            .diagnostics()
            .iter()
            .any(|d| d.code.as_deref() == Some(codes::ORPHAN_DOCUMENT)));
        assert!(output.read("index.html").unwrap().contains("serde==1.0"));
        assert!(!output.has("examples/requirements.html"));
    }

    #[test]
    fn test_fail_on_log() {
        let source = Arc::new(MemoryFilesystem::with_files([(
            "index.rst",
            "Home\n====\n\nSee :ref:`nowhere`.\n",
        )]));
        let mut settings = ProjectSettings::default();
        settings.build.fail_on_log = true;
        let mut builder = ProjectBuilder::new(settings, source, Arc::new(MemoryFilesystem::new()));
        assert!(matches!(builder.check(), Err(Error::FailOnLog(count)) if count > 0));
    }
}
