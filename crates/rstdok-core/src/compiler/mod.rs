//! Compiler pass pipeline
//!
//! A [`Compiler`] runs an ordered list of [`CompilerPass`]es over the parsed
//! documents of a project. Passes run from the highest priority to the
//! lowest; each one receives the documents returned by the previous pass and
//! may rewrite or drop them. The passes share a [`CompilerContext`] holding
//! the [`ProjectNode`] for the duration of one compile.

pub mod passes;
pub mod shadow;
pub mod transformer;
pub mod transformers;
pub mod url;

use std::collections::BTreeMap;
use std::sync::Arc;

use rstdok_ast::{DocumentNode, ProjectNode};

use crate::diagnostics::Reporter;
use crate::directives::DirectiveRegistry;
use crate::error::CompilerError;
use crate::fs::Filesystem;
use crate::parser::Parser;

pub use shadow::{ShadowFrame, ShadowTree};
pub use transformer::{NodeTransformer, TransformerPass, TreeWalker};
pub use url::UrlGenerator;

/// One stage of the compile
pub trait CompilerPass: Send {
    /// Pass name, for logging and errors
    fn name(&self) -> &'static str;

    /// Higher priorities run first
    fn priority(&self) -> i32;

    /// Transform the document set
    fn run(
        &mut self,
        documents: Vec<DocumentNode>,
        context: &mut CompilerContext<'_>,
    ) -> Result<Vec<DocumentNode>, CompilerError>;
}

/// State shared by the passes of one compile
pub struct CompilerContext<'a> {
    pub project: &'a mut ProjectNode,
    /// Document currently being visited
    pub current_document: Option<String>,
    /// Path from the document root to the visited node
    pub shadow: ShadowTree,
    pub reporter: Reporter,
}

impl<'a> CompilerContext<'a> {
    pub fn new(project: &'a mut ProjectNode, reporter: Reporter) -> Self {
        Self {
            project,
            current_document: None,
            shadow: ShadowTree::default(),
            reporter,
        }
    }

    /// Path of the current document, or an empty string outside a document
    pub fn document(&self) -> &str {
        self.current_document.as_deref().unwrap_or_default()
    }

    /// Report a warning against the current document
    pub fn warning(&self, code: &str, message: impl Into<String>) {
        self.reporter.warning(code, self.document(), None, message);
    }
}

/// Ordered pass list
#[derive(Default)]
pub struct Compiler {
    passes: Vec<Box<dyn CompilerPass>>,
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("passes", &self.pass_names())
            .finish()
    }
}

impl Compiler {
    /// Create a compiler without passes
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compiler with the default pass pipeline
    pub fn with_default_passes(
        parser: Parser,
        registry: DirectiveRegistry,
        filesystem: Arc<dyn Filesystem>,
        urls: UrlGenerator,
    ) -> Self {
        let mut compiler = Self::new();
        for pass in passes::default_passes(parser, registry, filesystem, urls) {
            compiler.add_pass(pass);
        }
        compiler
    }

    /// Register a pass. Passes with equal priority keep registration order.
    pub fn add_pass(&mut self, pass: Box<dyn CompilerPass>) {
        self.passes.push(pass);
        self.passes.sort_by_key(|p| std::cmp::Reverse(p.priority()));
    }

    /// Pass names in execution order
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run every pass over `documents`.
    ///
    /// The project is reset first: link targets and entries are rebuilt from
    /// scratch on every compile.
    pub fn compile(
        &mut self,
        documents: BTreeMap<String, DocumentNode>,
        project: &mut ProjectNode,
        reporter: &Reporter,
    ) -> Result<BTreeMap<String, DocumentNode>, CompilerError> {
        project.reset();
        let mut context = CompilerContext::new(project, reporter.clone());
        let mut documents: Vec<DocumentNode> = documents.into_values().collect();

        for pass in self.passes.iter_mut() {
            tracing::debug!(
                pass = pass.name(),
                priority = pass.priority(),
                documents = documents.len(),
                "Running compiler pass"
            );
            documents = pass.run(documents, &mut context)?;
            context.current_document = None;
        }

        Ok(documents
            .into_iter()
            .map(|doc| (doc.file_path.clone(), doc))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        priority: i32,
        log: Arc<Mutex<Vec<&'static str>>>,
        drop_document: Option<&'static str>,
    }

    impl CompilerPass for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn run(
            &mut self,
            documents: Vec<DocumentNode>,
            _context: &mut CompilerContext<'_>,
        ) -> Result<Vec<DocumentNode>, CompilerError> {
            self.log.lock().unwrap().push(self.name);
            Ok(documents
                .into_iter()
                .filter(|d| Some(d.file_path.as_str()) != self.drop_document)
                .collect())
        }
    }

    struct Failing;

    impl CompilerPass for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn priority(&self) -> i32 {
            50
        }

        fn run(
            &mut self,
            _documents: Vec<DocumentNode>,
            _context: &mut CompilerContext<'_>,
        ) -> Result<Vec<DocumentNode>, CompilerError> {
            Err(CompilerError::new("failing", "boom"))
        }
    }

    fn documents(paths: &[&str]) -> BTreeMap<String, DocumentNode> {
        paths
            .iter()
            .map(|p| (p.to_string(), DocumentNode::new(*p, "")))
            .collect()
    }

    #[test]
    fn test_highest_priority_runs_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut compiler = Compiler::new();
        for (name, priority) in [("metas", 10000), ("transformer", 1000), ("directives", i32::MAX)] {
            compiler.add_pass(Box::new(Recorder {
                name,
                priority,
                log: log.clone(),
                drop_document: None,
            }));
        }

        assert_eq!(compiler.pass_names(), vec!["directives", "metas", "transformer"]);
        let mut project = ProjectNode::default();
        compiler
            .compile(documents(&["index"]), &mut project, &Reporter::new())
            .unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["directives", "metas", "transformer"]);
    }

    #[test]
    fn test_equal_priorities_keep_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut compiler = Compiler::new();
        for name in ["first", "second", "third"] {
            compiler.add_pass(Box::new(Recorder {
                name,
                priority: 7,
                log: log.clone(),
                drop_document: None,
            }));
        }
        assert_eq!(compiler.pass_names(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_pass_output_feeds_next_pass() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut compiler = Compiler::new();
        compiler.add_pass(Box::new(Recorder {
            name: "dropper",
            priority: 2,
            log: log.clone(),
            drop_document: Some("draft"),
        }));
        compiler.add_pass(Box::new(Recorder {
            name: "after",
            priority: 1,
            log,
            drop_document: None,
        }));

        let mut project = ProjectNode::default();
        let result = compiler
            .compile(documents(&["index", "draft"]), &mut project, &Reporter::new())
            .unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["index"]);
    }

    #[test]
    fn test_pass_error_aborts_compile() {
        let mut compiler = Compiler::new();
        compiler.add_pass(Box::new(Failing));
        let mut project = ProjectNode::default();
        let err = compiler
            .compile(documents(&["index"]), &mut project, &Reporter::new())
            .unwrap_err();
        assert_eq!(err.pass, "failing");
    }
}
