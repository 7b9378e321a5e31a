//! Node transformer framework
//!
//! A [`NodeTransformer`] is visited depth first by the [`TreeWalker`]:
//! `enter_node` before a node's children, `leave_node` after them. The walker
//! takes each child vector out of its parent and rebuilds it from what
//! `leave_node` returns, so a transformer can replace or drop nodes without
//! holding references into the tree. The shadow tree in the
//! [`CompilerContext`] follows every step.

use rstdok_ast::{DocumentNode, Node};

use super::{CompilerContext, CompilerPass};
use crate::error::CompilerError;

/// A tree rewrite applied by the [`TransformerPass`]
pub trait NodeTransformer: Send {
    /// Transformer name, for logging
    fn name(&self) -> &'static str;

    /// Higher priorities run first within the pass
    fn priority(&self) -> i32 {
        0
    }

    /// Whether `enter_node`/`leave_node` are called for this node. Children
    /// of unsupported nodes are still visited.
    fn supports(&self, node: &Node) -> bool;

    /// Called once per compile, before the first document
    fn prepare(&mut self, _context: &mut CompilerContext<'_>) -> Result<(), CompilerError> {
        Ok(())
    }

    /// Called before the nodes of a document are visited
    fn enter_document(
        &mut self,
        _document: &DocumentNode,
        _context: &mut CompilerContext<'_>,
    ) -> Result<(), CompilerError> {
        Ok(())
    }

    /// Called before the children of a supported node are visited
    fn enter_node(
        &mut self,
        _node: &mut Node,
        _context: &mut CompilerContext<'_>,
    ) -> Result<(), CompilerError> {
        Ok(())
    }

    /// Called after the children of a supported node were visited. Returning
    /// `None` removes the node.
    fn leave_node(
        &mut self,
        node: Node,
        _context: &mut CompilerContext<'_>,
    ) -> Result<Option<Node>, CompilerError> {
        Ok(Some(node))
    }

    /// Called once the whole document was visited. Returning `None` removes
    /// the document from the compile.
    fn leave_document(
        &mut self,
        document: DocumentNode,
        _context: &mut CompilerContext<'_>,
    ) -> Result<Option<DocumentNode>, CompilerError> {
        Ok(Some(document))
    }
}

/// Depth-first driver for one transformer
pub struct TreeWalker<'t> {
    transformer: &'t mut dyn NodeTransformer,
}

impl<'t> TreeWalker<'t> {
    pub fn new(transformer: &'t mut dyn NodeTransformer) -> Self {
        Self { transformer }
    }

    /// Visit every node of `document`
    pub fn walk_document(
        &mut self,
        mut document: DocumentNode,
        context: &mut CompilerContext<'_>,
    ) -> Result<Option<DocumentNode>, CompilerError> {
        context.current_document = Some(document.file_path.clone());
        context.shadow.clear();

        self.transformer.enter_document(&document, context)?;
        let children = std::mem::take(&mut document.children);
        document.children = self.walk_nodes(children, context)?;

        debug_assert_eq!(context.shadow.depth(), 0);
        self.transformer.leave_document(document, context)
    }

    fn walk_nodes(
        &mut self,
        nodes: Vec<Node>,
        context: &mut CompilerContext<'_>,
    ) -> Result<Vec<Node>, CompilerError> {
        let mut output = Vec::with_capacity(nodes.len());
        for node in nodes {
            context.shadow.push(output.len(), node.kind());
            let result = self.walk_node(node, context);
            context.shadow.pop();
            if let Some(node) = result? {
                output.push(node);
            }
        }
        Ok(output)
    }

    fn walk_node(
        &mut self,
        mut node: Node,
        context: &mut CompilerContext<'_>,
    ) -> Result<Option<Node>, CompilerError> {
        let supported = self.transformer.supports(&node);
        if supported {
            self.transformer.enter_node(&mut node, context)?;
            context.shadow.replace(node.kind());
        }

        for children in node.child_lists_mut() {
            let taken = std::mem::take(children);
            *children = self.walk_nodes(taken, context)?;
        }

        if !supported {
            return Ok(Some(node));
        }
        let result = self.transformer.leave_node(node, context)?;
        if let Some(replacement) = &result {
            context.shadow.replace(replacement.kind());
        }
        Ok(result)
    }
}

/// Compiler pass running a set of transformers, each over every document
/// before the next transformer starts
#[derive(Default)]
pub struct TransformerPass {
    transformers: Vec<Box<dyn NodeTransformer>>,
}

impl TransformerPass {
    pub const PRIORITY: i32 = 1000;

    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transformer, keeping the list ordered by priority
    pub fn add_transformer(&mut self, transformer: Box<dyn NodeTransformer>) {
        self.transformers.push(transformer);
        self.transformers
            .sort_by_key(|t| std::cmp::Reverse(t.priority()));
    }

    /// Transformer names in execution order
    pub fn transformer_names(&self) -> Vec<&'static str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }
}

impl CompilerPass for TransformerPass {
    fn name(&self) -> &'static str {
        "transformer"
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn run(
        &mut self,
        mut documents: Vec<DocumentNode>,
        context: &mut CompilerContext<'_>,
    ) -> Result<Vec<DocumentNode>, CompilerError> {
        for transformer in self.transformers.iter_mut() {
            tracing::trace!(transformer = transformer.name(), "Running transformer");
            transformer.prepare(context)?;
            let mut walker = TreeWalker::new(transformer.as_mut());
            let mut output = Vec::with_capacity(documents.len());
            for document in documents {
                if let Some(document) = walker.walk_document(document, context)? {
                    output.push(document);
                }
            }
            documents = output;
        }
        Ok(documents)
    }
}
