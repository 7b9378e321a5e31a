//! Built-in compiler passes

pub mod directive;
pub mod entry_tree;
pub mod implicit_targets;
pub mod metas;
pub mod reference;
pub mod validation;

use std::sync::Arc;

use rstdok_ast::{Node, SectionNode};

use super::transformers;
use super::{CompilerPass, UrlGenerator};
use crate::directives::DirectiveRegistry;
use crate::fs::Filesystem;
use crate::parser::Parser;

pub use directive::DirectiveProcessPass;
pub use entry_tree::DocumentEntryTreePass;
pub use implicit_targets::ImplicitHyperlinkTargetPass;
pub use metas::MetasPass;
pub use reference::{ReferenceResolver, ReferenceResolverPass};
pub use validation::ToctreeValidationPass;

/// The default pipeline, in no particular order; the compiler sorts by
/// priority
pub fn default_passes(
    parser: Parser,
    registry: DirectiveRegistry,
    filesystem: Arc<dyn Filesystem>,
    urls: UrlGenerator,
) -> Vec<Box<dyn CompilerPass>> {
    vec![
        Box::new(DirectiveProcessPass::new(parser, registry, filesystem)),
        Box::new(ImplicitHyperlinkTargetPass),
        Box::new(MetasPass),
        Box::new(DocumentEntryTreePass),
        Box::new(transformers::default_transformer_pass()),
        Box::new(ReferenceResolverPass::with_defaults(urls)),
        Box::new(ToctreeValidationPass),
    ]
}

/// Every section of a node list, depth first
pub(crate) fn visit_sections<'a>(nodes: &'a [Node], visit: &mut dyn FnMut(&'a SectionNode)) {
    for node in nodes {
        if let Node::Section(section) = node {
            visit(section);
        }
        for children in node.child_lists() {
            visit_sections(children, visit);
        }
    }
}

/// Mutable counterpart of [`visit_sections`]
pub(crate) fn visit_sections_mut(nodes: &mut [Node], visit: &mut dyn FnMut(&mut SectionNode)) {
    for node in nodes {
        if let Node::Section(section) = node {
            visit(section);
        }
        for children in node.child_lists_mut() {
            visit_sections_mut(children, visit);
        }
    }
}
