//! rstdok-ast - Abstract Syntax Tree definitions
//!
//! This crate provides the node types used by rstdok for representing
//! parsed documents, the project aggregate and its navigation entry tree.

pub mod block;
pub mod document;
pub mod inline;
pub mod project;

pub use block::*;
pub use document::{DocumentNode, MetadataNode};
pub use inline::*;
pub use project::{
    DocumentEntryNode, InternalTarget, Navigation, ProjectNode, SectionEntryNode,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
