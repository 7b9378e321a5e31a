//! Build cache for incremental rebuilds
//!
//! Parsed trees are kept between builds together with the hash of their
//! source and the files they pulled in (includes, literal includes, diagram
//! sources). A rebuild only re-parses what changed; compilation always runs
//! over the whole set because link tables are global.

use std::collections::{BTreeMap, BTreeSet};

use rstdok_ast::DocumentNode;

use crate::fs::{normalize, Filesystem};
use crate::parser::document::compute_source_hash;
use crate::parser::InputFormat;

/// A parsed document kept between builds
#[derive(Debug, Clone, PartialEq)]
pub struct CachedDocument {
    pub source: String,
    pub hash: String,
    /// The tree as parsed, before compilation
    pub document: DocumentNode,
    /// Files the compiled document depends on
    pub dependencies: Vec<String>,
}

/// What a rebuild has to do
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildPlan {
    /// Sources to parse again
    pub reparse: Vec<String>,
    /// Document paths whose source disappeared
    pub removed: Vec<String>,
}

impl RebuildPlan {
    pub fn is_empty(&self) -> bool {
        self.reparse.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildCache {
    entries: BTreeMap<String, CachedDocument>,
}

impl BuildCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store a freshly parsed document; dependencies are kept from the
    /// previous entry until the next compile replaces them
    pub fn store(&mut self, source: impl Into<String>, hash: impl Into<String>, document: DocumentNode) {
        let path = document.file_path.clone();
        let dependencies = self
            .entries
            .remove(&path)
            .map(|e| e.dependencies)
            .unwrap_or_default();
        self.entries.insert(
            path,
            CachedDocument {
                source: source.into(),
                hash: hash.into(),
                document,
                dependencies,
            },
        );
    }

    /// Record the dependencies found while compiling a document
    pub fn set_dependencies(&mut self, path: &str, dependencies: Vec<String>) {
        if let Some(entry) = self.entries.get_mut(path) {
            entry.dependencies = dependencies.iter().map(|d| normalize(d)).collect();
        }
    }

    pub fn get(&self, path: &str) -> Option<&CachedDocument> {
        self.entries.get(path)
    }

    pub fn remove(&mut self, path: &str) -> Option<CachedDocument> {
        self.entries.remove(path)
    }

    /// Cached parse trees keyed by document path
    pub fn documents(&self) -> BTreeMap<String, DocumentNode> {
        self.entries
            .iter()
            .map(|(path, entry)| (path.clone(), entry.document.clone()))
            .collect()
    }

    /// Decide what to re-parse after `changed` files were touched.
    ///
    /// A cached source is re-parsed when its content hash differs, dropped
    /// when it no longer exists. Unknown files of `format` are new documents.
    /// Every document depending on a changed file is re-parsed as well.
    pub fn plan(&self, filesystem: &dyn Filesystem, format: InputFormat, changed: &[String]) -> RebuildPlan {
        let mut reparse = BTreeSet::new();
        let mut removed = BTreeSet::new();

        for changed in changed.iter().map(|c| normalize(c)) {
            let cached = self.entries.iter().find(|(_, e)| e.source == changed);
            match cached {
                Some((path, entry)) => {
                    if !filesystem.has(&changed) {
                        removed.insert(path.clone());
                    } else {
                        let modified = filesystem
                            .read(&changed)
                            .map(|text| compute_source_hash(&text) != entry.hash)
                            .unwrap_or(true);
                        if modified {
                            reparse.insert(changed.clone());
                        }
                    }
                }
                None => {
                    if filesystem.has(&changed) && format.is_source(&changed) {
                        reparse.insert(changed.clone());
                    }
                }
            }

            for entry in self.entries.values() {
                if entry.dependencies.contains(&changed) && !removed.contains(&entry.document.file_path) {
                    tracing::debug!(
                        document = entry.document.file_path.as_str(),
                        dependency = changed.as_str(),
                        "Dependency changed"
                    );
                    reparse.insert(entry.source.clone());
                }
            }
        }

        RebuildPlan {
            reparse: reparse.into_iter().collect(),
            removed: removed.into_iter().collect(),
        }
    }
}
