//! `.. toctree::` and the file-list resolution behind it

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;
use rstdok_ast::{DirectiveNode, Node, TocNode};

use super::{DirectiveContext, DirectiveHandler};
use crate::diagnostics::codes;
use crate::error::{ParseError, Result};
use crate::fs::{dirname, join, strip_extension, Filesystem};

/// Extensions of documents a toctree may point at
pub const SOURCE_EXTENSIONS: &[&str] = &["rst", "md"];

static TITLED_ENTRY_RE: OnceLock<Regex> = OnceLock::new();

fn titled_entry_re() -> &'static Regex {
    TITLED_ENTRY_RE.get_or_init(|| Regex::new(r"^(.*?)\s*<([^<>]+)>$").unwrap())
}

/// Split `Title <target>` entries
pub fn parse_entry(entry: &str) -> (Option<String>, String) {
    let entry = entry.trim();
    match titled_entry_re().captures(entry) {
        Some(caps) if !caps[1].is_empty() => (Some(caps[1].to_string()), caps[2].trim().to_string()),
        _ => (None, entry.to_string()),
    }
}

fn is_glob(target: &str) -> bool {
    target.contains(['*', '?', '['])
}

fn is_external(target: &str) -> bool {
    target.contains("://")
}

/// Strip a known source extension from a resolved entry
fn document_path(path: &str) -> String {
    match path.rsplit_once('.') {
        Some((_, ext)) if SOURCE_EXTENSIONS.contains(&ext) => strip_extension(path),
        _ => path.to_string(),
    }
}

/// Ordered documents and explicit titles of one toctree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToctreeFiles {
    pub files: Vec<String>,
    pub titles: BTreeMap<String, String>,
}

/// Resolves toctree entries against the filesystem
pub struct ToctreeBuilder<'a> {
    filesystem: &'a dyn Filesystem,
}

impl<'a> ToctreeBuilder<'a> {
    pub fn new(filesystem: &'a dyn Filesystem) -> Self {
        Self { filesystem }
    }

    /// Resolve `entries` written in document `current`.
    ///
    /// Entries are relative to the document's directory (`/` for the source
    /// root). With `glob`, wildcard entries expand to every matching source
    /// file except the current document. A document appears once: explicit
    /// entries keep their own position and glob matches skip them.
    pub fn build(&self, current: &str, entries: &[String], glob: bool) -> Result<ToctreeFiles> {
        let directory = dirname(current);
        let parsed: Vec<(Option<String>, String)> = entries.iter().map(|e| parse_entry(e)).collect();

        let explicit: BTreeSet<String> = parsed
            .iter()
            .filter(|(_, target)| !(glob && is_glob(target)) && !is_external(target))
            .map(|(_, target)| document_path(&join(&directory, target)))
            .collect();

        let mut result = ToctreeFiles::default();
        let mut seen = BTreeSet::new();

        for (title, target) in parsed {
            if target == "self" || is_external(&target) {
                continue;
            }

            if glob && is_glob(&target) {
                let pattern = join(&directory, &target);
                let mut matches = Vec::new();
                for extension in SOURCE_EXTENSIONS {
                    for found in self.filesystem.find(&format!("{}.{}", pattern, extension))? {
                        matches.push(strip_extension(&found));
                    }
                }
                matches.sort();
                for path in matches {
                    if path != current && !explicit.contains(&path) && seen.insert(path.clone()) {
                        result.files.push(path);
                    }
                }
                continue;
            }

            let path = document_path(&join(&directory, &target));
            if let Some(title) = title {
                result.titles.insert(path.clone(), title);
            }
            if seen.insert(path.clone()) {
                result.files.push(path);
            }
        }

        Ok(result)
    }
}

/// `.. toctree::`
pub struct ToctreeDirective;

impl DirectiveHandler for ToctreeDirective {
    fn name(&self) -> &'static str {
        "toctree"
    }

    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> std::result::Result<Option<Node>, ParseError> {
        let entries: Vec<String> = directive
            .content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with(".."))
            .map(str::to_string)
            .collect();
        let glob = directive.has_option("glob");

        let resolved = ToctreeBuilder::new(context.filesystem)
            .build(context.file_path(), &entries, glob)
            .unwrap_or_else(|err| {
                context.warning(
                    codes::INVALID_OPTION,
                    directive,
                    format!("Toctree entries could not be resolved: {}", err),
                );
                ToctreeFiles::default()
            });

        let mut files = resolved.files;
        if directive.has_option("reversed") {
            files.reverse();
        }

        Ok(Some(Node::Toctree(TocNode {
            entries,
            files,
            titles: resolved.titles,
            caption: directive.option("caption").map(str::to_string).filter(|c| !c.is_empty()),
            max_depth: context.option_usize(directive, "maxdepth").unwrap_or(0),
            hidden: directive.has_option("hidden"),
            glob,
            titles_only: directive.has_option("titlesonly"),
            menu: Vec::new(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::tests::{directive, run};
    use crate::fs::MemoryFilesystem;

    fn entries(list: &[&str]) -> Vec<String> {
        list.iter().map(|e| e.to_string()).collect()
    }

    fn fixture() -> MemoryFilesystem {
        MemoryFilesystem::with_files([
            ("index.rst", ""),
            ("intro.rst", ""),
            ("chapters/intro.rst", ""),
            ("chapters/setup.rst", ""),
            ("chapters/usage.md", ""),
            ("chapters/index.rst", ""),
            ("chapters/image.png", ""),
        ])
    }

    #[test]
    fn test_parse_entry() {
        assert_eq!(parse_entry("intro"), (None, "intro".to_string()));
        assert_eq!(
            parse_entry("Getting started <guide/start>"),
            (Some("Getting started".to_string()), "guide/start".to_string())
        );
        assert_eq!(parse_entry("<odd>"), (None, "<odd>".to_string()));
    }

    #[test]
    fn test_glob_does_not_duplicate_explicit_entries() {
        let fs = fixture();
        let toc = ToctreeBuilder::new(&fs)
            .build("index", &entries(&["chapters/intro", "chapters/*"]), true)
            .unwrap();
        assert_eq!(
            toc.files,
            vec!["chapters/intro", "chapters/index", "chapters/setup", "chapters/usage"]
        );
    }

    #[test]
    fn test_explicit_position_wins_over_earlier_glob() {
        let fs = fixture();
        let toc = ToctreeBuilder::new(&fs)
            .build("chapters/index", &entries(&["*", "intro"]), true)
            .unwrap();
        assert_eq!(toc.files, vec!["chapters/setup", "chapters/usage", "chapters/intro"]);
    }

    #[test]
    fn test_relative_and_root_entries() {
        let fs = fixture();
        let toc = ToctreeBuilder::new(&fs)
            .build(
                "chapters/index",
                &entries(&["Setup <setup>", "/intro", "setup.rst", "https://example.com"]),
                false,
            )
            .unwrap();
        assert_eq!(toc.files, vec!["chapters/setup", "intro"]);
        assert_eq!(toc.titles.get("chapters/setup").map(String::as_str), Some("Setup"));
    }

    #[test]
    fn test_without_glob_option_wildcards_are_literal() {
        let fs = fixture();
        let toc = ToctreeBuilder::new(&fs)
            .build("index", &entries(&["chapters/*"]), false)
            .unwrap();
        assert_eq!(toc.files, vec!["chapters/*"]);
    }

    #[test]
    fn test_directive_options() {
        let mut raw = directive("toctree", "", "intro\nchapters/setup\n");
        raw.options.insert("maxdepth".to_string(), "2".to_string());
        raw.options.insert("reversed".to_string(), String::new());
        raw.options.insert("hidden".to_string(), String::new());
        let (node, _, _) = run(&raw, &fixture(), "index");

        let Some(Node::Toctree(toc)) = node else {
            panic!("expected a toctree");
        };
        assert_eq!(toc.files, vec!["chapters/setup", "intro"]);
        assert_eq!(toc.entries, vec!["intro", "chapters/setup"]);
        assert_eq!(toc.max_depth, 2);
        assert!(toc.hidden);
    }
}
