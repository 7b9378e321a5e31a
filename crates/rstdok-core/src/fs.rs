//! Filesystem capability
//!
//! The core never touches storage directly: parsing, includes, toctree globs
//! and rendering go through the [`Filesystem`] trait. Paths are
//! `/`-separated and relative to the filesystem root.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use glob::{MatchOptions, Pattern};

use crate::error::{Error, Result};

/// A directory listing entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileEntry {
    /// Path relative to the filesystem root
    pub path: String,
    /// Whether the entry is a directory
    pub is_directory: bool,
}

/// Storage capability consumed by the parser, compiler and renderer
pub trait Filesystem: Send + Sync {
    /// Check if a file exists
    fn has(&self, path: &str) -> bool;

    /// Read a file as UTF-8 text
    fn read(&self, path: &str) -> Result<String>;

    /// Create or replace a file, creating parent directories as needed
    fn write(&self, path: &str, contents: &str) -> Result<()>;

    /// List a directory
    fn list_contents(&self, dir: &str, recursive: bool) -> Result<Vec<FileEntry>>;

    /// Files matching a glob pattern, sorted
    fn find(&self, pattern: &str) -> Result<Vec<String>>;

    /// Check if a path is a directory
    fn is_directory(&self, path: &str) -> bool;
}

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    }
}

/// Filesystem rooted at a local directory
#[derive(Debug, Clone)]
pub struct LocalFilesystem {
    root: PathBuf,
}

impl LocalFilesystem {
    /// Create a filesystem rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        Some(parts.join("/"))
    }

    fn collect_entries(&self, dir: &Path, recursive: bool, out: &mut Vec<FileEntry>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_directory = path.is_dir();
            if let Some(relative) = self.relative(&path) {
                out.push(FileEntry {
                    path: relative,
                    is_directory,
                });
            }
            if recursive && is_directory {
                self.collect_entries(&path, true, out)?;
            }
        }
        Ok(())
    }
}

impl Filesystem for LocalFilesystem {
    fn has(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn read(&self, path: &str) -> Result<String> {
        let full = self.resolve(path);
        if !full.is_file() {
            return Err(Error::FileNotFound(path.to_string()));
        }
        Ok(fs::read_to_string(full)?)
    }

    fn write(&self, path: &str, contents: &str) -> Result<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(full, contents)?;
        Ok(())
    }

    fn list_contents(&self, dir: &str, recursive: bool) -> Result<Vec<FileEntry>> {
        let full = self.resolve(dir);
        if !full.is_dir() {
            return Err(Error::FileNotFound(dir.to_string()));
        }
        let mut entries = Vec::new();
        self.collect_entries(&full, recursive, &mut entries)?;
        entries.sort();
        Ok(entries)
    }

    fn find(&self, pattern: &str) -> Result<Vec<String>> {
        let full = self.resolve(pattern);
        let mut matches = Vec::new();
        for path in glob::glob_with(&full.to_string_lossy(), match_options())? {
            match path {
                Ok(path) if path.is_file() => {
                    if let Some(relative) = self.relative(&path) {
                        matches.push(relative);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Skipping unreadable path during glob: {}", e),
            }
        }
        matches.sort();
        Ok(matches)
    }

    fn is_directory(&self, path: &str) -> bool {
        self.resolve(path).is_dir()
    }
}

/// In-memory filesystem, used for tests and for rendering into a buffer
#[derive(Debug, Default)]
pub struct MemoryFilesystem {
    files: RwLock<BTreeMap<String, String>>,
}

impl MemoryFilesystem {
    /// Create an empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filesystem from `(path, contents)` pairs
    pub fn with_files<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let files = files
            .into_iter()
            .map(|(p, c)| (normalize(&p.into()), c.into()))
            .collect();
        Self {
            files: RwLock::new(files),
        }
    }

    /// All stored paths
    pub fn paths(&self) -> Vec<String> {
        self.files
            .read()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Filesystem for MemoryFilesystem {
    fn has(&self, path: &str) -> bool {
        self.files
            .read()
            .map(|files| files.contains_key(&normalize(path)))
            .unwrap_or(false)
    }

    fn read(&self, path: &str) -> Result<String> {
        self.files
            .read()
            .ok()
            .and_then(|files| files.get(&normalize(path)).cloned())
            .ok_or_else(|| Error::FileNotFound(path.to_string()))
    }

    fn write(&self, path: &str, contents: &str) -> Result<()> {
        let mut files = self
            .files
            .write()
            .map_err(|_| Error::Io(std::io::Error::other("memory filesystem lock poisoned")))?;
        files.insert(normalize(path), contents.to_string());
        Ok(())
    }

    fn list_contents(&self, dir: &str, recursive: bool) -> Result<Vec<FileEntry>> {
        let dir = normalize(dir);
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };
        let files = self
            .files
            .read()
            .map_err(|_| Error::Io(std::io::Error::other("memory filesystem lock poisoned")))?;

        let mut entries = std::collections::BTreeSet::new();
        for path in files.keys() {
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            let segments: Vec<&str> = rest.split('/').collect();
            let depth = if recursive { segments.len() } else { 1 };
            for i in 1..=depth.min(segments.len()) {
                let is_directory = i < segments.len();
                entries.insert(FileEntry {
                    path: format!("{}{}", prefix, segments[..i].join("/")),
                    is_directory,
                });
            }
        }
        Ok(entries.into_iter().collect())
    }

    fn find(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = Pattern::new(&normalize(pattern))?;
        let files = self
            .files
            .read()
            .map_err(|_| Error::Io(std::io::Error::other("memory filesystem lock poisoned")))?;
        Ok(files
            .keys()
            .filter(|path| pattern.matches_with(path, match_options()))
            .cloned()
            .collect())
    }

    fn is_directory(&self, path: &str) -> bool {
        let prefix = format!("{}/", normalize(path));
        self.files
            .read()
            .map(|files| files.keys().any(|p| p.starts_with(&prefix)))
            .unwrap_or(false)
    }
}

/// Normalise a `/`-separated path, resolving `.` and `..` segments
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Join a relative path onto a directory. Paths starting with `/` are taken
/// from the root.
pub fn join(dir: &str, path: &str) -> String {
    if path.starts_with('/') || dir.is_empty() {
        normalize(path)
    } else {
        normalize(&format!("{}/{}", dir, path))
    }
}

/// Directory part of a path (`""` for top-level files)
pub fn dirname(path: &str) -> String {
    match path.rfind('/') {
        Some(pos) => path[..pos].to_string(),
        None => String::new(),
    }
}

/// Path without its final extension
pub fn strip_extension(path: &str) -> String {
    let file_start = path.rfind('/').map(|p| p + 1).unwrap_or(0);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => path[..file_start + dot].to_string(),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_helpers() {
        assert_eq!(normalize("a/./b/../c.rst"), "a/c.rst");
        assert_eq!(normalize("/index.rst"), "index.rst");
        assert_eq!(join("guide", "../intro.rst"), "intro.rst");
        assert_eq!(join("guide", "/api/index.rst"), "api/index.rst");
        assert_eq!(dirname("guide/setup.rst"), "guide");
        assert_eq!(dirname("index.rst"), "");
        assert_eq!(strip_extension("guide/setup.rst"), "guide/setup");
        assert_eq!(strip_extension("v1.2/readme"), "v1.2/readme");
        assert_eq!(strip_extension(".hidden"), ".hidden");
    }

    #[test]
    fn test_memory_filesystem_read_write() {
        let fs = MemoryFilesystem::new();
        assert!(!fs.has("a.rst"));
        fs.write("docs/a.rst", "Hello").unwrap();
        assert!(fs.has("docs/a.rst"));
        assert!(fs.is_directory("docs"));
        assert_eq!(fs.read("docs/./a.rst").unwrap(), "Hello");
        assert!(matches!(fs.read("missing.rst"), Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_memory_filesystem_find() {
        let fs = MemoryFilesystem::with_files([
            ("index.rst", ""),
            ("chapters/one.rst", ""),
            ("chapters/two.rst", ""),
            ("chapters/deep/three.rst", ""),
        ]);
        assert_eq!(
            fs.find("chapters/*.rst").unwrap(),
            vec!["chapters/one.rst", "chapters/two.rst"]
        );
        assert_eq!(fs.find("**/*.rst").unwrap().len(), 4);
    }

    #[test]
    fn test_memory_filesystem_listing() {
        let fs = MemoryFilesystem::with_files([("a.rst", ""), ("sub/b.rst", ""), ("sub/c/d.rst", "")]);
        let flat = fs.list_contents("", false).unwrap();
        assert_eq!(
            flat,
            vec![
                FileEntry {
                    path: "a.rst".to_string(),
                    is_directory: false
                },
                FileEntry {
                    path: "sub".to_string(),
                    is_directory: true
                },
            ]
        );
        let deep = fs.list_contents("sub", true).unwrap();
        assert!(deep.iter().any(|e| e.path == "sub/c/d.rst" && !e.is_directory));
        assert!(deep.iter().any(|e| e.path == "sub/c" && e.is_directory));
    }

    #[test]
    fn test_local_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFilesystem::new(dir.path());
        fs.write("guide/setup.rst", "Setup").unwrap();
        fs.write("index.rst", "Index").unwrap();

        assert!(fs.has("guide/setup.rst"));
        assert!(fs.is_directory("guide"));
        assert_eq!(fs.read("index.rst").unwrap(), "Index");
        assert_eq!(fs.find("*.rst").unwrap(), vec!["index.rst"]);
        assert_eq!(fs.find("guide/*.rst").unwrap(), vec!["guide/setup.rst"]);

        let entries = fs.list_contents("", true).unwrap();
        assert_eq!(entries.len(), 3);
    }
}
