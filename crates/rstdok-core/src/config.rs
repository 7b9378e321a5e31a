//! Project configuration
//!
//! Settings are loaded from `rstdok.toml` in the project root:
//!
//! ```toml
//! [project]
//! title = "My Docs"
//! version = "1.2"
//!
//! [build]
//! input_format = "rst"
//! fail_on_log = true
//! max_workers = 4
//! worker_timeout_secs = 30
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::parser::InputFormat;

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProjectSettings {
    /// Project metadata
    pub project: ProjectInfo,
    /// Build behaviour
    pub build: BuildSettings,
}

impl ProjectSettings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load settings from a file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Project metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProjectInfo {
    /// Project title
    pub title: Option<String>,
    /// Project version, also available as the `|version|` substitution
    pub version: Option<String>,
}

/// Build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Source markup
    pub input_format: InputFormat,
    /// Extension of rendered files
    pub output_extension: String,
    /// Treat any logged warning or error as a build failure
    pub fail_on_log: bool,
    /// Parse documents on a worker pool
    pub parallel: bool,
    /// Upper bound on parse workers
    pub max_workers: usize,
    /// Wall-clock budget for parsing one document
    pub worker_timeout_secs: u64,
    /// Language for literal blocks without an explicit one
    pub default_code_language: Option<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            input_format: InputFormat::Rst,
            output_extension: "html".to_string(),
            fail_on_log: false,
            parallel: true,
            max_workers: 8,
            worker_timeout_secs: 60,
            default_code_language: None,
        }
    }
}

impl BuildSettings {
    /// Worker timeout as a duration
    pub fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ProjectSettings::default();
        assert_eq!(settings.build.input_format, InputFormat::Rst);
        assert_eq!(settings.build.output_extension, "html");
        assert!(!settings.build.fail_on_log);
        assert_eq!(settings.build.worker_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = ProjectSettings::from_toml_str(
            r#"
[project]
title = "Handbook"

[build]
input_format = "md"
fail_on_log = true
"#,
        )
        .unwrap();

        assert_eq!(settings.project.title.as_deref(), Some("Handbook"));
        assert_eq!(settings.build.input_format, InputFormat::Markdown);
        assert!(settings.build.fail_on_log);
        assert_eq!(settings.build.max_workers, 8);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(ProjectSettings::from_toml_str("[build]\nmax_workers = \"many\"").is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = ProjectSettings::load(Path::new("/nonexistent/rstdok.toml")).unwrap();
        assert_eq!(settings, ProjectSettings::default());
    }
}
