//! Output URL computation

use crate::fs::dirname;

/// Maps document paths to output URLs relative to another document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlGenerator {
    extension: String,
}

impl Default for UrlGenerator {
    fn default() -> Self {
        Self::new("html")
    }
}

impl UrlGenerator {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    /// Output path of a document, relative to the output root
    pub fn output_path(&self, document: &str) -> String {
        format!("{}.{}", document, self.extension)
    }

    /// URL of `to` (optionally at `anchor`) as seen from the document `from`
    ///
    /// # Example
    ///
    /// ```
    /// use rstdok_core::compiler::UrlGenerator;
    ///
    /// let urls = UrlGenerator::default();
    /// assert_eq!(urls.relative_url("index", "a", Some("foo")), "a.html#foo");
    /// assert_eq!(urls.relative_url("guide/setup", "a", Some("foo")), "../a.html#foo");
    /// assert_eq!(urls.relative_url("a", "a", Some("foo")), "#foo");
    /// ```
    pub fn relative_url(&self, from: &str, to: &str, anchor: Option<&str>) -> String {
        let fragment = anchor
            .filter(|a| !a.is_empty())
            .map(|a| format!("#{}", a))
            .unwrap_or_default();
        if from == to && !fragment.is_empty() {
            return fragment;
        }

        let from_dir = dirname(from);
        let from_parts: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
        let target = self.output_path(to);
        let to_parts: Vec<&str> = target.split('/').collect();

        let common = from_parts
            .iter()
            .zip(to_parts.iter())
            .take_while(|(a, b)| a == b)
            .count();
        // the file name itself is never part of the common prefix
        let common = common.min(to_parts.len() - 1);

        let mut segments: Vec<&str> = vec![".."; from_parts.len() - common];
        segments.extend(&to_parts[common..]);
        format!("{}{}", segments.join("/"), fragment)
    }

    /// Prefix leading from a document back to the output root (`""`,
    /// `"../"`, ...)
    pub fn root_prefix(&self, from: &str) -> String {
        let depth = dirname(from).split('/').filter(|s| !s.is_empty()).count();
        "../".repeat(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_documents() {
        let urls = UrlGenerator::default();
        assert_eq!(urls.relative_url("b", "a", Some("foo")), "a.html#foo");
        assert_eq!(urls.relative_url("guide/b", "guide/a", None), "a.html");
    }

    #[test]
    fn test_across_directories() {
        let urls = UrlGenerator::default();
        assert_eq!(urls.relative_url("sub/b", "a", Some("foo")), "../a.html#foo");
        assert_eq!(urls.relative_url("index", "guide/a", None), "guide/a.html");
        assert_eq!(
            urls.relative_url("api/v1/ref", "guide/setup", Some("x")),
            "../../guide/setup.html#x"
        );
    }

    #[test]
    fn test_custom_extension_and_root_prefix() {
        let urls = UrlGenerator::new(".htm");
        assert_eq!(urls.output_path("index"), "index.htm");
        assert_eq!(urls.root_prefix("index"), "");
        assert_eq!(urls.root_prefix("a/b/c"), "../../");
    }

    #[test]
    fn test_same_document_without_anchor_links_to_itself() {
        let urls = UrlGenerator::default();
        assert_eq!(urls.relative_url("guide/a", "guide/a", None), "a.html");
    }
}
