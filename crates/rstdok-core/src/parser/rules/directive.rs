use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use rstdok_ast::{DirectiveNode, Node};

use super::{Grammar, Rule};
use crate::error::ParseError;
use crate::parser::context::BlockContext;
use crate::parser::lines::{dedent, indentation, is_blank, trim_blank_edges};

static DIRECTIVE_RE: OnceLock<Regex> = OnceLock::new();
static OPTION_RE: OnceLock<Regex> = OnceLock::new();

pub(crate) fn directive_re() -> &'static Regex {
    DIRECTIVE_RE.get_or_init(|| {
        Regex::new(r"^\.\.\s+(?:\|([^|]+)\|\s+)?([^\s|`]+?)::(?:\s+(.*?))?\s*$").unwrap()
    })
}

fn option_re() -> &'static Regex {
    OPTION_RE.get_or_init(|| Regex::new(r"^:([^:\s][^:]*):(?:\s+(.*))?$").unwrap())
}

/// `.. name:: argument` with options and an indented body, kept raw until
/// the directive pass dispatches it
pub struct DirectiveRule;

impl Rule for DirectiveRule {
    fn name(&self) -> &'static str {
        "directive"
    }

    fn applies(&self, context: &BlockContext<'_>) -> bool {
        context.current().is_some_and(|l| directive_re().is_match(l))
    }

    fn apply(
        &self,
        context: &mut BlockContext<'_>,
        _grammar: &Grammar,
    ) -> Result<Option<Node>, ParseError> {
        let line = context.line_number();
        let Some(first) = context.lines.advance() else {
            return Ok(None);
        };
        let Some(caps) = directive_re().captures(&first) else {
            return Ok(None);
        };

        let block = dedent(&context.lines.take_indented(1));
        let (options, body_start) = parse_options(&block);
        let content = trim_blank_edges(block[body_start..].to_vec()).join("\n");

        Ok(Some(Node::Directive(DirectiveNode {
            name: caps[2].to_string(),
            data: caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
            variable: caps.get(1).map(|m| m.as_str().trim().to_string()),
            options,
            content,
            line,
        })))
    }
}

/// Leading `:name: value` lines of a directive block. Deeper indented lines
/// continue the previous option value.
fn parse_options(block: &[String]) -> (BTreeMap<String, String>, usize) {
    let mut options = BTreeMap::new();
    let mut last: Option<String> = None;
    let mut index = 0;

    while let Some(line) = block.get(index) {
        if is_blank(line) {
            break;
        }
        if let Some(caps) = option_re().captures(line) {
            let name = caps[1].trim().to_lowercase();
            let value = caps.get(2).map(|m| m.as_str().trim().to_string()).unwrap_or_default();
            options.insert(name.clone(), value);
            last = Some(name);
        } else if let (Some(name), true) = (&last, indentation(line) > 0) {
            if let Some(value) = options.get_mut(name) {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(line.trim());
            }
        } else {
            break;
        }
        index += 1;
    }

    (options, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    #[test]
    fn test_directive_pattern() {
        let caps = directive_re().captures(".. code-block:: rust").unwrap();
        assert_eq!(&caps[2], "code-block");
        assert_eq!(&caps[3], "rust");

        let caps = directive_re().captures(".. |logo| image:: logo.png").unwrap();
        assert_eq!(&caps[1], "logo");
        assert_eq!(&caps[2], "image");

        let caps = directive_re().captures(".. py:function:: main()").unwrap();
        assert_eq!(&caps[2], "py:function");

        let caps = directive_re().captures(".. toctree::").unwrap();
        assert!(caps.get(3).is_none());

        assert!(!directive_re().is_match(".. _target:"));
        assert!(!directive_re().is_match(".. just a comment"));
    }

    #[test]
    fn test_options_then_body() {
        let block = lines(":maxdepth: 2\n:caption: Contents\n   continued\n\nintro\nsetup");
        let (options, start) = parse_options(&block);
        assert_eq!(options.get("maxdepth").map(String::as_str), Some("2"));
        assert_eq!(options.get("caption").map(String::as_str), Some("Contents continued"));
        assert_eq!(start, 3);
    }

    #[test]
    fn test_flag_option() {
        let (options, start) = parse_options(&lines(":hidden:"));
        assert_eq!(options.get("hidden").map(String::as_str), Some(""));
        assert_eq!(start, 1);
    }
}
