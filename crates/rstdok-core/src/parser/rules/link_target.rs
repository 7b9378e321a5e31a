use std::sync::OnceLock;

use regex::Regex;
use rstdok_ast::{AnchorNode, Node};

use super::{Grammar, Rule};
use crate::error::ParseError;
use crate::parser::context::BlockContext;
use crate::parser::lines::dedent;
use crate::parser::{normalize_name, slugify};

static TARGET_RE: OnceLock<Regex> = OnceLock::new();

fn target_re() -> &'static Regex {
    TARGET_RE.get_or_init(|| Regex::new(r"^\.\.\s+_(`[^`]+`|[^:`][^:]*):(?:\s+(.*))?\s*$").unwrap())
}

/// `.. _name:` anchors and `.. _name: url` external targets
pub struct LinkTargetRule;

impl Rule for LinkTargetRule {
    fn name(&self) -> &'static str {
        "link_target"
    }

    fn applies(&self, context: &BlockContext<'_>) -> bool {
        context.current().is_some_and(|l| target_re().is_match(l))
    }

    fn apply(
        &self,
        context: &mut BlockContext<'_>,
        _grammar: &Grammar,
    ) -> Result<Option<Node>, ParseError> {
        let Some(line) = context.lines.advance() else {
            return Ok(None);
        };
        let Some(caps) = target_re().captures(&line) else {
            return Ok(None);
        };
        let name = caps[1].trim_matches('`').trim().to_string();
        let mut url = caps.get(2).map(|m| m.as_str().trim().to_string()).unwrap_or_default();

        // long URLs may continue on indented lines
        for continuation in dedent(&context.lines.take_indented(1)) {
            url.push_str(continuation.trim());
        }

        if url.is_empty() {
            return Ok(Some(Node::Anchor(AnchorNode {
                name: slugify(&name),
            })));
        }

        tracing::trace!(name = %name, url = %url, "External link target");
        context.document.links.insert(normalize_name(&name), url);
        Ok(None)
    }
}
