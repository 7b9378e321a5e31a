//! Text role resolution
//!
//! One resolver handles every role: the well-known ones map onto dedicated
//! inline kinds, everything else becomes a generic [`RoleNode`].

use std::sync::OnceLock;

use regex::Regex;
use rstdok_ast::{InlineNode, ReferenceKind, ReferenceNode, RoleNode};

use crate::parser::{normalize_name, slugify};

static TARGET_RE: OnceLock<Regex> = OnceLock::new();
static ABBREVIATION_RE: OnceLock<Regex> = OnceLock::new();

/// Split `text <target>` into its parts; plain content is all target
pub fn split_target(content: &str) -> (Option<String>, String) {
    let re = TARGET_RE.get_or_init(|| Regex::new(r"(?s)^(.*?)\s*<([^<>]+)>\s*$").unwrap());
    match re.captures(content) {
        Some(caps) => {
            let text = caps[1].trim();
            let target = caps[2].trim().to_string();
            if text.is_empty() {
                (None, target)
            } else {
                (Some(text.replace('\n', " ")), target)
            }
        }
        None => (None, content.trim().to_string()),
    }
}

/// Whether a link target points outside the project
pub fn is_external(target: &str) -> bool {
    target.contains("://") || target.starts_with("mailto:") || target.starts_with('#')
}

/// Resolve `:domain:role:`content`` into an inline node
pub fn resolve_role(domain: Option<&str>, role: &str, content: &str) -> InlineNode {
    let domain = domain.filter(|d| *d != "std");
    if domain.is_some() {
        return generic(domain, role, content);
    }

    match role {
        "ref" => {
            let (text, target) = split_target(content);
            InlineNode::Reference(ReferenceNode::new(ReferenceKind::Ref, slugify(&target), text))
        }
        "doc" => {
            let (text, target) = split_target(content);
            InlineNode::Reference(ReferenceNode::new(ReferenceKind::Doc, target, text))
        }
        "literal" | "code" | "samp" | "file" | "command" | "kbd" => {
            InlineNode::Literal(content.to_string())
        }
        "emphasis" | "title-reference" | "t" => InlineNode::Emphasis(content.to_string()),
        "strong" => InlineNode::Strong(content.to_string()),
        "abbreviation" | "abbr" => {
            let re = ABBREVIATION_RE
                .get_or_init(|| Regex::new(r"(?s)^(.*?)\s*\(([^()]+)\)\s*$").unwrap());
            match re.captures(content) {
                Some(caps) => InlineNode::Role(RoleNode {
                    domain: None,
                    role: "abbreviation".to_string(),
                    content: caps[1].to_string(),
                    title: Some(caps[2].to_string()),
                }),
                None => generic(None, "abbreviation", content),
            }
        }
        "named" => InlineNode::Reference(ReferenceNode::new(
            ReferenceKind::Named,
            normalize_name(content),
            Some(content.to_string()),
        )),
        _ => generic(None, role, content),
    }
}

fn generic(domain: Option<&str>, role: &str, content: &str) -> InlineNode {
    InlineNode::Role(RoleNode {
        domain: domain.map(String::from),
        role: role.to_string(),
        content: content.to_string(),
        title: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_target() {
        assert_eq!(
            split_target("Install guide <install>"),
            (Some("Install guide".to_string()), "install".to_string())
        );
        assert_eq!(split_target("install"), (None, "install".to_string()));
        assert_eq!(split_target("<install>"), (None, "install".to_string()));
    }

    #[test]
    fn test_ref_role_slugifies_target() {
        match resolve_role(None, "ref", "My Label") {
            InlineNode::Reference(reference) => {
                assert_eq!(reference.kind, ReferenceKind::Ref);
                assert_eq!(reference.target, "my-label");
                assert_eq!(reference.text, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_doc_role_keeps_path() {
        match resolve_role(Some("std"), "doc", "Setup </guide/setup>") {
            InlineNode::Reference(reference) => {
                assert_eq!(reference.kind, ReferenceKind::Doc);
                assert_eq!(reference.target, "/guide/setup");
                assert_eq!(reference.text.as_deref(), Some("Setup"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_simple_roles() {
        assert_eq!(
            resolve_role(None, "code", "x = 1"),
            InlineNode::Literal("x = 1".to_string())
        );
        assert_eq!(
            resolve_role(None, "strong", "loud"),
            InlineNode::Strong("loud".to_string())
        );
    }

    #[test]
    fn test_abbreviation() {
        match resolve_role(None, "abbr", "LIFO (last-in, first-out)") {
            InlineNode::Role(role) => {
                assert_eq!(role.content, "LIFO");
                assert_eq!(role.title.as_deref(), Some("last-in, first-out"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_and_domain_roles_are_generic() {
        match resolve_role(Some("py"), "func", "main") {
            InlineNode::Role(role) => {
                assert_eq!(role.domain.as_deref(), Some("py"));
                assert_eq!(role.role, "func");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            resolve_role(None, "sup", "2"),
            InlineNode::Role(RoleNode { .. })
        ));
    }
}
