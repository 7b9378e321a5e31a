//! Inline rules, tried in priority order
//!
//! A rule that starts consuming takes a snapshot first. When the closing
//! marker is missing it rolls back, so the same tokens are offered to the
//! next rule and eventually to [`PlainTextRule`].

use rstdok_ast::{HyperlinkNode, InlineNode, ReferenceKind, ReferenceNode, VariableNode};

use super::lexer::{raw_text, value_text, TokenKind, TokenStream};
use super::roles::{resolve_role, split_target};
use crate::parser::normalize_name;

/// A single inline production
pub trait InlineRule: Send + Sync {
    /// Rule name, for debugging
    fn name(&self) -> &'static str;

    /// Cheap check on the token at the cursor
    fn applies(&self, stream: &TokenStream) -> bool;

    /// Consume tokens and produce a node. Returns `None` with the cursor
    /// unchanged when the construct is incomplete.
    fn apply(&self, stream: &mut TokenStream) -> Option<InlineNode>;
}

fn peek_is(stream: &TokenStream, kind: TokenKind) -> bool {
    stream.peek().is_some_and(|t| t.kind == kind)
}

/// Consume `start`, then everything up to a matching `end` marker
fn delimited(stream: &mut TokenStream, end: TokenKind) -> Option<Vec<super::lexer::Token>> {
    stream.snapshot();
    stream.next_token();
    match stream.take_until(end) {
        Some(content) => {
            stream.commit();
            Some(content)
        }
        None => {
            stream.rollback();
            None
        }
    }
}

fn single_line(text: String) -> String {
    text.replace('\n', " ")
}

/// `\x`
pub struct EscapeRule;

impl InlineRule for EscapeRule {
    fn name(&self) -> &'static str {
        "escape"
    }

    fn applies(&self, stream: &TokenStream) -> bool {
        peek_is(stream, TokenKind::Escaped)
    }

    fn apply(&self, stream: &mut TokenStream) -> Option<InlineNode> {
        let token = stream.next_token()?;
        Some(InlineNode::Plain(token.value().to_string()))
    }
}

/// ``` ``literal`` ```
pub struct LiteralRule;

impl InlineRule for LiteralRule {
    fn name(&self) -> &'static str {
        "literal"
    }

    fn applies(&self, stream: &TokenStream) -> bool {
        peek_is(stream, TokenKind::DoubleBacktick) && stream.can_open()
    }

    fn apply(&self, stream: &mut TokenStream) -> Option<InlineNode> {
        let content = delimited(stream, TokenKind::DoubleBacktick)?;
        Some(InlineNode::Literal(single_line(raw_text(&content))))
    }
}

/// `:role:`content``
pub struct RoleRule;

impl InlineRule for RoleRule {
    fn name(&self) -> &'static str {
        "role"
    }

    fn applies(&self, stream: &TokenStream) -> bool {
        peek_is(stream, TokenKind::Role)
            && stream.peek_at(1).is_some_and(|t| t.kind == TokenKind::Backtick)
    }

    fn apply(&self, stream: &mut TokenStream) -> Option<InlineNode> {
        stream.snapshot();
        let role = stream.next_token()?;
        stream.next_token();
        let Some(content) = stream.take_until(TokenKind::Backtick) else {
            stream.rollback();
            return None;
        };
        stream.commit();

        let parts: Vec<&str> = role.text.split(':').filter(|p| !p.is_empty()).collect();
        let (domain, name) = match parts.as_slice() {
            [domain, name] => (Some(*domain), *name),
            [name] => (None, *name),
            _ => (None, role.text.trim_matches(':')),
        };
        Some(resolve_role(
            domain,
            name,
            &single_line(value_text(&content)),
        ))
    }
}

/// `` `phrase`_ ``, `` `text <url>`_ `` and anonymous `` `phrase`__ ``
pub struct PhraseReferenceRule;

impl InlineRule for PhraseReferenceRule {
    fn name(&self) -> &'static str {
        "phrase_reference"
    }

    fn applies(&self, stream: &TokenStream) -> bool {
        peek_is(stream, TokenKind::Backtick) && stream.can_open()
    }

    fn apply(&self, stream: &mut TokenStream) -> Option<InlineNode> {
        stream.snapshot();
        stream.next_token();
        let content = stream.take_until(TokenKind::Backtick);
        let end = stream.peek().filter(|t| t.is_reference_end()).map(|t| t.kind);
        let (Some(content), Some(end)) = (content, end) else {
            stream.rollback();
            return None;
        };
        stream.next_token();
        stream.commit();

        let content = single_line(value_text(&content));
        let (text, target) = split_target(&content);
        let has_explicit_target = text.is_some() || content.trim_end().ends_with('>');

        if has_explicit_target {
            if let Some(name) = target.strip_suffix('_') {
                return Some(InlineNode::Reference(ReferenceNode::new(
                    ReferenceKind::Named,
                    normalize_name(name),
                    text,
                )));
            }
            let text = text.unwrap_or_else(|| target.clone());
            return Some(InlineNode::Hyperlink(HyperlinkNode { text, url: target }));
        }

        let kind = if end == TokenKind::AnonymousReferenceEnd {
            ReferenceKind::Anonymous
        } else {
            ReferenceKind::Named
        };
        Some(InlineNode::Reference(ReferenceNode::new(
            kind,
            normalize_name(&content),
            Some(content),
        )))
    }
}

/// `` `interpreted text` `` without a role; rendered as a literal
pub struct DefaultRoleRule;

impl InlineRule for DefaultRoleRule {
    fn name(&self) -> &'static str {
        "default_role"
    }

    fn applies(&self, stream: &TokenStream) -> bool {
        peek_is(stream, TokenKind::Backtick) && stream.can_open()
    }

    fn apply(&self, stream: &mut TokenStream) -> Option<InlineNode> {
        let content = delimited(stream, TokenKind::Backtick)?;
        Some(resolve_role(None, "literal", &single_line(value_text(&content))))
    }
}

/// `**strong**`
pub struct StrongRule;

impl InlineRule for StrongRule {
    fn name(&self) -> &'static str {
        "strong"
    }

    fn applies(&self, stream: &TokenStream) -> bool {
        peek_is(stream, TokenKind::DoubleStar) && stream.can_open()
    }

    fn apply(&self, stream: &mut TokenStream) -> Option<InlineNode> {
        let content = delimited(stream, TokenKind::DoubleStar)?;
        Some(InlineNode::Strong(single_line(value_text(&content))))
    }
}

/// `*emphasis*`
pub struct EmphasisRule;

impl InlineRule for EmphasisRule {
    fn name(&self) -> &'static str {
        "emphasis"
    }

    fn applies(&self, stream: &TokenStream) -> bool {
        peek_is(stream, TokenKind::Star) && stream.can_open()
    }

    fn apply(&self, stream: &mut TokenStream) -> Option<InlineNode> {
        let content = delimited(stream, TokenKind::Star)?;
        Some(InlineNode::Emphasis(single_line(value_text(&content))))
    }
}

/// `|substitution|`
pub struct VariableRule;

impl InlineRule for VariableRule {
    fn name(&self) -> &'static str {
        "variable"
    }

    fn applies(&self, stream: &TokenStream) -> bool {
        peek_is(stream, TokenKind::Pipe) && stream.can_open()
    }

    fn apply(&self, stream: &mut TokenStream) -> Option<InlineNode> {
        let content = delimited(stream, TokenKind::Pipe)?;
        if stream.peek().is_some_and(|t| t.is_reference_end()) {
            stream.next_token();
        }
        Some(InlineNode::Variable(VariableNode {
            name: single_line(value_text(&content)).trim().to_string(),
            value: None,
        }))
    }
}

/// `word_` and `word__`
pub struct WordReferenceRule;

impl InlineRule for WordReferenceRule {
    fn name(&self) -> &'static str {
        "word_reference"
    }

    fn applies(&self, stream: &TokenStream) -> bool {
        peek_is(stream, TokenKind::Word) && stream.peek_at(1).is_some_and(|t| t.is_reference_end())
    }

    fn apply(&self, stream: &mut TokenStream) -> Option<InlineNode> {
        let word = stream.next_token()?;
        let end = stream.next_token()?;
        let kind = if end.kind == TokenKind::AnonymousReferenceEnd {
            ReferenceKind::Anonymous
        } else {
            ReferenceKind::Named
        };
        Some(InlineNode::Reference(ReferenceNode::new(
            kind,
            normalize_name(&word.text),
            Some(word.text),
        )))
    }
}

/// Standalone URLs and e-mail addresses
pub struct HyperlinkRule;

impl InlineRule for HyperlinkRule {
    fn name(&self) -> &'static str {
        "hyperlink"
    }

    fn applies(&self, stream: &TokenStream) -> bool {
        peek_is(stream, TokenKind::Hyperlink) || peek_is(stream, TokenKind::Email)
    }

    fn apply(&self, stream: &mut TokenStream) -> Option<InlineNode> {
        let token = stream.next_token()?;
        let url = if token.kind == TokenKind::Email {
            format!("mailto:{}", token.text)
        } else {
            token.text.clone()
        };
        Some(InlineNode::Hyperlink(HyperlinkNode {
            text: token.text,
            url,
        }))
    }
}

/// No-break space
pub struct NbspRule;

impl InlineRule for NbspRule {
    fn name(&self) -> &'static str {
        "nbsp"
    }

    fn applies(&self, stream: &TokenStream) -> bool {
        peek_is(stream, TokenKind::Nbsp)
    }

    fn apply(&self, stream: &mut TokenStream) -> Option<InlineNode> {
        stream.next_token()?;
        Some(InlineNode::Nbsp)
    }
}

/// Fallback: one token of plain text
pub struct PlainTextRule;

impl InlineRule for PlainTextRule {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn applies(&self, stream: &TokenStream) -> bool {
        !stream.is_at_end()
    }

    fn apply(&self, stream: &mut TokenStream) -> Option<InlineNode> {
        let token = stream.next_token()?;
        Some(InlineNode::Plain(token.value().to_string()))
    }
}

/// The default rule set in priority order
pub fn default_rules() -> Vec<Box<dyn InlineRule>> {
    vec![
        Box::new(EscapeRule),
        Box::new(LiteralRule),
        Box::new(RoleRule),
        Box::new(PhraseReferenceRule),
        Box::new(DefaultRoleRule),
        Box::new(StrongRule),
        Box::new(EmphasisRule),
        Box::new(VariableRule),
        Box::new(WordReferenceRule),
        Box::new(HyperlinkRule),
        Box::new(NbspRule),
        Box::new(PlainTextRule),
    ]
}
