//! Production rules
//!
//! A [`RuleContainer`] tries its rules in order at the cursor; the first one
//! whose `applies` check passes consumes lines and may produce a node. The
//! [`Grammar`] owns the structural container (document and section level,
//! sections and transitions recognised) and the body container used for
//! nested content.

pub mod block_quote;
pub mod comment;
pub mod definition_list;
pub mod directive;
pub mod field_list;
pub mod link_target;
pub mod list;
pub mod literal_block;
pub mod paragraph;
pub mod section;
pub mod table;
pub mod transition;

use std::fmt;

use rstdok_ast::Node;

use super::context::BlockContext;
use super::inline::InlineParser;
use crate::error::ParseError;

/// A block-level production
pub trait Rule: Send + Sync {
    /// Rule name, for tracing
    fn name(&self) -> &'static str;

    /// Whether the rule accepts the lines at the cursor
    fn applies(&self, context: &BlockContext<'_>) -> bool;

    /// Consume lines, producing at most one node. Must advance the cursor.
    fn apply(
        &self,
        context: &mut BlockContext<'_>,
        grammar: &Grammar,
    ) -> Result<Option<Node>, ParseError>;
}

/// Ordered rule list
pub struct RuleContainer {
    rules: Vec<Box<dyn Rule>>,
}

impl fmt::Debug for RuleContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.name()))
            .finish()
    }
}

impl RuleContainer {
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// Rule names in priority order
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Parse until the context is exhausted
    pub fn parse(
        &self,
        context: &mut BlockContext<'_>,
        grammar: &Grammar,
    ) -> Result<Vec<Node>, ParseError> {
        self.parse_until(context, grammar, &|_| false)
    }

    /// Parse until the context is exhausted or `stop` accepts the line at
    /// the cursor
    pub fn parse_until(
        &self,
        context: &mut BlockContext<'_>,
        grammar: &Grammar,
        stop: &dyn Fn(&BlockContext<'_>) -> bool,
    ) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();

        loop {
            context.lines.skip_blank_lines();
            if context.lines.is_at_end() || stop(context) {
                break;
            }

            let Some(rule) = self.rules.iter().find(|rule| rule.applies(context)) else {
                return Err(no_rule_applies(context));
            };

            let before = context.lines.position();
            context.next_literal = false;
            tracing::trace!(rule = rule.name(), line = context.line_number(), "Applying rule");
            let node = rule.apply(context, grammar)?;

            if context.lines.position() == before {
                return Err(no_rule_applies(context));
            }
            nodes.extend(node);
        }

        Ok(nodes)
    }
}

fn no_rule_applies(context: &BlockContext<'_>) -> ParseError {
    ParseError::NoRuleApplies {
        file: context.document.file_path.clone(),
        line: context.line_number(),
        content: context.current().unwrap_or_default().to_string(),
    }
}

/// Rules for nested content, in priority order
pub fn body_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(link_target::LinkTargetRule),
        Box::new(directive::DirectiveRule),
        Box::new(comment::CommentRule),
        Box::new(literal_block::LiteralBlockRule),
        Box::new(table::GridTableRule),
        Box::new(table::SimpleTableRule),
        Box::new(field_list::FieldListRule),
        Box::new(list::BulletListRule),
        Box::new(list::EnumeratedListRule),
        Box::new(block_quote::BlockQuoteRule),
        Box::new(definition_list::DefinitionListRule),
        Box::new(paragraph::ParagraphRule),
    ]
}

/// Rules for document and section level: sections and transitions, then
/// everything a body accepts
pub fn structural_rules() -> Vec<Box<dyn Rule>> {
    let mut rules: Vec<Box<dyn Rule>> = vec![
        Box::new(section::SectionRule),
        Box::new(transition::TransitionRule),
    ];
    rules.extend(body_rules());
    rules
}

/// The complete rule set
#[derive(Debug)]
pub struct Grammar {
    pub structural: RuleContainer,
    pub body: RuleContainer,
    pub inline: InlineParser,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar {
    pub fn new() -> Self {
        Self {
            structural: RuleContainer::new(structural_rules()),
            body: RuleContainer::new(body_rules()),
            inline: InlineParser::new(),
        }
    }

    /// Parse `lines` as nested body content sharing the document context
    pub fn parse_nested(
        &self,
        context: &mut BlockContext<'_>,
        lines: Vec<String>,
        offset: usize,
    ) -> Result<Vec<Node>, ParseError> {
        let mut child = context.child(lines, offset);
        self.body.parse(&mut child, self)
    }
}
