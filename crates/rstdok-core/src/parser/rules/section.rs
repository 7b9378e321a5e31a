//! Section titles
//!
//! A title is a text line with an underline (and optionally a matching
//! overline) of one repeated punctuation character. Levels are assigned per
//! document in order of first appearance of the adornment character.

use rstdok_ast::{Node, SectionNode, TitleNode};

use super::{Grammar, Rule};
use crate::error::ParseError;
use crate::parser::context::BlockContext;
use crate::parser::lines::{indentation, is_blank, LinesIterator};
use crate::parser::slugify;

/// A title found at the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleCandidate {
    pub letter: char,
    pub text: String,
    pub overline: bool,
}

impl TitleCandidate {
    /// Lines occupied by the title and its adornment
    pub fn line_count(&self) -> usize {
        if self.overline {
            3
        } else {
            2
        }
    }
}

/// `(character, length)` when the line is one punctuation character repeated
pub fn adornment(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_end();
    let first = trimmed.chars().next()?;
    if !first.is_ascii_punctuation() || !trimmed.chars().all(|c| c == first) {
        return None;
    }
    Some((first, trimmed.chars().count()))
}

/// Detect a section title at the cursor
pub fn detect_title(lines: &LinesIterator) -> Option<TitleCandidate> {
    let first = lines.current()?;
    if is_blank(first) {
        return None;
    }

    if let Some((letter, length)) = adornment(first) {
        let text = lines.peek(1)?;
        let under = lines.peek(2)?;
        if is_blank(text) || adornment(text).is_some() {
            return None;
        }
        let (under_letter, _) = adornment(under)?;
        if under_letter != letter || text.trim().chars().count() > length {
            return None;
        }
        return Some(TitleCandidate {
            letter,
            text: text.trim().to_string(),
            overline: true,
        });
    }

    if indentation(first) > 0 {
        return None;
    }
    let (letter, length) = adornment(lines.peek(1)?)?;
    let text_length = first.trim_end().chars().count();
    if length < 2 || (length < text_length && length < 4) {
        return None;
    }
    Some(TitleCandidate {
        letter,
        text: first.trim().to_string(),
        overline: false,
    })
}

pub struct SectionRule;

impl Rule for SectionRule {
    fn name(&self) -> &'static str {
        "section"
    }

    fn applies(&self, context: &BlockContext<'_>) -> bool {
        detect_title(&context.lines).is_some()
    }

    fn apply(
        &self,
        context: &mut BlockContext<'_>,
        grammar: &Grammar,
    ) -> Result<Option<Node>, ParseError> {
        let Some(candidate) = detect_title(&context.lines) else {
            return Ok(None);
        };
        context.lines.skip(candidate.line_count());

        let level = context.document.register_title_letter(candidate.letter);
        let content = grammar.inline.parse(&candidate.text);
        let id = slugify(&content.to_plain_text());

        // a title at the same or a higher level closes this section
        let children = grammar.structural.parse_until(context, grammar, &|c: &BlockContext<'_>| {
            detect_title(&c.lines).is_some_and(|t| c.document.title_level(t.letter) <= level)
        })?;

        Ok(Some(Node::Section(SectionNode {
            title: TitleNode { level, id, content },
            children,
        })))
    }
}
