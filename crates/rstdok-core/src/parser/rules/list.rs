//! Bullet and enumerated lists
//!
//! Consecutive items with the same marker form one list. An item's body is
//! the text after the marker plus the indented lines below it, parsed
//! recursively as body content.

use std::sync::OnceLock;

use regex::Regex;
use rstdok_ast::{EnumeratorStyle, ListItemNode, ListKind, ListNode, Node};

use super::{Grammar, Rule};
use crate::error::ParseError;
use crate::parser::context::BlockContext;
use crate::parser::lines::{indentation, is_blank, LinesIterator};

static BULLET_RE: OnceLock<Regex> = OnceLock::new();
static ENUMERATOR_RE: OnceLock<Regex> = OnceLock::new();

fn bullet_re() -> &'static Regex {
    BULLET_RE.get_or_init(|| Regex::new(r"^([*+\-•‣⁃])(?:( +)(.*))?$").unwrap())
}

fn enumerator_re() -> &'static Regex {
    ENUMERATOR_RE.get_or_init(|| {
        Regex::new(
            r"^(?:\(([0-9]+|#|[a-zA-Z]|[ivxlcdm]+|[IVXLCDM]+)\)|([0-9]+|#|[a-zA-Z]|[ivxlcdm]+|[IVXLCDM]+)([.)]))(?:( +)(.*))?$",
        )
        .unwrap()
    })
}

/// Offset of the next non-blank line after the cursor line
fn next_content(lines: &LinesIterator) -> Option<usize> {
    let mut n = 1;
    loop {
        let line = lines.peek(n)?;
        if !is_blank(line) {
            return Some(n);
        }
        n += 1;
    }
}

/// First line plus continuation lines, with the marker column removed
fn item_lines(first: &str, rest: Vec<String>, column: usize) -> Vec<String> {
    let mut lines = vec![first.to_string()];
    lines.extend(rest.into_iter().map(|line| {
        let strip = indentation(&line).min(column);
        line.chars().skip(strip).collect()
    }));
    lines
}

/// Consume one item at the cursor and parse its body
fn parse_item(
    context: &mut BlockContext<'_>,
    grammar: &Grammar,
    prefix: String,
    first: String,
    column: usize,
) -> Result<Node, ParseError> {
    let offset = context.lines.source_line();
    context.lines.advance();
    let rest = context.lines.take_indented(1);
    let children = grammar.parse_nested(context, item_lines(&first, rest, column), offset)?;
    Ok(Node::ListItem(ListItemNode { prefix, children }))
}

/// Skip blank lines when the next content line satisfies `is_next`
fn continue_list(context: &mut BlockContext<'_>, is_next: impl Fn(&str) -> bool) -> bool {
    match context.current() {
        Some(line) if !is_blank(line) => is_next(line),
        Some(_) => {
            let found = next_content(&context.lines)
                .and_then(|n| context.lines.peek(n))
                .is_some_and(&is_next);
            if found {
                context.lines.skip_blank_lines();
            }
            found
        }
        None => false,
    }
}

struct Bullet {
    marker: char,
    column: usize,
    content: String,
}

fn parse_bullet(line: &str) -> Option<Bullet> {
    let caps = bullet_re().captures(line)?;
    let marker = caps[1].chars().next()?;
    let column = caps.get(2).map(|m| m.as_str().len()).unwrap_or(1) + 1;
    Some(Bullet {
        marker,
        column,
        content: caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
    })
}

/// `*`, `-`, `+` (and typographic bullets) lists
pub struct BulletListRule;

impl Rule for BulletListRule {
    fn name(&self) -> &'static str {
        "bullet_list"
    }

    fn applies(&self, context: &BlockContext<'_>) -> bool {
        context.current().is_some_and(|l| parse_bullet(l).is_some())
    }

    fn apply(
        &self,
        context: &mut BlockContext<'_>,
        grammar: &Grammar,
    ) -> Result<Option<Node>, ParseError> {
        let Some(marker) = context.current().and_then(parse_bullet).map(|b| b.marker) else {
            return Ok(None);
        };
        let same_marker = |line: &str| parse_bullet(line).is_some_and(|b| b.marker == marker);

        let mut items = Vec::new();
        while let Some(bullet) = context.current().and_then(parse_bullet) {
            if bullet.marker != marker {
                break;
            }
            items.push(parse_item(
                context,
                grammar,
                marker.to_string(),
                bullet.content,
                bullet.column,
            )?);
            if !continue_list(context, &same_marker) {
                break;
            }
        }

        Ok(Some(Node::List(ListNode {
            list_kind: ListKind::Bullet { marker },
            items,
        })))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumeratorFormat {
    Period,
    RightParen,
    Parens,
}

#[derive(Debug, Clone)]
struct Enumerator {
    format: EnumeratorFormat,
    ordinal: String,
    prefix: String,
    column: usize,
    content: String,
}

fn parse_enumerator(line: &str) -> Option<Enumerator> {
    let caps = enumerator_re().captures(line)?;
    let (format, ordinal) = match (caps.get(1), caps.get(2), caps.get(3)) {
        (Some(ordinal), _, _) => (EnumeratorFormat::Parens, ordinal.as_str()),
        (None, Some(ordinal), Some(close)) if close.as_str() == "." => {
            (EnumeratorFormat::Period, ordinal.as_str())
        }
        (None, Some(ordinal), Some(_)) => (EnumeratorFormat::RightParen, ordinal.as_str()),
        _ => return None,
    };
    let prefix_end = caps.get(4).map(|m| m.start()).unwrap_or(line.trim_end().len());
    let column = caps.get(4).map(|m| m.end()).unwrap_or(prefix_end + 1);
    Some(Enumerator {
        format,
        ordinal: ordinal.to_string(),
        prefix: line[..prefix_end].to_string(),
        column,
        content: caps.get(5).map(|m| m.as_str().to_string()).unwrap_or_default(),
    })
}

/// Value of a roman numeral
pub fn roman_value(text: &str) -> Option<u32> {
    let digit = |c: char| match c.to_ascii_lowercase() {
        'i' => Some(1),
        'v' => Some(5),
        'x' => Some(10),
        'l' => Some(50),
        'c' => Some(100),
        'd' => Some(500),
        'm' => Some(1000),
        _ => None,
    };
    let values: Vec<u32> = text.chars().map(digit).collect::<Option<_>>()?;
    let mut total = 0;
    for (i, value) in values.iter().enumerate() {
        match values.get(i + 1) {
            Some(next) if next > value => total -= *value as i64,
            _ => total += *value as i64,
        }
    }
    u32::try_from(total).ok().filter(|t| *t > 0)
}

fn is_roman(text: &str, upper: bool) -> bool {
    let case_ok = if upper {
        text.chars().all(|c| c.is_ascii_uppercase())
    } else {
        text.chars().all(|c| c.is_ascii_lowercase())
    };
    case_ok && roman_value(text).is_some()
}

/// Style of the first enumerator of a list
fn initial_style(ordinal: &str) -> Option<EnumeratorStyle> {
    if ordinal == "#" {
        return Some(EnumeratorStyle::Auto);
    }
    if ordinal.chars().all(|c| c.is_ascii_digit()) {
        return Some(EnumeratorStyle::Arabic);
    }
    match ordinal {
        "i" => return Some(EnumeratorStyle::LowerRoman),
        "I" => return Some(EnumeratorStyle::UpperRoman),
        _ => {}
    }
    let mut chars = ordinal.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => Some(EnumeratorStyle::LowerAlpha),
        (Some(c), None) if c.is_ascii_uppercase() => Some(EnumeratorStyle::UpperAlpha),
        _ if is_roman(ordinal, false) => Some(EnumeratorStyle::LowerRoman),
        _ if is_roman(ordinal, true) => Some(EnumeratorStyle::UpperRoman),
        _ => None,
    }
}

fn matches_style(ordinal: &str, style: EnumeratorStyle) -> bool {
    let single = ordinal.chars().count() == 1;
    match style {
        EnumeratorStyle::Auto => ordinal == "#",
        EnumeratorStyle::Arabic => ordinal.chars().all(|c| c.is_ascii_digit()),
        EnumeratorStyle::LowerAlpha => single && ordinal.chars().all(|c| c.is_ascii_lowercase()),
        EnumeratorStyle::UpperAlpha => single && ordinal.chars().all(|c| c.is_ascii_uppercase()),
        EnumeratorStyle::LowerRoman => is_roman(ordinal, false),
        EnumeratorStyle::UpperRoman => is_roman(ordinal, true),
    }
}

fn ordinal_value(ordinal: &str, style: EnumeratorStyle) -> u32 {
    match style {
        EnumeratorStyle::Auto => 1,
        EnumeratorStyle::Arabic => ordinal.parse().unwrap_or(1),
        EnumeratorStyle::LowerAlpha | EnumeratorStyle::UpperAlpha => ordinal
            .chars()
            .next()
            .map(|c| c.to_ascii_lowercase() as u32 - 'a' as u32 + 1)
            .unwrap_or(1),
        EnumeratorStyle::LowerRoman | EnumeratorStyle::UpperRoman => {
            roman_value(ordinal).unwrap_or(1)
        }
    }
}

/// `1.`, `a)`, `(iv)` and `#.` lists
pub struct EnumeratedListRule;

impl Rule for EnumeratedListRule {
    fn name(&self) -> &'static str {
        "enumerated_list"
    }

    fn applies(&self, context: &BlockContext<'_>) -> bool {
        let Some(enumerator) = context.current().and_then(parse_enumerator) else {
            return false;
        };
        if initial_style(&enumerator.ordinal).is_none() {
            return false;
        }
        // "A. Smith wrote" is a paragraph: the next line must not be body text
        match context.lines.peek(1) {
            None => true,
            Some(next) => is_blank(next) || indentation(next) > 0 || parse_enumerator(next).is_some(),
        }
    }

    fn apply(
        &self,
        context: &mut BlockContext<'_>,
        grammar: &Grammar,
    ) -> Result<Option<Node>, ParseError> {
        let Some(first) = context.current().and_then(parse_enumerator) else {
            return Ok(None);
        };
        let Some(style) = initial_style(&first.ordinal) else {
            return Ok(None);
        };
        let start = ordinal_value(&first.ordinal, style);
        let format = first.format;
        let same_list = |line: &str| {
            parse_enumerator(line)
                .is_some_and(|e| e.format == format && matches_style(&e.ordinal, style))
        };

        let mut items = Vec::new();
        while let Some(enumerator) = context.current().and_then(parse_enumerator) {
            if enumerator.format != format || !matches_style(&enumerator.ordinal, style) {
                break;
            }
            items.push(parse_item(
                context,
                grammar,
                enumerator.prefix,
                enumerator.content,
                enumerator.column,
            )?);
            if !continue_list(context, &same_list) {
                break;
            }
        }

        Ok(Some(Node::List(ListNode {
            list_kind: ListKind::Enumerated { style, start },
            items,
        })))
    }
}
