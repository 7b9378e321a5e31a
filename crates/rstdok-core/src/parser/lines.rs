//! Line buffer helpers shared by the production rules

/// Width of a tab stop when expanding tabs
pub const TAB_WIDTH: usize = 8;

/// Number of leading spaces
pub fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ').count()
}

/// Check if a line contains only whitespace
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Expand tabs to the next multiple of [`TAB_WIDTH`]
pub fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + TAB_WIDTH);
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let spaces = TAB_WIDTH - column % TAB_WIDTH;
            out.extend(std::iter::repeat(' ').take(spaces));
            column += spaces;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}

/// Remove the common indentation of all non-blank lines
pub fn dedent(lines: &[String]) -> Vec<String> {
    let indent = lines
        .iter()
        .filter(|l| !is_blank(l))
        .map(|l| indentation(l))
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            if is_blank(l) {
                String::new()
            } else {
                l.chars().skip(indent).collect()
            }
        })
        .collect()
}

/// Drop leading and trailing blank lines
pub fn trim_blank_edges(mut lines: Vec<String>) -> Vec<String> {
    while lines.last().is_some_and(|l| is_blank(l)) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|l| is_blank(l)).count();
    lines.drain(..leading);
    lines
}

/// Cursor over the lines of one block context
#[derive(Debug, Clone, Default)]
pub struct LinesIterator {
    lines: Vec<String>,
    position: usize,
    /// Zero-based line number of `lines[0]` in the source document
    offset: usize,
}

impl LinesIterator {
    /// Create a cursor over `lines` starting at source line `offset`
    pub fn new(lines: Vec<String>, offset: usize) -> Self {
        Self {
            lines,
            position: 0,
            offset,
        }
    }

    /// Current line
    pub fn current(&self) -> Option<&str> {
        self.peek(0)
    }

    /// Line `n` lines after the cursor
    pub fn peek(&self, n: usize) -> Option<&str> {
        self.lines.get(self.position + n).map(|s| s.as_str())
    }

    /// Line before the cursor
    pub fn previous(&self) -> Option<&str> {
        self.position
            .checked_sub(1)
            .and_then(|p| self.lines.get(p))
            .map(|s| s.as_str())
    }

    /// Move past the current line, returning it
    pub fn advance(&mut self) -> Option<String> {
        let line = self.lines.get(self.position).cloned();
        if line.is_some() {
            self.position += 1;
        }
        line
    }

    /// Move the cursor forward by `n` lines
    pub fn skip(&mut self, n: usize) {
        self.position = (self.position + n).min(self.lines.len());
    }

    /// Skip blank lines, returning how many were skipped
    pub fn skip_blank_lines(&mut self) -> usize {
        let start = self.position;
        while self.current().is_some_and(is_blank) {
            self.position += 1;
        }
        self.position - start
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.lines.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Zero-based source line of the cursor
    pub fn source_line(&self) -> usize {
        self.offset + self.position
    }

    /// Lines from the cursor to the end
    pub fn remaining(&self) -> &[String] {
        &self.lines[self.position.min(self.lines.len())..]
    }

    /// Take the indented block that follows the cursor.
    ///
    /// Collects blank lines and lines indented by at least `min_indent`
    /// columns, stopping at the first non-blank line with less indentation.
    /// Trailing blank lines are left in place.
    pub fn take_indented(&mut self, min_indent: usize) -> Vec<String> {
        let mut end = self.position;
        let mut last_content = self.position;
        while let Some(line) = self.lines.get(end) {
            if is_blank(line) {
                end += 1;
                continue;
            }
            if indentation(line) < min_indent {
                break;
            }
            end += 1;
            last_content = end;
        }
        let block = self.lines[self.position..last_content].to_vec();
        self.position = last_content;
        block
    }

    /// Take lines up to (not including) the next blank line
    pub fn take_until_blank(&mut self) -> Vec<String> {
        let mut block = Vec::new();
        while let Some(line) = self.current() {
            if is_blank(line) {
                break;
            }
            block.push(line.to_string());
            self.position += 1;
        }
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    #[test]
    fn test_expand_tabs() {
        assert_eq!(expand_tabs("\tx"), "        x");
        assert_eq!(expand_tabs("ab\tx"), "ab      x");
        assert_eq!(expand_tabs("plain"), "plain");
    }

    #[test]
    fn test_dedent_keeps_relative_indentation() {
        let block = dedent(&lines("    a\n\n      b\n    c"));
        assert_eq!(block, vec!["a", "", "  b", "c"]);
    }

    #[test]
    fn test_take_indented_stops_at_outdent() {
        let mut it = LinesIterator::new(lines("   one\n\n   two\n\nthree"), 0);
        let block = it.take_indented(1);
        assert_eq!(block, vec!["   one", "", "   two"]);
        assert_eq!(it.current(), Some(""));
        it.skip_blank_lines();
        assert_eq!(it.current(), Some("three"));
        assert_eq!(it.source_line(), 4);
    }

    #[test]
    fn test_trim_blank_edges() {
        assert_eq!(trim_blank_edges(lines("\n\na\n\n")), vec!["a"]);
    }
}
