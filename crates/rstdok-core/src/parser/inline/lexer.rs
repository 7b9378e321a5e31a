//! Inline tokenizer
//!
//! Turns the text of a paragraph (or title, cell, term) into a flat token
//! list. Tokens keep their raw source text so a failed rule can fall back to
//! emitting exactly what was written.

use std::sync::OnceLock;

use regex::Regex;

static ROLE_RE: OnceLock<Regex> = OnceLock::new();
static URL_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn role_re() -> &'static Regex {
    ROLE_RE.get_or_init(|| {
        Regex::new(r"^:(?:([a-zA-Z0-9][\w+.-]*):)?([a-zA-Z0-9][\w+.-]*):`").unwrap()
    })
}

fn url_re() -> &'static Regex {
    URL_RE.get_or_init(|| Regex::new(r"^(?:https?|ftp)://[^\s<>`]+").unwrap())
}

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[\w.+-]+@[\w-]+(?:\.[\w-]+)+").unwrap())
}

/// Inline token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Backslash escape; the raw text includes the backslash
    Escaped,
    DoubleBacktick,
    Backtick,
    DoubleStar,
    Star,
    Pipe,
    /// `:role:` or `:domain:role:` directly followed by a backtick
    Role,
    /// `_` closing a reference
    NamedReferenceEnd,
    /// `__` closing an anonymous reference
    AnonymousReferenceEnd,
    /// Standalone URL
    Hyperlink,
    /// Standalone e-mail address
    Email,
    /// No-break space character
    Nbsp,
    Whitespace,
    Newline,
    Word,
    Other,
}

/// A token with its raw source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Text the token stands for: escapes lose their backslash, newlines
    /// are kept
    pub fn value(&self) -> &str {
        match self.kind {
            TokenKind::Escaped => &self.text[1..],
            _ => &self.text,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Newline)
    }

    pub fn is_reference_end(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::NamedReferenceEnd | TokenKind::AnonymousReferenceEnd
        )
    }
}

/// Characters that may continue a word when followed by an alphanumeric
fn is_inner_word_char(c: char) -> bool {
    matches!(c, '_' | '-' | '.' | '+')
}

fn at_word_start(previous: Option<char>) -> bool {
    match previous {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, '(' | '[' | '{' | '<' | '"' | '\''),
    }
}

/// Split inline text into tokens
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut pos = 0;
    let mut previous: Option<char> = None;

    while pos < text.len() {
        let rest = &text[pos..];
        let Some(c) = rest.chars().next() else {
            break;
        };

        let token = if c == '\\' {
            match rest[1..].chars().next() {
                Some(escaped) => Token::new(TokenKind::Escaped, &rest[..1 + escaped.len_utf8()]),
                None => Token::new(TokenKind::Other, "\\"),
            }
        } else if rest.starts_with("``") {
            Token::new(TokenKind::DoubleBacktick, "``")
        } else if c == '`' {
            Token::new(TokenKind::Backtick, "`")
        } else if rest.starts_with("**") {
            Token::new(TokenKind::DoubleStar, "**")
        } else if c == '*' {
            Token::new(TokenKind::Star, "*")
        } else if c == '|' {
            Token::new(TokenKind::Pipe, "|")
        } else if c == ':' && role_re().is_match(rest) {
            let m = role_re().find(rest).map(|m| m.end() - 1).unwrap_or(1);
            Token::new(TokenKind::Role, &rest[..m])
        } else if c == '_' && reference_end_allowed(previous, tokens.last()) {
            let len = if rest.starts_with("__") { 2 } else { 1 };
            let after = rest[len..].chars().next();
            if after.map_or(true, |a| !a.is_alphanumeric() && a != '_') {
                let kind = if len == 2 {
                    TokenKind::AnonymousReferenceEnd
                } else {
                    TokenKind::NamedReferenceEnd
                };
                Token::new(kind, &rest[..len])
            } else {
                Token::new(TokenKind::Other, "_")
            }
        } else if c == '\n' {
            Token::new(TokenKind::Newline, "\n")
        } else if c == '\u{a0}' {
            Token::new(TokenKind::Nbsp, "\u{a0}")
        } else if c == ' ' || c == '\t' {
            let len = rest
                .char_indices()
                .find(|(_, ch)| *ch != ' ' && *ch != '\t')
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            Token::new(TokenKind::Whitespace, &rest[..len])
        } else if at_word_start(previous) && url_re().is_match(rest) {
            let m = url_re().find(rest).map(|m| m.as_str()).unwrap_or(rest);
            let url = m.trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '\'', '"', '_']);
            Token::new(TokenKind::Hyperlink, url)
        } else if at_word_start(previous) && c.is_alphanumeric() && email_re().is_match(rest) {
            let m = email_re().find(rest).map(|m| m.as_str()).unwrap_or(rest);
            Token::new(TokenKind::Email, m.trim_end_matches('.'))
        } else if c.is_alphanumeric() {
            Token::new(TokenKind::Word, scan_word(rest))
        } else {
            Token::new(TokenKind::Other, &rest[..c.len_utf8()])
        };

        pos += token.text.len();
        previous = token.text.chars().last();
        tokens.push(token);
    }

    tokens
}

fn reference_end_allowed(previous: Option<char>, last: Option<&Token>) -> bool {
    match last {
        Some(token) if matches!(token.kind, TokenKind::Word | TokenKind::Backtick) => true,
        _ => previous.is_some_and(|c| c == '`'),
    }
}

fn scan_word(rest: &str) -> &str {
    let mut end = 0;
    let mut chars = rest.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c.is_alphanumeric() {
            end = i + c.len_utf8();
            continue;
        }
        let continues = is_inner_word_char(c)
            && chars.peek().is_some_and(|(_, next)| next.is_alphanumeric());
        if !continues {
            break;
        }
    }
    &rest[..end]
}

/// Token cursor with an explicit snapshot stack
///
/// Rules call [`snapshot`](Self::snapshot) before consuming tokens and
/// finish with either [`commit`](Self::commit) or
/// [`rollback`](Self::rollback).
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
    position: usize,
    snapshots: Vec<usize>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            snapshots: Vec::new(),
        }
    }

    /// Tokenize `text` into a new stream
    pub fn from_text(text: &str) -> Self {
        Self::new(tokenize(text))
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    pub fn peek_at(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    /// Token immediately before the cursor
    pub fn previous(&self) -> Option<&Token> {
        self.position.checked_sub(1).and_then(|p| self.tokens.get(p))
    }

    pub fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Remember the cursor
    pub fn snapshot(&mut self) {
        self.snapshots.push(self.position);
    }

    /// Restore the most recent snapshot and forget it
    pub fn rollback(&mut self) {
        if let Some(position) = self.snapshots.pop() {
            self.position = position;
        }
    }

    /// Forget the most recent snapshot, keeping the cursor
    pub fn commit(&mut self) {
        self.snapshots.pop();
    }

    /// Number of open snapshots
    pub fn depth(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether a start marker at the cursor may open a span: it must be at
    /// the start of the text or after whitespace/opening punctuation, and be
    /// followed by something other than whitespace
    pub fn can_open(&self) -> bool {
        let before_ok = match self.previous() {
            None => true,
            Some(token) => {
                token.is_whitespace()
                    || (token.kind == TokenKind::Other
                        && matches!(token.text.as_str(), "(" | "[" | "{" | "<" | "\"" | "'" | "-" | "/"))
            }
        };
        let after_ok = self.peek_at(1).is_some_and(|t| !t.is_whitespace());
        before_ok && after_ok
    }

    /// Consume tokens up to a closing token of `kind` that is not preceded
    /// by whitespace. Returns the raw text between the markers and leaves
    /// the cursor after the closing token; `None` leaves the cursor
    /// somewhere inside, so callers roll back.
    pub fn take_until(&mut self, kind: TokenKind) -> Option<Vec<Token>> {
        let mut content = Vec::new();
        while let Some(token) = self.next_token() {
            if token.kind == kind && content.last().is_some_and(|t: &Token| !t.is_whitespace()) {
                return Some(content);
            }
            content.push(token);
        }
        None
    }
}

/// Join raw token text
pub fn raw_text(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

/// Join token values (escapes resolved)
pub fn value_text(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.value()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_words_and_markers() {
        use TokenKind::*;
        assert_eq!(
            kinds("**bold** and *em*"),
            vec![DoubleStar, Word, DoubleStar, Whitespace, Word, Whitespace, Star, Word, Star]
        );
    }

    #[test]
    fn test_role_token() {
        let tokens = tokenize(":py:func:`main`");
        assert_eq!(tokens[0].kind, TokenKind::Role);
        assert_eq!(tokens[0].text, ":py:func:");
        assert_eq!(tokens[1].kind, TokenKind::Backtick);
    }

    #[test]
    fn test_colon_without_backtick_is_not_a_role() {
        assert!(!kinds("Note: this").contains(&TokenKind::Role));
    }

    #[test]
    fn test_reference_ends() {
        use TokenKind::*;
        assert_eq!(kinds("Python_"), vec![Word, NamedReferenceEnd]);
        assert_eq!(kinds("`a b`__"), vec![Backtick, Word, Whitespace, Word, Backtick, AnonymousReferenceEnd]);
        assert_eq!(kinds("snake_case"), vec![Word]);
    }

    #[test]
    fn test_escape_keeps_raw_text() {
        let tokens = tokenize(r"\*x");
        assert_eq!(tokens[0].kind, TokenKind::Escaped);
        assert_eq!(tokens[0].text, r"\*");
        assert_eq!(tokens[0].value(), "*");
    }

    #[test]
    fn test_url_trailing_punctuation() {
        let tokens = tokenize("see https://example.com/docs.");
        let link = tokens.iter().find(|t| t.kind == TokenKind::Hyperlink).unwrap();
        assert_eq!(link.text, "https://example.com/docs");
        assert_eq!(tokens.last().unwrap().text, ".");
    }

    #[test]
    fn test_email() {
        let tokens = tokenize("mail ada@example.org");
        assert_eq!(tokens[2].kind, TokenKind::Email);
        assert_eq!(tokens[2].text, "ada@example.org");
    }

    #[test]
    fn test_snapshot_rollback_is_idempotent() {
        let mut stream = TokenStream::from_text("a b c");
        stream.next_token();
        stream.snapshot();
        stream.next_token();
        stream.next_token();
        stream.rollback();
        assert_eq!(stream.position(), 1);
        stream.rollback();
        assert_eq!(stream.position(), 1);

        stream.snapshot();
        stream.next_token();
        stream.commit();
        assert_eq!(stream.position(), 2);
        assert_eq!(stream.depth(), 0);
    }
}
