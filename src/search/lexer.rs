//! Search lexer: scans filter text into tokens on demand.
//!
//! The scanner tries each token rule in a fixed order at the current
//! position and takes the first rule that matches:
//!
//! | # | Kind | Pattern |
//! |---|------|---------|
//! | 1 | `COMPARISON` | `eq`, `ne`, `gt`, `lt` (any case) |
//! | 2 | `LOGICAL` | `and`, `or` (any case) |
//! | 3 | `STRING` | `'…'` or `"…"` holding only `[-a-zA-Z_ ]` |
//! | 4 | `KEY` | `[a-zA-Z_]+` |
//! | 5 | `DATE` | `\d{4}-\d{1,2}-\d{1,2}` |
//! | 6 | `TIME` | `\d+:\d{1,2}(:\d{1,2}(\.\d+)?)?` |
//! | 7 | `NUM` | `\d+(\.\d*)?` |
//! | 8 | `L_PAR` / `R_PAR` | `(` / `)` |
//!
//! There are no word boundaries: `orange` scans as `LOGICAL(or)` followed
//! by `KEY(ange)`. In [`LexMode::Permissive`] text that matches no rule is
//! skipped, which is how `'2020-10-23'` ends up as a bare `DATE`.

use std::fmt;

use super::SyntaxError;

/// A token from the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Normalized lexeme: lower-cased, except `STRING` which keeps its case
    /// and loses its quotes.
    pub value: String,
    pub span: Span,
}

/// Byte span of a token in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Key,
    Comparison,
    Logical,
    LParen,
    RParen,
    Date,
    Num,
    Time,
    String,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Key => "KEY",
            TokenKind::Comparison => "COMPARISON",
            TokenKind::Logical => "LOGICAL",
            TokenKind::LParen => "L_PAR",
            TokenKind::RParen => "R_PAR",
            TokenKind::Date => "DATE",
            TokenKind::Num => "NUM",
            TokenKind::Time => "TIME",
            TokenKind::String => "STRING",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the lexer does with text that matches no token rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LexMode {
    /// Skip it silently.
    #[default]
    Permissive,
    /// Skip whitespace, reject everything else.
    Strict,
}

const COMPARISONS: [&str; 4] = ["eq", "ne", "gt", "lt"];
const LOGICALS: [&str; 2] = ["and", "or"];

/// Pull-based token stream over a query string.
///
/// Every call to [`Lexer::new`] starts a fresh scan, so the same text can
/// be tokenized any number of times.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    mode: LexMode,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self::with_mode(src, LexMode::Permissive)
    }

    pub fn with_mode(src: &'a str, mode: LexMode) -> Self {
        Self { src, pos: 0, mode }
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    fn byte(&self, at: usize) -> Option<u8> {
        self.bytes().get(at).copied()
    }

    /// Count ASCII digits starting at `at`, stopping after `max`.
    fn digits(&self, at: usize, max: usize) -> usize {
        self.bytes()
            .get(at..)
            .unwrap_or_default()
            .iter()
            .take(max)
            .take_while(|b| b.is_ascii_digit())
            .count()
    }

    /// Match one of `words` case-insensitively at `at`.
    fn word(&self, at: usize, words: &[&str]) -> Option<usize> {
        words.iter().find_map(|w| {
            let end = at + w.len();
            let found = self.bytes().get(at..end)?;
            found.eq_ignore_ascii_case(w.as_bytes()).then_some(end)
        })
    }

    fn string(&self, at: usize) -> Option<usize> {
        let quote = self.byte(at).filter(|b| matches!(b, b'\'' | b'"'))?;
        let mut i = at + 1;
        while self.byte(i).is_some_and(is_string_byte) {
            i += 1;
        }
        (self.byte(i)? == quote).then_some(i + 1)
    }

    fn key(&self, at: usize) -> Option<usize> {
        let len = self.bytes()[at..]
            .iter()
            .take_while(|b| b.is_ascii_alphabetic() || **b == b'_')
            .count();
        (len > 0).then_some(at + len)
    }

    fn date(&self, at: usize) -> Option<usize> {
        if self.digits(at, 4) != 4 {
            return None;
        }
        let mut i = at + 4;
        for _ in 0..2 {
            if self.byte(i)? != b'-' {
                return None;
            }
            let n = self.digits(i + 1, 2);
            if n == 0 {
                return None;
            }
            i += 1 + n;
        }
        Some(i)
    }

    fn time(&self, at: usize) -> Option<usize> {
        let hours = self.digits(at, usize::MAX);
        if hours == 0 || self.byte(at + hours)? != b':' {
            return None;
        }
        let minutes = self.digits(at + hours + 1, 2);
        if minutes == 0 {
            return None;
        }
        let mut end = at + hours + 1 + minutes;

        // Optional `:SS` and, only after seconds, `.fraction`.
        let seconds = match self.byte(end) {
            Some(b':') => self.digits(end + 1, 2),
            _ => 0,
        };
        if seconds > 0 {
            end += 1 + seconds;
            let fraction = match self.byte(end) {
                Some(b'.') => self.digits(end + 1, usize::MAX),
                _ => 0,
            };
            if fraction > 0 {
                end += 1 + fraction;
            }
        }
        Some(end)
    }

    fn num(&self, at: usize) -> Option<usize> {
        let whole = self.digits(at, usize::MAX);
        if whole == 0 {
            return None;
        }
        let end = at + whole;
        match self.byte(end) {
            Some(b'.') => Some(end + 1 + self.digits(end + 1, usize::MAX)),
            _ => Some(end),
        }
    }

    /// Try every rule at `at` in priority order.
    fn match_at(&self, at: usize) -> Option<(TokenKind, usize)> {
        if let Some(end) = self.word(at, &COMPARISONS) {
            return Some((TokenKind::Comparison, end));
        }
        if let Some(end) = self.word(at, &LOGICALS) {
            return Some((TokenKind::Logical, end));
        }
        if let Some(end) = self.string(at) {
            return Some((TokenKind::String, end));
        }
        if let Some(end) = self.key(at) {
            return Some((TokenKind::Key, end));
        }
        if let Some(end) = self.date(at) {
            return Some((TokenKind::Date, end));
        }
        if let Some(end) = self.time(at) {
            return Some((TokenKind::Time, end));
        }
        if let Some(end) = self.num(at) {
            return Some((TokenKind::Num, end));
        }
        match self.byte(at)? {
            b'(' => Some((TokenKind::LParen, at + 1)),
            b')' => Some((TokenKind::RParen, at + 1)),
            _ => None,
        }
    }

    fn token(&self, kind: TokenKind, start: usize, end: usize) -> Token {
        let value = match kind {
            TokenKind::String => self.src[start + 1..end - 1].to_string(),
            _ => self.src[start..end].to_ascii_lowercase(),
        };
        Token {
            kind,
            value,
            span: Span { start, end },
        }
    }
}

fn is_string_byte(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'_' | b'-' | b' ')
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.src.len() {
            let start = self.pos;
            if let Some((kind, end)) = self.match_at(start) {
                self.pos = end;
                return Some(Ok(self.token(kind, start, end)));
            }

            match self.mode {
                // Token rules only start on ASCII bytes, so stepping one
                // byte at a time never produces a token mid-character.
                LexMode::Permissive => self.pos += 1,
                LexMode::Strict => {
                    let ch = self.src[start..].chars().next()?;
                    if ch.is_whitespace() {
                        self.pos += ch.len_utf8();
                        continue;
                    }
                    self.pos = self.src.len();
                    return Some(Err(SyntaxError::UnexpectedChar { position: start, ch }));
                }
            }
        }
        None
    }
}

/// Tokenize a whole query string in permissive mode.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).filter_map(|tok| tok.ok()).collect()
}

/// Tokenize a whole query string, reporting unmatched characters.
pub fn tokenize_strict(input: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer::with_mode(input, LexMode::Strict).collect()
}
