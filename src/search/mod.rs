//! # Search Language
//!
//! Filter expressions typed by users into the `search` list parameter:
//!
//! ```text
//! (date eq '2020-10-23') AND ((distance gt 20) OR (distance lt 10))
//! ```
//!
//! `lexer` turns text into tokens, `parser` folds tokens into a
//! [`Predicate`]. Pure functions with no I/O and no shared state.

pub mod lexer;
pub mod parser;
pub mod predicate;

use std::fmt;

use smallvec::SmallVec;

use crate::Result;
use lexer::{LexMode, Token, TokenKind};

pub use predicate::{Comparison, Literal, Predicate};

/// Parse a search string into a predicate, skipping unmatched characters.
pub fn parse(query: &str) -> Result<Predicate> {
    parse_with(query, LexMode::Permissive)
}

/// Parse a search string with an explicit lexing mode.
pub fn parse_with(query: &str, mode: LexMode) -> Result<Predicate> {
    let predicate = parser::Parser::new(query, mode)?.parse()?;
    tracing::debug!(query, %predicate, "parsed search filter");
    Ok(predicate)
}

// ============================================================================
// Syntax errors
// ============================================================================

/// A rejected search string. The parser never recovers: any of these
/// rejects the whole filter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("expected {expected} at position {position}, found {found}")]
    UnexpectedToken {
        position: usize,
        expected: Expected,
        found: Found,
    },

    #[error("unclosed '(' at position {open}: expected R_PAR, found {found}")]
    UnclosedGroup { open: usize, found: Found },

    #[error("unknown comparison operator '{0}'")]
    UnknownOperator(String),

    #[error("unknown logical operator '{0}'")]
    UnknownLogical(String),

    #[error("unexpected character {ch:?} at position {position}")]
    UnexpectedChar { position: usize, ch: char },
}

/// Token kinds a grammar rule would have accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expected(pub SmallVec<[TokenKind; 4]>);

impl Expected {
    pub fn contains(&self, kind: TokenKind) -> bool {
        self.0.contains(&kind)
    }
}

impl From<&[TokenKind]> for Expected {
    fn from(kinds: &[TokenKind]) -> Self {
        Expected(kinds.iter().copied().collect())
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" or ")?;
            }
            write!(f, "{kind}")?;
        }
        Ok(())
    }
}

/// What the parser saw instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Found {
    Token { kind: TokenKind, value: String },
    EndOfInput,
}

impl From<Option<&Token>> for Found {
    fn from(tok: Option<&Token>) -> Self {
        match tok {
            Some(tok) => Found::Token { kind: tok.kind, value: tok.value.clone() },
            None => Found::EndOfInput,
        }
    }
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Found::Token { kind, value } => write!(f, "{kind} '{value}'"),
            Found::EndOfInput => f.write_str("end of input"),
        }
    }
}
