//! Search recursive descent parser.
//!
//! ```text
//! expr  := query (LOGICAL query)*
//! query := KEY COMPARISON value
//!        | L_PAR expr R_PAR
//! value := NUM | STRING | DATE | TIME
//! ```
//!
//! `AND` and `OR` bind equally and fold left to right:
//! `a OR b AND c` is `(a OR b) AND c`. Group with parentheses to change that.

use super::lexer::{LexMode, Lexer, Token, TokenKind};
use super::predicate::{Comparison, Literal, Predicate};
use super::{Found, SyntaxError};

const VALUE_KINDS: [TokenKind; 4] = [TokenKind::Num, TokenKind::String, TokenKind::Date, TokenKind::Time];

/// Parser state: one token of lookahead over a lazy token stream.
pub struct Parser<'a> {
    tokens: Lexer<'a>,
    current: Option<Token>,
    lookahead: Option<Token>,
    end: usize,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str, mode: LexMode) -> Result<Self, SyntaxError> {
        let mut p = Self {
            tokens: Lexer::with_mode(src, mode),
            current: None,
            lookahead: None,
            end: src.len(),
        };
        p.advance()?;
        Ok(p)
    }

    /// Parse the whole input as one expression.
    pub fn parse(mut self) -> Result<Predicate, SyntaxError> {
        let predicate = self.expr()?;
        if self.lookahead.is_some() {
            return Err(self.unexpected(&[TokenKind::Logical]));
        }
        Ok(predicate)
    }

    fn advance(&mut self) -> Result<(), SyntaxError> {
        self.current = self.lookahead.take();
        self.lookahead = self.tokens.next().transpose()?;
        Ok(())
    }

    /// Consume the lookahead if its kind is one of `kinds`, handing back
    /// the token that is now current.
    fn accept(&mut self, kinds: &[TokenKind]) -> Result<Option<&Token>, SyntaxError> {
        if !self.lookahead.as_ref().is_some_and(|t| kinds.contains(&t.kind)) {
            return Ok(None);
        }
        self.advance()?;
        Ok(self.current.as_ref())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, SyntaxError> {
        match self.accept(&[kind])? {
            Some(tok) => Ok(tok.clone()),
            None => Err(self.unexpected(&[kind])),
        }
    }

    fn position(&self) -> usize {
        self.lookahead.as_ref().map_or(self.end, |t| t.span.start)
    }

    fn found(&self) -> Found {
        Found::from(self.lookahead.as_ref())
    }

    fn unexpected(&self, expected: &[TokenKind]) -> SyntaxError {
        SyntaxError::UnexpectedToken {
            position: self.position(),
            expected: expected.into(),
            found: self.found(),
        }
    }

    // ========================================================================
    // Grammar rules
    // ========================================================================

    fn expr(&mut self) -> Result<Predicate, SyntaxError> {
        let mut acc = self.query()?;
        while let Some(tok) = self.accept(&[TokenKind::Logical])? {
            let op = tok.value.clone();
            let right = self.query()?;
            acc = match op.as_str() {
                "and" => acc.and(right),
                "or" => acc.or(right),
                _ => return Err(SyntaxError::UnknownLogical(op)),
            };
        }
        Ok(acc)
    }

    fn query(&mut self) -> Result<Predicate, SyntaxError> {
        if let Some(tok) = self.accept(&[TokenKind::Key])? {
            let field = tok.value.clone();
            let op = self.expect(TokenKind::Comparison)?.value;
            let value = self.value()?;
            return leaf(field, &op, value);
        }

        if let Some(tok) = self.accept(&[TokenKind::LParen])? {
            let open = tok.span.start;
            let inner = self.expr()?;
            if self.accept(&[TokenKind::RParen])?.is_none() {
                return Err(SyntaxError::UnclosedGroup { open, found: self.found() });
            }
            return Ok(inner);
        }

        Err(self.unexpected(&[TokenKind::Key, TokenKind::LParen]))
    }

    fn value(&mut self) -> Result<Literal, SyntaxError> {
        let Some(tok) = self.accept(&VALUE_KINDS)? else {
            return Err(self.unexpected(&VALUE_KINDS));
        };
        let literal = match tok.kind {
            TokenKind::Num => tok.value.parse().map(Literal::Number).map_err(|_| {
                SyntaxError::UnexpectedToken {
                    position: tok.span.start,
                    expected: VALUE_KINDS[..].into(),
                    found: Found::from(Some(tok)),
                }
            })?,
            TokenKind::String => Literal::Text(tok.value.clone()),
            TokenKind::Date => Literal::Date(tok.value.clone()),
            _ => Literal::Time(tok.value.clone()),
        };
        Ok(literal)
    }
}

/// Build the leaf for `field <op> value`; `ne` becomes `NOT (field = value)`.
fn leaf(field: String, op: &str, value: Literal) -> Result<Predicate, SyntaxError> {
    match op {
        "eq" => Ok(Predicate::compare(field, Comparison::Eq, value)),
        "ne" => Ok(Predicate::compare(field, Comparison::Eq, value).negate()),
        "gt" => Ok(Predicate::compare(field, Comparison::Gt, value)),
        "lt" => Ok(Predicate::compare(field, Comparison::Lt, value)),
        other => Err(SyntaxError::UnknownOperator(other.to_string())),
    }
}
