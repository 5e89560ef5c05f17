//! Predicate tree produced by the search parser.
//!
//! Leaves compare one record field against one literal; `And`/`Or` join two
//! sub-predicates and `Not` negates one. Trees are immutable values:
//! combining predicates always builds a new node.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use crate::model::Record;
use crate::{Error, Result};

/// A composable boolean condition over record fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `field <op> value`
    Compare {
        field: String,
        op: Comparison,
        value: Literal,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

/// Comparison operators a leaf can apply. "Not equal" is `Not(Eq)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Gt,
    Lt,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Gt => ">",
            Comparison::Lt => "<",
        }
    }

    fn holds(self, ord: Option<Ordering>) -> bool {
        match self {
            Comparison::Eq => ord == Some(Ordering::Equal),
            Comparison::Gt => ord == Some(Ordering::Greater),
            Comparison::Lt => ord == Some(Ordering::Less),
        }
    }
}

/// Typed literal on the right-hand side of a comparison.
///
/// Dates and times stay as text; the field they are compared against
/// decides how to read them.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
    Date(String),
    Time(String),
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Number(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Text(v.to_owned())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::Text(v)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n:?}"),
            Literal::Text(s) | Literal::Date(s) | Literal::Time(s) => write!(f, "{s:?}"),
        }
    }
}

// ============================================================================
// Construction
// ============================================================================

impl Predicate {
    pub fn compare(field: impl Into<String>, op: Comparison, value: impl Into<Literal>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Literal>) -> Self {
        Self::compare(field, Comparison::Eq, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Literal>) -> Self {
        Self::compare(field, Comparison::Gt, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Literal>) -> Self {
        Self::compare(field, Comparison::Lt, value)
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// AND together every predicate in `parts`, left to right.
    pub fn all(parts: impl IntoIterator<Item = Predicate>) -> Option<Self> {
        parts.into_iter().reduce(Predicate::and)
    }

    /// Field names referenced anywhere in the tree, in left-to-right order.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Compare { field, .. } => out.push(field),
            Predicate::And(a, b) | Predicate::Or(a, b) => {
                a.collect_fields(out);
                b.collect_fields(out);
            }
            Predicate::Not(p) => p.collect_fields(out),
        }
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;
    fn bitand(self, rhs: Predicate) -> Predicate {
        self.and(rhs)
    }
}

impl BitOr for Predicate {
    type Output = Predicate;
    fn bitor(self, rhs: Predicate) -> Predicate {
        self.or(rhs)
    }
}

impl Not for Predicate {
    type Output = Predicate;
    fn not(self) -> Predicate {
        self.negate()
    }
}

// ============================================================================
// Evaluation
// ============================================================================

impl Predicate {
    /// Reject predicates naming fields that `R` does not have.
    pub fn validate_for<R: Record>(&self) -> Result<()> {
        match self.fields().into_iter().find(|f| !R::FIELDS.contains(f)) {
            Some(field) => Err(Error::UnknownField {
                field: field.to_string(),
                record: R::NAME,
            }),
            None => Ok(()),
        }
    }

    /// Evaluate against one record.
    ///
    /// A literal that cannot be read as the field's type is an error, not a
    /// non-match.
    pub fn evaluate<R: Record>(&self, record: &R) -> Result<bool> {
        match self {
            Predicate::Compare { field, op, value } => {
                let actual = record.field(field).ok_or_else(|| Error::UnknownField {
                    field: field.clone(),
                    record: R::NAME,
                })?;
                Ok(op.holds(actual.compare(field, value)?))
            }
            Predicate::And(a, b) => Ok(a.evaluate(record)? && b.evaluate(record)?),
            Predicate::Or(a, b) => Ok(a.evaluate(record)? || b.evaluate(record)?),
            Predicate::Not(p) => Ok(!p.evaluate(record)?),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { field, op, value } => write!(f, "{field} {} {value}", op.symbol()),
            Predicate::And(a, b) => write!(f, "({a} AND {b})"),
            Predicate::Or(a, b) => write!(f, "({a} OR {b})"),
            Predicate::Not(p) => match p.as_ref() {
                Predicate::Compare { .. } => write!(f, "NOT ({p})"),
                _ => write!(f, "NOT {p}"),
            },
        }
    }
}
