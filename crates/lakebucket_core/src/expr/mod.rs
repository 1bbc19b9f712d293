//! Predicates over columns.
//!
//! Bound predicates reference a resolved column (and its type). Unbound
//! predicates reference a column by name only, and are what projections
//! produce.
pub mod bound;
pub mod unbound;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use lakebucket_error::{BucketError, Result};
use serde::{Deserialize, Serialize};

use crate::types::scalar::ScalarValue;
use unbound::{PredicateOperand, UnboundPredicate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateOperation {
    IsNull,
    NotNull,
    IsNan,
    NotNan,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    StartsWith,
    NotStartsWith,
    In,
    NotIn,
}

impl PredicateOperation {
    /// Operations without operands.
    pub const fn is_unary(&self) -> bool {
        matches!(
            self,
            Self::IsNull | Self::NotNull | Self::IsNan | Self::NotNan
        )
    }

    /// Operations with a single literal operand.
    pub const fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::Lt
                | Self::LtEq
                | Self::Gt
                | Self::GtEq
                | Self::Eq
                | Self::NotEq
                | Self::StartsWith
                | Self::NotStartsWith
        )
    }

    /// Operations with a set of literal operands.
    pub const fn is_set(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    /// Get the operation that matches exactly the rows this one doesn't.
    pub const fn negate(&self) -> Self {
        match self {
            Self::IsNull => Self::NotNull,
            Self::NotNull => Self::IsNull,
            Self::IsNan => Self::NotNan,
            Self::NotNan => Self::IsNan,
            Self::Lt => Self::GtEq,
            Self::LtEq => Self::Gt,
            Self::Gt => Self::LtEq,
            Self::GtEq => Self::Lt,
            Self::Eq => Self::NotEq,
            Self::NotEq => Self::Eq,
            Self::StartsWith => Self::NotStartsWith,
            Self::NotStartsWith => Self::StartsWith,
            Self::In => Self::NotIn,
            Self::NotIn => Self::In,
        }
    }
}

impl fmt::Display for PredicateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IsNull => write!(f, "IS NULL"),
            Self::NotNull => write!(f, "IS NOT NULL"),
            Self::IsNan => write!(f, "IS NAN"),
            Self::NotNan => write!(f, "IS NOT NAN"),
            Self::Lt => write!(f, "<"),
            Self::LtEq => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::GtEq => write!(f, ">="),
            Self::Eq => write!(f, "="),
            Self::NotEq => write!(f, "!="),
            Self::StartsWith => write!(f, "STARTS WITH"),
            Self::NotStartsWith => write!(f, "NOT STARTS WITH"),
            Self::In => write!(f, "IN"),
            Self::NotIn => write!(f, "NOT IN"),
        }
    }
}

/// Parses operations from either their symbol or their name, `=` or `eq`.
impl FromStr for PredicateOperation {
    type Err = BucketError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Ok(match lower.as_str() {
            "is_null" => Self::IsNull,
            "not_null" | "is_not_null" => Self::NotNull,
            "is_nan" => Self::IsNan,
            "not_nan" | "is_not_nan" => Self::NotNan,
            "<" | "lt" => Self::Lt,
            "<=" | "lt_eq" => Self::LtEq,
            ">" | "gt" => Self::Gt,
            ">=" | "gt_eq" => Self::GtEq,
            "=" | "==" | "eq" => Self::Eq,
            "!=" | "<>" | "not_eq" => Self::NotEq,
            "starts_with" => Self::StartsWith,
            "not_starts_with" => Self::NotStartsWith,
            "in" => Self::In,
            "not_in" => Self::NotIn,
            _ => return Err(BucketError::new(format!("Unknown predicate operation: '{s}'"))),
        })
    }
}

/// Create a predicate without operands on a named column.
pub fn predicate(op: PredicateOperation, name: impl Into<String>) -> Result<UnboundPredicate> {
    UnboundPredicate::try_new(op, name, PredicateOperand::None)
}

/// Create a predicate comparing a named column with a literal.
pub fn predicate_literal(
    op: PredicateOperation,
    name: impl Into<String>,
    literal: impl Into<ScalarValue>,
) -> Result<UnboundPredicate> {
    UnboundPredicate::try_new(op, name, PredicateOperand::Literal(literal.into()))
}

/// Create a predicate testing a named column for set membership.
pub fn predicate_set<I, V>(
    op: PredicateOperation,
    name: impl Into<String>,
    literals: I,
) -> Result<UnboundPredicate>
where
    I: IntoIterator<Item = V>,
    V: Into<ScalarValue>,
{
    let literals = normalize_literals(literals.into_iter().map(Into::into));
    UnboundPredicate::try_new(op, name, PredicateOperand::Set(literals))
}

/// Remove duplicate literals and sort the rest.
///
/// Sets mixing kinds of values keep their original order.
pub(crate) fn normalize_literals(
    literals: impl IntoIterator<Item = ScalarValue>,
) -> Vec<ScalarValue> {
    let mut out: Vec<ScalarValue> = Vec::new();
    for literal in literals {
        if !out.iter().any(|seen| same_literal(seen, &literal)) {
            out.push(literal);
        }
    }

    let first_id = out.first().and_then(|v| v.datatype_id());
    if out.iter().all(|v| v.datatype_id() == first_id) {
        out.sort_by(literal_order);
    }
    out
}

/// Records are duplicates when they compare equal, which unlike `==` keeps
/// records differing only in the sign of a zero apart.
fn same_literal(a: &ScalarValue, b: &ScalarValue) -> bool {
    match (a, b) {
        (ScalarValue::Struct(_), ScalarValue::Struct(_)) => {
            matches!(a.try_compare(b), Ok(Some(Ordering::Equal)))
        }
        _ => a == b,
    }
}

/// Total order over literals of the same kind.
fn literal_order(a: &ScalarValue, b: &ScalarValue) -> Ordering {
    match (a, b) {
        (ScalarValue::Float32(a), ScalarValue::Float32(b)) => a.total_cmp(b),
        (ScalarValue::Float64(a), ScalarValue::Float64(b)) => a.total_cmp(b),
        (a, b) => a
            .try_compare(b)
            .ok()
            .flatten()
            .unwrap_or(Ordering::Equal),
    }
}

/// Evaluate an operation against a (possibly absent) value.
///
/// Comparisons against null or NaN values are false, so their negations
/// (`!=`, `NOT IN`, `NOT STARTS WITH`) are true.
pub(crate) fn evaluate(
    op: PredicateOperation,
    value: Option<&ScalarValue>,
    operand: &PredicateOperand,
) -> Result<bool> {
    let value = value.filter(|v| !v.is_null());

    let compare = |literal: &ScalarValue| -> Result<Option<Ordering>> {
        match value {
            Some(value) => value.try_compare(literal),
            None => Ok(None),
        }
    };

    Ok(match (op, operand) {
        (PredicateOperation::IsNull, _) => value.is_none(),
        (PredicateOperation::NotNull, _) => value.is_some(),
        (PredicateOperation::IsNan, _) => value.is_some_and(|v| v.is_nan()),
        (PredicateOperation::NotNan, _) => !value.is_some_and(|v| v.is_nan()),
        (PredicateOperation::Lt, PredicateOperand::Literal(lit)) => {
            compare(lit)? == Some(Ordering::Less)
        }
        (PredicateOperation::LtEq, PredicateOperand::Literal(lit)) => {
            matches!(compare(lit)?, Some(Ordering::Less | Ordering::Equal))
        }
        (PredicateOperation::Gt, PredicateOperand::Literal(lit)) => {
            compare(lit)? == Some(Ordering::Greater)
        }
        (PredicateOperation::GtEq, PredicateOperand::Literal(lit)) => {
            matches!(compare(lit)?, Some(Ordering::Greater | Ordering::Equal))
        }
        (PredicateOperation::Eq, PredicateOperand::Literal(lit)) => {
            compare(lit)? == Some(Ordering::Equal)
        }
        (PredicateOperation::NotEq, PredicateOperand::Literal(lit)) => {
            compare(lit)? != Some(Ordering::Equal)
        }
        (PredicateOperation::StartsWith, PredicateOperand::Literal(lit)) => {
            starts_with(value, lit)?
        }
        (PredicateOperation::NotStartsWith, PredicateOperand::Literal(lit)) => {
            !starts_with(value, lit)?
        }
        (PredicateOperation::In, PredicateOperand::Set(lits)) => {
            let mut found = false;
            for lit in lits {
                if compare(lit)? == Some(Ordering::Equal) {
                    found = true;
                    break;
                }
            }
            found
        }
        (PredicateOperation::NotIn, PredicateOperand::Set(_)) => {
            !evaluate(PredicateOperation::In, value, operand)?
        }
        (op, operand) => {
            return Err(BucketError::new(format!(
                "Invalid operand {operand:?} for operation {op}"
            )));
        }
    })
}

fn starts_with(value: Option<&ScalarValue>, prefix: &ScalarValue) -> Result<bool> {
    match (value, prefix) {
        (None, _) => Ok(false),
        (Some(ScalarValue::Utf8(v)), ScalarValue::Utf8(prefix)) => Ok(v.starts_with(prefix.as_str())),
        (Some(v), prefix) => Err(BucketError::new(format!(
            "STARTS WITH requires strings, got {v} and {prefix}"
        ))),
    }
}
