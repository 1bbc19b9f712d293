use std::fmt;

use lakebucket_error::{BucketError, Result};

use super::unbound::PredicateOperand;
use super::{PredicateOperation, evaluate, normalize_literals};
use crate::transform::bucket::BucketTransform;
use crate::types::datatype::DataType;
use crate::types::scalar::ScalarValue;

/// Reference to a column resolved against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundReference {
    pub field_id: i32,
    pub name: String,
    pub datatype: DataType,
}

impl BoundReference {
    pub fn new(field_id: i32, name: impl Into<String>, datatype: DataType) -> Self {
        BoundReference {
            field_id,
            name: name.into(),
            datatype,
        }
    }
}

/// The left hand side of a bound predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundTerm {
    /// The column value itself.
    Reference(BoundReference),
    /// A transform applied to the column value.
    Transform {
        reference: BoundReference,
        transform: BucketTransform,
    },
}

impl BoundTerm {
    /// Type of the values this term produces.
    pub fn datatype(&self) -> DataType {
        match self {
            Self::Reference(r) => r.datatype.clone(),
            Self::Transform {
                reference,
                transform,
            } => transform.result_type(&reference.datatype),
        }
    }

    /// Compute the term's value from the referenced column's value.
    fn eval(&self, value: Option<&ScalarValue>) -> Result<Option<ScalarValue>> {
        let value = match value {
            Some(v) if !v.is_null() => v,
            _ => return Ok(None),
        };
        match self {
            Self::Reference(_) => Ok(Some(value.clone())),
            Self::Transform {
                reference,
                transform,
            } => {
                let bound = transform.bind(&reference.datatype)?;
                Ok(bound.apply(value)?.map(ScalarValue::Int32))
            }
        }
    }
}

impl From<BoundReference> for BoundTerm {
    fn from(reference: BoundReference) -> Self {
        BoundTerm::Reference(reference)
    }
}

impl fmt::Display for BoundTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference(r) => write!(f, "{}", r.name),
            Self::Transform {
                reference,
                transform,
            } => write!(f, "{transform}({})", reference.name),
        }
    }
}

/// A predicate on a bound term.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundPredicate {
    Unary {
        op: PredicateOperation,
        term: BoundTerm,
    },
    Literal {
        op: PredicateOperation,
        term: BoundTerm,
        literal: ScalarValue,
    },
    Set {
        op: PredicateOperation,
        term: BoundTerm,
        literals: Vec<ScalarValue>,
    },
}

impl BoundPredicate {
    pub fn try_new_unary(op: PredicateOperation, term: impl Into<BoundTerm>) -> Result<Self> {
        if !op.is_unary() {
            return Err(BucketError::new(format!("{op} is not a unary operation")));
        }
        Ok(BoundPredicate::Unary {
            op,
            term: term.into(),
        })
    }

    pub fn try_new_literal(
        op: PredicateOperation,
        term: impl Into<BoundTerm>,
        literal: impl Into<ScalarValue>,
    ) -> Result<Self> {
        if !op.is_literal() {
            return Err(BucketError::new(format!(
                "{op} does not take a single literal"
            )));
        }
        let term = term.into();
        let literal = literal.into();
        check_literal(&term, &literal)?;

        if matches!(
            op,
            PredicateOperation::StartsWith | PredicateOperation::NotStartsWith
        ) && term.datatype() != DataType::Utf8
        {
            return Err(BucketError::new(format!(
                "{op} requires a string term, got {}",
                term.datatype()
            )));
        }

        Ok(BoundPredicate::Literal { op, term, literal })
    }

    pub fn try_new_set<I, V>(
        op: PredicateOperation,
        term: impl Into<BoundTerm>,
        literals: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        if !op.is_set() {
            return Err(BucketError::new(format!("{op} does not take a set")));
        }
        let term = term.into();
        let literals = normalize_literals(literals.into_iter().map(Into::into));
        for literal in &literals {
            check_literal(&term, literal)?;
        }

        Ok(BoundPredicate::Set { op, term, literals })
    }

    pub fn op(&self) -> PredicateOperation {
        match self {
            Self::Unary { op, .. } | Self::Literal { op, .. } | Self::Set { op, .. } => *op,
        }
    }

    pub fn term(&self) -> &BoundTerm {
        match self {
            Self::Unary { term, .. } | Self::Literal { term, .. } | Self::Set { term, .. } => term,
        }
    }

    /// Evaluate against the value of the referenced column.
    ///
    /// Transform terms apply their transform to the value first.
    pub fn test(&self, value: Option<&ScalarValue>) -> Result<bool> {
        let term_value = self.term().eval(value)?;
        let operand = match self {
            Self::Unary { .. } => PredicateOperand::None,
            Self::Literal { literal, .. } => PredicateOperand::Literal(literal.clone()),
            Self::Set { literals, .. } => PredicateOperand::Set(literals.clone()),
        };
        evaluate(self.op(), term_value.as_ref(), &operand)
    }
}

fn check_literal(term: &BoundTerm, literal: &ScalarValue) -> Result<()> {
    if literal.is_null() {
        return Err(BucketError::new(format!(
            "Null literal not allowed for term {term}, use IS NULL"
        )));
    }
    let datatype = term.datatype();
    if !literal.is_compatible_with(&datatype) {
        return Err(BucketError::new(format!(
            "Literal {literal} does not match type {datatype} of term {term}"
        )));
    }
    Ok(())
}

impl fmt::Display for BoundPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unary { op, term } => write!(f, "{term} {op}"),
            Self::Literal { op, term, literal } => write!(f, "{term} {op} {literal}"),
            Self::Set { op, term, literals } => {
                write!(f, "{term} {op} (")?;
                for (idx, lit) in literals.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{lit}")?;
                }
                write!(f, ")")
            }
        }
    }
}
