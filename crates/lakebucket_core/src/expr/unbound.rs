use std::fmt;

use lakebucket_error::{BucketError, Result};

use super::{PredicateOperation, evaluate};
use crate::types::scalar::ScalarValue;

#[derive(Debug, Clone, PartialEq)]
pub enum PredicateOperand {
    None,
    Literal(ScalarValue),
    Set(Vec<ScalarValue>),
}

/// A predicate on a column referenced by name.
#[derive(Debug, Clone, PartialEq)]
pub struct UnboundPredicate {
    op: PredicateOperation,
    name: String,
    operand: PredicateOperand,
}

impl UnboundPredicate {
    /// Create a new predicate, checking that the operand has the shape the
    /// operation expects.
    pub fn try_new(
        op: PredicateOperation,
        name: impl Into<String>,
        operand: PredicateOperand,
    ) -> Result<Self> {
        let valid = match &operand {
            PredicateOperand::None => op.is_unary(),
            PredicateOperand::Literal(lit) => op.is_literal() && !lit.is_null(),
            PredicateOperand::Set(lits) => op.is_set() && lits.iter().all(|v| !v.is_null()),
        };
        if !valid {
            return Err(BucketError::new(format!(
                "Invalid operand {operand:?} for operation {op}"
            )));
        }

        Ok(UnboundPredicate {
            op,
            name: name.into(),
            operand,
        })
    }

    pub fn op(&self) -> PredicateOperation {
        self.op
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operand(&self) -> &PredicateOperand {
        &self.operand
    }

    /// Evaluate against the value of the named column.
    pub fn test(&self, value: Option<&ScalarValue>) -> Result<bool> {
        evaluate(self.op, value, &self.operand)
    }
}

impl fmt::Display for UnboundPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.op)?;
        match &self.operand {
            PredicateOperand::None => Ok(()),
            PredicateOperand::Literal(lit) => {
                write!(f, " ")?;
                write_literal(f, lit)
            }
            PredicateOperand::Set(lits) => {
                write!(f, " (")?;
                for (idx, lit) in lits.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write_literal(f, lit)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, lit: &ScalarValue) -> fmt::Result {
    match lit {
        ScalarValue::Utf8(s) => write!(f, "'{s}'"),
        other => write!(f, "{other}"),
    }
}
