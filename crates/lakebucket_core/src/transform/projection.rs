//! Projection of predicates on a source column onto its bucket column.
//!
//! Inclusive projections match at least every partition containing a
//! matching row. Strict projections match only partitions where every row
//! matches. `None` means no useful predicate exists and nothing can be
//! pruned.
use std::collections::BTreeSet;

use lakebucket_error::{OptionExt, Result};
use tracing::trace;

use super::bucket::{BoundBucket, BucketTransform};
use crate::expr::bound::{BoundPredicate, BoundTerm};
use crate::expr::unbound::{PredicateOperand, UnboundPredicate};
use crate::expr::{PredicateOperation, predicate, predicate_literal, predicate_set};
use crate::types::scalar::ScalarValue;

/// Which direction a projection may err in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProjectionMode {
    Inclusive,
    Strict,
}

impl BucketTransform {
    /// Project a predicate so that it matches a superset of the original
    /// rows.
    ///
    /// Only equality and set membership survive bucketing.
    pub fn project(&self, name: &str, pred: &BoundPredicate) -> Result<Option<UnboundPredicate>> {
        let projected = project_with_mode(self, name, pred, ProjectionMode::Inclusive)?;
        trace!(
            transform = %self,
            %pred,
            projected = ?projected.as_ref().map(|p| p.to_string()),
            "inclusive projection"
        );
        Ok(projected)
    }

    /// Project a predicate so that it matches a subset of the original rows.
    ///
    /// Only inequality and set exclusion survive bucketing.
    pub fn project_strict(
        &self,
        name: &str,
        pred: &BoundPredicate,
    ) -> Result<Option<UnboundPredicate>> {
        let projected = project_with_mode(self, name, pred, ProjectionMode::Strict)?;
        trace!(
            transform = %self,
            %pred,
            projected = ?projected.as_ref().map(|p| p.to_string()),
            "strict projection"
        );
        Ok(projected)
    }
}

fn project_with_mode(
    transform: &BucketTransform,
    name: &str,
    pred: &BoundPredicate,
    mode: ProjectionMode,
) -> Result<Option<UnboundPredicate>> {
    // Predicates already on a transformed value never see the raw column.
    if let BoundTerm::Transform { .. } = pred.term() {
        return project_transform_predicate(transform, name, pred);
    }

    let bound = transform.bind(&pred.term().datatype())?;

    Ok(match (mode, pred) {
        (
            _,
            BoundPredicate::Unary {
                op: op @ (PredicateOperation::IsNull | PredicateOperation::NotNull),
                ..
            },
        ) => Some(predicate(*op, name)?),
        (
            ProjectionMode::Inclusive,
            BoundPredicate::Literal {
                op: PredicateOperation::Eq,
                literal,
                ..
            },
        )
        | (
            ProjectionMode::Strict,
            BoundPredicate::Literal {
                op: PredicateOperation::NotEq,
                literal,
                ..
            },
        ) => {
            let bucket = bucket_literal(&bound, literal)?;
            Some(predicate_literal(pred.op(), name, bucket)?)
        }
        (
            ProjectionMode::Inclusive,
            BoundPredicate::Set {
                op: PredicateOperation::In,
                literals,
                ..
            },
        )
        | (
            ProjectionMode::Strict,
            BoundPredicate::Set {
                op: PredicateOperation::NotIn,
                literals,
                ..
            },
        ) => Some(transform_set(&bound, pred.op(), name, literals)?),
        _ => None,
    })
}

/// Carry a predicate on a transformed value over to the partition column.
///
/// Only valid when the predicate's transform is the partition's transform,
/// in which case the partition column holds exactly the predicate's term.
/// Returns `None` otherwise.
pub fn project_transform_predicate(
    transform: &BucketTransform,
    name: &str,
    pred: &BoundPredicate,
) -> Result<Option<UnboundPredicate>> {
    let term_transform = match pred.term() {
        BoundTerm::Transform { transform, .. } => transform,
        BoundTerm::Reference(_) => return Ok(None),
    };
    if term_transform != transform {
        trace!(%transform, %term_transform, "transform mismatch, not projecting");
        return Ok(None);
    }

    let operand = match pred {
        BoundPredicate::Unary { .. } => PredicateOperand::None,
        BoundPredicate::Literal { literal, .. } => PredicateOperand::Literal(literal.clone()),
        BoundPredicate::Set { literals, .. } => PredicateOperand::Set(literals.clone()),
    };

    Ok(Some(UnboundPredicate::try_new(pred.op(), name, operand)?))
}

fn bucket_literal(bound: &BoundBucket, literal: &ScalarValue) -> Result<i32> {
    bound.apply(literal)?.required("bucket for literal")
}

/// Bucket every literal of a set predicate.
fn transform_set(
    bound: &BoundBucket,
    op: PredicateOperation,
    name: &str,
    literals: &[ScalarValue],
) -> Result<UnboundPredicate> {
    let buckets = literals
        .iter()
        .map(|lit| bucket_literal(bound, lit))
        .collect::<Result<BTreeSet<_>>>()?;
    predicate_set(op, name, buckets)
}
