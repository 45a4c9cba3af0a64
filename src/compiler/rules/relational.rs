//! Rules for comparisons.
use super::{unify, Policy};
use crate::ast::RelOp;
use crate::compiler::error::UnitError;
use crate::compiler::value::CompiledValue;

/// Unifies both sides, then compares the rescaled values. Always a dimensionless boolean.
pub fn compare(
    policy: &Policy,
    op: RelOp,
    mut left: CompiledValue,
    mut right: CompiledValue,
) -> Result<CompiledValue, UnitError> {
    unify(policy, &mut left, &mut right)?;
    let (l, r) = (left.to_number(), right.to_number());
    let result = match op {
        RelOp::Eq => l == r,
        RelOp::Neq => l != r,
        RelOp::Lt => l < r,
        RelOp::Leq => l <= r,
        RelOp::Gt => l > r,
        RelOp::Geq => l >= r,
    };
    Ok(policy.boolean(result))
}
