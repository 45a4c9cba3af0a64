//! Rules for the arithmetic operators.
use super::{check_dimensionless_or_invalid, unify, Policy};
use crate::compiler::error::UnitError;
use crate::compiler::value::{CompiledValue, Payload};
use crate::units::UnitDefinition;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fold {
    Sum,
    Min,
    Max,
}

impl Fold {
    fn combine(self, acc: f64, x: f64) -> f64 {
        match self {
            Fold::Sum => acc + x,
            Fold::Min => acc.min(x),
            Fold::Max => acc.max(x),
        }
    }
}

/// The shared scan behind plus, minus, min and max.
///
/// The first operand (in scan order) with a valid unit becomes the reference; every
/// later valid operand is unified against the running result. Operands without a
/// valid unit still contribute their value. If no operand has a valid unit the
/// result is invalid.
fn accumulate<'v>(
    policy: &Policy,
    operands: impl Iterator<Item = (f64, &'v CompiledValue)>,
    fold: Fold,
) -> Result<CompiledValue, UnitError> {
    let mut acc = policy.number(0.0, None);
    let mut started = false;

    for (sign, operand) in operands {
        let mut term = operand.clone();
        if !term.lacks_valid_units() {
            if acc.unit().is_none() {
                if let Some(u) = term.unit().cloned() {
                    acc.set_units(u);
                }
            } else {
                unify(policy, &mut acc, &mut term)?;
            }
        }

        let x = sign * term.to_number();
        let next = if started { fold.combine(acc.to_number(), x) } else { x };
        acc.set_value(Payload::Number(next));
        started = true;
    }

    if !started {
        return Ok(policy.undefined());
    }
    if acc.unit().is_none() {
        acc.set_units(UnitDefinition::invalid());
    }
    Ok(acc)
}

/// Scans from the last operand backwards.
pub fn plus(policy: &Policy, values: &[CompiledValue]) -> Result<CompiledValue, UnitError> {
    accumulate(policy, values.iter().rev().map(|v| (1.0, v)), Fold::Sum)
}

/// `a - b - c ...` scanning forward from the minuend; a single operand is negated.
pub fn minus(policy: &Policy, values: &[CompiledValue]) -> Result<CompiledValue, UnitError> {
    if let [only] = values {
        let mut negated = only.clone();
        negated.set_value(Payload::Number(-only.to_number()));
        return Ok(negated);
    }
    let signed = values
        .iter()
        .enumerate()
        .map(|(i, v)| (if i == 0 { 1.0 } else { -1.0 }, v));
    accumulate(policy, signed, Fold::Sum)
}

pub fn min(policy: &Policy, values: &[CompiledValue]) -> Result<CompiledValue, UnitError> {
    accumulate(policy, values.iter().rev().map(|v| (1.0, v)), Fold::Min)
}

pub fn max(policy: &Policy, values: &[CompiledValue]) -> Result<CompiledValue, UnitError> {
    accumulate(policy, values.iter().rev().map(|v| (1.0, v)), Fold::Max)
}

/// Units multiply unconditionally; operands without a unit are the identity.
pub fn times(policy: &Policy, values: &[CompiledValue]) -> CompiledValue {
    if values.is_empty() {
        return policy.undefined();
    }
    let mut unit = UnitDefinition::dimensionless();
    let mut product = 1.0;
    for v in values {
        if let Some(u) = v.unit() {
            unit = unit.multiply(u);
        }
        product *= v.to_number();
    }
    policy.number(product, Some(unit))
}

/// The first operand divided by each of the rest.
pub fn divide(policy: &Policy, values: &[CompiledValue]) -> CompiledValue {
    let Some((first, rest)) = values.split_first() else {
        return policy.undefined();
    };
    let mut unit = first.unit().cloned().unwrap_or_else(UnitDefinition::dimensionless);
    let mut quotient = first.to_number();
    for v in rest {
        if let Some(u) = v.unit() {
            unit = unit.divide(u);
        }
        quotient /= v.to_number();
    }
    policy.number(quotient, Some(unit))
}

/// `base ^ exponent`: every unit exponent of the base is multiplied by the exponent value.
pub fn power(
    policy: &Policy,
    base: &CompiledValue,
    exponent: &CompiledValue,
) -> Result<CompiledValue, UnitError> {
    let gate_passed = check_dimensionless_or_invalid(policy, exponent.unit())?;
    let e = exponent.to_number();
    let value = base.to_number().powf(e);

    let unit = if !gate_passed {
        Some(UnitDefinition::invalid())
    } else if e == 0.0 {
        Some(UnitDefinition::dimensionless())
    } else if !e.is_finite() {
        warn!(exponent = e, "Non-finite exponent, unit cannot be derived");
        Some(UnitDefinition::invalid())
    } else {
        base.unit().map(|u| u.raise_to(e))
    };
    Ok(policy.number(value, unit))
}

/// Truncated integer quotient; defined for exactly two operands.
pub fn quotient(policy: &Policy, values: &[CompiledValue]) -> CompiledValue {
    match values {
        [num, den] => {
            let unit = match (num.unit(), den.unit()) {
                (Some(n), Some(d)) => n.divide(d),
                (Some(n), None) => n.clone(),
                (None, Some(d)) => UnitDefinition::dimensionless().divide(d),
                (None, None) => UnitDefinition::dimensionless(),
            };
            policy.number((num.to_number() / den.to_number()).trunc(), Some(unit))
        }
        _ => policy.undefined(),
    }
}

/// Remainder with the sign of the dividend; keeps the dividend's unit.
pub fn rem(policy: &Policy, values: &[CompiledValue]) -> CompiledValue {
    match values {
        [num, den] => policy.number(num.to_number() % den.to_number(), num.unit().cloned()),
        _ => policy.undefined(),
    }
}
