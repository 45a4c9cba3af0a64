//! Rules for the built-in functions: the transcendental family, rounding, log and root.
use super::{check_dimensionless_or_invalid, Policy};
use crate::ast::FunctionOp;
use crate::compiler::error::UnitError;
use crate::compiler::value::CompiledValue;
use crate::units::{Unit, UnitDefinition};
use tracing::debug;

fn evaluate(op: FunctionOp, x: f64) -> f64 {
    match op {
        FunctionOp::Abs => x.abs(),
        FunctionOp::Ceiling => x.ceil(),
        FunctionOp::Floor => x.floor(),
        FunctionOp::Factorial => factorial(x),
        FunctionOp::Exp => x.exp(),
        FunctionOp::Ln => x.ln(),
        FunctionOp::Log => x.log10(),
        FunctionOp::Sqrt | FunctionOp::Root => x.sqrt(),
        FunctionOp::Sin => x.sin(),
        FunctionOp::Cos => x.cos(),
        FunctionOp::Tan => x.tan(),
        FunctionOp::Sec => 1.0 / x.cos(),
        FunctionOp::Csc => 1.0 / x.sin(),
        FunctionOp::Cot => 1.0 / x.tan(),
        FunctionOp::Sinh => x.sinh(),
        FunctionOp::Cosh => x.cosh(),
        FunctionOp::Tanh => x.tanh(),
        FunctionOp::Sech => 1.0 / x.cosh(),
        FunctionOp::Csch => 1.0 / x.sinh(),
        FunctionOp::Coth => 1.0 / x.tanh(),
        FunctionOp::Arcsin => x.asin(),
        FunctionOp::Arccos => x.acos(),
        FunctionOp::Arctan => x.atan(),
        FunctionOp::Arcsec => (1.0 / x).acos(),
        FunctionOp::Arccsc => (1.0 / x).asin(),
        FunctionOp::Arccot => (1.0 / x).atan(),
        FunctionOp::Arcsinh => x.asinh(),
        FunctionOp::Arccosh => x.acosh(),
        FunctionOp::Arctanh => x.atanh(),
        FunctionOp::Arcsech => (1.0 / x).acosh(),
        FunctionOp::Arccsch => (1.0 / x).asinh(),
        FunctionOp::Arccoth => (1.0 / x).atanh(),
    }
}

/// Largest `n` whose factorial is finite in an `f64`.
const MAX_FINITE_FACTORIAL: f64 = 170.0;

/// `n!` of the rounded operand; NaN for negative or non-finite input.
fn factorial(x: f64) -> f64 {
    let n = x.round();
    if !n.is_finite() || n < 0.0 {
        return f64::NAN;
    }
    if n > MAX_FINITE_FACTORIAL {
        return f64::INFINITY;
    }
    (1..=n as u64).fold(1.0, |acc, k| acc * k as f64)
}

/// Rounding and absolute value keep the operand's unit untouched.
pub fn rounding(policy: &Policy, op: FunctionOp, operand: &CompiledValue) -> CompiledValue {
    policy.number(evaluate(op, operand.to_number()), operand.unit().cloned())
}

/// Gated one-argument functions: the trig family, exp, ln, log10 and factorial.
///
/// The result keeps the operand's unit, except `exp` which is always dimensionless.
/// A failed gate in permissive mode yields the invalid sentinel unit.
pub fn transcendental(
    policy: &Policy,
    op: FunctionOp,
    operand: &CompiledValue,
) -> Result<CompiledValue, UnitError> {
    let passed = check_dimensionless_or_invalid(policy, operand.unit())?;
    let value = evaluate(op, operand.to_number());
    let unit = if !passed {
        Some(UnitDefinition::invalid())
    } else if op == FunctionOp::Exp {
        Some(UnitDefinition::dimensionless())
    } else {
        operand.unit().cloned()
    };
    Ok(policy.number(value, unit))
}

/// Logarithm of `x` to `base` (base 10 when absent). Both operands are gated.
pub fn log(
    policy: &Policy,
    base: Option<&CompiledValue>,
    x: &CompiledValue,
) -> Result<CompiledValue, UnitError> {
    let mut passed = check_dimensionless_or_invalid(policy, x.unit())?;
    if let Some(b) = base {
        passed &= check_dimensionless_or_invalid(policy, b.unit())?;
    }
    let value = match base {
        Some(b) => x.to_number().ln() / b.to_number().ln(),
        None => x.to_number().log10(),
    };
    let unit = if passed { x.unit().cloned() } else { Some(UnitDefinition::invalid()) };
    Ok(policy.number(value, unit))
}

/// The n-th root. Unit exponents are divided by the degree; dimensionless and invalid
/// components are left as they are.
///
/// `gate_degree` is set when the degree carries a unit or is not a plain integer or
/// rational literal.
pub fn root(
    policy: &Policy,
    degree: &CompiledValue,
    gate_degree: bool,
    radicand: &CompiledValue,
) -> Result<CompiledValue, UnitError> {
    let passed = if gate_degree {
        check_dimensionless_or_invalid(policy, degree.unit())?
    } else {
        true
    };
    if !degree.is_number() {
        return Ok(policy.undefined());
    }
    let n = degree.to_number();
    let value = radicand.to_number().powf(1.0 / n);

    if !passed {
        return Ok(policy.number(value, Some(UnitDefinition::invalid())));
    }

    let unit = radicand.unit().map(|ud| {
        ud.units()
            .iter()
            .map(|u| {
                if u.is_dimensionless() || u.is_invalid() {
                    return *u;
                }
                if (u.exponent / n) % 1.0 != 0.0 {
                    debug!(
                        exponent = u.exponent,
                        degree = n,
                        kind = %u.kind,
                        "Root leaves a non-integral unit exponent"
                    );
                }
                u.with_exponent(u.exponent / n)
            })
            .collect::<Vec<Unit>>()
    });
    Ok(policy.number(value, unit.map(UnitDefinition::from_units)))
}

pub fn sqrt(policy: &Policy, radicand: &CompiledValue) -> Result<CompiledValue, UnitError> {
    root(policy, &CompiledValue::number(2.0), false, radicand)
}
