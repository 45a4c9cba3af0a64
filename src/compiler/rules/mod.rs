//! Per-operator-class unit rules.
//!
//! Rules operate on already-compiled operands; the engine decides which children
//! get compiled and when. Each rule returns `Err` only in strict mode.
use super::error::UnitError;
use super::value::{CompiledValue, Payload};
use crate::units::{Unit, UnitDefinition, UnitKind};
use tracing::warn;

pub mod arithmetic;
pub mod functions;
pub mod logical;
pub mod relational;

/// Failure policy and version stamp applied to every rule result.
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    pub strict: bool,
    pub level: u32,
    pub version: u32,
}

impl Policy {
    pub fn value(&self, payload: Payload, unit: Option<UnitDefinition>) -> CompiledValue {
        let mut v = CompiledValue::new(payload).with_stamp(self.level, self.version);
        if let Some(u) = unit {
            v.set_units(u);
        }
        v
    }

    pub fn number(&self, value: f64, unit: Option<UnitDefinition>) -> CompiledValue {
        self.value(Payload::Number(value), unit)
    }

    pub fn boolean(&self, value: bool) -> CompiledValue {
        self.value(Payload::Boolean(value), Some(UnitDefinition::dimensionless()))
    }

    pub fn undefined(&self) -> CompiledValue {
        CompiledValue::undefined().with_stamp(self.level, self.version)
    }

    pub fn invalid(&self) -> CompiledValue {
        CompiledValue::invalid().with_stamp(self.level, self.version)
    }

    /// Raises `err` in strict mode; otherwise logs it and lets the caller degrade to the invalid sentinel.
    pub fn reject(&self, err: UnitError) -> Result<(), UnitError> {
        if self.strict {
            return Err(err);
        }
        warn!(error = %err, "Unit inconsistency degraded to invalid");
        Ok(())
    }
}

fn describe(unit: Option<&UnitDefinition>) -> String {
    unit.map_or_else(|| "none".to_string(), UnitDefinition::to_string)
}

/// The gate in front of transcendental operands.
///
/// Passes dimensionless, item, radian, steradian, invalid and missing units. Returns
/// `Ok(false)` when the check failed in permissive mode.
pub fn check_dimensionless_or_invalid(
    policy: &Policy,
    unit: Option<&UnitDefinition>,
) -> Result<bool, UnitError> {
    let passes = match unit {
        None => true,
        Some(u) => {
            u.is_invalid()
                || u.is_dimensionless()
                || u.is_of_kind(UnitKind::Item)
                || u.is_of_kind(UnitKind::Radian)
                || u.is_of_kind(UnitKind::Steradian)
        }
    };
    if !passes {
        policy.reject(UnitError::DimensionlessRequired {
            given: describe(unit),
        })?;
    }
    Ok(passes)
}

/// Brings two compatible operands onto one nominal unit by rescaling their values.
///
/// Components are paired by position. Where a pair differs in scale or multiplier,
/// both are moved to the integer mean of the two scales with multiplier 1 and the
/// values are rescaled accordingly. Missing or invalid units are left alone. In
/// permissive mode an incompatible pair turns `a` into the invalid sentinel unit.
pub fn unify(policy: &Policy, a: &mut CompiledValue, b: &mut CompiledValue) -> Result<(), UnitError> {
    if a.lacks_valid_units() || b.lacks_valid_units() {
        return Ok(());
    }
    let (ua, ub) = match (a.unit(), b.unit()) {
        (Some(x), Some(y)) => (x.simplify(), y.simplify()),
        _ => return Ok(()),
    };

    if !ua.is_compatible(&ub) {
        policy.reject(UnitError::IncompatibleUnits {
            left: ua.to_string(),
            right: ub.to_string(),
        })?;
        a.set_units(UnitDefinition::invalid());
        return Ok(());
    }

    let mut ra: Vec<Unit> = ua.units().to_vec();
    let mut rb: Vec<Unit> = ub.units().to_vec();
    let (mut fa, mut fb) = (1.0, 1.0);
    for (x, y) in ra.iter_mut().zip(rb.iter_mut()) {
        if x.scale == y.scale && x.multiplier == y.multiplier {
            continue;
        }
        let mean = (x.scale + y.scale) / 2;
        fa *= (x.multiplier * 10f64.powi(x.scale - mean)).powf(x.exponent);
        fb *= (y.multiplier * 10f64.powi(y.scale - mean)).powf(y.exponent);
        x.scale = mean;
        x.multiplier = 1.0;
        y.scale = mean;
        y.multiplier = 1.0;
    }

    if fa != 1.0 {
        a.set_value(Payload::Number(a.to_number() * fa));
    }
    if fb != 1.0 {
        b.set_value(Payload::Number(b.to_number() * fb));
    }
    a.set_units(UnitDefinition::from_units(ra));
    b.set_units(UnitDefinition::from_units(rb));
    Ok(())
}
