//! Composite units and their algebra.
//!
//! `UnitDefinition` is a plain value: every operation returns a new definition
//! and nothing is shared with the model it may have been read from.
use super::kind::UnitKind;
use super::unit::{Unit, EXPONENT_TOLERANCE};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitDefinition {
    units: SmallVec<[Unit; 4]>,
}

/// Splits a positive factor into `(scale, multiplier)` with the multiplier as close to 1 as possible.
fn split_factor(factor: f64) -> (i32, f64) {
    if !factor.is_finite() || factor <= 0.0 {
        return (0, factor);
    }
    let scale = factor.log10().round() as i32;
    let mut multiplier = factor / 10f64.powi(scale);
    if (multiplier - 1.0).abs() < 1e-12 {
        multiplier = 1.0;
    }
    (scale, multiplier)
}

fn is_one(value: f64) -> bool {
    (value - 1.0).abs() < 1e-12
}

impl UnitDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_units(units: impl IntoIterator<Item = Unit>) -> Self {
        Self {
            units: units.into_iter().collect(),
        }
    }

    pub fn of_kind(kind: UnitKind) -> Self {
        Self::from_units([Unit::new(kind)])
    }

    pub fn dimensionless() -> Self {
        Self::of_kind(UnitKind::Dimensionless)
    }

    /// The poison sentinel.
    pub fn invalid() -> Self {
        Self::of_kind(UnitKind::Invalid)
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn push(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn is_invalid(&self) -> bool {
        self.units.iter().any(Unit::is_invalid)
    }

    /// True when nothing but dimensionless components remain after simplification.
    pub fn is_dimensionless(&self) -> bool {
        let simplified = self.simplify();
        simplified.units.iter().all(Unit::is_dimensionless)
    }

    /// True when the simplified definition is a single component of `kind` with exponent 1.
    pub fn is_of_kind(&self, kind: UnitKind) -> bool {
        let simplified = self.simplify();
        match simplified.units.as_slice() {
            [unit] => {
                unit.kind.is_equivalent(kind) && (unit.exponent - 1.0).abs() < EXPONENT_TOLERANCE
            }
            _ => false,
        }
    }

    pub fn multiply(&self, other: &UnitDefinition) -> Self {
        let mut units = self.units.clone();
        units.extend(other.units.iter().copied());
        Self { units }.simplify()
    }

    pub fn divide(&self, other: &UnitDefinition) -> Self {
        self.multiply(&other.raise_to(-1.0))
    }

    /// Scales every exponent. Dimensionless and invalid components are left untouched.
    pub fn raise_to(&self, exponent: f64) -> Self {
        let units = self
            .units
            .iter()
            .map(|u| {
                if u.is_dimensionless() || u.is_invalid() {
                    *u
                } else {
                    u.with_exponent(u.exponent * exponent)
                }
            })
            .collect();
        Self { units }.simplify()
    }

    /// Brings the definition into canonical form.
    ///
    /// Kind aliases are canonicalized, same-kind components merged (their prefixes
    /// folded into one factor), zero exponents dropped and components sorted by kind.
    /// Dimensionless factors move onto the first remaining component. Any invalid
    /// component collapses the whole definition to `[invalid]`.
    pub fn simplify(&self) -> Self {
        if self.is_invalid() {
            return Self::invalid();
        }

        let mut groups: BTreeMap<UnitKind, Vec<Unit>> = BTreeMap::new();
        let mut residual = 1.0;
        for unit in &self.units {
            if unit.is_dimensionless() {
                residual *= unit.weight();
                continue;
            }
            groups.entry(unit.kind.canonical()).or_default().push(*unit);
        }

        let mut merged: SmallVec<[Unit; 4]> = SmallVec::new();
        for (kind, members) in groups {
            let exponent: f64 = members.iter().map(|u| u.exponent).sum();
            let weight: f64 = members.iter().map(Unit::weight).product();
            if exponent.abs() < EXPONENT_TOLERANCE {
                residual *= weight;
                continue;
            }

            let first = members[0];
            let uniform = members
                .iter()
                .all(|u| u.scale == first.scale && u.multiplier == first.multiplier);
            let unit = if uniform {
                Unit::new(kind)
                    .with_exponent(exponent)
                    .with_scale(first.scale)
                    .with_multiplier(first.multiplier)
            } else {
                let (scale, multiplier) = split_factor(weight.powf(1.0 / exponent));
                Unit::new(kind)
                    .with_exponent(exponent)
                    .with_scale(scale)
                    .with_multiplier(multiplier)
            };
            merged.push(unit);
        }

        match merged.first_mut() {
            None => {
                let (scale, multiplier) = if is_one(residual) {
                    (0, 1.0)
                } else {
                    split_factor(residual)
                };
                merged.push(
                    Unit::new(UnitKind::Dimensionless)
                        .with_scale(scale)
                        .with_multiplier(multiplier),
                );
            }
            Some(first) if !is_one(residual) => {
                let factor = first.factor() * residual.powf(1.0 / first.exponent);
                let (scale, multiplier) = split_factor(factor);
                first.scale = scale;
                first.multiplier = multiplier;
            }
            Some(_) => {}
        }

        Self { units: merged }
    }

    /// Same kinds with the same exponents after simplification.
    /// An invalid definition is compatible with everything.
    pub fn is_compatible(&self, other: &UnitDefinition) -> bool {
        if self.is_invalid() || other.is_invalid() {
            return true;
        }
        let a = self.simplify();
        let b = other.simplify();
        a.units.len() == b.units.len()
            && a.units.iter().zip(b.units.iter()).all(|(x, y)| x.is_compatible(y))
    }

    /// Compatible with identical scale and multiplier on every component.
    pub fn is_equivalent(&self, other: &UnitDefinition) -> bool {
        match (self.is_invalid(), other.is_invalid()) {
            (true, true) => return true,
            (true, false) | (false, true) => return false,
            _ => {}
        }
        let a = self.simplify();
        let b = other.simplify();
        a.units.len() == b.units.len()
            && a.units.iter().zip(b.units.iter()).all(|(x, y)| x.is_equivalent(y))
    }
}

impl FromIterator<Unit> for UnitDefinition {
    fn from_iter<I: IntoIterator<Item = Unit>>(iter: I) -> Self {
        Self::from_units(iter)
    }
}

impl fmt::Display for UnitDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.units.is_empty() {
            return f.write_str("dimensionless");
        }
        let parts: Vec<String> = self.units.iter().map(Unit::to_string).collect();
        f.write_str(&parts.join("*"))
    }
}
