//! A single unit component: `(multiplier * 10^scale * kind)^exponent`.
use super::kind::UnitKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exponents closer than this are considered equal.
pub(crate) const EXPONENT_TOLERANCE: f64 = 1e-9;

fn default_exponent() -> f64 {
    1.0
}

fn default_multiplier() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub kind: UnitKind,
    #[serde(default = "default_exponent")]
    pub exponent: f64,
    #[serde(default)]
    pub scale: i32,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Unit {
    pub fn new(kind: UnitKind) -> Self {
        Self {
            kind,
            exponent: 1.0,
            scale: 0,
            multiplier: 1.0,
        }
    }

    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.exponent = exponent;
        self
    }

    pub fn with_scale(mut self, scale: i32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn is_invalid(&self) -> bool {
        self.kind == UnitKind::Invalid
    }

    pub fn is_dimensionless(&self) -> bool {
        self.kind == UnitKind::Dimensionless
    }

    /// The numeric prefix of the unit, `multiplier * 10^scale`, without the exponent.
    pub fn factor(&self) -> f64 {
        self.multiplier * 10f64.powi(self.scale)
    }

    /// The full contribution of this component to a value, `factor^exponent`.
    pub(crate) fn weight(&self) -> f64 {
        self.factor().powf(self.exponent)
    }

    /// Same kind and exponent; scale and multiplier may differ.
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.kind.is_equivalent(other.kind)
            && (self.exponent - other.exponent).abs() < EXPONENT_TOLERANCE
    }

    pub fn is_equivalent(&self, other: &Unit) -> bool {
        self.is_compatible(other)
            && self.scale == other.scale
            && (self.multiplier - other.multiplier).abs() <= f64::EPSILON * self.multiplier.abs().max(1.0)
    }
}

pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

impl fmt::Display for Unit {
    /// Compact form: `metre`, `second^-1`, `(10^-3 litre)`, `(3600 second)^-1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut prefix = Vec::new();
        if self.multiplier != 1.0 {
            prefix.push(format_number(self.multiplier));
        }
        if self.scale != 0 {
            prefix.push(format!("10^{}", self.scale));
        }

        if prefix.is_empty() {
            write!(f, "{}", self.kind)?;
        } else {
            write!(f, "({} {})", prefix.join(" "), self.kind)?;
        }

        if (self.exponent - 1.0).abs() >= EXPONENT_TOLERANCE {
            write!(f, "^{}", format_number(self.exponent))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Unit::new(UnitKind::Metre), "metre")]
    #[case(Unit::new(UnitKind::Second).with_exponent(-1.0), "second^-1")]
    #[case(Unit::new(UnitKind::Litre).with_scale(-3), "(10^-3 litre)")]
    #[case(Unit::new(UnitKind::Second).with_multiplier(3600.0).with_exponent(-1.0), "(3600 second)^-1")]
    #[case(Unit::new(UnitKind::Metre).with_exponent(0.5), "metre^0.5")]
    fn test_compact_display(#[case] unit: Unit, #[case] expected: &str) {
        assert_eq!(unit.to_string(), expected);
    }

    #[test]
    fn test_factor_and_weight() {
        let ml = Unit::new(UnitKind::Litre).with_scale(-3);
        assert!((ml.factor() - 1e-3).abs() < 1e-15);

        let per_hour = Unit::new(UnitKind::Second).with_multiplier(3600.0).with_exponent(-1.0);
        assert!((per_hour.weight() - 1.0 / 3600.0).abs() < 1e-15);
    }

    #[test]
    fn test_compatibility_ignores_prefix_and_spelling() {
        let metre = Unit::new(UnitKind::Metre);
        let km = Unit::new(UnitKind::Meter).with_scale(3);
        assert!(metre.is_compatible(&km));
        assert!(!metre.is_equivalent(&km));
        assert!(!metre.is_compatible(&metre.with_exponent(2.0)));
    }

    #[test]
    fn test_deserialize_defaults() {
        let unit: Unit = serde_json::from_str(r#"{"kind": "mole"}"#).unwrap();
        assert_eq!(unit, Unit::new(UnitKind::Mole));
    }
}
