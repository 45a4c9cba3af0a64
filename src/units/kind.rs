//! The base-unit vocabulary that unit tokens on literals and quantities resolve against.
use serde::{Deserialize, Serialize};
use std::fmt;

/// A base unit kind.
///
/// Variants are declared in alphabetical order so the derived `Ord` gives the
/// canonical component order used by `UnitDefinition::simplify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Ampere,
    Avogadro,
    Becquerel,
    Candela,
    Celsius,
    Coulomb,
    Dimensionless,
    Farad,
    Gram,
    Gray,
    Henry,
    Hertz,
    /// Poison kind. Never produced by a token, only by failed derivations.
    Invalid,
    Item,
    Joule,
    Katal,
    Kelvin,
    Kilogram,
    Liter,
    Litre,
    Lumen,
    Lux,
    Meter,
    Metre,
    Mole,
    Newton,
    Ohm,
    Pascal,
    Radian,
    Second,
    Siemens,
    Sievert,
    Steradian,
    Tesla,
    Volt,
    Watt,
    Weber,
}

const ALL_KINDS: [UnitKind; 37] = [
    UnitKind::Ampere,
    UnitKind::Avogadro,
    UnitKind::Becquerel,
    UnitKind::Candela,
    UnitKind::Celsius,
    UnitKind::Coulomb,
    UnitKind::Dimensionless,
    UnitKind::Farad,
    UnitKind::Gram,
    UnitKind::Gray,
    UnitKind::Henry,
    UnitKind::Hertz,
    UnitKind::Invalid,
    UnitKind::Item,
    UnitKind::Joule,
    UnitKind::Katal,
    UnitKind::Kelvin,
    UnitKind::Kilogram,
    UnitKind::Liter,
    UnitKind::Litre,
    UnitKind::Lumen,
    UnitKind::Lux,
    UnitKind::Meter,
    UnitKind::Metre,
    UnitKind::Mole,
    UnitKind::Newton,
    UnitKind::Ohm,
    UnitKind::Pascal,
    UnitKind::Radian,
    UnitKind::Second,
    UnitKind::Siemens,
    UnitKind::Sievert,
    UnitKind::Steradian,
    UnitKind::Tesla,
    UnitKind::Volt,
    UnitKind::Watt,
    UnitKind::Weber,
];

impl UnitKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ampere => "ampere",
            Self::Avogadro => "avogadro",
            Self::Becquerel => "becquerel",
            Self::Candela => "candela",
            Self::Celsius => "celsius",
            Self::Coulomb => "coulomb",
            Self::Dimensionless => "dimensionless",
            Self::Farad => "farad",
            Self::Gram => "gram",
            Self::Gray => "gray",
            Self::Henry => "henry",
            Self::Hertz => "hertz",
            Self::Invalid => "invalid",
            Self::Item => "item",
            Self::Joule => "joule",
            Self::Katal => "katal",
            Self::Kelvin => "kelvin",
            Self::Kilogram => "kilogram",
            Self::Liter => "liter",
            Self::Litre => "litre",
            Self::Lumen => "lumen",
            Self::Lux => "lux",
            Self::Meter => "meter",
            Self::Metre => "metre",
            Self::Mole => "mole",
            Self::Newton => "newton",
            Self::Ohm => "ohm",
            Self::Pascal => "pascal",
            Self::Radian => "radian",
            Self::Second => "second",
            Self::Siemens => "siemens",
            Self::Sievert => "sievert",
            Self::Steradian => "steradian",
            Self::Tesla => "tesla",
            Self::Volt => "volt",
            Self::Watt => "watt",
            Self::Weber => "weber",
        }
    }

    /// Maps the American spellings onto their canonical kinds.
    pub fn canonical(self) -> Self {
        match self {
            Self::Meter => Self::Metre,
            Self::Liter => Self::Litre,
            other => other,
        }
    }

    pub fn is_equivalent(self, other: Self) -> bool {
        self.canonical() == other.canonical()
    }

    /// Whether this kind may appear as a unit token in the given SBML level/version.
    pub fn is_defined_in(self, level: u32, version: u32) -> bool {
        match self {
            Self::Invalid => false,
            Self::Liter | Self::Meter => level == 1,
            Self::Celsius => level == 1 || (level == 2 && version == 1),
            Self::Avogadro => level >= 3,
            _ => true,
        }
    }

    /// Resolves a unit token against the built-in vocabulary.
    ///
    /// Matching is case-insensitive; kinds not defined for the level/version are rejected.
    pub fn from_token(token: &str, level: u32, version: u32) -> Option<Self> {
        let token = token.trim();
        ALL_KINDS
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(token))
            .filter(|k| k.is_defined_in(level, version))
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
