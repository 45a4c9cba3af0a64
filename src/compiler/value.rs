//! The tagged result produced by every operator evaluation.
use crate::units::{format_number, UnitDefinition};
use std::fmt;

pub const DEFAULT_LEVEL: u32 = 3;
pub const DEFAULT_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Boolean(bool),
    Number(f64),
    Text(String),
    /// A symbol whose value has not been resolved yet.
    Reference(String),
}

/// Resolves a symbolic reference back into a value, typically by re-entering the engine.
pub trait SymbolResolver {
    fn resolve_symbol(&mut self, id: &str) -> Option<CompiledValue>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledValue {
    payload: Payload,
    unit: Option<UnitDefinition>,
    level: u32,
    version: u32,
}

impl CompiledValue {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            unit: None,
            level: DEFAULT_LEVEL,
            version: DEFAULT_VERSION,
        }
    }

    pub fn number(value: f64) -> Self {
        Self::new(Payload::Number(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(Payload::Boolean(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(Payload::Text(value.into()))
    }

    pub fn reference(id: impl Into<String>) -> Self {
        Self::new(Payload::Reference(id.into()))
    }

    /// NaN without a unit: the result of operations that have no defined meaning.
    pub fn undefined() -> Self {
        Self::number(f64::NAN)
    }

    /// NaN carrying the invalid unit sentinel.
    pub fn invalid() -> Self {
        Self::number(f64::NAN).with_units(UnitDefinition::invalid())
    }

    pub fn with_units(mut self, unit: UnitDefinition) -> Self {
        self.set_units(unit);
        self
    }

    pub fn with_stamp(mut self, level: u32, version: u32) -> Self {
        self.level = level;
        self.version = version;
        self
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn set_value(&mut self, payload: Payload) {
        self.payload = payload;
    }

    pub fn unit(&self) -> Option<&UnitDefinition> {
        self.unit.as_ref()
    }

    /// Stores the simplified form of `unit`.
    pub fn set_units(&mut self, unit: UnitDefinition) {
        self.unit = Some(unit.simplify());
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn is_number(&self) -> bool {
        matches!(self.payload, Payload::Number(_))
    }

    pub fn as_reference(&self) -> Option<&str> {
        match &self.payload {
            Payload::Reference(id) => Some(id),
            _ => None,
        }
    }

    /// True for the invalid sentinel.
    pub fn has_invalid_units(&self) -> bool {
        self.unit.as_ref().map_or(false, UnitDefinition::is_invalid)
    }

    /// True when the value has no usable unit to unify against: none at all, or invalid.
    pub fn lacks_valid_units(&self) -> bool {
        self.unit.as_ref().map_or(true, UnitDefinition::is_invalid)
    }

    /// Numeric view without a resolver. Unresolved references are NaN.
    pub fn to_number(&self) -> f64 {
        match &self.payload {
            Payload::Number(n) => *n,
            Payload::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Payload::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
            Payload::Reference(_) => f64::NAN,
        }
    }

    /// Boolean view without a resolver. Unresolved references are false.
    pub fn to_boolean(&self) -> bool {
        match &self.payload {
            Payload::Boolean(b) => *b,
            Payload::Number(n) => *n == 1.0,
            Payload::Text(s) => s.trim().eq_ignore_ascii_case("true"),
            Payload::Reference(_) => false,
        }
    }

    /// Numeric view that resolves a reference once through `resolver`.
    pub fn to_number_with(&self, resolver: &mut dyn SymbolResolver) -> f64 {
        match &self.payload {
            Payload::Reference(id) => resolver
                .resolve_symbol(id)
                .map_or(f64::NAN, |resolved| resolved.to_number()),
            _ => self.to_number(),
        }
    }

    pub fn to_boolean_with(&self, resolver: &mut dyn SymbolResolver) -> bool {
        match &self.payload {
            Payload::Reference(id) => resolver
                .resolve_symbol(id)
                .map_or(false, |resolved| resolved.to_boolean()),
            _ => self.to_boolean(),
        }
    }

    /// The unit in compact notation, empty when there is none.
    pub fn unit_string(&self) -> String {
        self.unit.as_ref().map(|u| u.to_string()).unwrap_or_default()
    }
}

impl fmt::Display for CompiledValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Payload::Boolean(b) => write!(f, "{}", b)?,
            Payload::Number(n) => f.write_str(&format_number(*n))?,
            Payload::Text(s) => write!(f, "\"{}\"", s)?,
            Payload::Reference(id) => f.write_str(id)?,
        }
        if let Some(unit) = &self.unit {
            write!(f, " [{}]", unit)?;
        }
        Ok(())
    }
}
