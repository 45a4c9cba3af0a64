//! Engine configuration.
use serde::Deserialize;

/// Options for a `DimensionalAnalyzer`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Permissive mode: unit inconsistencies produce the invalid sentinel instead of an error.
    pub allow_invalid_model: bool,
    /// Value bound to the simulation-time symbol.
    pub current_time: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            allow_invalid_model: false,
            current_time: 0.0,
        }
    }
}

impl EngineOptions {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn permissive() -> Self {
        Self {
            allow_invalid_model: true,
            ..Self::default()
        }
    }

    pub fn is_strict(&self) -> bool {
        !self.allow_invalid_model
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
