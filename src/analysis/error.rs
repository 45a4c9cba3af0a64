//! Defines the error types reported by the model unit checker.
use std::fmt;

/// The specific category of a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorType {
    /// The derived unit of an equation differs from the unit declared for its target.
    UnitMismatch,
    /// The engine rejected the equation (strict mode).
    UnitError,
    /// The symbol is part of a circular chain of definitions.
    Cycle,
    /// The equation could not be analysed at all, e.g. an unsupported node.
    Structural,
}

/// A structured error report from the unit checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Identifier of the rule, assignment, reaction or cycle the error belongs to.
    pub target: String,
    pub error_type: ValidationErrorType,
    pub message: String,
}

impl ValidationError {
    pub fn new(error_type: ValidationErrorType, message: impl Into<String>) -> Self {
        Self {
            target: String::new(),
            error_type,
            message: message.into(),
        }
    }

    pub fn at_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn from_cycle(members: &[String]) -> Self {
        Self::new(
            ValidationErrorType::Cycle,
            format!("Circular definition: {}", members.join(" -> ")),
        )
        .at_target(members.first().cloned().unwrap_or_default())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.target, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_report() {
        let err = ValidationError::from_cycle(&["A".to_string(), "B".to_string()]);
        assert_eq!(err.error_type, ValidationErrorType::Cycle);
        assert_eq!(err.to_string(), "[A] Circular definition: A -> B");
    }
}
