//! Defines the error types for the compiler module.
use thiserror::Error;

/// A dimensional inconsistency. Only raised in strict mode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("Argument must be dimensionless, item, radian or steradian; given '{given}'.")]
    DimensionlessRequired { given: String },

    #[error("Cannot combine incompatible units '{left}' and '{right}'.")]
    IncompatibleUnits { left: String, right: String },

    #[error("Units of piecewise return values do not match; given '{first}' and '{other}'.")]
    PiecewiseMismatch { first: String, other: String },

    #[error("Units of time in a delay function do not match; model time is '{model_time}', given '{given}'.")]
    DelayTimeMismatch { model_time: String, given: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("unit error: {0}")]
    Unit(#[from] UnitError),

    #[error("unsupported node: '{tag}'")]
    UnsupportedNode { tag: String },
}
