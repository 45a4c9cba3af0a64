//! Errors raised while loading or indexing a model.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Malformed model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Identifier '{0}' is declared more than once")]
    DuplicateId(String),

    #[error("Equation targets undeclared variable '{0}'")]
    UnknownVariable(String),
}
