//! Model-level analysis: the definition graph and unit consistency checking.

pub use self::checker::UnitChecker;
pub use self::dependencies::DefinitionGraph;
pub use self::error::{ValidationError, ValidationErrorType};

mod checker;
mod dependencies;
mod error;
