//! The model store: quantities, reactions, equations and unit definitions.

pub use self::error::ModelError;
pub use self::registry::Model;
pub use self::types::*;

mod error;
mod registry;
mod types;
