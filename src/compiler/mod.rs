//! Expression compilation: the visitor contract, the compiled value type and the
//! dimensional-analysis engine built on them.

pub use self::engine::{avogadro, DimensionalAnalyzer};
pub use self::error::{CompileError, UnitError};
pub use self::guard::CycleGuard;
pub use self::value::{CompiledValue, Payload, SymbolResolver, DEFAULT_LEVEL, DEFAULT_VERSION};
pub use self::visitor::{Literal, MathCompiler};

pub mod rules;

mod engine;
mod error;
mod guard;
mod value;
mod visitor;

#[cfg(test)]
mod tests;
