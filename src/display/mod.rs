//! Human-readable renderings of expressions and their derived units.

pub use self::formula::{to_infix, FormulaWriter};
pub use self::trace::format_unit_trace;

mod formula;
mod trace;
