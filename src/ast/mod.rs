//! Mathematical expression trees.

pub use self::node::{ArithOp, Constant, FunctionOp, LogicOp, MathNode, Piece, RelOp};
pub use self::walk::{called_functions, referenced_names};

mod node;
mod walk;
