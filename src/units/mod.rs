//! Physical unit algebra.
//!
//! A `Unit` is one `(kind, exponent, scale, multiplier)` component; a
//! `UnitDefinition` is an ordered product of them. The `invalid` kind is a poison
//! value that absorbs every combination it takes part in, and `dimensionless` is
//! the multiplicative identity.

pub use self::definition::UnitDefinition;
pub use self::kind::UnitKind;
pub use self::unit::Unit;

mod definition;
mod kind;
mod unit;

pub(crate) use self::unit::format_number;
