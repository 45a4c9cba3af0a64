//! The dispatch contract shared by every backend that walks a `MathNode` tree.
use crate::ast::{ArithOp, Constant, FunctionOp, LogicOp, MathNode, Piece, RelOp};

/// A numeric literal as written in the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Real(f64),
    Integer(i64),
    ENotation { mantissa: f64, exponent: i32 },
}

impl Literal {
    pub fn value(&self) -> f64 {
        match *self {
            Literal::Real(v) => v,
            Literal::Integer(v) => v as f64,
            Literal::ENotation { mantissa, exponent } => mantissa * 10f64.powi(exponent),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Literal::Integer(_))
    }
}

/// A backend over expression trees.
///
/// Hooks receive the *unevaluated* children and decide themselves which ones to
/// visit and in what order. `visit` is the single exhaustive dispatch; backends
/// implement the hooks and never match on `MathNode` themselves.
pub trait MathCompiler {
    type Output;
    type Error;

    fn literal(&mut self, literal: Literal, units: Option<&str>) -> Result<Self::Output, Self::Error>;
    fn rational(&mut self, numerator: i64, denominator: i64) -> Result<Self::Output, Self::Error>;
    fn constant(&mut self, constant: Constant) -> Result<Self::Output, Self::Error>;
    fn name(&mut self, id: &str) -> Result<Self::Output, Self::Error>;
    fn time(&mut self, name: &str) -> Result<Self::Output, Self::Error>;

    fn arithmetic(&mut self, op: ArithOp, args: &[MathNode]) -> Result<Self::Output, Self::Error>;
    fn relational(&mut self, op: RelOp, left: &MathNode, right: &MathNode) -> Result<Self::Output, Self::Error>;
    fn logical(&mut self, op: LogicOp, args: &[MathNode]) -> Result<Self::Output, Self::Error>;
    fn function(&mut self, op: FunctionOp, args: &[MathNode]) -> Result<Self::Output, Self::Error>;

    fn call(&mut self, name: &str, args: &[MathNode]) -> Result<Self::Output, Self::Error>;
    fn lambda(&mut self, params: &[String], body: &MathNode) -> Result<Self::Output, Self::Error>;
    fn piecewise(&mut self, pieces: &[Piece], otherwise: Option<&MathNode>) -> Result<Self::Output, Self::Error>;
    fn selector(&mut self, args: &[MathNode]) -> Result<Self::Output, Self::Error>;
    fn vector(&mut self, args: &[MathNode]) -> Result<Self::Output, Self::Error>;
    fn delay(&mut self, value: &MathNode, delay: &MathNode) -> Result<Self::Output, Self::Error>;
    fn rate_of(&mut self, target: &str) -> Result<Self::Output, Self::Error>;

    fn unknown(&mut self, tag: &str) -> Result<Self::Output, Self::Error>;

    fn visit(&mut self, node: &MathNode) -> Result<Self::Output, Self::Error> {
        match node {
            MathNode::Real { value, units } => self.literal(Literal::Real(*value), units.as_deref()),
            MathNode::Integer { value, units } => self.literal(Literal::Integer(*value), units.as_deref()),
            MathNode::ENotation { mantissa, exponent, units } => self.literal(
                Literal::ENotation {
                    mantissa: *mantissa,
                    exponent: *exponent,
                },
                units.as_deref(),
            ),
            MathNode::Rational { numerator, denominator } => self.rational(*numerator, *denominator),
            MathNode::Constant { constant } => self.constant(*constant),
            MathNode::Name { id } => self.name(id),
            MathNode::Time { name } => self.time(name),
            MathNode::Arithmetic { op, args } => self.arithmetic(*op, args),
            MathNode::Relational { op, left, right } => self.relational(*op, left, right),
            MathNode::Logical { op, args } => self.logical(*op, args),
            MathNode::Function { op, args } => self.function(*op, args),
            MathNode::Call { name, args } => self.call(name, args),
            MathNode::Lambda { params, body } => self.lambda(params, body),
            MathNode::Piecewise { pieces, otherwise } => self.piecewise(pieces, otherwise.as_deref()),
            MathNode::Selector { args } => self.selector(args),
            MathNode::Vector { args } => self.vector(args),
            MathNode::Delay { value, delay } => self.delay(value, delay),
            MathNode::RateOf { target } => self.rate_of(target),
            MathNode::Unknown { tag } => self.unknown(tag),
        }
    }
}
