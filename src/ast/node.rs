//! The expression tree consumed by every `MathCompiler` backend.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constant {
    Pi,
    ExponentialE,
    True,
    False,
    Infinity,
    NegativeInfinity,
    Avogadro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithOp {
    Plus,
    /// One operand is negation, otherwise `a - b - c ...`.
    Minus,
    Times,
    Divide,
    Power,
    Quotient,
    Rem,
    Max,
    Min,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelOp {
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicOp {
    And,
    Or,
    Xor,
    Not,
    Implies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionOp {
    Abs,
    Ceiling,
    Floor,
    Factorial,
    Exp,
    Ln,
    /// `[x]` is base 10, `[base, x]` is base-n.
    Log,
    /// `[degree, radicand]`, or `[radicand]` for a square root.
    Root,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Sec,
    Csc,
    Cot,
    Sinh,
    Cosh,
    Tanh,
    Sech,
    Csch,
    Coth,
    Arcsin,
    Arccos,
    Arctan,
    Arcsec,
    Arccsc,
    Arccot,
    Arcsinh,
    Arccosh,
    Arctanh,
    Arcsech,
    Arccsch,
    Arccoth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    pub value: MathNode,
    pub condition: MathNode,
}

fn default_time_name() -> String {
    "t".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MathNode {
    Real {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        units: Option<String>,
    },
    Integer {
        value: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        units: Option<String>,
    },
    #[serde(rename = "e_notation")]
    ENotation {
        mantissa: f64,
        exponent: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        units: Option<String>,
    },
    Rational {
        numerator: i64,
        denominator: i64,
    },
    Constant {
        constant: Constant,
    },
    Name {
        id: String,
    },
    Time {
        #[serde(default = "default_time_name")]
        name: String,
    },
    Arithmetic {
        op: ArithOp,
        args: Vec<MathNode>,
    },
    Relational {
        op: RelOp,
        left: Box<MathNode>,
        right: Box<MathNode>,
    },
    Logical {
        op: LogicOp,
        args: Vec<MathNode>,
    },
    Function {
        op: FunctionOp,
        args: Vec<MathNode>,
    },
    /// Application of a model function definition.
    Call {
        name: String,
        args: Vec<MathNode>,
    },
    Lambda {
        params: Vec<String>,
        body: Box<MathNode>,
    },
    Piecewise {
        pieces: Vec<Piece>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        otherwise: Option<Box<MathNode>>,
    },
    Selector {
        args: Vec<MathNode>,
    },
    Vector {
        args: Vec<MathNode>,
    },
    Delay {
        value: Box<MathNode>,
        delay: Box<MathNode>,
    },
    RateOf {
        target: String,
    },
    /// A node kind this crate does not know how to evaluate.
    Unknown {
        tag: String,
    },
}

impl MathNode {
    pub fn real(value: f64, units: Option<&str>) -> Self {
        Self::Real {
            value,
            units: units.map(str::to_string),
        }
    }

    pub fn integer(value: i64, units: Option<&str>) -> Self {
        Self::Integer {
            value,
            units: units.map(str::to_string),
        }
    }

    pub fn name(id: &str) -> Self {
        Self::Name { id: id.to_string() }
    }

    pub fn arithmetic(op: ArithOp, args: Vec<MathNode>) -> Self {
        Self::Arithmetic { op, args }
    }

    pub fn function(op: FunctionOp, args: Vec<MathNode>) -> Self {
        Self::Function { op, args }
    }

    pub fn relational(op: RelOp, left: MathNode, right: MathNode) -> Self {
        Self::Relational {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn logical(op: LogicOp, args: Vec<MathNode>) -> Self {
        Self::Logical { op, args }
    }

    pub fn constant(constant: Constant) -> Self {
        Self::Constant { constant }
    }

    /// A short, stable label for the node kind.
    pub fn tag(&self) -> String {
        match self {
            Self::Real { .. } => "real".into(),
            Self::Integer { .. } => "integer".into(),
            Self::ENotation { .. } => "e_notation".into(),
            Self::Rational { .. } => "rational".into(),
            Self::Constant { constant } => format!("{:?}", constant).to_lowercase(),
            Self::Name { .. } => "name".into(),
            Self::Time { .. } => "time".into(),
            Self::Arithmetic { op, .. } => format!("{:?}", op).to_lowercase(),
            Self::Relational { op, .. } => format!("{:?}", op).to_lowercase(),
            Self::Logical { op, .. } => format!("{:?}", op).to_lowercase(),
            Self::Function { op, .. } => format!("{:?}", op).to_lowercase(),
            Self::Call { .. } => "call".into(),
            Self::Lambda { .. } => "lambda".into(),
            Self::Piecewise { .. } => "piecewise".into(),
            Self::Selector { .. } => "selector".into(),
            Self::Vector { .. } => "vector".into(),
            Self::Delay { .. } => "delay".into(),
            Self::RateOf { .. } => "rate_of".into(),
            Self::Unknown { tag } => tag.clone(),
        }
    }

    /// Direct children in evaluation order. Piecewise yields `value, condition` pairs, then `otherwise`.
    pub fn children(&self) -> Vec<&MathNode> {
        match self {
            Self::Arithmetic { args, .. }
            | Self::Logical { args, .. }
            | Self::Function { args, .. }
            | Self::Call { args, .. }
            | Self::Selector { args }
            | Self::Vector { args } => args.iter().collect(),
            Self::Relational { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Self::Lambda { body, .. } => vec![body.as_ref()],
            Self::Piecewise { pieces, otherwise } => {
                let mut out = Vec::with_capacity(pieces.len() * 2 + 1);
                for piece in pieces {
                    out.push(&piece.value);
                    out.push(&piece.condition);
                }
                if let Some(o) = otherwise {
                    out.push(o.as_ref());
                }
                out
            }
            Self::Delay { value, delay } => vec![value.as_ref(), delay.as_ref()],
            _ => Vec::new(),
        }
    }
}
