//! Infix rendering of expression trees, used in trace headers and messages.
use crate::ast::{ArithOp, Constant, FunctionOp, LogicOp, MathNode, Piece, RelOp};
use crate::compiler::{Literal, MathCompiler};
use crate::units::format_number;
use std::convert::Infallible;

/// Renders `node` as a single-line infix formula.
pub fn to_infix(node: &MathNode) -> String {
    match FormulaWriter.visit(node) {
        Ok(s) => s,
        Err(never) => match never {},
    }
}

/// A `MathCompiler` backend that produces text instead of values.
#[derive(Debug, Default, Clone, Copy)]
pub struct FormulaWriter;

impl FormulaWriter {
    /// Renders a child, parenthesised when it is itself an infix expression.
    fn operand(&mut self, node: &MathNode) -> Result<String, Infallible> {
        let text = self.visit(node)?;
        let needs_parens = match node {
            MathNode::Arithmetic { op, args } => match op {
                ArithOp::Plus | ArithOp::Times | ArithOp::Divide | ArithOp::Power => args.len() > 1,
                ArithOp::Minus => true,
                _ => false,
            },
            MathNode::Relational { .. } => true,
            MathNode::Logical { op: LogicOp::And | LogicOp::Or, args } => args.len() > 1,
            _ => false,
        };
        Ok(if needs_parens { format!("({})", text) } else { text })
    }

    fn infix(&mut self, args: &[MathNode], sym: &str) -> Result<String, Infallible> {
        let parts = args
            .iter()
            .map(|a| self.operand(a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(sym))
    }

    fn prefix(&mut self, name: &str, args: &[MathNode]) -> Result<String, Infallible> {
        let parts = args
            .iter()
            .map(|a| self.visit(a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("{}({})", name, parts.join(", ")))
    }
}

impl MathCompiler for FormulaWriter {
    type Output = String;
    type Error = Infallible;

    fn literal(&mut self, literal: Literal, units: Option<&str>) -> Result<String, Infallible> {
        let text = match literal {
            Literal::Integer(v) => v.to_string(),
            Literal::ENotation { mantissa, exponent } => format!("{}e{}", format_number(mantissa), exponent),
            Literal::Real(v) => format_number(v),
        };
        Ok(match units {
            Some(u) => format!("{} {}", text, u),
            None => text,
        })
    }

    fn rational(&mut self, numerator: i64, denominator: i64) -> Result<String, Infallible> {
        Ok(format!("({}/{})", numerator, denominator))
    }

    fn constant(&mut self, constant: Constant) -> Result<String, Infallible> {
        Ok(match constant {
            Constant::Pi => "pi",
            Constant::ExponentialE => "exponentiale",
            Constant::True => "true",
            Constant::False => "false",
            Constant::Infinity => "INF",
            Constant::NegativeInfinity => "-INF",
            Constant::Avogadro => "avogadro",
        }
        .to_string())
    }

    fn name(&mut self, id: &str) -> Result<String, Infallible> {
        Ok(id.to_string())
    }

    fn time(&mut self, name: &str) -> Result<String, Infallible> {
        Ok(name.to_string())
    }

    fn arithmetic(&mut self, op: ArithOp, args: &[MathNode]) -> Result<String, Infallible> {
        match (op, args) {
            (ArithOp::Minus, [only]) => Ok(format!("-{}", self.operand(only)?)),
            (ArithOp::Plus, _) => self.infix(args, " + "),
            (ArithOp::Minus, _) => self.infix(args, " - "),
            (ArithOp::Times, _) => self.infix(args, " * "),
            (ArithOp::Divide, _) => self.infix(args, " / "),
            (ArithOp::Power, _) => self.infix(args, "^"),
            (ArithOp::Quotient, _) => self.prefix("quotient", args),
            (ArithOp::Rem, _) => self.prefix("rem", args),
            (ArithOp::Max, _) => self.prefix("max", args),
            (ArithOp::Min, _) => self.prefix("min", args),
        }
    }

    fn relational(&mut self, op: RelOp, left: &MathNode, right: &MathNode) -> Result<String, Infallible> {
        let sym = match op {
            RelOp::Eq => "==",
            RelOp::Neq => "!=",
            RelOp::Lt => "<",
            RelOp::Leq => "<=",
            RelOp::Gt => ">",
            RelOp::Geq => ">=",
        };
        Ok(format!("{} {} {}", self.operand(left)?, sym, self.operand(right)?))
    }

    fn logical(&mut self, op: LogicOp, args: &[MathNode]) -> Result<String, Infallible> {
        match (op, args) {
            (LogicOp::Not, [only]) => Ok(format!("!{}", self.operand(only)?)),
            (LogicOp::And, _) => self.infix(args, " && "),
            (LogicOp::Or, _) => self.infix(args, " || "),
            (LogicOp::Xor, _) => self.prefix("xor", args),
            (LogicOp::Not, _) => self.prefix("not", args),
            (LogicOp::Implies, _) => self.prefix("implies", args),
        }
    }

    fn function(&mut self, op: FunctionOp, args: &[MathNode]) -> Result<String, Infallible> {
        let name = format!("{:?}", op).to_lowercase();
        self.prefix(&name, args)
    }

    fn call(&mut self, name: &str, args: &[MathNode]) -> Result<String, Infallible> {
        self.prefix(name, args)
    }

    fn lambda(&mut self, params: &[String], body: &MathNode) -> Result<String, Infallible> {
        Ok(format!("lambda({}: {})", params.join(", "), self.visit(body)?))
    }

    fn piecewise(&mut self, pieces: &[Piece], otherwise: Option<&MathNode>) -> Result<String, Infallible> {
        let mut parts = Vec::with_capacity(pieces.len() * 2 + 1);
        for piece in pieces {
            parts.push(self.visit(&piece.value)?);
            parts.push(self.visit(&piece.condition)?);
        }
        if let Some(o) = otherwise {
            parts.push(self.visit(o)?);
        }
        Ok(format!("piecewise({})", parts.join(", ")))
    }

    fn selector(&mut self, args: &[MathNode]) -> Result<String, Infallible> {
        self.prefix("selector", args)
    }

    fn vector(&mut self, args: &[MathNode]) -> Result<String, Infallible> {
        let parts = args
            .iter()
            .map(|a| self.visit(a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("{{{}}}", parts.join(", ")))
    }

    fn delay(&mut self, value: &MathNode, delay: &MathNode) -> Result<String, Infallible> {
        Ok(format!("delay({}, {})", self.visit(value)?, self.visit(delay)?))
    }

    fn rate_of(&mut self, target: &str) -> Result<String, Infallible> {
        Ok(format!("rateOf({})", target))
    }

    fn unknown(&mut self, tag: &str) -> Result<String, Infallible> {
        Ok(format!("<{}>", tag))
    }
}
