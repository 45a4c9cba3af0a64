//! Rules for the boolean connectives. Every operand has already been evaluated.
use super::Policy;
use crate::ast::LogicOp;
use crate::compiler::value::CompiledValue;

pub fn connective(policy: &Policy, op: LogicOp, operands: &[bool]) -> CompiledValue {
    let result = match op {
        LogicOp::And => operands.iter().all(|&b| b),
        LogicOp::Or => operands.iter().any(|&b| b),
        LogicOp::Xor => xor(operands),
        LogicOp::Not => match operands {
            [b] => !b,
            _ => return policy.undefined(),
        },
        LogicOp::Implies => match operands {
            [a, b] => !a || *b,
            _ => return policy.undefined(),
        },
    };
    policy.boolean(result)
}

/// True iff exactly one operand is true; stops at the second true one.
fn xor(operands: &[bool]) -> bool {
    let mut seen = false;
    for &b in operands {
        if b {
            if seen {
                return false;
            }
            seen = true;
        }
    }
    seen
}
