//! Reference evaluator for the expression tree.
//!
//! Computes what the emitted program returns, using the same 64-bit signed
//! arithmetic as the generated code. Traps that would fault at run time
//! (division by zero, `i64::MIN / -1`) and overflow yield `None`.

use crate::parser::{AstNode, BinaryOp};

pub fn evaluate(node: &AstNode) -> Option<i64> {
  match node {
    AstNode::Num { value } => Some(*value),
    AstNode::Binary { op, lhs, rhs, .. } => {
      let lhs = evaluate(lhs)?;
      let rhs = evaluate(rhs)?;
      apply(*op, lhs, rhs)
    }
  }
}

fn apply(op: BinaryOp, lhs: i64, rhs: i64) -> Option<i64> {
  match op {
    BinaryOp::Add => lhs.checked_add(rhs),
    BinaryOp::Sub => lhs.checked_sub(rhs),
    BinaryOp::Mul => lhs.checked_mul(rhs),
    BinaryOp::Div => lhs.checked_div(rhs),
    BinaryOp::Eq => Some(i64::from(lhs == rhs)),
    BinaryOp::Ne => Some(i64::from(lhs != rhs)),
    BinaryOp::Lt => Some(i64::from(lhs < rhs)),
    BinaryOp::Le => Some(i64::from(lhs <= rhs)),
  }
}
