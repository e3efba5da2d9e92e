//! Integer constant expression evaluation.
//!
//! Array lengths, enumerator values, `case` labels, `_Alignas`, and
//! `_Static_assert` all require integer constants. Evaluation folds
//! over already-built AST nodes; anything not constant reports
//! [`EvalError::NotConstant`] and the caller diagnoses at the token
//! anchoring the expression.

use crate::arena::Arena;
use crate::ast::{BinOp, Node, NodeId, NodeKind, UnOp};
use crate::diagnostics::EvalError;
use crate::scope::{Ident, IdentKind};
use crate::types::Value;

/// Evaluate an integer constant expression.
pub fn eval_integer(
    nodes: &Arena<Node>,
    idents: &Arena<Ident>,
    node: NodeId,
) -> Result<i64, EvalError> {
    match &nodes[node].kind {
        NodeKind::Constant {
            value: Value::Int(v),
            ..
        } => Ok(*v),
        // Enumerators enter the ordinary name space as constants.
        NodeKind::Ident { ident, .. } => match idents[*ident].kind {
            IdentKind::Constant(Value::Int(v)) => Ok(v),
            _ => Err(EvalError::NotConstant),
        },
        NodeKind::UnaryOp { op, operand, .. } => {
            let v = eval_integer(nodes, idents, *operand)?;
            match op {
                UnOp::Plus => Ok(v),
                UnOp::Minus => Ok(v.wrapping_neg()),
                UnOp::BitNot => Ok(!v),
                UnOp::LogicNot => Ok((v == 0) as i64),
                UnOp::Cast => Ok(v),
                _ => Err(EvalError::NotConstant),
            }
        }
        NodeKind::BinaryOp { op, lhs, rhs, .. } => {
            let l = eval_integer(nodes, idents, *lhs)?;
            let r = eval_integer(nodes, idents, *rhs)?;
            match op {
                BinOp::Mul => Ok(l.wrapping_mul(r)),
                BinOp::Div => {
                    if r == 0 {
                        Err(EvalError::DivisionByZero)
                    } else {
                        Ok(l.wrapping_div(r))
                    }
                }
                BinOp::Rem => {
                    if r == 0 {
                        Err(EvalError::DivisionByZero)
                    } else {
                        Ok(l.wrapping_rem(r))
                    }
                }
                BinOp::Add => Ok(l.wrapping_add(r)),
                BinOp::Sub => Ok(l.wrapping_sub(r)),
                BinOp::Shl => Ok(l.wrapping_shl(r as u32)),
                BinOp::Shr => Ok(l.wrapping_shr(r as u32)),
                BinOp::Lt => Ok((l < r) as i64),
                BinOp::Gt => Ok((l > r) as i64),
                BinOp::Le => Ok((l <= r) as i64),
                BinOp::Ge => Ok((l >= r) as i64),
                BinOp::Eq => Ok((l == r) as i64),
                BinOp::Ne => Ok((l != r) as i64),
                BinOp::BitAnd => Ok(l & r),
                BinOp::BitXor => Ok(l ^ r),
                BinOp::BitOr => Ok(l | r),
                BinOp::LogicAnd => Ok((l != 0 && r != 0) as i64),
                BinOp::LogicOr => Ok((l != 0 || r != 0) as i64),
                // Both operands must be constant; the value is the rhs.
                BinOp::Comma => Ok(r),
                BinOp::Assign | BinOp::Index => Err(EvalError::NotConstant),
            }
        }
        NodeKind::ConditionalOp {
            cond, then, els, ..
        } => {
            let c = eval_integer(nodes, idents, *cond)?;
            if c != 0 {
                eval_integer(nodes, idents, *then)
            } else {
                eval_integer(nodes, idents, *els)
            }
        }
        _ => Err(EvalError::NotConstant),
    }
}
