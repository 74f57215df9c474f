//! `++x`, `--x`, `x++` and `x--` over any writable location.

use crate::error::{Error, Result};
use crate::tree::{Expr, NodeType, UnaryNode};
use crate::types::Method;

use super::assign::{spill, Spilled};

/// `operand + 1` or `operand - 1`, through the operator method if any.
fn step(op: NodeType, operand: &Expr, method: Option<&Method>) -> Result<Expr> {
    let functional = match op {
        NodeType::PreIncrementAssign | NodeType::PostIncrementAssign => NodeType::Increment,
        _ => NodeType::Decrement,
    };
    Expr::make_unary(functional, Some(operand), operand.ty(), method)
}

/// The prefix forms yield the stored value; the postfix forms keep the old
/// value in a temporary and yield that.
pub(super) fn lower(u: &UnaryNode) -> Result<Expr> {
    let operand = u.operand.as_ref().ok_or(Error::UnhandledUnary(u.op))?;
    let method = u.method.as_ref();
    let Spilled {
        mut temps,
        mut body,
        location,
    } = spill(operand)?;

    let prefix = matches!(
        u.op,
        NodeType::PreIncrementAssign | NodeType::PreDecrementAssign
    );
    if prefix {
        let store = Expr::assign(&location, &step(u.op, &location, method)?)?;
        if temps.is_empty() {
            return Ok(store);
        }
        body.push(store);
    } else {
        let old = Expr::temp(location.ty());
        body.push(Expr::assign(&old, &location)?);
        body.push(Expr::assign(&location, &step(u.op, &old, method)?)?);
        body.push(old.clone());
        temps.push(old);
    }
    Expr::block_with(&temps, &body)
}
