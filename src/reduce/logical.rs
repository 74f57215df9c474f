//! Lifted user-defined `&&` and `||`.
//!
//! For `a && b` over `T?` with `T` supplying `&`, `op_True` and `op_False`:
//!
//! ```text
//! { l = a;
//!   l != null
//!     ? (op_False((T)l) ? l : { r = b; r != null ? (T?)op_BitwiseAnd((T)l, (T)r) : null })
//!     : null }
//! ```
//!
//! `||` is the same with `op_True` and `|`. The right operand is only
//! evaluated when the left one does not decide the result.

use crate::error::{Error, Result};
use crate::tree::{BinaryNode, Expr, NodeType};
use crate::types;

pub(super) fn lower(node: &Expr, b: &BinaryNode) -> Result<Expr> {
    let method = b.method.as_ref().ok_or(Error::UnhandledBinary(b.op))?;
    let ty = node.ty();
    let test_name = match b.op {
        NodeType::AndAlso => "op_False",
        _ => "op_True",
    };
    let test = types::get_boolean_operator(method.declaring_type(), test_name).ok_or_else(
        || Error::LogicalOperatorMustHaveBooleanOperators {
            op: b.op,
            method: method.name().to_string(),
        },
    )?;

    let left = Expr::temp(b.left.ty());
    let right = Expr::temp(b.right.ty());
    let left_value = Expr::convert(&left, &b.left.ty().non_nullable(), None)?;
    let right_value = Expr::convert(&right, &b.right.ty().non_nullable(), None)?;
    let null = Expr::null(ty)?;

    let combined = Expr::call(None, method, &[left_value.clone(), right_value])?;
    let evaluate_right = Expr::block_typed(
        ty,
        &[right.clone()],
        &[
            Expr::assign(&right, &b.right)?,
            Expr::condition_typed(
                &Expr::not_equal(&right, &null_of(&right)?)?,
                &Expr::convert(&combined, ty, None)?,
                &null,
                ty,
            )?,
        ],
    )?;
    let decided = Expr::call(None, &test, &[left_value])?;
    let has_value = Expr::condition_typed(&decided, &left, &evaluate_right, ty)?;

    Expr::block_typed(
        ty,
        &[left.clone()],
        &[
            Expr::assign(&left, &b.left)?,
            Expr::condition_typed(
                &Expr::not_equal(&left, &null_of(&left)?)?,
                &has_value,
                &null,
                ty,
            )?,
        ],
    )
}

fn null_of(e: &Expr) -> Result<Expr> {
    Expr::null(e.ty())
}
