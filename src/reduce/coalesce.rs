//! `left ?? right` through a conversion lambda:
//! `{ t = left; t == null ? right : conversion(t) }`.

use crate::error::{Error, Result};
use crate::tree::{BinaryNode, Expr};
use crate::types;

pub(super) fn lower(node: &Expr, b: &BinaryNode) -> Result<Expr> {
    let conversion = b
        .conversion
        .as_ref()
        .ok_or(Error::UnhandledBinary(b.op))?;
    let lt = b.left.ty();
    let temp = Expr::temp(lt);

    let is_null = if lt.is_nullable() {
        Expr::equal(&temp, &Expr::null(lt)?)?
    } else {
        Expr::reference_equal(&temp, &Expr::null(lt)?)?
    };

    // The lambda takes either the unwrapped value or the nullable itself.
    let accepts_unwrapped = conversion
        .ty()
        .delegate_signature()
        .is_some_and(|(params, _)| {
            params.len() == 1
                && lt.is_nullable()
                && types::parameter_is_assignable(&params[0], &lt.non_nullable())
        });
    let argument = if accepts_unwrapped {
        Expr::convert(&temp, &lt.non_nullable(), None)?
    } else {
        temp.clone()
    };
    let converted = Expr::invoke(conversion, &[argument])?;

    Expr::block_typed(
        node.ty(),
        &[temp.clone()],
        &[
            Expr::assign(&temp, &b.left)?,
            Expr::condition_typed(&is_null, &b.right, &converted, node.ty())?,
        ],
    )
}
