//! Exact runtime type test.
//!
//! Value types are decided statically; the operand is still evaluated.
//! Reference operands compare `GetType()` against the type descriptor, after
//! a null check, evaluating the operand once.

use crate::error::{Error, MemberKind, Result};
use crate::tree::{Expr, ExprKind, ParameterNode, TypeBinaryNode, Value};
use crate::types::Type;

pub(super) fn lower(t: &TypeBinaryNode) -> Result<Expr> {
    let expression = &t.expression;
    let ty = expression.ty();
    let wanted = t.type_operand.non_nullable();

    if ty.is_value_type() {
        if ty.is_nullable() {
            if ty.non_nullable() != wanted {
                return Expr::block(&[expression.clone(), Expr::constant(false)]);
            }
            return Expr::not_equal(expression, &Expr::null(ty)?);
        }
        return Expr::block(&[expression.clone(), Expr::constant(*ty == wanted)]);
    }

    match expression.kind() {
        ExprKind::Constant(c) => Ok(Expr::constant(match c.value.natural_type() {
            Some(actual) if !c.value.is_null() => actual == wanted,
            _ => false,
        })),
        ExprKind::Parameter(ParameterNode {
            is_by_ref: false, ..
        }) => compare_runtime_type(expression, &t.type_operand, &wanted),
        _ => {
            let temp = Expr::temp(&Type::object());
            Expr::block_with(
                &[temp.clone()],
                &[
                    Expr::assign(&temp, expression)?,
                    compare_runtime_type(&temp, &t.type_operand, &wanted)?,
                ],
            )
        }
    }
}

/// `value != null && value.GetType() == typeof(wanted)`. `value` is safe to
/// read twice.
fn compare_runtime_type(value: &Expr, operand: &Type, wanted: &Type) -> Result<Expr> {
    let object = Type::object();
    let get_type = object
        .methods()
        .iter()
        .find(|m| m.name() == "GetType")
        .ok_or_else(|| Error::MemberNotFound {
            kind: MemberKind::Method,
            name: "GetType".to_string(),
            ty: object.clone(),
        })?;
    let mut runtime_type = Expr::call(Some(value), get_type, &[])?;
    // An interface view cannot be asked for its descriptor directly.
    if operand.is_interface() {
        let temp = Expr::temp(&Type::type_handle());
        runtime_type = Expr::block_with(
            &[temp.clone()],
            &[Expr::assign(&temp, &runtime_type)?, temp],
        )?;
    }
    Expr::and_also(
        &Expr::reference_not_equal(value, &Expr::null(value.ty())?)?,
        &Expr::reference_equal(&runtime_type, &Expr::constant(Value::Type(wanted.clone())))?,
    )
}
