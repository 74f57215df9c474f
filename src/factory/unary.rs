//! Unary operators, conversions, increment/decrement-assign, throw and the
//! type tests.

use crate::error::{Error, Result};
use crate::tree::{Expr, ExprKind, NodeType, TypeBinaryNode, UnaryNode};
use crate::types::{self, Method, Type};

use super::binary::validate_operator;
use super::{require_readable, require_writable, validate_type};

fn unary(op: NodeType, operand: Option<&Expr>, ty: Type, method: Option<Method>) -> Expr {
    Expr::new(
        ty,
        ExprKind::Unary(UnaryNode {
            op,
            operand: operand.cloned(),
            method,
        }),
    )
}

/// Builtin result type of a unary operator over `ty`, if any.
fn builtin_type(op: NodeType, ty: &Type) -> Option<Type> {
    use NodeType::*;
    let ok = match op {
        Negate | NegateChecked => types::is_arithmetic(ty) && !types::is_unsigned_int(ty),
        UnaryPlus | Increment | Decrement => types::is_arithmetic(ty),
        Not => types::is_integer_or_bool(ty),
        OnesComplement => types::is_integer(ty),
        IsTrue | IsFalse => types::is_bool(ty),
        _ => false,
    };
    ok.then(|| ty.clone())
}

/// User-defined operator `name` on the operand's unwrapped type, lifted
/// over a nullable operand when it takes the unwrapped type.
fn user_defined_unary(name: &str, operand: &Type) -> Option<(Method, Type)> {
    if let Some(m) = types::get_user_defined_unary_method(name, operand) {
        let ty = m.return_type().clone();
        return Some((m, ty));
    }
    if operand.is_nullable() {
        let nn = operand.non_nullable();
        if let Some(m) = types::find_static_method(&nn, name, std::slice::from_ref(&nn)) {
            let ret = m.return_type();
            if ret.is_value_type() && !ret.is_nullable() {
                let ty = ret.nullable();
                return Some((m, ty));
            }
        }
    }
    None
}

fn user_defined_unary_or_throw(op: NodeType, names: &[&str], operand: &Type) -> Result<(Method, Type)> {
    let found = names
        .iter()
        .find_map(|name| user_defined_unary(name, operand));
    let Some((m, ty)) = found else {
        return Err(Error::UnaryOperatorNotDefined {
            op,
            operand: operand.clone(),
        });
    };
    if m.params()[0].is_nullable() && !operand.is_nullable() {
        return Err(Error::OperandTypesDoNotMatchParameters {
            op,
            method: m.name().to_string(),
        });
    }
    Ok((m, ty))
}

fn method_based_unary(op: NodeType, operand: &Type, method: &Method) -> Result<(Method, Type)> {
    validate_operator(method)?;
    let params = method.params();
    if params.len() != 1 {
        return Err(Error::IncorrectNumberOfMethodCallArguments(
            method.name().to_string(),
        ));
    }
    let mismatch = || Error::OperandTypesDoNotMatchParameters {
        op,
        method: method.name().to_string(),
    };
    if types::parameter_is_assignable(&params[0], operand) {
        if params[0].is_nullable() && !operand.is_nullable() {
            return Err(mismatch());
        }
        return Ok((method.clone(), method.return_type().clone()));
    }
    let ret = method.return_type();
    if operand.is_nullable()
        && types::parameter_is_assignable(&params[0], &operand.non_nullable())
        && ret.is_value_type()
        && !ret.is_nullable()
    {
        return Ok((method.clone(), ret.nullable()));
    }
    Err(mismatch())
}

fn method_based_coercion(op: NodeType, operand: &Type, to: &Type, method: &Method) -> Result<Method> {
    validate_operator(method)?;
    let params = method.params();
    if params.len() != 1 {
        return Err(Error::IncorrectNumberOfMethodCallArguments(
            method.name().to_string(),
        ));
    }
    let ret = method.return_type();
    if types::parameter_is_assignable(&params[0], operand) && types::are_equivalent(ret, to) {
        return Ok(method.clone());
    }
    if (operand.is_nullable() || to.is_nullable())
        && types::parameter_is_assignable(&params[0], &operand.non_nullable())
        && (types::are_equivalent(ret, &to.non_nullable()) || types::are_equivalent(ret, to))
    {
        return Ok(method.clone());
    }
    Err(Error::OperandTypesDoNotMatchParameters {
        op,
        method: method.name().to_string(),
    })
}

fn unary_names(op: NodeType) -> Vec<&'static str> {
    match op {
        NodeType::Not => vec!["op_LogicalNot", "op_OnesComplement"],
        _ => op.operator_method_name().into_iter().collect(),
    }
}

impl Expr {
    /// Negate, plus, not, ones-complement, is-true/is-false and plain
    /// increment/decrement (which do not assign).
    pub fn unary_operator(op: NodeType, operand: &Expr, method: Option<&Method>) -> Result<Expr> {
        use NodeType::*;
        if !matches!(
            op,
            Negate | NegateChecked | UnaryPlus | Not | OnesComplement | IsTrue | IsFalse | Increment
                | Decrement
        ) {
            return Err(Error::UnhandledUnary(op));
        }
        require_readable(operand)?;
        let ty = operand.ty();
        let (m, result) = match method {
            Some(m) => method_based_unary(op, ty, m)?,
            None => match builtin_type(op, ty) {
                Some(result) => return Ok(unary(op, Some(operand), result, None)),
                None => user_defined_unary_or_throw(op, &unary_names(op), ty)?,
            },
        };
        Ok(unary(op, Some(operand), result, Some(m)))
    }

    pub fn negate(operand: &Expr) -> Result<Expr> {
        Expr::unary_operator(NodeType::Negate, operand, None)
    }

    pub fn unary_plus(operand: &Expr) -> Result<Expr> {
        Expr::unary_operator(NodeType::UnaryPlus, operand, None)
    }

    pub fn not(operand: &Expr) -> Result<Expr> {
        Expr::unary_operator(NodeType::Not, operand, None)
    }

    pub fn ones_complement(operand: &Expr) -> Result<Expr> {
        Expr::unary_operator(NodeType::OnesComplement, operand, None)
    }

    pub fn is_true(operand: &Expr) -> Result<Expr> {
        Expr::unary_operator(NodeType::IsTrue, operand, None)
    }

    pub fn is_false(operand: &Expr) -> Result<Expr> {
        Expr::unary_operator(NodeType::IsFalse, operand, None)
    }

    /// `operand + 1` without assignment.
    pub fn increment(operand: &Expr) -> Result<Expr> {
        Expr::unary_operator(NodeType::Increment, operand, None)
    }

    pub fn decrement(operand: &Expr) -> Result<Expr> {
        Expr::unary_operator(NodeType::Decrement, operand, None)
    }

    // ── Increment / decrement assign ──

    /// `++x`, `--x`, `x++` or `x--` over any writable operand.
    pub fn increment_assign(op: NodeType, operand: &Expr, method: Option<&Method>) -> Result<Expr> {
        if !op.is_increment_assign() {
            return Err(Error::UnhandledUnary(op));
        }
        require_readable(operand)?;
        require_writable(operand)?;
        let ty = operand.ty();
        let (m, result) = match method {
            Some(m) => method_based_unary(op, ty, m)?,
            None => {
                if types::is_arithmetic(ty) {
                    return Ok(unary(op, Some(operand), ty.clone(), None));
                }
                user_defined_unary_or_throw(op, &unary_names(op), ty)?
            }
        };
        if !types::are_reference_assignable(ty, &result) {
            return Err(Error::UserDefinedOpMustHaveValidReturnType {
                op,
                method: m.name().to_string(),
            });
        }
        Ok(unary(op, Some(operand), result, Some(m)))
    }

    pub fn pre_increment_assign(operand: &Expr) -> Result<Expr> {
        Expr::increment_assign(NodeType::PreIncrementAssign, operand, None)
    }

    pub fn pre_decrement_assign(operand: &Expr) -> Result<Expr> {
        Expr::increment_assign(NodeType::PreDecrementAssign, operand, None)
    }

    pub fn post_increment_assign(operand: &Expr) -> Result<Expr> {
        Expr::increment_assign(NodeType::PostIncrementAssign, operand, None)
    }

    pub fn post_decrement_assign(operand: &Expr) -> Result<Expr> {
        Expr::increment_assign(NodeType::PostDecrementAssign, operand, None)
    }

    // ── Conversions ──

    /// Conversion to `ty`: identity, primitive, nullable and reference
    /// conversions are builtin; anything else needs an `op_Implicit` or
    /// `op_Explicit` method.
    pub fn convert(operand: &Expr, ty: &Type, method: Option<&Method>) -> Result<Expr> {
        Expr::coerce(NodeType::Convert, operand, ty, method)
    }

    pub fn convert_checked(operand: &Expr, ty: &Type, method: Option<&Method>) -> Result<Expr> {
        Expr::coerce(NodeType::ConvertChecked, operand, ty, method)
    }

    fn coerce(op: NodeType, operand: &Expr, ty: &Type, method: Option<&Method>) -> Result<Expr> {
        require_readable(operand)?;
        validate_type(ty)?;
        let from = operand.ty();
        let method = match method {
            Some(m) => method_based_coercion(op, from, ty, m)?,
            None => {
                if types::has_identity_primitive_or_nullable_conversion(from, ty)
                    || types::has_reference_conversion(from, ty)
                {
                    return Ok(unary(op, Some(operand), ty.clone(), None));
                }
                types::get_user_defined_coercion_method(from, ty).ok_or_else(|| {
                    Error::CoercionOperatorNotDefined {
                        from: from.clone(),
                        to: ty.clone(),
                    }
                })?
            }
        };
        Ok(unary(op, Some(operand), ty.clone(), Some(method)))
    }

    /// `operand as ty`: null when the runtime type does not match.
    pub fn type_as(operand: &Expr, ty: &Type) -> Result<Expr> {
        require_readable(operand)?;
        validate_type(ty)?;
        if ty.is_value_type() && !ty.is_nullable() {
            return Err(Error::IncorrectTypeForTypeAs(ty.clone()));
        }
        Ok(unary(NodeType::TypeAs, Some(operand), ty.clone(), None))
    }

    /// Extract a value type from an `object` or interface reference.
    pub fn unbox(operand: &Expr, ty: &Type) -> Result<Expr> {
        require_readable(operand)?;
        let from = operand.ty();
        if (!from.is_interface() && *from != Type::object()) || !ty.is_value_type() {
            return Err(Error::InvalidUnboxType {
                from: from.clone(),
                to: ty.clone(),
            });
        }
        validate_type(ty)?;
        Ok(unary(NodeType::Unbox, Some(operand), ty.clone(), None))
    }

    pub fn array_length(array: &Expr) -> Result<Expr> {
        require_readable(array)?;
        match array.ty().array_rank() {
            Some(1) => Ok(unary(NodeType::ArrayLength, Some(array), Type::i32(), None)),
            Some(_) => Err(Error::ArgumentMustBeSingleDimensionalArray(array.ty().clone())),
            None => Err(Error::ArgumentMustBeArray(array.ty().clone())),
        }
    }

    // ── Throw ──

    /// Throw `value` (a reference) or rethrow the current exception when
    /// `value` is `None`. The node takes type `ty` so it can stand in any
    /// typed position.
    pub fn throw(value: Option<&Expr>, ty: &Type) -> Result<Expr> {
        if let Some(v) = value {
            require_readable(v)?;
            if v.ty().is_value_type() {
                return Err(Error::ArgumentMustNotHaveValueType(v.ty().clone()));
            }
        }
        Ok(unary(NodeType::Throw, value, ty.clone(), None))
    }

    pub fn rethrow() -> Expr {
        unary(NodeType::Throw, None, Type::void(), None)
    }

    /// Build any unary node from its kind tag.
    pub fn make_unary(
        op: NodeType,
        operand: Option<&Expr>,
        ty: &Type,
        method: Option<&Method>,
    ) -> Result<Expr> {
        use NodeType::*;
        if op == Throw {
            return Expr::throw(operand, ty);
        }
        let Some(operand) = operand else {
            return Err(Error::UnhandledUnary(op));
        };
        match op {
            Negate | NegateChecked | UnaryPlus | Not | OnesComplement | IsTrue | IsFalse
            | Increment | Decrement => Expr::unary_operator(op, operand, method),
            PreIncrementAssign | PreDecrementAssign | PostIncrementAssign | PostDecrementAssign => {
                Expr::increment_assign(op, operand, method)
            }
            Convert => Expr::convert(operand, ty, method),
            ConvertChecked => Expr::convert_checked(operand, ty, method),
            TypeAs => Expr::type_as(operand, ty),
            Unbox => Expr::unbox(operand, ty),
            ArrayLength => Expr::array_length(operand),
            _ => Err(Error::UnhandledUnary(op)),
        }
    }

    // ── Type tests ──

    /// `expression is ty`: assignability of the runtime type.
    pub fn type_is(expression: &Expr, ty: &Type) -> Result<Expr> {
        Expr::type_test(NodeType::TypeIs, expression, ty)
    }

    /// Exact runtime type equality.
    pub fn type_equal(expression: &Expr, ty: &Type) -> Result<Expr> {
        Expr::type_test(NodeType::TypeEqual, expression, ty)
    }

    fn type_test(op: NodeType, expression: &Expr, ty: &Type) -> Result<Expr> {
        require_readable(expression)?;
        if ty.is_by_ref() {
            return Err(Error::TypeMustNotBeByRef(ty.clone()));
        }
        Ok(Expr::new(
            Type::bool(),
            ExprKind::TypeBinary(TypeBinaryNode {
                op,
                expression: expression.clone(),
                type_operand: ty.clone(),
            }),
        ))
    }
}
