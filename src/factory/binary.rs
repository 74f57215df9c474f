//! Binary operators: arithmetic, bitwise, shifts, comparisons, conditional
//! logic, coalesce, array indexing, assignment and compound assignment.
//!
//! Resolution order for an operator without an explicit method:
//!
//! 1. builtin, when both operands share a type the operator is defined on;
//! 2. a user-defined static operator method on either operand type;
//! 3. the same lookup over the unwrapped types of two nullable operands,
//!    lifting the result back to nullable.
//!
//! Anything else is `BinaryOperatorNotDefined`.

use crate::error::{Error, Result};
use crate::tree::{BinaryNode, Expr, ExprKind, NodeType};
use crate::types::{self, Method, Type};

use super::{require_readable, require_writable, validate_type};

fn binary(
    op: NodeType,
    left: &Expr,
    right: &Expr,
    ty: Type,
    method: Option<Method>,
    conversion: Option<Expr>,
) -> Expr {
    Expr::new(
        ty,
        ExprKind::Binary(BinaryNode {
            op,
            left: left.clone(),
            right: right.clone(),
            method,
            conversion,
        }),
    )
}

// ─── Resolution helpers ────────────────────────────────────────────

fn is_simple_shift(left: &Type, right: &Type) -> bool {
    types::is_integer(left) && right.non_nullable() == Type::i32()
}

fn shift_result_type(left: &Type, right: &Type) -> Type {
    if !left.is_nullable() && right.is_nullable() {
        left.nullable()
    } else {
        left.clone()
    }
}

/// Result type of the builtin operator over these operand types, if any.
fn builtin_type(op: NodeType, left: &Type, right: &Type) -> Option<Type> {
    use NodeType::*;
    let same = left == right;
    match op {
        Add | AddChecked | Subtract | SubtractChecked | Multiply | MultiplyChecked | Divide
        | Modulo => (same && types::is_arithmetic(left)).then(|| left.clone()),
        Power => (same && left.non_nullable() == Type::f64()).then(|| left.clone()),
        And | Or | ExclusiveOr => (same && types::is_integer_or_bool(left)).then(|| left.clone()),
        LeftShift | RightShift => {
            is_simple_shift(left, right).then(|| shift_result_type(left, right))
        }
        _ => None,
    }
}

/// Operator method names to try, in order.
fn operator_names(op: NodeType) -> Vec<&'static str> {
    match op {
        NodeType::Power => vec!["op_Exponent", "op_Exponentiation"],
        _ => op.operator_method_name().into_iter().collect(),
    }
}

pub(crate) fn validate_operator(method: &Method) -> Result<()> {
    if !method.is_static() {
        return Err(Error::UserDefinedOperatorMustBeStatic(method.name().to_string()));
    }
    if method.return_type().is_void() {
        return Err(Error::UserDefinedOperatorMustNotBeVoid(method.name().to_string()));
    }
    Ok(())
}

/// A nullable parameter cannot take a non-nullable operand.
fn validate_param_with_operand(param: &Type, operand: &Type, op: NodeType, name: &str) -> Result<()> {
    if param.is_nullable() && !operand.is_nullable() {
        return Err(Error::OperandTypesDoNotMatchParameters {
            op,
            method: name.to_string(),
        });
    }
    Ok(())
}

/// Operator lookup over exact operand types; `&&`/`||` over two nullables
/// retry with the unwrapped types right away.
fn lookup_binary(op: NodeType, name: &str, left: &Type, right: &Type) -> Option<Method> {
    let method = types::get_user_defined_binary_method(name, left, right);
    if method.is_none()
        && left.is_nullable()
        && right.is_nullable()
        && matches!(op, NodeType::AndAlso | NodeType::OrElse)
    {
        return lookup_binary(op, name, &left.non_nullable(), &right.non_nullable());
    }
    method
}

/// Lifting rule: a non-nullable value-type result becomes nullable, except
/// `bool` when `lift_to_null` is false.
fn lifted_result(ret: &Type, lift_to_null: bool) -> Option<Type> {
    if !ret.is_value_type() || ret.is_nullable() {
        return None;
    }
    if !types::is_bool(ret) || lift_to_null {
        Some(ret.nullable())
    } else {
        Some(Type::bool())
    }
}

/// User-defined operator and the node type it produces.
fn user_defined_binary(
    op: NodeType,
    left: &Type,
    right: &Type,
    lift_to_null: bool,
) -> Option<(Method, Type)> {
    for name in operator_names(op) {
        if let Some(m) = lookup_binary(op, name, left, right) {
            let ty = m.return_type().clone();
            return Some((m, ty));
        }
        if left.is_nullable() && right.is_nullable() {
            if let Some(m) = lookup_binary(op, name, &left.non_nullable(), &right.non_nullable()) {
                if let Some(ty) = lifted_result(m.return_type(), lift_to_null) {
                    return Some((m, ty));
                }
            }
        }
    }
    None
}

fn user_defined_binary_or_throw(
    op: NodeType,
    left: &Type,
    right: &Type,
    lift_to_null: bool,
) -> Result<(Method, Type)> {
    let Some((m, ty)) = user_defined_binary(op, left, right, lift_to_null) else {
        return Err(Error::BinaryOperatorNotDefined {
            op,
            left: left.clone(),
            right: right.clone(),
        });
    };
    validate_param_with_operand(&m.params()[0], left, op, m.name())?;
    validate_param_with_operand(&m.params()[1], right, op, m.name())?;
    Ok((m, ty))
}

/// Validate an explicitly supplied operator method, lifting over nullable
/// operands when its parameters take the unwrapped types.
fn method_based_binary(
    op: NodeType,
    left: &Type,
    right: &Type,
    method: &Method,
    lift_to_null: bool,
) -> Result<(Method, Type)> {
    validate_operator(method)?;
    let params = method.params();
    if params.len() != 2 {
        return Err(Error::IncorrectNumberOfMethodCallArguments(
            method.name().to_string(),
        ));
    }
    if types::parameter_is_assignable(&params[0], left)
        && types::parameter_is_assignable(&params[1], right)
    {
        validate_param_with_operand(&params[0], left, op, method.name())?;
        validate_param_with_operand(&params[1], right, op, method.name())?;
        return Ok((method.clone(), method.return_type().clone()));
    }
    if left.is_nullable()
        && right.is_nullable()
        && types::parameter_is_assignable(&params[0], &left.non_nullable())
        && types::parameter_is_assignable(&params[1], &right.non_nullable())
    {
        if let Some(ty) = lifted_result(method.return_type(), lift_to_null) {
            return Ok((method.clone(), ty));
        }
    }
    Err(Error::OperandTypesDoNotMatchParameters {
        op,
        method: method.name().to_string(),
    })
}

fn is_null_constant(e: &Expr) -> bool {
    e.as_constant().is_some_and(|v| v.is_null())
}

/// `x == null` over a nullable `x` is a `HasValue` test and legal without
/// an equality operator.
fn is_null_comparison(left: &Expr, right: &Expr) -> bool {
    if is_null_constant(left) {
        !is_null_constant(right) && right.ty().is_nullable()
    } else {
        is_null_constant(right) && left.ty().is_nullable()
    }
}

fn logical_type(operand: &Type, lift_to_null: bool) -> Type {
    if operand.is_nullable() && lift_to_null {
        Type::bool().nullable()
    } else {
        Type::bool()
    }
}

/// Single-parameter conversion lambda signature.
fn conversion_signature(conversion: &Expr) -> Result<(Type, Type)> {
    if conversion.as_lambda().is_none() {
        return Err(Error::ArgumentMustBeLambda(conversion.node_type()));
    }
    let Some((params, ret)) = conversion.ty().delegate_signature() else {
        return Err(Error::LambdaTypeMustBeDelegate(conversion.ty().clone()));
    };
    if params.len() != 1 {
        return Err(Error::IncorrectNumberOfMethodCallArguments(
            "conversion".to_string(),
        ));
    }
    Ok((params[0].clone(), ret.clone()))
}

/// `op=` conversion: takes the operator result and returns the left type.
fn validate_op_assign_conversion(
    conversion: &Expr,
    left: &Type,
    method: &Method,
    op: NodeType,
) -> Result<()> {
    let (param, ret) = conversion_signature(conversion)?;
    if !types::are_equivalent(&ret, left) {
        return Err(Error::OperandTypesDoNotMatchParameters {
            op,
            method: "conversion".to_string(),
        });
    }
    if !types::are_equivalent(&param, method.return_type()) {
        return Err(Error::OverloadOperatorTypeDoesNotMatchConversionType {
            op,
            method: "conversion".to_string(),
        });
    }
    Ok(())
}

// ─── Factories ─────────────────────────────────────────────────────

impl Expr {
    /// Arithmetic, bitwise and shift operators. `method` overrides the
    /// builtin or conventional operator.
    pub fn arithmetic(
        op: NodeType,
        left: &Expr,
        right: &Expr,
        method: Option<&Method>,
    ) -> Result<Expr> {
        use NodeType::*;
        if !matches!(
            op,
            Add | AddChecked
                | Subtract
                | SubtractChecked
                | Multiply
                | MultiplyChecked
                | Divide
                | Modulo
                | Power
                | And
                | Or
                | ExclusiveOr
                | LeftShift
                | RightShift
        ) {
            return Err(Error::UnhandledBinary(op));
        }
        require_readable(left)?;
        require_readable(right)?;
        let (lt, rt) = (left.ty(), right.ty());
        let (method, ty) = match method {
            Some(m) => method_based_binary(op, lt, rt, m, true)?,
            None => match builtin_type(op, lt, rt) {
                Some(ty) => return Ok(binary(op, left, right, ty, None, None)),
                None => user_defined_binary_or_throw(op, lt, rt, true)?,
            },
        };
        Ok(binary(op, left, right, ty, Some(method), None))
    }

    pub fn add(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::arithmetic(NodeType::Add, left, right, None)
    }

    pub fn add_checked(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::arithmetic(NodeType::AddChecked, left, right, None)
    }

    pub fn subtract(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::arithmetic(NodeType::Subtract, left, right, None)
    }

    pub fn multiply(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::arithmetic(NodeType::Multiply, left, right, None)
    }

    pub fn divide(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::arithmetic(NodeType::Divide, left, right, None)
    }

    pub fn modulo(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::arithmetic(NodeType::Modulo, left, right, None)
    }

    pub fn power(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::arithmetic(NodeType::Power, left, right, None)
    }

    pub fn and(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::arithmetic(NodeType::And, left, right, None)
    }

    pub fn or(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::arithmetic(NodeType::Or, left, right, None)
    }

    pub fn exclusive_or(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::arithmetic(NodeType::ExclusiveOr, left, right, None)
    }

    pub fn left_shift(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::arithmetic(NodeType::LeftShift, left, right, None)
    }

    pub fn right_shift(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::arithmetic(NodeType::RightShift, left, right, None)
    }

    // ── Comparison ──

    /// Equality and ordering comparisons. With `lift_to_null`, comparing
    /// nullable operands yields `bool?` instead of `bool`.
    pub fn comparison(
        op: NodeType,
        left: &Expr,
        right: &Expr,
        lift_to_null: bool,
        method: Option<&Method>,
    ) -> Result<Expr> {
        use NodeType::*;
        require_readable(left)?;
        require_readable(right)?;
        let (lt, rt) = (left.ty(), right.ty());
        if let Some(m) = method {
            if !matches!(
                op,
                Equal | NotEqual | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual
            ) {
                return Err(Error::UnhandledBinary(op));
            }
            let (m, ty) = method_based_binary(op, lt, rt, m, lift_to_null)?;
            return Ok(binary(op, left, right, ty, Some(m), None));
        }
        match op {
            Equal | NotEqual => {
                if lt == rt && (types::is_numeric(lt) || *lt == Type::object() || types::is_bool(lt))
                {
                    let ty = logical_type(lt, lift_to_null);
                    return Ok(binary(op, left, right, ty, None, None));
                }
                if let Some((m, ty)) = user_defined_binary(op, lt, rt, lift_to_null) {
                    return Ok(binary(op, left, right, ty, Some(m), None));
                }
                if types::has_builtin_equality_operator(lt, rt) || is_null_comparison(left, right) {
                    let ty = logical_type(lt, lift_to_null);
                    return Ok(binary(op, left, right, ty, None, None));
                }
                Err(Error::BinaryOperatorNotDefined {
                    op,
                    left: lt.clone(),
                    right: rt.clone(),
                })
            }
            LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
                if lt == rt && types::is_numeric(lt) {
                    let ty = logical_type(lt, lift_to_null);
                    return Ok(binary(op, left, right, ty, None, None));
                }
                let (m, ty) = user_defined_binary_or_throw(op, lt, rt, lift_to_null)?;
                Ok(binary(op, left, right, ty, Some(m), None))
            }
            _ => Err(Error::UnhandledBinary(op)),
        }
    }

    pub fn equal(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::comparison(NodeType::Equal, left, right, false, None)
    }

    pub fn not_equal(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::comparison(NodeType::NotEqual, left, right, false, None)
    }

    pub fn less_than(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::comparison(NodeType::LessThan, left, right, false, None)
    }

    pub fn less_than_or_equal(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::comparison(NodeType::LessThanOrEqual, left, right, false, None)
    }

    pub fn greater_than(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::comparison(NodeType::GreaterThan, left, right, false, None)
    }

    pub fn greater_than_or_equal(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::comparison(NodeType::GreaterThanOrEqual, left, right, false, None)
    }

    /// Object identity comparison between reference types.
    pub fn reference_equal(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::reference_comparison(NodeType::Equal, left, right)
    }

    pub fn reference_not_equal(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::reference_comparison(NodeType::NotEqual, left, right)
    }

    fn reference_comparison(op: NodeType, left: &Expr, right: &Expr) -> Result<Expr> {
        require_readable(left)?;
        require_readable(right)?;
        if !types::has_reference_equality(left.ty(), right.ty()) {
            return Err(Error::ReferenceEqualityNotDefined {
                left: left.ty().clone(),
                right: right.ty().clone(),
            });
        }
        Ok(binary(op, left, right, Type::bool(), None, None))
    }

    // ── Conditional logic ──

    /// `&&` / `||`. Over `bool` and `bool?` these are builtin; otherwise the
    /// operand type must supply `&` / `|` plus `op_True` and `op_False`.
    pub fn conditional_logic(
        op: NodeType,
        left: &Expr,
        right: &Expr,
        method: Option<&Method>,
    ) -> Result<Expr> {
        if !matches!(op, NodeType::AndAlso | NodeType::OrElse) {
            return Err(Error::UnhandledBinary(op));
        }
        require_readable(left)?;
        require_readable(right)?;
        let (lt, rt) = (left.ty(), right.ty());
        let method = match method {
            Some(m) => m.clone(),
            None => {
                if lt == rt {
                    if *lt == Type::bool() {
                        return Ok(binary(op, left, right, Type::bool(), None, None));
                    }
                    if *lt == Type::bool().nullable() {
                        return Ok(binary(op, left, right, lt.clone(), None, None));
                    }
                }
                operator_names(op)
                    .iter()
                    .find_map(|name| lookup_binary(op, name, lt, rt))
                    .ok_or_else(|| Error::BinaryOperatorNotDefined {
                        op,
                        left: lt.clone(),
                        right: rt.clone(),
                    })?
            }
        };
        validate_conditional_logic_operator(op, lt, rt, &method)?;
        let ty = if lt.is_nullable() && *method.return_type() == lt.non_nullable() {
            lt.clone()
        } else {
            method.return_type().clone()
        };
        Ok(binary(op, left, right, ty, Some(method), None))
    }

    pub fn and_also(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::conditional_logic(NodeType::AndAlso, left, right, None)
    }

    pub fn or_else(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::conditional_logic(NodeType::OrElse, left, right, None)
    }

    // ── Coalesce ──

    /// `left ?? right`, typed by the first rung that applies:
    ///
    /// 1. left is `T?` and right converts to `T`: result `T`;
    /// 2. right converts to left's type: result is left's type;
    /// 3. left's unwrapped type converts to right's type: result is right's.
    pub fn coalesce(left: &Expr, right: &Expr) -> Result<Expr> {
        require_readable(left)?;
        require_readable(right)?;
        let ty = coalesce_type(left.ty(), right.ty())?;
        Ok(binary(NodeType::Coalesce, left, right, ty, None, None))
    }

    /// Coalesce whose left value passes through `conversion` before being
    /// returned. The lambda takes left's (unwrapped) type and returns
    /// exactly right's type.
    pub fn coalesce_with(left: &Expr, right: &Expr, conversion: Option<&Expr>) -> Result<Expr> {
        let Some(conversion) = conversion else {
            return Expr::coalesce(left, right);
        };
        require_readable(left)?;
        require_readable(right)?;
        let (lt, rt) = (left.ty(), right.ty());
        if lt.is_value_type() && !lt.is_nullable() {
            return Err(Error::CoalesceUsedOnNonNullType(lt.clone()));
        }
        let (param, ret) = conversion_signature(conversion)?;
        if ret.is_void() {
            return Err(Error::UserDefinedOperatorMustNotBeVoid(
                "conversion".to_string(),
            ));
        }
        let mismatch = || Error::OperandTypesDoNotMatchParameters {
            op: NodeType::Coalesce,
            method: "conversion".to_string(),
        };
        if !types::are_equivalent(&ret, rt) {
            return Err(mismatch());
        }
        if !types::parameter_is_assignable(&param, &lt.non_nullable())
            && !types::parameter_is_assignable(&param, lt)
        {
            return Err(mismatch());
        }
        Ok(binary(
            NodeType::Coalesce,
            left,
            right,
            rt.clone(),
            None,
            Some(conversion.clone()),
        ))
    }

    // ── Array index ──

    /// Element of a single-dimensional array.
    pub fn array_index(array: &Expr, index: &Expr) -> Result<Expr> {
        require_readable(array)?;
        require_readable(index)?;
        if *index.ty() != Type::i32() {
            return Err(Error::ArgumentMustBeArrayIndexType(index.ty().clone()));
        }
        let Some(element) = array.ty().element_type() else {
            return Err(Error::ArgumentMustBeArray(array.ty().clone()));
        };
        if array.ty().array_rank() != Some(1) {
            return Err(Error::IncorrectNumberOfIndexes {
                rank: array.ty().array_rank().unwrap_or(0),
            });
        }
        Ok(binary(NodeType::ArrayIndex, array, index, element.clone(), None, None))
    }

    // ── Assignment ──

    pub fn assign(left: &Expr, right: &Expr) -> Result<Expr> {
        require_writable(left)?;
        require_readable(right)?;
        validate_type(left.ty())?;
        validate_type(right.ty())?;
        if !types::are_reference_assignable(left.ty(), right.ty()) {
            return Err(Error::ExpressionTypeDoesNotMatchAssignment {
                expression: right.ty().clone(),
                target: left.ty().clone(),
            });
        }
        Ok(binary(NodeType::Assign, left, right, left.ty().clone(), None, None))
    }

    /// Compound assignment `left op= right`. A `conversion` lambda maps the
    /// operator result back to left's type; it is only allowed with a
    /// user-defined operator.
    pub fn op_assign(
        op: NodeType,
        left: &Expr,
        right: &Expr,
        method: Option<&Method>,
        conversion: Option<&Expr>,
    ) -> Result<Expr> {
        let Some(base) = op.op_assignment_base() else {
            return Err(Error::UnhandledBinary(op));
        };
        require_readable(left)?;
        require_writable(left)?;
        require_readable(right)?;
        let (lt, rt) = (left.ty(), right.ty());
        let (method, result) = match method {
            Some(m) => method_based_binary(op, lt, rt, m, true)?,
            None => {
                if let Some(ty) = builtin_type(base, lt, rt) {
                    if conversion.is_some() {
                        return Err(Error::ConversionIsNotSupportedForArithmeticTypes);
                    }
                    return Ok(binary(op, left, right, ty, None, None));
                }
                let (m, ty) = user_defined_binary(base, lt, rt, true).ok_or_else(|| {
                    Error::BinaryOperatorNotDefined {
                        op,
                        left: lt.clone(),
                        right: rt.clone(),
                    }
                })?;
                validate_param_with_operand(&m.params()[0], lt, op, m.name())?;
                validate_param_with_operand(&m.params()[1], rt, op, m.name())?;
                (m, ty)
            }
        };
        match conversion {
            None => {
                if !types::are_reference_assignable(lt, &result) {
                    return Err(Error::UserDefinedOpMustHaveValidReturnType {
                        op,
                        method: method.name().to_string(),
                    });
                }
                Ok(binary(op, left, right, result, Some(method), None))
            }
            Some(conv) => {
                validate_op_assign_conversion(conv, lt, &method, op)?;
                Ok(binary(
                    op,
                    left,
                    right,
                    lt.clone(),
                    Some(method),
                    Some(conv.clone()),
                ))
            }
        }
    }

    pub fn add_assign(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::op_assign(NodeType::AddAssign, left, right, None, None)
    }

    pub fn subtract_assign(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::op_assign(NodeType::SubtractAssign, left, right, None, None)
    }

    pub fn multiply_assign(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::op_assign(NodeType::MultiplyAssign, left, right, None, None)
    }

    pub fn divide_assign(left: &Expr, right: &Expr) -> Result<Expr> {
        Expr::op_assign(NodeType::DivideAssign, left, right, None, None)
    }

    // ── Dispatch by kind ──

    /// Build any binary node from its kind tag, the form the rewriter uses
    /// to rebuild a changed node.
    pub fn make_binary(
        op: NodeType,
        left: &Expr,
        right: &Expr,
        lift_to_null: bool,
        method: Option<&Method>,
        conversion: Option<&Expr>,
    ) -> Result<Expr> {
        use NodeType::*;
        match op {
            Add | AddChecked | Subtract | SubtractChecked | Multiply | MultiplyChecked
            | Divide | Modulo | Power | And | Or | ExclusiveOr | LeftShift | RightShift => {
                Expr::arithmetic(op, left, right, method)
            }
            Equal | NotEqual | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
                Expr::comparison(op, left, right, lift_to_null, method)
            }
            AndAlso | OrElse => Expr::conditional_logic(op, left, right, method),
            Coalesce => Expr::coalesce_with(left, right, conversion),
            ArrayIndex => Expr::array_index(left, right),
            Assign => Expr::assign(left, right),
            _ if op.is_op_assignment() => Expr::op_assign(op, left, right, method, conversion),
            _ => Err(Error::UnhandledBinary(op)),
        }
    }
}

/// Result type of an unconverted coalesce. The rungs are tried in order;
/// when more than one applies the earliest wins.
fn coalesce_type(left: &Type, right: &Type) -> Result<Type> {
    let left_stripped = left.non_nullable();
    if left.is_value_type() && !left.is_nullable() {
        return Err(Error::CoalesceUsedOnNonNullType(left.clone()));
    }
    if left.is_nullable() && types::is_implicitly_convertible(right, &left_stripped) {
        return Ok(left_stripped);
    }
    if types::is_implicitly_convertible(right, left) {
        return Ok(left.clone());
    }
    if types::is_implicitly_convertible(&left_stripped, right) {
        return Ok(right.clone());
    }
    Err(Error::ArgumentTypesMustMatch)
}

/// `&&` / `||` operator method shape: `(T, T) -> T` on a type that also
/// defines `op_True` and `op_False` returning `bool`.
fn validate_conditional_logic_operator(
    op: NodeType,
    left: &Type,
    right: &Type,
    method: &Method,
) -> Result<()> {
    validate_operator(method)?;
    let params = method.params();
    if params.len() != 2 {
        return Err(Error::IncorrectNumberOfMethodCallArguments(
            method.name().to_string(),
        ));
    }
    let mismatch = |name: &str| Error::OperandTypesDoNotMatchParameters {
        op,
        method: name.to_string(),
    };
    let accepts = |param: &Type, operand: &Type| {
        types::parameter_is_assignable(param, operand)
            || (operand.is_nullable() && types::parameter_is_assignable(param, &operand.non_nullable()))
    };
    if !accepts(&params[0], left) || !accepts(&params[1], right) {
        return Err(mismatch(method.name()));
    }
    if params[0] != params[1] || *method.return_type() != params[0] {
        return Err(Error::UserDefinedOpMustHaveConsistentTypes {
            op,
            method: method.name().to_string(),
        });
    }
    let declaring = method.declaring_type();
    let op_true = types::get_boolean_operator(declaring, "op_True");
    let op_false = types::get_boolean_operator(declaring, "op_False");
    let (Some(op_true), Some(op_false)) = (op_true, op_false) else {
        return Err(Error::LogicalOperatorMustHaveBooleanOperators {
            op,
            method: method.name().to_string(),
        });
    };
    if *op_true.return_type() != Type::bool() || *op_false.return_type() != Type::bool() {
        return Err(Error::LogicalOperatorMustHaveBooleanOperators {
            op,
            method: method.name().to_string(),
        });
    }
    for test in [&op_false, &op_true] {
        if test.params().len() != 1 {
            return Err(Error::IncorrectNumberOfMethodCallArguments(
                test.name().to_string(),
            ));
        }
        if !accepts(&test.params()[0], left) {
            return Err(mismatch(test.name()));
        }
    }
    Ok(())
}
