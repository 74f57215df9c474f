//! Constants, parameters, variables and defaults.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::tree::{ConstantNode, Expr, ExprKind, LabelTarget, ParameterNode, Value};
use crate::types::{self, Type};

use super::validate_type;

impl Expr {
    /// Constant typed by its value; null constants are typed `object`.
    pub fn constant(value: impl Into<Value>) -> Expr {
        let value = value.into();
        let ty = value.natural_type().unwrap_or_else(Type::object);
        Expr::new(ty, ExprKind::Constant(ConstantNode { value }))
    }

    /// Constant with an explicit type the value must be assignable to.
    pub fn constant_typed(value: impl Into<Value>, ty: &Type) -> Result<Expr> {
        validate_type(ty)?;
        let value = value.into();
        let ok = match value.natural_type() {
            None => !ty.is_value_type() || ty.is_nullable(),
            Some(natural) => types::is_assignable_from(ty, &natural),
        };
        if !ok {
            return Err(Error::ConstantTypeMismatch {
                value: value.natural_type().unwrap_or_else(Type::object),
                ty: ty.clone(),
            });
        }
        Ok(Expr::new(ty.clone(), ExprKind::Constant(ConstantNode { value })))
    }

    /// The null constant of a reference or nullable type.
    pub fn null(ty: &Type) -> Result<Expr> {
        Expr::constant_typed(Value::Null, ty)
    }

    /// Lambda or catch parameter. A by-ref type makes a by-ref parameter of
    /// the referenced type.
    pub fn parameter(ty: &Type, name: Option<&str>) -> Result<Expr> {
        if ty.is_void() {
            return Err(Error::ArgumentCannotBeOfTypeVoid);
        }
        let (ty, is_by_ref) = match ty.is_by_ref() {
            true => (ty.non_ref(), true),
            false => (ty.clone(), false),
        };
        Ok(Expr::new(
            ty,
            ExprKind::Parameter(ParameterNode {
                name: name.map(Arc::from),
                is_by_ref,
            }),
        ))
    }

    /// Block-scoped variable; never by-ref.
    pub fn variable(ty: &Type, name: Option<&str>) -> Result<Expr> {
        if ty.is_void() {
            return Err(Error::ArgumentCannotBeOfTypeVoid);
        }
        validate_type(ty)?;
        Ok(Expr::new(
            ty.clone(),
            ExprKind::Parameter(ParameterNode {
                name: name.map(Arc::from),
                is_by_ref: false,
            }),
        ))
    }

    /// Fresh unnamed temporary used by lowerings. `ty` is a valid node type
    /// by construction.
    pub(crate) fn temp(ty: &Type) -> Expr {
        Expr::new(
            ty.clone(),
            ExprKind::Parameter(ParameterNode {
                name: None,
                is_by_ref: false,
            }),
        )
    }

    pub fn default_value(ty: &Type) -> Result<Expr> {
        validate_type(ty)?;
        Ok(Expr::new(ty.clone(), ExprKind::Default))
    }

    /// `default(void)`: a no-op expression.
    pub fn empty() -> Expr {
        Expr::new(Type::void(), ExprKind::Default)
    }

    pub fn label_target(ty: &Type, name: Option<&str>) -> Result<LabelTarget> {
        validate_type(ty)?;
        Ok(LabelTarget::new(ty.clone(), name))
    }
}
