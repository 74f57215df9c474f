//! Lambdas, delegate invocation, and late-bound dynamic calls.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::tree::{CallSiteBinder, DynamicNode, Expr, ExprKind, InvokeNode, LambdaNode};
use crate::types::{self, Type};

use super::{require_readable, require_readable_all, validate_type};

/// The delegate type a lambda gets when none is given: one parameter per
/// declared parameter (by-ref ones as `ref T`) returning the body type.
fn infer_delegate(parameters: &[Expr], body: &Expr) -> Result<Type> {
    let params = parameters
        .iter()
        .map(|p| {
            let node = p
                .as_parameter()
                .ok_or(Error::ArgumentMustBeParameter(p.node_type()))?;
            Ok(if node.is_by_ref { p.ty().by_ref() } else { p.ty().clone() })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Type::delegate(params, body.ty().clone()))
}

fn validate_lambda_args(delegate_type: &Type, body: &Expr, parameters: &[Expr]) -> Result<()> {
    let (params, ret) = delegate_type
        .delegate_signature()
        .ok_or_else(|| Error::LambdaTypeMustBeDelegate(delegate_type.clone()))?;
    if params.len() != parameters.len() {
        return Err(Error::IncorrectNumberOfLambdaDeclarationParameters);
    }
    let mut seen = HashSet::with_capacity(parameters.len());
    for (p, declared) in parameters.iter().zip(params) {
        let node = p
            .as_parameter()
            .ok_or(Error::ArgumentMustBeParameter(p.node_type()))?;
        let mut declared = declared.clone();
        if node.is_by_ref {
            if !declared.is_by_ref() {
                return Err(Error::ParameterNotValidForDelegate {
                    parameter: p.ty().by_ref(),
                    delegate_param: declared,
                });
            }
            declared = declared.non_ref();
        }
        if !types::are_reference_assignable(p.ty(), &declared) {
            return Err(Error::ParameterNotValidForDelegate {
                parameter: p.ty().clone(),
                delegate_param: declared,
            });
        }
        if !seen.insert(p.clone()) {
            return Err(Error::DuplicateVariable(
                node.name.as_deref().unwrap_or("<unnamed>").to_string(),
            ));
        }
    }
    if !ret.is_void() && !types::are_reference_assignable(ret, body.ty()) {
        return Err(Error::ExpressionTypeDoesNotMatchReturn {
            expression: body.ty().clone(),
            ret: ret.clone(),
        });
    }
    Ok(())
}

impl Expr {
    /// A lambda of `delegate_type`, or of the delegate inferred from the
    /// parameters and body when `None`.
    pub fn lambda(
        delegate_type: Option<&Type>,
        body: &Expr,
        parameters: &[Expr],
        name: Option<&str>,
        tail_call: bool,
    ) -> Result<Expr> {
        require_readable(body)?;
        let delegate_type = match delegate_type {
            Some(t) => t.clone(),
            None => infer_delegate(parameters, body)?,
        };
        validate_lambda_args(&delegate_type, body, parameters)?;
        Ok(Expr::new(
            delegate_type,
            ExprKind::Lambda(LambdaNode {
                name: name.map(Arc::from),
                parameters: parameters.to_vec().into(),
                body: body.clone(),
                tail_call,
            }),
        ))
    }

    /// Shorthand for an unnamed lambda with an inferred delegate type.
    pub fn lambda_of(body: &Expr, parameters: &[Expr]) -> Result<Expr> {
        Expr::lambda(None, body, parameters, None, false)
    }

    /// Invoke a delegate-typed expression, a lambda included.
    pub fn invoke(expression: &Expr, arguments: &[Expr]) -> Result<Expr> {
        require_readable(expression)?;
        let (params, ret) = expression
            .ty()
            .delegate_signature()
            .ok_or_else(|| Error::ExpressionTypeNotInvocable(expression.ty().clone()))?;
        if params.len() != arguments.len() {
            return Err(Error::IncorrectNumberOfLambdaArguments);
        }
        for (param, arg) in params.iter().zip(arguments) {
            require_readable(arg)?;
            if !types::parameter_is_assignable(param, arg.ty()) {
                return Err(Error::ExpressionTypeDoesNotMatchParameter {
                    expression: arg.ty().clone(),
                    parameter: param.clone(),
                });
            }
        }
        Ok(Expr::new(
            ret.clone(),
            ExprKind::Invoke(InvokeNode {
                expression: expression.clone(),
                arguments: arguments.to_vec().into(),
            }),
        ))
    }

    /// Late-bound operation returning `return_type`; the call-site
    /// delegate is derived from the argument types.
    pub fn dynamic(
        binder: Arc<dyn CallSiteBinder>,
        return_type: &Type,
        arguments: &[Expr],
    ) -> Result<Expr> {
        validate_type(return_type)?;
        for arg in arguments {
            require_readable(arg)?;
            if arg.ty().is_void() {
                return Err(Error::ArgumentCannotBeOfTypeVoid);
            }
        }
        let delegate_type = Type::delegate(
            arguments.iter().map(|a| a.ty().clone()).collect(),
            return_type.clone(),
        );
        Ok(Expr::new(
            return_type.clone(),
            ExprKind::Dynamic(DynamicNode {
                binder,
                delegate_type,
                arguments: arguments.to_vec().into(),
            }),
        ))
    }

    /// Late-bound operation with an explicit call-site delegate type.
    pub fn make_dynamic(
        delegate_type: &Type,
        binder: Arc<dyn CallSiteBinder>,
        arguments: &[Expr],
    ) -> Result<Expr> {
        let (params, ret) = delegate_type
            .delegate_signature()
            .ok_or_else(|| Error::LambdaTypeMustBeDelegate(delegate_type.clone()))?;
        if params.len() != arguments.len() {
            return Err(Error::IncorrectNumberOfLambdaArguments);
        }
        require_readable_all(arguments)?;
        for (param, arg) in params.iter().zip(arguments) {
            if !types::parameter_is_assignable(param, arg.ty()) {
                return Err(Error::ExpressionTypeDoesNotMatchParameter {
                    expression: arg.ty().clone(),
                    parameter: param.clone(),
                });
            }
        }
        Ok(Expr::new(
            ret.clone(),
            ExprKind::Dynamic(DynamicNode {
                binder,
                delegate_type: delegate_type.clone(),
                arguments: arguments.to_vec().into(),
            }),
        ))
    }
}
