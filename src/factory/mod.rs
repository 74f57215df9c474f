//! Validating constructors, one family per node kind.
//!
//! Every constructor either returns a fully typed node or an [`Error`]
//! naming the exact rule that failed; there is no partially valid node.
//! The constructors live on `impl Expr` and are split by area:
//!
//! - `leaf`: constants, parameters, variables, defaults
//! - `binary`: arithmetic, comparison, logic, coalesce, assignment
//! - `unary`: unary operators, conversions, increments, throw, type tests
//! - `control`: conditional, block, loop, goto/label, switch, try, debug info
//! - `member`: fields, properties, calls, indexers, object and array creation,
//!   initializers
//! - `lambda`: lambdas, invocation, dynamic calls

mod binary;
mod control;
mod lambda;
mod leaf;
mod member;
mod unary;
#[cfg(test)]
mod tests;

use crate::error::{Error, MemberKind, Result};
use crate::tree::{Expr, ExprKind};
use crate::types::{self, Member, Method, Type};

// ─── Readability / writability ─────────────────────────────────────

/// Reject operands that cannot be read: write-only properties and
/// indexers.
pub(crate) fn require_readable(e: &Expr) -> Result<()> {
    let readable = match e.kind() {
        ExprKind::Index(i) => i.indexer.as_ref().map_or(true, |p| p.can_read()),
        ExprKind::Member(m) => m.member.can_read(),
        _ => true,
    };
    if readable {
        Ok(())
    } else {
        Err(Error::ExpressionMustBeReadable)
    }
}

/// Only variables, writable fields and properties, and indexers with a
/// setter can be assigned.
pub(crate) fn require_writable(e: &Expr) -> Result<()> {
    let writable = match e.kind() {
        ExprKind::Parameter(_) => true,
        ExprKind::Index(i) => i.indexer.as_ref().map_or(true, |p| p.can_write()),
        ExprKind::Member(m) => m.member.can_write(),
        _ => false,
    };
    if writable {
        Ok(())
    } else {
        Err(Error::ExpressionMustBeWritable)
    }
}

pub(crate) fn require_readable_all(items: &[Expr]) -> Result<()> {
    items.iter().try_for_each(require_readable)
}

// ─── Types ─────────────────────────────────────────────────────────

/// Node result types may not be by-ref.
pub(crate) fn validate_type(ty: &Type) -> Result<()> {
    if ty.is_by_ref() {
        return Err(Error::TypeMustNotBeByRef(ty.clone()));
    }
    Ok(())
}

// ─── Arguments ─────────────────────────────────────────────────────

/// Validate one argument against a method parameter type.
pub(crate) fn validate_method_argument(arg: &Expr, param: &Type, method: &Method) -> Result<()> {
    require_readable(arg)?;
    if !types::parameter_is_assignable(param, arg.ty()) {
        return Err(Error::ExpressionTypeDoesNotMatchMethodParameter {
            expression: arg.ty().clone(),
            parameter: param.clone(),
            method: method.name().to_string(),
        });
    }
    Ok(())
}

pub(crate) fn validate_method_arguments(method: &Method, args: &[Expr]) -> Result<()> {
    if method.params().len() != args.len() {
        return Err(Error::IncorrectNumberOfMethodCallArguments(
            method.name().to_string(),
        ));
    }
    method
        .params()
        .iter()
        .zip(args)
        .try_for_each(|(p, a)| validate_method_argument(a, p, method))
}

/// Arguments are accepted by `params` without boxing.
pub(crate) fn arguments_match(params: &[Type], args: &[Type]) -> bool {
    params.len() == args.len()
        && params
            .iter()
            .zip(args)
            .all(|(p, a)| types::parameter_is_assignable(p, a))
}

// ─── Instances ─────────────────────────────────────────────────────

/// Static members take no instance; instance members require a readable
/// one of a compatible type.
pub(crate) fn validate_instance(
    instance: Option<&Expr>,
    is_static: bool,
    declaring: &Type,
    member_name: &str,
) -> Result<()> {
    match (instance, is_static) {
        (Some(_), true) => Err(Error::StaticMemberWithInstance(member_name.to_string())),
        (None, false) => Err(Error::InstanceMemberWithoutInstance(
            member_name.to_string(),
        )),
        (None, true) => Ok(()),
        (Some(i), false) => {
            require_readable(i)?;
            if types::is_valid_instance_type(declaring, i.ty()) {
                Ok(())
            } else {
                Err(Error::InstanceAndMemberTypeMismatch {
                    member: member_name.to_string(),
                    instance: i.ty().clone(),
                })
            }
        }
    }
}

// ─── Name lookup ───────────────────────────────────────────────────

/// Require exactly one candidate: none is "not found", several is
/// "ambiguous".
pub(crate) fn single_match<T>(
    mut candidates: Vec<T>,
    kind: MemberKind,
    name: &str,
    ty: &Type,
) -> Result<T> {
    match candidates.len() {
        0 => Err(Error::MemberNotFound {
            kind,
            name: name.to_string(),
            ty: ty.clone(),
        }),
        1 => Ok(candidates.remove(0)),
        _ => Err(Error::AmbiguousMatch {
            kind,
            name: name.to_string(),
            ty: ty.clone(),
        }),
    }
}

/// Case-insensitive name comparison, folding by Unicode lowercase mapping.
pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Members named `name` (case-insensitive) on `ty` or its bases, with the
/// static flag filter applied.
pub(crate) fn members_named(ty: &Type, name: &str, want_static: Option<bool>) -> Vec<Member> {
    let keep = |s: bool| want_static.map_or(true, |w| w == s);
    let mut out = Vec::new();
    for t in ty.ancestry() {
        out.extend(
            t.fields()
                .iter()
                .filter(|f| same_name(f.name(), name) && keep(f.is_static()))
                .cloned()
                .map(Member::Field),
        );
        out.extend(
            t.properties()
                .iter()
                .filter(|p| !p.is_indexer() && same_name(p.name(), name) && keep(p.is_static()))
                .cloned()
                .map(Member::Property),
        );
    }
    out
}

/// Methods named `name` (case-insensitive) on `ty` or its bases whose
/// parameters accept `args`.
pub(crate) fn methods_named(
    ty: &Type,
    name: &str,
    args: &[Type],
    want_static: bool,
) -> Vec<Method> {
    ty.ancestry()
        .flat_map(|t| t.methods().to_vec())
        .filter(|m| {
            m.is_static() == want_static
                && same_name(m.name(), name)
                && arguments_match(m.params(), args)
        })
        .collect()
}
