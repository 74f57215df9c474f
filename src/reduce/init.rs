//! Member and list initializers become a block that creates the object into
//! a temporary and then applies each binding or `Add` call to it.

use crate::error::Result;
use crate::tree::{BindingKind, ElementInit, Expr, ListInitNode, MemberBinding, MemberInitNode};

pub(super) fn lower_member_init(m: &MemberInitNode) -> Result<Expr> {
    apply_bindings(&m.new_expression, &m.bindings, true)
}

pub(super) fn lower_list_init(l: &ListInitNode) -> Result<Expr> {
    apply_adds(&l.new_expression, &l.initializers, true)
}

/// `{ t = target; t.M1 = ..; t.M2 = ..; t }`, or ending in `default(void)`
/// when the value is not needed.
fn apply_bindings(target: &Expr, bindings: &[MemberBinding], keep: bool) -> Result<Expr> {
    let temp = Expr::temp(target.ty());
    let mut body = Vec::with_capacity(bindings.len() + 2);
    body.push(Expr::assign(&temp, target)?);
    for binding in bindings {
        body.push(apply_binding(&temp, binding)?);
    }
    body.push(if keep { temp.clone() } else { Expr::empty() });
    Expr::block_with(&[temp], &body)
}

fn apply_adds(target: &Expr, initializers: &[ElementInit], keep: bool) -> Result<Expr> {
    let temp = Expr::temp(target.ty());
    let mut body = Vec::with_capacity(initializers.len() + 2);
    body.push(Expr::assign(&temp, target)?);
    for init in initializers {
        body.push(Expr::call(Some(&temp), init.add_method(), init.arguments())?);
    }
    body.push(if keep { temp.clone() } else { Expr::empty() });
    Expr::block_with(&[temp], &body)
}

fn apply_binding(object: &Expr, binding: &MemberBinding) -> Result<Expr> {
    let member = binding.member();
    let receiver = (!member.is_static()).then_some(object);
    let access = Expr::make_member_access(receiver, member)?;
    match binding.kind() {
        BindingKind::Assignment(value) => Expr::assign(&access, value),
        BindingKind::MemberBindings(nested) => apply_bindings(&access, nested, false),
        BindingKind::ListBindings(inits) => apply_adds(&access, inits, false),
    }
}
