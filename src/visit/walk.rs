//! Read-only traversal.

use crate::error::Result;
use crate::stack;
use crate::tree::{
    BindingKind, CatchBlock, ElementInit, Expr, ExprKind, LabelTarget, MemberBinding, SwitchCase,
};

/// Observer of a pre-order walk. Children are visited in the same order the
/// rewriter uses.
pub trait Visitor {
    /// Called before the children of `node`. Returning `false` skips them
    /// (`leave` is still called).
    fn enter(&mut self, _node: &Expr) -> Result<bool> {
        Ok(true)
    }

    fn leave(&mut self, _node: &Expr) -> Result<()> {
        Ok(())
    }

    fn label_target(&mut self, _target: &LabelTarget) -> Result<()> {
        Ok(())
    }

    fn switch_case(&mut self, _case: &SwitchCase) -> Result<()> {
        Ok(())
    }

    fn catch_block(&mut self, _handler: &CatchBlock) -> Result<()> {
        Ok(())
    }

    fn element_init(&mut self, _init: &ElementInit) -> Result<()> {
        Ok(())
    }

    fn member_binding(&mut self, _binding: &MemberBinding) -> Result<()> {
        Ok(())
    }
}

/// Walk `node` and its descendants.
pub fn walk<V: Visitor + ?Sized>(v: &mut V, node: &Expr) -> Result<()> {
    let _guard = stack::enter()?;
    if v.enter(node)? {
        children(v, node)?;
    }
    v.leave(node)
}

fn walk_opt<V: Visitor + ?Sized>(v: &mut V, node: Option<&Expr>) -> Result<()> {
    match node {
        Some(n) => walk(v, n),
        None => Ok(()),
    }
}

fn walk_all<V: Visitor + ?Sized>(v: &mut V, nodes: &[Expr]) -> Result<()> {
    nodes.iter().try_for_each(|n| walk(v, n))
}

fn walk_label<V: Visitor + ?Sized>(v: &mut V, target: Option<&LabelTarget>) -> Result<()> {
    match target {
        Some(t) => v.label_target(t),
        None => Ok(()),
    }
}

fn walk_element_init<V: Visitor + ?Sized>(v: &mut V, init: &ElementInit) -> Result<()> {
    v.element_init(init)?;
    walk_all(v, init.arguments())
}

fn walk_binding<V: Visitor + ?Sized>(v: &mut V, binding: &MemberBinding) -> Result<()> {
    v.member_binding(binding)?;
    match binding.kind() {
        BindingKind::Assignment(e) => walk(v, e),
        BindingKind::MemberBindings(bs) => bs.iter().try_for_each(|b| walk_binding(v, b)),
        BindingKind::ListBindings(is) => is.iter().try_for_each(|i| walk_element_init(v, i)),
    }
}

fn children<V: Visitor + ?Sized>(v: &mut V, node: &Expr) -> Result<()> {
    match node.kind() {
        ExprKind::Constant(_)
        | ExprKind::Default
        | ExprKind::Parameter(_)
        | ExprKind::DebugInfo(_) => Ok(()),
        ExprKind::Binary(b) => {
            walk(v, &b.left)?;
            walk_opt(v, b.conversion.as_ref())?;
            walk(v, &b.right)
        }
        ExprKind::Unary(u) => walk_opt(v, u.operand.as_ref()),
        ExprKind::TypeBinary(t) => walk(v, &t.expression),
        ExprKind::Conditional(c) => {
            walk(v, &c.test)?;
            walk(v, &c.if_true)?;
            walk(v, &c.if_false)
        }
        ExprKind::Block(b) => {
            walk_all(v, &b.variables)?;
            walk_all(v, &b.expressions)
        }
        ExprKind::Call(c) => {
            walk_opt(v, c.object.as_ref())?;
            walk_all(v, &c.arguments)
        }
        ExprKind::Member(m) => walk_opt(v, m.expression.as_ref()),
        ExprKind::Index(i) => {
            walk(v, &i.object)?;
            walk_all(v, &i.arguments)
        }
        ExprKind::Invoke(i) => {
            walk(v, &i.expression)?;
            walk_all(v, &i.arguments)
        }
        ExprKind::Lambda(l) => {
            walk_all(v, &l.parameters)?;
            walk(v, &l.body)
        }
        ExprKind::Loop(l) => {
            walk_label(v, l.break_label.as_ref())?;
            walk_label(v, l.continue_label.as_ref())?;
            walk(v, &l.body)
        }
        ExprKind::Goto(g) => {
            v.label_target(&g.target)?;
            walk_opt(v, g.value.as_ref())
        }
        ExprKind::Label(l) => {
            v.label_target(&l.target)?;
            walk_opt(v, l.default_value.as_ref())
        }
        ExprKind::Switch(s) => {
            walk(v, &s.switch_value)?;
            for case in &s.cases {
                v.switch_case(case)?;
                walk_all(v, case.test_values())?;
                walk(v, case.body())?;
            }
            walk_opt(v, s.default_body.as_ref())
        }
        ExprKind::Try(t) => {
            walk(v, &t.body)?;
            for handler in &t.handlers {
                v.catch_block(handler)?;
                walk_opt(v, handler.variable())?;
                walk_opt(v, handler.filter())?;
                walk(v, handler.body())?;
            }
            walk_opt(v, t.finally.as_ref())?;
            walk_opt(v, t.fault.as_ref())
        }
        ExprKind::New(n) => walk_all(v, &n.arguments),
        ExprKind::NewArray(n) => walk_all(v, &n.expressions),
        ExprKind::ListInit(l) => {
            walk(v, &l.new_expression)?;
            l.initializers
                .iter()
                .try_for_each(|i| walk_element_init(v, i))
        }
        ExprKind::MemberInit(m) => {
            walk(v, &m.new_expression)?;
            m.bindings.iter().try_for_each(|b| walk_binding(v, b))
        }
        ExprKind::Dynamic(d) => walk_all(v, &d.arguments),
        ExprKind::RuntimeVariables(r) => walk_all(v, &r.variables),
    }
}
