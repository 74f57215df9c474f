//! Lowering of sugar node kinds into the core calculus.
//!
//! A reducible node rewrites into an equivalent tree of simpler kinds:
//!
//! - compound assignment and pre/post increment over variables, members and
//!   indexers (`assign`, `increment`);
//! - lifted user-defined `&&` / `||` (`logical`);
//! - coalesce through a conversion lambda (`coalesce`);
//! - exact runtime type tests (`type_equal`);
//! - member and list initializers (`init`).
//!
//! Lowerings evaluate every operand that could have side effects exactly
//! once, spilling it into a block-scoped temporary when the lowered form
//! needs its value more than once. The result of [`Expr::reduce`] is cached
//! on the node.

mod assign;
mod coalesce;
mod increment;
mod init;
mod logical;
mod type_equal;
#[cfg(test)]
mod tests;

use tracing::trace;

use crate::error::{Error, Result};
use crate::stack;
use crate::tree::{Expr, ExprKind, NodeType};
use crate::types;
use crate::visit::{dispatch, walk, Rewriter, Visitor};

// ─── Classification ────────────────────────────────────────────────

impl Expr {
    /// True for the sugar kinds that have a lowering.
    pub fn can_reduce(&self) -> bool {
        match self.kind() {
            ExprKind::Binary(b) => {
                b.op.is_op_assignment()
                    || (b.op == NodeType::Coalesce && b.conversion.is_some())
                    || (matches!(b.op, NodeType::AndAlso | NodeType::OrElse)
                        && b.method.is_some()
                        && self.is_lifted())
            }
            ExprKind::Unary(u) => u.op.is_increment_assign(),
            ExprKind::TypeBinary(t) => t.op == NodeType::TypeEqual,
            ExprKind::ListInit(_) | ExprKind::MemberInit(_) => true,
            _ => false,
        }
    }

    /// One lowering step. A node that cannot reduce returns itself.
    ///
    /// The result is computed once per node; concurrent first calls may
    /// each lower the node, and all but the first stored result are
    /// dropped.
    pub fn reduce(&self) -> Result<Expr> {
        if !self.can_reduce() {
            return Ok(self.clone());
        }
        let cell = self.reduced_cell();
        if let Some(done) = cell.get() {
            return Ok(done.clone());
        }
        let lowered = lower(self)?;
        Ok(cell.get_or_init(|| lowered).clone())
    }

    /// [`reduce`](Expr::reduce), insisting that the node was reducible and
    /// that the result is a different node of a compatible type.
    pub fn reduce_and_check(&self) -> Result<Expr> {
        if !self.can_reduce() {
            return Err(Error::MustBeReducible(self.node_type()));
        }
        let reduced = self.reduce()?;
        if Expr::ptr_eq(&reduced, self) {
            return Err(Error::MustReduceToDifferent(self.node_type()));
        }
        if !types::are_reference_assignable(self.ty(), reduced.ty()) {
            return Err(Error::ReducedNotCompatible {
                before: self.ty().clone(),
                after: reduced.ty().clone(),
            });
        }
        Ok(reduced)
    }
}

fn lower(node: &Expr) -> Result<Expr> {
    trace!(kind = ?node.node_type(), "lowering");
    match node.kind() {
        ExprKind::Binary(b) if b.op.is_op_assignment() => assign::lower(b),
        ExprKind::Binary(b) if b.op == NodeType::Coalesce => coalesce::lower(node, b),
        ExprKind::Binary(b) => logical::lower(node, b),
        ExprKind::Unary(u) => increment::lower(u),
        ExprKind::TypeBinary(t) => type_equal::lower(t),
        ExprKind::MemberInit(m) => init::lower_member_init(m),
        ExprKind::ListInit(l) => init::lower_list_init(l),
        _ => Ok(node.clone()),
    }
}

// ─── Whole trees ───────────────────────────────────────────────────

/// Rewriter that replaces every reducible node by its lowering, repeatedly,
/// and then lowers inside the result.
struct Lowering;

impl Rewriter for Lowering {
    fn visit(&mut self, node: &Expr) -> Result<Expr> {
        let _guard = stack::enter()?;
        if node.can_reduce() {
            let reduced = node.reduce_and_check()?;
            return self.visit(&reduced);
        }
        dispatch(self, node)
    }
}

/// Lower `node` until no reducible node is left anywhere in the tree.
///
/// A tree too deep for the caller's stack is retried once on a dedicated
/// thread (see [`stack::retry_on_fresh_stack`]).
pub fn reduce_fully(node: &Expr) -> Result<Expr> {
    stack::retry_on_fresh_stack(|| Lowering.visit(node))
}

struct FindReducible(bool);

impl Visitor for FindReducible {
    fn enter(&mut self, node: &Expr) -> Result<bool> {
        if node.can_reduce() {
            self.0 = true;
        }
        Ok(!self.0)
    }
}

/// True when no node of the tree reports itself reducible.
pub fn is_fully_reduced(node: &Expr) -> Result<bool> {
    stack::retry_on_fresh_stack(|| {
        let mut finder = FindReducible(false);
        walk(&mut finder, node)?;
        Ok(!finder.0)
    })
}
