//! The node model.
//!
//! Every tree element is an [`Expr`]: a shared handle to an immutable node
//! with a kind tag, a result type and ordered children. Nodes are built only
//! through the validating constructors in [`crate::factory`], so a node that
//! exists has already passed every typing rule of its kind.
//!
//! Children are held in [`NodeList`]s materialised at construction. Each
//! node also owns a write-once cache for its lowered form (see
//! [`crate::reduce`]).

mod debug;
mod nodes;
mod support;
#[cfg(test)]
mod tests;

pub use nodes::*;
pub use support::*;
