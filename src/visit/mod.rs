//! Traversal of expression trees.
//!
//! [`Rewriter`] produces a new tree. Each node kind has its own handler with
//! a default that rewrites the children and rebuilds the node through the
//! validating constructors, so an implementation overrides only the kinds
//! it cares about. A node whose children all come back identical is
//! returned as is; nothing is reallocated on a no-op pass.
//!
//! [`Visitor`] is the read-only counterpart for printers and analyses.
//!
//! Both hold a depth guard per level (see [`crate::stack`]).

mod rewrite;
mod walk;

pub use rewrite::*;
pub use walk::{walk, Visitor};
