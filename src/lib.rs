//! Immutable expression trees checked against a host type system.
//!
//! Trees are built through validating constructors on [`Expr`], rewritten
//! with a [`Rewriter`] that preserves node identity where nothing changed,
//! and lowered by [`reduce_fully`] into a small core calculus for backends.

pub mod config;
pub mod error;
pub mod factory;
pub mod fingerprint;
pub mod reduce;
pub mod stack;
pub mod tree;
pub mod types;
pub mod visit;

// Re-exports for the common entry points
pub use config::Config;
pub use error::{Error, MemberKind, Result};
pub use fingerprint::{fingerprint, Fingerprint};
pub use reduce::{is_fully_reduced, reduce_fully};
pub use tree::{Expr, ExprKind, NodeType, Value};
pub use types::{Type, TypeBuilder};
pub use visit::{walk, Rewriter, Unchanged, Visitor};
