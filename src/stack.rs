//! Recursion-depth guard for traversals.
//!
//! Every recursive step of the rewriter and visitor holds a [`DepthGuard`].
//! Going past the limit fails with `StackExhausted` instead of overflowing
//! the native stack. [`retry_on_fresh_stack`] reruns such a failure on a
//! dedicated thread with a much larger stack.

use std::cell::Cell;
use std::panic;
use std::thread;

use tracing::debug;

use crate::config;
use crate::error::{Error, Result};

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    static LIMIT: Cell<Option<usize>> = const { Cell::new(None) };
}

/// One level of traversal; released on drop.
#[must_use]
pub struct DepthGuard(());

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Current nesting depth on this thread.
pub fn depth() -> usize {
    DEPTH.with(Cell::get)
}

/// Depth limit in force on this thread.
pub fn max_depth() -> usize {
    LIMIT
        .with(Cell::get)
        .unwrap_or_else(|| config::current().max_depth)
}

/// Descend one level.
pub fn enter() -> Result<DepthGuard> {
    let limit = max_depth();
    DEPTH.with(|d| {
        let depth = d.get();
        if depth >= limit {
            return Err(Error::StackExhausted { depth });
        }
        d.set(depth + 1);
        Ok(DepthGuard(()))
    })
}

/// Run `f` with the depth limit of this thread set to `limit`.
pub fn with_max_depth<R>(limit: usize, f: impl FnOnce() -> R) -> R {
    struct Restore(Option<usize>);

    impl Drop for Restore {
        fn drop(&mut self) {
            LIMIT.with(|l| l.set(self.0));
        }
    }

    let _restore = Restore(LIMIT.with(|l| l.replace(Some(limit))));
    f()
}

/// Run `f`; if it runs out of depth at the outermost level, run it again on
/// a fresh thread with the configured larger stack and depth limit.
///
/// Nested calls pass `StackExhausted` through so that only the outermost
/// traversal retries.
pub fn retry_on_fresh_stack<T, F>(f: F) -> Result<T>
where
    T: Send,
    F: Fn() -> Result<T> + Sync,
{
    match f() {
        Err(e) if e.is_stack_exhausted() && depth() == 0 => {
            let cfg = config::current();
            debug!(
                stack_bytes = cfg.fresh_stack_bytes,
                max_depth = cfg.fresh_max_depth,
                "retrying deep traversal on a fresh stack"
            );
            thread::scope(|scope| {
                let handle = thread::Builder::new()
                    .name("exprtree-deep".to_string())
                    .stack_size(cfg.fresh_stack_bytes)
                    .spawn_scoped(scope, || with_max_depth(cfg.fresh_max_depth, &f))
                    .map_err(|e| Error::FreshStackUnavailable(e.to_string()))?;
                match handle.join() {
                    Ok(result) => result,
                    Err(payload) => panic::resume_unwind(payload),
                }
            })
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nest(levels: usize) -> Result<usize> {
        let _g = enter()?;
        if levels == 0 {
            Ok(depth())
        } else {
            nest(levels - 1)
        }
    }

    #[test]
    fn test_guard_tracks_depth() {
        assert_eq!(depth(), 0);
        {
            let _a = enter().unwrap();
            let _b = enter().unwrap();
            assert_eq!(depth(), 2);
        }
        assert_eq!(depth(), 0);
    }

    #[test]
    fn test_limit_raises_stack_exhausted() {
        let err = with_max_depth(10, || nest(20)).unwrap_err();
        assert_eq!(err, Error::StackExhausted { depth: 10 });
        assert_eq!(depth(), 0);
        assert_eq!(with_max_depth(10, || nest(5)).unwrap(), 6);
    }

    #[test]
    fn test_override_is_restored() {
        let before = max_depth();
        with_max_depth(3, || assert_eq!(max_depth(), 3));
        assert_eq!(max_depth(), before);
    }

    #[test]
    fn test_fresh_stack_retry() {
        let levels = config::current().max_depth + 10;
        let reached = retry_on_fresh_stack(|| nest(levels)).unwrap();
        assert_eq!(reached, levels + 1);
    }
}
