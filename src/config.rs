//! Process-wide tuning knobs.
//!
//! Defaults can be overridden from the environment:
//!
//! - `EXPRTREE_MAX_DEPTH`: traversal depth at which `StackExhausted` is raised
//! - `EXPRTREE_FRESH_STACK_MB`: stack size of the retry thread, in MiB
//! - `EXPRTREE_FRESH_MAX_DEPTH`: depth limit while running on that thread
//!
//! The configuration is read once, on first use, unless [`install`] ran
//! before that.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const MIB: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Nesting depth a traversal may reach on the caller's stack.
    pub max_depth: usize,
    /// Stack size in bytes of the thread a deep traversal is retried on.
    pub fresh_stack_bytes: usize,
    /// Nesting depth allowed on the retry thread.
    pub fresh_max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: 1_000,
            fresh_stack_bytes: 256 * MIB,
            fresh_max_depth: 50_000,
        }
    }
}

static CURRENT: OnceCell<Config> = OnceCell::new();

fn env_usize(name: &str) -> Option<usize> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = name, value = %raw, "ignoring malformed setting");
            None
        }
    }
}

impl Config {
    /// Defaults with any `EXPRTREE_*` overrides applied.
    pub fn from_env() -> Config {
        let mut cfg = Config::default();
        if let Some(v) = env_usize("EXPRTREE_MAX_DEPTH") {
            cfg.max_depth = v;
        }
        if let Some(v) = env_usize("EXPRTREE_FRESH_STACK_MB") {
            cfg.fresh_stack_bytes = v.saturating_mul(MIB);
        }
        if let Some(v) = env_usize("EXPRTREE_FRESH_MAX_DEPTH") {
            cfg.fresh_max_depth = v;
        }
        cfg
    }
}

/// Install `config` for the rest of the process. Returns `false` (and
/// leaves the active configuration alone) if one is already in place.
pub fn install(config: Config) -> bool {
    debug!(?config, "installing configuration");
    CURRENT.set(config).is_ok()
}

/// The active configuration.
pub fn current() -> &'static Config {
    CURRENT.get_or_init(Config::from_env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.max_depth, 1_000);
        assert_eq!(cfg.fresh_stack_bytes, 256 * MIB);
        assert!(cfg.fresh_max_depth > cfg.max_depth);
    }

    #[test]
    fn test_install_after_first_use_is_rejected() {
        let _ = current();
        assert!(!install(Config::default()));
    }
}
