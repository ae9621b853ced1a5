//! XDG Base Directory Specification compliant path resolution.
//!
//! Every directory is resolved through a two-level fallback:
//! 1. A memoryctx-specific env var (`MEMORYCTX_STORAGE_DIR`, `MEMORYCTX_CONFIG_DIR`)
//! 2. The platform default via `etcetera`
//!
//! All paths are absolute.

use anyhow::Result;
use std::path::PathBuf;

/// Resolved directory paths for the memory core.
///
/// Created once at startup and threaded through `Config`.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Config directory: `config.toml` lives here.
    pub config_dir: PathBuf,

    /// Storage directory: `observations.md` and `audit.jsonl` live here.
    pub storage_dir: PathBuf,
}

impl Paths {
    /// Resolve all paths using real environment variables.
    pub fn resolve() -> Result<Self> {
        Self::resolve_with_env(|key| std::env::var(key))
    }

    /// Resolve paths with a custom env var lookup (for testing).
    pub fn resolve_with_env<F>(env_fn: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
    {
        use etcetera::BaseStrategy;

        let strategy = etcetera::choose_base_strategy()
            .map_err(|e| anyhow::anyhow!("Failed to determine base directories: {}", e))?;

        let config_dir = env_or(&env_fn, "MEMORYCTX_CONFIG_DIR", || {
            strategy.config_dir().join("memoryctx")
        });

        let storage_dir = env_or(&env_fn, "MEMORYCTX_STORAGE_DIR", || {
            strategy.data_dir().join("memoryctx")
        });

        Ok(Self {
            config_dir,
            storage_dir,
        })
    }
}

fn env_or<F>(env_fn: &F, key: &str, default: impl FnOnce() -> PathBuf) -> PathBuf
where
    F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
{
    match env_fn(key) {
        Ok(val) if !val.is_empty() => PathBuf::from(val),
        _ => default(),
    }
}
