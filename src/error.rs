//! Typed error kinds for the memory core.
//!
//! Most fallible operations return `anyhow::Result` with context attached at
//! the I/O boundary, the same way `localgpt`'s `memory` and `security`
//! modules do. `MemoryCoreError` exists only for the handful of outcomes a
//! caller may want to match on directly rather than inspect as opaque
//! context strings.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryCoreError {
    #[error("storage directory {0} could not be created")]
    StorageUnavailable(std::path::PathBuf),

    #[error("config file at {0} could not be parsed: {1}")]
    InvalidConfig(std::path::PathBuf, String),
}
