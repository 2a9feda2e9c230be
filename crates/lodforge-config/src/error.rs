//! Configuration error types.

use std::path::PathBuf;

/// Errors from loading, saving or locating `config.ron`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config directory or file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid RON or does not match the pipeline settings.
    #[error("invalid pipeline settings in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    /// The in-memory settings could not be encoded as RON.
    #[error("failed to encode pipeline settings: {0}")]
    Serialize(#[source] ron::Error),

    /// No per-user configuration directory exists on this platform.
    #[error("no configuration directory available")]
    NoConfigDir,
}
