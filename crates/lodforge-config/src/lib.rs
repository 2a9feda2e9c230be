//! Configuration for the lodforge pipeline.
//!
//! Settings persist to disk as RON. Every section uses `#[serde(default)]`,
//! so older or partial files keep loading as fields are added. CLI arguments
//! override whatever was loaded.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    BatchConfig, Config, DebugConfig, LodConfig, NamingConfig, PipelineConfig, PipelineMode,
};
pub use error::ConfigError;
