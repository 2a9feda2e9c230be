//! Command-line driver: loads glTF scenes, then assembles LOD chains, builds
//! consolidated batches, or scatters instanced LOD batches.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p lodforge-demo -- scene.gltf --mode batch`.

mod error;
mod pipeline;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use lodforge_config::{CliArgs, Config};
use tracing::{error, info};

use crate::error::DemoError;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args
        .config
        .clone()
        .or_else(|| Config::default_dir().ok())
        .unwrap_or_else(|| PathBuf::from(".lodforge"));

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    lodforge_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs, config: &Config) -> Result<(), DemoError> {
    info!(
        inputs = args.inputs.len(),
        mode = ?config.pipeline.mode,
        convention = ?config.naming.convention,
        "starting"
    );

    let primitives = pipeline::load_scene(&args.inputs)?;
    if let Some(path) = &args.export_vertices {
        pipeline::export_vertices(&primitives, path)?;
    }
    let report = pipeline::run(config, primitives)?;
    report.log_summary();

    if let Some(path) = &args.report {
        report.write(path)?;
    }
    Ok(())
}
