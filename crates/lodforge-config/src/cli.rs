//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use lodforge_batch::PackKeyPolicy;
use lodforge_lod::NamingConvention;

use crate::{Config, PipelineMode};

/// lodforge command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "lodforge", about = "Assemble LOD chains and draw batches from glTF scenes")]
pub struct CliArgs {
    /// glTF or GLB files forming one scene.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Pipeline mode.
    #[arg(long, value_enum)]
    pub mode: Option<PipelineMode>,

    /// Primitive naming convention (semicolon, underscore, suffix).
    #[arg(long, value_parser = parse_convention)]
    pub convention: Option<NamingConvention>,

    /// Batch partitioning (material, global).
    #[arg(long, value_parser = parse_pack_key)]
    pub pack_key: Option<PackKeyPolicy>,

    /// Copies placed per LOD chain in instanced mode.
    #[arg(long)]
    pub instances: Option<u32>,

    /// Seed for instanced placements.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write a JSON summary of the run to this file.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Write every loaded vertex in world space to this CSV file.
    #[arg(long)]
    pub export_vertices: Option<PathBuf>,
}

fn parse_convention(value: &str) -> Result<NamingConvention, String> {
    match value.to_ascii_lowercase().as_str() {
        "semicolon" => Ok(NamingConvention::Semicolon),
        "underscore" => Ok(NamingConvention::Underscore),
        "suffix" => Ok(NamingConvention::Suffix),
        other => Err(format!("unknown naming convention '{other}'")),
    }
}

fn parse_pack_key(value: &str) -> Result<PackKeyPolicy, String> {
    match value.to_ascii_lowercase().as_str() {
        "material" | "by-material" => Ok(PackKeyPolicy::ByMaterial),
        "global" => Ok(PackKeyPolicy::Global),
        other => Err(format!("unknown pack key '{other}'")),
    }
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(mode) = args.mode {
            self.pipeline.mode = mode;
        }
        if let Some(convention) = args.convention {
            self.naming.convention = convention;
        }
        if let Some(pack_key) = args.pack_key {
            self.batch.pack_key = pack_key;
        }
        if let Some(instances) = args.instances {
            self.batch.instances = instances;
        }
        if let Some(seed) = args.seed {
            self.batch.seed = seed;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs::parse_from([
            "lodforge",
            "scene.gltf",
            "--mode",
            "instanced-lod",
            "--convention",
            "Underscore",
            "--instances",
            "250",
        ]);
        config.apply_cli_overrides(&args);
        assert_eq!(args.inputs, [PathBuf::from("scene.gltf")]);
        assert_eq!(config.pipeline.mode, PipelineMode::InstancedLod);
        assert_eq!(config.naming.convention, NamingConvention::Underscore);
        assert_eq!(config.batch.instances, 250);
        // Non-overridden fields retain defaults
        assert_eq!(config.batch.pack_key, PackKeyPolicy::ByMaterial);
        assert_eq!(config.batch.seed, 42);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        let args = CliArgs::parse_from(["lodforge", "base.glb", "props.glb"]);
        config.apply_cli_overrides(&args);
        assert_eq!(config, original);
        assert_eq!(args.inputs.len(), 2);
        assert!(args.report.is_none());
        assert!(args.export_vertices.is_none());
    }

    #[test]
    fn test_export_vertices_flag() {
        let args =
            CliArgs::parse_from(["lodforge", "a.glb", "--export-vertices", "out/vertices.csv"]);
        assert_eq!(args.export_vertices, Some(PathBuf::from("out/vertices.csv")));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(CliArgs::try_parse_from(["lodforge", "a.gltf", "--convention", "dots"]).is_err());
        assert!(CliArgs::try_parse_from(["lodforge", "a.gltf", "--pack-key", "mesh"]).is_err());
        assert!(CliArgs::try_parse_from(["lodforge"]).is_err());
    }

    #[test]
    fn test_pack_key_aliases() {
        assert_eq!(parse_pack_key("material"), Ok(PackKeyPolicy::ByMaterial));
        assert_eq!(parse_pack_key("GLOBAL"), Ok(PackKeyPolicy::Global));
    }
}
