//! Configuration structs with defaults and RON persistence.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use lodforge_batch::{BatchBudget, BatchPlanner, PackKeyPolicy, ScatterParams};
use lodforge_lod::{
    AssemblyError, LodAssembler, MalformedPolicy, MissingTierPolicy, NamingConvention,
    ReconcileOptions, SwitchDistances,
};
use lodforge_math::ShearPolicy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub naming: NamingConfig,
    pub lod: LodConfig,
    pub batch: BatchConfig,
    pub pipeline: PipelineConfig,
    pub debug: DebugConfig,
}

/// How primitive names encode group and tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NamingConfig {
    pub convention: NamingConvention,
}

/// LOD chain assembly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodConfig {
    /// Viewer distance at which each tier takes over.
    pub distances: SwitchDistances,
    /// What to do with groups that lack a hires member.
    pub missing_tier: MissingTierPolicy,
}

/// Batch planning and the instanced scatter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    pub pack_key: PackKeyPolicy,
    /// Per-batch limits; `None` puts each pack key in a single batch.
    pub budget: Option<BatchBudget>,
    /// Copies placed per LOD chain in instanced mode.
    pub instances: u32,
    /// Seed for instanced placements.
    pub seed: u64,
    /// Half side length of the square the copies are scattered over.
    pub scatter_extent: f32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pack_key: PackKeyPolicy::default(),
            budget: None,
            instances: 100,
            seed: 42,
            scatter_extent: 50.0,
        }
    }
}

/// What the pipeline produces from the loaded primitives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum PipelineMode {
    /// Reconcile tiers and assemble LOD chains.
    #[default]
    Lod,
    /// Consolidate primitives into batched meshes.
    Batch,
    /// Assemble LOD chains, then draw each as many scattered instances.
    InstancedLod,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub mode: PipelineMode,
    /// Abort on a malformed primitive name, or skip it with a warning.
    pub malformed: MalformedPolicy,
    /// How sheared hires transforms are handled.
    pub shear: ShearPolicy,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Component settings ---

impl Config {
    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            convention: self.naming.convention,
            missing_tier: self.lod.missing_tier,
            malformed: self.pipeline.malformed,
            shear: self.pipeline.shear,
        }
    }

    /// Fails when the configured switch distances are not strictly increasing.
    pub fn assembler(&self) -> Result<LodAssembler, AssemblyError> {
        LodAssembler::new(self.lod.distances)
    }

    pub fn planner(&self) -> BatchPlanner {
        BatchPlanner::new().with_budget(self.batch.budget)
    }

    pub fn scatter_params(&self) -> ScatterParams {
        ScatterParams {
            count: self.batch.instances,
            extent: self.batch.scatter_extent,
            seed: self.batch.seed,
            ..ScatterParams::default()
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Per-user configuration directory, e.g. `~/.config/lodforge`.
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("lodforge"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read_file(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path,
            source,
        })
    }

    /// Returns `Some(new_config)` if the file on disk differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read_file(&config_dir.join(CONFIG_FILE))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
