//! Run summary, logged at the end and optionally written as JSON.

use std::path::Path;

use glam::Vec3;
use lodforge_batch::BatchedMesh;
use lodforge_config::PipelineMode;
use lodforge_lod::{LodChain, SkippedPrimitive, TierLabel};
use serde::Serialize;
use tracing::info;

use crate::error::DemoError;

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub mode: PipelineMode,
    pub primitives: usize,
    pub skipped: Vec<SkippedReport>,
    pub chains: Vec<ChainReport>,
    pub batches: Vec<BatchReport>,
}

#[derive(Debug, Serialize)]
pub struct SkippedReport {
    pub name: String,
    pub reason: String,
}

impl From<&SkippedPrimitive> for SkippedReport {
    fn from(skipped: &SkippedPrimitive) -> Self {
        Self {
            name: skipped.name.clone(),
            reason: skipped.reason.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChainReport {
    pub key: String,
    pub levels: Vec<LevelReport>,
}

#[derive(Debug, Serialize)]
pub struct LevelReport {
    pub tier: TierLabel,
    pub name: String,
    pub switch_distance: f32,
    pub parts: usize,
    pub vertices: usize,
}

impl From<&LodChain> for ChainReport {
    fn from(chain: &LodChain) -> Self {
        Self {
            key: chain.key().to_string(),
            levels: chain
                .levels()
                .iter()
                .map(|level| LevelReport {
                    tier: level.tier,
                    name: level.name().to_string(),
                    switch_distance: level.switch_distance,
                    parts: level.primitives.len(),
                    vertices: level.vertex_count(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub label: String,
    pub chunk: u32,
    pub geometries: usize,
    pub instances: u32,
    pub vertices: u32,
    pub indices: u32,
    /// Instanced draws needed with the viewer at the origin.
    pub draw_calls: usize,
}

impl BatchReport {
    pub fn new(label: impl Into<String>, chunk: u32, mesh: &BatchedMesh) -> Self {
        Self {
            label: label.into(),
            chunk,
            geometries: mesh.geometry_count(),
            instances: mesh.instance_count(),
            vertices: mesh.vertex_count(),
            indices: mesh.index_count(),
            draw_calls: mesh.draw_list(Vec3::ZERO).len(),
        }
    }
}

impl RunReport {
    pub fn new(mode: PipelineMode, primitives: usize) -> Self {
        Self {
            mode,
            primitives,
            skipped: Vec::new(),
            chains: Vec::new(),
            batches: Vec::new(),
        }
    }

    pub fn log_summary(&self) {
        info!(
            mode = ?self.mode,
            primitives = self.primitives,
            skipped = self.skipped.len(),
            chains = self.chains.len(),
            batches = self.batches.len(),
            "run complete"
        );
        for chain in &self.chains {
            let tiers: Vec<String> = chain.levels.iter().map(|l| l.tier.to_string()).collect();
            info!("  chain {}: {}", chain.key, tiers.join(" -> "));
        }
        for batch in &self.batches {
            info!(
                "  batch {}#{}: {} geometries, {} instances, {} vertices, {} indices, {} draws",
                batch.label,
                batch.chunk,
                batch.geometries,
                batch.instances,
                batch.vertices,
                batch.indices,
                batch.draw_calls
            );
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), DemoError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(DemoError::Report)?;
        }
        let file = std::fs::File::create(path).map_err(DemoError::Report)?;
        serde_json::to_writer_pretty(file, self)?;
        info!("Report written to {}", path.display());
        Ok(())
    }
}
