//! Scene loading and the three pipeline modes.

use std::path::{Path, PathBuf};

use lodforge_assets::GltfSource;
use lodforge_batch::{
    PackKey, ScatterParams, build_consolidated, build_instanced_lod, scatter_placements,
};
use lodforge_config::{Config, PipelineMode};
use lodforge_lod::{GroupReconciler, LodChain};
use lodforge_mesh::{ExportError, MeshSource, Primitive, SceneUnit, write_vertex_csv};
use tracing::{debug, info};

use crate::error::DemoError;
use crate::report::{BatchReport, ChainReport, RunReport, SkippedReport};

/// Loads every input on its own thread and joins them into one scene unit.
pub fn load_scene(inputs: &[PathBuf]) -> Result<Vec<Primitive>, DemoError> {
    let mut unit = SceneUnit::new(inputs.len());

    std::thread::scope(|scope| {
        let loads: Vec<_> = inputs
            .iter()
            .map(|path| (path, scope.spawn(move || GltfSource::from_path(path).primitives())))
            .collect();

        for (path, load) in loads {
            let primitives = load
                .join()
                .map_err(|_| DemoError::LoadPanicked(path.clone()))?
                .map_err(|source| DemoError::Load {
                    path: path.clone(),
                    source,
                })?;
            info!("Loaded {} primitives from {}", primitives.len(), path.display());
            unit.deliver(primitives);
        }
        Ok::<(), DemoError>(())
    })?;

    let pending = unit.pending();
    unit.take_ready().ok_or(DemoError::IncompleteScene { pending })
}

/// Writes the loaded primitives' vertices in world space as CSV.
pub fn export_vertices(primitives: &[Primitive], path: &Path) -> Result<usize, DemoError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(ExportError::Io)?;
    }
    let file = std::fs::File::create(path).map_err(ExportError::Io)?;
    let rows = write_vertex_csv(std::io::BufWriter::new(file), primitives)?;
    info!("Exported {rows} vertices to {}", path.display());
    Ok(rows)
}

pub fn run(config: &Config, primitives: Vec<Primitive>) -> Result<RunReport, DemoError> {
    let mut report = RunReport::new(config.pipeline.mode, primitives.len());
    match config.pipeline.mode {
        PipelineMode::Lod => {
            let chains = assemble(config, primitives, &mut report)?;
            report.chains = chains.iter().map(ChainReport::from).collect();
        }
        PipelineMode::Batch => consolidate(config, primitives, &mut report)?,
        PipelineMode::InstancedLod => {
            let chains = assemble(config, primitives, &mut report)?;
            instance_chains(config, &chains, &mut report)?;
            report.chains = chains.iter().map(ChainReport::from).collect();
        }
    }
    Ok(report)
}

fn assemble(
    config: &Config,
    primitives: Vec<Primitive>,
    report: &mut RunReport,
) -> Result<Vec<LodChain>, DemoError> {
    let assembler = config.assembler()?;
    let mut reconciliation =
        GroupReconciler::new(config.reconcile_options()).reconcile(primitives)?;
    report.skipped = reconciliation.skipped.iter().map(SkippedReport::from).collect();
    reconciliation.skipped.clear();

    let chains = assembler.assemble_all(reconciliation)?;
    debug!(chains = chains.len(), "LOD chains assembled");
    Ok(chains)
}

fn consolidate(
    config: &Config,
    primitives: Vec<Primitive>,
    report: &mut RunReport,
) -> Result<(), DemoError> {
    let partitions = config.planner().partition_by(primitives, config.batch.pack_key)?;
    for partition in partitions {
        let label = match partition.key {
            PackKey::Material(material) => material.to_string(),
            PackKey::Global => "global".to_string(),
        };
        let batch = build_consolidated(partition)?;
        report.batches.push(BatchReport::new(label, batch.chunk, &batch.mesh));
    }
    Ok(())
}

/// Draws each chain as scattered copies; chain `i` uses seed `seed + i`.
fn instance_chains(
    config: &Config,
    chains: &[LodChain],
    report: &mut RunReport,
) -> Result<(), DemoError> {
    let params = config.scatter_params();
    for (index, chain) in chains.iter().enumerate() {
        let placements = scatter_placements(&ScatterParams {
            seed: params.seed.wrapping_add(index as u64),
            ..params
        })?;
        let mesh = build_instanced_lod(chain, &placements)?;
        report.batches.push(BatchReport::new(chain.key().to_string(), 0, &mesh));
    }
    Ok(())
}
