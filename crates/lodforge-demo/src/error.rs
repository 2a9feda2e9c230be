use std::path::PathBuf;

use lodforge_assets::AssetError;
use lodforge_batch::{BatchError, PlanError, ScatterError};
use lodforge_lod::{AssemblyError, ReconcileError};
use lodforge_mesh::ExportError;

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("failed to load {}: {source}", path.display())]
    Load { path: PathBuf, source: AssetError },

    #[error("loader thread for {} panicked", .0.display())]
    LoadPanicked(PathBuf),

    #[error("scene incomplete: {pending} load(s) never arrived")]
    IncompleteScene { pending: usize },

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("invalid scatter settings: {0}")]
    Scatter(#[from] ScatterError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("failed to write report: {0}")]
    Report(#[source] std::io::Error),

    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}
