//! Planning and building errors.

use std::fmt;

use lodforge_mesh::MeshError;

use crate::{GeometryId, InstanceId};

/// Failures while partitioning primitives into batch plans.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// A partition ended up with nothing to draw.
    #[error("partition {key} has no primitives")]
    EmptyPartition { key: String },

    /// One primitive alone is larger than the configured batch budget.
    #[error("primitive '{name}' ({vertices} vertices, {indices} indices) exceeds the budget")]
    GeometryExceedsBudget {
        name: String,
        vertices: u32,
        indices: u32,
    },

    #[error("batch totals overflow u32")]
    CountOverflow,
}

/// A fixed-capacity arena resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Vertices,
    Indices,
    Instances,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Vertices => "vertices",
            Resource::Indices => "indices",
            Resource::Instances => "instances",
        })
    }
}

/// An append that would overrun the capacity fixed at construction.
///
/// Always a planner/builder desynchronisation, never a normal runtime
/// condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("batch capacity exceeded: {requested} {resource} requested, {available} available")]
pub struct CapacityExceeded {
    pub resource: Resource,
    pub requested: u32,
    pub available: u32,
}

/// Scatter parameters that cannot produce placements.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ScatterError {
    #[error("scatter extent {0} is not a usable half width")]
    InvalidExtent(f32),

    #[error("scatter scale range {min}..{max} must be finite and positive")]
    InvalidScale { min: f32, max: f32 },
}

/// Failures while appending to a batched mesh.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BatchError {
    #[error(transparent)]
    CapacityExceeded(#[from] CapacityExceeded),

    #[error("geometry {0:?} is not registered in this batch")]
    UnknownGeometry(GeometryId),

    #[error("instance {0:?} does not exist in this batch")]
    UnknownInstance(InstanceId),

    /// LOD switch distances of one geometry slot must increase strictly.
    #[error("LOD distance {distance} for geometry {geometry:?} must be greater than {previous}")]
    LodDistanceOrder {
        geometry: GeometryId,
        distance: f32,
        previous: f32,
    },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(#[from] MeshError),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl BatchError {
    /// True for capacity overruns, which indicate a programming error rather than bad input.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, BatchError::CapacityExceeded(_))
    }
}
