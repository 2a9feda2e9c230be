//! Draw-call batching: capacity planning per pack key and fixed-capacity
//! batched meshes holding many geometries and placed instances.
//!
//! Planning and building are two phases. [`BatchPlanner`] computes exact
//! vertex, index and instance totals per partition; [`BatchBuilder`] allocates
//! a [`BatchedMesh`] once at those capacities and appends into it. The arena
//! never grows, so an append past capacity is a planner/builder contract
//! violation reported as [`CapacityExceeded`].

mod batched_mesh;
mod builder;
mod error;
mod key;
mod plan;
mod scatter;

pub use batched_mesh::{
    BatchedMesh, Capacity, GeometryId, GeometryRange, GeometrySlot, InstanceId, InstanceSlot,
    InstancedDraw,
};
pub use builder::{
    BatchBuilder, BatchEntry, ConsolidatedBatch, build_consolidated, build_instanced_lod,
};
pub use error::{BatchError, CapacityExceeded, PlanError, Resource, ScatterError};
pub use key::{PackKey, PackKeyPolicy};
pub use plan::{BatchBudget, BatchPlan, BatchPlanner, Partition};
pub use scatter::{ScatterParams, scatter_placements};
