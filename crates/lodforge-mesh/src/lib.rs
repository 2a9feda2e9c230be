//! Mesh primitives as produced by an asset loader: geometry payloads, materials,
//! source hierarchies flattened to world space, and the join point for scene units
//! assembled from several loads, plus a world-space vertex export.

mod error;
mod export;
mod geometry;
mod hierarchy;
mod primitive;
mod source;
mod unit;

pub use error::{ExportError, MeshError};
pub use export::{VertexRecord, world_vertices, write_vertex_csv};
pub use geometry::{Geometry, VertexLayout};
pub use hierarchy::{NodeId, SceneGraph, SceneNode};
pub use primitive::{MaterialId, Primitive};
pub use source::MeshSource;
pub use unit::SceneUnit;
