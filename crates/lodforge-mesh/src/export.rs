//! World-space vertex export as CSV (`Name, Vertex_Index, X, Y, Z`).

use std::io;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{ExportError, Primitive};

/// One vertex of a primitive, transformed by its world matrix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Vertex_Index")]
    pub vertex_index: u64,
    #[serde(rename = "X")]
    pub x: f32,
    #[serde(rename = "Y")]
    pub y: f32,
    #[serde(rename = "Z")]
    pub z: f32,
}

/// World-space vertices of `primitive`, numbered from `first_index`.
pub fn world_vertices(
    primitive: &Primitive,
    first_index: u64,
) -> impl Iterator<Item = VertexRecord> + '_ {
    primitive
        .geometry
        .positions()
        .iter()
        .zip(first_index..)
        .map(|(position, vertex_index)| {
            let world = primitive.world.transform_point3(Vec3::from(*position));
            VertexRecord {
                name: primitive.name.clone(),
                vertex_index,
                x: world.x,
                y: world.y,
                z: world.z,
            }
        })
}

/// Writes every vertex of `primitives` with a header row and returns the
/// number of vertex rows. Parts of one node continue its vertex numbering.
pub fn write_vertex_csv<W: io::Write>(
    writer: W,
    primitives: &[Primitive],
) -> Result<usize, ExportError> {
    let mut out = csv::Writer::from_writer(writer);
    let mut rows = 0;
    let mut next_index = 0;
    for primitive in primitives {
        if primitive.part == 0 {
            next_index = 0;
        }
        for record in world_vertices(primitive, next_index) {
            out.serialize(&record)?;
            rows += 1;
        }
        next_index += primitive.vertex_count() as u64;
    }
    out.flush()?;
    tracing::debug!(primitives = primitives.len(), rows, "exported world-space vertices");
    Ok(rows)
}
