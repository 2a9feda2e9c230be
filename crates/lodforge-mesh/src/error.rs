//! Geometry validation errors.

/// Problems with a geometry payload or source hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    /// An optional attribute does not have one entry per vertex.
    #[error("{attribute} has {found} entries but geometry has {expected} vertices")]
    AttributeLengthMismatch {
        attribute: &'static str,
        expected: usize,
        found: usize,
    },

    /// An index refers past the end of the vertex list.
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        position: usize,
        index: u32,
        vertex_count: usize,
    },

    /// The index list does not describe whole triangles.
    #[error("index count {0} is not a multiple of 3")]
    PartialTriangle(usize),

    /// Concatenated geometry would address more vertices than a u32 index can.
    #[error("{0} vertices cannot be addressed by u32 indices")]
    VertexCountOverflow(usize),

    /// A node id that does not belong to this scene graph.
    #[error("scene node {0} does not exist")]
    UnknownNode(usize),
}

/// Failures while writing a vertex export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write vertex CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush vertex CSV: {0}")]
    Io(#[from] std::io::Error),
}
