//! Asset loading errors.

use lodforge_mesh::MeshError;

/// Errors raised while turning an asset into primitives.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The glTF importer rejected the file or its buffers.
    #[error("failed to import glTF: {0}")]
    Import(#[from] gltf::Error),

    /// The document has no scenes to instantiate.
    #[error("glTF document contains no scene")]
    NoScene,

    /// The node hierarchy could not be rebuilt.
    #[error("invalid node hierarchy: {0}")]
    Hierarchy(#[from] MeshError),

    /// A mesh primitive has no POSITION attribute.
    #[error("mesh '{mesh}' primitive {primitive} has no positions")]
    MissingPositions { mesh: String, primitive: usize },

    /// A mesh primitive decoded into an inconsistent geometry.
    #[error("mesh '{mesh}' primitive {primitive} is invalid: {source}")]
    InvalidGeometry {
        mesh: String,
        primitive: usize,
        #[source]
        source: MeshError,
    },
}
