//! Decomposition error types.

/// Reasons a 4x4 matrix cannot be split into translation, rotation and scale.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecomposeError {
    /// The matrix contains NaN or infinite components.
    #[error("matrix contains non-finite components")]
    NonFinite,

    /// The bottom row is not `(0, 0, 0, 1)`, so the matrix is a projection.
    #[error("matrix is not affine (bottom row {bottom_row:?})")]
    NonAffine { bottom_row: [f32; 4] },

    /// The basis collapses at least one axis to zero length.
    #[error("matrix basis is degenerate (determinant {determinant})")]
    Degenerate { determinant: f32 },

    /// The basis axes are not orthogonal and the shear policy rejects it.
    #[error("matrix contains shear (skew {skew}) and cannot be expressed as TRS")]
    Sheared { skew: f32 },
}
