//! Transform math for the lodforge engine: TRS transforms and matrix decomposition.

mod decompose;
mod error;
mod transform;

pub use decompose::{SHEAR_TOLERANCE, ShearPolicy, decompose};
pub use error::DecomposeError;
pub use transform::Transform;
