//! Asset-backed mesh sources.
//!
//! Currently glTF 2.0 (`.gltf` with embedded or external buffers, and `.glb`).

mod error;
mod gltf_source;

pub use error::AssetError;
pub use gltf_source::GltfSource;
