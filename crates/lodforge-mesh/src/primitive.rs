//! Drawable mesh units produced by a mesh source.

use std::fmt;
use std::sync::Arc;

use glam::Mat4;
use lodforge_math::Transform;
use serde::{Deserialize, Serialize};

use crate::Geometry;

/// Opaque material identity. Primitives compare materials by this id only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u64);

impl MaterialId {
    /// Used for primitives that do not reference a material.
    pub const DEFAULT: Self = Self(0);
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "material#{}", self.0)
    }
}

/// One drawable mesh unit: geometry, placement and material.
///
/// `world` is the local transform composed with every ancestor of the source
/// hierarchy and must be final before the primitive is handed to the engine.
#[derive(Clone, Debug)]
pub struct Primitive {
    pub name: String,
    pub geometry: Arc<Geometry>,
    pub local: Transform,
    pub world: Mat4,
    pub material: MaterialId,
    /// Position among the meshes attached to one source node; 0 for the first.
    pub part: u32,
}

impl Primitive {
    /// A root-level primitive whose world transform equals its local transform.
    pub fn new(
        name: impl Into<String>,
        geometry: Arc<Geometry>,
        local: Transform,
        material: MaterialId,
    ) -> Self {
        Self {
            name: name.into(),
            geometry,
            world: local.to_matrix(),
            local,
            material,
            part: 0,
        }
    }

    /// Marks this primitive as a further part of the same source node.
    pub fn with_part(mut self, part: u32) -> Self {
        self.part = part;
        self
    }

    /// Replaces the world matrix, e.g. after composing with a parent.
    pub fn with_world(mut self, world: Mat4) -> Self {
        self.world = world;
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.geometry.vertex_count()
    }

    pub fn index_count(&self) -> usize {
        self.geometry.index_count()
    }
}
