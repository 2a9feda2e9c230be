//! Pack keys deciding which primitives share a batch.

use lodforge_mesh::{MaterialId, Primitive};
use serde::{Deserialize, Serialize};

/// Standard partitioning policies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackKeyPolicy {
    /// One batch per material.
    #[default]
    ByMaterial,
    /// Everything in a single batch; materials are kept per instance.
    Global,
}

impl PackKeyPolicy {
    pub fn key_for(self, primitive: &Primitive) -> PackKey {
        match self {
            PackKeyPolicy::ByMaterial => PackKey::Material(primitive.material),
            PackKeyPolicy::Global => PackKey::Global,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PackKey {
    Material(MaterialId),
    Global,
}

impl PackKey {
    pub fn material(self) -> Option<MaterialId> {
        match self {
            PackKey::Material(material) => Some(material),
            PackKey::Global => None,
        }
    }
}
