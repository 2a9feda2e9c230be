//! Capacity planning: partitions primitives by pack key and sums the exact
//! vertex, index and instance totals each batch will need.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;
use lodforge_mesh::{Geometry, MaterialId, Primitive};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{PackKey, PackKeyPolicy, PlanError};

/// Totals a batched mesh is allocated with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchPlan {
    pub instance_count: u32,
    pub vertex_count: u32,
    pub index_count: u32,
    /// Material shared by every instance, if there is one.
    pub material: Option<MaterialId>,
}

impl BatchPlan {
    /// Plan for one geometry slot holding every geometry of `geometries`
    /// (the base first, then its LOD alternates) drawn `instance_count` times.
    pub fn instanced(
        geometries: &[&Geometry],
        instance_count: u32,
        material: Option<MaterialId>,
    ) -> Result<Self, PlanError> {
        if geometries.is_empty() || instance_count == 0 {
            return Err(PlanError::EmptyPartition {
                key: "instanced".to_string(),
            });
        }
        let mut plan = BatchPlan {
            instance_count,
            vertex_count: 0,
            index_count: 0,
            material,
        };
        for geometry in geometries {
            plan.vertex_count = checked_add(plan.vertex_count, geometry.vertex_count())?;
            plan.index_count = checked_add(plan.index_count, geometry.index_count())?;
        }
        Ok(plan)
    }
}

/// Upper bounds for a single batch. Partitions over budget are split into chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchBudget {
    pub max_vertices: u32,
    pub max_indices: u32,
    pub max_instances: u32,
}

impl BatchBudget {
    fn admits(&self, vertices: u32, indices: u32, instances: u32) -> bool {
        vertices <= self.max_vertices
            && indices <= self.max_indices
            && instances <= self.max_instances
    }
}

/// Primitives sharing one pack key (and chunk, when a budget splits them),
/// with the plan that fits them exactly.
#[derive(Debug)]
pub struct Partition<K> {
    pub key: K,
    /// Position of this chunk within its key; 0 unless a budget split the key.
    pub chunk: u32,
    pub plan: BatchPlan,
    pub primitives: Vec<Primitive>,
}

/// Groups primitives into batches and computes their capacities.
///
/// Geometry shared between primitives of one batch (the same `Arc`) is
/// counted once, matching the deduplication the builder performs.
#[derive(Clone, Copy, Debug)]
pub struct BatchPlanner {
    copies_per_primitive: u32,
    budget: Option<BatchBudget>,
}

impl Default for BatchPlanner {
    fn default() -> Self {
        Self {
            copies_per_primitive: 1,
            budget: None,
        }
    }
}

impl BatchPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instances reserved per primitive.
    pub fn with_copies(mut self, copies_per_primitive: u32) -> Self {
        self.copies_per_primitive = copies_per_primitive;
        self
    }

    pub fn with_budget(mut self, budget: Option<BatchBudget>) -> Self {
        self.budget = budget;
        self
    }

    pub fn copies_per_primitive(&self) -> u32 {
        self.copies_per_primitive
    }

    pub fn budget(&self) -> Option<BatchBudget> {
        self.budget
    }

    /// Partitions with one of the standard pack key policies.
    pub fn partition_by(
        &self,
        primitives: Vec<Primitive>,
        policy: PackKeyPolicy,
    ) -> Result<Vec<Partition<PackKey>>, PlanError> {
        self.partition(primitives, |primitive| policy.key_for(primitive))
    }

    /// Partitions `primitives` by `key_fn`. Partitions come out in order of
    /// first appearance of their key; primitives keep their input order.
    pub fn partition<K, F>(
        &self,
        primitives: Vec<Primitive>,
        key_fn: F,
    ) -> Result<Vec<Partition<K>>, PlanError>
    where
        K: Clone + Eq + Hash + Debug,
        F: Fn(&Primitive) -> K,
    {
        if self.copies_per_primitive == 0 {
            return Err(PlanError::EmptyPartition {
                key: "zero copies per primitive".to_string(),
            });
        }

        let mut buckets: IndexMap<K, Vec<Primitive>> = IndexMap::new();
        for primitive in primitives {
            buckets.entry(key_fn(&primitive)).or_default().push(primitive);
        }

        let mut partitions = Vec::with_capacity(buckets.len());
        for (key, members) in buckets {
            if members.is_empty() {
                return Err(PlanError::EmptyPartition {
                    key: format!("{key:?}"),
                });
            }

            let mut chunk = Chunk::default();
            let mut chunk_index = 0;
            for primitive in members {
                let mut request = chunk.request(&primitive, self.copies_per_primitive)?;
                if let Some(budget) = self.budget
                    && !budget.admits(request.vertices, request.indices, request.instances)
                    && !chunk.primitives.is_empty()
                {
                    let full = std::mem::take(&mut chunk);
                    partitions.push(full.into_partition(key.clone(), chunk_index));
                    chunk_index += 1;
                    request = chunk.request(&primitive, self.copies_per_primitive)?;
                }
                if let Some(budget) = self.budget
                    && !budget.admits(request.vertices, request.indices, request.instances)
                {
                    return Err(PlanError::GeometryExceedsBudget {
                        name: primitive.name.clone(),
                        vertices: request.vertices,
                        indices: request.indices,
                    });
                }
                chunk.accept(primitive, request);
            }
            partitions.push(chunk.into_partition(key, chunk_index));
        }

        tracing::debug!(
            partitions = partitions.len(),
            budgeted = self.budget.is_some(),
            "planned batches"
        );
        Ok(partitions)
    }
}

fn checked_add(total: u32, amount: usize) -> Result<u32, PlanError> {
    u32::try_from(amount)
        .ok()
        .and_then(|amount| total.checked_add(amount))
        .ok_or(PlanError::CountOverflow)
}

/// Totals of a chunk after accepting one more primitive.
#[derive(Clone, Copy)]
struct Request {
    vertices: u32,
    indices: u32,
    instances: u32,
    new_geometry: bool,
}

#[derive(Default)]
struct Chunk {
    /// Geometry identities already counted; the primitives keep them alive.
    seen: FxHashSet<*const Geometry>,
    vertices: u32,
    indices: u32,
    instances: u32,
    primitives: Vec<Primitive>,
}

impl Chunk {
    fn request(&self, primitive: &Primitive, copies: u32) -> Result<Request, PlanError> {
        let new_geometry = !self.seen.contains(&Arc::as_ptr(&primitive.geometry));
        let (vertices, indices) = if new_geometry {
            (
                checked_add(self.vertices, primitive.vertex_count())?,
                checked_add(self.indices, primitive.index_count())?,
            )
        } else {
            (self.vertices, self.indices)
        };
        let instances = self
            .instances
            .checked_add(copies)
            .ok_or(PlanError::CountOverflow)?;
        Ok(Request {
            vertices,
            indices,
            instances,
            new_geometry,
        })
    }

    fn accept(&mut self, primitive: Primitive, request: Request) {
        if request.new_geometry {
            self.seen.insert(Arc::as_ptr(&primitive.geometry));
        }
        self.vertices = request.vertices;
        self.indices = request.indices;
        self.instances = request.instances;
        self.primitives.push(primitive);
    }

    fn into_partition<K>(self, key: K, chunk: u32) -> Partition<K> {
        let first = self.primitives.first().map(|p| p.material);
        let material =
            first.filter(|material| self.primitives.iter().all(|p| p.material == *material));
        Partition {
            key,
            chunk,
            plan: BatchPlan {
                instance_count: self.instances,
                vertex_count: self.vertices,
                index_count: self.indices,
                material,
            },
            primitives: self.primitives,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;
    use lodforge_math::Transform;

    fn geometry(vertices: usize, indices: usize) -> Arc<Geometry> {
        let positions = vec![[0.0; 3]; vertices];
        let indices = (0..indices as u32).map(|i| i % vertices as u32).collect();
        Arc::new(Geometry::new(positions, indices))
    }

    fn primitive(name: &str, geometry: &Arc<Geometry>, material: u64) -> Primitive {
        Primitive::new(name, Arc::clone(geometry), Transform::IDENTITY, MaterialId(material))
            .with_world(Mat4::IDENTITY)
    }

    /// Partition totals equal the sums over their distinct geometries.
    #[test]
    fn test_partition_sums_by_material() {
        let a = geometry(4, 6);
        let b = geometry(3, 3);
        let c = geometry(8, 12);
        let primitives = vec![
            primitive("a", &a, 1),
            primitive("b", &b, 2),
            primitive("c", &c, 1),
        ];

        let partitions = BatchPlanner::new()
            .partition_by(primitives, PackKeyPolicy::ByMaterial)
            .unwrap();
        assert_eq!(partitions.len(), 2);

        let first = &partitions[0];
        assert_eq!(first.key, PackKey::Material(MaterialId(1)));
        assert_eq!(
            first.plan,
            BatchPlan {
                instance_count: 2,
                vertex_count: 12,
                index_count: 18,
                material: Some(MaterialId(1)),
            }
        );
        assert_eq!(partitions[1].plan.vertex_count, 3);
        assert_eq!(partitions[1].plan.instance_count, 1);
    }

    /// The same geometry placed twice is planned once, with two instances.
    #[test]
    fn test_shared_geometry_counted_once() {
        let shared = geometry(24, 36);
        let primitives = vec![
            primitive("bolt", &shared, 0),
            primitive("bolt", &shared, 0),
            primitive("bolt", &shared, 0),
        ];
        let partitions = BatchPlanner::new()
            .partition_by(primitives, PackKeyPolicy::Global)
            .unwrap();
        assert_eq!(partitions[0].plan.vertex_count, 24);
        assert_eq!(partitions[0].plan.index_count, 36);
        assert_eq!(partitions[0].plan.instance_count, 3);
    }

    #[test]
    fn test_global_key_mixes_materials() {
        let g = geometry(3, 3);
        let primitives = vec![primitive("x", &g, 1), primitive("y", &geometry(3, 3), 2)];
        let partitions = BatchPlanner::new()
            .partition_by(primitives, PackKeyPolicy::Global)
            .unwrap();
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].plan.material, None);
        assert_eq!(partitions[0].primitives.len(), 2);
    }

    #[test]
    fn test_copies_multiply_instances_only() {
        let primitives = vec![primitive("x", &geometry(3, 3), 0)];
        let partitions = BatchPlanner::new()
            .with_copies(50)
            .partition_by(primitives, PackKeyPolicy::Global)
            .unwrap();
        assert_eq!(partitions[0].plan.instance_count, 50);
        assert_eq!(partitions[0].plan.vertex_count, 3);
    }

    /// A budget splits a key into several chunks, each within bounds.
    #[test]
    fn test_budget_splits_partition() {
        let budget = BatchBudget {
            max_vertices: 10,
            max_indices: 100,
            max_instances: 100,
        };
        let primitives = (0..4)
            .map(|i| primitive(&format!("p{i}"), &geometry(4, 6), 0))
            .collect();
        let partitions = BatchPlanner::new()
            .with_budget(Some(budget))
            .partition_by(primitives, PackKeyPolicy::Global)
            .unwrap();

        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].chunk, 0);
        assert_eq!(partitions[1].chunk, 1);
        for partition in &partitions {
            assert_eq!(partition.plan.vertex_count, 8);
            assert_eq!(partition.primitives.len(), 2);
        }
    }

    #[test]
    fn test_oversized_primitive_rejected() {
        let budget = BatchBudget {
            max_vertices: 2,
            max_indices: 100,
            max_instances: 100,
        };
        let result = BatchPlanner::new()
            .with_budget(Some(budget))
            .partition_by(vec![primitive("huge", &geometry(3, 3), 0)], PackKeyPolicy::Global);
        assert_eq!(
            result.unwrap_err(),
            PlanError::GeometryExceedsBudget {
                name: "huge".into(),
                vertices: 3,
                indices: 3,
            }
        );
    }

    #[test]
    fn test_custom_key_function() {
        let g = geometry(3, 3);
        let primitives = vec![
            primitive("left_a", &g, 0),
            primitive("right_a", &g, 0),
            primitive("left_b", &g, 0),
        ];
        let partitions = BatchPlanner::new()
            .partition(primitives, |p| p.name.starts_with("left"))
            .unwrap();
        assert_eq!(partitions.len(), 2);
        assert!(partitions[0].key);
        assert_eq!(partitions[0].plan.instance_count, 2);
        assert_eq!(partitions[0].plan.vertex_count, 3);
    }

    #[test]
    fn test_instanced_plan() {
        let base = geometry(8, 12);
        let alternate = geometry(4, 6);
        let plan = BatchPlan::instanced(&[base.as_ref(), alternate.as_ref()], 200, None).unwrap();
        assert_eq!(plan.vertex_count, 12);
        assert_eq!(plan.index_count, 18);
        assert_eq!(plan.instance_count, 200);

        assert!(BatchPlan::instanced(&[], 1, None).is_err());
        assert!(BatchPlan::instanced(&[base.as_ref()], 0, None).is_err());
    }

    #[test]
    fn test_empty_input_yields_no_partitions() {
        let partitions = BatchPlanner::new()
            .partition_by(Vec::new(), PackKeyPolicy::ByMaterial)
            .unwrap();
        assert!(partitions.is_empty());
    }
}
