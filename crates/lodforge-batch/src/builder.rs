//! Appending geometries and instances into a [`BatchedMesh`].

use std::sync::Arc;

use glam::Mat4;
use lodforge_lod::{LodChain, LodLevel};
use lodforge_mesh::{Geometry, MaterialId};
use rustc_hash::FxHashMap;

use crate::{
    BatchError, BatchPlan, BatchedMesh, GeometryId, InstanceId, InstanceSlot, Partition, PlanError,
};

/// Fills one batched mesh sized by a [`BatchPlan`].
///
/// Geometry is deduplicated by identity: adding the same `Arc` twice returns
/// the existing slot. The builder keeps those `Arc`s alive until
/// [`finish`](Self::finish), after which the source payloads may be dropped.
pub struct BatchBuilder {
    mesh: BatchedMesh,
    registered: FxHashMap<*const Geometry, (Arc<Geometry>, GeometryId)>,
}

impl BatchBuilder {
    pub fn new(plan: &BatchPlan) -> Self {
        Self {
            mesh: BatchedMesh::with_capacity(plan),
            registered: FxHashMap::default(),
        }
    }

    /// Registers `geometry`, copying it into the arena on first sight.
    pub fn add_geometry(&mut self, geometry: &Arc<Geometry>) -> Result<GeometryId, BatchError> {
        let identity = Arc::as_ptr(geometry);
        if let Some((_, id)) = self.registered.get(&identity) {
            return Ok(*id);
        }
        let range = self.mesh.write_geometry(geometry, 0.0)?;
        let id = self.mesh.push_slot(range);
        self.registered.insert(identity, (Arc::clone(geometry), id));
        Ok(id)
    }

    /// Adds a lower-detail alternate to an existing slot, drawn from
    /// `switch_distance` onward. Distances must increase strictly per slot.
    pub fn add_geometry_lod(
        &mut self,
        geometry: GeometryId,
        alternate: &Geometry,
        switch_distance: f32,
    ) -> Result<(), BatchError> {
        let previous = self
            .mesh
            .geometry(geometry)
            .ok_or(BatchError::UnknownGeometry(geometry))?
            .lods()
            .last()
            .map_or(0.0, |range| range.switch_distance);
        if !switch_distance.is_finite() || switch_distance <= previous {
            return Err(BatchError::LodDistanceOrder {
                geometry,
                distance: switch_distance,
                previous,
            });
        }

        let range = self.mesh.write_geometry(alternate, switch_distance)?;
        self.mesh.geometry_mut(geometry)?.push_lod(range);
        Ok(())
    }

    /// Places a copy of `geometry`, using the batch material (or the default one).
    pub fn add_instance(
        &mut self,
        geometry: GeometryId,
        transform: Mat4,
    ) -> Result<InstanceId, BatchError> {
        let material = self.mesh.material().unwrap_or(MaterialId::DEFAULT);
        self.add_instance_with_material(geometry, transform, material)
    }

    pub fn add_instance_with_material(
        &mut self,
        geometry: GeometryId,
        transform: Mat4,
        material: MaterialId,
    ) -> Result<InstanceId, BatchError> {
        self.mesh.push_instance(InstanceSlot {
            geometry,
            transform,
            material,
            visible: true,
        })
    }

    pub fn mesh(&self) -> &BatchedMesh {
        &self.mesh
    }

    /// Releases the retained geometry payloads and returns the mesh.
    pub fn finish(self) -> BatchedMesh {
        let mesh = self.mesh;
        tracing::trace!(
            geometries = mesh.geometry_count(),
            instances = mesh.instance_count(),
            vertices = mesh.vertex_count(),
            indices = mesh.index_count(),
            "batch finished"
        );
        mesh
    }
}

/// Which geometry slot and instance a source primitive became.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchEntry {
    pub name: String,
    pub geometry: GeometryId,
    pub instance: InstanceId,
}

/// One partition collapsed into a single batched mesh.
#[derive(Debug)]
pub struct ConsolidatedBatch<K> {
    pub key: K,
    pub chunk: u32,
    pub mesh: BatchedMesh,
    /// One entry per source primitive, in partition order.
    pub entries: Vec<BatchEntry>,
}

/// Builds one batched mesh from a planned partition: each primitive becomes
/// an instance placed at its world matrix, with shared geometry stored once.
///
/// The partition's primitives are consumed; their geometry payloads are
/// released once the batch is built.
pub fn build_consolidated<K>(
    partition: Partition<K>,
) -> Result<ConsolidatedBatch<K>, BatchError> {
    let Partition {
        key,
        chunk,
        plan,
        primitives,
    } = partition;

    let mut builder = BatchBuilder::new(&plan);
    let mut entries = Vec::with_capacity(primitives.len());
    for primitive in primitives {
        let geometry = builder.add_geometry(&primitive.geometry)?;
        let instance =
            builder.add_instance_with_material(geometry, primitive.world, primitive.material)?;
        entries.push(BatchEntry {
            name: primitive.name,
            geometry,
            instance,
        });
    }

    Ok(ConsolidatedBatch {
        key,
        chunk,
        mesh: builder.finish(),
        entries,
    })
}

/// Builds one geometry slot from a LOD chain (finest level as the base, the
/// rest as alternates at their switch distances) and places it at every
/// transform in `placements`. A level made of several parts is joined into
/// one geometry.
pub fn build_instanced_lod(
    chain: &LodChain,
    placements: &[Mat4],
) -> Result<BatchedMesh, BatchError> {
    let Some((base, alternates)) = chain.levels().split_first() else {
        return Err(PlanError::EmptyPartition {
            key: chain.key().to_string(),
        }
        .into());
    };

    let base_geometry = level_geometry(base)?;
    let alternate_geometries = alternates
        .iter()
        .map(level_geometry)
        .collect::<Result<Vec<_>, _>>()?;
    let geometries: Vec<&Geometry> = std::iter::once(&base_geometry)
        .chain(&alternate_geometries)
        .map(Arc::as_ref)
        .collect();
    let instance_count = u32::try_from(placements.len()).map_err(|_| PlanError::CountOverflow)?;
    let plan = BatchPlan::instanced(&geometries, instance_count, shared_material(chain))?;

    let mut builder = BatchBuilder::new(&plan);
    let slot = builder.add_geometry(&base_geometry)?;
    for (level, geometry) in alternates.iter().zip(&alternate_geometries) {
        builder.add_geometry_lod(slot, geometry, level.switch_distance)?;
    }
    for placement in placements {
        builder.add_instance(slot, *placement)?;
    }

    tracing::debug!(
        group = %chain.key(),
        levels = chain.len(),
        instances = instance_count,
        "built instanced LOD batch"
    );
    Ok(builder.finish())
}

fn level_geometry(level: &LodLevel) -> Result<Arc<Geometry>, BatchError> {
    match level.primitives.as_slice() {
        [single] => Ok(Arc::clone(&single.geometry)),
        parts => {
            let joined = Geometry::concat(parts.iter().map(|part| part.geometry.as_ref()))?;
            Ok(Arc::new(joined))
        }
    }
}

/// The material every part of every level uses, if they agree.
fn shared_material(chain: &LodChain) -> Option<MaterialId> {
    let mut materials = chain
        .levels()
        .iter()
        .flat_map(|level| &level.primitives)
        .map(|primitive| primitive.material);
    let first = materials.next()?;
    materials.all(|material| material == first).then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BatchPlanner, CapacityExceeded, PackKeyPolicy, Resource};
    use glam::Vec3;
    use lodforge_lod::{GroupReconciler, LodAssembler};
    use lodforge_math::Transform;
    use lodforge_mesh::Primitive;

    fn quad(size: f32) -> Arc<Geometry> {
        Arc::new(Geometry::new(
            vec![[0.0; 3], [size, 0.0, 0.0], [size, size, 0.0], [0.0, size, 0.0]],
            vec![0, 1, 2, 0, 2, 3],
        ))
    }

    fn triangle() -> Arc<Geometry> {
        Arc::new(Geometry::new(
            vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        ))
    }

    fn placed(name: &str, geometry: &Arc<Geometry>, at: Vec3, material: u64) -> Primitive {
        Primitive::new(
            name,
            Arc::clone(geometry),
            Transform::from_translation(at),
            MaterialId(material),
        )
    }

    /// Building a planned partition fills the mesh exactly to capacity.
    #[test]
    fn test_consolidated_build_fills_plan_exactly() {
        let shared = quad(1.0);
        let primitives = vec![
            placed("a", &shared, Vec3::ZERO, 1),
            placed("b", &triangle(), Vec3::X, 1),
            placed("c", &shared, Vec3::Y, 1),
            placed("d", &quad(2.0), Vec3::Z, 2),
        ];

        let partitions = BatchPlanner::new()
            .partition_by(primitives, PackKeyPolicy::ByMaterial)
            .unwrap();
        for partition in partitions {
            let plan = partition.plan;
            let batch = build_consolidated(partition).unwrap();
            let mesh = &batch.mesh;
            assert_eq!(mesh.vertex_count(), plan.vertex_count);
            assert_eq!(mesh.index_count(), plan.index_count);
            assert_eq!(mesh.instance_count(), plan.instance_count);
        }
    }

    /// Geometries with and without normals can share a material batch.
    #[test]
    fn test_consolidated_build_with_mixed_layouts() {
        let lit = Arc::new(
            Geometry::new(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], vec![0, 1, 2])
                .with_normals(vec![[0.0, 0.0, 1.0]; 3]),
        );
        let primitives = vec![
            placed("plain", &triangle(), Vec3::ZERO, 1),
            placed("lit", &lit, Vec3::X, 1),
        ];
        let partition = BatchPlanner::new()
            .partition_by(primitives, PackKeyPolicy::ByMaterial)
            .unwrap()
            .remove(0);
        let plan = partition.plan;

        let batch = build_consolidated(partition).unwrap();
        let mesh = &batch.mesh;
        assert_eq!(mesh.vertex_count(), plan.vertex_count);
        assert_eq!(mesh.index_count(), plan.index_count);
        assert_eq!(mesh.instance_count(), plan.instance_count);
        assert_eq!(mesh.normals().map(<[_]>::len), Some(6));
        assert!(mesh.uvs().is_none());
    }

    #[test]
    fn test_consolidated_entries_and_dedup() {
        let shared = quad(1.0);
        let primitives = vec![
            placed("a", &shared, Vec3::ZERO, 0),
            placed("b", &shared, Vec3::new(4.0, 0.0, 0.0), 0),
        ];
        let partition = BatchPlanner::new()
            .partition_by(primitives, PackKeyPolicy::Global)
            .unwrap()
            .remove(0);
        let batch = build_consolidated(partition).unwrap();

        assert_eq!(batch.mesh.geometry_count(), 1);
        assert_eq!(batch.entries.len(), 2);
        assert_eq!(batch.entries[0].geometry, batch.entries[1].geometry);
        assert_eq!(batch.entries[1].name, "b");

        let second = batch.mesh.instance(batch.entries[1].instance).unwrap();
        assert!(second.transform.w_axis.truncate().abs_diff_eq(Vec3::new(4.0, 0.0, 0.0), 1e-6));
    }

    /// Source payloads are released once the batch is built.
    #[test]
    fn test_finish_releases_geometry() {
        let geometry = quad(1.0);
        let plan = BatchPlan::instanced(&[geometry.as_ref()], 1, None).unwrap();
        let mut builder = BatchBuilder::new(&plan);
        let id = builder.add_geometry(&geometry).unwrap();
        builder.add_instance(id, Mat4::IDENTITY).unwrap();
        assert_eq!(Arc::strong_count(&geometry), 2);

        let mesh = builder.finish();
        assert_eq!(Arc::strong_count(&geometry), 1);
        assert_eq!(mesh.positions().len(), 4);
    }

    /// An append past capacity fails and leaves earlier slots intact.
    #[test]
    fn test_overflow_preserves_existing_slots() {
        let plan = BatchPlan {
            instance_count: 1,
            vertex_count: 4,
            index_count: 6,
            material: None,
        };
        let mut builder = BatchBuilder::new(&plan);
        let id = builder.add_geometry(&quad(1.0)).unwrap();
        let instance = builder.add_instance(id, Mat4::IDENTITY).unwrap();

        let err = builder.add_geometry(&triangle()).unwrap_err();
        assert!(err.is_contract_violation());
        let err = builder.add_instance(id, Mat4::IDENTITY).unwrap_err();
        assert_eq!(
            err,
            BatchError::CapacityExceeded(CapacityExceeded {
                resource: Resource::Instances,
                requested: 1,
                available: 0,
            })
        );

        let mesh = builder.finish();
        assert_eq!(mesh.geometry_count(), 1);
        assert_eq!(mesh.instance_count(), 1);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.instance(instance).unwrap().geometry, id);
    }

    #[test]
    fn test_lod_distances_must_increase() {
        let base = quad(1.0);
        let low = triangle();
        let geometries = [base.as_ref(), low.as_ref(), low.as_ref()];
        let plan = BatchPlan::instanced(&geometries, 1, None).unwrap();
        let mut builder = BatchBuilder::new(&plan);
        let id = builder.add_geometry(&base).unwrap();

        assert!(matches!(
            builder.add_geometry_lod(id, &low, 0.0),
            Err(BatchError::LodDistanceOrder { .. })
        ));
        builder.add_geometry_lod(id, &low, 20.0).unwrap();
        assert!(matches!(
            builder.add_geometry_lod(id, &low, 20.0),
            Err(BatchError::LodDistanceOrder { .. })
        ));
        assert!(matches!(
            builder.add_geometry_lod(GeometryId(9), &low, 30.0),
            Err(BatchError::UnknownGeometry(_))
        ));
    }

    #[test]
    fn test_unknown_geometry_instance_rejected() {
        let plan = BatchPlan::instanced(&[triangle().as_ref()], 1, None).unwrap();
        let mut builder = BatchBuilder::new(&plan);
        assert_eq!(
            builder.add_instance(GeometryId(0), Mat4::IDENTITY),
            Err(BatchError::UnknownGeometry(GeometryId(0)))
        );
    }

    fn chain() -> LodChain {
        let primitives = vec![
            placed("tree;lowres", &triangle(), Vec3::ZERO, 3),
            placed("tree;hires", &quad(1.0), Vec3::ZERO, 3),
            placed("tree;medres", &quad(0.5), Vec3::ZERO, 3),
        ];
        let reconciliation = GroupReconciler::default().reconcile(primitives).unwrap();
        LodAssembler::default()
            .assemble_all(reconciliation)
            .unwrap()
            .remove(0)
    }

    /// One slot carries every tier; instances pick their range by viewer distance.
    #[test]
    fn test_instanced_lod_from_chain() {
        let chain = chain();
        let placements: Vec<Mat4> = (0..200)
            .map(|i| Mat4::from_translation(Vec3::new(i as f32 * 0.1 + 0.05, 0.0, 0.0)))
            .collect();
        let mesh = build_instanced_lod(&chain, &placements).unwrap();

        assert_eq!(mesh.geometry_count(), 1);
        assert_eq!(mesh.instance_count(), 200);
        assert_eq!(mesh.vertex_count(), 4 + 4 + 3);
        assert_eq!(mesh.index_count(), 6 + 6 + 3);
        assert_eq!(mesh.material(), Some(MaterialId(3)));

        let slot = mesh.geometry(GeometryId(0)).unwrap();
        let distances: Vec<f32> = slot.lods().iter().map(|r| r.switch_distance).collect();
        assert_eq!(distances, [0.0, 5.0, 10.0]);
        assert_eq!(mesh.select_lod(GeometryId(0), 7.0).unwrap().vertex_count, 4);
        assert_eq!(mesh.select_lod(GeometryId(0), 12.0).unwrap().vertex_count, 3);

        // Instances span x in (0, 20): 50 at hires, 50 at medres, 100 at lowres.
        let draws = mesh.draw_list(Vec3::ZERO);
        let counts: Vec<(usize, u32)> = draws.iter().map(|d| (d.lod, d.instance_count())).collect();
        assert_eq!(counts, [(0, 50), (1, 50), (2, 100)]);
    }

    #[test]
    fn test_instanced_lod_joins_level_parts() {
        let lit = Arc::new(
            Geometry::new(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], vec![0, 1, 2])
                .with_normals(vec![[0.0, 1.0, 0.0]; 3]),
        );
        let primitives = vec![
            placed("chair;hires", &quad(1.0), Vec3::ZERO, 4),
            placed("chair;hires", &lit, Vec3::ZERO, 5).with_part(1),
            placed("chair;lowres", &triangle(), Vec3::ZERO, 4),
        ];
        let reconciliation = GroupReconciler::default().reconcile(primitives).unwrap();
        let chain = LodAssembler::default()
            .assemble_all(reconciliation)
            .unwrap()
            .remove(0);
        let placements = [Mat4::IDENTITY, Mat4::from_translation(Vec3::new(30.0, 0.0, 0.0))];
        let mesh = build_instanced_lod(&chain, &placements).unwrap();

        assert_eq!(mesh.geometry_count(), 1);
        assert_eq!(mesh.vertex_count(), 4 + 3 + 3);
        assert_eq!(mesh.index_count(), 6 + 3 + 3);
        assert_eq!(mesh.material(), None);
        let base = mesh.geometry(GeometryId(0)).unwrap().base();
        assert_eq!(base.vertex_count, 7);
        assert_eq!(base.index_count, 9);
        assert_eq!(mesh.indices()[6..9], [4, 5, 6]);
        assert_eq!(mesh.normals().map(<[_]>::len), Some(10));
    }

    #[test]
    fn test_instanced_lod_needs_placements() {
        assert!(matches!(
            build_instanced_lod(&chain(), &[]),
            Err(BatchError::Plan(PlanError::EmptyPartition { .. }))
        ));
    }
}
