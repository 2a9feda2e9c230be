//! Fixed-capacity mesh arena holding many geometries and their placed instances.
//!
//! Vertex and index storage is allocated once from a [`BatchPlan`] and never
//! reallocated. Indices are rebased onto the shared vertex arena, so a
//! geometry range can be drawn directly from the combined buffers.

use glam::{Mat4, Vec3};
use indexmap::IndexMap;
use lodforge_mesh::{Geometry, MaterialId, VertexLayout};

use crate::{BatchError, BatchPlan, CapacityExceeded, Resource};

/// Handle to a geometry slot of one [`BatchedMesh`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub(crate) u32);

impl GeometryId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to an instance of one [`BatchedMesh`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) u32);

impl InstanceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Maximum counts fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capacity {
    pub instances: u32,
    pub vertices: u32,
    pub indices: u32,
}

impl From<&BatchPlan> for Capacity {
    fn from(plan: &BatchPlan) -> Self {
        Self {
            instances: plan.instance_count,
            vertices: plan.vertex_count,
            indices: plan.index_count,
        }
    }
}

/// Where one geometry (or one of its LOD alternates) lives in the arena.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryRange {
    pub vertex_start: u32,
    pub vertex_count: u32,
    pub index_start: u32,
    pub index_count: u32,
    /// Viewer distance from which this range is drawn. 0 for the base geometry.
    pub switch_distance: f32,
}

/// A registered geometry: the base range followed by LOD alternates in
/// strictly increasing switch distance.
#[derive(Clone, Debug)]
pub struct GeometrySlot {
    lods: Vec<GeometryRange>,
}

impl GeometrySlot {
    pub fn base(&self) -> &GeometryRange {
        &self.lods[0]
    }

    pub fn lods(&self) -> &[GeometryRange] {
        &self.lods
    }

    /// Index of the range drawn at `distance`.
    pub fn lod_index_for_distance(&self, distance: f32) -> usize {
        self.lods
            .iter()
            .rposition(|range| range.switch_distance <= distance)
            .unwrap_or(0)
    }

    pub(crate) fn push_lod(&mut self, range: GeometryRange) {
        self.lods.push(range);
    }
}

/// One placed copy of a geometry slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstanceSlot {
    pub geometry: GeometryId,
    pub transform: Mat4,
    pub material: MaterialId,
    pub visible: bool,
}

/// Instances of one geometry range drawn with a single instanced call.
#[derive(Clone, Debug, PartialEq)]
pub struct InstancedDraw {
    pub geometry: GeometryId,
    /// Index into the slot's LOD ranges.
    pub lod: usize,
    pub range: GeometryRange,
    pub instances: Vec<InstanceId>,
}

impl InstancedDraw {
    /// Number of instances to draw.
    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }
}

/// The output of batching: shared vertex/index arenas plus geometry and
/// instance tables.
#[derive(Clone, Debug)]
pub struct BatchedMesh {
    capacity: Capacity,
    material: Option<MaterialId>,
    layout: Option<VertexLayout>,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
    geometries: Vec<GeometrySlot>,
    instances: Vec<InstanceSlot>,
}

impl BatchedMesh {
    pub(crate) fn with_capacity(plan: &BatchPlan) -> Self {
        let capacity = Capacity::from(plan);
        Self {
            capacity,
            material: plan.material,
            layout: None,
            positions: Vec::with_capacity(capacity.vertices as usize),
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::with_capacity(capacity.indices as usize),
            geometries: Vec::new(),
            instances: Vec::with_capacity(capacity.instances as usize),
        }
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Material shared by every instance, when the batch was planned per material.
    pub fn material(&self) -> Option<MaterialId> {
        self.material
    }

    /// Vertex attributes present in the arena; `None` until a geometry is added.
    pub fn layout(&self) -> Option<VertexLayout> {
        self.layout
    }

    pub fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> Option<&[[f32; 3]]> {
        self.layout.filter(|l| l.normals).map(|_| self.normals.as_slice())
    }

    pub fn uvs(&self) -> Option<&[[f32; 2]]> {
        self.layout.filter(|l| l.uvs).map(|_| self.uvs.as_slice())
    }

    /// Indices, already offset into the shared vertex arena.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&GeometrySlot> {
        self.geometries.get(id.index())
    }

    pub fn instance(&self, id: InstanceId) -> Option<&InstanceSlot> {
        self.instances.get(id.index())
    }

    pub fn instances(&self) -> impl Iterator<Item = (InstanceId, &InstanceSlot)> + '_ {
        self.instances
            .iter()
            .enumerate()
            .map(|(index, slot)| (InstanceId(index as u32), slot))
    }

    pub fn set_instance_transform(
        &mut self,
        id: InstanceId,
        transform: Mat4,
    ) -> Result<(), BatchError> {
        self.instance_mut(id)?.transform = transform;
        Ok(())
    }

    pub fn set_visible(&mut self, id: InstanceId, visible: bool) -> Result<(), BatchError> {
        self.instance_mut(id)?.visible = visible;
        Ok(())
    }

    /// LOD range a geometry slot draws at `distance` from the viewer.
    pub fn select_lod(&self, id: GeometryId, distance: f32) -> Result<&GeometryRange, BatchError> {
        let slot = self.geometry(id).ok_or(BatchError::UnknownGeometry(id))?;
        Ok(&slot.lods()[slot.lod_index_for_distance(distance)])
    }

    /// Visible instances grouped by the geometry range they draw from `viewer`.
    ///
    /// Groups appear in order of their first instance; each group becomes one
    /// instanced draw call.
    pub fn draw_list(&self, viewer: Vec3) -> Vec<InstancedDraw> {
        let mut groups: IndexMap<(GeometryId, usize), Vec<InstanceId>> = IndexMap::new();
        for (id, slot) in self.instances() {
            if !slot.visible {
                continue;
            }
            let Some(geometry) = self.geometry(slot.geometry) else {
                continue;
            };
            let distance = viewer.distance(slot.transform.w_axis.truncate());
            let lod = geometry.lod_index_for_distance(distance);
            groups.entry((slot.geometry, lod)).or_default().push(id);
        }

        groups
            .into_iter()
            .map(|((geometry, lod), instances)| InstancedDraw {
                geometry,
                lod,
                range: self.geometries[geometry.index()].lods[lod],
                instances,
            })
            .collect()
    }

    fn instance_mut(&mut self, id: InstanceId) -> Result<&mut InstanceSlot, BatchError> {
        self.instances
            .get_mut(id.index())
            .ok_or(BatchError::UnknownInstance(id))
    }

    pub(crate) fn geometry_mut(&mut self, id: GeometryId) -> Result<&mut GeometrySlot, BatchError> {
        self.geometries
            .get_mut(id.index())
            .ok_or(BatchError::UnknownGeometry(id))
    }

    /// Copies `geometry` into the arenas. Nothing is written unless the whole
    /// geometry fits.
    ///
    /// The arena layout is the union of every geometry written so far. An
    /// attribute a geometry lacks is zero-filled, including for vertices
    /// written before the attribute first appeared.
    pub(crate) fn write_geometry(
        &mut self,
        geometry: &Geometry,
        switch_distance: f32,
    ) -> Result<GeometryRange, BatchError> {
        geometry.validate()?;

        let vertex_start = self.vertex_count();
        let index_start = self.index_count();
        let vertex_count = reserve(
            Resource::Vertices,
            vertex_start,
            geometry.vertex_count(),
            self.capacity.vertices,
        )?;
        let index_count = reserve(
            Resource::Indices,
            index_start,
            geometry.index_count(),
            self.capacity.indices,
        )?;

        let previous = self.layout.unwrap_or_default();
        let layout = previous.union(geometry.layout());
        let capacity = self.capacity.vertices as usize;
        if layout.normals && !previous.normals {
            self.normals.reserve_exact(capacity);
            self.normals.resize(self.positions.len(), [0.0; 3]);
        }
        if layout.uvs && !previous.uvs {
            self.uvs.reserve_exact(capacity);
            self.uvs.resize(self.positions.len(), [0.0; 2]);
        }
        self.layout = Some(layout);

        self.positions.extend_from_slice(geometry.positions());
        if layout.normals {
            match geometry.normals() {
                Some(normals) => self.normals.extend_from_slice(normals),
                None => self.normals.resize(self.positions.len(), [0.0; 3]),
            }
        }
        if layout.uvs {
            match geometry.uvs() {
                Some(uvs) => self.uvs.extend_from_slice(uvs),
                None => self.uvs.resize(self.positions.len(), [0.0; 2]),
            }
        }
        self.indices
            .extend(geometry.indices().iter().map(|index| index + vertex_start));

        Ok(GeometryRange {
            vertex_start,
            vertex_count,
            index_start,
            index_count,
            switch_distance,
        })
    }

    pub(crate) fn push_slot(&mut self, base: GeometryRange) -> GeometryId {
        let id = GeometryId(self.geometries.len() as u32);
        self.geometries.push(GeometrySlot { lods: vec![base] });
        id
    }

    pub(crate) fn push_instance(&mut self, slot: InstanceSlot) -> Result<InstanceId, BatchError> {
        if self.geometry(slot.geometry).is_none() {
            return Err(BatchError::UnknownGeometry(slot.geometry));
        }
        let used = self.instance_count();
        reserve(Resource::Instances, used, 1, self.capacity.instances)?;
        self.instances.push(slot);
        Ok(InstanceId(used))
    }
}

/// Checks that `amount` more items fit after `used`, returning `amount` as u32.
fn reserve(
    resource: Resource,
    used: u32,
    amount: usize,
    capacity: u32,
) -> Result<u32, CapacityExceeded> {
    let available = capacity.saturating_sub(used);
    match u32::try_from(amount) {
        Ok(requested) if requested <= available => Ok(requested),
        _ => Err(CapacityExceeded {
            resource,
            requested: u32::try_from(amount).unwrap_or(u32::MAX),
            available,
        }),
    }
}
