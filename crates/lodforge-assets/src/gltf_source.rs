//! glTF 2.0 mesh source.
//!
//! Walks the default scene depth-first, rebuilding the node hierarchy as a
//! [`SceneGraph`] so world matrices are composed the same way as for
//! in-memory hierarchies. A glTF mesh referenced by several nodes yields one
//! shared geometry, which the batch builder later deduplicates.

use std::path::PathBuf;
use std::sync::Arc;

use glam::{Quat, Vec3};
use gltf::mesh::Mode;
use lodforge_math::Transform;
use lodforge_mesh::{Geometry, MaterialId, MeshSource, NodeId, Primitive, SceneGraph};
use rustc_hash::FxHashMap;

use crate::AssetError;

enum Input {
    File(PathBuf),
    Bytes(Vec<u8>),
}

/// A [`MeshSource`] reading a glTF document from disk or memory.
pub struct GltfSource {
    input: Input,
}

impl GltfSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            input: Input::File(path.into()),
        }
    }

    /// A document held in memory; only embedded (data URI or GLB) buffers resolve.
    pub fn from_slice(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            input: Input::Bytes(bytes.into()),
        }
    }

    /// Imports the document and rebuilds its default scene.
    pub fn load_graph(&self) -> Result<SceneGraph, AssetError> {
        let (document, buffers, _images) = match &self.input {
            Input::File(path) => {
                tracing::debug!("importing glTF from {}", path.display());
                gltf::import(path)?
            }
            Input::Bytes(bytes) => gltf::import_slice(bytes)?,
        };

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or(AssetError::NoScene)?;

        let mut loader = DocumentLoader {
            buffers: &buffers,
            geometries: FxHashMap::default(),
            graph: SceneGraph::new(),
        };
        for node in scene.nodes() {
            loader.load_node(&node, None)?;
        }

        tracing::debug!(
            nodes = loader.graph.len(),
            geometries = loader.geometries.len(),
            "glTF scene rebuilt"
        );
        Ok(loader.graph)
    }
}

impl MeshSource for GltfSource {
    type Error = AssetError;

    fn primitives(&mut self) -> Result<Vec<Primitive>, Self::Error> {
        Ok(self.load_graph()?.flatten())
    }
}

struct DocumentLoader<'b> {
    buffers: &'b [gltf::buffer::Data],
    /// Keyed by (mesh index, primitive index).
    geometries: FxHashMap<(usize, usize), Arc<Geometry>>,
    graph: SceneGraph,
}

impl DocumentLoader<'_> {
    fn load_node(
        &mut self,
        node: &gltf::Node<'_>,
        parent: Option<NodeId>,
    ) -> Result<(), AssetError> {
        let (translation, rotation, scale) = node.transform().decomposed();
        let local = Transform::from_trs(
            Vec3::from(translation),
            Quat::from_array(rotation),
            Vec3::from(scale),
        );
        let name = node
            .name()
            .or_else(|| node.mesh().and_then(|mesh| mesh.name()))
            .unwrap_or_default()
            .to_string();

        let id = self.graph.add_node(name, local, parent)?;

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if primitive.mode() != Mode::Triangles {
                    tracing::warn!(
                        mesh = mesh.name().unwrap_or_default(),
                        primitive = primitive.index(),
                        mode = ?primitive.mode(),
                        "skipping non-triangle primitive"
                    );
                    continue;
                }
                let geometry = self.geometry(&mesh, &primitive)?;
                let material = primitive
                    .material()
                    .index()
                    .map_or(MaterialId::DEFAULT, |index| MaterialId(index as u64 + 1));
                self.graph.attach_mesh(id, geometry, material)?;
            }
        }

        for child in node.children() {
            self.load_node(&child, Some(id))?;
        }
        Ok(())
    }

    fn geometry(
        &mut self,
        mesh: &gltf::Mesh<'_>,
        primitive: &gltf::Primitive<'_>,
    ) -> Result<Arc<Geometry>, AssetError> {
        let key = (mesh.index(), primitive.index());
        if let Some(geometry) = self.geometries.get(&key) {
            return Ok(Arc::clone(geometry));
        }

        let mesh_name = || mesh.name().unwrap_or("unnamed").to_string();
        let buffers = self.buffers;
        let reader = primitive.reader(|buffer| Some(buffers[buffer.index()].0.as_slice()));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| AssetError::MissingPositions {
                mesh: mesh_name(),
                primitive: primitive.index(),
            })?
            .collect();

        let mut geometry = match reader.read_indices() {
            Some(indices) => Geometry::new(positions, indices.into_u32().collect()),
            None => Geometry::non_indexed(positions),
        };
        if let Some(normals) = reader.read_normals() {
            geometry = geometry.with_normals(normals.collect());
        }
        if let Some(uvs) = reader.read_tex_coords(0) {
            geometry = geometry.with_uvs(uvs.into_f32().collect());
        }

        geometry
            .validate()
            .map_err(|source| AssetError::InvalidGeometry {
                mesh: mesh_name(),
                primitive: primitive.index(),
                source,
            })?;

        let geometry = Arc::new(geometry);
        self.geometries.insert(key, Arc::clone(&geometry));
        Ok(geometry)
    }
}
