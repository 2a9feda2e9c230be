//! In-memory source hierarchy flattened into world-space primitives.

use std::sync::Arc;

use glam::Mat4;
use lodforge_math::Transform;

use crate::{Geometry, MaterialId, MeshError, Primitive};

/// Index of a node inside a [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named node with a local transform and any number of attached meshes.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub local: Transform,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub meshes: Vec<(Arc<Geometry>, MaterialId)>,
}

/// A node hierarchy as authored in an asset.
///
/// Parents are always added before their children, so world matrices can be
/// resolved in a single pass over the node list.
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node under `parent` (or as a root).
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        local: Transform,
        parent: Option<NodeId>,
    ) -> Result<NodeId, MeshError> {
        let id = NodeId(self.nodes.len());
        if let Some(parent) = parent {
            self.nodes
                .get_mut(parent.0)
                .ok_or(MeshError::UnknownNode(parent.0))?
                .children
                .push(id);
        }
        self.nodes.push(SceneNode {
            name: name.into(),
            local,
            parent,
            children: Vec::new(),
            meshes: Vec::new(),
        });
        Ok(id)
    }

    /// Attaches a mesh to an existing node.
    pub fn attach_mesh(
        &mut self,
        node: NodeId,
        geometry: Arc<Geometry>,
        material: MaterialId,
    ) -> Result<(), MeshError> {
        self.nodes
            .get_mut(node.0)
            .ok_or(MeshError::UnknownNode(node.0))?
            .meshes
            .push((geometry, material));
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over root nodes (nodes without a parent).
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(index, _)| NodeId(index))
    }

    /// World matrix of every node, indexed like the node list.
    pub fn world_matrices(&self) -> Vec<Mat4> {
        let mut world: Vec<Mat4> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let local = node.local.to_matrix();
            let matrix = match node.parent {
                Some(parent) => world[parent.0] * local,
                None => local,
            };
            world.push(matrix);
        }
        world
    }

    /// One primitive per attached mesh, in node order, carrying the node's name.
    /// Meshes of one node are numbered as consecutive parts.
    pub fn flatten(&self) -> Vec<Primitive> {
        let world = self.world_matrices();
        let mut primitives = Vec::new();
        for (node, world) in self.nodes.iter().zip(world) {
            for (part, (geometry, material)) in node.meshes.iter().enumerate() {
                primitives.push(Primitive {
                    name: node.name.clone(),
                    geometry: Arc::clone(geometry),
                    local: node.local,
                    world,
                    material: *material,
                    part: part as u32,
                });
            }
        }
        tracing::debug!(
            nodes = self.nodes.len(),
            primitives = primitives.len(),
            "flattened scene graph"
        );
        primitives
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn geometry() -> Arc<Geometry> {
        Arc::new(Geometry::non_indexed(vec![[0.0; 3]; 3]))
    }

    #[test]
    fn test_world_composes_ancestors() {
        let mut graph = SceneGraph::new();
        let root = graph
            .add_node("root", Transform::from_translation(Vec3::new(5.0, 0.0, 0.0)), None)
            .unwrap();
        let mid = graph
            .add_node(
                "mid",
                Transform::from_trs(
                    Vec3::ZERO,
                    Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                    Vec3::ONE,
                ),
                Some(root),
            )
            .unwrap();
        let leaf = graph
            .add_node("leaf;hires", Transform::from_translation(Vec3::X), Some(mid))
            .unwrap();
        graph.attach_mesh(leaf, geometry(), MaterialId(1)).unwrap();

        let primitives = graph.flatten();
        assert_eq!(primitives.len(), 1);
        let origin = primitives[0].world.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(5.0, 1.0, 0.0), 1e-5));
        assert_eq!(primitives[0].name, "leaf;hires");
        assert_eq!(primitives[0].material, MaterialId(1));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let mut other = SceneGraph::new();
        other.add_node("a", Transform::IDENTITY, None).unwrap();
        let foreign = other.add_node("b", Transform::IDENTITY, None).unwrap();

        let mut graph = SceneGraph::new();
        assert_eq!(
            graph.add_node("c", Transform::IDENTITY, Some(foreign)),
            Err(MeshError::UnknownNode(1))
        );
    }

    #[test]
    fn test_children_and_roots_tracked() {
        let mut graph = SceneGraph::new();
        let a = graph.add_node("a", Transform::IDENTITY, None).unwrap();
        let b = graph.add_node("b", Transform::IDENTITY, Some(a)).unwrap();
        graph.add_node("c", Transform::IDENTITY, None).unwrap();

        assert_eq!(graph.node(a).unwrap().children, vec![b]);
        assert_eq!(graph.roots().count(), 2);
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_nodes_without_meshes_produce_nothing() {
        let mut graph = SceneGraph::new();
        let group = graph.add_node("group", Transform::IDENTITY, None).unwrap();
        let a = graph.add_node("a;hires", Transform::IDENTITY, Some(group)).unwrap();
        graph.attach_mesh(a, geometry(), MaterialId(2)).unwrap();
        graph.attach_mesh(a, geometry(), MaterialId(3)).unwrap();

        let primitives = graph.flatten();
        assert_eq!(primitives.len(), 2);
        assert!(primitives.iter().all(|p| p.name == "a;hires"));
        let parts: Vec<u32> = primitives.iter().map(|p| p.part).collect();
        assert_eq!(parts, [0, 1]);
    }
}
