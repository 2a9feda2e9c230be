//! Immutable geometry payloads.

use crate::MeshError;

/// Which optional vertex attributes a geometry carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    pub normals: bool,
    pub uvs: bool,
}

impl VertexLayout {
    /// Attributes present in either layout.
    pub fn union(self, other: VertexLayout) -> VertexLayout {
        VertexLayout {
            normals: self.normals || other.normals,
            uvs: self.uvs || other.uvs,
        }
    }
}

/// Vertex attributes plus a triangle index list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    positions: Vec<[f32; 3]>,
    normals: Option<Vec<[f32; 3]>>,
    uvs: Option<Vec<[f32; 2]>>,
    indices: Vec<u32>,
}

impl Geometry {
    /// Creates a geometry from positions and triangle indices.
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals: None,
            uvs: None,
            indices,
        }
    }

    /// Creates a non-indexed geometry, generating sequential indices.
    pub fn non_indexed(positions: Vec<[f32; 3]>) -> Self {
        let indices = (0..positions.len() as u32).collect();
        Self::new(positions, indices)
    }

    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_uvs(mut self, uvs: Vec<[f32; 2]>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> Option<&[[f32; 3]]> {
        self.normals.as_deref()
    }

    pub fn uvs(&self) -> Option<&[[f32; 2]]> {
        self.uvs.as_deref()
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn layout(&self) -> VertexLayout {
        VertexLayout {
            normals: self.normals.is_some(),
            uvs: self.uvs.is_some(),
        }
    }

    /// Joins `parts` into one geometry, rebasing each part's indices. An
    /// attribute carried by only some parts is zero-filled for the others.
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a Geometry>) -> Result<Self, MeshError> {
        let parts: Vec<&Geometry> = parts.into_iter().collect();
        let layout = parts
            .iter()
            .fold(VertexLayout::default(), |layout, part| layout.union(part.layout()));
        let vertex_count: usize = parts.iter().map(|part| part.vertex_count()).sum();
        if u32::try_from(vertex_count).is_err() {
            return Err(MeshError::VertexCountOverflow(vertex_count));
        }

        let mut merged = Geometry {
            positions: Vec::with_capacity(vertex_count),
            normals: layout.normals.then(|| Vec::with_capacity(vertex_count)),
            uvs: layout.uvs.then(|| Vec::with_capacity(vertex_count)),
            indices: Vec::with_capacity(parts.iter().map(|part| part.index_count()).sum()),
        };
        for part in parts {
            let offset = merged.positions.len() as u32;
            merged.positions.extend_from_slice(part.positions());
            if let Some(normals) = &mut merged.normals {
                match part.normals() {
                    Some(source) => normals.extend_from_slice(source),
                    None => normals.resize(merged.positions.len(), [0.0; 3]),
                }
            }
            if let Some(uvs) = &mut merged.uvs {
                match part.uvs() {
                    Some(source) => uvs.extend_from_slice(source),
                    None => uvs.resize(merged.positions.len(), [0.0; 2]),
                }
            }
            merged
                .indices
                .extend(part.indices().iter().map(|index| index.saturating_add(offset)));
        }
        Ok(merged)
    }

    /// Checks attribute lengths and index bounds.
    pub fn validate(&self) -> Result<(), MeshError> {
        let vertex_count = self.positions.len();

        if let Some(normals) = &self.normals
            && normals.len() != vertex_count
        {
            return Err(MeshError::AttributeLengthMismatch {
                attribute: "normals",
                expected: vertex_count,
                found: normals.len(),
            });
        }
        if let Some(uvs) = &self.uvs
            && uvs.len() != vertex_count
        {
            return Err(MeshError::AttributeLengthMismatch {
                attribute: "uvs",
                expected: vertex_count,
                found: uvs.len(),
            });
        }

        if self.indices.len() % 3 != 0 {
            return Err(MeshError::PartialTriangle(self.indices.len()));
        }

        if let Some((position, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &i)| i as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                position,
                index,
                vertex_count,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Geometry {
        Geometry::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_counts() {
        let g = triangle();
        assert_eq!(g.vertex_count(), 3);
        assert_eq!(g.index_count(), 3);
        assert_eq!(g.layout(), VertexLayout::default());
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_non_indexed_generates_sequential_indices() {
        let g = Geometry::non_indexed(vec![[0.0; 3]; 6]);
        assert_eq!(g.indices(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_layout_reflects_attributes() {
        let g = triangle()
            .with_normals(vec![[0.0, 0.0, 1.0]; 3])
            .with_uvs(vec![[0.0, 0.0]; 3]);
        assert_eq!(
            g.layout(),
            VertexLayout {
                normals: true,
                uvs: true
            }
        );
    }

    #[test]
    fn test_concat_rebases_and_fills_attributes() {
        let lit = triangle().with_normals(vec![[0.0, 0.0, 1.0]; 3]);
        let merged = Geometry::concat([&triangle(), &lit]).unwrap();

        assert_eq!(merged.vertex_count(), 6);
        assert_eq!(merged.indices(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(
            merged.layout(),
            VertexLayout {
                normals: true,
                uvs: false
            }
        );
        let normals = merged.normals().unwrap();
        assert_eq!(normals[2], [0.0; 3]);
        assert_eq!(normals[3], [0.0, 0.0, 1.0]);
        assert!(merged.validate().is_ok());
    }

    #[test]
    fn test_index_out_of_range() {
        let g = Geometry::new(vec![[0.0; 3]; 3], vec![0, 1, 3]);
        assert_eq!(
            g.validate(),
            Err(MeshError::IndexOutOfRange {
                position: 2,
                index: 3,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn test_attribute_mismatch() {
        let g = triangle().with_uvs(vec![[0.0, 0.0]; 2]);
        assert!(matches!(
            g.validate(),
            Err(MeshError::AttributeLengthMismatch {
                attribute: "uvs",
                ..
            })
        ));
    }

    #[test]
    fn test_partial_triangle() {
        let g = Geometry::new(vec![[0.0; 3]; 3], vec![0, 1]);
        assert_eq!(g.validate(), Err(MeshError::PartialTriangle(2)));
    }
}
