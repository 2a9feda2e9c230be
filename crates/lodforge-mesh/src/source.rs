//! The producer side of the pipeline.

use std::convert::Infallible;

use crate::{Primitive, SceneGraph};

/// Anything that can hand over a flat list of primitives.
///
/// Loading and parsing the underlying asset format is the implementor's
/// concern; the engine only consumes the resulting primitives.
pub trait MeshSource {
    type Error;

    fn primitives(&mut self) -> Result<Vec<Primitive>, Self::Error>;
}

impl MeshSource for SceneGraph {
    type Error = Infallible;

    fn primitives(&mut self) -> Result<Vec<Primitive>, Self::Error> {
        Ok(self.flatten())
    }
}

impl MeshSource for Vec<Primitive> {
    type Error = Infallible;

    fn primitives(&mut self) -> Result<Vec<Primitive>, Self::Error> {
        Ok(std::mem::take(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Geometry, MaterialId};
    use lodforge_math::Transform;
    use std::sync::Arc;

    #[test]
    fn test_vec_source_drains() {
        let geometry = Arc::new(Geometry::non_indexed(vec![[0.0; 3]; 3]));
        let mut source = vec![Primitive::new(
            "a;hires",
            geometry,
            Transform::IDENTITY,
            MaterialId::DEFAULT,
        )];
        assert_eq!(source.primitives().unwrap().len(), 1);
        assert!(source.primitives().unwrap().is_empty());
    }
}
