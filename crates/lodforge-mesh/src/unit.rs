//! Join point for scene units assembled from several independent loads.
//!
//! Grouping and capacity planning need the complete primitive set, so a unit
//! only releases its primitives once every expected load has been delivered.
//! A load that never arrives keeps the unit pending forever; that is not an
//! error.

use crate::Primitive;

/// Accumulates primitives from `expected` loads.
#[derive(Debug)]
pub struct SceneUnit {
    expected: usize,
    delivered: usize,
    primitives: Vec<Primitive>,
    taken: bool,
}

impl SceneUnit {
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            delivered: 0,
            primitives: Vec::new(),
            taken: false,
        }
    }

    /// Records the output of one finished load.
    ///
    /// Deliveries beyond the expected count are ignored with a warning.
    pub fn deliver(&mut self, primitives: Vec<Primitive>) {
        if self.delivered >= self.expected {
            tracing::warn!(
                expected = self.expected,
                dropped = primitives.len(),
                "scene unit received more loads than expected"
            );
            return;
        }
        self.delivered += 1;
        self.primitives.extend(primitives);
    }

    pub fn pending(&self) -> usize {
        self.expected - self.delivered
    }

    pub fn is_ready(&self) -> bool {
        !self.taken && self.delivered == self.expected
    }

    /// Hands over the complete primitive list exactly once.
    pub fn take_ready(&mut self) -> Option<Vec<Primitive>> {
        if !self.is_ready() {
            return None;
        }
        self.taken = true;
        Some(std::mem::take(&mut self.primitives))
    }
}
