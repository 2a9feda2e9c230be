//! Distance-keyed LOD chains built from reconciled object groups.

use glam::Mat4;
use lodforge_math::Transform;
use lodforge_mesh::Primitive;
use serde::{Deserialize, Serialize};

use crate::{AssemblyError, GroupKey, ObjectGroup, Reconciliation, TierLabel};

/// Viewer distance at which each tier becomes visible.
///
/// Units are whatever the scene uses. Distances must be finite, non-negative
/// and strictly increasing from hires to lowres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchDistances {
    pub hires: f32,
    pub medres: f32,
    pub lowres: f32,
}

impl Default for SwitchDistances {
    fn default() -> Self {
        Self {
            hires: TierLabel::Hires.default_switch_distance(),
            medres: TierLabel::MedRes.default_switch_distance(),
            lowres: TierLabel::LowRes.default_switch_distance(),
        }
    }
}

impl SwitchDistances {
    pub fn for_tier(&self, tier: TierLabel) -> f32 {
        match tier {
            TierLabel::Hires => self.hires,
            TierLabel::MedRes => self.medres,
            TierLabel::LowRes => self.lowres,
        }
    }

    pub fn validate(&self) -> Result<(), AssemblyError> {
        let ordered = [self.hires, self.medres, self.lowres];
        let valid = ordered.iter().all(|d| d.is_finite() && *d >= 0.0)
            && ordered.windows(2).all(|pair| pair[0] < pair[1]);
        if valid {
            Ok(())
        } else {
            Err(AssemblyError::InvalidDistances {
                hires: self.hires,
                medres: self.medres,
                lowres: self.lowres,
            })
        }
    }
}

/// One representation in a chain.
#[derive(Clone, Debug)]
pub struct LodLevel {
    pub tier: TierLabel,
    /// Parts drawn together for this tier; never empty.
    pub primitives: Vec<Primitive>,
    /// Viewer distance from which this level is shown.
    pub switch_distance: f32,
}

impl LodLevel {
    /// Name of the source node the tier came from.
    pub fn name(&self) -> &str {
        self.primitives.first().map_or("", |primitive| primitive.name.as_str())
    }

    pub fn vertex_count(&self) -> usize {
        self.primitives.iter().map(Primitive::vertex_count).sum()
    }
}

/// Ordered tiers of one object. Never empty; the first level switches at 0 and
/// switch distances strictly increase.
#[derive(Clone, Debug)]
pub struct LodChain {
    key: GroupKey,
    placement: Transform,
    levels: Vec<LodLevel>,
}

impl LodChain {
    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    /// Transform applied once to the chain container.
    pub fn placement(&self) -> &Transform {
        &self.placement
    }

    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Index of the level shown at `distance`: the last level whose switch
    /// distance is not greater than `distance`. No hysteresis is applied.
    pub fn level_index_for_distance(&self, distance: f32) -> usize {
        self.levels
            .iter()
            .rposition(|level| level.switch_distance <= distance)
            .unwrap_or(0)
    }

    pub fn level_for_distance(&self, distance: f32) -> &LodLevel {
        &self.levels[self.level_index_for_distance(distance)]
    }

    /// Effective world matrix of level `index`: container placement composed
    /// with the level's (identity) local transform.
    pub fn member_world_matrix(&self, index: usize) -> Option<Mat4> {
        self.levels
            .get(index)
            .and_then(|level| level.primitives.first())
            .map(|primitive| self.placement.compose(&primitive.local))
    }

    pub fn into_levels(self) -> Vec<LodLevel> {
        self.levels
    }
}

/// Builds [`LodChain`]s from object groups.
#[derive(Clone, Debug, Default)]
pub struct LodAssembler {
    distances: SwitchDistances,
}

impl LodAssembler {
    pub fn new(distances: SwitchDistances) -> Result<Self, AssemblyError> {
        distances.validate()?;
        Ok(Self { distances })
    }

    pub fn distances(&self) -> &SwitchDistances {
        &self.distances
    }

    pub fn assemble(&self, group: ObjectGroup) -> Result<LodChain, AssemblyError> {
        let ObjectGroup {
            key,
            mut members,
            placement,
            ..
        } = group;

        if members.is_empty() || members.iter().any(|member| member.primitives.is_empty()) {
            return Err(AssemblyError::EmptyGroup { key });
        }
        members.sort_by_key(|member| member.tier);
        if let Some(pair) = members.windows(2).find(|pair| pair[0].tier == pair[1].tier) {
            return Err(AssemblyError::DuplicateTier {
                key,
                tier: pair[0].tier,
            });
        }

        let placement_matrix = placement.to_matrix();
        let levels: Vec<LodLevel> = members
            .into_iter()
            .enumerate()
            .map(|(index, member)| {
                let mut primitives = member.primitives;
                for primitive in &mut primitives {
                    primitive.local = Transform::IDENTITY;
                    primitive.world = placement_matrix;
                }
                LodLevel {
                    tier: member.tier,
                    primitives,
                    switch_distance: if index == 0 {
                        0.0
                    } else {
                        self.distances.for_tier(member.tier)
                    },
                }
            })
            .collect();

        tracing::debug!(group = %key, levels = levels.len(), "assembled LOD chain");
        Ok(LodChain {
            key,
            placement,
            levels,
        })
    }

    /// Assembles every group of a reconciliation, preserving group order.
    pub fn assemble_all(
        &self,
        reconciliation: Reconciliation,
    ) -> Result<Vec<LodChain>, AssemblyError> {
        reconciliation
            .groups
            .into_values()
            .map(|group| self.assemble(group))
            .collect()
    }
}
