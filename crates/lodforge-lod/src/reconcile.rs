//! Grouping primitives by object and resolving one placement per group.
//!
//! Tiers of one object are authored independently and need not share an
//! origin. The reconciler takes the authoritative tier's world matrix as the
//! group placement and moves every member into the group-local frame (identity
//! local transform), so applying the placement once to the group container
//! positions all tiers identically.

use glam::Mat4;
use indexmap::IndexMap;
use lodforge_math::{ShearPolicy, Transform, decompose};
use lodforge_mesh::Primitive;
use serde::{Deserialize, Serialize};

use crate::{GroupKey, NameParser, NamingConvention, ReconcileError, TierLabel};

/// What to do with a group that has no hires member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingTierPolicy {
    /// Fail with [`ReconcileError::MissingAuthoritativeTier`].
    #[default]
    Reject,
    /// Use the highest-resolution tier that is present.
    FallbackToLowest,
}

/// What to do with primitives whose names cannot be parsed, or that repeat a tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MalformedPolicy {
    /// Fail the whole reconciliation.
    #[default]
    Abort,
    /// Drop the primitive, log a warning and report it in [`Reconciliation::skipped`].
    Skip,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub convention: NamingConvention,
    pub missing_tier: MissingTierPolicy,
    pub malformed: MalformedPolicy,
    pub shear: ShearPolicy,
}

/// One tier of an object group.
#[derive(Clone, Debug)]
pub struct GroupMember {
    pub tier: TierLabel,
    /// The parts of the tier's source node, in part order; never empty. Local
    /// transforms are reset to identity and `world` equals the group placement.
    pub primitives: Vec<Primitive>,
    /// World matrix as delivered by the mesh source.
    pub source_world: Mat4,
}

impl GroupMember {
    /// True when `primitive` is the next part of the node this member came from.
    fn continues_with(&self, primitive: &Primitive) -> bool {
        self.primitives.last().is_some_and(|last| {
            last.name == primitive.name
                && last.part.checked_add(1) == Some(primitive.part)
                && last.world == primitive.world
        })
    }
}

/// All tiers sharing a group key plus the placement applied to the group container.
#[derive(Clone, Debug)]
pub struct ObjectGroup {
    pub key: GroupKey,
    /// Members in order of first sighting.
    pub members: Vec<GroupMember>,
    /// Tier whose world transform became the placement.
    pub authoritative: TierLabel,
    pub placement: Transform,
}

impl ObjectGroup {
    pub fn member(&self, tier: TierLabel) -> Option<&GroupMember> {
        self.members.iter().find(|member| member.tier == tier)
    }
}

/// A primitive dropped under [`MalformedPolicy::Skip`].
#[derive(Clone, Debug)]
pub struct SkippedPrimitive {
    pub name: String,
    pub reason: ReconcileError,
}

#[derive(Clone, Debug, Default)]
pub struct Reconciliation {
    /// Groups keyed by object, in order of first sighting.
    pub groups: IndexMap<GroupKey, ObjectGroup>,
    pub skipped: Vec<SkippedPrimitive>,
}

/// Groups primitives by parsed name and normalises each group's transforms.
#[derive(Clone, Copy, Debug, Default)]
pub struct GroupReconciler {
    options: ReconcileOptions,
    parser: NameParser,
}

impl GroupReconciler {
    pub fn new(options: ReconcileOptions) -> Self {
        Self {
            options,
            parser: NameParser::new(options.convention),
        }
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    pub fn reconcile(&self, primitives: Vec<Primitive>) -> Result<Reconciliation, ReconcileError> {
        let mut pending: IndexMap<GroupKey, Vec<GroupMember>> = IndexMap::new();
        let mut skipped = Vec::new();

        for primitive in primitives {
            let parsed = match self.parser.parse(&primitive.name) {
                Ok(parsed) => parsed,
                Err(err) => {
                    self.reject(primitive.name, err.into(), &mut skipped)?;
                    continue;
                }
            };

            let members = pending.entry(parsed.key.clone()).or_default();
            if let Some(member) = members.iter_mut().find(|member| member.tier == parsed.tier) {
                if member.continues_with(&primitive) {
                    member.primitives.push(primitive);
                } else {
                    let err = ReconcileError::DuplicateTier {
                        key: parsed.key,
                        tier: parsed.tier,
                        name: primitive.name.clone(),
                    };
                    self.reject(primitive.name, err, &mut skipped)?;
                }
                continue;
            }

            members.push(GroupMember {
                tier: parsed.tier,
                source_world: primitive.world,
                primitives: vec![primitive],
            });
        }

        let mut groups = IndexMap::with_capacity(pending.len());
        for (key, members) in pending {
            let group = self.resolve(key.clone(), members)?;
            groups.insert(key, group);
        }

        tracing::debug!(
            groups = groups.len(),
            skipped = skipped.len(),
            "reconciled primitives into object groups"
        );
        Ok(Reconciliation { groups, skipped })
    }

    fn reject(
        &self,
        name: String,
        reason: ReconcileError,
        skipped: &mut Vec<SkippedPrimitive>,
    ) -> Result<(), ReconcileError> {
        match self.options.malformed {
            MalformedPolicy::Abort => Err(reason),
            MalformedPolicy::Skip => {
                tracing::warn!(primitive = %name, error = %reason, "skipping primitive");
                skipped.push(SkippedPrimitive { name, reason });
                Ok(())
            }
        }
    }

    fn resolve(
        &self,
        key: GroupKey,
        mut members: Vec<GroupMember>,
    ) -> Result<ObjectGroup, ReconcileError> {
        let Some(authority) = members.iter().min_by_key(|member| member.tier) else {
            return Err(ReconcileError::MissingAuthoritativeTier { key });
        };
        let best = authority.tier;
        let source_world = authority.source_world;

        if best != TierLabel::Hires {
            match self.options.missing_tier {
                MissingTierPolicy::Reject => {
                    return Err(ReconcileError::MissingAuthoritativeTier { key });
                }
                MissingTierPolicy::FallbackToLowest => {
                    tracing::debug!(group = %key, tier = %best, "no hires member, falling back");
                }
            }
        }

        let placement = decompose(source_world, self.options.shear).map_err(|source| {
            ReconcileError::Transform {
                key: key.clone(),
                source,
            }
        })?;

        let placement_matrix = placement.to_matrix();
        for primitive in members.iter_mut().flat_map(|member| &mut member.primitives) {
            primitive.local = Transform::IDENTITY;
            primitive.world = placement_matrix;
        }

        Ok(ObjectGroup {
            key,
            members,
            authoritative: best,
            placement,
        })
    }
}
