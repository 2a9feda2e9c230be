//! Error types for name parsing, reconciliation and chain assembly.

use lodforge_math::DecomposeError;

use crate::{GroupKey, TierLabel};

/// Why a name does not follow the configured convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    #[error("missing '{0}' delimiter")]
    MissingDelimiter(char),
    #[error("empty object identifier")]
    EmptyKey,
    #[error("empty tier token")]
    EmptyToken,
}

/// A primitive name that cannot be mapped to a group key and tier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The name does not have the shape the convention requires.
    #[error("malformed primitive name '{name}': {reason}")]
    Malformed { name: String, reason: MalformedReason },

    /// The name has the right shape but the tier token is not recognised.
    #[error("primitive name '{name}' has unknown tier '{token}'")]
    UnknownTier { name: String, token: String },
}

/// Failures while grouping primitives and resolving their placement.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Two primitives claim the same tier of one group.
    #[error("group '{key}' already has a {tier} member, rejecting '{name}'")]
    DuplicateTier {
        key: GroupKey,
        tier: TierLabel,
        name: String,
    },

    /// No hires member and the missing-tier policy rejects fallbacks.
    #[error("group '{key}' has no hires member")]
    MissingAuthoritativeTier { key: GroupKey },

    /// The authoritative world matrix is not expressible as a placement.
    #[error("group '{key}' has an unusable authoritative transform: {source}")]
    Transform {
        key: GroupKey,
        #[source]
        source: DecomposeError,
    },
}

/// Failures while turning a group into a LOD chain.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssemblyError {
    #[error("group '{key}' has no members")]
    EmptyGroup { key: GroupKey },

    #[error("group '{key}' has more than one {tier} member")]
    DuplicateTier { key: GroupKey, tier: TierLabel },

    /// Switch distances must be finite, non-negative and strictly increasing.
    #[error("switch distances {hires}, {medres}, {lowres} must increase strictly")]
    InvalidDistances { hires: f32, medres: f32, lowres: f32 },
}
