//! Level-of-detail assembly: primitive name parsing, tier grouping with
//! transform reconciliation, and distance-keyed LOD chains.

mod chain;
mod error;
mod naming;
mod reconcile;
mod tier;

pub use chain::{LodAssembler, LodChain, LodLevel, SwitchDistances};
pub use error::{AssemblyError, MalformedReason, ParseError, ReconcileError};
pub use naming::{GroupKey, NameParser, NamingConvention, ParsedName};
pub use reconcile::{
    GroupMember, GroupReconciler, MalformedPolicy, MissingTierPolicy, ObjectGroup,
    Reconciliation, ReconcileOptions, SkippedPrimitive,
};
pub use tier::TierLabel;
