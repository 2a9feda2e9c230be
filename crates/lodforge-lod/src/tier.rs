//! Resolution tiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A discrete resolution level of one logical object.
///
/// Ordered from highest to lowest resolution, which is also the order of
/// increasing switch distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TierLabel {
    Hires,
    MedRes,
    LowRes,
}

impl TierLabel {
    pub const ALL: [TierLabel; 3] = [TierLabel::Hires, TierLabel::MedRes, TierLabel::LowRes];

    /// 0 for the highest resolution.
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Lower-case token used in primitive names.
    pub fn label(self) -> &'static str {
        match self {
            TierLabel::Hires => "hires",
            TierLabel::MedRes => "medres",
            TierLabel::LowRes => "lowres",
        }
    }

    /// Case-insensitive token lookup.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.label().eq_ignore_ascii_case(token))
    }

    pub fn default_switch_distance(self) -> f32 {
        match self {
            TierLabel::Hires => 0.0,
            TierLabel::MedRes => 5.0,
            TierLabel::LowRes => 10.0,
        }
    }
}

impl fmt::Display for TierLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_matches_resolution() {
        assert!(TierLabel::Hires < TierLabel::MedRes);
        assert!(TierLabel::MedRes < TierLabel::LowRes);
        assert_eq!(TierLabel::LowRes.rank(), 2);
    }

    #[test]
    fn test_default_distances_increase_with_rank() {
        let distances: Vec<f32> = TierLabel::ALL
            .iter()
            .map(|t| t.default_switch_distance())
            .collect();
        assert_eq!(distances, [0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_token_lookup_ignores_case() {
        assert_eq!(TierLabel::from_token("HiRes"), Some(TierLabel::Hires));
        assert_eq!(TierLabel::from_token("lowres"), Some(TierLabel::LowRes));
        assert_eq!(TierLabel::from_token("ultra"), None);
    }
}
