//! Membership tier names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a known tier name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid membership tier: {0}")]
pub struct ParseTierNameError(pub String);

/// The fixed set of subscription plans.
///
/// Stored as `TEXT` in `membership_tiers.name` and `users.membership_tier`
/// using the uppercase wire form (`FREE`, `STANDARD`, `PRO`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TierName {
    #[default]
    Free,
    Standard,
    Pro,
}

impl TierName {
    /// Every tier, cheapest first.
    pub const ALL: [Self; 3] = [Self::Free, Self::Standard, Self::Pro];

    /// The stored/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Standard => "STANDARD",
            Self::Pro => "PRO",
        }
    }
}

impl fmt::Display for TierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TierName {
    type Err = ParseTierNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FREE" => Ok(Self::Free),
            "STANDARD" => Ok(Self::Standard),
            "PRO" => Ok(Self::Pro),
            other => Err(ParseTierNameError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_name_round_trips_through_str() {
        for tier in TierName::ALL {
            assert_eq!(tier.as_str().parse::<TierName>(), Ok(tier));
        }
    }

    #[test]
    fn test_tier_name_rejects_lowercase() {
        assert!("pro".parse::<TierName>().is_err());
    }

    #[test]
    fn test_tier_name_serde_matches_storage() {
        let json = serde_json::to_string(&TierName::Standard).expect("serialize");
        assert_eq!(json, "\"STANDARD\"");
    }
}
