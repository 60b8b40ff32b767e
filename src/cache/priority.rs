//! Priority Tier Module
//!
//! Priority tiers govern eviction order and persistence eligibility.

use serde::{Deserialize, Serialize};

// == Priority ==
/// Importance tier of a cache entry.
///
/// Lower tiers are evicted first when the cache is over capacity; `High` and
/// `Critical` entries are additionally written to durable storage so they
/// survive a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// First to be evicted
    Low,
    /// Default tier
    Normal,
    /// Durable; evicted only after `Low` and `Normal`
    High,
    /// Durable; evicted only as a last resort
    Critical,
}

impl Priority {
    /// Eviction rank; entries with lower ranks are evicted first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Normal => 1,
            Priority::High => 2,
            Priority::Critical => 3,
        }
    }

    /// Whether entries of this tier are written to durable storage.
    pub fn is_durable(self) -> bool {
        matches!(self, Priority::High | Priority::Critical)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_ordering() {
        assert!(Priority::Low.rank() < Priority::Normal.rank());
        assert!(Priority::Normal.rank() < Priority::High.rank());
        assert!(Priority::High.rank() < Priority::Critical.rank());
    }

    #[test]
    fn test_durable_tiers() {
        assert!(!Priority::Low.is_durable());
        assert!(!Priority::Normal.is_durable());
        assert!(Priority::High.is_durable());
        assert!(Priority::Critical.is_durable());
    }

    #[test]
    fn test_default_is_normal() {
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn test_serialized_lowercase() {
        assert_eq!(
            serde_json::to_string(&Priority::Critical).unwrap(),
            "\"critical\""
        );
        let parsed: Priority = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(parsed, Priority::Low);
    }
}
