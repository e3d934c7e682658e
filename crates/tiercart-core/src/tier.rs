//! Volume tier policy: total purchase volume → pricing tier.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A configured tier threshold, as it appears in the catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThreshold {
    pub name: String,
    /// Smallest total volume that qualifies for this tier.
    pub min_volume: u32,
}

/// A pricing tier. Ordered by `rank`; rank 0 is the entry tier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tier {
    pub rank: usize,
    pub name: String,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Ordered tier thresholds. Construction guarantees the first threshold is 0
/// and every later one is strictly greater, so [`TierPolicy::tier_for`] is
/// total and monotonic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPolicy {
    tiers: Vec<(Tier, u32)>,
}

impl TierPolicy {
    /// Builds a policy from thresholds listed lowest first.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the list is empty, the first
    /// threshold is not 0, thresholds are not strictly increasing, or a name
    /// is blank or repeated (case-insensitive).
    pub fn new(thresholds: Vec<TierThreshold>) -> Result<Self, ConfigError> {
        let Some(first) = thresholds.first() else {
            return Err(ConfigError::Validation(
                "at least one tier must be configured".to_string(),
            ));
        };
        if first.min_volume != 0 {
            return Err(ConfigError::Validation(format!(
                "lowest tier '{}' must start at min_volume 0, got {}",
                first.name, first.min_volume
            )));
        }

        let mut seen = HashSet::new();
        let mut previous: Option<&TierThreshold> = None;
        for threshold in &thresholds {
            if threshold.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "tier name must be non-empty".to_string(),
                ));
            }
            if !seen.insert(threshold.name.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate tier name: '{}'",
                    threshold.name
                )));
            }
            if let Some(prev) = previous {
                if threshold.min_volume <= prev.min_volume {
                    return Err(ConfigError::Validation(format!(
                        "tier '{}' min_volume {} must exceed tier '{}' min_volume {}",
                        threshold.name, threshold.min_volume, prev.name, prev.min_volume
                    )));
                }
            }
            previous = Some(threshold);
        }

        let tiers = thresholds
            .into_iter()
            .enumerate()
            .map(|(rank, t)| {
                (
                    Tier {
                        rank,
                        name: t.name,
                    },
                    t.min_volume,
                )
            })
            .collect();
        Ok(Self { tiers })
    }

    /// Returns the highest tier whose threshold `total_volume` reaches.
    #[must_use]
    pub fn tier_for(&self, total_volume: u32) -> &Tier {
        // Index 0 always qualifies because its threshold is 0.
        let idx = self
            .tiers
            .iter()
            .rposition(|(_, min)| total_volume >= *min)
            .unwrap_or(0);
        &self.tiers[idx].0
    }

    /// Looks up a tier by name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Tier> {
        self.tiers
            .iter()
            .map(|(tier, _)| tier)
            .find(|tier| tier.name.eq_ignore_ascii_case(name))
    }

    /// All tiers, lowest first.
    pub fn tiers(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter().map(|(tier, _)| tier)
    }

    /// Threshold of the given tier, if it belongs to this policy.
    #[must_use]
    pub fn min_volume(&self, tier: &Tier) -> Option<u32> {
        self.tiers
            .iter()
            .find(|(t, _)| t == tier)
            .map(|(_, min)| *min)
    }
}
