//! Types shared by the profile builder and the candidate retriever.

use data_loader::{CreatorId, ItemId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Items shorter than this (seconds) are "short".
pub const SHORT_DURATION_SECS: u32 = 600;

/// Items longer than this (seconds) are "long".
pub const LONG_DURATION_SECS: u32 = 1800;

/// Preferred running-time band, derived from what the user actually watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationPreference {
    Short,
    #[default]
    Medium,
    Long,
}

impl DurationPreference {
    /// Classify a mean watched duration in seconds.
    pub fn from_mean_secs(mean_secs: f64) -> Self {
        if mean_secs < SHORT_DURATION_SECS as f64 {
            DurationPreference::Short
        } else if mean_secs > LONG_DURATION_SECS as f64 {
            DurationPreference::Long
        } else {
            DurationPreference::Medium
        }
    }
}

/// Per-user preference summary built from bounded interaction windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    /// category -> number of views in the window
    pub categories: HashMap<String, u32>,
    /// creator -> number of likes in the window
    pub creators: HashMap<CreatorId, u32>,
    pub duration_preference: DurationPreference,
    /// How much history backs this profile, in [0, 1]
    pub profile_strength: f32,
    /// Viewed item ids, most recent first (at most 100)
    pub view_history: Vec<ItemId>,
    /// Liked item ids, most recent first (at most 50)
    pub like_history: Vec<ItemId>,
}

impl UserProfile {
    /// The profile used when nothing is known about a user.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            categories: HashMap::new(),
            creators: HashMap::new(),
            duration_preference: DurationPreference::Medium,
            profile_strength: 0.0,
            view_history: Vec::new(),
            like_history: Vec::new(),
        }
    }

    pub fn category_affinity(&self, category: &str) -> u32 {
        self.categories.get(category).copied().unwrap_or(0)
    }

    pub fn creator_affinity(&self, creator_id: CreatorId) -> u32 {
        self.creators.get(&creator_id).copied().unwrap_or(0)
    }

    /// Top `n` categories by view count, ties broken alphabetically.
    pub fn top_categories(&self, n: usize) -> Vec<(&str, u32)> {
        let mut categories: Vec<(&str, u32)> = self
            .categories
            .iter()
            .map(|(category, count)| (category.as_str(), *count))
            .collect();
        categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        categories.truncate(n);
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_preference_bands() {
        assert_eq!(DurationPreference::from_mean_secs(120.0), DurationPreference::Short);
        assert_eq!(DurationPreference::from_mean_secs(600.0), DurationPreference::Medium);
        assert_eq!(DurationPreference::from_mean_secs(700.0), DurationPreference::Medium);
        assert_eq!(DurationPreference::from_mean_secs(1800.0), DurationPreference::Medium);
        assert_eq!(DurationPreference::from_mean_secs(1801.0), DurationPreference::Long);
    }

    #[test]
    fn test_empty_profile() {
        let profile = UserProfile::empty(3);
        assert_eq!(profile.duration_preference, DurationPreference::Medium);
        assert_eq!(profile.category_affinity("tech"), 0);
        assert_eq!(profile.creator_affinity(1), 0);
        assert!(profile.top_categories(3).is_empty());
    }

    #[test]
    fn test_profile_json_round_trip_keeps_creator_keys() {
        let mut profile = UserProfile::empty(1);
        profile.creators.insert(42, 3);
        profile.categories.insert("tech".to_string(), 5);

        let json = serde_json::to_string(&profile).unwrap();
        let restored: UserProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, profile);
    }
}
