//! Final ordering, truncation and human-readable explanations.

use crate::fusion::ScoreBreakdown;
use crate::scorer::ScoredItem;
use data_loader::Item;
use serde::{Deserialize, Serialize};
use sources::UserProfile;
use std::cmp::Ordering;

/// Popularity sub-score above which an item is called trending
const TRENDING_THRESHOLD: f32 = 0.7;
/// Recency sub-score above which an item is called new
const FRESH_THRESHOLD: f32 = 0.8;

/// One recommended item as returned to callers and stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainedRecommendation {
    #[serde(flatten)]
    pub item: Item,
    pub score: f32,
    pub score_breakdown: ScoreBreakdown,
    pub explanation: String,
    /// Same as `score`
    pub confidence: f32,
}

/// Sort scored items, keep the best `limit`, and explain each.
pub fn rank(mut scored: Vec<ScoredItem>, profile: &UserProfile, limit: usize) -> Vec<ExplainedRecommendation> {
    scored.sort_by(compare_scored);
    scored.truncate(limit);

    scored
        .into_iter()
        .map(|ScoredItem { item, breakdown }| {
            let explanation = explain(&item, &breakdown, profile);
            ExplainedRecommendation {
                item,
                score: breakdown.final_score,
                score_breakdown: breakdown,
                explanation,
                confidence: breakdown.final_score,
            }
        })
        .collect()
}

/// Higher score first, then newer items, then lower ids.
pub fn compare_scored(a: &ScoredItem, b: &ScoredItem) -> Ordering {
    b.breakdown
        .final_score
        .total_cmp(&a.breakdown.final_score)
        .then_with(|| b.item.created_at.cmp(&a.item.created_at))
        .then_with(|| a.item.id.cmp(&b.item.id))
}

/// First matching rule wins.
pub fn explain(item: &Item, breakdown: &ScoreBreakdown, profile: &UserProfile) -> String {
    if profile.category_affinity(&item.category) > 0 {
        format!("Because you watch a lot of {}", item.category)
    } else if profile.creator_affinity(item.creator_id) > 0 {
        "From a creator you've liked before".to_string()
    } else if breakdown.popularity > TRENDING_THRESHOLD {
        "Trending right now".to_string()
    } else if breakdown.recency > FRESH_THRESHOLD {
        "New and worth a look".to_string()
    } else {
        "Recommended for you".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use data_loader::{ItemId, ItemStatus, Visibility};

    fn scored(id: ItemId, score: f32, age_days: i64) -> ScoredItem {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 10, 0, 0).unwrap();
        ScoredItem {
            item: Item {
                id,
                creator_id: id * 10,
                category: "music".to_string(),
                duration_secs: 300,
                view_count: 0,
                like_count: 0,
                created_at: now - Duration::days(age_days),
                status: ItemStatus::Published,
                visibility: Visibility::Public,
                tags: Default::default(),
            },
            breakdown: ScoreBreakdown {
                collaborative: 0.5,
                content: 0.0,
                context: 0.5,
                popularity: 0.0,
                recency: 0.0,
                final_score: score,
            },
        }
    }

    fn ids(recs: &[ExplainedRecommendation]) -> Vec<ItemId> {
        recs.iter().map(|r| r.item.id).collect()
    }

    #[test]
    fn test_sorted_and_truncated() {
        let items = vec![scored(1, 0.3, 1), scored(2, 0.9, 1), scored(3, 0.6, 1)];
        let recs = rank(items, &UserProfile::empty(1), 2);

        assert_eq!(ids(&recs), vec![2, 3]);
        assert_eq!(recs[0].score, 0.9);
        assert_eq!(recs[0].confidence, recs[0].score);
    }

    #[test]
    fn test_tie_break_newer_then_lower_id() {
        let items = vec![scored(5, 0.5, 3), scored(4, 0.5, 1), scored(2, 0.5, 3), scored(9, 0.8, 9)];
        let recs = rank(items, &UserProfile::empty(1), 10);
        assert_eq!(ids(&recs), vec![9, 4, 2, 5]);
    }

    #[test]
    fn test_limit_zero_and_oversized() {
        let items = vec![scored(1, 0.3, 1), scored(2, 0.9, 1)];
        assert!(rank(items.clone(), &UserProfile::empty(1), 0).is_empty());
        assert_eq!(rank(items, &UserProfile::empty(1), 50).len(), 2);
    }

    #[test]
    fn test_explanation_priority() {
        let base = scored(1, 0.5, 1);
        let mut profile = UserProfile::empty(1);
        let mut breakdown = base.breakdown;
        breakdown.popularity = 0.9;
        breakdown.recency = 0.9;

        assert_eq!(explain(&base.item, &breakdown, &profile), "Trending right now");

        breakdown.popularity = 0.7;
        assert_eq!(explain(&base.item, &breakdown, &profile), "New and worth a look");

        profile.creators.insert(10, 1);
        assert_eq!(explain(&base.item, &breakdown, &profile), "From a creator you've liked before");

        profile.categories.insert("music".to_string(), 2);
        assert_eq!(explain(&base.item, &breakdown, &profile), "Because you watch a lot of music");

        assert_eq!(explain(&base.item, &base.breakdown, &UserProfile::empty(1)), "Recommended for you");
    }

    #[test]
    fn test_serialized_shape() {
        let recs = rank(vec![scored(1, 0.42, 1)], &UserProfile::empty(1), 1);
        let value = serde_json::to_value(&recs[0]).unwrap();

        assert_eq!(value["id"], 1);
        assert_eq!(value["category"], "music");
        assert!(value["score_breakdown"]["collaborative"].is_number());
        assert!(value["explanation"].is_string());

        let restored: ExplainedRecommendation = serde_json::from_value(value).unwrap();
        assert_eq!(restored, recs[0]);
    }
}
