//! Global popularity from raw view and like counters.

use crate::traits::{Signal, SignalInput};

/// Views at which the view component saturates
const VIEW_SATURATION: f32 = 100_000.0;
/// Likes at which the like component saturates
const LIKE_SATURATION: f32 = 10_000.0;

pub struct PopularitySignal;

impl Signal for PopularitySignal {
    fn name(&self) -> &str {
        "popularity"
    }

    fn neutral(&self) -> f32 {
        0.0
    }

    fn compute(&self, input: &SignalInput<'_>) -> f32 {
        let views = (input.item.view_count as f32 / VIEW_SATURATION).min(1.0);
        let likes = (input.item.like_count as f32 / LIKE_SATURATION).min(1.0);
        0.7 * views + 0.3 * likes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::signals::fixtures;
    use sources::UserProfile;
    use std::collections::BTreeSet;

    fn popularity(views: u64, likes: u64) -> f32 {
        let mut item = fixtures::item(1, "music", 300);
        item.view_count = views;
        item.like_count = likes;
        let profile = UserProfile::empty(1);
        let history = BTreeSet::new();
        let request = RequestContext::default();
        PopularitySignal.evaluate(&SignalInput {
            item: &item,
            profile: &profile,
            history_tags: &history,
            request: &request,
            now: fixtures::now(),
        })
    }

    #[test]
    fn test_half_saturated() {
        assert!((popularity(50_000, 5_000) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_bounds() {
        assert_eq!(popularity(0, 0), 0.0);
        assert!((popularity(10_000_000, 1_000_000) - 1.0).abs() < 1e-6);
    }
}
