//! Content affinity: how well an item matches what the user already watches.
//!
//! content = 0.4 * min(category views / 10, 1)
//!         + 0.3 * min(creator likes / 5, 1)
//!         + 0.2 * duration match
//!         + 0.1 * tag similarity

use crate::traits::{Signal, SignalInput};
use sources::{DurationPreference, LONG_DURATION_SECS, SHORT_DURATION_SECS};
use std::collections::BTreeSet;

const CATEGORY_WEIGHT: f32 = 0.4;
const CREATOR_WEIGHT: f32 = 0.3;
const DURATION_WEIGHT: f32 = 0.2;
const TAG_WEIGHT: f32 = 0.1;

/// Views in a category at which category affinity saturates
const CATEGORY_SATURATION: f32 = 10.0;
/// Likes of a creator at which creator affinity saturates
const CREATOR_SATURATION: f32 = 5.0;

pub struct ContentSignal;

impl Signal for ContentSignal {
    fn name(&self) -> &str {
        "content"
    }

    fn neutral(&self) -> f32 {
        0.0
    }

    fn compute(&self, input: &SignalInput<'_>) -> f32 {
        let item = input.item;
        let profile = input.profile;

        let category = (profile.category_affinity(&item.category) as f32 / CATEGORY_SATURATION).min(1.0);
        let creator = (profile.creator_affinity(item.creator_id) as f32 / CREATOR_SATURATION).min(1.0);
        let duration = duration_match(profile.duration_preference, item.duration_secs);
        let tags = jaccard(&item.tags, input.history_tags);

        (CATEGORY_WEIGHT * category
            + CREATOR_WEIGHT * creator
            + DURATION_WEIGHT * duration
            + TAG_WEIGHT * tags)
            .min(1.0)
    }
}

/// Credit for an item's duration under the user's preferred band.
///
/// Full credit inside the band. Outside it, short and long preferences fall
/// off linearly; a medium preference gives half credit.
pub fn duration_match(preference: DurationPreference, duration_secs: u32) -> f32 {
    let d = duration_secs as f32;
    let short = SHORT_DURATION_SECS as f32;
    let long = LONG_DURATION_SECS as f32;

    match preference {
        DurationPreference::Short if d <= short => 1.0,
        DurationPreference::Short => (1.0 - (d - short) / long).max(0.0),
        DurationPreference::Long if d >= long => 1.0,
        DurationPreference::Long => d / long,
        DurationPreference::Medium if (short..=long).contains(&d) => 1.0,
        DurationPreference::Medium => 0.5,
    }
}

/// |A ∩ B| / |A ∪ B|, or 0 when either side is empty.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f32 / union as f32
}
