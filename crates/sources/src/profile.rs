//! Build a `UserProfile` from a user's recent interaction history.
//!
//! The profile is a compact summary the scorer can consult per candidate
//! without touching the store again:
//! - Category affinity: view counts per category over the last 100 views
//! - Creator affinity: like counts per creator over the last 50 likes
//! - Duration preference: band of the mean viewed duration
//! - Profile strength: how much history backs all of the above

use crate::types::{DurationPreference, UserProfile};
use data_loader::{ContentStore, InteractionKind, Item, ItemId, StoreError, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

/// Why a profile could not be built
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("user {0} not found")]
    NotFound(UserId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Aggregates interaction windows into a `UserProfile`.
#[derive(Clone)]
pub struct ProfileBuilder {
    store: Arc<dyn ContentStore>,

    /// How many recent views feed category affinity and duration preference
    view_window: usize,

    /// How many recent likes feed creator affinity
    like_window: usize,
}

impl ProfileBuilder {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            view_window: 100,
            like_window: 50,
        }
    }

    /// Configure the view window (default: 100)
    pub fn with_view_window(mut self, window: usize) -> Self {
        self.view_window = window;
        self
    }

    /// Configure the like window (default: 50)
    pub fn with_like_window(mut self, window: usize) -> Self {
        self.like_window = window;
        self
    }

    /// Build the profile for `user_id`.
    ///
    /// Returns `ProfileError::NotFound` for unknown users; callers decide
    /// whether to fall back to `UserProfile::empty`.
    #[instrument(skip(self))]
    pub async fn build_profile(&self, user_id: UserId) -> Result<UserProfile, ProfileError> {
        if !self.store.user_exists(user_id).await? {
            return Err(ProfileError::NotFound(user_id));
        }

        let (views, likes) = futures::try_join!(
            self.store
                .recent_interactions(user_id, InteractionKind::View, self.view_window),
            self.store
                .recent_interactions(user_id, InteractionKind::Like, self.like_window),
        )?;

        let view_history: Vec<ItemId> = views.iter().map(|i| i.item_id).collect();
        let like_history: Vec<ItemId> = likes.iter().map(|i| i.item_id).collect();

        // One batched lookup for every item either window references
        let mut ids: Vec<ItemId> = view_history.iter().chain(like_history.iter()).copied().collect();
        ids.sort_unstable();
        ids.dedup();
        let items: HashMap<ItemId, Item> = self
            .store
            .items_by_ids(&ids)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        let mut profile = UserProfile::empty(user_id);
        profile.categories = count_categories(&view_history, &items);
        profile.creators = count_creators(&like_history, &items);
        profile.duration_preference = compute_duration_preference(&view_history, &items);
        profile.profile_strength = compute_profile_strength(view_history.len(), like_history.len());
        profile.view_history = view_history;
        profile.like_history = like_history;

        debug!(
            "Built profile for user {}: {} categories, {} creators, {:?}, strength {:.2}",
            user_id,
            profile.categories.len(),
            profile.creators.len(),
            profile.duration_preference,
            profile.profile_strength
        );
        Ok(profile)
    }
}

/// One count per viewed item, keyed by the item's category.
fn count_categories(view_history: &[ItemId], items: &HashMap<ItemId, Item>) -> HashMap<String, u32> {
    let mut categories: HashMap<String, u32> = HashMap::new();
    for item in view_history.iter().filter_map(|id| items.get(id)) {
        *categories.entry(item.category.clone()).or_insert(0) += 1;
    }
    categories
}

/// One count per liked item, keyed by the item's creator.
fn count_creators(
    like_history: &[ItemId],
    items: &HashMap<ItemId, Item>,
) -> HashMap<data_loader::CreatorId, u32> {
    let mut creators = HashMap::new();
    for item in like_history.iter().filter_map(|id| items.get(id)) {
        *creators.entry(item.creator_id).or_insert(0) += 1;
    }
    creators
}

/// Band of the mean duration over the view window; medium when there is nothing to average.
fn compute_duration_preference(
    view_history: &[ItemId],
    items: &HashMap<ItemId, Item>,
) -> DurationPreference {
    let durations: Vec<f64> = view_history
        .iter()
        .filter_map(|id| items.get(id))
        .map(|item| item.duration_secs as f64)
        .collect();

    if durations.is_empty() {
        return DurationPreference::Medium;
    }
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;
    DurationPreference::from_mean_secs(mean)
}

/// 0.7 * min(views/50, 1) + 0.3 * min(likes/20, 1)
pub fn compute_profile_strength(view_count: usize, like_count: usize) -> f32 {
    let views = (view_count as f32 / 50.0).min(1.0);
    let likes = (like_count as f32 / 20.0).min(1.0);
    0.7 * views + 0.3 * likes
}
