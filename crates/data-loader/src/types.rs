//! Core domain types for the content catalog.
//!
//! Every record the engine reads from the relational store has an explicit
//! typed shape here: users, content items, interactions and the append-only
//! recommendation log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u64;

/// Unique identifier for a content item (a video)
pub type ItemId = u64;

/// Unique identifier for the profile that published an item
pub type CreatorId = u64;

/// Version tag written into every recommendation log entry
pub const ALGORITHM_VERSION: &str = "multi_signal_v1";

// =============================================================================
// User-related Types
// =============================================================================

/// A registered user of the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

// =============================================================================
// Item-related Types
// =============================================================================

/// Publication state of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Published,
    Draft,
    Processing,
    Archived,
}

/// Who may see an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Unlisted,
    Private,
}

/// A content item that can be recommended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub creator_id: CreatorId,
    pub category: String,
    /// Running time in seconds
    pub duration_secs: u32,
    pub view_count: u64,
    pub like_count: u64,
    pub created_at: DateTime<Utc>,
    pub status: ItemStatus,
    pub visibility: Visibility,
    pub tags: BTreeSet<String>,
}

impl Item {
    /// Only published, public items may ever be recommended.
    pub fn is_eligible(&self) -> bool {
        self.status == ItemStatus::Published && self.visibility == Visibility::Public
    }
}

// =============================================================================
// Interaction Types
// =============================================================================

/// The kind of engagement a user had with an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    View,
    Like,
    Dislike,
    Share,
    Comment,
}

impl InteractionKind {
    /// Kinds that permanently remove an item from a user's candidate pool.
    pub fn excludes_from_candidates(self) -> bool {
        matches!(self, InteractionKind::View | InteractionKind::Dislike)
    }
}

/// A single recorded interaction between a user and an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub kind: InteractionKind,
    pub occurred_at: DateTime<Utc>,
}

// =============================================================================
// Recommendation Log
// =============================================================================

/// Append-only audit record of what was served to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationLogEntry {
    pub user_id: UserId,
    pub item_ids: Vec<ItemId>,
    pub algorithm_version: String,
    pub logged_at: DateTime<Utc>,
}

impl RecommendationLogEntry {
    pub fn new(user_id: UserId, item_ids: Vec<ItemId>, logged_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            item_ids,
            algorithm_version: ALGORITHM_VERSION.to_string(),
            logged_at,
        }
    }
}

// =============================================================================
// DataIndex - In-memory relational store
// =============================================================================

/// Holds the whole catalog in memory with the indices the engine queries.
///
/// Users, items and interactions are read-only after loading. The
/// recommendation log is the single write path and sits behind a mutex.
#[derive(Debug)]
pub struct DataIndex {
    pub(crate) users: HashMap<UserId, User>,
    pub(crate) items: HashMap<ItemId, Item>,

    /// Interactions per user, kept sorted most-recent-first
    pub(crate) user_interactions: HashMap<UserId, Vec<Interaction>>,

    /// Eligible items as (created_at, id), newest first and id ascending on ties
    pub(crate) eligible_by_recency: Vec<(DateTime<Utc>, ItemId)>,

    pub(crate) recommendation_log: Mutex<Vec<RecommendationLogEntry>>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            items: HashMap::new(),
            user_interactions: HashMap::new(),
            eligible_by_recency: Vec::new(),
            recommendation_log: Mutex::new(Vec::new()),
        }
    }

    pub fn get_user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn get_item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// All interactions of a user, most recent first.
    ///
    /// Returns an empty slice if the user has none.
    pub fn get_user_interactions(&self, user_id: UserId) -> &[Interaction] {
        self.user_interactions
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All item ids in the catalog, ascending.
    pub fn get_all_item_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.items.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get all user IDs, ascending
    pub fn get_all_user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.users.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn insert_user(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    /// Insert an item and keep the recency index current.
    pub fn insert_item(&mut self, item: Item) {
        if let Some(previous) = self.items.get(&item.id) {
            let key = (previous.created_at, previous.id);
            self.eligible_by_recency.retain(|entry| *entry != key);
        }
        if item.is_eligible() {
            let key = (item.created_at, item.id);
            let pos = self.eligible_by_recency.partition_point(|(created_at, id)| {
                *created_at > key.0 || (*created_at == key.0 && *id < key.1)
            });
            self.eligible_by_recency.insert(pos, key);
        }
        self.items.insert(item.id, item);
    }

    /// Insert an interaction, keeping the per-user list most-recent-first.
    pub fn insert_interaction(&mut self, interaction: Interaction) {
        let list = self
            .user_interactions
            .entry(interaction.user_id)
            .or_insert_with(Vec::new);
        let pos = list.partition_point(|existing| existing.occurred_at >= interaction.occurred_at);
        list.insert(pos, interaction);
    }

    /// Snapshot of every log entry written so far.
    pub fn recommendation_log(&self) -> Vec<RecommendationLogEntry> {
        match self.recommendation_log.lock() {
            Ok(log) => log.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Get counts for debugging/validation: (users, items, interactions)
    pub fn counts(&self) -> (usize, usize, usize) {
        let total_interactions = self.user_interactions.values().map(|v| v.len()).sum();
        (self.users.len(), self.items.len(), total_interactions)
    }
}

impl Default for DataIndex {
    fn default() -> Self {
        Self::new()
    }
}
