//! The relational-store contract the recommendation engine reads from.
//!
//! Every query the engine issues goes through `ContentStore`, so the
//! in-memory `DataIndex`, a SQL backend, or a test double are
//! interchangeable behind an `Arc<dyn ContentStore>`.

use crate::error::{StoreError, StoreResult};
use crate::types::*;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Read queries plus the single write-only log append.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Whether the user exists at all.
    async fn user_exists(&self, user_id: UserId) -> StoreResult<bool>;

    /// The `limit` most recent interactions of `kind`, most recent first.
    async fn recent_interactions(
        &self,
        user_id: UserId,
        kind: InteractionKind,
        limit: usize,
    ) -> StoreResult<Vec<Interaction>>;

    /// Look up items by id. Unknown ids are skipped; order follows `ids`.
    async fn items_by_ids(&self, ids: &[ItemId]) -> StoreResult<Vec<Item>>;

    /// Published, public items the user has neither viewed nor disliked,
    /// most recent first, at most `limit`.
    async fn eligible_items(&self, user_id: UserId, limit: usize) -> StoreResult<Vec<Item>>;

    /// Tag sets for many items in one round trip.
    async fn item_tags(&self, ids: &[ItemId]) -> StoreResult<HashMap<ItemId, BTreeSet<String>>>;

    /// Append an audit record. Never read back by the engine.
    async fn append_recommendation_log(&self, entry: RecommendationLogEntry) -> StoreResult<()>;
}

#[async_trait]
impl ContentStore for DataIndex {
    async fn user_exists(&self, user_id: UserId) -> StoreResult<bool> {
        Ok(self.users.contains_key(&user_id))
    }

    async fn recent_interactions(
        &self,
        user_id: UserId,
        kind: InteractionKind,
        limit: usize,
    ) -> StoreResult<Vec<Interaction>> {
        Ok(self
            .get_user_interactions(user_id)
            .iter()
            .filter(|interaction| interaction.kind == kind)
            .take(limit)
            .copied()
            .collect())
    }

    async fn items_by_ids(&self, ids: &[ItemId]) -> StoreResult<Vec<Item>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.items.get(id).cloned())
            .collect())
    }

    async fn eligible_items(&self, user_id: UserId, limit: usize) -> StoreResult<Vec<Item>> {
        let excluded: HashSet<ItemId> = self
            .get_user_interactions(user_id)
            .iter()
            .filter(|interaction| interaction.kind.excludes_from_candidates())
            .map(|interaction| interaction.item_id)
            .collect();

        let items: Vec<Item> = self
            .eligible_by_recency
            .iter()
            .filter(|(_, id)| !excluded.contains(id))
            .filter_map(|(_, id)| self.items.get(id))
            .take(limit)
            .cloned()
            .collect();

        debug!(
            "Eligible items for user {}: {} (excluded {})",
            user_id,
            items.len(),
            excluded.len()
        );
        Ok(items)
    }

    async fn item_tags(&self, ids: &[ItemId]) -> StoreResult<HashMap<ItemId, BTreeSet<String>>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.items.get(id).map(|item| (*id, item.tags.clone())))
            .collect())
    }

    async fn append_recommendation_log(&self, entry: RecommendationLogEntry) -> StoreResult<()> {
        let mut log = self
            .recommendation_log
            .lock()
            .map_err(|e| StoreError::Internal(format!("recommendation log poisoned: {}", e)))?;
        log.push(entry);
        Ok(())
    }
}
