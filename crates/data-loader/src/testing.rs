//! Test doubles for `ContentStore`.
//!
//! Compiled for this crate's tests and for downstream crates that enable
//! the `testing` feature in their dev-dependencies.

use crate::error::{StoreError, StoreResult};
use crate::store::ContentStore;
use crate::types::*;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

fn unavailable<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

/// A store whose every query fails as if the database were down.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

#[async_trait]
impl ContentStore for FailingStore {
    async fn user_exists(&self, _user_id: UserId) -> StoreResult<bool> {
        unavailable()
    }

    async fn recent_interactions(
        &self,
        _user_id: UserId,
        _kind: InteractionKind,
        _limit: usize,
    ) -> StoreResult<Vec<Interaction>> {
        unavailable()
    }

    async fn items_by_ids(&self, _ids: &[ItemId]) -> StoreResult<Vec<Item>> {
        unavailable()
    }

    async fn eligible_items(&self, _user_id: UserId, _limit: usize) -> StoreResult<Vec<Item>> {
        unavailable()
    }

    async fn item_tags(&self, _ids: &[ItemId]) -> StoreResult<HashMap<ItemId, BTreeSet<String>>> {
        unavailable()
    }

    async fn append_recommendation_log(&self, _entry: RecommendationLogEntry) -> StoreResult<()> {
        unavailable()
    }
}

/// Wraps a real store, counting queries and optionally failing selected ones.
pub struct InstrumentedStore {
    inner: Arc<dyn ContentStore>,
    eligible_calls: AtomicUsize,
    tag_calls: AtomicUsize,
    log_calls: AtomicUsize,
    fail_tags: AtomicBool,
    fail_log: AtomicBool,
}

impl InstrumentedStore {
    pub fn new(inner: Arc<dyn ContentStore>) -> Self {
        Self {
            inner,
            eligible_calls: AtomicUsize::new(0),
            tag_calls: AtomicUsize::new(0),
            log_calls: AtomicUsize::new(0),
            fail_tags: AtomicBool::new(false),
            fail_log: AtomicBool::new(false),
        }
    }

    /// Make every `item_tags` call fail.
    pub fn fail_tags(self) -> Self {
        self.fail_tags.store(true, Ordering::SeqCst);
        self
    }

    /// Make every `append_recommendation_log` call fail.
    pub fn fail_log(self) -> Self {
        self.fail_log.store(true, Ordering::SeqCst);
        self
    }

    pub fn eligible_calls(&self) -> usize {
        self.eligible_calls.load(Ordering::SeqCst)
    }

    pub fn tag_calls(&self) -> usize {
        self.tag_calls.load(Ordering::SeqCst)
    }

    pub fn log_calls(&self) -> usize {
        self.log_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentStore for InstrumentedStore {
    async fn user_exists(&self, user_id: UserId) -> StoreResult<bool> {
        self.inner.user_exists(user_id).await
    }

    async fn recent_interactions(
        &self,
        user_id: UserId,
        kind: InteractionKind,
        limit: usize,
    ) -> StoreResult<Vec<Interaction>> {
        self.inner.recent_interactions(user_id, kind, limit).await
    }

    async fn items_by_ids(&self, ids: &[ItemId]) -> StoreResult<Vec<Item>> {
        self.inner.items_by_ids(ids).await
    }

    async fn eligible_items(&self, user_id: UserId, limit: usize) -> StoreResult<Vec<Item>> {
        self.eligible_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.eligible_items(user_id, limit).await
    }

    async fn item_tags(&self, ids: &[ItemId]) -> StoreResult<HashMap<ItemId, BTreeSet<String>>> {
        self.tag_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_tags.load(Ordering::SeqCst) {
            return unavailable();
        }
        self.inner.item_tags(ids).await
    }

    async fn append_recommendation_log(&self, entry: RecommendationLogEntry) -> StoreResult<()> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_log.load(Ordering::SeqCst) {
            return unavailable();
        }
        self.inner.append_recommendation_log(entry).await
    }
}
