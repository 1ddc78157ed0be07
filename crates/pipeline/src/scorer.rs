//! Multi-signal scoring of a candidate pool.
//!
//! Per request:
//! 1. One batched tag lookup for the user's most recent views
//! 2. Collaborative predictions, at most `max_concurrency` in flight
//! 3. Pure fusion of all five signals on the rayon pool
//!
//! Failures in steps 1 and 2 degrade the affected signal; they never drop
//! a candidate or fail the request.

use crate::context::RequestContext;
use crate::fusion::ScoreBreakdown;
use crate::signals::{ContentSignal, ContextSignal, PopularitySignal, RecencySignal};
use crate::traits::{Signal, SignalInput};
use chrono::{DateTime, Utc};
use data_loader::{ContentStore, Item, ItemId, UserId};
use futures::stream::{self, StreamExt};
use ml_client::{CollaborativeScorer, NEUTRAL_AFFINITY};
use rayon::prelude::*;
use sources::UserProfile;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Default number of collaborative predictions in flight per request
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Default number of recent views whose tags form the user's tag profile
pub const DEFAULT_TAG_HISTORY: usize = 20;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("scoring worker failed: {0}")]
    Worker(String),
}

/// A candidate together with its score breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    pub item: Item,
    pub breakdown: ScoreBreakdown,
}

#[derive(Clone)]
pub struct MultiSignalScorer {
    store: Arc<dyn ContentStore>,
    collaborative: Arc<dyn CollaborativeScorer>,
    max_concurrency: usize,
    tag_history: usize,
}

impl MultiSignalScorer {
    pub fn new(store: Arc<dyn ContentStore>, collaborative: Arc<dyn CollaborativeScorer>) -> Self {
        Self {
            store,
            collaborative,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            tag_history: DEFAULT_TAG_HISTORY,
        }
    }

    /// Configure how many predictions may be in flight (default: 16)
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Configure how many recent views feed tag similarity (default: 20)
    pub fn with_tag_history(mut self, tag_history: usize) -> Self {
        self.tag_history = tag_history;
        self
    }

    /// Score a single candidate.
    pub async fn score(
        &self,
        user_id: UserId,
        item: &Item,
        profile: &UserProfile,
        request: &RequestContext,
        now: DateTime<Utc>,
    ) -> ScoreBreakdown {
        let (history_tags, collaborative) = tokio::join!(
            self.history_tags(profile),
            self.predict(user_id, item.id),
        );
        let input = SignalInput {
            item,
            profile,
            history_tags: &history_tags,
            request,
            now,
        };
        fuse_signals(collaborative.unwrap_or(NEUTRAL_AFFINITY), &input)
    }

    /// Score every candidate, preserving input order.
    pub async fn score_candidates(
        &self,
        user_id: UserId,
        candidates: Vec<Item>,
        profile: Arc<UserProfile>,
        request: RequestContext,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredItem>, ScoringError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<ItemId> = candidates.iter().map(|item| item.id).collect();
        let (history_tags, collaborative) = tokio::join!(
            self.history_tags(&profile),
            self.predict_all(user_id, &ids),
        );

        // Pure arithmetic from here on; keep it off the async workers
        let scored = tokio::task::spawn_blocking(move || {
            candidates
                .into_par_iter()
                .zip(collaborative.into_par_iter())
                .map(|(item, collaborative)| {
                    let input = SignalInput {
                        item: &item,
                        profile: &profile,
                        history_tags: &history_tags,
                        request: &request,
                        now,
                    };
                    let breakdown = fuse_signals(collaborative, &input);
                    ScoredItem { item, breakdown }
                })
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| ScoringError::Worker(e.to_string()))?;

        debug!("Scored {} candidates for user {}", scored.len(), user_id);
        Ok(scored)
    }

    /// Union of tags over the most recent views. Empty if the lookup fails.
    pub async fn history_tags(&self, profile: &UserProfile) -> BTreeSet<String> {
        let recent: Vec<ItemId> = profile.view_history.iter().take(self.tag_history).copied().collect();
        if recent.is_empty() {
            return BTreeSet::new();
        }

        match self.store.item_tags(&recent).await {
            Ok(tags) => tags.into_values().flatten().collect(),
            Err(e) => {
                warn!(
                    "Tag lookup failed for user {}, tag similarity disabled: {}",
                    profile.user_id, e
                );
                BTreeSet::new()
            }
        }
    }

    async fn predict(&self, user_id: UserId, item_id: ItemId) -> Option<f32> {
        match self.collaborative.predict(user_id, item_id).await {
            Ok(score) => Some(score),
            Err(e) => {
                debug!(
                    "Scorer '{}' failed for user {} item {}: {}",
                    self.collaborative.name(),
                    user_id,
                    item_id,
                    e
                );
                None
            }
        }
    }

    /// One prediction per id, in order, neutral prior where unavailable.
    async fn predict_all(&self, user_id: UserId, ids: &[ItemId]) -> Vec<f32> {
        let predictions: Vec<Option<f32>> = stream::iter(ids.iter().copied())
            .map(|item_id| self.predict(user_id, item_id))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let unavailable = predictions.iter().filter(|p| p.is_none()).count();
        if unavailable > 0 {
            warn!(
                "Collaborative scorer '{}' unavailable for {}/{} candidates, using {}",
                self.collaborative.name(),
                unavailable,
                predictions.len(),
                NEUTRAL_AFFINITY
            );
        }

        predictions
            .into_iter()
            .map(|p| p.unwrap_or(NEUTRAL_AFFINITY))
            .collect()
    }
}

/// Evaluate the four pure signals and fuse them with `collaborative`.
pub fn fuse_signals(collaborative: f32, input: &SignalInput<'_>) -> ScoreBreakdown {
    ScoreBreakdown::fuse(
        collaborative,
        ContentSignal.evaluate(input),
        ContextSignal.evaluate(input),
        PopularitySignal.evaluate(input),
        RecencySignal.evaluate(input),
    )
}
