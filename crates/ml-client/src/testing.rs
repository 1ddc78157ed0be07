//! Scorer test doubles.

use crate::{CollaborativeScorer, ScorerError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns a per-item score, or `default` for items it has no entry for.
#[derive(Debug, Default)]
pub struct FixedScorer {
    scores: HashMap<u64, f32>,
    default: f32,
    calls: AtomicUsize,
}

impl FixedScorer {
    pub fn constant(score: f32) -> Self {
        Self {
            scores: HashMap::new(),
            default: score,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_score(mut self, item_id: u64, score: f32) -> Self {
        self.scores.insert(item_id, score);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CollaborativeScorer for FixedScorer {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn predict(&self, _user_id: u64, item_id: u64) -> Result<f32, ScorerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scores.get(&item_id).copied().unwrap_or(self.default))
    }
}

/// Fails every prediction as if the model service were down.
#[derive(Debug, Default)]
pub struct FailingScorer;

#[async_trait]
impl CollaborativeScorer for FailingScorer {
    fn name(&self) -> &str {
        "failing"
    }

    async fn predict(&self, _user_id: u64, _item_id: u64) -> Result<f32, ScorerError> {
        Err(ScorerError::ConnectionError("connection refused".to_string()))
    }
}
