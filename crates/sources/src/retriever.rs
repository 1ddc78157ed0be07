//! Candidate retrieval: the eligible pool a user can be recommended from.
//!
//! An item is a candidate when it is published and public, and the user has
//! neither viewed nor disliked it. The pool is capped and ordered newest first.

use data_loader::{ContentStore, Item, StoreError, UserId};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Default upper bound on the candidate pool
pub const DEFAULT_CANDIDATE_CAP: usize = 1000;

#[derive(Clone)]
pub struct CandidateRetriever {
    store: Arc<dyn ContentStore>,
    cap: usize,
}

impl CandidateRetriever {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            cap: DEFAULT_CANDIDATE_CAP,
        }
    }

    /// Configure the pool cap (default: 1000)
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap;
        self
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Fetch up to `cap` eligible items for `user_id`, newest first.
    ///
    /// Store failures propagate; an empty pool is a valid answer.
    #[instrument(skip(self))]
    pub async fn retrieve_candidates(&self, user_id: UserId) -> Result<Vec<Item>, StoreError> {
        let mut items = self.store.eligible_items(user_id, self.cap).await?;

        // Backends are expected to filter, but a stale row must never leak through
        let before = items.len();
        items.retain(Item::is_eligible);
        if items.len() != before {
            warn!(
                "Store returned {} ineligible items for user {}",
                before - items.len(),
                user_id
            );
        }
        items.truncate(self.cap);

        debug!("Retrieved {} candidates for user {}", items.len(), user_id);
        Ok(items)
    }
}
