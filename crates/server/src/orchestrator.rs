//! # Recommendation Service
//!
//! The single public entry point. Per request:
//! 1. Look up (user, limit) in the ranking cache; a hit returns immediately
//! 2. Load the profile (profile cache, else build) and retrieve candidates,
//!    concurrently
//! 3. Score every candidate and fuse signals
//! 4. Sort, truncate and explain
//! 5. Store the list and append an audit record, both in detached tasks
//!
//! Degraded paths (unknown user, scorer down, cache down, audit write
//! failing) are logged and absorbed. Only a failing primary store reaches
//! the caller.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use data_loader::{ContentStore, DataIndex, RecommendationLogEntry, UserId};
use ml_client::{CollaborativeScorer, HttpAffinityClient, NeutralScorer};
use pipeline::{ranker, ExplainedRecommendation, MultiSignalScorer, RequestContext};
use sources::{CandidateRetriever, ProfileBuilder, ProfileError, UserProfile};

use crate::cache::{CacheOutcome, InMemoryKvStore, KvStore, RankingCache, RedisKvStore};
use crate::config::EngineConfig;
use crate::error::{RecommendationError, SetupError};

/// Source of "now" for recency, time-of-day and audit timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Explicitly wired service context: store, scorer, cache and clock.
#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<dyn ContentStore>,
    profiles: ProfileBuilder,
    retriever: CandidateRetriever,
    scorer: MultiSignalScorer,
    cache: RankingCache,
    clock: Arc<dyn Clock>,
    default_limit: usize,
}

impl RecommendationService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        collaborative: Arc<dyn CollaborativeScorer>,
        kv: Arc<dyn KvStore>,
        config: &EngineConfig,
    ) -> Self {
        let profiles = ProfileBuilder::new(store.clone())
            .with_view_window(config.view_history_limit)
            .with_like_window(config.like_history_limit);
        let retriever = CandidateRetriever::new(store.clone()).with_cap(config.candidate_limit);
        let scorer = MultiSignalScorer::new(store.clone(), collaborative)
            .with_max_concurrency(config.max_concurrency)
            .with_tag_history(config.tag_history_limit);
        let cache = RankingCache::new(kv, config.recommendation_ttl(), config.profile_ttl());

        Self {
            store,
            profiles,
            retriever,
            scorer,
            cache,
            clock: Arc::new(SystemClock),
            default_limit: config.default_limit,
        }
    }

    /// Wire a service from configuration: dataset, cache backend and scorer.
    pub async fn from_config(config: &EngineConfig) -> Result<Self, SetupError> {
        let start = Instant::now();
        let index = DataIndex::load_from_files(Path::new(&config.data_dir))?;
        let (users, items, interactions) = index.counts();
        info!(
            "Loaded {} users, {} items, {} interactions from {} in {:.2?}",
            users,
            items,
            interactions,
            config.data_dir,
            start.elapsed()
        );
        Self::with_store(Arc::new(index), config).await
    }

    /// Wire a service over an existing store, picking cache and scorer from `config`.
    pub async fn with_store(store: Arc<dyn ContentStore>, config: &EngineConfig) -> Result<Self, SetupError> {
        let kv: Arc<dyn KvStore> = match &config.redis_url {
            Some(url) => {
                info!("Using Redis ranking cache at {}", url);
                Arc::new(RedisKvStore::connect(url, config.cache_timeout()).await?)
            }
            None => {
                info!("Using in-memory ranking cache ({} entries)", config.memory_cache_capacity);
                Arc::new(InMemoryKvStore::with_capacity(config.memory_cache_capacity))
            }
        };

        let collaborative: Arc<dyn CollaborativeScorer> = match &config.scorer_url {
            Some(url) => Arc::new(HttpAffinityClient::new(url.as_str(), config.scorer_timeout())?),
            None => {
                warn!("No scorer URL configured, collaborative signal uses the neutral prior");
                Arc::new(NeutralScorer)
            }
        };

        Ok(Self::new(store, collaborative, kv, config))
    }

    /// Replace the clock (default: system time).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Ranked, explained recommendations for `user_id`.
    ///
    /// `limit` defaults to the configured default (10). Repeated calls with
    /// the same (user, limit) inside the cache TTL return the cached list
    /// verbatim, whatever the context.
    pub async fn get_personalized_recommendations(
        &self,
        user_id: UserId,
        limit: Option<usize>,
        context: RequestContext,
    ) -> Result<Vec<ExplainedRecommendation>, RecommendationError> {
        let start = Instant::now();
        let limit = limit.unwrap_or(self.default_limit);

        let (recommendations, outcome) = self
            .cache
            .get_or_compute(user_id, limit, || self.compute(user_id, limit, context))
            .await?;

        if outcome == CacheOutcome::Computed && !recommendations.is_empty() {
            self.spawn_audit_log(user_id, &recommendations);
        }

        info!(
            "Served {} recommendations for user {} ({:?}) in {:.2?}",
            recommendations.len(),
            user_id,
            outcome,
            start.elapsed()
        );
        Ok(recommendations)
    }

    /// Cached profile, else a freshly built one (cached in the background).
    ///
    /// Unknown users get an empty profile; store failures propagate.
    pub async fn load_profile(&self, user_id: UserId) -> Result<UserProfile, RecommendationError> {
        if let Some(profile) = self.cache.get_profile(user_id).await {
            return Ok(profile);
        }

        match self.profiles.build_profile(user_id).await {
            Ok(profile) => {
                self.cache.spawn_set_profile(profile.clone());
                Ok(profile)
            }
            Err(ProfileError::NotFound(id)) => {
                warn!("User {} not found, ranking without a profile", id);
                Ok(UserProfile::empty(user_id))
            }
            Err(ProfileError::Store(e)) => Err(RecommendationError::StoreFailure(e)),
        }
    }

    async fn compute(
        &self,
        user_id: UserId,
        limit: usize,
        context: RequestContext,
    ) -> Result<Vec<ExplainedRecommendation>, RecommendationError> {
        let stage = Instant::now();
        let (profile, candidates) = tokio::join!(
            self.load_profile(user_id),
            self.retriever.retrieve_candidates(user_id),
        );
        let profile = Arc::new(profile?);
        let candidates = candidates?;
        info!(
            "Loaded profile (strength {:.2}) and {} candidates for user {} in {:.2?}",
            profile.profile_strength,
            candidates.len(),
            user_id,
            stage.elapsed()
        );

        if candidates.is_empty() {
            info!("{} for user {}", RecommendationError::Empty, user_id);
            return Ok(Vec::new());
        }

        let stage = Instant::now();
        let scored = self
            .scorer
            .score_candidates(user_id, candidates, profile.clone(), context, self.clock.now())
            .await
            .map_err(|e| RecommendationError::Internal(e.to_string()))?;
        info!("Scored {} candidates in {:.2?}", scored.len(), stage.elapsed());

        Ok(ranker::rank(scored, &profile, limit))
    }

    /// Append the audit record without holding up the response.
    fn spawn_audit_log(&self, user_id: UserId, recommendations: &[ExplainedRecommendation]) {
        let store = self.store.clone();
        let item_ids = recommendations.iter().map(|r| r.item.id).collect();
        let entry = RecommendationLogEntry::new(user_id, item_ids, self.clock.now());

        tokio::spawn(async move {
            if let Err(e) = store.append_recommendation_log(entry).await {
                warn!("Failed to write recommendation log for user {}: {}", user_id, e);
            }
        });
    }
}
