//! Ranking cache over a key-value store.
//!
//! Two namespaces with independent TTLs:
//! - recs:{user_id}:{limit} → explained recommendation list (1 hour)
//! - profile:{user_id} → user profile (30 minutes)
//!
//! Entries are immutable once written and expire only by TTL. Writes run in
//! detached tasks. Any backend failure is logged and treated as a miss; the
//! cache never fails a request.

use async_trait::async_trait;
use data_loader::UserId;
use moka::future::Cache;
use moka::Expiry;
use pipeline::ExplainedRecommendation;
use redis::aio::ConnectionManager;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sources::UserProfile;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Entry bound for the in-memory store when none is configured.
pub const DEFAULT_MEMORY_CAPACITY: u64 = 100_000;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        CacheError::Backend(e.to_string())
    }
}

/// `GET` / `SETEX` over string values.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_ex(&self, key: &str, ttl: Duration, value: String) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
struct TimedValue {
    value: String,
    ttl: Duration,
}

/// Each entry lives for the TTL it was written with; a rewrite restarts it.
struct PerEntryTtl;

impl Expiry<String, TimedValue> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &TimedValue, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &TimedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Process-local store on a bounded moka cache. Expired entries are evicted,
/// not just hidden.
#[derive(Clone)]
pub struct InMemoryKvStore {
    entries: Cache<String, TimedValue>,
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_entries: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();
        Self { entries }
    }

    /// Number of live entries after pending evictions have run.
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).await.map(|entry| entry.value))
    }

    async fn set_ex(&self, key: &str, ttl: Duration, value: String) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), TimedValue { value, ttl }).await;
        Ok(())
    }
}

/// Redis-backed store using a shared connection manager. Every command is
/// bounded by `op_timeout`.
#[derive(Clone)]
pub struct RedisKvStore {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl RedisKvStore {
    pub async fn connect(redis_url: &str, op_timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = tokio::time::timeout(op_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout(op_timeout))??;
        Ok(Self { conn, op_timeout })
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, op).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CacheError::Timeout(self.op_timeout)),
        }
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        self.bounded(
            redis::cmd("GET")
                .arg(key)
                .query_async::<_, Option<String>>(&mut conn),
        )
        .await
    }

    async fn set_ex(&self, key: &str, ttl: Duration, value: String) -> Result<(), CacheError> {
        // SETEX rejects a zero TTL
        let secs = ttl.as_secs().max(1);
        let mut conn = self.conn.clone();
        self.bounded(
            redis::cmd("SETEX")
                .arg(key)
                .arg(secs)
                .arg(value)
                .query_async::<_, ()>(&mut conn),
        )
        .await
    }
}

/// Whether a result came from the cache or was just computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Computed,
}

/// Typed cache for profiles and ranked lists.
#[derive(Clone)]
pub struct RankingCache {
    store: Arc<dyn KvStore>,
    recommendation_ttl: Duration,
    profile_ttl: Duration,
}

impl RankingCache {
    pub fn new(store: Arc<dyn KvStore>, recommendation_ttl: Duration, profile_ttl: Duration) -> Self {
        Self {
            store,
            recommendation_ttl,
            profile_ttl,
        }
    }

    pub fn recommendations_key(user_id: UserId, limit: usize) -> String {
        format!("recs:{}:{}", user_id, limit)
    }

    pub fn profile_key(user_id: UserId) -> String {
        format!("profile:{}", user_id)
    }

    pub async fn get_recommendations(&self, user_id: UserId, limit: usize) -> Option<Vec<ExplainedRecommendation>> {
        self.get_json(&Self::recommendations_key(user_id, limit)).await
    }

    pub async fn set_recommendations(&self, user_id: UserId, limit: usize, recommendations: &[ExplainedRecommendation]) {
        self.set_json(
            &Self::recommendations_key(user_id, limit),
            self.recommendation_ttl,
            recommendations,
        )
        .await
    }

    pub async fn get_profile(&self, user_id: UserId) -> Option<UserProfile> {
        self.get_json(&Self::profile_key(user_id)).await
    }

    pub async fn set_profile(&self, profile: &UserProfile) {
        self.set_json(&Self::profile_key(profile.user_id), self.profile_ttl, profile)
            .await
    }

    /// Store the list in a detached task; the caller never waits on the backend.
    pub fn spawn_set_recommendations(&self, user_id: UserId, limit: usize, recommendations: Vec<ExplainedRecommendation>) {
        let cache = self.clone();
        tokio::spawn(async move {
            cache.set_recommendations(user_id, limit, &recommendations).await;
        });
    }

    /// Store the profile in a detached task.
    pub fn spawn_set_profile(&self, profile: UserProfile) {
        let cache = self.clone();
        tokio::spawn(async move {
            cache.set_profile(&profile).await;
        });
    }

    /// Return the cached list for (user, limit), or compute it and store it
    /// in the background.
    ///
    /// Empty results are returned but not stored.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        user_id: UserId,
        limit: usize,
        compute: F,
    ) -> Result<(Vec<ExplainedRecommendation>, CacheOutcome), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ExplainedRecommendation>, E>>,
    {
        if let Some(cached) = self.get_recommendations(user_id, limit).await {
            return Ok((cached, CacheOutcome::Hit));
        }

        let computed = compute().await?;
        if !computed.is_empty() {
            self.spawn_set_recommendations(user_id, limit, computed.clone());
        }
        Ok((computed, CacheOutcome::Computed))
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss for {}", key);
                return None;
            }
            Err(e) => {
                warn!("Cache GET failed on {} for {}, treating as miss: {}", self.store.name(), key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!("Cache hit for {}", key);
                Some(value)
            }
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                None
            }
        }
    }

    async fn set_json<T: Serialize + ?Sized>(&self, key: &str, ttl: Duration, value: &T) {
        let result = match serde_json::to_string(value) {
            Ok(json) => self.store.set_ex(key, ttl, json).await,
            Err(e) => Err(CacheError::from(e)),
        };

        match result {
            Ok(()) => debug!("Cached {} with TTL={}s", key, ttl.as_secs()),
            Err(e) => warn!("Cache SETEX failed on {} for {}: {}", self.store.name(), key, e),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Every call fails as if the cache server were unreachable.
    #[derive(Debug, Default)]
    pub struct FailingKvStore {
        calls: AtomicUsize,
    }

    impl FailingKvStore {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl KvStore for FailingKvStore {
        fn name(&self) -> &str {
            "failing"
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::Backend("connection refused".to_string()))
        }

        async fn set_ex(&self, _key: &str, _ttl: Duration, _value: String) -> Result<(), CacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::Backend("connection refused".to_string()))
        }
    }

    /// Always misses; every write hangs for `write_delay`.
    #[derive(Debug)]
    pub struct StallingKvStore {
        write_delay: Duration,
        writes_started: AtomicUsize,
    }

    impl StallingKvStore {
        pub fn new(write_delay: Duration) -> Self {
            Self {
                write_delay,
                writes_started: AtomicUsize::new(0),
            }
        }

        pub fn writes_started(&self) -> usize {
            self.writes_started.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl KvStore for StallingKvStore {
        fn name(&self) -> &str {
            "stalling"
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Ok(None)
        }

        async fn set_ex(&self, _key: &str, _ttl: Duration, _value: String) -> Result<(), CacheError> {
            self.writes_started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.write_delay).await;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FailingKvStore, StallingKvStore};
    use super::*;
    use chrono::{TimeZone, Utc};
    use data_loader::{Item, ItemStatus, Visibility};
    use pipeline::ScoreBreakdown;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recommendation(id: u64) -> ExplainedRecommendation {
        ExplainedRecommendation {
            item: Item {
                id,
                creator_id: 1,
                category: "tech".to_string(),
                duration_secs: 600,
                view_count: 10,
                like_count: 1,
                created_at: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
                status: ItemStatus::Published,
                visibility: Visibility::Public,
                tags: ["rust".to_string()].into_iter().collect(),
            },
            score: 0.5,
            score_breakdown: ScoreBreakdown::fuse(0.5, 0.5, 0.5, 0.5, 0.5),
            explanation: "Recommended for you".to_string(),
            confidence: 0.5,
        }
    }

    fn memory_cache() -> (Arc<InMemoryKvStore>, RankingCache) {
        let store = Arc::new(InMemoryKvStore::new());
        let cache = RankingCache::new(store.clone(), Duration::from_secs(3600), Duration::from_secs(1800));
        (store, cache)
    }

    /// Let detached writes run.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_keys() {
        assert_eq!(RankingCache::recommendations_key(7, 10), "recs:7:10");
        assert_eq!(RankingCache::profile_key(7), "profile:7");
    }

    #[tokio::test]
    async fn test_in_memory_expiry() {
        let store = InMemoryKvStore::new();
        store.set_ex("k", Duration::from_millis(300), "v".to_string()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_in_memory_rewrite_restarts_ttl() {
        let store = InMemoryKvStore::new();
        store.set_ex("k", Duration::from_millis(200), "old".to_string()).await.unwrap();
        store.set_ex("k", Duration::from_secs(60), "new".to_string()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_expired_entries_are_evicted() {
        let store = InMemoryKvStore::new();
        for user in 0..1000 {
            store
                .set_ex(&RankingCache::recommendations_key(user, 10), Duration::from_millis(100), "[]".to_string())
                .await
                .unwrap();
        }
        assert_eq!(store.len().await, 1000);

        // Expiry timers are processed at roughly one-second granularity
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let store = InMemoryKvStore::with_capacity(50);
        for user in 0..500 {
            store
                .set_ex(&RankingCache::profile_key(user), Duration::from_secs(60), "{}".to_string())
                .await
                .unwrap();
        }
        assert!(store.len().await <= 50);
    }

    #[tokio::test]
    async fn test_get_or_compute_hit_skips_compute() {
        let (_, cache) = memory_cache();
        let computations = AtomicUsize::new(0);
        let compute = || async {
            computations.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(vec![recommendation(1), recommendation(2)])
        };

        let (first, outcome) = cache.get_or_compute(1, 10, compute).await.unwrap();
        assert_eq!(outcome, CacheOutcome::Computed);
        settle().await;

        let (second, outcome) = cache
            .get_or_compute(1, 10, || async {
                computations.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(Vec::new())
            })
            .await
            .unwrap();
        assert_eq!(outcome, CacheOutcome::Hit);
        assert_eq!(first, second);
        assert_eq!(computations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_compute_does_not_wait_for_the_write() {
        let store = Arc::new(StallingKvStore::new(Duration::from_secs(30)));
        let cache = RankingCache::new(store.clone(), Duration::from_secs(3600), Duration::from_secs(1800));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            cache.get_or_compute(1, 10, || async { Ok::<_, String>(vec![recommendation(1)]) }),
        )
        .await;

        let (recs, outcome) = result.expect("response waited on the cache write").unwrap();
        assert_eq!(outcome, CacheOutcome::Computed);
        assert_eq!(recs.len(), 1);
        settle().await;
        assert_eq!(store.writes_started(), 1);
    }

    #[tokio::test]
    async fn test_limit_is_part_of_key() {
        let (_, cache) = memory_cache();
        cache.set_recommendations(1, 10, &[recommendation(1)]).await;
        assert!(cache.get_recommendations(1, 10).await.is_some());
        assert!(cache.get_recommendations(1, 5).await.is_none());
        assert!(cache.get_recommendations(2, 10).await.is_none());
    }

    #[tokio::test]
    async fn test_independent_ttls() {
        let store = Arc::new(InMemoryKvStore::new());
        let cache = RankingCache::new(store, Duration::from_millis(800), Duration::from_millis(200));
        cache.set_recommendations(1, 10, &[recommendation(1)]).await;
        cache.set_profile(&UserProfile::empty(1)).await;

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(cache.get_profile(1).await.is_none());
        assert!(cache.get_recommendations(1, 10).await.is_some());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(cache.get_recommendations(1, 10).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_result_not_stored() {
        let (store, cache) = memory_cache();
        let (recs, _) = cache
            .get_or_compute(1, 10, || async { Ok::<_, String>(Vec::new()) })
            .await
            .unwrap();
        settle().await;
        assert!(recs.is_empty());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_compute_error_propagates() {
        let (store, cache) = memory_cache();
        let result = cache
            .get_or_compute(1, 10, || async { Err::<Vec<ExplainedRecommendation>, _>("db down") })
            .await;
        settle().await;
        assert_eq!(result, Err("db down"));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_backend_failure_is_a_miss() {
        let store = Arc::new(FailingKvStore::default());
        let cache = RankingCache::new(store.clone(), Duration::from_secs(60), Duration::from_secs(60));

        let (recs, outcome) = cache
            .get_or_compute(1, 10, || async { Ok::<_, String>(vec![recommendation(3)]) })
            .await
            .unwrap();
        settle().await;
        assert_eq!(outcome, CacheOutcome::Computed);
        assert_eq!(recs.len(), 1);
        // One GET, one SETEX
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let (store, cache) = memory_cache();
        store
            .set_ex(&RankingCache::profile_key(1), Duration::from_secs(60), "not json".to_string())
            .await
            .unwrap();
        assert!(cache.get_profile(1).await.is_none());
    }
}
