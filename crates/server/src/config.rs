//! Engine configuration from `RECS_`-prefixed environment variables.
//!
//! An optional `.env` file in the working directory is loaded first.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on the candidate pool
    pub candidate_limit: usize,
    /// Recent views feeding the profile
    pub view_history_limit: usize,
    /// Recent likes feeding the profile
    pub like_history_limit: usize,
    /// Recent views whose tags feed tag similarity
    pub tag_history_limit: usize,
    /// Result count when the caller does not pass one
    pub default_limit: usize,
    pub recommendation_ttl_secs: u64,
    pub profile_ttl_secs: u64,
    /// Collaborative predictions in flight per request
    pub max_concurrency: usize,
    /// Base URL of the affinity model service; neutral prior when unset
    pub scorer_url: Option<String>,
    pub scorer_timeout_ms: u64,
    /// In-memory cache when unset
    pub redis_url: Option<String>,
    /// Bound on a single Redis command
    pub cache_timeout_ms: u64,
    /// Entry bound for the in-memory cache
    pub memory_cache_capacity: u64,
    pub data_dir: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            candidate_limit: 1000,
            view_history_limit: 100,
            like_history_limit: 50,
            tag_history_limit: 20,
            default_limit: 10,
            recommendation_ttl_secs: 3600,
            profile_ttl_secs: 1800,
            max_concurrency: 16,
            scorer_url: None,
            scorer_timeout_ms: 500,
            redis_url: None,
            cache_timeout_ms: 250,
            memory_cache_capacity: 100_000,
            data_dir: "data/recs".to_string(),
        }
    }
}

impl EngineConfig {
    pub const ENV_PREFIX: &'static str = "RECS_";

    /// Read `RECS_*` variables, falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::prefixed(Self::ENV_PREFIX).from_env::<EngineConfig>()
    }

    pub fn recommendation_ttl(&self) -> Duration {
        Duration::from_secs(self.recommendation_ttl_secs)
    }

    pub fn profile_ttl(&self) -> Duration {
        Duration::from_secs(self.profile_ttl_secs)
    }

    pub fn scorer_timeout(&self) -> Duration {
        Duration::from_millis(self.scorer_timeout_ms)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = envy::prefixed(EngineConfig::ENV_PREFIX)
            .from_iter::<_, EngineConfig>(vars(&[("PATH", "/usr/bin")]))
            .unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.recommendation_ttl(), Duration::from_secs(3600));
        assert_eq!(config.profile_ttl(), Duration::from_secs(1800));
    }

    #[test]
    fn test_overrides() {
        let config = envy::prefixed(EngineConfig::ENV_PREFIX)
            .from_iter::<_, EngineConfig>(vars(&[
                ("RECS_CANDIDATE_LIMIT", "250"),
                ("RECS_REDIS_URL", "redis://cache:6379"),
                ("RECS_SCORER_TIMEOUT_MS", "1200"),
                ("RECS_CACHE_TIMEOUT_MS", "50"),
                ("RECS_MEMORY_CACHE_CAPACITY", "5000"),
            ]))
            .unwrap();
        assert_eq!(config.candidate_limit, 250);
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.scorer_timeout(), Duration::from_millis(1200));
        assert_eq!(config.cache_timeout(), Duration::from_millis(50));
        assert_eq!(config.memory_cache_capacity, 5000);
        assert_eq!(config.default_limit, 10);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let result = envy::prefixed(EngineConfig::ENV_PREFIX)
            .from_iter::<_, EngineConfig>(vars(&[("RECS_MAX_CONCURRENCY", "lots")]));
        assert!(result.is_err());
    }
}
