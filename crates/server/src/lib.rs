//! Server crate for the recommendation engine.
//!
//! This crate wires every component behind `RecommendationService`, the
//! single public entry point, together with the ranking cache, audit log
//! and configuration.

pub mod cache;
pub mod config;
pub mod error;
pub mod orchestrator;

pub use cache::{CacheError, CacheOutcome, InMemoryKvStore, KvStore, RankingCache, RedisKvStore};
pub use config::EngineConfig;
pub use error::{RecommendationError, SetupError};
pub use orchestrator::{Clock, FixedClock, RecommendationService, SystemClock};
