//! Scoring and ranking of candidate items.
//!
//! This crate provides:
//! - `RequestContext`: per-request options (time of day, device)
//! - The `Signal` trait and the four pure signals: content, context,
//!   popularity, recency
//! - `ScoreBreakdown::fuse`: fixed-weight fusion with the collaborative score
//! - `MultiSignalScorer`: batched, bounded-concurrency scoring of a pool
//! - `ranker`: deterministic ordering, truncation and explanations
//!
//! ## Architecture
//! Scoring runs in stages:
//! 1. Tags for the user's recent views are fetched once
//! 2. Collaborative predictions are fetched with bounded concurrency
//! 3. All signals are evaluated and fused in parallel (no I/O)
//! 4. The ranker sorts, truncates and explains
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{ranker, MultiSignalScorer, RequestContext};
//!
//! let scorer = MultiSignalScorer::new(store.clone(), collaborative.clone());
//! let scored = scorer
//!     .score_candidates(user_id, candidates, profile.clone(), RequestContext::default(), Utc::now())
//!     .await?;
//! let recommendations = ranker::rank(scored, &profile, 10);
//! ```

pub mod context;
pub mod traits;
pub mod signals;
pub mod fusion;
pub mod scorer;
pub mod ranker;

// Re-export main types
pub use context::{Device, RequestContext};
pub use fusion::ScoreBreakdown;
pub use ranker::ExplainedRecommendation;
pub use scorer::{MultiSignalScorer, ScoredItem, ScoringError};
pub use traits::{Signal, SignalInput};
