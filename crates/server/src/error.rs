//! Error types for the recommendation service.

use data_loader::{DataLoadError, StoreError, UserId};
use ml_client::ScorerError;
use thiserror::Error;

use crate::cache::CacheError;

/// Failure taxonomy of a recommendation request.
///
/// `NotFound`, `SignalUnavailable` and `Empty` are degraded internally and
/// logged; callers only ever see `StoreFailure` or `Internal`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommendationError {
    #[error("user {0} not found")]
    NotFound(UserId),

    #[error("signal unavailable: {0}")]
    SignalUnavailable(String),

    #[error("no eligible candidates")]
    Empty,

    #[error("primary store failure: {0}")]
    StoreFailure(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors while wiring a service from configuration.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("failed to load dataset: {0}")]
    DataLoad(#[from] DataLoadError),

    #[error("failed to connect cache: {0}")]
    Cache(#[from] CacheError),

    #[error("failed to build scorer client: {0}")]
    Scorer(#[from] ScorerError),
}
