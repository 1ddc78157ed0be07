//! Client for the external collaborative-affinity model.
//!
//! The model itself (architecture, training) lives outside this workspace.
//! All the engine needs is `predict(user, item) -> [0, 1]`, exposed here as
//! the `CollaborativeScorer` trait with two implementations:
//! - `HttpAffinityClient` posts JSON to a running model service
//! - `NeutralScorer` for deployments that run without a model
//!
//! Callers are expected to degrade any `ScorerError` to the neutral prior
//! (`NEUTRAL_AFFINITY`) rather than fail the item.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Prior used when no prediction is available.
pub const NEUTRAL_AFFINITY: f32 = 0.5;

/// Errors that can occur when interacting with the model service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScorerError {
    #[error("Failed to build scorer client: {0}")]
    ClientError(String),

    #[error("Failed to reach scoring service: {0}")]
    ConnectionError(String),

    #[error("Scoring service returned HTTP {0}")]
    StatusError(u16),

    #[error("Invalid response from scoring service: {0}")]
    InvalidResponse(String),

    #[error("No collaborative model configured")]
    Unavailable,
}

/// Source of the learned (user, item) affinity.
#[async_trait]
pub trait CollaborativeScorer: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Predicted affinity in [0, 1].
    async fn predict(&self, user_id: u64, item_id: u64) -> Result<f32, ScorerError>;
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    user_id: u64,
    item_id: u64,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    score: f32,
}

/// HTTP/JSON client for the model service.
///
/// Sends `POST {base_url}/predict` with `{"user_id", "item_id"}` and expects
/// `{"score": f32}` back.
#[derive(Clone)]
pub struct HttpAffinityClient {
    client: reqwest::Client,
    service_addr: String,
}

impl HttpAffinityClient {
    /// Build a client for the service at `addr` (e.g. "http://localhost:8500").
    ///
    /// No connection is made until the first prediction.
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Result<Self, ScorerError> {
        let service_addr = addr.into().trim_end_matches('/').to_string();
        info!("Configuring affinity scorer at {}", service_addr);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScorerError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            service_addr,
        })
    }

    /// Get the address of the model service this client talks to.
    pub fn service_address(&self) -> &str {
        &self.service_addr
    }
}

#[async_trait]
impl CollaborativeScorer for HttpAffinityClient {
    fn name(&self) -> &str {
        "http-affinity"
    }

    async fn predict(&self, user_id: u64, item_id: u64) -> Result<f32, ScorerError> {
        let url = format!("{}/predict", self.service_addr);
        debug!("Predicting affinity for user {} item {}", user_id, item_id);

        let response = self
            .client
            .post(&url)
            .json(&PredictRequest { user_id, item_id })
            .send()
            .await
            .map_err(|e| {
                debug!("Affinity request to {} failed: {}", url, e);
                ScorerError::ConnectionError(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScorerError::StatusError(status.as_u16()));
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| ScorerError::InvalidResponse(e.to_string()))?;

        validate_score(body.score)
    }
}

/// Reject anything that is not a finite probability.
fn validate_score(score: f32) -> Result<f32, ScorerError> {
    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(ScorerError::InvalidResponse(format!(
            "score {} outside [0, 1]",
            score
        )))
    }
}

/// Scorer for deployments without a model: every prediction is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralScorer;

#[async_trait]
impl CollaborativeScorer for NeutralScorer {
    fn name(&self) -> &str {
        "neutral"
    }

    async fn predict(&self, _user_id: u64, _item_id: u64) -> Result<f32, ScorerError> {
        Err(ScorerError::Unavailable)
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod testing;
