//! Weighted fusion of the five sub-scores into one ranking score.

use crate::traits::sanitize;
use ml_client::NEUTRAL_AFFINITY;
use serde::{Deserialize, Serialize};

pub const COLLABORATIVE_WEIGHT: f32 = 0.3;
pub const CONTENT_WEIGHT: f32 = 0.3;
pub const CONTEXT_WEIGHT: f32 = 0.2;
pub const POPULARITY_WEIGHT: f32 = 0.1;
pub const RECENCY_WEIGHT: f32 = 0.1;

/// The five sub-scores for one (user, item) pair and their fused score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub collaborative: f32,
    pub content: f32,
    pub context: f32,
    pub popularity: f32,
    pub recency: f32,
    pub final_score: f32,
}

impl ScoreBreakdown {
    /// Fuse sub-scores with the fixed weights.
    ///
    /// Inputs are clamped first; a NaN collaborative score becomes the
    /// neutral prior, any other NaN becomes 0.
    pub fn fuse(collaborative: f32, content: f32, context: f32, popularity: f32, recency: f32) -> Self {
        let collaborative = sanitize(collaborative, NEUTRAL_AFFINITY);
        let content = sanitize(content, 0.0);
        let context = sanitize(context, 0.5);
        let popularity = sanitize(popularity, 0.0);
        let recency = sanitize(recency, 0.5);

        let final_score = COLLABORATIVE_WEIGHT * collaborative
            + CONTENT_WEIGHT * content
            + CONTEXT_WEIGHT * context
            + POPULARITY_WEIGHT * popularity
            + RECENCY_WEIGHT * recency;

        Self {
            collaborative,
            content,
            context,
            popularity,
            recency,
            final_score: final_score.clamp(0.0, 1.0),
        }
    }
}
