//! Core trait for the per-item ranking signals.
//!
//! Every pure signal reads the same `SignalInput` and produces one number.
//! The collaborative signal is not a `Signal`: it needs I/O and is fetched
//! by the scorer before fusion.

use crate::context::RequestContext;
use chrono::{DateTime, Utc};
use data_loader::Item;
use sources::UserProfile;
use std::collections::BTreeSet;

/// Everything a pure signal may look at for one candidate.
#[derive(Debug, Clone, Copy)]
pub struct SignalInput<'a> {
    pub item: &'a Item,
    pub profile: &'a UserProfile,
    /// Union of tags over the user's most recent views
    pub history_tags: &'a BTreeSet<String>,
    pub request: &'a RequestContext,
    pub now: DateTime<Utc>,
}

/// A single per-(user, item) score in [0, 1].
///
/// ## Design Note
/// - `Send + Sync` so signals can be shared across rayon workers
/// - `compute` may return anything; `evaluate` is what fusion reads
pub trait Signal: Send + Sync {
    /// Returns the name of this signal (for logging/debugging)
    fn name(&self) -> &str;

    /// Value used when the computation yields NaN.
    fn neutral(&self) -> f32 {
        0.5
    }

    /// Raw score for one candidate.
    fn compute(&self, input: &SignalInput<'_>) -> f32;

    /// Score clamped to [0, 1], NaN replaced by `neutral`.
    fn evaluate(&self, input: &SignalInput<'_>) -> f32 {
        sanitize(self.compute(input), self.neutral())
    }
}

/// Clamp to [0, 1]; NaN becomes `neutral`.
pub fn sanitize(value: f32, neutral: f32) -> f32 {
    if value.is_nan() {
        neutral
    } else {
        value.clamp(0.0, 1.0)
    }
}
