//! Freshness: exp(-age_days / 30).

use crate::traits::{Signal, SignalInput};
use chrono::{DateTime, Utc};

const DECAY_DAYS: f64 = 30.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Age past which exp(-age / 30) drops below the smallest normal f32.
pub const SATURATION_DAYS: f64 = 2_620.0;

pub struct RecencySignal;

impl Signal for RecencySignal {
    fn name(&self) -> &str {
        "recency"
    }

    fn compute(&self, input: &SignalInput<'_>) -> f32 {
        recency_score(input.item.created_at, input.now)
    }
}

/// Fractional age in days; future timestamps count as age 0.
pub fn age_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - created_at).num_milliseconds().max(0);
    millis as f64 / MILLIS_PER_DAY
}

/// Always in (0, 1]. Strictly decreasing in age up to roughly 7 years
/// (`SATURATION_DAYS`); older items all score `f32::MIN_POSITIVE`.
pub fn recency_score(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f32 {
    let score = (-age_days(created_at, now) / DECAY_DAYS).exp() as f32;
    // Very old items would underflow to zero in f32
    score.max(f32::MIN_POSITIVE)
}
