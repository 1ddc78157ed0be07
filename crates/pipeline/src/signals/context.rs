//! Situational fit: time of day and device class.

use crate::context::{device_matches, CategoryClass, TimeBucket};
use crate::traits::{Signal, SignalInput};

const BASE: f32 = 0.5;
const TIME_OF_DAY_BONUS: f32 = 0.2;
const DEVICE_BONUS: f32 = 0.1;

pub struct ContextSignal;

impl Signal for ContextSignal {
    fn name(&self) -> &str {
        "context"
    }

    fn compute(&self, input: &SignalInput<'_>) -> f32 {
        let mut score = BASE;

        if input.request.time_of_day
            && CategoryClass::of(&input.item.category).matches(TimeBucket::of(input.now))
        {
            score += TIME_OF_DAY_BONUS;
        }

        if let Some(device) = input.request.device {
            if device_matches(device, input.item.duration_secs) {
                score += DEVICE_BONUS;
            }
        }

        score.min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Device, RequestContext};
    use crate::signals::fixtures;
    use chrono::TimeZone;
    use chrono::Utc;
    use sources::UserProfile;
    use std::collections::BTreeSet;

    fn evaluate(category: &str, duration: u32, request: RequestContext, hour: u32) -> f32 {
        let profile = UserProfile::empty(1);
        let item = fixtures::item(1, category, duration);
        let history = BTreeSet::new();
        let input = SignalInput {
            item: &item,
            profile: &profile,
            history_tags: &history,
            request: &request,
            // Wednesday
            now: Utc.with_ymd_and_hms(2026, 3, 4, hour, 0, 0).unwrap(),
        };
        ContextSignal.evaluate(&input)
    }

    #[test]
    fn test_base_without_options() {
        assert_eq!(evaluate("tech", 300, RequestContext::default(), 10), 0.5);
    }

    #[test]
    fn test_time_of_day_bonus() {
        let request = RequestContext::default().with_time_of_day(true);
        assert!((evaluate("tech", 300, request, 10) - 0.7).abs() < 1e-6);
        assert_eq!(evaluate("tech", 300, request, 21), 0.5);
        assert!((evaluate("gaming", 300, request, 21) - 0.7).abs() < 1e-6);
        assert_eq!(evaluate("gaming", 300, request, 10), 0.5);
    }

    #[test]
    fn test_device_bonus() {
        let mobile = RequestContext::default().with_device(Device::Mobile);
        let desktop = RequestContext::default().with_device(Device::Desktop);
        assert!((evaluate("music", 300, mobile, 10) - 0.6).abs() < 1e-6);
        assert_eq!(evaluate("music", 3000, mobile, 10), 0.5);
        assert!((evaluate("music", 3000, desktop, 10) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_both_bonuses() {
        let request = RequestContext::default()
            .with_time_of_day(true)
            .with_device(Device::Desktop);
        assert!((evaluate("education", 2400, request, 11) - 0.8).abs() < 1e-6);
    }
}
