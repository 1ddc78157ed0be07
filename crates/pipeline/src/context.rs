//! Per-request context options and the calendar/duration heuristics they drive.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Device class the request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Mobile,
    Desktop,
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mobile" => Ok(Device::Mobile),
            "desktop" => Ok(Device::Desktop),
            other => Err(format!("unknown device '{}', expected mobile or desktop", other)),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Mobile => write!(f, "mobile"),
            Device::Desktop => write!(f, "desktop"),
        }
    }
}

/// Options a caller may attach to a request. Unknown keys are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestContext {
    /// Apply the time-of-day bonus
    #[serde(alias = "timeOfDay")]
    pub time_of_day: bool,
    pub device: Option<Device>,
}

impl RequestContext {
    pub fn with_time_of_day(mut self, enabled: bool) -> Self {
        self.time_of_day = enabled;
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }
}

/// Coarse time-of-day bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    /// Monday to Friday, 09:00 to 17:59 UTC
    BusinessHours,
    EveningOrWeekend,
}

impl TimeBucket {
    pub fn of(now: DateTime<Utc>) -> Self {
        let weekday = !matches!(now.weekday(), Weekday::Sat | Weekday::Sun);
        if weekday && (9..18).contains(&now.hour()) {
            TimeBucket::BusinessHours
        } else {
            TimeBucket::EveningOrWeekend
        }
    }
}

const WORK_CATEGORIES: &[&str] = &[
    "education",
    "tech",
    "technology",
    "business",
    "news",
    "science",
    "finance",
];

/// Whether a category is watched at work or for leisure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryClass {
    Work,
    Leisure,
}

impl CategoryClass {
    pub fn of(category: &str) -> Self {
        if WORK_CATEGORIES.contains(&category.to_lowercase().as_str()) {
            CategoryClass::Work
        } else {
            CategoryClass::Leisure
        }
    }

    pub fn matches(self, bucket: TimeBucket) -> bool {
        matches!(
            (self, bucket),
            (CategoryClass::Work, TimeBucket::BusinessHours)
                | (CategoryClass::Leisure, TimeBucket::EveningOrWeekend)
        )
    }
}

/// Items shorter than this suit mobile; longer ones suit desktop.
pub const DEVICE_DURATION_THRESHOLD_SECS: u32 = 900;

pub fn device_matches(device: Device, duration_secs: u32) -> bool {
    match device {
        Device::Mobile => duration_secs < DEVICE_DURATION_THRESHOLD_SECS,
        Device::Desktop => duration_secs > DEVICE_DURATION_THRESHOLD_SECS,
    }
}
