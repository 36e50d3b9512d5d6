//! Context builder: time-of-day bucket from the local clock.

use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};

/// Half-open buckets: night [22,5), morning [5,12), afternoon [12,17), evening [17,22).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Night,
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn at<T: Timelike>(t: &T) -> Self {
        Self::from_hour(t.hour())
    }

    pub fn now() -> Self {
        Self::at(&Local::now())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Night => "night",
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        }
    }
}

/// Wire form of one context group: `{"timeOfDay": "morning"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextFeature {
    TimeOfDay(TimeOfDay),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextFeatures {
    pub time_of_day: TimeOfDay,
}

impl ContextFeatures {
    pub fn now() -> Self {
        Self {
            time_of_day: TimeOfDay::now(),
        }
    }

    pub fn at<T: Timelike>(t: &T) -> Self {
        Self {
            time_of_day: TimeOfDay::at(t),
        }
    }

    pub fn to_features(&self) -> Vec<ContextFeature> {
        vec![ContextFeature::TimeOfDay(self.time_of_day)]
    }
}
