//! Types produced and consumed by the personalization engine.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::place::Place;
use crate::domain::preferences::{
    AgeGroup, EnvironmentPreference, PreferenceRecord, PriceRange, TimePreference,
};

/// A place with its per-request personalized score. Never persisted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredPlace {
    #[serde(flatten)]
    pub place: Place,
    pub score: f64,
    pub matching_interests: Vec<String>,
    pub age_group_match: bool,
}

/// Request-scoped signals the engine scores against.
#[derive(Clone, Debug)]
pub struct PersonalizationContext {
    pub now: DateTime<Utc>,
    pub min_rating: Option<f64>,
    pub open_now_only: bool,
}

impl PersonalizationContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now, min_rating: None, open_now_only: false }
    }

    pub fn with_min_rating(mut self, min_rating: f64) -> Self {
        self.min_rating = Some(min_rating);
        self
    }

    pub fn open_now_only(mut self) -> Self {
        self.open_now_only = true;
        self
    }
}

/// Snapshot of the preference fields the engine actually used, echoed back
/// in the personalization summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PreferenceSnapshot {
    pub interests: Vec<String>,
    pub age_group: AgeGroup,
    pub environment: EnvironmentPreference,
    pub price_range: PriceRange,
    pub time_preference: TimePreference,
}

impl From<&PreferenceRecord> for PreferenceSnapshot {
    fn from(record: &PreferenceRecord) -> Self {
        Self {
            interests: record.interests.clone(),
            age_group: record.age_group,
            environment: record.environment,
            price_range: record.price_range,
            time_preference: record.time_preference,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub name: String,
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub places: Vec<SummaryEntry>,
}

/// Top scored places grouped by primary category, plus the preference
/// snapshot they were ranked against.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PersonalizationSummary {
    pub top_by_category: Vec<CategoryGroup>,
    pub preferences: PreferenceSnapshot,
}
