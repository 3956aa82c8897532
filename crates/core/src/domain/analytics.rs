use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregated search popularity for a coarse (~1.1 km) area cell.
/// Counters only accumulate; the record is informational and never feeds
/// back into ranking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopularArea {
    pub area_id: String,
    pub search_count: i64,
    pub last_searched: DateTime<Utc>,
    pub aggregated_interests: Vec<String>,
}

/// An append-only analytics event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
