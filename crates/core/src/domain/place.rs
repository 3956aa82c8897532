use serde::{Deserialize, Serialize};

use crate::domain::geo::Coordinate;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingStatus {
    Operational,
    ClosedTemporarily,
    ClosedPermanently,
    Unknown,
}

/// A place as reported by the external nearby-search provider. Produced by
/// the places crate's mapping layer, read-only everywhere downstream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub location: Coordinate,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub price_level: Option<u8>,
    pub tags: Vec<String>,
    pub vicinity: Option<String>,
    pub status: OperatingStatus,
    pub open_now: Option<bool>,
}

impl Place {
    pub fn is_operational(&self) -> bool {
        self.status == OperatingStatus::Operational
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// One fetch worth of nearby places, split by the five bundle categories.
/// This is what the geo cache stores and the orchestrator personalizes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaBundle {
    pub landmarks: Vec<Place>,
    pub restaurants: Vec<Place>,
    pub attractions: Vec<Place>,
    pub entertainment: Vec<Place>,
    pub shopping: Vec<Place>,
}

impl AreaBundle {
    pub fn all_places(&self) -> impl Iterator<Item = &Place> {
        self.landmarks
            .iter()
            .chain(&self.restaurants)
            .chain(&self.attractions)
            .chain(&self.entertainment)
            .chain(&self.shopping)
    }

    pub fn total_places(&self) -> usize {
        self.all_places().count()
    }

    pub fn is_empty(&self) -> bool {
        self.total_places() == 0
    }
}
