//! Wire schema of the nearby-search provider and the mapping into domain
//! places.

use serde::Deserialize;

use localscope_core::domain::geo::Coordinate;
use localscope_core::domain::place::{OperatingStatus, Place, PlaceId};

pub const STATUS_OK: &str = "OK";
pub const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

#[derive(Debug, Deserialize)]
pub struct NearbySearchResponse {
    pub status: String,
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<ProviderPlace>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderPlace {
    pub place_id: String,
    pub name: String,
    pub geometry: Geometry,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub price_level: Option<u8>,
    #[serde(default)]
    pub types: Vec<String>,
    pub vicinity: Option<String>,
    pub business_status: Option<String>,
    pub opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct OpeningHours {
    pub open_now: Option<bool>,
}

impl ProviderPlace {
    pub fn into_place(self) -> Place {
        let status = match self.business_status.as_deref() {
            Some("OPERATIONAL") => OperatingStatus::Operational,
            Some("CLOSED_TEMPORARILY") => OperatingStatus::ClosedTemporarily,
            Some("CLOSED_PERMANENTLY") => OperatingStatus::ClosedPermanently,
            _ => OperatingStatus::Unknown,
        };

        Place {
            id: PlaceId(self.place_id),
            name: self.name,
            location: Coordinate {
                latitude: self.geometry.location.lat,
                longitude: self.geometry.location.lng,
            },
            rating: self.rating,
            review_count: self.user_ratings_total,
            price_level: self.price_level,
            tags: self.types,
            vicinity: self.vicinity,
            status,
            open_now: self.opening_hours.and_then(|hours| hours.open_now),
        }
    }
}
