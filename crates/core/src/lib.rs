pub mod config;
pub mod domain;
pub mod errors;
pub mod personalize;

pub use domain::analytics::{AnalyticsEvent, PopularArea};
pub use domain::geo::{
    area_cache_key, popularity_area_key, validate_radius, Coordinate, MAX_RADIUS_M, MIN_RADIUS_M,
};
pub use domain::place::{AreaBundle, OperatingStatus, Place, PlaceId};
pub use domain::preferences::{
    AgeGroup, EnvironmentPreference, PreferenceOptions, PreferenceRecord, PreferenceUpdate,
    PriceRange, TimePreference,
};
pub use errors::ValidationError;
pub use personalize::{
    primary_category, relevant_tags, summarize, PersonalizationContext, PersonalizationEngine,
    PersonalizationSummary, ScoredPlace,
};
