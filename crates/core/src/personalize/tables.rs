//! Fixed lookup tables for the personalization engine. Everything here is
//! compile-time constant; the engine never mutates these.

use crate::domain::preferences::{AgeGroup, PriceRange, TimePreference};

/// Maps a declared interest to the provider category tags it covers.
/// Interests with no mapping pass through unchanged as literal tags.
pub struct InterestMapping {
    pub interest: &'static str,
    pub tags: &'static [&'static str],
}

pub const INTEREST_TAGS: &[InterestMapping] = &[
    InterestMapping {
        interest: "food",
        tags: &["restaurant", "cafe", "bakery", "meal_takeaway", "meal_delivery"],
    },
    InterestMapping {
        interest: "culture",
        tags: &["museum", "art_gallery", "tourist_attraction", "library"],
    },
    InterestMapping {
        interest: "history",
        tags: &["museum", "tourist_attraction", "place_of_worship"],
    },
    InterestMapping { interest: "nature", tags: &["park", "campground", "zoo", "aquarium"] },
    InterestMapping {
        interest: "shopping",
        tags: &["shopping_mall", "clothing_store", "department_store", "store"],
    },
    InterestMapping { interest: "nightlife", tags: &["bar", "night_club", "casino"] },
    InterestMapping {
        interest: "entertainment",
        tags: &["movie_theater", "amusement_park", "bowling_alley", "stadium"],
    },
    InterestMapping { interest: "art", tags: &["art_gallery", "museum"] },
    InterestMapping { interest: "sports", tags: &["gym", "stadium", "park"] },
    InterestMapping { interest: "coffee", tags: &["cafe", "bakery"] },
];

/// Secondary ranking signal per age group. The default time/price values are
/// never allowed to override an explicit user setting.
pub struct AgeGroupProfile {
    pub age_group: AgeGroup,
    pub priority_tags: &'static [&'static str],
    pub default_time: TimePreference,
    pub default_price: PriceRange,
}

pub const AGE_GROUP_PROFILES: &[AgeGroupProfile] = &[
    AgeGroupProfile {
        age_group: AgeGroup::Young,
        priority_tags: &["night_club", "bar", "cafe", "amusement_park", "gym"],
        default_time: TimePreference::Evening,
        default_price: PriceRange::Low,
    },
    AgeGroupProfile {
        age_group: AgeGroup::Adult,
        priority_tags: &["restaurant", "tourist_attraction", "museum", "shopping_mall"],
        default_time: TimePreference::Flexible,
        default_price: PriceRange::Medium,
    },
    AgeGroupProfile {
        age_group: AgeGroup::Senior,
        priority_tags: &["museum", "park", "place_of_worship", "library", "art_gallery"],
        default_time: TimePreference::Morning,
        default_price: PriceRange::Comfortable,
    },
    AgeGroupProfile {
        age_group: AgeGroup::Family,
        priority_tags: &["amusement_park", "zoo", "aquarium", "park", "movie_theater"],
        default_time: TimePreference::Afternoon,
        default_price: PriceRange::Medium,
    },
];

pub fn profile_for(age_group: AgeGroup) -> &'static AgeGroupProfile {
    AGE_GROUP_PROFILES
        .iter()
        .find(|profile| profile.age_group == age_group)
        .unwrap_or(&AGE_GROUP_PROFILES[1])
}

/// Tags that mark a place as family-oriented for the environment term.
pub const FAMILY_TAGS: &[&str] =
    &["amusement_park", "zoo", "aquarium", "park", "movie_theater", "museum"];

/// Tag sets that shift the synthetic hourly activity curve.
pub const DINING_TAGS: &[&str] = &["restaurant", "cafe", "bakery", "bar", "meal_takeaway"];
pub const NIGHTLIFE_TAGS: &[&str] = &["night_club", "bar", "casino"];

/// Ordered priority list for resolving a place's primary category. First
/// match wins; a place matching none falls back to its first tag, then to
/// "general".
pub const CATEGORY_PRIORITY: &[&str] = &[
    "restaurant",
    "cafe",
    "bar",
    "museum",
    "art_gallery",
    "park",
    "tourist_attraction",
    "shopping_mall",
    "night_club",
    "amusement_park",
    "zoo",
    "aquarium",
    "movie_theater",
    "stadium",
    "library",
    "bakery",
];
