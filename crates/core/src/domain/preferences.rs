use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Young,
    Adult,
    Senior,
    Family,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentPreference {
    Quiet,
    Busy,
    Trending,
    FamilyFriendly,
    Mixed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceRange {
    Budget,
    Low,
    Medium,
    Comfortable,
    Luxury,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePreference {
    Morning,
    Afternoon,
    Evening,
    Night,
    Flexible,
}

impl AgeGroup {
    pub const ALL: &'static [AgeGroup] =
        &[AgeGroup::Young, AgeGroup::Adult, AgeGroup::Senior, AgeGroup::Family];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Young => "young",
            Self::Adult => "adult",
            Self::Senior => "senior",
            Self::Family => "family",
        }
    }
}

impl EnvironmentPreference {
    pub const ALL: &'static [EnvironmentPreference] = &[
        EnvironmentPreference::Quiet,
        EnvironmentPreference::Busy,
        EnvironmentPreference::Trending,
        EnvironmentPreference::FamilyFriendly,
        EnvironmentPreference::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quiet => "quiet",
            Self::Busy => "busy",
            Self::Trending => "trending",
            Self::FamilyFriendly => "family_friendly",
            Self::Mixed => "mixed",
        }
    }
}

impl PriceRange {
    pub const ALL: &'static [PriceRange] = &[
        PriceRange::Budget,
        PriceRange::Low,
        PriceRange::Medium,
        PriceRange::Comfortable,
        PriceRange::Luxury,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::Comfortable => "comfortable",
            Self::Luxury => "luxury",
        }
    }

    /// Index on the provider's 0..=4 price-level scale.
    pub fn level_index(&self) -> u8 {
        match self {
            Self::Budget => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::Comfortable => 3,
            Self::Luxury => 4,
        }
    }
}

impl TimePreference {
    pub const ALL: &'static [TimePreference] = &[
        TimePreference::Morning,
        TimePreference::Afternoon,
        TimePreference::Evening,
        TimePreference::Night,
        TimePreference::Flexible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
            Self::Flexible => "flexible",
        }
    }
}

macro_rules! impl_pref_from_str {
    ($ty:ty, $field:literal) => {
        impl std::str::FromStr for $ty {
            type Err = ValidationError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .iter()
                    .copied()
                    .find(|variant| variant.as_str() == value.trim().to_ascii_lowercase())
                    .ok_or_else(|| ValidationError::UnknownEnumValue {
                        field: $field,
                        value: value.to_string(),
                    })
            }
        }
    };
}

impl_pref_from_str!(AgeGroup, "age_group");
impl_pref_from_str!(EnvironmentPreference, "environment");
impl_pref_from_str!(PriceRange, "price_range");
impl_pref_from_str!(TimePreference, "time_preference");

/// Per-user preference profile. One record per user; absent fields on update
/// keep their stored values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub user_id: String,
    pub interests: Vec<String>,
    pub age_group: AgeGroup,
    pub activity_types: Vec<String>,
    pub environment: EnvironmentPreference,
    pub price_range: PriceRange,
    pub time_preference: TimePreference,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PreferenceRecord {
    /// The documented default profile, used whenever a user has no stored
    /// record (or none could be read).
    pub fn default_for(user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            interests: vec![
                "restaurant".to_string(),
                "tourist_attraction".to_string(),
                "shopping_mall".to_string(),
            ],
            age_group: AgeGroup::Adult,
            activity_types: vec![
                "sightseeing".to_string(),
                "dining".to_string(),
                "shopping".to_string(),
            ],
            environment: EnvironmentPreference::Mixed,
            price_range: PriceRange::Medium,
            time_preference: TimePreference::Flexible,
            created_at: now,
            updated_at: now,
        }
    }

    /// Field-wise override merge: present update fields replace stored
    /// values, absent fields are left untouched. Stamps `updated_at`.
    pub fn merged(mut self, update: PreferenceUpdate) -> Self {
        if let Some(interests) = update.interests {
            self.interests = interests;
        }
        if let Some(age_group) = update.age_group {
            self.age_group = age_group;
        }
        if let Some(activity_types) = update.activity_types {
            self.activity_types = activity_types;
        }
        if let Some(environment) = update.environment {
            self.environment = environment;
        }
        if let Some(price_range) = update.price_range {
            self.price_range = price_range;
        }
        if let Some(time_preference) = update.time_preference {
            self.time_preference = time_preference;
        }
        self.updated_at = Utc::now();
        self
    }
}

/// Partial preference update as received from the API. Unknown enum values
/// fail deserialization, which is the validation boundary for this payload.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PreferenceUpdate {
    pub interests: Option<Vec<String>>,
    pub age_group: Option<AgeGroup>,
    pub activity_types: Option<Vec<String>>,
    pub environment: Option<EnvironmentPreference>,
    pub price_range: Option<PriceRange>,
    pub time_preference: Option<TimePreference>,
}

/// Valid enum values, echoed alongside stored preferences so the client can
/// render pickers without hardcoding them.
#[derive(Clone, Debug, Serialize)]
pub struct PreferenceOptions {
    pub age_groups: Vec<&'static str>,
    pub environments: Vec<&'static str>,
    pub price_ranges: Vec<&'static str>,
    pub time_preferences: Vec<&'static str>,
}

impl PreferenceOptions {
    pub fn available() -> Self {
        Self {
            age_groups: AgeGroup::ALL.iter().map(AgeGroup::as_str).collect(),
            environments: EnvironmentPreference::ALL
                .iter()
                .map(EnvironmentPreference::as_str)
                .collect(),
            price_ranges: PriceRange::ALL.iter().map(PriceRange::as_str).collect(),
            time_preferences: TimePreference::ALL.iter().map(TimePreference::as_str).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overrides_only_present_fields() {
        let record = PreferenceRecord {
            interests: vec!["food".to_string(), "art".to_string()],
            ..PreferenceRecord::default_for("u-1")
        };
        let before_update = record.updated_at;

        let merged = record
            .merged(PreferenceUpdate { age_group: Some(AgeGroup::Senior), ..Default::default() });

        assert_eq!(merged.age_group, AgeGroup::Senior);
        assert_eq!(merged.interests, vec!["food".to_string(), "art".to_string()]);
        assert_eq!(merged.environment, EnvironmentPreference::Mixed);
        assert!(merged.updated_at >= before_update);
    }

    #[test]
    fn default_record_matches_documented_profile() {
        let record = PreferenceRecord::default_for("anonymous");
        assert_eq!(record.age_group, AgeGroup::Adult);
        assert_eq!(record.price_range, PriceRange::Medium);
        assert_eq!(record.time_preference, TimePreference::Flexible);
        assert_eq!(
            record.interests,
            vec!["restaurant", "tourist_attraction", "shopping_mall"]
        );
    }

    #[test]
    fn enum_parse_rejects_unknown_values() {
        assert!("senior".parse::<AgeGroup>().is_ok());
        let err = "elderly".parse::<AgeGroup>().unwrap_err();
        assert!(matches!(err, ValidationError::UnknownEnumValue { field: "age_group", .. }));
    }

    #[test]
    fn price_range_levels_cover_provider_scale() {
        let levels: Vec<u8> = PriceRange::ALL.iter().map(PriceRange::level_index).collect();
        assert_eq!(levels, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn update_deserialization_rejects_unknown_enum_value() {
        let result: Result<PreferenceUpdate, _> =
            serde_json::from_str(r#"{"environment": "loud"}"#);
        assert!(result.is_err());
    }
}
