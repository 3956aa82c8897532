//! Per-place scoring for the personalization engine.

use std::collections::HashSet;

use crate::domain::place::Place;
use crate::domain::preferences::{EnvironmentPreference, PreferenceRecord, TimePreference};

use super::tables::{profile_for, AgeGroupProfile, FAMILY_TAGS};
use super::types::PersonalizationContext;
use super::REVIEW_TERM_CAP;

/// Review-count thresholds for the environment term.
const QUIET_REVIEW_CEILING: u32 = 100;
const BUSY_REVIEW_FLOOR: u32 = 500;
const TRENDING_REVIEW_FLOOR: u32 = 200;
const TRENDING_RATING_FLOOR: f64 = 4.0;

/// Score calculator for one (preferences, context) pair. Holds the derived
/// tag sets so scoring a list of places expands interests only once.
pub struct ScoreCalculator<'a> {
    relevant_tags: HashSet<String>,
    profile: &'static AgeGroupProfile,
    prefs: &'a PreferenceRecord,
    ctx: &'a PersonalizationContext,
}

impl<'a> ScoreCalculator<'a> {
    pub fn new(
        relevant_tags: HashSet<String>,
        prefs: &'a PreferenceRecord,
        ctx: &'a PersonalizationContext,
    ) -> Self {
        Self { relevant_tags, profile: profile_for(prefs.age_group), prefs, ctx }
    }

    /// Total personalized score. Starts at zero; each term only adds.
    pub fn score(&self, place: &Place) -> f64 {
        self.rating_term(place)
            + self.review_term(place)
            + 3.0 * self.matching_interests(place).len() as f64
            + 2.0 * self.priority_matches(place) as f64
            + self.price_term(place)
            + self.environment_term(place)
            + self.time_term()
            + self.operational_term(place)
    }

    /// Place tags covered by the user's expanded interests, in tag order.
    pub fn matching_interests(&self, place: &Place) -> Vec<String> {
        place.tags.iter().filter(|tag| self.relevant_tags.contains(*tag)).cloned().collect()
    }

    /// Whether any of the place's tags sit in the age-group priority set.
    pub fn age_group_match(&self, place: &Place) -> bool {
        self.priority_matches(place) > 0
    }

    fn priority_matches(&self, place: &Place) -> usize {
        place.tags.iter().filter(|tag| self.profile.priority_tags.contains(&tag.as_str())).count()
    }

    fn rating_term(&self, place: &Place) -> f64 {
        place.rating.unwrap_or(0.0) * 2.0
    }

    /// Logarithmic damping keeps very-high review counts from dominating.
    fn review_term(&self, place: &Place) -> f64 {
        let reviews = place.review_count.unwrap_or(0) as f64;
        (reviews + 1.0).ln().min(REVIEW_TERM_CAP)
    }

    /// Proximity of the place's price level to the preferred level on the
    /// 0..=4 scale. A place with no price level contributes zero, the same
    /// as a two-step mismatch.
    fn price_term(&self, place: &Place) -> f64 {
        match place.price_level {
            Some(level) => {
                let preferred = self.prefs.price_range.level_index() as i32;
                (2.0 - (level as i32 - preferred).abs() as f64).max(0.0)
            }
            None => 0.0,
        }
    }

    fn environment_term(&self, place: &Place) -> f64 {
        let reviews = place.review_count.unwrap_or(0);
        match self.prefs.environment {
            EnvironmentPreference::Quiet => {
                if reviews < QUIET_REVIEW_CEILING {
                    2.0
                } else {
                    0.0
                }
            }
            EnvironmentPreference::Busy => {
                if reviews > BUSY_REVIEW_FLOOR {
                    2.0
                } else {
                    0.0
                }
            }
            EnvironmentPreference::Trending => {
                if place.rating.unwrap_or(0.0) > TRENDING_RATING_FLOOR
                    && reviews > TRENDING_REVIEW_FLOOR
                {
                    3.0
                } else {
                    0.0
                }
            }
            EnvironmentPreference::FamilyFriendly => {
                if place.tags.iter().any(|tag| FAMILY_TAGS.contains(&tag.as_str())) {
                    2.0
                } else {
                    0.0
                }
            }
            EnvironmentPreference::Mixed => 1.0,
        }
    }

    fn time_term(&self) -> f64 {
        let hour = time_of_day_hour(self.ctx);
        match self.prefs.time_preference {
            TimePreference::Flexible => 0.5,
            pref => {
                if hour_in_window(hour, pref) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    fn operational_term(&self, place: &Place) -> f64 {
        if place.is_operational() {
            1.0
        } else {
            0.0
        }
    }
}

fn time_of_day_hour(ctx: &PersonalizationContext) -> u32 {
    use chrono::Timelike;
    ctx.now.hour()
}

/// Named time-of-day windows: morning 6-12, afternoon 12-17, evening 17-22,
/// night 22-6 (wrapping midnight).
pub fn hour_in_window(hour: u32, pref: TimePreference) -> bool {
    match pref {
        TimePreference::Morning => (6..12).contains(&hour),
        TimePreference::Afternoon => (12..17).contains(&hour),
        TimePreference::Evening => (17..22).contains(&hour),
        TimePreference::Night => hour >= 22 || hour < 6,
        TimePreference::Flexible => true,
    }
}
