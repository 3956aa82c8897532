//! Visit-timing heuristics derived from the top recommendations and the
//! preference profile. The avoid-peak and optimal-day values are fixed
//! heuristic tables, not measurements.

use chrono::Timelike;
use serde::Serialize;

use crate::domain::preferences::{AgeGroup, EnvironmentPreference, PreferenceRecord, TimePreference};

use super::scoring::hour_in_window;
use super::tables::{profile_for, DINING_TAGS, NIGHTLIFE_TAGS};
use super::types::{PersonalizationContext, ScoredPlace};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PeakTimeAnalysis {
    pub current_activity: &'static str,
    pub avoid_peak_hours: Vec<&'static str>,
    pub optimal_day: &'static str,
    /// Synthetic relative activity level per hour of day, 0-100.
    pub hourly_activity: [u8; 24],
}

pub fn peak_time_analysis(
    top: &[ScoredPlace],
    prefs: &PreferenceRecord,
    ctx: &PersonalizationContext,
) -> PeakTimeAnalysis {
    PeakTimeAnalysis {
        current_activity: current_activity_label(ctx.now.hour()),
        avoid_peak_hours: avoid_peak_hours(prefs.age_group),
        optimal_day: optimal_day(prefs.environment),
        hourly_activity: hourly_activity_curve(top),
    }
}

fn current_activity_label(hour: u32) -> &'static str {
    if hour_in_window(hour, TimePreference::Morning) {
        "breakfast spots and early sightseeing"
    } else if hour_in_window(hour, TimePreference::Afternoon) {
        "lunch spots and daytime attractions"
    } else if hour_in_window(hour, TimePreference::Evening) {
        "dinner and evening entertainment"
    } else {
        "nightlife and late venues"
    }
}

fn avoid_peak_hours(age_group: AgeGroup) -> Vec<&'static str> {
    match age_group {
        AgeGroup::Young => vec!["08:00-10:00"],
        AgeGroup::Adult => vec!["12:00-14:00", "17:00-19:00"],
        AgeGroup::Senior => vec!["12:00-14:00", "17:00-20:00"],
        AgeGroup::Family => vec!["17:00-21:00"],
    }
}

fn optimal_day(environment: EnvironmentPreference) -> &'static str {
    match environment {
        EnvironmentPreference::Quiet => "Tuesday",
        EnvironmentPreference::Busy => "Saturday",
        EnvironmentPreference::Trending => "Friday",
        EnvironmentPreference::FamilyFriendly => "Sunday",
        EnvironmentPreference::Mixed => "Saturday",
    }
}

/// Base curve shaped by time-of-day bands, lifted where the recommended
/// places suggest dining or nightlife activity.
fn hourly_activity_curve(top: &[ScoredPlace]) -> [u8; 24] {
    let has_dining =
        top.iter().any(|s| s.place.tags.iter().any(|t| DINING_TAGS.contains(&t.as_str())));
    let has_nightlife =
        top.iter().any(|s| s.place.tags.iter().any(|t| NIGHTLIFE_TAGS.contains(&t.as_str())));

    let mut curve = [0u8; 24];
    for (hour, level) in curve.iter_mut().enumerate() {
        let hour = hour as u32;
        let mut value: i32 = 20;
        value += match hour {
            0..=5 => -10,
            6..=8 => 10,
            9..=11 => 15,
            12..=13 => 30,
            14..=16 => 20,
            17..=20 => 35,
            21..=23 => 15,
            _ => 0,
        };
        if has_dining && (hour == 12 || hour == 13 || hour == 19 || hour == 20) {
            value += 10;
        }
        if has_nightlife && (hour >= 21 || hour <= 1) {
            value += 15;
        }
        *level = value.clamp(0, 100) as u8;
    }
    curve
}

/// Natural-language best-visit-time recommendation, chosen by a fixed
/// decision table keyed on the age group's default time preference and the
/// user's environment preference.
pub fn best_visit_time(prefs: &PreferenceRecord) -> &'static str {
    let time = profile_for(prefs.age_group).default_time;
    match (time, prefs.environment) {
        (TimePreference::Morning, EnvironmentPreference::Quiet) => {
            "Weekday mornings around 9-11 AM, before the midday crowds arrive"
        }
        (TimePreference::Morning, _) => {
            "Mornings between 9 AM and noon, when most venues have just opened"
        }
        (TimePreference::Afternoon, EnvironmentPreference::FamilyFriendly) => {
            "Weekend afternoons from 2-5 PM, when family venues are in full swing"
        }
        (TimePreference::Afternoon, EnvironmentPreference::Quiet) => {
            "Weekday afternoons around 2-4 PM, after the lunch rush clears"
        }
        (TimePreference::Afternoon, _) => "Afternoons between 1 PM and 5 PM",
        (TimePreference::Evening, EnvironmentPreference::Trending) => {
            "Friday and Saturday evenings from 8 PM, when the popular spots peak"
        }
        (TimePreference::Evening, EnvironmentPreference::Busy) => {
            "Evenings from 6-9 PM, when the area is at its liveliest"
        }
        (TimePreference::Evening, _) => "Early evenings around 5-8 PM",
        (TimePreference::Night, _) => "Late evenings after 10 PM, when the night venues open up",
        (TimePreference::Flexible, EnvironmentPreference::Quiet) => {
            "Weekday mornings or early afternoons, outside peak hours"
        }
        (TimePreference::Flexible, EnvironmentPreference::Busy) => {
            "Weekend afternoons and evenings, when the area is busiest"
        }
        (TimePreference::Flexible, EnvironmentPreference::Trending) => {
            "Thursday to Saturday evenings, when trending spots draw their crowds"
        }
        (TimePreference::Flexible, EnvironmentPreference::FamilyFriendly) => {
            "Weekend mornings and afternoons, ideal for family outings"
        }
        (TimePreference::Flexible, EnvironmentPreference::Mixed) => {
            "Any time works; late morning through early evening covers the most venues"
        }
    }
}
