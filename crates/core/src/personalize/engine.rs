//! Personalization engine: scores, filters, sorts, and caps a list of
//! places against a user's preference profile.

use std::collections::HashSet;

use thiserror::Error;
use tracing::warn;

use crate::domain::place::Place;
use crate::domain::preferences::PreferenceRecord;

use super::scoring::ScoreCalculator;
use super::tables::{CATEGORY_PRIORITY, INTEREST_TAGS};
use super::types::{
    CategoryGroup, PersonalizationContext, PersonalizationSummary, PreferenceSnapshot, ScoredPlace,
    SummaryEntry,
};
use super::{DEFAULT_MAX_RESULTS, MIN_RELEVANCE_SCORE, SUMMARY_GROUP_LIMIT};

#[derive(Debug, Error)]
enum PersonalizeError {
    #[error("non-finite score {score} for place `{place_id}`")]
    NonFiniteScore { place_id: String, score: f64 },
}

#[derive(Clone, Copy, Debug)]
pub struct PersonalizationEngine {
    max_results: usize,
}

impl Default for PersonalizationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESULTS)
    }
}

impl PersonalizationEngine {
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }

    /// Score, filter, sort, cap. Infallible by contract: if the scoring pass
    /// reports an error the engine degrades to the input order, unscored and
    /// truncated, rather than failing the surrounding request.
    pub fn personalize(
        &self,
        places: &[Place],
        prefs: &PreferenceRecord,
        ctx: &PersonalizationContext,
    ) -> Vec<ScoredPlace> {
        match self.try_personalize(places, prefs, ctx) {
            Ok(scored) => scored,
            Err(error) => {
                warn!(
                    event_name = "personalize.fallback",
                    error = %error,
                    place_count = places.len(),
                    "scoring failed, returning unscored input"
                );
                places
                    .iter()
                    .take(self.max_results)
                    .map(|place| ScoredPlace {
                        place: place.clone(),
                        score: 0.0,
                        matching_interests: Vec::new(),
                        age_group_match: false,
                    })
                    .collect()
            }
        }
    }

    fn try_personalize(
        &self,
        places: &[Place],
        prefs: &PreferenceRecord,
        ctx: &PersonalizationContext,
    ) -> Result<Vec<ScoredPlace>, PersonalizeError> {
        let calc = ScoreCalculator::new(relevant_tags(&prefs.interests), prefs, ctx);

        let mut scored = Vec::with_capacity(places.len());
        for place in places.iter().filter(|place| passes_filters(place, ctx)) {
            let score = calc.score(place);
            if !score.is_finite() {
                return Err(PersonalizeError::NonFiniteScore {
                    place_id: place.id.0.clone(),
                    score,
                });
            }
            scored.push(ScoredPlace {
                place: place.clone(),
                score,
                matching_interests: calc.matching_interests(place),
                age_group_match: calc.age_group_match(place),
            });
        }

        scored.retain(|entry| entry.score > MIN_RELEVANCE_SCORE);
        // Vec::sort_by is stable: ties keep input order, so identical inputs
        // always produce identical output.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.max_results);
        Ok(scored)
    }
}

fn passes_filters(place: &Place, ctx: &PersonalizationContext) -> bool {
    if let Some(min_rating) = ctx.min_rating {
        if place.rating.unwrap_or(0.0) < min_rating {
            return false;
        }
    }
    // only a confirmed-closed place is dropped; unknown hours stay in
    if ctx.open_now_only && place.open_now == Some(false) {
        return false;
    }
    true
}

/// Expands declared interests through the fixed interest→tag table. Unmapped
/// interests pass through unchanged as literal tags. Set semantics make the
/// expansion idempotent under duplicate interests.
pub fn relevant_tags(interests: &[String]) -> HashSet<String> {
    let mut tags = HashSet::new();
    for interest in interests {
        match INTEREST_TAGS.iter().find(|mapping| mapping.interest == interest) {
            Some(mapping) => tags.extend(mapping.tags.iter().map(|tag| tag.to_string())),
            None => {
                tags.insert(interest.clone());
            }
        }
    }
    tags
}

/// First match against the fixed category priority order, else the first
/// tag, else "general".
pub fn primary_category(tags: &[String]) -> String {
    CATEGORY_PRIORITY
        .iter()
        .find(|candidate| tags.iter().any(|tag| tag == *candidate))
        .map(|candidate| candidate.to_string())
        .or_else(|| tags.first().cloned())
        .unwrap_or_else(|| "general".to_string())
}

/// Groups the top scored places by primary category and echoes the
/// preference snapshot they were ranked against.
pub fn summarize(scored: &[ScoredPlace], prefs: &PreferenceRecord) -> PersonalizationSummary {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for entry in scored.iter().take(SUMMARY_GROUP_LIMIT) {
        let category = primary_category(&entry.place.tags);
        let summary = SummaryEntry { name: entry.place.name.clone(), score: entry.score };
        match groups.iter_mut().find(|group| group.category == category) {
            Some(group) => group.places.push(summary),
            None => groups.push(CategoryGroup { category, places: vec![summary] }),
        }
    }
    PersonalizationSummary { top_by_category: groups, preferences: PreferenceSnapshot::from(prefs) }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::domain::geo::Coordinate;
    use crate::domain::place::{OperatingStatus, Place, PlaceId};
    use crate::domain::preferences::{PreferenceRecord, PreferenceUpdate};

    use super::*;

    fn place(id: &str, rating: Option<f64>, reviews: Option<u32>, tags: &[&str]) -> Place {
        Place {
            id: PlaceId(id.to_string()),
            name: format!("Place {id}"),
            location: Coordinate::new(40.7128, -74.0060).unwrap(),
            rating,
            review_count: reviews,
            price_level: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            vicinity: None,
            status: OperatingStatus::Operational,
            open_now: Some(true),
        }
    }

    fn ctx() -> PersonalizationContext {
        PersonalizationContext::at(Utc.with_ymd_and_hms(2026, 3, 14, 12, 30, 0).unwrap())
    }

    fn prefs() -> PreferenceRecord {
        PreferenceRecord::default_for("u-1").merged(PreferenceUpdate {
            interests: Some(vec!["food".to_string()]),
            ..Default::default()
        })
    }

    #[test]
    fn output_is_capped_sorted_and_above_threshold() {
        let engine = PersonalizationEngine::new(3);
        let places: Vec<Place> = (0..10)
            .map(|i| place(&format!("p-{i}"), Some(3.0 + 0.2 * i as f64), Some(100), &["restaurant"]))
            .collect();

        let scored = engine.personalize(&places, &prefs(), &ctx());

        assert_eq!(scored.len(), 3);
        assert!(scored.windows(2).all(|pair| pair[0].score >= pair[1].score));
        assert!(scored.iter().all(|entry| entry.score > MIN_RELEVANCE_SCORE));
        assert_eq!(scored[0].place.id.0, "p-9");
    }

    #[test]
    fn low_relevance_places_are_discarded() {
        let engine = PersonalizationEngine::default();
        // unrated, unreviewed, closed, no matching tags: scores at most the
        // mixed-environment point plus flexible half point
        let noise = Place {
            status: OperatingStatus::Unknown,
            ..place("noise", None, None, &["laundromat"])
        };
        let scored = engine.personalize(&[noise], &PreferenceRecord::default_for("u-1"), &ctx());
        assert!(scored.is_empty());
    }

    #[test]
    fn ties_keep_input_order() {
        let engine = PersonalizationEngine::default();
        let places =
            vec![place("first", Some(4.0), Some(50), &["restaurant"]),
                 place("second", Some(4.0), Some(50), &["restaurant"])];

        let scored = engine.personalize(&places, &prefs(), &ctx());

        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].score, scored[1].score);
        assert_eq!(scored[0].place.id.0, "first");
        assert_eq!(scored[1].place.id.0, "second");
    }

    #[test]
    fn non_finite_rating_degrades_to_unscored_input() {
        let engine = PersonalizationEngine::new(2);
        let places = vec![
            place("bad", Some(f64::NAN), Some(10), &["restaurant"]),
            place("ok-1", Some(4.0), Some(10), &["restaurant"]),
            place("ok-2", Some(4.5), Some(10), &["restaurant"]),
        ];

        let scored = engine.personalize(&places, &prefs(), &ctx());

        // fallback preserves input order, truncated to the cap, unscored
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].place.id.0, "bad");
        assert_eq!(scored[0].score, 0.0);
        assert!(scored[0].matching_interests.is_empty());
    }

    #[test]
    fn min_rating_filter_drops_low_and_unrated_places() {
        let engine = PersonalizationEngine::default();
        let places = vec![
            place("good", Some(4.5), Some(100), &["restaurant"]),
            place("bad", Some(3.0), Some(100), &["restaurant"]),
            place("unrated", None, Some(100), &["restaurant"]),
        ];
        let filtered_ctx = ctx().with_min_rating(4.0);

        let scored = engine.personalize(&places, &prefs(), &filtered_ctx);

        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].place.id.0, "good");
    }

    #[test]
    fn open_now_filter_only_drops_confirmed_closed() {
        let engine = PersonalizationEngine::default();
        let mut closed = place("closed", Some(4.5), Some(100), &["restaurant"]);
        closed.open_now = Some(false);
        let mut unknown = place("unknown", Some(4.5), Some(100), &["restaurant"]);
        unknown.open_now = None;
        let open = place("open", Some(4.5), Some(100), &["restaurant"]);

        let filtered_ctx = ctx().open_now_only();
        let scored = engine.personalize(&[closed, unknown, open], &prefs(), &filtered_ctx);

        let ids: Vec<&str> = scored.iter().map(|s| s.place.id.0.as_str()).collect();
        assert!(!ids.contains(&"closed"));
        assert!(ids.contains(&"unknown"));
        assert!(ids.contains(&"open"));
    }

    #[test]
    fn relevant_tags_is_idempotent_under_duplicates() {
        let once = relevant_tags(&["food".to_string()]);
        let twice = relevant_tags(&["food".to_string(), "food".to_string()]);
        assert_eq!(once, twice);
        assert!(once.contains("restaurant"));
        assert!(once.contains("cafe"));
    }

    #[test]
    fn unmapped_interests_pass_through_as_literal_tags() {
        let tags = relevant_tags(&["stargazing".to_string()]);
        assert_eq!(tags.len(), 1);
        assert!(tags.contains("stargazing"));
    }

    #[test]
    fn primary_category_follows_priority_then_first_tag_then_general() {
        let tags = vec!["point_of_interest".to_string(), "cafe".to_string()];
        assert_eq!(primary_category(&tags), "cafe");
        assert_eq!(primary_category(&["weird_tag".to_string()]), "weird_tag");
        assert_eq!(primary_category(&[]), "general");
    }

    #[test]
    fn summarize_groups_top_five_by_category() {
        let engine = PersonalizationEngine::default();
        let places = vec![
            place("r1", Some(4.8), Some(400), &["restaurant"]),
            place("r2", Some(4.6), Some(300), &["restaurant"]),
            place("m1", Some(4.7), Some(350), &["museum"]),
            place("c1", Some(4.5), Some(250), &["cafe"]),
            place("m2", Some(4.4), Some(200), &["museum"]),
            place("r3", Some(4.2), Some(150), &["restaurant"]),
        ];
        let user = prefs();
        let scored = engine.personalize(&places, &user, &ctx());

        let summary = summarize(&scored, &user);

        let total: usize = summary.top_by_category.iter().map(|g| g.places.len()).sum();
        assert_eq!(total, 5);
        assert_eq!(summary.preferences.interests, vec!["food".to_string()]);
        assert!(summary.top_by_category.iter().any(|g| g.category == "restaurant"));
        assert!(summary.top_by_category.iter().any(|g| g.category == "museum"));
    }
}
