//! Request-level coordinator: cache lookup, provider fan-out, preference
//! resolution, personalization, visit-timing heuristics, and payload
//! assembly for one insights request.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use localscope_core::config::AppConfig;
use localscope_core::domain::geo::{
    area_cache_key, popularity_area_key, validate_radius, Coordinate,
};
use localscope_core::domain::place::{AreaBundle, Place};
use localscope_core::domain::preferences::PreferenceRecord;
use localscope_core::personalize::timing::{best_visit_time, peak_time_analysis, PeakTimeAnalysis};
use localscope_core::personalize::{
    summarize, PersonalizationContext, PersonalizationEngine, PersonalizationSummary, ScoredPlace,
};
use localscope_db::repositories::{GeoCacheRepository, PreferenceRepository};
use localscope_places::{fetch_area_bundle, NearbySearch};

use crate::analytics::{AnalyticsHandle, AnalyticsSignal};
use crate::error::ApiError;

/// Response caps per category list.
const LANDMARKS_CAP: usize = 5;
const RESTAURANTS_CAP: usize = 5;
const ATTRACTIONS_CAP: usize = 5;
const ENTERTAINMENT_CAP: usize = 3;
const SHOPPING_CAP: usize = 3;

const TOP_CATEGORY_STAT_LIMIT: usize = 5;

#[derive(Clone, Debug)]
pub struct InsightsConfig {
    pub radius_m: u32,
    pub area_ttl: Duration,
    pub max_results: usize,
    pub top_recommendations: usize,
}

impl InsightsConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            radius_m: config.places.radius_m,
            area_ttl: Duration::hours(config.cache.area_ttl_hours as i64),
            max_results: config.personalization.max_results,
            top_recommendations: config.personalization.top_recommendations,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct InsightsRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub user_id: Option<String>,
    pub radius: Option<u32>,
    #[serde(default)]
    pub filters: InsightsFilters,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct InsightsFilters {
    pub min_rating: Option<f64>,
    pub open_now: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct CategoryCount {
    pub tag: String,
    pub count: u32,
}

#[derive(Debug, Serialize)]
pub struct AreaStats {
    pub average_rating: Option<f64>,
    pub price_level_histogram: [u32; 5],
    pub top_categories: Vec<CategoryCount>,
}

#[derive(Debug, Serialize)]
pub struct AreaInsights {
    pub coordinate: Coordinate,
    pub landmarks: Vec<ScoredPlace>,
    pub restaurants: Vec<ScoredPlace>,
    pub attractions: Vec<ScoredPlace>,
    pub entertainment: Vec<ScoredPlace>,
    pub shopping: Vec<ScoredPlace>,
    pub top_recommendations: Vec<ScoredPlace>,
    pub peak_times: PeakTimeAnalysis,
    pub best_visit_time: &'static str,
    pub personalization_summary: PersonalizationSummary,
    pub area_stats: AreaStats,
    pub from_cache: bool,
    pub processing_time_ms: u64,
}

pub struct InsightsService {
    cache: Arc<dyn GeoCacheRepository>,
    provider: Arc<dyn NearbySearch>,
    preferences: Arc<dyn PreferenceRepository>,
    analytics: AnalyticsHandle,
    config: InsightsConfig,
}

impl InsightsService {
    pub fn new(
        cache: Arc<dyn GeoCacheRepository>,
        provider: Arc<dyn NearbySearch>,
        preferences: Arc<dyn PreferenceRepository>,
        analytics: AnalyticsHandle,
        config: InsightsConfig,
    ) -> Self {
        Self { cache, provider, preferences, analytics, config }
    }

    pub async fn generate(&self, request: InsightsRequest) -> Result<AreaInsights, ApiError> {
        let started = Instant::now();

        let location = Coordinate::new(request.latitude, request.longitude)?;
        let radius_m = validate_radius(request.radius.unwrap_or(self.config.radius_m))?;
        let cache_key = area_cache_key(&location, radius_m);

        let (bundle, from_cache) = self.load_bundle(&cache_key, location, radius_m).await;
        let prefs = self.resolve_preferences(request.user_id.as_deref()).await;
        let ctx = build_context(&request.filters);

        // scoring and aggregation are pure and synchronous; a panic here is
        // the "unexpected internal failure" case and must not take the
        // worker down with it
        let config = self.config.clone();
        let ranked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            rank_and_annotate(&bundle, &prefs, &ctx, &config)
        }))
        .map_err(|_| ApiError::Internal("personalization pipeline panicked".to_string()))?;

        self.analytics.dispatch(AnalyticsSignal::SearchPerformed {
            area_id: popularity_area_key(&location),
            latitude: location.latitude,
            longitude: location.longitude,
            interests: prefs.interests.clone(),
            from_cache,
        });

        let processing_time_ms = started.elapsed().as_millis() as u64;
        info!(
            event_name = "insights.generated",
            cache_key = %cache_key,
            from_cache,
            place_count = bundle.total_places(),
            top_count = ranked.top_recommendations.len(),
            processing_time_ms,
            "area insights generated"
        );

        Ok(AreaInsights {
            coordinate: location,
            landmarks: ranked.landmarks,
            restaurants: ranked.restaurants,
            attractions: ranked.attractions,
            entertainment: ranked.entertainment,
            shopping: ranked.shopping,
            top_recommendations: ranked.top_recommendations,
            peak_times: ranked.peak_times,
            best_visit_time: best_visit_time(&prefs),
            personalization_summary: ranked.personalization_summary,
            area_stats: ranked.area_stats,
            from_cache,
            processing_time_ms,
        })
    }

    /// Cache-or-fetch. Storage failures on either side degrade: a failed
    /// read is a miss, a failed write leaves the response unaffected.
    async fn load_bundle(
        &self,
        cache_key: &str,
        location: Coordinate,
        radius_m: u32,
    ) -> (AreaBundle, bool) {
        let cached = match self.cache.get(cache_key, self.config.area_ttl).await {
            Ok(found) => found,
            Err(error) => {
                warn!(
                    event_name = "insights.cache_read_failed",
                    cache_key,
                    error = %error,
                    "cache read failed, treating as miss"
                );
                None
            }
        };

        match cached {
            Some(bundle) => {
                if let Err(error) = self.cache.touch(cache_key).await {
                    warn!(
                        event_name = "insights.cache_touch_failed",
                        cache_key,
                        error = %error,
                        "cache touch failed"
                    );
                }
                (bundle, true)
            }
            None => {
                let bundle = fetch_area_bundle(self.provider.as_ref(), location, radius_m).await;
                if let Err(error) = self.cache.put(cache_key, &bundle).await {
                    warn!(
                        event_name = "insights.cache_write_failed",
                        cache_key,
                        error = %error,
                        "cache write failed"
                    );
                }
                (bundle, false)
            }
        }
    }

    async fn resolve_preferences(&self, user_id: Option<&str>) -> PreferenceRecord {
        let Some(user_id) = user_id else {
            return PreferenceRecord::default_for("anonymous");
        };

        match self.preferences.find(user_id).await {
            Ok(Some(record)) => record,
            Ok(None) => PreferenceRecord::default_for(user_id),
            Err(error) => {
                warn!(
                    event_name = "insights.preferences_read_failed",
                    user_id,
                    error = %error,
                    "preference read failed, using defaults"
                );
                PreferenceRecord::default_for(user_id)
            }
        }
    }
}

struct RankedInsights {
    landmarks: Vec<ScoredPlace>,
    restaurants: Vec<ScoredPlace>,
    attractions: Vec<ScoredPlace>,
    entertainment: Vec<ScoredPlace>,
    shopping: Vec<ScoredPlace>,
    top_recommendations: Vec<ScoredPlace>,
    peak_times: PeakTimeAnalysis,
    personalization_summary: PersonalizationSummary,
    area_stats: AreaStats,
}

/// Steps 4-6 of the pipeline: per-category personalization, the
/// cross-category re-rank, and the derived heuristics and stats.
fn rank_and_annotate(
    bundle: &AreaBundle,
    prefs: &PreferenceRecord,
    ctx: &PersonalizationContext,
    config: &InsightsConfig,
) -> RankedInsights {
    let engine = PersonalizationEngine::new(config.max_results);
    let landmarks = engine.personalize(&bundle.landmarks, prefs, ctx);
    let restaurants = engine.personalize(&bundle.restaurants, prefs, ctx);
    let attractions = engine.personalize(&bundle.attractions, prefs, ctx);
    let entertainment = engine.personalize(&bundle.entertainment, prefs, ctx);
    let shopping = engine.personalize(&bundle.shopping, prefs, ctx);

    let combined: Vec<Place> = landmarks
        .iter()
        .chain(&restaurants)
        .chain(&attractions)
        .chain(&entertainment)
        .chain(&shopping)
        .map(|scored| scored.place.clone())
        .collect();
    let top_engine = PersonalizationEngine::new(config.top_recommendations);
    let top_recommendations = top_engine.personalize(&combined, prefs, ctx);

    let peak_times = peak_time_analysis(&top_recommendations, prefs, ctx);
    let personalization_summary = summarize(&top_recommendations, prefs);
    let area_stats = compute_area_stats(bundle);

    RankedInsights {
        landmarks: capped(landmarks, LANDMARKS_CAP),
        restaurants: capped(restaurants, RESTAURANTS_CAP),
        attractions: capped(attractions, ATTRACTIONS_CAP),
        entertainment: capped(entertainment, ENTERTAINMENT_CAP),
        shopping: capped(shopping, SHOPPING_CAP),
        top_recommendations,
        peak_times,
        personalization_summary,
        area_stats,
    }
}

fn build_context(filters: &InsightsFilters) -> PersonalizationContext {
    let mut ctx = PersonalizationContext::at(Utc::now());
    if let Some(min_rating) = filters.min_rating {
        ctx = ctx.with_min_rating(min_rating);
    }
    if filters.open_now == Some(true) {
        ctx = ctx.open_now_only();
    }
    ctx
}

fn capped(mut scored: Vec<ScoredPlace>, cap: usize) -> Vec<ScoredPlace> {
    scored.truncate(cap);
    scored
}

fn compute_area_stats(bundle: &AreaBundle) -> AreaStats {
    let mut rating_sum = 0.0;
    let mut rated = 0u32;
    let mut histogram = [0u32; 5];
    let mut tag_counts: Vec<CategoryCount> = Vec::new();

    for place in bundle.all_places() {
        if let Some(rating) = place.rating {
            rating_sum += rating;
            rated += 1;
        }
        if let Some(level) = place.price_level {
            if let Some(slot) = histogram.get_mut(level as usize) {
                *slot += 1;
            }
        }
        for tag in &place.tags {
            match tag_counts.iter_mut().find(|entry| entry.tag == *tag) {
                Some(entry) => entry.count += 1,
                None => tag_counts.push(CategoryCount { tag: tag.clone(), count: 1 }),
            }
        }
    }

    tag_counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    tag_counts.truncate(TOP_CATEGORY_STAT_LIMIT);

    AreaStats {
        average_rating: (rated > 0).then(|| (rating_sum / rated as f64 * 100.0).round() / 100.0),
        price_level_histogram: histogram,
        top_categories: tag_counts,
    }
}
