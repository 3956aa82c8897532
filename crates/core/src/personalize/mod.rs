//! Personalized ranking of nearby places.
//!
//! Scores each place against a user's preference profile (interest overlap,
//! age-group priorities, price proximity, environment, time of day), filters
//! low-relevance results, and returns a capped, deterministically ordered
//! list.

mod engine;
mod scoring;
pub mod tables;
pub mod timing;
mod types;

pub use engine::{primary_category, relevant_tags, summarize, PersonalizationEngine};
pub use scoring::ScoreCalculator;
pub use types::{
    CategoryGroup, PersonalizationContext, PersonalizationSummary, PreferenceSnapshot,
    ScoredPlace, SummaryEntry,
};

/// Places scoring at or below this are dropped as not relevant.
pub const MIN_RELEVANCE_SCORE: f64 = 2.0;

/// Default cap for a personalized list.
pub const DEFAULT_MAX_RESULTS: usize = 15;

/// Cap for the cross-category top recommendations.
pub const TOP_RECOMMENDATION_LIMIT: usize = 10;

/// Cap on the damped review-count term.
pub const REVIEW_TERM_CAP: f64 = 5.0;

/// How many of the top scored places the summary groups by category.
pub const SUMMARY_GROUP_LIMIT: usize = 5;
