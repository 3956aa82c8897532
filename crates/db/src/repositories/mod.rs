use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use localscope_core::domain::analytics::{AnalyticsEvent, PopularArea};
use localscope_core::domain::place::AreaBundle;
use localscope_core::domain::preferences::{PreferenceRecord, PreferenceUpdate};

pub mod analytics;
pub mod geo_cache;
pub mod memory;
pub mod popularity;
pub mod preferences;

pub use analytics::SqlAnalyticsRepository;
pub use geo_cache::SqlGeoCacheRepository;
pub use memory::{
    InMemoryAnalyticsRepository, InMemoryGeoCacheRepository, InMemoryPopularityRepository,
    InMemoryPreferenceRepository,
};
pub use popularity::SqlPopularityRepository;
pub use preferences::SqlPreferenceRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Per-user preference persistence. Defaulting on absence is the caller's
/// concern; the repository only reports what is stored.
#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    async fn find(&self, user_id: &str) -> Result<Option<PreferenceRecord>, RepositoryError>;

    /// Merges the update over the stored record (or the default profile),
    /// persists, and returns the merged record.
    async fn save(
        &self,
        user_id: &str,
        update: PreferenceUpdate,
    ) -> Result<PreferenceRecord, RepositoryError>;

    /// Returns whether a record existed.
    async fn delete(&self, user_id: &str) -> Result<bool, RepositoryError>;
}

/// Geographic cache of fetched area bundles, keyed by rounded coordinate +
/// radius. Entries expire lazily on read past their TTL.
#[async_trait]
pub trait GeoCacheRepository: Send + Sync {
    /// Returns the payload while it is fresher than `max_age`; deletes an
    /// expired entry as a side effect and reports a miss.
    async fn get(
        &self,
        key: &str,
        max_age: chrono::Duration,
    ) -> Result<Option<AreaBundle>, RepositoryError>;

    /// Creates or overwrites the entry with a fresh timestamp and an access
    /// count reset to 1.
    async fn put(&self, key: &str, bundle: &AreaBundle) -> Result<(), RepositoryError>;

    /// Bumps the access counter and last-accessed stamp. Never extends TTL.
    async fn touch(&self, key: &str) -> Result<(), RepositoryError>;

    /// Deletes entries cached before `older_than`, returning how many.
    async fn evict_expired(&self, older_than: DateTime<Utc>) -> Result<u64, RepositoryError>;
}

/// Monotonic search-popularity counters per coarse area cell.
#[async_trait]
pub trait PopularityRepository: Send + Sync {
    async fn record_search(
        &self,
        area_id: &str,
        interests: &[String],
    ) -> Result<(), RepositoryError>;

    async fn most_popular(&self, limit: u32) -> Result<Vec<PopularArea>, RepositoryError>;

    async fn evict_stale(&self, older_than: DateTime<Utc>) -> Result<u64, RepositoryError>;
}

/// Append-only analytics event log.
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn record_event(&self, event: &AnalyticsEvent) -> Result<(), RepositoryError>;

    async fn recent_events(&self, limit: u32) -> Result<Vec<AnalyticsEvent>, RepositoryError>;
}
