//! In-memory repository implementations for orchestrator and handler tests.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use localscope_core::domain::analytics::{AnalyticsEvent, PopularArea};
use localscope_core::domain::place::AreaBundle;
use localscope_core::domain::preferences::{PreferenceRecord, PreferenceUpdate};

use super::{
    AnalyticsRepository, GeoCacheRepository, PopularityRepository, PreferenceRepository,
    RepositoryError,
};

#[derive(Default)]
pub struct InMemoryPreferenceRepository {
    records: RwLock<HashMap<String, PreferenceRecord>>,
}

#[async_trait::async_trait]
impl PreferenceRepository for InMemoryPreferenceRepository {
    async fn find(&self, user_id: &str) -> Result<Option<PreferenceRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.get(user_id).cloned())
    }

    async fn save(
        &self,
        user_id: &str,
        update: PreferenceUpdate,
    ) -> Result<PreferenceRecord, RepositoryError> {
        let mut records = self.records.write().await;
        let current = records
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| PreferenceRecord::default_for(user_id));
        let merged = current.merged(update);
        records.insert(user_id.to_string(), merged.clone());
        Ok(merged)
    }

    async fn delete(&self, user_id: &str) -> Result<bool, RepositoryError> {
        let mut records = self.records.write().await;
        Ok(records.remove(user_id).is_some())
    }
}

struct CachedBundle {
    bundle: AreaBundle,
    cached_at: DateTime<Utc>,
    access_count: u64,
}

#[derive(Default)]
pub struct InMemoryGeoCacheRepository {
    entries: RwLock<HashMap<String, CachedBundle>>,
}

impl InMemoryGeoCacheRepository {
    pub async fn access_count(&self, key: &str) -> Option<u64> {
        self.entries.read().await.get(key).map(|entry| entry.access_count)
    }

    /// Test hook: backdate an entry so TTL expiry paths can be exercised.
    pub async fn backdate(&self, key: &str, age: Duration) {
        if let Some(entry) = self.entries.write().await.get_mut(key) {
            entry.cached_at -= age;
        }
    }
}

#[async_trait::async_trait]
impl GeoCacheRepository for InMemoryGeoCacheRepository {
    async fn get(
        &self,
        key: &str,
        max_age: Duration,
    ) -> Result<Option<AreaBundle>, RepositoryError> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if Utc::now() - entry.cached_at <= max_age => {
                Ok(Some(entry.bundle.clone()))
            }
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, bundle: &AreaBundle) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CachedBundle { bundle: bundle.clone(), cached_at: Utc::now(), access_count: 1 },
        );
        Ok(())
    }

    async fn touch(&self, key: &str) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(key) {
            entry.access_count += 1;
        }
        Ok(())
    }

    async fn evict_expired(&self, older_than: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.cached_at >= older_than);
        Ok((before - entries.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryPopularityRepository {
    areas: RwLock<HashMap<String, PopularArea>>,
}

#[async_trait::async_trait]
impl PopularityRepository for InMemoryPopularityRepository {
    async fn record_search(
        &self,
        area_id: &str,
        interests: &[String],
    ) -> Result<(), RepositoryError> {
        let mut areas = self.areas.write().await;
        let area = areas.entry(area_id.to_string()).or_insert_with(|| PopularArea {
            area_id: area_id.to_string(),
            search_count: 0,
            last_searched: Utc::now(),
            aggregated_interests: Vec::new(),
        });
        area.search_count += 1;
        area.last_searched = Utc::now();
        for interest in interests {
            if !area.aggregated_interests.contains(interest) {
                area.aggregated_interests.push(interest.clone());
            }
        }
        Ok(())
    }

    async fn most_popular(&self, limit: u32) -> Result<Vec<PopularArea>, RepositoryError> {
        let areas = self.areas.read().await;
        let mut listing: Vec<PopularArea> = areas.values().cloned().collect();
        listing.sort_by(|a, b| {
            b.search_count.cmp(&a.search_count).then_with(|| a.area_id.cmp(&b.area_id))
        });
        listing.truncate(limit as usize);
        Ok(listing)
    }

    async fn evict_stale(&self, older_than: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut areas = self.areas.write().await;
        let before = areas.len();
        areas.retain(|_, area| area.last_searched >= older_than);
        Ok((before - areas.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryAnalyticsRepository {
    events: RwLock<Vec<AnalyticsEvent>>,
}

#[async_trait::async_trait]
impl AnalyticsRepository for InMemoryAnalyticsRepository {
    async fn record_event(&self, event: &AnalyticsEvent) -> Result<(), RepositoryError> {
        let mut events = self.events.write().await;
        if !events.iter().any(|existing| existing.id == event.id) {
            events.push(event.clone());
        }
        Ok(())
    }

    async fn recent_events(&self, limit: u32) -> Result<Vec<AnalyticsEvent>, RepositoryError> {
        let events = self.events.read().await;
        Ok(events.iter().rev().take(limit as usize).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_cache_round_trip_and_expiry() {
        let repo = InMemoryGeoCacheRepository::default();
        let bundle = AreaBundle::default();

        repo.put("k", &bundle).await.expect("put");
        assert!(repo.get("k", Duration::hours(24)).await.expect("get").is_some());

        repo.backdate("k", Duration::hours(48)).await;
        assert!(repo.get("k", Duration::hours(24)).await.expect("get").is_none());
        // lazy delete happened
        assert!(repo.access_count("k").await.is_none());
    }

    #[tokio::test]
    async fn in_memory_preferences_merge_like_sql() {
        let repo = InMemoryPreferenceRepository::default();
        let saved = repo
            .save(
                "u-1",
                PreferenceUpdate {
                    interests: Some(vec!["nature".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .expect("save");
        assert_eq!(saved.interests, vec!["nature".to_string()]);

        assert!(repo.delete("u-1").await.expect("delete"));
        assert!(repo.find("u-1").await.expect("find").is_none());
    }

    #[tokio::test]
    async fn in_memory_popularity_orders_by_count() {
        let repo = InMemoryPopularityRepository::default();
        repo.record_search("a", &[]).await.expect("a");
        repo.record_search("b", &[]).await.expect("b1");
        repo.record_search("b", &[]).await.expect("b2");

        let listing = repo.most_popular(10).await.expect("list");
        assert_eq!(listing[0].area_id, "b");
        assert_eq!(listing[0].search_count, 2);
    }
}
