use chrono::{DateTime, Duration, Utc};
use sqlx::Row;
use tracing::debug;

use localscope_core::domain::place::AreaBundle;

use super::{GeoCacheRepository, RepositoryError};
use crate::DbPool;

pub struct SqlGeoCacheRepository {
    pool: DbPool,
}

impl SqlGeoCacheRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("cached_at: {e}")))
}

#[async_trait::async_trait]
impl GeoCacheRepository for SqlGeoCacheRepository {
    async fn get(
        &self,
        key: &str,
        max_age: Duration,
    ) -> Result<Option<AreaBundle>, RepositoryError> {
        let row = sqlx::query("SELECT payload, cached_at FROM area_cache WHERE cache_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            debug!(event_name = "geo_cache.miss", cache_key = key, "cache miss");
            return Ok(None);
        };

        let cached_at_raw: String =
            row.try_get("cached_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let cached_at = parse_timestamp(&cached_at_raw)?;

        if Utc::now() - cached_at > max_age {
            debug!(event_name = "geo_cache.expired", cache_key = key, "entry past ttl, deleting");
            sqlx::query("DELETE FROM area_cache WHERE cache_key = ?")
                .bind(key)
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }

        let payload_raw: String =
            row.try_get("payload").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let bundle: AreaBundle = serde_json::from_str(&payload_raw)
            .map_err(|e| RepositoryError::Decode(format!("payload: {e}")))?;

        debug!(event_name = "geo_cache.hit", cache_key = key, "cache hit");
        Ok(Some(bundle))
    }

    async fn put(&self, key: &str, bundle: &AreaBundle) -> Result<(), RepositoryError> {
        let payload =
            serde_json::to_string(bundle).map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO area_cache (cache_key, payload, cached_at, access_count, last_accessed)
             VALUES (?, ?, ?, 1, ?)
             ON CONFLICT(cache_key) DO UPDATE SET
                payload = excluded.payload,
                cached_at = excluded.cached_at,
                access_count = 1,
                last_accessed = excluded.last_accessed",
        )
        .bind(key)
        .bind(payload)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn touch(&self, key: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE area_cache
             SET access_count = access_count + 1, last_accessed = ?
             WHERE cache_key = ?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(key)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn evict_expired(&self, older_than: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM area_cache WHERE cached_at < ?")
            .bind(older_than.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use localscope_core::domain::geo::Coordinate;
    use localscope_core::domain::place::{OperatingStatus, Place, PlaceId};

    use crate::connect_with_settings;
    use crate::migrations::run_pending;

    use super::*;

    fn bundle() -> AreaBundle {
        AreaBundle {
            restaurants: vec![Place {
                id: PlaceId("p-1".to_string()),
                name: "Corner Bistro".to_string(),
                location: Coordinate::new(40.7128, -74.0060).unwrap(),
                rating: Some(4.4),
                review_count: Some(820),
                price_level: Some(2),
                tags: vec!["restaurant".to_string()],
                vicinity: Some("331 W 4th St".to_string()),
                status: OperatingStatus::Operational,
                open_now: Some(true),
            }],
            ..AreaBundle::default()
        }
    }

    async fn repo() -> SqlGeoCacheRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrations");
        SqlGeoCacheRepository::new(pool)
    }

    #[tokio::test]
    async fn put_then_get_round_trips_within_ttl() {
        let repo = repo().await;
        let payload = bundle();

        repo.put("area:40713:-74006:3000", &payload).await.expect("put");
        let found = repo
            .get("area:40713:-74006:3000", Duration::hours(24))
            .await
            .expect("get");

        assert_eq!(found, Some(payload));
    }

    #[tokio::test]
    async fn expired_entry_is_deleted_on_read() {
        let repo = repo().await;
        repo.put("k", &bundle()).await.expect("put");

        // backdate the entry past any ttl
        let stale = (Utc::now() - Duration::hours(48)).to_rfc3339();
        sqlx::query("UPDATE area_cache SET cached_at = ? WHERE cache_key = 'k'")
            .bind(stale)
            .execute(&repo.pool)
            .await
            .expect("backdate");

        assert_eq!(repo.get("k", Duration::hours(24)).await.expect("get"), None);

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM area_cache")
            .fetch_one(&repo.pool)
            .await
            .expect("count");
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn touch_increments_access_count_without_extending_ttl() {
        let repo = repo().await;
        repo.put("k", &bundle()).await.expect("put");

        let before: String = sqlx::query_scalar("SELECT cached_at FROM area_cache WHERE cache_key = 'k'")
            .fetch_one(&repo.pool)
            .await
            .expect("cached_at");

        repo.touch("k").await.expect("touch");
        repo.touch("k").await.expect("touch");

        let row = sqlx::query("SELECT access_count, cached_at FROM area_cache WHERE cache_key = 'k'")
            .fetch_one(&repo.pool)
            .await
            .expect("row");
        let count: i64 = row.get("access_count");
        let after: String = row.get("cached_at");
        assert_eq!(count, 3);
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn overwrite_resets_access_count() {
        let repo = repo().await;
        repo.put("k", &bundle()).await.expect("put");
        repo.touch("k").await.expect("touch");
        repo.put("k", &bundle()).await.expect("overwrite");

        let count: i64 =
            sqlx::query_scalar("SELECT access_count FROM area_cache WHERE cache_key = 'k'")
                .fetch_one(&repo.pool)
                .await
                .expect("count");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn evict_expired_removes_only_old_entries() {
        let repo = repo().await;
        repo.put("old", &bundle()).await.expect("put old");
        repo.put("fresh", &bundle()).await.expect("put fresh");

        let stale = (Utc::now() - Duration::hours(48)).to_rfc3339();
        sqlx::query("UPDATE area_cache SET cached_at = ? WHERE cache_key = 'old'")
            .bind(stale)
            .execute(&repo.pool)
            .await
            .expect("backdate");

        let evicted = repo
            .evict_expired(Utc::now() - Duration::hours(24))
            .await
            .expect("evict");

        assert_eq!(evicted, 1);
        assert!(repo.get("fresh", Duration::hours(24)).await.expect("get").is_some());
    }
}
