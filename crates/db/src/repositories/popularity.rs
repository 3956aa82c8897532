use chrono::{DateTime, Utc};
use sqlx::Row;

use localscope_core::domain::analytics::PopularArea;

use super::{PopularityRepository, RepositoryError};
use crate::DbPool;

/// Interests kept per area record; bounds row growth under heavy traffic.
const MAX_AGGREGATED_INTERESTS: usize = 25;

pub struct SqlPopularityRepository {
    pool: DbPool,
}

impl SqlPopularityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_area(row: &sqlx::sqlite::SqliteRow) -> Result<PopularArea, RepositoryError> {
    let area_id: String =
        row.try_get("area_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let search_count: i64 =
        row.try_get("search_count").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let last_searched_raw: String =
        row.try_get("last_searched").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let interests_raw: String =
        row.try_get("aggregated_interests").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let aggregated_interests: Vec<String> = serde_json::from_str(&interests_raw)
        .map_err(|e| RepositoryError::Decode(format!("aggregated_interests: {e}")))?;

    Ok(PopularArea {
        area_id,
        search_count,
        last_searched: DateTime::parse_from_rfc3339(&last_searched_raw)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        aggregated_interests,
    })
}

#[async_trait::async_trait]
impl PopularityRepository for SqlPopularityRepository {
    async fn record_search(
        &self,
        area_id: &str,
        interests: &[String],
    ) -> Result<(), RepositoryError> {
        // read-merge-write: the interest union needs the stored set, and a
        // lost concurrent increment is acceptable for informational counters
        let existing: Option<String> = sqlx::query_scalar(
            "SELECT aggregated_interests FROM popular_areas WHERE area_id = ?",
        )
        .bind(area_id)
        .fetch_optional(&self.pool)
        .await?;

        let mut aggregated: Vec<String> = match existing {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| RepositoryError::Decode(format!("aggregated_interests: {e}")))?,
            None => Vec::new(),
        };
        for interest in interests {
            if aggregated.len() >= MAX_AGGREGATED_INTERESTS {
                break;
            }
            if !aggregated.contains(interest) {
                aggregated.push(interest.clone());
            }
        }
        let aggregated_raw = serde_json::to_string(&aggregated)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        sqlx::query(
            "INSERT INTO popular_areas (area_id, search_count, last_searched, aggregated_interests)
             VALUES (?, 1, ?, ?)
             ON CONFLICT(area_id) DO UPDATE SET
                search_count = search_count + 1,
                last_searched = excluded.last_searched,
                aggregated_interests = excluded.aggregated_interests",
        )
        .bind(area_id)
        .bind(Utc::now().to_rfc3339())
        .bind(aggregated_raw)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn most_popular(&self, limit: u32) -> Result<Vec<PopularArea>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT area_id, search_count, last_searched, aggregated_interests
             FROM popular_areas
             ORDER BY search_count DESC, area_id ASC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_area).collect()
    }

    async fn evict_stale(&self, older_than: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM popular_areas WHERE last_searched < ?")
            .bind(older_than.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::connect_with_settings;
    use crate::migrations::run_pending;

    use super::*;

    async fn repo() -> SqlPopularityRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrations");
        SqlPopularityRepository::new(pool)
    }

    #[tokio::test]
    async fn counts_accumulate_and_interests_union() {
        let repo = repo().await;

        repo.record_search("pop:4071:-7401", &["food".to_string()]).await.expect("first");
        repo.record_search("pop:4071:-7401", &["food".to_string(), "art".to_string()])
            .await
            .expect("second");

        let areas = repo.most_popular(10).await.expect("list");
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].search_count, 2);
        assert_eq!(areas[0].aggregated_interests, vec!["food".to_string(), "art".to_string()]);
    }

    #[tokio::test]
    async fn most_popular_orders_by_count_descending() {
        let repo = repo().await;

        for _ in 0..3 {
            repo.record_search("pop:busy", &[]).await.expect("busy");
        }
        repo.record_search("pop:slow", &[]).await.expect("slow");

        let areas = repo.most_popular(10).await.expect("list");
        assert_eq!(areas[0].area_id, "pop:busy");
        assert_eq!(areas[0].search_count, 3);
        assert_eq!(areas[1].area_id, "pop:slow");

        let capped = repo.most_popular(1).await.expect("capped");
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn evict_stale_drops_only_old_areas() {
        let repo = repo().await;
        repo.record_search("pop:old", &[]).await.expect("old");
        repo.record_search("pop:fresh", &[]).await.expect("fresh");

        let stale = (Utc::now() - Duration::days(14)).to_rfc3339();
        sqlx::query("UPDATE popular_areas SET last_searched = ? WHERE area_id = 'pop:old'")
            .bind(stale)
            .execute(&repo.pool)
            .await
            .expect("backdate");

        let evicted = repo.evict_stale(Utc::now() - Duration::days(7)).await.expect("evict");
        assert_eq!(evicted, 1);

        let areas = repo.most_popular(10).await.expect("list");
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].area_id, "pop:fresh");
    }
}
