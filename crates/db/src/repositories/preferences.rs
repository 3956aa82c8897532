use chrono::{DateTime, Utc};
use sqlx::Row;

use localscope_core::domain::preferences::{PreferenceRecord, PreferenceUpdate};

use super::{PreferenceRepository, RepositoryError};
use crate::DbPool;

pub struct SqlPreferenceRepository {
    pool: DbPool,
}

impl SqlPreferenceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<PreferenceRecord, RepositoryError> {
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let interests_raw: String =
        row.try_get("interests").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let age_group_raw: String =
        row.try_get("age_group").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let activity_types_raw: String =
        row.try_get("activity_types").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let environment_raw: String =
        row.try_get("environment").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price_range_raw: String =
        row.try_get("price_range").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let time_preference_raw: String =
        row.try_get("time_preference").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_raw: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_raw: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let interests: Vec<String> = serde_json::from_str(&interests_raw)
        .map_err(|e| RepositoryError::Decode(format!("interests: {e}")))?;
    let activity_types: Vec<String> = serde_json::from_str(&activity_types_raw)
        .map_err(|e| RepositoryError::Decode(format!("activity_types: {e}")))?;

    Ok(PreferenceRecord {
        user_id,
        interests,
        age_group: age_group_raw
            .parse()
            .map_err(|e| RepositoryError::Decode(format!("age_group: {e}")))?,
        activity_types,
        environment: environment_raw
            .parse()
            .map_err(|e| RepositoryError::Decode(format!("environment: {e}")))?,
        price_range: price_range_raw
            .parse()
            .map_err(|e| RepositoryError::Decode(format!("price_range: {e}")))?,
        time_preference: time_preference_raw
            .parse()
            .map_err(|e| RepositoryError::Decode(format!("time_preference: {e}")))?,
        created_at: parse_timestamp(&created_at_raw),
        updated_at: parse_timestamp(&updated_at_raw),
    })
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn encode_list(values: &[String]) -> Result<String, RepositoryError> {
    serde_json::to_string(values).map_err(|e| RepositoryError::Decode(e.to_string()))
}

#[async_trait::async_trait]
impl PreferenceRepository for SqlPreferenceRepository {
    async fn find(&self, user_id: &str) -> Result<Option<PreferenceRecord>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM user_preferences WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn save(
        &self,
        user_id: &str,
        update: PreferenceUpdate,
    ) -> Result<PreferenceRecord, RepositoryError> {
        let current = self
            .find(user_id)
            .await?
            .unwrap_or_else(|| PreferenceRecord::default_for(user_id));
        let merged = current.merged(update);

        sqlx::query(
            "INSERT INTO user_preferences
                (user_id, interests, age_group, activity_types, environment,
                 price_range, time_preference, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                interests = excluded.interests,
                age_group = excluded.age_group,
                activity_types = excluded.activity_types,
                environment = excluded.environment,
                price_range = excluded.price_range,
                time_preference = excluded.time_preference,
                updated_at = excluded.updated_at",
        )
        .bind(&merged.user_id)
        .bind(encode_list(&merged.interests)?)
        .bind(merged.age_group.as_str())
        .bind(encode_list(&merged.activity_types)?)
        .bind(merged.environment.as_str())
        .bind(merged.price_range.as_str())
        .bind(merged.time_preference.as_str())
        .bind(merged.created_at.to_rfc3339())
        .bind(merged.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(merged)
    }

    async fn delete(&self, user_id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM user_preferences WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
