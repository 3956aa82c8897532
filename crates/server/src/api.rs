//! HTTP surface consumed by the map frontend.
//!
//! - `POST   /api/v1/insights`                — personalized nearby insights
//! - `GET    /api/v1/preferences/{user_id}`   — stored profile + valid options
//! - `PUT    /api/v1/preferences/{user_id}`   — partial profile update
//! - `DELETE /api/v1/preferences/{user_id}`   — remove the stored profile
//! - `GET    /api/v1/areas/popular`           — most-searched areas

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;

use localscope_core::domain::analytics::PopularArea;
use localscope_core::domain::preferences::{
    PreferenceOptions, PreferenceRecord, PreferenceUpdate,
};
use localscope_db::repositories::{PopularityRepository, PreferenceRepository};

use crate::error::ApiError;
use crate::insights::{AreaInsights, InsightsRequest, InsightsService};

const DEFAULT_POPULAR_LIMIT: u32 = 10;
const MAX_POPULAR_LIMIT: u32 = 100;

#[derive(Clone)]
pub struct ApiState {
    pub insights: Arc<InsightsService>,
    pub preferences: Arc<dyn PreferenceRepository>,
    pub popularity: Arc<dyn PopularityRepository>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/insights", post(generate_insights))
        .route(
            "/api/v1/preferences/{user_id}",
            get(get_preferences).put(put_preferences).delete(delete_preferences),
        )
        .route("/api/v1/areas/popular", get(popular_areas))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub preferences: PreferenceRecord,
    pub options: PreferenceOptions,
}

#[derive(Debug, Serialize)]
pub struct DeleteAck {
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub limit: Option<u32>,
}

pub async fn generate_insights(
    State(state): State<ApiState>,
    Json(request): Json<InsightsRequest>,
) -> Result<Json<AreaInsights>, ApiError> {
    state.insights.generate(request).await.map(Json)
}

/// Absent record and storage failure both resolve to the default profile;
/// the caller always gets a usable payload.
pub async fn get_preferences(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Json<PreferencesResponse> {
    let preferences = match state.preferences.find(&user_id).await {
        Ok(Some(record)) => record,
        Ok(None) => PreferenceRecord::default_for(&user_id),
        Err(error) => {
            warn!(
                event_name = "api.preferences.read_failed",
                user_id = %user_id,
                error = %error,
                "preference read failed, serving defaults"
            );
            PreferenceRecord::default_for(&user_id)
        }
    };

    Json(PreferencesResponse { preferences, options: PreferenceOptions::available() })
}

/// Unknown enum values are rejected by deserialization before this handler
/// runs. A storage failure degrades to the locally merged record so the
/// caller still sees the profile it asked for.
pub async fn put_preferences(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Json(update): Json<PreferenceUpdate>,
) -> Json<PreferenceRecord> {
    match state.preferences.save(&user_id, update.clone()).await {
        Ok(record) => Json(record),
        Err(error) => {
            warn!(
                event_name = "api.preferences.write_failed",
                user_id = %user_id,
                error = %error,
                "preference write failed, returning unpersisted merge"
            );
            Json(PreferenceRecord::default_for(&user_id).merged(update))
        }
    }
}

/// The one store operation whose failure is surfaced: a delete the caller
/// cannot observe any other way.
pub async fn delete_preferences(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Result<Json<DeleteAck>, ApiError> {
    let deleted = state
        .preferences
        .delete(&user_id)
        .await
        .map_err(|error| ApiError::Unavailable(error.to_string()))?;
    Ok(Json(DeleteAck { deleted }))
}

pub async fn popular_areas(
    State(state): State<ApiState>,
    Query(query): Query<PopularQuery>,
) -> Json<Vec<PopularArea>> {
    let limit = query.limit.unwrap_or(DEFAULT_POPULAR_LIMIT).min(MAX_POPULAR_LIMIT);
    match state.popularity.most_popular(limit).await {
        Ok(areas) => Json(areas),
        Err(error) => {
            warn!(
                event_name = "api.popular_areas.read_failed",
                error = %error,
                "popular areas read failed, serving empty listing"
            );
            Json(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::Duration;
    use tower::util::ServiceExt;

    use localscope_core::domain::preferences::AgeGroup;
    use localscope_db::repositories::{
        InMemoryGeoCacheRepository, InMemoryPopularityRepository, InMemoryPreferenceRepository,
    };
    use localscope_places::StaticPlacesProvider;

    use crate::analytics::AnalyticsHandle;
    use crate::insights::InsightsConfig;

    use super::*;

    fn test_state() -> ApiState {
        let preferences: Arc<InMemoryPreferenceRepository> =
            Arc::new(InMemoryPreferenceRepository::default());
        let popularity: Arc<InMemoryPopularityRepository> =
            Arc::new(InMemoryPopularityRepository::default());
        let insights = InsightsService::new(
            Arc::new(InMemoryGeoCacheRepository::default()),
            Arc::new(StaticPlacesProvider::default()),
            preferences.clone(),
            AnalyticsHandle::disconnected(),
            InsightsConfig {
                radius_m: 3000,
                area_ttl: Duration::hours(24),
                max_results: 15,
                top_recommendations: 10,
            },
        );
        ApiState { insights: Arc::new(insights), preferences, popularity }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn insights_endpoint_validates_the_coordinate() {
        let app = router(test_state());

        let response = app
            .oneshot(
                Request::post("/api/v1/insights")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"latitude": 90.0001, "longitude": 0.0}"#))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().expect("error message").contains("latitude"));
    }

    #[tokio::test]
    async fn insights_endpoint_accepts_boundary_coordinates() {
        let app = router(test_state());

        let response = app
            .oneshot(
                Request::post("/api/v1/insights")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"latitude": 90.0, "longitude": 180.0}"#))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["from_cache"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn preferences_get_serves_defaults_with_options() {
        let app = router(test_state());

        let response = app
            .oneshot(
                Request::get("/api/v1/preferences/new-user")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["preferences"]["age_group"], serde_json::json!("adult"));
        assert!(body["options"]["environments"]
            .as_array()
            .expect("environments")
            .contains(&serde_json::json!("family_friendly")));
    }

    #[tokio::test]
    async fn preferences_put_merges_and_get_reflects_it() {
        let state = test_state();
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::put("/api/v1/preferences/u-1")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"age_group": "senior"}"#))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let stored = state.preferences.find("u-1").await.expect("find").expect("present");
        assert_eq!(stored.age_group, AgeGroup::Senior);
        // untouched fields keep the default profile
        assert_eq!(stored.interests, vec!["restaurant", "tourist_attraction", "shopping_mall"]);
    }

    #[tokio::test]
    async fn preferences_put_rejects_unknown_enum_values() {
        let app = router(test_state());

        let response = app
            .oneshot(
                Request::put("/api/v1/preferences/u-1")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"age_group": "elderly"}"#))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn preferences_delete_reverts_to_defaults() {
        let state = test_state();
        let app = router(state.clone());

        state
            .preferences
            .save(
                "u-2",
                PreferenceUpdate { age_group: Some(AgeGroup::Family), ..Default::default() },
            )
            .await
            .expect("seed");

        let response = app
            .clone()
            .oneshot(
                Request::delete("/api/v1/preferences/u-2").body(Body::empty()).expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["deleted"], serde_json::json!(true));

        let after = app
            .oneshot(
                Request::get("/api/v1/preferences/u-2").body(Body::empty()).expect("request"),
            )
            .await
            .expect("response");
        let body = body_json(after).await;
        assert_eq!(body["preferences"]["age_group"], serde_json::json!("adult"));
    }

    #[tokio::test]
    async fn popular_areas_lists_descending_with_limit() {
        let state = test_state();
        let app = router(state.clone());

        for _ in 0..3 {
            state.popularity.record_search("pop:busy", &[]).await.expect("busy");
        }
        state.popularity.record_search("pop:slow", &[]).await.expect("slow");

        let response = app
            .oneshot(
                Request::get("/api/v1/areas/popular?limit=1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let listing = body.as_array().expect("array");
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0]["area_id"], serde_json::json!("pop:busy"));
        assert_eq!(listing[0]["search_count"], serde_json::json!(3));
    }
}
