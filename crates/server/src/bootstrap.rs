use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use localscope_core::config::{AppConfig, ConfigError, LoadOptions};
use localscope_db::repositories::{
    SqlAnalyticsRepository, SqlGeoCacheRepository, SqlPopularityRepository,
    SqlPreferenceRepository,
};
use localscope_db::{connect, migrations, DbPool};
use localscope_places::HttpPlacesClient;

use crate::analytics;
use crate::api::ApiState;
use crate::insights::{InsightsConfig, InsightsService};
use crate::maintenance;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub api_state: ApiState,
    pub maintenance_task: tokio::task::JoinHandle<()>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let cache = Arc::new(SqlGeoCacheRepository::new(db_pool.clone()));
    let preferences = Arc::new(SqlPreferenceRepository::new(db_pool.clone()));
    let popularity = Arc::new(SqlPopularityRepository::new(db_pool.clone()));
    let analytics_repo = Arc::new(SqlAnalyticsRepository::new(db_pool.clone()));

    let provider =
        Arc::new(HttpPlacesClient::new(&config.places).map_err(BootstrapError::HttpClient)?);

    let analytics_handle = analytics::spawn(popularity.clone(), analytics_repo);
    let maintenance_task =
        maintenance::spawn(cache.clone(), popularity.clone(), config.cache.clone());

    let insights = InsightsService::new(
        cache,
        provider,
        preferences.clone(),
        analytics_handle,
        InsightsConfig::from_app(&config),
    );

    let api_state =
        ApiState { insights: Arc::new(insights), preferences, popularity };

    info!(event_name = "system.bootstrap.ready", "application components constructed");

    Ok(Application { config, db_pool, api_state, maintenance_task })
}

#[cfg(test)]
mod tests {
    use localscope_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    fn in_memory_options() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:?cache=shared".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_connects_migrates_and_builds_state() {
        let app = bootstrap(in_memory_options()).await.expect("bootstrap should succeed");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
             ('user_preferences', 'area_cache', 'popular_areas', 'analytics_events')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected managed tables after bootstrap");
        assert_eq!(table_count, 4, "bootstrap should expose all storage tables");

        app.maintenance_task.abort();
        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_database_url() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("postgres://nope/app".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("database.url"));
    }
}
