//! Fire-and-forget analytics dispatch. The request handler pushes a signal
//! onto a bounded channel and moves on; a detached worker owns the
//! popularity upsert and the event insert. Nothing here can fail a request.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use localscope_core::domain::analytics::AnalyticsEvent;
use localscope_db::repositories::{AnalyticsRepository, PopularityRepository};

const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Clone, Debug)]
pub enum AnalyticsSignal {
    SearchPerformed {
        area_id: String,
        latitude: f64,
        longitude: f64,
        interests: Vec<String>,
        from_cache: bool,
    },
}

#[derive(Clone)]
pub struct AnalyticsHandle {
    tx: mpsc::Sender<AnalyticsSignal>,
}

impl AnalyticsHandle {
    /// Non-blocking send. A full queue or a stopped worker drops the signal
    /// with a warning; the response has already been computed.
    pub fn dispatch(&self, signal: AnalyticsSignal) {
        if let Err(error) = self.tx.try_send(signal) {
            warn!(
                event_name = "analytics.dispatch_dropped",
                error = %error,
                "analytics signal dropped"
            );
        }
    }

    /// Handle whose signals go nowhere; for tests that don't observe
    /// analytics.
    pub fn disconnected() -> Self {
        let (tx, _rx) = mpsc::channel(1);
        Self { tx }
    }
}

pub fn spawn(
    popularity: Arc<dyn PopularityRepository>,
    analytics: Arc<dyn AnalyticsRepository>,
) -> AnalyticsHandle {
    spawn_with_capacity(popularity, analytics, DEFAULT_QUEUE_CAPACITY)
}

pub fn spawn_with_capacity(
    popularity: Arc<dyn PopularityRepository>,
    analytics: Arc<dyn AnalyticsRepository>,
    capacity: usize,
) -> AnalyticsHandle {
    let (tx, mut rx) = mpsc::channel(capacity.max(1));

    tokio::spawn(async move {
        while let Some(signal) = rx.recv().await {
            handle_signal(popularity.as_ref(), analytics.as_ref(), signal).await;
        }
        debug!(event_name = "analytics.worker_stopped", "analytics worker drained and stopped");
    });

    AnalyticsHandle { tx }
}

async fn handle_signal(
    popularity: &dyn PopularityRepository,
    analytics: &dyn AnalyticsRepository,
    signal: AnalyticsSignal,
) {
    match signal {
        AnalyticsSignal::SearchPerformed { area_id, latitude, longitude, interests, from_cache } => {
            if let Err(error) = popularity.record_search(&area_id, &interests).await {
                warn!(
                    event_name = "analytics.popularity_write_failed",
                    area_id = %area_id,
                    error = %error,
                    "popularity touch failed"
                );
            }

            let event = AnalyticsEvent {
                id: Uuid::new_v4().to_string(),
                event_type: "area_search".to_string(),
                payload: json!({
                    "area_id": area_id,
                    "latitude": latitude,
                    "longitude": longitude,
                    "interests": interests,
                    "from_cache": from_cache,
                }),
                created_at: Utc::now(),
            };
            if let Err(error) = analytics.record_event(&event).await {
                warn!(
                    event_name = "analytics.event_write_failed",
                    error = %error,
                    "analytics event insert failed"
                );
            }
        }
    }
}
