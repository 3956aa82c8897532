use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use localscope_core::config::PlacesConfig;
use localscope_core::domain::geo::Coordinate;
use localscope_core::domain::place::Place;

use crate::error::LookupError;
use crate::types::{NearbySearchResponse, STATUS_OK, STATUS_ZERO_RESULTS};

/// One external nearby-search request. The seam the orchestrator and tests
/// program against.
#[async_trait]
pub trait NearbySearch: Send + Sync {
    async fn nearby_search(
        &self,
        location: Coordinate,
        radius_m: u32,
        category_tag: &str,
    ) -> Result<Vec<Place>, LookupError>;
}

pub struct HttpPlacesClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpPlacesClient {
    pub fn new(config: &PlacesConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl NearbySearch for HttpPlacesClient {
    async fn nearby_search(
        &self,
        location: Coordinate,
        radius_m: u32,
        category_tag: &str,
    ) -> Result<Vec<Place>, LookupError> {
        let url = format!("{}/nearbysearch/json", self.base_url);
        let location_param = format!("{},{}", location.latitude, location.longitude);
        let radius_param = radius_m.to_string();

        let mut query: Vec<(&str, &str)> = vec![
            ("location", location_param.as_str()),
            ("radius", radius_param.as_str()),
            ("type", category_tag),
        ];
        let exposed_key = self.api_key.as_ref().map(|key| key.expose_secret().to_string());
        if let Some(key) = exposed_key.as_deref() {
            query.push(("key", key));
        }

        let response = self.http.get(&url).query(&query).send().await?;
        let body: NearbySearchResponse =
            response.json().await.map_err(|e| LookupError::Decode(e.to_string()))?;

        match body.status.as_str() {
            STATUS_OK => {
                debug!(
                    event_name = "places.search.ok",
                    category_tag,
                    result_count = body.results.len(),
                    "nearby search succeeded"
                );
                Ok(body.results.into_iter().map(|place| place.into_place()).collect())
            }
            STATUS_ZERO_RESULTS => {
                debug!(
                    event_name = "places.search.empty",
                    category_tag, "nearby search returned no results"
                );
                Ok(Vec::new())
            }
            status => Err(LookupError::Provider {
                status: status.to_string(),
                message: body
                    .error_message
                    .unwrap_or_else(|| "no error detail from provider".to_string()),
            }),
        }
    }
}
