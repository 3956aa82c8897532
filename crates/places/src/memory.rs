//! Scripted provider double for fan-out and orchestrator tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use localscope_core::domain::geo::Coordinate;
use localscope_core::domain::place::Place;

use crate::client::NearbySearch;
use crate::error::LookupError;

#[derive(Default)]
pub struct StaticPlacesProvider {
    responses: HashMap<String, Vec<Place>>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl StaticPlacesProvider {
    pub fn with_category(mut self, category_tag: &str, places: Vec<Place>) -> Self {
        self.responses.insert(category_tag.to_string(), places);
        self
    }

    /// Configures the category to fail with a provider error.
    pub fn failing_category(mut self, category_tag: &str) -> Self {
        self.failing.insert(category_tag.to_string());
        self
    }

    /// Total nearby-search calls observed, across all categories.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NearbySearch for StaticPlacesProvider {
    async fn nearby_search(
        &self,
        _location: Coordinate,
        _radius_m: u32,
        category_tag: &str,
    ) -> Result<Vec<Place>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(category_tag) {
            return Err(LookupError::Provider {
                status: "OVER_QUERY_LIMIT".to_string(),
                message: "scripted failure".to_string(),
            });
        }

        Ok(self.responses.get(category_tag).cloned().unwrap_or_default())
    }
}
