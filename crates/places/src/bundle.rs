use tracing::warn;

use localscope_core::domain::geo::Coordinate;
use localscope_core::domain::place::{AreaBundle, Place};

use crate::client::NearbySearch;

/// Per-category cap on provider results, kept in the provider's own
/// relevance order.
pub const CATEGORY_RESULT_LIMIT: usize = 10;

/// Issues the five category searches concurrently with all-settled
/// semantics: each category's failure is logged and degrades to an empty
/// list, never failing the bundle.
pub async fn fetch_area_bundle(
    provider: &dyn NearbySearch,
    location: Coordinate,
    radius_m: u32,
) -> AreaBundle {
    let (landmarks, restaurants, attractions, entertainment, shopping) = futures::join!(
        search_settled(provider, location, radius_m, "tourist_attraction"),
        search_settled(provider, location, radius_m, "restaurant"),
        search_settled(provider, location, radius_m, "museum"),
        search_settled(provider, location, radius_m, "movie_theater"),
        search_settled(provider, location, radius_m, "shopping_mall"),
    );

    AreaBundle { landmarks, restaurants, attractions, entertainment, shopping }
}

async fn search_settled(
    provider: &dyn NearbySearch,
    location: Coordinate,
    radius_m: u32,
    category_tag: &str,
) -> Vec<Place> {
    match provider.nearby_search(location, radius_m, category_tag).await {
        Ok(mut places) => {
            places.truncate(CATEGORY_RESULT_LIMIT);
            places
        }
        Err(error) => {
            warn!(
                event_name = "places.bundle.category_failed",
                category_tag,
                error = %error,
                "category search failed, substituting empty list"
            );
            Vec::new()
        }
    }
}
