//! Client for the external nearby-search provider: wire-schema decoding,
//! a single-category search call, and the partial-failure-tolerant five-way
//! category fan-out the insights pipeline runs on a cache miss.

pub mod bundle;
pub mod client;
pub mod error;
pub mod memory;
pub mod types;

pub use bundle::{fetch_area_bundle, CATEGORY_RESULT_LIMIT};
pub use client::{HttpPlacesClient, NearbySearch};
pub use error::LookupError;
pub use memory::StaticPlacesProvider;
