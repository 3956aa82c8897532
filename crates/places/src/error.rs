use thiserror::Error;

/// Failure of a single nearby-search call. Caught per category inside the
/// fan-out; one category's error never fails the bundle.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("provider returned status `{status}`: {message}")]
    Provider { status: String, message: String },
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed provider response: {0}")]
    Decode(String),
}
