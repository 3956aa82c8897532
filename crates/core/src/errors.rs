use thiserror::Error;

/// Malformed or out-of-range input. The only error class that is always
/// surfaced to the caller as-is; never retried.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("latitude {0} is out of range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is out of range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("search radius {0}m is out of range [1, 50000]")]
    RadiusOutOfRange(u32),
    #[error("unknown {field} value `{value}`")]
    UnknownEnumValue { field: &'static str, value: String },
}
