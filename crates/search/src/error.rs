use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid weights: {0}")]
    WeightsInvalid(String),

    #[error("Unknown preset: {0}")]
    PresetUnknown(String),

    #[error("Stale metrics: {0}")]
    MetricsStale(String),

    #[error("{0}")]
    Other(String),
}
