//! Error types for enrichment dataset loading.

use thiserror::Error;

/// Errors that can occur while loading the enrichment dataset.
///
/// These surface only from [`GeoResolver::load`](crate::GeoResolver::load);
/// lookups themselves never error.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Reading the dataset file failed.
    #[error("failed to read geo dataset: {0}")]
    Io(#[from] std::io::Error),

    /// The dataset file is not valid JSON of the expected shape.
    #[error("failed to parse geo dataset: {0}")]
    Parse(#[from] serde_json::Error),

    /// A dataset row carries a network prefix that cannot be parsed.
    #[error("invalid network prefix in geo dataset: {0}")]
    InvalidPrefix(String),

    /// The dataset was already loaded; the table is set exactly once.
    #[error("geo dataset already loaded")]
    AlreadyLoaded,
}
