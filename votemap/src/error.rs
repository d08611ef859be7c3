//! Error types used by the crate.

use thiserror::Error;

/// Votemap error type.
#[derive(Debug, Error)]
pub enum VotemapError {
    /// A color string is neither a hex color nor a known color name.
    #[error("invalid color: {0:?}")]
    InvalidColor(String),
    /// The configuration is inconsistent. Details are inside.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A category has no color and no fallback color is configured.
    #[error("no color for category {0:?} and no fallback color is configured")]
    MissingFallbackColor(String),
    /// Year profile is not configured.
    #[error("no profile configured for year {0}")]
    UnknownYear(String),
    /// The map engine refused to add a source or a layer.
    #[error("map engine error: {0}")]
    Engine(String),
    /// A legend element could not be created or changed.
    #[error("document error: {0}")]
    Document(String),
    /// Tile url template is missing one of `{z}`, `{x}`, `{y}` placeholders.
    #[error("invalid tile url template {0:?}")]
    InvalidTemplate(String),
    /// Error decoding or encoding JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Error reading/writing data to the FS.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Network error.
    #[cfg(feature = "mirror")]
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Input data cannot be turned into dots.
    #[error("ingestion error: {0}")]
    Ingest(String),
    /// The external tiler exited with an error.
    #[error("tiler error: {0}")]
    Tiler(String),
}
