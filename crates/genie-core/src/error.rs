//! Error types for genie-core.

use thiserror::Error;

/// Error type for decoder, parameter store and quantizer operations.
///
/// Every variant is fatal for the operation that produced it; nothing in
/// the decoder retries.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Shape mismatch for '{name}': expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Usage error: {0}")]
    Usage(String),

    /// Usage error for a control index outside the button alphabet.
    #[error("Control index {index} outside alphabet of size {alphabet}")]
    InvalidControl { index: usize, alphabet: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    pub fn shape(name: impl Into<String>, expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            name: name.into(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
