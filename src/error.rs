//! Error types for cross-section construction and table persistence

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrossSectionError {
    /// Parametrization traits and the supplied energy cut do not fit together.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CrossSectionError>;
