use thiserror::Error;

/// Top-level error type for the bazaar engine.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for BazaarError` so that the `?` operator works
/// across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BazaarError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for BazaarError {
    fn from(err: toml::de::Error) -> Self {
        BazaarError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for BazaarError {
    fn from(err: toml::ser::Error) -> Self {
        BazaarError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BazaarError {
    fn from(err: serde_json::Error) -> Self {
        BazaarError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for bazaar operations.
pub type Result<T> = std::result::Result<T, BazaarError>;
