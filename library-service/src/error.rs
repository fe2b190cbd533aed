//! Service-level error types
//!
//! These errors cover process startup: loading configuration, opening the
//! store, binding the listener. Request-scoped failures are modelled by
//! [`crate::handlers::ApiError`] and never surface here.

use thiserror::Error;

use crate::repository::RepositoryError;

/// Result type alias for service startup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring or running the service
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Configuration loaded but its values are inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Store could not be opened or prepared
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        Error::Storage(err.to_string())
    }
}
