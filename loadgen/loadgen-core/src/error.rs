//! Error types for the load generator.
//!
//! Two kinds are kept apart:
//! [`LoadgenError`] aborts user startup and is returned to the host, while
//! [`OperationError`] never leaves an operation and is carried as data inside
//! an [`OperationResult`](crate::result::OperationResult).

use std::sync::Arc;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoadgenError>;

/// Fatal errors raised while configuring or starting a virtual user.
#[derive(Debug, Error)]
pub enum LoadgenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Collection provisioning failed: {0}")]
    Provisioning(Arc<OperationError>),

    /// Returned by scenario code: a user factory or `on_start` hook that
    /// cannot bring its user up
    #[error("User startup failed: {0}")]
    Startup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Failure of a single remote call.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("Qdrant error: {0}")]
    Qdrant(#[from] qdrant_client::QdrantError),

    /// Transport failure reported by a [`VectorBackend`](crate::backend::VectorBackend)
    /// other than the gRPC one, which surfaces these as [`OperationError::Qdrant`]
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Client is closed")]
    Closed,
}
