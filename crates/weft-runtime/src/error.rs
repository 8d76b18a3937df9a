//! Runtime error types.

use thiserror::Error;
use weft_framework::ResolveError;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An aspect was rejected while resolving interceptors.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Container not found.
    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    /// Container already exists.
    #[error("Container already exists: {0}")]
    ContainerExists(String),

    /// A bean with the same name is already registered in the container.
    #[error("Bean '{bean}' already registered in container '{container}'")]
    BeanExists { container: String, bean: String },
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
