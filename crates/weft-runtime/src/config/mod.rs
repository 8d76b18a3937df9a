//! Configuration for the Weft runtime.
//!
//! Layered loading (defaults, files, environment) through figment, a serde
//! schema for logging and weaving settings, and validation of the result.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, SpanEventConfig, WeavingConfig,
    WeftConfig,
};
pub use validation::validate_config;
