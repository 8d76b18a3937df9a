//! Weft Runtime - configuration and container layer for the Weft aspect weaver.
//!
//! This crate provides:
//! - Layered configuration loading (`WeftConfig`, `ConfigLoader`)
//! - Logging setup (`LoggingBuilder`)
//! - An in-memory bean container registry with plugin and global scopes
//!   (`ContainerRegistry`)
//! - `WeftRuntime`, which resolves interceptors for registered containers
//!   using the configured annotation vocabulary
//!
//! ```ignore
//! use weft_runtime::WeftRuntime;
//!
//! let runtime = WeftRuntime::builder().profile("production").build()?;
//! runtime.create_container("orders")?;
//! runtime.register_global(audit_aspect)?;
//! let interceptors = runtime.resolve("orders", &order_service_type)?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, LoggingConfig, WeavingConfig, WeftConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use registry::{ContainerRegistry, GLOBAL_CONTAINER_ID, RegistryStats, ScopedContainer};
pub use runtime::{RuntimeBuilder, RuntimeStats, WeftRuntime};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// Provides the commonly used logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
