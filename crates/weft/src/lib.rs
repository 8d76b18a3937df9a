//! # Weft
//!
//! An annotation-driven aspect weaver.
//!
//! ## Overview
//!
//! Aspect beans carry advice methods annotated with `Before`, `After`,
//! `AfterReturning`, `AfterThrowing` or `Around`, each naming a pointcut
//! expression. Weft decides which methods of which beans each advice applies
//! to, and which values the advice receives when one of those methods runs.
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────┐     ┌─────────────┐
//! │ WeftRuntime  │────▶│ AspectResolver │────▶│ Interceptor  │────▶│ proxy layer │
//! │ (containers) │     │ (per container)│     │ + matcher    │     │ (host)      │
//! └──────────────┘     └────────────────┘     └──────────────┘     └─────────────┘
//! ```
//!
//! - **weft-core**: metadata, instance and join-point capabilities the host
//!   implements
//! - **weft-framework**: the pointcut language, matching, parameter binding,
//!   advice validation and aspect resolution
//! - **weft-runtime**: configuration, logging and an in-memory container
//!   registry
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use weft::prelude::*;
//!
//! let runtime = WeftRuntime::new();
//! runtime.create_container("orders")?;
//! runtime.register_global(BeanDefinition::new("audit", audit_aspect))?;
//! runtime.register("orders", BeanDefinition::new("orderService", service))?;
//!
//! for interceptor in runtime.resolve("orders", &service_type)? {
//!     if interceptor.accepts(None) {
//!         interceptor.invoke(&invoker, &join_point, None)?;
//!     }
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: `weft.toml` configuration files
//! - `yaml-config`: `weft.yaml` configuration files
//! - `json-log`: JSON log output

pub use weft_core as core;
pub use weft_framework as framework;
pub use weft_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use weft::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use weft_runtime::{ContainerRegistry, WeftConfig, WeftRuntime};

    // Engine
    pub use weft_framework::{
        AdviceKind, AnnotationNames, AspectResolver, Interceptor, MethodMatcher,
        PointcutParameter, ShadowMatch,
    };

    // Host capabilities
    pub use weft_core::prelude::*;

    // Logging macros
    pub use weft_runtime::prelude::*;
}
