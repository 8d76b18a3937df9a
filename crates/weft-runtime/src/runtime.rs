//! Runtime wiring of configuration, container registry and aspect resolver.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use weft_runtime::WeftRuntime;
//!
//! // Auto-loads weft.toml from the current directory
//! let runtime = WeftRuntime::new();
//!
//! runtime.create_container("orders")?;
//! runtime.register_global(BeanDefinition::new("logAspect", log_aspect))?;
//! runtime.register("orders", BeanDefinition::new("orderService", service))?;
//!
//! let interceptors = runtime.resolve("orders", &service_type)?;
//! ```

use std::sync::Arc;

use tracing::{debug, info};
use weft_core::{BeanDefinition, TypeRef};
use weft_framework::{AspectResolver, Interceptor, InterceptorList, ResolutionState};

use crate::config::{ConfigLoader, ConfigResult, WeftConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::registry::{ContainerRegistry, GLOBAL_CONTAINER_ID, RegistryStats, ScopedContainer};

/// Owns the bean containers and resolves interceptors for them.
///
/// Registering or removing beans drops the affected cached interceptor
/// lists, so the next resolution rescans.
#[derive(Debug)]
pub struct WeftRuntime {
    config: WeftConfig,
    registry: ContainerRegistry,
    resolver: AspectResolver,
}

impl WeftRuntime {
    /// Creates a runtime from `weft.toml` in the current directory, falling
    /// back to defaults.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                WeftConfig::default()
            });

        Self::from_config(&config)
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Initializes logging from `config` and creates the runtime.
    pub fn from_config(config: &WeftConfig) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            strict = config.weaving.strict,
            "Runtime initialized from configuration"
        );

        Self::with_config(config.clone())
    }

    /// Creates the runtime without touching the global logger.
    pub fn with_config(config: WeftConfig) -> Self {
        let resolver = AspectResolver::new(config.weaving.annotations.clone())
            .strict(config.weaving.strict)
            .advise_aspects(config.weaving.advise_aspects);
        Self {
            config,
            registry: ContainerRegistry::new(),
            resolver,
        }
    }

    pub fn config(&self) -> &WeftConfig {
        &self.config
    }

    pub fn registry(&self) -> &ContainerRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &AspectResolver {
        &self.resolver
    }

    /// Creates an empty plugin container.
    pub fn create_container(&self, id: impl Into<String>) -> RuntimeResult<Arc<ScopedContainer>> {
        self.registry.create(id)
    }

    /// Removes a plugin container and its cached interceptors.
    pub fn remove_container(&self, id: &str) -> RuntimeResult<()> {
        self.registry.remove(id)?;
        self.resolver.invalidate(id);
        Ok(())
    }

    /// Registers a bean in a container.
    ///
    /// Registering into the global container is the same as
    /// [`register_global`](Self::register_global).
    pub fn register(&self, container_id: &str, bean: BeanDefinition) -> RuntimeResult<()> {
        if container_id == GLOBAL_CONTAINER_ID {
            return self.register_global(bean);
        }
        self.registry.register(container_id, bean)?;
        self.resolver.invalidate(container_id);
        Ok(())
    }

    /// Registers a bean shared by every container.
    pub fn register_global(&self, bean: BeanDefinition) -> RuntimeResult<()> {
        self.registry.register_global(bean)?;
        self.invalidate_all();
        Ok(())
    }

    /// Drops every cached interceptor list.
    pub fn invalidate_all(&self) {
        let mut dropped = usize::from(self.resolver.invalidate(GLOBAL_CONTAINER_ID));
        for id in self.registry.ids() {
            dropped += usize::from(self.resolver.invalidate(&id));
        }
        debug!(dropped, "Invalidated interceptor caches");
    }

    /// Ordered interceptors of every aspect visible from a container.
    pub fn interceptors(&self, container_id: &str) -> RuntimeResult<InterceptorList> {
        let container = self.container(container_id)?;
        Ok(self.resolver.interceptors(container.as_ref())?)
    }

    /// Interceptors that advise beans of type `ty` in a container.
    pub fn resolve(
        &self,
        container_id: &str,
        ty: &TypeRef,
    ) -> RuntimeResult<Vec<Arc<Interceptor>>> {
        let container = self.container(container_id)?;
        Ok(self.resolver.resolve(container.as_ref(), ty)?)
    }

    pub fn stats(&self) -> RuntimeStats {
        let cached = std::iter::once(GLOBAL_CONTAINER_ID.to_string())
            .chain(self.registry.ids())
            .filter(|id| self.resolver.state(id) == ResolutionState::Cached)
            .count();
        RuntimeStats {
            registry: self.registry.stats(),
            cached_containers: cached,
        }
    }

    fn container(&self, id: &str) -> RuntimeResult<Arc<ScopedContainer>> {
        self.registry
            .get(id)
            .ok_or_else(|| RuntimeError::ContainerNotFound(id.to_string()))
    }
}

impl Default for WeftRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Runtime statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub registry: RegistryStats,
    /// Containers whose interceptor list is cached.
    pub cached_containers: usize,
}

impl std::fmt::Display for RuntimeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {} cached", self.registry, self.cached_containers)
    }
}

/// Builder for a [`WeftRuntime`] with custom configuration loading.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: WeftConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> ConfigResult<WeftRuntime> {
        let config = self.config_loader.load()?;
        Ok(WeftRuntime::from_config(&config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{Annotation, Instance, MethodDescriptor, MethodInfo, TypeDescriptor};

    fn string() -> TypeRef {
        TypeDescriptor::named("java.lang.String")
    }

    fn aspect(name: &str, annotation: Annotation) -> BeanDefinition {
        let ty = TypeDescriptor::builder(format!("demo.aspects.{name}"))
            .annotated(Annotation::new("Aspect"))
            .method(MethodDescriptor::builder("advice").annotated(annotation))
            .build();
        BeanDefinition::new(name, Instance::new(ty, ()))
    }

    fn service() -> TypeRef {
        TypeDescriptor::builder("demo.service.OrderService")
            .method(MethodDescriptor::builder("place").param("item", string()))
            .method(MethodDescriptor::builder("cancel"))
            .build()
    }

    fn runtime(strict: bool) -> WeftRuntime {
        let mut config = WeftConfig::default();
        config.weaving.strict = strict;
        WeftRuntime::with_config(config)
    }

    #[test]
    fn test_resolve_across_scopes() {
        let runtime = runtime(false);
        runtime.create_container("orders").unwrap();
        runtime
            .register_global(aspect(
                "audit",
                Annotation::new("Before").with("value", "within(demo.service..*)"),
            ))
            .unwrap();
        runtime
            .register(
                "orders",
                aspect(
                    "placeOnly",
                    Annotation::new("Before").with("value", "execution(* place(String))"),
                ),
            )
            .unwrap();

        let ty = service();
        let woven = runtime.resolve("orders", &ty).unwrap();
        let names: Vec<&str> = woven.iter().map(|i| i.aspect()).collect();
        assert_eq!(names, vec!["placeOnly", "audit"]);

        let global = runtime.resolve(GLOBAL_CONTAINER_ID, &ty).unwrap();
        assert_eq!(global.len(), 1);

        let cancel = ty.methods().into_iter().find(|m| m.name() == "cancel").unwrap();
        assert!(woven[0].matcher().shadow(&cancel).is_none());
        assert!(woven[1].matcher().shadow(&cancel).is_some());
    }

    #[test]
    fn test_registration_invalidates_cache() {
        let runtime = runtime(false);
        runtime.create_container("orders").unwrap();
        assert!(runtime.interceptors("orders").unwrap().is_empty());
        assert_eq!(runtime.stats().cached_containers, 1);

        runtime
            .register_global(aspect(
                "audit",
                Annotation::new("After").with("value", "within(demo..*)"),
            ))
            .unwrap();
        assert_eq!(runtime.stats().cached_containers, 0);
        assert_eq!(runtime.interceptors("orders").unwrap().len(), 1);

        runtime.remove_container("orders").unwrap();
        assert!(matches!(
            runtime.interceptors("orders"),
            Err(RuntimeError::ContainerNotFound(_))
        ));
    }

    #[test]
    fn test_strict_mode_surfaces_rejected_aspect() {
        let broken = || {
            aspect(
                "broken",
                Annotation::new("Before").with("value", "execution(* place(..)"),
            )
        };

        let strict = runtime(true);
        strict.create_container("orders").unwrap();
        strict.register("orders", broken()).unwrap();
        let err = strict.interceptors("orders").unwrap_err();
        assert!(matches!(err, RuntimeError::Resolve(e) if e.aspect == "broken"));

        let lenient = runtime(false);
        lenient.create_container("orders").unwrap();
        lenient.register("orders", broken()).unwrap();
        assert!(lenient.interceptors("orders").unwrap().is_empty());
    }
}
