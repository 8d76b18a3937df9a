//! In-memory bean container registry.
//!
//! One global container holds beans shared by everybody. Each plugin
//! container sees its own beans as [`BeanScope::Plugin`] and the global
//! container's beans as [`BeanScope::Global`]. The global container itself
//! has no plugin scope.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};
use weft_core::{BeanContainer, BeanDefinition, BeanScope};

use crate::error::{RuntimeError, RuntimeResult};

/// Id of the global container.
pub const GLOBAL_CONTAINER_ID: &str = "global";

type BeanStore = Arc<RwLock<Vec<BeanDefinition>>>;

/// A container backed by the registry.
#[derive(Debug)]
pub struct ScopedContainer {
    id: String,
    own: Option<BeanStore>,
    global: BeanStore,
}

impl ScopedContainer {
    /// Returns `true` for the global container.
    pub fn is_global(&self) -> bool {
        self.own.is_none()
    }

    /// Number of beans registered directly in this container.
    pub fn len(&self) -> usize {
        self.own.as_ref().unwrap_or(&self.global).read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn register(&self, bean: BeanDefinition) -> RuntimeResult<()> {
        let store = self.own.as_ref().unwrap_or(&self.global);
        let mut beans = store.write();
        if beans.iter().any(|b| b.name() == bean.name()) {
            return Err(RuntimeError::BeanExists {
                container: self.id.clone(),
                bean: bean.name().to_string(),
            });
        }
        debug!(
            container = %self.id,
            bean = %bean.name(),
            ty = bean.type_info().name(),
            "Registered bean"
        );
        beans.push(bean);
        Ok(())
    }
}

impl BeanContainer for ScopedContainer {
    fn id(&self) -> &str {
        &self.id
    }

    fn beans(&self, scope: BeanScope) -> Vec<BeanDefinition> {
        match (scope, &self.own) {
            (BeanScope::Plugin, Some(own)) => own.read().clone(),
            (BeanScope::Plugin, None) => Vec::new(),
            (BeanScope::Global, _) => self.global.read().clone(),
        }
    }
}

/// Registry for the global container and the plugin containers.
#[derive(Debug)]
pub struct ContainerRegistry {
    global: Arc<ScopedContainer>,
    plugins: RwLock<HashMap<String, Arc<ScopedContainer>>>,
}

impl ContainerRegistry {
    /// Creates a registry with an empty global container.
    pub fn new() -> Self {
        Self {
            global: Arc::new(ScopedContainer {
                id: GLOBAL_CONTAINER_ID.to_string(),
                own: None,
                global: Arc::new(RwLock::new(Vec::new())),
            }),
            plugins: RwLock::new(HashMap::new()),
        }
    }

    pub fn global(&self) -> &Arc<ScopedContainer> {
        &self.global
    }

    /// Creates an empty plugin container.
    pub fn create(&self, id: impl Into<String>) -> RuntimeResult<Arc<ScopedContainer>> {
        let id = id.into();
        let mut plugins = self.plugins.write();
        if id == GLOBAL_CONTAINER_ID || plugins.contains_key(&id) {
            return Err(RuntimeError::ContainerExists(id));
        }

        let container = Arc::new(ScopedContainer {
            id: id.clone(),
            own: Some(Arc::new(RwLock::new(Vec::new()))),
            global: Arc::clone(&self.global.global),
        });
        plugins.insert(id.clone(), Arc::clone(&container));
        info!(container = %id, "Created plugin container");
        Ok(container)
    }

    /// Removes a plugin container.
    pub fn remove(&self, id: &str) -> RuntimeResult<Arc<ScopedContainer>> {
        let removed = self
            .plugins
            .write()
            .remove(id)
            .ok_or_else(|| RuntimeError::ContainerNotFound(id.to_string()))?;
        info!(container = %id, beans = removed.len(), "Removed plugin container");
        Ok(removed)
    }

    /// Looks a container up by id; [`GLOBAL_CONTAINER_ID`] names the global one.
    pub fn get(&self, id: &str) -> Option<Arc<ScopedContainer>> {
        if id == GLOBAL_CONTAINER_ID {
            return Some(Arc::clone(&self.global));
        }
        self.plugins.read().get(id).cloned()
    }

    /// Registers a bean in the container `id`.
    pub fn register(&self, id: &str, bean: BeanDefinition) -> RuntimeResult<()> {
        self.get(id)
            .ok_or_else(|| RuntimeError::ContainerNotFound(id.to_string()))?
            .register(bean)
    }

    /// Registers a bean in the global container.
    pub fn register_global(&self, bean: BeanDefinition) -> RuntimeResult<()> {
        self.global.register(bean)
    }

    /// Returns all plugin container ids.
    pub fn ids(&self) -> Vec<String> {
        self.plugins.read().keys().cloned().collect()
    }

    /// Returns the number of plugin containers.
    pub fn count(&self) -> usize {
        self.plugins.read().len()
    }

    pub fn stats(&self) -> RegistryStats {
        let plugins = self.plugins.read();
        RegistryStats {
            containers: plugins.len(),
            plugin_beans: plugins.values().map(|c| c.len()).sum(),
            global_beans: self.global.len(),
        }
    }
}

impl Default for ContainerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the container registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of plugin containers.
    pub containers: usize,
    /// Beans registered across all plugin containers.
    pub plugin_beans: usize,
    /// Beans registered in the global container.
    pub global_beans: usize,
}

impl std::fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Containers: {} ({} plugin beans), {} global beans",
            self.containers, self.plugin_beans, self.global_beans
        )
    }
}
