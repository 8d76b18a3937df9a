//! Bean container collaborator interface.

use crate::instance::Instance;
use crate::metadata::TypeRef;

/// Visibility scope of a bean relative to the container being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeanScope {
    /// Beans registered in the container itself.
    Plugin,
    /// Beans shared by every container.
    Global,
}

/// A named, instantiated bean.
#[derive(Debug, Clone)]
pub struct BeanDefinition {
    name: String,
    instance: Instance,
}

impl BeanDefinition {
    /// Creates a bean definition.
    pub fn new(name: impl Into<String>, instance: Instance) -> Self {
        Self {
            name: name.into(),
            instance,
        }
    }

    /// Bean name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bean object.
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Runtime type of the bean object.
    pub fn type_info(&self) -> &TypeRef {
        self.instance.type_info()
    }
}

/// A container the aspect resolver can scan for aspect beans.
pub trait BeanContainer: Send + Sync {
    /// Identity of this container; resolution results are cached under it.
    fn id(&self) -> &str;

    /// Beans visible from this container in the given scope, in
    /// registration order.
    fn beans(&self, scope: BeanScope) -> Vec<BeanDefinition>;
}
