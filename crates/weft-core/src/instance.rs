//! Runtime object handles.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::metadata::TypeRef;

/// A runtime object paired with its (runtime) type metadata.
///
/// Arguments, targets, proxies and advice return values all travel through
/// the engine as `Instance`s. Cloning is cheap and preserves identity.
#[derive(Clone)]
pub struct Instance {
    ty: TypeRef,
    value: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    /// Wraps a value together with its runtime type.
    pub fn new<T: Any + Send + Sync>(ty: TypeRef, value: T) -> Self {
        Self {
            ty,
            value: Arc::new(value),
        }
    }

    /// Wraps an already shared value.
    pub fn from_arc(ty: TypeRef, value: Arc<dyn Any + Send + Sync>) -> Self {
        Self { ty, value }
    }

    /// Runtime type of the wrapped value.
    pub fn type_info(&self) -> &TypeRef {
        &self.ty
    }

    /// The wrapped value.
    pub fn value(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.value
    }

    /// Attempts to view the value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns `true` if both handles point at the same object.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.ty.name())
            .finish_non_exhaustive()
    }
}
