//! Type and method metadata capabilities.
//!
//! The pointcut engine never talks to a concrete reflection API. Hosts expose
//! their types and methods through the [`TypeInfo`] and [`MethodInfo`] traits;
//! [`descriptor`] ships an in-memory implementation that is good enough for
//! hosts that build their metadata up front (and for tests).
//!
//! # Inheritance model
//!
//! - [`TypeInfo::supertypes`] lists the direct supertypes.
//! - [`TypeInfo::methods`] lists every method invocable on the type, inherited
//!   ones included. An inherited, non-overridden method keeps its original
//!   declaring type.

pub mod annotation;
pub mod descriptor;

use std::fmt;
use std::sync::Arc;

pub use annotation::{Annotation, simple_name};
pub use descriptor::{MethodBuilder, MethodDescriptor, TypeDescriptor, TypeDescriptorBuilder};

/// Shared handle to type metadata.
pub type TypeRef = Arc<dyn TypeInfo>;

/// Shared handle to method metadata.
pub type MethodRef = Arc<dyn MethodInfo>;

/// Anything that can carry annotations.
pub trait AnnotatedElement {
    /// Annotations declared directly on this element.
    fn annotations(&self) -> &[Annotation];

    /// Returns the directly declared annotation of the given type.
    fn annotation(&self, type_name: &str) -> Option<&Annotation> {
        self.annotations().iter().find(|a| a.is(type_name))
    }

    /// Returns `true` if an annotation of the given type is declared directly.
    fn has_annotation(&self, type_name: &str) -> bool {
        self.annotation(type_name).is_some()
    }
}

/// Type metadata exposed by the host.
pub trait TypeInfo: AnnotatedElement + Send + Sync + fmt::Debug {
    /// Fully qualified type name.
    fn name(&self) -> &str;

    /// Direct supertypes (superclass and implemented interfaces).
    fn supertypes(&self) -> Vec<TypeRef>;

    /// All methods invocable on this type, including inherited ones.
    fn methods(&self) -> Vec<MethodRef>;

    /// Last segment of [`name`](Self::name).
    fn simple_name(&self) -> &str {
        simple_name(self.name())
    }

    /// Returns `true` if `pred` holds for the name of this type or of any
    /// type in its supertype hierarchy.
    fn any_in_hierarchy(&self, pred: &dyn Fn(&str) -> bool) -> bool {
        pred(self.name())
            || self
                .supertypes()
                .iter()
                .any(|s| s.any_in_hierarchy(pred))
    }

    /// Returns `true` if this type is `type_name` or one of its subtypes.
    fn is_subtype_of(&self, type_name: &str) -> bool {
        self.any_in_hierarchy(&|name| name == type_name)
    }

    /// Looks an annotation up on this type, then on its supertypes
    /// (depth-first, declaration order).
    fn find_annotation(&self, type_name: &str) -> Option<Annotation> {
        if let Some(found) = self.annotation(type_name) {
            return Some(found.clone());
        }
        self.supertypes()
            .iter()
            .find_map(|s| s.find_annotation(type_name))
    }
}

/// Method modifiers understood by `execution(...)` patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Synchronized,
}

impl Modifier {
    /// Parses a modifier keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "public" => Self::Public,
            "protected" => Self::Protected,
            "private" => Self::Private,
            "static" => Self::Static,
            "final" => Self::Final,
            "abstract" => Self::Abstract,
            "synchronized" => Self::Synchronized,
            _ => return None,
        })
    }

    /// Returns the keyword for this modifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
            Self::Static => "static",
            Self::Final => "final",
            Self::Abstract => "abstract",
            Self::Synchronized => "synchronized",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared method parameter.
#[derive(Debug, Clone)]
pub struct ParameterInfo {
    name: String,
    ty: TypeRef,
    annotations: Vec<Annotation>,
}

impl ParameterInfo {
    /// Creates a parameter with the given name and type.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            annotations: Vec::new(),
        }
    }

    /// Adds an annotation (builder pattern).
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Declared parameter name (may be synthetic, e.g. `arg0`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter type.
    pub fn type_info(&self) -> &TypeRef {
        &self.ty
    }
}

impl AnnotatedElement for ParameterInfo {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

/// Method metadata exposed by the host.
pub trait MethodInfo: AnnotatedElement + Send + Sync + fmt::Debug {
    /// Method name.
    fn name(&self) -> &str;

    /// The type that declares this method.
    ///
    /// `None` when the host can no longer provide it (e.g. the owning
    /// metadata has been dropped).
    fn declaring_type(&self) -> Option<TypeRef>;

    /// Declared return type.
    fn return_type(&self) -> &TypeRef;

    /// Declared parameters, in order.
    fn parameters(&self) -> &[ParameterInfo];

    /// Declared modifiers.
    fn modifiers(&self) -> &[Modifier];

    /// Name of the declaring type, or an empty string when unavailable.
    fn declaring_type_name(&self) -> String {
        self.declaring_type()
            .map(|t| t.name().to_string())
            .unwrap_or_default()
    }

    /// Identity key for this method: declaring type, name and parameter types.
    fn key(&self) -> MethodKey {
        let params: Vec<&str> = self
            .parameters()
            .iter()
            .map(|p| p.type_info().name())
            .collect();
        MethodKey(format!(
            "{}.{}({})",
            self.declaring_type_name(),
            self.name(),
            params.join(",")
        ))
    }
}

/// Stable identity of a method, used to key per-method caches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodKey(String);

impl MethodKey {
    /// Returns the textual signature this key was built from.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
