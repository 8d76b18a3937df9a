//! In-memory metadata descriptors.
//!
//! [`TypeDescriptor`] and [`MethodDescriptor`] implement the metadata
//! capabilities from plain data. Methods keep a weak back-reference to their
//! declaring type, so descriptors are always handed out as `Arc`s.
//!
//! ```rust,ignore
//! let string = TypeDescriptor::named("java.lang.String");
//! let service = TypeDescriptor::builder("demo.TestService1")
//!     .method(MethodDescriptor::builder("m2").param("s", string.clone()))
//!     .build();
//! ```

use std::sync::{Arc, Weak};

use super::{
    AnnotatedElement, Annotation, MethodInfo, MethodRef, Modifier, ParameterInfo, TypeInfo,
    TypeRef,
};

// =============================================================================
// TypeDescriptor
// =============================================================================

/// Plain-data implementation of [`TypeInfo`].
#[derive(Debug)]
pub struct TypeDescriptor {
    name: String,
    annotations: Vec<Annotation>,
    supertypes: Vec<TypeRef>,
    declared: Vec<Arc<MethodDescriptor>>,
}

impl TypeDescriptor {
    /// Starts building a type with the given fully qualified name.
    pub fn builder(name: impl Into<String>) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder {
            name: name.into(),
            annotations: Vec::new(),
            supertypes: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Creates a bare type with no annotations, supertypes or methods.
    pub fn named(name: impl Into<String>) -> Arc<Self> {
        Self::builder(name).build()
    }

    /// Methods declared directly on this type.
    pub fn declared_methods(&self) -> Vec<MethodRef> {
        self.declared
            .iter()
            .map(|m| Arc::clone(m) as MethodRef)
            .collect()
    }

    /// Returns the directly declared method with the given name.
    pub fn declared_method(&self, name: &str) -> Option<MethodRef> {
        self.declared
            .iter()
            .find(|m| m.name == name)
            .map(|m| Arc::clone(m) as MethodRef)
    }
}

impl AnnotatedElement for TypeDescriptor {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

impl TypeInfo for TypeDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn supertypes(&self) -> Vec<TypeRef> {
        self.supertypes.clone()
    }

    fn methods(&self) -> Vec<MethodRef> {
        let mut methods = self.declared_methods();
        for supertype in &self.supertypes {
            for inherited in supertype.methods() {
                let overridden = methods
                    .iter()
                    .any(|m| same_signature(m.as_ref(), inherited.as_ref()));
                if !overridden {
                    methods.push(inherited);
                }
            }
        }
        methods
    }
}

/// Name and parameter types equal; the declaring type is ignored.
fn same_signature(a: &dyn MethodInfo, b: &dyn MethodInfo) -> bool {
    a.name() == b.name()
        && a.parameters().len() == b.parameters().len()
        && a
            .parameters()
            .iter()
            .zip(b.parameters())
            .all(|(x, y)| x.type_info().name() == y.type_info().name())
}

/// Builder for [`TypeDescriptor`].
pub struct TypeDescriptorBuilder {
    name: String,
    annotations: Vec<Annotation>,
    supertypes: Vec<TypeRef>,
    methods: Vec<MethodBuilder>,
}

impl TypeDescriptorBuilder {
    /// Adds a type-level annotation.
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Adds a direct supertype.
    pub fn extends(mut self, supertype: TypeRef) -> Self {
        self.supertypes.push(supertype);
        self
    }

    /// Declares a method on this type.
    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.methods.push(method);
        self
    }

    /// Finishes the type, wiring each method back to it.
    pub fn build(self) -> Arc<TypeDescriptor> {
        let Self {
            name,
            annotations,
            supertypes,
            methods,
        } = self;
        Arc::new_cyclic(|declaring: &Weak<TypeDescriptor>| TypeDescriptor {
            name,
            annotations,
            supertypes,
            declared: methods
                .into_iter()
                .map(|m| Arc::new(m.finish(declaring.clone())))
                .collect(),
        })
    }
}

// =============================================================================
// MethodDescriptor
// =============================================================================

/// Plain-data implementation of [`MethodInfo`].
#[derive(Debug)]
pub struct MethodDescriptor {
    name: String,
    declaring: Weak<TypeDescriptor>,
    return_type: TypeRef,
    parameters: Vec<ParameterInfo>,
    modifiers: Vec<Modifier>,
    annotations: Vec<Annotation>,
}

impl MethodDescriptor {
    /// Starts building a method. The declaring type is attached by
    /// [`TypeDescriptorBuilder::build`].
    pub fn builder(name: impl Into<String>) -> MethodBuilder {
        MethodBuilder {
            name: name.into(),
            return_type: None,
            parameters: Vec::new(),
            modifiers: vec![Modifier::Public],
            annotations: Vec::new(),
        }
    }
}

impl AnnotatedElement for MethodDescriptor {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

impl MethodInfo for MethodDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn declaring_type(&self) -> Option<TypeRef> {
        self.declaring.upgrade().map(|t| t as TypeRef)
    }

    fn return_type(&self) -> &TypeRef {
        &self.return_type
    }

    fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }
}

/// Builder for [`MethodDescriptor`].
pub struct MethodBuilder {
    name: String,
    return_type: Option<TypeRef>,
    parameters: Vec<ParameterInfo>,
    modifiers: Vec<Modifier>,
    annotations: Vec<Annotation>,
}

impl MethodBuilder {
    /// Sets the return type (defaults to `void`).
    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.return_type = Some(ty);
        self
    }

    /// Appends a parameter.
    pub fn param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.parameters.push(ParameterInfo::new(name, ty));
        self
    }

    /// Appends a fully specified parameter (e.g. one carrying annotations).
    pub fn parameter(mut self, parameter: ParameterInfo) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Replaces the modifier set (defaults to `public`).
    pub fn modifiers(mut self, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        self.modifiers = modifiers.into_iter().collect();
        self
    }

    /// Adds a method-level annotation.
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    fn finish(self, declaring: Weak<TypeDescriptor>) -> MethodDescriptor {
        MethodDescriptor {
            name: self.name,
            declaring,
            return_type: self
                .return_type
                .unwrap_or_else(|| TypeDescriptor::named("void")),
            parameters: self.parameters,
            modifiers: self.modifiers,
            annotations: self.annotations,
        }
    }
}
