//! # Weft Core
//!
//! Host-facing capabilities for the Weft aspect engine.
//!
//! The pointcut engine in `weft-framework` decides whether advice applies to
//! a method and which values the advice receives. Everything it needs to know
//! about the host program comes through the traits defined here:
//!
//! - **Metadata**: [`TypeInfo`], [`MethodInfo`], [`AnnotatedElement`] describe
//!   types, methods, parameters and their annotations. [`TypeDescriptor`] is
//!   an in-memory implementation.
//! - **Runtime values**: [`Instance`] pairs an object with its runtime type.
//! - **Join points**: [`JoinPoint`] / [`ProceedingJoinPoint`] describe one
//!   intercepted call; [`AdviceInvoker`] performs the actual advice call.
//! - **Containers**: [`BeanContainer`] lists candidate aspect beans by
//!   [`BeanScope`].
//!
//! ```text
//! ┌──────────────┐   metadata    ┌─────────────┐   bindings   ┌──────────────┐
//! │ Host runtime │──────────────▶│ weft engine │─────────────▶│ Proxy layer  │
//! └──────────────┘               └─────────────┘              └──────────────┘
//! ```

pub mod container;
pub mod error;
pub mod instance;
pub mod join_point;
pub mod metadata;

pub use container::{BeanContainer, BeanDefinition, BeanScope};
pub use error::{InvocationError, InvocationResult};
pub use instance::Instance;
pub use join_point::{
    AdviceArgument, AdviceInvoker, BoundValue, JoinPoint, Outcome, ProceedingJoinPoint,
};
pub use metadata::{
    AnnotatedElement, Annotation, MethodBuilder, MethodDescriptor, MethodInfo, MethodKey,
    MethodRef, Modifier, ParameterInfo, TypeDescriptor, TypeDescriptorBuilder, TypeInfo, TypeRef,
    simple_name,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::container::*;
    pub use super::instance::Instance;
    pub use super::join_point::*;
    pub use super::metadata::{
        AnnotatedElement, Annotation, MethodDescriptor, MethodInfo, MethodRef, Modifier,
        ParameterInfo, TypeDescriptor, TypeInfo, TypeRef,
    };
}
