//! Join-point abstractions supplied by the host proxy layer.
//!
//! At call time the proxy layer describes the intercepted invocation through
//! [`JoinPoint`] (or [`ProceedingJoinPoint`] for around advice) and invokes
//! advice through an [`AdviceInvoker`]. The engine itself never calls user
//! code directly.

use crate::error::InvocationResult;
use crate::instance::Instance;
use crate::metadata::{Annotation, MethodRef};

/// One concrete method invocation.
pub trait JoinPoint: Send + Sync {
    /// The invoked method.
    fn method(&self) -> &MethodRef;

    /// Actual call arguments.
    fn args(&self) -> &[Instance];

    /// The proxy the caller invoked (`this`).
    fn this(&self) -> &Instance;

    /// The proxied object ultimately invoked (`target`).
    fn target(&self) -> &Instance;
}

/// A join point that around advice can proceed.
pub trait ProceedingJoinPoint: JoinPoint {
    /// Proceeds with the original arguments.
    fn proceed(&self) -> InvocationResult<Option<Instance>>;

    /// Proceeds with replacement arguments.
    fn proceed_with(&self, args: Vec<Instance>) -> InvocationResult<Option<Instance>>;
}

/// How the advised invocation finished, for after-style advice.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The method returned (possibly nothing).
    Returned(Option<Instance>),
    /// The method threw.
    Thrown(Instance),
}

/// A value bound to a pointcut parameter at a join point.
#[derive(Debug, Clone)]
pub enum BoundValue {
    /// An argument, the target or the proxy.
    Instance(Instance),
    /// An annotation found on the method, a type or a parameter.
    Annotation(Annotation),
}

impl BoundValue {
    /// Returns the bound instance, if this is one.
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(instance) => Some(instance),
            Self::Annotation(_) => None,
        }
    }

    /// Returns the bound annotation, if this is one.
    pub fn as_annotation(&self) -> Option<&Annotation> {
        match self {
            Self::Annotation(annotation) => Some(annotation),
            Self::Instance(_) => None,
        }
    }
}

/// One positional argument handed to an advice method.
#[derive(Debug, Clone)]
pub enum AdviceArgument {
    /// The join-point handle itself.
    JoinPoint,
    /// A bound pointcut parameter.
    Bound(BoundValue),
    /// The value captured by an after-returning `returning` parameter.
    Returned(Option<Instance>),
    /// The error captured by an after-throwing `throwing` parameter.
    Thrown(Instance),
}

/// Calls an advice method with an assembled argument list.
pub trait AdviceInvoker: Send + Sync {
    /// Invokes `method` on `owner`.
    ///
    /// `join_point` is the handle to pass wherever `args` contains
    /// [`AdviceArgument::JoinPoint`].
    fn invoke(
        &self,
        owner: &Instance,
        method: &MethodRef,
        join_point: &dyn JoinPoint,
        args: Vec<AdviceArgument>,
    ) -> InvocationResult<Option<Instance>>;
}
