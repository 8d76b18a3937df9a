//! Error types shared with host collaborators.

use thiserror::Error;

use crate::instance::Instance;

/// Errors raised while the host invokes advice or proceeds a join point.
#[derive(Debug, Clone, Error)]
pub enum InvocationError {
    /// The invoked code raised an error object.
    #[error("invocation threw an instance of '{}'", .0.type_info().name())]
    Thrown(Instance),

    /// The host could not perform the call at all.
    #[error("invocation failed: {0}")]
    Failed(String),
}

impl InvocationError {
    /// Creates a failure with the given message.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Result type for host invocations.
pub type InvocationResult<T> = Result<T, InvocationError>;
