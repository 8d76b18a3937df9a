//! Error types for the Weft framework.
//!
//! Errors fall into two groups:
//!
//! - Registration-time errors ([`ParseError`], [`AdviceError`],
//!   [`ResolveError`]): fatal for one aspect, reported while interceptors are
//!   built.
//! - Call-time invariant violations ([`JoinPointError`]): they indicate a bug
//!   in the weaving pipeline and are never retried.

use thiserror::Error;
use weft_core::{InvocationError, MethodKey};

use crate::advice::AdviceKind;

// =============================================================================
// Parse Errors
// =============================================================================

/// Grammar and binding errors in a pointcut expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The expression contains no clause at all.
    #[error("empty pointcut expression")]
    Empty,

    /// A character that cannot start any token.
    #[error("unexpected character '{found}' at offset {offset} in '{expression}'")]
    UnexpectedCharacter {
        expression: String,
        offset: usize,
        found: char,
    },

    /// A `(` without its `)` or the other way round.
    #[error("unbalanced parentheses at offset {offset} in '{expression}'")]
    UnbalancedParentheses { expression: String, offset: usize },

    /// A `@keyword(...)` clause that is not one of the supported kinds.
    #[error("unknown clause '{keyword}' at offset {offset} in '{expression}'")]
    UnknownClause {
        expression: String,
        offset: usize,
        keyword: String,
    },

    /// A token in a position the grammar does not allow.
    #[error("expected {expected} but found '{found}' at offset {offset} in '{expression}'")]
    UnexpectedToken {
        expression: String,
        offset: usize,
        found: String,
        expected: &'static str,
    },

    /// The body of a clause is not a valid pattern for its kind.
    #[error("invalid pattern in '{clause}' of '{expression}': {reason}")]
    InvalidPattern {
        expression: String,
        clause: String,
        reason: String,
    },

    /// A named pointcut reference that does not resolve.
    #[error("unknown pointcut '{name}' referenced in '{expression}'")]
    UnknownPointcut { expression: String, name: String },

    /// A named pointcut referenced with the wrong number of arguments.
    #[error("pointcut '{name}' takes {expected} argument(s) but {found} given in '{expression}'")]
    PointcutArity {
        expression: String,
        name: String,
        expected: usize,
        found: usize,
    },

    /// Named pointcuts that reference each other.
    #[error("pointcut reference cycle: {chain}")]
    ReferenceCycle { chain: String },

    /// A binding below `!`; the value would never be available.
    #[error("parameter '{name}' cannot be bound under negation in '{expression}'")]
    BindingUnderNegation { expression: String, name: String },

    /// A binding inside `||`; the value would not be guaranteed.
    #[error("parameter '{name}' cannot be bound inside '||' in '{expression}'")]
    BindingUnderDisjunction { expression: String, name: String },

    /// The same parameter bound by more than one clause.
    #[error("parameter '{name}' is bound more than once in '{expression}'")]
    AmbiguousBinding { expression: String, name: String },

    /// A declared parameter that no clause binds.
    #[error("parameter '{name}' is declared but never bound in '{expression}'")]
    UnboundParameter { expression: String, name: String },

    /// A parameter name in a binding position that the advice does not declare.
    #[error("'{name}' in '{expression}' is not a declared pointcut parameter")]
    UndeclaredBinding { expression: String, name: String },
}

impl ParseError {
    /// Creates an invalid-pattern error.
    pub fn invalid_pattern(
        expression: impl Into<String>,
        clause: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidPattern {
            expression: expression.into(),
            clause: clause.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Advice Errors
// =============================================================================

/// Signature-validation errors for advice methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdviceError {
    /// The advice annotation carries no pointcut expression.
    #[error("{kind} advice '{method}' has no pointcut expression")]
    MissingPointcut { kind: AdviceKind, method: String },

    /// Around advice without the proceeding join point as first parameter.
    #[error("around advice '{method}' must declare a proceeding join point as its first parameter")]
    MissingProceedingJoinPoint { method: String },

    /// Non-around advice that declares a proceeding join point.
    #[error("{kind} advice '{method}' cannot take a proceeding join point")]
    ProceedingJoinPointNotAllowed { kind: AdviceKind, method: String },

    /// `argNames` does not line up with the declared parameters.
    #[error("advice '{method}' declares {expected} bindable parameter(s) but argNames lists {found}")]
    ArgNamesMismatch {
        method: String,
        expected: usize,
        found: usize,
    },

    /// `returning` / `throwing` names a parameter that does not exist.
    #[error("advice '{method}' names '{name}' as its {role} parameter but declares no such parameter")]
    UnknownReservedName {
        method: String,
        role: &'static str,
        name: String,
    },

    /// The pointcut expression failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A rejected advice method together with the aspect it belongs to.
#[derive(Debug, Clone, Error)]
#[error("aspect '{aspect}' rejected: {source}")]
pub struct ResolveError {
    /// Bean name of the aspect.
    pub aspect: String,
    /// The underlying validation failure.
    #[source]
    pub source: AdviceError,
}

// =============================================================================
// Join Point Errors
// =============================================================================

/// Invariant violations detected while binding a join point.
#[derive(Debug, Clone, Error)]
pub enum JoinPointError {
    /// Binding was requested before `choose` recorded a match.
    #[error("missing shadow match for method '{method}'")]
    MissingShadowMatch { method: MethodKey },

    /// A positional binding points past the actual arguments.
    #[error("argument index {index} out of range for '{method}' called with {len} argument(s)")]
    ArgumentIndexOutOfRange {
        method: MethodKey,
        index: usize,
        len: usize,
    },

    /// An annotation the match guaranteed could not be found.
    #[error("annotation '{annotation}' required by parameter '{parameter}' not found for '{method}'")]
    MissingAnnotation {
        method: MethodKey,
        parameter: String,
        annotation: String,
    },

    /// The host no longer provides the declaring type of the method.
    #[error("declaring type of '{method}' is unavailable")]
    MissingTypeInformation { method: MethodKey },

    /// The recorded shadow has no binding source for a declared parameter.
    #[error("shadow match for '{method}' does not bind parameter '{parameter}'")]
    UnboundParameter { method: MethodKey, parameter: String },

    /// A `returning`/`throwing` parameter without the matching outcome.
    #[error("advice for '{method}' needs a {role} value but the call produced none")]
    MissingOutcome {
        method: MethodKey,
        role: &'static str,
    },
}

/// Failure while running a single advice.
#[derive(Debug, Clone, Error)]
pub enum InterceptError {
    /// Argument binding failed.
    #[error(transparent)]
    JoinPoint(#[from] JoinPointError),

    /// The host reported an invocation failure.
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for expression parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for advice validation.
pub type AdviceResult<T> = Result<T, AdviceError>;

/// Result type for aspect resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Result type for join-point binding.
pub type JoinPointResult<T> = Result<T, JoinPointError>;
