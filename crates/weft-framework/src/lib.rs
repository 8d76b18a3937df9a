//! # Weft Framework
//!
//! The pointcut engine of the Weft aspect weaver.
//!
//! This layer provides:
//! - The pointcut expression language (tokenizer, parser, named-pointcut
//!   expansion) and its type/name wildcard patterns
//! - Per-clause matchers and the boolean evaluator
//! - [`MethodMatcher`] / [`ShadowMatch`]: static method matching and runtime
//!   parameter binding
//! - Advice signature validation and [`Interceptor`] construction
//! - [`AspectResolver`]: aspect discovery with per-container caching
//!
//! ```text
//! "execution(* m2(..)) && args(s)"
//!        │
//!        ▼
//!   tokenize ─▶ parse ─▶ PointcutExpression
//!                              │
//!         ┌────────────────────┴────────────────────┐
//!         ▼                                         ▼
//!   could_match(type)                        matches(method)
//!                                                   │ choose
//!                                                   ▼
//!                                    ShadowMatch ─▶ bind(join point)
//! ```

pub mod advice;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod interceptor;
pub mod matchers;
pub mod method_matcher;
pub mod pattern;
pub mod resolver;
pub mod shadow;

pub use advice::{AdviceKind, AdviceSignature, AnnotationNames, ParamSlot};
pub use error::{
    AdviceError, AdviceResult, InterceptError, JoinPointError, JoinPointResult, ParseError,
    ParseResult, ResolveError, ResolveResult,
};
pub use evaluator::Evaluator;
pub use expression::{
    Binding, Clause, ClauseKind, ClauseSpec, Node, ParseContext, Parser, PointcutExpression,
};
pub use interceptor::Interceptor;
pub use matchers::{ClauseMatcher, MatchOutcome, MethodContext};
pub use method_matcher::{MatchResult, MethodMatcher};
pub use pattern::{NamePattern, TypePattern};
pub use resolver::{AspectResolver, InterceptorList, ResolutionState};
pub use shadow::{BindingSource, PointcutParameter, ShadowMatch};

/// Prelude for common imports.
pub mod prelude {
    pub use super::advice::{AdviceKind, AnnotationNames};
    pub use super::error::{AdviceError, JoinPointError, ParseError, ResolveError};
    pub use super::interceptor::Interceptor;
    pub use super::method_matcher::{MatchResult, MethodMatcher};
    pub use super::resolver::{AspectResolver, ResolutionState};
    pub use super::shadow::{PointcutParameter, ShadowMatch};
}
