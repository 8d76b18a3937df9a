//! The method matcher: one parsed pointcut plus its per-method shadow cache.
//!
//! ```text
//!   weaving phase                          call time
//! ┌─────────────┐  matches  ┌────────┐    ┌──────────────────┐
//! │ could_match │──────────▶│ choose │───▶│ match_join_point │
//! └─────────────┘           └────────┘    └──────────────────┘
//!                              │ write          ▲ read
//!                              ▼                │
//!                     RwLock<HashMap<MethodKey, Arc<ShadowMatch>>>
//! ```
//!
//! `choose` may run while other threads already bind join points for other
//! methods; the lock makes every committed shadow visible to later readers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, warn};
use weft_core::{Instance, MethodInfo, MethodKey, MethodRef, TypeInfo, TypeRef};

use crate::error::{JoinPointError, JoinPointResult, ParseResult};
use crate::evaluator::Evaluator;
use crate::expression::{Binding, ParseContext, Parser, PointcutExpression};
use crate::matchers::MethodContext;
use crate::shadow::{PointcutParameter, ShadowMatch};

/// Outcome of [`MethodMatcher::matches`].
///
/// A shadow is always present so that callers can handle both outcomes the
/// same way; only a matching result should be passed to
/// [`MethodMatcher::choose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    matches: bool,
    shadow: ShadowMatch,
}

impl MatchResult {
    pub fn matches(&self) -> bool {
        self.matches
    }

    pub fn shadow(&self) -> &ShadowMatch {
        &self.shadow
    }
}

/// Decides whether a pointcut applies to methods and binds its parameters.
#[derive(Debug)]
pub struct MethodMatcher {
    expression: PointcutExpression,
    parameters: Vec<Binding>,
    shadows: RwLock<HashMap<MethodKey, Arc<ShadowMatch>>>,
}

impl MethodMatcher {
    /// Parses `expression` for an advice declared on `aspect`.
    ///
    /// Named pointcuts are looked up on `aspect` using the default
    /// `Pointcut` annotation.
    pub fn new(expression: &str, aspect: &TypeRef, parameters: Vec<Binding>) -> ParseResult<Self> {
        Self::with_context(
            expression,
            ParseContext::new()
                .aspect(aspect.clone())
                .parameters(parameters),
        )
    }

    /// Parses `expression` within a fully specified context.
    pub fn with_context(expression: &str, context: ParseContext) -> ParseResult<Self> {
        let parser = Parser::new(context);
        let parsed = parser.parse(expression)?;
        Ok(Self {
            expression: parsed,
            parameters: parser.context().declared_parameters().to_vec(),
            shadows: RwLock::new(HashMap::new()),
        })
    }

    pub fn expression(&self) -> &PointcutExpression {
        &self.expression
    }

    /// Declared pointcut parameters, in binding order.
    pub fn parameters(&self) -> &[Binding] {
        &self.parameters
    }

    /// Cheap type-level pre-filter.
    pub fn could_match(&self, ty: &dyn TypeInfo) -> bool {
        Evaluator::new(&self.expression).could_match(ty)
    }

    /// Evaluates the pointcut against `method` on its declaring type.
    pub fn matches(&self, method: &MethodRef) -> MatchResult {
        self.evaluate(MethodContext::new(method.as_ref()), method.as_ref())
    }

    /// Evaluates the pointcut against `method` invoked on an instance of `ty`.
    pub fn matches_on(&self, ty: &TypeRef, method: &MethodRef) -> MatchResult {
        self.evaluate(MethodContext::on(ty.clone(), method.as_ref()), method.as_ref())
    }

    fn evaluate(&self, ctx: MethodContext<'_>, method: &dyn MethodInfo) -> MatchResult {
        let outcome = Evaluator::new(&self.expression).evaluate(&ctx);
        let mut bindings = Vec::with_capacity(self.parameters.len());
        if outcome.matched {
            for parameter in &self.parameters {
                if let Some(found) = outcome.bindings.iter().find(|(n, _)| *n == parameter.name) {
                    bindings.push(found.clone());
                }
            }
        }
        MatchResult {
            matches: outcome.matched,
            shadow: ShadowMatch::new(method.key(), bindings),
        }
    }

    /// Commits a successful match so that join points of `method` can be
    /// bound. Re-committing an equal shadow is a no-op.
    pub fn choose(&self, method: &MethodRef, result: &MatchResult) {
        let key = method.key();
        if !result.matches {
            debug!(method = %key, expression = %self.expression, "Ignoring non-matching result");
            return;
        }

        let mut shadows = self.shadows.write();
        match shadows.get(&key) {
            Some(existing) if **existing == result.shadow => {}
            Some(_) => {
                warn!(
                    method = %key,
                    expression = %self.expression,
                    "Replacing shadow match with a different result"
                );
                shadows.insert(key, Arc::new(result.shadow.clone()));
            }
            None => {
                debug!(method = %key, expression = %self.expression, "Shadow match recorded");
                shadows.insert(key, Arc::new(result.shadow.clone()));
            }
        }
    }

    /// The committed shadow for `method`, if any.
    pub fn shadow(&self, method: &MethodRef) -> Option<Arc<ShadowMatch>> {
        self.shadows.read().get(&method.key()).cloned()
    }

    /// Binds the declared parameters for one invocation of `method`.
    ///
    /// Every call returns a fresh list. Fails if `choose` was never called
    /// for `method` or if the recorded bindings cannot be satisfied.
    pub fn match_join_point(
        &self,
        method: &MethodRef,
        args: &[Instance],
        proxy: &Instance,
        proxied: &Instance,
    ) -> JoinPointResult<Vec<PointcutParameter>> {
        let shadow = self.shadow(method).ok_or_else(|| JoinPointError::MissingShadowMatch {
            method: method.key(),
        });
        shadow
            .and_then(|s| s.bind(&self.parameters, method, args, proxy, proxied))
            .inspect_err(|e| {
                error!(expression = %self.expression, error = %e, "Join point binding failed");
            })
    }
}
