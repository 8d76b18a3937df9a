//! Interceptors: one advice method bound to its aspect instance and matcher.
//!
//! The proxy layer asks an interceptor three things per intercepted call:
//!
//! 1. [`Interceptor::accepts`]: should this advice run for the outcome?
//! 2. [`Interceptor::advice_arguments`]: the advice call's argument list.
//! 3. [`Interceptor::invoke`]: both of the above plus the host invocation.

use std::sync::Arc;

use tracing::debug;
use weft_core::{
    AdviceArgument, AdviceInvoker, Annotation, Instance, JoinPoint, MethodRef, Outcome,
};

use crate::advice::{AdviceKind, AdviceSignature, AnnotationNames, ParamSlot};
use crate::error::{AdviceResult, InterceptError, JoinPointError};
use crate::expression::ParseContext;
use crate::method_matcher::MethodMatcher;

/// A validated, ready-to-use advice.
#[derive(Debug)]
pub struct Interceptor {
    aspect: String,
    owner: Instance,
    advice_method: MethodRef,
    signature: AdviceSignature,
    matcher: Arc<MethodMatcher>,
    order: Option<i64>,
}

impl Interceptor {
    /// Validates `advice_method` and parses its pointcut.
    ///
    /// Named pointcuts are resolved against the owner's runtime type.
    pub fn build(
        aspect: impl Into<String>,
        owner: Instance,
        advice_method: MethodRef,
        kind: AdviceKind,
        annotation: &Annotation,
        names: &AnnotationNames,
    ) -> AdviceResult<Self> {
        let signature = AdviceSignature::derive(kind, annotation, advice_method.as_ref(), names)?;
        let context = ParseContext::new()
            .aspect(owner.type_info().clone())
            .parameters(signature.parameters().to_vec())
            .pointcut_annotation(names.pointcut.as_str());
        let matcher = MethodMatcher::with_context(signature.pointcut(), context)?;
        let order = owner
            .type_info()
            .find_annotation(&names.order)
            .and_then(|a| a.i64_attribute("value"));

        Ok(Self {
            aspect: aspect.into(),
            owner,
            advice_method,
            signature,
            matcher: Arc::new(matcher),
            order,
        })
    }

    /// Bean name of the owning aspect.
    pub fn aspect(&self) -> &str {
        &self.aspect
    }

    /// The aspect instance advice is invoked on.
    pub fn owner(&self) -> &Instance {
        &self.owner
    }

    pub fn advice_method(&self) -> &MethodRef {
        &self.advice_method
    }

    pub fn kind(&self) -> AdviceKind {
        self.signature.kind()
    }

    pub fn signature(&self) -> &AdviceSignature {
        &self.signature
    }

    pub fn matcher(&self) -> &Arc<MethodMatcher> {
        &self.matcher
    }

    /// `value` of the aspect's order annotation, if present.
    pub fn order(&self) -> Option<i64> {
        self.order
    }

    /// Whether this advice runs for the given outcome.
    ///
    /// `None` means the call has not completed yet (before/around).
    /// After-returning and after-throwing advice only accept their outcome,
    /// and only when the value fits the declared reserved parameter.
    pub fn accepts(&self, outcome: Option<&Outcome>) -> bool {
        let fits = |value: &Instance| {
            self.signature
                .outcome_type()
                .is_none_or(|ty| value.type_info().is_subtype_of(ty.name()))
        };
        match (self.kind(), outcome) {
            (AdviceKind::Before | AdviceKind::Around, None) => true,
            (AdviceKind::After, Some(_)) => true,
            (AdviceKind::AfterReturning, Some(Outcome::Returned(value))) => {
                value.as_ref().is_none_or(fits)
            }
            (AdviceKind::AfterThrowing, Some(Outcome::Thrown(error))) => fits(error),
            _ => false,
        }
    }

    /// Assembles the advice method's arguments for one join point.
    pub fn advice_arguments(
        &self,
        join_point: &dyn JoinPoint,
        outcome: Option<&Outcome>,
    ) -> Result<Vec<AdviceArgument>, InterceptError> {
        let method = join_point.method();
        let bound = self.matcher.match_join_point(
            method,
            join_point.args(),
            join_point.this(),
            join_point.target(),
        )?;
        let missing = |role: &'static str| JoinPointError::MissingOutcome {
            method: method.key(),
            role,
        };

        self.signature
            .slots()
            .iter()
            .map(|slot| -> Result<AdviceArgument, InterceptError> {
                Ok(match slot {
                    ParamSlot::JoinPoint => AdviceArgument::JoinPoint,
                    ParamSlot::Pointcut(index) => AdviceArgument::Bound(
                        bound
                            .get(*index)
                            .map(|p| p.value().clone())
                            .ok_or_else(|| JoinPointError::UnboundParameter {
                                method: method.key(),
                                parameter: self.signature.parameters()[*index].name.clone(),
                            })?,
                    ),
                    ParamSlot::Returning => match outcome {
                        Some(Outcome::Returned(value)) => AdviceArgument::Returned(value.clone()),
                        _ => return Err(missing("returning").into()),
                    },
                    ParamSlot::Throwing => match outcome {
                        Some(Outcome::Thrown(error)) => AdviceArgument::Thrown(error.clone()),
                        _ => return Err(missing("throwing").into()),
                    },
                })
            })
            .collect()
    }

    /// Runs the advice through the host invoker.
    pub fn invoke(
        &self,
        invoker: &dyn AdviceInvoker,
        join_point: &dyn JoinPoint,
        outcome: Option<&Outcome>,
    ) -> Result<Option<Instance>, InterceptError> {
        let args = self.advice_arguments(join_point, outcome)?;
        debug!(
            aspect = %self.aspect,
            advice = self.advice_method.name(),
            kind = %self.kind(),
            method = %join_point.method().key(),
            "Invoking advice"
        );
        Ok(invoker.invoke(&self.owner, &self.advice_method, join_point, args)?)
    }
}
