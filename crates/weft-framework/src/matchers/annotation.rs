//! Annotation presence clauses.
//!
//! | clause         | looked up on                                   |
//! |----------------|------------------------------------------------|
//! | `@target`      | target type and its supertypes                 |
//! | `@within`      | declaring type only (direct annotations)       |
//! | `@annotation`  | the method                                     |
//! | `@args`        | any parameter type and its supertypes          |
//! | `@params`      | any declared parameter                         |
//!
//! `@within` only reads the declaring type's own annotations: an
//! override declared in an unannotated subclass does not match, while an
//! inherited method keeps its annotated declaring type and does.

use weft_core::{AnnotatedElement, MethodInfo, TypeInfo};

use super::{MatchOutcome, MethodContext};
use crate::expression::AnnotationPattern;
use crate::shadow::BindingSource;

fn outcome(pattern: &AnnotationPattern, found: bool, source: BindingSource) -> MatchOutcome {
    if found {
        MatchOutcome::binding(pattern.binding.as_deref(), source)
    } else {
        MatchOutcome::no_match()
    }
}

fn any_method(ty: &dyn TypeInfo, pred: impl Fn(&dyn MethodInfo) -> bool) -> bool {
    ty.methods().iter().any(|m| pred(m.as_ref()))
}

fn param_type_annotated(method: &dyn MethodInfo, annotation: &str) -> bool {
    method
        .parameters()
        .iter()
        .any(|p| p.type_info().find_annotation(annotation).is_some())
}

fn param_annotated(method: &dyn MethodInfo, annotation: &str) -> bool {
    method
        .parameters()
        .iter()
        .any(|p| p.has_annotation(annotation))
}

// =============================================================================
// Type level
// =============================================================================

pub(super) fn could_match_target(pattern: &AnnotationPattern, ty: &dyn TypeInfo) -> bool {
    ty.find_annotation(&pattern.annotation).is_some()
}

/// The declaring type of any method is in `ty`'s hierarchy.
pub(super) fn could_match_within(pattern: &AnnotationPattern, ty: &dyn TypeInfo) -> bool {
    ty.find_annotation(&pattern.annotation).is_some()
}

pub(super) fn could_match_method(pattern: &AnnotationPattern, ty: &dyn TypeInfo) -> bool {
    any_method(ty, |m| m.has_annotation(&pattern.annotation))
}

pub(super) fn could_match_args(pattern: &AnnotationPattern, ty: &dyn TypeInfo) -> bool {
    any_method(ty, |m| param_type_annotated(m, &pattern.annotation))
}

pub(super) fn could_match_params(pattern: &AnnotationPattern, ty: &dyn TypeInfo) -> bool {
    any_method(ty, |m| param_annotated(m, &pattern.annotation))
}

// =============================================================================
// Method level
// =============================================================================

pub(super) fn match_target(pattern: &AnnotationPattern, ctx: &MethodContext<'_>) -> MatchOutcome {
    let found = ctx
        .target()
        .is_some_and(|t| t.find_annotation(&pattern.annotation).is_some());
    outcome(
        pattern,
        found,
        BindingSource::AnnotationOnTargetType(pattern.annotation.clone()),
    )
}

pub(super) fn match_within(pattern: &AnnotationPattern, ctx: &MethodContext<'_>) -> MatchOutcome {
    let found = ctx
        .declaring()
        .is_some_and(|d| d.has_annotation(&pattern.annotation));
    outcome(
        pattern,
        found,
        BindingSource::AnnotationOnDeclaringType(pattern.annotation.clone()),
    )
}

pub(super) fn match_method(pattern: &AnnotationPattern, ctx: &MethodContext<'_>) -> MatchOutcome {
    outcome(
        pattern,
        ctx.method().has_annotation(&pattern.annotation),
        BindingSource::AnnotationOnMethod(pattern.annotation.clone()),
    )
}

pub(super) fn match_args(pattern: &AnnotationPattern, ctx: &MethodContext<'_>) -> MatchOutcome {
    outcome(
        pattern,
        param_type_annotated(ctx.method(), &pattern.annotation),
        BindingSource::AnnotationOnAnyParamType(pattern.annotation.clone()),
    )
}

pub(super) fn match_params(pattern: &AnnotationPattern, ctx: &MethodContext<'_>) -> MatchOutcome {
    outcome(
        pattern,
        param_annotated(ctx.method(), &pattern.annotation),
        BindingSource::AnnotationOnAnyParamValue(pattern.annotation.clone()),
    )
}
