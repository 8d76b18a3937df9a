//! `target(...)` and `this(...)`.
//!
//! Both test the type the method is invoked on. The proxy handed to callers
//! implements the proxied type, so `this` is decided against the same type
//! as `target`; they differ only in the value they bind.

use weft_core::TypeInfo;

use super::{MatchOutcome, MethodContext};
use crate::expression::TypeOrBinding;
use crate::shadow::BindingSource;

fn accepts(spec: &TypeOrBinding, ty: &dyn TypeInfo) -> bool {
    match spec {
        TypeOrBinding::Type(pattern) => pattern.matches_hierarchy(ty),
        TypeOrBinding::Binding(binding) => ty.is_subtype_of(binding.declared_type.name()),
    }
}

pub(super) fn could_match(spec: &TypeOrBinding, ty: &dyn TypeInfo) -> bool {
    accepts(spec, ty)
}

pub(super) fn match_method(
    spec: &TypeOrBinding,
    ctx: &MethodContext<'_>,
    source: BindingSource,
) -> MatchOutcome {
    let Some(target) = ctx.target() else {
        return MatchOutcome::no_match();
    };
    if !accepts(spec, target) {
        return MatchOutcome::no_match();
    }
    match spec {
        TypeOrBinding::Binding(binding) => {
            MatchOutcome::binding(Some(binding.name.as_str()), source)
        }
        TypeOrBinding::Type(_) => MatchOutcome::matched(),
    }
}
