//! Per-clause matchers.
//!
//! Every clause answers two questions:
//!
//! - [`ClauseMatcher::could_match`]: may any method of this type match?
//!   Metadata-only and conservative; a `false` here guarantees the precise
//!   test fails for every method of the type.
//! - [`ClauseMatcher::match_method`]: does this method match, and where do the
//!   clause's bindings come from?
//!
//! ```text
//! ┌──────────────┐      ┌───────────────┐      ┌───────────────────┐
//! │ Clause       │─────▶│ kind matcher  │─────▶│ MatchOutcome      │
//! │ (ClauseSpec) │      │ signature/... │      │ matched, bindings │
//! └──────────────┘      └───────────────┘      └───────────────────┘
//! ```
//!
//! Method-level tests run in a [`MethodContext`]: the method, its declaring
//! type and the type the method is considered on (the target type). The
//! target type defaults to the declaring type; the resolver passes the
//! concrete bean type instead.

mod annotation;
mod args;
mod instance;
mod signature;

use weft_core::{MethodInfo, TypeInfo, TypeRef};

use crate::expression::{Clause, ClauseSpec};
use crate::shadow::BindingSource;

/// Result of a method-level clause test.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchOutcome {
    pub matched: bool,
    /// Binding sources captured by the clause; empty unless `matched`.
    pub bindings: Vec<(String, BindingSource)>,
}

impl MatchOutcome {
    pub fn no_match() -> Self {
        Self::default()
    }

    pub fn matched() -> Self {
        Self {
            matched: true,
            bindings: Vec::new(),
        }
    }

    pub fn from_bool(matched: bool) -> Self {
        Self {
            matched,
            bindings: Vec::new(),
        }
    }

    /// A match that binds `name` when `name` is given.
    pub fn binding(name: Option<&str>, source: BindingSource) -> Self {
        Self {
            matched: true,
            bindings: name.map(|n| (n.to_string(), source)).into_iter().collect(),
        }
    }
}

/// The method under test and the types it is considered against.
#[derive(Debug, Clone)]
pub struct MethodContext<'m> {
    method: &'m dyn MethodInfo,
    declaring: Option<TypeRef>,
    target: Option<TypeRef>,
}

impl<'m> MethodContext<'m> {
    /// Considers `method` on its own declaring type.
    pub fn new(method: &'m dyn MethodInfo) -> Self {
        let declaring = method.declaring_type();
        Self {
            method,
            target: declaring.clone(),
            declaring,
        }
    }

    /// Considers `method` as invoked on an instance of `target`.
    pub fn on(target: TypeRef, method: &'m dyn MethodInfo) -> Self {
        Self {
            method,
            declaring: method.declaring_type(),
            target: Some(target),
        }
    }

    pub fn method(&self) -> &'m dyn MethodInfo {
        self.method
    }

    pub fn declaring(&self) -> Option<&dyn TypeInfo> {
        self.declaring.as_deref()
    }

    pub fn target(&self) -> Option<&dyn TypeInfo> {
        self.target.as_deref()
    }
}

/// The two-phase test every clause kind implements.
pub trait ClauseMatcher {
    /// Type-level pre-filter; never rejects a type some method of it matches.
    fn could_match(&self, ty: &dyn TypeInfo) -> bool;

    /// Precise method-level test.
    fn match_method(&self, ctx: &MethodContext<'_>) -> MatchOutcome;
}

impl ClauseMatcher for Clause {
    fn could_match(&self, ty: &dyn TypeInfo) -> bool {
        match &self.spec {
            ClauseSpec::Execution(sig) => signature::could_match_execution(sig, ty),
            ClauseSpec::Within(pattern) => signature::could_match_within(pattern, ty),
            ClauseSpec::Target(spec) | ClauseSpec::This(spec) => {
                instance::could_match(spec, ty)
            }
            ClauseSpec::Args(_) => true,
            ClauseSpec::AtTarget(a) => annotation::could_match_target(a, ty),
            ClauseSpec::AtWithin(a) => annotation::could_match_within(a, ty),
            ClauseSpec::AtAnnotation(a) => annotation::could_match_method(a, ty),
            ClauseSpec::AtArgs(a) => annotation::could_match_args(a, ty),
            ClauseSpec::AtParams(a) => annotation::could_match_params(a, ty),
        }
    }

    fn match_method(&self, ctx: &MethodContext<'_>) -> MatchOutcome {
        match &self.spec {
            ClauseSpec::Execution(sig) => {
                MatchOutcome::from_bool(signature::match_execution(sig, ctx))
            }
            ClauseSpec::Within(pattern) => {
                MatchOutcome::from_bool(signature::match_within(pattern, ctx))
            }
            ClauseSpec::Target(spec) => instance::match_method(spec, ctx, BindingSource::Target),
            ClauseSpec::This(spec) => instance::match_method(spec, ctx, BindingSource::Proxy),
            ClauseSpec::Args(patterns) => args::match_method(patterns, ctx),
            ClauseSpec::AtTarget(a) => annotation::match_target(a, ctx),
            ClauseSpec::AtWithin(a) => annotation::match_within(a, ctx),
            ClauseSpec::AtAnnotation(a) => annotation::match_method(a, ctx),
            ClauseSpec::AtArgs(a) => annotation::match_args(a, ctx),
            ClauseSpec::AtParams(a) => annotation::match_params(a, ctx),
        }
    }
}

/// Aligns a pattern list containing `..` runs with `len` positions.
///
/// Returns, for each pattern, the position it consumed (`None` for `..`),
/// or `None` if no alignment exists.
pub(crate) fn align<P>(
    patterns: &[P],
    len: usize,
    is_rest: &dyn Fn(&P) -> bool,
    accepts: &dyn Fn(&P, usize) -> bool,
) -> Option<Vec<Option<usize>>> {
    fn step<P>(
        patterns: &[P],
        index: usize,
        pos: usize,
        len: usize,
        is_rest: &dyn Fn(&P) -> bool,
        accepts: &dyn Fn(&P, usize) -> bool,
        out: &mut Vec<Option<usize>>,
    ) -> bool {
        let Some(pattern) = patterns.get(index) else {
            return pos == len;
        };
        if is_rest(pattern) {
            out[index] = None;
            return (pos..=len)
                .any(|next| step(patterns, index + 1, next, len, is_rest, accepts, out));
        }
        if pos < len && accepts(pattern, pos) {
            out[index] = Some(pos);
            return step(patterns, index + 1, pos + 1, len, is_rest, accepts, out);
        }
        false
    }

    let mut out = vec![None; patterns.len()];
    step(patterns, 0, 0, len, is_rest, accepts, &mut out).then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn align_str(patterns: &[&str], len: usize) -> Option<Vec<Option<usize>>> {
        align(patterns, len, &|p| *p == "..", &|_, _| true)
    }

    #[test]
    fn test_align_fixed_and_rest() {
        assert_eq!(align_str(&["*", "*"], 2), Some(vec![Some(0), Some(1)]));
        assert_eq!(align_str(&["*", "*"], 3), None);
        assert_eq!(align_str(&[".."], 0), Some(vec![None]));
        assert_eq!(align_str(&["..", "*"], 3), Some(vec![None, Some(2)]));
        assert_eq!(
            align_str(&["*", "..", "*"], 4),
            Some(vec![Some(0), None, Some(3)])
        );
        assert_eq!(align_str(&[], 0), Some(vec![]));
        assert_eq!(align_str(&[], 1), None);
    }

    #[test]
    fn test_align_backtracks_on_rejection() {
        let patterns = ["..", "b", ".."];
        let items = ["a", "b", "c", "b"];
        let result = align(&patterns, items.len(), &|p| *p == "..", &|p, i| {
            *p == items[i]
        });
        assert_eq!(result, Some(vec![None, Some(1), None]));
    }
}
