//! `args(...)`: positional argument matching.
//!
//! Decided statically against declared parameter types. A type pattern
//! accepts a parameter whose type (or a supertype) matches; a bound name
//! accepts a parameter assignable to the name's declared type.

use super::{MatchOutcome, MethodContext, align};
use crate::expression::ArgPattern;
use crate::shadow::BindingSource;

pub(super) fn match_method(patterns: &[ArgPattern], ctx: &MethodContext<'_>) -> MatchOutcome {
    let params = ctx.method().parameters();
    let aligned = align(
        patterns,
        params.len(),
        &|p| matches!(p, ArgPattern::Rest),
        &|p, i| {
            let ty = params[i].type_info();
            match p {
                ArgPattern::Any | ArgPattern::Rest => true,
                ArgPattern::Type(pattern) => pattern.matches_hierarchy(ty.as_ref()),
                ArgPattern::Binding(binding) => ty.is_subtype_of(binding.declared_type.name()),
            }
        },
    );
    let Some(positions) = aligned else {
        return MatchOutcome::no_match();
    };

    let bindings = patterns
        .iter()
        .zip(positions)
        .filter_map(|(pattern, position)| match (pattern, position) {
            (ArgPattern::Binding(b), Some(index)) => {
                Some((b.name.clone(), BindingSource::PositionalArg(index)))
            }
            _ => None,
        })
        .collect();
    MatchOutcome {
        matched: true,
        bindings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{Binding, ParseContext, Parser};
    use crate::matchers::ClauseMatcher;
    use weft_core::{MethodDescriptor, MethodRef, TypeDescriptor, TypeRef};

    fn string() -> TypeRef {
        TypeDescriptor::named("java.lang.String")
    }

    fn method(param_count: usize) -> (TypeRef, MethodRef) {
        let mut builder = MethodDescriptor::builder("m");
        for i in 0..param_count {
            builder = builder.param(format!("p{i}"), string());
        }
        let ty = TypeDescriptor::builder("demo.Service").method(builder).build();
        let m = ty.declared_method("m").unwrap();
        (ty, m)
    }

    fn outcome(expression: &str, names: &[&str], param_count: usize) -> MatchOutcome {
        let parameters = names
            .iter()
            .map(|n| Binding {
                name: n.to_string(),
                declared_type: string(),
            })
            .collect();
        let expr = Parser::new(ParseContext::new().parameters(parameters))
            .parse(expression)
            .unwrap();
        let (_ty, m) = method(param_count);
        expr.clauses()[0].match_method(&MethodContext::new(m.as_ref()))
    }

    #[test]
    fn test_single_binding() {
        let o = outcome("args(s)", &["s"], 1);
        assert!(o.matched);
        assert_eq!(o.bindings, vec![("s".to_string(), BindingSource::PositionalArg(0))]);
        assert!(!outcome("args(s)", &["s"], 2).matched);
    }

    #[test]
    fn test_wildcards_skip_positions() {
        let o = outcome("args(*,s2,s3,*)", &["s2", "s3"], 4);
        assert!(o.matched);
        assert_eq!(
            o.bindings,
            vec![
                ("s2".to_string(), BindingSource::PositionalArg(1)),
                ("s3".to_string(), BindingSource::PositionalArg(2)),
            ]
        );
        assert!(!outcome("args(*,s2,s3,*)", &["s2", "s3"], 3).matched);
    }

    #[test]
    fn test_rest_counts_from_end() {
        let o = outcome("args(.., last)", &["last"], 3);
        assert_eq!(o.bindings, vec![("last".to_string(), BindingSource::PositionalArg(2))]);
        assert!(outcome("args(..)", &[], 0).matched);
        assert!(outcome("args()", &[], 0).matched);
        assert!(!outcome("args()", &[], 1).matched);
    }

    #[test]
    fn test_type_patterns() {
        assert!(outcome("args(String, ..)", &[], 2).matched);
        assert!(!outcome("args(Integer, ..)", &[], 2).matched);
    }
}
