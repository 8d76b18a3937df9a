//! `execution(...)` and `within(...)`: lexical signature matching.

use weft_core::{MethodInfo, TypeInfo};

use super::{MethodContext, align};
use crate::expression::{ParamPattern, SignaturePattern};
use crate::pattern::TypePattern;

pub(super) fn could_match_execution(sig: &SignaturePattern, ty: &dyn TypeInfo) -> bool {
    if let Some(declaring) = &sig.declaring_type
        && !declaring.matches_hierarchy(ty)
    {
        return false;
    }
    ty.methods().iter().any(|m| sig.name.matches(m.name()))
}

pub(super) fn match_execution(sig: &SignaturePattern, ctx: &MethodContext<'_>) -> bool {
    let method = ctx.method();
    if !sig.modifiers.iter().all(|m| method.modifiers().contains(m)) {
        return false;
    }
    if !sig.name.matches(method.name()) {
        return false;
    }
    if !sig.return_type.matches_type(method.return_type().as_ref()) {
        return false;
    }
    if let Some(pattern) = &sig.declaring_type {
        // the signature may be declared by any supertype of the declaring type
        match ctx.declaring() {
            Some(declaring) if pattern.matches_hierarchy(declaring) => {}
            _ => return false,
        }
    }
    match_params(&sig.params, method)
}

fn match_params(patterns: &[ParamPattern], method: &dyn MethodInfo) -> bool {
    let params = method.parameters();
    align(
        patterns,
        params.len(),
        &|p| matches!(p, ParamPattern::Rest),
        &|p, i| match p {
            ParamPattern::Rest => true,
            ParamPattern::Type(t) => t.matches_type(params[i].type_info().as_ref()),
        },
    )
    .is_some()
}

pub(super) fn could_match_within(pattern: &TypePattern, ty: &dyn TypeInfo) -> bool {
    pattern.matches_hierarchy(ty)
}

pub(super) fn match_within(pattern: &TypePattern, ctx: &MethodContext<'_>) -> bool {
    ctx.declaring().is_some_and(|d| pattern.matches_type(d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{Clause, ClauseSpec, ParseContext, Parser};
    use crate::matchers::ClauseMatcher;
    use weft_core::{MethodDescriptor, Modifier, TypeDescriptor, TypeRef};

    fn clause(expression: &str) -> Clause {
        Parser::new(ParseContext::new())
            .parse(expression)
            .unwrap()
            .clauses()[0]
            .clone()
    }

    fn string() -> TypeRef {
        TypeDescriptor::named("java.lang.String")
    }

    #[test]
    fn test_execution_end_to_end() {
        let service = TypeDescriptor::builder("demo.TestService1")
            .method(MethodDescriptor::builder("m1"))
            .method(MethodDescriptor::builder("m2").param("s", string()))
            .build();
        let m1 = service.declared_method("m1").unwrap();
        let m2 = service.declared_method("m2").unwrap();

        let c = clause("execution(* m2(String))");
        assert!(c.could_match(service.as_ref()));
        assert!(c.match_method(&MethodContext::new(m2.as_ref())).matched);
        assert!(!c.match_method(&MethodContext::new(m1.as_ref())).matched);

        let other = TypeDescriptor::builder("demo.Other")
            .method(MethodDescriptor::builder("m1"))
            .build();
        assert!(!c.could_match(other.as_ref()));
    }

    #[test]
    fn test_execution_modifiers_return_and_declaring_type() {
        let int = TypeDescriptor::named("int");
        let base = TypeDescriptor::builder("demo.Repository")
            .method(MethodDescriptor::builder("count").returns(int.clone()))
            .build();
        let repo = TypeDescriptor::builder("demo.impl.JdbcRepository")
            .extends(base)
            .method(
                MethodDescriptor::builder("find")
                    .returns(string())
                    .param("id", int.clone())
                    .param("flag", int)
                    .modifiers([Modifier::Public, Modifier::Final]),
            )
            .build();
        let find = repo.declared_method("find").unwrap();
        let ctx = MethodContext::new(find.as_ref());

        assert!(
            clause("execution(public final String demo..*.find(int, ..))")
                .match_method(&ctx)
                .matched
        );
        assert!(clause("execution(* demo.Repository.find(..))").match_method(&ctx).matched);
        assert!(!clause("execution(static * find(..))").match_method(&ctx).matched);
        assert!(!clause("execution(int find(..))").match_method(&ctx).matched);
        assert!(!clause("execution(* find(int))").match_method(&ctx).matched);
        assert!(!clause("execution(* demo.Other.find(..))").match_method(&ctx).matched);

        assert!(clause("execution(* demo.Repository.*(..))").could_match(repo.as_ref()));
        assert!(!clause("execution(* demo.Other.*(..))").could_match(repo.as_ref()));
    }

    #[test]
    fn test_within_recursive_package() {
        let c = clause("within(a.b..*)");
        let ClauseSpec::Within(_) = &c.spec else {
            panic!("expected within clause");
        };
        for (name, expected) in [("a.b.c.D", true), ("a.b.c.d.E", true), ("a.c.D", false)] {
            let ty = TypeDescriptor::builder(name)
                .method(MethodDescriptor::builder("run"))
                .build();
            let run = ty.declared_method("run").unwrap();
            assert_eq!(c.could_match(ty.as_ref()), expected, "{name}");
            assert_eq!(
                c.match_method(&MethodContext::new(run.as_ref())).matched,
                expected,
                "{name}"
            );
        }
    }

    #[test]
    fn test_within_uses_declaring_type() {
        let base = TypeDescriptor::builder("lib.Base")
            .method(MethodDescriptor::builder("inherited"))
            .build();
        let sub = TypeDescriptor::builder("app.Sub")
            .extends(base)
            .method(MethodDescriptor::builder("own"))
            .build();
        let c = clause("within(app..*)");
        let methods = sub.methods();
        let own = methods.iter().find(|m| m.name() == "own").unwrap();
        let inherited = methods.iter().find(|m| m.name() == "inherited").unwrap();

        assert!(c.could_match(sub.as_ref()));
        assert!(c.match_method(&MethodContext::on(sub.clone(), own.as_ref())).matched);
        assert!(!c.match_method(&MethodContext::on(sub.clone(), inherited.as_ref())).matched);
    }
}
