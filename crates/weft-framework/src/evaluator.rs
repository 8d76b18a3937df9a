//! Boolean evaluation of a parsed expression.
//!
//! Nodes are evaluated left to right in the order written; `&&` and `||`
//! short-circuit. Expanded named pointcuts evaluate their body in place.
//!
//! At type level a negation cannot be decided (some methods of the type may
//! fail the negated clause while others pass), so `!x` is always `true`
//! there. This keeps `could_match` conservative.

use tracing::trace;
use weft_core::TypeInfo;

use crate::expression::{Node, PointcutExpression};
use crate::matchers::{ClauseMatcher, MatchOutcome, MethodContext};

/// Evaluates one expression against types and methods.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'e> {
    expression: &'e PointcutExpression,
}

impl<'e> Evaluator<'e> {
    pub fn new(expression: &'e PointcutExpression) -> Self {
        Self { expression }
    }

    /// Type-level pre-filter.
    pub fn could_match(&self, ty: &dyn TypeInfo) -> bool {
        self.could_match_node(self.expression.root(), ty)
    }

    /// Method-level evaluation, collecting the bindings of matched clauses.
    pub fn evaluate(&self, ctx: &MethodContext<'_>) -> MatchOutcome {
        self.evaluate_node(self.expression.root(), ctx)
    }

    fn could_match_node(&self, node: &Node, ty: &dyn TypeInfo) -> bool {
        match node {
            Node::Clause(index) => {
                let clause = &self.expression.clauses()[*index];
                let result = clause.could_match(ty);
                trace!(clause = %clause, ty = ty.name(), result, "Type-level clause test");
                result
            }
            Node::Not(_) => true,
            Node::And(l, r) => self.could_match_node(l, ty) && self.could_match_node(r, ty),
            Node::Or(l, r) => self.could_match_node(l, ty) || self.could_match_node(r, ty),
            Node::Reference { body, .. } => self.could_match_node(body, ty),
        }
    }

    fn evaluate_node(&self, node: &Node, ctx: &MethodContext<'_>) -> MatchOutcome {
        match node {
            Node::Clause(index) => {
                let clause = &self.expression.clauses()[*index];
                let outcome = clause.match_method(ctx);
                trace!(
                    clause = %clause,
                    method = ctx.method().name(),
                    matched = outcome.matched,
                    "Method-level clause test"
                );
                outcome
            }
            Node::Not(inner) => MatchOutcome::from_bool(!self.evaluate_node(inner, ctx).matched),
            Node::And(l, r) => {
                let mut left = self.evaluate_node(l, ctx);
                if !left.matched {
                    return MatchOutcome::no_match();
                }
                let right = self.evaluate_node(r, ctx);
                if !right.matched {
                    return MatchOutcome::no_match();
                }
                left.bindings.extend(right.bindings);
                left
            }
            Node::Or(l, r) => {
                let left = self.evaluate_node(l, ctx);
                if left.matched {
                    return left;
                }
                self.evaluate_node(r, ctx)
            }
            Node::Reference { body, .. } => self.evaluate_node(body, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{ParseContext, Parser};
    use weft_core::{Annotation, MethodDescriptor, MethodInfo, TypeDescriptor, TypeRef};

    fn aspect() -> TypeRef {
        TypeDescriptor::builder("demo.Aspect")
            .method(
                MethodDescriptor::builder("pointcut1")
                    .annotated(Annotation::new("Pointcut").with("value", "execution(* m*(..))")),
            )
            .method(
                MethodDescriptor::builder("pointcut2")
                    .annotated(Annotation::new("Pointcut").with("value", "within(demo.Service)")),
            )
            .build()
    }

    fn service() -> TypeRef {
        TypeDescriptor::builder("demo.Service")
            .method(MethodDescriptor::builder("m1"))
            .method(MethodDescriptor::builder("run"))
            .build()
    }

    fn matches(expression: &str, ty: &TypeRef, method: &str) -> bool {
        let expr = Parser::new(ParseContext::new().aspect(aspect()))
            .parse(expression)
            .unwrap();
        let method = ty.methods().into_iter().find(|m| m.name() == method).unwrap();
        Evaluator::new(&expr)
            .evaluate(&MethodContext::new(method.as_ref()))
            .matched
    }

    #[test]
    fn test_composition_of_references() {
        let ty = service();
        for method in ["m1", "run"] {
            let p1 = matches("pointcut1()", &ty, method);
            let p2 = matches("pointcut2()", &ty, method);
            assert_eq!(matches("pointcut1() && pointcut2()", &ty, method), p1 && p2);
            assert_eq!(matches("pointcut1() || pointcut2()", &ty, method), p1 || p2);
            assert_eq!(matches("!pointcut1()", &ty, method), !p1);
        }
        assert!(matches("pointcut1()", &ty, "m1"));
        assert!(!matches("pointcut1()", &ty, "run"));
    }

    #[test]
    fn test_negation_is_conservative_at_type_level() {
        let expr = Parser::new(ParseContext::new())
            .parse("!within(demo.Service)")
            .unwrap();
        let ty = service();
        assert!(Evaluator::new(&expr).could_match(ty.as_ref()));

        let expr = Parser::new(ParseContext::new())
            .parse("within(demo.Other) && !within(demo.Service)")
            .unwrap();
        assert!(!Evaluator::new(&expr).could_match(ty.as_ref()));
    }
}
