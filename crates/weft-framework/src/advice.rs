//! Advice kinds and advice-method signature validation.
//!
//! An advice method is annotated with one of the five advice annotations.
//! Its parameters fall into four roles:
//!
//! ```text
//! around(ProceedingJoinPoint pjp, String s, Audited audit)
//!        ^^^^^^^^^^^^^^^^^^^^^^^  ^^^^^^^^^^^^^^^^^^^^^^^^^
//!        join-point slot          pointcut parameters (argNames)
//!
//! afterReturning(JoinPoint jp, String s, Object result)   returning = "result"
//!                ^^^^^^^^^^^^  ^^^^^^^^  ^^^^^^^^^^^^^
//!                join point    pointcut  returned-value slot
//! ```
//!
//! [`AdviceSignature::derive`] checks the kind-specific rules and produces
//! the ordered list of pointcut parameters plus a slot layout used later to
//! assemble the advice call.

use std::fmt;

use serde::{Deserialize, Serialize};
use weft_core::{Annotation, MethodInfo, TypeInfo, TypeRef, simple_name};

use crate::error::{AdviceError, AdviceResult};
use crate::expression::Binding;

// =============================================================================
// AdviceKind
// =============================================================================

/// The five advice kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceKind {
    Before,
    After,
    AfterReturning,
    AfterThrowing,
    Around,
}

impl AdviceKind {
    /// All kinds, in the order advice annotations are looked up.
    pub const ALL: [AdviceKind; 5] = [
        Self::Around,
        Self::Before,
        Self::After,
        Self::AfterReturning,
        Self::AfterThrowing,
    ];

    /// The annotation type name marking this kind.
    pub fn annotation<'n>(&self, names: &'n AnnotationNames) -> &'n str {
        match self {
            Self::Before => &names.before,
            Self::After => &names.after,
            Self::AfterReturning => &names.after_returning,
            Self::AfterThrowing => &names.after_throwing,
            Self::Around => &names.around,
        }
    }
}

impl fmt::Display for AdviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Before => "before",
            Self::After => "after",
            Self::AfterReturning => "after-returning",
            Self::AfterThrowing => "after-throwing",
            Self::Around => "around",
        })
    }
}

// =============================================================================
// AnnotationNames
// =============================================================================

/// Annotation and type names the engine recognizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationNames {
    /// Marks aspect beans.
    pub aspect: String,
    /// Marks named pointcut methods.
    pub pointcut: String,
    pub before: String,
    pub after: String,
    pub after_returning: String,
    pub after_throwing: String,
    pub around: String,
    /// Orders aspects within a scope (`value` attribute, ascending).
    pub order: String,
    /// Type of a plain join-point parameter.
    pub join_point: String,
    /// Type of the proceeding join-point parameter of around advice.
    pub proceeding_join_point: String,
}

impl Default for AnnotationNames {
    fn default() -> Self {
        Self {
            aspect: "Aspect".to_string(),
            pointcut: "Pointcut".to_string(),
            before: "Before".to_string(),
            after: "After".to_string(),
            after_returning: "AfterReturning".to_string(),
            after_throwing: "AfterThrowing".to_string(),
            around: "Around".to_string(),
            order: "Order".to_string(),
            join_point: "JoinPoint".to_string(),
            proceeding_join_point: "ProceedingJoinPoint".to_string(),
        }
    }
}

impl AnnotationNames {
    /// The advice kind `annotation` marks, if any.
    pub fn advice_kind(&self, annotation: &Annotation) -> Option<AdviceKind> {
        AdviceKind::ALL
            .into_iter()
            .find(|kind| annotation.is(kind.annotation(self)))
    }
}

/// Returns `true` if `ty` or a supertype is named `name` (simple names
/// compare when `name` is unqualified).
fn is_named(ty: &dyn TypeInfo, name: &str) -> bool {
    let qualified = name.contains('.');
    ty.any_in_hierarchy(&|n| n == name || (!qualified && simple_name(n) == name))
}

// =============================================================================
// AdviceSignature
// =============================================================================

/// Role of one advice-method parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSlot {
    /// The (proceeding) join-point handle.
    JoinPoint,
    /// The pointcut parameter at this index.
    Pointcut(usize),
    /// The returned value of after-returning advice.
    Returning,
    /// The thrown error of after-throwing advice.
    Throwing,
}

/// A validated advice method.
#[derive(Debug, Clone)]
pub struct AdviceSignature {
    kind: AdviceKind,
    pointcut: String,
    parameters: Vec<Binding>,
    slots: Vec<ParamSlot>,
    returning: Option<Binding>,
    throwing: Option<Binding>,
}

impl AdviceSignature {
    /// Validates `method` as advice of `kind` declared by `annotation`.
    pub fn derive(
        kind: AdviceKind,
        annotation: &Annotation,
        method: &dyn MethodInfo,
        names: &AnnotationNames,
    ) -> AdviceResult<Self> {
        let method_name = || method.key().to_string();

        let pointcut = annotation
            .str_attribute("pointcut")
            .filter(|p| !p.trim().is_empty())
            .or_else(|| annotation.str_attribute("value"))
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AdviceError::MissingPointcut {
                kind,
                method: method_name(),
            })?
            .to_string();

        let params = method.parameters();
        let first_is = |name: &str| {
            params
                .first()
                .is_some_and(|p| is_named(p.type_info().as_ref(), name))
        };
        let proceeding = first_is(&names.proceeding_join_point);

        let skip = match kind {
            AdviceKind::Around if proceeding => 1,
            AdviceKind::Around => {
                return Err(AdviceError::MissingProceedingJoinPoint {
                    method: method_name(),
                });
            }
            _ if proceeding => {
                return Err(AdviceError::ProceedingJoinPointNotAllowed {
                    kind,
                    method: method_name(),
                });
            }
            _ if first_is(&names.join_point) => 1,
            _ => 0,
        };
        let bindable = &params[skip..];

        let arg_names: Vec<String> = match annotation.str_attribute("argNames") {
            Some(list) if !list.trim().is_empty() => {
                list.split(',').map(|n| n.trim().to_string()).collect()
            }
            _ => bindable.iter().map(|p| p.name().to_string()).collect(),
        };
        if arg_names.len() != bindable.len() {
            return Err(AdviceError::ArgNamesMismatch {
                method: method_name(),
                expected: bindable.len(),
                found: arg_names.len(),
            });
        }

        let reserved = |attribute: &str, role: &'static str, applies: bool| {
            match annotation.str_attribute(attribute).map(str::trim) {
                Some(name) if applies && !name.is_empty() => {
                    if arg_names.iter().any(|n| n == name) {
                        Ok(Some(name.to_string()))
                    } else {
                        Err(AdviceError::UnknownReservedName {
                            method: method_name(),
                            role,
                            name: name.to_string(),
                        })
                    }
                }
                _ => Ok(None),
            }
        };
        let returning = reserved("returning", "returning", kind == AdviceKind::AfterReturning)?;
        let throwing = reserved("throwing", "throwing", kind == AdviceKind::AfterThrowing)?;

        let mut slots = vec![ParamSlot::JoinPoint; skip];
        let mut parameters = Vec::new();
        let mut returning_binding = None;
        let mut throwing_binding = None;
        for (name, param) in arg_names.into_iter().zip(bindable) {
            let binding = Binding {
                name,
                declared_type: param.type_info().clone(),
            };
            if returning.as_deref() == Some(binding.name.as_str()) {
                slots.push(ParamSlot::Returning);
                returning_binding = Some(binding);
            } else if throwing.as_deref() == Some(binding.name.as_str()) {
                slots.push(ParamSlot::Throwing);
                throwing_binding = Some(binding);
            } else {
                slots.push(ParamSlot::Pointcut(parameters.len()));
                parameters.push(binding);
            }
        }

        Ok(Self {
            kind,
            pointcut,
            parameters,
            slots,
            returning: returning_binding,
            throwing: throwing_binding,
        })
    }

    pub fn kind(&self) -> AdviceKind {
        self.kind
    }

    /// The pointcut expression text.
    pub fn pointcut(&self) -> &str {
        &self.pointcut
    }

    /// Pointcut parameters in declaration order.
    pub fn parameters(&self) -> &[Binding] {
        &self.parameters
    }

    /// One slot per advice-method parameter.
    pub fn slots(&self) -> &[ParamSlot] {
        &self.slots
    }

    pub fn returning(&self) -> Option<&Binding> {
        self.returning.as_ref()
    }

    pub fn throwing(&self) -> Option<&Binding> {
        self.throwing.as_ref()
    }

    /// Declared type of the returning/throwing parameter, if any.
    pub fn outcome_type(&self) -> Option<&TypeRef> {
        self.returning
            .as_ref()
            .or(self.throwing.as_ref())
            .map(|b| &b.declared_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{MethodBuilder, MethodDescriptor, MethodRef, TypeDescriptor};

    fn string() -> TypeRef {
        TypeDescriptor::named("java.lang.String")
    }

    fn pjp() -> TypeRef {
        let jp = TypeDescriptor::named("org.weft.JoinPoint");
        TypeDescriptor::builder("org.weft.ProceedingJoinPoint")
            .extends(jp)
            .build()
    }

    fn advice(builder: MethodBuilder) -> (TypeRef, MethodRef) {
        let ty = TypeDescriptor::builder("demo.LogAspect").method(builder).build();
        let method = ty.declared_methods().remove(0);
        (ty as TypeRef, method)
    }

    fn derive(
        kind: AdviceKind,
        annotation: Annotation,
        builder: MethodBuilder,
    ) -> AdviceResult<AdviceSignature> {
        let (_ty, method) = advice(builder);
        AdviceSignature::derive(kind, &annotation, method.as_ref(), &AnnotationNames::default())
    }

    fn pointcut(kind: &str) -> Annotation {
        Annotation::new(kind).with("pointcut", "execution(* *(..)) && args(s)")
    }

    #[test]
    fn test_around_requires_proceeding_join_point() {
        let err = derive(
            AdviceKind::Around,
            pointcut("Around"),
            MethodDescriptor::builder("around").param("s", string()),
        )
        .unwrap_err();
        assert!(matches!(err, AdviceError::MissingProceedingJoinPoint { .. }));

        let err = derive(
            AdviceKind::Around,
            pointcut("Around"),
            MethodDescriptor::builder("around"),
        )
        .unwrap_err();
        assert!(matches!(err, AdviceError::MissingProceedingJoinPoint { .. }));

        let sig = derive(
            AdviceKind::Around,
            pointcut("Around").with("argNames", "pjp,s"),
            MethodDescriptor::builder("around")
                .param("pjp", pjp())
                .param("s", string()),
        );
        // argNames lists the join point too: one name too many
        assert!(matches!(sig, Err(AdviceError::ArgNamesMismatch { expected: 1, found: 2, .. })));

        let sig = derive(
            AdviceKind::Around,
            pointcut("Around"),
            MethodDescriptor::builder("around")
                .param("pjp", pjp())
                .param("s", string()),
        )
        .unwrap();
        assert_eq!(sig.slots(), &[ParamSlot::JoinPoint, ParamSlot::Pointcut(0)]);
        assert_eq!(sig.parameters()[0].name, "s");
    }

    #[test]
    fn test_before_rejects_proceeding_join_point() {
        let err = derive(
            AdviceKind::Before,
            pointcut("Before"),
            MethodDescriptor::builder("before")
                .param("pjp", pjp())
                .param("s", string()),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AdviceError::ProceedingJoinPointNotAllowed { kind: AdviceKind::Before, .. }
        ));
    }

    #[test]
    fn test_plain_join_point_is_skipped() {
        let sig = derive(
            AdviceKind::Before,
            pointcut("Before").with("argNames", "s"),
            MethodDescriptor::builder("before")
                .param("jp", TypeDescriptor::named("org.weft.JoinPoint"))
                .param("arg1", string()),
        )
        .unwrap();
        assert_eq!(sig.slots(), &[ParamSlot::JoinPoint, ParamSlot::Pointcut(0)]);
        assert_eq!(sig.parameters()[0].name, "s");
        assert_eq!(sig.pointcut(), "execution(* *(..)) && args(s)");
    }

    #[test]
    fn test_reserved_names_are_excluded() {
        let sig = derive(
            AdviceKind::AfterReturning,
            pointcut("AfterReturning").with("returning", "result"),
            MethodDescriptor::builder("afterReturning")
                .param("s", string())
                .param("result", string()),
        )
        .unwrap();
        assert_eq!(sig.parameters().len(), 1);
        assert_eq!(sig.slots(), &[ParamSlot::Pointcut(0), ParamSlot::Returning]);
        assert_eq!(sig.returning().map(|b| b.name.as_str()), Some("result"));

        let sig = derive(
            AdviceKind::AfterThrowing,
            Annotation::new("AfterThrowing")
                .with("value", "within(demo..*)")
                .with("throwing", "ex"),
            MethodDescriptor::builder("afterThrowing")
                .param("ex", TypeDescriptor::named("java.lang.Exception")),
        )
        .unwrap();
        assert!(sig.parameters().is_empty());
        assert_eq!(sig.slots(), &[ParamSlot::Throwing]);
        assert_eq!(sig.outcome_type().map(|t| t.name()), Some("java.lang.Exception"));

        let err = derive(
            AdviceKind::AfterThrowing,
            pointcut("AfterThrowing").with("throwing", "missing"),
            MethodDescriptor::builder("afterThrowing").param("s", string()),
        )
        .unwrap_err();
        assert!(matches!(err, AdviceError::UnknownReservedName { role: "throwing", .. }));
    }

    #[test]
    fn test_missing_pointcut() {
        let err = derive(
            AdviceKind::After,
            Annotation::new("After"),
            MethodDescriptor::builder("after"),
        )
        .unwrap_err();
        assert!(matches!(err, AdviceError::MissingPointcut { kind: AdviceKind::After, .. }));
    }

    #[test]
    fn test_advice_kind_from_annotation() {
        let names = AnnotationNames::default();
        assert_eq!(
            names.advice_kind(&Annotation::new("org.weft.AfterReturning")),
            Some(AdviceKind::AfterReturning)
        );
        assert_eq!(names.advice_kind(&Annotation::new("Pointcut")), None);
    }
}
