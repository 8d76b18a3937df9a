//! Shadow matches and join-point parameter binding.
//!
//! A [`ShadowMatch`] records, for one matched method, where each declared
//! pointcut parameter takes its value from. It is computed once when the
//! match is committed and then read on every intercepted call, where
//! [`ShadowMatch::bind`] turns it into a fresh list of [`PointcutParameter`]s.

use std::fmt;

use weft_core::{AnnotatedElement, BoundValue, Instance, MethodKey, MethodRef, TypeRef};

use crate::error::{JoinPointError, JoinPointResult};
use crate::expression::Binding;

/// Where the value of a bound parameter comes from at a join point.
///
/// Annotation variants carry the annotation type name to look up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingSource {
    /// The actual argument at this index.
    PositionalArg(usize),
    /// The proxied object.
    Target,
    /// The proxy the caller holds.
    Proxy,
    /// An annotation on the invoked method.
    AnnotationOnMethod(String),
    /// An annotation declared directly on the method's declaring type.
    AnnotationOnDeclaringType(String),
    /// An annotation on the proxied object's runtime type or its supertypes.
    AnnotationOnTargetType(String),
    /// An annotation on the type of some argument.
    AnnotationOnAnyParamType(String),
    /// An annotation on some declared parameter.
    AnnotationOnAnyParamValue(String),
}

impl BindingSource {
    pub fn is_positional(&self) -> bool {
        matches!(self, Self::PositionalArg(_))
    }
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PositionalArg(index) => write!(f, "args[{index}]"),
            Self::Target => f.write_str("target"),
            Self::Proxy => f.write_str("this"),
            Self::AnnotationOnMethod(a) => write!(f, "@annotation({a})"),
            Self::AnnotationOnDeclaringType(a) => write!(f, "@within({a})"),
            Self::AnnotationOnTargetType(a) => write!(f, "@target({a})"),
            Self::AnnotationOnAnyParamType(a) => write!(f, "@args({a})"),
            Self::AnnotationOnAnyParamValue(a) => write!(f, "@params({a})"),
        }
    }
}

/// A pointcut parameter bound for one join point.
#[derive(Debug, Clone)]
pub struct PointcutParameter {
    name: String,
    declared_type: TypeRef,
    value: BoundValue,
}

impl PointcutParameter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> &TypeRef {
        &self.declared_type
    }

    pub fn value(&self) -> &BoundValue {
        &self.value
    }

    pub fn into_value(self) -> BoundValue {
        self.value
    }
}

/// Matching metadata recorded for one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowMatch {
    method: MethodKey,
    bindings: Vec<(String, BindingSource)>,
}

impl ShadowMatch {
    pub fn new(method: MethodKey, bindings: Vec<(String, BindingSource)>) -> Self {
        Self { method, bindings }
    }

    pub fn method(&self) -> &MethodKey {
        &self.method
    }

    /// All bindings, in declared parameter order.
    pub fn bindings(&self) -> &[(String, BindingSource)] {
        &self.bindings
    }

    pub fn source(&self, parameter: &str) -> Option<&BindingSource> {
        self.bindings
            .iter()
            .find(|(name, _)| name == parameter)
            .map(|(_, source)| source)
    }

    /// Parameters bound by argument position (`args(...)`).
    pub fn positional(&self) -> impl Iterator<Item = (&str, usize)> {
        self.bindings.iter().filter_map(|(name, source)| match source {
            BindingSource::PositionalArg(index) => Some((name.as_str(), *index)),
            _ => None,
        })
    }

    /// Parameters bound through target, proxy or annotation lookup.
    pub fn non_positional(&self) -> impl Iterator<Item = (&str, &BindingSource)> {
        self.bindings
            .iter()
            .filter(|(_, source)| !source.is_positional())
            .map(|(name, source)| (name.as_str(), source))
    }

    /// Resolves every declared parameter against one invocation.
    pub fn bind(
        &self,
        parameters: &[Binding],
        method: &MethodRef,
        args: &[Instance],
        proxy: &Instance,
        proxied: &Instance,
    ) -> JoinPointResult<Vec<PointcutParameter>> {
        parameters
            .iter()
            .map(|parameter| {
                let source =
                    self.source(&parameter.name)
                        .ok_or_else(|| JoinPointError::UnboundParameter {
                            method: self.method.clone(),
                            parameter: parameter.name.clone(),
                        })?;
                let value = self.resolve(source, &parameter.name, method, args, proxy, proxied)?;
                Ok(PointcutParameter {
                    name: parameter.name.clone(),
                    declared_type: parameter.declared_type.clone(),
                    value,
                })
            })
            .collect()
    }

    fn resolve(
        &self,
        source: &BindingSource,
        parameter: &str,
        method: &MethodRef,
        args: &[Instance],
        proxy: &Instance,
        proxied: &Instance,
    ) -> JoinPointResult<BoundValue> {
        let missing = |annotation: &str| JoinPointError::MissingAnnotation {
            method: self.method.clone(),
            parameter: parameter.to_string(),
            annotation: annotation.to_string(),
        };

        let annotation = match source {
            BindingSource::PositionalArg(index) => {
                return args
                    .get(*index)
                    .cloned()
                    .map(BoundValue::Instance)
                    .ok_or_else(|| JoinPointError::ArgumentIndexOutOfRange {
                        method: self.method.clone(),
                        index: *index,
                        len: args.len(),
                    });
            }
            BindingSource::Target => return Ok(BoundValue::Instance(proxied.clone())),
            BindingSource::Proxy => return Ok(BoundValue::Instance(proxy.clone())),
            BindingSource::AnnotationOnMethod(a) => {
                method.annotation(a).cloned().ok_or_else(|| missing(a))
            }
            BindingSource::AnnotationOnDeclaringType(a) => {
                let declaring = method.declaring_type().ok_or_else(|| {
                    JoinPointError::MissingTypeInformation {
                        method: self.method.clone(),
                    }
                })?;
                declaring.annotation(a).cloned().ok_or_else(|| missing(a))
            }
            BindingSource::AnnotationOnTargetType(a) => {
                proxied.type_info().find_annotation(a).ok_or_else(|| missing(a))
            }
            BindingSource::AnnotationOnAnyParamType(a) => args
                .iter()
                .map(|arg| arg.type_info())
                .chain(method.parameters().iter().map(|p| p.type_info()))
                .find_map(|ty| ty.find_annotation(a))
                .ok_or_else(|| missing(a)),
            BindingSource::AnnotationOnAnyParamValue(a) => method
                .parameters()
                .iter()
                .find_map(|p| p.annotation(a).cloned())
                .ok_or_else(|| missing(a)),
        }?;
        Ok(BoundValue::Annotation(annotation))
    }
}
