//! Annotation instances attached to types, methods and parameters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single annotation instance.
///
/// Annotations are identified by their type name. Attribute values are kept
/// as JSON values so that hosts can carry arbitrary literal payloads
/// (`value`, `argNames`, `returning`, ...) without a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    type_name: String,
    #[serde(default)]
    attributes: Map<String, Value>,
}

impl Annotation {
    /// Creates an annotation of the given type with no attributes.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: Map::new(),
        }
    }

    /// Adds an attribute (builder pattern).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns the annotation type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns `true` if this annotation is of the given type.
    ///
    /// Names compare exactly; when either side is unqualified only the simple
    /// names are compared, so `Aspect` matches `org.example.Aspect`.
    pub fn is(&self, type_name: &str) -> bool {
        if self.type_name == type_name {
            return true;
        }
        if !self.type_name.contains('.') || !type_name.contains('.') {
            return simple_name(&self.type_name) == simple_name(type_name);
        }
        false
    }

    /// Returns the raw attribute value.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Returns the attribute as a string slice, if it is a string.
    pub fn str_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Returns the attribute as an integer, if it is one.
    pub fn i64_attribute(&self, key: &str) -> Option<i64> {
        self.attributes.get(key).and_then(Value::as_i64)
    }

    /// Returns all attributes.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

/// Returns the last `.`-separated segment of a qualified name.
pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_matches_simple_and_qualified_names() {
        let anno = Annotation::new("org.example.Aspect");
        assert!(anno.is("org.example.Aspect"));
        assert!(anno.is("Aspect"));
        assert!(!anno.is("org.other.Aspect"));
        assert!(!anno.is("Pointcut"));

        let short = Annotation::new("Aspect");
        assert!(short.is("org.example.Aspect"));
    }

    #[test]
    fn test_attributes() {
        let anno = Annotation::new("Before")
            .with("value", "execution(* *(..))")
            .with("order", 3);
        assert_eq!(anno.str_attribute("value"), Some("execution(* *(..))"));
        assert_eq!(anno.i64_attribute("order"), Some(3));
        assert_eq!(anno.str_attribute("order"), None);
        assert!(anno.attribute("missing").is_none());
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(simple_name("a.b.C"), "C");
        assert_eq!(simple_name("C"), "C");
    }
}
