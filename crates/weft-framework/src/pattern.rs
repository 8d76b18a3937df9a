//! Lexical wildcard patterns for names and types.
//!
//! - `*` matches any run of characters except `.`.
//! - `..` matches a single `.` or any dotted run that starts and ends with
//!   `.`, i.e. any number of package segments.
//! - A trailing `+` on a type pattern also accepts subtypes.
//! - A type pattern without a `.` is compared against the simple name only.

use std::fmt;

use weft_core::TypeInfo;
use weft_core::simple_name;

/// A wildcard pattern over a single identifier (e.g. a method name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    raw: String,
}

impl NamePattern {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Pattern that accepts every name.
    pub fn any() -> Self {
        Self::new("*")
    }

    pub fn matches(&self, name: &str) -> bool {
        wildcard_match(self.raw.as_bytes(), name.as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A wildcard pattern over (possibly qualified) type names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePattern {
    raw: String,
    body: String,
    subtypes: bool,
    qualified: bool,
}

impl TypePattern {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let (body, subtypes) = match raw.strip_suffix('+') {
            Some(body) => (body.to_string(), true),
            None => (raw.clone(), false),
        };
        let qualified = body.contains('.');
        Self {
            raw,
            body,
            subtypes,
            qualified,
        }
    }

    /// Pattern that accepts every type.
    pub fn any() -> Self {
        Self::new("*")
    }

    /// A pattern that only accepts `type_name` and its subtypes.
    pub fn subtype_of(type_name: &str) -> Self {
        Self::new(format!("{type_name}+"))
    }

    /// Returns `true` for `*` (and `*+`).
    pub fn is_any(&self) -> bool {
        self.body == "*"
    }

    /// Whether a trailing `+` was given.
    pub fn includes_subtypes(&self) -> bool {
        self.subtypes
    }

    /// Matches a type name lexically, ignoring the `+` suffix.
    pub fn matches_name(&self, type_name: &str) -> bool {
        let candidate = if self.qualified {
            type_name
        } else {
            simple_name(type_name)
        };
        wildcard_match(self.body.as_bytes(), candidate.as_bytes())
    }

    /// Matches a type, walking supertypes when the pattern has a `+`.
    pub fn matches_type(&self, ty: &dyn TypeInfo) -> bool {
        if self.subtypes {
            ty.any_in_hierarchy(&|name| self.matches_name(name))
        } else {
            self.matches_name(ty.name())
        }
    }

    /// Returns `true` if `ty` or any of its supertypes matches lexically.
    pub fn matches_hierarchy(&self, ty: &dyn TypeInfo) -> bool {
        ty.any_in_hierarchy(&|name| self.matches_name(name))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for TypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Backtracking matcher for `*` and `..`.
fn wildcard_match(pattern: &[u8], text: &[u8]) -> bool {
    match pattern {
        [] => text.is_empty(),
        [b'.', b'.', rest @ ..] => {
            if text.first() != Some(&b'.') {
                return false;
            }
            // `..` consumes up to and including any `.` of the remaining text
            text.iter()
                .enumerate()
                .filter(|(_, c)| **c == b'.')
                .any(|(i, _)| wildcard_match(rest, &text[i + 1..]))
        }
        [b'*', rest @ ..] => {
            for i in 0..=text.len() {
                if i > 0 && text[i - 1] == b'.' {
                    break;
                }
                if wildcard_match(rest, &text[i..]) {
                    return true;
                }
            }
            false
        }
        [c, rest @ ..] => text.first() == Some(c) && wildcard_match(rest, &text[1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::TypeDescriptor;

    #[test]
    fn test_star_stops_at_separator() {
        let p = NamePattern::new("get*");
        assert!(p.matches("getName"));
        assert!(p.matches("get"));
        assert!(!p.matches("setName"));
        assert!(NamePattern::any().matches("anything"));
    }

    #[test]
    fn test_recursive_package_wildcard() {
        let p = TypePattern::new("a.b..*");
        assert!(p.matches_name("a.b.c.D"));
        assert!(p.matches_name("a.b.c.d.E"));
        assert!(p.matches_name("a.b.D"));
        assert!(!p.matches_name("a.c.D"));
        assert!(!p.matches_name("a.bc.D"));
    }

    #[test]
    fn test_single_segment_star_in_qualified_pattern() {
        let p = TypePattern::new("a.*.Service");
        assert!(p.matches_name("a.b.Service"));
        assert!(!p.matches_name("a.b.c.Service"));
    }

    #[test]
    fn test_unqualified_pattern_uses_simple_name() {
        let p = TypePattern::new("String");
        assert!(p.matches_name("java.lang.String"));
        assert!(p.matches_name("String"));
        assert!(!p.matches_name("java.lang.StringBuilder"));
        assert!(TypePattern::any().matches_name("java.lang.Object"));
    }

    #[test]
    fn test_subtype_pattern() {
        let base = TypeDescriptor::named("demo.Service");
        let sub = TypeDescriptor::builder("demo.ServiceImpl")
            .extends(base)
            .build();

        assert!(TypePattern::new("demo.Service+").matches_type(sub.as_ref()));
        assert!(!TypePattern::new("demo.Service").matches_type(sub.as_ref()));
        assert!(TypePattern::new("demo.Service").matches_hierarchy(sub.as_ref()));
        assert!(TypePattern::subtype_of("Service").includes_subtypes());
    }
}
