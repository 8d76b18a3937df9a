//! Pointcut expressions.
//!
//! An expression string is processed in two steps:
//!
//! 1. [`token::tokenize`] splits it into clause tokens and connectives
//!    (`&&`, `||`, `!`, parentheses), keeping source offsets.
//! 2. [`parser::Parser`] builds a [`Node`] tree over a flat list of parsed
//!    [`Clause`]s. Named pointcut references are expanded in place, with
//!    their arguments substituted into the referenced expression.
//!
//! Precedence is `!` over `&&` over `||`; both binary connectives associate
//! to the left and parentheses override.

pub mod parser;
pub mod token;

use std::fmt;

use crate::pattern::{NamePattern, TypePattern};
use weft_core::{Modifier, TypeRef};

pub use parser::{ParseContext, Parser};
pub use token::{RawClause, Token, TokenKind, tokenize};

/// The kind of a clause as written in the expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    Execution,
    Within,
    Target,
    This,
    Args,
    AtTarget,
    AtWithin,
    AtAnnotation,
    AtArgs,
    AtParams,
    Reference,
}

impl ClauseKind {
    /// Maps a clause keyword to its kind. Unknown plain identifiers are
    /// named pointcut references; unknown `@` keywords are rejected.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "execution" => Self::Execution,
            "within" => Self::Within,
            "target" => Self::Target,
            "this" => Self::This,
            "args" => Self::Args,
            "@target" => Self::AtTarget,
            "@within" => Self::AtWithin,
            "@annotation" => Self::AtAnnotation,
            "@args" => Self::AtArgs,
            "@params" => Self::AtParams,
            k if !k.starts_with('@') => Self::Reference,
            _ => return None,
        })
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Execution => "execution",
            Self::Within => "within",
            Self::Target => "target",
            Self::This => "this",
            Self::Args => "args",
            Self::AtTarget => "@target",
            Self::AtWithin => "@within",
            Self::AtAnnotation => "@annotation",
            Self::AtArgs => "@args",
            Self::AtParams => "@params",
            Self::Reference => "<reference>",
        }
    }
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A declared pointcut parameter a clause can bind.
#[derive(Debug, Clone)]
pub struct Binding {
    /// Name of the advice parameter.
    pub name: String,
    /// Declared type of the advice parameter.
    pub declared_type: TypeRef,
}

/// A type constraint or a binding, for `target`/`this`.
#[derive(Debug, Clone)]
pub enum TypeOrBinding {
    Type(TypePattern),
    Binding(Binding),
}

/// One entry of an `args(...)` list.
#[derive(Debug, Clone)]
pub enum ArgPattern {
    /// `*`: exactly one argument, not bound.
    Any,
    /// `..`: any number of arguments, not bound.
    Rest,
    /// One argument whose type matches the pattern.
    Type(TypePattern),
    /// One argument bound to a declared parameter.
    Binding(Binding),
}

/// One entry of an `execution(...)` parameter list.
#[derive(Debug, Clone)]
pub enum ParamPattern {
    /// `..`
    Rest,
    Type(TypePattern),
}

/// The signature shape of an `execution(...)` clause.
#[derive(Debug, Clone)]
pub struct SignaturePattern {
    pub modifiers: Vec<Modifier>,
    pub return_type: TypePattern,
    /// `None` when the pattern names no declaring type.
    pub declaring_type: Option<TypePattern>,
    pub name: NamePattern,
    pub params: Vec<ParamPattern>,
}

/// The annotation an `@kind(...)` clause tests for.
#[derive(Debug, Clone)]
pub struct AnnotationPattern {
    /// Annotation type name to look up.
    pub annotation: String,
    /// Parameter receiving the annotation, if any.
    pub binding: Option<String>,
}

/// What a clause matches, per clause kind.
#[derive(Debug, Clone)]
pub enum ClauseSpec {
    Execution(SignaturePattern),
    Within(TypePattern),
    Target(TypeOrBinding),
    This(TypeOrBinding),
    Args(Vec<ArgPattern>),
    AtTarget(AnnotationPattern),
    AtWithin(AnnotationPattern),
    AtAnnotation(AnnotationPattern),
    AtArgs(AnnotationPattern),
    AtParams(AnnotationPattern),
}

/// A parsed leaf clause.
#[derive(Debug, Clone)]
pub struct Clause {
    /// The clause text as written (after reference substitution).
    pub text: String,
    pub spec: ClauseSpec,
}

impl Clause {
    pub fn kind(&self) -> ClauseKind {
        match &self.spec {
            ClauseSpec::Execution(_) => ClauseKind::Execution,
            ClauseSpec::Within(_) => ClauseKind::Within,
            ClauseSpec::Target(_) => ClauseKind::Target,
            ClauseSpec::This(_) => ClauseKind::This,
            ClauseSpec::Args(_) => ClauseKind::Args,
            ClauseSpec::AtTarget(_) => ClauseKind::AtTarget,
            ClauseSpec::AtWithin(_) => ClauseKind::AtWithin,
            ClauseSpec::AtAnnotation(_) => ClauseKind::AtAnnotation,
            ClauseSpec::AtArgs(_) => ClauseKind::AtArgs,
            ClauseSpec::AtParams(_) => ClauseKind::AtParams,
        }
    }

    /// Names of the parameters this clause binds.
    pub fn binding_names(&self) -> Vec<&str> {
        match &self.spec {
            ClauseSpec::Execution(_) | ClauseSpec::Within(_) => Vec::new(),
            ClauseSpec::Target(t) | ClauseSpec::This(t) => match t {
                TypeOrBinding::Binding(b) => vec![b.name.as_str()],
                TypeOrBinding::Type(_) => Vec::new(),
            },
            ClauseSpec::Args(args) => args
                .iter()
                .filter_map(|a| match a {
                    ArgPattern::Binding(b) => Some(b.name.as_str()),
                    _ => None,
                })
                .collect(),
            ClauseSpec::AtTarget(a)
            | ClauseSpec::AtWithin(a)
            | ClauseSpec::AtAnnotation(a)
            | ClauseSpec::AtArgs(a)
            | ClauseSpec::AtParams(a) => a.binding.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Boolean structure over the clause list.
#[derive(Debug, Clone)]
pub enum Node {
    /// Index into [`PointcutExpression::clauses`].
    Clause(usize),
    Not(Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    /// An expanded named pointcut.
    Reference { name: String, body: Box<Node> },
}

/// An immutable, fully parsed pointcut expression.
#[derive(Debug, Clone)]
pub struct PointcutExpression {
    source: String,
    tokens: Vec<Token>,
    clauses: Vec<Clause>,
    root: Node,
}

impl PointcutExpression {
    pub(crate) fn new(
        source: String,
        tokens: Vec<Token>,
        clauses: Vec<Clause>,
        root: Node,
    ) -> Self {
        Self {
            source,
            tokens,
            clauses,
            root,
        }
    }

    /// The expression text as given.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Top-level tokens of the expression, in source order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// All leaf clauses, references expanded.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn root(&self) -> &Node {
        &self.root
    }
}

impl fmt::Display for PointcutExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
