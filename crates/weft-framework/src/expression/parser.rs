//! Recursive-descent parser for pointcut expressions.
//!
//! ```text
//! expr   := and ( '||' and )*
//! and    := unary ( '&&' unary )*
//! unary  := '!' unary | '(' expr ')' | clause
//! clause := keyword '(' body ')'
//! ```
//!
//! Identifiers inside clause bodies are resolved against a scope: at the top
//! level the scope holds the declared pointcut parameters; inside an expanded
//! named pointcut it maps the pointcut's own `argNames` to whatever the
//! caller passed (a caller parameter or a type pattern). A lower-case simple
//! name that is not in scope is an undeclared parameter; anything else is a
//! type pattern.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};
use weft_core::{AnnotatedElement, MethodRef, Modifier, TypeRef};

use super::token::{RawClause, Token, TokenKind, tokenize};
use super::{
    AnnotationPattern, ArgPattern, Binding, Clause, ClauseKind, ClauseSpec, Node, ParamPattern,
    PointcutExpression, SignaturePattern, TypeOrBinding,
};
use crate::error::{ParseError, ParseResult};
use crate::pattern::{NamePattern, TypePattern};

/// Default annotation type marking named pointcut methods.
pub const DEFAULT_POINTCUT_ANNOTATION: &str = "Pointcut";

// =============================================================================
// ParseContext
// =============================================================================

/// Everything outside the expression text that parsing depends on.
#[derive(Debug, Clone)]
pub struct ParseContext {
    aspect: Option<TypeRef>,
    parameters: Vec<Binding>,
    pointcut_annotation: String,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self {
            aspect: None,
            parameters: Vec::new(),
            pointcut_annotation: DEFAULT_POINTCUT_ANNOTATION.to_string(),
        }
    }
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the aspect type named pointcut references are resolved against.
    pub fn aspect(mut self, aspect: TypeRef) -> Self {
        self.aspect = Some(aspect);
        self
    }

    /// Sets the declared pointcut parameters.
    pub fn parameters(mut self, parameters: Vec<Binding>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Overrides the annotation type that marks named pointcuts.
    pub fn pointcut_annotation(mut self, name: impl Into<String>) -> Self {
        self.pointcut_annotation = name.into();
        self
    }

    pub fn declared_parameters(&self) -> &[Binding] {
        &self.parameters
    }
}

// =============================================================================
// Parser
// =============================================================================

/// Parses expression strings within one [`ParseContext`].
#[derive(Debug, Clone, Default)]
pub struct Parser {
    context: ParseContext,
}

impl Parser {
    pub fn new(context: ParseContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ParseContext {
        &self.context
    }

    /// Parses `expression`, expanding named pointcuts and checking that every
    /// declared parameter is bound exactly once, unconditionally.
    pub fn parse(&self, expression: &str) -> ParseResult<PointcutExpression> {
        let scope: Scope = self
            .context
            .parameters
            .iter()
            .map(|b| (b.name.clone(), ScopeEntry::Param(b.clone())))
            .collect();

        let mut session = Session {
            context: &self.context,
            clauses: Vec::new(),
            stack: Vec::new(),
        };
        let (tokens, root) = session.parse_expression(expression, &scope)?;
        let clauses = session.clauses;

        check_bindings(expression, &root, &clauses, &self.context.parameters)?;

        debug!(
            expression = %expression,
            clauses = clauses.len(),
            "Parsed pointcut expression"
        );
        Ok(PointcutExpression::new(
            expression.to_string(),
            tokens,
            clauses,
            root,
        ))
    }
}

#[derive(Debug, Clone)]
enum ScopeEntry {
    Param(Binding),
    Type(String),
}

type Scope = HashMap<String, ScopeEntry>;

struct Cursor<'t> {
    expression: &'t str,
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Cursor<'t> {
    fn peek(&self) -> Option<&'t TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, token: Option<&Token>, expected: &'static str) -> ParseError {
        let (offset, found) = match token {
            Some(t) => (t.offset, t.kind.to_string()),
            None => (self.expression.len(), "end of expression".to_string()),
        };
        ParseError::UnexpectedToken {
            expression: self.expression.to_string(),
            offset,
            found,
            expected,
        }
    }
}

/// State shared across one top-level parse, references included.
struct Session<'c> {
    context: &'c ParseContext,
    clauses: Vec<Clause>,
    /// `Type.pointcut` keys of the references being expanded.
    stack: Vec<String>,
}

impl Session<'_> {
    fn parse_expression(
        &mut self,
        expression: &str,
        scope: &Scope,
    ) -> ParseResult<(Vec<Token>, Node)> {
        let tokens = tokenize(expression)?;
        if tokens.is_empty() {
            return Err(ParseError::Empty);
        }
        let mut cursor = Cursor {
            expression,
            tokens: &tokens,
            pos: 0,
        };
        let root = self.parse_or(&mut cursor, scope)?;
        if let Some(token) = cursor.next() {
            if token.kind == TokenKind::RParen {
                return Err(ParseError::UnbalancedParentheses {
                    expression: expression.to_string(),
                    offset: token.offset,
                });
            }
            return Err(cursor.unexpected(Some(token), "'&&', '||' or end of expression"));
        }
        Ok((tokens, root))
    }

    fn parse_or(&mut self, cursor: &mut Cursor<'_>, scope: &Scope) -> ParseResult<Node> {
        let mut left = self.parse_and(cursor, scope)?;
        while cursor.peek() == Some(&TokenKind::Or) {
            cursor.next();
            let right = self.parse_and(cursor, scope)?;
            left = Node::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self, cursor: &mut Cursor<'_>, scope: &Scope) -> ParseResult<Node> {
        let mut left = self.parse_unary(cursor, scope)?;
        while cursor.peek() == Some(&TokenKind::And) {
            cursor.next();
            let right = self.parse_unary(cursor, scope)?;
            left = Node::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self, cursor: &mut Cursor<'_>, scope: &Scope) -> ParseResult<Node> {
        let Some(token) = cursor.next().cloned() else {
            return Err(cursor.unexpected(None, "a clause, '!' or '('"));
        };
        match token.kind {
            TokenKind::Not => Ok(Node::Not(Box::new(self.parse_unary(cursor, scope)?))),
            TokenKind::LParen => {
                let inner = self.parse_or(cursor, scope)?;
                match cursor.next() {
                    Some(t) if t.kind == TokenKind::RParen => Ok(inner),
                    _ => Err(ParseError::UnbalancedParentheses {
                        expression: cursor.expression.to_string(),
                        offset: token.offset,
                    }),
                }
            }
            TokenKind::Clause(raw) => self.clause(&raw, cursor.expression, scope),
            TokenKind::RParen => Err(ParseError::UnbalancedParentheses {
                expression: cursor.expression.to_string(),
                offset: token.offset,
            }),
            TokenKind::And | TokenKind::Or => {
                Err(cursor.unexpected(Some(&token), "a clause, '!' or '('"))
            }
        }
    }

    fn clause(&mut self, raw: &RawClause, expression: &str, scope: &Scope) -> ParseResult<Node> {
        if raw.kind == ClauseKind::Reference {
            return self.expand_reference(raw, expression, scope);
        }
        let spec = clause_spec(raw, expression, scope)?;
        trace!(clause = %raw, "Parsed clause");
        self.clauses.push(Clause {
            text: raw.to_string(),
            spec,
        });
        Ok(Node::Clause(self.clauses.len() - 1))
    }

    fn expand_reference(
        &mut self,
        raw: &RawClause,
        expression: &str,
        scope: &Scope,
    ) -> ParseResult<Node> {
        let context = self.context;
        let unknown = || ParseError::UnknownPointcut {
            expression: expression.to_string(),
            name: raw.keyword.clone(),
        };
        let aspect = context.aspect.as_ref().ok_or_else(unknown)?;
        let method = find_pointcut(aspect, &raw.keyword, &context.pointcut_annotation)
            .ok_or_else(unknown)?;

        let key = format!("{}.{}", method.declaring_type_name(), method.name());
        if let Some(start) = self.stack.iter().position(|k| *k == key) {
            let mut chain = self.stack[start..].to_vec();
            chain.push(key);
            return Err(ParseError::ReferenceCycle {
                chain: chain.join(" -> "),
            });
        }

        let annotation = method
            .annotation(&context.pointcut_annotation)
            .ok_or_else(unknown)?;
        let body = annotation
            .str_attribute("value")
            .or_else(|| annotation.str_attribute("pointcut"))
            .ok_or_else(|| {
                ParseError::invalid_pattern(
                    expression,
                    raw.to_string(),
                    "named pointcut has no expression",
                )
            })?
            .to_string();

        let declared: Vec<String> = match annotation.str_attribute("argNames") {
            Some(names) => split_list(names).into_iter().map(str::to_string).collect(),
            None => method
                .parameters()
                .iter()
                .map(|p| p.name().to_string())
                .collect(),
        };
        let passed = split_list(&raw.body);
        if passed.len() != declared.len() {
            return Err(ParseError::PointcutArity {
                expression: expression.to_string(),
                name: raw.keyword.clone(),
                expected: declared.len(),
                found: passed.len(),
            });
        }

        let mut inner = Scope::new();
        for (name, arg) in declared.into_iter().zip(passed) {
            let entry = match lookup(arg, scope, expression)? {
                Some(entry) => entry.clone(),
                None if is_type_text(arg) => ScopeEntry::Type(arg.to_string()),
                None => {
                    return Err(ParseError::invalid_pattern(
                        expression,
                        raw.to_string(),
                        format!("'{arg}' is not a parameter name or type pattern"),
                    ));
                }
            };
            inner.insert(name, entry);
        }

        trace!(pointcut = %key, body = %body, "Expanding named pointcut");
        self.stack.push(key);
        let (_, node) = self.parse_expression(&body, &inner)?;
        self.stack.pop();

        Ok(Node::Reference {
            name: raw.keyword.clone(),
            body: Box::new(node),
        })
    }
}

/// Finds a named pointcut method on the aspect hierarchy. `Type.name` is
/// looked up on the matching type, a bare name on the aspect itself.
fn find_pointcut(aspect: &TypeRef, name: &str, annotation: &str) -> Option<MethodRef> {
    let (owner, method_name) = match name.rsplit_once('.') {
        Some((type_name, method_name)) => (find_in_hierarchy(aspect, type_name)?, method_name),
        None => (aspect.clone(), name),
    };
    owner
        .methods()
        .into_iter()
        .find(|m| m.name() == method_name && m.has_annotation(annotation))
}

fn find_in_hierarchy(ty: &TypeRef, name: &str) -> Option<TypeRef> {
    if ty.name() == name || ty.simple_name() == name {
        return Some(ty.clone());
    }
    ty.supertypes()
        .iter()
        .find_map(|s| find_in_hierarchy(s, name))
}

// =============================================================================
// Clause Bodies
// =============================================================================

fn clause_spec(raw: &RawClause, expression: &str, scope: &Scope) -> ParseResult<ClauseSpec> {
    let invalid = |reason: &str| ParseError::invalid_pattern(expression, raw.to_string(), reason);
    let body = raw.body.as_str();

    let single = || -> ParseResult<&str> {
        if body.is_empty() {
            Err(invalid("expected a type pattern or parameter name"))
        } else if !is_type_text(body) {
            Err(invalid("expected a single type pattern or parameter name"))
        } else {
            Ok(body)
        }
    };

    Ok(match raw.kind {
        ClauseKind::Execution => ClauseSpec::Execution(signature(body).map_err(|r| invalid(&r))?),
        ClauseKind::Within => ClauseSpec::Within(TypePattern::new(single()?)),
        ClauseKind::Target => ClauseSpec::Target(type_or_binding(single()?, scope, expression)?),
        ClauseKind::This => ClauseSpec::This(type_or_binding(single()?, scope, expression)?),
        ClauseKind::Args => {
            let mut args = Vec::new();
            for item in split_list(body) {
                args.push(match item {
                    ".." => ArgPattern::Rest,
                    "*" => ArgPattern::Any,
                    _ => match lookup(item, scope, expression)? {
                        Some(ScopeEntry::Param(b)) => ArgPattern::Binding(b.clone()),
                        Some(ScopeEntry::Type(t)) => ArgPattern::Type(TypePattern::new(t.as_str())),
                        None if is_type_text(item) => ArgPattern::Type(TypePattern::new(item)),
                        None => return Err(invalid("malformed argument pattern")),
                    },
                });
            }
            ClauseSpec::Args(args)
        }
        ClauseKind::AtTarget
        | ClauseKind::AtWithin
        | ClauseKind::AtAnnotation
        | ClauseKind::AtArgs
        | ClauseKind::AtParams => {
            let pattern = annotation_pattern(single()?, scope, expression)?;
            match raw.kind {
                ClauseKind::AtTarget => ClauseSpec::AtTarget(pattern),
                ClauseKind::AtWithin => ClauseSpec::AtWithin(pattern),
                ClauseKind::AtAnnotation => ClauseSpec::AtAnnotation(pattern),
                ClauseKind::AtArgs => ClauseSpec::AtArgs(pattern),
                _ => ClauseSpec::AtParams(pattern),
            }
        }
        ClauseKind::Reference => return Err(invalid("reference in clause position")),
    })
}

/// Looks `text` up in scope. A miss is fine for a type pattern but fatal for
/// something that can only be a parameter name.
fn lookup<'s>(
    text: &str,
    scope: &'s Scope,
    expression: &str,
) -> ParseResult<Option<&'s ScopeEntry>> {
    match scope.get(text) {
        Some(entry) => Ok(Some(entry)),
        None if is_parameter_name(text) => Err(ParseError::UndeclaredBinding {
            expression: expression.to_string(),
            name: text.to_string(),
        }),
        None => Ok(None),
    }
}

fn type_or_binding(text: &str, scope: &Scope, expression: &str) -> ParseResult<TypeOrBinding> {
    Ok(match lookup(text, scope, expression)? {
        Some(ScopeEntry::Param(b)) => TypeOrBinding::Binding(b.clone()),
        Some(ScopeEntry::Type(t)) => TypeOrBinding::Type(TypePattern::new(t.as_str())),
        None => TypeOrBinding::Type(TypePattern::new(text)),
    })
}

/// A bound name tests for its declared type; anything else names the
/// annotation type directly.
fn annotation_pattern(
    text: &str,
    scope: &Scope,
    expression: &str,
) -> ParseResult<AnnotationPattern> {
    Ok(match lookup(text, scope, expression)? {
        Some(ScopeEntry::Param(b)) => AnnotationPattern {
            annotation: b.declared_type.name().to_string(),
            binding: Some(b.name.clone()),
        },
        Some(ScopeEntry::Type(t)) => AnnotationPattern {
            annotation: t.clone(),
            binding: None,
        },
        None => AnnotationPattern {
            annotation: text.to_string(),
            binding: None,
        },
    })
}

/// Parses `modifiers* ret [decl.]name(params)`.
fn signature(body: &str) -> Result<SignaturePattern, String> {
    let head_end = match (body.rfind('('), body.ends_with(')')) {
        (Some(open), true) => open,
        _ => return Err("expected a parameter list".to_string()),
    };
    let head: Vec<&str> = body[..head_end].split_whitespace().collect();
    let params_text = &body[head_end + 1..body.len() - 1];

    let [modifiers @ .., return_type, qualified_name] = head.as_slice() else {
        return Err("expected a return type and a method name".to_string());
    };

    let modifiers = modifiers
        .iter()
        .map(|m| Modifier::from_keyword(m).ok_or_else(|| format!("unknown modifier '{m}'")))
        .collect::<Result<Vec<_>, _>>()?;

    if !is_type_text(return_type) {
        return Err(format!("malformed return type '{return_type}'"));
    }

    let (declaring_type, name) = match qualified_name.rsplit_once('.') {
        Some((decl, name)) => {
            // `a.b..m` leaves `a.b.` as the declaring part
            let decl = if decl.ends_with('.') {
                format!("{decl}*")
            } else {
                decl.to_string()
            };
            (Some(TypePattern::new(decl)), name)
        }
        None => (None, *qualified_name),
    };
    if name.is_empty() || !is_type_text(name) {
        return Err(format!("malformed method name '{qualified_name}'"));
    }

    let mut params = Vec::new();
    for item in split_list(params_text) {
        params.push(match item {
            ".." => ParamPattern::Rest,
            t if is_type_text(t) => ParamPattern::Type(TypePattern::new(t)),
            t => return Err(format!("malformed parameter type '{t}'")),
        });
    }

    Ok(SignaturePattern {
        modifiers,
        return_type: TypePattern::new(*return_type),
        declaring_type,
        name: NamePattern::new(name),
        params,
    })
}

fn split_list(text: &str) -> Vec<&str> {
    let text = text.trim();
    if text.is_empty() {
        Vec::new()
    } else {
        text.split(',').map(str::trim).collect()
    }
}

/// Primitive type keywords, the only lower-case simple type names.
const PRIMITIVES: [&str; 9] = [
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// A lower-case simple identifier that is not a primitive type.
fn is_parameter_name(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_lowercase() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '$'))
        && !PRIMITIVES.contains(&text)
}

fn is_type_text(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '.' | '*' | '+' | '[' | ']'))
}

// =============================================================================
// Binding Checks
// =============================================================================

fn check_bindings(
    expression: &str,
    root: &Node,
    clauses: &[Clause],
    parameters: &[Binding],
) -> ParseResult<()> {
    fn walk<'a>(
        expression: &str,
        node: &Node,
        clauses: &'a [Clause],
        negated: bool,
        disjunct: bool,
        seen: &mut HashSet<&'a str>,
    ) -> ParseResult<()> {
        match node {
            Node::Clause(index) => {
                for name in clauses[*index].binding_names() {
                    let (expression, name_owned) = (expression.to_string(), name.to_string());
                    if negated {
                        return Err(ParseError::BindingUnderNegation {
                            expression,
                            name: name_owned,
                        });
                    }
                    if disjunct {
                        return Err(ParseError::BindingUnderDisjunction {
                            expression,
                            name: name_owned,
                        });
                    }
                    if !seen.insert(name) {
                        return Err(ParseError::AmbiguousBinding {
                            expression,
                            name: name_owned,
                        });
                    }
                }
                Ok(())
            }
            Node::Not(inner) => walk(expression, inner, clauses, true, disjunct, seen),
            Node::And(l, r) => {
                walk(expression, l, clauses, negated, disjunct, seen)?;
                walk(expression, r, clauses, negated, disjunct, seen)
            }
            Node::Or(l, r) => {
                walk(expression, l, clauses, negated, true, seen)?;
                walk(expression, r, clauses, negated, true, seen)
            }
            Node::Reference { body, .. } => {
                walk(expression, body, clauses, negated, disjunct, seen)
            }
        }
    }

    let mut seen = HashSet::new();
    walk(expression, root, clauses, false, false, &mut seen)?;

    match parameters.iter().find(|p| !seen.contains(p.name.as_str())) {
        Some(unbound) => Err(ParseError::UnboundParameter {
            expression: expression.to_string(),
            name: unbound.name.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{Annotation, MethodDescriptor, TypeDescriptor};

    fn string() -> TypeRef {
        TypeDescriptor::named("java.lang.String")
    }

    fn params(names: &[&str]) -> Vec<Binding> {
        names
            .iter()
            .map(|n| Binding {
                name: n.to_string(),
                declared_type: string(),
            })
            .collect()
    }

    fn pointcut(name: &str, expression: &str, arg_names: &str) -> weft_core::MethodBuilder {
        let mut anno = Annotation::new("Pointcut").with("value", expression);
        if !arg_names.is_empty() {
            anno = anno.with("argNames", arg_names);
        }
        let mut method = MethodDescriptor::builder(name).annotated(anno);
        for arg in split_list(arg_names) {
            method = method.param(arg, string());
        }
        method
    }

    fn aspect() -> TypeRef {
        TypeDescriptor::builder("demo.LogAspect")
            .method(pointcut("pointcut1", "execution(* demo..*.*(..))", ""))
            .method(pointcut("pointcut2", "args(x, y)", "x,y"))
            .method(pointcut("loopA", "loopB()", ""))
            .method(pointcut("loopB", "within(demo..*) && loopA()", ""))
            .build()
    }

    fn parse(expression: &str, names: &[&str]) -> ParseResult<PointcutExpression> {
        Parser::new(ParseContext::new().aspect(aspect()).parameters(params(names)))
            .parse(expression)
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse("within(a) || within(b) && within(c)", &[]).unwrap();
        match expr.root() {
            Node::Or(left, right) => {
                assert!(matches!(**left, Node::Clause(0)));
                assert!(matches!(**right, Node::And(_, _)));
            }
            other => panic!("unexpected root {other:?}"),
        }
        assert_eq!(expr.clauses().len(), 3);
        assert_eq!(expr.tokens().len(), 5);
    }

    #[test]
    fn test_not_and_grouping() {
        let expr = parse("!within(a) && (within(b) || within(c))", &[]).unwrap();
        match expr.root() {
            Node::And(left, right) => {
                assert!(matches!(**left, Node::Not(_)));
                assert!(matches!(**right, Node::Or(_, _)));
            }
            other => panic!("unexpected root {other:?}"),
        }
    }

    #[test]
    fn test_execution_signature() {
        let expr = parse("execution(public * demo.Service.find*(String, ..))", &[]).unwrap();
        let ClauseSpec::Execution(sig) = &expr.clauses()[0].spec else {
            panic!("expected execution clause");
        };
        assert_eq!(sig.modifiers, vec![Modifier::Public]);
        assert!(sig.return_type.is_any());
        assert_eq!(sig.declaring_type.as_ref().unwrap().as_str(), "demo.Service");
        assert!(sig.name.matches("findAll"));
        assert!(matches!(sig.params[1], ParamPattern::Rest));

        let expr = parse("execution(* m2(String))", &[]).unwrap();
        let ClauseSpec::Execution(sig) = &expr.clauses()[0].spec else {
            panic!("expected execution clause");
        };
        assert!(sig.declaring_type.is_none());
        assert_eq!(sig.params.len(), 1);

        let expr = parse("execution(* demo..find(..))", &[]).unwrap();
        let ClauseSpec::Execution(sig) = &expr.clauses()[0].spec else {
            panic!("expected execution clause");
        };
        assert_eq!(sig.declaring_type.as_ref().unwrap().as_str(), "demo.*");
    }

    #[test]
    fn test_invalid_execution() {
        assert!(matches!(
            parse("execution(m2)", &[]),
            Err(ParseError::InvalidPattern { .. })
        ));
        assert!(matches!(
            parse("execution(volatile * m())", &[]),
            Err(ParseError::InvalidPattern { reason, .. }) if reason.contains("volatile")
        ));
    }

    #[test]
    fn test_args_mix_bindings_and_wildcards() {
        let expr = parse("args(*, s2, String, ..)", &["s2"]).unwrap();
        let ClauseSpec::Args(args) = &expr.clauses()[0].spec else {
            panic!("expected args clause");
        };
        assert!(matches!(args[0], ArgPattern::Any));
        assert!(matches!(&args[1], ArgPattern::Binding(b) if b.name == "s2"));
        assert!(matches!(&args[2], ArgPattern::Type(t) if t.as_str() == "String"));
        assert!(matches!(args[3], ArgPattern::Rest));
    }

    #[test]
    fn test_reference_propagates_arguments() {
        let expr = parse("pointcut1() && pointcut2(s1, s2)", &["s1", "s2"]).unwrap();
        let Node::And(_, right) = expr.root() else {
            panic!("expected conjunction");
        };
        assert!(matches!(&**right, Node::Reference { name, .. } if name == "pointcut2"));
        let ClauseSpec::Args(args) = &expr.clauses()[1].spec else {
            panic!("expected args clause");
        };
        let bound: Vec<&str> = args
            .iter()
            .filter_map(|a| match a {
                ArgPattern::Binding(b) => Some(b.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(bound, vec!["s1", "s2"]);
    }

    #[test]
    fn test_reference_with_type_arguments() {
        let expr = parse("demo.LogAspect.pointcut2(String, *)", &[]).unwrap();
        let ClauseSpec::Args(args) = &expr.clauses()[0].spec else {
            panic!("expected args clause");
        };
        assert!(matches!(&args[0], ArgPattern::Type(t) if t.as_str() == "String"));
        assert!(matches!(&args[1], ArgPattern::Type(t) if t.is_any()));
    }

    #[test]
    fn test_reference_errors() {
        assert!(matches!(
            parse("missing()", &[]),
            Err(ParseError::UnknownPointcut { name, .. }) if name == "missing"
        ));
        assert!(matches!(
            parse("pointcut2(a)", &[]),
            Err(ParseError::PointcutArity { expected: 2, found: 1, .. })
        ));
        assert_eq!(
            parse("loopA()", &[]).unwrap_err(),
            ParseError::ReferenceCycle {
                chain: "demo.LogAspect.loopA -> demo.LogAspect.loopB -> demo.LogAspect.loopA"
                    .to_string()
            }
        );
    }

    #[test]
    fn test_reference_without_aspect() {
        let parser = Parser::new(ParseContext::new());
        assert!(matches!(
            parser.parse("pointcut1()"),
            Err(ParseError::UnknownPointcut { .. })
        ));
    }

    #[test]
    fn test_binding_rules() {
        assert!(matches!(
            parse("!args(s)", &["s"]),
            Err(ParseError::BindingUnderNegation { .. })
        ));
        assert!(matches!(
            parse("args(s) || within(a)", &["s"]),
            Err(ParseError::BindingUnderDisjunction { .. })
        ));
        assert!(matches!(
            parse("args(s) && target(s)", &["s"]),
            Err(ParseError::AmbiguousBinding { .. })
        ));
        assert!(matches!(
            parse("args(s)", &["s", "t"]),
            Err(ParseError::UnboundParameter { name, .. }) if name == "t"
        ));
        assert!(parse("!within(a) && args(s)", &["s"]).is_ok());
    }

    #[test]
    fn test_undeclared_binding_names() {
        let undeclared = |expression: &str, names: &[&str]| match parse(expression, names) {
            Err(ParseError::UndeclaredBinding { name, .. }) => name,
            other => panic!("{expression}: unexpected {other:?}"),
        };
        assert_eq!(undeclared("args(*, s2, s3, *)", &["s2"]), "s3");
        assert_eq!(undeclared("target(svc)", &[]), "svc");
        assert_eq!(undeclared("execution(* *(..)) && this(proxy)", &[]), "proxy");
        assert_eq!(undeclared("@annotation(audit)", &[]), "audit");
        assert_eq!(undeclared("@args(marker)", &[]), "marker");
        assert_eq!(undeclared("pointcut2(s1, other)", &["s1"]), "other");

        // primitives, qualified and capitalised names stay type patterns
        assert!(parse("args(int, long[], String, demo.Entity+)", &[]).is_ok());
        assert!(parse("target(demo.Service) && @within(Traced)", &[]).is_ok());
    }

    #[test]
    fn test_annotation_clause_binding() {
        let anno_type = TypeDescriptor::named("demo.Audited");
        let parser = Parser::new(ParseContext::new().parameters(vec![Binding {
            name: "audit".to_string(),
            declared_type: anno_type,
        }]));
        let expr = parser.parse("@annotation(audit) && @within(demo.Marker)").unwrap();
        let ClauseSpec::AtAnnotation(a) = &expr.clauses()[0].spec else {
            panic!("expected @annotation clause");
        };
        assert_eq!(a.annotation, "demo.Audited");
        assert_eq!(a.binding.as_deref(), Some("audit"));
        let ClauseSpec::AtWithin(a) = &expr.clauses()[1].spec else {
            panic!("expected @within clause");
        };
        assert_eq!(a.annotation, "demo.Marker");
        assert!(a.binding.is_none());
    }

    #[test]
    fn test_grammar_errors() {
        assert_eq!(parse("", &[]).unwrap_err(), ParseError::Empty);
        assert!(matches!(
            parse("(within(a)", &[]),
            Err(ParseError::UnbalancedParentheses { offset: 0, .. })
        ));
        assert!(matches!(
            parse("within(a))", &[]),
            Err(ParseError::UnbalancedParentheses { offset: 9, .. })
        ));
        assert!(matches!(
            parse("within(a) &&", &[]),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse("within(a) within(b)", &[]),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse("within(a b)", &[]),
            Err(ParseError::InvalidPattern { .. })
        ));
    }
}
