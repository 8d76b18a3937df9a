//! Tokenizer for pointcut expressions.

use std::fmt;

use super::ClauseKind;
use crate::error::{ParseError, ParseResult};

/// A clause as it appears in the source: keyword plus raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawClause {
    /// `execution`, `@within`, a pointcut name, ...
    pub keyword: String,
    pub kind: ClauseKind,
    /// Text between the clause's outer parentheses, trimmed.
    pub body: String,
}

impl fmt::Display for RawClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.keyword, self.body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Clause(RawClause),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clause(clause) => clause.fmt(f),
            Self::And => f.write_str("&&"),
            Self::Or => f.write_str("||"),
            Self::Not => f.write_str("!"),
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
        }
    }
}

/// A token with its byte offset in the expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '.')
}

/// Splits an expression into clause tokens and connectives.
///
/// Clause bodies are captured verbatim (balanced parentheses included) and
/// interpreted later by the parser.
pub fn tokenize(expression: &str) -> ParseResult<Vec<Token>> {
    let chars: Vec<(usize, char)> = expression.char_indices().collect();
    let offset_at = |i: usize| chars.get(i).map_or(expression.len(), |(o, _)| *o);
    let unexpected = |offset: usize, found: char| ParseError::UnexpectedCharacter {
        expression: expression.to_string(),
        offset,
        found,
    };

    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (offset, c) = chars[i];
        let single = |kind: TokenKind| Token { kind, offset };
        match c {
            c if c.is_whitespace() => i += 1,
            '&' | '|' => {
                if chars.get(i + 1).map(|(_, n)| *n) != Some(c) {
                    return Err(unexpected(offset, c));
                }
                tokens.push(single(if c == '&' {
                    TokenKind::And
                } else {
                    TokenKind::Or
                }));
                i += 2;
            }
            '!' => {
                tokens.push(single(TokenKind::Not));
                i += 1;
            }
            '(' => {
                tokens.push(single(TokenKind::LParen));
                i += 1;
            }
            ')' => {
                tokens.push(single(TokenKind::RParen));
                i += 1;
            }
            c if c == '@' || is_ident_char(c) => {
                i += 1;
                while i < chars.len() && is_ident_char(chars[i].1) {
                    i += 1;
                }
                let keyword = &expression[offset..offset_at(i)];
                while i < chars.len() && chars[i].1.is_whitespace() {
                    i += 1;
                }
                if chars.get(i).map(|(_, n)| *n) != Some('(') {
                    return Err(ParseError::UnexpectedToken {
                        expression: expression.to_string(),
                        offset: offset_at(i),
                        found: expression[offset_at(i)..].chars().take(1).collect(),
                        expected: "'(' after clause name",
                    });
                }
                let open = offset_at(i);
                i += 1;
                let body_start = offset_at(i);
                let mut depth = 1;
                while depth > 0 {
                    match chars.get(i).map(|(_, n)| *n) {
                        None => {
                            return Err(ParseError::UnbalancedParentheses {
                                expression: expression.to_string(),
                                offset: open,
                            });
                        }
                        Some('(') => depth += 1,
                        Some(')') => depth -= 1,
                        Some(_) => {}
                    }
                    i += 1;
                }
                // `i` is one past the closing parenthesis
                let body = expression[body_start..offset_at(i - 1)].trim().to_string();
                let kind =
                    ClauseKind::from_keyword(keyword).ok_or_else(|| ParseError::UnknownClause {
                        expression: expression.to_string(),
                        offset,
                        keyword: keyword.to_string(),
                    })?;
                tokens.push(Token {
                    kind: TokenKind::Clause(RawClause {
                        keyword: keyword.to_string(),
                        kind,
                        body,
                    }),
                    offset,
                });
            }
            other => return Err(unexpected(offset, other)),
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(expression: &str) -> Vec<TokenKind> {
        tokenize(expression)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_clause_and_connective() {
        let tokens = kinds("execution(* pkg.Type.m(..)) && args(s1,s2)");
        assert_eq!(tokens.len(), 3);
        match &tokens[0] {
            TokenKind::Clause(c) => {
                assert_eq!(c.kind, ClauseKind::Execution);
                assert_eq!(c.body, "* pkg.Type.m(..)");
            }
            other => panic!("unexpected token {other:?}"),
        }
        assert_eq!(tokens[1], TokenKind::And);
        match &tokens[2] {
            TokenKind::Clause(c) => {
                assert_eq!(c.kind, ClauseKind::Args);
                assert_eq!(c.body, "s1,s2");
            }
            other => panic!("unexpected token {other:?}"),
        }
    }

    #[test]
    fn test_tokenize_references_and_negation() {
        let tokens = kinds("!pointcut1() || pointcut2(x, y)");
        assert_eq!(tokens[0], TokenKind::Not);
        assert!(matches!(
            &tokens[1],
            TokenKind::Clause(c) if c.kind == ClauseKind::Reference && c.body.is_empty()
        ));
        assert_eq!(tokens[2], TokenKind::Or);
        assert!(matches!(
            &tokens[3],
            TokenKind::Clause(c) if c.keyword == "pointcut2" && c.body == "x, y"
        ));
    }

    #[test]
    fn test_tokenize_grouping_and_annotations() {
        let tokens = kinds("(@within(pkg.Anno) || @annotation(a)) && within(a.b..*)");
        assert_eq!(tokens[0], TokenKind::LParen);
        assert!(matches!(&tokens[1], TokenKind::Clause(c) if c.kind == ClauseKind::AtWithin));
        assert!(matches!(&tokens[3], TokenKind::Clause(c) if c.kind == ClauseKind::AtAnnotation));
        assert_eq!(tokens[4], TokenKind::RParen);
        assert!(matches!(&tokens[6], TokenKind::Clause(c) if c.body == "a.b..*"));
    }

    #[test]
    fn test_tokenize_offsets() {
        let tokens = tokenize("within(a) && this(b)").unwrap();
        assert_eq!(tokens[0].offset, 0);
        assert_eq!(tokens[1].offset, 10);
        assert_eq!(tokens[2].offset, 13);
    }

    #[test]
    fn test_tokenize_errors() {
        assert!(matches!(
            tokenize("execution(* m(..)"),
            Err(ParseError::UnbalancedParentheses { offset: 9, .. })
        ));
        assert!(matches!(
            tokenize("@bogus(x)"),
            Err(ParseError::UnknownClause { keyword, .. }) if keyword == "@bogus"
        ));
        assert!(matches!(
            tokenize("within(a) & within(b)"),
            Err(ParseError::UnexpectedCharacter { found: '&', .. })
        ));
        assert!(matches!(
            tokenize("within"),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }
}
