// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service property filter expressions.
//!
//! A filter is a boolean predicate over a service registration's property
//! map, e.g. `price < 10 and (tier == "gold" or not deprecated)`. The
//! grammar supports the comparison operators `== != < <= > >=`, the
//! combinators `and`/`or`/`not` (also `&&`, `||`, `!`), parentheses, and
//! bare keys asserting truthiness. Literals are numbers, quoted strings,
//! `true`, `false`, and `null`.
//!
//! Filters are evaluated against properties only; a missing key makes every
//! comparison on it false.

use armature_core::{ArmatureError, ServiceProperties};
use serde_json::Value;

/// Comparison operator in a filter atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `key OP literal`
    Compare {
        key: String,
        op: CompareOp,
        value: Value,
    },
    /// A bare key: matches if the property is present and truthy.
    Truthy { key: String },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    /// Parse a filter expression.
    pub fn parse(input: &str) -> Result<Self, ArmatureError> {
        let tokens = tokenize(input).map_err(|reason| ArmatureError::InvalidFilter {
            expression: input.to_string(),
            reason,
        })?;
        let mut parser = Parser { tokens, pos: 0 };
        let filter = parser.or_expr().map_err(|reason| ArmatureError::InvalidFilter {
            expression: input.to_string(),
            reason,
        })?;
        if parser.pos != parser.tokens.len() {
            return Err(ArmatureError::InvalidFilter {
                expression: input.to_string(),
                reason: format!("unexpected trailing input at token {}", parser.pos + 1),
            });
        }
        Ok(filter)
    }

    /// Evaluate the filter against a property map.
    pub fn matches(&self, properties: &ServiceProperties) -> bool {
        match self {
            Filter::Compare { key, op, value } => properties
                .get(key)
                .map(|actual| compare(actual, *op, value))
                .unwrap_or(false),
            Filter::Truthy { key } => properties.get(key).map(is_truthy).unwrap_or(false),
            Filter::And(clauses) => clauses.iter().all(|c| c.matches(properties)),
            Filter::Or(clauses) => clauses.iter().any(|c| c.matches(properties)),
            Filter::Not(inner) => !inner.matches(properties),
        }
    }
}

/// Compare a property value against a literal.
///
/// Numbers compare numerically, strings lexicographically, booleans and
/// null support equality only. Mismatched types never match (not even
/// `!=`, to keep "absent or wrong type" uniformly false).
fn compare(actual: &Value, op: CompareOp, expected: &Value) -> bool {
    use std::cmp::Ordering;

    let ordering = match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => {
            match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            }
        }
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        (Value::Bool(a), Value::Bool(b)) => match op {
            CompareOp::Eq | CompareOp::Ne => Some(if a == b {
                Ordering::Equal
            } else {
                Ordering::Less
            }),
            _ => None,
        },
        (Value::Null, Value::Null) => match op {
            CompareOp::Eq | CompareOp::Ne => Some(Ordering::Equal),
            _ => None,
        },
        _ => None,
    };

    let Some(ordering) = ordering else {
        return false;
    };

    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Literal(Value),
    Op(CompareOp),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' => {
                chars.next();
                if chars.next_if_eq(&'=').is_none() {
                    return Err("expected `==`, found lone `=`".to_string());
                }
                tokens.push(Token::Op(CompareOp::Eq));
            }
            '!' => {
                chars.next();
                if chars.next_if_eq(&'=').is_some() {
                    tokens.push(Token::Op(CompareOp::Ne));
                } else {
                    tokens.push(Token::Not);
                }
            }
            '<' => {
                chars.next();
                if chars.next_if_eq(&'=').is_some() {
                    tokens.push(Token::Op(CompareOp::Le));
                } else {
                    tokens.push(Token::Op(CompareOp::Lt));
                }
            }
            '>' => {
                chars.next();
                if chars.next_if_eq(&'=').is_some() {
                    tokens.push(Token::Op(CompareOp::Ge));
                } else {
                    tokens.push(Token::Op(CompareOp::Gt));
                }
            }
            '&' => {
                chars.next();
                if chars.next_if_eq(&'&').is_none() {
                    return Err("expected `&&`, found lone `&`".to_string());
                }
                tokens.push(Token::And);
            }
            '|' => {
                chars.next();
                if chars.next_if_eq(&'|').is_none() {
                    return Err("expected `||`, found lone `|`".to_string());
                }
                tokens.push(Token::Or);
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some(ch) if ch == quote => break,
                        Some(ch) => s.push(ch),
                        None => return Err("unterminated string literal".to_string()),
                    }
                }
                tokens.push(Token::Literal(Value::String(s)));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut num = String::new();
                num.push(c);
                chars.next();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' || d == 'e' || d == 'E' || d == '+' || d == '-'
                    {
                        num.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let parsed: serde_json::Number = num
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .ok_or_else(|| format!("invalid number `{num}`"))?;
                tokens.push(Token::Literal(Value::Number(parsed)));
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut word = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' || d == '.' || d == '-' {
                        word.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match word.as_str() {
                    "and" => tokens.push(Token::And),
                    "or" => tokens.push(Token::Or),
                    "not" => tokens.push(Token::Not),
                    "true" => tokens.push(Token::Literal(Value::Bool(true))),
                    "false" => tokens.push(Token::Literal(Value::Bool(false))),
                    "null" => tokens.push(Token::Literal(Value::Null)),
                    _ => tokens.push(Token::Ident(word)),
                }
            }
            other => return Err(format!("unexpected character `{other}`")),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn or_expr(&mut self) -> Result<Filter, String> {
        let mut clauses = vec![self.and_expr()?];
        while matches!(self.peek(), Some(Token::Or)) {
            self.next();
            clauses.push(self.and_expr()?);
        }
        Ok(if clauses.len() == 1 {
            clauses.pop().expect("one clause")
        } else {
            Filter::Or(clauses)
        })
    }

    fn and_expr(&mut self) -> Result<Filter, String> {
        let mut clauses = vec![self.unary_expr()?];
        while matches!(self.peek(), Some(Token::And)) {
            self.next();
            clauses.push(self.unary_expr()?);
        }
        Ok(if clauses.len() == 1 {
            clauses.pop().expect("one clause")
        } else {
            Filter::And(clauses)
        })
    }

    fn unary_expr(&mut self) -> Result<Filter, String> {
        match self.peek() {
            Some(Token::Not) => {
                self.next();
                Ok(Filter::Not(Box::new(self.unary_expr()?)))
            }
            Some(Token::LParen) => {
                self.next();
                let inner = self.or_expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("expected `)`".to_string()),
                }
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<Filter, String> {
        let key = match self.next() {
            Some(Token::Ident(key)) => key,
            Some(other) => return Err(format!("expected a property name, found {other:?}")),
            None => return Err("expected a property name, found end of input".to_string()),
        };

        // Bare key: truthiness test.
        let Some(Token::Op(_)) = self.peek() else {
            return Ok(Filter::Truthy { key });
        };

        let Some(Token::Op(op)) = self.next() else {
            unreachable!("peeked an operator");
        };

        match self.next() {
            Some(Token::Literal(value)) => Ok(Filter::Compare { key, op, value }),
            Some(other) => Err(format!("expected a literal after operator, found {other:?}")),
            None => Err("expected a literal after operator, found end of input".to_string()),
        }
    }
}
