//! PEP 508 environment markers: a small boolean predicate language over
//! target-environment variables such as `python_version` and `sys_platform`.
//!
//! The resolver only needs the `evaluate` capability; the grammar here is
//! the standard one: comparisons (`==`, `!=`, `<`, `<=`, `>`, `>=`, `in`,
//! `not in`) over variables and quoted literals, combined with `and`/`or`
//! and parentheses.

use std::collections::BTreeMap;
use std::fmt;

use crate::version::PyVersion;

/// One side of a marker comparison.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum MarkerOperand {
    /// An environment variable, e.g. `python_version`.
    Variable(String),
    /// A quoted string literal.
    Literal(String),
}

impl MarkerOperand {
    fn resolve(&self, env: &BTreeMap<String, String>) -> String {
        match self {
            MarkerOperand::Variable(name) => env.get(name).cloned().unwrap_or_default(),
            MarkerOperand::Literal(value) => value.clone(),
        }
    }
}

/// Comparison operator inside a marker.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum MarkerOp {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    In,
    NotIn,
}

/// A parsed marker expression.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Marker {
    Or(Vec<Marker>),
    And(Vec<Marker>),
    Compare {
        lhs: MarkerOperand,
        op: MarkerOp,
        rhs: MarkerOperand,
    },
}

impl Marker {
    /// Parse a marker expression; the error names the offending position.
    pub fn parse(input: &str) -> Result<Self, String> {
        let tokens = tokenize(input)?;
        let mut parser = Parser { tokens, pos: 0 };
        let marker = parser.or_expr()?;
        match parser.peek() {
            None => Ok(marker),
            Some(t) => Err(format!("unexpected trailing token {t:?}")),
        }
    }

    /// Evaluate against a mapping of environment variable values.
    ///
    /// Comparisons where both sides parse as PEP 440 versions use version
    /// ordering; everything else compares lexically. `in`/`not in` are
    /// substring tests.
    pub fn evaluate(&self, env: &BTreeMap<String, String>) -> bool {
        match self {
            Marker::Or(terms) => terms.iter().any(|t| t.evaluate(env)),
            Marker::And(terms) => terms.iter().all(|t| t.evaluate(env)),
            Marker::Compare { lhs, op, rhs } => {
                let left = lhs.resolve(env);
                let right = rhs.resolve(env);
                compare(&left, *op, &right)
            }
        }
    }
}

fn compare(left: &str, op: MarkerOp, right: &str) -> bool {
    if let MarkerOp::In = op {
        return right.contains(left);
    }
    if let MarkerOp::NotIn = op {
        return !right.contains(left);
    }

    let ordering = match (PyVersion::parse(left), PyVersion::parse(right)) {
        (Some(l), Some(r)) => l.cmp(&r),
        _ => left.cmp(right),
    };

    match op {
        MarkerOp::Equal => ordering.is_eq(),
        MarkerOp::NotEqual => ordering.is_ne(),
        MarkerOp::Less => ordering.is_lt(),
        MarkerOp::LessEqual => ordering.is_le(),
        MarkerOp::Greater => ordering.is_gt(),
        MarkerOp::GreaterEqual => ordering.is_ge(),
        MarkerOp::In | MarkerOp::NotIn => unreachable!("handled above"),
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Or(terms) => {
                let mut first = true;
                for term in terms {
                    if !first {
                        f.write_str(" or ")?;
                    }
                    write!(f, "{term}")?;
                    first = false;
                }
                Ok(())
            }
            Marker::And(terms) => {
                let mut first = true;
                for term in terms {
                    if !first {
                        f.write_str(" and ")?;
                    }
                    match term {
                        Marker::Or(_) => write!(f, "({term})")?,
                        _ => write!(f, "{term}")?,
                    }
                    first = false;
                }
                Ok(())
            }
            Marker::Compare { lhs, op, rhs } => {
                let op = match op {
                    MarkerOp::Equal => "==",
                    MarkerOp::NotEqual => "!=",
                    MarkerOp::Less => "<",
                    MarkerOp::LessEqual => "<=",
                    MarkerOp::Greater => ">",
                    MarkerOp::GreaterEqual => ">=",
                    MarkerOp::In => "in",
                    MarkerOp::NotIn => "not in",
                };
                write!(f, "{lhs} {op} {rhs}")
            }
        }
    }
}

impl fmt::Display for MarkerOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerOperand::Variable(name) => f.write_str(name),
            MarkerOperand::Literal(value) => write!(f, "\"{value}\""),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Literal(String),
    Op(MarkerOp),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '\'' | '"' => {
                let quote = c;
                let start = i + 1;
                let mut j = start;
                while j < chars.len() && chars[j] != quote {
                    j += 1;
                }
                if j == chars.len() {
                    return Err("unterminated string literal".to_string());
                }
                tokens.push(Token::Literal(chars[start..j].iter().collect()));
                i = j + 1;
            }
            '=' | '!' | '<' | '>' => {
                let two: String = chars[i..(i + 2).min(chars.len())].iter().collect();
                let (op, len) = match two.as_str() {
                    "==" => (MarkerOp::Equal, 2),
                    "!=" => (MarkerOp::NotEqual, 2),
                    "<=" => (MarkerOp::LessEqual, 2),
                    ">=" => (MarkerOp::GreaterEqual, 2),
                    _ if c == '<' => (MarkerOp::Less, 1),
                    _ if c == '>' => (MarkerOp::Greater, 1),
                    _ => return Err(format!("invalid operator at {i}")),
                };
                tokens.push(Token::Op(op));
                i += len;
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "in" => Token::Op(MarkerOp::In),
                    "not" => Token::Not,
                    _ => Token::Ident(word),
                });
            }
            _ => return Err(format!("unexpected character {c:?} at {i}")),
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

    fn or_expr(&mut self) -> Result<Marker, String> {
        let first = self.and_expr()?;
        let mut terms = vec![first];
        while matches!(self.peek(), Some(Token::Or)) {
            self.next();
            terms.push(self.and_expr()?);
        }
        Ok(match terms.len() {
            1 => terms.remove(0),
            _ => Marker::Or(terms),
        })
    }

    fn and_expr(&mut self) -> Result<Marker, String> {
        let first = self.atom()?;
        let mut terms = vec![first];
        while matches!(self.peek(), Some(Token::And)) {
            self.next();
            terms.push(self.atom()?);
        }
        Ok(match terms.len() {
            1 => terms.remove(0),
            _ => Marker::And(terms),
        })
    }

    fn atom(&mut self) -> Result<Marker, String> {
        if matches!(self.peek(), Some(Token::LParen)) {
            self.next();
            let inner = self.or_expr()?;
            match self.next() {
                Some(Token::RParen) => return Ok(inner),
                _ => return Err("expected ')'".to_string()),
            }
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Marker, String> {
        let lhs = self.operand()?;
        let op = match self.next() {
            Some(Token::Op(op)) => op,
            Some(Token::Not) => match self.next() {
                Some(Token::Op(MarkerOp::In)) => MarkerOp::NotIn,
                other => return Err(format!("expected 'in' after 'not', got {other:?}")),
            },
            other => return Err(format!("expected comparison operator, got {other:?}")),
        };
        let rhs = self.operand()?;
        Ok(Marker::Compare { lhs, op, rhs })
    }

    fn operand(&mut self) -> Result<MarkerOperand, String> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(MarkerOperand::Variable(name)),
            Some(Token::Literal(value)) => Ok(MarkerOperand::Literal(value)),
            other => Err(format!("expected variable or literal, got {other:?}")),
        }
    }
}
