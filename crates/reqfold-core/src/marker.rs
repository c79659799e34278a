//! PEP 508 environment markers.
//!
//! Markers are kept as text: the engine never evaluates them against an
//! interpreter, it only combines them and inspects them for `extra` gating.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use reqfold_util::errors::ReqfoldError;

use crate::requirement::canonical_name;

/// A marker expression, or a conjunction of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Marker {
    Expr(String),
    And(Vec<Marker>),
}

impl Marker {
    pub fn parse(input: &str) -> Result<Self, ReqfoldError> {
        let text = input.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return Err(ReqfoldError::InvalidRequirement {
                line: input.to_string(),
                message: "empty marker expression".to_string(),
            });
        }
        let tokens = tokenize(&text).ok_or_else(|| ReqfoldError::InvalidRequirement {
            line: input.to_string(),
            message: "unbalanced quotes or parentheses in marker".to_string(),
        })?;
        if !tokens.iter().any(|t| matches!(t, Token::Op(_))) {
            return Err(ReqfoldError::InvalidRequirement {
                line: input.to_string(),
                message: "marker has no comparison".to_string(),
            });
        }
        Ok(Marker::Expr(text))
    }

    /// Logical AND. An existing conjunction is extended in place rather than
    /// nested, and clauses already present are not repeated.
    pub fn and(self, other: Marker) -> Marker {
        let mut clauses = match self {
            Marker::And(clauses) => clauses,
            expr => vec![expr],
        };
        let incoming = match other {
            Marker::And(more) => more,
            expr => vec![expr],
        };
        for clause in incoming {
            if !clauses.contains(&clause) {
                clauses.push(clause);
            }
        }
        if clauses.len() == 1 {
            clauses.remove(0)
        } else {
            Marker::And(clauses)
        }
    }

    /// Combine two optional markers.
    pub fn and_opt(left: Option<Marker>, right: Option<Marker>) -> Option<Marker> {
        match (left, right) {
            (Some(l), Some(r)) => Some(l.and(r)),
            (l, r) => l.or(r),
        }
    }

    pub fn clauses(&self) -> Vec<&str> {
        match self {
            Marker::Expr(text) => vec![text.as_str()],
            Marker::And(clauses) => clauses.iter().flat_map(Marker::clauses).collect(),
        }
    }

    /// Whether any clause compares against the `extra` variable.
    pub fn mentions_extra(&self) -> bool {
        !self.extra_names().is_empty()
    }

    /// Canonical names of the extras this marker refers to.
    pub fn extra_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for clause in self.clauses() {
            let Some(tokens) = tokenize(clause) else {
                continue;
            };
            for window in tokens.windows(3) {
                match window {
                    [Token::Ident(var), Token::Op(_), Token::Str(value)]
                    | [Token::Str(value), Token::Op(_), Token::Ident(var)]
                        if var == "extra" =>
                    {
                        names.insert(canonical_name(value));
                    }
                    _ => {}
                }
            }
        }
        names
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Expr(text) => f.write_str(text),
            Marker::And(clauses) => {
                let parts: Vec<String> = clauses
                    .iter()
                    .map(|clause| match clause {
                        Marker::Expr(text) if has_top_level_or(text) => format!("({text})"),
                        other => other.to_string(),
                    })
                    .collect();
                f.write_str(&parts.join(" and "))
            }
        }
    }
}

impl FromStr for Marker {
    type Err = ReqfoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Marker::parse(s)
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Op(String),
    Open,
    Close,
}

fn tokenize(text: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut depth = 0i32;
    let mut chars = text.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => {
                depth += 1;
                tokens.push(Token::Open);
            }
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
                tokens.push(Token::Close);
            }
            '\'' | '"' => {
                let rest = &text[start + 1..];
                let end = rest.find(c)?;
                tokens.push(Token::Str(rest[..end].to_string()));
                for _ in 0..rest[..end].chars().count() + 1 {
                    chars.next();
                }
            }
            '<' | '>' | '=' | '!' | '~' => {
                let mut op = c.to_string();
                while let Some(&(_, next)) = chars.peek() {
                    if matches!(next, '<' | '>' | '=' | '!' | '~') {
                        op.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Op(op));
            }
            _ => {
                let mut word = c.to_string();
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_alphanumeric() || matches!(next, '_' | '.' | '-') {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match word.as_str() {
                    "in" | "not" => tokens.push(Token::Op(word)),
                    _ => tokens.push(Token::Ident(word)),
                }
            }
        }
    }
    (depth == 0).then_some(tokens)
}

fn has_top_level_or(text: &str) -> bool {
    let Some(tokens) = tokenize(text) else {
        return false;
    };
    let mut depth = 0;
    tokens.iter().any(|token| {
        match token {
            Token::Open => depth += 1,
            Token::Close => depth -= 1,
            Token::Ident(word) if depth == 0 && word == "or" => return true,
            _ => {}
        }
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(s: &str) -> Marker {
        Marker::parse(s).unwrap()
    }

    #[test]
    fn parse_collapses_whitespace() {
        assert_eq!(
            m("python_version  >=  '3.8'").to_string(),
            "python_version >= '3.8'"
        );
    }

    #[test]
    fn parse_rejects_nonsense() {
        assert!(Marker::parse("").is_err());
        assert!(Marker::parse("python_version").is_err());
        assert!(Marker::parse("os_name == 'nt").is_err());
    }

    #[test]
    fn and_flattens() {
        let a = m("os_name == 'posix'");
        let b = m("python_version < '3.12'");
        let c = m("sys_platform != 'win32'");
        let combined = a.clone().and(b.clone()).and(c.clone());
        assert_eq!(combined, Marker::And(vec![a.clone(), b, c]));
        assert_eq!(a.clone().and(a.clone()), a);
    }

    #[test]
    fn display_parenthesises_disjunctions() {
        let combined = m("os_name == 'nt' or os_name == 'posix'").and(m("python_version >= '3'"));
        assert_eq!(
            combined.to_string(),
            "(os_name == 'nt' or os_name == 'posix') and python_version >= '3'"
        );
    }

    #[test]
    fn extra_detection() {
        assert!(m("extra == 'Socks_Proxy'").mentions_extra());
        assert_eq!(
            m("python_version >= '3' and \"test\" == extra").extra_names(),
            BTreeSet::from(["test".to_string()])
        );
        assert_eq!(
            m("extra == 'Socks_Proxy'").extra_names(),
            BTreeSet::from(["socks-proxy".to_string()])
        );
        assert!(!m("python_version >= '3'").mentions_extra());
        assert!(!m("platform_release == 'extra'").mentions_extra());
    }
}
