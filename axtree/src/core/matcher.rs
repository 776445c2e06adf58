//! String matchers used by structural queries.

use regex::{Regex, RegexBuilder};

use crate::core::error::TreeError;

/// How a query compares a node's category or name.
///
/// `Literal` compares plain text (optionally ignoring case); `Pattern` is a
/// compiled regex. Both support whole-string and contains matching.
#[derive(Debug, Clone)]
pub enum Matcher {
    Literal { text: String, ignore_case: bool },
    Pattern(Pattern),
}

/// A regex compiled twice: anchored for whole-string matches, bare for contains.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    full: Regex,
    partial: Regex,
}

impl Matcher {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal {
            text: text.into(),
            ignore_case: false,
        }
    }

    pub fn pattern(source: &str) -> Result<Self, TreeError> {
        let full = compile(&format!("^(?:{source})$"), source)?;
        let partial = compile(source, source)?;
        Ok(Self::Pattern(Pattern {
            source: source.to_string(),
            full,
            partial,
        }))
    }

    /// Text the matcher was built from.
    pub fn source(&self) -> &str {
        match self {
            Self::Literal { text, .. } => text,
            Self::Pattern(pattern) => &pattern.source,
        }
    }

    /// Reinterpret the source text as a literal string.
    pub fn to_literal(&self) -> Self {
        Self::literal(self.source())
    }

    /// Literal matcher over the source text that ignores case.
    pub fn to_case_insensitive(&self) -> Self {
        Self::Literal {
            text: self.source().to_string(),
            ignore_case: true,
        }
    }

    pub fn matches(&self, candidate: &str, substrings: bool) -> bool {
        match self {
            Self::Literal {
                text,
                ignore_case: false,
            } => {
                if substrings {
                    candidate.contains(text.as_str())
                } else {
                    candidate == text
                }
            }
            Self::Literal {
                text,
                ignore_case: true,
            } => {
                let candidate = candidate.to_lowercase();
                let text = text.to_lowercase();
                if substrings {
                    candidate.contains(&text)
                } else {
                    candidate == text
                }
            }
            Self::Pattern(pattern) => {
                if substrings {
                    pattern.partial.is_match(candidate)
                } else {
                    pattern.full.is_match(candidate)
                }
            }
        }
    }
}

impl From<&str> for Matcher {
    fn from(text: &str) -> Self {
        Self::literal(text)
    }
}

impl From<String> for Matcher {
    fn from(text: String) -> Self {
        Self::literal(text)
    }
}

fn compile(expression: &str, source: &str) -> Result<Regex, TreeError> {
    RegexBuilder::new(expression)
        .build()
        .map_err(|err| TreeError::InvalidPattern {
            pattern: source.to_string(),
            message: err.to_string(),
        })
}
