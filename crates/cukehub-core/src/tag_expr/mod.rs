//! Tag expressions used to select scenarios for a test run.
//!
//! Expressions combine tags (`@tag`) with `not`, `and`, `or` and parentheses,
//! for example `@checkout and not (@wip or @flaky)`. Precedence follows the
//! Cucumber convention: `not` binds tighter than `and`, which binds tighter
//! than `or`; binary operators associate to the left.
//!
//! A tag token runs from `@` up to the next whitespace or parenthesis, so any
//! tag accepted by the mutation API can appear in an expression.

use std::collections::HashSet;
use std::fmt;

mod lexer;
mod parser;

use parser::Parser;

/// A parsed, validated tag expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagExpression {
    source: String,
    root: Expr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// A tag expression could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid tag expression at byte {offset}: {reason}")]
pub struct TagExprError {
    offset: usize,
    reason: String,
}

impl TagExprError {
    pub(crate) fn new(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }

    /// Byte offset in the input where the problem was detected.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl TagExpression {
    /// Parse an expression.
    ///
    /// # Errors
    ///
    /// Returns [`TagExprError`] describing the first offending token.
    pub fn parse(input: &str) -> Result<Self, TagExprError> {
        let mut parser = Parser::new(input)?;
        let root = parser.parse_expression()?;
        parser.expect_end()?;
        Ok(Self {
            source: input.trim().to_string(),
            root,
        })
    }

    /// The expression text as supplied, without surrounding whitespace.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Every distinct tag named by the expression, in first-seen order.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        self.root.collect_tags(&mut seen);
        seen
    }

    /// Returns `true` when the given tag set satisfies the expression.
    pub fn evaluate<'a, I>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let set: HashSet<&'a str> = tags.into_iter().collect();
        self.root.eval(&set)
    }
}

impl fmt::Display for TagExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Expr {
    fn eval(&self, tags: &HashSet<&str>) -> bool {
        match self {
            Self::Tag(tag) => tags.contains(tag.as_str()),
            Self::Not(inner) => !inner.eval(tags),
            Self::And(lhs, rhs) => lhs.eval(tags) && rhs.eval(tags),
            Self::Or(lhs, rhs) => lhs.eval(tags) || rhs.eval(tags),
        }
    }

    fn collect_tags<'a>(&'a self, seen: &mut Vec<&'a str>) {
        match self {
            Self::Tag(tag) => {
                if !seen.contains(&tag.as_str()) {
                    seen.push(tag);
                }
            }
            Self::Not(inner) => inner.collect_tags(seen),
            Self::And(lhs, rhs) | Self::Or(lhs, rhs) => {
                lhs.collect_tags(seen);
                rhs.collect_tags(seen);
            }
        }
    }
}

#[cfg(test)]
mod tests;
