//! Tag values attached to features, rules, scenarios and examples.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single `@tag` annotation.
///
/// Tags read from disk are normalised to carry the leading `@`; tags supplied
/// through mutations must already satisfy [`is_valid_tag_name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    /// Tag text including the leading `@`.
    pub name: String,
}

impl Tag {
    /// Build a tag from raw text, prepending `@` when it is missing.
    #[must_use]
    pub fn normalised(raw: &str) -> Self {
        let trimmed = raw.trim();
        let name = if trimmed.starts_with('@') {
            trimmed.to_string()
        } else {
            format!("@{trimmed}")
        };
        Self { name }
    }

    /// Build a tag from a name that is already known to be valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Returns `true` when `name` starts with `@`, has at least one character
/// after it and contains no whitespace.
#[must_use]
pub fn is_valid_tag_name(name: &str) -> bool {
    name.strip_prefix('@')
        .is_some_and(|rest| !rest.is_empty() && !rest.chars().any(char::is_whitespace))
}
