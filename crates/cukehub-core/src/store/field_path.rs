//! Dotted and bracketed paths into the serialized document tree.
//!
//! A path such as `feature.children[1].scenario.tags[0].name` is parsed into
//! [`PathSegment`]s and resolved against the `serde_json` form of a
//! [`crate::document::Document`]. Resolution never panics: a missing key, an
//! out-of-range index or a type mismatch simply yields `None`.

use std::collections::HashSet;

use serde_json::Value;

use crate::document::is_valid_tag_name;

/// Keys that are derived, assigned at parse time or locate the file on disk.
const READ_ONLY_KEYS: &[&str] = &[
    "id",
    "sourcePath",
    "relativePath",
    "tagIndex",
    "language",
    "isOutline",
    "numberOfSteps",
    "numberOfExamples",
];

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object member access.
    Key(String),
    /// Array element access.
    Index(usize),
}

/// A parsed field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

/// A field path string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldPathError {
    /// The path is empty.
    #[error("field path is empty")]
    Empty,
    /// A `.`-separated component has no key, as in `feature..name`.
    #[error("empty key in field path '{0}'")]
    EmptyKey(String),
    /// A `[` has no matching `]`, or text follows a `]` directly.
    #[error("malformed brackets in field path '{0}'")]
    MalformedBracket(String),
    /// The text between brackets is not an unsigned integer.
    #[error("invalid index '{index}' in field path '{path}'")]
    InvalidIndex {
        /// Full path being parsed.
        path: String,
        /// Offending bracket contents.
        index: String,
    },
}

impl FieldPath {
    /// Parse a path such as `feature.children[0].scenario.name`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldPathError`] when the path is empty, has an empty key,
    /// unbalanced brackets or a non-numeric index.
    pub fn parse(path: &str) -> Result<Self, FieldPathError> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(FieldPathError::Empty);
        }
        let mut segments = Vec::new();
        for component in trimmed.split('.') {
            let (key, mut rest) = component
                .find('[')
                .map_or((component, ""), |at| component.split_at(at));
            if key.is_empty() {
                return Err(FieldPathError::EmptyKey(trimmed.to_string()));
            }
            segments.push(PathSegment::Key(key.to_string()));
            while !rest.is_empty() {
                let Some(inner) = rest.strip_prefix('[') else {
                    return Err(FieldPathError::MalformedBracket(trimmed.to_string()));
                };
                let Some(close) = inner.find(']') else {
                    return Err(FieldPathError::MalformedBracket(trimmed.to_string()));
                };
                let (digits, tail) = inner.split_at(close);
                let index = digits
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| FieldPathError::InvalidIndex {
                        path: trimmed.to_string(),
                        index: digits.to_string(),
                    })?;
                segments.push(PathSegment::Index(index));
                rest = tail.strip_prefix(']').unwrap_or(tail);
            }
        }
        Ok(Self { segments })
    }

    /// Parsed segments in order.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns `true` when the path enters a field that cannot be edited:
    /// identifiers, source locations, the language and derived metadata.
    #[must_use]
    pub fn targets_read_only_field(&self) -> bool {
        self.segments.iter().any(
            |segment| matches!(segment, PathSegment::Key(key) if READ_ONLY_KEYS.contains(&key.as_str())),
        )
    }

    /// Resolve the path against `root`.
    pub fn resolve_mut<'v>(&self, root: &'v mut Value) -> Option<&'v mut Value> {
        self.segments
            .iter()
            .try_fold(root, |node, segment| match segment {
                PathSegment::Key(key) => node.as_object_mut()?.get_mut(key),
                PathSegment::Index(index) => node.as_array_mut()?.get_mut(*index),
            })
    }

    fn tags_position(&self) -> Option<usize> {
        self.segments
            .iter()
            .rposition(|segment| matches!(segment, PathSegment::Key(key) if key == "tags"))
    }

    /// Segments that follow the last `tags` key, if the path enters a tag set.
    fn tags_suffix(&self) -> Option<&[PathSegment]> {
        self.segments.get(self.tags_position()? + 1..)
    }

    /// Returns `true` when the tag set this path writes into holds the same
    /// name twice in `root`. Paths outside tag sets never do.
    pub(crate) fn tag_set_has_duplicates(&self, root: &Value) -> bool {
        let Some(set_path) = self.tags_position().and_then(|end| self.segments.get(..=end)) else {
            return false;
        };
        let tags = set_path.iter().try_fold(root, |node, segment| match segment {
            PathSegment::Key(key) => node.get(key),
            PathSegment::Index(index) => node.get(*index),
        });
        let Some(items) = tags.and_then(Value::as_array) else {
            return false;
        };
        let mut seen = HashSet::new();
        items
            .iter()
            .filter_map(|tag| tag.get("name").and_then(Value::as_str))
            .any(|name| !seen.insert(name))
    }

    /// Check and normalise a value written below a `tags` key.
    ///
    /// Values outside tag sets pass through unchanged. Inside a tag set, tags
    /// may be written as `"@name"` or `{"name": "@name"}`; every name must be
    /// valid. Returns `None` when the value is rejected.
    pub(crate) fn prepare_value(&self, value: Value) -> Option<Value> {
        let Some(suffix) = self.tags_suffix() else {
            return Some(value);
        };
        match suffix {
            [] => match value {
                Value::Array(items) => items
                    .into_iter()
                    .map(tag_value)
                    .collect::<Option<Vec<_>>>()
                    .map(Value::Array),
                _ => None,
            },
            [PathSegment::Index(_)] => tag_value(value),
            [PathSegment::Index(_), PathSegment::Key(key)] if key == "name" => match value {
                Value::String(name) if is_valid_tag_name(&name) => Some(Value::String(name)),
                _ => None,
            },
            _ => None,
        }
    }
}

fn tag_value(value: Value) -> Option<Value> {
    let name = match value {
        Value::String(name) => name,
        Value::Object(mut map) => match map.remove("name") {
            Some(Value::String(name)) if map.is_empty() => name,
            _ => return None,
        },
        _ => return None,
    };
    is_valid_tag_name(&name).then(|| serde_json::json!({ "name": name }))
}
