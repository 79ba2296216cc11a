//! Path exclusion patterns.
//!
//! A pattern list is a comma-separated string such as
//! `"node_modules, */generated/*"`. Each entry is trimmed and compiled into an
//! anchored regular expression in which `*` matches any run of characters and
//! every other character matches itself.

use std::path::Path;

use regex::Regex;

/// Compiled set of exclusion patterns.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    patterns: Vec<Regex>,
}

impl PathFilter {
    /// Compile a comma-separated pattern list.
    ///
    /// Empty entries are dropped, so `""` and `" , "` yield a filter that
    /// matches nothing.
    #[must_use]
    pub fn from_patterns(raw: &str) -> Self {
        let patterns = raw
            .split(',')
            .map(str::trim)
            .filter(|pattern| !pattern.is_empty())
            .filter_map(compile_pattern)
            .collect();
        Self { patterns }
    }

    /// Returns `true` when no pattern was compiled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of compiled patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` when any pattern matches the whole path string.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        self.patterns.iter().any(|pattern| pattern.is_match(&text))
    }

    /// Returns `true` when the path or its final component is matched.
    ///
    /// Directory walks use this so that a bare name like `skip` prunes every
    /// directory called `skip`, wherever it sits.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.matches(path) {
            return true;
        }
        path.file_name().is_some_and(|name| {
            let name = name.to_string_lossy();
            self.patterns.iter().any(|pattern| pattern.is_match(&name))
        })
    }
}

fn compile_pattern(pattern: &str) -> Option<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    match Regex::new(&format!("^{body}$")) {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::warn!(pattern, error = %err, "ignoring unusable exclusion pattern");
            None
        }
    }
}
