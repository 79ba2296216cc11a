//! Recursive discovery of `.feature` files under a root directory.
//!
//! Discovery is best-effort: a file that cannot be read or parsed is dropped
//! from the result and recorded in [`DiscoveryReport::failures`], so one
//! broken fixture never prevents the rest of a tree from loading. Excluded
//! directories are pruned with their whole subtree.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::document::Document;
use crate::filter::PathFilter;
use crate::parser::parse_feature_file;

/// A path that discovery had to skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryFailure {
    /// File or directory that could not be processed.
    pub path: PathBuf,
    /// Human-readable cause.
    pub reason: String,
}

/// Outcome of a directory scan.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Successfully parsed documents, sorted by source path.
    pub documents: Vec<Document>,
    /// Entries that were dropped.
    pub failures: Vec<DiscoveryFailure>,
}

/// Returns `true` when the path has a `.feature` extension, ignoring case.
#[must_use]
pub fn is_feature_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("feature"))
}

/// Parse every non-excluded feature file under `root`.
///
/// Failures are logged and dropped; use [`discover_with_report`] to inspect
/// them.
#[must_use]
pub fn discover(root: &Path, filter: &PathFilter) -> Vec<Document> {
    discover_with_report(root, filter).documents
}

/// Parse every non-excluded feature file under `root`, keeping a record of
/// the entries that were skipped.
#[must_use]
pub fn discover_with_report(root: &Path, filter: &PathFilter) -> DiscoveryReport {
    let mut report = DiscoveryReport::default();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_pruned(entry, filter));

    for next in walker {
        let entry = match next {
            Ok(entry) => entry,
            Err(err) => {
                if err.loop_ancestor().is_some() {
                    continue;
                }
                let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                warn!(path = %path.display(), error = %err, "skipping unreadable entry");
                report.failures.push(DiscoveryFailure {
                    path,
                    reason: err.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_feature_file(entry.path()) {
            continue;
        }
        match parse_feature_file(entry.path(), root) {
            Ok(document) => report.documents.push(document),
            Err(err) => {
                warn!(path = %entry.path().display(), error = %err, "dropping feature file");
                report.failures.push(DiscoveryFailure {
                    path: entry.into_path(),
                    reason: err.to_string(),
                });
            }
        }
    }

    report
        .documents
        .sort_by(|a, b| a.source_path.cmp(&b.source_path));
    debug!(
        root = %root.display(),
        documents = report.documents.len(),
        failures = report.failures.len(),
        "discovery finished"
    );
    report
}

/// The root itself is never pruned; every other entry is tested against
/// the exclusion filter.
fn is_pruned(entry: &DirEntry, filter: &PathFilter) -> bool {
    entry.depth() > 0 && filter.is_excluded(entry.path())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::test_support::{FeatureTree, minimal_feature};

    #[rstest]
    #[case("a.feature", true)]
    #[case("a.FEATURE", true)]
    #[case("a.feature.bak", false)]
    #[case("feature", false)]
    fn recognises_feature_extension(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_feature_file(Path::new(name)), expected);
    }

    #[test]
    fn excluded_directories_prune_their_subtree() {
        let tree = FeatureTree::new()
            .with_file("skip/x.feature", minimal_feature("X", "x", "@x"))
            .with_file("skip/deeper/z.feature", minimal_feature("Z", "z", "@z"))
            .with_file("keep/y.feature", minimal_feature("Y", "y", "@y"));
        let documents = discover(tree.root(), &PathFilter::from_patterns("skip"));
        assert_eq!(documents.len(), 1);
        let relative: Vec<_> = documents.iter().map(|d| d.relative_path.clone()).collect();
        assert_eq!(relative, [PathBuf::from("keep/y.feature")]);
    }

    #[test]
    fn malformed_files_are_reported_not_fatal() {
        let tree = FeatureTree::new()
            .with_file("good.feature", minimal_feature("Good", "g", "@g"))
            .with_file("bad.feature", "this is not gherkin\n  | broken");
        let report = discover_with_report(tree.root(), &PathFilter::default());
        assert_eq!(report.documents.len(), 1);
        assert_eq!(
            report.documents.first().map(|d| d.feature.name.as_str()),
            Some("Good")
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            report.failures.first().map(|f| f.path.clone()),
            Some(tree.path("bad.feature"))
        );
    }

    #[test]
    fn non_feature_files_are_ignored() {
        let tree = FeatureTree::new()
            .with_file("notes.txt", "Feature: not really")
            .with_file("a.feature", minimal_feature("A", "a", "@a"));
        let report = discover_with_report(tree.root(), &PathFilter::default());
        assert_eq!(report.documents.len(), 1);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn results_are_sorted_by_path() {
        let tree = FeatureTree::new()
            .with_file("b/2.feature", minimal_feature("Two", "t", "@t"))
            .with_file("a/1.feature", minimal_feature("One", "o", "@o"));
        let names: Vec<_> = discover(tree.root(), &PathFilter::default())
            .into_iter()
            .map(|d| d.feature.name)
            .collect();
        assert_eq!(names, ["One", "Two"]);
    }

    #[test]
    fn missing_root_yields_a_failure() {
        let tree = FeatureTree::new();
        let report = discover_with_report(&tree.path("absent"), &PathFilter::default());
        assert!(report.documents.is_empty());
        assert_eq!(report.failures.len(), 1);
    }
}
