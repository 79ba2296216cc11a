//! Shared test support utilities for cukehub-core tests.
//!
//! This module provides common infrastructure for both unit and integration
//! tests:
//! - temporary feature trees written from `(path, content)` pairs
//! - accessors that panic with a clear message when a fixture is malformed
//! - newtype wrappers for improved type safety

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::document::{Document, Scenario};

/// Newtype wrapper for test file names relative to the tree root.
#[derive(Debug, Clone)]
pub struct Filename(pub(crate) String);

impl From<&str> for Filename {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for Filename {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Newtype wrapper for file contents to improve type safety.
#[derive(Debug, Clone)]
pub struct FileContent(pub(crate) String);

impl From<&str> for FileContent {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<String> for FileContent {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for FileContent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A temporary directory holding a tree of feature files.
pub struct FeatureTree {
    dir: TempDir,
}

impl FeatureTree {
    /// Create an empty tree.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[expect(clippy::expect_used, reason = "test helper panics on temp dir failure")]
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Write a file, creating parent directories as needed.
    ///
    /// # Panics
    ///
    /// Panics if the file or its parents cannot be written.
    #[expect(clippy::expect_used, reason = "test helper panics on write failure")]
    #[must_use]
    pub fn with_file(self, name: impl Into<Filename>, content: impl Into<FileContent>) -> Self {
        let path = self.dir.path().join(name.into().as_ref());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content.into().as_ref()).expect("write fixture file");
        self
    }

    /// Root of the tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of a file in the tree.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

impl Default for FeatureTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal valid feature text with one tagged scenario.
#[must_use]
pub fn minimal_feature(name: &str, scenario: &str, tag: &str) -> String {
    format!("Feature: {name}\n\n  {tag}\n  Scenario: {scenario}\n    Given a step\n")
}

/// The scenario at `index` in document order.
///
/// # Panics
///
/// Panics when the document has fewer scenarios.
#[must_use]
pub fn nth_scenario(document: &Document, index: usize) -> &Scenario {
    match document.feature.scenarios().get(index).copied() {
        Some(scenario) => scenario,
        None => panic!("document has no scenario at index {index}"),
    }
}

/// Names of every scenario in document order.
#[must_use]
pub fn scenario_names(document: &Document) -> Vec<String> {
    document
        .feature
        .scenarios()
        .iter()
        .map(|scenario| scenario.name.clone())
        .collect()
}

/// Tag names of a tag set, for compact assertions.
#[must_use]
pub fn tag_names(tags: &[crate::document::Tag]) -> Vec<String> {
    tags.iter().map(|tag| tag.name.clone()).collect()
}
