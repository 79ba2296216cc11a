//! Behavioural tests for exporting the working copy to disk.

use std::fs;

use cukehub_core::discovery::discover;
use cukehub_core::filter::PathFilter;
use cukehub_core::formatter::render;
use cukehub_core::test_support::{FeatureTree, minimal_feature};
use cukehub_core::writer::{ExportError, ExportTarget, export_documents};
use rstest::rstest;
use tempfile::TempDir;

fn source_tree() -> FeatureTree {
    FeatureTree::new()
        .with_file("cart/add.feature", minimal_feature("Add", "Adds", "@cart"))
        .with_file("search/find.feature", minimal_feature("Find", "Finds", "@search"))
}

#[rstest]
#[case(true, &["cart/add.feature", "search/find.feature"])]
#[case(false, &["add.feature", "find.feature"])]
fn writes_every_document(#[case] keep_structure: bool, #[case] expected: &[&str]) {
    let tree = source_tree();
    let output = TempDir::new().unwrap_or_else(|e| panic!("temp dir: {e}"));
    let documents = discover(tree.root(), &PathFilter::default());
    let target = ExportTarget {
        source_root: tree.root().to_path_buf(),
        output_root: output.path().to_path_buf(),
        keep_structure,
    };

    let report = export_documents(&documents, &target);

    assert!(report.is_success());
    let expected_paths: Vec<_> = expected.iter().map(|p| output.path().join(p)).collect();
    assert_eq!(report.written, expected_paths);
    for (document, path) in documents.iter().zip(&report.written) {
        let written = fs::read_to_string(path).unwrap_or_else(|e| panic!("read export: {e}"));
        assert_eq!(written, render(document));
    }
}

#[test]
fn unrenderable_documents_are_skipped() {
    let tree = source_tree();
    let output = TempDir::new().unwrap_or_else(|e| panic!("temp dir: {e}"));
    let mut documents = discover(tree.root(), &PathFilter::default());
    let Some(first) = documents.first_mut() else {
        panic!("expected documents");
    };
    first.feature.name = String::new();
    let target = ExportTarget {
        source_root: tree.root().to_path_buf(),
        output_root: output.path().to_path_buf(),
        keep_structure: true,
    };

    let report = export_documents(&documents, &target);

    assert_eq!(report.written, [output.path().join("search/find.feature")]);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures.first().map(|f| &f.error),
        Some(ExportError::Render { .. })
    ));
    assert!(!output.path().join("cart/add.feature").exists());
}

#[test]
fn export_overwrites_existing_files() {
    let tree = source_tree();
    let documents = discover(tree.root(), &PathFilter::default());
    let target = ExportTarget {
        source_root: tree.root().to_path_buf(),
        output_root: tree.root().to_path_buf(),
        keep_structure: true,
    };
    fs::write(tree.path("cart/add.feature"), "stale")
        .unwrap_or_else(|e| panic!("overwrite fixture: {e}"));

    let report = export_documents(&documents, &target);

    assert!(report.is_success());
    let written = fs::read_to_string(tree.path("cart/add.feature"))
        .unwrap_or_else(|e| panic!("read export: {e}"));
    assert!(written.starts_with("Feature: Add\n"));
}
