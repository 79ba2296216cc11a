//! Writing rendered documents to the output directory.
//!
//! Each document is rendered with [`crate::formatter::try_render`] and written
//! to a path derived from its source location. Exporting a batch never stops
//! at the first failure: every document is attempted and failures are
//! collected in the returned [`ExportReport`].

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{info, warn};

use crate::document::{Document, DocumentId};
use crate::formatter::{RenderError, try_render};

/// Where and how documents are exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    /// Directory the documents were discovered under.
    pub source_root: PathBuf,
    /// Directory rendered files are written to.
    pub output_root: PathBuf,
    /// Mirror the source tree under `output_root` instead of flattening.
    pub keep_structure: bool,
}

/// A single document could not be exported.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The document cannot be rendered; nothing was written.
    #[error("cannot render {}: {source}", path.display())]
    Render {
        /// Intended output path.
        path: PathBuf,
        /// Render failure.
        source: RenderError,
    },
    /// The mapped path would leave the output directory; nothing was written.
    #[error("refusing to export {} outside the output directory", path.display())]
    UnsafePath {
        /// Offending path relative to the output directory.
        path: PathBuf,
    },
    /// Creating directories or writing the file failed.
    #[error("cannot write {}: {source}", path.display())]
    Io {
        /// Intended output path.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
}

/// Per-document failure recorded during a batch export.
#[derive(Debug)]
pub struct ExportFailure {
    /// Document that failed.
    pub document_id: DocumentId,
    /// Cause of the failure.
    pub error: ExportError,
}

/// Outcome of [`export_documents`].
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Paths written successfully, in document order.
    pub written: Vec<PathBuf>,
    /// Documents that could not be written.
    pub failures: Vec<ExportFailure>,
}

impl ExportReport {
    /// Returns `true` when every document was written.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Compute the output path of a document.
///
/// With `keep_structure` the source path relative to `source_root` is
/// appended to `output_root`, falling back to the document's recorded
/// relative path when the source is outside `source_root`. Without it the
/// file name alone is used. Documents without any file name are written as
/// `<id>.feature`.
///
/// Returns `None` when the mirrored path is absolute or climbs out of
/// `output_root` through `..`.
#[must_use]
pub fn output_path_for(
    document: &Document,
    source_root: &Path,
    output_root: &Path,
    keep_structure: bool,
) -> Option<PathBuf> {
    if keep_structure {
        let relative = mirrored_path(document, source_root);
        if !relative.as_os_str().is_empty() {
            return stays_below(relative).then(|| output_root.join(relative));
        }
    }
    let file_name = document
        .source_path
        .file_name()
        .or_else(|| document.relative_path.file_name())
        .map_or_else(
            || PathBuf::from(format!("{}.feature", document.id)),
            PathBuf::from,
        );
    Some(output_root.join(file_name))
}

fn mirrored_path<'a>(document: &'a Document, source_root: &Path) -> &'a Path {
    document
        .source_path
        .strip_prefix(source_root)
        .ok()
        .filter(|rel| !rel.as_os_str().is_empty())
        .unwrap_or(document.relative_path.as_path())
}

fn stays_below(relative: &Path) -> bool {
    relative
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

/// Render one document and write it under `target`.
///
/// Parent directories are created and existing files are overwritten.
///
/// # Errors
///
/// Returns [`ExportError::UnsafePath`] when the document maps outside the
/// output directory, [`ExportError::Render`] when it cannot be rendered (no
/// file is touched in either case) and [`ExportError::Io`] when writing fails.
pub fn write_document(document: &Document, target: &ExportTarget) -> Result<PathBuf, ExportError> {
    let path = output_path_for(
        document,
        &target.source_root,
        &target.output_root,
        target.keep_structure,
    )
    .ok_or_else(|| ExportError::UnsafePath {
        path: mirrored_path(document, &target.source_root).to_path_buf(),
    })?;
    let text = try_render(document).map_err(|source| ExportError::Render {
        path: path.clone(),
        source,
    })?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
    }
    fs::write(&path, text).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Write every document, collecting failures instead of stopping.
///
/// When flattening maps two documents to the same file, the later one wins
/// and a warning is logged.
#[must_use]
pub fn export_documents(documents: &[Document], target: &ExportTarget) -> ExportReport {
    let mut report = ExportReport::default();
    let mut seen = HashSet::new();
    for document in documents {
        match write_document(document, target) {
            Ok(path) => {
                if !seen.insert(path.clone()) {
                    warn!(path = %path.display(), "export overwrote a file written earlier in this batch");
                }
                report.written.push(path);
            }
            Err(error) => {
                warn!(document = %document.id, %error, "export failed");
                report.failures.push(ExportFailure {
                    document_id: document.id.clone(),
                    error,
                });
            }
        }
    }
    info!(
        written = report.written.len(),
        failed = report.failures.len(),
        output = %target.output_root.display(),
        "export finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::document::Feature;

    fn document_at(source: &str, relative: &str) -> Document {
        Document::new(
            PathBuf::from(source),
            PathBuf::from(relative),
            Feature {
                name: "F".to_string(),
                ..Feature::default()
            },
        )
    }

    #[rstest]
    #[case(true, "/out/sub/dir/a.feature")]
    #[case(false, "/out/a.feature")]
    fn maps_output_paths(#[case] keep: bool, #[case] expected: &str) {
        let document = document_at("/src/sub/dir/a.feature", "sub/dir/a.feature");
        let path = output_path_for(&document, Path::new("/src"), Path::new("/out"), keep);
        assert_eq!(path, Some(PathBuf::from(expected)));
    }

    #[test]
    fn falls_back_to_relative_path_outside_root() {
        let document = document_at("/elsewhere/a.feature", "x/a.feature");
        let path = output_path_for(&document, Path::new("/src"), Path::new("/out"), true);
        assert_eq!(path, Some(PathBuf::from("/out/x/a.feature")));
    }

    #[test]
    fn in_memory_documents_use_their_id() {
        let document = document_at("", "");
        let path = output_path_for(&document, Path::new("/src"), Path::new("/out"), false);
        assert_eq!(path, Some(PathBuf::from(format!("/out/{}.feature", document.id))));
    }

    #[rstest]
    #[case("/src/../escaped.feature", "../escaped.feature")]
    #[case("/elsewhere/a.feature", "/elsewhere/a.feature")]
    #[case("/elsewhere/a.feature", "sub/../../a.feature")]
    fn mirrored_paths_may_not_leave_the_output_root(#[case] source: &str, #[case] relative: &str) {
        let document = document_at(source, relative);
        assert_eq!(
            output_path_for(&document, Path::new("/src"), Path::new("/out"), true),
            None
        );
    }

    #[test]
    fn flattening_ignores_parent_components() {
        let document = document_at("/src/../escaped.feature", "../escaped.feature");
        let path = output_path_for(&document, Path::new("/src"), Path::new("/out"), false);
        assert_eq!(path, Some(PathBuf::from("/out/escaped.feature")));
    }

    #[test]
    fn unsafe_paths_are_not_written() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("temp dir should be created");
        };
        let source_root = dir.path().join("src");
        let output_root = dir.path().join("out");
        let document = document_at(
            &source_root.join("../escaped.feature").to_string_lossy(),
            "../escaped.feature",
        );
        let target = ExportTarget {
            source_root,
            output_root,
            keep_structure: true,
        };
        let result = write_document(&document, &target);
        assert!(matches!(result, Err(ExportError::UnsafePath { .. })));
        assert!(!dir.path().join("escaped.feature").exists());
    }
}
