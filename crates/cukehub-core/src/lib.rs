//! Working-copy editor core for Gherkin `.feature` files.
//!
//! This crate discovers feature files in a directory tree, parses them into a
//! mutable, tag-addressable document model, applies tag and field edits to an
//! in-memory working copy, and renders the edited documents back to canonical
//! Gherkin text on disk.
//!
//! # Overview
//!
//! - [`filter`]: comma-separated exclusion patterns compiled into matchers
//! - [`discovery`]: recursive directory walk producing parsed documents
//! - [`parser`]: Gherkin text to [`document::Document`] with derived metadata
//! - [`store`]: the working copy and its mutation operations
//! - [`formatter`]: canonical Gherkin rendering
//! - [`writer`]: output path mapping and batch export
//! - [`tag_expr`]: `@a and not (@b or @c)` expressions for scenario selection
//! - [`test_command`]: test command templates filled from a tag expression
//! - [`notification`]: payloads a host broadcasts after each mutation
//! - [`session`]: a host-owned, mutex-guarded store plus configuration
//!
//! # Configuration
//!
//! Settings are read from a JSON settings file and environment variables
//! prefixed with `CUKEHUB_`. See [`config::EditorConfig`].
//!
//! # Example
//!
//! ```ignore
//! use cukehub_core::config::EditorConfig;
//! use cukehub_core::session::EditorSession;
//!
//! let config = EditorConfig::from_env()?;
//! let session = EditorSession::new(config);
//! session.reset()?;
//! ```

pub mod config;
pub mod discovery;
pub mod document;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod logging;
pub mod notification;
pub mod parser;
pub mod session;
pub mod store;
pub mod tag_expr;
pub mod test_command;
pub mod writer;

/// Test support utilities for unit and integration tests.
///
/// This module is hidden from documentation as it's intended for internal
/// test use only.
#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;
