//! Configuration and host-level error types.
//!
//! Component-specific failures live next to the code that raises them
//! ([`crate::parser::ParseError`], [`crate::formatter::RenderError`],
//! [`crate::writer::ExportError`], [`crate::store::FieldPathError`],
//! [`crate::tag_expr::TagExprError`]). This module holds the errors raised
//! while assembling an editor session.

use thiserror::Error;

use crate::tag_expr::TagExprError;

/// Errors raised while loading or validating editor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting carried a value that cannot be interpreted.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An operation needed a setting that was never provided.
    #[error("missing setting: {0}")]
    MissingSetting(&'static str),

    /// The settings file is not valid JSON for the expected shape.
    #[error("malformed settings file: {0}")]
    Settings(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by [`crate::session::EditorSession`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session configuration cannot serve the request.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A tag expression supplied by the caller is malformed.
    #[error(transparent)]
    TagExpression(#[from] TagExprError),
}
