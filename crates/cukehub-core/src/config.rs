//! Editor configuration parsed from a settings file and environment variables.
//!
//! Settings are layered: a JSON settings file (using the key names of the
//! browser editor's `config.json`) provides the base, `CUKEHUB_`-prefixed
//! environment variables override it, and command-line flags override both
//! through [`EditorConfig::apply_overrides`].

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::filter::PathFilter;
use crate::writer::ExportTarget;

/// Log level enumeration matching tracing crate levels.
///
/// Defaults to `Info` when not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Most verbose logging, includes all trace spans.
    Trace,
    /// Debug-level information for development.
    Debug,
    /// Standard informational messages.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for failures.
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::InvalidConfig(format!(
                "unknown log level '{s}', expected one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

impl LogLevel {
    /// Convert to a tracing filter directive string.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Environment variable naming the directory scanned for feature files.
pub const ENV_ROOT_DIR: &str = "CUKEHUB_ROOT_DIR";
/// Environment variable naming the export directory.
pub const ENV_OUTPUT_DIR: &str = "CUKEHUB_OUTPUT_DIR";
/// Environment variable holding comma-separated exclusion patterns.
pub const ENV_EXCLUDE: &str = "CUKEHUB_EXCLUDE";
/// Environment variable toggling folder-structure preservation on export.
pub const ENV_KEEP_STRUCTURE: &str = "CUKEHUB_KEEP_STRUCTURE";
/// Environment variable holding the test command template.
pub const ENV_TEST_COMMAND: &str = "CUKEHUB_TEST_COMMAND";
/// Environment variable selecting the log level.
pub const ENV_LOG_LEVEL: &str = "CUKEHUB_LOG_LEVEL";

/// Configuration for an editor session.
///
/// # Environment Variables
///
/// - `CUKEHUB_ROOT_DIR`: directory scanned for `.feature` files
/// - `CUKEHUB_OUTPUT_DIR`: directory exported documents are written to
/// - `CUKEHUB_EXCLUDE`: comma-separated exclusion patterns (`*` wildcard)
/// - `CUKEHUB_KEEP_STRUCTURE`: `true` to mirror the source tree on export
/// - `CUKEHUB_TEST_COMMAND`: command template containing `@yourTag`
/// - `CUKEHUB_LOG_LEVEL`: trace, debug, info, warn or error
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditorConfig {
    /// Directory scanned for feature files.
    pub root_dir: Option<PathBuf>,
    /// Directory exported documents are written to.
    pub output_dir: Option<PathBuf>,
    /// Raw comma-separated exclusion patterns.
    pub exclude_patterns: String,
    /// Mirror the source tree under the output directory when exporting.
    pub keep_folder_structure: bool,
    /// Command template used to run tests for a tag expression.
    pub test_command: Option<String>,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: LogLevel,
}

/// Command-line overrides applied on top of file and environment settings.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Replacement root directory.
    pub root_dir: Option<PathBuf>,
    /// Replacement output directory.
    pub output_dir: Option<PathBuf>,
    /// Replacement exclusion patterns.
    pub exclude_patterns: Option<String>,
    /// Replacement folder-structure flag.
    pub keep_folder_structure: Option<bool>,
    /// Replacement log level.
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    directory_path: Option<PathBuf>,
    output_folder: Option<PathBuf>,
    folder_to_exclude: Option<String>,
    keep_folder_structure: Option<bool>,
    test_command: Option<String>,
    log_level: Option<String>,
}

impl EditorConfig {
    /// Load a settings file, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if any value
    /// is invalid.
    pub fn load(settings_path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match settings_path {
            Some(path) => Self::from_settings_file(path)?,
            None => Self::default(),
        };
        base.with_env_overrides(|key| env::var(key).ok())
    }

    /// Load configuration from a JSON settings file.
    ///
    /// Unknown keys are ignored and missing keys fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` when the file cannot be read,
    /// `ConfigError::Settings` when it is not valid JSON, and
    /// `ConfigError::InvalidConfig` for an unknown log level.
    pub fn from_settings_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_settings_str(&text)
    }

    /// Parse configuration from settings JSON text.
    ///
    /// # Errors
    ///
    /// See [`EditorConfig::from_settings_file`].
    pub fn from_settings_str(text: &str) -> Result<Self, ConfigError> {
        let settings: SettingsFile = serde_json::from_str(text)?;
        let log_level = settings
            .log_level
            .as_deref()
            .map(str::parse)
            .transpose()?
            .unwrap_or_default();
        Ok(Self {
            root_dir: settings.directory_path,
            output_dir: settings.output_folder,
            exclude_patterns: settings.folder_to_exclude.unwrap_or_default(),
            keep_folder_structure: settings.keep_folder_structure.unwrap_or(false),
            test_command: settings.test_command,
            log_level,
        })
    }

    /// Load configuration from `CUKEHUB_*` environment variables alone.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConfig` if an environment variable
    /// contains an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides read through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConfig` for an unparsable log level or
    /// boolean.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_ROOT_DIR) {
            self.root_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = Some(PathBuf::from(dir));
        }
        if let Some(patterns) = lookup(ENV_EXCLUDE) {
            self.exclude_patterns = patterns;
        }
        if let Some(flag) = lookup(ENV_KEEP_STRUCTURE) {
            self.keep_folder_structure = parse_flag(ENV_KEEP_STRUCTURE, &flag)?;
        }
        if let Some(command) = lookup(ENV_TEST_COMMAND) {
            self.test_command = Some(command);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level.parse()?;
        }
        Ok(self)
    }

    /// Apply optional overrides to an existing configuration.
    ///
    /// This is intended for CLI overrides that should take precedence over
    /// file and environment settings.
    #[must_use]
    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(dir) = overrides.root_dir {
            self.root_dir = Some(dir);
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = Some(dir);
        }
        if let Some(patterns) = overrides.exclude_patterns {
            self.exclude_patterns = patterns;
        }
        if let Some(flag) = overrides.keep_folder_structure {
            self.keep_folder_structure = flag;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        self
    }

    /// Create a new configuration with the specified log level.
    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Create a new configuration rooted at `dir`.
    #[must_use]
    pub fn with_root_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(dir.into());
        self
    }

    /// Root directory, or an error naming the missing setting.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingSetting` when no root directory is set.
    pub fn require_root_dir(&self) -> Result<&Path, ConfigError> {
        self.root_dir
            .as_deref()
            .ok_or(ConfigError::MissingSetting("directoryPath"))
    }

    /// Compile the configured exclusion patterns.
    #[must_use]
    pub fn exclusion_filter(&self) -> PathFilter {
        PathFilter::from_patterns(&self.exclude_patterns)
    }

    /// Describe where exported documents go.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingSetting` when either the root or the
    /// output directory is unset.
    pub fn export_target(&self) -> Result<ExportTarget, ConfigError> {
        let source_root = self.require_root_dir()?.to_path_buf();
        let output_root = self
            .output_dir
            .clone()
            .ok_or(ConfigError::MissingSetting("outputFolder"))?;
        Ok(ExportTarget {
            source_root,
            output_root,
            keep_structure: self.keep_folder_structure,
        })
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidConfig(format!(
            "invalid boolean '{value}' for {name}, expected true or false"
        ))),
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests require explicit panic messages for debugging failures"
)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[rstest]
    #[case("trace", LogLevel::Trace)]
    #[case("debug", LogLevel::Debug)]
    #[case("INFO", LogLevel::Info)]
    #[case("warning", LogLevel::Warn)]
    #[case("Error", LogLevel::Error)]
    fn log_level_parses_valid_values(#[case] raw: &str, #[case] expected: LogLevel) {
        assert_eq!(raw.parse::<LogLevel>().ok(), Some(expected));
    }

    #[test]
    fn log_level_rejects_invalid_values() {
        let result = "loud".parse::<LogLevel>();
        assert!(result.unwrap_err().to_string().contains("unknown log level"));
    }

    #[test]
    fn settings_file_uses_editor_key_names() {
        let config = EditorConfig::from_settings_str(
            r#"{
                "directoryPath": "/srv/features",
                "outputFolder": "/srv/out",
                "folderToExclude": "node_modules, */tmp",
                "keepFolderStructure": true,
                "testCommand": "npm test -- --tags '@yourTag'"
            }"#,
        )
        .unwrap();
        assert_eq!(config.root_dir, Some(PathBuf::from("/srv/features")));
        assert_eq!(config.output_dir, Some(PathBuf::from("/srv/out")));
        assert_eq!(config.exclude_patterns, "node_modules, */tmp");
        assert!(config.keep_folder_structure);
        assert_eq!(
            config.test_command.as_deref(),
            Some("npm test -- --tags '@yourTag'")
        );
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn settings_file_tolerates_missing_and_unknown_keys() {
        let config = EditorConfig::from_settings_str(r#"{"port": 8080}"#).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn malformed_settings_are_reported() {
        let err = EditorConfig::from_settings_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Settings(_)));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let base = EditorConfig::default().with_root_dir("/from/file");
        let config = base
            .with_env_overrides(lookup_from(&[
                (ENV_ROOT_DIR, "/from/env"),
                (ENV_KEEP_STRUCTURE, "yes"),
                (ENV_LOG_LEVEL, "debug"),
            ]))
            .unwrap();
        assert_eq!(config.root_dir, Some(PathBuf::from("/from/env")));
        assert!(config.keep_folder_structure);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn env_overrides_reject_bad_boolean() {
        let err = EditorConfig::default()
            .with_env_overrides(lookup_from(&[(ENV_KEEP_STRUCTURE, "sometimes")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_KEEP_STRUCTURE));
    }

    #[test]
    fn apply_overrides_updates_selected_fields() {
        let config = EditorConfig::default().apply_overrides(ConfigOverrides {
            exclude_patterns: Some("skip".to_string()),
            log_level: Some(LogLevel::Error),
            ..ConfigOverrides::default()
        });
        assert_eq!(config.exclude_patterns, "skip");
        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(config.root_dir, None);
    }

    #[test]
    fn export_target_requires_output_folder() {
        let config = EditorConfig::default().with_root_dir("/r");
        let err = config.export_target().unwrap_err();
        assert_eq!(err.to_string(), "missing setting: outputFolder");
    }

    #[test]
    fn export_target_carries_structure_flag() {
        let config = EditorConfig {
            output_dir: Some(PathBuf::from("/o")),
            keep_folder_structure: true,
            ..EditorConfig::default().with_root_dir("/r")
        };
        let target = config.export_target().unwrap();
        assert_eq!(target.source_root, PathBuf::from("/r"));
        assert_eq!(target.output_root, PathBuf::from("/o"));
        assert!(target.keep_structure);
    }
}
