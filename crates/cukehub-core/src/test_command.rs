//! Building the shell command that runs tests for a tag expression.
//!
//! The command is only rendered, never executed.

use crate::config::EditorConfig;
use crate::error::ConfigError;
use crate::tag_expr::TagExpression;

/// Placeholder replaced by the tag expression.
pub const TAG_PLACEHOLDER: &str = "@yourTag";

/// A configured test command template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCommand {
    template: String,
}

impl TestCommand {
    /// Wrap a template.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] when the template does not
    /// contain [`TAG_PLACEHOLDER`].
    pub fn new(template: impl Into<String>) -> Result<Self, ConfigError> {
        let template = template.into();
        if !template.contains(TAG_PLACEHOLDER) {
            return Err(ConfigError::InvalidConfig(format!(
                "test command '{template}' has no {TAG_PLACEHOLDER} placeholder"
            )));
        }
        Ok(Self { template })
    }

    /// Template from the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSetting`] when no command is configured
    /// and [`ConfigError::InvalidConfig`] when it lacks the placeholder.
    pub fn from_config(config: &EditorConfig) -> Result<Self, ConfigError> {
        let template = config
            .test_command
            .as_deref()
            .ok_or(ConfigError::MissingSetting("testCommand"))?;
        Self::new(template)
    }

    /// The raw template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Substitute the expression for the first placeholder.
    #[must_use]
    pub fn render(&self, expression: &TagExpression) -> String {
        self.template
            .replacen(TAG_PLACEHOLDER, expression.as_str(), 1)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn expression(text: &str) -> TagExpression {
        TagExpression::parse(text).unwrap_or_else(|e| panic!("{text} should parse: {e}"))
    }

    #[rstest]
    #[case("npx cucumber-js --tags '@yourTag'", "@smoke", "npx cucumber-js --tags '@smoke'")]
    #[case(
        "cargo test -- --tags \"@yourTag\"",
        "@a and not (@b or @c)",
        "cargo test -- --tags \"@a and not (@b or @c)\""
    )]
    #[case("run @yourTag then @yourTag", "@x", "run @x then @yourTag")]
    fn renders_expression_into_template(
        #[case] template: &str,
        #[case] tags: &str,
        #[case] expected: &str,
    ) {
        let Ok(command) = TestCommand::new(template) else {
            panic!("template should be accepted");
        };
        assert_eq!(command.render(&expression(tags)), expected);
    }

    #[test]
    fn rejects_template_without_placeholder() {
        let Err(err) = TestCommand::new("npm test") else {
            panic!("template without placeholder must be rejected");
        };
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn missing_command_is_reported() {
        let Err(err) = TestCommand::from_config(&EditorConfig::default()) else {
            panic!("unset command must be rejected");
        };
        assert_eq!(err.to_string(), "missing setting: testCommand");
    }

    #[test]
    fn reads_template_from_config() {
        let config = EditorConfig {
            test_command: Some("behave --tags=@yourTag".to_string()),
            ..EditorConfig::default()
        };
        let Ok(command) = TestCommand::from_config(&config) else {
            panic!("configured command should load");
        };
        assert_eq!(command.template(), "behave --tags=@yourTag");
    }
}
