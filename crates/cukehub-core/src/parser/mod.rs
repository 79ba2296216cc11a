//! Gherkin text to [`Document`] conversion.
//!
//! Grammar handling is delegated to the `gherkin` crate. This module owns the
//! post-processing: identifier assignment, keyword and tag normalisation,
//! table re-splitting and the derived metadata computed by
//! [`Document::refresh_metadata`].
//!
//! A `# language:` header selects the grammar's keyword vocabulary and is
//! recorded on the [`Feature`] so the formatter can write it back.
//!
//! Parsing is all-or-nothing: any grammar error yields a [`ParseError`] and
//! no partial document.

use std::path::{Path, PathBuf};

use gherkin::GherkinEnv;

use crate::document::{
    Background, Child, DEFAULT_LANGUAGE, Document, ExampleTable, Feature, Rule, Scenario,
    ScenarioId, Step, Table, Tag, declared_language,
};

mod table;

/// Errors raised while turning a `.feature` file into a [`Document`].
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to read the source `.feature` file.
    #[error("failed to read feature file: {0}")]
    Read(#[from] std::io::Error),
    /// The text is not valid Gherkin.
    #[error("failed to parse feature file: {0}")]
    Syntax(#[from] gherkin::ParseError),
    /// The feature has no name, so it cannot be rendered back.
    #[error("feature has no name")]
    MissingFeatureName,
}

/// Parse and convert a `.feature` file from disk.
///
/// `relativePath` is `path` with `root` stripped; when `path` is not under
/// `root` the full path is kept.
///
/// # Errors
///
/// Returns [`ParseError::Read`] when the file cannot be read and the other
/// variants as described in [`parse_feature_source`].
pub fn parse_feature_file(path: &Path, root: &Path) -> Result<Document, ParseError> {
    let text = std::fs::read_to_string(path)?;
    let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    let feature = parse_feature(&text)?;
    Ok(Document::new(path.to_path_buf(), relative, feature))
}

/// Parse Gherkin text held in memory.
///
/// The resulting document has empty source and relative paths.
///
/// # Errors
///
/// Returns [`ParseError::Syntax`] for grammar errors (including empty input)
/// and [`ParseError::MissingFeatureName`] when the feature title is blank.
pub fn parse_feature_source(text: &str) -> Result<Document, ParseError> {
    let feature = parse_feature(text)?;
    Ok(Document::new(PathBuf::new(), PathBuf::new(), feature))
}

fn parse_feature(text: &str) -> Result<Feature, ParseError> {
    let mut source = text.to_string();
    if !source.ends_with('\n') {
        source.push('\n');
    }
    let masked = table::mask_escaped_pipes(&source);
    let parsed = gherkin::Feature::parse(masked.as_ref(), GherkinEnv::default())?;
    let name = parsed.name.trim().to_string();
    if name.is_empty() {
        return Err(ParseError::MissingFeatureName);
    }

    let mut children = Vec::new();
    if let Some(background) = parsed.background.as_ref() {
        children.push(Child::Background(convert_background(&source, background)));
    }
    children.extend(
        parsed
            .scenarios
            .iter()
            .map(|scenario| Child::Scenario(convert_scenario(&source, scenario))),
    );
    children.extend(
        parsed
            .rules
            .iter()
            .map(|rule| Child::Rule(convert_rule(&source, rule))),
    );

    Ok(Feature {
        language: declared_language(&source).filter(|code| code != DEFAULT_LANGUAGE),
        name,
        description: normalise_description(parsed.description.as_deref()),
        tags: convert_tags(&parsed.tags),
        children,
    })
}

fn convert_background(source: &str, background: &gherkin::Background) -> Background {
    let name = background.name.trim();
    Background {
        name: (!name.is_empty()).then(|| name.to_string()),
        steps: convert_steps(source, &background.steps),
    }
}

fn convert_scenario(source: &str, scenario: &gherkin::Scenario) -> Scenario {
    Scenario {
        id: ScenarioId::generate(),
        keyword: scenario.keyword.trim().to_string(),
        name: scenario.name.trim().to_string(),
        description: normalise_description(scenario.description.as_deref()),
        tags: convert_tags(&scenario.tags),
        steps: convert_steps(source, &scenario.steps),
        is_outline: false,
        examples: scenario
            .examples
            .iter()
            .map(|examples| convert_examples(source, examples))
            .collect(),
        number_of_steps: 0,
        number_of_examples: 0,
    }
}

fn convert_rule(source: &str, rule: &gherkin::Rule) -> Rule {
    let mut children = Vec::new();
    if let Some(background) = rule.background.as_ref() {
        children.push(Child::Background(convert_background(source, background)));
    }
    children.extend(
        rule.scenarios
            .iter()
            .map(|scenario| Child::Scenario(convert_scenario(source, scenario))),
    );
    Rule {
        name: rule.name.trim().to_string(),
        tags: convert_tags(&rule.tags),
        children,
    }
}

fn convert_steps(source: &str, steps: &[gherkin::Step]) -> Vec<Step> {
    steps
        .iter()
        .map(|step| Step {
            keyword: normalise_keyword(&step.keyword),
            text: step.value.trim().to_string(),
            data_table: step
                .table
                .as_ref()
                .and_then(|table| split_header(table_rows(source, table)))
                .map(|(header, rows)| Table { header, rows }),
            doc_string: step.docstring.as_deref().map(normalise_doc_string),
        })
        .collect()
}

fn convert_examples(source: &str, examples: &gherkin::Examples) -> ExampleTable {
    let (header, rows) = examples
        .table
        .as_ref()
        .and_then(|table| split_header(table_rows(source, table)))
        .unwrap_or_default();
    ExampleTable {
        tags: convert_tags(&examples.tags),
        header,
        rows,
    }
}

fn table_rows(source: &str, table: &gherkin::Table) -> Vec<Vec<String>> {
    table::rows_from_source(source, table.span).unwrap_or_else(|| table::unescape_rows(&table.rows))
}

fn split_header(mut rows: Vec<Vec<String>>) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    if rows.is_empty() {
        return None;
    }
    let header = rows.remove(0);
    Some((header, rows))
}

fn convert_tags(tags: &[String]) -> Vec<Tag> {
    tags.iter()
        .filter(|tag| !tag.trim().is_empty())
        .map(|tag| Tag::normalised(tag))
        .collect()
}

/// Keywords always carry exactly one trailing space.
fn normalise_keyword(keyword: &str) -> String {
    format!("{} ", keyword.trim())
}

/// Drop the line break after the opening fence and the one before the
/// closing fence.
fn normalise_doc_string(content: &str) -> String {
    let content = content
        .strip_prefix("\r\n")
        .or_else(|| content.strip_prefix('\n'))
        .unwrap_or(content);
    let content = content
        .strip_suffix("\r\n")
        .or_else(|| content.strip_suffix('\n'))
        .unwrap_or(content);
    table::restore_escaped_pipes(content)
}

/// Trim each line and drop surrounding blank lines; blank text becomes `None`.
fn normalise_description(description: Option<&str>) -> Option<String> {
    let restored = table::restore_escaped_pipes(description?);
    let lines: Vec<&str> = restored.lines().map(str::trim).collect();
    let first = lines.iter().position(|line| !line.is_empty())?;
    let last = lines.iter().rposition(|line| !line.is_empty())?;
    lines.get(first..=last).map(|kept| kept.join("\n"))
}
