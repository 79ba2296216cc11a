//! Canonical Gherkin rendering.
//!
//! The output layout is fixed, so two documents with equal content always
//! render to identical text:
//!
//! - indentation uses two spaces per level
//! - every child of a feature or rule is preceded by exactly one blank line,
//!   as is every `Examples:` block
//! - step lines are `<keyword> <text>` with a single separating space
//! - table cells are column-aligned and `|` is written as `\|`
//! - the text ends with exactly one newline
//!
//! Node keywords are written in the feature's language, preceded by a
//! `# language:` line when that is not English. Step keywords are kept as
//! parsed. Source whitespace and comments are not preserved.

use crate::document::{
    Background, Child, Dialect, Document, ExampleTable, Rule, Scenario, Step, Tag,
};

mod table;

/// Text returned by [`render`] for documents that cannot be rendered.
pub const EMPTY_DOCUMENT_SENTINEL: &str = "Error: The document is empty";

const INDENT: &str = "  ";

/// Reasons a document cannot be rendered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The feature has no name.
    #[error("The document is empty")]
    EmptyDocument,
}

/// Render a document, or explain why it cannot be rendered.
///
/// # Errors
///
/// Returns [`RenderError::EmptyDocument`] when the feature name is blank.
pub fn try_render(document: &Document) -> Result<String, RenderError> {
    let feature = &document.feature;
    if feature.name.trim().is_empty() {
        return Err(RenderError::EmptyDocument);
    }

    let mut out = Lines::new(feature.dialect());
    if let Some(language) = feature.language.as_deref() {
        out.push(0, &format!("# language: {language}"));
    }
    out.tags(&feature.tags, 0);
    out.push(0, &header(feature.dialect().feature(), Some(&feature.name)));
    out.description(feature.description.as_deref(), 1);
    out.children(&feature.children, 1);
    Ok(out.finish())
}

/// Render a document, returning [`EMPTY_DOCUMENT_SENTINEL`] on failure.
#[must_use]
pub fn render(document: &Document) -> String {
    try_render(document).unwrap_or_else(|err| format!("Error: {err}"))
}

struct Lines {
    dialect: &'static Dialect,
    lines: Vec<String>,
}

impl Lines {
    fn new(dialect: &'static Dialect) -> Self {
        Self {
            dialect,
            lines: Vec::new(),
        }
    }

    fn push(&mut self, depth: usize, text: &str) {
        self.lines.push(format!("{}{text}", INDENT.repeat(depth)));
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    fn tags(&mut self, tags: &[Tag], depth: usize) {
        if tags.is_empty() {
            return;
        }
        let joined = tags
            .iter()
            .map(|tag| tag.name.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        self.push(depth, &joined);
    }

    fn description(&mut self, description: Option<&str>, depth: usize) {
        let Some(text) = description else {
            return;
        };
        for line in text.lines() {
            if line.trim().is_empty() {
                self.blank();
            } else {
                self.push(depth, line.trim());
            }
        }
    }

    fn children(&mut self, children: &[Child], depth: usize) {
        for child in children {
            self.blank();
            match child {
                Child::Background(background) => self.background(background, depth),
                Child::Scenario(scenario) => self.scenario(scenario, depth),
                Child::Rule(rule) => self.rule(rule, depth),
            }
        }
    }

    fn background(&mut self, background: &Background, depth: usize) {
        self.push(depth, &header(self.dialect.background(), background.name.as_deref()));
        self.steps(&background.steps, depth + 1);
    }

    fn scenario(&mut self, scenario: &Scenario, depth: usize) {
        let dialect = self.dialect;
        let keyword = dialect.scenario(scenario.is_outline);
        self.tags(&scenario.tags, depth);
        self.push(depth, &header(keyword, Some(&scenario.name)));
        self.description(scenario.description.as_deref(), depth + 1);
        self.steps(&scenario.steps, depth + 1);
        for examples in &scenario.examples {
            self.blank();
            self.examples(examples, depth + 1);
        }
    }

    fn rule(&mut self, rule: &Rule, depth: usize) {
        self.tags(&rule.tags, depth);
        self.push(depth, &header(self.dialect.rule(), Some(&rule.name)));
        self.children(&rule.children, depth + 1);
    }

    fn steps(&mut self, steps: &[Step], depth: usize) {
        for step in steps {
            self.push(
                depth,
                &format!("{} {}", step.keyword.trim_end(), step.text.trim()),
            );
            if let Some(data_table) = step.data_table.as_ref() {
                let mut rows: Vec<&[String]> = vec![data_table.header.as_slice()];
                rows.extend(data_table.rows.iter().map(Vec::as_slice));
                self.table(&rows, depth + 1);
            }
            if let Some(doc_string) = step.doc_string.as_deref() {
                self.doc_string(doc_string, depth + 1);
            }
        }
    }

    fn examples(&mut self, examples: &ExampleTable, depth: usize) {
        self.tags(&examples.tags, depth);
        self.push(depth, &header(self.dialect.examples(), None));
        if examples.header.is_empty() && examples.rows.is_empty() {
            return;
        }
        let mut rows: Vec<&[String]> = vec![examples.header.as_slice()];
        rows.extend(examples.rows.iter().map(Vec::as_slice));
        self.table(&rows, depth + 1);
    }

    fn table(&mut self, rows: &[&[String]], depth: usize) {
        self.lines
            .extend(table::render_rows(rows, &INDENT.repeat(depth)));
    }

    fn doc_string(&mut self, content: &str, depth: usize) {
        let fence = if content.contains("\"\"\"") {
            "```"
        } else {
            "\"\"\""
        };
        self.push(depth, fence);
        for line in content.split('\n').map(|line| line.trim_end_matches('\r')) {
            if line.is_empty() {
                self.blank();
            } else {
                self.push(depth, line);
            }
        }
        self.push(depth, fence);
    }

    fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

fn header(keyword: &str, name: Option<&str>) -> String {
    name.map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(|| format!("{keyword}:"), |name| format!("{keyword}: {name}"))
}
