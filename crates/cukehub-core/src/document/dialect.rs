//! Gherkin keyword vocabularies per `# language:` code.
//!
//! The table is the upstream Cucumber dialect list bundled with the `gherkin`
//! grammar. English is built in so detection and rendering keep working even
//! if the bundled table cannot be read.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::Deserialize;
use tracing::warn;

/// Language assumed when a file has no `# language:` header.
pub const DEFAULT_LANGUAGE: &str = "en";

static DIALECTS: LazyLock<BTreeMap<String, Dialect>> = LazyLock::new(|| {
    serde_json::from_str(include_str!("gherkin-languages.json")).unwrap_or_else(|error| {
        warn!(%error, "bundled Gherkin dialects unreadable; falling back to English");
        BTreeMap::new()
    })
});

static ENGLISH: LazyLock<Dialect> = LazyLock::new(|| Dialect {
    feature: words(&["Feature", "Business Need", "Ability"]),
    background: words(&["Background"]),
    rule: words(&["Rule"]),
    scenario: words(&["Scenario", "Example"]),
    scenario_outline: words(&["Scenario Outline", "Scenario Template"]),
    examples: words(&["Examples", "Scenarios"]),
});

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|word| (*word).to_string()).collect()
}

/// Node keywords of one Gherkin language.
///
/// The first entry of each list is the one the formatter writes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dialect {
    feature: Vec<String>,
    background: Vec<String>,
    rule: Vec<String>,
    scenario: Vec<String>,
    scenario_outline: Vec<String>,
    examples: Vec<String>,
}

impl Dialect {
    /// Vocabulary for a language code; unknown codes and `None` give English.
    #[must_use]
    pub fn for_language(language: Option<&str>) -> &'static Self {
        match language {
            None | Some(DEFAULT_LANGUAGE) => &*ENGLISH,
            Some(code) => DIALECTS.get(code).unwrap_or_else(|| {
                warn!(language = code, "unknown Gherkin language; using English keywords");
                &*ENGLISH
            }),
        }
    }

    /// Whether `code` names a bundled dialect.
    #[must_use]
    pub fn is_known(code: &str) -> bool {
        code == DEFAULT_LANGUAGE || DIALECTS.contains_key(code)
    }

    /// True when `keyword` contains one of this language's outline keywords.
    ///
    /// English markers are always accepted so an edited keyword still counts.
    #[must_use]
    pub fn is_outline_keyword(&self, keyword: &str) -> bool {
        let keyword = keyword.trim();
        self.scenario_outline
            .iter()
            .chain(ENGLISH.scenario_outline.iter())
            .map(|marker| marker.trim())
            .any(|marker| !marker.is_empty() && keyword.contains(marker))
    }

    /// `Feature` keyword.
    #[must_use]
    pub fn feature(&self) -> &str {
        first(&self.feature, "Feature")
    }

    /// `Background` keyword.
    #[must_use]
    pub fn background(&self) -> &str {
        first(&self.background, "Background")
    }

    /// `Rule` keyword.
    #[must_use]
    pub fn rule(&self) -> &str {
        first(&self.rule, "Rule")
    }

    /// `Scenario` or `Scenario Outline` keyword.
    #[must_use]
    pub fn scenario(&self, is_outline: bool) -> &str {
        if is_outline {
            first(&self.scenario_outline, "Scenario Outline")
        } else {
            first(&self.scenario, "Scenario")
        }
    }

    /// `Examples` keyword.
    #[must_use]
    pub fn examples(&self) -> &str {
        first(&self.examples, "Examples")
    }
}

fn first<'a>(list: &'a [String], fallback: &'static str) -> &'a str {
    list.first().map_or(fallback, |word| word.trim())
}

/// The `# language:` code declared before the feature, if any.
///
/// Only blank lines may precede the directive.
#[must_use]
pub fn declared_language(text: &str) -> Option<String> {
    let line = text.lines().map(str::trim).find(|line| !line.is_empty())?;
    let code = line
        .strip_prefix('#')?
        .trim_start()
        .strip_prefix("language")?
        .trim_start()
        .strip_prefix(':')?
        .trim();
    (!code.is_empty()).then(|| code.to_string())
}
