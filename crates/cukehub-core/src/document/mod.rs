//! Editable document model for a single `.feature` file.
//!
//! The model mirrors the shape a browser client edits: a [`Document`] wraps a
//! [`Feature`], whose ordered [`Child`] nodes are backgrounds, scenarios and
//! rules. Serialization uses camelCase keys and externally tagged children, so
//! a scenario name is addressed as `feature.children[0].scenario.name`.
//!
//! Tag state is authoritative on the nodes themselves. [`Document::tag_index`]
//! is a denormalised cache rebuilt by [`Document::refresh_metadata`] and must
//! not be trusted after a mutation.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

mod dialect;
mod metadata;
mod tags;

pub use dialect::{DEFAULT_LANGUAGE, Dialect, declared_language};
pub use tags::{Tag, is_valid_tag_name};

/// Opaque identifier of a parsed document.
///
/// Generated at parse time and stable for the lifetime of the working copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

/// Identifier of a scenario, unique within its document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(String);

macro_rules! opaque_id {
    ($ty:ident) => {
        impl $ty {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Borrow the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $ty {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(DocumentId);
opaque_id!(ScenarioId);

/// One parsed `.feature` file in the working copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// External addressing key for every mutation operation.
    pub id: DocumentId,
    /// Absolute path of the originating file (empty for in-memory sources).
    pub source_path: PathBuf,
    /// Path relative to the configured root directory.
    pub relative_path: PathBuf,
    /// The feature described by the file.
    pub feature: Feature,
    /// Flattened tag occurrences, rebuilt by [`Document::refresh_metadata`].
    #[serde(default)]
    pub tag_index: Vec<TagIndexEntry>,
}

/// Top-level feature node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    /// `# language:` code of the source; `None` means English.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Feature title; an empty name cannot be rendered.
    pub name: String,
    /// Free-text description block, kept as one opaque string.
    #[serde(default)]
    pub description: Option<String>,
    /// Feature-level tags in source order.
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Backgrounds, scenarios and rules in source order.
    #[serde(default)]
    pub children: Vec<Child>,
}

/// A child node of a [`Feature`] or [`Rule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Child {
    /// Steps shared by every scenario of the container.
    Background(Background),
    /// A scenario or scenario outline.
    Scenario(Scenario),
    /// A `Rule:` grouping of scenarios.
    Rule(Rule),
}

/// Background block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    /// Optional title following `Background:`.
    #[serde(default)]
    pub name: Option<String>,
    /// Steps in source order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Scenario or scenario outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Document-local identifier used by tag mutations.
    pub id: ScenarioId,
    /// Keyword text as written (`Scenario`, `Scenario Outline`, `Plan du scénario`, ...).
    pub keyword: String,
    /// Scenario title.
    pub name: String,
    /// Free-text description block.
    #[serde(default)]
    pub description: Option<String>,
    /// Scenario-level tags in source order.
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Steps in source order.
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Derived from [`Scenario::keyword`] in the document's language;
    /// independent of `examples`.
    #[serde(default)]
    pub is_outline: bool,
    /// Examples tables; normally only present on outlines.
    #[serde(default)]
    pub examples: Vec<ExampleTable>,
    /// Derived: `steps.len()`.
    #[serde(default)]
    pub number_of_steps: usize,
    /// Derived: total data rows across every examples table.
    #[serde(default)]
    pub number_of_examples: usize,
}

/// `Rule:` block holding its own background and scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Rule title.
    pub name: String,
    /// Rule-level tags in source order.
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Background and scenarios of the rule.
    #[serde(default)]
    pub children: Vec<Child>,
}

/// A single step line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Keyword including its trailing space, e.g. `"Given "`.
    pub keyword: String,
    /// Remainder of the step line.
    pub text: String,
    /// Attached data table argument.
    #[serde(default)]
    pub data_table: Option<Table>,
    /// Attached doc string argument.
    #[serde(default)]
    pub doc_string: Option<String>,
}

/// Pipe-delimited table. Cell values are stored unescaped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// First row of the table.
    #[serde(default)]
    pub header: Vec<String>,
    /// Remaining rows.
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

/// One `Examples:` block of an outline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleTable {
    /// Tags attached to the examples block.
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Column names.
    #[serde(default)]
    pub header: Vec<String>,
    /// Data rows, one per generated scenario.
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

/// One occurrence of a tag, as recorded in [`Document::tag_index`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagIndexEntry {
    /// Tag name including `@`.
    pub tag_name: String,
    /// Owning scenario; absent for feature- and rule-level tags.
    #[serde(default)]
    pub scenario_name: Option<String>,
    /// Owning rule, when the tag sits on or inside a rule.
    #[serde(default)]
    pub rule_name: Option<String>,
    /// Document the tag belongs to.
    pub document_id: DocumentId,
}

impl Document {
    /// Wrap a feature into a document with a fresh identifier.
    ///
    /// Derived metadata is computed immediately.
    #[must_use]
    pub fn new(source_path: PathBuf, relative_path: PathBuf, feature: Feature) -> Self {
        let mut document = Self {
            id: DocumentId::generate(),
            source_path,
            relative_path,
            feature,
            tag_index: Vec::new(),
        };
        document.refresh_metadata();
        document
    }

    /// Resolve the tag set addressed by an optional scenario id.
    ///
    /// `None` selects the feature's own tags; `Some` selects the tags of the
    /// matching scenario anywhere in the document.
    pub fn tag_set_mut(&mut self, scenario_id: Option<&ScenarioId>) -> Option<&mut Vec<Tag>> {
        match scenario_id {
            None => Some(&mut self.feature.tags),
            Some(id) => self
                .feature
                .find_scenario_mut(id)
                .map(|scenario| &mut scenario.tags),
        }
    }
}

impl Feature {
    /// Keyword vocabulary of the feature's language.
    #[must_use]
    pub fn dialect(&self) -> &'static Dialect {
        Dialect::for_language(self.language.as_deref())
    }

    /// Every scenario in document order, including those nested in rules.
    #[must_use]
    pub fn scenarios(&self) -> Vec<&Scenario> {
        let mut found = Vec::new();
        collect_scenarios(&self.children, &mut found);
        found
    }

    /// Mutable variant of [`Feature::scenarios`].
    pub fn scenarios_mut(&mut self) -> Vec<&mut Scenario> {
        let mut found = Vec::new();
        collect_scenarios_mut(&mut self.children, &mut found);
        found
    }

    /// Find a scenario by identifier.
    pub fn find_scenario_mut(&mut self, id: &ScenarioId) -> Option<&mut Scenario> {
        self.scenarios_mut()
            .into_iter()
            .find(|scenario| &scenario.id == id)
    }

    /// Every scenario paired with the tags it inherits from the feature and
    /// its enclosing rule.
    #[must_use]
    pub fn scenarios_with_inherited_tags(&self) -> Vec<(&Scenario, Vec<&Tag>)> {
        let inherited: Vec<&Tag> = self.tags.iter().collect();
        let mut found = Vec::new();
        for child in &self.children {
            match child {
                Child::Scenario(scenario) => found.push((scenario, inherited.clone())),
                Child::Rule(rule) => {
                    let mut rule_tags = inherited.clone();
                    rule_tags.extend(rule.tags.iter());
                    for scenario in rule.scenarios() {
                        found.push((scenario, rule_tags.clone()));
                    }
                }
                Child::Background(_) => {}
            }
        }
        found
    }

    /// Field path of a scenario in the serialized document, for example
    /// `feature.children[2].scenario` or
    /// `feature.children[3].rule.children[0].scenario`.
    #[must_use]
    pub fn scenario_field_path(&self, id: &ScenarioId) -> Option<String> {
        self.children.iter().enumerate().find_map(|(index, child)| match child {
            Child::Scenario(scenario) if &scenario.id == id => {
                Some(format!("feature.children[{index}].scenario"))
            }
            Child::Rule(rule) => rule.children.iter().enumerate().find_map(|(inner, child)| {
                matches!(child, Child::Scenario(scenario) if &scenario.id == id).then(|| {
                    format!("feature.children[{index}].rule.children[{inner}].scenario")
                })
            }),
            _ => None,
        })
    }

    /// Every tag set of the feature: its own, each rule's and each scenario's.
    ///
    /// Examples-level tags are not included.
    #[must_use]
    pub fn tag_sets(&self) -> Vec<&Vec<Tag>> {
        let mut sets = vec![&self.tags];
        collect_tag_sets(&self.children, &mut sets);
        sets
    }

    /// Mutable variant of [`Feature::tag_sets`].
    pub fn tag_sets_mut(&mut self) -> Vec<&mut Vec<Tag>> {
        let mut sets = vec![&mut self.tags];
        collect_tag_sets_mut(&mut self.children, &mut sets);
        sets
    }
}

impl Rule {
    /// Scenarios of the rule in source order.
    #[must_use]
    pub fn scenarios(&self) -> Vec<&Scenario> {
        let mut found = Vec::new();
        collect_scenarios(&self.children, &mut found);
        found
    }
}

fn collect_scenarios<'a>(children: &'a [Child], found: &mut Vec<&'a Scenario>) {
    for child in children {
        match child {
            Child::Scenario(scenario) => found.push(scenario),
            Child::Rule(rule) => collect_scenarios(&rule.children, found),
            Child::Background(_) => {}
        }
    }
}

fn collect_scenarios_mut<'a>(children: &'a mut [Child], found: &mut Vec<&'a mut Scenario>) {
    for child in children {
        match child {
            Child::Scenario(scenario) => found.push(scenario),
            Child::Rule(rule) => collect_scenarios_mut(&mut rule.children, found),
            Child::Background(_) => {}
        }
    }
}

fn collect_tag_sets<'a>(children: &'a [Child], sets: &mut Vec<&'a Vec<Tag>>) {
    for child in children {
        match child {
            Child::Scenario(scenario) => sets.push(&scenario.tags),
            Child::Rule(rule) => {
                sets.push(&rule.tags);
                collect_tag_sets(&rule.children, sets);
            }
            Child::Background(_) => {}
        }
    }
}

fn collect_tag_sets_mut<'a>(children: &'a mut [Child], sets: &mut Vec<&'a mut Vec<Tag>>) {
    for child in children {
        match child {
            Child::Scenario(scenario) => sets.push(&mut scenario.tags),
            Child::Rule(rule) => {
                sets.push(&mut rule.tags);
                collect_tag_sets_mut(&mut rule.children, sets);
            }
            Child::Background(_) => {}
        }
    }
}
