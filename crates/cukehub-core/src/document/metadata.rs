//! Derived fields recomputed after parsing and after every structural edit.

use super::{Child, Dialect, Document, DocumentId, Scenario, TagIndexEntry};

impl Document {
    /// Recompute `isOutline`, the step and example counts, and the tag index.
    pub fn refresh_metadata(&mut self) {
        let dialect = self.feature.dialect();
        for scenario in self.feature.scenarios_mut() {
            scenario.refresh_metadata(dialect);
        }
        self.tag_index = build_tag_index(self);
    }
}

impl Scenario {
    /// Recompute the fields derived from the keyword, steps and examples.
    ///
    /// Outline-ness follows the keyword text in `dialect`, never the presence
    /// of examples.
    pub fn refresh_metadata(&mut self, dialect: &Dialect) {
        self.is_outline = dialect.is_outline_keyword(&self.keyword);
        self.number_of_steps = self.steps.len();
        self.number_of_examples = self.examples.iter().map(|table| table.rows.len()).sum();
    }
}

fn build_tag_index(document: &Document) -> Vec<TagIndexEntry> {
    let mut entries: Vec<TagIndexEntry> = document
        .feature
        .tags
        .iter()
        .map(|tag| TagIndexEntry {
            tag_name: tag.name.clone(),
            scenario_name: None,
            rule_name: None,
            document_id: document.id.clone(),
        })
        .collect();
    index_children(&document.feature.children, None, &document.id, &mut entries);
    entries
}

fn index_children(
    children: &[Child],
    rule_name: Option<&str>,
    document_id: &DocumentId,
    entries: &mut Vec<TagIndexEntry>,
) {
    for child in children {
        match child {
            Child::Scenario(scenario) => {
                entries.extend(scenario.tags.iter().map(|tag| TagIndexEntry {
                    tag_name: tag.name.clone(),
                    scenario_name: Some(scenario.name.clone()),
                    rule_name: rule_name.map(str::to_string),
                    document_id: document_id.clone(),
                }));
            }
            Child::Rule(rule) => {
                entries.extend(rule.tags.iter().map(|tag| TagIndexEntry {
                    tag_name: tag.name.clone(),
                    scenario_name: None,
                    rule_name: Some(rule.name.clone()),
                    document_id: document_id.clone(),
                }));
                index_children(&rule.children, Some(&rule.name), document_id, entries);
            }
            Child::Background(_) => {}
        }
    }
}
