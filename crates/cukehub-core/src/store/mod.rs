//! The in-memory working copy of every discovered document.
//!
//! [`DocumentStore`] is an explicitly owned value: hosts construct it, load it
//! from discovery, mutate it through the operations below and hand it to the
//! writer on export. Nothing here touches the filesystem.
//!
//! Mutations report failure through coarse sentinels (`false`, `None`,
//! [`RenameOutcome`]) rather than errors, and a rejected mutation leaves the
//! store untouched. Each rejection is logged at debug level.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use serde_json::Value;
use tracing::debug;

use crate::document::{Document, DocumentId, ScenarioId, Tag, is_valid_tag_name};
use crate::tag_expr::TagExpression;

mod field_path;

pub use field_path::{FieldPath, FieldPathError, PathSegment};

/// Result of [`DocumentStore::rename_tag_everywhere`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    /// At least one occurrence was renamed and no collision occurred.
    Renamed,
    /// No tag set carried the old name.
    NotFound,
    /// At least one tag set already carried the new name. Occurrences in
    /// other tag sets may have been renamed regardless.
    Collision,
    /// The new name violates the tag naming rules; nothing changed.
    InvalidName,
}

/// A scenario selected by a tag expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioMatch {
    /// Owning document.
    pub document_id: DocumentId,
    /// Path of the owning document relative to the root directory.
    pub relative_path: PathBuf,
    /// Matched scenario.
    pub scenario_id: ScenarioId,
    /// Name of the matched scenario.
    pub scenario_name: String,
}

/// Documents keyed by id, kept in discovery order.
#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    documents: Vec<Document>,
    positions: HashMap<DocumentId, usize>,
}

impl DocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole snapshot.
    pub fn load(&mut self, documents: Vec<Document>) {
        self.positions = documents
            .iter()
            .enumerate()
            .map(|(position, document)| (document.id.clone(), position))
            .collect();
        self.documents = documents;
        debug!(count = self.documents.len(), "loaded working copy");
    }

    /// Discard every document.
    pub fn clear(&mut self) {
        self.documents.clear();
        self.positions.clear();
    }

    /// Every document in load order.
    #[must_use]
    pub fn list(&self) -> &[Document] {
        &self.documents
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` when the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Look a document up by id.
    #[must_use]
    pub fn find_by_id(&self, id: &DocumentId) -> Option<&Document> {
        self.positions
            .get(id)
            .and_then(|position| self.documents.get(*position))
    }

    /// Mutable variant of [`DocumentStore::find_by_id`].
    pub fn find_by_id_mut(&mut self, id: &DocumentId) -> Option<&mut Document> {
        self.positions
            .get(id)
            .and_then(|position| self.documents.get_mut(*position))
    }

    /// Replace the value at `path` inside a document.
    ///
    /// The path addresses the camelCase serialized form, for example
    /// `feature.name` or `feature.children[0].scenario.tags`. Returns the
    /// updated document, or `None` without mutating anything when:
    ///
    /// - the document or path does not exist, or the path is malformed
    /// - the path names a read-only field (see
    ///   [`FieldPath::targets_read_only_field`])
    /// - the value does not fit the field
    /// - a tag value is invalid or the edited tag set would hold a duplicate
    ///
    /// Derived metadata is recomputed after a successful edit.
    pub fn set_field(&mut self, id: &DocumentId, path: &str, value: Value) -> Option<&Document> {
        let field_path = match FieldPath::parse(path) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(%err, "rejected field edit");
                return None;
            }
        };
        if field_path.targets_read_only_field() {
            debug!(path, "rejected edit of read-only field");
            return None;
        }
        let Some(value) = field_path.prepare_value(value) else {
            debug!(path, "rejected invalid tag value");
            return None;
        };

        let document = self.find_by_id_mut(id)?;
        let mut tree = serde_json::to_value(&*document).ok()?;
        let Some(slot) = field_path.resolve_mut(&mut tree) else {
            debug!(path, document = %id, "field path not found");
            return None;
        };
        *slot = value;
        if field_path.tag_set_has_duplicates(&tree) {
            debug!(path, document = %id, "rejected duplicate tag");
            return None;
        }
        let mut updated: Document = match serde_json::from_value(tree) {
            Ok(updated) => updated,
            Err(err) => {
                debug!(path, %err, "value does not fit field");
                return None;
            }
        };
        if updated.feature.language != document.feature.language {
            debug!(path, document = %id, "rejected change of document language");
            return None;
        }
        updated.refresh_metadata();
        *document = updated;
        Some(document)
    }

    /// Add a tag to the feature (`scenario_id == None`) or to one scenario.
    ///
    /// Returns `false` when the name is invalid, the document or scenario is
    /// unknown, or the tag set already holds the name. Only the addressed tag
    /// set changes.
    pub fn add_tag(
        &mut self,
        id: &DocumentId,
        scenario_id: Option<&ScenarioId>,
        tag_name: &str,
    ) -> bool {
        if !is_valid_tag_name(tag_name) {
            debug!(tag = tag_name, "rejected invalid tag name");
            return false;
        }
        let Some(document) = self.find_by_id_mut(id) else {
            return false;
        };
        let Some(tags) = document.tag_set_mut(scenario_id) else {
            return false;
        };
        if tags.iter().any(|tag| tag.name == tag_name) {
            return false;
        }
        tags.push(Tag::new(tag_name));
        document.refresh_metadata();
        true
    }

    /// Remove a tag from the feature or from one scenario.
    ///
    /// Returns `false` when nothing was removed.
    pub fn remove_tag(
        &mut self,
        id: &DocumentId,
        scenario_id: Option<&ScenarioId>,
        tag_name: &str,
    ) -> bool {
        let Some(document) = self.find_by_id_mut(id) else {
            return false;
        };
        let Some(tags) = document.tag_set_mut(scenario_id) else {
            return false;
        };
        let before = tags.len();
        tags.retain(|tag| tag.name != tag_name);
        let removed = tags.len() != before;
        if removed {
            document.refresh_metadata();
        }
        removed
    }

    /// Remove `tag_name` from every feature, rule and scenario tag set.
    ///
    /// Returns `true` when at least one occurrence was removed.
    pub fn delete_tag_everywhere(&mut self, tag_name: &str) -> bool {
        let mut removed = 0usize;
        for document in &mut self.documents {
            let mut touched = false;
            for tags in document.feature.tag_sets_mut() {
                let before = tags.len();
                tags.retain(|tag| tag.name != tag_name);
                if tags.len() != before {
                    removed += before - tags.len();
                    touched = true;
                }
            }
            if touched {
                document.refresh_metadata();
            }
        }
        debug!(tag = tag_name, removed, "deleted tag everywhere");
        removed > 0
    }

    /// Rename `old_name` to `new_name` in every tag set.
    ///
    /// Tag sets that already carry `new_name` keep `old_name` and flag a
    /// collision; other occurrences are renamed in place. The batch is not
    /// rolled back on collision.
    pub fn rename_tag_everywhere(&mut self, old_name: &str, new_name: &str) -> RenameOutcome {
        if !is_valid_tag_name(new_name) {
            debug!(tag = new_name, "rejected invalid tag name");
            return RenameOutcome::InvalidName;
        }
        let mut found = false;
        let mut collision = false;
        for document in &mut self.documents {
            let mut touched = false;
            for tags in document.feature.tag_sets_mut() {
                if !tags.iter().any(|tag| tag.name == old_name) {
                    continue;
                }
                found = true;
                if tags.iter().any(|tag| tag.name == new_name) {
                    collision = true;
                    continue;
                }
                for tag in tags.iter_mut().filter(|tag| tag.name == old_name) {
                    tag.name = new_name.to_string();
                }
                touched = true;
            }
            if touched {
                document.refresh_metadata();
            }
        }
        let outcome = match (found, collision) {
            (false, _) => RenameOutcome::NotFound,
            (true, true) => RenameOutcome::Collision,
            (true, false) => RenameOutcome::Renamed,
        };
        debug!(from = old_name, to = new_name, ?outcome, "renamed tag everywhere");
        outcome
    }

    /// Every distinct tag name currently attached to a feature, rule or
    /// scenario, sorted.
    ///
    /// Computed by scanning the nodes, so it is accurate after mutations.
    #[must_use]
    pub fn all_tags(&self) -> Vec<String> {
        self.documents
            .iter()
            .flat_map(|document| document.feature.tag_sets())
            .flatten()
            .map(|tag| tag.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Tags named in `expression` that no feature, rule or scenario carries,
    /// in the order the expression first mentions them.
    #[must_use]
    pub fn unknown_tags(&self, expression: &TagExpression) -> Vec<String> {
        let known = self.all_tags();
        expression
            .tags()
            .into_iter()
            .filter(|tag| known.binary_search_by(|name| name.as_str().cmp(tag)).is_err())
            .map(str::to_string)
            .collect()
    }

    /// Scenarios whose inherited tags satisfy `expression`.
    ///
    /// A scenario inherits the tags of its feature and of its enclosing rule.
    #[must_use]
    pub fn select_scenarios(&self, expression: &TagExpression) -> Vec<ScenarioMatch> {
        let mut matches = Vec::new();
        for document in &self.documents {
            for (scenario, inherited) in document.feature.scenarios_with_inherited_tags() {
                let tags = inherited
                    .iter()
                    .copied()
                    .chain(scenario.tags.iter())
                    .map(|tag| tag.name.as_str());
                if expression.evaluate(tags) {
                    matches.push(ScenarioMatch {
                        document_id: document.id.clone(),
                        relative_path: document.relative_path.clone(),
                        scenario_id: scenario.id.clone(),
                        scenario_name: scenario.name.clone(),
                    });
                }
            }
        }
        matches
    }
}
