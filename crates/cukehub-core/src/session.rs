//! A host-owned editing session.
//!
//! [`EditorSession`] pairs the active [`EditorConfig`] with the working copy.
//! The store is populated from disk on first access and every operation runs
//! under a single lock, so hosts can share one session between request
//! handlers. Mutating calls return the [`Notification`] the host should
//! broadcast, or `None` when nothing changed.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, info};

use crate::config::EditorConfig;
use crate::discovery::{DiscoveryFailure, discover_with_report};
use crate::document::{DocumentId, ScenarioId, Tag};
use crate::error::{ConfigError, SessionError};
use crate::notification::Notification;
use crate::store::{DocumentStore, RenameOutcome, ScenarioMatch};
use crate::tag_expr::TagExpression;
use crate::test_command::TestCommand;
use crate::writer::{ExportReport, export_documents};

#[derive(Debug, Default)]
struct WorkingCopy {
    store: DocumentStore,
    loaded: bool,
    failures: Vec<DiscoveryFailure>,
}

impl WorkingCopy {
    fn populate(&mut self, config: &EditorConfig) -> Result<(), ConfigError> {
        let root = config.require_root_dir()?;
        let report = discover_with_report(root, &config.exclusion_filter());
        info!(
            root = %root.display(),
            documents = report.documents.len(),
            failures = report.failures.len(),
            "working copy loaded"
        );
        self.store.load(report.documents);
        self.failures = report.failures;
        self.loaded = true;
        Ok(())
    }

    fn invalidate(&mut self) {
        self.store.clear();
        self.failures.clear();
        self.loaded = false;
    }
}

/// Configuration plus the lazily loaded working copy.
#[derive(Debug)]
pub struct EditorSession {
    config: RwLock<EditorConfig>,
    working_copy: Mutex<WorkingCopy>,
}

impl EditorSession {
    /// Create a session. Nothing is read from disk until first access.
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config: RwLock::new(config),
            working_copy: Mutex::new(WorkingCopy::default()),
        }
    }

    /// A copy of the active configuration.
    #[must_use]
    pub fn config(&self) -> EditorConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the configuration.
    ///
    /// When the new configuration differs, the working copy is discarded and
    /// reloaded on next access, and a [`Notification::Reset`] is returned.
    pub fn reload_config(&self, config: EditorConfig) -> Option<Notification> {
        let mut current = self.config.write().unwrap_or_else(PoisonError::into_inner);
        if *current == config {
            debug!("configuration unchanged");
            return None;
        }
        *current = config;
        self.lock().invalidate();
        info!("configuration reloaded; working copy discarded");
        Some(Notification::Reset)
    }

    /// Populate the working copy if it has not been loaded yet.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] when no root directory is configured.
    pub fn ensure_loaded(&self) -> Result<(), SessionError> {
        self.with_store(|_| ())
    }

    /// Discard every unsaved edit and rediscover from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] when no root directory is configured.
    pub fn reset(&self) -> Result<Notification, SessionError> {
        let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
        self.lock().populate(&config)?;
        Ok(Notification::Reset)
    }

    /// Files dropped by the most recent discovery.
    #[must_use]
    pub fn discovery_failures(&self) -> Vec<DiscoveryFailure> {
        self.lock().failures.clone()
    }

    /// Run `f` against the loaded store while holding the session lock.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] when the store must be loaded and no
    /// root directory is configured.
    pub fn with_store<R>(&self, f: impl FnOnce(&mut DocumentStore) -> R) -> Result<R, SessionError> {
        let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
        let mut working_copy = self.lock();
        if !working_copy.loaded {
            working_copy.populate(&config)?;
        }
        Ok(f(&mut working_copy.store))
    }

    /// Replace one field of a document.
    ///
    /// # Errors
    ///
    /// Fails only when the store cannot be loaded.
    pub fn set_field(
        &self,
        id: &DocumentId,
        path: &str,
        value: Value,
    ) -> Result<Option<Notification>, SessionError> {
        let announced = value.clone();
        self.with_store(|store| {
            store.set_field(id, path, value).map(|_| Notification::FieldUpdated {
                document_id: id.clone(),
                field: path.to_string(),
                new_value: announced,
            })
        })
    }

    /// Add a tag to a feature or scenario.
    ///
    /// # Errors
    ///
    /// Fails only when the store cannot be loaded.
    pub fn add_tag(
        &self,
        id: &DocumentId,
        scenario_id: Option<&ScenarioId>,
        tag_name: &str,
    ) -> Result<Option<Notification>, SessionError> {
        self.with_store(|store| {
            store
                .add_tag(id, scenario_id, tag_name)
                .then(|| tag_set_update(store, id, scenario_id))
                .flatten()
        })
    }

    /// Remove a tag from a feature or scenario.
    ///
    /// # Errors
    ///
    /// Fails only when the store cannot be loaded.
    pub fn remove_tag(
        &self,
        id: &DocumentId,
        scenario_id: Option<&ScenarioId>,
        tag_name: &str,
    ) -> Result<Option<Notification>, SessionError> {
        self.with_store(|store| {
            store
                .remove_tag(id, scenario_id, tag_name)
                .then(|| tag_set_update(store, id, scenario_id))
                .flatten()
        })
    }

    /// Remove a tag from every document.
    ///
    /// # Errors
    ///
    /// Fails only when the store cannot be loaded.
    pub fn delete_tag_everywhere(&self, tag_name: &str) -> Result<Option<Notification>, SessionError> {
        self.with_store(|store| {
            store
                .delete_tag_everywhere(tag_name)
                .then(|| Notification::TagDeleted {
                    tag: tag_name.to_string(),
                })
        })
    }

    /// Rename a tag in every document.
    ///
    /// A collision yields a [`Notification::Error`] naming the existing tag.
    ///
    /// # Errors
    ///
    /// Fails only when the store cannot be loaded.
    pub fn rename_tag_everywhere(
        &self,
        old_name: &str,
        new_name: &str,
    ) -> Result<Option<Notification>, SessionError> {
        self.with_store(|store| match store.rename_tag_everywhere(old_name, new_name) {
            RenameOutcome::Renamed => Some(Notification::TagRenamed {
                tag: old_name.to_string(),
                new_tag: new_name.to_string(),
            }),
            RenameOutcome::Collision => Some(Notification::tag_exists(new_name)),
            RenameOutcome::NotFound | RenameOutcome::InvalidName => None,
        })
    }

    /// Every distinct tag in the working copy.
    ///
    /// # Errors
    ///
    /// Fails only when the store cannot be loaded.
    pub fn all_tags(&self) -> Result<Vec<String>, SessionError> {
        self.with_store(|store| store.all_tags())
    }

    /// Scenarios matching a tag expression.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::TagExpression`] for a malformed expression.
    pub fn select_scenarios(&self, expression: &str) -> Result<Vec<ScenarioMatch>, SessionError> {
        let expression = TagExpression::parse(expression)?;
        self.with_store(|store| {
            let unknown = store.unknown_tags(&expression);
            if !unknown.is_empty() {
                debug!(expression = %expression, ?unknown, "expression names tags no document carries");
            }
            store.select_scenarios(&expression)
        })
    }

    /// Tags named in `expression` that no document in the working copy carries.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::TagExpression`] for a malformed expression.
    pub fn unknown_tags(&self, expression: &str) -> Result<Vec<String>, SessionError> {
        let expression = TagExpression::parse(expression)?;
        self.with_store(|store| store.unknown_tags(&expression))
    }

    /// The configured test command with `expression` substituted.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::TagExpression`] for a malformed expression and
    /// [`SessionError::Config`] when no usable command is configured.
    pub fn test_command(&self, expression: &str) -> Result<String, SessionError> {
        let expression = TagExpression::parse(expression)?;
        let command = TestCommand::from_config(&self.config())?;
        Ok(command.render(&expression))
    }

    /// Write every document to the configured output directory.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] when the root or output directory is
    /// unset. Per-document failures are reported in the [`ExportReport`].
    pub fn export(&self) -> Result<ExportReport, SessionError> {
        let target = self.config().export_target()?;
        self.with_store(|store| export_documents(store.list(), &target))
    }

    fn lock(&self) -> MutexGuard<'_, WorkingCopy> {
        self.working_copy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn tag_set_update(
    store: &DocumentStore,
    id: &DocumentId,
    scenario_id: Option<&ScenarioId>,
) -> Option<Notification> {
    let document = store.find_by_id(id)?;
    let (field, tags): (String, &[Tag]) = match scenario_id {
        None => ("feature.tags".to_string(), document.feature.tags.as_slice()),
        Some(scenario_id) => {
            let scenario = document
                .feature
                .scenarios()
                .into_iter()
                .find(|scenario| &scenario.id == scenario_id)?;
            let path = document.feature.scenario_field_path(scenario_id)?;
            (format!("{path}.tags"), scenario.tags.as_slice())
        }
    };
    Some(Notification::FieldUpdated {
        document_id: id.clone(),
        field,
        new_value: serde_json::to_value(tags).ok()?,
    })
}
