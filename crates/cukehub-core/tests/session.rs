//! Behavioural tests for the host-facing editing session.

use std::fs;

use cukehub_core::config::EditorConfig;
use cukehub_core::document::DocumentId;
use cukehub_core::error::{ConfigError, SessionError};
use cukehub_core::notification::Notification;
use cukehub_core::session::EditorSession;
use cukehub_core::test_support::{FeatureTree, minimal_feature};
use rstest::{fixture, rstest};
use serde_json::json;
use tempfile::TempDir;

struct Workspace {
    tree: FeatureTree,
    output: TempDir,
    session: EditorSession,
}

impl Workspace {
    fn config(tree: &FeatureTree, output: &TempDir) -> EditorConfig {
        EditorConfig {
            root_dir: Some(tree.root().to_path_buf()),
            output_dir: Some(output.path().to_path_buf()),
            keep_folder_structure: true,
            test_command: Some("cucumber --tags '@yourTag'".to_string()),
            ..EditorConfig::default()
        }
    }

    fn first_document(&self) -> DocumentId {
        self.session
            .with_store(|store| store.list().first().map(|d| d.id.clone()))
            .ok()
            .flatten()
            .unwrap_or_else(|| panic!("expected a loaded document"))
    }
}

#[fixture]
fn workspace() -> Workspace {
    let tree = FeatureTree::new()
        .with_file("a.feature", minimal_feature("Alpha", "First", "@flaky"))
        .with_file("b.feature", minimal_feature("Beta", "Second", "@flaky"));
    let output = TempDir::new().unwrap_or_else(|e| panic!("temp dir: {e}"));
    let session = EditorSession::new(Workspace::config(&tree, &output));
    Workspace {
        tree,
        output,
        session,
    }
}

#[rstest]
fn loads_lazily_on_first_access(workspace: Workspace) {
    let count = workspace.session.with_store(|store| store.len());
    assert_eq!(count.ok(), Some(2));
    assert!(workspace.session.discovery_failures().is_empty());
}

#[test]
fn missing_root_is_a_config_error() {
    let session = EditorSession::new(EditorConfig::default());
    let Err(err) = session.ensure_loaded() else {
        panic!("loading without a root must fail");
    };
    assert!(matches!(
        err,
        SessionError::Config(ConfigError::MissingSetting("directoryPath"))
    ));
}

#[rstest]
fn field_edits_announce_the_new_value(workspace: Workspace) {
    let id = workspace.first_document();
    let notification = workspace
        .session
        .set_field(&id, "feature.name", json!("Renamed"))
        .ok()
        .flatten();
    assert_eq!(
        notification,
        Some(Notification::FieldUpdated {
            document_id: id.clone(),
            field: "feature.name".to_string(),
            new_value: json!("Renamed"),
        })
    );
    let rejected = workspace
        .session
        .set_field(&id, "feature.missing", json!("x"))
        .ok()
        .flatten();
    assert!(rejected.is_none());
}

#[rstest]
#[case("sourcePath", json!("/elsewhere/../escaped.feature"))]
#[case("relativePath", json!("../escaped.feature"))]
#[case("feature.children[0].scenario.isOutline", json!(true))]
#[case("feature.tags", json!(["@dup", "@dup"]))]
fn rejected_field_edits_are_not_announced(
    workspace: Workspace,
    #[case] path: &str,
    #[case] value: serde_json::Value,
) {
    let id = workspace.first_document();
    let notification = workspace.session.set_field(&id, path, value).ok().flatten();
    assert!(notification.is_none());
    let Ok(report) = workspace.session.export() else {
        panic!("export should run");
    };
    assert!(report.is_success());
    assert!(report.written.iter().all(|path| path.starts_with(workspace.output.path())));
}

#[rstest]
fn tag_edits_announce_the_whole_tag_set(workspace: Workspace) {
    let id = workspace.first_document();
    let notification = workspace.session.add_tag(&id, None, "@new").ok().flatten();
    assert_eq!(
        notification,
        Some(Notification::FieldUpdated {
            document_id: id.clone(),
            field: "feature.tags".to_string(),
            new_value: json!([{ "name": "@new" }]),
        })
    );
    assert!(workspace.session.add_tag(&id, None, "@new").ok().flatten().is_none());
    assert!(workspace.session.remove_tag(&id, None, "@new").ok().flatten().is_some());
}

#[rstest]
fn scenario_tag_edits_name_the_scenario_path(workspace: Workspace) {
    let id = workspace.first_document();
    let scenario = workspace
        .session
        .with_store(|store| {
            store
                .find_by_id(&id)
                .and_then(|d| d.feature.scenarios().first().map(|s| s.id.clone()))
        })
        .ok()
        .flatten()
        .unwrap_or_else(|| panic!("expected a scenario"));
    let notification = workspace
        .session
        .add_tag(&id, Some(&scenario), "@slow")
        .ok()
        .flatten();
    let Some(Notification::FieldUpdated { field, new_value, .. }) = notification else {
        panic!("expected a field update");
    };
    assert_eq!(field, "feature.children[0].scenario.tags");
    assert_eq!(new_value, json!([{ "name": "@flaky" }, { "name": "@slow" }]));
}

#[rstest]
fn global_tag_operations_notify(workspace: Workspace) {
    assert_eq!(
        workspace.session.rename_tag_everywhere("@flaky", "@unstable").ok().flatten(),
        Some(Notification::TagRenamed {
            tag: "@flaky".to_string(),
            new_tag: "@unstable".to_string(),
        })
    );
    assert_eq!(
        workspace.session.delete_tag_everywhere("@unstable").ok().flatten(),
        Some(Notification::TagDeleted {
            tag: "@unstable".to_string()
        })
    );
    assert!(workspace.session.delete_tag_everywhere("@unstable").ok().flatten().is_none());
    assert_eq!(workspace.session.all_tags().ok(), Some(Vec::new()));
}

#[rstest]
fn rename_collision_becomes_an_error_notification(workspace: Workspace) {
    let id = workspace.first_document();
    assert!(workspace.session.add_tag(&id, None, "@flaky").ok().flatten().is_some());
    let Ok(Some(scenario_tag_added)) = workspace.session.with_store(|store| {
        store
            .find_by_id(&id)
            .and_then(|d| d.feature.scenarios().first().map(|s| s.id.clone()))
    }) else {
        panic!("expected a scenario");
    };
    assert!(workspace
        .session
        .add_tag(&id, Some(&scenario_tag_added), "@stable")
        .ok()
        .flatten()
        .is_some());
    assert_eq!(
        workspace.session.rename_tag_everywhere("@flaky", "@stable").ok().flatten(),
        Some(Notification::tag_exists("@stable"))
    );
}

#[rstest]
fn reset_discards_unsaved_edits(workspace: Workspace) {
    let id = workspace.first_document();
    assert!(workspace.session.delete_tag_everywhere("@flaky").ok().flatten().is_some());
    assert_eq!(workspace.session.reset().ok(), Some(Notification::Reset));
    assert_eq!(workspace.session.all_tags().ok(), Some(vec!["@flaky".to_string()]));
    let still_known = workspace.session.with_store(|store| store.find_by_id(&id).is_some());
    assert_eq!(still_known.ok(), Some(false));
}

#[rstest]
fn reload_resets_only_on_change(workspace: Workspace) {
    let same = Workspace::config(&workspace.tree, &workspace.output);
    assert!(workspace.session.reload_config(same.clone()).is_none());

    let narrowed = EditorConfig {
        exclude_patterns: "a.feature".to_string(),
        ..same
    };
    assert_eq!(
        workspace.session.reload_config(narrowed),
        Some(Notification::Reset)
    );
    assert_eq!(workspace.session.with_store(|store| store.len()).ok(), Some(1));
}

#[rstest]
fn selection_and_test_command(workspace: Workspace) {
    let Ok(matches) = workspace.session.select_scenarios("@flaky and not @wip") else {
        panic!("expression should parse");
    };
    assert_eq!(matches.len(), 2);
    assert_eq!(
        workspace.session.test_command("@flaky").ok().as_deref(),
        Some("cucumber --tags '@flaky'")
    );
    assert!(matches!(
        workspace.session.select_scenarios("@a and"),
        Err(SessionError::TagExpression(_))
    ));
    assert_eq!(
        workspace.session.unknown_tags("@flaky or @ghost").ok(),
        Some(vec!["@ghost".to_string()])
    );
}

#[rstest]
fn export_writes_the_working_copy(workspace: Workspace) {
    assert!(workspace
        .session
        .rename_tag_everywhere("@flaky", "@stable")
        .ok()
        .flatten()
        .is_some());
    let Ok(report) = workspace.session.export() else {
        panic!("export should run");
    };
    assert!(report.is_success());
    assert_eq!(
        Notification::saved(&report),
        Notification::Saved {
            written: 2,
            failed: 0
        }
    );
    let text = fs::read_to_string(workspace.output.path().join("a.feature"))
        .unwrap_or_else(|e| panic!("read export: {e}"));
    assert!(text.contains("@stable"));
    let source = fs::read_to_string(workspace.tree.path("a.feature"))
        .unwrap_or_else(|e| panic!("read source: {e}"));
    assert!(source.contains("@flaky"));
}
