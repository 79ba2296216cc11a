//! Messages a host broadcasts to connected editors after a mutation.
//!
//! The wire shape is a flat JSON object keyed by `action`. Field edits and
//! global tag changes share the `featureUpdated` action and are told apart by
//! the keys they carry.

use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use crate::document::DocumentId;
use crate::writer::ExportReport;

/// A change the host should announce.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A single field or tag set of one document changed.
    FieldUpdated {
        /// Edited document.
        document_id: DocumentId,
        /// Field path or tag set that changed.
        field: String,
        /// Value after the change.
        new_value: Value,
    },
    /// A tag was removed from every document.
    TagDeleted {
        /// Removed tag name.
        tag: String,
    },
    /// A tag was renamed in every document.
    TagRenamed {
        /// Previous tag name.
        tag: String,
        /// Replacement tag name.
        new_tag: String,
    },
    /// The working copy was discarded and rediscovered.
    Reset,
    /// Documents were written to the output directory.
    Saved {
        /// Number of files written.
        written: usize,
        /// Number of documents that failed to export.
        failed: usize,
    },
    /// A mutation was refused for a reason the user should see.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

impl Notification {
    /// Summarise an export.
    #[must_use]
    pub fn saved(report: &ExportReport) -> Self {
        Self::Saved {
            written: report.written.len(),
            failed: report.failures.len(),
        }
    }

    /// Report that a rename target is already present.
    #[must_use]
    pub fn tag_exists(new_tag: &str) -> Self {
        Self::Error {
            message: format!("{new_tag} already exists"),
        }
    }

    /// The `action` key this notification is sent under.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::FieldUpdated { .. } | Self::TagDeleted { .. } | Self::TagRenamed { .. } => {
                "featureUpdated"
            }
            Self::Reset => "reset",
            Self::Saved { .. } => "saved",
            Self::Error { .. } => "error",
        }
    }

    /// The JSON payload sent to editors.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let action = self.action();
        match self {
            Self::FieldUpdated {
                document_id,
                field,
                new_value,
            } => json!({
                "action": action,
                "documentId": document_id,
                "field": field,
                "newValue": new_value,
            }),
            Self::TagDeleted { tag } => json!({ "action": action, "tag": tag }),
            Self::TagRenamed { tag, new_tag } => {
                json!({ "action": action, "tag": tag, "newTag": new_tag })
            }
            Self::Reset => json!({ "action": action }),
            Self::Saved { written, failed } => {
                json!({ "action": action, "written": written, "failed": failed })
            }
            Self::Error { message } => json!({ "action": action, "message": message }),
        }
    }
}

impl Serialize for Notification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn field_updates_carry_document_and_value() {
        let notification = Notification::FieldUpdated {
            document_id: DocumentId::from("doc-1"),
            field: "feature.name".to_string(),
            new_value: json!("Basket"),
        };
        assert_eq!(
            notification.to_json(),
            json!({
                "action": "featureUpdated",
                "documentId": "doc-1",
                "field": "feature.name",
                "newValue": "Basket",
            })
        );
    }

    #[rstest]
    #[case(Notification::TagDeleted { tag: "@wip".into() }, json!({"action": "featureUpdated", "tag": "@wip"}))]
    #[case(
        Notification::TagRenamed { tag: "@wip".into(), new_tag: "@done".into() },
        json!({"action": "featureUpdated", "tag": "@wip", "newTag": "@done"})
    )]
    #[case(Notification::Reset, json!({"action": "reset"}))]
    #[case(Notification::tag_exists("@done"), json!({"action": "error", "message": "@done already exists"}))]
    fn payload_shapes(#[case] notification: Notification, #[case] expected: Value) {
        assert_eq!(notification.to_json(), expected);
    }

    #[test]
    fn serializes_through_serde() {
        let Ok(text) = serde_json::to_string(&Notification::Reset) else {
            panic!("notification should serialize");
        };
        assert_eq!(text, r#"{"action":"reset"}"#);
    }

    #[test]
    fn saved_counts_the_report() {
        let report = ExportReport {
            written: vec!["a.feature".into(), "b.feature".into()],
            failures: Vec::new(),
        };
        assert_eq!(
            Notification::saved(&report),
            Notification::Saved {
                written: 2,
                failed: 0
            }
        );
    }
}
