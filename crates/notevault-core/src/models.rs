//! Core data models for NoteVault.
//!
//! Field names follow the backend's column names so rows round-trip through
//! `serde_json` without a mapping layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::defaults::{CONTRIBUTION_SUBJECT, UNCATEGORIZED_BRANCH};

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A shared document record as stored in the `notes` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Public locator of the stored PDF.
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_url: String,
    /// Object-store key of the stored PDF.
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(rename = "user_id", default)]
    pub uploader_id: Option<String>,
    #[serde(default)]
    pub uploader_email: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Note {
    /// Whether this note was posted through the community request board.
    pub fn is_contribution(&self) -> bool {
        self.subject == CONTRIBUTION_SUBJECT
    }

    /// Branch used for category matching; absent branches fall into the
    /// uncategorized bucket.
    pub fn branch_bucket(&self) -> &str {
        self.branch.as_deref().unwrap_or(UNCATEGORIZED_BRANCH)
    }

    /// Title with any generated timestamp prefix removed.
    pub fn display_title(&self) -> &str {
        crate::display::display_title(&self.title)
    }

    /// Whether `user_id` uploaded this note.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.uploader_id.as_deref() == Some(user_id)
    }
}

/// Row written when a note is uploaded; `id` and `created_at` are assigned
/// by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub tags: Vec<String>,
    pub file_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(rename = "user_id", skip_serializing_if = "Option::is_none")]
    pub uploader_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// =============================================================================
// BOOKMARK TYPES
// =============================================================================

/// Join row between a user and a note. A pair is unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bookmark {
    pub user_id: String,
    pub note_id: String,
}

impl Bookmark {
    pub fn new(user_id: impl Into<String>, note_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            note_id: note_id.into(),
        }
    }
}

/// Projection used when fetching a user's bookmark ids.
#[derive(Debug, Clone, Deserialize)]
pub struct BookmarkNoteId {
    pub note_id: String,
}

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Lifecycle of a missing-note request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    #[default]
    Pending,
    Fulfilled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Fulfilled => "FULFILLED",
        }
    }

    /// Only `PENDING → FULFILLED` is a legal transition.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Fulfilled)
        )
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A "missing note" ticket from the `requests` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub requested_by_email: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: RequestStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Row written when a request is posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_by_email: Option<String>,
    pub status: RequestStatus,
}

// =============================================================================
// IDENTITY
// =============================================================================

/// Identity exposed by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthUser {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_note_deserializes_backend_row() {
        let row = json!({
            "id": "n1",
            "title": "1700000000000-Thermo.pdf",
            "subject": "Physics",
            "chapter": "Heat",
            "branch": "Mechanical",
            "tags": ["exam", "unit-2"],
            "file_url": "https://cdn.example/pdfs/n1.pdf",
            "file_path": "user-u1/1700000000000-Thermo.pdf",
            "user_id": "u1",
            "created_at": "2026-01-05T10:00:00+00:00"
        });
        let note: Note = serde_json::from_value(row).unwrap();
        assert_eq!(note.uploader_id.as_deref(), Some("u1"));
        assert_eq!(note.tags, vec!["exam", "unit-2"]);
        assert_eq!(note.display_title(), "Thermo.pdf");
        assert!(note.is_owned_by("u1"));
        assert!(!note.is_contribution());
    }

    #[test]
    fn test_note_null_columns_become_defaults() {
        let row = json!({
            "id": "c1",
            "title": "Missing DBMS notes",
            "subject": "CONTRIBUTION",
            "tags": null,
            "file_url": null,
            "branch": null,
            "created_at": "2026-01-05T10:00:00Z"
        });
        let note: Note = serde_json::from_value(row).unwrap();
        assert!(note.tags.is_empty());
        assert!(note.file_url.is_empty());
        assert_eq!(note.branch_bucket(), "Other");
        assert!(note.is_contribution());
    }

    #[test]
    fn test_new_note_omits_absent_columns() {
        let row = NewNote {
            title: "t".into(),
            subject: "s".into(),
            chapter: None,
            branch: None,
            tags: vec![],
            file_url: "u".into(),
            file_path: None,
            uploader_id: Some("u1".into()),
            uploader_email: None,
            description: None,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["user_id"], "u1");
        assert!(value.get("chapter").is_none());
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_request_status_wire_format() {
        assert_eq!(
            serde_json::to_value(RequestStatus::Fulfilled).unwrap(),
            json!("FULFILLED")
        );
        let entry: RequestEntry = serde_json::from_value(json!({
            "id": "r1",
            "title": "OS unit 3",
            "requested_by_email": "a@b.c",
            "status": null
        }))
        .unwrap();
        assert_eq!(entry.status, RequestStatus::Pending);
    }

    #[test]
    fn test_request_status_transitions() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Fulfilled));
        assert!(!RequestStatus::Fulfilled.can_transition_to(RequestStatus::Pending));
        assert!(!RequestStatus::Fulfilled.can_transition_to(RequestStatus::Fulfilled));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Pending));
    }
}
