//! Note upload and owner delete.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use notevault_core::defaults::{
    BOOKMARKS_TABLE, CONTRIBUTION_BUCKET, DEFAULT_CHAPTER, DEFAULT_SUBJECT, NOTES_TABLE,
    PDF_BUCKET, PDF_MIME, UNCATEGORIZED_BRANCH,
};
use notevault_core::{
    parse_tags, pdf_object_path, suggest_metadata, validate_pdf, Error, MetadataSuggestion,
    NewNote, Note, ObjectStore, Result, RowFilter, RowQuery, RowStore, VaultEvent,
};

use crate::catalog::CatalogCache;
use crate::session::Session;

/// What the upload form collects. Empty classification fields fall back to
/// `Uncategorized` / `General` / `Other`.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub subject: String,
    pub chapter: String,
    pub branch: String,
    /// Comma-separated.
    pub tags: String,
}

fn or_default(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Upload and delete flows for regular notes.
#[derive(Clone)]
pub struct Uploader {
    rows: Arc<dyn RowStore>,
    objects: Arc<dyn ObjectStore>,
    cache: CatalogCache,
    session: Session,
    bucket: String,
    contribution_bucket: String,
}

impl Uploader {
    pub fn new(
        rows: Arc<dyn RowStore>,
        objects: Arc<dyn ObjectStore>,
        cache: CatalogCache,
        session: Session,
    ) -> Self {
        Self {
            rows,
            objects,
            cache,
            session,
            bucket: PDF_BUCKET.to_string(),
            contribution_bucket: CONTRIBUTION_BUCKET.to_string(),
        }
    }

    /// Override the bucket names.
    pub fn with_buckets(
        mut self,
        bucket: impl Into<String>,
        contribution_bucket: impl Into<String>,
    ) -> Self {
        self.bucket = bucket.into();
        self.contribution_bucket = contribution_bucket.into();
        self
    }

    /// Subject/chapter guess for the form.
    pub fn suggest(&self, file_name: &str) -> MetadataSuggestion {
        suggest_metadata(file_name)
    }

    /// Validate, store, and register a PDF. The new note is put at the head
    /// of the cache snapshot.
    ///
    /// If the row insert fails the stored object is removed again.
    pub async fn upload(&self, form: UploadForm) -> Result<Note> {
        let user = self.session.require_user("upload note")?;

        let validation = validate_pdf(&form.content_type, &form.bytes);
        if !validation.allowed {
            let reason = validation
                .block_reason
                .unwrap_or_else(|| "upload rejected".to_string());
            warn!(
                subsystem = "uploads",
                op = "validate",
                user_id = %user.id,
                detected_type = validation.detected_type.as_deref().unwrap_or("unknown"),
                error = %reason,
                "Upload blocked"
            );
            return Err(Error::InvalidInput(reason));
        }

        let start = Instant::now();
        let byte_len = form.bytes.len();
        let path = pdf_object_path(&user.id, Utc::now().timestamp_millis(), &form.file_name);
        self.objects
            .upload(&self.bucket, &path, form.bytes, PDF_MIME)
            .await?;

        let row = NewNote {
            title: form.file_name.clone(),
            subject: or_default(&form.subject, DEFAULT_SUBJECT),
            chapter: Some(or_default(&form.chapter, DEFAULT_CHAPTER)),
            branch: Some(or_default(&form.branch, UNCATEGORIZED_BRANCH)),
            tags: parse_tags(&form.tags),
            file_url: self.objects.public_url(&self.bucket, &path),
            file_path: Some(path.clone()),
            uploader_id: Some(user.id.clone()),
            uploader_email: user.email.clone(),
            description: None,
        };

        let note = match self.insert_note(row).await {
            Ok(note) => note,
            Err(e) => {
                warn!(
                    subsystem = "uploads",
                    op = "insert",
                    db_table = NOTES_TABLE,
                    error = %e,
                    "Note row insert failed, removing stored object"
                );
                if let Err(cleanup) = self.objects.remove(&self.bucket, &[path]).await {
                    warn!(
                        subsystem = "uploads",
                        op = "cleanup",
                        bucket = %self.bucket,
                        error = %cleanup,
                        "Orphaned object could not be removed"
                    );
                }
                return Err(e);
            }
        };

        self.cache.insert_note_front(note.clone());
        self.session.events().emit(VaultEvent::NoteUploaded {
            note_id: note.id.clone(),
        });
        info!(
            subsystem = "uploads",
            op = "upload",
            note_id = %note.id,
            user_id = %user.id,
            byte_len,
            duration_ms = start.elapsed().as_millis() as u64,
            "Note uploaded"
        );
        Ok(note)
    }

    async fn insert_note(&self, row: NewNote) -> Result<Note> {
        let inserted = self
            .rows
            .insert(NOTES_TABLE, vec![serde_json::to_value(&row)?])
            .await?;
        let first = inserted
            .into_iter()
            .next()
            .ok_or_else(|| Error::Internal("note insert returned no row".to_string()))?;
        Ok(serde_json::from_value(first)?)
    }

    /// Delete one of the signed-in user's notes: the stored object, the row,
    /// every bookmark of it, and the cached copy.
    pub async fn delete_note(&self, note_id: &str) -> Result<()> {
        let user = self.session.require_user("delete note")?;

        let note = match self.cache.note(note_id) {
            Some(note) => note,
            None => self.fetch_note(note_id).await?,
        };
        if !note.is_owned_by(&user.id) {
            return Err(Error::Forbidden(format!(
                "note {} belongs to another user",
                note_id
            )));
        }

        if let Some(path) = &note.file_path {
            let bucket = if note.is_contribution() {
                &self.contribution_bucket
            } else {
                &self.bucket
            };
            self.objects.remove(bucket, &[path.clone()]).await?;
        }

        // Bookmark rows go before the note row.
        self.rows
            .delete(BOOKMARKS_TABLE, &[RowFilter::eq("note_id", note_id)])
            .await?;
        self.rows
            .delete(NOTES_TABLE, &[RowFilter::eq("id", note_id)])
            .await?;

        self.cache.remove_note(note_id);
        self.session.events().emit(VaultEvent::NoteDeleted {
            note_id: note_id.to_string(),
        });
        info!(
            subsystem = "uploads",
            op = "delete",
            note_id,
            user_id = %user.id,
            "Note deleted"
        );
        Ok(())
    }

    async fn fetch_note(&self, note_id: &str) -> Result<Note> {
        let rows = self
            .rows
            .select(&RowQuery::table(NOTES_TABLE).eq("id", note_id))
            .await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("note {}", note_id)))?;
        Ok(serde_json::from_value(row)?)
    }
}
