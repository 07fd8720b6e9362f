//! Request board: "missing note" tickets and community contributions.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use notevault_core::defaults::{
    COMMUNITY_BRANCH, CONTRIBUTION_BUCKET, CONTRIBUTION_SUBJECT, CREATED_AT_COLUMN,
    MAX_UPLOAD_BYTES, NOTES_TABLE, RECENT_REQUESTS_LIMIT, REQUESTS_TABLE,
};
use notevault_core::{
    contribution_object_name, Error, NewNote, NewRequest, Note, ObjectStore, RequestEntry,
    RequestStatus, Result, RowFilter, RowQuery, RowStore, VaultEvent,
};

use crate::catalog::CatalogCache;
use crate::session::Session;

/// A file offered to fulfill a request.
#[derive(Debug, Clone, Default)]
pub struct ContributionForm {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub description: String,
}

/// Posts, lists, and fulfills requests.
#[derive(Clone)]
pub struct RequestBoard {
    rows: Arc<dyn RowStore>,
    objects: Arc<dyn ObjectStore>,
    cache: CatalogCache,
    session: Session,
    bucket: String,
}

fn parse_requests(rows: Vec<serde_json::Value>) -> Result<Vec<RequestEntry>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Error::from))
        .collect()
}

impl RequestBoard {
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
            bucket: CONTRIBUTION_BUCKET.to_string(),
        }
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// The ten newest requests.
    pub async fn load_recent(&self) -> Result<Vec<RequestEntry>> {
        let query = RowQuery::table(REQUESTS_TABLE)
            .order_desc(CREATED_AT_COLUMN)
            .limit(RECENT_REQUESTS_LIMIT);
        let rows = self.rows.select(&query).await.map_err(|e| {
            warn!(
                subsystem = "requests",
                op = "load_recent",
                db_table = REQUESTS_TABLE,
                error = %e,
                "Request fetch failed"
            );
            Error::Fetch(format!("{}: {}", REQUESTS_TABLE, e))
        })?;
        parse_requests(rows)
    }

    /// Post a request for missing material.
    pub async fn create_request(&self, title: &str) -> Result<RequestEntry> {
        let user = self.session.require_user("post request")?;
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("request title is empty".to_string()));
        }

        let row = NewRequest {
            title: title.to_string(),
            requested_by_email: user.email.clone(),
            status: RequestStatus::Pending,
        };
        let inserted = self
            .rows
            .insert(REQUESTS_TABLE, vec![serde_json::to_value(&row)?])
            .await?;
        let entry = parse_requests(inserted)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Internal("request insert returned no row".to_string()))?;

        self.session.events().emit(VaultEvent::RequestCreated {
            request_id: entry.id.clone(),
        });
        info!(
            subsystem = "requests",
            op = "create",
            request_id = %entry.id,
            user_id = %user.id,
            "Request posted"
        );
        Ok(entry)
    }

    async fn fetch_request(&self, request_id: &str) -> Result<RequestEntry> {
        let rows = self
            .rows
            .select(&RowQuery::table(REQUESTS_TABLE).eq("id", request_id).limit(1))
            .await?;
        parse_requests(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("request {}", request_id)))
    }

    /// Answer a pending request with a file.
    ///
    /// The file becomes a `CONTRIBUTION` note titled after the request, and
    /// the request is marked `FULFILLED`. Requests that are already
    /// fulfilled are rejected with [`Error::Conflict`].
    pub async fn fulfill(&self, request_id: &str, form: ContributionForm) -> Result<Note> {
        let user = self.session.require_user("fulfill request")?;

        if form.bytes.is_empty() {
            return Err(Error::InvalidInput("no file provided".to_string()));
        }
        if form.bytes.len() as u64 > MAX_UPLOAD_BYTES {
            return Err(Error::InvalidInput(format!(
                "file exceeds maximum size of {} bytes",
                MAX_UPLOAD_BYTES
            )));
        }

        let request = self.fetch_request(request_id).await?;
        if !request.status.can_transition_to(RequestStatus::Fulfilled) {
            return Err(Error::Conflict(format!(
                "request {} is already {}",
                request_id, request.status
            )));
        }

        let start = Instant::now();
        let object_name = contribution_object_name(Utc::now().timestamp_millis(), &form.file_name);
        self.objects
            .upload(&self.bucket, &object_name, form.bytes, &form.content_type)
            .await?;

        let row = NewNote {
            title: request.title.clone(),
            subject: CONTRIBUTION_SUBJECT.to_string(),
            chapter: None,
            branch: Some(COMMUNITY_BRANCH.to_string()),
            tags: Vec::new(),
            file_url: self.objects.public_url(&self.bucket, &object_name),
            file_path: Some(object_name.clone()),
            uploader_id: Some(user.id.clone()),
            uploader_email: user.email.clone(),
            description: Some(form.description.trim().to_string()).filter(|d| !d.is_empty()),
        };
        let note = match self.insert_note(row).await {
            Ok(note) => note,
            Err(e) => {
                warn!(
                    subsystem = "requests",
                    op = "insert",
                    db_table = NOTES_TABLE,
                    request_id,
                    error = %e,
                    "Contribution row insert failed, removing stored object"
                );
                self.remove_object(&object_name).await;
                return Err(e);
            }
        };

        // Only a still-pending request may be claimed.
        let claimed = self
            .rows
            .update(
                REQUESTS_TABLE,
                &[
                    RowFilter::eq("id", request_id),
                    RowFilter::eq("status", RequestStatus::Pending.as_str()),
                ],
                serde_json::json!({ "status": RequestStatus::Fulfilled }),
            )
            .await;
        let failure = match claimed {
            Ok(0) => Some(Error::Conflict(format!(
                "request {} was fulfilled by someone else",
                request_id
            ))),
            Ok(_) => None,
            Err(e) => Some(e),
        };
        if let Some(e) = failure {
            warn!(
                subsystem = "requests",
                op = "claim",
                db_table = REQUESTS_TABLE,
                request_id,
                note_id = %note.id,
                error = %e,
                "Request not marked fulfilled, discarding contribution"
            );
            if let Err(cleanup) = self
                .rows
                .delete(NOTES_TABLE, &[RowFilter::eq("id", note.id.as_str())])
                .await
            {
                warn!(
                    subsystem = "requests",
                    op = "cleanup",
                    note_id = %note.id,
                    error = %cleanup,
                    "Orphaned contribution row could not be removed"
                );
            }
            self.remove_object(&object_name).await;
            return Err(e);
        }

        self.cache.insert_note_front(note.clone());
        self.session.events().emit(VaultEvent::RequestFulfilled {
            request_id: request_id.to_string(),
            note_id: note.id.clone(),
        });
        info!(
            subsystem = "requests",
            op = "fulfill",
            request_id,
            note_id = %note.id,
            user_id = %user.id,
            duration_ms = start.elapsed().as_millis() as u64,
            "Request fulfilled"
        );
        Ok(note)
    }

    async fn insert_note(&self, row: NewNote) -> Result<Note> {
        let inserted = self
            .rows
            .insert(NOTES_TABLE, vec![serde_json::to_value(&row)?])
            .await?;
        match inserted.into_iter().next() {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Err(Error::Internal("note insert returned no row".to_string())),
        }
    }

    async fn remove_object(&self, object_name: &str) {
        if let Err(e) = self
            .objects
            .remove(&self.bucket, &[object_name.to_string()])
            .await
        {
            warn!(
                subsystem = "requests",
                op = "cleanup",
                bucket = %self.bucket,
                error = %e,
                "Orphaned object could not be removed"
            );
        }
    }

    /// Community contributions from the cache snapshot.
    pub fn contributions(&self) -> Vec<Note> {
        self.cache.contributions()
    }
}
