//! Catalog cache: the last-fetched notes and the active user's bookmark ids.
//!
//! The cache is a cheap-to-clone handle over shared state. Every view that
//! needs the catalog receives a clone; there is no global instance.
//!
//! Loads are guarded before their results are applied:
//! - after [`CatalogCache::close`] every completing load is discarded
//! - a bookmark load for a user who is no longer active is discarded
//!
//! Bookmark toggles still in flight form a pending overlay. Their optimistic
//! values are re-applied on top of every reconciled bookmark set, so a
//! refresh never shows committed and optimistic data for the same key.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use notevault_core::defaults::{BOOKMARKS_TABLE, CREATED_AT_COLUMN, NOTES_TABLE};
use notevault_core::{
    filter_notes, BookmarkNoteId, Category, Error, EventBus, Note, PageView, Result, RowQuery,
    RowStore, VaultEvent,
};

/// What happened to a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The snapshot was replaced; carries the new item count.
    Applied(usize),
    /// The result arrived after close or a user switch and was dropped.
    Discarded,
}

#[derive(Debug, Clone)]
struct PendingToggle {
    user_id: String,
    bookmarked: bool,
}

#[derive(Debug, Default)]
struct CacheState {
    notes: Vec<Note>,
    bookmarks: HashSet<String>,
    notes_error: Option<String>,
    bookmarks_error: Option<String>,
    active_user: Option<String>,
    pending: HashMap<String, PendingToggle>,
    closed: bool,
}

impl CacheState {
    fn set_membership(&mut self, note_id: &str, bookmarked: bool) {
        if bookmarked {
            self.bookmarks.insert(note_id.to_string());
        } else {
            self.bookmarks.remove(note_id);
        }
    }

    /// Make `user_id` the active user, dropping another user's bookmarks.
    fn switch_user(&mut self, user_id: Option<&str>) {
        if self.active_user.as_deref() != user_id {
            self.active_user = user_id.map(String::from);
            self.bookmarks.clear();
            self.pending.clear();
            self.bookmarks_error = None;
        }
    }
}

/// Shared handle over the fetched catalog.
#[derive(Clone)]
pub struct CatalogCache {
    store: Arc<dyn RowStore>,
    events: EventBus,
    state: Arc<RwLock<CacheState>>,
}

impl CatalogCache {
    pub fn new(store: Arc<dyn RowStore>, events: EventBus) -> Self {
        Self {
            store,
            events,
            state: Arc::new(RwLock::new(CacheState::default())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn fetch_failed(&self, resource: &str, error: &Error) -> Error {
        let message = error.to_string();
        warn!(
            subsystem = "catalog",
            component = "cache",
            op = "load",
            db_table = resource,
            error = %message,
            "Fetch failed, keeping previous snapshot"
        );
        self.events.emit(VaultEvent::FetchFailed {
            resource: resource.to_string(),
            error: message.clone(),
        });
        Error::Fetch(format!("{}: {}", resource, message))
    }

    // =========================================================================
    // LOADS
    // =========================================================================

    /// Replace the note snapshot with every note, newest first.
    ///
    /// On failure the previous snapshot is kept, the notes error flag is set,
    /// and [`Error::Fetch`] is returned.
    pub async fn load_notes(&self) -> Result<LoadStatus> {
        let start = Instant::now();
        let query = RowQuery::table(NOTES_TABLE).order_desc(CREATED_AT_COLUMN);
        let fetched = match self.store.select(&query).await {
            Ok(rows) => rows
                .into_iter()
                .map(serde_json::from_value::<Note>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(Error::from),
            Err(e) => Err(e),
        };

        let mut state = self.write();
        if state.closed {
            debug!(
                subsystem = "catalog",
                component = "cache",
                op = "load_notes",
                "Cache closed, discarding notes"
            );
            return Ok(LoadStatus::Discarded);
        }

        match fetched {
            Ok(notes) => {
                let count = notes.len();
                state.notes = notes;
                state.notes_error = None;
                drop(state);

                info!(
                    subsystem = "catalog",
                    component = "cache",
                    op = "load_notes",
                    result_count = count,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Notes loaded"
                );
                self.events.emit(VaultEvent::NotesLoaded { count });
                Ok(LoadStatus::Applied(count))
            }
            Err(e) => {
                state.notes_error = Some(e.to_string());
                drop(state);
                Err(self.fetch_failed(NOTES_TABLE, &e))
            }
        }
    }

    /// Replace the bookmark-id snapshot for `user_id`.
    ///
    /// A guest (`None`) gets an empty set without a remote call. The call
    /// makes `user_id` the active user; the result is dropped if another user
    /// became active while it was in flight.
    pub async fn load_bookmarks(&self, user_id: Option<&str>) -> Result<LoadStatus> {
        {
            let mut state = self.write();
            if state.closed {
                return Ok(LoadStatus::Discarded);
            }
            state.switch_user(user_id);
        }
        let Some(user_id) = user_id else {
            debug!(
                subsystem = "catalog",
                component = "cache",
                op = "load_bookmarks",
                "Guest session, bookmarks empty"
            );
            return Ok(LoadStatus::Applied(0));
        };

        let start = Instant::now();
        let query = RowQuery::table(BOOKMARKS_TABLE)
            .columns(&["note_id"])
            .eq("user_id", user_id);
        let fetched = match self.store.select(&query).await {
            Ok(rows) => rows
                .into_iter()
                .map(|row: JsonValue| serde_json::from_value::<BookmarkNoteId>(row).map(|b| b.note_id))
                .collect::<std::result::Result<HashSet<_>, _>>()
                .map_err(Error::from),
            Err(e) => Err(e),
        };

        let mut state = self.write();
        if state.closed || state.active_user.as_deref() != Some(user_id) {
            debug!(
                subsystem = "catalog",
                component = "cache",
                op = "load_bookmarks",
                user_id,
                "Stale bookmark load discarded"
            );
            return Ok(LoadStatus::Discarded);
        }

        match fetched {
            Ok(mut ids) => {
                for (note_id, pending) in &state.pending {
                    if pending.user_id == user_id {
                        if pending.bookmarked {
                            ids.insert(note_id.clone());
                        } else {
                            ids.remove(note_id);
                        }
                    }
                }
                let count = ids.len();
                state.bookmarks = ids;
                state.bookmarks_error = None;
                drop(state);

                debug!(
                    subsystem = "catalog",
                    component = "cache",
                    op = "load_bookmarks",
                    user_id,
                    result_count = count,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Bookmarks loaded"
                );
                Ok(LoadStatus::Applied(count))
            }
            Err(e) => {
                state.bookmarks_error = Some(e.to_string());
                drop(state);
                Err(self.fetch_failed(BOOKMARKS_TABLE, &e))
            }
        }
    }

    /// Load notes and bookmarks concurrently.
    pub async fn refresh(&self, user_id: Option<&str>) -> (Result<LoadStatus>, Result<LoadStatus>) {
        futures::future::join(self.load_notes(), self.load_bookmarks(user_id)).await
    }

    /// Stop applying load results (the owning view went away).
    pub fn close(&self) {
        self.write().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.read().closed
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    pub fn notes(&self) -> Vec<Note> {
        self.read().notes.clone()
    }

    pub fn note(&self, note_id: &str) -> Option<Note> {
        self.read().notes.iter().find(|n| n.id == note_id).cloned()
    }

    pub fn bookmark_ids(&self) -> HashSet<String> {
        self.read().bookmarks.clone()
    }

    pub fn is_bookmarked(&self, note_id: &str) -> bool {
        self.read().bookmarks.contains(note_id)
    }

    pub fn active_user(&self) -> Option<String> {
        self.read().active_user.clone()
    }

    /// Message of the last failed notes load, cleared by a successful one.
    pub fn notes_error(&self) -> Option<String> {
        self.read().notes_error.clone()
    }

    pub fn bookmarks_error(&self) -> Option<String> {
        self.read().bookmarks_error.clone()
    }

    /// Whether a bookmark toggle for `note_id` is in flight.
    pub fn is_pending(&self, note_id: &str) -> bool {
        self.read().pending.contains_key(note_id)
    }

    /// Notes uploaded by `user_id`, newest first.
    pub fn uploaded_by(&self, user_id: &str) -> Vec<Note> {
        self.read()
            .notes
            .iter()
            .filter(|n| n.is_owned_by(user_id))
            .cloned()
            .collect()
    }

    /// Community contributions, newest first.
    pub fn contributions(&self) -> Vec<Note> {
        self.read()
            .notes
            .iter()
            .filter(|n| n.is_contribution())
            .cloned()
            .collect()
    }

    // =========================================================================
    // VIEWS
    // =========================================================================

    /// Full filtered result set for `(query, category)`.
    pub fn filtered(&self, query: &str, category: &Category) -> Vec<Note> {
        let state = self.read();
        filter_notes(&state.notes, query, category, &state.bookmarks)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn result_count(&self, query: &str, category: &Category) -> usize {
        let state = self.read();
        filter_notes(&state.notes, query, category, &state.bookmarks).len()
    }

    /// One page of the filtered result set.
    pub fn view(
        &self,
        query: &str,
        category: &Category,
        page: usize,
        page_size: usize,
    ) -> PageView<Note> {
        PageView::build(&self.filtered(query, category), page, page_size)
    }

    // =========================================================================
    // LOCAL MUTATIONS
    // =========================================================================

    /// Put a freshly uploaded note at the head of the snapshot.
    pub fn insert_note_front(&self, note: Note) {
        let mut state = self.write();
        state.notes.retain(|n| n.id != note.id);
        state.notes.insert(0, note);
    }

    /// Drop a deleted note and its bookmark id.
    pub fn remove_note(&self, note_id: &str) -> bool {
        let mut state = self.write();
        let before = state.notes.len();
        state.notes.retain(|n| n.id != note_id);
        state.bookmarks.remove(note_id);
        state.pending.remove(note_id);
        state.notes.len() != before
    }

    /// Apply the flipped membership of `note_id` for `user_id` and mark it
    /// pending. Returns the membership before the flip.
    pub(crate) fn begin_toggle(&self, user_id: &str, note_id: &str) -> Result<bool> {
        let mut state = self.write();
        if state.active_user.is_none() {
            state.active_user = Some(user_id.to_string());
        } else {
            state.switch_user(Some(user_id));
        }
        if state.pending.contains_key(note_id) {
            return Err(Error::Busy(format!(
                "bookmark toggle for {} is still in flight",
                note_id
            )));
        }
        let was = state.bookmarks.contains(note_id);
        state.set_membership(note_id, !was);
        state.pending.insert(
            note_id.to_string(),
            PendingToggle {
                user_id: user_id.to_string(),
                bookmarked: !was,
            },
        );
        Ok(was)
    }

    /// Release the pending mark; `restore` puts back the pre-toggle value.
    ///
    /// Nothing is restored once the pending mark is gone: another user
    /// became active, or the note was removed, meanwhile.
    pub(crate) fn finish_toggle(&self, user_id: &str, note_id: &str, restore: Option<bool>) {
        let mut state = self.write();
        let owned = state
            .pending
            .get(note_id)
            .is_some_and(|p| p.user_id == user_id);
        if !owned {
            return;
        }
        state.pending.remove(note_id);
        if let Some(previous) = restore {
            if state.active_user.as_deref() == Some(user_id) {
                state.set_membership(note_id, previous);
            }
        }
    }
}
