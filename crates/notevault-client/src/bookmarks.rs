//! Optimistic bookmark toggling.
//!
//! Each note id moves through its own state machine:
//!
//! ```text
//! Idle ──toggle──▶ Pending ──ok──▶ Committed ──reconciled──▶ Idle
//!                     │
//!                     └──err──▶ RolledBack ──reconciled──▶ Idle
//! ```
//!
//! The flipped membership is written to the cache before the remote call
//! starts. A failed call restores the exact membership that key had before
//! the toggle; other keys are never touched. A second toggle on a key that
//! is still `Pending` is rejected with [`Error::Busy`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use notevault_core::defaults::BOOKMARKS_TABLE;
use notevault_core::{Bookmark, Error, Result, RowFilter, RowStore, VaultEvent};

use crate::catalog::CatalogCache;
use crate::session::Session;

/// Per-key toggle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleState {
    #[default]
    Idle,
    /// Optimistic value applied, remote call in flight.
    Pending,
    /// Remote call succeeded; reconciliation running.
    Committed,
    /// Remote call failed and the previous value was restored;
    /// reconciliation running.
    RolledBack,
}

#[derive(Default)]
struct CoordinatorState {
    keys: HashMap<String, ToggleState>,
    last_error: Option<String>,
}

/// Applies bookmark toggles against the row store and the shared cache.
#[derive(Clone)]
pub struct BookmarkCoordinator {
    store: Arc<dyn RowStore>,
    cache: CatalogCache,
    session: Session,
    state: Arc<Mutex<CoordinatorState>>,
}

impl BookmarkCoordinator {
    pub fn new(store: Arc<dyn RowStore>, cache: CatalogCache, session: Session) -> Self {
        Self {
            store,
            cache,
            session,
            state: Arc::new(Mutex::new(CoordinatorState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, note_id: &str, next: ToggleState) {
        self.lock().keys.insert(note_id.to_string(), next);
    }

    /// Back to `Idle`, unless a newer toggle already took the key.
    fn settle_to_idle(&self, note_id: &str, from: ToggleState) {
        let mut state = self.lock();
        if state.keys.get(note_id) == Some(&from) {
            state.keys.remove(note_id);
        }
    }

    pub fn status(&self, note_id: &str) -> ToggleState {
        self.lock().keys.get(note_id).copied().unwrap_or_default()
    }

    /// Message of the most recent failed toggle.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn clear_last_error(&self) {
        self.lock().last_error = None;
    }

    pub fn is_bookmarked(&self, note_id: &str) -> bool {
        self.cache.is_bookmarked(note_id)
    }

    /// Flip the bookmark membership of `note_id` for the signed-in user.
    ///
    /// Returns the membership after the remote call succeeded. Errors:
    /// - [`Error::AuthRequired`]: guest; nothing was changed
    /// - [`Error::Busy`]: a toggle for this note is still in flight
    /// - [`Error::Mutation`]: the remote call failed and the previous
    ///   membership was restored
    ///
    /// A full bookmark reload runs after the remote call either way; its
    /// failure is logged and does not change the result.
    pub async fn toggle(&self, note_id: &str) -> Result<bool> {
        let user = self.session.require_user("toggle bookmark")?;
        let row = serde_json::to_value(Bookmark::new(&user.id, note_id))?;

        let was = self.cache.begin_toggle(&user.id, note_id)?;
        let now = !was;
        self.set_state(note_id, ToggleState::Pending);
        self.session.events().emit(VaultEvent::BookmarkApplied {
            note_id: note_id.to_string(),
            bookmarked: now,
        });
        debug!(
            subsystem = "bookmarks",
            component = "coordinator",
            op = "toggle",
            note_id,
            user_id = %user.id,
            bookmarked = now,
            "Optimistic bookmark applied"
        );

        let start = Instant::now();
        let remote = if was {
            self.store
                .delete(
                    BOOKMARKS_TABLE,
                    &[
                        RowFilter::eq("user_id", user.id.as_str()),
                        RowFilter::eq("note_id", note_id),
                    ],
                )
                .await
                .map(|_| ())
        } else {
            self.store
                .insert(BOOKMARKS_TABLE, vec![row])
                .await
                .map(|_| ())
        };

        let (result, settled) = match remote {
            Ok(()) => {
                self.cache.finish_toggle(&user.id, note_id, None);
                self.set_state(note_id, ToggleState::Committed);
                self.session.events().emit(VaultEvent::BookmarkCommitted {
                    note_id: note_id.to_string(),
                    bookmarked: now,
                });
                info!(
                    subsystem = "bookmarks",
                    component = "coordinator",
                    op = "toggle",
                    note_id,
                    bookmarked = now,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Bookmark committed"
                );
                (Ok(now), ToggleState::Committed)
            }
            Err(e) => {
                let message = e.to_string();
                self.cache.finish_toggle(&user.id, note_id, Some(was));
                {
                    let mut state = self.lock();
                    state.keys.insert(note_id.to_string(), ToggleState::RolledBack);
                    state.last_error = Some(message.clone());
                }
                self.session.events().emit(VaultEvent::BookmarkRolledBack {
                    note_id: note_id.to_string(),
                    restored: was,
                    error: message.clone(),
                });
                warn!(
                    subsystem = "bookmarks",
                    component = "coordinator",
                    op = "toggle",
                    note_id,
                    restored = was,
                    error = %message,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Bookmark mutation failed, rolled back"
                );
                (
                    Err(Error::Mutation(format!("bookmark {}: {}", note_id, message))),
                    ToggleState::RolledBack,
                )
            }
        };

        self.reconcile().await;
        self.settle_to_idle(note_id, settled);
        result
    }

    /// Reload bookmarks for whoever is signed in now.
    async fn reconcile(&self) {
        let user_id = self.session.current_user().map(|u| u.id);
        if let Err(e) = self.cache.load_bookmarks(user_id.as_deref()).await {
            warn!(
                subsystem = "bookmarks",
                component = "coordinator",
                op = "reconcile",
                error = %e,
                "Bookmark reconciliation failed"
            );
        }
    }
}
