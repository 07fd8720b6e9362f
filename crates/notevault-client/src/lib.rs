//! # notevault-client
//!
//! Client-side synchronization layer for NoteVault.
//!
//! - [`CatalogCache`]: shared snapshot of notes and the active user's bookmarks
//! - [`BrowseState`]: query / category / page over the cache
//! - [`BookmarkCoordinator`]: optimistic bookmark toggles with per-key rollback
//! - [`Uploader`]: PDF upload and owner delete
//! - [`RequestBoard`]: missing-note requests and contributions
//!
//! [`NoteVault`] wires them together over one set of collaborators.

pub mod bookmarks;
pub mod browse;
pub mod catalog;
pub mod config;
pub mod requests;
pub mod session;
pub mod uploads;

use std::sync::Arc;

pub use bookmarks::{BookmarkCoordinator, ToggleState};
pub use browse::BrowseState;
pub use catalog::{CatalogCache, LoadStatus};
pub use config::{ConfigError, ConfigResult, VaultConfig};
pub use requests::{ContributionForm, RequestBoard};
pub use session::Session;
pub use uploads::{UploadForm, Uploader};

use notevault_core::{AuthProvider, EventBus, ObjectStore, Result, RowStore};
use notevault_store::{create_client_with_config, PostgrestRowStore, StorageObjectStore};

/// Every catalog service sharing one cache, session, and event bus.
#[derive(Clone)]
pub struct NoteVault {
    pub session: Session,
    pub cache: CatalogCache,
    pub bookmarks: BookmarkCoordinator,
    pub uploads: Uploader,
    pub requests: RequestBoard,
}

impl NoteVault {
    pub fn new(
        rows: Arc<dyn RowStore>,
        objects: Arc<dyn ObjectStore>,
        auth: Arc<dyn AuthProvider>,
        events: EventBus,
    ) -> Self {
        let session = Session::new(auth, events.clone());
        let cache = CatalogCache::new(rows.clone(), events);
        Self {
            bookmarks: BookmarkCoordinator::new(rows.clone(), cache.clone(), session.clone()),
            uploads: Uploader::new(rows.clone(), objects.clone(), cache.clone(), session.clone()),
            requests: RequestBoard::new(rows, objects, cache.clone(), session.clone()),
            session,
            cache,
        }
    }

    /// Services backed by the hosted row and storage APIs.
    pub fn connect(config: &VaultConfig, auth: Arc<dyn AuthProvider>) -> Result<Self> {
        let client = create_client_with_config(config.client_config())?;
        let endpoint = config.endpoint();
        let rows = Arc::new(PostgrestRowStore::new(client.clone(), endpoint.clone()));
        let objects = Arc::new(StorageObjectStore::new(client, endpoint));

        let mut vault = Self::new(rows, objects, auth, EventBus::default());
        vault.uploads = vault
            .uploads
            .with_buckets(&config.pdf_bucket, &config.contribution_bucket);
        vault.requests = vault.requests.with_bucket(&config.contribution_bucket);
        Ok(vault)
    }

    pub fn events(&self) -> &EventBus {
        self.session.events()
    }

    /// Reload notes and the signed-in user's bookmarks.
    pub async fn refresh(&self) -> Result<()> {
        let user_id = self.session.current_user().map(|u| u.id);
        let (notes, bookmarks) = self.cache.refresh(user_id.as_deref()).await;
        notes?;
        bookmarks?;
        Ok(())
    }
}
