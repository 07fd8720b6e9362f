//! # notevault-store
//!
//! Backend adapters for NoteVault.
//!
//! This crate provides:
//! - [`PostgrestRowStore`]: the `notes` / `bookmarks` / `requests` tables over
//!   the PostgREST dialect
//! - [`StorageObjectStore`]: PDF blobs over the storage API
//! - [`StaticAuthProvider`]: identity holder updated by the view layer
//! - [`MemoryRowStore`] / [`MemoryObjectStore`]: in-process stores with
//!   failure injection for offline runs and tests

pub mod auth;
pub mod http;
pub mod memory;
pub mod rest;
pub mod storage;

pub use auth::StaticAuthProvider;
pub use http::{create_client, create_client_with_config, BackendEndpoint, ClientConfig};
pub use memory::{MemoryObjectStore, MemoryRowStore, RowCall, RowOp, StoredObject};
pub use rest::PostgrestRowStore;
pub use storage::StorageObjectStore;

// Re-export core types
pub use notevault_core::*;

/// Escape LIKE wildcards so user text is matched literally.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
