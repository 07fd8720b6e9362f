//! Shared fixtures for the client integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value as JsonValue};

use notevault_client::NoteVault;
use notevault_core::{AuthUser, EventBus, EventEnvelope};
use notevault_store::{MemoryObjectStore, MemoryRowStore, StaticAuthProvider};
use tokio::sync::broadcast;

pub const PDF_BYTES: &[u8] = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n%%EOF\n";

pub struct Harness {
    pub rows: MemoryRowStore,
    pub objects: MemoryObjectStore,
    pub auth: StaticAuthProvider,
    pub vault: NoteVault,
    pub events: broadcast::Receiver<EventEnvelope>,
}

pub fn user(id: &str) -> AuthUser {
    AuthUser::new(id, Some(format!("{}@campus.edu", id)))
}

pub fn harness(signed_in: Option<AuthUser>) -> Harness {
    let rows = MemoryRowStore::new();
    let objects = MemoryObjectStore::new();
    let auth = match signed_in {
        Some(u) => StaticAuthProvider::signed_in(u),
        None => StaticAuthProvider::guest(),
    };
    let bus = EventBus::default();
    let events = bus.subscribe();
    let vault = NoteVault::new(
        Arc::new(rows.clone()),
        Arc::new(objects.clone()),
        Arc::new(auth.clone()),
        bus,
    );
    Harness {
        rows,
        objects,
        auth,
        vault,
        events,
    }
}

/// A `notes` row; minute `n` of a fixed day keeps `created_at` ordering explicit.
pub fn note_row(id: &str, title: &str, subject: &str, branch: Option<&str>, minute: u32) -> JsonValue {
    json!({
        "id": id,
        "title": title,
        "subject": subject,
        "branch": branch,
        "tags": [],
        "file_url": format!("memory://pdfs/{}.pdf", id),
        "created_at": format!("2026-03-01T10:{:02}:00Z", minute),
    })
}

pub fn bookmark_row(user_id: &str, note_id: &str) -> JsonValue {
    json!({"user_id": user_id, "note_id": note_id})
}

/// Yield to spawned tasks until `cond` holds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

/// Event types received so far, in order.
pub fn drain_event_types(rx: &mut broadcast::Receiver<EventEnvelope>) -> Vec<String> {
    let mut types = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        types.push(envelope.event_type);
    }
    types
}
