//! # notevault-core
//!
//! Core types, traits, and pure catalog logic for NoteVault.
//!
//! This crate provides the domain models, the collaborator traits the
//! hosted backend is reached through, and the deterministic filter and
//! pagination functions every view of the catalog is computed with.

pub mod catalog_filter;
pub mod defaults;
pub mod display;
pub mod error;
pub mod events;
pub mod file_safety;
pub mod logging;
pub mod models;
pub mod pagination;
pub mod traits;

// Re-export commonly used types at crate root
pub use catalog_filter::{filter_notes, matches_query, Category};
pub use display::{display_name, display_title, format_bytes};
pub use error::{Error, Result};
pub use events::{EventBus, EventEnvelope, VaultEvent};
pub use file_safety::{
    contribution_object_name, parse_tags, pdf_object_path, sanitize_upload_name,
    suggest_metadata, validate_pdf, MetadataSuggestion, ValidationResult,
};
pub use models::*;
pub use pagination::{check_page, paginate, total_pages, PageView};
pub use traits::*;
