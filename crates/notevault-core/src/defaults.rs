//! Centralized default constants for NoteVault.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers and magic strings.

// =============================================================================
// TABLES
// =============================================================================

/// Row-store table holding shared notes.
pub const NOTES_TABLE: &str = "notes";

/// Row-store table holding `(user_id, note_id)` bookmark rows.
pub const BOOKMARKS_TABLE: &str = "bookmarks";

/// Row-store table holding missing-note requests.
pub const REQUESTS_TABLE: &str = "requests";

/// Column every listing is ordered by (descending).
pub const CREATED_AT_COLUMN: &str = "created_at";

// =============================================================================
// CATEGORIES
// =============================================================================

/// Category selector for the default feed (community items hidden).
pub const CATEGORY_ALL: &str = "ALL";

/// Category selector for the active user's bookmarks.
pub const CATEGORY_BOOKMARKED: &str = "BOOKMARKED";

/// Category selector for community contributions.
pub const CATEGORY_COMMUNITY: &str = "COMMUNITY";

/// Subject value that marks a note as a community contribution.
pub const CONTRIBUTION_SUBJECT: &str = "CONTRIBUTION";

/// Branch value written on community contributions.
pub const COMMUNITY_BRANCH: &str = "COMMUNITY";

/// Bucket name for notes uploaded without a branch.
pub const UNCATEGORIZED_BRANCH: &str = "Other";

/// Subject written when the uploader leaves it blank.
pub const DEFAULT_SUBJECT: &str = "Uncategorized";

/// Chapter written when the uploader leaves it blank.
pub const DEFAULT_CHAPTER: &str = "General";

// =============================================================================
// PAGINATION
// =============================================================================

/// Notes rendered per catalog page.
pub const PAGE_SIZE: usize = 6;

/// Number of requests shown on the request board.
pub const RECENT_REQUESTS_LIMIT: usize = 10;

// =============================================================================
// UPLOADS
// =============================================================================

/// Maximum accepted upload size (50 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// The only accepted upload content type.
pub const PDF_MIME: &str = "application/pdf";

/// Bucket holding regular note uploads.
pub const PDF_BUCKET: &str = "pdfs";

/// Bucket holding community contributions.
pub const CONTRIBUTION_BUCKET: &str = "notes-bucket";

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP request timeout for backend calls.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// HTTP connect timeout for backend calls.
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Event bus channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Display name used when an email has no usable local part.
pub const FALLBACK_DISPLAY_NAME: &str = "Explorer";
