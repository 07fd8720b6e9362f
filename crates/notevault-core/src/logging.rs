//! Structured logging field name constants for NoteVault.
//!
//! All crates use these names for structured `tracing` fields so that log
//! aggregation can query the same keys across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied (rollback, stale snapshot kept) |
//! | INFO  | Lifecycle events, operation completions (upload, delete, fulfil) |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (rows, filter hits) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "store", "catalog", "bookmarks", "uploads", "requests", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "postgrest", "storage", "memory", "http_client", "coordinator"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "select", "insert", "load_notes", "toggle", "reconcile"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Note id being operated on.
pub const NOTE_ID: &str = "note_id";

/// User id of the active identity.
pub const USER_ID: &str = "user_id";

/// Request (missing-note ticket) id.
pub const REQUEST_ID: &str = "request_id";

/// Free-text search query.
pub const QUERY: &str = "query";

/// Category selector value.
pub const CATEGORY: &str = "category";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows or notes returned.
pub const RESULT_COUNT: &str = "result_count";

/// Byte length of an uploaded payload.
pub const BYTE_LEN: &str = "byte_len";

// ─── Store fields ──────────────────────────────────────────────────────────

/// Table affected by a row-store call.
pub const DB_TABLE: &str = "db_table";

/// Object-store bucket.
pub const BUCKET: &str = "bucket";

/// HTTP status code returned by the backend.
pub const HTTP_STATUS: &str = "http_status";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
