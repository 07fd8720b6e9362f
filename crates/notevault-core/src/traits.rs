//! Collaborator traits for the hosted backend.
//!
//! The catalog never talks to the backend directly; it goes through these
//! traits so the hosted services, the in-memory stores, and test doubles are
//! interchangeable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::AuthUser;

// =============================================================================
// ROW STORE
// =============================================================================

/// Comparison applied by a [`RowFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    /// Column equals value.
    Eq,
    /// Column differs from value.
    Neq,
    /// Case-insensitive substring match on a text column.
    ILike,
}

/// A single `column <op> value` predicate. Predicates in a list are ANDed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFilter {
    pub column: String,
    pub op: FilterOp,
    pub value: JsonValue,
}

impl RowFilter {
    pub fn eq(column: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn neq(column: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Neq,
            value: value.into(),
        }
    }

    /// Substring match; `needle` is the raw text, without wildcards.
    pub fn ilike(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::ILike,
            value: JsonValue::String(needle.into()),
        }
    }

    /// Evaluate the predicate against a JSON row.
    pub fn matches(&self, row: &JsonValue) -> bool {
        let cell = row.get(&self.column).unwrap_or(&JsonValue::Null);
        match self.op {
            FilterOp::Eq => cell == &self.value,
            FilterOp::Neq => cell != &self.value,
            FilterOp::ILike => match (cell.as_str(), self.value.as_str()) {
                (Some(text), Some(needle)) => {
                    text.to_lowercase().contains(&needle.to_lowercase())
                }
                _ => false,
            },
        }
    }
}

/// Ordering of a select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

/// Select request against one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowQuery {
    pub table: String,
    /// Columns to project; `None` selects every column.
    pub columns: Option<Vec<String>>,
    pub filters: Vec<RowFilter>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl RowQuery {
    /// Select every column of `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: None,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn filter(mut self, filter: RowFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.filter(RowFilter::eq(column, value))
    }

    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(OrderBy {
            column: column.into(),
            ascending: false,
        });
        self
    }

    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(OrderBy {
            column: column.into(),
            ascending: true,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Relational row service holding the `notes`, `bookmarks`, and `requests`
/// tables.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Fetch rows matching the query.
    async fn select(&self, query: &RowQuery) -> Result<Vec<JsonValue>>;

    /// Insert rows and return them with server-assigned columns filled in.
    async fn insert(&self, table: &str, rows: Vec<JsonValue>) -> Result<Vec<JsonValue>>;

    /// Merge `patch` into every row matching `filters`; returns the number of
    /// rows changed.
    async fn update(&self, table: &str, filters: &[RowFilter], patch: JsonValue) -> Result<usize>;

    /// Delete every row matching `filters`; returns the number of rows removed.
    async fn delete(&self, table: &str, filters: &[RowFilter]) -> Result<usize>;
}

// =============================================================================
// AUTH PROVIDER
// =============================================================================

/// Source of the current identity. Mechanics (sign-in, sessions) live in the
/// provider; the catalog only reads the identity and the loading flag.
pub trait AuthProvider: Send + Sync {
    /// Authenticated identity, or `None` for a guest.
    fn current_user(&self) -> Option<AuthUser>;

    /// Whether the initial session check is still running.
    fn is_loading(&self) -> bool;
}

// =============================================================================
// OBJECT STORE
// =============================================================================

/// Binary blob service holding uploaded PDFs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path` inside `bucket`. Existing objects are never
    /// overwritten.
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<()>;

    /// Public locator for an object.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Remove objects; missing paths are ignored.
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()>;
}
