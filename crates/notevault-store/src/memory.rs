//! In-process row and object stores.
//!
//! Used for offline runs and for deterministic tests of the catalog
//! services. Both stores support failure injection; the row store can also
//! park every mutation behind a gate so a test can observe the optimistic
//! state while the remote call is still "in flight".
//!
//! ## Usage
//!
//! ```rust
//! use notevault_store::memory::{MemoryRowStore, RowOp};
//!
//! let store = MemoryRowStore::new();
//! store.fail("bookmarks", RowOp::Insert);
//! store.hold_mutations();
//! // ... start a toggle, inspect optimistic state ...
//! store.release_mutations();
//! ```

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value as JsonValue};
use tokio::sync::watch;
use tracing::trace;
use uuid::Uuid;

use notevault_core::defaults::{BOOKMARKS_TABLE, CREATED_AT_COLUMN};
use notevault_core::{Error, ObjectStore, OrderBy, Result, RowFilter, RowQuery, RowStore};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// ROW STORE
// =============================================================================

/// Row-store operation kind, used for failure injection and the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowOp {
    Select,
    Insert,
    Update,
    Delete,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCall {
    pub op: RowOp,
    pub table: String,
}

struct RowStoreInner {
    tables: Mutex<HashMap<String, Vec<JsonValue>>>,
    unique: Mutex<HashMap<String, Vec<Vec<String>>>>,
    failures: Mutex<HashSet<(String, RowOp)>>,
    calls: Mutex<Vec<RowCall>>,
    last_created_at: Mutex<Option<DateTime<Utc>>>,
    gate: watch::Sender<bool>,
}

/// In-memory [`RowStore`] with server-assigned `id` and `created_at`.
#[derive(Clone)]
pub struct MemoryRowStore {
    inner: Arc<RowStoreInner>,
}

impl Default for MemoryRowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRowStore {
    /// Empty store with the `bookmarks(user_id, note_id)` unique constraint.
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        let store = Self {
            inner: Arc::new(RowStoreInner {
                tables: Mutex::new(HashMap::new()),
                unique: Mutex::new(HashMap::new()),
                failures: Mutex::new(HashSet::new()),
                calls: Mutex::new(Vec::new()),
                last_created_at: Mutex::new(None),
                gate,
            }),
        };
        store.add_unique(BOOKMARKS_TABLE, &["user_id", "note_id"]);
        store
    }

    /// Register a unique constraint over `columns` of `table`.
    pub fn add_unique(&self, table: &str, columns: &[&str]) {
        lock(&self.inner.unique)
            .entry(table.to_string())
            .or_default()
            .push(columns.iter().map(|c| c.to_string()).collect());
    }

    /// Insert rows directly, bypassing gates, failures, and constraints.
    /// Missing `id` / `created_at` columns are filled in.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = JsonValue>) {
        let prepared: Vec<JsonValue> = rows.into_iter().map(|r| self.prepare_row(r)).collect();
        lock(&self.inner.tables)
            .entry(table.to_string())
            .or_default()
            .extend(prepared);
    }

    /// Snapshot of a table's rows in insertion order.
    pub fn rows(&self, table: &str) -> Vec<JsonValue> {
        lock(&self.inner.tables)
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Make every `op` on `table` fail until [`recover`](Self::recover).
    pub fn fail(&self, table: &str, op: RowOp) {
        lock(&self.inner.failures).insert((table.to_string(), op));
    }

    pub fn recover(&self, table: &str, op: RowOp) {
        lock(&self.inner.failures).remove(&(table.to_string(), op));
    }

    /// Park every insert/update/delete until [`release_mutations`](Self::release_mutations).
    pub fn hold_mutations(&self) {
        self.inner.gate.send_replace(false);
    }

    pub fn release_mutations(&self) {
        self.inner.gate.send_replace(true);
    }

    /// All recorded calls, oldest first.
    pub fn calls(&self) -> Vec<RowCall> {
        lock(&self.inner.calls).clone()
    }

    pub fn call_count(&self, table: &str, op: RowOp) -> usize {
        lock(&self.inner.calls)
            .iter()
            .filter(|c| c.op == op && c.table == table)
            .count()
    }

    fn record(&self, table: &str, op: RowOp) {
        lock(&self.inner.calls).push(RowCall {
            op,
            table: table.to_string(),
        });
    }

    fn check_failure(&self, table: &str, op: RowOp) -> Result<()> {
        if lock(&self.inner.failures).contains(&(table.to_string(), op)) {
            return Err(Error::Request(format!(
                "injected {:?} failure on {}",
                op, table
            )));
        }
        Ok(())
    }

    async fn wait_for_gate(&self) -> Result<()> {
        let mut rx = self.inner.gate.subscribe();
        rx.wait_for(|open| *open)
            .await
            .map(|_| ())
            .map_err(|e| Error::Internal(format!("mutation gate closed: {}", e)))
    }

    /// Strictly increasing creation timestamp so `created_at` ordering is total.
    fn next_created_at(&self) -> String {
        let mut last = lock(&self.inner.last_created_at);
        let mut now = Utc::now();
        if let Some(prev) = *last {
            if now <= prev {
                now = prev + Duration::microseconds(1);
            }
        }
        *last = Some(now);
        now.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn prepare_row(&self, row: JsonValue) -> JsonValue {
        let mut object = match row {
            JsonValue::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        if !object.contains_key("id") {
            object.insert("id".to_string(), JsonValue::String(Uuid::now_v7().to_string()));
        }
        if !object.contains_key(CREATED_AT_COLUMN) {
            object.insert(
                CREATED_AT_COLUMN.to_string(),
                JsonValue::String(self.next_created_at()),
            );
        }
        JsonValue::Object(object)
    }

    fn violates_unique(&self, table: &str, existing: &[JsonValue], row: &JsonValue) -> Option<String> {
        let unique = lock(&self.inner.unique);
        let constraints = unique.get(table)?;
        constraints.iter().find_map(|columns| {
            let clash = existing.iter().any(|other| {
                columns
                    .iter()
                    .all(|c| other.get(c).is_some() && other.get(c) == row.get(c))
            });
            clash.then(|| format!("duplicate key on {}({})", table, columns.join(", ")))
        })
    }
}

fn compare_cells(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(dx), Ok(dy)) => dx.cmp(&dy),
                _ => x.cmp(y),
            }
        }
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(JsonValue::Null) | None, Some(JsonValue::Null) | None) => Ordering::Equal,
        // Nulls sort last ascending, like Postgres.
        (Some(JsonValue::Null) | None, _) => Ordering::Greater,
        (_, Some(JsonValue::Null) | None) => Ordering::Less,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn sort_rows(rows: &mut [JsonValue], order: &OrderBy) {
    rows.sort_by(|a, b| {
        let ord = compare_cells(a.get(&order.column), b.get(&order.column));
        if order.ascending {
            ord
        } else {
            ord.reverse()
        }
    });
}

fn project(row: &JsonValue, columns: &Option<Vec<String>>) -> JsonValue {
    match columns {
        None => row.clone(),
        Some(cols) => {
            let mut map = Map::new();
            for col in cols {
                map.insert(
                    col.clone(),
                    row.get(col).cloned().unwrap_or(JsonValue::Null),
                );
            }
            JsonValue::Object(map)
        }
    }
}

fn matches_all(row: &JsonValue, filters: &[RowFilter]) -> bool {
    filters.iter().all(|f| f.matches(row))
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn select(&self, query: &RowQuery) -> Result<Vec<JsonValue>> {
        self.record(&query.table, RowOp::Select);
        self.check_failure(&query.table, RowOp::Select)?;

        let mut rows: Vec<JsonValue> = lock(&self.inner.tables)
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| matches_all(r, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            sort_rows(&mut rows, order);
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        trace!(
            subsystem = "store",
            component = "memory",
            op = "select",
            db_table = %query.table,
            result_count = rows.len(),
            "Rows selected"
        );
        Ok(rows.iter().map(|r| project(r, &query.columns)).collect())
    }

    async fn insert(&self, table: &str, rows: Vec<JsonValue>) -> Result<Vec<JsonValue>> {
        self.record(table, RowOp::Insert);
        self.wait_for_gate().await?;
        self.check_failure(table, RowOp::Insert)?;

        let prepared: Vec<JsonValue> = rows.into_iter().map(|r| self.prepare_row(r)).collect();
        let mut tables = lock(&self.inner.tables);
        let existing = tables.entry(table.to_string()).or_default();

        let mut staged: Vec<JsonValue> = existing.clone();
        for row in &prepared {
            if let Some(message) = self.violates_unique(table, &staged, row) {
                return Err(Error::Conflict(message));
            }
            staged.push(row.clone());
        }
        *existing = staged;

        trace!(
            subsystem = "store",
            component = "memory",
            op = "insert",
            db_table = table,
            result_count = prepared.len(),
            "Rows inserted"
        );
        Ok(prepared)
    }

    async fn update(&self, table: &str, filters: &[RowFilter], patch: JsonValue) -> Result<usize> {
        self.record(table, RowOp::Update);
        self.wait_for_gate().await?;
        self.check_failure(table, RowOp::Update)?;

        let JsonValue::Object(patch) = patch else {
            return Err(Error::InvalidInput("update patch must be an object".to_string()));
        };

        let mut tables = lock(&self.inner.tables);
        let mut changed = 0;
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|r| matches_all(r, filters)) {
                if let JsonValue::Object(object) = row {
                    for (key, value) in &patch {
                        object.insert(key.clone(), value.clone());
                    }
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    async fn delete(&self, table: &str, filters: &[RowFilter]) -> Result<usize> {
        self.record(table, RowOp::Delete);
        self.wait_for_gate().await?;
        self.check_failure(table, RowOp::Delete)?;

        if filters.is_empty() {
            return Err(Error::InvalidInput(format!(
                "refusing to delete every row of {}",
                table
            )));
        }

        let mut tables = lock(&self.inner.tables);
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !matches_all(r, filters));
        Ok(before - rows.len())
    }
}

// =============================================================================
// OBJECT STORE
// =============================================================================

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Default)]
struct ObjectStoreInner {
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    fail_uploads: Mutex<bool>,
    fail_removes: Mutex<bool>,
}

/// In-memory [`ObjectStore`]; public URLs use the `memory://` scheme.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<ObjectStoreInner>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        lock(&self.inner.objects)
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    /// Keys stored in `bucket`, sorted.
    pub fn paths(&self, bucket: &str) -> Vec<String> {
        let mut paths: Vec<String> = lock(&self.inner.objects)
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, p)| p.clone())
            .collect();
        paths.sort();
        paths
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        *lock(&self.inner.fail_uploads) = fail;
    }

    pub fn set_fail_removes(&self, fail: bool) {
        *lock(&self.inner.fail_removes) = fail;
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        if *lock(&self.inner.fail_uploads) {
            return Err(Error::Storage(format!("injected upload failure for {}", path)));
        }
        let mut objects = lock(&self.inner.objects);
        let key = (bucket.to_string(), path.to_string());
        if objects.contains_key(&key) {
            return Err(Error::Conflict(format!("object {}/{} already exists", bucket, path)));
        }
        objects.insert(
            key,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{}/{}", bucket, path)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        if *lock(&self.inner.fail_removes) {
            return Err(Error::Storage(format!("injected remove failure in {}", bucket)));
        }
        let mut objects = lock(&self.inner.objects);
        for path in paths {
            objects.remove(&(bucket.to_string(), path.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_id_and_created_at() {
        let store = MemoryRowStore::new();
        let inserted = store
            .insert("notes", vec![json!({"title": "a"}), json!({"title": "b"})])
            .await
            .unwrap();
        assert_eq!(inserted.len(), 2);
        assert!(inserted[0]["id"].is_string());
        assert_ne!(inserted[0]["id"], inserted[1]["id"]);
        assert!(compare_cells(inserted[0].get("created_at"), inserted[1].get("created_at")) == Ordering::Less);
    }

    #[tokio::test]
    async fn test_select_filters_orders_limits_and_projects() {
        let store = MemoryRowStore::new();
        store.seed(
            "notes",
            vec![
                json!({"id": "1", "subject": "Physics", "created_at": "2026-01-01T00:00:00Z"}),
                json!({"id": "2", "subject": "CONTRIBUTION", "created_at": "2026-01-03T00:00:00Z"}),
                json!({"id": "3", "subject": "Maths", "created_at": "2026-01-02T00:00:00+00:00"}),
            ],
        );

        let rows = store
            .select(&RowQuery::table("notes").order_desc("created_at"))
            .await
            .unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["2", "3", "1"]);

        let rows = store
            .select(
                &RowQuery::table("notes")
                    .filter(RowFilter::neq("subject", "CONTRIBUTION"))
                    .order_asc("created_at")
                    .columns(&["id"])
                    .limit(1),
            )
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({"id": "1"})]);
    }

    #[tokio::test]
    async fn test_bookmark_pairs_are_unique() {
        let store = MemoryRowStore::new();
        store
            .insert("bookmarks", vec![json!({"user_id": "u", "note_id": "n"})])
            .await
            .unwrap();
        let err = store
            .insert("bookmarks", vec![json!({"user_id": "u", "note_id": "n"})])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(store.rows("bookmarks").len(), 1);

        store
            .insert("bookmarks", vec![json!({"user_id": "v", "note_id": "n"})])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_injected_failure_and_recovery() {
        let store = MemoryRowStore::new();
        store.fail("notes", RowOp::Select);
        assert!(store.select(&RowQuery::table("notes")).await.is_err());
        store.recover("notes", RowOp::Select);
        assert!(store.select(&RowQuery::table("notes")).await.is_ok());
        assert_eq!(store.call_count("notes", RowOp::Select), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryRowStore::new();
        store.seed(
            "requests",
            vec![json!({"id": "r1", "status": "PENDING"}), json!({"id": "r2", "status": "PENDING"})],
        );
        let changed = store
            .update("requests", &[RowFilter::eq("id", "r1")], json!({"status": "FULFILLED"}))
            .await
            .unwrap();
        assert_eq!(changed, 1);
        assert_eq!(store.rows("requests")[0]["status"], "FULFILLED");

        let removed = store
            .delete("requests", &[RowFilter::eq("status", "PENDING")])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.delete("requests", &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_held_mutation_completes_after_release() {
        let store = MemoryRowStore::new();
        store.hold_mutations();

        let background = store.clone();
        let task = tokio::spawn(async move {
            background
                .insert("bookmarks", vec![json!({"user_id": "u", "note_id": "n"})])
                .await
        });

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(store.rows("bookmarks").is_empty());

        store.release_mutations();
        task.await.unwrap().unwrap();
        assert_eq!(store.rows("bookmarks").len(), 1);
    }

    #[tokio::test]
    async fn test_object_store_roundtrip() {
        let objects = MemoryObjectStore::new();
        objects
            .upload("pdfs", "user-u/1-a.pdf", b"%PDF-1.4".to_vec(), "application/pdf")
            .await
            .unwrap();
        assert!(objects
            .upload("pdfs", "user-u/1-a.pdf", vec![], "application/pdf")
            .await
            .is_err());
        assert_eq!(objects.paths("pdfs"), vec!["user-u/1-a.pdf"]);
        assert_eq!(objects.public_url("pdfs", "x"), "memory://pdfs/x");

        objects.remove("pdfs", &["user-u/1-a.pdf".to_string()]).await.unwrap();
        assert!(objects.get("pdfs", "user-u/1-a.pdf").is_none());
    }
}
