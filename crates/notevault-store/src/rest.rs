//! PostgREST-backed implementation of [`RowStore`].

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use notevault_core::{Error, FilterOp, Result, RowFilter, RowQuery, RowStore};

use crate::http::BackendEndpoint;
use crate::escape_like;

/// Row store speaking the PostgREST dialect under `{base}/rest/v1`.
pub struct PostgrestRowStore {
    client: Client,
    endpoint: BackendEndpoint,
}

/// Render a JSON value the way PostgREST expects it in a filter.
fn render_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a filter as a `(column, "op.value")` query pair.
pub fn render_filter(filter: &RowFilter) -> (String, String) {
    let rendered = match (filter.op, &filter.value) {
        (FilterOp::Eq, JsonValue::Null) => "is.null".to_string(),
        (FilterOp::Neq, JsonValue::Null) => "not.is.null".to_string(),
        (FilterOp::Eq, value) => format!("eq.{}", render_value(value)),
        (FilterOp::Neq, value) => format!("neq.{}", render_value(value)),
        (FilterOp::ILike, value) => format!("ilike.*{}*", escape_like(&render_value(value))),
    };
    (filter.column.clone(), rendered)
}

/// Full query string pairs for a select.
pub fn render_query(query: &RowQuery) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(query.filters.len() + 3);
    let select = query
        .columns
        .as_ref()
        .map(|cols| cols.join(","))
        .unwrap_or_else(|| "*".to_string());
    pairs.push(("select".to_string(), select));
    pairs.extend(query.filters.iter().map(render_filter));
    if let Some(order) = &query.order {
        let dir = if order.ascending { "asc" } else { "desc" };
        pairs.push(("order".to_string(), format!("{}.{}", order.column, dir)));
    }
    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }
    pairs
}

impl PostgrestRowStore {
    pub fn new(client: Client, endpoint: BackendEndpoint) -> Self {
        Self { client, endpoint }
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.endpoint.base_url,
            urlencoding::encode(table)
        )
    }

    fn request(&self, method: Method, table: &str) -> Result<RequestBuilder> {
        Ok(self
            .client
            .request(method, self.table_url(table))
            .headers(self.endpoint.auth_headers()?))
    }

    /// Map a non-2xx response to an error carrying status and body.
    async fn check(response: Response, op: &str, table: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(
            subsystem = "store",
            component = "postgrest",
            op,
            db_table = table,
            http_status = status.as_u16(),
            error = %body,
            "Row store call failed"
        );
        let message = format!("{} {} returned {}: {}", op, table, status, body);
        Err(match status {
            StatusCode::CONFLICT => Error::Conflict(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Forbidden(message),
            StatusCode::NOT_FOUND => Error::NotFound(message),
            _ => Error::Request(message),
        })
    }

    async fn rows(response: Response) -> Result<Vec<JsonValue>> {
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<JsonValue>(&body)? {
            JsonValue::Array(rows) => Ok(rows),
            other => Ok(vec![other]),
        }
    }
}

#[async_trait]
impl RowStore for PostgrestRowStore {
    async fn select(&self, query: &RowQuery) -> Result<Vec<JsonValue>> {
        let start = Instant::now();
        let response = self
            .request(Method::GET, &query.table)?
            .query(&render_query(query))
            .send()
            .await?;
        let rows = Self::rows(Self::check(response, "select", &query.table).await?).await?;

        debug!(
            subsystem = "store",
            component = "postgrest",
            op = "select",
            db_table = %query.table,
            result_count = rows.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Rows selected"
        );
        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<JsonValue>) -> Result<Vec<JsonValue>> {
        let start = Instant::now();
        let response = self
            .request(Method::POST, table)?
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;
        let inserted = Self::rows(Self::check(response, "insert", table).await?).await?;

        debug!(
            subsystem = "store",
            component = "postgrest",
            op = "insert",
            db_table = table,
            result_count = inserted.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Rows inserted"
        );
        Ok(inserted)
    }

    async fn update(&self, table: &str, filters: &[RowFilter], patch: JsonValue) -> Result<usize> {
        let start = Instant::now();
        let pairs: Vec<(String, String)> = filters.iter().map(render_filter).collect();
        let response = self
            .request(Method::PATCH, table)?
            .header("Prefer", "return=representation")
            .query(&pairs)
            .json(&patch)
            .send()
            .await?;
        let changed = Self::rows(Self::check(response, "update", table).await?)
            .await?
            .len();

        debug!(
            subsystem = "store",
            component = "postgrest",
            op = "update",
            db_table = table,
            result_count = changed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Rows updated"
        );
        Ok(changed)
    }

    async fn delete(&self, table: &str, filters: &[RowFilter]) -> Result<usize> {
        // PostgREST refuses unfiltered deletes; mirror that locally.
        if filters.is_empty() {
            return Err(Error::InvalidInput(format!(
                "refusing to delete every row of {}",
                table
            )));
        }
        let start = Instant::now();
        let pairs: Vec<(String, String)> = filters.iter().map(render_filter).collect();
        let response = self
            .request(Method::DELETE, table)?
            .header("Prefer", "return=representation")
            .query(&pairs)
            .send()
            .await?;
        let removed = Self::rows(Self::check(response, "delete", table).await?)
            .await?
            .len();

        debug!(
            subsystem = "store",
            component = "postgrest",
            op = "delete",
            db_table = table,
            result_count = removed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Rows deleted"
        );
        Ok(removed)
    }
}
