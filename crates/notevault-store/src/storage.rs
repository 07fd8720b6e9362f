//! Storage-API implementation of [`ObjectStore`].

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde_json::json;
use tracing::{info, warn};

use notevault_core::{Error, ObjectStore, Result};

use crate::http::BackendEndpoint;

/// Object store under `{base}/storage/v1`.
pub struct StorageObjectStore {
    client: Client,
    endpoint: BackendEndpoint,
}

/// Percent-encode each path segment, keeping the `/` separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl StorageObjectStore {
    pub fn new(client: Client, endpoint: BackendEndpoint) -> Self {
        Self { client, endpoint }
    }

    async fn check(response: Response, op: &str, bucket: &str) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        warn!(
            subsystem = "store",
            component = "storage",
            op,
            bucket,
            http_status = status.as_u16(),
            error = %body,
            "Object store call failed"
        );
        Err(Error::Storage(format!(
            "{} in {} returned {}: {}",
            op, bucket, status, body
        )))
    }
}

#[async_trait]
impl ObjectStore for StorageObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let start = Instant::now();
        let byte_len = bytes.len();
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.endpoint.base_url,
            encode_path(bucket),
            encode_path(path)
        );
        let response = self
            .client
            .post(url)
            .headers(self.endpoint.auth_headers()?)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        Self::check(response, "upload", bucket).await?;

        info!(
            subsystem = "store",
            component = "storage",
            op = "upload",
            bucket,
            byte_len,
            duration_ms = start.elapsed().as_millis() as u64,
            "Object uploaded"
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.endpoint.base_url,
            encode_path(bucket),
            encode_path(path)
        )
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = format!(
            "{}/storage/v1/object/{}",
            self.endpoint.base_url,
            encode_path(bucket)
        );
        let response = self
            .client
            .delete(url)
            .headers(self.endpoint.auth_headers()?)
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;
        Self::check(response, "remove", bucket).await?;

        info!(
            subsystem = "store",
            component = "storage",
            op = "remove",
            bucket,
            result_count = paths.len(),
            "Objects removed"
        );
        Ok(())
    }
}
