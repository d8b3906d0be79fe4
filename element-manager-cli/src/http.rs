//! Object catalog HTTP client
//!
//! `RemoteStore` over the catalog's REST collection. One request per call, no retry.

use anyhow::{Context, Result};
use async_trait::async_trait;
use element_manager_core::{Element, RemoteStore, StoreError, WritePayload};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.restful-api.dev/objects";

/// Longest slice of an error body kept in a [`StoreError::Status`].
const ERROR_BODY_LIMIT: usize = 200;

pub struct HttpStore {
    http: Client,
    base_url: Url,
}

impl HttpStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid catalog base URL '{}'", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Catalog base URL '{}' cannot have path segments", base_url);
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn item_url(&self, id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id);
        }
        url
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, StoreError> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("{} failed: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }
        debug!(%status, what, "catalog responded");
        Ok(response)
    }

    async fn read_value(response: Response, what: &str) -> Result<Value, StoreError> {
        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Transport(format!("reading {} response: {}", what, e)))?;
        serde_json::from_str(&text)
            .map_err(|e| StoreError::Malformed(format!("{} response is not JSON: {}", what, e)))
    }

    fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, StoreError> {
        serde_json::from_value(value)
            .map_err(|e| StoreError::Decode(format!("unexpected {} response: {}", what, e)))
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn list(&self) -> Result<Vec<Element>, StoreError> {
        let response = self
            .send(self.http.get(self.base_url.clone()), "list")
            .await?;
        let value = Self::read_value(response, "list").await?;
        if !value.is_array() {
            return Err(StoreError::Malformed(format!(
                "expected a JSON array from list, got {}",
                json_kind(&value)
            )));
        }
        Self::decode(value, "list")
    }

    async fn create(&self, payload: &WritePayload) -> Result<Element, StoreError> {
        let request = self.http.post(self.base_url.clone()).json(payload);
        let response = self.send(request, "create").await?;
        let value = Self::read_value(response, "create").await?;
        Self::decode(value, "create")
    }

    async fn update(&self, id: &str, payload: &WritePayload) -> Result<Element, StoreError> {
        let request = self.http.put(self.item_url(id)).json(payload);
        let response = self.send(request, "update").await?;
        let value = Self::read_value(response, "update").await?;
        Self::decode(value, "update")
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.send(self.http.delete(self.item_url(id)), "delete")
            .await?;
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
