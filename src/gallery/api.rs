//! HTTP client for the gallery server.

use crate::models::object::ObjectRecord;
use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("listing response is not an array: {0}")]
    UnexpectedShape(String),
    #[error("listing cancelled")]
    Cancelled,
}

#[derive(Clone, Debug)]
pub struct GalleryClient {
    http: Client,
    base: Url,
}

impl GalleryClient {
    pub fn new(base: Url) -> Self {
        Self {
            http: Client::new(),
            base,
        }
    }

    /// Fetch the full listing once.
    pub async fn fetch_listing(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ObjectRecord>, ListingError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ListingError::Cancelled),
            outcome = self.request_listing() => outcome,
        }
    }

    async fn request_listing(&self) -> Result<Vec<ObjectRecord>, ListingError> {
        let url = self.endpoint(&["api", "listFiles"]);
        debug!(%url, "requesting listing");

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ListingError::StorageUnavailable(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body: Value = resp.json().await.unwrap_or(Value::Null);
            let message = body
                .get("details")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
                .unwrap_or("no details");
            return Err(ListingError::StorageUnavailable(format!(
                "server answered {}: {}",
                status, message
            )));
        }

        let text = resp
            .text()
            .await
            .map_err(|err| ListingError::StorageUnavailable(err.to_string()))?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|err| ListingError::UnexpectedShape(format!("invalid JSON: {}", err)))?;
        parse_listing(value)
    }

    /// URL of the object endpoint for `key`, with the key percent-encoded
    /// into a single path segment.
    ///
    /// `None` for the keys `.` and `..`: URL path normalization removes those
    /// segments in any spelling (`%2E` included), so no URL reaches them.
    pub fn object_url(&self, key: &str) -> Option<Url> {
        if matches!(key, "." | "..") {
            warn!(key, "object key cannot be addressed as a path segment");
            return None;
        }
        let mut url = self.endpoint(&["api", "p"]);
        url.path_segments_mut().ok()?.push(key);
        Some(url)
    }

    fn endpoint(&self, path: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(path);
        }
        url
    }
}

/// Decode a listing body into records.
///
/// A non-array body is `UnexpectedShape`. Entries without a usable `Key` or
/// `LastModified` are dropped with a warning.
pub fn parse_listing(value: Value) -> Result<Vec<ObjectRecord>, ListingError> {
    let Value::Array(entries) = value else {
        return Err(ListingError::UnexpectedShape(shape_of(&value).to_string()));
    };

    let total = entries.len();
    let records: Vec<ObjectRecord> = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<ObjectRecord>(entry) {
            Ok(record) if !record.key.is_empty() => Some(record),
            Ok(_) => {
                warn!("dropping listing entry with an empty key");
                None
            }
            Err(err) => {
                warn!("dropping malformed listing entry: {}", err);
                None
            }
        })
        .collect();

    if records.len() != total {
        debug!(kept = records.len(), total, "listing entries filtered");
    }
    Ok(records)
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
