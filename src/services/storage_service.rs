//! src/services/storage_service.rs
//!
//! StorageService holds the read-only operations the HTTP layer exposes. It
//! drains the whole bucket listing and streams one object through. Upstream access goes
//! through an `ObjectBackend`; this file owns key validation, cancellation and
//! the error taxonomy.

use super::{
    backend::{ObjectBackend, ObjectBody},
    enumerator,
};
use crate::models::object::ObjectRecord;
use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Literal the browser sends before any item has been selected.
pub const PLACEHOLDER_KEY: &str = "undefined";

const MAX_OBJECT_KEY_LEN: usize = 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("operation cancelled")]
    Cancelled,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// StorageService provides the gallery's two upstream operations:
/// - List every object in the bucket (all-or-nothing)
/// - Stream one object's bytes
///
/// Cheap to clone; the backend is shared and the shutdown token is the parent
/// of every per-request token.
#[derive(Clone)]
pub struct StorageService {
    /// Upstream bucket access.
    pub backend: Arc<dyn ObjectBackend>,

    /// Cancelled when the server shuts down.
    pub shutdown: CancellationToken,
}

impl StorageService {
    pub fn new(backend: Arc<dyn ObjectBackend>, shutdown: CancellationToken) -> Self {
        Self { backend, shutdown }
    }

    /// Token for one request, cancelled together with the server.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Enumerate the full bucket.
    pub async fn list_all(&self, cancel: &CancellationToken) -> StorageResult<Vec<ObjectRecord>> {
        enumerator::enumerate(self.backend.as_ref(), cancel).await
    }

    /// Validate `key` and open a streaming download for it.
    ///
    /// Invalid keys are rejected before any upstream call. Cancellation is
    /// honored while waiting for upstream headers and ends the body stream
    /// early if it fires mid-transfer.
    pub async fn open_object(
        &self,
        key: Option<&str>,
        cancel: &CancellationToken,
    ) -> StorageResult<ObjectBody> {
        let key = validate_key(key)?;
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StorageError::Cancelled),
            body = self.backend.open_object(key) => body?,
        };
        debug!(key, content_type = ?body.content_type, "object stream opened");

        let stream = body
            .stream
            .take_until(cancel.clone().cancelled_owned())
            .boxed();
        Ok(ObjectBody { stream, ..body })
    }
}

/// Reject missing, empty, placeholder and oversized keys.
pub fn validate_key(key: Option<&str>) -> StorageResult<&str> {
    match key {
        None => Err(StorageError::InvalidRequest("file key is required".into())),
        Some(k) if k.is_empty() || k == PLACEHOLDER_KEY => {
            Err(StorageError::InvalidRequest("file key is required".into()))
        }
        Some(k) if k.len() > MAX_OBJECT_KEY_LEN => Err(StorageError::InvalidRequest(format!(
            "file key exceeds {} bytes",
            MAX_OBJECT_KEY_LEN
        ))),
        Some(k) => Ok(k),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend::fake::FakeBackend;

    fn service(backend: FakeBackend) -> (StorageService, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        (
            StorageService::new(backend.clone(), CancellationToken::new()),
            backend,
        )
    }

    async fn collect(body: ObjectBody) -> Vec<u8> {
        let mut out = Vec::new();
        let mut stream = body.stream;
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[test]
    fn test_validate_key() {
        assert!(matches!(
            validate_key(None),
            Err(StorageError::InvalidRequest(_))
        ));
        assert!(matches!(
            validate_key(Some("")),
            Err(StorageError::InvalidRequest(_))
        ));
        assert!(matches!(
            validate_key(Some("undefined")),
            Err(StorageError::InvalidRequest(_))
        ));
        let long = "k".repeat(MAX_OBJECT_KEY_LEN + 1);
        assert!(matches!(
            validate_key(Some(&long)),
            Err(StorageError::InvalidRequest(_))
        ));
        assert_eq!(validate_key(Some("a/b/c.jpg")).unwrap(), "a/b/c.jpg");
    }

    #[tokio::test]
    async fn test_placeholder_key_never_reaches_upstream() {
        let (service, backend) = service(FakeBackend::new());

        let err = service
            .open_object(Some("undefined"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::InvalidRequest(_)));
        assert!(backend.open_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_streams_object_bytes() {
        let (service, _) = service(FakeBackend::new().with_object(
            "alice/1/cat.png",
            "image/png",
            &[b"abc", b"def"],
        ));

        let body = service
            .open_object(Some("alice/1/cat.png"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(body.content_type.as_deref(), Some("image/png"));
        assert_eq!(body.content_length, Some(6));
        assert_eq!(collect(body).await, b"abcdef");
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let (service, _) = service(FakeBackend::new());

        let err = service
            .open_object(Some("missing.jpg"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cancelled_before_stream_start() {
        let (service, backend) =
            service(FakeBackend::new().with_object("a.jpg", "image/jpeg", &[b"x"]));
        let cancel = service.request_token();
        service.shutdown.cancel();

        let err = service.open_object(Some("a.jpg"), &cancel).await.unwrap_err();

        assert!(matches!(err, StorageError::Cancelled));
        assert!(backend.open_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_mid_stream_ends_body() {
        let (service, _) = service(FakeBackend::new().with_object(
            "a.jpg",
            "image/jpeg",
            &[b"one", b"two"],
        ));
        let cancel = CancellationToken::new();

        let body = service.open_object(Some("a.jpg"), &cancel).await.unwrap();
        cancel.cancel();

        assert!(collect(body).await.is_empty());
    }
}
