//! The storage seam used by the enumerator and the object proxy.
//!
//! One call maps to one upstream request: a single listing page, or the start
//! of a single object download. Everything above this trait (cursor draining,
//! key validation, cancellation) is backend-agnostic and tested against an
//! in-memory fake.

use super::storage_service::StorageResult;
use crate::models::object::ObjectRecord;
use bytes::Bytes;
use futures::{future::BoxFuture, stream::BoxStream};
use std::{fmt, io};

/// One page of a continuation-token listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub objects: Vec<ObjectRecord>,
    pub is_truncated: bool,
    /// Opaque cursor to pass back verbatim for the next page.
    pub next_continuation_token: Option<String>,
}

/// Streaming object payload plus the metadata needed for response headers.
pub struct ObjectBody {
    pub content_type: Option<String>,
    pub content_length: Option<i64>,
    pub stream: BoxStream<'static, io::Result<Bytes>>,
}

impl fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBody")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Read-only access to a single bucket.
pub trait ObjectBackend: Send + Sync + 'static {
    /// Fetch one listing page, starting at `continuation_token` when given.
    fn list_page<'a>(
        &'a self,
        continuation_token: Option<&'a str>,
    ) -> BoxFuture<'a, StorageResult<ListPage>>;

    /// Start downloading `key`. Resolves once upstream has answered with
    /// headers; the body is consumed through the returned stream.
    fn open_object<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StorageResult<ObjectBody>>;
}
