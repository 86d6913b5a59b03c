//! Represents one object listed from the gallery bucket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single object (media file) discovered in the bucket.
///
/// Only listing metadata is carried; the bytes are fetched separately through
/// the object endpoint. Field names on the wire follow the upstream listing
/// (`Key`, `LastModified`, `Size`) so the JSON collection reads like the
/// storage API it was drained from.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectRecord {
    /// Object key (slash-segmented, path-like identifier within the bucket).
    pub key: String,

    /// Timestamp when the object was last modified upstream.
    pub last_modified: DateTime<Utc>,

    /// Size in bytes. Informational only.
    #[serde(default)]
    pub size: i64,
}

impl ObjectRecord {
    pub fn new(key: impl Into<String>, last_modified: DateTime<Utc>, size: i64) -> Self {
        Self {
            key: key.into(),
            last_modified,
            size,
        }
    }
}
