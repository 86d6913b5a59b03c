//! `ObjectBackend` over an S3-compatible store, via the AWS SDK.

use super::{
    backend::{ListPage, ObjectBackend, ObjectBody},
    storage_service::{StorageError, StorageResult},
};
use crate::{config::StorageConfig, models::object::ObjectRecord};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{Client, error::DisplayErrorContext, types::Object};
use chrono::DateTime;
use futures::{FutureExt, StreamExt, future::BoxFuture};
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Build an S3 client from the process configuration.
///
/// Region and credentials fall back to the SDK default chain when not set.
/// A custom endpoint switches to path-style addressing, which most
/// S3-compatible stores expect.
pub async fn create_s3_client(config: &StorageConfig) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
        let credentials = aws_sdk_s3::config::Credentials::new(
            access_key,
            secret_key,
            None,
            None,
            "s3-gallery",
        );
        loader = loader.credentials_provider(credentials);
    }

    let sdk_config = loader.load().await;
    let builder = aws_sdk_s3::config::Builder::from(&sdk_config);
    let s3_config = if config.endpoint.is_some() {
        builder.force_path_style(true).build()
    } else {
        builder.build()
    };

    Client::from_conf(s3_config)
}

/// Read-only view of one bucket.
#[derive(Clone, Debug)]
pub struct S3Backend {
    client: Client,
    bucket: String,
}

impl S3Backend {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

impl ObjectBackend for S3Backend {
    fn list_page<'a>(
        &'a self,
        continuation_token: Option<&'a str>,
    ) -> BoxFuture<'a, StorageResult<ListPage>> {
        self.list_objects(continuation_token).boxed()
    }

    fn open_object<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StorageResult<ObjectBody>> {
        self.get_object(key).boxed()
    }
}

impl S3Backend {
    async fn list_objects(&self, continuation_token: Option<&str>) -> StorageResult<ListPage> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_continuation_token(continuation_token.map(str::to_string))
            .send()
            .await
            .map_err(|err| {
                StorageError::StorageUnavailable(format!(
                    "S3 list objects failed: {}",
                    DisplayErrorContext(&err)
                ))
            })?;

        let objects = resp.contents().iter().filter_map(to_record).collect();

        Ok(ListPage {
            objects,
            is_truncated: resp.is_truncated().unwrap_or(false),
            next_continuation_token: resp.next_continuation_token().map(str::to_string),
        })
    }

    async fn get_object(&self, key: &str) -> StorageResult<ObjectBody> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::StorageUnavailable(format!(
                        "S3 get object failed: {}",
                        DisplayErrorContext(&service_err)
                    ))
                }
            })?;

        let content_type = resp.content_type().map(str::to_string);
        let content_length = resp.content_length();
        let stream = ReaderStream::new(resp.body.into_async_read()).boxed();

        Ok(ObjectBody {
            content_type,
            content_length,
            stream,
        })
    }
}

/// Convert an SDK listing entry, skipping entries without a key or timestamp.
fn to_record(obj: &Object) -> Option<ObjectRecord> {
    let Some(key) = obj.key().filter(|k| !k.is_empty()) else {
        debug!("skipping listing entry without a key");
        return None;
    };
    let Some(last_modified) = obj
        .last_modified()
        .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
    else {
        debug!(key, "skipping listing entry without a usable timestamp");
        return None;
    };

    Some(ObjectRecord::new(key, last_modified, obj.size().unwrap_or(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::primitives::DateTime as SmithyDateTime;

    #[test]
    fn test_to_record_converts_sdk_object() {
        let obj = Object::builder()
            .key("alice/42/img.jpg")
            .last_modified(SmithyDateTime::from_secs(1_700_000_000))
            .size(512)
            .build();

        let record = to_record(&obj).unwrap();
        assert_eq!(record.key, "alice/42/img.jpg");
        assert_eq!(record.last_modified.timestamp(), 1_700_000_000);
        assert_eq!(record.size, 512);
    }

    #[test]
    fn test_to_record_skips_entries_without_key() {
        let obj = Object::builder()
            .last_modified(SmithyDateTime::from_secs(1_700_000_000))
            .build();

        assert!(to_record(&obj).is_none());
    }

    #[test]
    fn test_to_record_skips_entries_without_timestamp() {
        let obj = Object::builder().key("a.jpg").build();

        assert!(to_record(&obj).is_none());
    }
}
