//! Exhaustive bucket enumeration over a continuation-token listing.

use super::{
    backend::ObjectBackend,
    storage_service::{StorageError, StorageResult},
};
use crate::models::object::ObjectRecord;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Drain every listing page into one collection.
///
/// Pages are requested one at a time; each request after the first carries
/// the exact cursor returned by the previous response. The first
/// non-truncated response ends the loop.
///
/// All-or-nothing: a failure at any step (or cancellation) drops everything
/// collected so far and returns the error.
pub async fn enumerate(
    backend: &dyn ObjectBackend,
    cancel: &CancellationToken,
) -> StorageResult<Vec<ObjectRecord>> {
    let mut objects = Vec::new();
    let mut continuation_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }

        let page = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StorageError::Cancelled),
            page = backend.list_page(continuation_token.as_deref()) => page?,
        };
        pages += 1;
        debug!(
            page = pages,
            items = page.objects.len(),
            truncated = page.is_truncated,
            "listing page received"
        );

        objects.extend(page.objects);

        if !page.is_truncated {
            break;
        }
        match page.next_continuation_token {
            Some(token) => continuation_token = Some(token),
            None => {
                return Err(StorageError::StorageUnavailable(format!(
                    "listing page {} is truncated but carries no continuation token",
                    pages
                )));
            }
        }
    }

    info!(pages, objects = objects.len(), "bucket enumeration complete");
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend::{ListPage, fake::FakeBackend};
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn records(prefix: &str, count: usize) -> Vec<ObjectRecord> {
        (0..count)
            .map(|i| {
                ObjectRecord::new(
                    format!("{}/{}.jpg", prefix, i),
                    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                    10,
                )
            })
            .collect()
    }

    fn page(prefix: &str, count: usize, next: Option<&str>) -> ListPage {
        ListPage {
            objects: records(prefix, count),
            is_truncated: next.is_some(),
            next_continuation_token: next.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_single_page_listing() {
        let backend = FakeBackend::new().with_page(page("a", 3, None));

        let objects = enumerate(&backend, &CancellationToken::new()).await.unwrap();

        assert_eq!(objects.len(), 3);
        assert_eq!(*backend.seen_tokens.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn test_drains_all_truncated_pages_including_the_first() {
        let sizes = [5usize, 7, 1, 4];
        let cursors = ["cur-1", "cur-2", "cur-3"];
        let mut backend = FakeBackend::new();
        for (i, size) in sizes.iter().enumerate() {
            let next = cursors.get(i).copied();
            backend = backend.with_page(page(&format!("p{}", i), *size, next));
        }

        let objects = enumerate(&backend, &CancellationToken::new()).await.unwrap();

        assert_eq!(objects.len(), sizes.iter().sum::<usize>());
        assert_eq!(objects[0].key, "p0/0.jpg");
        assert_eq!(objects.last().unwrap().key, "p3/3.jpg");

        let seen = backend.seen_tokens.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                None,
                Some("cur-1".to_string()),
                Some("cur-2".to_string()),
                Some("cur-3".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_mid_listing_discards_partial_results() {
        let backend = FakeBackend::new()
            .with_page(page("a", 10, Some("next")))
            .with_page_error(StorageError::StorageUnavailable("connection reset".into()))
            .with_page(page("b", 10, None));

        let err = enumerate(&backend, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::StorageUnavailable(_)));
        assert_eq!(backend.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_truncated_without_cursor_is_an_error() {
        let backend = FakeBackend::new().with_page(ListPage {
            objects: records("a", 2),
            is_truncated: true,
            next_continuation_token: None,
        });

        let err = enumerate(&backend, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_request() {
        let backend = FakeBackend::new().with_page(page("a", 2, None));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = enumerate(&backend, &cancel).await.unwrap_err();

        assert!(matches!(err, StorageError::Cancelled));
        assert_eq!(backend.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_in_flight_request() {
        let backend = FakeBackend::new()
            .with_page(page("a", 4, Some("cur-1")))
            .with_hanging_page();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = tokio::time::timeout(Duration::from_secs(5), enumerate(&backend, &cancel))
            .await
            .expect("enumeration should stop once cancelled")
            .unwrap_err();

        assert!(matches!(err, StorageError::Cancelled));
        assert_eq!(
            *backend.seen_tokens.lock().unwrap(),
            vec![None, Some("cur-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_bucket() {
        let backend = FakeBackend::new().with_page(ListPage::default());

        let objects = enumerate(&backend, &CancellationToken::new()).await.unwrap();

        assert!(objects.is_empty());
    }
}
