//! HTTP handlers for the gallery API.
//! Streams object bodies to avoid buffering in memory and delegates storage
//! concerns to `StorageService`.

use crate::{
    errors::AppError, models::object::ObjectRecord, services::storage_service::StorageService,
};
use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";

/// `GET /api/listFiles`: every object in the bucket, as one JSON array.
///
/// The whole bucket is drained before responding; any upstream failure
/// yields a 500 with `{error, details}` and no partial listing.
pub async fn list_files(
    State(service): State<StorageService>,
) -> Result<Json<Vec<ObjectRecord>>, AppError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("list_files", %request_id);

    async move {
        let cancel = service.request_token();
        let objects = service.list_all(&cancel).await.map_err(|err| {
            error!("bucket enumeration failed: {}", err);
            AppError::internal("Error fetching files from S3").with_details(err.to_string())
        })?;

        info!(count = objects.len(), "listing served");
        Ok::<_, AppError>(Json(objects))
    }
    .instrument(span)
    .await
}

/// `GET /api/p/{*key}`: stream one object inline.
pub async fn get_object(
    State(service): State<StorageService>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    stream_object(service, Some(&key)).await
}

/// `GET /api/p`: the key segment is missing entirely.
pub async fn get_object_without_key(
    State(service): State<StorageService>,
) -> Result<Response, AppError> {
    stream_object(service, None).await
}

async fn stream_object(service: StorageService, key: Option<&str>) -> Result<Response, AppError> {
    let cancel = service.request_token();
    let object = service.open_object(key, &cancel).await.map_err(|err| {
        info!(key = ?key, "object request rejected: {}", err);
        AppError::from(err)
    })?;

    let mut response = Response::new(Body::from_stream(object.stream));
    *response.status_mut() = StatusCode::OK;
    set_object_headers(
        response.headers_mut(),
        object.content_type.as_deref(),
        object.content_length,
    );

    Ok(response)
}

/// Image content type (upstream's if it is an image), inline disposition,
/// and length when upstream reported one.
fn set_object_headers(headers: &mut HeaderMap, content_type: Option<&str>, length: Option<i64>) {
    let content_type = content_type
        .filter(|ct| ct.starts_with("image/"))
        .unwrap_or(FALLBACK_CONTENT_TYPE);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE)),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("inline"),
    );

    if let Some(length) = length.filter(|l| *l >= 0) {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_image_content_type_falls_back() {
        let mut headers = HeaderMap::new();
        set_object_headers(&mut headers, Some("binary/octet-stream"), Some(10));

        assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(headers[header::CONTENT_DISPOSITION], "inline");
        assert_eq!(headers[header::CONTENT_LENGTH], "10");
    }

    #[test]
    fn test_image_content_type_is_kept() {
        let mut headers = HeaderMap::new();
        set_object_headers(&mut headers, Some("image/webp"), None);

        assert_eq!(headers[header::CONTENT_TYPE], "image/webp");
        assert!(headers.get(header::CONTENT_LENGTH).is_none());
    }
}
