//! Liveness handler.
//!
//! - GET /healthz  -> simple liveness ("ok")

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// `GET /healthz`
///
/// Always returns 200 OK with a plain JSON body. Never touches the bucket:
/// a storage outage shows up on the listing endpoint, not here.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}
