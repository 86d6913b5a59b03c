//! Defines routes for the gallery API.
//!
//! ## Structure
//! - `GET /healthz`         : liveness
//! - `GET /api/listFiles`   : full bucket listing as JSON
//! - `GET /api/p/{*key}`    : stream one object inline
//! - `GET /api/p`, `/api/p/`: key missing, always 400
//!
//! The wildcard `*key` accepts both percent-encoded (`a%2Fb%2Fc.jpg`) and raw
//! nested keys like `alice/123/img.jpg`.

use crate::{
    handlers::{
        health_handlers::healthz,
        object_handlers::{get_object, get_object_without_key, list_files},
    },
    services::storage_service::StorageService,
};
use axum::{Router, routing::get};

/// Build and return the router for the gallery API.
///
/// The router carries shared state (`StorageService`) to all handlers.
pub fn routes() -> Router<StorageService> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/listFiles", get(list_files))
        .route("/api/p", get(get_object_without_key))
        .route("/api/p/", get(get_object_without_key))
        .route("/api/p/{*key}", get(get_object))
}
