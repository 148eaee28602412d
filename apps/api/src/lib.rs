//! # stockroom-api: HTTP Boundary
//!
//! JSON over HTTP for the ledger in `stockroom-db`.
//!
//! ```text
//! GET    /health
//! GET    /products                      POST /products
//! GET    /products/{sku}                PATCH /products/{sku}   DELETE /products/{sku}
//! POST   /products/import/csv           (multipart, field "file")
//! GET    /orders                        POST /orders
//! GET    /orders/{id}                   PATCH /orders/{id}      DELETE /orders/{id}
//! GET    /orders/by-number/{number}
//! POST   /orders/bulk-delete
//! POST   /orders/import/csv             (multipart, field "file")
//! POST   /reports/comprehensive
//! ```

pub mod config;
pub mod error;
mod routes;
pub mod telemetry;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use stockroom_db::Database;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }
}

/// Builds the full router with tracing, CORS and the body size limit applied.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::products::router())
        .merge(routes::orders::router())
        .merge(routes::reports::router())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
