use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    database: bool,
    migrations_applied: usize,
    migrations_total: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let database = state.db.health_check().await;
    let migrations = state.db.migration_status().await.ok();
    let (total, applied) = migrations.unwrap_or_default();

    let healthy = database && migrations.is_some() && applied == total;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthReport {
            status: if healthy { "ok" } else { "degraded" },
            database,
            migrations_applied: applied,
            migrations_total: total,
        }),
    )
}
