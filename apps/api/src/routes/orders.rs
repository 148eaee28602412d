//! Order endpoints. Every stock-affecting call goes through the
//! reconciliation engine in `OrderRepository`.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use stockroom_core::{CreateOrderRequest, Order, UpdateOrderRequest};
use stockroom_db::{BulkDeleteMode, BulkDeleteOutcome, OrderImportOutcome};
use tracing::{debug, info};

use super::read_upload;
use crate::error::{ApiJson, ApiPath, ApiResult};
use crate::AppState;

/// Body of `POST /orders/bulk-delete`.
#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<i64>,
    /// Keep going after a failed id instead of stopping.
    #[serde(default)]
    pub continue_on_error: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/import/csv", post(import_orders))
        .route("/orders/bulk-delete", post(bulk_delete))
        .route("/orders/by-number/{order_number}", get(get_order_by_number))
        .route(
            "/orders/{id}",
            get(get_order).patch(update_order).delete(delete_order),
        )
}

async fn list_orders(State(state): State<AppState>) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.db.orders().list().await?))
}

async fn create_order(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = state.db.orders().create(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn get_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.db.orders().get(id).await?))
}

async fn get_order_by_number(
    State(state): State<AppState>,
    ApiPath(order_number): ApiPath<String>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.db.orders().get_by_number(&order_number).await?))
}

async fn update_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<UpdateOrderRequest>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.db.orders().update(id, patch).await?))
}

async fn delete_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.db.orders().delete(id).await?))
}

async fn bulk_delete(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BulkDeleteRequest>,
) -> Json<BulkDeleteOutcome> {
    let mode = if request.continue_on_error {
        BulkDeleteMode::ContinueOnError
    } else {
        BulkDeleteMode::AbortOnError
    };

    let outcome = state
        .db
        .orders()
        .bulk_delete(&request.ids, mode, |progress| {
            debug!(
                completed = progress.completed,
                total = progress.total,
                fraction = progress.fraction,
                "Bulk delete progress"
            );
        })
        .await;
    Json(outcome)
}

async fn import_orders(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<OrderImportOutcome>> {
    let csv = read_upload(multipart).await?;
    info!(bytes = csv.len(), "Order CSV upload received");
    Ok(Json(state.db.importer().import_orders(&csv).await?))
}
