//! Product catalogue endpoints.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use stockroom_core::{CreateProductRequest, Product, UpdateProductRequest};
use stockroom_db::ProductImportOutcome;
use tracing::info;

use super::read_upload;
use crate::error::{ApiJson, ApiPath, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/import/csv", post(import_products))
        .route(
            "/products/{sku}",
            get(get_product).patch(update_product).delete(delete_product),
        )
}

async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().list().await?))
}

async fn create_product(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state.db.products().create(request).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(state): State<AppState>,
    ApiPath(sku): ApiPath<String>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().get(&sku).await?))
}

async fn update_product(
    State(state): State<AppState>,
    ApiPath(sku): ApiPath<String>,
    ApiJson(patch): ApiJson<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().update(&sku, patch).await?))
}

async fn delete_product(
    State(state): State<AppState>,
    ApiPath(sku): ApiPath<String>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().delete(&sku).await?))
}

async fn import_products(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<ProductImportOutcome>> {
    let csv = read_upload(multipart).await?;
    info!(bytes = csv.len(), "Product CSV upload received");
    Ok(Json(state.db.importer().import_products(&csv).await?))
}
