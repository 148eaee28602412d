use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use stockroom_core::report::{Report, ReportFilter};

use crate::error::{ApiJson, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/reports/comprehensive", post(comprehensive_report))
}

/// Four-part report over the orders matching the filter. An empty body
/// object (`{}`) reports on every order.
async fn comprehensive_report(
    State(state): State<AppState>,
    ApiJson(filter): ApiJson<ReportFilter>,
) -> ApiResult<Json<Report>> {
    Ok(Json(state.db.reports().generate(&filter).await?))
}
