use crate::handlers::{bad_request, map_error, ApiError};
use crate::schemas::{ApiResponse, AppState, CachedData, DashboardQuery};
use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::Datelike;
use common::{DashboardSnapshot, MonthWindow};
use tracing::{debug, instrument};

/// Get the composed monthly dashboard
///
/// The snapshot is cached per user and month; any write that can move
/// derived state (transactions, bills, payments, budgets) invalidates
/// the cache.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Dashboard snapshot", body = ApiResponse<DashboardSnapshot>),
        (status = 400, description = "Invalid month", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_dashboard(
    Query(query): Query<DashboardQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardSnapshot>>, ApiError> {
    let today = chrono::Utc::now().date_naive();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());
    let window =
        MonthWindow::new(year, month).ok_or_else(|| bad_request("month must be between 1 and 12"))?;

    let cache_key = format!("dash_{}_{}_{}", query.user_id, year, month);
    if let Some(CachedData::Dashboard(snapshot)) = state.cache.get(&cache_key).await {
        debug!("Dashboard cache hit for {}", cache_key);
        return Ok(Json(ApiResponse {
            data: snapshot,
            message: "Dashboard snapshot".to_string(),
            success: true,
        }));
    }

    debug!("Dashboard cache miss for {}", cache_key);
    let snapshot = compute::dashboard::build_snapshot(&state.db, query.user_id, window)
        .await
        .map_err(map_error)?;
    state
        .cache
        .insert(cache_key, CachedData::Dashboard(snapshot.clone()))
        .await;

    Ok(Json(ApiResponse {
        data: snapshot,
        message: "Dashboard snapshot".to_string(),
        success: true,
    }))
}
