use crate::handlers::{bad_request, db_error, map_error, not_found, ApiError};
use crate::schemas::{ApiResponse, AppState, UserScope};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Datelike;
use common::{BudgetEvaluation, BudgetSummary, MonthWindow};
use compute::budget::{self, NewBudget};
use model::entities::budget as budget_entity;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};

/// Request body for creating or replacing a budget
///
/// Exactly one of `limit_amount` and `percent` must be set. Posting
/// for a (category, month, year) that already has a budget replaces
/// its limits.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpsertBudgetRequest {
    /// Owner user ID
    pub owner_id: i32,
    pub category_id: i32,
    /// Month, 1-12
    pub month: u32,
    pub year: i32,
    /// Fixed monthly limit
    pub limit_amount: Option<Decimal>,
    /// Percentage of the month's income, in (0, 100]
    pub percent: Option<Decimal>,
}

/// Budget response model
#[derive(Debug, Serialize, ToSchema)]
pub struct BudgetResponse {
    pub id: i32,
    pub owner_id: i32,
    pub category_id: i32,
    pub month: i32,
    pub year: i32,
    pub limit_amount: Option<Decimal>,
    pub percent: Option<Decimal>,
}

impl From<budget_entity::Model> for BudgetResponse {
    fn from(model: budget_entity::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            category_id: model.category_id,
            month: model.month,
            year: model.year,
            limit_amount: model.limit_amount,
            percent: model.percent,
        }
    }
}

/// Query parameters selecting a budget month
#[derive(Debug, Deserialize, IntoParams)]
pub struct BudgetMonthQuery {
    /// Owner user ID
    pub user_id: i32,
    /// Year (defaults to the current year)
    pub year: Option<i32>,
    /// Month, 1-12 (defaults to the current month)
    pub month: Option<u32>,
}

fn resolve_window(year: Option<i32>, month: Option<u32>) -> Result<MonthWindow, ApiError> {
    let today = chrono::Utc::now().date_naive();
    let year = year.unwrap_or_else(|| today.year());
    let month = month.unwrap_or_else(|| today.month());
    MonthWindow::new(year, month).ok_or_else(|| bad_request("month must be between 1 and 12"))
}

/// Create or replace a budget for one category and month
#[utoipa::path(
    post,
    path = "/api/v1/budgets",
    tag = "budgets",
    request_body = UpsertBudgetRequest,
    responses(
        (status = 201, description = "Budget saved successfully", body = ApiResponse<BudgetResponse>),
        (status = 400, description = "Invalid limits", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn upsert_budget(
    State(state): State<AppState>,
    Json(request): Json<UpsertBudgetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetResponse>>), ApiError> {
    debug!(
        "Upserting budget for category {} in {}-{:02}",
        request.category_id, request.year, request.month
    );

    let saved = budget::upsert_budget(
        &state.db,
        request.owner_id,
        NewBudget {
            category_id: request.category_id,
            month: request.month,
            year: request.year,
            limit_amount: request.limit_amount,
            percent: request.percent,
        },
    )
    .await
    .map_err(map_error)?;

    state.cache.invalidate_all();
    info!("Budget saved with ID: {}", saved.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: BudgetResponse::from(saved),
            message: "Budget saved successfully".to_string(),
            success: true,
        }),
    ))
}

/// Get the month's budgets evaluated against actual spending
#[utoipa::path(
    get,
    path = "/api/v1/budgets",
    tag = "budgets",
    params(BudgetMonthQuery),
    responses(
        (status = 200, description = "Budgets evaluated successfully", body = ApiResponse<Vec<BudgetEvaluation>>),
        (status = 400, description = "Invalid month", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budgets(
    Query(query): Query<BudgetMonthQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<BudgetEvaluation>>>, ApiError> {
    let window = resolve_window(query.year, query.month)?;
    let evaluations = budget::evaluate_month(&state.db, query.user_id, window)
        .await
        .map_err(map_error)?;
    debug!(
        "Evaluated {} budgets for user {} in {}-{:02}",
        evaluations.len(),
        query.user_id,
        window.year(),
        window.month()
    );

    Ok(Json(ApiResponse {
        data: evaluations,
        message: "Budgets evaluated successfully".to_string(),
        success: true,
    }))
}

/// Get the month's aggregate budget position
#[utoipa::path(
    get,
    path = "/api/v1/budgets/summary",
    tag = "budgets",
    params(BudgetMonthQuery),
    responses(
        (status = 200, description = "Summary computed successfully", body = ApiResponse<BudgetSummary>),
        (status = 400, description = "Invalid month", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budget_summary(
    Query(query): Query<BudgetMonthQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BudgetSummary>>, ApiError> {
    let window = resolve_window(query.year, query.month)?;
    let summary = budget::budget_summary(&state.db, query.user_id, window)
        .await
        .map_err(map_error)?;

    Ok(Json(ApiResponse {
        data: summary,
        message: "Summary computed successfully".to_string(),
        success: true,
    }))
}

/// Delete a budget
#[utoipa::path(
    delete,
    path = "/api/v1/budgets/{budget_id}",
    tag = "budgets",
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
        UserScope,
    ),
    responses(
        (status = 200, description = "Budget deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_budget(
    Path(budget_id): Path<i32>,
    Query(scope): Query<UserScope>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let existing = budget_entity::Entity::find_by_id(budget_id)
        .filter(budget_entity::Column::OwnerId.eq(scope.user_id))
        .one(&state.db)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("budget"))?;

    budget_entity::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await
        .map_err(db_error)?;

    state.cache.invalidate_all();
    info!("Budget with ID {} deleted", budget_id);

    Ok(Json(ApiResponse {
        data: format!("Budget {} deleted", budget_id),
        message: "Budget deleted successfully".to_string(),
        success: true,
    }))
}
