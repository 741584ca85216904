use crate::handlers::{db_error, map_error, not_found, ApiError};
use crate::schemas::{ApiResponse, AppState, UserScope};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use common::BalanceBreakdown;
use model::entities::account::{self, AccountKind};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

/// Request body for creating a new account
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateAccountRequest {
    /// Owner user ID
    pub owner_id: i32,
    /// Account name
    pub name: String,
    /// Account kind
    pub kind: AccountKind,
    /// Opening balance, immutable after creation
    pub opening_balance: Decimal,
    /// Display color
    pub color: Option<String>,
}

/// Request body for updating an account
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateAccountRequest {
    /// Account name
    pub name: Option<String>,
    /// Account kind
    pub kind: Option<AccountKind>,
    /// Display color
    pub color: Option<String>,
}

/// Account response model
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub id: i32,
    pub owner_id: i32,
    pub name: String,
    pub kind: AccountKind,
    pub opening_balance: Decimal,
    pub color: String,
    pub is_active: bool,
}

impl From<account::Model> for AccountResponse {
    fn from(model: account::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            kind: model.kind,
            opening_balance: model.opening_balance,
            color: model.color,
            is_active: model.is_active,
        }
    }
}

/// One account with its derived balance breakdown
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountDetailResponse {
    #[serde(flatten)]
    pub account: AccountResponse,
    pub balance: BalanceBreakdown,
}

async fn find_owned_account(
    state: &AppState,
    account_id: i32,
    user_id: i32,
) -> Result<account::Model, ApiError> {
    account::Entity::find_by_id(account_id)
        .filter(account::Column::OwnerId.eq(user_id))
        .one(&state.db)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("account"))
}

/// Create a new account
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    tag = "accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created successfully", body = ApiResponse<AccountResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountResponse>>), ApiError> {
    debug!(
        "Creating account '{}' for owner {}",
        request.name, request.owner_id
    );

    let created = account::ActiveModel {
        owner_id: Set(request.owner_id),
        name: Set(request.name),
        kind: Set(request.kind),
        opening_balance: Set(request.opening_balance),
        color: Set(request.color.unwrap_or_else(|| "#607d8b".to_string())),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(db_error)?;

    info!("Account created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: AccountResponse::from(created),
            message: "Account created successfully".to_string(),
            success: true,
        }),
    ))
}

/// Get the user's active accounts with their derived balances
#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    tag = "accounts",
    params(UserScope),
    responses(
        (status = 200, description = "Accounts retrieved successfully", body = ApiResponse<Vec<AccountDetailResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_accounts(
    Query(scope): Query<UserScope>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AccountDetailResponse>>>, ApiError> {
    let accounts = account::Entity::find()
        .filter(account::Column::OwnerId.eq(scope.user_id))
        .filter(account::Column::IsActive.eq(true))
        .all(&state.db)
        .await
        .map_err(db_error)?;
    debug!("Retrieved {} accounts for user {}", accounts.len(), scope.user_id);

    let mut details = Vec::with_capacity(accounts.len());
    for acct in accounts {
        let balance = compute::balance::account_breakdown(&state.db, &acct)
            .await
            .map_err(map_error)?;
        details.push(AccountDetailResponse {
            account: AccountResponse::from(acct),
            balance,
        });
    }

    Ok(Json(ApiResponse {
        data: details,
        message: "Accounts retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a specific account with its derived balance
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{account_id}",
    tag = "accounts",
    params(
        ("account_id" = i32, Path, description = "Account ID"),
        UserScope,
    ),
    responses(
        (status = 200, description = "Account retrieved successfully", body = ApiResponse<AccountDetailResponse>),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_account(
    Path(account_id): Path<i32>,
    Query(scope): Query<UserScope>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AccountDetailResponse>>, ApiError> {
    let acct = find_owned_account(&state, account_id, scope.user_id).await?;
    let balance = compute::balance::account_breakdown(&state.db, &acct)
        .await
        .map_err(map_error)?;

    Ok(Json(ApiResponse {
        data: AccountDetailResponse {
            account: AccountResponse::from(acct),
            balance,
        },
        message: "Account retrieved successfully".to_string(),
        success: true,
    }))
}

/// Update an account
///
/// The opening balance is immutable; only name, kind and color can
/// change.
#[utoipa::path(
    put,
    path = "/api/v1/accounts/{account_id}",
    tag = "accounts",
    params(
        ("account_id" = i32, Path, description = "Account ID"),
        UserScope,
    ),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated successfully", body = ApiResponse<AccountResponse>),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_account(
    Path(account_id): Path<i32>,
    Query(scope): Query<UserScope>,
    State(state): State<AppState>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let existing = find_owned_account(&state, account_id, scope.user_id).await?;

    let mut active: account::ActiveModel = existing.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(kind) = request.kind {
        active.kind = Set(kind);
    }
    if let Some(color) = request.color {
        active.color = Set(color);
    }

    let updated = active.update(&state.db).await.map_err(db_error)?;
    info!("Account with ID {} updated successfully", updated.id);

    Ok(Json(ApiResponse {
        data: AccountResponse::from(updated),
        message: "Account updated successfully".to_string(),
        success: true,
    }))
}

/// Deactivate an account
///
/// Accounts are soft-deleted: the row stays so the transaction history
/// it anchors remains intact, but it no longer shows up in listings or
/// the dashboard.
#[utoipa::path(
    delete,
    path = "/api/v1/accounts/{account_id}",
    tag = "accounts",
    params(
        ("account_id" = i32, Path, description = "Account ID"),
        UserScope,
    ),
    responses(
        (status = 200, description = "Account deactivated successfully", body = ApiResponse<String>),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_account(
    Path(account_id): Path<i32>,
    Query(scope): Query<UserScope>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let existing = find_owned_account(&state, account_id, scope.user_id).await?;
    if !existing.is_active {
        warn!("Account with ID {} is already inactive", account_id);
    }

    let mut active: account::ActiveModel = existing.into();
    active.is_active = Set(false);
    active.update(&state.db).await.map_err(db_error)?;

    state.cache.invalidate_all();
    info!("Account with ID {} deactivated", account_id);

    Ok(Json(ApiResponse {
        data: format!("Account {} deactivated", account_id),
        message: "Account deactivated successfully".to_string(),
        success: true,
    }))
}
