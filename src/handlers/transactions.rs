use crate::handlers::{db_error, map_error, not_found, ApiError};
use crate::schemas::{ApiResponse, AppState, UserScope};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use common::TransactionsSummary;
use compute::transfers::{self, NewTransfer};
use model::entities::transaction::{self, TransactionKind};
use model::entities::{account, category};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

/// Request body for creating a new transaction
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateTransactionRequest {
    /// Owner user ID
    pub owner_id: i32,
    /// Description
    pub description: String,
    /// Positive amount; the kind decides the sign
    pub amount: Decimal,
    /// Transaction kind
    pub kind: TransactionKind,
    /// Transaction date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Account the money moves through
    pub account_id: i32,
    /// Optional category
    pub category_id: Option<i32>,
}

/// Request body for transferring money between two accounts
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateTransferRequest {
    /// Owner user ID
    pub owner_id: i32,
    pub from_account_id: i32,
    pub to_account_id: i32,
    pub amount: Decimal,
    /// Transfer date (YYYY-MM-DD)
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// Transaction response model
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i32,
    pub owner_id: i32,
    pub description: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub account_id: i32,
    pub category_id: Option<i32>,
    /// Present when the transaction was created by a payment
    pub payment_id: Option<i32>,
}

impl From<transaction::Model> for TransactionResponse {
    fn from(model: transaction::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            description: model.description,
            amount: model.amount,
            kind: model.kind,
            date: model.date,
            account_id: model.account_id,
            category_id: model.category_id,
            payment_id: model.payment_id,
        }
    }
}

/// Query parameters for listing transactions
#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionsQuery {
    /// Owner user ID
    pub user_id: i32,
    /// Restrict to one kind
    pub kind: Option<TransactionKind>,
    /// Restrict to one account
    pub account_id: Option<i32>,
    /// Restrict to one category
    pub category_id: Option<i32>,
    /// Inclusive start date (YYYY-MM-DD)
    pub start_date: Option<NaiveDate>,
    /// Inclusive end date (YYYY-MM-DD)
    pub end_date: Option<NaiveDate>,
}

async fn filtered_transactions(
    state: &AppState,
    query: &TransactionsQuery,
) -> Result<Vec<transaction::Model>, ApiError> {
    let mut finder = transaction::Entity::find()
        .filter(transaction::Column::OwnerId.eq(query.user_id));
    if let Some(kind) = query.kind {
        finder = finder.filter(transaction::Column::Kind.eq(kind));
    }
    if let Some(account_id) = query.account_id {
        finder = finder.filter(transaction::Column::AccountId.eq(account_id));
    }
    if let Some(category_id) = query.category_id {
        finder = finder.filter(transaction::Column::CategoryId.eq(category_id));
    }
    if let Some(start) = query.start_date {
        finder = finder.filter(transaction::Column::Date.gte(start));
    }
    if let Some(end) = query.end_date {
        finder = finder.filter(transaction::Column::Date.lte(end));
    }
    finder
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id)
        .all(&state.db)
        .await
        .map_err(db_error)
}

/// Create a new transaction
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    tag = "transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction created successfully", body = ApiResponse<TransactionResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Account or category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionResponse>>), ApiError> {
    debug!(
        "Creating {:?} transaction of {} for owner {}",
        request.kind, request.amount, request.owner_id
    );

    if request.amount <= Decimal::ZERO {
        return Err(map_error(compute::LedgerError::Validation(
            "transaction amount must be positive".to_string(),
        )));
    }

    let owned_account = account::Entity::find_by_id(request.account_id)
        .filter(account::Column::OwnerId.eq(request.owner_id))
        .filter(account::Column::IsActive.eq(true))
        .one(&state.db)
        .await
        .map_err(db_error)?;
    if owned_account.is_none() {
        return Err(not_found("account"));
    }

    if let Some(category_id) = request.category_id {
        let owned_category = category::Entity::find_by_id(category_id)
            .filter(category::Column::OwnerId.eq(request.owner_id))
            .one(&state.db)
            .await
            .map_err(db_error)?;
        if owned_category.is_none() {
            return Err(not_found("category"));
        }
    }

    let created = transaction::ActiveModel {
        owner_id: Set(request.owner_id),
        description: Set(request.description),
        amount: Set(request.amount),
        kind: Set(request.kind),
        date: Set(request.date),
        account_id: Set(request.account_id),
        category_id: Set(request.category_id),
        payment_id: Set(None),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(db_error)?;

    state.cache.invalidate_all();
    info!("Transaction created successfully with ID: {}", created.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: TransactionResponse::from(created),
            message: "Transaction created successfully".to_string(),
            success: true,
        }),
    ))
}

/// Get the user's transactions with optional filters
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    tag = "transactions",
    params(TransactionsQuery),
    responses(
        (status = 200, description = "Transactions retrieved successfully", body = ApiResponse<Vec<TransactionResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_transactions(
    Query(query): Query<TransactionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TransactionResponse>>>, ApiError> {
    let transactions = filtered_transactions(&state, &query).await?;
    debug!(
        "Retrieved {} transactions for user {}",
        transactions.len(),
        query.user_id
    );

    Ok(Json(ApiResponse {
        data: transactions
            .into_iter()
            .map(TransactionResponse::from)
            .collect(),
        message: "Transactions retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get income/expense totals over the same filters as the listing
#[utoipa::path(
    get,
    path = "/api/v1/transactions/summary",
    tag = "transactions",
    params(TransactionsQuery),
    responses(
        (status = 200, description = "Summary computed successfully", body = ApiResponse<TransactionsSummary>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_transactions_summary(
    Query(query): Query<TransactionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TransactionsSummary>>, ApiError> {
    let transactions = filtered_transactions(&state, &query).await?;
    let summary = transfers::summarize(&transactions);

    Ok(Json(ApiResponse {
        data: summary,
        message: "Summary computed successfully".to_string(),
        success: true,
    }))
}

/// Transfer money between two of the user's accounts
#[utoipa::path(
    post,
    path = "/api/v1/transactions/transfer",
    tag = "transactions",
    request_body = CreateTransferRequest,
    responses(
        (status = 201, description = "Transfer recorded successfully", body = ApiResponse<Vec<TransactionResponse>>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_transfer(
    State(state): State<AppState>,
    Json(request): Json<CreateTransferRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<TransactionResponse>>>), ApiError> {
    let (outgoing, incoming) = transfers::transfer(
        &state.db,
        request.owner_id,
        NewTransfer {
            from_account_id: request.from_account_id,
            to_account_id: request.to_account_id,
            amount: request.amount,
            date: request.date,
            description: request.description,
        },
    )
    .await
    .map_err(map_error)?;

    state.cache.invalidate_all();
    info!(
        "Transfer recorded: {} -> {}",
        request.from_account_id, request.to_account_id
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: vec![
                TransactionResponse::from(outgoing),
                TransactionResponse::from(incoming),
            ],
            message: "Transfer recorded successfully".to_string(),
            success: true,
        }),
    ))
}

/// Delete a transaction
///
/// Transactions created by a payment cannot be deleted directly;
/// reverse the payment instead so the installment stays consistent.
#[utoipa::path(
    delete,
    path = "/api/v1/transactions/{transaction_id}",
    tag = "transactions",
    params(
        ("transaction_id" = i32, Path, description = "Transaction ID"),
        UserScope,
    ),
    responses(
        (status = 200, description = "Transaction deleted successfully", body = ApiResponse<String>),
        (status = 400, description = "Transaction belongs to a payment", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_transaction(
    Path(transaction_id): Path<i32>,
    Query(scope): Query<UserScope>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let existing = transaction::Entity::find_by_id(transaction_id)
        .filter(transaction::Column::OwnerId.eq(scope.user_id))
        .one(&state.db)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("transaction"))?;

    if existing.payment_id.is_some() {
        warn!(
            "Refusing to delete transaction {} created by a payment",
            transaction_id
        );
        return Err(map_error(compute::LedgerError::Validation(
            "this transaction belongs to a payment; reverse the payment instead".to_string(),
        )));
    }

    transaction::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await
        .map_err(db_error)?;

    state.cache.invalidate_all();
    info!("Transaction with ID {} deleted", transaction_id);

    Ok(Json(ApiResponse {
        data: format!("Transaction {} deleted", transaction_id),
        message: "Transaction deleted successfully".to_string(),
        success: true,
    }))
}
