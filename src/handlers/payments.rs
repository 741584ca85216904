use crate::handlers::{db_error, map_error, not_found, ApiError};
use crate::schemas::{ApiResponse, AppState, UserScope};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use compute::payments::{self, NewPayment};
use model::entities::installment::InstallmentStatus;
use model::entities::{installment, payable_bill, payment};
use rust_decimal::Decimal;
use model::entities::account;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};

/// Request body for applying a payment to an installment
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreatePaymentRequest {
    /// Owner user ID
    pub owner_id: i32,
    pub installment_id: i32,
    /// Account the money leaves
    pub account_id: i32,
    pub amount: Decimal,
    /// Payment date (YYYY-MM-DD)
    pub date: NaiveDate,
    pub note: Option<String>,
}

/// Query parameters for listing payments
#[derive(Debug, Deserialize, IntoParams)]
pub struct PaymentsQuery {
    /// Owner user ID
    pub user_id: i32,
    /// Restrict to payments against one bill
    pub bill_id: Option<i32>,
    /// Restrict to payments from one account
    pub account_id: Option<i32>,
}

/// Payment response with what the payment did to the installment
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub installment_id: i32,
    pub account_id: i32,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub note: Option<String>,
    /// Installment status after this payment
    pub installment_status: Option<InstallmentStatus>,
    /// True when this payment settled the whole bill
    pub bill_settled: Option<bool>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(model: payment::Model) -> Self {
        Self {
            id: model.id,
            installment_id: model.installment_id,
            account_id: model.account_id,
            amount: model.amount,
            date: model.date,
            note: model.note,
            installment_status: None,
            bill_settled: None,
        }
    }
}

/// Apply a payment to an installment
///
/// Creates the payment, the linked expense transaction on the paying
/// account, advances the installment status and settles the bill when
/// every installment is paid. Overpaying an installment is rejected.
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment applied successfully", body = ApiResponse<PaymentResponse>),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 404, description = "Installment or account not found", body = ErrorResponse),
        (status = 409, description = "Concurrent modification", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentResponse>>), ApiError> {
    debug!(
        "Applying payment of {} to installment {} for owner {}",
        request.amount, request.installment_id, request.owner_id
    );

    let outcome = payments::apply_payment(
        &state.db,
        request.owner_id,
        &NewPayment {
            installment_id: request.installment_id,
            account_id: request.account_id,
            amount: request.amount,
            date: request.date,
            note: request.note,
        },
    )
    .await
    .map_err(map_error)?;

    state.cache.invalidate_all();
    info!(
        "Payment {} applied, installment now {:?}",
        outcome.payment.id, outcome.installment_status
    );

    let mut response = PaymentResponse::from(outcome.payment);
    response.installment_status = Some(outcome.installment_status);
    response.bill_settled = Some(outcome.bill_settled);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: response,
            message: "Payment applied successfully".to_string(),
            success: true,
        }),
    ))
}

/// Get the user's payments, newest first
///
/// Payments carry no owner column; the user's accounts scope the
/// listing, so payments survive an account's deactivation.
#[utoipa::path(
    get,
    path = "/api/v1/payments",
    tag = "payments",
    params(PaymentsQuery),
    responses(
        (status = 200, description = "Payments retrieved successfully", body = ApiResponse<Vec<PaymentResponse>>),
        (status = 404, description = "Bill or account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_payments(
    Query(query): Query<PaymentsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PaymentResponse>>>, ApiError> {
    let account_ids: Vec<i32> = account::Entity::find()
        .filter(account::Column::OwnerId.eq(query.user_id))
        .all(&state.db)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(|a| a.id)
        .collect();

    let mut finder = payment::Entity::find()
        .filter(payment::Column::AccountId.is_in(account_ids.clone()));

    if let Some(account_id) = query.account_id {
        if !account_ids.contains(&account_id) {
            return Err(not_found("account"));
        }
        finder = finder.filter(payment::Column::AccountId.eq(account_id));
    }

    if let Some(bill_id) = query.bill_id {
        let bill = payable_bill::Entity::find_by_id(bill_id)
            .filter(payable_bill::Column::OwnerId.eq(query.user_id))
            .one(&state.db)
            .await
            .map_err(db_error)?
            .ok_or_else(|| not_found("bill"))?;
        let installment_ids: Vec<i32> = installment::Entity::find()
            .filter(installment::Column::BillId.eq(bill.id))
            .all(&state.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(|i| i.id)
            .collect();
        finder = finder.filter(payment::Column::InstallmentId.is_in(installment_ids));
    }

    let rows = finder
        .order_by_desc(payment::Column::Date)
        .order_by_desc(payment::Column::Id)
        .all(&state.db)
        .await
        .map_err(db_error)?;
    debug!(
        "Retrieved {} payments for user {}",
        rows.len(),
        query.user_id
    );

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(PaymentResponse::from).collect(),
        message: "Payments retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get the payments recorded against one installment
#[utoipa::path(
    get,
    path = "/api/v1/installments/{installment_id}/payments",
    tag = "payments",
    params(
        ("installment_id" = i32, Path, description = "Installment ID"),
        UserScope,
    ),
    responses(
        (status = 200, description = "Payments retrieved successfully", body = ApiResponse<Vec<PaymentResponse>>),
        (status = 404, description = "Installment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_installment_payments(
    Path(installment_id): Path<i32>,
    Query(scope): Query<UserScope>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PaymentResponse>>>, ApiError> {
    // Ownership travels through the bill.
    let owned = installment::Entity::find_by_id(installment_id)
        .find_also_related(payable_bill::Entity)
        .one(&state.db)
        .await
        .map_err(db_error)?;
    match owned {
        Some((_, Some(bill))) if bill.owner_id == scope.user_id => {}
        _ => return Err(not_found("installment")),
    }

    let rows = payment::Entity::find()
        .filter(payment::Column::InstallmentId.eq(installment_id))
        .order_by_asc(payment::Column::Date)
        .order_by_asc(payment::Column::Id)
        .all(&state.db)
        .await
        .map_err(db_error)?;
    debug!(
        "Retrieved {} payments for installment {}",
        rows.len(),
        installment_id
    );

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(PaymentResponse::from).collect(),
        message: "Payments retrieved successfully".to_string(),
        success: true,
    }))
}

/// Reverse a payment
///
/// Deletes the payment and its linked transaction, rolls the
/// installment's paid amount and status back, and reopens the bill if
/// this payment had settled it.
#[utoipa::path(
    delete,
    path = "/api/v1/payments/{payment_id}",
    tag = "payments",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
        UserScope,
    ),
    responses(
        (status = 200, description = "Payment reversed successfully", body = ApiResponse<String>),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 409, description = "Concurrent modification", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_payment(
    Path(payment_id): Path<i32>,
    Query(scope): Query<UserScope>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    payments::reverse_payment(&state.db, scope.user_id, payment_id)
        .await
        .map_err(map_error)?;

    state.cache.invalidate_all();
    info!("Payment with ID {} reversed", payment_id);

    Ok(Json(ApiResponse {
        data: format!("Payment {} reversed", payment_id),
        message: "Payment reversed successfully".to_string(),
        success: true,
    }))
}
