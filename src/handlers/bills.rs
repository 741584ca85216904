use crate::handlers::{db_error, map_error, not_found, ApiError};
use crate::schemas::{ApiResponse, AppState, UserScope};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use common::{BillRollup, BillsSummary};
use compute::bills::{self, NewBill};
use model::entities::category;
use model::entities::installment::{self, InstallmentStatus};
use model::entities::payable_bill::{self, BillKind, BillStatus};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

/// Request body for creating a bill
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateBillRequest {
    /// Owner user ID
    pub owner_id: i32,
    pub description: String,
    /// Total amount across all installments
    pub total_amount: Decimal,
    pub kind: BillKind,
    pub category_id: Option<i32>,
    /// Number of installments (INSTALLMENT bills only)
    pub total_installments: Option<i32>,
    /// First due date; defaults to today for installment plans
    pub first_due_date: Option<NaiveDate>,
    pub note: Option<String>,
    /// Track the bill but keep it out of aggregate totals
    #[serde(default)]
    pub do_not_count: bool,
}

/// Request body for updating a bill
///
/// Amounts and the installment plan are immutable once created; only
/// the descriptive fields can change.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateBillRequest {
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub note: Option<String>,
}

/// One installment of a bill
#[derive(Debug, Serialize, ToSchema)]
pub struct InstallmentResponse {
    pub id: i32,
    pub bill_id: i32,
    pub number: i32,
    pub amount: Decimal,
    pub amount_paid: Decimal,
    pub due_date: Option<NaiveDate>,
    pub status: InstallmentStatus,
}

impl From<installment::Model> for InstallmentResponse {
    fn from(model: installment::Model) -> Self {
        Self {
            id: model.id,
            bill_id: model.bill_id,
            number: model.number,
            amount: model.amount,
            amount_paid: model.amount_paid,
            due_date: model.due_date,
            status: model.status,
        }
    }
}

/// Bill response with its installments and paid/pending rollup
#[derive(Debug, Serialize, ToSchema)]
pub struct BillResponse {
    pub id: i32,
    pub owner_id: i32,
    pub description: String,
    pub total_amount: Decimal,
    pub kind: BillKind,
    pub category_id: Option<i32>,
    pub total_installments: Option<i32>,
    pub note: Option<String>,
    pub do_not_count: bool,
    pub status: BillStatus,
    pub installments: Vec<InstallmentResponse>,
    pub rollup: BillRollup,
}

impl BillResponse {
    fn new(bill: payable_bill::Model, installments: Vec<installment::Model>) -> Self {
        let rollup = bills::rollup(&installments);
        Self {
            id: bill.id,
            owner_id: bill.owner_id,
            description: bill.description,
            total_amount: bill.total_amount,
            kind: bill.kind,
            category_id: bill.category_id,
            total_installments: bill.total_installments,
            note: bill.note,
            do_not_count: bill.do_not_count,
            status: bill.status,
            installments: installments
                .into_iter()
                .map(InstallmentResponse::from)
                .collect(),
            rollup,
        }
    }
}

async fn find_owned_bill(
    state: &AppState,
    bill_id: i32,
    user_id: i32,
) -> Result<payable_bill::Model, ApiError> {
    payable_bill::Entity::find_by_id(bill_id)
        .filter(payable_bill::Column::OwnerId.eq(user_id))
        .one(&state.db)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("bill"))
}

/// Create a bill with its full installment plan
#[utoipa::path(
    post,
    path = "/api/v1/bills",
    tag = "bills",
    request_body = CreateBillRequest,
    responses(
        (status = 201, description = "Bill created successfully", body = ApiResponse<BillResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_bill(
    State(state): State<AppState>,
    Json(request): Json<CreateBillRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BillResponse>>), ApiError> {
    debug!(
        "Creating {:?} bill '{}' for owner {}",
        request.kind, request.description, request.owner_id
    );

    let (bill, installments) = bills::create_bill(
        &state.db,
        request.owner_id,
        NewBill {
            description: request.description,
            total_amount: request.total_amount,
            kind: request.kind,
            category_id: request.category_id,
            total_installments: request.total_installments,
            first_due_date: request.first_due_date,
            note: request.note,
            do_not_count: request.do_not_count,
        },
    )
    .await
    .map_err(map_error)?;

    state.cache.invalidate_all();
    info!(
        "Bill created successfully with ID: {} and {} installments",
        bill.id,
        installments.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: BillResponse::new(bill, installments),
            message: "Bill created successfully".to_string(),
            success: true,
        }),
    ))
}

/// Get the user's bills with installments and rollups
#[utoipa::path(
    get,
    path = "/api/v1/bills",
    tag = "bills",
    params(UserScope),
    responses(
        (status = 200, description = "Bills retrieved successfully", body = ApiResponse<Vec<BillResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_bills(
    Query(scope): Query<UserScope>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<BillResponse>>>, ApiError> {
    let bills_with_installments = payable_bill::Entity::find()
        .filter(payable_bill::Column::OwnerId.eq(scope.user_id))
        .find_with_related(installment::Entity)
        .all(&state.db)
        .await
        .map_err(db_error)?;
    debug!(
        "Retrieved {} bills for user {}",
        bills_with_installments.len(),
        scope.user_id
    );

    let responses = bills_with_installments
        .into_iter()
        .map(|(bill, mut installments)| {
            installments.sort_by_key(|i| i.number);
            BillResponse::new(bill, installments)
        })
        .collect();

    Ok(Json(ApiResponse {
        data: responses,
        message: "Bills retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a specific bill with its installments
#[utoipa::path(
    get,
    path = "/api/v1/bills/{bill_id}",
    tag = "bills",
    params(
        ("bill_id" = i32, Path, description = "Bill ID"),
        UserScope,
    ),
    responses(
        (status = 200, description = "Bill retrieved successfully", body = ApiResponse<BillResponse>),
        (status = 404, description = "Bill not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_bill(
    Path(bill_id): Path<i32>,
    Query(scope): Query<UserScope>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BillResponse>>, ApiError> {
    let bill = find_owned_bill(&state, bill_id, scope.user_id).await?;
    let installments = bill
        .find_related(installment::Entity)
        .order_by_asc(installment::Column::Number)
        .all(&state.db)
        .await
        .map_err(db_error)?;

    Ok(Json(ApiResponse {
        data: BillResponse::new(bill, installments),
        message: "Bill retrieved successfully".to_string(),
        success: true,
    }))
}

/// Update a bill's descriptive fields
#[utoipa::path(
    put,
    path = "/api/v1/bills/{bill_id}",
    tag = "bills",
    params(
        ("bill_id" = i32, Path, description = "Bill ID"),
        UserScope,
    ),
    request_body = UpdateBillRequest,
    responses(
        (status = 200, description = "Bill updated successfully", body = ApiResponse<BillResponse>),
        (status = 404, description = "Bill or category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_bill(
    Path(bill_id): Path<i32>,
    Query(scope): Query<UserScope>,
    State(state): State<AppState>,
    Json(request): Json<UpdateBillRequest>,
) -> Result<Json<ApiResponse<BillResponse>>, ApiError> {
    let existing = find_owned_bill(&state, bill_id, scope.user_id).await?;

    if let Some(category_id) = request.category_id {
        category::Entity::find_by_id(category_id)
            .filter(category::Column::OwnerId.eq(scope.user_id))
            .one(&state.db)
            .await
            .map_err(db_error)?
            .ok_or_else(|| not_found("category"))?;
    }

    let mut active: payable_bill::ActiveModel = existing.into();
    if let Some(description) = request.description {
        active.description = Set(description);
    }
    if let Some(category_id) = request.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(note) = request.note {
        active.note = Set(Some(note));
    }

    let updated = active.update(&state.db).await.map_err(db_error)?;
    let installments = updated
        .find_related(installment::Entity)
        .order_by_asc(installment::Column::Number)
        .all(&state.db)
        .await
        .map_err(db_error)?;

    state.cache.invalidate_all();
    info!("Bill with ID {} updated successfully", bill_id);

    Ok(Json(ApiResponse {
        data: BillResponse::new(updated, installments),
        message: "Bill updated successfully".to_string(),
        success: true,
    }))
}

/// Get the aggregate position across all of the user's bills
#[utoipa::path(
    get,
    path = "/api/v1/bills/summary",
    tag = "bills",
    params(UserScope),
    responses(
        (status = 200, description = "Summary computed successfully", body = ApiResponse<BillsSummary>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_bills_summary(
    Query(scope): Query<UserScope>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BillsSummary>>, ApiError> {
    let summary = bills::bills_summary(&state.db, scope.user_id)
        .await
        .map_err(map_error)?;

    Ok(Json(ApiResponse {
        data: summary,
        message: "Summary computed successfully".to_string(),
        success: true,
    }))
}

/// Delete a bill
///
/// Hard delete: the bill's installments and their payments cascade
/// away with it. Linked payment transactions cascade through their
/// payment rows as well.
#[utoipa::path(
    delete,
    path = "/api/v1/bills/{bill_id}",
    tag = "bills",
    params(
        ("bill_id" = i32, Path, description = "Bill ID"),
        UserScope,
    ),
    responses(
        (status = 200, description = "Bill deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Bill not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_bill(
    Path(bill_id): Path<i32>,
    Query(scope): Query<UserScope>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let existing = find_owned_bill(&state, bill_id, scope.user_id).await?;

    payable_bill::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await
        .map_err(db_error)?;

    state.cache.invalidate_all();
    info!("Bill with ID {} deleted", bill_id);

    Ok(Json(ApiResponse {
        data: format!("Bill {} deleted", bill_id),
        message: "Bill deleted successfully".to_string(),
        success: true,
    }))
}
