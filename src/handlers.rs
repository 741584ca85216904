use axum::http::StatusCode;
use axum::response::Json;
use compute::LedgerError;
use tracing::{error, warn};

use crate::schemas::ErrorResponse;

pub mod accounts;
pub mod bills;
pub mod budgets;
pub mod categories;
pub mod dashboard;
pub mod health;
pub mod payments;
pub mod transactions;
pub mod users;

/// The error half of every handler's return type.
pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

/// Maps an engine error to an HTTP status and a stable error code.
pub(crate) fn map_error(err: LedgerError) -> ApiError {
    let (status, code) = match &err {
        LedgerError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
        LedgerError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        LedgerError::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
        LedgerError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
    };
    match &err {
        LedgerError::Database(db_error) => error!("Database error: {}", db_error),
        other => warn!("Request rejected: {}", other),
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: code.to_string(),
            success: false,
        }),
    )
}

pub(crate) fn db_error(err: sea_orm::DbErr) -> ApiError {
    map_error(LedgerError::Database(err))
}

pub(crate) fn not_found(what: &'static str) -> ApiError {
    map_error(LedgerError::NotFound(what))
}

pub(crate) fn bad_request(message: impl Into<String>) -> ApiError {
    map_error(LedgerError::Validation(message.into()))
}
