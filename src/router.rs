use crate::handlers::{
    accounts::{create_account, delete_account, get_account, get_accounts, update_account},
    bills::{create_bill, delete_bill, get_bill, get_bills, get_bills_summary, update_bill},
    budgets::{delete_budget, get_budget_summary, get_budgets, upsert_budget},
    categories::{create_category, delete_category, get_categories, update_category},
    dashboard::get_dashboard,
    health::health_check,
    payments::{create_payment, delete_payment, get_installment_payments, get_payments},
    transactions::{
        create_transaction, create_transfer, delete_transaction, get_transactions,
        get_transactions_summary,
    },
    users::{create_user, get_users},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // User routes
        .route("/api/v1/users", post(create_user))
        .route("/api/v1/users", get(get_users))
        // Account routes
        .route("/api/v1/accounts", post(create_account))
        .route("/api/v1/accounts", get(get_accounts))
        .route("/api/v1/accounts/:account_id", get(get_account))
        .route("/api/v1/accounts/:account_id", put(update_account))
        .route("/api/v1/accounts/:account_id", delete(delete_account))
        // Category routes
        .route("/api/v1/categories", post(create_category))
        .route("/api/v1/categories", get(get_categories))
        .route("/api/v1/categories/:category_id", put(update_category))
        .route("/api/v1/categories/:category_id", delete(delete_category))
        // Transaction routes
        .route("/api/v1/transactions", post(create_transaction))
        .route("/api/v1/transactions", get(get_transactions))
        .route("/api/v1/transactions/summary", get(get_transactions_summary))
        .route("/api/v1/transactions/transfer", post(create_transfer))
        .route(
            "/api/v1/transactions/:transaction_id",
            delete(delete_transaction),
        )
        // Bill routes
        .route("/api/v1/bills", post(create_bill))
        .route("/api/v1/bills", get(get_bills))
        .route("/api/v1/bills/summary", get(get_bills_summary))
        .route("/api/v1/bills/:bill_id", get(get_bill))
        .route("/api/v1/bills/:bill_id", put(update_bill))
        .route("/api/v1/bills/:bill_id", delete(delete_bill))
        // Payment routes
        .route("/api/v1/payments", post(create_payment))
        .route("/api/v1/payments", get(get_payments))
        .route("/api/v1/payments/:payment_id", delete(delete_payment))
        .route(
            "/api/v1/installments/:installment_id/payments",
            get(get_installment_payments),
        )
        // Budget routes
        .route("/api/v1/budgets", post(upsert_budget))
        .route("/api/v1/budgets", get(get_budgets))
        .route("/api/v1/budgets/summary", get(get_budget_summary))
        .route("/api/v1/budgets/:budget_id", delete(delete_budget))
        // Dashboard
        .route("/api/v1/dashboard", get(get_dashboard))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
