use common::{
    AccountOverview, BalanceBreakdown, BillRollup, BillsOverview, BillsSummary, BudgetEvaluation,
    BudgetOverview, BudgetSummary, CategorySpend, DashboardSnapshot, InstallmentPreview,
    MonthTotals, TransactionsSummary,
};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for expensive operations
    pub cache: Cache<String, CachedData>,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    Dashboard(DashboardSnapshot),
}

/// Query parameter scoping a request to one user's records
#[derive(Debug, Deserialize, IntoParams)]
pub struct UserScope {
    /// Owner user ID
    pub user_id: i32,
}

/// Query parameters for the dashboard endpoint
#[derive(Debug, Deserialize, IntoParams)]
pub struct DashboardQuery {
    /// Owner user ID
    pub user_id: i32,
    /// Snapshot year (defaults to the current year)
    pub year: Option<i32>,
    /// Snapshot month, 1-12 (defaults to the current month)
    pub month: Option<u32>,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::users::create_user,
        crate::handlers::users::get_users,
        crate::handlers::accounts::create_account,
        crate::handlers::accounts::get_accounts,
        crate::handlers::accounts::get_account,
        crate::handlers::accounts::update_account,
        crate::handlers::accounts::delete_account,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_categories,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,
        crate::handlers::transactions::create_transaction,
        crate::handlers::transactions::get_transactions,
        crate::handlers::transactions::get_transactions_summary,
        crate::handlers::transactions::create_transfer,
        crate::handlers::transactions::delete_transaction,
        crate::handlers::bills::create_bill,
        crate::handlers::bills::get_bills,
        crate::handlers::bills::get_bill,
        crate::handlers::bills::update_bill,
        crate::handlers::bills::get_bills_summary,
        crate::handlers::bills::delete_bill,
        crate::handlers::payments::create_payment,
        crate::handlers::payments::get_payments,
        crate::handlers::payments::get_installment_payments,
        crate::handlers::payments::delete_payment,
        crate::handlers::budgets::upsert_budget,
        crate::handlers::budgets::get_budgets,
        crate::handlers::budgets::get_budget_summary,
        crate::handlers::budgets::delete_budget,
        crate::handlers::dashboard::get_dashboard,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            crate::handlers::users::CreateUserRequest,
            crate::handlers::users::UserResponse,
            crate::handlers::accounts::CreateAccountRequest,
            crate::handlers::accounts::UpdateAccountRequest,
            crate::handlers::accounts::AccountResponse,
            crate::handlers::accounts::AccountDetailResponse,
            crate::handlers::categories::CreateCategoryRequest,
            crate::handlers::categories::UpdateCategoryRequest,
            crate::handlers::categories::CategoryResponse,
            crate::handlers::transactions::CreateTransactionRequest,
            crate::handlers::transactions::CreateTransferRequest,
            crate::handlers::transactions::TransactionResponse,
            crate::handlers::bills::CreateBillRequest,
            crate::handlers::bills::UpdateBillRequest,
            crate::handlers::bills::BillResponse,
            crate::handlers::bills::InstallmentResponse,
            crate::handlers::payments::CreatePaymentRequest,
            crate::handlers::payments::PaymentResponse,
            crate::handlers::budgets::UpsertBudgetRequest,
            crate::handlers::budgets::BudgetResponse,
            model::entities::account::AccountKind,
            model::entities::category::CategoryKind,
            model::entities::transaction::TransactionKind,
            model::entities::payable_bill::BillKind,
            model::entities::payable_bill::BillStatus,
            model::entities::installment::InstallmentStatus,
            BalanceBreakdown,
            AccountOverview,
            MonthTotals,
            InstallmentPreview,
            BillsOverview,
            BudgetOverview,
            CategorySpend,
            DashboardSnapshot,
            BudgetEvaluation,
            BudgetSummary,
            BillRollup,
            BillsSummary,
            TransactionsSummary,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "User endpoints"),
        (name = "accounts", description = "Account endpoints with derived balances"),
        (name = "categories", description = "Category endpoints"),
        (name = "transactions", description = "Transaction and transfer endpoints"),
        (name = "bills", description = "Payable bill and installment endpoints"),
        (name = "payments", description = "Payment apply/reverse endpoints"),
        (name = "budgets", description = "Monthly budget endpoints"),
        (name = "dashboard", description = "Composed monthly dashboard"),
    ),
    info(
        title = "Billfold API",
        description = "Personal finance backend - derived balances, installment bills, payments and budgets",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
