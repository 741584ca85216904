use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-account balance breakdown. The current balance is derived as
/// `opening_balance + total_income - total_expense`; payments already
/// flow through their linked expense transactions, so `total_payments`
/// is informational and never subtracted a second time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BalanceBreakdown {
    pub opening_balance: Decimal,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub total_payments: Decimal,
    pub current_balance: Decimal,
}

/// One account in the dashboard snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AccountOverview {
    pub id: i32,
    pub name: String,
    pub kind: String,
    pub color: String,
    pub balance: Decimal,
}

/// Income/expense totals for the snapshot month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthTotals {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// An unpaid installment shown in the dashboard's due/overdue lists.
/// `amount_remaining` is the face amount minus what was already paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InstallmentPreview {
    pub id: i32,
    pub bill_description: String,
    pub number: i32,
    pub amount_remaining: Decimal,
    pub due_date: Option<NaiveDate>,
    pub do_not_count: bool,
}

/// Open-bill pressure for the snapshot month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BillsOverview {
    /// Remaining amount across unpaid installments due in the month.
    pub open_amount: Decimal,
    /// Number of unpaid installments due in the month.
    pub installment_count: u64,
}

/// Budget totals for the snapshot month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BudgetOverview {
    pub total_budgeted: Decimal,
    pub total_spent: Decimal,
    pub percent_used: Decimal,
}

/// One entry of the top-spending-categories list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategorySpend {
    pub category_id: i32,
    pub name: String,
    pub color: String,
    pub amount: Decimal,
}

/// The composed monthly snapshot returned by the dashboard endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardSnapshot {
    pub year: i32,
    pub month: u32,
    pub total_balance: Decimal,
    pub accounts: Vec<AccountOverview>,
    pub month_totals: MonthTotals,
    pub bills: BillsOverview,
    pub upcoming_installments: Vec<InstallmentPreview>,
    pub overdue_installments: Vec<InstallmentPreview>,
    pub budget: BudgetOverview,
    pub top_categories: Vec<CategorySpend>,
}

/// One evaluated budget row. `limit_amount` is the fixed limit, or the
/// configured percentage applied to the month's total income.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BudgetEvaluation {
    pub budget_id: i32,
    pub category_id: i32,
    pub category_name: String,
    pub percent: Option<Decimal>,
    pub limit_amount: Decimal,
    pub spent: Decimal,
    pub available: Decimal,
    pub percent_used: Decimal,
}

/// Aggregate budget position for a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BudgetSummary {
    pub year: i32,
    pub month: u32,
    pub total_budgeted: Decimal,
    pub total_spent: Decimal,
    pub total_income: Decimal,
    pub net: Decimal,
    pub available: Decimal,
    pub percent_used: Decimal,
}

/// Paid/pending rollup attached to bill listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BillRollup {
    pub amount_paid: Decimal,
    pub amount_pending: Decimal,
    pub installments_paid: u64,
    pub installments_pending: u64,
}

/// Aggregate position across all of a user's bills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BillsSummary {
    pub total_open: Decimal,
    pub total_paid: Decimal,
    pub open_bills: u64,
    pub settled_bills: u64,
    pub total_bills: u64,
}

/// Income/expense totals over a transaction query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransactionsSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net: Decimal,
    pub count: u64,
}
