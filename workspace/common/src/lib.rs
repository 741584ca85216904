//! Transport-layer types shared between the backend handlers and the
//! compute engine, plus the calendar-month window every monthly
//! aggregation is scoped to.

mod period;
mod snapshot;

pub use period::{add_months, MonthWindow};
pub use snapshot::{
    AccountOverview, BalanceBreakdown, BillRollup, BillsOverview, BillsSummary, BudgetEvaluation,
    BudgetOverview, BudgetSummary, CategorySpend, DashboardSnapshot, InstallmentPreview,
    MonthTotals, TransactionsSummary,
};
