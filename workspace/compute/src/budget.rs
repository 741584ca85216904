//! Monthly budgets: validation, upsert and evaluation.
//!
//! A budget caps one category for one month, either with a fixed
//! amount or with a percentage of that month's total income. Percent
//! budgets are re-evaluated against income every time, so their
//! effective limit moves with the month's earnings.

use std::collections::HashMap;

use common::{BudgetEvaluation, BudgetSummary, MonthWindow};
use model::entities::transaction::TransactionKind;
use model::entities::{budget, category, transaction};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tracing::{debug, instrument};

use crate::error::{LedgerError, Result};

/// Input for creating or replacing a budget.
#[derive(Debug, Clone)]
pub struct NewBudget {
    pub category_id: i32,
    pub month: u32,
    pub year: i32,
    pub limit_amount: Option<Decimal>,
    pub percent: Option<Decimal>,
}

/// Exactly one of `limit_amount` and `percent` must be set; a fixed
/// limit must be positive and a percentage must lie in (0, 100].
pub fn validate_limits(limit_amount: Option<Decimal>, percent: Option<Decimal>) -> Result<()> {
    match (limit_amount, percent) {
        (Some(_), Some(_)) | (None, None) => Err(LedgerError::Validation(
            "set either a fixed limit or a percentage, not both".to_string(),
        )),
        (Some(limit), None) if limit <= Decimal::ZERO => Err(LedgerError::Validation(
            "the fixed limit must be positive".to_string(),
        )),
        (None, Some(percent)) if percent <= Decimal::ZERO || percent > Decimal::from(100) => {
            Err(LedgerError::Validation(
                "the percentage must be between 0 and 100".to_string(),
            ))
        }
        _ => Ok(()),
    }
}

/// Creates the budget for (category, month, year), or replaces the
/// limits of the existing one. One budget per category per month.
#[instrument(skip(db, new_budget), fields(category_id = new_budget.category_id))]
pub async fn upsert_budget(
    db: &DatabaseConnection,
    owner_id: i32,
    new_budget: NewBudget,
) -> Result<budget::Model> {
    validate_limits(new_budget.limit_amount, new_budget.percent)?;
    if MonthWindow::new(new_budget.year, new_budget.month).is_none() {
        return Err(LedgerError::Validation(
            "month must be between 1 and 12".to_string(),
        ));
    }

    let owned = category::Entity::find_by_id(new_budget.category_id)
        .filter(category::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?;
    if owned.is_none() {
        return Err(LedgerError::NotFound("category"));
    }

    let existing = budget::Entity::find()
        .filter(budget::Column::OwnerId.eq(owner_id))
        .filter(budget::Column::CategoryId.eq(new_budget.category_id))
        .filter(budget::Column::Month.eq(new_budget.month as i32))
        .filter(budget::Column::Year.eq(new_budget.year))
        .one(db)
        .await?;

    let saved = match existing {
        Some(found) => {
            debug!(budget_id = found.id, "replacing existing budget limits");
            let mut active: budget::ActiveModel = found.into();
            active.limit_amount = Set(new_budget.limit_amount);
            active.percent = Set(new_budget.percent);
            active.update(db).await?
        }
        None => {
            budget::ActiveModel {
                owner_id: Set(owner_id),
                category_id: Set(new_budget.category_id),
                month: Set(new_budget.month as i32),
                year: Set(new_budget.year),
                limit_amount: Set(new_budget.limit_amount),
                percent: Set(new_budget.percent),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };
    Ok(saved)
}

/// Pure evaluation of budgets against the month's spending. Percent
/// budgets are resolved against `total_income` first.
pub fn evaluate(
    budgets: &[(budget::Model, category::Model)],
    spent_by_category: &HashMap<i32, Decimal>,
    total_income: Decimal,
) -> Vec<BudgetEvaluation> {
    budgets
        .iter()
        .map(|(budget, category)| {
            let limit_amount = match budget.percent {
                Some(percent) => (percent / Decimal::from(100)) * total_income,
                None => budget.limit_amount.unwrap_or(Decimal::ZERO),
            };
            let spent = spent_by_category
                .get(&budget.category_id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            let percent_used = if limit_amount > Decimal::ZERO {
                (spent / limit_amount * Decimal::from(100)).round_dp(2)
            } else {
                Decimal::ZERO
            };
            BudgetEvaluation {
                budget_id: budget.id,
                category_id: budget.category_id,
                category_name: category.name.clone(),
                percent: budget.percent,
                limit_amount,
                spent,
                available: limit_amount - spent,
                percent_used,
            }
        })
        .collect()
}

/// Spending per category over the window's EXPENSE transactions.
/// Uncategorized transactions count toward no budget.
fn spend_map(transactions: &[transaction::Model]) -> HashMap<i32, Decimal> {
    let mut spent_by_category: HashMap<i32, Decimal> = HashMap::new();
    for tx in transactions {
        if tx.kind != TransactionKind::Expense {
            continue;
        }
        if let Some(category_id) = tx.category_id {
            *spent_by_category.entry(category_id).or_default() += tx.amount;
        }
    }
    spent_by_category
}

async fn month_transactions(
    db: &DatabaseConnection,
    owner_id: i32,
    window: MonthWindow,
) -> Result<Vec<transaction::Model>> {
    Ok(transaction::Entity::find()
        .filter(transaction::Column::OwnerId.eq(owner_id))
        .filter(transaction::Column::Date.gte(window.start()))
        .filter(transaction::Column::Date.lte(window.end()))
        .all(db)
        .await?)
}

/// Evaluates every budget the user configured for the window's month.
#[instrument(skip(db))]
pub async fn evaluate_month(
    db: &DatabaseConnection,
    owner_id: i32,
    window: MonthWindow,
) -> Result<Vec<BudgetEvaluation>> {
    let budgets = budget::Entity::find()
        .filter(budget::Column::OwnerId.eq(owner_id))
        .filter(budget::Column::Month.eq(window.month() as i32))
        .filter(budget::Column::Year.eq(window.year()))
        .find_also_related(category::Entity)
        .all(db)
        .await?;
    let budgets: Vec<(budget::Model, category::Model)> = budgets
        .into_iter()
        .filter_map(|(budget, category)| category.map(|c| (budget, c)))
        .collect();

    let transactions = month_transactions(db, owner_id, window).await?;
    let total_income: Decimal = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Income)
        .map(|t| t.amount)
        .sum();

    Ok(evaluate(&budgets, &spend_map(&transactions), total_income))
}

/// Aggregate budget position for the month: everything budgeted,
/// everything spent, and the month's income.
#[instrument(skip(db))]
pub async fn budget_summary(
    db: &DatabaseConnection,
    owner_id: i32,
    window: MonthWindow,
) -> Result<BudgetSummary> {
    let evaluations = evaluate_month(db, owner_id, window).await?;
    let transactions = month_transactions(db, owner_id, window).await?;

    let total_budgeted: Decimal = evaluations.iter().map(|e| e.limit_amount).sum();
    let mut total_income = Decimal::ZERO;
    let mut total_spent = Decimal::ZERO;
    for tx in &transactions {
        match tx.kind {
            TransactionKind::Income => total_income += tx.amount,
            TransactionKind::Expense => total_spent += tx.amount,
        }
    }
    let percent_used = if total_budgeted > Decimal::ZERO {
        (total_spent / total_budgeted * Decimal::from(100)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    Ok(BudgetSummary {
        year: window.year(),
        month: window.month(),
        total_budgeted,
        total_spent,
        total_income,
        net: total_income - total_spent,
        available: total_budgeted - total_spent,
        percent_used,
    })
}
