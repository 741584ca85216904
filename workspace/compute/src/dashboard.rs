//! The monthly dashboard snapshot.
//!
//! One composed read over everything the engine derives: per-account
//! balances, month totals, bill pressure, due and overdue
//! installments, budget usage and the top spending categories.

use std::collections::HashMap;

use common::{
    AccountOverview, BillsOverview, BudgetOverview, CategorySpend, DashboardSnapshot,
    InstallmentPreview, MonthTotals, MonthWindow,
};
use model::entities::installment::InstallmentStatus;
use model::entities::transaction::TransactionKind;
use model::entities::{account, category, installment, payable_bill, payment, transaction};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::instrument;

use crate::balance;
use crate::error::Result;

/// At most this many upcoming installments in the snapshot.
const UPCOMING_LIMIT: usize = 10;
/// At most this many overdue installments in the snapshot.
const OVERDUE_LIMIT: usize = 5;
/// At most this many top-spending categories in the snapshot.
const TOP_CATEGORIES_LIMIT: usize = 5;

/// Builds the full snapshot for one user and month.
#[instrument(skip(db))]
pub async fn build_snapshot(
    db: &DatabaseConnection,
    owner_id: i32,
    window: MonthWindow,
) -> Result<DashboardSnapshot> {
    let accounts = account::Entity::find()
        .filter(account::Column::OwnerId.eq(owner_id))
        .filter(account::Column::IsActive.eq(true))
        .all(db)
        .await?;
    let transactions = transaction::Entity::find()
        .filter(transaction::Column::OwnerId.eq(owner_id))
        .all(db)
        .await?;
    let account_ids: Vec<i32> = accounts.iter().map(|a| a.id).collect();
    let payments = payment::Entity::find()
        .filter(payment::Column::AccountId.is_in(account_ids))
        .all(db)
        .await?;

    let mut total_balance = Decimal::ZERO;
    let account_overviews: Vec<AccountOverview> = accounts
        .iter()
        .map(|acct| {
            let current = balance::compute_balance(acct, &transactions, &payments);
            total_balance += current;
            AccountOverview {
                id: acct.id,
                name: acct.name.clone(),
                kind: format!("{:?}", acct.kind).to_uppercase(),
                color: acct.color.clone(),
                balance: current,
            }
        })
        .collect();

    let month_transactions: Vec<&transaction::Model> = transactions
        .iter()
        .filter(|t| window.contains(t.date))
        .collect();
    let mut month_income = Decimal::ZERO;
    let mut month_expense = Decimal::ZERO;
    for tx in &month_transactions {
        match tx.kind {
            TransactionKind::Income => month_income += tx.amount,
            TransactionKind::Expense => month_expense += tx.amount,
        }
    }

    let (bills, upcoming, overdue) = installment_lists(db, owner_id, window).await?;

    let budget = budget_overview(db, owner_id, window, month_expense).await?;
    let top_categories = top_categories(db, owner_id, &month_transactions).await?;

    Ok(DashboardSnapshot {
        year: window.year(),
        month: window.month(),
        total_balance,
        accounts: account_overviews,
        month_totals: MonthTotals {
            income: month_income,
            expense: month_expense,
            net: month_income - month_expense,
        },
        bills,
        upcoming_installments: upcoming,
        overdue_installments: overdue,
        budget,
        top_categories,
    })
}

/// Splits the user's unpaid installments into upcoming (due inside the
/// window, or with no due date at all) and overdue (due before it).
/// Bills flagged `do_not_count` still show up in the lists but stay
/// out of the open-amount total.
async fn installment_lists(
    db: &DatabaseConnection,
    owner_id: i32,
    window: MonthWindow,
) -> Result<(BillsOverview, Vec<InstallmentPreview>, Vec<InstallmentPreview>)> {
    let unpaid = installment::Entity::find()
        .find_also_related(payable_bill::Entity)
        .filter(payable_bill::Column::OwnerId.eq(owner_id))
        .filter(installment::Column::Status.ne(InstallmentStatus::Paid))
        .all(db)
        .await?;

    let mut open_amount = Decimal::ZERO;
    let mut installment_count = 0;
    let mut upcoming: Vec<(Option<chrono::NaiveDate>, InstallmentPreview)> = Vec::new();
    let mut overdue: Vec<(chrono::NaiveDate, InstallmentPreview)> = Vec::new();

    for (inst, bill) in unpaid {
        let Some(bill) = bill else { continue };
        let preview = InstallmentPreview {
            id: inst.id,
            bill_description: bill.description.clone(),
            number: inst.number,
            amount_remaining: inst.remaining(),
            due_date: inst.due_date,
            do_not_count: bill.do_not_count,
        };
        match inst.due_date {
            Some(due) if due < window.start() => overdue.push((due, preview)),
            Some(due) if window.contains(due) => {
                if !bill.do_not_count {
                    open_amount += inst.remaining();
                    installment_count += 1;
                }
                upcoming.push((Some(due), preview));
            }
            // Undated installments are always payable now.
            None => {
                if !bill.do_not_count {
                    open_amount += inst.remaining();
                    installment_count += 1;
                }
                upcoming.push((None, preview));
            }
            // Due after the window, not this month's concern.
            Some(_) => {}
        }
    }

    upcoming.sort_by_key(|(due, _)| due.unwrap_or(window.start()));
    overdue.sort_by_key(|(due, _)| *due);

    Ok((
        BillsOverview {
            open_amount,
            installment_count,
        },
        upcoming
            .into_iter()
            .map(|(_, preview)| preview)
            .take(UPCOMING_LIMIT)
            .collect(),
        overdue
            .into_iter()
            .map(|(_, preview)| preview)
            .take(OVERDUE_LIMIT)
            .collect(),
    ))
}

async fn budget_overview(
    db: &DatabaseConnection,
    owner_id: i32,
    window: MonthWindow,
    month_expense: Decimal,
) -> Result<BudgetOverview> {
    let evaluations = crate::budget::evaluate_month(db, owner_id, window).await?;
    let total_budgeted: Decimal = evaluations.iter().map(|e| e.limit_amount).sum();
    let percent_used = if total_budgeted > Decimal::ZERO {
        (month_expense / total_budgeted * Decimal::from(100)).round_dp(2)
    } else {
        Decimal::ZERO
    };
    Ok(BudgetOverview {
        total_budgeted,
        total_spent: month_expense,
        percent_used,
    })
}

async fn top_categories(
    db: &DatabaseConnection,
    owner_id: i32,
    month_transactions: &[&transaction::Model],
) -> Result<Vec<CategorySpend>> {
    let mut spent_by_category: HashMap<i32, Decimal> = HashMap::new();
    for tx in month_transactions {
        if tx.kind != TransactionKind::Expense {
            continue;
        }
        if let Some(category_id) = tx.category_id {
            *spent_by_category.entry(category_id).or_default() += tx.amount;
        }
    }
    if spent_by_category.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = spent_by_category.keys().copied().collect();
    let categories = category::Entity::find()
        .filter(category::Column::OwnerId.eq(owner_id))
        .filter(category::Column::Id.is_in(ids))
        .all(db)
        .await?;

    let mut top: Vec<CategorySpend> = categories
        .into_iter()
        .filter_map(|cat| {
            spent_by_category.get(&cat.id).map(|amount| CategorySpend {
                category_id: cat.id,
                name: cat.name,
                color: cat.color,
                amount: *amount,
            })
        })
        .collect();
    top.sort_by(|a, b| b.amount.cmp(&a.amount));
    top.truncate(TOP_CATEGORIES_LIMIT);
    Ok(top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::{upsert_budget, NewBudget};
    use crate::payments::{apply_payment, NewPayment};
    use crate::testing;
    use chrono::NaiveDate;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window(year: i32, month: u32) -> MonthWindow {
        MonthWindow::new(year, month).unwrap()
    }

    #[tokio::test]
    async fn test_empty_snapshot() {
        let db = testing::setup_db().await;
        let user = testing::seed_user(&db, "ana").await;

        let snapshot = build_snapshot(&db, user.id, window(2024, 6)).await.unwrap();
        assert_eq!(snapshot.total_balance, Decimal::ZERO);
        assert!(snapshot.accounts.is_empty());
        assert!(snapshot.upcoming_installments.is_empty());
        assert!(snapshot.overdue_installments.is_empty());
        assert!(snapshot.top_categories.is_empty());
        assert_eq!(snapshot.bills.installment_count, 0);
    }

    #[tokio::test]
    async fn test_snapshot_composes_all_sections() {
        let db = testing::setup_db().await;
        let user = testing::seed_user(&db, "ana").await;
        let checking = testing::seed_account(&db, user.id, "Checking", "1000.00").await;
        let food = testing::seed_expense_category(&db, user.id, "Food").await;
        let transport = testing::seed_expense_category(&db, user.id, "Transport").await;

        testing::seed_transaction(
            &db,
            user.id,
            checking.id,
            TransactionKind::Income,
            "3000.00",
            date(2024, 6, 1),
            None,
        )
        .await;
        testing::seed_transaction(
            &db,
            user.id,
            checking.id,
            TransactionKind::Expense,
            "400.00",
            date(2024, 6, 10),
            Some(food.id),
        )
        .await;
        testing::seed_transaction(
            &db,
            user.id,
            checking.id,
            TransactionKind::Expense,
            "150.00",
            date(2024, 6, 12),
            Some(transport.id),
        )
        .await;

        // Three installments: one overdue (May), one due in June, one in July.
        testing::seed_installment_bill(&db, user.id, "Laptop", "900.00", 3, date(2024, 5, 15))
            .await;

        upsert_budget(
            &db,
            user.id,
            NewBudget {
                category_id: food.id,
                month: 6,
                year: 2024,
                limit_amount: Some(dec("500.00")),
                percent: None,
            },
        )
        .await
        .unwrap();

        let snapshot = build_snapshot(&db, user.id, window(2024, 6)).await.unwrap();

        assert_eq!(snapshot.total_balance, dec("3450.00"));
        assert_eq!(snapshot.accounts.len(), 1);
        assert_eq!(snapshot.month_totals.income, dec("3000.00"));
        assert_eq!(snapshot.month_totals.expense, dec("550.00"));
        assert_eq!(snapshot.month_totals.net, dec("2450.00"));

        assert_eq!(snapshot.upcoming_installments.len(), 1);
        assert_eq!(
            snapshot.upcoming_installments[0].due_date,
            Some(date(2024, 6, 15))
        );
        assert_eq!(snapshot.overdue_installments.len(), 1);
        assert_eq!(
            snapshot.overdue_installments[0].due_date,
            Some(date(2024, 5, 15))
        );
        assert_eq!(snapshot.bills.open_amount, dec("300.00"));
        assert_eq!(snapshot.bills.installment_count, 1);

        assert_eq!(snapshot.budget.total_budgeted, dec("500.00"));
        assert_eq!(snapshot.budget.total_spent, dec("550.00"));

        assert_eq!(snapshot.top_categories.len(), 2);
        assert_eq!(snapshot.top_categories[0].name, "Food");
        assert_eq!(snapshot.top_categories[0].amount, dec("400.00"));
    }

    #[tokio::test]
    async fn test_paid_installments_leave_the_lists() {
        let db = testing::setup_db().await;
        let user = testing::seed_user(&db, "ana").await;
        let checking = testing::seed_account(&db, user.id, "Checking", "1000.00").await;
        let (_, installments) =
            testing::seed_installment_bill(&db, user.id, "Laptop", "600.00", 2, date(2024, 6, 5))
                .await;

        apply_payment(
            &db,
            user.id,
            &NewPayment {
                installment_id: installments[0].id,
                account_id: checking.id,
                amount: dec("300.00"),
                date: date(2024, 6, 5),
                note: None,
            },
        )
        .await
        .unwrap();

        let snapshot = build_snapshot(&db, user.id, window(2024, 6)).await.unwrap();
        assert!(snapshot.upcoming_installments.is_empty());
        assert_eq!(snapshot.bills.open_amount, Decimal::ZERO);
        // The payment's linked expense shows in the month totals.
        assert_eq!(snapshot.month_totals.expense, dec("300.00"));
        assert_eq!(snapshot.total_balance, dec("700.00"));
    }

    #[tokio::test]
    async fn test_inactive_accounts_are_left_out() {
        let db = testing::setup_db().await;
        let user = testing::seed_user(&db, "ana").await;
        testing::seed_account(&db, user.id, "Checking", "100.00").await;
        let old = testing::seed_account(&db, user.id, "Closed", "999.00").await;

        let mut deactivate: account::ActiveModel = old.into();
        deactivate.is_active = sea_orm::Set(false);
        sea_orm::ActiveModelTrait::update(deactivate, &db)
            .await
            .unwrap();

        let snapshot = build_snapshot(&db, user.id, window(2024, 6)).await.unwrap();
        assert_eq!(snapshot.accounts.len(), 1);
        assert_eq!(snapshot.total_balance, dec("100.00"));
    }

    #[tokio::test]
    async fn test_do_not_count_bills_listed_but_not_totalled() {
        let db = testing::setup_db().await;
        let user = testing::seed_user(&db, "ana").await;
        testing::seed_lump_sum_bill(&db, user.id, "Tracked subscription", "30.00", true).await;

        let snapshot = build_snapshot(&db, user.id, window(2024, 6)).await.unwrap();
        assert_eq!(snapshot.upcoming_installments.len(), 1);
        assert!(snapshot.upcoming_installments[0].do_not_count);
        assert_eq!(snapshot.bills.open_amount, Decimal::ZERO);
        assert_eq!(snapshot.bills.installment_count, 0);
    }
}
