//! Derived account balances.
//!
//! Balances are never stored. They are recomputed from the opening
//! balance and the transaction history every time. Payments toward
//! bills are represented by their linked EXPENSE transactions, so they
//! already flow into `total_expense`; the payment rows themselves are
//! summed only for the informational `total_payments` field.

use common::BalanceBreakdown;
use model::entities::{account, payment, transaction};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::instrument;

use crate::error::Result;

/// Computes the full breakdown for one account out of pre-fetched
/// slices. Transactions and payments belonging to other accounts are
/// ignored, so callers may pass everything they have for the user.
pub fn compute_breakdown(
    account: &account::Model,
    transactions: &[transaction::Model],
    payments: &[payment::Model],
) -> BalanceBreakdown {
    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;
    let mut current_balance = account.opening_balance;

    for tx in transactions.iter().filter(|t| t.account_id == account.id) {
        match tx.kind {
            transaction::TransactionKind::Income => total_income += tx.amount,
            transaction::TransactionKind::Expense => total_expense += tx.amount,
        }
        current_balance += tx.signed_amount();
    }

    let total_payments = payments
        .iter()
        .filter(|p| p.account_id == account.id)
        .map(|p| p.amount)
        .sum();

    BalanceBreakdown {
        opening_balance: account.opening_balance,
        total_income,
        total_expense,
        total_payments,
        current_balance,
    }
}

/// Just the derived balance.
pub fn compute_balance(
    account: &account::Model,
    transactions: &[transaction::Model],
    payments: &[payment::Model],
) -> Decimal {
    compute_breakdown(account, transactions, payments).current_balance
}

/// Fetches the account's own transactions and payments and computes
/// the breakdown.
#[instrument(skip(db))]
pub async fn account_breakdown(
    db: &DatabaseConnection,
    account: &account::Model,
) -> Result<BalanceBreakdown> {
    let transactions = transaction::Entity::find()
        .filter(transaction::Column::AccountId.eq(account.id))
        .all(db)
        .await?;
    let payments = payment::Entity::find()
        .filter(payment::Column::AccountId.eq(account.id))
        .all(db)
        .await?;
    Ok(compute_breakdown(account, &transactions, &payments))
}
