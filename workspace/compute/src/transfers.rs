//! Transfers between accounts and transaction aggregation.

use chrono::NaiveDate;
use common::TransactionsSummary;
use model::entities::transaction::TransactionKind;
use model::entities::{account, transaction};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::{info, instrument};

use crate::error::{LedgerError, Result};

/// Input for moving money between two of the user's accounts.
#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub from_account_id: i32,
    pub to_account_id: i32,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// Records a transfer as an EXPENSE on the source account and an
/// INCOME on the destination, atomically. Neither leg carries a
/// category.
#[instrument(skip(db, transfer))]
pub async fn transfer(
    db: &DatabaseConnection,
    owner_id: i32,
    transfer: NewTransfer,
) -> Result<(transaction::Model, transaction::Model)> {
    if transfer.amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "transfer amount must be positive".to_string(),
        ));
    }
    if transfer.from_account_id == transfer.to_account_id {
        return Err(LedgerError::Validation(
            "cannot transfer to the same account".to_string(),
        ));
    }

    for account_id in [transfer.from_account_id, transfer.to_account_id] {
        let owned = account::Entity::find_by_id(account_id)
            .filter(account::Column::OwnerId.eq(owner_id))
            .filter(account::Column::IsActive.eq(true))
            .one(db)
            .await?;
        if owned.is_none() {
            return Err(LedgerError::NotFound("account"));
        }
    }

    let description = transfer
        .description
        .unwrap_or_else(|| "Transfer".to_string());

    let txn = db.begin().await?;
    let outgoing = transaction::ActiveModel {
        owner_id: Set(owner_id),
        description: Set(format!("{description} (out)")),
        amount: Set(transfer.amount),
        kind: Set(TransactionKind::Expense),
        date: Set(transfer.date),
        account_id: Set(transfer.from_account_id),
        category_id: Set(None),
        payment_id: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    let incoming = transaction::ActiveModel {
        owner_id: Set(owner_id),
        description: Set(format!("{description} (in)")),
        amount: Set(transfer.amount),
        kind: Set(TransactionKind::Income),
        date: Set(transfer.date),
        account_id: Set(transfer.to_account_id),
        category_id: Set(None),
        payment_id: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(outgoing = outgoing.id, incoming = incoming.id, "transfer recorded");
    Ok((outgoing, incoming))
}

/// Income/expense totals over an already-filtered transaction list.
pub fn summarize(transactions: &[transaction::Model]) -> TransactionsSummary {
    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;
    for tx in transactions {
        match tx.kind {
            TransactionKind::Income => total_income += tx.amount,
            TransactionKind::Expense => total_expense += tx.amount,
        }
    }
    TransactionsSummary {
        total_income,
        total_expense,
        net: total_income - total_expense,
        count: transactions.len() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance;
    use crate::testing;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_transfer_moves_money_between_accounts() {
        let db = testing::setup_db().await;
        let user = testing::seed_user(&db, "ana").await;
        let checking = testing::seed_account(&db, user.id, "Checking", "1000.00").await;
        let savings = testing::seed_account(&db, user.id, "Savings", "0").await;

        let (outgoing, incoming) = transfer(
            &db,
            user.id,
            NewTransfer {
                from_account_id: checking.id,
                to_account_id: savings.id,
                amount: dec("250.00"),
                date: date(2024, 6, 15),
                description: Some("Emergency fund".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(outgoing.kind, TransactionKind::Expense);
        assert_eq!(incoming.kind, TransactionKind::Income);
        assert_eq!(outgoing.payment_id, None);

        let checking_balance = balance::account_breakdown(&db, &checking).await.unwrap();
        let savings_balance = balance::account_breakdown(&db, &savings).await.unwrap();
        assert_eq!(checking_balance.current_balance, dec("750.00"));
        assert_eq!(savings_balance.current_balance, dec("250.00"));
    }

    #[tokio::test]
    async fn test_transfer_rejects_same_account() {
        let db = testing::setup_db().await;
        let user = testing::seed_user(&db, "ana").await;
        let checking = testing::seed_account(&db, user.id, "Checking", "1000.00").await;

        let result = transfer(
            &db,
            user.id,
            NewTransfer {
                from_account_id: checking.id,
                to_account_id: checking.id,
                amount: dec("10.00"),
                date: date(2024, 6, 15),
                description: None,
            },
        )
        .await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn test_transfer_rejects_foreign_account() {
        let db = testing::setup_db().await;
        let ana = testing::seed_user(&db, "ana").await;
        let bob = testing::seed_user(&db, "bob").await;
        let anas = testing::seed_account(&db, ana.id, "Checking", "1000.00").await;
        let bobs = testing::seed_account(&db, bob.id, "Checking", "0").await;

        let result = transfer(
            &db,
            ana.id,
            NewTransfer {
                from_account_id: anas.id,
                to_account_id: bobs.id,
                amount: dec("10.00"),
                date: date(2024, 6, 15),
                description: None,
            },
        )
        .await;
        assert!(matches!(result, Err(LedgerError::NotFound("account"))));
    }

    #[test]
    fn test_summarize_empty_is_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_income, Decimal::ZERO);
        assert_eq!(summary.total_expense, Decimal::ZERO);
        assert_eq!(summary.net, Decimal::ZERO);
        assert_eq!(summary.count, 0);
    }
}
