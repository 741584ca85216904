//! Shared fixtures for the engine tests: an in-memory SQLite database
//! with the full schema, plus seed helpers for the common records.

use chrono::NaiveDate;
use migration::{Migrator, MigratorTrait};
use model::entities::account::AccountKind;
use model::entities::category::CategoryKind;
use model::entities::payable_bill::BillKind;
use model::entities::transaction::TransactionKind;
use model::entities::{account, category, installment, payable_bill, transaction, user};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

use crate::bills::{create_bill, NewBill};

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("failed to connect to in-memory database");
    Migrator::up(&db, None).await.expect("migration failed");
    db
}

fn dec(value: &str) -> Decimal {
    value.parse().expect("bad decimal literal")
}

pub async fn seed_user(db: &DatabaseConnection, username: &str) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed user")
}

pub async fn seed_account(
    db: &DatabaseConnection,
    owner_id: i32,
    name: &str,
    opening_balance: &str,
) -> account::Model {
    account::ActiveModel {
        owner_id: Set(owner_id),
        name: Set(name.to_string()),
        kind: Set(AccountKind::Checking),
        opening_balance: Set(dec(opening_balance)),
        color: Set("#2255aa".to_string()),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed account")
}

pub async fn seed_expense_category(
    db: &DatabaseConnection,
    owner_id: i32,
    name: &str,
) -> category::Model {
    seed_category(db, owner_id, name, CategoryKind::Expense).await
}

pub async fn seed_category(
    db: &DatabaseConnection,
    owner_id: i32,
    name: &str,
    kind: CategoryKind,
) -> category::Model {
    category::ActiveModel {
        owner_id: Set(owner_id),
        name: Set(name.to_string()),
        kind: Set(kind),
        color: Set("#cc4444".to_string()),
        icon: Set("tag".to_string()),
        parent_id: Set(None),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed category")
}

pub async fn seed_transaction(
    db: &DatabaseConnection,
    owner_id: i32,
    account_id: i32,
    kind: TransactionKind,
    amount: &str,
    date: NaiveDate,
    category_id: Option<i32>,
) -> transaction::Model {
    transaction::ActiveModel {
        owner_id: Set(owner_id),
        description: Set("seeded".to_string()),
        amount: Set(dec(amount)),
        kind: Set(kind),
        date: Set(date),
        account_id: Set(account_id),
        category_id: Set(category_id),
        payment_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed transaction")
}

pub async fn seed_installment_bill(
    db: &DatabaseConnection,
    owner_id: i32,
    description: &str,
    total_amount: &str,
    count: i32,
    first_due: NaiveDate,
) -> (payable_bill::Model, Vec<installment::Model>) {
    create_bill(
        db,
        owner_id,
        NewBill {
            description: description.to_string(),
            total_amount: dec(total_amount),
            kind: BillKind::Installment,
            category_id: None,
            total_installments: Some(count),
            first_due_date: Some(first_due),
            note: None,
            do_not_count: false,
        },
    )
    .await
    .expect("failed to seed installment bill")
}

pub async fn seed_lump_sum_bill(
    db: &DatabaseConnection,
    owner_id: i32,
    description: &str,
    total_amount: &str,
    do_not_count: bool,
) -> (payable_bill::Model, Vec<installment::Model>) {
    create_bill(
        db,
        owner_id,
        NewBill {
            description: description.to_string(),
            total_amount: dec(total_amount),
            kind: BillKind::LumpSum,
            category_id: None,
            total_installments: None,
            first_due_date: None,
            note: None,
            do_not_count,
        },
    )
    .await
    .expect("failed to seed lump sum bill")
}
