//! Bill creation and bill-level aggregation.

use chrono::{NaiveDate, Utc};
use common::{BillRollup, BillsSummary};
use model::entities::installment::InstallmentStatus;
use model::entities::payable_bill::{BillKind, BillStatus};
use model::entities::{category, installment, payable_bill};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{debug, instrument};

use crate::error::{LedgerError, Result};
use crate::installments::{installment_plan, lump_sum_plan};

/// Input for creating a bill.
#[derive(Debug, Clone)]
pub struct NewBill {
    pub description: String,
    pub total_amount: Decimal,
    pub kind: BillKind,
    pub category_id: Option<i32>,
    /// Required for INSTALLMENT bills.
    pub total_installments: Option<i32>,
    /// First due date; defaults to today for installment plans.
    pub first_due_date: Option<NaiveDate>,
    pub note: Option<String>,
    pub do_not_count: bool,
}

/// Creates a bill and its whole installment plan in one transaction.
/// Installments are never added or removed individually afterwards.
#[instrument(skip(db, new_bill), fields(kind = ?new_bill.kind))]
pub async fn create_bill(
    db: &DatabaseConnection,
    owner_id: i32,
    new_bill: NewBill,
) -> Result<(payable_bill::Model, Vec<installment::Model>)> {
    if new_bill.total_amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "total amount must be positive".to_string(),
        ));
    }

    if let Some(category_id) = new_bill.category_id {
        let owned = category::Entity::find_by_id(category_id)
            .filter(category::Column::OwnerId.eq(owner_id))
            .one(db)
            .await?;
        if owned.is_none() {
            return Err(LedgerError::NotFound("category"));
        }
    }

    let plan = match new_bill.kind {
        BillKind::Installment => {
            let count = new_bill.total_installments.ok_or_else(|| {
                LedgerError::Validation(
                    "installment bills require the number of installments".to_string(),
                )
            })?;
            let first_due = new_bill
                .first_due_date
                .unwrap_or_else(|| Utc::now().date_naive());
            installment_plan(new_bill.total_amount, count, first_due)?
        }
        BillKind::LumpSum => lump_sum_plan(new_bill.total_amount, new_bill.first_due_date),
    };

    let txn = db.begin().await?;

    let bill = payable_bill::ActiveModel {
        owner_id: Set(owner_id),
        description: Set(new_bill.description),
        total_amount: Set(new_bill.total_amount),
        kind: Set(new_bill.kind),
        category_id: Set(new_bill.category_id),
        total_installments: Set(match new_bill.kind {
            BillKind::Installment => new_bill.total_installments,
            BillKind::LumpSum => None,
        }),
        note: Set(new_bill.note),
        do_not_count: Set(new_bill.do_not_count),
        status: Set(BillStatus::Open),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let rows = plan.into_iter().map(|planned| installment::ActiveModel {
        bill_id: Set(bill.id),
        number: Set(planned.number),
        amount: Set(planned.amount),
        amount_paid: Set(Decimal::ZERO),
        due_date: Set(planned.due_date),
        status: Set(InstallmentStatus::Pending),
        ..Default::default()
    });
    installment::Entity::insert_many(rows).exec(&txn).await?;

    txn.commit().await?;
    debug!(bill_id = bill.id, "bill created");

    let installments = installment::Entity::find()
        .filter(installment::Column::BillId.eq(bill.id))
        .order_by_asc(installment::Column::Number)
        .all(db)
        .await?;

    Ok((bill, installments))
}

/// Paid/pending rollup over one bill's installments, for listings.
pub fn rollup(installments: &[installment::Model]) -> BillRollup {
    let mut amount_paid = Decimal::ZERO;
    let mut amount_pending = Decimal::ZERO;
    let mut installments_paid = 0;
    let mut installments_pending = 0;

    for inst in installments {
        amount_paid += inst.amount_paid;
        amount_pending += inst.remaining();
        if inst.status == InstallmentStatus::Paid {
            installments_paid += 1;
        } else {
            installments_pending += 1;
        }
    }

    BillRollup {
        amount_paid,
        amount_pending,
        installments_paid,
        installments_pending,
    }
}

/// Aggregate position across all of the user's bills. Bills flagged
/// `do_not_count` appear in the counts but are left out of the money
/// totals.
#[instrument(skip(db))]
pub async fn bills_summary(db: &DatabaseConnection, owner_id: i32) -> Result<BillsSummary> {
    let bills = payable_bill::Entity::find()
        .filter(payable_bill::Column::OwnerId.eq(owner_id))
        .find_with_related(installment::Entity)
        .all(db)
        .await?;

    let mut summary = BillsSummary {
        total_open: Decimal::ZERO,
        total_paid: Decimal::ZERO,
        open_bills: 0,
        settled_bills: 0,
        total_bills: bills.len() as u64,
    };

    for (bill, installments) in &bills {
        match bill.status {
            BillStatus::Open => summary.open_bills += 1,
            BillStatus::Settled => summary.settled_bills += 1,
        }
        if bill.do_not_count {
            continue;
        }
        let bill_rollup = rollup(installments);
        summary.total_paid += bill_rollup.amount_paid;
        summary.total_open += bill_rollup.amount_pending;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_create_installment_bill_persists_full_plan() {
        let db = testing::setup_db().await;
        let user = testing::seed_user(&db, "ana").await;

        let (bill, installments) = create_bill(
            &db,
            user.id,
            NewBill {
                description: "New fridge".to_string(),
                total_amount: dec("1000.00"),
                kind: BillKind::Installment,
                category_id: None,
                total_installments: Some(3),
                first_due_date: Some(date(2024, 5, 10)),
                note: None,
                do_not_count: false,
            },
        )
        .await
        .unwrap();

        assert_eq!(bill.status, BillStatus::Open);
        assert_eq!(installments.len(), 3);
        assert_eq!(installments[0].amount, dec("333.33"));
        assert_eq!(installments[2].amount, dec("333.34"));
        assert_eq!(installments[1].due_date, Some(date(2024, 6, 10)));
        assert!(installments
            .iter()
            .all(|i| i.status == InstallmentStatus::Pending));
    }

    #[tokio::test]
    async fn test_create_lump_sum_bill() {
        let db = testing::setup_db().await;
        let user = testing::seed_user(&db, "ana").await;

        let (bill, installments) = create_bill(
            &db,
            user.id,
            NewBill {
                description: "Insurance".to_string(),
                total_amount: dec("420.00"),
                kind: BillKind::LumpSum,
                category_id: None,
                total_installments: None,
                first_due_date: None,
                note: Some("annual".to_string()),
                do_not_count: false,
            },
        )
        .await
        .unwrap();

        assert_eq!(bill.total_installments, None);
        assert_eq!(installments.len(), 1);
        assert_eq!(installments[0].amount, dec("420.00"));
        assert_eq!(installments[0].due_date, None);
    }

    #[tokio::test]
    async fn test_installment_bill_requires_count() {
        let db = testing::setup_db().await;
        let user = testing::seed_user(&db, "ana").await;

        let result = create_bill(
            &db,
            user.id,
            NewBill {
                description: "Phone".to_string(),
                total_amount: dec("1200.00"),
                kind: BillKind::Installment,
                category_id: None,
                total_installments: None,
                first_due_date: None,
                note: None,
                do_not_count: false,
            },
        )
        .await;

        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rejects_non_positive_total() {
        let db = testing::setup_db().await;
        let user = testing::seed_user(&db, "ana").await;

        let result = create_bill(
            &db,
            user.id,
            NewBill {
                description: "Nothing".to_string(),
                total_amount: Decimal::ZERO,
                kind: BillKind::LumpSum,
                category_id: None,
                total_installments: None,
                first_due_date: None,
                note: None,
                do_not_count: false,
            },
        )
        .await;

        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn test_foreign_category_reads_as_not_found() {
        let db = testing::setup_db().await;
        let ana = testing::seed_user(&db, "ana").await;
        let bob = testing::seed_user(&db, "bob").await;
        let bobs_category = testing::seed_expense_category(&db, bob.id, "Food").await;

        let result = create_bill(
            &db,
            ana.id,
            NewBill {
                description: "Groceries plan".to_string(),
                total_amount: dec("100.00"),
                kind: BillKind::LumpSum,
                category_id: Some(bobs_category.id),
                total_installments: None,
                first_due_date: None,
                note: None,
                do_not_count: false,
            },
        )
        .await;

        assert!(matches!(result, Err(LedgerError::NotFound("category"))));
    }

    #[tokio::test]
    async fn test_summary_skips_do_not_count_money_but_counts_bill() {
        let db = testing::setup_db().await;
        let user = testing::seed_user(&db, "ana").await;

        testing::seed_lump_sum_bill(&db, user.id, "Rent", "900.00", false).await;
        testing::seed_lump_sum_bill(&db, user.id, "Tracked only", "50.00", true).await;

        let summary = bills_summary(&db, user.id).await.unwrap();
        assert_eq!(summary.total_bills, 2);
        assert_eq!(summary.open_bills, 2);
        assert_eq!(summary.total_open, dec("900.00"));
        assert_eq!(summary.total_paid, Decimal::ZERO);
    }

    #[test]
    fn test_rollup_mixed_statuses() {
        let make = |number, amount: &str, paid: &str| installment::Model {
            id: number,
            bill_id: 1,
            number,
            amount: dec(amount),
            amount_paid: dec(paid),
            due_date: None,
            status: InstallmentStatus::from_amounts(dec(paid), dec(amount)),
        };
        let installments = vec![
            make(1, "100.00", "100.00"),
            make(2, "100.00", "40.00"),
            make(3, "100.00", "0"),
        ];

        let rolled = rollup(&installments);
        assert_eq!(rolled.amount_paid, dec("140.00"));
        assert_eq!(rolled.amount_pending, dec("160.00"));
        assert_eq!(rolled.installments_paid, 1);
        assert_eq!(rolled.installments_pending, 2);
    }
}
