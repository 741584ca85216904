//! Applying and reversing payments.
//!
//! Both operations run inside a database transaction and guard the
//! installment's `amount_paid` with an optimistic check: the update is
//! filtered on the value that was read, so a concurrent writer makes
//! the update match zero rows instead of clobbering it. A lost race is
//! retried once before surfacing as a conflict.

use chrono::NaiveDate;
use model::entities::installment::InstallmentStatus;
use model::entities::payable_bill::BillStatus;
use model::entities::transaction::TransactionKind;
use model::entities::{account, installment, payable_bill, payment, transaction};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use tracing::{debug, info, instrument};

use crate::error::{LedgerError, Result};

/// Input for applying a payment to an installment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub installment_id: i32,
    pub account_id: i32,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub note: Option<String>,
}

/// What a successful payment did.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub payment: payment::Model,
    pub installment_status: InstallmentStatus,
    /// True when this payment settled the whole bill.
    pub bill_settled: bool,
}

/// Applies a payment: records the payment row, creates the linked
/// EXPENSE transaction on the paying account, advances the installment
/// and settles the bill when every installment is paid.
#[instrument(skip(db, new_payment), fields(installment_id = new_payment.installment_id))]
pub async fn apply_payment(
    db: &DatabaseConnection,
    owner_id: i32,
    new_payment: &NewPayment,
) -> Result<PaymentOutcome> {
    match try_apply(db, owner_id, new_payment).await {
        Err(LedgerError::Conflict) => {
            debug!("payment lost an update race, retrying once");
            try_apply(db, owner_id, new_payment).await
        }
        other => other,
    }
}

async fn try_apply(
    db: &DatabaseConnection,
    owner_id: i32,
    new_payment: &NewPayment,
) -> Result<PaymentOutcome> {
    if new_payment.amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "payment amount must be positive".to_string(),
        ));
    }

    let Some((inst, Some(bill))) = installment::Entity::find_by_id(new_payment.installment_id)
        .find_also_related(payable_bill::Entity)
        .one(db)
        .await?
    else {
        return Err(LedgerError::NotFound("installment"));
    };
    if bill.owner_id != owner_id {
        return Err(LedgerError::NotFound("installment"));
    }

    let paying_account = account::Entity::find_by_id(new_payment.account_id)
        .filter(account::Column::OwnerId.eq(owner_id))
        .filter(account::Column::IsActive.eq(true))
        .one(db)
        .await?;
    if paying_account.is_none() {
        return Err(LedgerError::NotFound("account"));
    }

    let remaining = inst.remaining();
    if new_payment.amount > remaining {
        return Err(LedgerError::Validation(format!(
            "payment exceeds the remaining amount; maximum allowed: {remaining}"
        )));
    }

    let new_paid = inst.amount_paid + new_payment.amount;
    let new_status = InstallmentStatus::from_amounts(new_paid, inst.amount);

    let txn = db.begin().await?;

    let paid = payment::ActiveModel {
        installment_id: Set(inst.id),
        account_id: Set(new_payment.account_id),
        amount: Set(new_payment.amount),
        date: Set(new_payment.date),
        note: Set(new_payment.note.clone()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    transaction::ActiveModel {
        owner_id: Set(owner_id),
        description: Set(format!("Payment: {}", bill.description)),
        amount: Set(new_payment.amount),
        kind: Set(TransactionKind::Expense),
        date: Set(new_payment.date),
        account_id: Set(new_payment.account_id),
        category_id: Set(bill.category_id),
        payment_id: Set(Some(paid.id)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    // Optimistic check on the amount observed above.
    let updated = installment::Entity::update_many()
        .col_expr(installment::Column::AmountPaid, Expr::value(new_paid))
        .col_expr(installment::Column::Status, Expr::value(new_status))
        .filter(installment::Column::Id.eq(inst.id))
        .filter(installment::Column::AmountPaid.eq(inst.amount_paid))
        .exec(&txn)
        .await?;
    if updated.rows_affected == 0 {
        txn.rollback().await?;
        return Err(LedgerError::Conflict);
    }

    let mut bill_settled = false;
    if new_status == InstallmentStatus::Paid {
        let unpaid_siblings = installment::Entity::find()
            .filter(installment::Column::BillId.eq(bill.id))
            .filter(installment::Column::Id.ne(inst.id))
            .filter(installment::Column::Status.ne(InstallmentStatus::Paid))
            .count(&txn)
            .await?;
        if unpaid_siblings == 0 {
            payable_bill::Entity::update_many()
                .col_expr(
                    payable_bill::Column::Status,
                    Expr::value(BillStatus::Settled),
                )
                .filter(payable_bill::Column::Id.eq(bill.id))
                .exec(&txn)
                .await?;
            bill_settled = true;
        }
    }

    txn.commit().await?;
    info!(
        payment_id = paid.id,
        status = ?new_status,
        bill_settled,
        "payment applied"
    );

    Ok(PaymentOutcome {
        payment: paid,
        installment_status: new_status,
        bill_settled,
    })
}

/// Reverses a payment: deletes the payment and its linked transaction,
/// rolls the installment back and reopens the bill if it was settled.
/// The linked transaction is found through `payment_id` alone.
#[instrument(skip(db))]
pub async fn reverse_payment(db: &DatabaseConnection, owner_id: i32, payment_id: i32) -> Result<()> {
    match try_reverse(db, owner_id, payment_id).await {
        Err(LedgerError::Conflict) => {
            debug!("reversal lost an update race, retrying once");
            try_reverse(db, owner_id, payment_id).await
        }
        other => other,
    }
}

async fn try_reverse(db: &DatabaseConnection, owner_id: i32, payment_id: i32) -> Result<()> {
    let Some((paid, Some(inst))) = payment::Entity::find_by_id(payment_id)
        .find_also_related(installment::Entity)
        .one(db)
        .await?
    else {
        return Err(LedgerError::NotFound("payment"));
    };
    let Some(bill) = payable_bill::Entity::find_by_id(inst.bill_id).one(db).await? else {
        return Err(LedgerError::NotFound("payment"));
    };
    if bill.owner_id != owner_id {
        return Err(LedgerError::NotFound("payment"));
    }

    let new_paid = (inst.amount_paid - paid.amount).max(Decimal::ZERO);
    let new_status = InstallmentStatus::from_amounts(new_paid, inst.amount);

    let txn = db.begin().await?;

    let updated = installment::Entity::update_many()
        .col_expr(installment::Column::AmountPaid, Expr::value(new_paid))
        .col_expr(installment::Column::Status, Expr::value(new_status))
        .filter(installment::Column::Id.eq(inst.id))
        .filter(installment::Column::AmountPaid.eq(inst.amount_paid))
        .exec(&txn)
        .await?;
    if updated.rows_affected == 0 {
        txn.rollback().await?;
        return Err(LedgerError::Conflict);
    }

    // The installment just dropped below PAID, so a settled bill must
    // reopen. Filtering on the stored status instead of the value read
    // before the transaction also covers a settlement that committed
    // in between.
    payable_bill::Entity::update_many()
        .col_expr(payable_bill::Column::Status, Expr::value(BillStatus::Open))
        .filter(payable_bill::Column::Id.eq(bill.id))
        .filter(payable_bill::Column::Status.eq(BillStatus::Settled))
        .exec(&txn)
        .await?;

    transaction::Entity::delete_many()
        .filter(transaction::Column::PaymentId.eq(paid.id))
        .exec(&txn)
        .await?;
    payment::Entity::delete_by_id(paid.id).exec(&txn).await?;

    txn.commit().await?;
    info!(payment_id, "payment reversed");
    Ok(())
}
