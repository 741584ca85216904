//! Installment plan generation.
//!
//! A bill's total is split into equal monthly shares rounded to two
//! decimal places; whatever rounding leaves over lands on the last
//! installment, so the plan always sums back to the exact total.

use chrono::NaiveDate;
use common::add_months;
use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};

/// One planned installment, before it is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedInstallment {
    /// 1-based position within the bill.
    pub number: i32,
    pub amount: Decimal,
    pub due_date: Option<NaiveDate>,
}

/// Splits `total_amount` into `count` monthly installments starting at
/// `first_due`, one month apart (day-of-month preserved, clamped to
/// shorter months).
pub fn installment_plan(
    total_amount: Decimal,
    count: i32,
    first_due: NaiveDate,
) -> Result<Vec<PlannedInstallment>> {
    if count < 1 {
        return Err(LedgerError::Validation(
            "installment bills require at least one installment".to_string(),
        ));
    }

    let count_dec = Decimal::from(count);
    let share = (total_amount / count_dec).round_dp(2);
    // The last installment absorbs the rounding remainder.
    let last = total_amount - share * Decimal::from(count - 1);
    // A 0.00 installment could never be paid, making the bill
    // unsettleable.
    if share <= Decimal::ZERO || last <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "total amount is too small to split into that many installments".to_string(),
        ));
    }

    let mut plan = Vec::with_capacity(count as usize);
    for index in 0..count {
        let amount = if index == count - 1 { last } else { share };
        plan.push(PlannedInstallment {
            number: index + 1,
            amount,
            due_date: Some(add_months(first_due, index as u32)),
        });
    }
    Ok(plan)
}

/// A LUMP_SUM bill gets exactly one installment covering the total.
pub fn lump_sum_plan(total_amount: Decimal, due_date: Option<NaiveDate>) -> Vec<PlannedInstallment> {
    vec![PlannedInstallment {
        number: 1,
        amount: total_amount,
        due_date,
    }]
}
