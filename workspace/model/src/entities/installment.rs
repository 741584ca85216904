use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payment state of a single installment, derived from the amounts
/// and never set directly by the user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PARTIAL")]
    Partial,
    #[sea_orm(string_value = "PAID")]
    Paid,
}

impl InstallmentStatus {
    /// Single source of truth for the status thresholds: PAID when the
    /// amount paid covers the face amount, PARTIAL when something but
    /// not everything is paid, PENDING when nothing is.
    pub fn from_amounts(amount_paid: Decimal, face_amount: Decimal) -> Self {
        if amount_paid >= face_amount {
            InstallmentStatus::Paid
        } else if amount_paid > Decimal::ZERO {
            InstallmentStatus::Partial
        } else {
            InstallmentStatus::Pending
        }
    }
}

/// One scheduled (or immediate) portion of a bill's total amount.
/// Created in bulk when the bill is created, never added or removed
/// individually afterwards.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "installments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub bill_id: i32,
    /// 1-based position within the bill.
    pub number: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount_paid: Decimal,
    /// LUMP_SUM bills may carry a single installment with no due date.
    pub due_date: Option<NaiveDate>,
    pub status: InstallmentStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payable_bill::Entity",
        from = "Column::BillId",
        to = "super::payable_bill::Column::Id",
        on_delete = "Cascade"
    )]
    PayableBill,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payment,
}

impl Related<super::payable_bill::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayableBill.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Face amount still unpaid.
    pub fn remaining(&self) -> Decimal {
        self.amount - self.amount_paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn test_status_pending_when_nothing_paid() {
        assert_eq!(
            InstallmentStatus::from_amounts(Decimal::ZERO, dec("100.00")),
            InstallmentStatus::Pending
        );
    }

    #[test]
    fn test_status_partial_between_zero_and_face() {
        assert_eq!(
            InstallmentStatus::from_amounts(dec("0.01"), dec("100.00")),
            InstallmentStatus::Partial
        );
        assert_eq!(
            InstallmentStatus::from_amounts(dec("99.99"), dec("100.00")),
            InstallmentStatus::Partial
        );
    }

    #[test]
    fn test_status_paid_at_or_above_face() {
        assert_eq!(
            InstallmentStatus::from_amounts(dec("100.00"), dec("100.00")),
            InstallmentStatus::Paid
        );
        assert_eq!(
            InstallmentStatus::from_amounts(dec("120.00"), dec("100.00")),
            InstallmentStatus::Paid
        );
    }
}
