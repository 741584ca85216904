use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Whether a bill is split into monthly installments or due as a
/// single amount.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(15))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillKind {
    #[sea_orm(string_value = "INSTALLMENT")]
    Installment,
    #[sea_orm(string_value = "LUMP_SUM")]
    LumpSum,
}

/// Aggregate bill state, maintained exclusively by the payment
/// processor. SETTLED means every installment is PAID.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    #[sea_orm(string_value = "OPEN")]
    Open,
    #[sea_orm(string_value = "SETTLED")]
    Settled,
}

/// An obligation to pay, split into one or more installments.
/// Hard-deleted; installments and their payments cascade with it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payable_bills")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_id: i32,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_amount: Decimal,
    pub kind: BillKind,
    pub category_id: Option<i32>,
    /// Required for INSTALLMENT bills, absent for LUMP_SUM.
    pub total_installments: Option<i32>,
    pub note: Option<String>,
    /// Tracked but excluded from aggregate due/paid sums.
    #[sea_orm(default_value = "false")]
    pub do_not_count: bool,
    pub status: BillStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(has_many = "super::installment::Entity")]
    Installment,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::installment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
