use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// A per-category spending limit for one month. The limit is EITHER a
/// fixed amount OR a percentage of the month's total income; exactly
/// one of the two columns is set. Unique per (owner, category, month,
/// year).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_id: i32,
    pub category_id: i32,
    /// 1-12.
    pub month: i32,
    pub year: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))", nullable)]
    pub limit_amount: Option<Decimal>,
    /// Percentage of the period's income, in (0, 100].
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub percent: Option<Decimal>,
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
        on_delete = "Cascade"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
