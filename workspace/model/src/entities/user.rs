use sea_orm::entity::prelude::*;

/// A user of the system. Every other entity is scoped to exactly one
/// owner; authentication itself happens outside this crate.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::account::Entity")]
    Account,
    #[sea_orm(has_many = "super::category::Entity")]
    Category,
    #[sea_orm(has_many = "super::payable_bill::Entity")]
    PayableBill,
}

impl ActiveModelBehavior for ActiveModel {}
