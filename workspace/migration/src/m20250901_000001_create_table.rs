use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username).unique_key())
                    .to_owned(),
            )
            .await?;

        // Create accounts table
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(pk_auto(Accounts::Id))
                    .col(integer(Accounts::OwnerId))
                    .col(string(Accounts::Name))
                    .col(string_len(Accounts::Kind, 20))
                    .col(decimal(Accounts::OpeningBalance).decimal_len(16, 4))
                    .col(string(Accounts::Color))
                    .col(boolean(Accounts::IsActive).default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_owner")
                            .from(Accounts::Table, Accounts::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create categories table
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(pk_auto(Categories::Id))
                    .col(integer(Categories::OwnerId))
                    .col(string(Categories::Name))
                    .col(string_len(Categories::Kind, 10))
                    .col(string(Categories::Color))
                    .col(string(Categories::Icon))
                    .col(integer_null(Categories::ParentId))
                    .col(boolean(Categories::IsActive).default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_owner")
                            .from(Categories::Table, Categories::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_parent")
                            .from(Categories::Table, Categories::ParentId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create payable_bills table
        manager
            .create_table(
                Table::create()
                    .table(PayableBills::Table)
                    .if_not_exists()
                    .col(pk_auto(PayableBills::Id))
                    .col(integer(PayableBills::OwnerId))
                    .col(string(PayableBills::Description))
                    .col(decimal(PayableBills::TotalAmount).decimal_len(16, 4))
                    .col(string_len(PayableBills::Kind, 15))
                    .col(integer_null(PayableBills::CategoryId))
                    .col(integer_null(PayableBills::TotalInstallments))
                    .col(string_null(PayableBills::Note))
                    .col(boolean(PayableBills::DoNotCount).default(false))
                    .col(string_len(PayableBills::Status, 10))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payable_bill_owner")
                            .from(PayableBills::Table, PayableBills::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payable_bill_category")
                            .from(PayableBills::Table, PayableBills::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create installments table
        manager
            .create_table(
                Table::create()
                    .table(Installments::Table)
                    .if_not_exists()
                    .col(pk_auto(Installments::Id))
                    .col(integer(Installments::BillId))
                    .col(integer(Installments::Number))
                    .col(decimal(Installments::Amount).decimal_len(16, 4))
                    .col(decimal(Installments::AmountPaid).decimal_len(16, 4).default(0))
                    .col(date_null(Installments::DueDate))
                    .col(string_len(Installments::Status, 10))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_installment_bill")
                            .from(Installments::Table, Installments::BillId)
                            .to(PayableBills::Table, PayableBills::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create payments table
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(pk_auto(Payments::Id))
                    .col(integer(Payments::InstallmentId))
                    .col(integer(Payments::AccountId))
                    .col(decimal(Payments::Amount).decimal_len(16, 4))
                    .col(date(Payments::Date))
                    .col(string_null(Payments::Note))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_installment")
                            .from(Payments::Table, Payments::InstallmentId)
                            .to(Installments::Table, Installments::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_account")
                            .from(Payments::Table, Payments::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create transactions table
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(pk_auto(Transactions::Id))
                    .col(integer(Transactions::OwnerId))
                    .col(string(Transactions::Description))
                    .col(decimal(Transactions::Amount).decimal_len(16, 4))
                    .col(string_len(Transactions::Kind, 10))
                    .col(date(Transactions::Date))
                    .col(integer(Transactions::AccountId))
                    .col(integer_null(Transactions::CategoryId))
                    .col(integer_null(Transactions::PaymentId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_owner")
                            .from(Transactions::Table, Transactions::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_account")
                            .from(Transactions::Table, Transactions::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_category")
                            .from(Transactions::Table, Transactions::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_payment")
                            .from(Transactions::Table, Transactions::PaymentId)
                            .to(Payments::Table, Payments::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create budgets table
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(pk_auto(Budgets::Id))
                    .col(integer(Budgets::OwnerId))
                    .col(integer(Budgets::CategoryId))
                    .col(integer(Budgets::Month))
                    .col(integer(Budgets::Year))
                    .col(decimal_null(Budgets::LimitAmount).decimal_len(16, 4))
                    .col(decimal_null(Budgets::Percent).decimal_len(5, 2))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_owner")
                            .from(Budgets::Table, Budgets::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_category")
                            .from(Budgets::Table, Budgets::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One budget per category per month
        manager
            .create_index(
                Index::create()
                    .name("idx_budget_owner_category_period")
                    .table(Budgets::Table)
                    .col(Budgets::OwnerId)
                    .col(Budgets::CategoryId)
                    .col(Budgets::Month)
                    .col(Budgets::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Installments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PayableBills::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

// Define identifiers for all tables

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    OwnerId,
    Name,
    Kind,
    OpeningBalance,
    Color,
    IsActive,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    OwnerId,
    Name,
    Kind,
    Color,
    Icon,
    ParentId,
    IsActive,
}

#[derive(DeriveIden)]
enum PayableBills {
    Table,
    Id,
    OwnerId,
    Description,
    TotalAmount,
    Kind,
    CategoryId,
    TotalInstallments,
    Note,
    DoNotCount,
    Status,
}

#[derive(DeriveIden)]
enum Installments {
    Table,
    Id,
    BillId,
    Number,
    Amount,
    AmountPaid,
    DueDate,
    Status,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    InstallmentId,
    AccountId,
    Amount,
    Date,
    Note,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    OwnerId,
    Description,
    Amount,
    Kind,
    Date,
    AccountId,
    CategoryId,
    PaymentId,
}

#[derive(DeriveIden)]
enum Budgets {
    Table,
    Id,
    OwnerId,
    CategoryId,
    Month,
    Year,
    LimitAmount,
    Percent,
}
