//! Initial schema for the personal ledger.
//!
//! - `users`: ledger owners
//! - `platform_users`: chat identities linked to a user
//! - `accounts`: mono-currency money locations (cash, bank, credit card)
//! - `categories`: income/expense classification
//! - `installment_purchases`: parent records of purchases paid in installments
//! - `movements`: single income or expense bookings
//! - `transfers`: money moved between two accounts of the same user

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    DisplayName,
    DefaultCurrency,
    CreatedAt,
}

#[derive(Iden)]
enum PlatformUsers {
    Table,
    Platform,
    PlatformUserId,
    UserId,
    Verified,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    UserId,
    Name,
    Currency,
    InitialBalanceMinor,
    IsCreditCard,
    ClosingDay,
    Icon,
    Archived,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    UserId,
    Name,
    Kind,
    Icon,
    Archived,
}

#[derive(Iden)]
enum InstallmentPurchases {
    Table,
    Id,
    UserId,
    AccountId,
    CategoryId,
    TotalMinor,
    Currency,
    Installments,
    PurchasedOn,
    FirstInstallmentOn,
    Note,
    CreatedAt,
}

#[derive(Iden)]
enum Movements {
    Table,
    Id,
    UserId,
    Kind,
    OccurredOn,
    AmountMinor,
    Currency,
    AccountId,
    CategoryId,
    Note,
    PurchaseId,
    InstallmentNumber,
    CreatedAt,
}

#[derive(Iden)]
enum Transfers {
    Table,
    Id,
    UserId,
    FromAccountId,
    ToAccountId,
    FromAmountMinor,
    ToAmountMinor,
    OccurredOn,
    Note,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::DisplayName).string().not_null())
                    .col(
                        ColumnDef::new(Users::DefaultCurrency)
                            .string()
                            .not_null()
                            .default("ARS"),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Platform users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PlatformUsers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PlatformUsers::Platform).string().not_null())
                    .col(
                        ColumnDef::new(PlatformUsers::PlatformUserId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PlatformUsers::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(PlatformUsers::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .primary_key(
                        Index::create()
                            .col(PlatformUsers::Platform)
                            .col(PlatformUsers::PlatformUserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-platform_users-user_id")
                            .from(PlatformUsers::Table, PlatformUsers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-platform_users-user_id")
                    .table(PlatformUsers::Table)
                    .col(PlatformUsers::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::UserId).uuid().not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::Currency)
                            .string()
                            .not_null()
                            .default("ARS"),
                    )
                    .col(
                        ColumnDef::new(Accounts::InitialBalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::IsCreditCard)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Accounts::ClosingDay).integer())
                    .col(ColumnDef::new(Accounts::Icon).string())
                    .col(
                        ColumnDef::new(Accounts::Archived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-user_id")
                            .from(Accounts::Table, Accounts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-user_id-name-unique")
                    .table(Accounts::Table)
                    .col(Accounts::UserId)
                    .col(Accounts::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::UserId).uuid().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::Kind).string().not_null())
                    .col(ColumnDef::new(Categories::Icon).string())
                    .col(
                        ColumnDef::new(Categories::Archived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-user_id")
                            .from(Categories::Table, Categories::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-user_id-kind-name-unique")
                    .table(Categories::Table)
                    .col(Categories::UserId)
                    .col(Categories::Kind)
                    .col(Categories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Installment purchases
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(InstallmentPurchases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InstallmentPurchases::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InstallmentPurchases::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(InstallmentPurchases::AccountId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstallmentPurchases::CategoryId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstallmentPurchases::TotalMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstallmentPurchases::Currency)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstallmentPurchases::Installments)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstallmentPurchases::PurchasedOn)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstallmentPurchases::FirstInstallmentOn)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InstallmentPurchases::Note).string())
                    .col(
                        ColumnDef::new(InstallmentPurchases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-installment_purchases-account_id")
                            .from(InstallmentPurchases::Table, InstallmentPurchases::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-installment_purchases-category_id")
                            .from(
                                InstallmentPurchases::Table,
                                InstallmentPurchases::CategoryId,
                            )
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Movements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Movements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Movements::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Movements::UserId).uuid().not_null())
                    .col(ColumnDef::new(Movements::Kind).string().not_null())
                    .col(ColumnDef::new(Movements::OccurredOn).date().not_null())
                    .col(
                        ColumnDef::new(Movements::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Movements::Currency).string().not_null())
                    .col(ColumnDef::new(Movements::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Movements::CategoryId).uuid().not_null())
                    .col(ColumnDef::new(Movements::Note).string())
                    .col(ColumnDef::new(Movements::PurchaseId).uuid())
                    .col(ColumnDef::new(Movements::InstallmentNumber).integer())
                    .col(
                        ColumnDef::new(Movements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movements-account_id")
                            .from(Movements::Table, Movements::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movements-category_id")
                            .from(Movements::Table, Movements::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movements-purchase_id")
                            .from(Movements::Table, Movements::PurchaseId)
                            .to(InstallmentPurchases::Table, InstallmentPurchases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-user_id-occurred_on")
                    .table(Movements::Table)
                    .col(Movements::UserId)
                    .col(Movements::OccurredOn)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-account_id")
                    .table(Movements::Table)
                    .col(Movements::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-purchase_id")
                    .table(Movements::Table)
                    .col(Movements::PurchaseId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Transfers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transfers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transfers::UserId).uuid().not_null())
                    .col(ColumnDef::new(Transfers::FromAccountId).uuid().not_null())
                    .col(ColumnDef::new(Transfers::ToAccountId).uuid().not_null())
                    .col(
                        ColumnDef::new(Transfers::FromAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transfers::ToAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transfers::OccurredOn).date().not_null())
                    .col(ColumnDef::new(Transfers::Note).string())
                    .col(
                        ColumnDef::new(Transfers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-from_account_id")
                            .from(Transfers::Table, Transfers::FromAccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-to_account_id")
                            .from(Transfers::Table, Transfers::ToAccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transfers-user_id-occurred_on")
                    .table(Transfers::Table)
                    .col(Transfers::UserId)
                    .col(Transfers::OccurredOn)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse creation order so foreign keys never dangle.
        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Movements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InstallmentPurchases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PlatformUsers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
