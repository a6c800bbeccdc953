//! Pending conversation state per chat identity.
//!
//! One row per `(platform, platform_user_id)`. `version` is bumped on every
//! write and used for compare-and-swap updates; `expires_at` drives the sweep.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum ConversationStates {
    Table,
    Platform,
    PlatformUserId,
    UserId,
    State,
    Intent,
    Entities,
    EditField,
    Options,
    Version,
    CreatedAt,
    ExpiresAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConversationStates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConversationStates::Platform)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConversationStates::PlatformUserId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ConversationStates::UserId).uuid().not_null())
                    .col(ColumnDef::new(ConversationStates::State).string().not_null())
                    .col(ColumnDef::new(ConversationStates::Intent).string().not_null())
                    .col(ColumnDef::new(ConversationStates::Entities).text().not_null())
                    .col(ColumnDef::new(ConversationStates::EditField).string())
                    .col(ColumnDef::new(ConversationStates::Options).text())
                    .col(
                        ColumnDef::new(ConversationStates::Version)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(ConversationStates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConversationStates::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ConversationStates::Platform)
                            .col(ConversationStates::PlatformUserId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-conversation_states-expires_at")
                    .table(ConversationStates::Table)
                    .col(ConversationStates::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConversationStates::Table).to_owned())
            .await?;
        Ok(())
    }
}
