//! Create `professional` table.
//!
//! Carries verification state and the single-slot availability pair
//! (`available`, `current_request`), guarded by `version`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Professional::Table)
                    .if_not_exists()
                    .col(uuid(Professional::UserId).primary_key())
                    .col(string_len(Professional::ServiceType, 50).not_null())
                    .col(string_len_null(Professional::Experience, 100))
                    .col(string_len(Professional::Status, 20).not_null())
                    .col(boolean(Professional::Verified).not_null().default(false))
                    .col(timestamp_with_time_zone_null(Professional::VerifiedAt))
                    .col(uuid_null(Professional::VerifiedBy))
                    .col(text_null(Professional::RejectionReason))
                    .col(boolean(Professional::Available).not_null().default(true))
                    .col(uuid_null(Professional::CurrentRequest))
                    .col(integer(Professional::Version).not_null().default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_professional_user")
                            .from(Professional::Table, Professional::UserId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Professional::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Professional {
    Table,
    UserId,
    ServiceType,
    Experience,
    Status,
    Verified,
    VerifiedAt,
    VerifiedBy,
    RejectionReason,
    Available,
    CurrentRequest,
    Version,
}

#[derive(DeriveIden)]
enum AppUser { Table, Id }
