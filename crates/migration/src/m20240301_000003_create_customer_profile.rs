//! Create `customer_profile` table holding customer-only attributes.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CustomerProfile::Table)
                    .if_not_exists()
                    .col(uuid(CustomerProfile::UserId).primary_key())
                    .col(text_null(CustomerProfile::Address))
                    .col(string_len_null(CustomerProfile::Pincode, 10))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_profile_user")
                            .from(CustomerProfile::Table, CustomerProfile::UserId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CustomerProfile::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum CustomerProfile { Table, UserId, Address, Pincode }

#[derive(DeriveIden)]
enum AppUser { Table, Id }
