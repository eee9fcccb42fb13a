//! Create `service_request` table.
//!
//! Lifecycle timestamps are nullable and written once each; `version`
//! backs optimistic concurrency for transitions.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceRequest::Table)
                    .if_not_exists()
                    .col(uuid(ServiceRequest::Id).primary_key())
                    .col(uuid(ServiceRequest::ServiceId).not_null())
                    .col(uuid(ServiceRequest::CustomerId).not_null())
                    .col(uuid_null(ServiceRequest::ProfessionalId))
                    .col(string_len(ServiceRequest::Status, 20).not_null())
                    .col(timestamp_with_time_zone(ServiceRequest::RequestDate).not_null())
                    .col(timestamp_with_time_zone_null(ServiceRequest::AssignedAt))
                    .col(timestamp_with_time_zone_null(ServiceRequest::AcceptedAt))
                    .col(timestamp_with_time_zone_null(ServiceRequest::RejectedAt))
                    .col(timestamp_with_time_zone_null(ServiceRequest::CompletionDate))
                    .col(timestamp_with_time_zone_null(ServiceRequest::ClosedAt))
                    .col(timestamp_with_time_zone_null(ServiceRequest::CancelledAt))
                    .col(integer_null(ServiceRequest::Rating))
                    .col(text_null(ServiceRequest::Remarks))
                    .col(integer(ServiceRequest::Version).not_null().default(0))
                    .col(timestamp_with_time_zone(ServiceRequest::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_request_service")
                            .from(ServiceRequest::Table, ServiceRequest::ServiceId)
                            .to(Service::Table, Service::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_request_customer")
                            .from(ServiceRequest::Table, ServiceRequest::CustomerId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_request_professional")
                            .from(ServiceRequest::Table, ServiceRequest::ProfessionalId)
                            .to(Professional::Table, Professional::UserId)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ServiceRequest::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ServiceRequest {
    Table,
    Id,
    ServiceId,
    CustomerId,
    ProfessionalId,
    Status,
    RequestDate,
    AssignedAt,
    AcceptedAt,
    RejectedAt,
    CompletionDate,
    ClosedAt,
    CancelledAt,
    Rating,
    Remarks,
    Version,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Service { Table, Id }

#[derive(DeriveIden)]
enum AppUser { Table, Id }

#[derive(DeriveIden)]
enum Professional { Table, UserId }
