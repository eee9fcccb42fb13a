use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_service_request_customer")
                    .table(ServiceRequest::Table)
                    .col(ServiceRequest::CustomerId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_service_request_professional")
                    .table(ServiceRequest::Table)
                    .col(ServiceRequest::ProfessionalId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_service_request_status")
                    .table(ServiceRequest::Table)
                    .col(ServiceRequest::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_professional_available")
                    .table(Professional::Table)
                    .col(Professional::Available)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_service_request_customer").table(ServiceRequest::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_service_request_professional").table(ServiceRequest::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_service_request_status").table(ServiceRequest::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_professional_available").table(Professional::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ServiceRequest { Table, CustomerId, ProfessionalId, Status }

#[derive(DeriveIden)]
enum Professional { Table, Available }
