use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // OAuth 2.0 Device Authorization Grant (RFC 8628) records
        manager
            .create_table(
                Table::create()
                    .table(DeviceAuthorizations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DeviceAuthorizations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(DeviceAuthorizations::ApplicationId))
                    .col(string(DeviceAuthorizations::EnvironmentId))
                    .col(string_null(DeviceAuthorizations::OrganizationId))
                    .col(string(DeviceAuthorizations::ClientId))
                    .col(string_uniq(DeviceAuthorizations::DeviceCode))
                    .col(string_uniq(DeviceAuthorizations::UserCode))
                    .col(string(DeviceAuthorizations::VerificationUri))
                    .col(string(DeviceAuthorizations::Scope))
                    .col(
                        ColumnDef::new(DeviceAuthorizations::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(string_null(DeviceAuthorizations::UserId))
                    .col(string_null(DeviceAuthorizations::SessionId))
                    .col(
                        ColumnDef::new(DeviceAuthorizations::Interval)
                            .big_integer()
                            .not_null()
                            .default(5),
                    )
                    .col(
                        ColumnDef::new(DeviceAuthorizations::PollCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(big_integer_null(DeviceAuthorizations::LastPolledAt))
                    .col(big_integer(DeviceAuthorizations::ExpiresAt))
                    .col(big_integer(DeviceAuthorizations::CreatedAt))
                    .col(big_integer(DeviceAuthorizations::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Expiry sweep scans by expires_at
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_device_authorizations_expires_at")
                    .table(DeviceAuthorizations::Table)
                    .col(DeviceAuthorizations::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_device_authorizations_status")
                    .table(DeviceAuthorizations::Table)
                    .col(DeviceAuthorizations::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DeviceAuthorizations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DeviceAuthorizations {
    Table,
    Id,
    ApplicationId,
    EnvironmentId,
    OrganizationId,
    ClientId,
    DeviceCode,
    UserCode,
    VerificationUri,
    Scope,
    Status,
    UserId,
    SessionId,
    Interval,
    PollCount,
    LastPolledAt,
    ExpiresAt,
    CreatedAt,
    UpdatedAt,
}
