//! Function calls table migration

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FunctionCalls::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FunctionCalls::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FunctionCalls::CorrelationId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FunctionCalls::FunctionName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(FunctionCalls::ArgumentsJson).text().not_null())
                    .col(ColumnDef::new(FunctionCalls::ResultJson).text())
                    .col(ColumnDef::new(FunctionCalls::ErrorKind).string_len(40))
                    .col(
                        ColumnDef::new(FunctionCalls::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FunctionCalls::FinishedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_function_calls_correlation_id")
                    .table(FunctionCalls::Table)
                    .col(FunctionCalls::CorrelationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_function_calls_function_name")
                    .table(FunctionCalls::Table)
                    .col(FunctionCalls::FunctionName)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FunctionCalls::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FunctionCalls {
    Table,
    Id,
    CorrelationId,
    FunctionName,
    ArgumentsJson,
    ResultJson,
    ErrorKind,
    StartedAt,
    FinishedAt,
}
