// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 任务历史表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    /// 应用数据库迁移
    ///
    /// # 参数
    ///
    /// * `manager` - 数据库模式管理器
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 迁移成功
    /// * `Err(DbErr)` - 迁移失败
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JobHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JobHistory::JobId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JobHistory::JobType).string().not_null())
                    .col(ColumnDef::new(JobHistory::QueueName).string().not_null())
                    .col(ColumnDef::new(JobHistory::WorkerId).string().null())
                    .col(ColumnDef::new(JobHistory::Args).json().not_null())
                    .col(ColumnDef::new(JobHistory::Kwargs).json().not_null())
                    .col(ColumnDef::new(JobHistory::Status).string().not_null())
                    .col(ColumnDef::new(JobHistory::Result).json().null())
                    .col(ColumnDef::new(JobHistory::ErrorMessage).text().null())
                    .col(ColumnDef::new(JobHistory::ErrorDetail).text().null())
                    .col(
                        ColumnDef::new(JobHistory::RetryCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(JobHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(JobHistory::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(JobHistory::CompletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(JobHistory::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Indexes for history listing and retention cleanup
        manager
            .create_index(
                Index::create()
                    .name("idx_job_history_created_at")
                    .table(JobHistory::Table)
                    .col(JobHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_history_status_created")
                    .table(JobHistory::Table)
                    .col(JobHistory::Status)
                    .col(JobHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_history_type")
                    .table(JobHistory::Table)
                    .col(JobHistory::JobType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    /// 回滚数据库迁移
    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JobHistory::Table).to_owned())
            .await
    }
}

/// 任务历史表字段定义
#[derive(DeriveIden)]
enum JobHistory {
    Table,
    JobId,
    JobType,
    QueueName,
    WorkerId,
    Args,
    Kwargs,
    Status,
    Result,
    ErrorMessage,
    ErrorDetail,
    RetryCount,
    CreatedAt,
    StartedAt,
    CompletedAt,
    UpdatedAt,
}
