// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 文章表迁移
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
                    .table(Articles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Articles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Articles::Url).string().not_null())
                    .col(
                        ColumnDef::new(Articles::Title)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Articles::Content).text().null())
                    .col(ColumnDef::new(Articles::SourceDomain).string().null())
                    .col(ColumnDef::new(Articles::Category).string().null())
                    .col(
                        ColumnDef::new(Articles::QualityLevel)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Articles::Sentiment).double().null())
                    .col(
                        ColumnDef::new(Articles::ViewCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Articles::LikeCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Articles::ShareCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Articles::HotScore)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Articles::HotScoreComputedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Articles::IngestedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Articles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_articles_url")
                    .table(Articles::Table)
                    .col(Articles::Url)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Ranked-list queries order by hot score and filter by category/ingest window
        manager
            .create_index(
                Index::create()
                    .name("idx_articles_hot_score")
                    .table(Articles::Table)
                    .col(Articles::HotScore)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_articles_category")
                    .table(Articles::Table)
                    .col(Articles::Category)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_articles_ingested_at")
                    .table(Articles::Table)
                    .col(Articles::IngestedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    /// 回滚数据库迁移
    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Articles::Table).to_owned())
            .await
    }
}

/// 文章表字段定义
#[derive(DeriveIden)]
enum Articles {
    Table,
    Id,
    Url,
    Title,
    Content,
    SourceDomain,
    Category,
    QualityLevel,
    Sentiment,
    ViewCount,
    LikeCount,
    ShareCount,
    HotScore,
    HotScoreComputedAt,
    IngestedAt,
    UpdatedAt,
}
