// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{JobRecord, JobStatus, JobType};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 历史记录排序字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistorySortField {
    /// 按创建时间排序
    #[default]
    CreatedAt,
    /// 按完成时间排序
    CompletedAt,
}

/// 任务历史查询参数
#[derive(Debug, Clone)]
pub struct HistoryQueryParams {
    pub job_ids: Option<Vec<Uuid>>,
    pub job_types: Option<Vec<JobType>>,
    pub statuses: Option<Vec<JobStatus>>,
    pub created_after: Option<DateTime<FixedOffset>>,
    pub created_before: Option<DateTime<FixedOffset>>,
    pub sort_by: HistorySortField,
    pub sort_desc: bool,
    pub limit: u32,
    pub offset: u32,
}

impl Default for HistoryQueryParams {
    fn default() -> Self {
        Self {
            job_ids: None,
            job_types: None,
            statuses: None,
            created_after: None,
            created_before: None,
            sort_by: HistorySortField::CreatedAt,
            sort_desc: true,
            limit: 20,
            offset: 0,
        }
    }
}

/// 任务历史仓库特质
///
/// 定义任务历史记录的数据访问接口
#[async_trait]
pub trait JobHistoryRepository: Send + Sync {
    /// 插入新记录
    async fn insert(&self, record: &JobRecord) -> Result<JobRecord, RepositoryError>;
    /// 更新已有记录
    async fn update(&self, record: &JobRecord) -> Result<JobRecord, RepositoryError>;
    /// 根据任务ID查找记录
    async fn find_by_job_id(&self, job_id: Uuid) -> Result<Option<JobRecord>, RepositoryError>;
    /// 按条件分页查询历史记录，返回记录列表和满足条件的总数
    async fn query(
        &self,
        params: HistoryQueryParams,
    ) -> Result<(Vec<JobRecord>, u64), RepositoryError>;
    /// 删除单条记录，返回是否确实存在并被删除
    async fn delete_by_job_id(&self, job_id: Uuid) -> Result<bool, RepositoryError>;
    /// 批量删除记录，返回已删除和未找到的ID列表
    async fn delete_batch(
        &self,
        job_ids: Vec<Uuid>,
    ) -> Result<(Vec<Uuid>, Vec<Uuid>), RepositoryError>;
    /// 删除创建时间早于截止点的记录，返回删除数量
    async fn delete_older_than(
        &self,
        cutoff: DateTime<FixedOffset>,
    ) -> Result<u64, RepositoryError>;
    /// 按状态统计记录数量
    async fn count_by_status(&self) -> Result<Vec<(JobStatus, u64)>, RepositoryError>;
}
