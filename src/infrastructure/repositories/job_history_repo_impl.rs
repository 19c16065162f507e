// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::job::{JobRecord, JobStatus};
use crate::domain::repositories::job_history_repository::{
    HistoryQueryParams, HistorySortField, JobHistoryRepository, RepositoryError,
};
use crate::infrastructure::database::entities::job_record as job_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 任务历史仓库实现
///
/// 基于SeaORM实现的任务历史数据访问层
#[derive(Clone)]
pub struct JobHistoryRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl JobHistoryRepositoryImpl {
    /// 创建新的任务历史仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<job_entity::Model> for JobRecord {
    fn from(model: job_entity::Model) -> Self {
        Self {
            job_id: model.job_id,
            job_type: model.job_type.parse().unwrap_or_default(),
            queue_name: model.queue_name,
            worker_id: model.worker_id,
            args: model.args,
            kwargs: model.kwargs,
            status: model.status.parse().unwrap_or_default(),
            result: model.result,
            error_message: model.error_message,
            error_detail: model.error_detail,
            retry_count: model.retry_count,
            created_at: model.created_at,
            started_at: model.started_at,
            completed_at: model.completed_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<JobRecord> for job_entity::ActiveModel {
    fn from(record: JobRecord) -> Self {
        Self {
            job_id: Set(record.job_id),
            job_type: Set(record.job_type.to_string()),
            queue_name: Set(record.queue_name.clone()),
            worker_id: Set(record.worker_id.clone()),
            args: Set(record.args.clone()),
            kwargs: Set(record.kwargs.clone()),
            status: Set(record.status.to_string()),
            result: Set(record.result.clone()),
            error_message: Set(record.error_message.clone()),
            error_detail: Set(record.error_detail.clone()),
            retry_count: Set(record.retry_count),
            created_at: Set(record.created_at),
            started_at: Set(record.started_at),
            completed_at: Set(record.completed_at),
            updated_at: Set(record.updated_at),
        }
    }
}

/// 按查询参数拼装过滤条件
fn apply_filters(
    mut query: sea_orm::Select<job_entity::Entity>,
    params: &HistoryQueryParams,
) -> sea_orm::Select<job_entity::Entity> {
    if let Some(job_ids) = &params.job_ids {
        query = query.filter(job_entity::Column::JobId.is_in(job_ids.clone()));
    }
    if let Some(job_types) = &params.job_types {
        let names: Vec<String> = job_types.iter().map(|t| t.to_string()).collect();
        query = query.filter(job_entity::Column::JobType.is_in(names));
    }
    if let Some(statuses) = &params.statuses {
        let names: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
        query = query.filter(job_entity::Column::Status.is_in(names));
    }
    if let Some(created_after) = params.created_after {
        query = query.filter(job_entity::Column::CreatedAt.gte(created_after));
    }
    if let Some(created_before) = params.created_before {
        query = query.filter(job_entity::Column::CreatedAt.lte(created_before));
    }
    query
}

#[async_trait]
impl JobHistoryRepository for JobHistoryRepositoryImpl {
    async fn insert(&self, record: &JobRecord) -> Result<JobRecord, RepositoryError> {
        let model: job_entity::ActiveModel = record.clone().into();
        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn update(&self, record: &JobRecord) -> Result<JobRecord, RepositoryError> {
        let model: job_entity::ActiveModel = record.clone().into();
        let updated = model.update(self.db.as_ref()).await?;
        Ok(updated.into())
    }

    async fn find_by_job_id(&self, job_id: Uuid) -> Result<Option<JobRecord>, RepositoryError> {
        let model = job_entity::Entity::find_by_id(job_id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn query(
        &self,
        params: HistoryQueryParams,
    ) -> Result<(Vec<JobRecord>, u64), RepositoryError> {
        let filtered = apply_filters(job_entity::Entity::find(), &params);
        let total = filtered.clone().count(self.db.as_ref()).await?;

        let sort_column = match params.sort_by {
            HistorySortField::CreatedAt => job_entity::Column::CreatedAt,
            HistorySortField::CompletedAt => job_entity::Column::CompletedAt,
        };
        let ordered = if params.sort_desc {
            filtered.order_by_desc(sort_column)
        } else {
            filtered.order_by_asc(sort_column)
        };

        let models = ordered
            .offset(params.offset as u64)
            .limit(params.limit as u64)
            .all(self.db.as_ref())
            .await?;

        Ok((models.into_iter().map(JobRecord::from).collect(), total))
    }

    async fn delete_by_job_id(&self, job_id: Uuid) -> Result<bool, RepositoryError> {
        let result = job_entity::Entity::delete_by_id(job_id)
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_batch(
        &self,
        job_ids: Vec<Uuid>,
    ) -> Result<(Vec<Uuid>, Vec<Uuid>), RepositoryError> {
        let mut deleted = Vec::new();
        let mut missing = Vec::new();
        for job_id in job_ids {
            if self.delete_by_job_id(job_id).await? {
                deleted.push(job_id);
            } else {
                missing.push(job_id);
            }
        }
        Ok((deleted, missing))
    }

    async fn delete_older_than(
        &self,
        cutoff: DateTime<FixedOffset>,
    ) -> Result<u64, RepositoryError> {
        let result = job_entity::Entity::delete_many()
            .filter(job_entity::Column::CreatedAt.lt(cutoff))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    async fn count_by_status(&self) -> Result<Vec<(JobStatus, u64)>, RepositoryError> {
        let rows: Vec<(String, i64)> = job_entity::Entity::find()
            .select_only()
            .column(job_entity::Column::Status)
            .column_as(job_entity::Column::JobId.count(), "count")
            .group_by(job_entity::Column::Status)
            .into_tuple()
            .all(self.db.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(status, count)| {
                status
                    .parse::<JobStatus>()
                    .ok()
                    .map(|s| (s, count.max(0) as u64))
            })
            .collect())
    }
}
