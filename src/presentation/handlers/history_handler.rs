// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::history_request::{
    DeleteBatchRequestDto, DeleteBatchResponseDto, HistoryCleanupRequestDto, HistoryDetailDto,
    HistoryListDto, HistoryQueryDto, HistorySummaryDto,
};
use crate::application::dto::job_request::JobSubmittedDto;
use crate::config::settings::Settings;
use crate::domain::models::envelope::JobEnvelope;
use crate::domain::models::job::{JobStatus, JobType};
use crate::domain::repositories::job_history_repository::{
    HistoryQueryParams, HistorySortField, JobHistoryRepository, RepositoryError,
};
use crate::presentation::errors::AppError;
use crate::presentation::handlers::job_handler::submit_queue;
use crate::queue::job_queue::JobBroker;
use anyhow;
use axum::extract::{Extension, Path, Query};
use axum::Json;
use chrono::{Duration, Utc};
use metrics::counter;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// 历史记录列表查询处理器
pub async fn list_history<H: JobHistoryRepository>(
    Extension(history_repo): Extension<Arc<H>>,
    Query(request): Query<HistoryQueryDto>,
) -> Result<Json<HistoryListDto>, AppError> {
    // 验证请求参数
    if let Err(errors) = request.validate() {
        return Err(AppError::from(anyhow::anyhow!(
            "Validation error: {:?}",
            errors
        )));
    }

    // 过滤条件的字符串解析失败按参数错误处理
    let statuses = match &request.status {
        Some(raw) => {
            let status = raw.parse::<JobStatus>().map_err(|_| {
                AppError::from(anyhow::anyhow!("invalid status filter: {}", raw))
            })?;
            Some(vec![status])
        }
        None => None,
    };
    let job_types = match &request.job_type {
        Some(raw) => {
            let job_type = raw.parse::<JobType>().map_err(|_| {
                AppError::from(anyhow::anyhow!("invalid job_type filter: {}", raw))
            })?;
            Some(vec![job_type])
        }
        None => None,
    };
    let sort_by = match request.sort.as_deref() {
        None | Some("created_at") => HistorySortField::CreatedAt,
        Some("completed_at") => HistorySortField::CompletedAt,
        Some(other) => {
            return Err(AppError::from(anyhow::anyhow!(
                "invalid sort field: {}",
                other
            )));
        }
    };

    let created_after = request
        .hours
        .map(|hours| (Utc::now() - Duration::hours(hours)).into());

    let page = request.page.unwrap_or(1);
    let page_size = request.page_size.unwrap_or(20);

    let (records, total) = history_repo
        .query(HistoryQueryParams {
            statuses,
            job_types,
            created_after,
            sort_by,
            limit: page_size,
            offset: (page - 1) * page_size,
            ..Default::default()
        })
        .await?;

    Ok(Json(HistoryListDto {
        records: records.iter().map(HistorySummaryDto::from).collect(),
        total,
        page,
        page_size,
    }))
}

/// 历史记录详情查询处理器
pub async fn get_history_detail<H: JobHistoryRepository>(
    Extension(history_repo): Extension<Arc<H>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<HistoryDetailDto>, AppError> {
    let record = history_repo
        .find_by_job_id(job_id)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    Ok(Json(HistoryDetailDto::from(record)))
}

/// 单条历史记录删除处理器
pub async fn delete_history<H: JobHistoryRepository>(
    Extension(history_repo): Extension<Arc<H>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !history_repo.delete_by_job_id(job_id).await? {
        return Err(RepositoryError::NotFound.into());
    }
    info!(job_id = %job_id, "History record deleted");

    Ok(Json(json!({ "job_id": job_id, "deleted": true })))
}

/// 历史记录批量删除处理器
pub async fn delete_history_batch<H: JobHistoryRepository>(
    Extension(history_repo): Extension<Arc<H>>,
    Json(request): Json<DeleteBatchRequestDto>,
) -> Result<Json<DeleteBatchResponseDto>, AppError> {
    // 验证请求参数
    if let Err(errors) = request.validate() {
        return Err(AppError::from(anyhow::anyhow!(
            "Validation error: {:?}",
            errors
        )));
    }

    // 验证任务ID列表不为空
    if request.job_ids.is_empty() {
        return Err(AppError::from(anyhow::anyhow!("Job IDs cannot be empty")));
    }

    let (deleted, missing) = history_repo.delete_batch(request.job_ids).await?;
    info!(
        deleted = deleted.len(),
        missing = missing.len(),
        "History records batch deleted"
    );

    Ok(Json(DeleteBatchResponseDto { deleted, missing }))
}

/// 历史记录清理提交处理器
///
/// 清理本身由工作者异步执行，这里只负责投递Cleanup任务。
pub async fn cleanup_history<B: JobBroker>(
    Extension(broker): Extension<Arc<B>>,
    Extension(settings): Extension<Arc<Settings>>,
    Json(request): Json<HistoryCleanupRequestDto>,
) -> Result<Json<JobSubmittedDto>, AppError> {
    // 验证请求参数
    if let Err(errors) = request.validate() {
        return Err(AppError::from(anyhow::anyhow!(
            "Validation error: {:?}",
            errors
        )));
    }

    let days = request.days.unwrap_or(settings.retention.history_days);
    let queue = submit_queue(&settings);
    let envelope = JobEnvelope::new(
        JobType::Cleanup,
        queue.clone(),
        json!({ "days": days, "target": "history" }),
    );
    broker.enqueue(&envelope).await?;
    counter!("jobs_submitted_total").increment(1);
    info!(job_id = %envelope.job_id, days, "History cleanup job submitted");

    Ok(Json(JobSubmittedDto {
        job_id: envelope.job_id,
        job_type: JobType::Cleanup,
        queue,
        status: JobStatus::Pending.to_string(),
    }))
}
