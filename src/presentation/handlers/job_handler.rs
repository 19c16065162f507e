// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::job_request::{
    CancelResponseDto, FetchBatchRequestDto, FetchRequestDto, JobStatusDto, JobSubmittedDto,
    ReprocessRequestDto,
};
use crate::config::settings::Settings;
use crate::domain::models::envelope::JobEnvelope;
use crate::domain::models::job::{JobStatus, JobType};
use crate::domain::repositories::job_history_repository::JobHistoryRepository;
use crate::domain::services::lifecycle::LifecycleRecorder;
use crate::presentation::errors::AppError;
use crate::queue::job_queue::JobBroker;
use anyhow;
use axum::extract::{Extension, Path};
use axum::Json;
use metrics::counter;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// 选取提交队列：配置的第一个队列，未配置时回退到default
pub(crate) fn submit_queue(settings: &Settings) -> String {
    settings
        .workers
        .queues
        .first()
        .cloned()
        .unwrap_or_else(|| "default".to_string())
}

/// 单项抓取提交处理器
///
/// 只投递信封，不写历史记录：记录在工作者领取后补建，
/// 查询时无记录即视为pending。
pub async fn submit_fetch<B: JobBroker>(
    Extension(broker): Extension<Arc<B>>,
    Extension(settings): Extension<Arc<Settings>>,
    Json(request): Json<FetchRequestDto>,
) -> Result<Json<JobSubmittedDto>, AppError> {
    // 验证请求参数
    if let Err(errors) = request.validate() {
        return Err(AppError::from(anyhow::anyhow!(
            "Validation error: {:?}",
            errors
        )));
    }

    let queue = submit_queue(&settings);
    let envelope = JobEnvelope::new(
        JobType::FetchOne,
        queue.clone(),
        json!({ "url": request.url, "source_name": request.source_name }),
    );
    broker.enqueue(&envelope).await?;
    counter!("jobs_submitted_total").increment(1);
    info!(job_id = %envelope.job_id, url = %request.url, "Fetch job submitted");

    Ok(Json(JobSubmittedDto {
        job_id: envelope.job_id,
        job_type: JobType::FetchOne,
        queue,
        status: JobStatus::Pending.to_string(),
    }))
}

/// 批量抓取提交处理器
///
/// 提交一个FetchBatch任务，由工作者负责展开成子任务。
pub async fn submit_fetch_batch<B: JobBroker>(
    Extension(broker): Extension<Arc<B>>,
    Extension(settings): Extension<Arc<Settings>>,
    Json(request): Json<FetchBatchRequestDto>,
) -> Result<Json<JobSubmittedDto>, AppError> {
    // 验证请求参数
    if let Err(errors) = request.validate() {
        return Err(AppError::from(anyhow::anyhow!(
            "Validation error: {:?}",
            errors
        )));
    }

    // 验证URL列表不为空
    if request.urls.is_empty() {
        return Err(AppError::from(anyhow::anyhow!("URLs cannot be empty")));
    }

    let queue = submit_queue(&settings);
    let envelope = JobEnvelope::new(
        JobType::FetchBatch,
        queue.clone(),
        json!({ "urls": request.urls }),
    );
    broker.enqueue(&envelope).await?;
    counter!("jobs_submitted_total").increment(1);
    info!(job_id = %envelope.job_id, urls = request.urls.len(), "Batch fetch job submitted");

    Ok(Json(JobSubmittedDto {
        job_id: envelope.job_id,
        job_type: JobType::FetchBatch,
        queue,
        status: JobStatus::Pending.to_string(),
    }))
}

/// 重新加工提交处理器
pub async fn submit_reprocess<B: JobBroker>(
    Extension(broker): Extension<Arc<B>>,
    Extension(settings): Extension<Arc<Settings>>,
    Json(request): Json<ReprocessRequestDto>,
) -> Result<Json<JobSubmittedDto>, AppError> {
    // 验证请求参数
    if let Err(errors) = request.validate() {
        return Err(AppError::from(anyhow::anyhow!(
            "Validation error: {:?}",
            errors
        )));
    }

    // 验证文章ID列表不为空
    if request.article_ids.is_empty() {
        return Err(AppError::from(anyhow::anyhow!(
            "Article IDs cannot be empty"
        )));
    }

    let queue = submit_queue(&settings);
    let envelope = JobEnvelope::new(
        JobType::Reprocess,
        queue.clone(),
        json!({ "article_ids": request.article_ids }),
    );
    broker.enqueue(&envelope).await?;
    counter!("jobs_submitted_total").increment(1);
    info!(
        job_id = %envelope.job_id,
        articles = request.article_ids.len(),
        "Reprocess job submitted"
    );

    Ok(Json(JobSubmittedDto {
        job_id: envelope.job_id,
        job_type: JobType::Reprocess,
        queue,
        status: JobStatus::Pending.to_string(),
    }))
}

/// 任务状态查询处理器
///
/// 无记录的任务对外表现为pending：提交成功但尚未被工作者
/// 领取的任务就处于这个阶段。
pub async fn get_job_status<H: JobHistoryRepository>(
    Extension(history_repo): Extension<Arc<H>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatusDto>, AppError> {
    let dto = match history_repo.find_by_job_id(job_id).await? {
        None => JobStatusDto {
            job_id,
            status: JobStatus::Pending.to_string(),
            ready: false,
            successful: None,
            result: None,
            error_message: None,
            retry_count: 0,
        },
        Some(record) => {
            let ready = record.status.is_terminal();
            JobStatusDto {
                job_id,
                status: record.status.to_string(),
                ready,
                successful: ready.then(|| record.status == JobStatus::Success),
                result: record.result,
                error_message: record.error_message,
                retry_count: record.retry_count,
            }
        }
    };

    Ok(Json(dto))
}

/// 任务取消处理器
///
/// 尽力而为的取消：仍在排队的信封被直接摘除并落Revoked终态；
/// 信封不可得时标记撤销集合，排队外的信封在下次领取时被丢弃，
/// 正在执行的任务不被强制打断，但其迟到的终态回调无法覆盖
/// Revoked结果。
pub async fn cancel_job<B: JobBroker, H: JobHistoryRepository>(
    Extension(broker): Extension<Arc<B>>,
    Extension(recorder): Extension<Arc<LifecycleRecorder<H>>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<CancelResponseDto>, AppError> {
    if let Some(envelope) = broker.take_queued(job_id).await? {
        recorder.record_revoked(&envelope).await?;
        counter!("jobs_revoked_total").increment(1);
        info!(job_id = %job_id, "Queued job revoked");
        return Ok(Json(CancelResponseDto {
            job_id,
            status: JobStatus::Revoked.to_string(),
            was_queued: true,
        }));
    }

    broker.revoke(job_id).await?;
    let status = match recorder.revoke_by_id(job_id).await? {
        Some(status) => status.to_string(),
        None => JobStatus::Pending.to_string(),
    };
    info!(job_id = %job_id, status = %status, "Job revocation requested");

    Ok(Json(CancelResponseDto {
        job_id,
        status,
        was_queued: false,
    }))
}
