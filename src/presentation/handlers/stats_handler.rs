// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::stats_response::{QueueDepthDto, QueueStatsDto};
use crate::domain::repositories::job_history_repository::JobHistoryRepository;
use crate::presentation::errors::AppError;
use crate::queue::job_queue::JobBroker;
use axum::extract::Extension;
use axum::Json;
use std::sync::Arc;

/// 队列状态查询处理器
///
/// 汇总代理侧的积压情况和历史记录的状态分布。
pub async fn queue_stats<B: JobBroker, H: JobHistoryRepository>(
    Extension(broker): Extension<Arc<B>>,
    Extension(history_repo): Extension<Arc<H>>,
) -> Result<Json<QueueStatsDto>, AppError> {
    let depths = broker.queue_depths().await?;
    let delayed = broker.delayed_count().await?;
    let status_counts = history_repo.count_by_status().await?;

    let queues = depths
        .into_iter()
        .map(|(name, depth)| QueueDepthDto { name, depth })
        .collect();
    let statuses = status_counts
        .into_iter()
        .map(|(status, count)| (status.to_string(), count))
        .collect();

    Ok(Json(QueueStatsDto {
        queues,
        delayed,
        statuses,
    }))
}
