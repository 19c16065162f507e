// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::job::{JobRecord, JobStatus, JobType};

/// 历史记录列表查询DTO
#[derive(Debug, Default, Deserialize, Validate)]
pub struct HistoryQueryDto {
    /// 按状态过滤
    pub status: Option<String>,
    /// 按任务类型过滤
    pub job_type: Option<String>,
    /// 只看最近N小时内创建的记录
    #[validate(range(min = 1, max = 8760))]
    pub hours: Option<i64>,
    /// 页码，从1开始
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// 每页条数
    #[validate(range(min = 1, max = 100))]
    pub page_size: Option<u32>,
    /// 排序字段：created_at或completed_at
    pub sort: Option<String>,
}

/// 历史记录列表响应DTO
#[derive(Debug, Serialize)]
pub struct HistoryListDto {
    pub records: Vec<HistorySummaryDto>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// 历史记录摘要DTO，列表视图使用
#[derive(Debug, Serialize)]
pub struct HistorySummaryDto {
    pub job_id: Uuid,
    pub job_type: JobType,
    pub queue_name: String,
    pub status: JobStatus,
    pub retry_count: i32,
    pub worker_id: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub error_message: Option<String>,
}

impl From<&JobRecord> for HistorySummaryDto {
    fn from(record: &JobRecord) -> Self {
        Self {
            job_id: record.job_id,
            job_type: record.job_type,
            queue_name: record.queue_name.clone(),
            status: record.status,
            retry_count: record.retry_count,
            worker_id: record.worker_id.clone(),
            created_at: record.created_at,
            started_at: record.started_at,
            completed_at: record.completed_at,
            error_message: record.error_message.clone(),
        }
    }
}

/// 历史记录详情DTO，在摘要基础上带参数和结果负载
#[derive(Debug, Serialize)]
pub struct HistoryDetailDto {
    pub job_id: Uuid,
    pub job_type: JobType,
    pub queue_name: String,
    pub status: JobStatus,
    pub retry_count: i32,
    pub worker_id: Option<String>,
    pub args: serde_json::Value,
    pub kwargs: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub error_detail: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<JobRecord> for HistoryDetailDto {
    fn from(record: JobRecord) -> Self {
        Self {
            job_id: record.job_id,
            job_type: record.job_type,
            queue_name: record.queue_name,
            status: record.status,
            retry_count: record.retry_count,
            worker_id: record.worker_id,
            args: record.args,
            kwargs: record.kwargs,
            result: record.result,
            error_message: record.error_message,
            error_detail: record.error_detail,
            created_at: record.created_at,
            started_at: record.started_at,
            completed_at: record.completed_at,
            updated_at: record.updated_at,
        }
    }
}

/// 批量删除历史请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct DeleteBatchRequestDto {
    /// 待删除的任务ID列表
    #[validate(length(min = 1, max = 100))]
    pub job_ids: Vec<Uuid>,
}

/// 批量删除历史响应DTO
#[derive(Debug, Serialize)]
pub struct DeleteBatchResponseDto {
    pub deleted: Vec<Uuid>,
    pub missing: Vec<Uuid>,
}

/// 历史清理请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct HistoryCleanupRequestDto {
    /// 保留天数
    #[validate(range(min = 1, max = 3650))]
    pub days: Option<u32>,
}
