// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::job::JobType;

/// 单项抓取提交请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct FetchRequestDto {
    /// 要抓取的URL
    #[validate(url)]
    pub url: String,
    /// 来源名称，可选
    pub source_name: Option<String>,
}

/// 批量抓取提交请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct FetchBatchRequestDto {
    /// 要抓取的URL列表
    #[validate(length(min = 1, max = 100))]
    pub urls: Vec<String>,
}

/// 重新加工提交请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ReprocessRequestDto {
    /// 待重新加工的文章ID列表
    #[validate(length(min = 1, max = 100))]
    pub article_ids: Vec<Uuid>,
}

/// 任务提交响应DTO
#[derive(Debug, Serialize)]
pub struct JobSubmittedDto {
    pub job_id: Uuid,
    pub job_type: JobType,
    pub queue: String,
    pub status: String,
}

/// 任务状态查询响应DTO
///
/// 无历史记录的任务视为等待执行：ready为false，
/// successful与result缺省。
#[derive(Debug, Serialize)]
pub struct JobStatusDto {
    pub job_id: Uuid,
    pub status: String,
    /// 是否已进入终态
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successful: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub retry_count: i32,
}

/// 任务取消响应DTO
#[derive(Debug, Serialize)]
pub struct CancelResponseDto {
    pub job_id: Uuid,
    /// 取消后的任务状态
    pub status: String,
    /// 取消时任务是否仍在排队（为真时信封已被摘除）
    pub was_queued: bool,
}
