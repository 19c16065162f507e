// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use thiserror::Error;

use crate::domain::repositories::job_history_repository::RepositoryError;
use crate::domain::services::fetcher::FetchError;
use crate::queue::job_queue::BrokerError;

/// 任务执行错误分类
///
/// 执行器据此决定一次失败的走向：瞬时错误和超时进入重试，
/// 校验错误与目标缺失立即失败。分类在错误产生处完成，
/// 执行器不检查错误文本。
#[derive(Error, Debug)]
pub enum JobError {
    /// 执行超过时间上限
    #[error("Job timed out after {0:?}")]
    Timeout(Duration),

    /// 瞬时错误（网络、下游I/O、服务端5xx），重试可能成功
    #[error("Transient error: {0}")]
    Transient(#[source] anyhow::Error),

    /// 参数或输入校验失败，重试不可能成功
    #[error("Validation error: {0}")]
    Validation(String),

    /// 目标资源不存在
    #[error("Not found: {0}")]
    NotFound(String),
}

impl JobError {
    /// 判断该错误是否值得重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::Timeout(_) | JobError::Transient(_))
    }

    /// 完整错误链文本，供历史记录的诊断字段使用
    pub fn detail(&self) -> Option<String> {
        match self {
            JobError::Transient(e) => Some(format!("{:?}", e)),
            _ => None,
        }
    }
}

impl From<FetchError> for JobError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::InvalidUrl(_) | FetchError::EmptyContent(_) | FetchError::Processing(_) => {
                JobError::Validation(e.to_string())
            }
            other if other.is_transient() => JobError::Transient(other.into()),
            other => JobError::Validation(other.to_string()),
        }
    }
}

impl From<RepositoryError> for JobError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => JobError::NotFound("record not found".to_string()),
            other => JobError::Transient(other.into()),
        }
    }
}

impl From<BrokerError> for JobError {
    fn from(e: BrokerError) -> Self {
        match e {
            BrokerError::Malformed(e) => JobError::Validation(e.to_string()),
            other => JobError::Transient(other.into()),
        }
    }
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("队列错误: {0}")]
    BrokerError(String),

    #[error("仓库错误: {0}")]
    RepositoryError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}
