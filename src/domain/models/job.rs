// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 任务历史记录实体
///
/// 每个异步任务对应一条记录，由生命周期回调创建和推进。
/// 记录任务的类型、参数、状态机位置、重试次数以及最终结果，
/// 独立于具体由哪个工作者、哪次重试执行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// 任务唯一标识符，提交时由队列分配
    pub job_id: Uuid,
    /// 任务类型，决定任务体的执行逻辑
    pub job_type: JobType,
    /// 任务所在队列名称
    pub queue_name: String,
    /// 执行该任务的工作者标识（尚未被认领时为空）
    pub worker_id: Option<String>,
    /// 位置参数，原样记录用于审计和重放
    pub args: serde_json::Value,
    /// 关键字参数，原样记录用于审计和重放
    pub kwargs: serde_json::Value,
    /// 任务状态，跟踪任务在状态机中的当前位置
    pub status: JobStatus,
    /// 成功结果负载
    pub result: Option<serde_json::Value>,
    /// 失败时的错误消息
    pub error_message: Option<String>,
    /// 失败时的完整错误链文本，供运维诊断
    pub error_detail: Option<String>,
    /// 已重试次数，单调不减
    pub retry_count: i32,
    /// 记录创建时间
    pub created_at: DateTime<FixedOffset>,
    /// 最近一次开始执行的时间
    pub started_at: Option<DateTime<FixedOffset>>,
    /// 进入终态的时间，仅终态记录持有
    pub completed_at: Option<DateTime<FixedOffset>>,
    /// 记录最后更新时间
    pub updated_at: DateTime<FixedOffset>,
}

/// 任务类型枚举
///
/// 定义系统支持的异步任务类型，每种类型对应执行器中
/// 一个明确注册的处理分支，不做任何基于名称的模糊匹配。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// 抓取单个URL的内容
    #[default]
    FetchOne,
    /// 批量抓取，向队列扇出多个单项抓取任务后立即返回
    FetchBatch,
    /// 定时抓取，读取配置的内容源并派发批量抓取
    ScheduledFetch,
    /// 清理过期数据（文章或任务历史）
    Cleanup,
    /// 对已入库文章重新运行内容加工
    Reprocess,
    /// 批量重算热度分数
    RecomputeScores,
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobType::FetchOne => write!(f, "fetch_one"),
            JobType::FetchBatch => write!(f, "fetch_batch"),
            JobType::ScheduledFetch => write!(f, "scheduled_fetch"),
            JobType::Cleanup => write!(f, "cleanup"),
            JobType::Reprocess => write!(f, "reprocess"),
            JobType::RecomputeScores => write!(f, "recompute_scores"),
        }
    }
}

impl FromStr for JobType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fetch_one" => Ok(JobType::FetchOne),
            "fetch_batch" => Ok(JobType::FetchBatch),
            "scheduled_fetch" => Ok(JobType::ScheduledFetch),
            "cleanup" => Ok(JobType::Cleanup),
            "reprocess" => Ok(JobType::Reprocess),
            "recompute_scores" => Ok(JobType::RecomputeScores),
            _ => Err(()),
        }
    }
}

/// 任务状态枚举
///
/// 状态只沿固定的状态机向前推进，终态一旦写入不再改变：
/// Pending → Running → Success/Failure
/// Running → Retry → Running（重新认领）
/// Pending/Running/Retry → Revoked（外部取消）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// 已提交，尚未被任何工作者认领
    #[default]
    Pending,
    /// 正在执行
    Running,
    /// 成功结束（终态）
    Success,
    /// 失败结束，重试预算已耗尽或错误不可重试（终态）
    Failure,
    /// 本次尝试失败，已重新入队等待下次执行
    Retry,
    /// 被外部取消（终态）
    Revoked,
}

impl JobStatus {
    /// 判断是否为终态
    ///
    /// 终态记录不再接受任何后续状态变更
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Success | JobStatus::Failure | JobStatus::Revoked
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Success => write!(f, "success"),
            JobStatus::Failure => write!(f, "failure"),
            JobStatus::Retry => write!(f, "retry"),
            JobStatus::Revoked => write!(f, "revoked"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "success" => Ok(JobStatus::Success),
            "failure" => Ok(JobStatus::Failure),
            "retry" => Ok(JobStatus::Retry),
            "revoked" => Ok(JobStatus::Revoked),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
///
/// 表示领域层可能发生的错误情况，包括状态转换错误和验证失败。
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换，当记录状态推进不符合状态机规则时发生
    #[error("Invalid state transition")]
    InvalidStateTransition,

    /// 验证错误，当输入数据不符合领域规则时发生
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl JobRecord {
    /// 创建一条新的任务记录
    ///
    /// # 参数
    ///
    /// * `job_id` - 队列分配的任务标识
    /// * `job_type` - 任务类型
    /// * `queue_name` - 队列名称
    /// * `args` - 位置参数
    /// * `kwargs` - 关键字参数
    ///
    /// # 返回值
    ///
    /// 返回处于Pending状态的新记录
    pub fn new(
        job_id: Uuid,
        job_type: JobType,
        queue_name: String,
        args: serde_json::Value,
        kwargs: serde_json::Value,
    ) -> Self {
        Self {
            job_id,
            job_type,
            queue_name,
            worker_id: None,
            args,
            kwargs,
            status: JobStatus::Pending,
            result: None,
            error_message: None,
            error_detail: None,
            retry_count: 0,
            created_at: Utc::now().into(),
            started_at: None,
            completed_at: None,
            updated_at: Utc::now().into(),
        }
    }

    /// 标记任务开始执行
    ///
    /// Pending/Retry状态正常推进到Running；Running状态表示上一次
    /// 执行的终态回调丢失（进程崩溃后重新投递），同样重置为Running
    /// 并刷新started_at。retry_count取当前值与尝试序号的较大者，
    /// 保证回调重复送达时结果不变。
    ///
    /// # 参数
    ///
    /// * `worker_id` - 认领任务的工作者标识
    /// * `attempt` - 本次投递的尝试序号，首次执行为0
    ///
    /// # 返回值
    ///
    /// * `Ok(JobRecord)` - 推进后的记录
    /// * `Err(DomainError)` - 记录已处于终态
    pub fn start(mut self, worker_id: &str, attempt: i32) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Pending | JobStatus::Retry | JobStatus::Running => {
                self.status = JobStatus::Running;
                self.worker_id = Some(worker_id.to_string());
                self.retry_count = self.retry_count.max(attempt);
                self.started_at = Some(Utc::now().into());
                self.updated_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 标记任务成功结束
    ///
    /// 允许从Retry直接到Success：重试后的开始回调可能丢失，
    /// 但终态回调仍然到达。
    ///
    /// # 返回值
    ///
    /// * `Ok(JobRecord)` - 进入Success终态的记录
    /// * `Err(DomainError)` - 状态转换失败
    pub fn succeed(mut self, result: Option<serde_json::Value>) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Running | JobStatus::Retry | JobStatus::Pending => {
                self.status = JobStatus::Success;
                self.result = result;
                self.completed_at = Some(Utc::now().into());
                self.updated_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 标记任务失败结束
    ///
    /// # 参数
    ///
    /// * `message` - 错误消息
    /// * `detail` - 完整错误链文本
    ///
    /// # 返回值
    ///
    /// * `Ok(JobRecord)` - 进入Failure终态的记录
    /// * `Err(DomainError)` - 状态转换失败
    pub fn fail(mut self, message: &str, detail: Option<&str>) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Running | JobStatus::Retry | JobStatus::Pending => {
                self.status = JobStatus::Failure;
                self.error_message = Some(message.to_string());
                self.error_detail = detail.map(|d| d.to_string());
                self.completed_at = Some(Utc::now().into());
                self.updated_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 标记本次尝试失败并等待重试
    ///
    /// 不设置completed_at，记录仍处于活跃生命周期。
    ///
    /// # 参数
    ///
    /// * `message` - 触发重试的错误消息
    /// * `next_attempt` - 即将投递的尝试序号
    ///
    /// # 返回值
    ///
    /// * `Ok(JobRecord)` - 进入Retry状态的记录
    /// * `Err(DomainError)` - 状态转换失败
    pub fn mark_retry(mut self, message: &str, next_attempt: i32) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Running | JobStatus::Pending => {
                self.status = JobStatus::Retry;
                self.error_message = Some(message.to_string());
                self.retry_count = self.retry_count.max(next_attempt);
                self.updated_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 标记任务被取消
    ///
    /// 取消是尽力而为的：无论执行端是否真正停止，
    /// 记录都立即进入Revoked终态并写入completed_at。
    ///
    /// # 返回值
    ///
    /// * `Ok(JobRecord)` - 进入Revoked终态的记录
    /// * `Err(DomainError)` - 记录已处于其他终态
    pub fn revoke(mut self) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Pending | JobStatus::Running | JobStatus::Retry => {
                self.status = JobStatus::Revoked;
                self.completed_at = Some(Utc::now().into());
                self.updated_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }
}
