// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::job::JobType;

/// 任务信封
///
/// 经由队列在生产者和工作者之间传递的投递单元。参数以JSON
/// 原样携带，类型分发只依据显式的job_type标签。attempt从0开始，
/// 每次重试投递加一。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEnvelope {
    /// 任务唯一标识符，提交时分配
    pub job_id: Uuid,
    /// 任务类型标签
    pub job_type: JobType,
    /// 目标队列名称
    pub queue_name: String,
    /// 尝试序号，首次投递为0
    pub attempt: i32,
    /// 位置参数
    pub args: serde_json::Value,
    /// 关键字参数
    pub kwargs: serde_json::Value,
    /// 提交时间
    pub submitted_at: DateTime<FixedOffset>,
}

impl JobEnvelope {
    /// 创建一个首次投递的任务信封
    ///
    /// # 参数
    ///
    /// * `job_type` - 任务类型
    /// * `queue_name` - 目标队列
    /// * `kwargs` - 关键字参数
    pub fn new(job_type: JobType, queue_name: String, kwargs: serde_json::Value) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            job_type,
            queue_name,
            attempt: 0,
            args: serde_json::Value::Array(vec![]),
            kwargs,
            submitted_at: Utc::now().into(),
        }
    }

    /// 生成下一次重试的信封
    ///
    /// 保持job_id和参数不变，尝试序号加一。
    pub fn next_attempt(mut self) -> Self {
        self.attempt += 1;
        self
    }
}

/// 单项抓取任务参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOneParams {
    /// 要抓取的URL
    pub url: String,
    /// 来源名称，可选
    #[serde(default)]
    pub source_name: Option<String>,
}

/// 批量抓取任务参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchBatchParams {
    /// 要抓取的URL列表
    pub urls: Vec<String>,
}

/// 清理目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CleanupTarget {
    /// 清理低质量的过期文章
    #[default]
    Articles,
    /// 清理过期的任务历史记录
    History,
}

/// 清理任务参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupParams {
    /// 保留天数，早于该窗口的数据被删除
    #[serde(default = "default_cleanup_days")]
    pub days: u32,
    /// 清理目标
    #[serde(default)]
    pub target: CleanupTarget,
}

fn default_cleanup_days() -> u32 {
    90
}

/// 重新加工任务参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReprocessParams {
    /// 待重新加工的文章ID列表
    pub article_ids: Vec<Uuid>,
}

/// 批量重算分数任务参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecomputeParams {
    /// 回溯窗口天数
    #[serde(default = "default_recompute_days")]
    pub days_back: u32,
}

fn default_recompute_days() -> u32 {
    7
}
