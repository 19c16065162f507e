// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use crate::domain::models::job::JobType;
use crate::utils::errors::JobError;

/// 重试策略配置
///
/// 退避时间为基础延迟乘以尝试序号，单调不减；超时错误使用
/// 比其他瞬时错误更长的基础延迟。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大重试次数（不含首次执行）
    pub max_retries: i32,
    /// 超时错误的基础退避时间
    pub timeout_base: Duration,
    /// 其他瞬时错误的基础退避时间
    pub transient_base: Duration,
    /// 抖动因子 (0.0-1.0)
    pub jitter_factor: f64,
    /// 是否启用抖动
    pub enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout_base: Duration::from_secs(60),
            transient_base: Duration::from_secs(30),
            jitter_factor: 0.1,
            enable_jitter: true,
        }
    }
}

impl RetryPolicy {
    /// 按任务类型取重试策略
    ///
    /// 只有单项抓取带重试预算：批量派发重跑会重复扇出子任务，
    /// 维护类任务由定时器按节奏重新触发。
    pub fn for_job_type(job_type: JobType) -> Self {
        match job_type {
            JobType::FetchOne => Self::default(),
            _ => Self {
                max_retries: 0,
                ..Self::default()
            },
        }
    }

    /// 判断是否应该重试
    ///
    /// # 参数
    ///
    /// * `error` - 本次失败的错误
    /// * `next_attempt` - 即将投递的尝试序号（首次重试为1）
    pub fn should_retry(&self, error: &JobError, next_attempt: i32) -> bool {
        error.is_retryable() && next_attempt <= self.max_retries
    }

    /// 计算下次重试的退避时间
    ///
    /// 基础延迟由错误类别决定，乘以尝试序号线性放大；抖动幅度
    /// 小于相邻两档的间距，因此退避序列整体仍然单调不减。
    pub fn delay_for(&self, error: &JobError, next_attempt: i32) -> Duration {
        let base = match error {
            JobError::Timeout(_) => self.timeout_base,
            _ => self.transient_base,
        };
        let scaled = base.as_secs_f64() * next_attempt.max(1) as f64;

        let final_delay = if self.enable_jitter && scaled > 0.0 {
            let jitter_range = scaled * self.jitter_factor;
            let jitter = rand::random_range(-jitter_range..jitter_range);
            (scaled + jitter).max(0.0)
        } else {
            scaled
        };

        Duration::from_secs_f64(final_delay)
    }
}
