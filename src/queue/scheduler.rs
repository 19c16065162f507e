// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::settings::Settings;
use crate::domain::models::envelope::JobEnvelope;
use crate::domain::models::job::JobType;
use crate::queue::job_queue::JobBroker;

/// 调度器错误类型
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// cron表达式无法解析
    #[error("Invalid cron expression for {name}: {message}")]
    InvalidCron { name: String, message: String },
}

/// 一条定时投递规则
struct ScheduleEntry {
    /// 规则名称，用于日志
    name: &'static str,
    /// 到期时投递的任务类型
    job_type: JobType,
    /// 投递时携带的关键字参数
    kwargs: serde_json::Value,
    /// 解析后的cron表达式
    schedule: Schedule,
}

/// 定时任务调度器
///
/// 每条规则一个后台循环，睡到下一个cron触发点后通过代理投递
/// 一个普通信封。调度器只负责投递，执行仍然走工作者池，因此
/// 定时任务和外部提交的任务在执行器眼里没有区别。
pub struct JobScheduler<B: JobBroker + 'static> {
    /// 任务代理
    broker: Arc<B>,
    /// 投递目标队列
    queue_name: String,
    /// 定时规则
    entries: Vec<ScheduleEntry>,
}

impl<B: JobBroker + 'static> JobScheduler<B> {
    /// 按配置构建调度器
    ///
    /// 规则固定为三条：定时抓取、定时清理低质量文章、定时重算
    /// 热度分数。cron表达式和参数来自配置。
    ///
    /// # 参数
    ///
    /// * `broker` - 任务代理
    /// * `settings` - 应用配置
    ///
    /// # 返回值
    ///
    /// * `Ok(JobScheduler)` - 构建好的调度器
    /// * `Err(SchedulerError)` - 任一cron表达式解析失败
    pub fn from_settings(broker: Arc<B>, settings: &Settings) -> Result<Self, SchedulerError> {
        let parse = |name: &'static str, expression: &str| -> Result<Schedule, SchedulerError> {
            Schedule::from_str(expression).map_err(|e| SchedulerError::InvalidCron {
                name: name.to_string(),
                message: e.to_string(),
            })
        };

        let entries = vec![
            ScheduleEntry {
                name: "scheduled_fetch",
                job_type: JobType::ScheduledFetch,
                kwargs: serde_json::json!({}),
                schedule: parse("scheduled_fetch", &settings.scheduler.fetch_cron)?,
            },
            ScheduleEntry {
                name: "cleanup_articles",
                job_type: JobType::Cleanup,
                kwargs: serde_json::json!({
                    "days": settings.retention.article_days,
                    "target": "articles",
                }),
                schedule: parse("cleanup_articles", &settings.scheduler.cleanup_cron)?,
            },
            ScheduleEntry {
                name: "recompute_scores",
                job_type: JobType::RecomputeScores,
                kwargs: serde_json::json!({
                    "days_back": settings.scheduler.recompute_days_back,
                }),
                schedule: parse("recompute_scores", &settings.scheduler.recompute_cron)?,
            },
        ];

        let queue_name = settings
            .workers
            .queues
            .first()
            .cloned()
            .unwrap_or_else(|| "default".to_string());

        Ok(Self {
            broker,
            queue_name,
            entries,
        })
    }

    /// 启动所有定时规则的后台循环
    ///
    /// # 返回值
    ///
    /// 返回每条规则的后台任务句柄，由管理者在停机时中止
    pub fn start(self) -> Vec<JoinHandle<()>> {
        let broker = self.broker;
        let queue_name = self.queue_name;

        self.entries
            .into_iter()
            .map(|entry| {
                let broker = broker.clone();
                let queue_name = queue_name.clone();

                tokio::spawn(async move {
                    info!("Schedule entry started: {}", entry.name);
                    loop {
                        let next = match entry.schedule.upcoming(Utc).next() {
                            Some(next) => next,
                            None => {
                                warn!("Schedule entry has no upcoming ticks: {}", entry.name);
                                break;
                            }
                        };
                        let wait = (next - Utc::now())
                            .to_std()
                            .unwrap_or(Duration::from_secs(0));
                        tokio::time::sleep(wait).await;

                        let envelope = JobEnvelope::new(
                            entry.job_type,
                            queue_name.clone(),
                            entry.kwargs.clone(),
                        );
                        match broker.enqueue(&envelope).await {
                            Ok(()) => {
                                info!(
                                    "Scheduled job submitted: entry={} job_id={}",
                                    entry.name, envelope.job_id
                                );
                            }
                            Err(e) => {
                                error!(
                                    "Failed to submit scheduled job: entry={} error={}",
                                    entry.name, e
                                );
                            }
                        }
                    }
                })
            })
            .collect()
    }
}
