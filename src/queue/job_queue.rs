// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::envelope::JobEnvelope;
use crate::infrastructure::cache::redis_client::RedisClient;

/// 队列键前缀，实际键形如`feedrs:queue:default`
const QUEUE_KEY_PREFIX: &str = "feedrs:queue";
/// 延迟投递有序集合，分数为就绪时刻的epoch秒
const DELAYED_KEY: &str = "feedrs:delayed";
/// 已撤销任务集合
const REVOKED_KEY: &str = "feedrs:revoked";

/// 代理错误类型
#[derive(Error, Debug)]
pub enum BrokerError {
    /// 后端存储错误
    #[error("Broker backend error: {0}")]
    Backend(#[from] anyhow::Error),

    /// 信封编解码错误
    #[error("Malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// 任务代理特质
///
/// 生产者通过enqueue/enqueue_in投递信封，工作者通过claim领取。
/// 撤销集合独立于队列存在：标记撤销后，排队中的信封在领取时被
/// 丢弃，运行中的任务不被强制打断。
#[async_trait]
pub trait JobBroker: Send + Sync {
    /// 立即投递一个信封
    async fn enqueue(&self, envelope: &JobEnvelope) -> Result<(), BrokerError>;

    /// 延迟投递一个信封，到期后才可被领取
    async fn enqueue_in(&self, envelope: &JobEnvelope, delay: Duration) -> Result<(), BrokerError>;

    /// 领取下一个就绪的信封
    ///
    /// 先将延迟集合中已到期的信封搬运回各自的队列，再按配置
    /// 顺序轮询队列。所有队列均为空时返回None。
    async fn claim(&self) -> Result<Option<JobEnvelope>, BrokerError>;

    /// 标记任务为已撤销
    async fn revoke(&self, job_id: Uuid) -> Result<(), BrokerError>;

    /// 查询任务是否被撤销
    async fn is_revoked(&self, job_id: Uuid) -> Result<bool, BrokerError>;

    /// 清除撤销标记
    ///
    /// 工作者丢弃一个已撤销的排队信封后调用，避免集合无限增长。
    async fn clear_revoked(&self, job_id: Uuid) -> Result<(), BrokerError>;

    /// 从队列或延迟集合中摘除指定任务的信封
    ///
    /// 命中返回被摘除的信封，任务不在排队状态时返回None。
    async fn take_queued(&self, job_id: Uuid) -> Result<Option<JobEnvelope>, BrokerError>;

    /// 统计各队列的积压长度
    async fn queue_depths(&self) -> Result<Vec<(String, u64)>, BrokerError>;

    /// 统计延迟集合中等待到期的信封数量
    async fn delayed_count(&self) -> Result<u64, BrokerError>;
}

fn queue_key(queue_name: &str) -> String {
    format!("{}:{}", QUEUE_KEY_PREFIX, queue_name)
}

/// Redis任务代理实现
///
/// 每个队列一个Redis列表（LPUSH入队/RPOP出队，先进先出），
/// 延迟投递用一个按就绪时刻排序的有序集合，撤销标记用一个集合。
#[derive(Clone)]
pub struct RedisJobBroker {
    /// Redis客户端
    client: RedisClient,
    /// 按领取顺序排列的队列名称
    queues: Vec<String>,
}

impl RedisJobBroker {
    /// 创建新的Redis任务代理实例
    ///
    /// # 参数
    ///
    /// * `client` - Redis客户端
    /// * `queues` - 队列名称，claim按此顺序轮询
    pub fn new(client: RedisClient, queues: Vec<String>) -> Self {
        Self { client, queues }
    }

    /// 将延迟集合中已到期的信封搬运回各自的队列
    ///
    /// zrem返回0说明另一个领取者已抢先搬运了该成员，跳过即可，
    /// 由此保证每个延迟信封只被投递一次。
    async fn promote_due(&self) -> Result<(), BrokerError> {
        let now = Utc::now().timestamp() as f64;
        let due = self.client.zrangebyscore(DELAYED_KEY, 0.0, now).await?;
        for raw in due {
            if self.client.zrem(DELAYED_KEY, &raw).await? == 0 {
                continue;
            }
            let envelope: JobEnvelope = serde_json::from_str(&raw)?;
            self.client
                .lpush(&queue_key(&envelope.queue_name), &raw)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl JobBroker for RedisJobBroker {
    async fn enqueue(&self, envelope: &JobEnvelope) -> Result<(), BrokerError> {
        let raw = serde_json::to_string(envelope)?;
        self.client
            .lpush(&queue_key(&envelope.queue_name), &raw)
            .await?;
        Ok(())
    }

    async fn enqueue_in(&self, envelope: &JobEnvelope, delay: Duration) -> Result<(), BrokerError> {
        let raw = serde_json::to_string(envelope)?;
        let ready_at = Utc::now().timestamp() as f64 + delay.as_secs_f64();
        self.client.zadd(DELAYED_KEY, &raw, ready_at).await?;
        Ok(())
    }

    async fn claim(&self) -> Result<Option<JobEnvelope>, BrokerError> {
        self.promote_due().await?;
        for queue in &self.queues {
            if let Some(raw) = self.client.rpop(&queue_key(queue)).await? {
                let envelope: JobEnvelope = serde_json::from_str(&raw)?;
                return Ok(Some(envelope));
            }
        }
        Ok(None)
    }

    async fn revoke(&self, job_id: Uuid) -> Result<(), BrokerError> {
        self.client
            .sadd(REVOKED_KEY, &job_id.to_string())
            .await?;
        Ok(())
    }

    async fn is_revoked(&self, job_id: Uuid) -> Result<bool, BrokerError> {
        let revoked = self
            .client
            .sismember(REVOKED_KEY, &job_id.to_string())
            .await?;
        Ok(revoked)
    }

    async fn clear_revoked(&self, job_id: Uuid) -> Result<(), BrokerError> {
        self.client
            .srem(REVOKED_KEY, &job_id.to_string())
            .await?;
        Ok(())
    }

    async fn take_queued(&self, job_id: Uuid) -> Result<Option<JobEnvelope>, BrokerError> {
        for queue in &self.queues {
            let key = queue_key(queue);
            for raw in self.client.lrange(&key, 0, -1).await? {
                let envelope = match serde_json::from_str::<JobEnvelope>(&raw) {
                    Ok(envelope) => envelope,
                    Err(_) => continue,
                };
                // lrem返回0说明该信封恰好在扫描后被领走了
                if envelope.job_id == job_id && self.client.lrem(&key, 1, &raw).await? > 0 {
                    return Ok(Some(envelope));
                }
            }
        }
        for raw in self
            .client
            .zrangebyscore(DELAYED_KEY, 0.0, f64::INFINITY)
            .await?
        {
            let envelope = match serde_json::from_str::<JobEnvelope>(&raw) {
                Ok(envelope) => envelope,
                Err(_) => continue,
            };
            if envelope.job_id == job_id && self.client.zrem(DELAYED_KEY, &raw).await? > 0 {
                return Ok(Some(envelope));
            }
        }
        Ok(None)
    }

    async fn queue_depths(&self) -> Result<Vec<(String, u64)>, BrokerError> {
        let mut depths = Vec::with_capacity(self.queues.len());
        for queue in &self.queues {
            let depth = self.client.llen(&queue_key(queue)).await?;
            depths.push((queue.clone(), depth));
        }
        Ok(depths)
    }

    async fn delayed_count(&self) -> Result<u64, BrokerError> {
        let count = self.client.zcard(DELAYED_KEY).await?;
        Ok(count)
    }
}

#[async_trait]
impl<T: JobBroker + ?Sized> JobBroker for Arc<T> {
    async fn enqueue(&self, envelope: &JobEnvelope) -> Result<(), BrokerError> {
        (**self).enqueue(envelope).await
    }

    async fn enqueue_in(&self, envelope: &JobEnvelope, delay: Duration) -> Result<(), BrokerError> {
        (**self).enqueue_in(envelope, delay).await
    }

    async fn claim(&self) -> Result<Option<JobEnvelope>, BrokerError> {
        (**self).claim().await
    }

    async fn revoke(&self, job_id: Uuid) -> Result<(), BrokerError> {
        (**self).revoke(job_id).await
    }

    async fn is_revoked(&self, job_id: Uuid) -> Result<bool, BrokerError> {
        (**self).is_revoked(job_id).await
    }

    async fn clear_revoked(&self, job_id: Uuid) -> Result<(), BrokerError> {
        (**self).clear_revoked(job_id).await
    }

    async fn take_queued(&self, job_id: Uuid) -> Result<Option<JobEnvelope>, BrokerError> {
        (**self).take_queued(job_id).await
    }

    async fn queue_depths(&self) -> Result<Vec<(String, u64)>, BrokerError> {
        (**self).queue_depths().await
    }

    async fn delayed_count(&self) -> Result<u64, BrokerError> {
        (**self).delayed_count().await
    }
}
