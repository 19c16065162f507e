// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::gauge;
use tracing::{error, info};

use crate::queue::job_queue::{BrokerError, JobBroker};
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;

/// 队列积压监控工作器
///
/// 定期采样各队列的积压长度和延迟集合大小，发布为监控指标
pub struct QueueMonitor<B>
where
    B: JobBroker + 'static,
{
    broker: Arc<B>,
    interval: Duration,
}

impl<B> QueueMonitor<B>
where
    B: JobBroker + 'static,
{
    pub fn new(broker: Arc<B>, interval: Duration) -> Self {
        Self { broker, interval }
    }

    /// 运行监控循环
    pub async fn run_loop(&self) {
        info!("Queue monitor started");

        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;

            if let Err(e) = self.publish().await {
                error!("Failed to sample queue depths: {}", e);
            }
        }
    }

    /// 采样一次并发布指标
    async fn publish(&self) -> Result<(), BrokerError> {
        let depths = self.broker.queue_depths().await?;
        for (queue, depth) in depths {
            gauge!("queue_depth", "queue" => queue).set(depth as f64);
        }

        let delayed = self.broker.delayed_count().await?;
        gauge!("delayed_jobs").set(delayed as f64);
        Ok(())
    }
}

#[async_trait]
impl<B> Worker for QueueMonitor<B>
where
    B: JobBroker + 'static,
{
    async fn run(&self) -> Result<(), WorkerError> {
        self.run_loop().await;
        Ok(())
    }

    fn name(&self) -> &str {
        "queue-monitor"
    }
}
