// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::workers::worker::Worker;

/// 工作管理器
///
/// 持有所有后台循环的任务句柄，统一负责启动和优雅关闭
pub struct WorkerManager {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    /// 启动一个工作器循环
    ///
    /// 工作器在独立的任务上运行，句柄由管理器持有以便关闭时中止
    pub fn spawn<W>(&mut self, worker: Arc<W>)
    where
        W: Worker + 'static,
    {
        let handle = tokio::spawn(async move {
            info!("Worker {} starting", worker.name());
            if let Err(e) = worker.run().await {
                error!("Worker {} exited with error: {}", worker.name(), e);
            }
        });
        self.handles.push(handle);
    }

    /// 接管外部创建的任务句柄（如调度器的定时循环）
    pub fn adopt(&mut self, handles: Vec<JoinHandle<()>>) {
        self.handles.extend(handles);
    }

    /// 等待关闭信号并关闭所有后台循环
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }

        info!("Shutting down workers...");
        for handle in &self.handles {
            handle.abort();
        }

        info!("Workers shut down successfully");
    }
}

impl Default for WorkerManager {
    fn default() -> Self {
        Self::new()
    }
}
