// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供任务执行、队列监控和工作器生命周期管理
pub mod job_worker;
pub mod manager;
pub mod queue_monitor;
pub mod worker;

pub use worker::Worker;
