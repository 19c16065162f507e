// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供任务代理和定时调度功能
/// 负责任务信封的投递、延迟重试、撤销和定时触发
pub mod job_queue;
pub mod scheduler;
