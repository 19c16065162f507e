// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::BTreeMap;

use serde::Serialize;

/// 单个队列的积压深度
#[derive(Debug, Serialize)]
pub struct QueueDepthDto {
    pub name: String,
    pub depth: u64,
}

/// 队列状态响应DTO
///
/// 汇总代理侧的队列积压和历史侧的状态分布
#[derive(Debug, Serialize)]
pub struct QueueStatsDto {
    pub queues: Vec<QueueDepthDto>,
    /// 延迟集合中等待到期的信封数量
    pub delayed: u64,
    /// 按状态统计的历史记录数量
    pub statuses: BTreeMap<String, u64>,
}
