// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 点赞/取消点赞请求DTO
#[derive(Debug, Deserialize, Serialize)]
pub struct LikeRequestDto {
    /// true为点赞，false为取消点赞
    pub is_like: bool,
}

/// 交互计数响应DTO
#[derive(Debug, Serialize)]
pub struct InteractionResponseDto {
    pub article_id: Uuid,
    pub action: String,
    pub applied: bool,
}

/// 热榜查询DTO
#[derive(Debug, Default, Deserialize, Validate)]
pub struct HotQueryDto {
    /// 返回条数
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
    /// 按分类过滤
    pub category: Option<String>,
    /// 入库时间范围：1d、7d或30d
    pub time_range: Option<String>,
}

/// 趋势榜查询DTO
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TrendingQueryDto {
    /// 返回条数
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
    /// 活跃窗口，小时
    #[validate(range(min = 1, max = 168))]
    pub hours: Option<i64>,
}

/// 批量重算分数请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RecomputeRequestDto {
    /// 回溯窗口天数
    #[validate(range(min = 1, max = 365))]
    pub days_back: Option<u32>,
}

/// 批量重算分数响应DTO
#[derive(Debug, Serialize)]
pub struct RecomputeResponseDto {
    pub updated_count: u64,
}
