// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 文章实体
///
/// 表示一条已抓取入库的内容及其交互状态。交互计数只在
/// 存储层以原子方式递增；hot_score是由其他字段和计算时刻
/// 推导出的缓存值，不是独立状态，允许在两次重算之间短暂陈旧。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// 文章唯一标识符
    pub id: Uuid,
    /// 来源URL，全库唯一
    pub url: String,
    /// 标题
    pub title: String,
    /// 正文内容
    pub content: Option<String>,
    /// 来源域名
    pub source_domain: Option<String>,
    /// 分类，参与热度分数的分类加成
    pub category: Option<String>,
    /// 内容质量等级，1-5，越高权重越大
    pub quality_level: i32,
    /// 情感倾向，[-1, 1]，缺失按中性处理
    pub sentiment: Option<f64>,
    /// 浏览次数，只增不减
    pub view_count: i32,
    /// 点赞次数，可增可减但不会为负
    pub like_count: i32,
    /// 分享次数，只增不减
    pub share_count: i32,
    /// 热度分数，派生值
    pub hot_score: f64,
    /// 热度分数最后一次计算的时间
    pub hot_score_computed_at: Option<DateTime<FixedOffset>>,
    /// 入库时间，热度衰减的年龄锚点
    pub ingested_at: DateTime<FixedOffset>,
    /// 最后更新时间
    pub updated_at: DateTime<FixedOffset>,
}

impl Article {
    /// 从抓取结果创建一篇新文章
    ///
    /// # 参数
    ///
    /// * `url` - 来源URL
    /// * `title` - 标题
    /// * `content` - 正文内容
    /// * `source_domain` - 来源域名
    ///
    /// # 返回值
    ///
    /// 返回交互计数为零、以当前时间作为入库时间的文章实例
    pub fn from_fetch(
        url: String,
        title: String,
        content: Option<String>,
        source_domain: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            url,
            title,
            content,
            source_domain,
            category: None,
            quality_level: 1,
            sentiment: None,
            view_count: 0,
            like_count: 0,
            share_count: 0,
            hot_score: 0.0,
            hot_score_computed_at: None,
            ingested_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    /// 文章入库至今经过的小时数
    ///
    /// # 参数
    ///
    /// * `now` - 计算基准时间
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        let seconds = (now - self.ingested_at.with_timezone(&Utc)).num_seconds();
        (seconds.max(0) as f64) / 3600.0
    }
}
