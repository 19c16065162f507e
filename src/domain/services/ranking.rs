// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::models::article::Article;
use crate::domain::repositories::article_repository::{ArticleRepository, HotQueryParams};
use crate::domain::repositories::job_history_repository::RepositoryError;
use crate::domain::services::hot_score::HotScoreEngine;
use crate::infrastructure::cache::ranking_cache::{
    RankingCache, ARTICLE_STATS_PREFIX, ARTICLE_STATS_TTL, CATEGORY_HOT_TTL, HOT_ARTICLES_PREFIX,
    HOT_ARTICLES_TTL,
};

/// 热榜条目
///
/// 热榜查询的缓存与响应单元，只携带列表页需要的字段。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedArticle {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub category: Option<String>,
    pub hot_score: f64,
    pub view_count: i32,
    pub like_count: i32,
    pub share_count: i32,
    pub ingested_at: DateTime<FixedOffset>,
}

impl From<&Article> for RankedArticle {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id,
            url: article.url.clone(),
            title: article.title.clone(),
            category: article.category.clone(),
            hot_score: article.hot_score,
            view_count: article.view_count,
            like_count: article.like_count,
            share_count: article.share_count,
            ingested_at: article.ingested_at,
        }
    }
}

/// 趋势榜条目，velocity为每小时交互速率
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingArticle {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub category: Option<String>,
    pub velocity: f64,
    pub view_count: i32,
    pub like_count: i32,
    pub share_count: i32,
    pub ingested_at: DateTime<FixedOffset>,
}

/// 单篇文章的交互统计
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleStats {
    pub id: Uuid,
    pub view_count: i32,
    pub like_count: i32,
    pub share_count: i32,
    pub hot_score: f64,
    pub hot_score_computed_at: Option<DateTime<FixedOffset>>,
}

/// 排行服务
///
/// 编排热度分数的计算、持久化、榜单查询与交互计数。
///
/// 一致性模型：交互计数在存储层原子递增，是唯一事实来源；
/// hot_score是派生值，交互后立即刷新一次，失败只告警不回滚——
/// 周期性的批量重算最终会修正它。榜单缓存在任何计数变更后
/// 整体失效。
pub struct RankingService<R: ArticleRepository> {
    repository: Arc<R>,
    engine: HotScoreEngine,
    cache: RankingCache,
}

impl<R: ArticleRepository> RankingService<R> {
    pub fn new(repository: Arc<R>, engine: HotScoreEngine, cache: RankingCache) -> Self {
        Self {
            repository,
            engine,
            cache,
        }
    }

    /// 重算并持久化单篇文章的热度分数
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(score))` - 重算完成
    /// * `Ok(None)` - 文章不存在
    pub async fn update_one(&self, article_id: Uuid) -> Result<Option<f64>, RepositoryError> {
        let Some(article) = self.repository.find_by_id(article_id).await? else {
            warn!(article_id = %article_id, "Article not found, skipping hot score update");
            return Ok(None);
        };

        let now = Utc::now();
        let score = self.engine.compute(&article, now);
        self.repository
            .save_hot_score(article_id, score, now.into())
            .await?;

        debug!(article_id = %article_id, score = score, "Updated hot score");
        Ok(Some(score))
    }

    /// 批量重算窗口内文章的热度分数
    ///
    /// 覆盖最近`days_back`天内入库的文章，完成后使榜单缓存失效。
    ///
    /// # 返回值
    ///
    /// 返回重算的文章数量
    pub async fn batch_recompute(&self, days_back: i64) -> Result<u64, RepositoryError> {
        let now = Utc::now();
        let cutoff: DateTime<FixedOffset> = (now - Duration::days(days_back)).into();

        let articles = self.repository.find_ingested_since(cutoff).await?;
        let mut updated = 0u64;
        for article in &articles {
            let score = self.engine.compute(article, now);
            if self
                .repository
                .save_hot_score(article.id, score, now.into())
                .await?
            {
                updated += 1;
            }
        }

        self.cache.invalidate_rankings().await;
        info!(updated = updated, days_back = days_back, "Recomputed hot scores");
        Ok(updated)
    }

    /// 查询热榜（带缓存）
    ///
    /// 按持久化的hot_score降序返回，可按分类和入库时间范围
    /// （`1d`/`7d`/`30d`）过滤。命中缓存直接返回；未命中时查库，
    /// 非空结果写回缓存，分类榜使用更长的TTL。
    pub async fn get_hot(
        &self,
        limit: u32,
        category: Option<String>,
        time_range: Option<String>,
    ) -> Result<Vec<RankedArticle>, RepositoryError> {
        let cache_key = RankingCache::build_key(
            HOT_ARTICLES_PREFIX,
            &[
                ("limit", limit.to_string()),
                (
                    "category",
                    category.clone().unwrap_or_else(|| "all".to_string()),
                ),
                (
                    "range",
                    time_range.clone().unwrap_or_else(|| "all".to_string()),
                ),
            ],
        );

        if let Some(cached) = self.cache.get_json::<Vec<RankedArticle>>(&cache_key).await {
            debug!(key = %cache_key, "Hot articles served from cache");
            return Ok(cached);
        }

        let now = Utc::now();
        let ingested_after = time_range
            .as_deref()
            .and_then(|range| time_range_cutoff(range, now));

        let articles = self
            .repository
            .find_hot(HotQueryParams {
                limit,
                category: category.clone(),
                ingested_after,
            })
            .await?;
        let ranked: Vec<RankedArticle> = articles.iter().map(RankedArticle::from).collect();

        if !ranked.is_empty() {
            let ttl = if category.is_some() {
                CATEGORY_HOT_TTL
            } else {
                HOT_ARTICLES_TTL
            };
            self.cache.set_json(&cache_key, &ranked, ttl).await;
        }

        Ok(ranked)
    }

    /// 查询趋势榜（不缓存）
    ///
    /// 对最近`hours`小时内有浏览行为的文章按每小时交互速率降序
    /// 排列。趋势榜必须反映实时数据，因此每次都现算。
    pub async fn get_trending(
        &self,
        limit: u32,
        hours: i64,
    ) -> Result<Vec<TrendingArticle>, RepositoryError> {
        let now = Utc::now();
        let touched_after: DateTime<FixedOffset> = (now - Duration::hours(hours)).into();

        let articles = self.repository.find_active_since(touched_after).await?;
        let mut trending: Vec<TrendingArticle> = articles
            .iter()
            .map(|article| TrendingArticle {
                id: article.id,
                url: article.url.clone(),
                title: article.title.clone(),
                category: article.category.clone(),
                velocity: self.engine.velocity(article, now),
                view_count: article.view_count,
                like_count: article.like_count,
                share_count: article.share_count,
                ingested_at: article.ingested_at,
            })
            .collect();

        trending.sort_by(|a, b| {
            b.velocity
                .partial_cmp(&a.velocity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        trending.truncate(limit as usize);

        Ok(trending)
    }

    /// 查询单篇文章的交互统计（带缓存）
    pub async fn article_stats(
        &self,
        article_id: Uuid,
    ) -> Result<Option<ArticleStats>, RepositoryError> {
        let cache_key = RankingCache::build_key(
            ARTICLE_STATS_PREFIX,
            &[("id", article_id.to_string())],
        );

        if let Some(cached) = self.cache.get_json::<ArticleStats>(&cache_key).await {
            return Ok(Some(cached));
        }

        let Some(article) = self.repository.find_by_id(article_id).await? else {
            return Ok(None);
        };
        let stats = ArticleStats {
            id: article.id,
            view_count: article.view_count,
            like_count: article.like_count,
            share_count: article.share_count,
            hot_score: article.hot_score,
            hot_score_computed_at: article.hot_score_computed_at,
        };
        self.cache
            .set_json(&cache_key, &stats, ARTICLE_STATS_TTL)
            .await;

        Ok(Some(stats))
    }

    /// 记录一次浏览
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 计数已递增
    /// * `Ok(false)` - 文章不存在
    pub async fn record_view(&self, article_id: Uuid) -> Result<bool, RepositoryError> {
        if !self.repository.increment_view(article_id).await? {
            return Ok(false);
        }
        self.refresh_after_interaction(article_id).await;
        Ok(true)
    }

    /// 记录一次点赞或取消点赞
    ///
    /// 取消点赞不会把计数减到零以下。
    pub async fn record_like(
        &self,
        article_id: Uuid,
        is_like: bool,
    ) -> Result<bool, RepositoryError> {
        if !self.repository.adjust_like(article_id, is_like).await? {
            return Ok(false);
        }
        self.refresh_after_interaction(article_id).await;
        Ok(true)
    }

    /// 记录一次分享
    pub async fn record_share(&self, article_id: Uuid) -> Result<bool, RepositoryError> {
        if !self.repository.increment_share(article_id).await? {
            return Ok(false);
        }
        self.refresh_after_interaction(article_id).await;
        Ok(true)
    }

    /// 交互计数落库后的收尾：刷新分数并使榜单缓存失效
    ///
    /// 计数本身已经持久化，这里的失败只记日志，由周期重算兜底。
    async fn refresh_after_interaction(&self, article_id: Uuid) {
        if let Err(e) = self.update_one(article_id).await {
            warn!(article_id = %article_id, error = %e, "Hot score refresh after interaction failed");
        }
        self.cache.invalidate_rankings().await;
    }
}

/// 解析时间范围参数为入库时间下限
///
/// 支持`1d`/`7d`/`30d`，无法识别的取值不做过滤。
fn time_range_cutoff(range: &str, now: DateTime<Utc>) -> Option<DateTime<FixedOffset>> {
    let days = match range {
        "1d" => 1,
        "7d" => 7,
        "30d" => 30,
        _ => return None,
    };
    Some((now - Duration::days(days)).into())
}
