// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::job_history_repository::RepositoryError;
use crate::domain::models::article::Article;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

/// 热榜查询参数
#[derive(Debug, Default, Clone)]
pub struct HotQueryParams {
    /// 返回条数上限
    pub limit: u32,
    /// 分类过滤，None表示全部分类
    pub category: Option<String>,
    /// 入库时间下限，None表示不限
    pub ingested_after: Option<DateTime<FixedOffset>>,
}

/// 文章仓库特质
///
/// 定义文章及其交互状态的数据访问接口。交互计数的修改必须
/// 由存储层的原子更新表达式完成，调用方不允许以读取-修改-写回
/// 的方式操作计数，避免并发请求下的更新丢失。
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// 创建文章
    ///
    /// # 参数
    ///
    /// * `article` - 要创建的文章实体
    ///
    /// # 返回值
    ///
    /// * `Ok(Article)` - 成功创建后返回文章
    /// * `Err(RepositoryError)` - 创建失败时返回错误
    async fn create(&self, article: &Article) -> Result<Article, RepositoryError>;

    /// 根据ID查找文章
    ///
    /// # 参数
    ///
    /// * `id` - 文章唯一标识符
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(Article))` - 找到文章时返回实体
    /// * `Ok(None)` - 未找到时返回空
    /// * `Err(RepositoryError)` - 查询失败时返回错误
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, RepositoryError>;

    /// 根据URL查找文章
    ///
    /// # 参数
    ///
    /// * `url` - 来源URL
    async fn find_by_url(&self, url: &str) -> Result<Option<Article>, RepositoryError>;

    /// 更新文章的加工字段
    ///
    /// 覆盖标题、正文、分类、质量等级和情感倾向，
    /// 不触碰交互计数。
    async fn update_enrichment(&self, article: &Article) -> Result<Article, RepositoryError>;

    /// 原子递增浏览计数
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 文章存在且计数已递增
    /// * `Ok(false)` - 文章不存在
    async fn increment_view(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// 原子调整点赞计数
    ///
    /// `is_like`为true时加一；为false时减一，且在存储层
    /// 保证计数不会降到零以下。
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 文章存在且计数已调整
    /// * `Ok(false)` - 文章不存在
    async fn adjust_like(&self, id: Uuid, is_like: bool) -> Result<bool, RepositoryError>;

    /// 原子递增分享计数
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 文章存在且计数已递增
    /// * `Ok(false)` - 文章不存在
    async fn increment_share(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// 持久化热度分数
    ///
    /// # 参数
    ///
    /// * `id` - 文章唯一标识符
    /// * `score` - 新的热度分数
    /// * `computed_at` - 分数的计算时刻
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 文章存在且分数已写入
    /// * `Ok(false)` - 文章不存在
    async fn save_hot_score(
        &self,
        id: Uuid,
        score: f64,
        computed_at: DateTime<FixedOffset>,
    ) -> Result<bool, RepositoryError>;

    /// 按热度分数降序查询文章
    ///
    /// # 参数
    ///
    /// * `params` - 热榜查询参数
    async fn find_hot(&self, params: HotQueryParams) -> Result<Vec<Article>, RepositoryError>;

    /// 查询窗口内有浏览行为的文章，用于趋势榜计算
    ///
    /// 返回更新时间晚于`touched_after`且浏览计数大于零的文章。
    async fn find_active_since(
        &self,
        touched_after: DateTime<FixedOffset>,
    ) -> Result<Vec<Article>, RepositoryError>;

    /// 查询入库时间晚于截止点的文章，用于批量重算分数
    async fn find_ingested_since(
        &self,
        ingested_after: DateTime<FixedOffset>,
    ) -> Result<Vec<Article>, RepositoryError>;

    /// 根据ID列表查询文章
    async fn find_by_ids(&self, ids: Vec<Uuid>) -> Result<Vec<Article>, RepositoryError>;

    /// 删除入库时间早于截止点且质量等级低于阈值的文章
    ///
    /// 高质量内容不参与过期清理。
    ///
    /// # 返回值
    ///
    /// 返回删除的文章数量
    async fn delete_older_than(
        &self,
        cutoff: DateTime<FixedOffset>,
        max_quality_level: i32,
    ) -> Result<u64, RepositoryError>;
}
