// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::memory_db;
use chrono::{Duration, Utc};
use feedrs::domain::models::article::Article;
use feedrs::domain::repositories::article_repository::ArticleRepository;
use feedrs::domain::services::hot_score::HotScoreEngine;
use feedrs::domain::services::ranking::RankingService;
use feedrs::infrastructure::cache::ranking_cache::RankingCache;
use feedrs::infrastructure::cache::redis_client::RedisClient;
use feedrs::infrastructure::repositories::article_repo_impl::ArticleRepositoryImpl;
use std::sync::Arc;

/// 构造接真实数据库的排行服务
///
/// 缓存指向未监听端口，所有缓存操作退化为未命中，
/// 榜单走数据库路径。
async fn service_on_db() -> (
    RankingService<ArticleRepositoryImpl>,
    Arc<ArticleRepositoryImpl>,
) {
    let db = memory_db().await;
    let repository = Arc::new(ArticleRepositoryImpl::new(db));
    let client = RedisClient::new("redis://127.0.0.1:6390/").await.unwrap();
    let service = RankingService::new(
        repository.clone(),
        HotScoreEngine::default(),
        RankingCache::new(client),
    );
    (service, repository)
}

fn fresh_article(url: &str) -> Article {
    Article::from_fetch(
        url.to_string(),
        "测试文章".to_string(),
        Some("正文".to_string()),
        Some("example.com".to_string()),
    )
}

/// 测试交互经服务落库并刷新分数
///
/// 验证record_view把计数写进数据库，随后的分数刷新
/// 把派生值和计算时刻一并持久化。
#[tokio::test]
async fn test_record_view_persists_count_and_score() {
    let (service, repo) = service_on_db().await;
    let article = fresh_article("https://example.com/flow/view");
    repo.create(&article).await.unwrap();

    assert!(service.record_view(article.id).await.unwrap());

    let stored = repo.find_by_id(article.id).await.unwrap().unwrap();
    assert_eq!(stored.view_count, 1);
    assert!(stored.hot_score > 0.0);
    assert!(stored.hot_score_computed_at.is_some());
}

/// 测试交互越多分数越高
///
/// 验证重算流程读取数据库计数参与热度计算：同龄文章中
/// 交互多的分数更高，热榜顺序随之确定。
#[tokio::test]
async fn test_get_hot_ranks_by_recomputed_scores() {
    let (service, repo) = service_on_db().await;

    let mut popular = fresh_article("https://example.com/flow/popular");
    popular.view_count = 200;
    popular.like_count = 10;
    let quiet = fresh_article("https://example.com/flow/quiet");
    repo.create(&popular).await.unwrap();
    repo.create(&quiet).await.unwrap();

    let updated = service.batch_recompute(7).await.unwrap();
    assert_eq!(updated, 2);

    let hot = service.get_hot(10, None, None).await.unwrap();
    assert_eq!(hot.len(), 2);
    assert_eq!(hot[0].id, popular.id);
    assert_eq!(hot[1].id, quiet.id);
    assert!(hot[0].hot_score > hot[1].hot_score);
}

/// 测试批量重算只覆盖窗口内的文章
///
/// 验证回溯窗口按入库时间过滤：窗口外的文章分数
/// 保持未计算状态。
#[tokio::test]
async fn test_batch_recompute_skips_articles_outside_window() {
    let (service, repo) = service_on_db().await;

    let recent = fresh_article("https://example.com/flow/recent");
    let mut ancient = fresh_article("https://example.com/flow/ancient");
    ancient.ingested_at = (Utc::now() - Duration::days(30)).into();
    repo.create(&recent).await.unwrap();
    repo.create(&ancient).await.unwrap();

    let updated = service.batch_recompute(7).await.unwrap();

    assert_eq!(updated, 1);
    let recent_stored = repo.find_by_id(recent.id).await.unwrap().unwrap();
    assert!(recent_stored.hot_score_computed_at.is_some());
    let ancient_stored = repo.find_by_id(ancient.id).await.unwrap().unwrap();
    assert!(ancient_stored.hot_score_computed_at.is_none());
}

/// 测试趋势榜反映数据库中的实时交互
///
/// 验证浏览行为落库后立即出现在趋势榜上，
/// 没有交互的文章不出现。
#[tokio::test]
async fn test_trending_reflects_live_interactions() {
    let (service, repo) = service_on_db().await;

    let active = fresh_article("https://example.com/flow/active");
    let silent = fresh_article("https://example.com/flow/silent");
    repo.create(&active).await.unwrap();
    repo.create(&silent).await.unwrap();

    assert!(service.record_view(active.id).await.unwrap());
    assert!(service.record_share(active.id).await.unwrap());

    let trending = service.get_trending(10, 24).await.unwrap();

    assert_eq!(trending.len(), 1);
    assert_eq!(trending[0].id, active.id);
    assert_eq!(trending[0].view_count, 1);
    assert_eq!(trending[0].share_count, 1);
}
