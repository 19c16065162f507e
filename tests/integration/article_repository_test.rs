// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{file_db, memory_db};
use chrono::{Duration, Utc};
use feedrs::domain::models::article::Article;
use feedrs::domain::repositories::article_repository::{ArticleRepository, HotQueryParams};
use feedrs::infrastructure::repositories::article_repo_impl::ArticleRepositoryImpl;
use std::sync::Arc;
use uuid::Uuid;

fn sample_article(url: &str, title: &str) -> Article {
    Article::from_fetch(
        url.to_string(),
        title.to_string(),
        Some("正文内容".to_string()),
        Some("example.com".to_string()),
    )
}

/// 测试文章的创建和查找
///
/// 验证创建后能按ID和URL取回文章，初始交互计数为零，
/// 查找不存在的URL返回None。
#[tokio::test]
async fn test_create_and_find_article() {
    let db = memory_db().await;
    let repo = ArticleRepositoryImpl::new(db);

    let article = sample_article("https://example.com/news/1", "端到端加密落地");
    repo.create(&article).await.unwrap();

    let by_id = repo.find_by_id(article.id).await.unwrap().unwrap();
    assert_eq!(by_id.url, article.url);
    assert_eq!(by_id.title, article.title);
    assert_eq!(by_id.view_count, 0);
    assert_eq!(by_id.like_count, 0);
    assert_eq!(by_id.share_count, 0);
    assert_eq!(by_id.quality_level, 1);
    assert!(by_id.hot_score_computed_at.is_none());

    let by_url = repo.find_by_url(&article.url).await.unwrap().unwrap();
    assert_eq!(by_url.id, article.id);

    let missing = repo.find_by_url("https://example.com/absent").await.unwrap();
    assert!(missing.is_none());
}

/// 测试加工字段更新不触碰交互计数
///
/// 验证update_enrichment只覆盖内容类字段，即使传入的实体
/// 携带过期的计数值，数据库中的计数也不受影响。
#[tokio::test]
async fn test_update_enrichment_preserves_counters() {
    let db = memory_db().await;
    let repo = ArticleRepositoryImpl::new(db);

    let article = sample_article("https://example.com/news/2", "旧标题");
    repo.create(&article).await.unwrap();
    assert!(repo.increment_view(article.id).await.unwrap());
    assert!(repo.increment_view(article.id).await.unwrap());

    // 实体携带的计数已经过期，更新时必须被忽略
    let mut enriched = article.clone();
    enriched.title = "新标题".to_string();
    enriched.category = Some("tech".to_string());
    enriched.quality_level = 4;
    enriched.sentiment = Some(0.6);
    enriched.view_count = 0;
    repo.update_enrichment(&enriched).await.unwrap();

    let found = repo.find_by_id(article.id).await.unwrap().unwrap();
    assert_eq!(found.title, "新标题");
    assert_eq!(found.category.as_deref(), Some("tech"));
    assert_eq!(found.quality_level, 4);
    assert_eq!(found.sentiment, Some(0.6));
    assert_eq!(found.view_count, 2);
}

/// 测试交互计数的原子更新
///
/// 验证浏览、点赞、取消点赞和分享对计数的影响，
/// 以及对不存在文章的存在性返回值。
#[tokio::test]
async fn test_interaction_counters() {
    let db = memory_db().await;
    let repo = ArticleRepositoryImpl::new(db);

    let article = sample_article("https://example.com/news/3", "计数测试");
    repo.create(&article).await.unwrap();

    assert!(repo.increment_view(article.id).await.unwrap());
    assert!(repo.adjust_like(article.id, true).await.unwrap());
    assert!(repo.adjust_like(article.id, true).await.unwrap());
    assert!(repo.adjust_like(article.id, false).await.unwrap());
    assert!(repo.increment_share(article.id).await.unwrap());

    let found = repo.find_by_id(article.id).await.unwrap().unwrap();
    assert_eq!(found.view_count, 1);
    assert_eq!(found.like_count, 1);
    assert_eq!(found.share_count, 1);

    // 不存在的文章统一返回false
    let unknown = Uuid::new_v4();
    assert!(!repo.increment_view(unknown).await.unwrap());
    assert!(!repo.adjust_like(unknown, true).await.unwrap());
    assert!(!repo.adjust_like(unknown, false).await.unwrap());
    assert!(!repo.increment_share(unknown).await.unwrap());
}

/// 测试取消点赞的下界保护
///
/// 验证计数为零时取消点赞不会把计数降到负数，
/// 但因为文章存在仍返回true。
#[tokio::test]
async fn test_unlike_at_zero_keeps_floor() {
    let db = memory_db().await;
    let repo = ArticleRepositoryImpl::new(db);

    let article = sample_article("https://example.com/news/4", "下界测试");
    repo.create(&article).await.unwrap();

    assert!(repo.adjust_like(article.id, false).await.unwrap());

    let found = repo.find_by_id(article.id).await.unwrap().unwrap();
    assert_eq!(found.like_count, 0);
}

/// 测试并发浏览计数不丢更新
///
/// 验证多个任务同时递增同一篇文章的浏览计数时，
/// 每一次递增都被计入。内存库按连接隔离，并发场景
/// 需要共享的文件库。
#[tokio::test]
async fn test_concurrent_view_increments_all_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir.path().join("articles.db")).await;
    let repo = Arc::new(ArticleRepositoryImpl::new(db));

    let article = sample_article("https://example.com/news/concurrent", "并发测试");
    repo.create(&article).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let repo = repo.clone();
        let id = article.id;
        handles.push(tokio::spawn(async move {
            for _ in 0..5 {
                assert!(repo.increment_view(id).await.unwrap());
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let found = repo.find_by_id(article.id).await.unwrap().unwrap();
    assert_eq!(found.view_count, 20);
}

/// 测试过期清理的质量下限
///
/// 验证清理只删除入库时间早于截止点且质量等级低于阈值的
/// 文章，高质量的过期文章和新文章都被保留。
#[tokio::test]
async fn test_delete_older_than_respects_quality_floor() {
    let db = memory_db().await;
    let repo = ArticleRepositoryImpl::new(db);

    let mut aged_low = sample_article("https://example.com/old/low", "过期低质");
    aged_low.ingested_at = (Utc::now() - Duration::days(100)).into();
    let mut aged_high = sample_article("https://example.com/old/high", "过期高质");
    aged_high.ingested_at = (Utc::now() - Duration::days(100)).into();
    aged_high.quality_level = 3;
    let fresh = sample_article("https://example.com/new", "新文章");

    repo.create(&aged_low).await.unwrap();
    repo.create(&aged_high).await.unwrap();
    repo.create(&fresh).await.unwrap();

    let cutoff = (Utc::now() - Duration::days(90)).into();
    let deleted = repo.delete_older_than(cutoff, 3).await.unwrap();

    assert_eq!(deleted, 1);
    assert!(repo.find_by_id(aged_low.id).await.unwrap().is_none());
    assert!(repo.find_by_id(aged_high.id).await.unwrap().is_some());
    assert!(repo.find_by_id(fresh.id).await.unwrap().is_some());
}

/// 测试热度分数写入和热榜查询
///
/// 验证save_hot_score写入分数和计算时刻但不触碰updated_at，
/// find_hot按分数降序返回并遵守条数、分类和时间窗口约束。
#[tokio::test]
async fn test_save_hot_score_and_find_hot() {
    let db = memory_db().await;
    let repo = ArticleRepositoryImpl::new(db);

    let mut tech = sample_article("https://example.com/hot/tech", "科技头条");
    tech.category = Some("tech".to_string());
    let finance = sample_article("https://example.com/hot/finance", "财经速递");
    let mut aged = sample_article("https://example.com/hot/aged", "旧闻");
    aged.ingested_at = (Utc::now() - Duration::days(10)).into();

    let tech = repo.create(&tech).await.unwrap();
    repo.create(&finance).await.unwrap();
    repo.create(&aged).await.unwrap();

    let now = Utc::now().into();
    assert!(repo.save_hot_score(tech.id, 7.0, now).await.unwrap());
    assert!(repo.save_hot_score(finance.id, 9.0, now).await.unwrap());
    assert!(repo.save_hot_score(aged.id, 5.0, now).await.unwrap());
    assert!(!repo.save_hot_score(Uuid::new_v4(), 1.0, now).await.unwrap());

    // 分数写入是派生值刷新，不改变updated_at
    let after_save = repo.find_by_id(tech.id).await.unwrap().unwrap();
    assert_eq!(after_save.updated_at, tech.updated_at);
    assert!(after_save.hot_score_computed_at.is_some());

    let ranked = repo
        .find_hot(HotQueryParams {
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    let scores: Vec<f64> = ranked.iter().map(|a| a.hot_score).collect();
    assert_eq!(scores, vec![9.0, 7.0, 5.0]);

    let top_two = repo
        .find_hot(HotQueryParams {
            limit: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(top_two.len(), 2);
    assert_eq!(top_two[0].id, finance.id);

    let tech_only = repo
        .find_hot(HotQueryParams {
            limit: 10,
            category: Some("tech".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(tech_only.len(), 1);
    assert_eq!(tech_only[0].id, tech.id);

    let recent = repo
        .find_hot(HotQueryParams {
            limit: 10,
            ingested_after: Some((Utc::now() - Duration::days(7)).into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(recent.iter().all(|a| a.id != aged.id));
    assert_eq!(recent.len(), 2);
}

/// 测试趋势榜候选查询
///
/// 验证find_active_since只返回窗口内有更新且浏览计数
/// 大于零的文章。
#[tokio::test]
async fn test_find_active_since_requires_views() {
    let db = memory_db().await;
    let repo = ArticleRepositoryImpl::new(db);

    let viewed = sample_article("https://example.com/active/viewed", "有浏览");
    repo.create(&viewed).await.unwrap();
    assert!(repo.increment_view(viewed.id).await.unwrap());

    let untouched = sample_article("https://example.com/active/untouched", "无浏览");
    repo.create(&untouched).await.unwrap();

    // 历史上有浏览但窗口内没有活动
    let mut stale = sample_article("https://example.com/active/stale", "窗口外");
    stale.view_count = 3;
    stale.updated_at = (Utc::now() - Duration::hours(48)).into();
    repo.create(&stale).await.unwrap();

    let active = repo
        .find_active_since((Utc::now() - Duration::hours(24)).into())
        .await
        .unwrap();

    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, viewed.id);
}

/// 测试重算窗口查询
///
/// 验证find_ingested_since只返回入库时间落在窗口内的文章。
#[tokio::test]
async fn test_find_ingested_since_window() {
    let db = memory_db().await;
    let repo = ArticleRepositoryImpl::new(db);

    let recent = sample_article("https://example.com/window/recent", "窗口内");
    repo.create(&recent).await.unwrap();
    let mut old = sample_article("https://example.com/window/old", "窗口外");
    old.ingested_at = (Utc::now() - Duration::days(10)).into();
    repo.create(&old).await.unwrap();

    let in_window = repo
        .find_ingested_since((Utc::now() - Duration::days(7)).into())
        .await
        .unwrap();

    assert_eq!(in_window.len(), 1);
    assert_eq!(in_window[0].id, recent.id);
}

/// 测试按ID列表查询
///
/// 验证find_by_ids返回存在的文章并忽略未知ID。
#[tokio::test]
async fn test_find_by_ids_ignores_unknown() {
    let db = memory_db().await;
    let repo = ArticleRepositoryImpl::new(db);

    let first = sample_article("https://example.com/ids/1", "第一篇");
    let second = sample_article("https://example.com/ids/2", "第二篇");
    repo.create(&first).await.unwrap();
    repo.create(&second).await.unwrap();

    let found = repo
        .find_by_ids(vec![first.id, Uuid::new_v4(), second.id])
        .await
        .unwrap();

    assert_eq!(found.len(), 2);
    assert!(found.iter().any(|a| a.id == first.id));
    assert!(found.iter().any(|a| a.id == second.id));
}
