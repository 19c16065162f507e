// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::article_request::{
    HotQueryDto, InteractionResponseDto, LikeRequestDto, RecomputeRequestDto, RecomputeResponseDto,
    TrendingQueryDto,
};
use crate::domain::repositories::article_repository::ArticleRepository;
use crate::domain::repositories::job_history_repository::RepositoryError;
use crate::domain::services::ranking::{ArticleStats, RankedArticle, RankingService, TrendingArticle};
use crate::presentation::errors::AppError;
use anyhow;
use axum::extract::{Extension, Path, Query};
use axum::Json;
use metrics::counter;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// 文章浏览计数处理器
pub async fn record_view<A: ArticleRepository>(
    Extension(ranking): Extension<Arc<RankingService<A>>>,
    Path(article_id): Path<Uuid>,
) -> Result<Json<InteractionResponseDto>, AppError> {
    if !ranking.record_view(article_id).await? {
        return Err(RepositoryError::NotFound.into());
    }
    counter!("article_views_total").increment(1);

    Ok(Json(InteractionResponseDto {
        article_id,
        action: "view".to_string(),
        applied: true,
    }))
}

/// 文章点赞/取消点赞处理器
pub async fn record_like<A: ArticleRepository>(
    Extension(ranking): Extension<Arc<RankingService<A>>>,
    Path(article_id): Path<Uuid>,
    Json(request): Json<LikeRequestDto>,
) -> Result<Json<InteractionResponseDto>, AppError> {
    if !ranking.record_like(article_id, request.is_like).await? {
        return Err(RepositoryError::NotFound.into());
    }
    counter!("article_likes_total").increment(1);

    let action = if request.is_like { "like" } else { "unlike" };
    Ok(Json(InteractionResponseDto {
        article_id,
        action: action.to_string(),
        applied: true,
    }))
}

/// 文章分享计数处理器
pub async fn record_share<A: ArticleRepository>(
    Extension(ranking): Extension<Arc<RankingService<A>>>,
    Path(article_id): Path<Uuid>,
) -> Result<Json<InteractionResponseDto>, AppError> {
    if !ranking.record_share(article_id).await? {
        return Err(RepositoryError::NotFound.into());
    }
    counter!("article_shares_total").increment(1);

    Ok(Json(InteractionResponseDto {
        article_id,
        action: "share".to_string(),
        applied: true,
    }))
}

/// 热榜查询处理器
pub async fn get_hot_articles<A: ArticleRepository>(
    Extension(ranking): Extension<Arc<RankingService<A>>>,
    Query(request): Query<HotQueryDto>,
) -> Result<Json<Vec<RankedArticle>>, AppError> {
    // 验证请求参数
    if let Err(errors) = request.validate() {
        return Err(AppError::from(anyhow::anyhow!(
            "Validation error: {:?}",
            errors
        )));
    }

    // 时间窗口只接受固定档位
    if let Some(range) = &request.time_range {
        if !matches!(range.as_str(), "1d" | "7d" | "30d") {
            return Err(AppError::from(anyhow::anyhow!(
                "invalid time_range: {}",
                range
            )));
        }
    }

    let articles = ranking
        .get_hot(
            request.limit.unwrap_or(10),
            request.category.clone(),
            request.time_range.clone(),
        )
        .await?;

    Ok(Json(articles))
}

/// 趋势榜查询处理器
pub async fn get_trending_articles<A: ArticleRepository>(
    Extension(ranking): Extension<Arc<RankingService<A>>>,
    Query(request): Query<TrendingQueryDto>,
) -> Result<Json<Vec<TrendingArticle>>, AppError> {
    // 验证请求参数
    if let Err(errors) = request.validate() {
        return Err(AppError::from(anyhow::anyhow!(
            "Validation error: {:?}",
            errors
        )));
    }

    let articles = ranking
        .get_trending(request.limit.unwrap_or(10), request.hours.unwrap_or(24))
        .await?;

    Ok(Json(articles))
}

/// 单篇文章统计查询处理器
pub async fn get_article_stats<A: ArticleRepository>(
    Extension(ranking): Extension<Arc<RankingService<A>>>,
    Path(article_id): Path<Uuid>,
) -> Result<Json<ArticleStats>, AppError> {
    let stats = ranking
        .article_stats(article_id)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    Ok(Json(stats))
}

/// 批量重算热度分数处理器
///
/// 同步执行：重算窗口内的文章量有限，直接在请求内完成并
/// 返回更新数量。
pub async fn recompute_scores<A: ArticleRepository>(
    Extension(ranking): Extension<Arc<RankingService<A>>>,
    Json(request): Json<RecomputeRequestDto>,
) -> Result<Json<RecomputeResponseDto>, AppError> {
    // 验证请求参数
    if let Err(errors) = request.validate() {
        return Err(AppError::from(anyhow::anyhow!(
            "Validation error: {:?}",
            errors
        )));
    }

    let days_back = request.days_back.unwrap_or(7);
    let updated_count = ranking.batch_recompute(i64::from(days_back)).await?;
    counter!("hot_score_recomputes_total").increment(updated_count);
    info!(days_back, updated_count, "Hot scores recomputed");

    Ok(Json(RecomputeResponseDto { updated_count }))
}
