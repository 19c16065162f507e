// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::infrastructure::repositories::article_repo_impl::ArticleRepositoryImpl;
use crate::infrastructure::repositories::job_history_repo_impl::JobHistoryRepositoryImpl;
use crate::presentation::handlers::{article_handler, history_handler, job_handler, stats_handler};
use crate::queue::job_queue::RedisJobBroker;
use axum::{
    routing::{delete, get, post},
    Router,
};

/// 创建应用路由
///
/// 处理器是泛型的，这里用具体的仓库和代理实现实例化；
/// 对应的Extension在main中注入。
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/version", get(version));

    let job_routes = Router::new()
        .route(
            "/api/jobs/fetch",
            post(job_handler::submit_fetch::<RedisJobBroker>),
        )
        .route(
            "/api/jobs/fetch/batch",
            post(job_handler::submit_fetch_batch::<RedisJobBroker>),
        )
        .route(
            "/api/jobs/reprocess",
            post(job_handler::submit_reprocess::<RedisJobBroker>),
        )
        .route(
            "/api/jobs/{job_id}",
            get(job_handler::get_job_status::<JobHistoryRepositoryImpl>),
        )
        .route(
            "/api/jobs/{job_id}",
            delete(job_handler::cancel_job::<RedisJobBroker, JobHistoryRepositoryImpl>),
        );

    let history_routes = Router::new()
        .route(
            "/api/history",
            get(history_handler::list_history::<JobHistoryRepositoryImpl>),
        )
        .route(
            "/api/history/{job_id}",
            get(history_handler::get_history_detail::<JobHistoryRepositoryImpl>),
        )
        .route(
            "/api/history/{job_id}",
            delete(history_handler::delete_history::<JobHistoryRepositoryImpl>),
        )
        .route(
            "/api/history/delete-batch",
            post(history_handler::delete_history_batch::<JobHistoryRepositoryImpl>),
        )
        .route(
            "/api/history/cleanup",
            post(history_handler::cleanup_history::<RedisJobBroker>),
        );

    let article_routes = Router::new()
        .route(
            "/api/articles/hot",
            get(article_handler::get_hot_articles::<ArticleRepositoryImpl>),
        )
        .route(
            "/api/articles/trending",
            get(article_handler::get_trending_articles::<ArticleRepositoryImpl>),
        )
        .route(
            "/api/articles/recompute",
            post(article_handler::recompute_scores::<ArticleRepositoryImpl>),
        )
        .route(
            "/api/articles/{id}/view",
            post(article_handler::record_view::<ArticleRepositoryImpl>),
        )
        .route(
            "/api/articles/{id}/like",
            post(article_handler::record_like::<ArticleRepositoryImpl>),
        )
        .route(
            "/api/articles/{id}/share",
            post(article_handler::record_share::<ArticleRepositoryImpl>),
        )
        .route(
            "/api/articles/{id}/stats",
            get(article_handler::get_article_stats::<ArticleRepositoryImpl>),
        );

    let stats_routes = Router::new().route(
        "/api/queue/stats",
        get(stats_handler::queue_stats::<RedisJobBroker, JobHistoryRepositoryImpl>),
    );

    Router::new()
        .merge(public_routes)
        .merge(job_routes)
        .merge(history_routes)
        .merge(article_routes)
        .merge(stats_routes)
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
