// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::net::SocketAddr;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};

/// 初始化指标系统
///
/// 安装Prometheus导出器并注册应用所需的各类监控指标。
/// 端口被占用时只告警不中断启动，便于本地多实例调试。
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new();
    if let Err(e) = builder.with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }
    info!("Metrics exporter listening on {}", addr);

    // Job lifecycle metrics
    describe_counter!("jobs_submitted_total", "Total number of jobs submitted");
    describe_counter!("jobs_completed_total", "Total number of jobs completed successfully");
    describe_counter!("jobs_failed_total", "Total number of jobs that failed permanently");
    describe_counter!("jobs_retried_total", "Total number of job retry attempts");
    describe_counter!("jobs_revoked_total", "Total number of jobs revoked");
    describe_histogram!("job_duration_seconds", "Duration of job execution in seconds");
    describe_gauge!("queue_depth", "Number of queued jobs per queue");
    describe_gauge!("delayed_jobs", "Number of delayed jobs waiting to become ready");

    // Ranking and cache metrics
    describe_counter!("ranking_cache_hits_total", "Total ranking cache hits");
    describe_counter!("ranking_cache_misses_total", "Total ranking cache misses");
    describe_counter!("ranking_cache_errors_total", "Total ranking cache backend errors");
    describe_counter!("articles_ingested_total", "Total number of articles ingested");
    describe_counter!(
        "hot_score_recomputes_total",
        "Total number of hot score recomputations"
    );

    // Interaction metrics
    describe_counter!("article_views_total", "Total article view interactions");
    describe_counter!("article_likes_total", "Total article like interactions");
    describe_counter!("article_shares_total", "Total article share interactions");
}
