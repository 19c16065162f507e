// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::Extension;
use feedrs::config::settings::Settings;
use feedrs::domain::services::fetcher::{ArticleFetcher, ContentProcessor};
use feedrs::domain::services::hot_score::HotScoreEngine;
use feedrs::domain::services::lifecycle::LifecycleRecorder;
use feedrs::domain::services::ranking::RankingService;
use feedrs::infrastructure::cache::ranking_cache::RankingCache;
use feedrs::infrastructure::cache::redis_client::RedisClient;
use feedrs::infrastructure::database::connection;
use feedrs::infrastructure::fetch::http_fetcher::HttpFetcher;
use feedrs::infrastructure::fetch::keyword_processor::KeywordProcessor;
use feedrs::infrastructure::observability::metrics::init_metrics;
use feedrs::infrastructure::repositories::article_repo_impl::ArticleRepositoryImpl;
use feedrs::infrastructure::repositories::job_history_repo_impl::JobHistoryRepositoryImpl;
use feedrs::presentation::routes;
use feedrs::queue::job_queue::RedisJobBroker;
use feedrs::queue::scheduler::JobScheduler;
use feedrs::utils::telemetry;
use feedrs::workers::job_worker::JobWorker;
use feedrs::workers::manager::WorkerManager;
use feedrs::workers::queue_monitor::QueueMonitor;
use migration::{Migrator, MigratorTrait};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting feedrs...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // Initialize Prometheus metrics exporter
    let metrics_addr: SocketAddr =
        format!("{}:{}", settings.server.host, settings.server.metrics_port).parse()?;
    init_metrics(metrics_addr);

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    // Run database migrations
    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Initialize Redis client
    let redis_client = RedisClient::new(&settings.redis.url).await?;
    info!("Redis client initialized");

    // 5. Initialize repositories and services
    let history_repo = Arc::new(JobHistoryRepositoryImpl::new(db.clone()));
    let article_repo = Arc::new(ArticleRepositoryImpl::new(db.clone()));
    let recorder = Arc::new(LifecycleRecorder::new(history_repo.clone()));
    let ranking = Arc::new(RankingService::new(
        article_repo.clone(),
        HotScoreEngine::default(),
        RankingCache::new(redis_client.clone()),
    ));
    let broker = Arc::new(RedisJobBroker::new(
        redis_client.clone(),
        settings.workers.queues.clone(),
    ));

    let fetcher: Arc<dyn ArticleFetcher> = Arc::new(HttpFetcher::new(Duration::from_secs(
        settings.workers.fetch_timeout_secs,
    ))?);
    let processor: Arc<dyn ContentProcessor> = Arc::new(KeywordProcessor);

    // 6. Start workers
    let mut manager = WorkerManager::new();
    for _ in 0..settings.workers.count {
        let worker = Arc::new(JobWorker::new(
            broker.clone(),
            recorder.clone(),
            history_repo.clone(),
            article_repo.clone(),
            ranking.clone(),
            fetcher.clone(),
            processor.clone(),
            settings.sources.urls.clone(),
            Duration::from_secs(settings.workers.job_timeout_secs),
            Duration::from_secs(settings.workers.poll_interval_secs),
        ));
        manager.spawn(worker);
    }
    manager.spawn(Arc::new(QueueMonitor::new(
        broker.clone(),
        Duration::from_secs(15),
    )));
    info!("Started {} job workers", settings.workers.count);

    // 7. Start scheduler loops
    if settings.scheduler.enabled {
        let scheduler = JobScheduler::from_settings(broker.clone(), &settings)?;
        manager.adopt(scheduler.start());
        info!("Scheduler started");
    }

    // 8. Start HTTP server
    let app = routes::routes()
        .layer(TraceLayer::new_for_http())
        .layer(Extension(broker.clone()))
        .layer(Extension(history_repo.clone()))
        .layer(Extension(recorder.clone()))
        .layer(Extension(ranking.clone()))
        .layer(Extension(settings.clone()));

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        () = manager.wait_for_shutdown() => {}
    }

    Ok(())
}
