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

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use futures::stream::{self, StreamExt};
use metrics::{counter, histogram};
use serde_json::json;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::domain::models::article::Article;
use crate::domain::models::envelope::{
    CleanupParams, CleanupTarget, FetchBatchParams, FetchOneParams, JobEnvelope, RecomputeParams,
    ReprocessParams,
};
use crate::domain::models::job::JobType;
use crate::domain::repositories::article_repository::ArticleRepository;
use crate::domain::repositories::job_history_repository::JobHistoryRepository;
use crate::domain::services::fetcher::{
    source_domain, validate_article_url, ArticleFetcher, ContentProcessor,
};
use crate::domain::services::lifecycle::LifecycleRecorder;
use crate::domain::services::ranking::RankingService;
use crate::queue::job_queue::JobBroker;
use crate::utils::errors::{JobError, WorkerError};
use crate::utils::retry_policy::RetryPolicy;
use crate::workers::worker::Worker;

/// 批量派发子任务时的并发上限
const FAN_OUT_CONCURRENCY: usize = 8;

/// 质量等级达到该值的文章不参与过期清理
const PRESERVED_QUALITY_LEVEL: i32 = 3;

/// 任务执行工作器
///
/// 从代理领取信封，按类型分发到对应的任务体，并通过生命周期
/// 记录器落历史。历史写入失败只告警不中断：记录器是观察者，
/// 不是执行的前置条件。
pub struct JobWorker<B, H, A>
where
    B: JobBroker + 'static,
    H: JobHistoryRepository + 'static,
    A: ArticleRepository + 'static,
{
    broker: Arc<B>,
    recorder: Arc<LifecycleRecorder<H>>,
    history: Arc<H>,
    articles: Arc<A>,
    ranking: Arc<RankingService<A>>,
    fetcher: Arc<dyn ArticleFetcher>,
    processor: Arc<dyn ContentProcessor>,
    source_urls: Vec<String>,
    job_timeout: Duration,
    poll_interval: Duration,
    worker_id: String,
}

impl<B, H, A> JobWorker<B, H, A>
where
    B: JobBroker + 'static,
    H: JobHistoryRepository + 'static,
    A: ArticleRepository + 'static,
{
    /// 创建新的任务执行工作器实例
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        broker: Arc<B>,
        recorder: Arc<LifecycleRecorder<H>>,
        history: Arc<H>,
        articles: Arc<A>,
        ranking: Arc<RankingService<A>>,
        fetcher: Arc<dyn ArticleFetcher>,
        processor: Arc<dyn ContentProcessor>,
        source_urls: Vec<String>,
        job_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            broker,
            recorder,
            history,
            articles,
            ranking,
            fetcher,
            processor,
            source_urls,
            job_timeout,
            poll_interval,
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }

    /// 运行工作器主循环
    pub async fn run_loop(&self) {
        info!("Job worker {} started", self.worker_id);

        loop {
            match self.process_next().await {
                Ok(processed) => {
                    if !processed {
                        sleep(self.poll_interval).await;
                    }
                }
                Err(e) => {
                    error!("Error claiming job: {}", e);
                    sleep(self.poll_interval).await;
                }
            }
        }
    }

    /// 领取并处理下一个信封
    ///
    /// 返回是否消费了一个信封（含丢弃已撤销的信封）。
    pub async fn process_next(&self) -> Result<bool, WorkerError> {
        let envelope = match self.broker.claim().await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => return Ok(false),
            Err(e) => return Err(WorkerError::BrokerError(e.to_string())),
        };

        if self.discard_if_revoked(&envelope).await {
            return Ok(true);
        }

        self.execute(envelope).await;
        Ok(true)
    }

    /// 信封已被撤销时丢弃它并将记录推进到Revoked
    async fn discard_if_revoked(&self, envelope: &JobEnvelope) -> bool {
        match self.broker.is_revoked(envelope.job_id).await {
            Ok(true) => {
                info!(job_id = %envelope.job_id, "Discarding revoked job");
                if let Err(e) = self.recorder.record_revoked(envelope).await {
                    warn!(job_id = %envelope.job_id, error = %e, "Failed to record revoked job");
                }
                if let Err(e) = self.broker.clear_revoked(envelope.job_id).await {
                    warn!(job_id = %envelope.job_id, error = %e, "Failed to clear revocation marker");
                }
                counter!("jobs_revoked_total").increment(1);
                true
            }
            Ok(false) => false,
            Err(e) => {
                // 撤销查询失败时照常执行：记录器的终态保护保证
                // 已落库的撤销结果不会被覆盖
                warn!(job_id = %envelope.job_id, error = %e, "Revocation check failed, executing anyway");
                false
            }
        }
    }

    /// 执行一个信封并根据结果推进生命周期记录
    #[instrument(skip(self, envelope), fields(job_id = %envelope.job_id, job_type = %envelope.job_type, attempt = envelope.attempt))]
    async fn execute(&self, envelope: JobEnvelope) {
        info!("Processing job");
        if let Err(e) = self.recorder.record_start(&envelope, &self.worker_id).await {
            warn!(error = %e, "Failed to record job start");
        }

        let started = std::time::Instant::now();
        let outcome = match tokio::time::timeout(self.job_timeout, self.dispatch(&envelope)).await {
            Ok(result) => result,
            Err(_) => Err(JobError::Timeout(self.job_timeout)),
        };
        histogram!("job_duration_seconds").record(started.elapsed().as_secs_f64());

        match outcome {
            Ok(result) => {
                info!("Job completed");
                if let Err(e) = self.recorder.record_success(&envelope, Some(result)).await {
                    warn!(error = %e, "Failed to record job success");
                }
                counter!("jobs_completed_total").increment(1);
            }
            Err(job_error) => self.handle_failure(envelope, job_error).await,
        }
    }

    /// 失败处理：预算内的可重试错误延迟重投，其余落Failure终态
    async fn handle_failure(&self, envelope: JobEnvelope, job_error: JobError) {
        let policy = RetryPolicy::for_job_type(envelope.job_type);
        let next_attempt = envelope.attempt + 1;
        let message = job_error.to_string();

        if policy.should_retry(&job_error, next_attempt) {
            let delay = policy.delay_for(&job_error, next_attempt);
            warn!(
                error = %message,
                next_attempt = next_attempt,
                delay_secs = delay.as_secs(),
                "Job failed, scheduling retry"
            );
            if let Err(e) = self
                .recorder
                .record_retry(&envelope, &message, next_attempt)
                .await
            {
                warn!(error = %e, "Failed to record job retry");
            }

            let retry_envelope = envelope.clone().next_attempt();
            match self.broker.enqueue_in(&retry_envelope, delay).await {
                Ok(()) => {
                    counter!("jobs_retried_total").increment(1);
                    return;
                }
                Err(e) => {
                    // 重投失败时任务必须落终态，否则凭空消失
                    error!(error = %e, "Failed to re-enqueue job for retry");
                }
            }
        }

        error!(error = %message, "Job failed permanently");
        if let Err(e) = self
            .recorder
            .record_failure(&envelope, &message, job_error.detail().as_deref())
            .await
        {
            warn!(error = %e, "Failed to record job failure");
        }
        counter!("jobs_failed_total").increment(1);
    }

    async fn dispatch(&self, envelope: &JobEnvelope) -> Result<serde_json::Value, JobError> {
        match envelope.job_type {
            JobType::FetchOne => self.run_fetch_one(envelope).await,
            JobType::FetchBatch => self.run_fetch_batch(envelope).await,
            JobType::ScheduledFetch => self.run_scheduled_fetch(envelope).await,
            JobType::Cleanup => self.run_cleanup(envelope).await,
            JobType::Reprocess => self.run_reprocess(envelope).await,
            JobType::RecomputeScores => self.run_recompute(envelope).await,
        }
    }

    /// 抓取单个URL并入库
    ///
    /// 以重定向后的最终URL去重：已有同URL文章时覆盖其内容类
    /// 字段，否则新建。两条路径都在落库后立即重算热度分数。
    async fn run_fetch_one(&self, envelope: &JobEnvelope) -> Result<serde_json::Value, JobError> {
        let params: FetchOneParams = parse_params(&envelope.kwargs)?;
        let requested = validate_article_url(&params.url)?;

        let page = self.fetcher.fetch(requested.as_str()).await?;
        let processed = self.processor.process(&page).await?;

        let final_url = Url::parse(&page.url).unwrap_or_else(|_| requested.clone());
        let domain = source_domain(&final_url);

        let (article_id, created) = match self.articles.find_by_url(&page.url).await? {
            Some(mut existing) => {
                existing.title = processed.title;
                existing.content = Some(processed.content);
                existing.source_domain = Some(domain);
                existing.category = processed.category;
                existing.quality_level = processed
                    .quality_level
                    .unwrap_or(existing.quality_level);
                existing.sentiment = processed.sentiment;
                let updated = self.articles.update_enrichment(&existing).await?;
                (updated.id, false)
            }
            None => {
                let mut article = Article::from_fetch(
                    page.url.clone(),
                    processed.title,
                    Some(processed.content),
                    Some(domain),
                );
                article.category = processed.category;
                article.quality_level = processed.quality_level.unwrap_or(1);
                article.sentiment = processed.sentiment;
                let stored = self.articles.create(&article).await?;
                counter!("articles_ingested_total").increment(1);
                (stored.id, true)
            }
        };

        self.ranking.update_one(article_id).await?;

        Ok(json!({
            "status": "success",
            "article_id": article_id,
            "url": page.url,
            "created": created,
        }))
    }

    /// 批量抓取：为每个URL派发一个单项抓取子任务后立即返回
    async fn run_fetch_batch(&self, envelope: &JobEnvelope) -> Result<serde_json::Value, JobError> {
        let params: FetchBatchParams = parse_params(&envelope.kwargs)?;

        let children: Vec<JobEnvelope> = params
            .urls
            .iter()
            .map(|url| {
                JobEnvelope::new(
                    JobType::FetchOne,
                    envelope.queue_name.clone(),
                    json!({ "url": url }),
                )
            })
            .collect();

        // 先把惰性的投递Future收集成Vec再交给buffer_unordered，
        // 绕开rustc对闭包高阶生命周期的已知限制（#102211）
        let enqueues: Vec<_> = children
            .iter()
            .map(|child| self.broker.enqueue(child))
            .collect();
        let results: Vec<_> = stream::iter(enqueues)
            .buffer_unordered(FAN_OUT_CONCURRENCY)
            .collect()
            .await;
        for result in results {
            result?;
        }

        let child_job_ids: Vec<Uuid> = children.iter().map(|c| c.job_id).collect();
        info!(spawned = child_job_ids.len(), "Fetch batch dispatched");

        Ok(json!({
            "status": "batch_dispatched",
            "spawned": child_job_ids.len(),
            "child_job_ids": child_job_ids,
        }))
    }

    /// 定时抓取：把配置的内容源打包成一个批量抓取任务
    async fn run_scheduled_fetch(
        &self,
        envelope: &JobEnvelope,
    ) -> Result<serde_json::Value, JobError> {
        if self.source_urls.is_empty() {
            info!("No source URLs configured, nothing to fetch");
            return Ok(json!({ "status": "no_sources_configured" }));
        }

        let batch = JobEnvelope::new(
            JobType::FetchBatch,
            envelope.queue_name.clone(),
            json!({ "urls": self.source_urls }),
        );
        self.broker.enqueue(&batch).await?;

        info!(
            sources = self.source_urls.len(),
            batch_job_id = %batch.job_id,
            "Scheduled fetch dispatched"
        );
        Ok(json!({
            "status": "scheduled_fetch_dispatched",
            "sources": self.source_urls.len(),
            "batch_job_id": batch.job_id,
        }))
    }

    /// 清理过期数据
    ///
    /// 文章清理只删窗口外的低质量文章，历史清理按时间窗口删。
    async fn run_cleanup(&self, envelope: &JobEnvelope) -> Result<serde_json::Value, JobError> {
        let params: CleanupParams = parse_params(&envelope.kwargs)?;
        let cutoff = (Utc::now() - ChronoDuration::days(i64::from(params.days))).into();

        let (target, deleted) = match params.target {
            CleanupTarget::Articles => {
                let deleted = self
                    .articles
                    .delete_older_than(cutoff, PRESERVED_QUALITY_LEVEL)
                    .await?;
                ("articles", deleted)
            }
            CleanupTarget::History => {
                let deleted = self.history.delete_older_than(cutoff).await?;
                ("history", deleted)
            }
        };

        info!(
            target = target,
            deleted = deleted,
            days = params.days,
            "Cleanup completed"
        );
        Ok(json!({
            "status": "cleanup_completed",
            "target": target,
            "deleted": deleted,
        }))
    }

    /// 对已入库文章重新运行内容分析
    ///
    /// 单篇失败不中断整批；请求中不存在的ID汇总在missing里返回。
    async fn run_reprocess(&self, envelope: &JobEnvelope) -> Result<serde_json::Value, JobError> {
        let params: ReprocessParams = parse_params(&envelope.kwargs)?;
        if params.article_ids.is_empty() {
            return Err(JobError::Validation(
                "article_ids must not be empty".to_string(),
            ));
        }

        let articles = self.articles.find_by_ids(params.article_ids.clone()).await?;
        let found: HashSet<Uuid> = articles.iter().map(|a| a.id).collect();
        let missing: Vec<Uuid> = params
            .article_ids
            .iter()
            .filter(|id| !found.contains(id))
            .copied()
            .collect();

        let mut updated = 0u64;
        for article in &articles {
            match self
                .processor
                .reprocess(&article.title, article.content.as_deref())
                .await
            {
                Ok(enriched) => {
                    let mut next = article.clone();
                    next.category = enriched.category;
                    next.quality_level = enriched.quality_level.unwrap_or(next.quality_level);
                    next.sentiment = enriched.sentiment;
                    self.articles.update_enrichment(&next).await?;
                    self.ranking.update_one(article.id).await?;
                    updated += 1;
                }
                Err(e) => {
                    error!(article_id = %article.id, error = %e, "Failed to reprocess article");
                }
            }
        }

        info!(
            updated = updated,
            missing = missing.len(),
            "Reprocessing completed"
        );
        Ok(json!({
            "status": "reprocessing_completed",
            "updated": updated,
            "missing": missing,
        }))
    }

    /// 批量重算回溯窗口内文章的热度分数
    async fn run_recompute(&self, envelope: &JobEnvelope) -> Result<serde_json::Value, JobError> {
        let params: RecomputeParams = parse_params(&envelope.kwargs)?;
        let updated = self
            .ranking
            .batch_recompute(i64::from(params.days_back))
            .await?;
        counter!("hot_score_recomputes_total").increment(updated);

        Ok(json!({
            "status": "recompute_completed",
            "updated_count": updated,
        }))
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(kwargs: &serde_json::Value) -> Result<T, JobError> {
    serde_json::from_value(kwargs.clone())
        .map_err(|e| JobError::Validation(format!("invalid job parameters: {}", e)))
}

#[async_trait]
impl<B, H, A> Worker for JobWorker<B, H, A>
where
    B: JobBroker + 'static,
    H: JobHistoryRepository + 'static,
    A: ArticleRepository + 'static,
{
    async fn run(&self) -> Result<(), WorkerError> {
        self.run_loop().await;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.worker_id
    }
}

#[cfg(test)]
#[path = "job_worker_test.rs"]
mod tests;
