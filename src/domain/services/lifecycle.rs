// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::models::envelope::JobEnvelope;
use crate::domain::models::job::{DomainError, JobRecord, JobStatus};
use crate::domain::repositories::job_history_repository::{
    JobHistoryRepository, RepositoryError,
};

/// 任务生命周期记录器
///
/// 把执行端的生命周期回调持久化为任务历史记录。所有回调共用
/// 同一个upsert原语：记录缺失时按信封内容补建（自愈），存在时
/// 沿状态机向前推进。回调可能因为重试、崩溃恢复或信号重复投递
/// 而零次或多次到达，记录器保证重复调用不改变结果，且终态一旦
/// 写入就不会被后续回调覆盖。
pub struct LifecycleRecorder<R: JobHistoryRepository> {
    repository: Arc<R>,
}

impl<R: JobHistoryRepository> LifecycleRecorder<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// 记录任务开始执行
    ///
    /// 记录缺失时补建并直接推进到Running。重复投递的开始回调
    /// 携带相同的尝试序号，retry_count取较大者因而保持不变；
    /// 序号推进则表明上一次执行的终态回调丢失。
    pub async fn record_start(
        &self,
        envelope: &JobEnvelope,
        worker_id: &str,
    ) -> Result<(), RepositoryError> {
        let attempt = envelope.attempt;
        let worker_id = worker_id.to_string();
        self.upsert(
            envelope,
            move |record| record.start(&worker_id, attempt),
        )
        .await
    }

    /// 记录任务成功结束
    pub async fn record_success(
        &self,
        envelope: &JobEnvelope,
        result: Option<serde_json::Value>,
    ) -> Result<(), RepositoryError> {
        self.upsert(envelope, move |record| record.succeed(result))
            .await
    }

    /// 记录任务失败结束
    ///
    /// `detail`携带完整错误链文本，供运维诊断；每个失败终态
    /// 都必须留下可读的原因。
    pub async fn record_failure(
        &self,
        envelope: &JobEnvelope,
        message: &str,
        detail: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let message = message.to_string();
        let detail = detail.map(|d| d.to_string());
        self.upsert(envelope, move |record| {
            record.fail(&message, detail.as_deref())
        })
        .await
    }

    /// 记录一次可重试失败
    ///
    /// 状态进入Retry，retry_count推进到即将投递的尝试序号，
    /// 不写completed_at。
    pub async fn record_retry(
        &self,
        envelope: &JobEnvelope,
        message: &str,
        next_attempt: i32,
    ) -> Result<(), RepositoryError> {
        let message = message.to_string();
        self.upsert(envelope, move |record| {
            record.mark_retry(&message, next_attempt)
        })
        .await
    }

    /// 记录任务被取消
    ///
    /// 用于取消时任务仍在队列中（信封可得）的场景：记录缺失时
    /// 补建的记录从未开始执行，started_at保持为空。
    pub async fn record_revoked(&self, envelope: &JobEnvelope) -> Result<(), RepositoryError> {
        self.upsert(envelope, |record| record.revoke()).await
    }

    /// 将已有记录推进到Revoked
    ///
    /// 取消时信封已不可得（任务正在执行或已结束）的场景。
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(status))` - 记录存在，返回其当前状态（已是
    ///   其他终态时保持不变）
    /// * `Ok(None)` - 记录不存在
    pub async fn revoke_by_id(
        &self,
        job_id: Uuid,
    ) -> Result<Option<JobStatus>, RepositoryError> {
        match self.repository.find_by_job_id(job_id).await? {
            None => Ok(None),
            Some(existing) => {
                let prior = existing.status;
                match existing.revoke() {
                    Ok(next) => {
                        let saved = self.repository.update(&next).await?;
                        Ok(Some(saved.status))
                    }
                    Err(_) => {
                        debug!(job_id = %job_id, status = %prior, "Revoke skipped, record already terminal");
                        Ok(Some(prior))
                    }
                }
            }
        }
    }

    /// 统一的upsert原语
    ///
    /// 记录存在时应用状态转换；不存在时按信封补建一条Pending
    /// 记录再应用转换。转换被状态机拒绝时不报错：终态记录收到
    /// 迟到回调属于正常的重复投递，降级为日志。
    async fn upsert(
        &self,
        envelope: &JobEnvelope,
        transition: impl FnOnce(JobRecord) -> Result<JobRecord, DomainError> + Send,
    ) -> Result<(), RepositoryError> {
        let job_id = envelope.job_id;
        match self.repository.find_by_job_id(job_id).await? {
            Some(existing) => {
                let current = existing.status;
                match transition(existing) {
                    Ok(next) => {
                        self.repository.update(&next).await?;
                    }
                    Err(_) if current.is_terminal() => {
                        debug!(job_id = %job_id, status = %current, "Ignoring lifecycle callback for terminal record");
                    }
                    Err(e) => {
                        warn!(job_id = %job_id, status = %current, error = %e, "Ignoring out-of-order lifecycle callback");
                    }
                }
            }
            None => {
                let base = JobRecord::new(
                    job_id,
                    envelope.job_type,
                    envelope.queue_name.clone(),
                    envelope.args.clone(),
                    envelope.kwargs.clone(),
                );
                match transition(base) {
                    Ok(record) => {
                        self.repository.insert(&record).await?;
                    }
                    Err(e) => {
                        warn!(job_id = %job_id, error = %e, "Discarding lifecycle callback with no applicable record");
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::job::JobType;
    use crate::domain::repositories::job_history_repository::HistoryQueryParams;
    use async_trait::async_trait;
    use chrono::{DateTime, FixedOffset};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// 基于内存HashMap的历史仓库，用于在不接数据库的情况下
    /// 验证记录器的状态机行为
    #[derive(Default)]
    struct InMemoryHistoryRepository {
        records: Mutex<HashMap<Uuid, JobRecord>>,
    }

    #[async_trait]
    impl JobHistoryRepository for InMemoryHistoryRepository {
        async fn insert(&self, record: &JobRecord) -> Result<JobRecord, RepositoryError> {
            self.records
                .lock()
                .unwrap()
                .insert(record.job_id, record.clone());
            Ok(record.clone())
        }

        async fn update(&self, record: &JobRecord) -> Result<JobRecord, RepositoryError> {
            let mut records = self.records.lock().unwrap();
            if !records.contains_key(&record.job_id) {
                return Err(RepositoryError::NotFound);
            }
            records.insert(record.job_id, record.clone());
            Ok(record.clone())
        }

        async fn find_by_job_id(
            &self,
            job_id: Uuid,
        ) -> Result<Option<JobRecord>, RepositoryError> {
            Ok(self.records.lock().unwrap().get(&job_id).cloned())
        }

        async fn query(
            &self,
            _params: HistoryQueryParams,
        ) -> Result<(Vec<JobRecord>, u64), RepositoryError> {
            let records: Vec<JobRecord> =
                self.records.lock().unwrap().values().cloned().collect();
            let total = records.len() as u64;
            Ok((records, total))
        }

        async fn delete_by_job_id(&self, job_id: Uuid) -> Result<bool, RepositoryError> {
            Ok(self.records.lock().unwrap().remove(&job_id).is_some())
        }

        async fn delete_batch(
            &self,
            job_ids: Vec<Uuid>,
        ) -> Result<(Vec<Uuid>, Vec<Uuid>), RepositoryError> {
            let mut records = self.records.lock().unwrap();
            let mut deleted = Vec::new();
            let mut missing = Vec::new();
            for id in job_ids {
                if records.remove(&id).is_some() {
                    deleted.push(id);
                } else {
                    missing.push(id);
                }
            }
            Ok((deleted, missing))
        }

        async fn delete_older_than(
            &self,
            cutoff: DateTime<FixedOffset>,
        ) -> Result<u64, RepositoryError> {
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|_, r| r.created_at >= cutoff);
            Ok((before - records.len()) as u64)
        }

        async fn count_by_status(&self) -> Result<Vec<(JobStatus, u64)>, RepositoryError> {
            let mut counts: HashMap<JobStatus, u64> = HashMap::new();
            for record in self.records.lock().unwrap().values() {
                *counts.entry(record.status).or_insert(0) += 1;
            }
            Ok(counts.into_iter().collect())
        }
    }

    fn envelope(job_type: JobType) -> JobEnvelope {
        JobEnvelope::new(
            job_type,
            "default".to_string(),
            serde_json::json!({"url": "https://example.com/news"}),
        )
    }

    fn recorder() -> (
        LifecycleRecorder<InMemoryHistoryRepository>,
        Arc<InMemoryHistoryRepository>,
    ) {
        let repo = Arc::new(InMemoryHistoryRepository::default());
        (LifecycleRecorder::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn test_record_start_creates_running_record() {
        // Given: 一个尚无历史记录的任务
        let (recorder, repo) = recorder();
        let env = envelope(JobType::FetchOne);

        // When: 开始回调到达
        recorder.record_start(&env, "worker-0").await.unwrap();

        // Then: 记录补建为Running，尝试计数为0
        let record = repo.find_by_job_id(env.job_id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Running);
        assert_eq!(record.retry_count, 0);
        assert!(record.started_at.is_some());
        assert!(record.completed_at.is_none());
        assert_eq!(record.worker_id.as_deref(), Some("worker-0"));
    }

    #[tokio::test]
    async fn test_record_start_is_idempotent_for_same_attempt() {
        // Given: 开始回调已经处理过一次
        let (recorder, repo) = recorder();
        let env = envelope(JobType::FetchOne);
        recorder.record_start(&env, "worker-0").await.unwrap();

        // When: 同一尝试的开始回调重复投递
        recorder.record_start(&env, "worker-0").await.unwrap();

        // Then: 状态与计数不变
        let record = repo.find_by_job_id(env.job_id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Running);
        assert_eq!(record.retry_count, 0);
    }

    #[tokio::test]
    async fn test_retry_cycle_counts_each_attempt_once() {
        // Given: 一个会超时两次、第三次成功的任务
        let (recorder, repo) = recorder();
        let env = envelope(JobType::FetchOne);

        // When: 完整的三次尝试生命周期依次到达
        recorder.record_start(&env, "worker-0").await.unwrap();
        recorder
            .record_retry(&env, "fetch timed out", 1)
            .await
            .unwrap();
        let env = env.next_attempt();
        recorder.record_start(&env, "worker-1").await.unwrap();
        recorder
            .record_retry(&env, "fetch timed out", 2)
            .await
            .unwrap();
        let env = env.next_attempt();
        recorder.record_start(&env, "worker-0").await.unwrap();
        recorder
            .record_success(&env, Some(serde_json::json!({"status": "ok"})))
            .await
            .unwrap();

        // Then: 终态为Success，重试计数恰为2
        let record = repo.find_by_job_id(env.job_id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Success);
        assert_eq!(record.retry_count, 2);
        assert!(record.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_success_callback_self_heals_missing_record() {
        // Given: 开始回调因崩溃丢失，记录不存在
        let (recorder, repo) = recorder();
        let env = envelope(JobType::Cleanup);

        // When: 只有成功回调到达
        recorder
            .record_success(&env, Some(serde_json::json!({"deleted": 12})))
            .await
            .unwrap();

        // Then: 记录按信封补建并直接进入Success
        let record = repo.find_by_job_id(env.job_id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Success);
        assert_eq!(record.job_type, JobType::Cleanup);
        assert_eq!(record.result, Some(serde_json::json!({"deleted": 12})));
        assert!(record.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_terminal_status_is_never_overwritten() {
        // Given: 任务已经成功结束
        let (recorder, repo) = recorder();
        let env = envelope(JobType::FetchOne);
        recorder.record_start(&env, "worker-0").await.unwrap();
        recorder.record_success(&env, None).await.unwrap();

        // When: 迟到的失败、重试、开始回调相继投递
        recorder
            .record_failure(&env, "stale failure", None)
            .await
            .unwrap();
        recorder.record_retry(&env, "stale retry", 1).await.unwrap();
        recorder.record_start(&env, "worker-9").await.unwrap();

        // Then: 终态保持Success，重试计数不变
        let record = repo.find_by_job_id(env.job_id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Success);
        assert_eq!(record.retry_count, 0);
        assert_eq!(record.worker_id.as_deref(), Some("worker-0"));
    }

    #[tokio::test]
    async fn test_failure_records_message_and_detail() {
        let (recorder, repo) = recorder();
        let env = envelope(JobType::FetchOne);
        recorder.record_start(&env, "worker-0").await.unwrap();
        recorder
            .record_failure(&env, "connection refused", Some("stack: fetch -> connect"))
            .await
            .unwrap();

        let record = repo.find_by_job_id(env.job_id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Failure);
        assert_eq!(record.error_message.as_deref(), Some("connection refused"));
        assert_eq!(
            record.error_detail.as_deref(),
            Some("stack: fetch -> connect")
        );
    }

    #[tokio::test]
    async fn test_revoked_pending_record_has_no_started_at() {
        // Given: 任务已提交但尚未被认领
        let (recorder, repo) = recorder();
        let env = envelope(JobType::FetchBatch);

        // When: 取消请求带着仍在队列中的信封到达
        recorder.record_revoked(&env).await.unwrap();

        // Then: 记录进入Revoked终态，从未开始执行
        let record = repo.find_by_job_id(env.job_id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Revoked);
        assert!(record.started_at.is_none());
        assert!(record.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_revoke_by_id_on_running_record() {
        let (recorder, repo) = recorder();
        let env = envelope(JobType::FetchOne);
        recorder.record_start(&env, "worker-0").await.unwrap();

        let status = recorder.revoke_by_id(env.job_id).await.unwrap();
        assert_eq!(status, Some(JobStatus::Revoked));

        // 之后到达的成功回调不能再改写终态
        recorder.record_success(&env, None).await.unwrap();
        let record = repo.find_by_job_id(env.job_id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Revoked);
    }

    #[tokio::test]
    async fn test_revoke_by_id_unknown_job() {
        let (recorder, _repo) = recorder();
        let status = recorder.revoke_by_id(Uuid::new_v4()).await.unwrap();
        assert_eq!(status, None);
    }

    #[tokio::test]
    async fn test_crash_resume_resets_started_at() {
        // Given: 上一次执行的终态回调丢失，记录停留在Running
        let (recorder, repo) = recorder();
        let env = envelope(JobType::FetchOne);
        recorder.record_start(&env, "worker-0").await.unwrap();
        let first_started = repo
            .find_by_job_id(env.job_id)
            .await
            .unwrap()
            .unwrap()
            .started_at;

        // When: 队列重新投递，另一个工作者开始执行
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        recorder.record_start(&env, "worker-3").await.unwrap();

        // Then: started_at被重置，执行者更新
        let record = repo.find_by_job_id(env.job_id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Running);
        assert_eq!(record.worker_id.as_deref(), Some("worker-3"));
        assert!(record.started_at >= first_started);
    }
}
