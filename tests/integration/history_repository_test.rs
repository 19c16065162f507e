// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::memory_db;
use chrono::{Duration, Utc};
use feedrs::domain::models::envelope::JobEnvelope;
use feedrs::domain::models::job::{JobRecord, JobStatus, JobType};
use feedrs::domain::repositories::job_history_repository::{
    HistoryQueryParams, HistorySortField, JobHistoryRepository,
};
use feedrs::domain::services::lifecycle::LifecycleRecorder;
use feedrs::infrastructure::repositories::job_history_repo_impl::JobHistoryRepositoryImpl;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

fn fetch_envelope(url: &str) -> JobEnvelope {
    JobEnvelope::new(
        JobType::FetchOne,
        "default".to_string(),
        json!({ "url": url }),
    )
}

/// 测试记录的插入和查找
///
/// 验证插入后能按job_id取回完整记录，所有字段原样保留，
/// 查找不存在的ID返回None。
#[tokio::test]
async fn test_insert_and_find_round_trip() {
    let db = memory_db().await;
    let repo = JobHistoryRepositoryImpl::new(db);

    let record = JobRecord::new(
        Uuid::new_v4(),
        JobType::FetchBatch,
        "fetch".to_string(),
        json!([]),
        json!({ "urls": ["https://example.com/a", "https://example.com/b"] }),
    );
    repo.insert(&record).await.unwrap();

    let found = repo.find_by_job_id(record.job_id).await.unwrap().unwrap();
    assert_eq!(found.job_id, record.job_id);
    assert_eq!(found.job_type, JobType::FetchBatch);
    assert_eq!(found.queue_name, "fetch");
    assert_eq!(found.status, JobStatus::Pending);
    assert_eq!(found.kwargs, record.kwargs);
    assert_eq!(found.retry_count, 0);
    assert!(found.worker_id.is_none());
    assert!(found.started_at.is_none());
    assert!(found.completed_at.is_none());

    let missing = repo.find_by_job_id(Uuid::new_v4()).await.unwrap();
    assert!(missing.is_none());
}

/// 测试开始回调补建缺失记录
///
/// 验证提交阶段不落库的前提下，第一个到达的开始回调
/// 能按信封内容补建记录并直接推进到Running。
#[tokio::test]
async fn test_recorder_creates_missing_record_on_start() {
    let db = memory_db().await;
    let repo = Arc::new(JobHistoryRepositoryImpl::new(db));
    let recorder = LifecycleRecorder::new(repo.clone());

    let envelope = fetch_envelope("https://example.com/news/1");
    recorder.record_start(&envelope, "worker-1").await.unwrap();

    let found = repo.find_by_job_id(envelope.job_id).await.unwrap().unwrap();
    assert_eq!(found.status, JobStatus::Running);
    assert_eq!(found.worker_id.as_deref(), Some("worker-1"));
    assert_eq!(found.queue_name, "default");
    assert_eq!(found.kwargs, envelope.kwargs);
    assert_eq!(found.retry_count, 0);
    assert!(found.started_at.is_some());
    assert!(found.completed_at.is_none());
}

/// 测试两次重试后成功的完整回调链
///
/// 验证重试链 start→retry→start→retry→start→success 落库后，
/// 记录进入Success终态且retry_count等于实际重试次数。
#[tokio::test]
async fn test_recorder_retry_chain_keeps_final_count() {
    let db = memory_db().await;
    let repo = Arc::new(JobHistoryRepositoryImpl::new(db));
    let recorder = LifecycleRecorder::new(repo.clone());

    let envelope = fetch_envelope("https://example.com/news/2");
    recorder.record_start(&envelope, "worker-1").await.unwrap();
    recorder
        .record_retry(&envelope, "Request timed out", 1)
        .await
        .unwrap();

    let second = envelope.clone().next_attempt();
    recorder.record_start(&second, "worker-2").await.unwrap();
    recorder
        .record_retry(&second, "Request timed out", 2)
        .await
        .unwrap();

    let third = second.clone().next_attempt();
    recorder.record_start(&third, "worker-1").await.unwrap();
    recorder
        .record_success(&third, Some(json!({ "article_id": Uuid::new_v4() })))
        .await
        .unwrap();

    let found = repo.find_by_job_id(envelope.job_id).await.unwrap().unwrap();
    assert_eq!(found.status, JobStatus::Success);
    assert_eq!(found.retry_count, 2);
    assert!(found.result.is_some());
    assert!(found.completed_at.is_some());
    // 中间重试留下的错误消息不影响成功终态的判定
    assert_eq!(found.worker_id.as_deref(), Some("worker-1"));
}

/// 测试终态保护
///
/// 验证记录进入Success后，迟到的失败回调和开始回调
/// 都被静默忽略，终态字段不被改写。
#[tokio::test]
async fn test_terminal_record_ignores_late_callbacks() {
    let db = memory_db().await;
    let repo = Arc::new(JobHistoryRepositoryImpl::new(db));
    let recorder = LifecycleRecorder::new(repo.clone());

    let envelope = fetch_envelope("https://example.com/news/3");
    recorder.record_start(&envelope, "worker-1").await.unwrap();
    recorder
        .record_success(&envelope, Some(json!({ "status": "ok" })))
        .await
        .unwrap();

    // 重复投递的迟到回调
    recorder
        .record_failure(&envelope, "boom", Some("boom: connection reset"))
        .await
        .unwrap();
    recorder.record_start(&envelope, "worker-9").await.unwrap();

    let found = repo.find_by_job_id(envelope.job_id).await.unwrap().unwrap();
    assert_eq!(found.status, JobStatus::Success);
    assert!(found.error_message.is_none());
    assert!(found.error_detail.is_none());
    assert_eq!(found.worker_id.as_deref(), Some("worker-1"));
    assert_eq!(found.result, Some(json!({ "status": "ok" })));
}

/// 测试队列中取消的记录形态
///
/// 验证从未开始执行的任务被取消时，补建的记录started_at为空、
/// completed_at已写入，且后续按ID再取消保持Revoked不变。
#[tokio::test]
async fn test_revoked_without_start_has_no_started_at() {
    let db = memory_db().await;
    let repo = Arc::new(JobHistoryRepositoryImpl::new(db));
    let recorder = LifecycleRecorder::new(repo.clone());

    let envelope = fetch_envelope("https://example.com/news/4");
    recorder.record_revoked(&envelope).await.unwrap();

    let found = repo.find_by_job_id(envelope.job_id).await.unwrap().unwrap();
    assert_eq!(found.status, JobStatus::Revoked);
    assert!(found.started_at.is_none());
    assert!(found.completed_at.is_some());

    let again = recorder.revoke_by_id(envelope.job_id).await.unwrap();
    assert_eq!(again, Some(JobStatus::Revoked));
}

/// 测试按ID取消
///
/// 验证正在执行的记录能按ID推进到Revoked，
/// 不存在的ID返回None。
#[tokio::test]
async fn test_revoke_by_id_running_record() {
    let db = memory_db().await;
    let repo = Arc::new(JobHistoryRepositoryImpl::new(db));
    let recorder = LifecycleRecorder::new(repo.clone());

    let envelope = fetch_envelope("https://example.com/news/5");
    recorder.record_start(&envelope, "worker-1").await.unwrap();

    let revoked = recorder.revoke_by_id(envelope.job_id).await.unwrap();
    assert_eq!(revoked, Some(JobStatus::Revoked));

    let found = repo.find_by_job_id(envelope.job_id).await.unwrap().unwrap();
    assert_eq!(found.status, JobStatus::Revoked);
    assert!(found.started_at.is_some());
    assert!(found.completed_at.is_some());

    let missing = recorder.revoke_by_id(Uuid::new_v4()).await.unwrap();
    assert!(missing.is_none());
}

/// 测试按状态、类型和时间窗口过滤查询
///
/// 验证查询参数的各个过滤条件独立生效，总数统计
/// 与过滤条件一致。
#[tokio::test]
async fn test_query_filters_by_status_type_and_window() {
    let db = memory_db().await;
    let repo = JobHistoryRepositoryImpl::new(db);

    let success = JobRecord::new(
        Uuid::new_v4(),
        JobType::FetchOne,
        "default".to_string(),
        json!([]),
        json!({ "url": "https://example.com/a" }),
    )
    .succeed(None)
    .unwrap();
    let failure = JobRecord::new(
        Uuid::new_v4(),
        JobType::FetchOne,
        "default".to_string(),
        json!([]),
        json!({ "url": "https://example.com/b" }),
    )
    .fail("fetch failed", None)
    .unwrap();
    let cleanup = JobRecord::new(
        Uuid::new_v4(),
        JobType::Cleanup,
        "default".to_string(),
        json!([]),
        json!({ "days": 90 }),
    );
    let mut aged = JobRecord::new(
        Uuid::new_v4(),
        JobType::FetchOne,
        "default".to_string(),
        json!([]),
        json!({ "url": "https://example.com/old" }),
    );
    aged.created_at = (Utc::now() - Duration::hours(48)).into();

    repo.insert(&success).await.unwrap();
    repo.insert(&failure).await.unwrap();
    repo.insert(&cleanup).await.unwrap();
    repo.insert(&aged).await.unwrap();

    // 按状态过滤
    let (records, total) = repo
        .query(HistoryQueryParams {
            statuses: Some(vec![JobStatus::Success]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(records[0].job_id, success.job_id);

    // 按类型过滤
    let (records, total) = repo
        .query(HistoryQueryParams {
            job_types: Some(vec![JobType::Cleanup]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(records[0].job_id, cleanup.job_id);

    // 按时间窗口过滤，排除48小时前的记录
    let (records, total) = repo
        .query(HistoryQueryParams {
            created_after: Some((Utc::now() - Duration::hours(24)).into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 3);
    assert!(records.iter().all(|r| r.job_id != aged.job_id));

    // 组合过滤
    let (_, total) = repo
        .query(HistoryQueryParams {
            job_types: Some(vec![JobType::FetchOne]),
            statuses: Some(vec![JobStatus::Failure]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
}

/// 测试分页和排序
///
/// 验证limit/offset在总数不变的前提下切出正确的页，
/// 排序方向对created_at生效。
#[tokio::test]
async fn test_query_pagination_and_sort() {
    let db = memory_db().await;
    let repo = JobHistoryRepositoryImpl::new(db);

    // 5条记录，创建时间从旧到新间隔1小时
    let mut ids = Vec::new();
    for i in 0..5 {
        let mut record = JobRecord::new(
            Uuid::new_v4(),
            JobType::FetchOne,
            "default".to_string(),
            json!([]),
            json!({ "url": format!("https://example.com/page/{i}") }),
        );
        record.created_at = (Utc::now() - Duration::hours(5 - i)).into();
        repo.insert(&record).await.unwrap();
        ids.push(record.job_id);
    }

    // 默认按created_at降序，第一页是最新的两条
    let (page1, total) = repo
        .query(HistoryQueryParams {
            limit: 2,
            offset: 0,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 5);
    assert_eq!(page1.len(), 2);
    assert_eq!(page1[0].job_id, ids[4]);
    assert_eq!(page1[1].job_id, ids[3]);

    let (page2, total) = repo
        .query(HistoryQueryParams {
            limit: 2,
            offset: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 5);
    assert_eq!(page2[0].job_id, ids[2]);
    assert_eq!(page2[1].job_id, ids[1]);

    // 升序排列时最旧的记录在前
    let (asc, _) = repo
        .query(HistoryQueryParams {
            sort_by: HistorySortField::CreatedAt,
            sort_desc: false,
            limit: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(asc[0].job_id, ids[0]);
}

/// 测试按完成时间排序
///
/// 验证completed_at排序把未完成记录和已完成记录
/// 都纳入结果，已完成记录按完成时间排列。
#[tokio::test]
async fn test_query_sort_by_completed_at() {
    let db = memory_db().await;
    let repo = JobHistoryRepositoryImpl::new(db);

    let mut early = JobRecord::new(
        Uuid::new_v4(),
        JobType::FetchOne,
        "default".to_string(),
        json!([]),
        json!({ "url": "https://example.com/early" }),
    )
    .succeed(None)
    .unwrap();
    early.completed_at = Some((Utc::now() - Duration::hours(2)).into());
    let late = JobRecord::new(
        Uuid::new_v4(),
        JobType::FetchOne,
        "default".to_string(),
        json!([]),
        json!({ "url": "https://example.com/late" }),
    )
    .succeed(None)
    .unwrap();

    repo.insert(&early).await.unwrap();
    repo.insert(&late).await.unwrap();

    let (records, total) = repo
        .query(HistoryQueryParams {
            sort_by: HistorySortField::CompletedAt,
            sort_desc: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(records[0].job_id, late.job_id);
    assert_eq!(records[1].job_id, early.job_id);
}

/// 测试单条删除的存在性返回值
///
/// 验证首次删除返回true，重复删除同一ID返回false。
#[tokio::test]
async fn test_delete_by_job_id_reports_existence() {
    let db = memory_db().await;
    let repo = JobHistoryRepositoryImpl::new(db);

    let record = JobRecord::new(
        Uuid::new_v4(),
        JobType::FetchOne,
        "default".to_string(),
        json!([]),
        json!({ "url": "https://example.com/a" }),
    );
    repo.insert(&record).await.unwrap();

    assert!(repo.delete_by_job_id(record.job_id).await.unwrap());
    assert!(!repo.delete_by_job_id(record.job_id).await.unwrap());
    assert!(repo.find_by_job_id(record.job_id).await.unwrap().is_none());
}

/// 测试批量删除的结果划分
///
/// 验证混合存在与不存在的ID列表被划分为已删除
/// 和未找到两组。
#[tokio::test]
async fn test_delete_batch_partitions_deleted_and_missing() {
    let db = memory_db().await;
    let repo = JobHistoryRepositoryImpl::new(db);

    let mut existing = Vec::new();
    for i in 0..2 {
        let record = JobRecord::new(
            Uuid::new_v4(),
            JobType::FetchOne,
            "default".to_string(),
            json!([]),
            json!({ "url": format!("https://example.com/{i}") }),
        );
        repo.insert(&record).await.unwrap();
        existing.push(record.job_id);
    }
    let unknown = Uuid::new_v4();

    let (deleted, missing) = repo
        .delete_batch(vec![existing[0], unknown, existing[1]])
        .await
        .unwrap();

    assert_eq!(deleted.len(), 2);
    assert!(deleted.contains(&existing[0]));
    assert!(deleted.contains(&existing[1]));
    assert_eq!(missing, vec![unknown]);
}

/// 测试按时间清理历史记录
///
/// 验证删除只作用于创建时间早于截止点的记录，
/// 新记录不受影响。
#[tokio::test]
async fn test_delete_older_than_spares_recent_records() {
    let db = memory_db().await;
    let repo = JobHistoryRepositoryImpl::new(db);

    let mut aged = JobRecord::new(
        Uuid::new_v4(),
        JobType::FetchOne,
        "default".to_string(),
        json!([]),
        json!({ "url": "https://example.com/old" }),
    );
    aged.created_at = (Utc::now() - Duration::days(100)).into();
    let fresh = JobRecord::new(
        Uuid::new_v4(),
        JobType::FetchOne,
        "default".to_string(),
        json!([]),
        json!({ "url": "https://example.com/new" }),
    );
    repo.insert(&aged).await.unwrap();
    repo.insert(&fresh).await.unwrap();

    let cutoff = (Utc::now() - Duration::days(90)).into();
    let deleted = repo.delete_older_than(cutoff).await.unwrap();

    assert_eq!(deleted, 1);
    assert!(repo.find_by_job_id(aged.job_id).await.unwrap().is_none());
    assert!(repo.find_by_job_id(fresh.job_id).await.unwrap().is_some());
}

/// 测试按状态统计
///
/// 验证统计覆盖所有出现过的状态且数量准确，
/// 未出现的状态不产生条目。
#[tokio::test]
async fn test_count_by_status_groups_records() {
    let db = memory_db().await;
    let repo = JobHistoryRepositoryImpl::new(db);

    for i in 0..2 {
        let record = JobRecord::new(
            Uuid::new_v4(),
            JobType::FetchOne,
            "default".to_string(),
            json!([]),
            json!({ "url": format!("https://example.com/s/{i}") }),
        )
        .succeed(None)
        .unwrap();
        repo.insert(&record).await.unwrap();
    }
    let failed = JobRecord::new(
        Uuid::new_v4(),
        JobType::FetchBatch,
        "default".to_string(),
        json!([]),
        json!({ "urls": [] }),
    )
    .fail("no urls", None)
    .unwrap();
    repo.insert(&failed).await.unwrap();
    let pending = JobRecord::new(
        Uuid::new_v4(),
        JobType::Cleanup,
        "default".to_string(),
        json!([]),
        json!({ "days": 30 }),
    );
    repo.insert(&pending).await.unwrap();

    let counts: HashMap<JobStatus, u64> =
        repo.count_by_status().await.unwrap().into_iter().collect();

    assert_eq!(counts.get(&JobStatus::Success), Some(&2));
    assert_eq!(counts.get(&JobStatus::Failure), Some(&1));
    assert_eq!(counts.get(&JobStatus::Pending), Some(&1));
    assert_eq!(counts.get(&JobStatus::Running), None);
}
