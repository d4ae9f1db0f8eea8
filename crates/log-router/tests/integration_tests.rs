//! 통합 테스트 -- 배치 입력부터 발행/스트림 기록까지 전체 흐름 검증

use std::sync::{Arc, OnceLock, Weak};

use logrelay_core::error::StoreError;
use logrelay_core::pipeline::{BatchHandler, JobContextResolver};
use logrelay_core::types::{JobContext, LogLine};
use logrelay_router::catalog::{GLOBAL_PATTERNS_KEY, connector_patterns_key};
use logrelay_router::context::{ExecutionContextResolver, ExecutionStateProvider, ExtraData};
use logrelay_router::{
    BatchStatus, LogRouter, LogRouterBuilder, LogStore, MemoryStore, RouterConfig, StoreOp,
};

const OOM_RECORD: &str = r#"{"pattern": "out of memory", "match_type": "contains",
    "human_readable_message": "GPU ran out of memory", "call_to_action": "Lower the batch size",
    "retry": true}"#;

fn job(id: &str, workflow: Option<&str>) -> Arc<dyn JobContextResolver> {
    let id = id.to_owned();
    let workflow = workflow.map(str::to_owned);
    Arc::new(move || JobContext::new(id.clone(), workflow.clone()))
}

fn build(store: Arc<dyn LogStore>, resolver: Arc<dyn JobContextResolver>) -> LogRouter {
    let config = RouterConfig {
        machine_id: "m1".to_owned(),
        worker_id: Some("w1".to_owned()),
        ..Default::default()
    };
    LogRouterBuilder::new()
        .config(config)
        .store(store)
        .resolver(resolver)
        .build()
        .expect("router should build")
}

fn batch(messages: &[&str]) -> Vec<LogLine> {
    messages
        .iter()
        .enumerate()
        .map(|(i, m)| LogLine::at(1_700_000_000.0 + i as f64, *m))
        .collect()
}

/// 메모리 부족 시나리오: 발행 2회, 스트림 기록 1회, 재실행 시 기록 없음
#[test]
fn oom_scenario_end_to_end() {
    // given
    let store = Arc::new(MemoryStore::new());
    store.seed_hash(GLOBAL_PATTERNS_KEY, "oom", OOM_RECORD);
    let router = build(store.clone(), job("j1", Some("wf-9")));
    let lines = batch(&["Loading model", "CUDA error: out of memory"]);

    // when
    let report = router.process_batch(&lines);

    // then
    assert_eq!(report.status, BatchStatus::Processed);
    assert_eq!(report.published, 2);
    assert_eq!(report.errors_written, 1);

    let published = store.published();
    assert_eq!(published.len(), 2);
    assert!(
        published
            .iter()
            .all(|(ch, _)| ch == "machine:m1:worker:w1:job:j1:logs")
    );
    let second: serde_json::Value = serde_json::from_str(&published[1].1).expect("json");
    assert_eq!(second["level"], "ERROR");
    assert_eq!(second["workflow_id"], "wf-9");

    let entries = store.stream("job:events:j1");
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.get("event_type"), Some("error"));
    assert_eq!(entry.get("pattern_matched"), Some("oom"));
    assert_eq!(entry.get("message"), Some("CUDA error: out of memory"));
    assert_eq!(entry.get("source"), Some("comfyui"));
    assert_eq!(entry.get("is_log_filter_only"), Some("false"));
    assert_eq!(entry.get("human_readable_message"), Some("GPU ran out of memory"));
    assert_eq!(entry.get("call_to_action"), Some("Lower the batch size"));
    assert_eq!(entry.get("retry"), Some("true"));
    assert_eq!(store.ttl("job:events:j1"), Some(3600));

    // when: 같은 배치를 다시 처리
    let report = router.process_batch(&lines);

    // then
    assert_eq!(report.published, 2);
    assert_eq!(report.errors_written, 0);
    assert_eq!(store.published().len(), 4);
    assert_eq!(store.stream("job:events:j1").len(), 1);
}

/// 문자열 플래그와 빈 메타데이터를 가진 레코드도 정상 기록
#[test]
fn hand_edited_record_still_detects_errors() {
    // given: retry가 문자열이고 설명이 빈 문자열인 레코드
    let store = Arc::new(MemoryStore::new());
    store.seed_hash(
        GLOBAL_PATTERNS_KEY,
        "oom",
        r#"{"pattern": "out of memory", "retry": "true", "human_readable_message": ""}"#,
    );
    let router = build(store.clone(), job("j1", None));

    // when
    let report = router.process_batch(&batch(&["CUDA error: out of memory"]));

    // then
    assert_eq!(report.errors_written, 1);
    let entries = store.stream("job:events:j1");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].get("retry"), Some("true"));
    assert_eq!(entries[0].get("human_readable_message"), None);
}

#[test]
fn no_context_means_no_publish_and_no_write() {
    let store = Arc::new(MemoryStore::new());
    store.seed_hash(GLOBAL_PATTERNS_KEY, "oom", OOM_RECORD);
    let router = build(store.clone(), Arc::new(|| -> Option<JobContext> { None }));

    router.handle_batch(&batch(&["CUDA error: out of memory"]));

    assert!(store.published().is_empty());
    assert_eq!(store.stream_len_total(), 0);
}

#[test]
fn blank_lines_are_ignored() {
    let store = Arc::new(MemoryStore::new());
    let router = build(store.clone(), job("j1", None));

    let report = router.process_batch(&batch(&["", " \t ", "real line"]));

    assert_eq!(report.skipped_empty, 2);
    assert_eq!(store.published().len(), 1);
}

#[test]
fn diagnostic_lines_are_neither_published_nor_matched() {
    let store = Arc::new(MemoryStore::new());
    store.seed_hash(GLOBAL_PATTERNS_KEY, "oom", OOM_RECORD);
    let router = build(store.clone(), job("j1", None));

    let report = router.process_batch(&batch(&[
        "META: [LogRouter] failed to append error event: out of memory",
    ]));

    assert_eq!(report.skipped_self, 1);
    assert!(store.published().is_empty());
    assert_eq!(store.stream_len_total(), 0);
    assert!(!router.has_written("j1"));
}

#[test]
fn marker_without_tag_is_published_but_never_matched() {
    let store = Arc::new(MemoryStore::new());
    store.seed_hash(GLOBAL_PATTERNS_KEY, "oom", OOM_RECORD);
    let router = build(store.clone(), job("j1", None));

    let report = router.process_batch(&batch(&["META: out of memory"]));

    assert_eq!(report.published, 1);
    assert_eq!(report.errors_written, 0);
    assert!(!router.has_written("j1"));
}

#[test]
fn store_down_at_startup_is_noop() {
    let store = Arc::new(MemoryStore::unavailable());
    store.seed_hash(GLOBAL_PATTERNS_KEY, "oom", OOM_RECORD);
    let router = build(store.clone(), job("j1", None));

    let report = router.process_batch(&batch(&["CUDA error: out of memory"]));

    assert_eq!(report.status, BatchStatus::Disabled);
    assert!(router.is_disabled());
    assert!(store.published().is_empty());
    assert_eq!(store.stream_len_total(), 0);
}

#[test]
fn connector_patterns_follow_global_patterns() {
    let store = Arc::new(MemoryStore::new());
    store.seed_hash(
        &connector_patterns_key("comfyui"),
        "node_error",
        r#"{"pattern": "error"}"#,
    );
    store.seed_hash(GLOBAL_PATTERNS_KEY, "oom", OOM_RECORD);
    let router = build(store.clone(), job("j1", None));

    router.process_batch(&batch(&["CUDA error: out of memory"]));

    let entries = store.stream("job:events:j1");
    assert_eq!(entries[0].get("pattern_matched"), Some("oom"));
}

#[test]
fn jobs_are_deduplicated_independently() {
    let store = Arc::new(MemoryStore::new());
    store.seed_hash(GLOBAL_PATTERNS_KEY, "oom", OOM_RECORD);
    let current = Arc::new(parking_lot::Mutex::new("j1".to_owned()));
    let resolver = {
        let current = Arc::clone(&current);
        Arc::new(move || JobContext::new(current.lock().clone(), None))
    };
    let router = build(store.clone(), resolver);

    router.process_batch(&batch(&["out of memory"]));
    *current.lock() = "j2".to_owned();
    router.process_batch(&batch(&["out of memory"]));

    assert_eq!(store.stream("job:events:j1").len(), 1);
    assert_eq!(store.stream("job:events:j2").len(), 1);
}

/// 발행 중에 라우터를 다시 호출하는 스토어
struct ReentrantStore {
    inner: MemoryStore,
    router: OnceLock<Weak<LogRouter>>,
    nested: parking_lot::Mutex<Vec<BatchStatus>>,
}

impl LogStore for ReentrantStore {
    fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping()
    }

    fn hash_entries(&self, key: &str) -> Result<Vec<(String, String)>, StoreError> {
        self.inner.hash_entries(key)
    }

    fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.inner.hash_set(key, field, value)
    }

    fn stream_append(&self, key: &str, fields: &[(String, String)]) -> Result<String, StoreError> {
        self.inner.stream_append(key, fields)
    }

    fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), StoreError> {
        self.inner.expire(key, ttl_secs)
    }

    fn publish(&self, channel: &str, payload: &str) -> Result<u64, StoreError> {
        if let Some(router) = self.router.get().and_then(Weak::upgrade) {
            let report = router.process_batch(&[LogLine::new("nested line")]);
            self.nested.lock().push(report.status);
        }
        self.inner.publish(channel, payload)
    }
}

#[test]
fn reentrant_batch_is_dropped() {
    let store = Arc::new(ReentrantStore {
        inner: MemoryStore::new(),
        router: OnceLock::new(),
        nested: parking_lot::Mutex::new(Vec::new()),
    });
    let router = Arc::new(build(store.clone(), job("j1", None)));
    store
        .router
        .set(Arc::downgrade(&router))
        .expect("router set once");

    let report = router.process_batch(&batch(&["outer line"]));

    assert_eq!(report.published, 1);
    assert_eq!(*store.nested.lock(), vec![BatchStatus::Reentrant]);
    assert_eq!(store.inner.published().len(), 1);
    assert_eq!(router.stats().reentrant_dropped, 1);

    // 가드가 풀렸으므로 다음 배치는 정상 처리
    store.nested.lock().clear();
    let report = router.process_batch(&batch(&["next line"]));
    assert_eq!(report.status, BatchStatus::Processed);
}

/// 특정 메시지에서 패닉하는 스토어
struct PoisonStore {
    inner: MemoryStore,
}

impl LogStore for PoisonStore {
    fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping()
    }

    fn hash_entries(&self, key: &str) -> Result<Vec<(String, String)>, StoreError> {
        self.inner.hash_entries(key)
    }

    fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.inner.hash_set(key, field, value)
    }

    fn stream_append(&self, key: &str, fields: &[(String, String)]) -> Result<String, StoreError> {
        self.inner.stream_append(key, fields)
    }

    fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), StoreError> {
        self.inner.expire(key, ttl_secs)
    }

    fn publish(&self, channel: &str, payload: &str) -> Result<u64, StoreError> {
        assert!(!payload.contains("poison"), "poisoned payload");
        self.inner.publish(channel, payload)
    }
}

#[test]
fn failing_line_does_not_stop_the_batch() {
    let store = Arc::new(PoisonStore {
        inner: MemoryStore::new(),
    });
    store.inner.seed_hash(GLOBAL_PATTERNS_KEY, "oom", OOM_RECORD);
    let router = build(store.clone(), job("j1", None));

    let report = router.process_batch(&batch(&["first", "poison pill", "out of memory"]));

    assert_eq!(report.line_failures, 1);
    assert_eq!(report.published, 2);
    assert_eq!(report.errors_written, 1);
    assert_eq!(store.inner.stream("job:events:j1").len(), 1);
}

#[test]
fn publish_outage_does_not_block_stream_write() {
    let store = Arc::new(MemoryStore::new());
    store.seed_hash(GLOBAL_PATTERNS_KEY, "oom", OOM_RECORD);
    let router = build(store.clone(), job("j1", None));
    store.fail(StoreOp::Publish);

    let report = router.process_batch(&batch(&["out of memory"]));

    assert_eq!(report.published, 0);
    assert_eq!(report.errors_written, 1);
}

/// 호스트 상태를 흉내 내는 제공자
struct HostState {
    executing: Option<ExtraData>,
    pending: Option<ExtraData>,
}

impl ExecutionStateProvider for HostState {
    fn executing(&self) -> Result<Option<ExtraData>, logrelay_core::error::ContextError> {
        Ok(self.executing.clone())
    }

    fn pending(&self) -> Result<Option<ExtraData>, logrelay_core::error::ContextError> {
        Ok(self.pending.clone())
    }
}

#[test]
fn pending_context_routes_validation_failures() {
    let store = Arc::new(MemoryStore::new());
    store.seed_hash(
        GLOBAL_PATTERNS_KEY,
        "missing_node",
        r#"{"pattern": "node type not found"}"#,
    );
    let resolver = ExecutionContextResolver::new(HostState {
        executing: None,
        pending: Some(ExtraData {
            job_id: Some("queued-7".to_owned()),
            workflow_id: None,
        }),
    });
    let router = build(store.clone(), Arc::new(resolver));

    router.process_batch(&batch(&["Prompt validation failed: node type not found"]));

    assert_eq!(store.stream("job:events:queued-7").len(), 1);
}
