//! 라우터 오케스트레이션 -- 배치 단위 전달/매칭/기록 흐름을 관리합니다.
//!
//! [`LogRouter`]는 core의 [`BatchHandler`] trait을 구현하여 호스트의 플러시 콜백에
//! 그대로 연결됩니다. 어떤 실패도 호출자에게 전파하지 않습니다.
//!
//! # 내부 흐름
//! ```text
//! batch -> guard -> resolve context -> per line:
//!     skip(blank, self) -> level -> PubSubPublisher
//!                       -> (context && unwritten) PatternCatalog -> StreamWriter -> DedupTracker
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

use logrelay_core::metrics as m;
use logrelay_core::pipeline::{BatchHandler, HealthStatus, JobContextResolver};
use logrelay_core::types::{JobContext, LogLevel, LogLine};

use crate::COMPONENT_TAG;
use crate::catalog::{LoadSummary, PatternCatalog, default_patterns};
use crate::config::RouterConfig;
use crate::dedup::DedupTracker;
use crate::delivery::{ErrorEvent, PubSubPublisher, StreamWriter};
use crate::error::LogRouterError;
use crate::store::LogStore;

/// 라우터 동작 모드
enum RouterMode {
    /// 스토어에 닿지 못했거나 비활성화됨. 모든 배치를 무시합니다.
    Disabled { reason: String },
    /// 전달과 매칭을 수행
    Active(Box<ActiveRouting>),
}

struct ActiveRouting {
    catalog: PatternCatalog,
    publisher: PubSubPublisher,
    stream: StreamWriter,
    source_tag: String,
}

/// 배치 처리 결과 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// 정상 처리
    Processed,
    /// 이미 처리 중이라 버림
    Reentrant,
    /// 비활성 라우터
    Disabled,
    /// 종료된 라우터
    Closed,
}

/// 배치 하나의 처리 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// 처리 상태
    pub status: BatchStatus,
    /// 배치가 귀속된 작업 ID
    pub job_id: Option<String>,
    /// 배치의 라인 수
    pub lines: usize,
    /// 빈 라인으로 건너뛴 수
    pub skipped_empty: usize,
    /// 자체 진단 라인으로 건너뛴 수
    pub skipped_self: usize,
    /// 발행에 성공한 라인 수
    pub published: usize,
    /// 스트림에 기록한 에러 이벤트 수
    pub errors_written: usize,
    /// 이미 기록된 작업이라 매칭을 건너뛴 라인 수
    pub dedup_suppressed: usize,
    /// 처리 중 실패한 라인 수
    pub line_failures: usize,
}

impl BatchReport {
    fn new(status: BatchStatus, lines: usize) -> Self {
        Self {
            status,
            job_id: None,
            lines,
            skipped_empty: 0,
            skipped_self: 0,
            published: 0,
            errors_written: 0,
            dedup_suppressed: 0,
            line_failures: 0,
        }
    }
}

/// 라인 하나의 처리 결과
enum LineOutcome {
    SkippedEmpty,
    SkippedSelf,
    Routed {
        published: bool,
        write: WriteOutcome,
    },
}

enum WriteOutcome {
    /// 컨텍스트가 없거나 매칭되지 않음
    None,
    /// 이미 기록된 작업
    Suppressed,
    Written,
    Failed,
}

#[derive(Default)]
struct RouterStats {
    batches: AtomicU64,
    lines: AtomicU64,
    skipped_empty: AtomicU64,
    skipped_self: AtomicU64,
    published: AtomicU64,
    publish_failures: AtomicU64,
    errors_written: AtomicU64,
    write_failures: AtomicU64,
    dedup_suppressed: AtomicU64,
    line_failures: AtomicU64,
    reentrant_dropped: AtomicU64,
}

impl RouterStats {
    fn bump(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> RouterStatsSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        RouterStatsSnapshot {
            batches: get(&self.batches),
            lines: get(&self.lines),
            skipped_empty: get(&self.skipped_empty),
            skipped_self: get(&self.skipped_self),
            published: get(&self.published),
            publish_failures: get(&self.publish_failures),
            errors_written: get(&self.errors_written),
            write_failures: get(&self.write_failures),
            dedup_suppressed: get(&self.dedup_suppressed),
            line_failures: get(&self.line_failures),
            reentrant_dropped: get(&self.reentrant_dropped),
        }
    }
}

/// 라우터 누적 통계 스냅샷
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouterStatsSnapshot {
    pub batches: u64,
    pub lines: u64,
    pub skipped_empty: u64,
    pub skipped_self: u64,
    pub published: u64,
    pub publish_failures: u64,
    pub errors_written: u64,
    pub write_failures: u64,
    pub dedup_suppressed: u64,
    pub line_failures: u64,
    pub reentrant_dropped: u64,
}

/// 처리 중 플래그를 잡고 있는 동안만 살아 있는 가드
///
/// 어떤 경로로 빠져나가든 `Drop`에서 플래그를 내립니다.
struct ProcessingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ProcessingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// 로그 라우터 -- 배치 단위 전달, 에러 패턴 매칭, 작업별 기록을 담당합니다.
///
/// 모든 공개 메서드는 `&self`를 받으며 `Arc`로 공유해서 씁니다.
///
/// # 사용 예시
/// ```ignore
/// use logrelay_router::{LogRouterBuilder, RouterConfig, RedisStore};
///
/// let router = LogRouterBuilder::new()
///     .config(RouterConfig::from_core(&core_config.routing))
///     .store(Arc::new(RedisStore::from_config(&core_config.redis)?))
///     .resolver(Arc::new(resolver))
///     .build()?;
///
/// router.handle_batch(&lines);
/// ```
pub struct LogRouter {
    config: RouterConfig,
    mode: RouterMode,
    resolver: Arc<dyn JobContextResolver>,
    dedup: DedupTracker,
    load_summary: LoadSummary,
    processing: AtomicBool,
    closed: AtomicBool,
    stats: RouterStats,
}

impl LogRouter {
    /// 배치를 처리하고 결과를 반환합니다.
    pub fn process_batch(&self, batch: &[LogLine]) -> BatchReport {
        if self.closed.load(Ordering::Acquire) {
            return BatchReport::new(BatchStatus::Closed, batch.len());
        }
        let RouterMode::Active(active) = &self.mode else {
            return BatchReport::new(BatchStatus::Disabled, batch.len());
        };

        let Some(_guard) = ProcessingGuard::acquire(&self.processing) else {
            self.stats.reentrant_dropped.fetch_add(1, Ordering::Relaxed);
            metrics::counter!(m::ROUTER_REENTRANT_BATCHES_TOTAL).increment(1);
            return BatchReport::new(BatchStatus::Reentrant, batch.len());
        };

        let started = Instant::now();
        let context = self.resolve_context();
        let mut report = BatchReport::new(BatchStatus::Processed, batch.len());
        report.job_id = context.as_ref().map(|c| c.job_id.clone());

        for line in batch {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                self.route_line(active, line, context.as_ref())
            }));
            match outcome {
                Ok(Ok(outcome)) => self.tally(&mut report, outcome),
                Ok(Err(e)) => {
                    report.line_failures += 1;
                    tracing::warn!(error = %e, "META: [LogRouter] failed to route log line");
                }
                Err(_) => {
                    report.line_failures += 1;
                    tracing::warn!("META: [LogRouter] panic while routing log line");
                }
            }
        }

        self.record(&report);
        metrics::histogram!(m::ROUTER_BATCH_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        report
    }

    fn resolve_context(&self) -> Option<JobContext> {
        panic::catch_unwind(AssertUnwindSafe(|| self.resolver.resolve()))
            .unwrap_or_else(|_| {
                tracing::debug!("META: [LogRouter] context resolver panicked");
                None
            })
    }

    fn route_line(
        &self,
        active: &ActiveRouting,
        line: &LogLine,
        context: Option<&JobContext>,
    ) -> Result<LineOutcome, LogRouterError> {
        if line.is_blank() {
            return Ok(LineOutcome::SkippedEmpty);
        }
        if line.message.contains(COMPONENT_TAG) {
            return Ok(LineOutcome::SkippedSelf);
        }

        let level = LogLevel::from_message(&line.message);
        let published = active.publisher.publish_line(line, level, context)?;

        let Some(ctx) = context else {
            return Ok(LineOutcome::Routed {
                published,
                write: WriteOutcome::None,
            });
        };
        if self.dedup.has_written(&ctx.job_id) {
            return Ok(LineOutcome::Routed {
                published,
                write: WriteOutcome::Suppressed,
            });
        }

        let write = match active.catalog.find_match(&line.message) {
            Some(pattern) => {
                metrics::counter!(m::CATALOG_MATCHES_TOTAL).increment(1);
                let event = ErrorEvent::from_match(pattern, &line.message, &active.source_tag);
                let written = active.stream.append(&ctx.job_id, &event);
                // 실패해도 표시: 작업당 시도는 한 번
                self.dedup.mark_written(&ctx.job_id);
                if written {
                    WriteOutcome::Written
                } else {
                    WriteOutcome::Failed
                }
            }
            None => WriteOutcome::None,
        };

        Ok(LineOutcome::Routed { published, write })
    }

    fn tally(&self, report: &mut BatchReport, outcome: LineOutcome) {
        match outcome {
            LineOutcome::SkippedEmpty => report.skipped_empty += 1,
            LineOutcome::SkippedSelf => report.skipped_self += 1,
            LineOutcome::Routed { published, write } => {
                if published {
                    report.published += 1;
                } else if report.job_id.is_some() {
                    self.stats.publish_failures.fetch_add(1, Ordering::Relaxed);
                }
                match write {
                    WriteOutcome::Written => report.errors_written += 1,
                    WriteOutcome::Suppressed => report.dedup_suppressed += 1,
                    WriteOutcome::Failed => {
                        self.stats.write_failures.fetch_add(1, Ordering::Relaxed);
                    }
                    WriteOutcome::None => {}
                }
            }
        }
    }

    fn record(&self, report: &BatchReport) {
        let s = &self.stats;
        RouterStats::bump(&s.batches, 1);
        RouterStats::bump(&s.lines, report.lines);
        RouterStats::bump(&s.skipped_empty, report.skipped_empty);
        RouterStats::bump(&s.skipped_self, report.skipped_self);
        RouterStats::bump(&s.published, report.published);
        RouterStats::bump(&s.errors_written, report.errors_written);
        RouterStats::bump(&s.dedup_suppressed, report.dedup_suppressed);
        RouterStats::bump(&s.line_failures, report.line_failures);

        metrics::counter!(m::ROUTER_BATCHES_TOTAL).increment(1);
        metrics::counter!(m::ROUTER_LINES_TOTAL).increment(report.lines as u64);
        metrics::counter!(m::ROUTER_LINES_SKIPPED_TOTAL, m::LABEL_REASON => "empty")
            .increment(report.skipped_empty as u64);
        metrics::counter!(m::ROUTER_LINES_SKIPPED_TOTAL, m::LABEL_REASON => "self")
            .increment(report.skipped_self as u64);
        metrics::counter!(m::ROUTER_DEDUP_SUPPRESSED_TOTAL)
            .increment(report.dedup_suppressed as u64);
        metrics::counter!(m::ROUTER_LINE_FAILURES_TOTAL).increment(report.line_failures as u64);
    }

    /// 라우터를 닫습니다. 이후 배치는 무시됩니다.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let stats = self.stats.snapshot();
        tracing::info!(
            batches = stats.batches,
            lines = stats.lines,
            published = stats.published,
            errors_written = stats.errors_written,
            jobs_written = self.dedup.len(),
            line_failures = stats.line_failures,
            "META: [LogRouter] router shut down"
        );
    }

    /// 라우터 헬스 상태
    pub fn health(&self) -> HealthStatus {
        if self.closed.load(Ordering::Acquire) {
            return HealthStatus::Unhealthy("closed".to_owned());
        }
        match &self.mode {
            RouterMode::Disabled { reason } => {
                HealthStatus::Unhealthy(format!("disabled: {reason}"))
            }
            RouterMode::Active(active) if active.catalog.is_empty() => {
                HealthStatus::Degraded("no error patterns loaded, forwarding only".to_owned())
            }
            RouterMode::Active(_) => HealthStatus::Healthy,
        }
    }

    /// 누적 통계
    pub fn stats(&self) -> RouterStatsSnapshot {
        self.stats.snapshot()
    }

    /// 라우터 설정
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// 로드된 카탈로그 (비활성 라우터는 None)
    pub fn catalog(&self) -> Option<&PatternCatalog> {
        match &self.mode {
            RouterMode::Active(active) => Some(&active.catalog),
            RouterMode::Disabled { .. } => None,
        }
    }

    /// 카탈로그 로딩 요약
    pub fn load_summary(&self) -> &LoadSummary {
        &self.load_summary
    }

    /// 비활성 라우터인지 여부
    pub fn is_disabled(&self) -> bool {
        matches!(self.mode, RouterMode::Disabled { .. })
    }

    /// 종료되었는지 여부
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 에러 이벤트를 기록한 작업인지 여부
    pub fn has_written(&self, job_id: &str) -> bool {
        self.dedup.has_written(job_id)
    }
}

impl BatchHandler for LogRouter {
    fn name(&self) -> &str {
        "log-router"
    }

    fn handle_batch(&self, batch: &[LogLine]) {
        self.process_batch(batch);
    }
}

/// 로그 라우터 빌더
pub struct LogRouterBuilder {
    config: RouterConfig,
    store: Option<Arc<dyn LogStore>>,
    resolver: Option<Arc<dyn JobContextResolver>>,
}

impl LogRouterBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: RouterConfig::default(),
            store: None,
            resolver: None,
        }
    }

    /// 라우터 설정을 지정합니다.
    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// 백엔드 스토어를 지정합니다.
    ///
    /// 지정하지 않으면 비활성 라우터가 만들어집니다.
    pub fn store(mut self, store: Arc<dyn LogStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// 작업 컨텍스트 해석기를 지정합니다.
    pub fn resolver(mut self, resolver: Arc<dyn JobContextResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// 라우터를 빌드합니다.
    ///
    /// 스토어에 닿지 못하면 에러 대신 비활성 라우터를 반환합니다.
    ///
    /// # Errors
    /// - 설정이 유효하지 않은 경우
    /// - 해석기를 지정하지 않은 경우
    pub fn build(self) -> Result<LogRouter, LogRouterError> {
        self.config.validate()?;
        let resolver = self.resolver.ok_or_else(|| LogRouterError::Config {
            field: "resolver".to_owned(),
            reason: "a job context resolver is required".to_owned(),
        })?;

        let (mode, load_summary) = match self.store {
            _ if !self.config.enabled => (
                RouterMode::Disabled {
                    reason: "routing disabled by configuration".to_owned(),
                },
                LoadSummary::default(),
            ),
            None => (
                RouterMode::Disabled {
                    reason: "no store configured".to_owned(),
                },
                LoadSummary::default(),
            ),
            Some(store) => match store.ping() {
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "META: [LogRouter] store unreachable, log routing disabled"
                    );
                    (
                        RouterMode::Disabled {
                            reason: format!("store unreachable: {e}"),
                        },
                        LoadSummary::default(),
                    )
                }
                Ok(()) => {
                    let (active, summary) = activate(&self.config, store);
                    (RouterMode::Active(Box::new(active)), summary)
                }
            },
        };

        if let RouterMode::Disabled { reason } = &mode {
            tracing::info!(reason = %reason, "META: [LogRouter] router built in disabled mode");
        }

        Ok(LogRouter {
            config: self.config,
            mode,
            resolver,
            dedup: DedupTracker::new(),
            load_summary,
            processing: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            stats: RouterStats::default(),
        })
    }
}

impl Default for LogRouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn activate(config: &RouterConfig, store: Arc<dyn LogStore>) -> (ActiveRouting, LoadSummary) {
    let (mut catalog, summary) = PatternCatalog::load(store.as_ref(), &config.pattern_sources());

    metrics::counter!(m::CATALOG_PATTERNS_DOWNGRADED_TOTAL).increment(summary.downgraded as u64);
    metrics::counter!(m::CATALOG_RECORDS_MALFORMED_TOTAL).increment(summary.malformed as u64);

    if catalog.is_empty() && config.seed_default_patterns {
        catalog = PatternCatalog::from_patterns(default_patterns());
        tracing::info!(
            patterns = catalog.len(),
            "META: [LogRouter] no stored patterns, using builtin defaults"
        );
    }
    if catalog.is_empty() {
        tracing::warn!("META: [LogRouter] no active error patterns, forwarding only");
    }

    metrics::gauge!(m::CATALOG_PATTERNS_LOADED).set(catalog.len() as f64);
    tracing::info!(
        patterns = catalog.len(),
        inactive = summary.inactive,
        malformed = summary.malformed,
        downgraded = summary.downgraded,
        "META: [LogRouter] error pattern catalog loaded"
    );

    let active = ActiveRouting {
        catalog,
        publisher: PubSubPublisher::new(
            Arc::clone(&store),
            config.machine_id.clone(),
            config.worker_id.clone(),
            config.source_tag.clone(),
        ),
        stream: StreamWriter::new(store, config.stream_ttl_secs),
        source_tag: config.source_tag.clone(),
    };
    (active, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::GLOBAL_PATTERNS_KEY;
    use crate::store::{MemoryStore, StoreOp};

    fn job(id: &str) -> Arc<dyn JobContextResolver> {
        let id = id.to_owned();
        Arc::new(move || JobContext::new(id.clone(), None))
    }

    fn no_job() -> Arc<dyn JobContextResolver> {
        Arc::new(|| -> Option<JobContext> { None })
    }

    fn store_with(records: &[(&str, &str)]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for (id, json) in records {
            store.seed_hash(GLOBAL_PATTERNS_KEY, id, json);
        }
        store
    }

    fn router(store: Arc<MemoryStore>, resolver: Arc<dyn JobContextResolver>) -> LogRouter {
        LogRouterBuilder::new()
            .store(store)
            .resolver(resolver)
            .build()
            .expect("build")
    }

    fn lines(messages: &[&str]) -> Vec<LogLine> {
        messages.iter().map(|m| LogLine::at(1.0, *m)).collect()
    }

    #[test]
    fn guard_releases_on_drop() {
        let flag = AtomicBool::new(false);
        {
            let _guard = ProcessingGuard::acquire(&flag).expect("first acquire");
            assert!(ProcessingGuard::acquire(&flag).is_none());
        }
        assert!(ProcessingGuard::acquire(&flag).is_some());
    }

    #[test]
    fn build_requires_resolver() {
        let result = LogRouterBuilder::new()
            .store(Arc::new(MemoryStore::new()))
            .build();
        assert!(matches!(result, Err(LogRouterError::Config { .. })));
    }

    #[test]
    fn build_without_store_is_disabled() {
        let router = LogRouterBuilder::new().resolver(no_job()).build().expect("build");
        assert!(router.is_disabled());
        assert!(router.health().is_unhealthy());
    }

    #[test]
    fn build_with_unreachable_store_is_disabled() {
        let store = Arc::new(MemoryStore::unavailable());
        let router = router(store.clone(), job("j1"));
        assert!(router.is_disabled());

        let report = router.process_batch(&lines(&["ERROR: boom"]));
        assert_eq!(report.status, BatchStatus::Disabled);
        assert!(store.published().is_empty());
    }

    #[test]
    fn disabled_by_config() {
        let config = RouterConfig {
            enabled: false,
            ..Default::default()
        };
        let router = LogRouterBuilder::new()
            .config(config)
            .store(Arc::new(MemoryStore::new()))
            .resolver(no_job())
            .build()
            .expect("build");
        assert!(router.is_disabled());
    }

    #[test]
    fn empty_catalog_is_degraded_and_forwards() {
        let store = store_with(&[]);
        let router = router(store.clone(), job("j1"));
        assert!(router.health().is_degraded());

        let report = router.process_batch(&lines(&["hello"]));
        assert_eq!(report.published, 1);
        assert_eq!(report.errors_written, 0);
    }

    #[test]
    fn seed_defaults_when_configured() {
        let config = RouterConfig {
            seed_default_patterns: true,
            ..Default::default()
        };
        let router = LogRouterBuilder::new()
            .config(config)
            .store(store_with(&[]))
            .resolver(job("j1"))
            .build()
            .expect("build");
        assert!(router.catalog().is_some_and(|c| !c.is_empty()));
        assert!(router.health().is_healthy());
    }

    #[test]
    fn skips_blank_and_self_lines() {
        let store = store_with(&[("boom", r#"{"pattern": "boom"}"#)]);
        let router = router(store.clone(), job("j1"));

        let report = router.process_batch(&lines(&[
            "",
            "   ",
            "META: [LogRouter] boom while writing",
        ]));
        assert_eq!(report.skipped_empty, 2);
        assert_eq!(report.skipped_self, 1);
        assert_eq!(report.published, 0);
        assert!(store.published().is_empty());
    }

    #[test]
    fn matched_error_written_once_per_job() {
        let store = store_with(&[("boom", r#"{"pattern": "boom"}"#)]);
        let router = router(store.clone(), job("j1"));

        let report = router.process_batch(&lines(&["boom 1", "boom 2"]));
        assert_eq!(report.errors_written, 1);
        assert_eq!(report.dedup_suppressed, 1);
        assert_eq!(store.stream("job:events:j1").len(), 1);
        assert!(router.has_written("j1"));
    }

    #[test]
    fn no_context_publishes_and_writes_nothing() {
        let store = store_with(&[("boom", r#"{"pattern": "boom"}"#)]);
        let router = router(store.clone(), no_job());

        let report = router.process_batch(&lines(&["boom"]));
        assert_eq!(report.job_id, None);
        assert_eq!(report.published, 0);
        assert_eq!(report.errors_written, 0);
        assert_eq!(store.stream_len_total(), 0);
    }

    #[test]
    fn failed_append_still_marks_job() {
        let store = store_with(&[("boom", r#"{"pattern": "boom"}"#)]);
        store.fail(StoreOp::StreamAppend);
        let router = router(store.clone(), job("j1"));

        router.process_batch(&lines(&["boom"]));
        store.recover(StoreOp::StreamAppend);
        let report = router.process_batch(&lines(&["boom"]));

        assert_eq!(report.errors_written, 0);
        assert_eq!(store.stream_len_total(), 0);
        assert_eq!(router.stats().write_failures, 1);
    }

    #[test]
    fn resolver_panic_means_no_context() {
        let store = store_with(&[("boom", r#"{"pattern": "boom"}"#)]);
        let resolver: Arc<dyn JobContextResolver> = Arc::new(|| -> Option<JobContext> {
            panic!("resolver exploded");
        });
        let router = router(store.clone(), resolver);

        let report = router.process_batch(&lines(&["boom"]));
        assert_eq!(report.status, BatchStatus::Processed);
        assert_eq!(report.job_id, None);
    }

    #[test]
    fn shutdown_makes_batches_noop() {
        let store = store_with(&[]);
        let router = router(store.clone(), job("j1"));
        router.shutdown();
        router.shutdown();

        let report = router.process_batch(&lines(&["hello"]));
        assert_eq!(report.status, BatchStatus::Closed);
        assert!(store.published().is_empty());
        assert!(router.health().is_unhealthy());
    }

    #[test]
    fn stats_accumulate_across_batches() {
        let store = store_with(&[("boom", r#"{"pattern": "boom"}"#)]);
        let router = router(store, job("j1"));

        router.process_batch(&lines(&["boom", ""]));
        router.process_batch(&lines(&["boom"]));

        let stats = router.stats();
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.skipped_empty, 1);
        assert_eq!(stats.published, 2);
        assert_eq!(stats.errors_written, 1);
        assert_eq!(stats.dedup_suppressed, 1);
    }

    #[test]
    fn publish_failure_is_counted_not_raised() {
        let store = store_with(&[]);
        store.fail(StoreOp::Publish);
        let router = router(store, job("j1"));

        let report = router.process_batch(&lines(&["hello"]));
        assert_eq!(report.published, 0);
        assert_eq!(report.line_failures, 0);
        assert_eq!(router.stats().publish_failures, 1);
    }
}
