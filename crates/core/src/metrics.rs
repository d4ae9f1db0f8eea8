//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logrelay_`
//! - 구성 요소: `router_`, `catalog_`, `delivery_`, `intake_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logrelay_core::metrics::ROUTER_LINES_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 건너뛴 사유 레이블 키 (blank, self_log)
pub const LABEL_REASON: &str = "reason";

/// 전달 채널 레이블 키 (stream, pubsub)
pub const LABEL_CHANNEL: &str = "channel";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Router 메트릭 ─────────────────────────────────────────────────

/// Router: 처리한 배치 수 (counter)
pub const ROUTER_BATCHES_TOTAL: &str = "logrelay_router_batches_total";

/// Router: 수신한 로그 라인 수 (counter)
pub const ROUTER_LINES_TOTAL: &str = "logrelay_router_lines_total";

/// Router: 건너뛴 라인 수 (counter, label: reason)
pub const ROUTER_LINES_SKIPPED_TOTAL: &str = "logrelay_router_lines_skipped_total";

/// Router: 처리 중 실패한 라인 수 (counter)
pub const ROUTER_LINE_FAILURES_TOTAL: &str = "logrelay_router_line_failures_total";

/// Router: 재진입으로 버려진 배치 수 (counter)
pub const ROUTER_REENTRANT_BATCHES_TOTAL: &str = "logrelay_router_reentrant_batches_total";

/// Router: 이미 기록된 작업이라 매칭을 생략한 라인 수 (counter)
pub const ROUTER_DEDUP_SUPPRESSED_TOTAL: &str = "logrelay_router_dedup_suppressed_total";

/// Router: 배치 처리 시간 (histogram, 초)
pub const ROUTER_BATCH_DURATION_SECONDS: &str = "logrelay_router_batch_duration_seconds";

// ─── Catalog 메트릭 ────────────────────────────────────────────────

/// Catalog: 로드된 패턴 수 (gauge)
pub const CATALOG_PATTERNS_LOADED: &str = "logrelay_catalog_patterns_loaded";

/// Catalog: 정규식 컴파일 실패로 contains로 강등된 패턴 수 (counter)
pub const CATALOG_PATTERNS_DOWNGRADED_TOTAL: &str = "logrelay_catalog_patterns_downgraded_total";

/// Catalog: 형식 오류로 건너뛴 레코드 수 (counter)
pub const CATALOG_RECORDS_MALFORMED_TOTAL: &str = "logrelay_catalog_records_malformed_total";

/// Catalog: 패턴 매칭 수 (counter)
pub const CATALOG_MATCHES_TOTAL: &str = "logrelay_catalog_matches_total";

// ─── Delivery 메트릭 ───────────────────────────────────────────────

/// Delivery: 전달 시도 수 (counter, labels: channel, result)
pub const DELIVERY_ATTEMPTS_TOTAL: &str = "logrelay_delivery_attempts_total";

/// Delivery: 스토어 호출 지연 (histogram, 초, label: channel)
pub const DELIVERY_DURATION_SECONDS: &str = "logrelay_delivery_duration_seconds";

// ─── Intake 메트릭 (데몬) ──────────────────────────────────────────

/// Intake: 읽은 입력 라인 수 (counter)
pub const INTAKE_LINES_READ_TOTAL: &str = "logrelay_intake_lines_read_total";

/// Intake: 버퍼 초과로 드롭된 라인 수 (counter)
pub const INTAKE_LINES_DROPPED_TOTAL: &str = "logrelay_intake_lines_dropped_total";

/// Intake: 현재 버퍼 크기 (gauge)
pub const INTAKE_BUFFER_SIZE: &str = "logrelay_intake_buffer_size";

/// 데몬 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "logrelay_daemon_uptime_seconds";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다. 레코더가 없으면 아무 일도 하지 않습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // Router
    describe_counter!(ROUTER_BATCHES_TOTAL, "Total number of log batches handled");
    describe_counter!(ROUTER_LINES_TOTAL, "Total number of log lines received");
    describe_counter!(
        ROUTER_LINES_SKIPPED_TOTAL,
        "Log lines skipped before delivery (blank or self-generated)"
    );
    describe_counter!(
        ROUTER_LINE_FAILURES_TOTAL,
        "Log lines whose processing failed and was skipped"
    );
    describe_counter!(
        ROUTER_REENTRANT_BATCHES_TOTAL,
        "Batches dropped because another batch was being processed"
    );
    describe_counter!(
        ROUTER_DEDUP_SUPPRESSED_TOTAL,
        "Lines not matched because the job already has an error event"
    );
    describe_histogram!(
        ROUTER_BATCH_DURATION_SECONDS,
        "Time spent handling a single batch in seconds"
    );

    // Catalog
    describe_gauge!(
        CATALOG_PATTERNS_LOADED,
        "Number of active error patterns in the catalog"
    );
    describe_counter!(
        CATALOG_PATTERNS_DOWNGRADED_TOTAL,
        "Regex patterns downgraded to substring matching after a compile failure"
    );
    describe_counter!(
        CATALOG_RECORDS_MALFORMED_TOTAL,
        "Pattern records skipped because they could not be parsed"
    );
    describe_counter!(CATALOG_MATCHES_TOTAL, "Log lines matched by an error pattern");

    // Delivery
    describe_counter!(
        DELIVERY_ATTEMPTS_TOTAL,
        "Delivery attempts per channel (stream, pubsub) and result"
    );
    describe_histogram!(
        DELIVERY_DURATION_SECONDS,
        "Backing store call latency per delivery channel in seconds"
    );

    // Intake
    describe_counter!(INTAKE_LINES_READ_TOTAL, "Input lines read by the daemon");
    describe_counter!(
        INTAKE_LINES_DROPPED_TOTAL,
        "Input lines dropped because the intake buffer was full"
    );
    describe_gauge!(INTAKE_BUFFER_SIZE, "Lines currently waiting in the intake buffer");
    describe_gauge!(DAEMON_UPTIME_SECONDS, "Daemon uptime in seconds");
}
