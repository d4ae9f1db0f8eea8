//! 작업별 내구 스트림 기록
//!
//! 매칭된 에러 이벤트를 `job:events:{job_id}` 스트림에 평탄한 문자열 맵으로 추가하고,
//! 추가할 때마다 만료 시간을 다시 설정합니다. 에러가 계속 나는 작업은 기록이 유지되고,
//! 조용해진 작업의 기록은 TTL 뒤에 사라집니다.

use std::sync::Arc;
use std::time::Instant;

use logrelay_core::metrics as m;
use logrelay_core::types::unix_timestamp;

use crate::catalog::ErrorPattern;
use crate::store::LogStore;

/// 스트림 기본 TTL (초)
pub const DEFAULT_STREAM_TTL_SECS: u64 = 3600;

/// 에러 이벤트의 `event_type` 값
pub const ERROR_EVENT_TYPE: &str = "error";

/// 작업별 이벤트 스트림 키
pub fn stream_key(job_id: &str) -> String {
    format!("job:events:{job_id}")
}

/// 스트림에 기록하는 에러 이벤트
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    /// 원문 메시지
    pub message: String,
    /// 기록 시각 (epoch 초)
    pub timestamp: f64,
    /// 소스 태그
    pub source: String,
    /// 매칭된 패턴 ID
    pub pattern_matched: String,
    /// 로그 필터 전용 여부
    pub is_log_filter_only: bool,
    /// 사용자에게 보여줄 설명
    pub human_readable_message: Option<String>,
    /// 사용자가 취할 조치
    pub call_to_action: Option<String>,
    /// 재시도 가능 여부
    pub retry: bool,
}

impl ErrorEvent {
    /// 매칭된 패턴과 메시지로 이벤트를 만듭니다. 시각은 지금입니다.
    pub fn from_match(pattern: &ErrorPattern, message: &str, source: &str) -> Self {
        Self {
            message: message.to_owned(),
            timestamp: unix_timestamp(),
            source: source.to_owned(),
            pattern_matched: pattern.id.clone(),
            is_log_filter_only: pattern.is_log_filter_only,
            human_readable_message: pattern
                .human_readable_message
                .clone()
                .filter(|s| !s.is_empty()),
            call_to_action: pattern.call_to_action.clone().filter(|s| !s.is_empty()),
            retry: pattern.retryable,
        }
    }

    /// 스트림 레코드 필드로 변환합니다.
    ///
    /// 모든 값은 문자열이며, bool은 `"true"`/`"false"`로 씁니다.
    /// 설명과 조치는 비어 있지 않을 때만 포함합니다.
    pub fn to_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("event_type".to_owned(), ERROR_EVENT_TYPE.to_owned()),
            ("message".to_owned(), self.message.clone()),
            ("timestamp".to_owned(), self.timestamp.to_string()),
            ("source".to_owned(), self.source.clone()),
            ("pattern_matched".to_owned(), self.pattern_matched.clone()),
            (
                "is_log_filter_only".to_owned(),
                self.is_log_filter_only.to_string(),
            ),
        ];
        if let Some(text) = &self.human_readable_message {
            fields.push(("human_readable_message".to_owned(), text.clone()));
        }
        if let Some(text) = &self.call_to_action {
            fields.push(("call_to_action".to_owned(), text.clone()));
        }
        fields.push(("retry".to_owned(), self.retry.to_string()));
        fields
    }
}

/// 작업별 스트림 기록기
pub struct StreamWriter {
    store: Arc<dyn LogStore>,
    ttl_secs: u64,
}

impl StreamWriter {
    /// 기록기를 만듭니다.
    pub fn new(store: Arc<dyn LogStore>, ttl_secs: u64) -> Self {
        Self { store, ttl_secs }
    }

    /// 적용하는 TTL (초)
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// 이벤트를 작업 스트림에 추가하고 TTL을 갱신합니다.
    ///
    /// 실패는 기록만 하고 삼킵니다. 추가에 성공했으면 true를 반환합니다.
    /// 추가는 됐지만 TTL 설정이 실패한 경우에도 true입니다.
    pub fn append(&self, job_id: &str, event: &ErrorEvent) -> bool {
        let key = stream_key(job_id);
        let started = Instant::now();

        let entry_id = match self.store.stream_append(&key, &event.to_fields()) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(
                    job_id,
                    error = %e,
                    "META: [LogRouter] failed to append error event"
                );
                metrics::counter!(m::DELIVERY_ATTEMPTS_TOTAL, m::LABEL_CHANNEL => "stream", m::LABEL_RESULT => "failure")
                    .increment(1);
                return false;
            }
        };

        if let Err(e) = self.store.expire(&key, self.ttl_secs) {
            tracing::warn!(
                job_id,
                error = %e,
                "META: [LogRouter] failed to refresh error stream ttl"
            );
        }

        metrics::histogram!(m::DELIVERY_DURATION_SECONDS, m::LABEL_CHANNEL => "stream")
            .record(started.elapsed().as_secs_f64());
        metrics::counter!(m::DELIVERY_ATTEMPTS_TOTAL, m::LABEL_CHANNEL => "stream", m::LABEL_RESULT => "success")
            .increment(1);
        tracing::info!(
            job_id,
            entry_id = %entry_id,
            pattern_id = %event.pattern_matched,
            "META: [LogRouter] error event written"
        );
        true
    }
}
