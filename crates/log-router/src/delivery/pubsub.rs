//! 실시간 브로드캐스트 발행
//!
//! 모든 로그 라인을 머신/워커/작업 좌표로 정해지는 채널에 JSON으로 발행합니다.
//! 작업 컨텍스트가 없으면 익명으로 발행하지 않고 버립니다.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use logrelay_core::metrics as m;
use logrelay_core::types::{JobContext, LogLevel, LogLine};

use crate::error::LogRouterError;
use crate::store::LogStore;

/// 워커 ID가 없을 때 채널 키에 쓰는 값
pub const UNKNOWN_WORKER: &str = "unknown";

/// 브로드캐스트 채널 키
pub fn channel_key(machine_id: &str, worker_id: Option<&str>, job_id: &str) -> String {
    format!(
        "machine:{machine_id}:worker:{}:job:{job_id}:logs",
        worker_id.unwrap_or(UNKNOWN_WORKER)
    )
}

/// 브로드캐스트 페이로드
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastPayload<'a> {
    /// 로그 라인 시각 (epoch 초)
    pub timestamp: f64,
    /// 메시지에서 추출한 레벨
    pub level: LogLevel,
    /// 원문 메시지
    pub message: &'a str,
    /// 소스 태그
    pub source: &'a str,
    /// 작업 ID
    pub job_id: &'a str,
    /// 워크플로 ID
    pub workflow_id: Option<&'a str>,
    /// 워커 ID
    pub worker_id: Option<&'a str>,
}

/// 브로드캐스트 발행기
pub struct PubSubPublisher {
    store: Arc<dyn LogStore>,
    machine_id: String,
    worker_id: Option<String>,
    source: String,
}

impl PubSubPublisher {
    /// 발행기를 만듭니다.
    pub fn new(
        store: Arc<dyn LogStore>,
        machine_id: impl Into<String>,
        worker_id: Option<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            store,
            machine_id: machine_id.into(),
            worker_id: worker_id.filter(|w| !w.is_empty()),
            source: source.into(),
        }
    }

    /// 작업의 채널 키
    pub fn channel_for(&self, job_id: &str) -> String {
        channel_key(&self.machine_id, self.worker_id.as_deref(), job_id)
    }

    /// 로그 라인 하나를 발행합니다.
    ///
    /// 컨텍스트가 없으면 아무것도 하지 않고 false를 반환합니다.
    /// 페이로드 직렬화 실패만 에러로 돌려주고, 스토어 실패는 삼킵니다.
    pub fn publish_line(
        &self,
        line: &LogLine,
        level: LogLevel,
        context: Option<&JobContext>,
    ) -> Result<bool, LogRouterError> {
        let Some(ctx) = context else {
            return Ok(false);
        };

        let payload = BroadcastPayload {
            timestamp: line.timestamp,
            level,
            message: &line.message,
            source: &self.source,
            job_id: &ctx.job_id,
            workflow_id: ctx.workflow_id.as_deref(),
            worker_id: self.worker_id.as_deref(),
        };
        let json = serde_json::to_string(&payload)?;
        Ok(self.publish(&self.channel_for(&ctx.job_id), &json))
    }

    /// 채널에 페이로드를 발행합니다. 실패는 기록만 하고 삼킵니다.
    pub fn publish(&self, channel: &str, payload: &str) -> bool {
        let started = Instant::now();
        match self.store.publish(channel, payload) {
            Ok(_) => {
                metrics::histogram!(m::DELIVERY_DURATION_SECONDS, m::LABEL_CHANNEL => "pubsub")
                    .record(started.elapsed().as_secs_f64());
                metrics::counter!(m::DELIVERY_ATTEMPTS_TOTAL, m::LABEL_CHANNEL => "pubsub", m::LABEL_RESULT => "success")
                    .increment(1);
                true
            }
            Err(e) => {
                tracing::debug!(
                    channel,
                    error = %e,
                    "META: [LogRouter] failed to publish log line"
                );
                metrics::counter!(m::DELIVERY_ATTEMPTS_TOTAL, m::LABEL_CHANNEL => "pubsub", m::LABEL_RESULT => "failure")
                    .increment(1);
                false
            }
        }
    }
}
