//! 로그 라우터 설정
//!
//! [`RouterConfig`]는 core의 [`RoutingConfig`](logrelay_core::config::RoutingConfig)를
//! 기반으로 라우터 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use logrelay_core::config::LogRelayConfig;
//! use logrelay_router::config::RouterConfig;
//!
//! let core_config = LogRelayConfig::default();
//! let config = RouterConfig::from_core(&core_config.routing);
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::PatternSource;
use crate::delivery::DEFAULT_STREAM_TTL_SECS;
use crate::error::LogRouterError;

/// 스트림 TTL 상한 (7일)
const MAX_STREAM_TTL_SECS: u64 = 7 * 24 * 3600;

/// 로그 라우터 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 머신 ID
    pub machine_id: String,
    /// 워커 ID
    pub worker_id: Option<String>,
    /// 커넥터 유형
    pub connector_type: String,
    /// 이벤트/페이로드 소스 태그
    pub source_tag: String,
    /// 작업별 스트림 TTL (초)
    pub stream_ttl_secs: u64,
    /// 스토어에 활성 패턴이 없을 때 내장 기본 패턴 사용
    pub seed_default_patterns: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            machine_id: "unknown".to_owned(),
            worker_id: None,
            connector_type: "comfyui".to_owned(),
            source_tag: "comfyui".to_owned(),
            stream_ttl_secs: DEFAULT_STREAM_TTL_SECS,
            seed_default_patterns: false,
        }
    }
}

impl RouterConfig {
    /// core의 `RoutingConfig`에서 라우터 설정을 생성합니다.
    pub fn from_core(core: &logrelay_core::config::RoutingConfig) -> Self {
        Self {
            enabled: core.enabled,
            machine_id: core.machine_id.clone(),
            worker_id: core.worker_id.clone().filter(|w| !w.is_empty()),
            connector_type: core.connector_type.clone(),
            source_tag: core.source_tag.clone(),
            stream_ttl_secs: core.stream_ttl_secs,
            seed_default_patterns: core.seed_default_patterns,
        }
    }

    /// 패턴을 읽어 올 소스 (전역, 커넥터 순)
    pub fn pattern_sources(&self) -> Vec<PatternSource> {
        PatternSource::standard(&self.connector_type)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogRouterError> {
        if self.machine_id.trim().is_empty() {
            return Err(LogRouterError::Config {
                field: "machine_id".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        // 채널 키 구분자와 충돌하는 ID는 거부
        for (field, value) in [
            ("machine_id", Some(self.machine_id.as_str())),
            ("worker_id", self.worker_id.as_deref()),
        ] {
            if value.is_some_and(|v| v.contains(':')) {
                return Err(LogRouterError::Config {
                    field: field.to_owned(),
                    reason: "must not contain ':'".to_owned(),
                });
            }
        }

        if self.connector_type.trim().is_empty() {
            return Err(LogRouterError::Config {
                field: "connector_type".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.source_tag.is_empty() {
            return Err(LogRouterError::Config {
                field: "source_tag".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.stream_ttl_secs == 0 || self.stream_ttl_secs > MAX_STREAM_TTL_SECS {
            return Err(LogRouterError::Config {
                field: "stream_ttl_secs".to_owned(),
                reason: format!("must be 1-{MAX_STREAM_TTL_SECS}"),
            });
        }

        Ok(())
    }
}

/// 라우터 설정 빌더
#[derive(Default)]
pub struct RouterConfigBuilder {
    config: RouterConfig,
}

impl RouterConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 활성화 여부를 설정합니다.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// 머신 ID를 설정합니다.
    pub fn machine_id(mut self, machine_id: impl Into<String>) -> Self {
        self.config.machine_id = machine_id.into();
        self
    }

    /// 워커 ID를 설정합니다.
    pub fn worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.config.worker_id = Some(worker_id.into());
        self
    }

    /// 커넥터 유형을 설정합니다.
    pub fn connector_type(mut self, connector_type: impl Into<String>) -> Self {
        self.config.connector_type = connector_type.into();
        self
    }

    /// 소스 태그를 설정합니다.
    pub fn source_tag(mut self, source_tag: impl Into<String>) -> Self {
        self.config.source_tag = source_tag.into();
        self
    }

    /// 스트림 TTL(초)을 설정합니다.
    pub fn stream_ttl_secs(mut self, secs: u64) -> Self {
        self.config.stream_ttl_secs = secs;
        self
    }

    /// 내장 기본 패턴 사용 여부를 설정합니다.
    pub fn seed_default_patterns(mut self, seed: bool) -> Self {
        self.config.seed_default_patterns = seed;
        self
    }

    /// 설정을 검증하고 `RouterConfig`를 생성합니다.
    pub fn build(self) -> Result<RouterConfig, LogRouterError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
