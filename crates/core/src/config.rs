//! 설정 관리: logrelay.toml 파싱 및 런타임 설정
//!
//! [`LogRelayConfig`]는 모든 구성 요소의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGRELAY_REDIS_URL=redis://...` 형식)
//! 3. 설정 파일 (`logrelay.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logrelay_core::error::LogRelayError> {
//! use logrelay_core::config::LogRelayConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogRelayConfig::load("logrelay.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogRelayConfig::parse("[routing]\nmachine_id = \"gpu-01\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogRelayError};

/// logrelay 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogRelayConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// Redis 연결 설정
    #[serde(default)]
    pub redis: RedisConfig,
    /// 라우팅 설정
    #[serde(default)]
    pub routing: RoutingConfig,
    /// 데몬 입력 버퍼 설정
    #[serde(default)]
    pub intake: IntakeConfig,
    /// 메트릭 노출 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl LogRelayConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogRelayError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogRelayError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogRelayError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogRelayError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogRelayError> {
        toml::from_str(toml_str).map_err(|e| {
            LogRelayError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGRELAY_{SECTION}_{FIELD}`
    /// 예: `LOGRELAY_ROUTING_WORKER_ID=worker-3`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGRELAY_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGRELAY_GENERAL_LOG_FORMAT");

        // Redis
        override_string(&mut self.redis.url, "LOGRELAY_REDIS_URL");
        override_string(&mut self.redis.host, "LOGRELAY_REDIS_HOST");
        override_u16(&mut self.redis.port, "LOGRELAY_REDIS_PORT");
        override_u32(&mut self.redis.db, "LOGRELAY_REDIS_DB");
        override_optional(&mut self.redis.password, "LOGRELAY_REDIS_PASSWORD");
        override_u64(
            &mut self.redis.connect_timeout_ms,
            "LOGRELAY_REDIS_CONNECT_TIMEOUT_MS",
        );
        override_u64(
            &mut self.redis.command_timeout_ms,
            "LOGRELAY_REDIS_COMMAND_TIMEOUT_MS",
        );

        // Routing
        override_bool(&mut self.routing.enabled, "LOGRELAY_ROUTING_ENABLED");
        override_string(&mut self.routing.machine_id, "LOGRELAY_ROUTING_MACHINE_ID");
        override_optional(&mut self.routing.worker_id, "LOGRELAY_ROUTING_WORKER_ID");
        override_string(
            &mut self.routing.connector_type,
            "LOGRELAY_ROUTING_CONNECTOR_TYPE",
        );
        override_string(&mut self.routing.source_tag, "LOGRELAY_ROUTING_SOURCE_TAG");
        override_u64(
            &mut self.routing.stream_ttl_secs,
            "LOGRELAY_ROUTING_STREAM_TTL_SECS",
        );
        override_bool(
            &mut self.routing.seed_default_patterns,
            "LOGRELAY_ROUTING_SEED_DEFAULT_PATTERNS",
        );

        // Intake
        override_usize(&mut self.intake.batch_size, "LOGRELAY_INTAKE_BATCH_SIZE");
        override_u64(
            &mut self.intake.flush_interval_ms,
            "LOGRELAY_INTAKE_FLUSH_INTERVAL_MS",
        );
        override_usize(
            &mut self.intake.buffer_capacity,
            "LOGRELAY_INTAKE_BUFFER_CAPACITY",
        );
        override_string(&mut self.intake.drop_policy, "LOGRELAY_INTAKE_DROP_POLICY");
        override_string(&mut self.intake.context_file, "LOGRELAY_INTAKE_CONTEXT_FILE");

        // Metrics
        override_bool(&mut self.metrics.enabled, "LOGRELAY_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "LOGRELAY_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "LOGRELAY_METRICS_PORT");
        override_string(&mut self.metrics.endpoint, "LOGRELAY_METRICS_ENDPOINT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogRelayError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        // Redis
        if self.redis.url.is_empty() && self.redis.host.is_empty() {
            return Err(invalid(
                "redis.host",
                "either redis.url or redis.host must be set".to_owned(),
            ));
        }
        if !self.redis.url.is_empty()
            && !(self.redis.url.starts_with("redis://") || self.redis.url.starts_with("rediss://"))
        {
            return Err(invalid(
                "redis.url",
                "must start with redis:// or rediss://".to_owned(),
            ));
        }
        if self.redis.connect_timeout_ms == 0 || self.redis.command_timeout_ms == 0 {
            return Err(invalid(
                "redis.command_timeout_ms",
                "timeouts must be greater than 0".to_owned(),
            ));
        }

        // Routing
        if self.routing.machine_id.trim().is_empty() {
            return Err(invalid(
                "routing.machine_id",
                "must not be empty".to_owned(),
            ));
        }
        if self.routing.connector_type.trim().is_empty() {
            return Err(invalid(
                "routing.connector_type",
                "must not be empty".to_owned(),
            ));
        }
        if self.routing.stream_ttl_secs == 0 {
            return Err(invalid(
                "routing.stream_ttl_secs",
                "must be greater than 0".to_owned(),
            ));
        }

        // Intake
        if self.intake.batch_size == 0 {
            return Err(invalid(
                "intake.batch_size",
                "must be greater than 0".to_owned(),
            ));
        }
        if self.intake.buffer_capacity < self.intake.batch_size {
            return Err(invalid(
                "intake.buffer_capacity",
                format!(
                    "must be >= batch_size ({}), got {}",
                    self.intake.batch_size, self.intake.buffer_capacity
                ),
            ));
        }
        let valid_policies = ["oldest", "newest"];
        if !valid_policies.contains(&self.intake.drop_policy.as_str()) {
            return Err(invalid(
                "intake.drop_policy",
                format!("must be one of: {}", valid_policies.join(", ")),
            ));
        }

        // Metrics
        if self.metrics.enabled && !self.metrics.endpoint.starts_with('/') {
            return Err(invalid(
                "metrics.endpoint",
                "must start with '/'".to_owned(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> LogRelayError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// Redis 연결 설정
///
/// `url`이 비어 있으면 `host`/`port`/`db`/`password`로 URL을 조립합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// 전체 연결 URL (`redis://[:password@]host:port/db`)
    pub url: String,
    /// 호스트
    pub host: String,
    /// 포트
    pub port: u16,
    /// 데이터베이스 번호
    pub db: u32,
    /// 비밀번호
    pub password: Option<String>,
    /// 연결 타임아웃 (밀리초)
    pub connect_timeout_ms: u64,
    /// 명령 읽기/쓰기 타임아웃 (밀리초)
    pub command_timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            host: "localhost".to_owned(),
            port: 6379,
            db: 0,
            password: None,
            connect_timeout_ms: 500,
            command_timeout_ms: 250,
        }
    }
}

impl RedisConfig {
    /// 실제 연결에 사용할 URL을 반환합니다.
    pub fn connection_url(&self) -> String {
        if !self.url.is_empty() {
            return self.url.clone();
        }
        match self.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

/// 라우팅 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// 라우터 활성화 여부
    pub enabled: bool,
    /// 브로드캐스트 채널에 쓰이는 머신 ID
    pub machine_id: String,
    /// 워커 ID (없으면 채널 키에 `unknown`)
    pub worker_id: Option<String>,
    /// 커넥터 유형 (`error_patterns:{connector_type}` 패턴 소스)
    pub connector_type: String,
    /// 이벤트와 페이로드의 `source` 필드
    pub source_tag: String,
    /// 작업별 스트림 TTL (초), append마다 갱신
    pub stream_ttl_secs: u64,
    /// 스토어에 활성 패턴이 없을 때 내장 기본 패턴 사용
    pub seed_default_patterns: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            machine_id: "unknown".to_owned(),
            worker_id: None,
            connector_type: "comfyui".to_owned(),
            source_tag: "comfyui".to_owned(),
            stream_ttl_secs: 3600,
            seed_default_patterns: false,
        }
    }
}

/// 데몬 입력 버퍼 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// 한 번에 플러시할 최대 라인 수
    pub batch_size: usize,
    /// 플러시 주기 (밀리초)
    pub flush_interval_ms: u64,
    /// 버퍼 최대 용량
    pub buffer_capacity: usize,
    /// 버퍼가 가득 찼을 때 드롭 정책 (oldest, newest)
    pub drop_policy: String,
    /// 실행 컨텍스트 상태 파일 경로
    pub context_file: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            flush_interval_ms: 500,
            buffer_capacity: 10_000,
            drop_policy: "oldest".to_owned(),
            context_file: "/var/run/logrelay/context.json".to_owned(),
        }
    }
}

/// 메트릭 노출 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 엔드포인트 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
    /// 엔드포인트 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9108,
            endpoint: "/metrics".to_owned(),
        }
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_optional(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = if val.is_empty() { None } else { Some(val) };
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
