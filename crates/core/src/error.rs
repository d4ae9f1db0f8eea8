//! 에러 타입: 도메인별 에러 정의

/// logrelay 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogRelayError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 백킹 스토어(Redis) 에러
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// 작업 컨텍스트 조회 에러
    #[error("context error: {0}")]
    Context(#[from] ContextError),

    /// 라우터 초기화/처리 에러
    #[error("router error: {0}")]
    Router(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 백킹 스토어 에러
///
/// 모든 스토어 호출은 짧은 클라이언트 타임아웃을 가지며 재시도하지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 연결 실패 (거부, DNS 실패 등)
    #[error("connection failed: {0}")]
    Connection(String),

    /// 명령 타임아웃
    #[error("{op} timed out: {reason}")]
    Timeout { op: String, reason: String },

    /// 명령 실행 실패
    #[error("{op} failed: {reason}")]
    Command { op: String, reason: String },
}

impl StoreError {
    /// 명령 실행 실패 에러를 생성합니다.
    pub fn command(op: impl Into<String>, reason: impl ToString) -> Self {
        Self::Command {
            op: op.into(),
            reason: reason.to_string(),
        }
    }
}

/// 실행 컨텍스트 제공자 에러
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// 제공자가 아직 초기화되지 않았거나 접근 불가
    #[error("execution context unavailable: {0}")]
    Unavailable(String),

    /// 제공자가 돌려준 데이터 형식이 잘못됨
    #[error("malformed execution context: {0}")]
    Malformed(String),
}
