//! 로그 라우터 에러 타입
//!
//! [`LogRouterError`]는 라우터 내부에서 발생하는 에러를 표현합니다.
//! 배치 처리 경로에서는 이 에러가 호출자에게 전파되지 않고 라인 단위로 기록된 뒤 버려집니다.
//! `From<LogRouterError> for LogRelayError` 변환으로 초기화/운영 도구 쪽에서는 `?`로 전파합니다.

use logrelay_core::error::{LogRelayError, StoreError};

/// 로그 라우터 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogRouterError {
    /// 패턴 레코드 파싱 실패
    #[error("pattern record error: pattern '{pattern_id}': {reason}")]
    PatternRecord {
        /// 레코드 ID (해시 필드명)
        pattern_id: String,
        /// 실패 사유
        reason: String,
    },

    /// 패턴 유효성 검증 실패 (빈 패턴, 잘못된 정규식 등)
    #[error("pattern validation error: pattern '{pattern_id}': {reason}")]
    PatternValidation {
        /// 문제가 된 패턴 ID
        pattern_id: String,
        /// 검증 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 스토어 호출 실패
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// 직렬화 실패
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<LogRouterError> for LogRelayError {
    fn from(err: LogRouterError) -> Self {
        match err {
            LogRouterError::Store(store) => LogRelayError::Store(store),
            other => LogRelayError::Router(other.to_string()),
        }
    }
}
