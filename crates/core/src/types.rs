//! 도메인 타입: 시스템 전역에서 사용되는 공통 타입
//!
//! 호스트가 넘겨주는 로그 라인, 현재 실행 중인 작업의 컨텍스트,
//! 메시지 본문에서 추출한 로그 레벨을 정의합니다.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// 현재 시각을 UNIX epoch 기준 초(소수점 포함)로 반환합니다.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// 로그 라인
///
/// 호스트의 로그 플러시 콜백이 배치 단위로 넘겨주는 한 줄입니다.
/// 와이어 형식은 `{"t": 1.0, "m": "..."}` 또는 `{"timestamp": 1.0, "message": "..."}`
/// 둘 다 허용합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    /// 타임스탬프 (epoch 초)
    #[serde(alias = "t", default = "unix_timestamp")]
    pub timestamp: f64,
    /// 원문 메시지
    #[serde(alias = "m", default)]
    pub message: String,
}

impl LogLine {
    /// 현재 시각으로 로그 라인을 생성합니다.
    pub fn new(message: impl Into<String>) -> Self {
        Self::at(unix_timestamp(), message)
    }

    /// 지정한 시각으로 로그 라인을 생성합니다.
    pub fn at(timestamp: f64, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
        }
    }

    /// 메시지가 비어 있거나 공백뿐인지 확인합니다.
    pub fn is_blank(&self) -> bool {
        self.message.trim().is_empty()
    }
}

/// 작업 컨텍스트
///
/// 배치가 귀속되는 작업의 식별자입니다. 실행 중인 작업이 없으면
/// 값 자체가 존재하지 않으며(`Option::None`), 빈 job_id는 만들지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobContext {
    /// 작업 ID
    pub job_id: String,
    /// 워크플로 ID (알 수 없으면 None)
    #[serde(default)]
    pub workflow_id: Option<String>,
}

impl JobContext {
    /// 작업 컨텍스트를 생성합니다. 빈 job_id이면 None을 반환합니다.
    pub fn new(job_id: impl Into<String>, workflow_id: Option<String>) -> Option<Self> {
        let job_id = job_id.into();
        if job_id.trim().is_empty() {
            return None;
        }
        Some(Self {
            job_id,
            workflow_id: workflow_id.filter(|w| !w.is_empty()),
        })
    }
}

impl fmt::Display for JobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.workflow_id {
            Some(workflow) => write!(f, "job={} workflow={}", self.job_id, workflow),
            None => write!(f, "job={}", self.job_id),
        }
    }
}

/// 로그 레벨
///
/// 메시지 본문의 키워드로 추출한 대략적인 레벨입니다.
/// 직렬화 시 대문자 이름(`"CRITICAL"`, `"ERROR"` ...)을 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// CRITICAL 또는 FATAL
    Critical,
    /// ERROR
    Error,
    /// WARNING 또는 WARN
    Warning,
    /// INFO
    Info,
    /// DEBUG
    Debug,
    /// 키워드 없음
    Unknown,
}

impl LogLevel {
    /// 우선순위 순서의 (키워드, 레벨) 목록
    const KEYWORDS: [(&'static str, LogLevel); 6] = [
        ("CRITICAL", LogLevel::Critical),
        ("FATAL", LogLevel::Critical),
        ("ERROR", LogLevel::Error),
        ("WARN", LogLevel::Warning),
        ("INFO", LogLevel::Info),
        ("DEBUG", LogLevel::Debug),
    ];

    /// 메시지에서 레벨 키워드를 찾아 레벨을 결정합니다.
    ///
    /// 대소문자를 구분하지 않으며, 여러 키워드가 있으면
    /// `CRITICAL/FATAL > ERROR > WARNING/WARN > INFO > DEBUG` 순으로 높은 쪽을 택합니다.
    pub fn from_message(message: &str) -> Self {
        let upper = message.to_uppercase();
        Self::KEYWORDS
            .iter()
            .find(|(keyword, _)| upper.contains(keyword))
            .map(|(_, level)| *level)
            .unwrap_or(LogLevel::Unknown)
    }

    /// 레벨 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
