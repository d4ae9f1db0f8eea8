//! 에러 패턴 데이터 타입
//!
//! 스토어 해시에 JSON으로 저장되는 [`PatternRecord`]와, 로드 후 매처까지
//! 준비된 [`ErrorPattern`]을 정의합니다.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};

use super::matcher::PatternMatcher;
use crate::error::LogRouterError;

/// 패턴 ID 최대 길이
pub const MAX_PATTERN_ID_LEN: usize = 256;

/// 매칭 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// 부분 문자열 (기본값)
    #[default]
    Contains,
    /// 전체 일치
    Exact,
    /// 정규식 검색
    Regex,
}

impl MatchType {
    /// 레코드의 `match_type` 문자열을 해석합니다. 알 수 없는 값이면 None.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "contains" => Some(Self::Contains),
            "exact" => Some(Self::Exact),
            "regex" => Some(Self::Regex),
            _ => None,
        }
    }

    /// 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Exact => "exact",
            Self::Regex => "regex",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 운영자가 손으로 넣은 플래그 값 (bool, 0/1, "true"/"false")
#[derive(Deserialize)]
#[serde(untagged)]
enum FlagValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl FlagValue {
    fn into_bool<E: de::Error>(self) -> Result<bool, E> {
        match self {
            Self::Bool(value) => Ok(value),
            Self::Int(value) => Ok(value != 0),
            Self::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" | "" => Ok(false),
                other => Err(E::custom(format!("invalid flag value '{other}'"))),
            },
        }
    }
}

/// null은 false
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FlagValue>::deserialize(deserializer)? {
        Some(value) => value.into_bool(),
        None => Ok(false),
    }
}

/// 명시적 null은 비활성. 필드가 없을 때만 `default`로 None(활성)이 됩니다.
fn lenient_active<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FlagValue>::deserialize(deserializer)? {
        Some(value) => value.into_bool().map(Some),
        None => Ok(Some(false)),
    }
}

/// 스토어에 저장되는 패턴 레코드
///
/// 해시 필드명이 패턴 ID이고 값이 이 구조체의 JSON입니다.
///
/// ```json
/// {
///   "pattern": "out of memory",
///   "match_type": "contains",
///   "case_sensitive": false,
///   "active": true,
///   "classification": "fatal",
///   "is_log_filter_only": false,
///   "human_readable_message": "The GPU ran out of memory.",
///   "call_to_action": "Reduce the batch size or image resolution.",
///   "retry": true
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    /// 매칭할 텍스트 또는 정규식
    #[serde(default)]
    pub pattern: String,
    /// 매칭 방식 문자열 (없으면 contains)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
    /// 대소문자 구분 여부
    #[serde(default, deserialize_with = "lenient_flag")]
    pub case_sensitive: bool,
    /// 활성 여부 (없으면 활성, null이면 비활성)
    #[serde(
        default,
        deserialize_with = "lenient_active",
        skip_serializing_if = "Option::is_none"
    )]
    pub active: Option<bool>,
    /// 분류 태그 (없으면 "fatal")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    /// 로그 필터 전용 여부
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_log_filter_only: bool,
    /// 사용자에게 보여줄 설명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_readable_message: Option<String>,
    /// 사용자가 취할 조치
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_to_action: Option<String>,
    /// 재시도 가능 여부
    #[serde(default, deserialize_with = "lenient_flag")]
    pub retry: bool,
}

impl PatternRecord {
    /// 기본 분류 태그
    pub const DEFAULT_CLASSIFICATION: &'static str = "fatal";

    /// JSON 문자열을 파싱합니다.
    pub fn from_json(pattern_id: &str, json: &str) -> Result<Self, LogRouterError> {
        serde_json::from_str(json).map_err(|e| LogRouterError::PatternRecord {
            pattern_id: pattern_id.to_owned(),
            reason: e.to_string(),
        })
    }

    /// JSON 문자열로 직렬화합니다.
    pub fn to_json(&self) -> Result<String, LogRouterError> {
        Ok(serde_json::to_string(self)?)
    }

    /// 활성 여부
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }

    /// 패턴 텍스트가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    /// 요청된 매칭 방식과, 인식하지 못한 원본 문자열(있다면)을 반환합니다.
    pub fn requested_match_type(&self) -> (MatchType, Option<&str>) {
        match self.match_type.as_deref() {
            None => (MatchType::Contains, None),
            Some(raw) => match MatchType::parse(raw) {
                Some(match_type) => (match_type, None),
                None => (MatchType::Contains, Some(raw)),
            },
        }
    }

    /// 분류 태그 (기본값 적용)
    pub fn classification(&self) -> &str {
        self.classification
            .as_deref()
            .unwrap_or(Self::DEFAULT_CLASSIFICATION)
    }

    /// 레코드의 유효성을 엄격하게 검증합니다.
    ///
    /// 운영 도구가 레코드를 쓰기 전에 사용합니다. 로더는 잘못된 정규식을
    /// 거부하지 않고 contains로 강등하므로 이 검증을 쓰지 않습니다.
    pub fn validate(&self, pattern_id: &str) -> Result<(), LogRouterError> {
        if pattern_id.is_empty() {
            return Err(LogRouterError::PatternValidation {
                pattern_id: "(empty)".to_owned(),
                reason: "pattern id must not be empty".to_owned(),
            });
        }

        if pattern_id.len() > MAX_PATTERN_ID_LEN {
            return Err(LogRouterError::PatternValidation {
                pattern_id: pattern_id.to_owned(),
                reason: format!("pattern id must not exceed {MAX_PATTERN_ID_LEN} characters"),
            });
        }

        if self.is_empty() {
            return Err(LogRouterError::PatternValidation {
                pattern_id: pattern_id.to_owned(),
                reason: "pattern text must not be empty".to_owned(),
            });
        }

        let (match_type, unknown) = self.requested_match_type();
        if let Some(raw) = unknown {
            return Err(LogRouterError::PatternValidation {
                pattern_id: pattern_id.to_owned(),
                reason: format!("unknown match_type '{raw}' (expected contains, exact or regex)"),
            });
        }

        PatternMatcher::compile(&self.pattern, match_type, self.case_sensitive).map_err(|e| {
            LogRouterError::PatternValidation {
                pattern_id: pattern_id.to_owned(),
                reason: format!("invalid regex: {e}"),
            }
        })?;

        Ok(())
    }
}

/// 카탈로그에 올라간 에러 패턴
///
/// 매처는 로드 시 한 번 준비됩니다. 정규식 컴파일에 실패한 패턴은
/// `match_type`이 영구히 [`MatchType::Contains`]가 되고 `downgraded`가 true입니다.
#[derive(Debug, Clone)]
pub struct ErrorPattern {
    /// 패턴 ID
    pub id: String,
    /// 원본 패턴 텍스트
    pub pattern_text: String,
    /// 실제 적용되는 매칭 방식
    pub match_type: MatchType,
    /// 대소문자 구분 여부
    pub case_sensitive: bool,
    /// 정규식 컴파일 실패로 contains로 강등되었는지 여부
    pub downgraded: bool,
    /// 분류 태그
    pub classification: String,
    /// 로그 필터 전용 여부
    pub is_log_filter_only: bool,
    /// 사용자에게 보여줄 설명
    pub human_readable_message: Option<String>,
    /// 사용자가 취할 조치
    pub call_to_action: Option<String>,
    /// 재시도 가능 여부
    pub retryable: bool,
    pub(crate) matcher: PatternMatcher,
}

impl ErrorPattern {
    /// 레코드로부터 패턴을 만듭니다.
    ///
    /// 정규식 컴파일 실패는 에러가 아니라 contains 강등으로 처리합니다.
    /// 비활성/빈 패턴 여부는 호출자가 먼저 걸러야 합니다.
    pub fn from_record(id: impl Into<String>, record: &PatternRecord) -> Self {
        let id = id.into();
        let (requested, unknown) = record.requested_match_type();
        if let Some(raw) = unknown {
            tracing::warn!(
                pattern_id = %id,
                match_type = raw,
                "META: [LogRouter] unknown match_type, using contains"
            );
        }

        let (matcher, downgraded) =
            match PatternMatcher::compile(&record.pattern, requested, record.case_sensitive) {
                Ok(matcher) => (matcher, false),
                Err(e) => {
                    tracing::warn!(
                        pattern_id = %id,
                        error = %e,
                        "META: [LogRouter] invalid regex, falling back to substring matching"
                    );
                    (
                        PatternMatcher::substring(&record.pattern, record.case_sensitive),
                        true,
                    )
                }
            };

        Self {
            id,
            pattern_text: record.pattern.clone(),
            match_type: matcher.match_type(),
            case_sensitive: record.case_sensitive,
            downgraded,
            classification: record.classification().to_owned(),
            is_log_filter_only: record.is_log_filter_only,
            human_readable_message: record.human_readable_message.clone(),
            call_to_action: record.call_to_action.clone(),
            retryable: record.retry,
            matcher,
        }
    }

    /// 메시지가 이 패턴에 매칭되는지 확인합니다.
    pub fn matches(&self, message: &str) -> bool {
        self.matcher
            .is_match(&super::matcher::MatchSubject::new(message))
    }
}
