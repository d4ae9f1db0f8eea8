//! 패턴 매칭 로직 -- 매칭 방식별 비교 및 정규식 사전 컴파일
//!
//! [`PatternMatcher`]는 패턴 로딩 시 한 번만 만들어지며, 매칭 시에는
//! 재컴파일이나 예외 경로 없이 준비된 상태만 확인합니다.

use std::cell::OnceCell;

use regex::{Regex, RegexBuilder};

use super::types::MatchType;

/// 정규식 컴파일 크기 제한 (바이트)
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// 매칭 대상 메시지
///
/// 대소문자 무시 비교가 여러 번 일어나도 소문자 변환은 한 번만 하도록
/// 변환 결과를 지연 캐싱합니다.
pub struct MatchSubject<'a> {
    raw: &'a str,
    lowered: OnceCell<String>,
}

impl<'a> MatchSubject<'a> {
    /// 새 매칭 대상을 만듭니다.
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            lowered: OnceCell::new(),
        }
    }

    /// 원문
    pub fn raw(&self) -> &str {
        self.raw
    }

    /// 소문자 변환본
    pub fn lowered(&self) -> &str {
        self.lowered.get_or_init(|| self.raw.to_lowercase())
    }

    fn view(&self, case_sensitive: bool) -> &str {
        if case_sensitive {
            self.raw
        } else {
            self.lowered()
        }
    }
}

/// 준비된 매처
///
/// 대소문자 무시 모드의 `Exact`/`Contains`는 패턴을 미리 소문자로 바꿔 둡니다.
/// 정규식은 대소문자 무시를 컴파일 플래그로 적용합니다.
#[derive(Debug, Clone)]
pub enum PatternMatcher {
    /// 전체 일치
    Exact {
        /// 비교 대상 (대소문자 무시 모드면 소문자)
        expected: String,
        /// 대소문자 구분 여부
        case_sensitive: bool,
    },
    /// 부분 문자열
    Contains {
        /// 찾을 문자열 (대소문자 무시 모드면 소문자)
        needle: String,
        /// 대소문자 구분 여부
        case_sensitive: bool,
    },
    /// 컴파일된 정규식
    Regex(Regex),
}

impl PatternMatcher {
    /// 매칭 방식에 맞는 매처를 만듭니다.
    ///
    /// 정규식 컴파일 실패만 에러가 됩니다.
    pub fn compile(
        pattern: &str,
        match_type: MatchType,
        case_sensitive: bool,
    ) -> Result<Self, regex::Error> {
        match match_type {
            MatchType::Exact => Ok(Self::Exact {
                expected: normalize(pattern, case_sensitive),
                case_sensitive,
            }),
            MatchType::Contains => Ok(Self::substring(pattern, case_sensitive)),
            MatchType::Regex => {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(!case_sensitive)
                    .size_limit(REGEX_SIZE_LIMIT)
                    .build()?;
                Ok(Self::Regex(regex))
            }
        }
    }

    /// 부분 문자열 매처를 만듭니다.
    pub fn substring(pattern: &str, case_sensitive: bool) -> Self {
        Self::Contains {
            needle: normalize(pattern, case_sensitive),
            case_sensitive,
        }
    }

    /// 실제 적용되는 매칭 방식
    pub fn match_type(&self) -> MatchType {
        match self {
            Self::Exact { .. } => MatchType::Exact,
            Self::Contains { .. } => MatchType::Contains,
            Self::Regex(_) => MatchType::Regex,
        }
    }

    /// 대상이 매칭되는지 평가합니다.
    pub fn is_match(&self, subject: &MatchSubject<'_>) -> bool {
        match self {
            Self::Exact {
                expected,
                case_sensitive,
            } => subject.view(*case_sensitive) == expected.as_str(),
            Self::Contains {
                needle,
                case_sensitive,
            } => subject.view(*case_sensitive).contains(needle.as_str()),
            Self::Regex(regex) => regex.is_match(subject.raw()),
        }
    }
}

fn normalize(pattern: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        pattern.to_owned()
    } else {
        pattern.to_lowercase()
    }
}
