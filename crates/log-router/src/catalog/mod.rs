//! 에러 패턴 카탈로그 -- 스토어 기반 패턴 로딩 및 최초 매칭
//!
//! 운영자가 스토어 해시(`error_patterns:global`, `error_patterns:{connector}`)에
//! 등록한 패턴을 시작 시 한 번 읽어 매처까지 준비해 둡니다. 로드 이후에는 읽기 전용입니다.
//!
//! # 레코드 형식
//! ```json
//! {"pattern": "out of memory", "match_type": "contains", "case_sensitive": false,
//!  "active": true, "classification": "fatal", "retry": true}
//! ```
//!
//! # 아키텍처
//! - [`PatternCatalog`]: 로드된 패턴 목록과 최초 매칭
//! - [`loader`]: 스토어 해시 읽기, 레코드 필터링
//! - [`matcher`]: 매칭 방식별 비교 (exact, contains, regex)
//! - [`types`]: 레코드/패턴 데이터 구조
//! - [`defaults`]: 내장 기본 패턴

pub mod defaults;
pub mod loader;
pub mod matcher;
pub mod types;

pub use defaults::default_patterns;
pub use loader::{
    GLOBAL_PATTERNS_KEY, LoadSummary, MAX_PATTERNS_COUNT, PatternLoader, PatternSource,
    connector_patterns_key,
};
pub use matcher::{MatchSubject, PatternMatcher};
pub use types::{ErrorPattern, MatchType, PatternRecord};

use crate::DIAGNOSTIC_MARKER;
use crate::store::LogStore;

/// 에러 패턴 카탈로그
///
/// 패턴은 로드 순서를 유지하며, 매칭은 첫 번째로 걸린 패턴을 반환합니다.
/// 구체성에 따른 순위는 매기지 않습니다.
///
/// # 사용 예시
/// ```ignore
/// let (catalog, summary) = PatternCatalog::load(&store, &PatternSource::standard("comfyui"));
/// if let Some(pattern) = catalog.find_match("CUDA error: out of memory") {
///     println!("matched {}", pattern.id);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    patterns: Vec<ErrorPattern>,
}

impl PatternCatalog {
    /// 빈 카탈로그 (전달 전용 모드)
    pub fn empty() -> Self {
        Self::default()
    }

    /// 이미 준비된 패턴으로 카탈로그를 만듭니다.
    pub fn from_patterns(patterns: Vec<ErrorPattern>) -> Self {
        Self { patterns }
    }

    /// 스토어에서 카탈로그를 로드합니다.
    ///
    /// 스토어에 닿지 못하거나 활성 패턴이 없으면 빈 카탈로그를 반환합니다.
    pub fn load(store: &dyn LogStore, sources: &[PatternSource]) -> (Self, LoadSummary) {
        let (patterns, summary) = PatternLoader::load(store, sources);
        (Self::from_patterns(patterns), summary)
    }

    /// 메시지에 처음으로 매칭되는 패턴을 찾습니다.
    ///
    /// 엔진 자체 진단 마커가 들어 있는 메시지는 어떤 패턴이 들어 있어도 매칭하지 않습니다.
    pub fn find_match(&self, message: &str) -> Option<&ErrorPattern> {
        if message.contains(DIAGNOSTIC_MARKER) {
            return None;
        }

        let subject = MatchSubject::new(message);
        self.patterns.iter().find(|p| p.matcher.is_match(&subject))
    }

    /// 패턴 수
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// 패턴을 로드 순서대로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorPattern> {
        self.patterns.iter()
    }
}
