//! 패턴 로더 -- 스토어 해시에서 패턴 레코드를 읽어 옵니다.
//!
//! 소스(해시 키)는 주어진 순서대로 읽고, 각 해시의 필드 순서를 그대로 유지합니다.
//! 개별 레코드나 개별 소스의 실패는 경고 로그를 남기고 건너뜁니다.

use std::collections::HashSet;

use serde::Serialize;

use logrelay_core::error::StoreError;

use super::types::{ErrorPattern, PatternRecord};
use crate::error::LogRouterError;
use crate::store::LogStore;

/// 전역 패턴 해시 키
pub const GLOBAL_PATTERNS_KEY: &str = "error_patterns:global";

/// 카탈로그에 올릴 수 있는 최대 패턴 수
pub const MAX_PATTERNS_COUNT: usize = 10_000;

/// 커넥터 전용 패턴 해시 키
pub fn connector_patterns_key(connector_type: &str) -> String {
    format!("error_patterns:{connector_type}")
}

/// 패턴 소스 (해시 키 하나)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternSource {
    /// 범위 이름 (global, connector)
    pub scope: String,
    /// 해시 키
    pub key: String,
}

impl PatternSource {
    /// 전역 소스
    pub fn global() -> Self {
        Self {
            scope: "global".to_owned(),
            key: GLOBAL_PATTERNS_KEY.to_owned(),
        }
    }

    /// 커넥터 전용 소스
    pub fn connector(connector_type: &str) -> Self {
        Self {
            scope: "connector".to_owned(),
            key: connector_patterns_key(connector_type),
        }
    }

    /// 기본 로딩 순서: 전역 다음 커넥터 전용
    pub fn standard(connector_type: &str) -> Vec<Self> {
        vec![Self::global(), Self::connector(connector_type)]
    }
}

/// 로딩 결과 요약
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// 카탈로그에 올라간 패턴 수
    pub loaded: usize,
    /// 비활성이라 제외된 레코드 수
    pub inactive: usize,
    /// 빈 패턴이라 제외된 레코드 수
    pub empty: usize,
    /// 파싱 실패로 제외된 레코드 수
    pub malformed: usize,
    /// 중복 ID로 제외된 레코드 수
    pub duplicate: usize,
    /// contains로 강등된 정규식 패턴 수
    pub downgraded: usize,
    /// 최대 개수를 넘어 로딩을 멈췄는지 여부
    pub truncated: bool,
    /// 읽지 못한 소스 키
    pub failed_sources: Vec<String>,
}

/// 스토어에서 읽은 원본 레코드 하나
pub type RawRecord = (String, Result<PatternRecord, LogRouterError>);

/// 패턴 로더
pub struct PatternLoader;

impl PatternLoader {
    /// 소스 하나의 레코드를 모두 읽습니다 (비활성 포함).
    ///
    /// # Errors
    /// - 스토어 호출이 실패한 경우
    pub fn read_source(
        store: &dyn LogStore,
        source: &PatternSource,
    ) -> Result<Vec<RawRecord>, StoreError> {
        let entries = store.hash_entries(&source.key)?;
        Ok(entries
            .into_iter()
            .map(|(id, json)| {
                let record = PatternRecord::from_json(&id, &json);
                (id, record)
            })
            .collect())
    }

    /// 모든 소스를 순서대로 읽어 패턴 목록을 만듭니다.
    ///
    /// 에러를 반환하지 않습니다. 스토어에 닿지 못한 소스는 요약에 기록하고
    /// 나머지 소스로 계속 진행합니다.
    pub fn load(
        store: &dyn LogStore,
        sources: &[PatternSource],
    ) -> (Vec<ErrorPattern>, LoadSummary) {
        let mut patterns = Vec::new();
        let mut summary = LoadSummary::default();
        let mut seen_ids = HashSet::new();

        'sources: for source in sources {
            let records = match Self::read_source(store, source) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(
                        key = %source.key,
                        error = %e,
                        "META: [LogRouter] failed to read pattern source, skipping"
                    );
                    summary.failed_sources.push(source.key.clone());
                    continue;
                }
            };

            for (id, record) in records {
                let record = match record {
                    Ok(record) => record,
                    Err(e) => {
                        tracing::warn!(
                            key = %source.key,
                            pattern_id = %id,
                            error = %e,
                            "META: [LogRouter] malformed pattern record, skipping"
                        );
                        summary.malformed += 1;
                        continue;
                    }
                };

                if !record.is_active() {
                    tracing::debug!(pattern_id = %id, "META: [LogRouter] inactive pattern, skipping");
                    summary.inactive += 1;
                    continue;
                }

                if record.is_empty() {
                    tracing::debug!(pattern_id = %id, "META: [LogRouter] empty pattern, skipping");
                    summary.empty += 1;
                    continue;
                }

                // 중복 ID 검사
                if !seen_ids.insert(id.clone()) {
                    tracing::warn!(
                        key = %source.key,
                        pattern_id = %id,
                        "META: [LogRouter] duplicate pattern id, skipping"
                    );
                    summary.duplicate += 1;
                    continue;
                }

                if patterns.len() >= MAX_PATTERNS_COUNT {
                    tracing::warn!(
                        max = MAX_PATTERNS_COUNT,
                        "META: [LogRouter] too many patterns, ignoring the rest"
                    );
                    summary.truncated = true;
                    break 'sources;
                }

                let pattern = ErrorPattern::from_record(id, &record);
                if pattern.downgraded {
                    summary.downgraded += 1;
                }
                patterns.push(pattern);
            }
        }

        summary.loaded = patterns.len();
        tracing::info!(
            loaded = summary.loaded,
            inactive = summary.inactive,
            malformed = summary.malformed,
            downgraded = summary.downgraded,
            failed_sources = summary.failed_sources.len(),
            "META: [LogRouter] loaded error patterns"
        );

        (patterns, summary)
    }
}
