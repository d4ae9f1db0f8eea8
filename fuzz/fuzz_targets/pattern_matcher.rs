#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use logrelay_core::types::LogLevel;
use logrelay_router::catalog::{ErrorPattern, PatternCatalog, PatternRecord};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 카탈로그 패턴 (최대 8개로 제한)
    patterns: Vec<FuzzPattern>,
    /// 매칭 대상 메시지
    message: String,
}

#[derive(Arbitrary, Debug)]
struct FuzzPattern {
    text: String,
    match_type: FuzzMatchType,
    case_sensitive: bool,
}

#[derive(Arbitrary, Debug)]
enum FuzzMatchType {
    Contains,
    Exact,
    Regex,
    Unknown(String),
}

impl FuzzMatchType {
    fn to_record_value(&self) -> String {
        match self {
            FuzzMatchType::Contains => "contains".to_owned(),
            FuzzMatchType::Exact => "exact".to_owned(),
            FuzzMatchType::Regex => "regex".to_owned(),
            FuzzMatchType::Unknown(raw) => raw.clone(),
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let patterns: Vec<ErrorPattern> = input
        .patterns
        .iter()
        .take(8)
        .filter(|p| !p.text.is_empty())
        .enumerate()
        .map(|(i, p)| {
            let record = PatternRecord {
                pattern: p.text.clone(),
                match_type: Some(p.match_type.to_record_value()),
                case_sensitive: p.case_sensitive,
                ..Default::default()
            };
            // 잘못된 정규식은 강등될 뿐 크래시가 나면 안 됨
            ErrorPattern::from_record(format!("p{i}"), &record)
        })
        .collect();

    let catalog = PatternCatalog::from_patterns(patterns);
    let _ = catalog.find_match(&input.message);
    let _ = LogLevel::from_message(&input.message);
});
