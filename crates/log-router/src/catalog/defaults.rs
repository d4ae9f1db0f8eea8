//! 내장 기본 패턴
//!
//! 스토어에 활성 패턴이 하나도 없고 `seed_default_patterns`가 켜져 있을 때
//! 카탈로그를 채우는 고정 키워드 목록입니다. 스토어 레코드와 같은 타입을 쓰므로
//! 매칭 경로는 동일합니다.

use super::types::{ErrorPattern, PatternRecord};

/// 기본 패턴 ID 접두어
pub const BUILTIN_PREFIX: &str = "builtin:";

struct Seed {
    id: &'static str,
    pattern: &'static str,
    match_type: &'static str,
    human_readable_message: &'static str,
    retry: bool,
}

const SEEDS: &[Seed] = &[
    Seed {
        id: "cuda_oom",
        pattern: r"CUDA (error: )?out of memory",
        match_type: "regex",
        human_readable_message: "The GPU ran out of memory while running the workflow.",
        retry: true,
    },
    Seed {
        id: "segfault",
        pattern: "Segmentation fault",
        match_type: "contains",
        human_readable_message: "The worker process crashed.",
        retry: true,
    },
    Seed {
        id: "traceback",
        pattern: "Traceback (most recent call last)",
        match_type: "contains",
        human_readable_message: "The workflow raised an unhandled exception.",
        retry: false,
    },
    Seed {
        id: "fatal_error",
        pattern: "fatal error",
        match_type: "contains",
        human_readable_message: "The workflow hit a fatal error.",
        retry: false,
    },
    Seed {
        id: "load_failure",
        pattern: "Failed to load",
        match_type: "contains",
        human_readable_message: "A model or resource failed to load.",
        retry: false,
    },
    Seed {
        id: "exception",
        pattern: r"\bException\b",
        match_type: "regex",
        human_readable_message: "The workflow raised an exception.",
        retry: false,
    },
];

/// 내장 기본 패턴 레코드 목록을 (ID, 레코드) 쌍으로 반환합니다.
pub fn default_records() -> Vec<(String, PatternRecord)> {
    SEEDS
        .iter()
        .map(|seed| {
            let record = PatternRecord {
                pattern: seed.pattern.to_owned(),
                match_type: Some(seed.match_type.to_owned()),
                human_readable_message: Some(seed.human_readable_message.to_owned()),
                retry: seed.retry,
                ..Default::default()
            };
            (format!("{BUILTIN_PREFIX}{}", seed.id), record)
        })
        .collect()
}

/// 내장 기본 패턴을 카탈로그 패턴으로 반환합니다.
pub fn default_patterns() -> Vec<ErrorPattern> {
    default_records()
        .into_iter()
        .map(|(id, record)| ErrorPattern::from_record(id, &record))
        .collect()
}
