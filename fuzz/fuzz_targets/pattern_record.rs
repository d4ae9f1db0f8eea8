#![no_main]

use libfuzzer_sys::fuzz_target;
use logrelay_router::catalog::{ErrorPattern, PatternRecord};

// 스토어에서 읽는 임의의 레코드 JSON이 로더 경로에서 패닉을 일으키면 안 됨
fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(record) = PatternRecord::from_json("fuzz", json) else {
        return;
    };

    let _ = record.validate("fuzz");
    if record.is_active() && !record.is_empty() {
        let pattern = ErrorPattern::from_record("fuzz", &record);
        let _ = pattern.matches(&record.pattern);
    }
});
