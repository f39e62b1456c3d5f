#![no_main]

use libfuzzer_sys::fuzz_target;
use scoutpost_scout::{normalize_vulnerabilities, summarize, summarize_payload};

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    let records = normalize_vulnerabilities(&value);
    let summary = summarize(&records);
    assert_eq!(summary.total(), records.len());
    assert_eq!(summary.total(), summary.counts().total());

    // 페이로드 집계는 객체가 아닌 항목도 unknown으로 세므로 정규화 결과보다 작을 수 없음
    let payload = summarize_payload(&value);
    assert!(payload.total() >= summary.total());
});
