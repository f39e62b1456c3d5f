//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않으면 기록은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `scoutpost_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(scoutpost_core::metrics::SCANS_COMPLETED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 심각도 레이블 키 (critical, high, medium, low, negligible, unknown)
pub const LABEL_SEVERITY: &str = "severity";

/// 스캔 종류 레이블 키 (cves, recommendations)
pub const LABEL_KIND: &str = "kind";

/// 출력 모드 레이블 키 (text, structured)
pub const LABEL_MODE: &str = "mode";

/// 실패 사유 레이블 키 (unavailable, command, tool, parse)
pub const LABEL_REASON: &str = "reason";

// ─── 스캔 메트릭 ────────────────────────────────────────────────────

/// 완료된 스캔 수 (counter, labels: kind, mode)
pub const SCANS_COMPLETED_TOTAL: &str = "scoutpost_scans_completed_total";

/// 실패한 스캔 수 (counter, label: reason)
pub const SCAN_FAILURES_TOTAL: &str = "scoutpost_scan_failures_total";

/// 발견된 취약점 수 (counter, label: severity)
pub const VULNERABILITIES_FOUND_TOTAL: &str = "scoutpost_vulnerabilities_found_total";

/// 정규화 중 건너뛴 레코드 수 (counter)
pub const RECORDS_SKIPPED_TOTAL: &str = "scoutpost_records_skipped_total";

/// 스캔 소요 시간 (histogram, 초)
pub const SCAN_DURATION_SECONDS: &str = "scoutpost_scan_duration_seconds";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 레코더를 설치한 쪽에서 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        SCANS_COMPLETED_TOTAL,
        "Total number of scans that produced a report"
    );
    describe_counter!(
        SCAN_FAILURES_TOTAL,
        "Total number of scans aborted or reported as failed"
    );
    describe_counter!(
        VULNERABILITIES_FOUND_TOTAL,
        "Total number of vulnerability records extracted, by severity"
    );
    describe_counter!(
        RECORDS_SKIPPED_TOTAL,
        "Total number of malformed records skipped during normalization"
    );
    describe_histogram!(
        SCAN_DURATION_SECONDS,
        "Time to run and parse a single scan in seconds"
    );
}
