//! 심각도 집계
//!
//! 레코드 목록이나 원시 JSON에서 여섯 심각도 버킷의 개수를 셉니다.
//! 입력이 어떤 모양이든 실패하지 않으며, 해석할 수 없으면 모두 0입니다.

use serde_json::{Map, Value};

use scoutpost_core::types::Severity;

use crate::normalize::{SEVERITY_KEYS, scalar_text};
use crate::shape::{VULNERABILITY_PROFILE, classify};
use crate::types::{SeverityCounts, SeveritySummary, VulnerabilityRecord};

/// 정규화된 레코드의 심각도 요약
pub fn summarize(records: &[VulnerabilityRecord]) -> SeveritySummary {
    records
        .iter()
        .map(|record| record.severity)
        .collect::<SeverityCounts>()
        .into()
}

/// 원시 JSON 레코드의 심각도 요약
///
/// 라벨은 `severity`, `severity_level`, `level` 순으로 읽습니다.
/// 객체가 아닌 원소는 `unknown`으로 셉니다.
pub fn summarize_values(values: &[Value]) -> SeveritySummary {
    values
        .iter()
        .map(|value| match value {
            Value::Object(object) => present_severity(object),
            _ => Severity::Unknown,
        })
        .collect::<SeverityCounts>()
        .into()
}

/// 처음 존재하는 키의 라벨을 분류합니다.
///
/// 정규화기와 달리 값이 `null`이나 빈 문자열이어도 다음 키로 넘어가지 않습니다.
fn present_severity(object: &Map<String, Value>) -> Severity {
    SEVERITY_KEYS
        .iter()
        .find_map(|key| object.get(*key))
        .and_then(scalar_text)
        .map(|label| Severity::classify(&label))
        .unwrap_or_default()
}

/// 구조화 출력 전체의 심각도 요약
pub fn summarize_payload(value: &Value) -> SeveritySummary {
    summarize_values(classify(value, &VULNERABILITY_PROFILE).records())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn label_classification() {
        let values: Vec<Value> = ["CRITICAL", "High", "moderate", "LOW", "informational", "xyz"]
            .iter()
            .map(|label| json!({"severity": label}))
            .collect();
        let summary = summarize_values(&values);
        let counts = summary.counts();
        assert_eq!(counts.critical, 1);
        assert_eq!(counts.high, 1);
        assert_eq!(counts.medium, 1);
        assert_eq!(counts.low, 1);
        assert_eq!(counts.negligible, 1);
        assert_eq!(counts.unknown, 1);
        assert_eq!(summary.total(), 6);
    }

    #[test]
    fn empty_input_is_all_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary, SeveritySummary::default());
        assert_eq!(summary.total(), 0);
    }

    #[test]
    fn alias_keys_are_read_in_order() {
        let values = vec![
            json!({"severity_level": "high"}),
            json!({"level": "critical"}),
            json!({"severity": "low", "level": "critical"}),
            json!({}),
            json!("not an object"),
        ];
        let counts = *summarize_values(&values).counts();
        assert_eq!(counts.high, 1);
        assert_eq!(counts.critical, 1);
        assert_eq!(counts.low, 1);
        assert_eq!(counts.unknown, 2);
    }

    #[test]
    fn first_present_key_wins_even_when_empty() {
        let values = vec![
            json!({"severity": "", "level": "critical"}),
            json!({"severity": null, "level": "high"}),
            json!({"severity_level": "", "level": "low"}),
        ];
        let counts = *summarize_values(&values).counts();
        assert_eq!(counts.unknown, 3);
        assert_eq!(counts.critical, 0);
        assert_eq!(counts.high, 0);
        assert_eq!(counts.low, 0);
    }

    #[test]
    fn payload_shapes() {
        let wrapped = json!({"cves": [{"severity": "high"}, {"severity": "medium"}]});
        assert_eq!(summarize_payload(&wrapped).total(), 2);

        let single = json!({"id": "CVE-1", "severity": "critical"});
        assert_eq!(summarize_payload(&single).counts().critical, 1);

        assert_eq!(summarize_payload(&json!({"status": "ok"})).total(), 0);
        assert_eq!(summarize_payload(&json!(null)).total(), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn total_is_sum_of_buckets(labels in proptest::collection::vec(".{0,16}", 0..64)) {
                let values: Vec<Value> = labels.iter().map(|l| json!({"severity": l})).collect();
                let summary = summarize_values(&values);
                let c = summary.counts();
                prop_assert_eq!(
                    summary.total(),
                    c.critical + c.high + c.medium + c.low + c.negligible + c.unknown
                );
                prop_assert_eq!(summary.total(), labels.len());
            }

            #[test]
            fn classify_never_panics(label in "\\PC*") {
                let _ = Severity::classify(&label);
            }
        }
    }
}
