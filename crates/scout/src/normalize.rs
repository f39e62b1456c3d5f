//! 구조화 출력 정규화
//!
//! 형태가 제각각인 JSON 취약점 레코드를 [`VulnerabilityRecord`]로 변환합니다.
//! 필드마다 별칭 목록이 있으며 우선순위 순서로 처음 비어 있지 않은 값을 사용합니다.
//! `null`과 빈 문자열은 값이 없는 것으로 취급합니다.

use serde_json::{Map, Value};
use tracing::warn;

use scoutpost_core::metrics as m;
use scoutpost_core::types::Severity;

use crate::shape::{RecordShape, ShapeProfile, VULNERABILITY_PROFILE, classify};
use crate::types::{VulnerabilityRecord, placeholder_title};

/// 식별자가 없을 때의 값
pub const UNKNOWN_ID: &str = "unknown";

/// 심각도 라벨 별칭 (우선순위 순서)
pub const SEVERITY_KEYS: [&str; 3] = ["severity", "severity_level", "level"];

const ID_KEYS: [&str; 3] = ["id", "name", "cve"];
const TITLE_KEYS: [&str; 2] = ["title", "name"];
const DESCRIPTION_KEYS: [&str; 2] = ["description", "details"];
const VERSION_KEYS: [&str; 2] = ["version", "installed_version"];
const FIXED_VERSION_KEYS: [&str; 3] = ["fix_version", "fixed_version", "fixedVersion"];
const AFFECTED_RANGE_KEYS: [&str; 3] = ["affected_range", "vulnerable_range", "affected"];
const URL_KEYS: [&str; 2] = ["urls", "references"];

/// 스칼라 값을 문자열로 바꿉니다.
///
/// 숫자와 불리언은 JSON 표기 그대로 사용합니다. `null`, 빈 문자열,
/// 배열, 객체는 `None`입니다.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 별칭 중 처음으로 값이 있는 필드
pub(crate) fn first_text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(scalar_text))
}

/// 패키지 필드: 문자열 또는 `name`을 가진 객체
pub(crate) fn package_name(object: &Map<String, Value>) -> Option<String> {
    let direct = match object.get("package") {
        Some(Value::Object(package)) => package.get("name").and_then(scalar_text),
        Some(value) => scalar_text(value),
        None => None,
    };
    direct.or_else(|| object.get("package_name").and_then(scalar_text))
}

fn package_version(object: &Map<String, Value>) -> Option<String> {
    let nested = match object.get("package") {
        Some(Value::Object(package)) => package.get("version").and_then(scalar_text),
        _ => None,
    };
    nested.or_else(|| first_text(object, &VERSION_KEYS))
}

/// 참고 URL 목록: 문자열 또는 `url` 필드를 가진 객체의 배열
fn reference_urls(object: &Map<String, Value>) -> Vec<String> {
    for key in URL_KEYS {
        let Some(Value::Array(items)) = object.get(key) else {
            continue;
        };
        let urls: Vec<String> = items
            .iter()
            .filter_map(|item| match item {
                Value::Object(reference) => reference.get("url").and_then(scalar_text),
                other => scalar_text(other),
            })
            .collect();
        if !urls.is_empty() {
            return urls;
        }
    }
    Vec::new()
}

/// 원시 레코드에서 심각도 라벨을 읽어 분류합니다.
fn record_severity(object: &Map<String, Value>) -> Severity {
    first_text(object, &SEVERITY_KEYS)
        .map(|label| Severity::classify(&label))
        .unwrap_or_default()
}

/// 객체 하나를 취약점 레코드로 변환합니다.
pub fn normalize_vulnerability(object: &Map<String, Value>) -> VulnerabilityRecord {
    let package = package_name(object).unwrap_or_default();
    let title = first_text(object, &TITLE_KEYS).unwrap_or_else(|| placeholder_title(&package));

    VulnerabilityRecord {
        id: first_text(object, &ID_KEYS).unwrap_or_else(|| UNKNOWN_ID.to_owned()),
        severity: record_severity(object),
        title,
        description: first_text(object, &DESCRIPTION_KEYS).unwrap_or_default(),
        version: package_version(object).unwrap_or_default(),
        package,
        fixed_version: first_text(object, &FIXED_VERSION_KEYS).unwrap_or_default(),
        affected_range: first_text(object, &AFFECTED_RANGE_KEYS).unwrap_or_default(),
        reference_urls: reference_urls(object),
    }
}

/// 판별된 형태에서 객체 레코드만 꺼냅니다. 객체가 아닌 원소는 건너뜁니다.
pub(crate) fn record_objects<'a>(
    value: &'a Value,
    profile: &ShapeProfile,
) -> Vec<&'a Map<String, Value>> {
    let shape = classify(value, profile);
    if let RecordShape::Unrecognized = shape {
        warn!(kind = profile.kind, "unrecognized structured output shape, no records extracted");
        return Vec::new();
    }

    shape
        .records()
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match record {
            Value::Object(object) => Some(object),
            _ => {
                warn!(kind = profile.kind, index, "skipping non-object record");
                metrics::counter!(m::RECORDS_SKIPPED_TOTAL, m::LABEL_KIND => profile.kind)
                    .increment(1);
                None
            }
        })
        .collect()
}

/// 구조화 출력 전체를 취약점 레코드 목록으로 변환합니다. 실패하지 않습니다.
pub fn normalize_vulnerabilities(value: &Value) -> Vec<VulnerabilityRecord> {
    record_objects(value, &VULNERABILITY_PROFILE)
        .into_iter()
        .map(normalize_vulnerability)
        .collect()
}
