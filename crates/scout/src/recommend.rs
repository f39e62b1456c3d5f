//! 권장사항 정규화와 요약 출력
//!
//! 정규화는 취약점과 같은 형태 판별을 권장사항 규칙으로 수행합니다.
//! 요약 출력은 레코드마다 한 줄을 만들고 줄바꿈으로 이어 붙입니다.

use serde_json::{Map, Value};

use crate::normalize::{first_text, record_objects, scalar_text};
use crate::shape::RECOMMENDATION_PROFILE;
use crate::types::{
    DEFAULT_RECOMMENDATION_KIND, DEFAULT_RECOMMENDATION_REASON, DEFAULT_RECOMMENDATION_SEVERITY,
    RecommendationRecord,
};

/// 권장사항이 하나도 없을 때의 요약
pub const NO_RECOMMENDATIONS: &str = "No specific recommendations available.";

/// 정규화된 레코드가 직접 가지는 필드 (`extra`로 전달하지 않음)
const NAMED_FIELDS: [&str; 6] = ["type", "current", "recommended", "reason", "severity", "package"];

/// 일반 출력에서 제외하는 필드
const GENERIC_SKIP: [&str; 4] = ["id", "type", "status", "severity"];

fn recommendation_package(object: &Map<String, Value>) -> Option<String> {
    match object.get("package")? {
        Value::Object(package) => package.get("name").and_then(scalar_text),
        other => scalar_text(other),
    }
}

/// 객체 하나를 권장사항 레코드로 변환합니다.
pub fn normalize_recommendation(object: &Map<String, Value>) -> RecommendationRecord {
    let extra = object
        .iter()
        .filter(|(key, _)| !NAMED_FIELDS.contains(&key.as_str()) && !key.starts_with('_'))
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    RecommendationRecord {
        kind: first_text(object, &["type"])
            .map(|t| t.to_lowercase())
            .unwrap_or_else(|| DEFAULT_RECOMMENDATION_KIND.to_owned()),
        current: first_text(object, &["current", "from"]).unwrap_or_default(),
        recommended: first_text(object, &["recommended", "to"]).unwrap_or_default(),
        reason: first_text(object, &["reason", "description"])
            .unwrap_or_else(|| DEFAULT_RECOMMENDATION_REASON.to_owned()),
        severity: first_text(object, &["severity"])
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| DEFAULT_RECOMMENDATION_SEVERITY.to_owned()),
        package: recommendation_package(object).unwrap_or_default(),
        extra,
    }
}

/// 구조화 출력 전체를 권장사항 레코드 목록으로 변환합니다. 실패하지 않습니다.
pub fn normalize_recommendations(value: &Value) -> Vec<RecommendationRecord> {
    record_objects(value, &RECOMMENDATION_PROFILE)
        .into_iter()
        .map(normalize_recommendation)
        .collect()
}

/// `base_image` → `Base Image`
fn title_case(kind: &str) -> String {
    kind.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn extra_text(record: &RecommendationRecord, keys: &[&str]) -> Option<String> {
    first_text(&record.extra, keys)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 레코드 하나를 한 줄로 표현합니다. 표시할 내용이 없으면 `None`입니다.
pub fn format_recommendation(record: &RecommendationRecord) -> Option<String> {
    if !record.current.is_empty() && !record.recommended.is_empty() {
        let mut line = format!(
            "{}: {} → {}",
            title_case(&record.kind),
            record.current,
            record.recommended
        );
        if !record.reason.is_empty() && record.reason != DEFAULT_RECOMMENDATION_REASON {
            line.push_str(&format!(" ({})", record.reason));
        }
        return Some(line);
    }

    let version = extra_text(record, &["version"]);
    let fix = extra_text(record, &["fix_version", "fixed_version"]);
    if let (false, Some(version), Some(fix)) = (record.package.is_empty(), version, fix) {
        return Some(format!("Package Update: {} {version} → {fix}", record.package));
    }

    let named = [
        ("current", record.current.as_str()),
        ("recommended", record.recommended.as_str()),
        ("reason", record.reason.as_str()),
        ("package", record.package.as_str()),
    ];
    let items: Vec<String> = named
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}: {value}"))
        .chain(
            record
                .extra
                .iter()
                .filter(|(key, _)| !GENERIC_SKIP.contains(&key.as_str()) && !key.starts_with('_'))
                .map(|(key, value)| (key, display_value(value)))
                .filter(|(_, value)| !value.is_empty())
                .map(|(key, value)| format!("{key}: {value}")),
        )
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(format!(" • {}", items.join(", ")))
    }
}

/// 레코드 목록의 요약 텍스트
///
/// 출력할 줄이 없으면 도구가 보낸 `message`를, 그것도 없으면 기본 문구를 반환합니다.
pub fn format_recommendations(records: &[RecommendationRecord], message: Option<&str>) -> String {
    let lines: Vec<String> = records.iter().filter_map(format_recommendation).collect();
    if lines.is_empty() {
        return message.unwrap_or(NO_RECOMMENDATIONS).to_owned();
    }
    lines.join("\n")
}
