//! 구조화 출력의 형태 판별
//!
//! 스캔 도구의 JSON 출력은 버전과 하위 명령에 따라 형태가 다릅니다.
//! [`classify`]는 입력을 [`RecordShape`] 하나로 분류하고,
//! 정규화기는 그 결과에서 레코드 목록만 꺼내 씁니다.
//!
//! 판별 순서 (먼저 일치한 것이 우선):
//! 1. 배열 → 그대로 레코드 목록
//! 2. 후보 키 중 배열 값을 가진 첫 키 → 그 배열
//! 3. 단일 레코드처럼 보이는 객체 → 원소 하나짜리 목록
//! 4. 그 외 → 인식 불가 (빈 목록)

use serde_json::{Map, Value};

/// 판별된 입력 형태
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordShape<'a> {
    /// 최상위 배열
    List(&'a [Value]),
    /// 후보 키 아래의 배열
    Keyed {
        key: &'static str,
        records: &'a [Value],
    },
    /// 레코드 하나로 보이는 객체
    Single(&'a Value),
    /// 어떤 형태에도 해당하지 않음
    Unrecognized,
}

impl<'a> RecordShape<'a> {
    /// 형태에 관계없이 레코드 목록을 꺼냅니다.
    pub fn records(&self) -> &'a [Value] {
        match *self {
            Self::List(records) | Self::Keyed { records, .. } => records,
            Self::Single(value) => std::slice::from_ref(value),
            Self::Unrecognized => &[],
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized)
    }
}

/// 레코드 종류별 판별 규칙
#[derive(Debug, Clone, Copy)]
pub struct ShapeProfile {
    /// 로그용 레코드 종류 이름
    pub kind: &'static str,
    /// 우선순위 순서의 후보 키
    pub list_keys: &'static [&'static str],
    /// 객체 하나가 단일 레코드인지 판단
    pub is_single: fn(&Map<String, Value>) -> bool,
}

fn looks_like_vulnerability(object: &Map<String, Value>) -> bool {
    object.contains_key("id") && object.contains_key("severity")
}

fn looks_like_recommendation(object: &Map<String, Value>) -> bool {
    object.contains_key("current") || object.contains_key("recommended")
}

/// 취약점 출력 판별 규칙
pub const VULNERABILITY_PROFILE: ShapeProfile = ShapeProfile {
    kind: "vulnerability",
    list_keys: &["vulnerabilities", "cves", "results"],
    is_single: looks_like_vulnerability,
};

/// 권장사항 출력 판별 규칙
pub const RECOMMENDATION_PROFILE: ShapeProfile = ShapeProfile {
    kind: "recommendation",
    list_keys: &["recommendations", "results"],
    is_single: looks_like_recommendation,
};

/// 입력 형태를 판별합니다.
pub fn classify<'a>(value: &'a Value, profile: &ShapeProfile) -> RecordShape<'a> {
    match value {
        Value::Array(items) => RecordShape::List(items),
        Value::Object(object) => {
            for key in profile.list_keys {
                if let Some(Value::Array(items)) = object.get(*key) {
                    return RecordShape::Keyed {
                        key: *key,
                        records: items,
                    };
                }
            }
            if (profile.is_single)(object) {
                RecordShape::Single(value)
            } else {
                RecordShape::Unrecognized
            }
        }
        _ => RecordShape::Unrecognized,
    }
}
