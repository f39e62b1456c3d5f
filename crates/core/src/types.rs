//! 도메인 타입: 시스템 전역에서 사용되는 공통 타입
//!
//! 스캐너, 엔진 클라이언트, CLI가 공유하는 데이터 구조를 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ReferenceError;

/// 취약점 심각도 레벨
///
/// 외부 도구가 내보내는 자유 형식 심각도 문자열은 [`Severity::classify`]로
/// 여섯 개 버킷 중 하나로 정규화됩니다.
/// `Ord` 구현으로 심각도 비교가 가능합니다
/// (`Unknown < Negligible < Low < Medium < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 분류할 수 없음
    #[default]
    Unknown,
    /// 무시 가능 (informational 포함)
    Negligible,
    /// 낮은 심각도
    Low,
    /// 중간 심각도 (moderate 포함)
    Medium,
    /// 높은 심각도
    High,
    /// 치명적
    Critical,
}

impl Severity {
    /// 높은 심각도부터 나열한 전체 목록
    pub const ALL: [Severity; 6] = [
        Self::Critical,
        Self::High,
        Self::Medium,
        Self::Low,
        Self::Negligible,
        Self::Unknown,
    ];

    /// 자유 형식 심각도 라벨을 분류합니다.
    ///
    /// 소문자로 변환한 뒤 부분 문자열 포함 여부를 우선순위 순서대로 검사합니다.
    /// 어떤 그룹에도 속하지 않으면 `Unknown`입니다. 실패하지 않습니다.
    pub fn classify(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("critical") {
            Self::Critical
        } else if lower.contains("high") {
            Self::High
        } else if lower.contains("medium") || lower.contains("moderate") {
            Self::Medium
        } else if lower.contains("low") {
            Self::Low
        } else if lower.contains("negligible") || lower.contains("info") {
            // "info"는 "informational"도 포함
            Self::Negligible
        } else {
            Self::Unknown
        }
    }

    /// 문자열에서 심각도를 정확히 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다. CLI 인자 처리에 사용합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unknown" => Some(Self::Unknown),
            "negligible" | "info" | "informational" => Some(Self::Negligible),
            "low" => Some(Self::Low),
            "medium" | "med" | "moderate" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }

    /// 직렬화 형식과 같은 소문자 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Negligible => "negligible",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::Negligible => write!(f, "Negligible"),
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// 이미지 참조 최대 길이 (바이트)
pub const MAX_REFERENCE_LEN: usize = 255;

/// 검증된 이미지 참조 (`nginx:1.25`, `ghcr.io/org/app@sha256:...`)
///
/// 외부 명령의 인자로 그대로 전달되므로 생성 시점에 검증합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageReference(String);

impl ImageReference {
    /// 이미지 참조를 검증하고 생성합니다.
    pub fn parse(raw: &str) -> Result<Self, ReferenceError> {
        if raw.is_empty() {
            return Err(ReferenceError::Empty);
        }
        if raw.len() > MAX_REFERENCE_LEN {
            return Err(ReferenceError::TooLong {
                len: raw.len(),
                max: MAX_REFERENCE_LEN,
            });
        }
        if raw.starts_with('-') {
            return Err(ReferenceError::LeadingDash(raw.to_owned()));
        }
        if let Some((offset, ch)) = raw
            .char_indices()
            .find(|(_, c)| c.is_whitespace() || c.is_control())
        {
            return Err(ReferenceError::InvalidCharacter { ch, offset });
        }
        Ok(Self(raw.to_owned()))
    }

    /// 원본 문자열
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 저장소와 태그로 분리합니다.
    ///
    /// 다이제스트 참조(`repo@sha256:...`)는 다이제스트를 태그 자리에 둡니다.
    /// 태그가 없으면 `latest`입니다. 레지스트리 포트(`host:5000/app`)는
    /// 마지막 `/` 이후의 `:`만 태그로 보므로 태그로 오인되지 않습니다.
    pub fn split_tag(&self) -> (&str, &str) {
        if let Some((repo, digest)) = self.0.split_once('@') {
            return (repo, digest);
        }
        let name_start = self.0.rfind('/').map(|i| i + 1).unwrap_or(0);
        match self.0[name_start..].rfind(':') {
            Some(pos) => {
                let split = name_start + pos;
                (&self.0[..split], &self.0[split + 1..])
            }
            None => (&self.0, "latest"),
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ImageReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ImageReference {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ImageReference> for String {
    fn from(value: ImageReference) -> Self {
        value.0
    }
}

/// 컨테이너 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// 컨테이너 ID (12자 축약형)
    pub id: String,
    /// 컨테이너 이름 (앞의 `/` 제거)
    pub name: String,
    /// 이미지명
    pub image: String,
    /// 상태 문자열 (`Up 3 minutes` 등)
    pub status: String,
    /// 생성 시각 (Unix epoch 초)
    pub created: i64,
    /// 포트 매핑 (`0.0.0.0:8080->80/tcp` 형식)
    pub ports: Vec<String>,
}

impl fmt::Display for ContainerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) image={} status={}",
            self.name,
            &self.id[..12.min(self.id.len())],
            self.image,
            self.status,
        )
    }
}

/// 로컬 이미지 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageInfo {
    /// 이미지 ID (12자 축약형)
    pub id: String,
    /// 저장소 태그 목록
    pub tags: Vec<String>,
    /// 생성 시각 (Unix epoch 초)
    pub created: i64,
    /// 크기 (바이트)
    pub size: i64,
}

/// 네트워크 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInfo {
    /// 네트워크 ID (12자 축약형)
    pub id: String,
    pub name: String,
    pub driver: String,
    pub scope: String,
    /// 연결된 컨테이너 ID
    pub containers: Vec<String>,
}

/// 볼륨 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeInfo {
    pub name: String,
    pub driver: String,
    pub mountpoint: String,
}

/// ID를 12자 축약형으로 자릅니다 (`sha256:` 접두어 제거).
pub fn short_id(id: &str) -> String {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    id.chars().take(12).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Unknown < Severity::Negligible);
        assert!(Severity::Negligible < Severity::Low);
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn severity_classify_mixed_labels() {
        assert_eq!(Severity::classify("CRITICAL"), Severity::Critical);
        assert_eq!(Severity::classify("High"), Severity::High);
        assert_eq!(Severity::classify("moderate"), Severity::Medium);
        assert_eq!(Severity::classify("LOW"), Severity::Low);
        assert_eq!(Severity::classify("informational"), Severity::Negligible);
        assert_eq!(Severity::classify("xyz"), Severity::Unknown);
        assert_eq!(Severity::classify(""), Severity::Unknown);
    }

    #[test]
    fn severity_classify_uses_substring_priority() {
        // 더 높은 그룹이 먼저 매칭됨
        assert_eq!(Severity::classify("high-critical"), Severity::Critical);
        assert_eq!(Severity::classify("very low"), Severity::Low);
        assert_eq!(Severity::classify("Negligible"), Severity::Negligible);
    }

    #[test]
    fn severity_from_str_loose() {
        assert_eq!(Severity::from_str_loose("HIGH"), Some(Severity::High));
        assert_eq!(Severity::from_str_loose("info"), Some(Severity::Negligible));
        assert_eq!(Severity::from_str_loose("crit"), Some(Severity::Critical));
        assert_eq!(Severity::from_str_loose("severe"), None);
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        let parsed: Severity = serde_json::from_str("\"negligible\"").unwrap();
        assert_eq!(parsed, Severity::Negligible);
    }

    #[test]
    fn severity_as_str_matches_serde() {
        for severity in Severity::ALL {
            let json = serde_json::to_string(&severity).unwrap();
            assert_eq!(json.trim_matches('"'), severity.as_str());
        }
    }

    #[test]
    fn image_reference_accepts_common_forms() {
        for raw in [
            "alpine",
            "nginx:1.25",
            "ghcr.io/org/app:v2",
            "registry.local:5000/team/app",
            "redis@sha256:0123456789abcdef",
        ] {
            assert!(ImageReference::parse(raw).is_ok(), "rejected {raw}");
        }
    }

    #[test]
    fn image_reference_rejects_empty() {
        assert_eq!(ImageReference::parse(""), Err(ReferenceError::Empty));
    }

    #[test]
    fn image_reference_rejects_flag_like_input() {
        assert!(matches!(
            ImageReference::parse("--help"),
            Err(ReferenceError::LeadingDash(_))
        ));
    }

    #[test]
    fn image_reference_rejects_whitespace() {
        assert_eq!(
            ImageReference::parse("nginx latest"),
            Err(ReferenceError::InvalidCharacter { ch: ' ', offset: 5 })
        );
        assert!(ImageReference::parse("nginx\n").is_err());
    }

    #[test]
    fn image_reference_rejects_too_long() {
        let raw = "a".repeat(MAX_REFERENCE_LEN + 1);
        assert!(matches!(
            ImageReference::parse(&raw),
            Err(ReferenceError::TooLong { .. })
        ));
    }

    #[test]
    fn image_reference_split_tag() {
        let r = ImageReference::parse("nginx:1.25").unwrap();
        assert_eq!(r.split_tag(), ("nginx", "1.25"));

        let r = ImageReference::parse("alpine").unwrap();
        assert_eq!(r.split_tag(), ("alpine", "latest"));

        let r = ImageReference::parse("registry.local:5000/team/app").unwrap();
        assert_eq!(r.split_tag(), ("registry.local:5000/team/app", "latest"));

        let r = ImageReference::parse("registry.local:5000/team/app:v1").unwrap();
        assert_eq!(r.split_tag(), ("registry.local:5000/team/app", "v1"));

        let r = ImageReference::parse("redis@sha256:abc").unwrap();
        assert_eq!(r.split_tag(), ("redis", "sha256:abc"));
    }

    #[test]
    fn image_reference_deserialize_validates() {
        let ok: ImageReference = serde_json::from_str("\"nginx:latest\"").unwrap();
        assert_eq!(ok.as_str(), "nginx:latest");
        assert!(serde_json::from_str::<ImageReference>("\"-rm\"").is_err());
    }

    #[test]
    fn container_info_display() {
        let info = ContainerInfo {
            id: "abc123def456789".to_owned(),
            name: "web-server".to_owned(),
            image: "nginx:latest".to_owned(),
            status: "Up 2 hours".to_owned(),
            created: 1_700_000_000,
            ports: vec![],
        };
        let display = info.to_string();
        assert!(display.contains("web-server"));
        assert!(display.contains("(abc123def456)"));
        assert!(display.contains("nginx:latest"));
    }

    #[test]
    fn short_id_strips_digest_prefix() {
        assert_eq!(short_id("sha256:0123456789abcdef0123"), "0123456789ab");
        assert_eq!(short_id("abc"), "abc");
    }
}
