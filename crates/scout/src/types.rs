//! 스캔 파이프라인 도메인 타입
//!
//! 외부 도구 호출 결과([`RawToolResult`])부터 정규화된 레코드, 심각도 집계,
//! 최종 리포트까지 파이프라인을 흐르는 데이터 구조를 정의합니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use scoutpost_core::types::{ImageReference, Severity};

use crate::error::ScoutError;

/// 스캔 도구 출력 모드
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// 사람이 읽는 텍스트 리포트
    #[default]
    Text,
    /// JSON 출력 (`--format json`)
    Structured,
}

impl OutputMode {
    /// 문자열에서 출력 모드를 파싱합니다 (대소문자 무시).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "structured" | "json" => Some(Self::Structured),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Structured => "structured",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 스캔 요청
///
/// 생성 시점에 이미지 참조가 검증되며 이후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanInvocation {
    image: ImageReference,
    mode: OutputMode,
}

impl ScanInvocation {
    pub fn new(image: ImageReference, mode: OutputMode) -> Self {
        Self { image, mode }
    }

    /// 원시 문자열에서 요청을 만듭니다.
    pub fn parse(image: &str, mode: OutputMode) -> Result<Self, ScoutError> {
        Ok(Self::new(ImageReference::parse(image)?, mode))
    }

    pub fn image(&self) -> &ImageReference {
        &self.image
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }
}

/// 외부 명령 실행 결과
///
/// 신호로 종료된 프로세스의 종료 코드는 `-1`입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToolResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RawToolResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// 정규화된 취약점 레코드
///
/// 모든 문자열 필드는 값이 없을 때 빈 문자열입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    /// CVE/GHSA 식별자, 없으면 `"unknown"`
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub package: String,
    pub version: String,
    pub fixed_version: String,
    pub affected_range: String,
    /// 참고 URL (순서 유지)
    #[serde(rename = "urls")]
    pub reference_urls: Vec<String>,
}

/// 제목이 없을 때 사용하는 자리표시자
///
/// 패키지 이름이 없으면 빈 `in` 절 대신 `"Vulnerability"`만 씁니다.
pub(crate) fn placeholder_title(package: &str) -> String {
    if package.is_empty() {
        "Vulnerability".to_owned()
    } else {
        format!("Vulnerability in {package}")
    }
}

/// 정규화된 권장사항 레코드
///
/// 이름 있는 필드는 항상 값을 가지며, 그 외 필드는 `extra`로 전달됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    /// 권장사항 종류 (소문자)
    #[serde(rename = "type")]
    pub kind: String,
    pub current: String,
    pub recommended: String,
    pub reason: String,
    /// 심각도 라벨 (소문자)
    pub severity: String,
    pub package: String,
    /// 이름 없는 나머지 필드 (`_` 접두어 제외)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 권장사항 기본 종류
pub const DEFAULT_RECOMMENDATION_KIND: &str = "recommendation";
/// 권장사항 기본 사유
pub const DEFAULT_RECOMMENDATION_REASON: &str = "Update available";
/// 권장사항 기본 심각도
pub const DEFAULT_RECOMMENDATION_SEVERITY: &str = "info";

impl Default for RecommendationRecord {
    fn default() -> Self {
        Self {
            kind: DEFAULT_RECOMMENDATION_KIND.to_owned(),
            current: String::new(),
            recommended: String::new(),
            reason: DEFAULT_RECOMMENDATION_REASON.to_owned(),
            severity: DEFAULT_RECOMMENDATION_SEVERITY.to_owned(),
            package: String::new(),
            extra: Map::new(),
        }
    }
}

/// 심각도별 개수 (합계 제외)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub negligible: usize,
    pub unknown: usize,
}

impl SeverityCounts {
    /// 해당 버킷을 1 증가시킵니다.
    pub fn add(&mut self, severity: Severity) {
        *self.bucket_mut(severity) += 1;
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Negligible => self.negligible,
            Severity::Unknown => self.unknown,
        }
    }

    fn bucket_mut(&mut self, severity: Severity) -> &mut usize {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::High => &mut self.high,
            Severity::Medium => &mut self.medium,
            Severity::Low => &mut self.low,
            Severity::Negligible => &mut self.negligible,
            Severity::Unknown => &mut self.unknown,
        }
    }

    /// 전체 개수
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.negligible + self.unknown
    }

    /// `threshold` 이상인 버킷의 개수 합
    pub fn at_or_above(&self, threshold: Severity) -> usize {
        Severity::ALL
            .iter()
            .filter(|s| **s >= threshold)
            .map(|s| self.get(*s))
            .sum()
    }
}

impl FromIterator<Severity> for SeverityCounts {
    fn from_iter<I: IntoIterator<Item = Severity>>(iter: I) -> Self {
        let mut counts = Self::default();
        for severity in iter {
            counts.add(severity);
        }
        counts
    }
}

/// 심각도 요약 (여섯 버킷 + 합계)
///
/// `total`은 생성 시 버킷 합으로 계산되며 따로 설정할 수 없습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeveritySummary {
    #[serde(flatten)]
    counts: SeverityCounts,
    total: usize,
}

impl SeveritySummary {
    pub fn new(counts: SeverityCounts) -> Self {
        Self {
            total: counts.total(),
            counts,
        }
    }

    pub fn counts(&self) -> &SeverityCounts {
        &self.counts
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

impl From<SeverityCounts> for SeveritySummary {
    fn from(counts: SeverityCounts) -> Self {
        Self::new(counts)
    }
}

/// 텍스트 리포트의 패키지 요약 줄 (`0C 2H 0M 0L setuptools 65.5.1`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSummary {
    pub name: String,
    pub version: String,
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

/// 텍스트 리포트 파싱 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTextReport {
    /// 등장 순서대로의 패키지 요약
    pub packages: Vec<PackageSummary>,
    /// 중복 제거된 취약점 레코드 (첫 등장 순서)
    pub vulnerabilities: Vec<VulnerabilityRecord>,
}

/// 성공한 리포트의 상태 값
pub const STATUS_SUCCESS: &str = "success";

/// 취약점 스캔 리포트
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VulnerabilityReport {
    pub vulnerabilities: Vec<VulnerabilityRecord>,
    pub vulnerability_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_counts: Option<SeverityCounts>,
    /// 텍스트 모드에서 수집한 패키지 요약
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<PackageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VulnerabilityReport {
    /// 성공 리포트를 만듭니다. 개수와 심각도 집계는 레코드에서 계산됩니다.
    pub fn success(vulnerabilities: Vec<VulnerabilityRecord>, warning: Option<String>) -> Self {
        let counts: SeverityCounts = vulnerabilities.iter().map(|v| v.severity).collect();
        Self {
            vulnerability_count: vulnerabilities.len(),
            vulnerabilities,
            severity_counts: Some(counts),
            packages: Vec::new(),
            status: Some(STATUS_SUCCESS.to_owned()),
            warning,
            error: None,
        }
    }

    /// 실패 리포트를 만듭니다.
    pub fn failure(error: impl Into<String>, warning: Option<String>) -> Self {
        Self {
            vulnerabilities: Vec::new(),
            vulnerability_count: 0,
            severity_counts: None,
            packages: Vec::new(),
            status: None,
            warning,
            error: Some(error.into()),
        }
    }

    pub fn with_packages(mut self, packages: Vec<PackageSummary>) -> Self {
        self.packages = packages;
        self
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    pub fn summary(&self) -> SeveritySummary {
        SeveritySummary::new(self.severity_counts.unwrap_or_default())
    }
}

/// 권장사항 리포트
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationReport {
    pub recommendations: Vec<RecommendationRecord>,
    pub recommendation_count: usize,
    /// 도구가 권장사항 대신 보낸 메시지
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecommendationReport {
    pub fn success(
        recommendations: Vec<RecommendationRecord>,
        message: Option<String>,
        warning: Option<String>,
    ) -> Self {
        Self {
            recommendation_count: recommendations.len(),
            recommendations,
            message,
            warning,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>, warning: Option<String>) -> Self {
        Self {
            recommendations: Vec::new(),
            recommendation_count: 0,
            message: None,
            warning,
            error: Some(error.into()),
        }
    }
}

/// 이미지 스캔 결과 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Success,
    Failed,
}

/// 취약점 + 권장사항 통합 리포트
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageScanReport {
    /// 스캔 ID (UUID v4)
    pub scan_id: String,
    pub image: String,
    pub status: ScanStatus,
    pub timestamp: DateTime<Utc>,
    pub summary: SeveritySummary,
    pub vulnerabilities: Vec<VulnerabilityRecord>,
    /// 사람이 읽는 권장사항 요약
    pub recommendations: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
