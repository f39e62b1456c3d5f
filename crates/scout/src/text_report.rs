//! 텍스트 리포트 파서
//!
//! 사람이 읽는 형식의 스캔 리포트를 한 줄씩 읽는 상태 기계입니다.
//!
//! ```text
//!   0C     1H     0M     0L  openssl 3.0.1
//!     ✗ HIGH CVE-2024-0001 [Buffer overflow]
//!       Affected range : <3.0.2
//!       Fixed version  : 3.0.2
//! ```
//!
//! 패키지 요약 줄은 현재 패키지를 바꾸고, `✗` 헤더 줄은 새 취약점 레코드를 엽니다.
//! `Fixed version`/`Affected range` 줄은 열려 있는 레코드에 붙습니다.
//! 상태는 [`TextReportParser::parse`] 호출마다 새로 만들어집니다.

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use scoutpost_core::types::Severity;

use crate::error::ScoutError;
use crate::types::{PackageSummary, ParsedTextReport, VulnerabilityRecord, placeholder_title};

/// 기본 권고 URL 접두어
pub const DEFAULT_ADVISORY_URL_BASE: &str = "https://scout.docker.com/v/";

const PACKAGE_PATTERN: &str = r"^(\d+)C\s+(\d+)H\s+(\d+)M\s+(\d+)L\s+(\S+)\s+(\S+)";
const HEADER_PATTERN: &str =
    r"^✗\s+(\w+)\s+(CVE-\d+-\d+|GHSA(?:-[0-9a-z]{4}){3})(?:\s+\[(.+?)\])?";
const FIXED_PATTERN: &str = r"^Fixed version\s*:\s*(.+)";
const AFFECTED_PATTERN: &str = r"^Affected range\s*:\s*(.+)";

/// 텍스트 리포트 파서
///
/// 정규식은 생성 시 한 번만 컴파일됩니다.
#[derive(Debug, Clone)]
pub struct TextReportParser {
    package_re: Regex,
    header_re: Regex,
    fixed_re: Regex,
    affected_re: Regex,
    advisory_url_base: String,
}

fn compile(pattern: &str) -> Result<Regex, ScoutError> {
    Regex::new(pattern).map_err(|e| ScoutError::Pattern(format!("'{pattern}': {e}")))
}

/// 한 번의 파싱 동안만 유지되는 상태
#[derive(Default)]
struct ParseState {
    current_package: Option<(String, String)>,
    current: Option<VulnerabilityRecord>,
    packages: Vec<PackageSummary>,
    records: Vec<VulnerabilityRecord>,
    seen: HashMap<(String, String), usize>,
}

impl ParseState {
    /// 열린 레코드를 닫습니다.
    ///
    /// 같은 `(id, package)`가 이미 있으면 첫 레코드를 유지하고,
    /// 비어 있는 수정 버전/영향 범위만 나중 레코드로 채웁니다.
    fn flush(&mut self) {
        let Some(record) = self.current.take() else {
            return;
        };
        let key = (record.id.clone(), record.package.clone());
        match self.seen.get(&key) {
            Some(&index) => {
                let existing = &mut self.records[index];
                if existing.fixed_version.is_empty() {
                    existing.fixed_version = record.fixed_version;
                }
                if existing.affected_range.is_empty() {
                    existing.affected_range = record.affected_range;
                }
                debug!(id = %key.0, package = %key.1, "merged duplicate vulnerability");
            }
            None => {
                self.seen.insert(key, self.records.len());
                self.records.push(record);
            }
        }
    }
}

impl TextReportParser {
    /// 기본 권고 URL로 파서를 만듭니다.
    pub fn new() -> Result<Self, ScoutError> {
        Self::with_advisory_base(DEFAULT_ADVISORY_URL_BASE)
    }

    pub fn with_advisory_base(base: impl Into<String>) -> Result<Self, ScoutError> {
        Ok(Self {
            package_re: compile(PACKAGE_PATTERN)?,
            header_re: compile(HEADER_PATTERN)?,
            fixed_re: compile(FIXED_PATTERN)?,
            affected_re: compile(AFFECTED_PATTERN)?,
            advisory_url_base: base.into(),
        })
    }

    pub fn advisory_url_base(&self) -> &str {
        &self.advisory_url_base
    }

    /// 리포트 전체를 파싱합니다. 실패하지 않으며 인식하지 못한 줄은 무시합니다.
    pub fn parse(&self, input: &str) -> ParsedTextReport {
        let mut state = ParseState::default();

        for line in input.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(package) = self.parse_package(line) {
                state.current_package = Some((package.name.clone(), package.version.clone()));
                state.packages.push(package);
                continue;
            }

            if let Some(caps) = self.header_re.captures(line) {
                state.flush();
                let (package, version) = state.current_package.clone().unwrap_or_default();
                let id = caps[2].to_owned();
                let title = caps
                    .get(3)
                    .map(|m| m.as_str().to_owned())
                    .unwrap_or_else(|| placeholder_title(&package));
                state.current = Some(VulnerabilityRecord {
                    reference_urls: vec![format!("{}{id}", self.advisory_url_base)],
                    id,
                    severity: Severity::classify(&caps[1]),
                    title,
                    description: String::new(),
                    package,
                    version,
                    fixed_version: String::new(),
                    affected_range: String::new(),
                });
                continue;
            }

            if let Some(caps) = self.fixed_re.captures(line) {
                if let Some(current) = state.current.as_mut() {
                    current.fixed_version = caps[1].trim().to_owned();
                }
                continue;
            }

            if let Some(caps) = self.affected_re.captures(line) {
                if let Some(current) = state.current.as_mut() {
                    current.affected_range = caps[1].trim().to_owned();
                }
            }
        }
        state.flush();

        debug!(
            packages = state.packages.len(),
            vulnerabilities = state.records.len(),
            "text report parsed"
        );
        ParsedTextReport {
            packages: state.packages,
            vulnerabilities: state.records,
        }
    }

    /// 패키지 요약 줄. 개수가 `u32` 범위를 넘으면 일치하지 않는 것으로 봅니다.
    fn parse_package(&self, line: &str) -> Option<PackageSummary> {
        let caps = self.package_re.captures(line)?;
        Some(PackageSummary {
            critical: caps[1].parse().ok()?,
            high: caps[2].parse().ok()?,
            medium: caps[3].parse().ok()?,
            low: caps[4].parse().ok()?,
            name: caps[5].to_owned(),
            version: caps[6].to_owned(),
        })
    }
}
