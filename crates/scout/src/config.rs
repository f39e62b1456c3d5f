//! 스캐너 설정
//!
//! [`ScoutConfig`]는 core의 [`EngineConfig`](scoutpost_core::config::EngineConfig)와
//! [`ScanConfig`](scoutpost_core::config::ScanConfig)를 합쳐 스캐너가 쓰는 값만 담습니다.
//!
//! # 사용 예시
//!
//! ```
//! use scoutpost_scout::{OutputMode, ScoutConfig, ScoutConfigBuilder};
//!
//! // 기본값으로 생성
//! let config = ScoutConfig::default();
//! config.validate().unwrap();
//!
//! // 빌더로 생성
//! let config = ScoutConfigBuilder::new()
//!     .output_mode(OutputMode::Structured)
//!     .command_timeout_secs(60)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.command_timeout_secs, 60);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use scoutpost_core::config::{EngineConfig, MAX_COMMAND_TIMEOUT_SECS, ScanConfig};

use crate::error::ScoutError;
use crate::types::OutputMode;

/// 스캐너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutConfig {
    /// 엔진 CLI 바이너리
    pub binary: String,
    /// 스캔 확장 서브커맨드
    pub subcommand: String,
    /// 기본 출력 모드
    pub output_mode: OutputMode,
    /// 외부 명령 타임아웃 (초)
    pub command_timeout_secs: u64,
    /// 스캔 전 사전 조건 검사 여부
    pub probe_before_scan: bool,
    /// 확장 `--help` 출력에 있어야 하는 문자열
    pub extension_marker: String,
    /// 텍스트 리포트 레코드의 권고 URL 접두어
    pub advisory_url_base: String,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self::from_core(&EngineConfig::default(), &ScanConfig::default())
    }
}

impl ScoutConfig {
    /// core 설정에서 스캐너 설정을 생성합니다.
    ///
    /// 알 수 없는 `output_mode` 문자열은 텍스트 모드로 처리됩니다
    /// (core `validate()`가 먼저 거부합니다).
    pub fn from_core(engine: &EngineConfig, scan: &ScanConfig) -> Self {
        Self {
            binary: engine.binary.clone(),
            subcommand: scan.subcommand.clone(),
            output_mode: OutputMode::from_str_loose(&scan.output_mode).unwrap_or_default(),
            command_timeout_secs: scan.command_timeout_secs,
            probe_before_scan: scan.probe_before_scan,
            extension_marker: scan.extension_marker.clone(),
            advisory_url_base: scan.advisory_url_base.clone(),
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ScoutError> {
        if self.binary.trim().is_empty() {
            return Err(config_error("binary", "must not be empty"));
        }
        if self.subcommand.trim().is_empty() || self.subcommand.starts_with('-') {
            return Err(config_error(
                "subcommand",
                "must be a non-empty subcommand name",
            ));
        }
        if self.command_timeout_secs == 0 || self.command_timeout_secs > MAX_COMMAND_TIMEOUT_SECS
        {
            return Err(ScoutError::Config {
                field: "command_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_COMMAND_TIMEOUT_SECS}"),
            });
        }
        if self.extension_marker.is_empty() {
            return Err(config_error("extension_marker", "must not be empty"));
        }
        if !self.advisory_url_base.starts_with("http://")
            && !self.advisory_url_base.starts_with("https://")
        {
            return Err(config_error("advisory_url_base", "must be an http(s) URL"));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

fn config_error(field: &str, reason: &str) -> ScoutError {
    ScoutError::Config {
        field: field.to_owned(),
        reason: reason.to_owned(),
    }
}

/// 스캐너 설정 빌더
#[derive(Default)]
pub struct ScoutConfigBuilder {
    config: ScoutConfig,
}

impl ScoutConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.config.binary = binary.into();
        self
    }

    pub fn subcommand(mut self, subcommand: impl Into<String>) -> Self {
        self.config.subcommand = subcommand.into();
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.config.output_mode = mode;
        self
    }

    pub fn command_timeout_secs(mut self, secs: u64) -> Self {
        self.config.command_timeout_secs = secs;
        self
    }

    pub fn probe_before_scan(mut self, probe: bool) -> Self {
        self.config.probe_before_scan = probe;
        self
    }

    pub fn extension_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.extension_marker = marker.into();
        self
    }

    pub fn advisory_url_base(mut self, base: impl Into<String>) -> Self {
        self.config.advisory_url_base = base.into();
        self
    }

    /// 설정을 검증하고 반환합니다.
    pub fn build(self) -> Result<ScoutConfig, ScoutError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ScoutConfig::default();
        config.validate().unwrap();
        assert_eq!(config.binary, "docker");
        assert_eq!(config.subcommand, "scout");
        assert_eq!(config.output_mode, OutputMode::Text);
        assert!(config.probe_before_scan);
    }

    #[test]
    fn from_core_maps_output_mode() {
        let scan = ScanConfig {
            output_mode: "structured".to_owned(),
            ..Default::default()
        };
        let config = ScoutConfig::from_core(&EngineConfig::default(), &scan);
        assert_eq!(config.output_mode, OutputMode::Structured);
    }

    #[test]
    fn from_core_copies_engine_binary() {
        let engine = EngineConfig {
            binary: "/opt/bin/docker".to_owned(),
            ..Default::default()
        };
        let config = ScoutConfig::from_core(&engine, &ScanConfig::default());
        assert_eq!(config.binary, "/opt/bin/docker");
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let err = ScoutConfigBuilder::new()
            .command_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("command_timeout_secs"));
    }

    #[test]
    fn builder_rejects_flag_subcommand() {
        assert!(ScoutConfigBuilder::new().subcommand("--debug").build().is_err());
    }

    #[test]
    fn builder_rejects_non_http_advisory_base() {
        assert!(
            ScoutConfigBuilder::new()
                .advisory_url_base("file:///tmp/")
                .build()
                .is_err()
        );
    }

    #[test]
    fn builder_sets_all_fields() {
        let config = ScoutConfigBuilder::new()
            .binary("podman")
            .subcommand("scout")
            .output_mode(OutputMode::Structured)
            .command_timeout_secs(42)
            .probe_before_scan(false)
            .extension_marker("Scout")
            .advisory_url_base("https://advisories.example.com/")
            .build()
            .unwrap();
        assert_eq!(config.binary, "podman");
        assert_eq!(config.command_timeout(), Duration::from_secs(42));
        assert!(!config.probe_before_scan);
        assert_eq!(config.extension_marker, "Scout");
    }
}
