//! 설정 관리: scoutpost.toml 파싱 및 런타임 설정
//!
//! [`ScoutpostConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SCOUTPOST_SCAN_OUTPUT_MODE=structured` 형식)
//! 3. 설정 파일 (`scoutpost.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), scoutpost_core::error::ScoutpostError> {
//! use scoutpost_core::config::ScoutpostConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ScoutpostConfig::load("scoutpost.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ScoutpostConfig::parse("[scan]\noutput_mode = \"structured\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ScoutpostError};

/// 지원하는 로그 레벨
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// 지원하는 로그 형식
pub const LOG_FORMATS: [&str; 2] = ["json", "pretty"];

/// 지원하는 스캔 출력 모드
pub const OUTPUT_MODES: [&str; 2] = ["text", "structured"];

/// 외부 명령 최대 타임아웃 (초)
pub const MAX_COMMAND_TIMEOUT_SECS: u64 = 3600;

/// Scoutpost 통합 설정
///
/// `scoutpost.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoutpostConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 컨테이너 엔진 설정
    #[serde(default)]
    pub engine: EngineConfig,
    /// 스캔 설정
    #[serde(default)]
    pub scan: ScanConfig,
}

impl ScoutpostConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ScoutpostError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ScoutpostError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScoutpostError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ScoutpostError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ScoutpostError> {
        toml::from_str(toml_str).map_err(|e| {
            ScoutpostError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SCOUTPOST_{SECTION}_{FIELD}`
    /// 예: `SCOUTPOST_ENGINE_BINARY=podman`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SCOUTPOST_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SCOUTPOST_GENERAL_LOG_FORMAT");

        // Engine
        override_string(&mut self.engine.binary, "SCOUTPOST_ENGINE_BINARY");
        override_string(&mut self.engine.socket, "SCOUTPOST_ENGINE_SOCKET");
        override_u64(
            &mut self.engine.connect_timeout_secs,
            "SCOUTPOST_ENGINE_CONNECT_TIMEOUT_SECS",
        );
        override_bool(
            &mut self.engine.pull_before_scan,
            "SCOUTPOST_ENGINE_PULL_BEFORE_SCAN",
        );

        // Scan
        override_string(&mut self.scan.subcommand, "SCOUTPOST_SCAN_SUBCOMMAND");
        override_string(&mut self.scan.output_mode, "SCOUTPOST_SCAN_OUTPUT_MODE");
        override_u64(
            &mut self.scan.command_timeout_secs,
            "SCOUTPOST_SCAN_COMMAND_TIMEOUT_SECS",
        );
        override_bool(
            &mut self.scan.probe_before_scan,
            "SCOUTPOST_SCAN_PROBE_BEFORE_SCAN",
        );
        override_string(
            &mut self.scan.extension_marker,
            "SCOUTPOST_SCAN_EXTENSION_MARKER",
        );
        override_string(
            &mut self.scan.advisory_url_base,
            "SCOUTPOST_SCAN_ADVISORY_URL_BASE",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ScoutpostError> {
        if !LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", LOG_LEVELS.join(", ")),
            ));
        }

        if !LOG_FORMATS.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", LOG_FORMATS.join(", ")),
            ));
        }

        if self.engine.binary.trim().is_empty() {
            return Err(invalid("engine.binary", "must not be empty".to_owned()));
        }

        if self.engine.connect_timeout_secs == 0 {
            return Err(invalid(
                "engine.connect_timeout_secs",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.scan.subcommand.trim().is_empty() {
            return Err(invalid("scan.subcommand", "must not be empty".to_owned()));
        }

        if !OUTPUT_MODES.contains(&self.scan.output_mode.as_str()) {
            return Err(invalid(
                "scan.output_mode",
                format!("must be one of: {}", OUTPUT_MODES.join(", ")),
            ));
        }

        if self.scan.command_timeout_secs == 0
            || self.scan.command_timeout_secs > MAX_COMMAND_TIMEOUT_SECS
        {
            return Err(invalid(
                "scan.command_timeout_secs",
                format!("must be between 1 and {MAX_COMMAND_TIMEOUT_SECS}"),
            ));
        }

        if !self.scan.advisory_url_base.starts_with("http://")
            && !self.scan.advisory_url_base.starts_with("https://")
        {
            return Err(invalid(
                "scan.advisory_url_base",
                "must be an http(s) URL".to_owned(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> ScoutpostError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 컨테이너 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 엔진 CLI 바이너리 이름 또는 경로
    pub binary: String,
    /// 엔진 소켓 경로 (빈 문자열이면 플랫폼 기본값)
    pub socket: String,
    /// 엔진 API 연결 타임아웃 (초)
    pub connect_timeout_secs: u64,
    /// 스캔 전 이미지 pull 여부
    pub pull_before_scan: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_owned(),
            socket: String::new(),
            connect_timeout_secs: 120,
            pull_before_scan: true,
        }
    }
}

/// 스캔 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 스캔 확장 서브커맨드 (`docker scout`의 `scout`)
    pub subcommand: String,
    /// 출력 모드 (text, structured)
    pub output_mode: String,
    /// 외부 명령 타임아웃 (초)
    pub command_timeout_secs: u64,
    /// 스캔 전 사전 조건 검사 여부
    pub probe_before_scan: bool,
    /// `--help` 출력에서 확장 설치 여부를 판단하는 문자열
    pub extension_marker: String,
    /// 텍스트 리포트 레코드의 권고 URL 접두어
    pub advisory_url_base: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            subcommand: "scout".to_owned(),
            output_mode: "text".to_owned(),
            command_timeout_secs: 300,
            probe_before_scan: true,
            extension_marker: "Docker Scout".to_owned(),
            advisory_url_base: "https://scout.docker.com/v/".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
