//! 스캔 파이프라인 에러 타입
//!
//! [`ScoutError`]는 스캔을 중단시키는 상황만 표현합니다.
//! 도구가 0이 아닌 종료 코드로 실패를 보고하거나 출력을 파싱할 수 없는 경우는
//! 에러가 아니라 리포트의 `error` 필드에 기록됩니다.
//!
//! # 에러 카테고리
//!
//! - **사전 조건**: `PreconditionUnavailable`
//! - **명령 실행**: `CommandExecution`, `Timeout`
//! - **입력 검증**: `InvalidInvocation`
//! - **내부 구성**: `Pattern`, `Config`

use std::fmt;

use scoutpost_core::error::{ReferenceError, ScanError, ScoutpostError};

/// 스캔 전에 충족되어야 하는 사전 조건
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Precondition {
    /// 엔진 CLI 바이너리 설치
    EngineInstalled,
    /// 엔진 데몬 실행 중
    EngineRunning,
    /// 스캔 확장 설치
    ScanExtension,
}

impl Precondition {
    /// 사용자에게 보여줄 조치 안내
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::EngineInstalled => "Install Docker and make sure the `docker` binary is on PATH",
            Self::EngineRunning => "Start the Docker daemon (or Docker Desktop) and retry",
            Self::ScanExtension => {
                "Install Docker Scout: https://docs.docker.com/scout/install/"
            }
        }
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EngineInstalled => write!(f, "container engine is not installed"),
            Self::EngineRunning => write!(f, "container engine daemon is not running"),
            Self::ScanExtension => write!(f, "scan extension is not installed"),
        }
    }
}

/// 스캔 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    /// 사전 조건 미충족
    #[error("precondition unavailable: {0}")]
    PreconditionUnavailable(Precondition),

    /// 외부 명령 실행 실패 (프로세스 생성 실패, 또는 강제 실패 모드에서 0이 아닌 종료)
    #[error("command execution failed: `{command}`: {reason}")]
    CommandExecution {
        /// 실행한 명령줄
        command: String,
        /// 실패 사유 (stderr 또는 OS 에러)
        reason: String,
    },

    /// 외부 명령 시간 초과
    #[error("command timed out after {timeout_secs}s: `{command}`")]
    Timeout {
        /// 실행한 명령줄
        command: String,
        /// 적용된 타임아웃 (초)
        timeout_secs: u64,
    },

    /// 잘못된 스캔 요청 (이미지 참조 검증 실패)
    #[error("invalid scan invocation: {0}")]
    InvalidInvocation(#[from] ReferenceError),

    /// 정규식 구성 실패
    #[error("pattern error: {0}")]
    Pattern(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<ScoutError> for ScoutpostError {
    fn from(err: ScoutError) -> Self {
        match err {
            ScoutError::PreconditionUnavailable(p) => {
                ScoutpostError::Scan(ScanError::Unavailable(p.to_string()))
            }
            ScoutError::CommandExecution { command, reason } => {
                ScoutpostError::Scan(ScanError::Command(format!("`{command}`: {reason}")))
            }
            ScoutError::Timeout {
                command,
                timeout_secs,
            } => ScoutpostError::Scan(ScanError::Timeout(format!(
                "`{command}` after {timeout_secs}s"
            ))),
            ScoutError::InvalidInvocation(e) => ScoutpostError::Reference(e),
            ScoutError::Pattern(msg) => {
                ScoutpostError::Scan(ScanError::Command(format!("pattern error: {msg}")))
            }
            ScoutError::Config { field, reason } => {
                ScoutpostError::Config(scoutpost_core::error::ConfigError::InvalidValue {
                    field,
                    reason,
                })
            }
        }
    }
}
