//! 엔진 클라이언트 설정
//!
//! [`EngineClientConfig`]는 core의 [`EngineConfig`](scoutpost_core::config::EngineConfig)를
//! 기반으로 클라이언트 연결 설정을 제공합니다.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineClientError;

/// 연결 타임아웃 상한 (초)
const MAX_CONNECT_TIMEOUT_SECS: u64 = 600;

/// 컨테이너 정지 유예 시간 상한 (초)
const MAX_STOP_TIMEOUT_SECS: i64 = 3600;

/// 엔진 클라이언트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineClientConfig {
    /// 엔진 소켓 경로 (빈 문자열이면 플랫폼 기본값)
    pub socket: String,
    /// API 연결 타임아웃 (초)
    pub connect_timeout_secs: u64,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// `stop_container`에 유예 시간을 지정하지 않았을 때의 기본값 (초)
    pub default_stop_timeout_secs: i64,
}

impl Default for EngineClientConfig {
    fn default() -> Self {
        Self {
            socket: String::new(),
            connect_timeout_secs: 120,
            default_stop_timeout_secs: 10,
        }
    }
}

impl EngineClientConfig {
    /// core의 `EngineConfig`에서 클라이언트 설정을 생성합니다.
    pub fn from_core(core: &scoutpost_core::config::EngineConfig) -> Self {
        Self {
            socket: core.socket.clone(),
            connect_timeout_secs: core.connect_timeout_secs,
            ..Self::default()
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), EngineClientError> {
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > MAX_CONNECT_TIMEOUT_SECS {
            return Err(EngineClientError::Config {
                field: "connect_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_CONNECT_TIMEOUT_SECS}"),
            });
        }

        if self.default_stop_timeout_secs < 0
            || self.default_stop_timeout_secs > MAX_STOP_TIMEOUT_SECS
        {
            return Err(EngineClientError::Config {
                field: "default_stop_timeout_secs".to_owned(),
                reason: format!("must be 0-{MAX_STOP_TIMEOUT_SECS}"),
            });
        }

        Ok(())
    }

    /// 연결 타임아웃
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        EngineClientConfig::default().validate().unwrap();
    }

    #[test]
    fn from_core_copies_connection_fields() {
        let core = scoutpost_core::config::EngineConfig {
            socket: "/run/docker.sock".to_owned(),
            connect_timeout_secs: 15,
            ..Default::default()
        };
        let config = EngineClientConfig::from_core(&core);
        assert_eq!(config.socket, "/run/docker.sock");
        assert_eq!(config.connect_timeout(), Duration::from_secs(15));
        assert_eq!(config.default_stop_timeout_secs, 10);
    }

    #[test]
    fn validate_rejects_zero_connect_timeout() {
        let config = EngineClientConfig {
            connect_timeout_secs: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("connect_timeout_secs"));
    }

    #[test]
    fn validate_rejects_negative_stop_timeout() {
        let config = EngineClientConfig {
            default_stop_timeout_secs: -1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
