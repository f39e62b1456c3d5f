//! 사전 조건 검사
//!
//! 엔진 바이너리 설치 → 엔진 데몬 실행 → 스캔 확장 설치 순서로 검사합니다.
//! 각 단계는 앞 단계가 통과해야만 의미가 있으므로, 앞 단계가 실패하면
//! 뒤 단계는 실행하지 않고 `false`를 반환합니다.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::Precondition;
use crate::runner::CommandRunner;

/// 사전 조건 검사 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub engine_installed: bool,
    pub engine_running: bool,
    pub scan_extension_available: bool,
}

impl Availability {
    /// 처음으로 실패한 사전 조건
    pub fn first_failure(&self) -> Option<Precondition> {
        if !self.engine_installed {
            Some(Precondition::EngineInstalled)
        } else if !self.engine_running {
            Some(Precondition::EngineRunning)
        } else if !self.scan_extension_available {
            Some(Precondition::ScanExtension)
        } else {
            None
        }
    }

    pub fn is_ready(&self) -> bool {
        self.first_failure().is_none()
    }
}

/// 계층형 사전 조건 검사기
pub struct AvailabilityProber<R> {
    runner: Arc<R>,
    binary: String,
    subcommand: String,
    marker: String,
}

impl<R: CommandRunner> AvailabilityProber<R> {
    pub fn new(
        runner: Arc<R>,
        binary: impl Into<String>,
        subcommand: impl Into<String>,
        marker: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            binary: binary.into(),
            subcommand: subcommand.into(),
            marker: marker.into(),
        }
    }

    /// `<engine> --version`이 성공하는지 확인합니다.
    pub async fn engine_installed(&self) -> bool {
        self.installed_step().await
    }

    /// 엔진 데몬에 연결할 수 있는지 확인합니다.
    pub async fn engine_running(&self) -> bool {
        self.installed_step().await && self.running_step().await
    }

    /// 스캔 확장이 설치되어 있는지 확인합니다.
    pub async fn scan_extension_available(&self) -> bool {
        self.installed_step().await && self.running_step().await && self.extension_step().await
    }

    /// 전체 검사를 한 번 수행합니다. 실패한 단계 이후는 실행하지 않습니다.
    pub async fn check(&self) -> Availability {
        let mut availability = Availability::default();

        availability.engine_installed = self.installed_step().await;
        if availability.engine_installed {
            availability.engine_running = self.running_step().await;
        }
        if availability.engine_running {
            availability.scan_extension_available = self.extension_step().await;
        }

        debug!(
            engine_installed = availability.engine_installed,
            engine_running = availability.engine_running,
            scan_extension_available = availability.scan_extension_available,
            "availability probed"
        );
        availability
    }

    async fn installed_step(&self) -> bool {
        match self.runner.run(&self.binary, &["--version"], false).await {
            Ok(result) => result.success(),
            Err(e) => {
                debug!(binary = %self.binary, error = %e, "engine binary not runnable");
                false
            }
        }
    }

    async fn running_step(&self) -> bool {
        match self.runner.run(&self.binary, &["info"], false).await {
            Ok(result) => result.success(),
            Err(e) => {
                debug!(error = %e, "engine info failed");
                false
            }
        }
    }

    async fn extension_step(&self) -> bool {
        match self
            .runner
            .run(&self.binary, &[self.subcommand.as_str(), "--help"], false)
            .await
        {
            Ok(result) => result.success() && result.stdout.contains(&self.marker),
            Err(e) => {
                debug!(subcommand = %self.subcommand, error = %e, "scan extension help failed");
                false
            }
        }
    }
}
