//! 외부 명령 실행기
//!
//! [`CommandRunner`] trait은 외부 CLI 호출을 추상화합니다. 운영 코드는
//! [`ProcessRunner`]를, 테스트는 스크립트된 응답을 돌려주는 mock을 사용합니다.
//!
//! 호출마다 프로세스 하나를 띄우며 재시도하지 않습니다. 타임아웃이 지나면
//! 자식 프로세스를 종료하고 [`ScoutError::Timeout`]을 반환합니다.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ScoutError;
use crate::types::RawToolResult;

/// 외부 명령 실행 추상화
pub trait CommandRunner: Send + Sync + 'static {
    /// `program args...`를 실행하고 종료 코드와 출력을 수집합니다.
    ///
    /// 0이 아닌 종료는 `fail_on_non_zero`가 설정된 경우에만 에러입니다.
    fn run(
        &self,
        program: &str,
        args: &[&str],
        fail_on_non_zero: bool,
    ) -> impl Future<Output = Result<RawToolResult, ScoutError>> + Send;
}

/// 로그와 에러 메시지용 명령줄 문자열
pub fn render_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 강제 실패 모드에서 0이 아닌 종료를 에러로 바꿉니다.
fn check_exit(
    command: String,
    result: RawToolResult,
    fail_on_non_zero: bool,
) -> Result<RawToolResult, ScoutError> {
    if fail_on_non_zero && !result.success() {
        let stderr = result.stderr.trim();
        let reason = if stderr.is_empty() {
            format!("exit code {}", result.exit_code)
        } else {
            stderr.to_owned()
        };
        return Err(ScoutError::CommandExecution { command, reason });
    }
    Ok(result)
}

/// `tokio::process` 기반 실행기
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        fail_on_non_zero: bool,
    ) -> Result<RawToolResult, ScoutError> {
        let command = render_command(program, args);
        debug!(command = %command, "running command");

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ScoutError::CommandExecution {
                    command,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                warn!(command = %command, timeout_secs = self.timeout.as_secs(), "command timed out, killed");
                return Err(ScoutError::Timeout {
                    command,
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let result = RawToolResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(
            command = %command,
            exit_code = result.exit_code,
            stdout_len = result.stdout.len(),
            stderr_len = result.stderr.len(),
            "command finished"
        );

        check_exit(command, result, fail_on_non_zero)
    }
}

/// 테스트용 Mock 실행기
///
/// 명령줄 문자열(`docker scout cves alpine`)별로 응답을 지정합니다.
/// 지정되지 않은 명령은 프로세스 생성 실패로 처리됩니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockRunner {
    responses: std::collections::HashMap<String, MockResponse>,
    calls: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
enum MockResponse {
    Exit(RawToolResult),
    Timeout,
}

#[cfg(test)]
impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 사전 조건 검사가 모두 통과하도록 응답을 채웁니다.
    pub fn ready() -> Self {
        Self::new()
            .with_response("docker --version", 0, "Docker version 27.0.3", "")
            .with_response("docker info", 0, "Server Version: 27.0.3", "")
            .with_response(
                "docker scout --help",
                0,
                "Docker Scout: A tool to analyze container images",
                "",
            )
    }

    pub fn with_response(mut self, command: &str, exit_code: i32, stdout: &str, stderr: &str) -> Self {
        self.responses.insert(
            command.to_owned(),
            MockResponse::Exit(RawToolResult {
                exit_code,
                stdout: stdout.to_owned(),
                stderr: stderr.to_owned(),
            }),
        );
        self
    }

    pub fn with_timeout(mut self, command: &str) -> Self {
        self.responses
            .insert(command.to_owned(), MockResponse::Timeout);
        self
    }

    /// 호출된 명령줄 목록
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
impl CommandRunner for MockRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        fail_on_non_zero: bool,
    ) -> Result<RawToolResult, ScoutError> {
        let command = render_command(program, args);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command.clone());
        }
        match self.responses.get(&command) {
            Some(MockResponse::Exit(result)) => check_exit(command, result.clone(), fail_on_non_zero),
            Some(MockResponse::Timeout) => Err(ScoutError::Timeout {
                command,
                timeout_secs: 1,
            }),
            None => Err(ScoutError::CommandExecution {
                command,
                reason: "No such file or directory (os error 2)".to_owned(),
            }),
        }
    }
}
