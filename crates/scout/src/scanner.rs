//! 스캔 오케스트레이터 -- 사전 조건 검사부터 리포트 조립까지
//!
//! # 흐름
//!
//! ```text
//! ScanInvocation --> AvailabilityProber (probe_before_scan)
//!                          |
//!                    CommandRunner  `<engine> <scan> cves <image> [--format json]`
//!                          |
//!              +-----------+-----------+
//!              |                       |
//!        TextReportParser      normalize_vulnerabilities
//!              |                       |
//!              +-----------+-----------+
//!                          |
//!                 VulnerabilityReport (+ severity_counts)
//! ```
//!
//! 도구가 실패를 보고하거나 출력을 해석할 수 없으면 `Err`가 아니라
//! `error` 필드가 채워진 리포트를 반환합니다. `Err`는 사전 조건 미충족,
//! 프로세스 생성 실패, 시간 초과에만 사용됩니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use scoutpost_core::metrics as m;
use scoutpost_core::types::{ImageReference, Severity};

use crate::config::ScoutConfig;
use crate::error::ScoutError;
use crate::normalize::{normalize_vulnerabilities, scalar_text};
use crate::probe::{Availability, AvailabilityProber};
use crate::recommend::{format_recommendations, normalize_recommendations};
use crate::runner::{CommandRunner, ProcessRunner, render_command};
use crate::text_report::TextReportParser;
use crate::types::{
    ImageScanReport, OutputMode, RawToolResult, RecommendationReport, ScanInvocation, ScanStatus,
    VulnerabilityReport,
};

/// stderr에서 버전 업그레이드 안내 줄을 찾습니다.
///
/// 대소문자 구분 없이 `new version`과 `available`을 모두 포함하는 첫 줄입니다.
pub fn version_warning(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .find(|line| {
            let lower = line.to_lowercase();
            lower.contains("new version") && lower.contains("available")
        })
        .map(|line| line.trim().to_owned())
}

/// stderr를 검사해 버전 안내를 돌려주고 나머지 의미 있는 줄은 로그로 남깁니다.
///
/// 빈 줄과 `[`나 공백으로 시작하는 줄(진행 표시)은 무시합니다.
fn inspect_stderr(command: &str, stderr: &str) -> Option<String> {
    let notice = version_warning(stderr);
    if let Some(notice) = &notice {
        warn!(command, notice = %notice, "scan tool version notice");
    }
    for line in stderr.lines() {
        if line.trim().is_empty() || line.starts_with('[') || line.starts_with(' ') {
            continue;
        }
        if notice.as_deref() == Some(line.trim()) {
            continue;
        }
        warn!(command, line, "scan tool stderr");
    }
    notice
}

/// 0이 아닌 종료의 에러 메시지
fn failure_message(result: &RawToolResult) -> String {
    let stderr = result.stderr.trim();
    if stderr.is_empty() {
        format!("Command failed with exit code {}", result.exit_code)
    } else {
        stderr.to_owned()
    }
}

/// 최상위 `message`: 스칼라는 그대로, 객체와 배열은 JSON 표기로
fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) | Value::Array(_) => Some(value.to_string()),
        other => scalar_text(other),
    }
}

fn parse_json(stdout: &str) -> Result<Value, String> {
    serde_json::from_str(stdout).map_err(|e| format!("Failed to parse command output: {e}"))
}

/// 스캔 도구 오케스트레이터
///
/// 러너가 `Send + Sync`이므로 `Arc`로 감싸 여러 이미지를 동시에 스캔할 수 있습니다.
/// 파서 상태는 호출마다 새로 만들어지며, 공유 상태는 원자 카운터뿐입니다.
pub struct ScoutScanner<R> {
    config: ScoutConfig,
    runner: Arc<R>,
    prober: AvailabilityProber<R>,
    text_parser: TextReportParser,
    /// 완료된 스캔 수
    scans_completed: Arc<AtomicU64>,
    /// 발견된 취약점 수
    vulns_found: Arc<AtomicU64>,
}

impl ScoutScanner<ProcessRunner> {
    /// 실제 프로세스를 실행하는 스캐너를 만듭니다.
    pub fn with_process_runner(config: ScoutConfig) -> Result<Self, ScoutError> {
        let runner = ProcessRunner::new(config.command_timeout());
        ScoutScannerBuilder::new().config(config).runner(runner).build()
    }
}

impl<R: CommandRunner> ScoutScanner<R> {
    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    /// 완료된 스캔 수를 반환합니다.
    pub fn scans_completed(&self) -> u64 {
        self.scans_completed.load(Ordering::Relaxed)
    }

    /// 발견된 취약점 수를 반환합니다.
    pub fn vulns_found(&self) -> u64 {
        self.vulns_found.load(Ordering::Relaxed)
    }

    /// 사전 조건을 검사합니다.
    pub async fn availability(&self) -> Availability {
        self.prober.check().await
    }

    async fn ensure_available(&self) -> Result<(), ScoutError> {
        if !self.config.probe_before_scan {
            return Ok(());
        }
        match self.availability().await.first_failure() {
            None => Ok(()),
            Some(precondition) => {
                warn!(%precondition, suggestion = precondition.suggestion(), "scan precondition failed");
                metrics::counter!(m::SCAN_FAILURES_TOTAL, m::LABEL_REASON => "precondition")
                    .increment(1);
                Err(ScoutError::PreconditionUnavailable(precondition))
            }
        }
    }

    /// 스캔 하위 명령을 실행합니다. 실행 자체가 실패하면 실패 메트릭을 기록합니다.
    async fn run_scan_command(&self, args: &[&str]) -> Result<RawToolResult, ScoutError> {
        match self.runner.run(&self.config.binary, args, false).await {
            Ok(result) => Ok(result),
            Err(e) => {
                let reason = match e {
                    ScoutError::Timeout { .. } => "timeout",
                    _ => "command",
                };
                error!(error = %e, "scan command could not be executed");
                metrics::counter!(m::SCAN_FAILURES_TOTAL, m::LABEL_REASON => reason).increment(1);
                Err(e)
            }
        }
    }

    /// 이미지의 취약점을 스캔합니다.
    pub async fn scan_vulnerabilities(
        &self,
        invocation: &ScanInvocation,
    ) -> Result<VulnerabilityReport, ScoutError> {
        self.ensure_available().await?;
        self.run_vulnerability_scan(invocation).await
    }

    async fn run_vulnerability_scan(
        &self,
        invocation: &ScanInvocation,
    ) -> Result<VulnerabilityReport, ScoutError> {
        let image = invocation.image().as_str();
        let mode = invocation.mode();
        let mut args = vec![self.config.subcommand.as_str(), "cves", image];
        if mode == OutputMode::Structured {
            args.extend(["--format", "json"]);
        }
        let command = render_command(&self.config.binary, &args);

        info!(image, %mode, "scanning image for vulnerabilities");
        let started = Instant::now();
        let result = self.run_scan_command(&args).await?;
        let report = self.interpret_vulnerabilities(&command, mode, &result);
        let elapsed = started.elapsed();

        metrics::histogram!(m::SCAN_DURATION_SECONDS, m::LABEL_MODE => mode.as_str())
            .record(elapsed.as_secs_f64());

        if let Some(err) = &report.error {
            error!(image, error = %err, "vulnerability scan reported failure");
            metrics::counter!(m::SCAN_FAILURES_TOTAL, m::LABEL_REASON => "tool").increment(1);
            return Ok(report);
        }

        let found = report.vulnerability_count as u64;
        self.scans_completed.fetch_add(1, Ordering::Relaxed);
        self.vulns_found.fetch_add(found, Ordering::Relaxed);
        metrics::counter!(m::SCANS_COMPLETED_TOTAL, m::LABEL_MODE => mode.as_str()).increment(1);
        if let Some(counts) = &report.severity_counts {
            for severity in Severity::ALL {
                let count = counts.get(severity) as u64;
                if count > 0 {
                    metrics::counter!(
                        m::VULNERABILITIES_FOUND_TOTAL,
                        m::LABEL_SEVERITY => severity.as_str()
                    )
                    .increment(count);
                }
            }
        }

        info!(
            image,
            vulnerabilities = found,
            elapsed_ms = elapsed.as_millis() as u64,
            "vulnerability scan completed"
        );
        Ok(report)
    }

    /// 도구 실행 결과를 리포트로 해석합니다.
    fn interpret_vulnerabilities(
        &self,
        command: &str,
        mode: OutputMode,
        result: &RawToolResult,
    ) -> VulnerabilityReport {
        let warning = inspect_stderr(command, &result.stderr);

        if !result.success() {
            return VulnerabilityReport::failure(failure_message(result), warning);
        }
        if result.stdout.trim().is_empty() {
            debug!(command, "scan produced no output");
            return VulnerabilityReport::success(Vec::new(), warning);
        }

        match mode {
            OutputMode::Text => {
                let parsed = self.text_parser.parse(&result.stdout);
                VulnerabilityReport::success(parsed.vulnerabilities, warning)
                    .with_packages(parsed.packages)
            }
            OutputMode::Structured => match parse_json(&result.stdout) {
                Ok(value) => VulnerabilityReport::success(normalize_vulnerabilities(&value), warning),
                Err(message) => {
                    debug!(command, stdout = %result.stdout, "unparseable scan output");
                    VulnerabilityReport::failure(message, warning)
                }
            },
        }
    }

    /// 이미지에 대한 권장사항을 조회합니다.
    pub async fn recommendations(
        &self,
        image: &ImageReference,
    ) -> Result<RecommendationReport, ScoutError> {
        self.ensure_available().await?;
        self.run_recommendations(image).await
    }

    async fn run_recommendations(
        &self,
        image: &ImageReference,
    ) -> Result<RecommendationReport, ScoutError> {
        let args = [
            self.config.subcommand.as_str(),
            "recommendations",
            image.as_str(),
            "--format",
            "json",
        ];
        let command = render_command(&self.config.binary, &args);

        info!(image = image.as_str(), "fetching recommendations");
        let result = self.run_scan_command(&args).await?;
        let warning = inspect_stderr(&command, &result.stderr);

        if !result.success() {
            let message = failure_message(&result);
            error!(image = image.as_str(), error = %message, "recommendations reported failure");
            return Ok(RecommendationReport::failure(message, warning));
        }
        if result.stdout.trim().is_empty() {
            return Ok(RecommendationReport::success(Vec::new(), None, warning));
        }

        let report = match parse_json(&result.stdout) {
            Ok(value) => {
                let message = value.get("message").and_then(message_text);
                RecommendationReport::success(normalize_recommendations(&value), message, warning)
            }
            Err(message) => RecommendationReport::failure(message, warning),
        };
        debug!(
            image = image.as_str(),
            recommendations = report.recommendation_count,
            "recommendations fetched"
        );
        Ok(report)
    }

    /// 취약점 스캔과 권장사항 조회를 묶은 통합 리포트를 만듭니다.
    ///
    /// 사전 조건은 한 번만 검사합니다. 권장사항 조회 실패는 로그만 남기고
    /// 리포트는 계속 만듭니다.
    pub async fn scan_image(&self, invocation: &ScanInvocation) -> Result<ImageScanReport, ScoutError> {
        self.ensure_available().await?;
        let vulnerabilities = self.run_vulnerability_scan(invocation).await?;

        let recommendations = match self.run_recommendations(invocation.image()).await {
            Ok(report) if report.error.is_none() => {
                format_recommendations(&report.recommendations, report.message.as_deref())
            }
            Ok(report) => {
                warn!(
                    image = invocation.image().as_str(),
                    error = report.error.as_deref().unwrap_or_default(),
                    "recommendations unavailable"
                );
                format_recommendations(&[], None)
            }
            Err(e) => {
                warn!(image = invocation.image().as_str(), error = %e, "recommendations unavailable");
                format_recommendations(&[], None)
            }
        };

        let status = if vulnerabilities.is_failure() {
            ScanStatus::Failed
        } else {
            ScanStatus::Success
        };

        Ok(ImageScanReport {
            scan_id: uuid::Uuid::new_v4().to_string(),
            image: invocation.image().to_string(),
            status,
            timestamp: chrono::Utc::now(),
            summary: vulnerabilities.summary(),
            recommendations,
            warning: vulnerabilities.warning,
            error: vulnerabilities.error,
            vulnerabilities: vulnerabilities.vulnerabilities,
        })
    }
}

/// 스캐너 빌더
pub struct ScoutScannerBuilder<R> {
    config: ScoutConfig,
    runner: Option<Arc<R>>,
}

impl<R: CommandRunner> ScoutScannerBuilder<R> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: ScoutConfig::default(),
            runner: None,
        }
    }

    /// 스캐너 설정을 지정합니다.
    pub fn config(mut self, config: ScoutConfig) -> Self {
        self.config = config;
        self
    }

    /// 명령 실행기를 지정합니다.
    pub fn runner(mut self, runner: R) -> Self {
        self.runner = Some(Arc::new(runner));
        self
    }

    /// 이미 공유 중인 실행기를 지정합니다.
    pub fn shared_runner(mut self, runner: Arc<R>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// 스캐너를 빌드합니다. 설정 검증과 정규식 컴파일이 여기서 수행됩니다.
    pub fn build(self) -> Result<ScoutScanner<R>, ScoutError> {
        self.config.validate()?;
        let runner = self.runner.ok_or_else(|| ScoutError::Config {
            field: "runner".to_owned(),
            reason: "a command runner is required".to_owned(),
        })?;

        let prober = AvailabilityProber::new(
            Arc::clone(&runner),
            self.config.binary.clone(),
            self.config.subcommand.clone(),
            self.config.extension_marker.clone(),
        );
        let text_parser = TextReportParser::with_advisory_base(self.config.advisory_url_base.clone())?;

        Ok(ScoutScanner {
            config: self.config,
            runner,
            prober,
            text_parser,
            scans_completed: Arc::new(AtomicU64::new(0)),
            vulns_found: Arc::new(AtomicU64::new(0)),
        })
    }
}

impl<R: CommandRunner> Default for ScoutScannerBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}
