//! Integration tests for the scan pipeline
//!
//! Drives `ScoutScanner` end to end through a scripted `CommandRunner`:
//! precondition probe -> scan command -> parser/normalizer -> report.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::Mutex;

use scoutpost_core::types::{ImageReference, Severity};
use scoutpost_scout::{
    CommandRunner, OutputMode, Precondition, RawToolResult, ScanInvocation, ScanStatus,
    ScoutConfigBuilder, ScoutError, ScoutScanner, ScoutScannerBuilder, format_recommendations,
};

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}

/// Runner that answers from a table keyed by the full command line
#[derive(Default)]
struct ScriptedRunner {
    responses: HashMap<String, RawToolResult>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    fn ready() -> Self {
        Self::default()
            .respond("docker --version", 0, "Docker version 27.0.3, build 7d4bcd8", "")
            .respond("docker info", 0, "Server Version: 27.0.3", "")
            .respond(
                "docker scout --help",
                0,
                "Docker Scout: A tool to analyze container images",
                "",
            )
    }

    fn respond(mut self, command: &str, exit_code: i32, stdout: &str, stderr: &str) -> Self {
        self.responses.insert(
            command.to_owned(),
            RawToolResult {
                exit_code,
                stdout: stdout.to_owned(),
                stderr: stderr.to_owned(),
            },
        );
        self
    }

    async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        fail_on_non_zero: bool,
    ) -> Result<RawToolResult, ScoutError> {
        let command = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().await.push(command.clone());

        let Some(result) = self.responses.get(&command) else {
            return Err(ScoutError::CommandExecution {
                command,
                reason: "No such file or directory (os error 2)".to_owned(),
            });
        };
        if fail_on_non_zero && result.exit_code != 0 {
            return Err(ScoutError::CommandExecution {
                command,
                reason: result.stderr.clone(),
            });
        }
        Ok(result.clone())
    }
}

fn build(runner: ScriptedRunner) -> (Arc<ScriptedRunner>, ScoutScanner<ScriptedRunner>) {
    let runner = Arc::new(runner);
    let scanner = ScoutScannerBuilder::new()
        .shared_runner(Arc::clone(&runner))
        .build()
        .unwrap();
    (runner, scanner)
}

const IMAGE: &str = "python:3.11-slim";

#[tokio::test]
async fn test_text_report_end_to_end() {
    let (runner, scanner) = build(
        ScriptedRunner::ready().respond(
            "docker scout cves python:3.11-slim",
            0,
            &fixture("cves_text.txt"),
            "",
        ),
    );
    let invocation = ScanInvocation::parse(IMAGE, OutputMode::Text).unwrap();
    let report = scanner.scan_vulnerabilities(&invocation).await.unwrap();

    assert_eq!(report.vulnerability_count, 5);
    assert_eq!(report.packages.len(), 4);
    assert_eq!(report.status.as_deref(), Some("success"));

    let counts = report.severity_counts.unwrap();
    assert_eq!(counts.critical, 0);
    assert_eq!(counts.high, 2);
    assert_eq!(counts.medium, 2);
    assert_eq!(counts.low, 1);
    assert_eq!(counts.total(), report.vulnerability_count);

    let setuptools = &report.vulnerabilities[0];
    assert_eq!(setuptools.id, "CVE-2024-6345");
    assert_eq!(setuptools.package, "setuptools");
    assert_eq!(setuptools.version, "65.5.1");
    assert_eq!(setuptools.fixed_version, "70.0.0");
    assert_eq!(setuptools.affected_range, "<70.0.0");
    assert_eq!(
        setuptools.reference_urls,
        vec!["https://scout.docker.com/v/CVE-2024-6345"]
    );

    let ghsa = report
        .vulnerabilities
        .iter()
        .find(|v| v.id.starts_with("GHSA-"))
        .unwrap();
    assert_eq!(ghsa.package, "pip");
    assert_eq!(ghsa.title, "Improper Input Validation");

    let calls = runner.calls().await;
    assert_eq!(calls.last().unwrap(), "docker scout cves python:3.11-slim");
    assert_eq!(scanner.scans_completed(), 1);
    assert_eq!(scanner.vulns_found(), 5);
}

#[tokio::test]
async fn test_structured_report_end_to_end() {
    let (_, scanner) = build(ScriptedRunner::ready().respond(
        "docker scout cves python:3.11-slim --format json",
        0,
        &fixture("cves_structured.json"),
        "",
    ));
    let invocation = ScanInvocation::parse(IMAGE, OutputMode::Structured).unwrap();
    let report = scanner.scan_vulnerabilities(&invocation).await.unwrap();

    assert_eq!(report.vulnerability_count, 3);
    let ids: Vec<&str> = report.vulnerabilities.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["CVE-2024-6345", "CVE-2024-4741", "GHSA-jh2v-8fh5-9v9f"]);

    let openssl = &report.vulnerabilities[1];
    assert_eq!(openssl.severity, Severity::Medium);
    assert_eq!(openssl.package, "openssl");
    assert_eq!(openssl.fixed_version, "3.0.14-1~deb12u1");
    assert_eq!(openssl.title, "Vulnerability in openssl");

    let summary = report.summary();
    assert_eq!(summary.total(), 3);
    assert_eq!(summary.counts().high, 1);
}

#[tokio::test]
async fn test_report_json_schema() {
    let (_, scanner) = build(ScriptedRunner::ready().respond(
        "docker scout cves python:3.11-slim --format json",
        0,
        r#"[{"id": "CVE-2024-1", "severity": "critical", "references": ["https://a.test"]}]"#,
        "",
    ));
    let invocation = ScanInvocation::parse(IMAGE, OutputMode::Structured).unwrap();
    let report = scanner.scan_vulnerabilities(&invocation).await.unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["vulnerability_count"], 1);
    assert_eq!(value["status"], "success");
    assert_eq!(value["vulnerabilities"][0]["severity"], "critical");
    assert_eq!(value["vulnerabilities"][0]["urls"], json!(["https://a.test"]));
    assert_eq!(value["severity_counts"]["critical"], 1);
    assert!(value["severity_counts"].get("total").is_none());
    assert!(value.get("error").is_none());
    assert!(value.get("warning").is_none());
    assert!(value.get("packages").is_none());
}

#[tokio::test]
async fn test_tool_failure_is_reported_not_raised() {
    let (_, scanner) = build(ScriptedRunner::ready().respond(
        "docker scout cves python:3.11-slim",
        1,
        "",
        "no such image",
    ));
    let invocation = ScanInvocation::parse(IMAGE, OutputMode::Text).unwrap();
    let report = scanner.scan_vulnerabilities(&invocation).await.unwrap();

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(
        value,
        json!({
            "vulnerabilities": [],
            "vulnerability_count": 0,
            "error": "no such image",
        })
    );
}

#[tokio::test]
async fn test_version_notice_with_empty_output() {
    let (_, scanner) = build(ScriptedRunner::ready().respond(
        "docker scout cves python:3.11-slim",
        0,
        "",
        "[progress]\n    What's next: A New Version (1.13.0) is available\n",
    ));
    let invocation = ScanInvocation::parse(IMAGE, OutputMode::Text).unwrap();
    let report = scanner.scan_vulnerabilities(&invocation).await.unwrap();

    assert_eq!(
        report.warning.as_deref(),
        Some("What's next: A New Version (1.13.0) is available")
    );
    assert!(report.error.is_none());
    assert!(report.vulnerabilities.is_empty());
}

#[tokio::test]
async fn test_missing_extension_blocks_scan() {
    let (runner, scanner) = build(
        ScriptedRunner::ready()
            .respond("docker scout --help", 1, "", "docker: 'scout' is not a docker command.")
            .respond("docker scout cves python:3.11-slim", 0, "", ""),
    );
    let invocation = ScanInvocation::parse(IMAGE, OutputMode::Text).unwrap();
    let err = scanner.scan_vulnerabilities(&invocation).await.unwrap_err();

    assert!(matches!(
        err,
        ScoutError::PreconditionUnavailable(Precondition::ScanExtension)
    ));
    assert!(
        !runner
            .calls()
            .await
            .contains(&"docker scout cves python:3.11-slim".to_owned())
    );
}

#[tokio::test]
async fn test_availability_reports_first_failure() {
    let (runner, scanner) = build(ScriptedRunner::default());
    let availability = scanner.availability().await;

    assert!(!availability.engine_installed);
    assert_eq!(availability.first_failure(), Some(Precondition::EngineInstalled));
    assert_eq!(runner.calls().await, vec!["docker --version"]);
}

#[tokio::test]
async fn test_recommendations_end_to_end() {
    let (_, scanner) = build(ScriptedRunner::ready().respond(
        "docker scout recommendations python:3.11-slim --format json",
        0,
        &fixture("recommendations.json"),
        "",
    ));
    let image = ImageReference::parse(IMAGE).unwrap();
    let report = scanner.recommendations(&image).await.unwrap();

    assert_eq!(report.recommendation_count, 3);
    assert_eq!(report.recommendations[0].kind, "base_image");
    assert_eq!(report.recommendations[0].severity, "high");

    let text = format_recommendations(&report.recommendations, report.message.as_deref());
    assert_eq!(
        text,
        "Base Image: python:3.11-slim → python:3.12-slim (Removes 3 vulnerabilities)\n\
         Package Update: openssl 3.0.13 → 3.0.14\n\
         Tag: python:3.11-slim → python:3.11.9-slim"
    );
}

#[tokio::test]
async fn test_scan_image_combined_report() {
    let (_, scanner) = build(
        ScriptedRunner::ready()
            .respond(
                "docker scout cves python:3.11-slim",
                0,
                &fixture("cves_text.txt"),
                "",
            )
            .respond(
                "docker scout recommendations python:3.11-slim --format json",
                2,
                "",
                "recommendations unavailable for this image",
            ),
    );
    let invocation = ScanInvocation::parse(IMAGE, OutputMode::Text).unwrap();
    let report = scanner.scan_image(&invocation).await.unwrap();

    assert_eq!(report.status, ScanStatus::Success);
    assert_eq!(report.summary.total(), 5);
    assert_eq!(report.vulnerabilities.len(), 5);
    assert_eq!(report.recommendations, "No specific recommendations available.");

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["summary"]["total"], 5);
    assert!(value["timestamp"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn test_custom_binary_and_subcommand() {
    let config = ScoutConfigBuilder::new()
        .binary("podman")
        .subcommand("scan")
        .extension_marker("Scanner")
        .build()
        .unwrap();
    let runner = Arc::new(
        ScriptedRunner::default()
            .respond("podman --version", 0, "podman version 5.0", "")
            .respond("podman info", 0, "", "")
            .respond("podman scan --help", 0, "Scanner plugin", "")
            .respond("podman scan cves alpine:3.20", 0, "", ""),
    );
    let scanner = ScoutScannerBuilder::new()
        .config(config)
        .shared_runner(Arc::clone(&runner))
        .build()
        .unwrap();
    let invocation = ScanInvocation::parse("alpine:3.20", OutputMode::Text).unwrap();
    let report = scanner.scan_vulnerabilities(&invocation).await.unwrap();

    assert!(report.error.is_none());
    assert_eq!(
        runner.calls().await.last().map(String::as_str),
        Some("podman scan cves alpine:3.20")
    );
}

#[tokio::test]
async fn test_concurrent_scans_share_scanner() {
    let runner = ScriptedRunner::ready()
        .respond("docker scout cves alpine:3.18", 0, "✗ HIGH CVE-2024-1\n", "")
        .respond("docker scout cves alpine:3.19", 0, "✗ LOW CVE-2024-2\n✗ LOW CVE-2024-3\n", "");
    let (_, scanner) = build(runner);
    let scanner = Arc::new(scanner);

    let mut handles = Vec::new();
    for image in ["alpine:3.18", "alpine:3.19"] {
        let scanner = Arc::clone(&scanner);
        handles.push(tokio::spawn(async move {
            let invocation = ScanInvocation::parse(image, OutputMode::Text).unwrap();
            scanner.scan_vulnerabilities(&invocation).await.unwrap()
        }));
    }
    let mut total = 0;
    for handle in handles {
        total += handle.await.unwrap().vulnerability_count;
    }

    assert_eq!(total, 3);
    assert_eq!(scanner.scans_completed(), 2);
    assert_eq!(scanner.vulns_found(), 3);
}

#[test]
fn test_invalid_image_reference_rejected() {
    for raw in ["", "-rf", "alpine 3.18", "bad\nimage"] {
        let err = ScanInvocation::parse(raw, OutputMode::Text).unwrap_err();
        assert!(matches!(err, ScoutError::InvalidInvocation(_)), "{raw:?}");
    }
}
