//! `scoutpost scan`, `scoutpost report` and `scoutpost recommendations` handlers

use std::io::Write;

use colored::Colorize;
use tracing::{info, warn};

use scoutpost_core::config::ScoutpostConfig;
use scoutpost_core::types::{ImageReference, Severity};
use scoutpost_engine::EngineClient;
use scoutpost_scout::{
    ImageScanReport, OutputMode, RecommendationReport, ScanInvocation, ScoutScanner,
    SeverityCounts, VulnerabilityRecord, VulnerabilityReport, format_recommendations,
};

use crate::cli::{RecommendationsArgs, ScanArgs};
use crate::commands::{connect_engine, scout_config};
use crate::error::CliError;
use crate::output::{OutputWriter, Render, severity_label, truncate};

/// Execute the `scan` command.
pub async fn execute_scan(
    args: ScanArgs,
    config: &ScoutpostConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let threshold = parse_threshold(args.fail_on.as_deref())?;
    let scanner = ScoutScanner::with_process_runner(scout_config(
        config,
        args.mode.map(OutputMode::from),
    ))?;
    let invocation = ScanInvocation::parse(&args.image, scanner.config().output_mode)?;

    pull_if_requested(args.pull_override(), config, invocation.image()).await;

    info!(image = %invocation.image(), mode = %invocation.mode(), "starting vulnerability scan");
    let report = scanner.scan_vulnerabilities(&invocation).await?;
    writer.render(&report)?;

    if let Some(error) = &report.error {
        return Err(CliError::Command(format!(
            "scan of {} failed: {error}",
            invocation.image()
        )));
    }
    enforce_threshold(&report.severity_counts.unwrap_or_default(), threshold)
}

/// Execute the `report` command.
pub async fn execute_report(
    args: ScanArgs,
    config: &ScoutpostConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let threshold = parse_threshold(args.fail_on.as_deref())?;
    let scanner = ScoutScanner::with_process_runner(scout_config(
        config,
        args.mode.map(OutputMode::from),
    ))?;
    let invocation = ScanInvocation::parse(&args.image, scanner.config().output_mode)?;

    pull_if_requested(args.pull_override(), config, invocation.image()).await;

    info!(image = %invocation.image(), "building image report");
    let report = scanner.scan_image(&invocation).await?;
    writer.render(&report)?;

    if let Some(error) = &report.error {
        return Err(CliError::Command(format!(
            "scan of {} failed: {error}",
            report.image
        )));
    }
    enforce_threshold(report.summary.counts(), threshold)
}

/// Execute the `recommendations` command.
pub async fn execute_recommendations(
    args: RecommendationsArgs,
    config: &ScoutpostConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let image = ImageReference::parse(&args.image)
        .map_err(|e| CliError::Command(format!("invalid image reference: {e}")))?;
    let scanner = ScoutScanner::with_process_runner(scout_config(config, None))?;

    let report = scanner.recommendations(&image).await?;
    writer.render(&report)?;

    match &report.error {
        Some(error) => Err(CliError::Command(format!(
            "recommendations for {image} failed: {error}"
        ))),
        None => Ok(()),
    }
}

/// Parse the `--fail-on` severity.
fn parse_threshold(raw: Option<&str>) -> Result<Option<Severity>, CliError> {
    raw.map(|s| {
        Severity::from_str_loose(s).ok_or_else(|| {
            CliError::Command(format!(
                "invalid severity: {s} (expected: critical, high, medium, low, negligible, unknown)"
            ))
        })
    })
    .transpose()
}

fn enforce_threshold(counts: &SeverityCounts, threshold: Option<Severity>) -> Result<(), CliError> {
    let Some(threshold) = threshold else {
        return Ok(());
    };
    match counts.at_or_above(threshold) {
        0 => Ok(()),
        count => Err(CliError::VulnerabilitiesFound { count, threshold }),
    }
}

async fn pull_if_requested(
    pull_override: Option<bool>,
    config: &ScoutpostConfig,
    image: &ImageReference,
) {
    if !pull_override.unwrap_or(config.engine.pull_before_scan) {
        return;
    }
    match connect_engine(config).await {
        Ok(engine) => {
            pull_image(&engine, image).await;
        }
        Err(e) => warn!(image = %image, error = %e, "cannot pull image, scanning local copy"),
    }
}

/// Pull `image` before scanning. Failure is logged and the scan continues
/// against whatever copy is available locally.
pub(crate) async fn pull_image<E: EngineClient>(engine: &E, image: &ImageReference) -> bool {
    let (repository, tag) = image.split_tag();
    match engine.pull_image(repository, tag).await {
        Ok(()) => {
            info!(image = %image, "image pulled");
            true
        }
        Err(e) => {
            warn!(image = %image, error = %e, "image pull failed, scanning local copy");
            false
        }
    }
}

fn summary_line(counts: &SeverityCounts) -> String {
    format!(
        "{} total (C:{} H:{} M:{} L:{} N:{} U:{})",
        counts.total(),
        counts.critical,
        counts.high,
        counts.medium,
        counts.low,
        counts.negligible,
        counts.unknown
    )
}

fn write_summary(w: &mut dyn Write, counts: &SeverityCounts) -> std::io::Result<()> {
    let line = summary_line(counts);
    if counts.total() > 0 {
        writeln!(w, "Vulnerabilities: {}", line.red().bold())
    } else {
        writeln!(w, "Vulnerabilities: {}", line.green().bold())
    }
}

fn write_findings(w: &mut dyn Write, records: &[VulnerabilityRecord]) -> std::io::Result<()> {
    if records.is_empty() {
        return writeln!(w, "{}", "No vulnerabilities found.".green());
    }

    writeln!(
        w,
        "{:<22} {:<10} {:<25} {:<15} Fixed",
        "ID", "Severity", "Package", "Version"
    )?;
    writeln!(w, "{}", "-".repeat(84))?;
    for record in records {
        let fixed = if record.fixed_version.is_empty() {
            "N/A"
        } else {
            record.fixed_version.as_str()
        };
        writeln!(
            w,
            "{:<22} {:<10} {:<25} {:<15} {}",
            record.id,
            severity_label(record.severity),
            truncate(&record.package, 25),
            truncate(&record.version, 15),
            fixed
        )?;
    }
    Ok(())
}

fn write_notice(w: &mut dyn Write, warning: Option<&str>) -> std::io::Result<()> {
    if let Some(warning) = warning {
        writeln!(w, "{} {warning}", "Warning:".yellow().bold())?;
        writeln!(w)?;
    }
    Ok(())
}

impl Render for VulnerabilityReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        write_notice(w, self.warning.as_deref())?;

        if let Some(error) = &self.error {
            return writeln!(w, "{} {error}", "Scan failed:".red().bold());
        }

        write_summary(w, &self.severity_counts.unwrap_or_default())?;
        writeln!(w)?;

        if !self.packages.is_empty() {
            writeln!(w, "{:<30} {:<15} {:>3} {:>3} {:>3} {:>3}", "Package", "Version", "C", "H", "M", "L")?;
            for pkg in &self.packages {
                writeln!(
                    w,
                    "{:<30} {:<15} {:>3} {:>3} {:>3} {:>3}",
                    truncate(&pkg.name, 30),
                    truncate(&pkg.version, 15),
                    pkg.critical,
                    pkg.high,
                    pkg.medium,
                    pkg.low
                )?;
            }
            writeln!(w)?;
        }

        write_findings(w, &self.vulnerabilities)
    }
}

impl Render for RecommendationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        write_notice(w, self.warning.as_deref())?;

        if let Some(error) = &self.error {
            return writeln!(w, "{} {error}", "Recommendations unavailable:".red().bold());
        }
        writeln!(
            w,
            "{}",
            format_recommendations(&self.recommendations, self.message.as_deref())
        )
    }
}

impl Render for ImageScanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Image: {}", self.image.bold())?;
        writeln!(w, "Scan ID: {}", self.scan_id)?;
        writeln!(w, "Scanned at: {}", self.timestamp.to_rfc3339())?;
        writeln!(w)?;
        write_notice(w, self.warning.as_deref())?;

        if let Some(error) = &self.error {
            writeln!(w, "{} {error}", "Scan failed:".red().bold())?;
        } else {
            write_summary(w, self.summary.counts())?;
            writeln!(w)?;
            write_findings(w, &self.vulnerabilities)?;
        }

        writeln!(w)?;
        writeln!(w, "{}", "Recommendations".bold())?;
        writeln!(w, "{}", self.recommendations)
    }
}
