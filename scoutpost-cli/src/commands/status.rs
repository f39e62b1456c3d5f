//! `scoutpost status` command handler

use std::io::Write;

use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use scoutpost_core::config::ScoutpostConfig;
use scoutpost_engine::EngineClient;
use scoutpost_scout::{Availability, ScoutScanner};

use crate::commands::{connect_engine, scout_config};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `status` command.
///
/// Exits with code 3 when any scan precondition is unmet.
pub async fn execute(config: &ScoutpostConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let scanner = ScoutScanner::with_process_runner(scout_config(config, None))?;
    let availability = scanner.availability().await;

    let engine_api = match connect_engine(config).await {
        Ok(engine) => engine_api_status(&engine).await,
        Err(e) => {
            debug!(error = %e, "engine api unreachable");
            EngineApiStatus::unreachable(e.to_string())
        }
    };

    let report = StatusReport::new(config.engine.binary.clone(), availability, engine_api);
    writer.render(&report)?;

    match report.availability.first_failure() {
        Some(precondition) => Err(CliError::Unavailable(format!(
            "{precondition} ({})",
            precondition.suggestion()
        ))),
        None => Ok(()),
    }
}

/// Ping the engine API.
pub(crate) async fn engine_api_status<E: EngineClient>(engine: &E) -> EngineApiStatus {
    match engine.ping().await {
        Ok(()) => EngineApiStatus::reachable(),
        Err(e) => EngineApiStatus::unreachable(e.to_string()),
    }
}

#[derive(Debug, Serialize)]
pub struct EngineApiStatus {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EngineApiStatus {
    fn reachable() -> Self {
        Self {
            reachable: true,
            error: None,
        }
    }

    fn unreachable(error: String) -> Self {
        Self {
            reachable: false,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub binary: String,
    pub availability: Availability,
    pub engine_api: EngineApiStatus,
    pub ready: bool,
    /// Next step for the first unmet precondition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl StatusReport {
    fn new(binary: String, availability: Availability, engine_api: EngineApiStatus) -> Self {
        let failure = availability.first_failure();
        Self {
            binary,
            availability,
            engine_api,
            ready: failure.is_none(),
            suggestion: failure.map(|p| p.suggestion().to_owned()),
        }
    }
}

fn check_mark(ok: bool) -> colored::ColoredString {
    if ok { "ok".green().bold() } else { "missing".red().bold() }
}

impl Render for StatusReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Engine binary: {}", self.binary.bold())?;
        writeln!(w)?;
        writeln!(w, "  {:<24} {}", "Engine installed", check_mark(self.availability.engine_installed))?;
        writeln!(w, "  {:<24} {}", "Engine running", check_mark(self.availability.engine_running))?;
        writeln!(
            w,
            "  {:<24} {}",
            "Scan extension",
            check_mark(self.availability.scan_extension_available)
        )?;
        match &self.engine_api.error {
            None => writeln!(w, "  {:<24} {}", "Engine API", check_mark(true))?,
            Some(e) => writeln!(w, "  {:<24} {} ({e})", "Engine API", check_mark(false))?,
        }
        writeln!(w)?;

        if self.ready {
            writeln!(w, "Ready to scan: {}", "yes".green().bold())?;
        } else {
            writeln!(w, "Ready to scan: {}", "no".red().bold())?;
            if let Some(suggestion) = &self.suggestion {
                writeln!(w, "  {suggestion}")?;
            }
        }
        Ok(())
    }
}
