//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use scoutpost_scout::OutputMode;

/// Scoutpost -- container host management and image vulnerability reports.
///
/// Use `scoutpost <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "scoutpost", version, about, long_about = None)]
pub struct Cli {
    /// Path to the scoutpost.toml configuration file.
    #[arg(short, long, default_value = "scoutpost.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan an image for vulnerabilities.
    Scan(ScanArgs),

    /// Show base image and package recommendations for an image.
    Recommendations(RecommendationsArgs),

    /// Vulnerability scan plus recommendations in one report.
    Report(ScanArgs),

    /// Check that the engine and the scan extension are usable.
    Status,

    /// Manage containers.
    Containers(ContainersArgs),

    /// Manage local images.
    Images(ImagesArgs),

    /// List networks.
    Networks,

    /// List volumes.
    Volumes,

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- scan / report ----

/// Scan mode selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScanMode {
    /// Parse the human-readable report.
    Text,
    /// Request `--format json` and normalize the records.
    Structured,
}

impl From<ScanMode> for OutputMode {
    fn from(mode: ScanMode) -> Self {
        match mode {
            ScanMode::Text => OutputMode::Text,
            ScanMode::Structured => OutputMode::Structured,
        }
    }
}

/// Scan an image reference (`name[:tag]` or `name@digest`).
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Image reference to scan.
    pub image: String,

    /// Scan output mode (default: `scan.output_mode` from the config).
    #[arg(long)]
    pub mode: Option<ScanMode>,

    /// Pull the image before scanning (default: `engine.pull_before_scan`).
    #[arg(long, overrides_with = "no_pull")]
    pub pull: bool,

    /// Scan the local copy without pulling.
    #[arg(long)]
    pub no_pull: bool,

    /// Exit with code 4 when vulnerabilities at or above this severity are found
    /// (critical, high, medium, low, negligible, unknown).
    #[arg(long)]
    pub fail_on: Option<String>,
}

impl ScanArgs {
    /// Explicit pull choice from the flags, `None` when neither flag was given.
    pub fn pull_override(&self) -> Option<bool> {
        if self.no_pull {
            Some(false)
        } else if self.pull {
            Some(true)
        } else {
            None
        }
    }
}

/// Fetch recommendations for an image.
#[derive(Args, Debug)]
pub struct RecommendationsArgs {
    /// Image reference.
    pub image: String,
}

// ---- containers ----

#[derive(Args, Debug)]
pub struct ContainersArgs {
    #[command(subcommand)]
    pub action: ContainersAction,
}

#[derive(Subcommand, Debug)]
pub enum ContainersAction {
    /// List containers.
    List {
        /// Include stopped containers.
        #[arg(short, long)]
        all: bool,
    },
    /// Show details of one container.
    Inspect {
        /// Container ID or name.
        id: String,
    },
    /// Create a container without starting it.
    Create(ContainerSpecArgs),
    /// Create and start a container.
    Run(ContainerSpecArgs),
    /// Start a container.
    Start {
        /// Container ID or name.
        id: String,
    },
    /// Stop a container.
    Stop {
        /// Container ID or name.
        id: String,
        /// Seconds to wait before killing the container.
        #[arg(short, long)]
        timeout: Option<i64>,
    },
    /// Remove a container.
    Remove {
        /// Container ID or name.
        id: String,
        /// Remove even if running.
        #[arg(short, long)]
        force: bool,
    },
}

/// Container creation parameters.
#[derive(Args, Debug)]
pub struct ContainerSpecArgs {
    /// Image reference.
    pub image: String,

    /// Container name.
    #[arg(long)]
    pub name: Option<String>,

    /// Environment variable (`KEY=VALUE`), repeatable.
    #[arg(short, long = "env")]
    pub env: Vec<String>,

    /// Port mapping (`CONTAINER_PORT:HOST_PORT`, e.g. `80/tcp:8080`), repeatable.
    #[arg(short, long = "port")]
    pub port: Vec<String>,

    /// Volume binding (`HOST_PATH:CONTAINER_PATH`), repeatable.
    #[arg(short, long = "volume")]
    pub volume: Vec<String>,

    /// Command to run instead of the image default.
    #[arg(last = true)]
    pub command: Vec<String>,
}

// ---- images ----

#[derive(Args, Debug)]
pub struct ImagesArgs {
    #[command(subcommand)]
    pub action: ImagesAction,
}

#[derive(Subcommand, Debug)]
pub enum ImagesAction {
    /// List local images.
    List,
    /// Pull an image (`name[:tag]`, tag defaults to `latest`).
    Pull {
        /// Image reference.
        image: String,
    },
}

// ---- config ----

/// Manage scoutpost configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, engine, scan).
        #[arg(long)]
        section: Option<String>,
    },
}
