#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ScoutError`, `Precondition`)
//! - [`config`]: Scanner configuration (`ScoutConfig`, builder)
//! - [`types`]: Records, reports, severity summaries
//! - [`runner`]: External command execution (`CommandRunner` trait, `ProcessRunner`)
//! - [`probe`]: Layered precondition checks (`AvailabilityProber`)
//! - [`shape`]: Structured output shape classification (`RecordShape`)
//! - [`normalize`]: Structured vulnerability normalization
//! - [`text_report`]: Text report parser (`TextReportParser`)
//! - [`severity`]: Severity aggregation
//! - [`recommend`]: Recommendation normalization and formatting
//! - [`scanner`]: Main orchestrator (`ScoutScanner`, `ScoutScannerBuilder`)

pub mod config;
pub mod error;
pub mod normalize;
pub mod probe;
pub mod recommend;
pub mod runner;
pub mod scanner;
pub mod severity;
pub mod shape;
pub mod text_report;
pub mod types;

// --- Public API Re-exports ---

// Scanner (main orchestrator)
pub use scanner::{ScoutScanner, ScoutScannerBuilder, version_warning};

// Configuration
pub use config::{ScoutConfig, ScoutConfigBuilder};

// Error
pub use error::{Precondition, ScoutError};

// Execution
pub use probe::{Availability, AvailabilityProber};
pub use runner::{CommandRunner, ProcessRunner};

// Parsing
pub use normalize::{normalize_vulnerabilities, normalize_vulnerability};
pub use recommend::{format_recommendation, format_recommendations, normalize_recommendations};
pub use severity::{summarize, summarize_payload, summarize_values};
pub use shape::{RecordShape, classify};
pub use text_report::TextReportParser;

// Types
pub use types::{
    ImageScanReport, OutputMode, PackageSummary, ParsedTextReport, RawToolResult,
    RecommendationRecord, RecommendationReport, ScanInvocation, ScanStatus, SeverityCounts,
    SeveritySummary, VulnerabilityRecord, VulnerabilityReport,
};
