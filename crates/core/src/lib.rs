#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, EngineError, ReferenceError, ScanError, ScoutpostError};

// 설정
pub use config::ScoutpostConfig;

// 도메인 타입
pub use types::{ContainerInfo, ImageInfo, ImageReference, NetworkInfo, Severity, VolumeInfo};
