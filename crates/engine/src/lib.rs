#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error type (`EngineClientError`)
//! - [`config`]: Connection settings (`EngineClientConfig`)
//! - [`container`]: Container creation requests (`ContainerSpec`)
//! - [`client`]: Engine API abstraction (`EngineClient` trait, `BollardEngineClient`)

pub mod client;
pub mod config;
pub mod container;
pub mod error;

pub use client::{BollardEngineClient, EngineClient};
pub use config::EngineClientConfig;
pub use container::ContainerSpec;
pub use error::EngineClientError;
