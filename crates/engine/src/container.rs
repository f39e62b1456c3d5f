//! Container creation requests.
//!
//! [`ContainerSpec`] describes a container to create. It is validated before
//! it is handed to the engine so malformed port or volume mappings fail
//! locally with [`EngineClientError::InvalidSpec`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use scoutpost_core::types::ImageReference;

use crate::client::validate_container_name;
use crate::error::EngineClientError;

/// A container to create.
///
/// # Examples
///
/// ```
/// use scoutpost_core::types::ImageReference;
/// use scoutpost_engine::ContainerSpec;
///
/// let image = ImageReference::parse("nginx:1.25").unwrap();
/// let spec = ContainerSpec::new(image)
///     .with_name("web")
///     .with_env("TZ", "UTC")
///     .with_port("80/tcp", 8080)
///     .with_volume("/srv/www", "/usr/share/nginx/html:ro");
/// assert!(spec.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Image to run
    pub image: ImageReference,
    /// Command override; empty keeps the image default
    #[serde(default)]
    pub command: Vec<String>,
    /// Container name; `None` lets the engine pick one
    #[serde(default)]
    pub name: Option<String>,
    /// Environment variables
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    /// Container port (`80` or `80/tcp`) to host port
    #[serde(default)]
    pub ports: BTreeMap<String, u16>,
    /// Host path to container path, optionally suffixed with `:ro` / `:rw`
    #[serde(default)]
    pub volumes: BTreeMap<String, String>,
}

impl ContainerSpec {
    pub fn new(image: ImageReference) -> Self {
        Self {
            image,
            command: Vec::new(),
            name: None,
            environment: BTreeMap::new(),
            ports: BTreeMap::new(),
            volumes: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn with_port(mut self, container_port: impl Into<String>, host_port: u16) -> Self {
        self.ports.insert(container_port.into(), host_port);
        self
    }

    pub fn with_volume(mut self, host_path: impl Into<String>, target: impl Into<String>) -> Self {
        self.volumes.insert(host_path.into(), target.into());
        self
    }

    /// Checks names, environment keys, port and volume mappings.
    pub fn validate(&self) -> Result<(), EngineClientError> {
        if let Some(name) = &self.name {
            validate_container_name(name)?;
        }

        for key in self.environment.keys() {
            if key.is_empty() || key.contains('=') {
                return Err(invalid_spec(
                    "environment",
                    format!("invalid variable name '{key}'"),
                ));
            }
        }

        for (container_port, host_port) in &self.ports {
            normalize_port(container_port)?;
            if *host_port == 0 {
                return Err(invalid_spec(
                    "ports",
                    format!("host port for '{container_port}' must be 1-65535"),
                ));
            }
        }

        for (host_path, target) in &self.volumes {
            if host_path.is_empty() || target.is_empty() {
                return Err(invalid_spec(
                    "volumes",
                    "host path and target must not be empty".to_owned(),
                ));
            }
            if let Some((_, mode)) = target.rsplit_once(':') {
                if mode != "ro" && mode != "rw" {
                    return Err(invalid_spec(
                        "volumes",
                        format!("unsupported mode '{mode}' for '{host_path}'"),
                    ));
                }
            }
        }

        Ok(())
    }

    /// `KEY=value` pairs in key order.
    pub fn env_list(&self) -> Vec<String> {
        self.environment
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect()
    }

    /// `host:target[:mode]` bind strings in host path order.
    pub fn bind_list(&self) -> Vec<String> {
        self.volumes
            .iter()
            .map(|(host, target)| format!("{host}:{target}"))
            .collect()
    }

    /// Container port (normalized to `port/proto`) to host port.
    pub fn port_bindings(&self) -> Result<HashMap<String, u16>, EngineClientError> {
        self.ports
            .iter()
            .map(|(container_port, host_port)| Ok((normalize_port(container_port)?, *host_port)))
            .collect()
    }
}

/// Normalizes `80` to `80/tcp` and validates `port/proto`.
fn normalize_port(raw: &str) -> Result<String, EngineClientError> {
    let (port, proto) = raw.split_once('/').unwrap_or((raw, "tcp"));
    let port_ok = port.parse::<u16>().is_ok_and(|p| p != 0);
    let proto_ok = matches!(proto, "tcp" | "udp" | "sctp");
    if !port_ok || !proto_ok {
        return Err(invalid_spec(
            "ports",
            format!("invalid container port '{raw}' (expected PORT or PORT/tcp|udp|sctp)"),
        ));
    }
    Ok(format!("{port}/{proto}"))
}

fn invalid_spec(field: &str, reason: String) -> EngineClientError {
    EngineClientError::InvalidSpec {
        field: field.to_owned(),
        reason,
    }
}
