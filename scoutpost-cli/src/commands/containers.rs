//! `scoutpost containers` command handler

use std::io::Write;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use scoutpost_core::config::ScoutpostConfig;
use scoutpost_core::types::{ContainerInfo, ImageReference};
use scoutpost_engine::{ContainerSpec, EngineClient};

use crate::cli::{ContainerSpecArgs, ContainersAction, ContainersArgs};
use crate::commands::connect_engine;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, truncate};

/// Execute the `containers` command.
pub async fn execute(
    args: ContainersArgs,
    config: &ScoutpostConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let engine = connect_engine(config).await?;
    let output = run(&engine, args.action).await?;
    writer.render(&output)
}

/// Containers command output.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ContainersOutput {
    List { containers: Vec<ContainerInfo> },
    Detail(ContainerInfo),
    Action { action: &'static str, id: String },
}

pub(crate) async fn run<E: EngineClient>(
    engine: &E,
    action: ContainersAction,
) -> Result<ContainersOutput, CliError> {
    let output = match action {
        ContainersAction::List { all } => ContainersOutput::List {
            containers: engine.list_containers(all).await?,
        },
        ContainersAction::Inspect { id } => {
            ContainersOutput::Detail(engine.inspect_container(&id).await?)
        }
        ContainersAction::Create(spec_args) => {
            let spec = build_spec(spec_args)?;
            let id = engine.create_container(&spec).await?;
            info!(id = %id, image = %spec.image, "container created");
            ContainersOutput::Action {
                action: "created",
                id,
            }
        }
        ContainersAction::Run(spec_args) => {
            let spec = build_spec(spec_args)?;
            let id = engine.run_container(&spec).await?;
            info!(id = %id, image = %spec.image, "container started");
            ContainersOutput::Action {
                action: "started",
                id,
            }
        }
        ContainersAction::Start { id } => {
            engine.start_container(&id).await?;
            ContainersOutput::Action {
                action: "started",
                id,
            }
        }
        ContainersAction::Stop { id, timeout } => {
            engine.stop_container(&id, timeout).await?;
            ContainersOutput::Action {
                action: "stopped",
                id,
            }
        }
        ContainersAction::Remove { id, force } => {
            engine.remove_container(&id, force).await?;
            ContainersOutput::Action {
                action: "removed",
                id,
            }
        }
    };
    Ok(output)
}

/// Turn command-line flags into a validated container spec.
fn build_spec(args: ContainerSpecArgs) -> Result<ContainerSpec, CliError> {
    let image = ImageReference::parse(&args.image)
        .map_err(|e| CliError::Command(format!("invalid image reference: {e}")))?;
    let mut spec = ContainerSpec::new(image);

    if let Some(name) = args.name {
        spec = spec.with_name(name);
    }
    if !args.command.is_empty() {
        spec = spec.with_command(args.command);
    }
    for pair in &args.env {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| CliError::Command(format!("invalid --env '{pair}' (expected KEY=VALUE)")))?;
        spec = spec.with_env(key, value);
    }
    for mapping in &args.port {
        let (container_port, host_port) = parse_port(mapping)?;
        spec = spec.with_port(container_port, host_port);
    }
    for binding in &args.volume {
        let (host, target) = binding
            .split_once(':')
            .filter(|(host, target)| !host.is_empty() && !target.is_empty())
            .ok_or_else(|| {
                CliError::Command(format!(
                    "invalid --volume '{binding}' (expected HOST_PATH:CONTAINER_PATH[:ro|rw])"
                ))
            })?;
        spec = spec.with_volume(host, target);
    }

    spec.validate()?;
    Ok(spec)
}

/// `80/tcp:8080` -> (`80/tcp`, 8080)
fn parse_port(mapping: &str) -> Result<(&str, u16), CliError> {
    let invalid = || {
        CliError::Command(format!(
            "invalid --port '{mapping}' (expected CONTAINER_PORT:HOST_PORT)"
        ))
    };
    let (container_port, host_port) = mapping.rsplit_once(':').ok_or_else(invalid)?;
    let host_port = host_port.parse::<u16>().map_err(|_| invalid())?;
    Ok((container_port, host_port))
}

impl Render for ContainersOutput {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        match self {
            Self::List { containers } => {
                if containers.is_empty() {
                    return writeln!(w, "No containers.");
                }
                writeln!(
                    w,
                    "{:<12} {:<24} {:<30} {:<10} Ports",
                    "ID", "Name", "Image", "Status"
                )?;
                writeln!(w, "{}", "-".repeat(92))?;
                for c in containers {
                    writeln!(
                        w,
                        "{:<12} {:<24} {:<30} {:<10} {}",
                        c.id,
                        truncate(&c.name, 24),
                        truncate(&c.image, 30),
                        c.status,
                        c.ports.join(", ")
                    )?;
                }
                Ok(())
            }
            Self::Detail(c) => {
                writeln!(w, "Container: {}", c.name.bold())?;
                writeln!(w, "  ID:      {}", c.id)?;
                writeln!(w, "  Image:   {}", c.image)?;
                writeln!(w, "  Status:  {}", c.status)?;
                writeln!(w, "  Created: {}", c.created)?;
                if c.ports.is_empty() {
                    writeln!(w, "  Ports:   -")
                } else {
                    writeln!(w, "  Ports:   {}", c.ports.join(", "))
                }
            }
            Self::Action { action, id } => {
                writeln!(w, "{} Container {} {action}", "✓".green(), id.bold())
            }
        }
    }
}
