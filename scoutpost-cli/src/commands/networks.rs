//! `scoutpost networks` command handler

use std::io::Write;

use serde::Serialize;

use scoutpost_core::config::ScoutpostConfig;
use scoutpost_core::types::{NetworkInfo, short_id};
use scoutpost_engine::EngineClient;

use crate::commands::connect_engine;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, truncate};

/// Execute the `networks` command.
pub async fn execute(config: &ScoutpostConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let engine = connect_engine(config).await?;
    writer.render(&list(&engine).await?)
}

#[derive(Debug, Serialize)]
pub struct NetworkList {
    pub networks: Vec<NetworkInfo>,
}

pub(crate) async fn list<E: EngineClient>(engine: &E) -> Result<NetworkList, CliError> {
    let mut networks = engine.list_networks().await?;
    networks.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(NetworkList { networks })
}

impl Render for NetworkList {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            w,
            "{:<12} {:<24} {:<10} {:<8} Containers",
            "ID", "Name", "Driver", "Scope"
        )?;
        writeln!(w, "{}", "-".repeat(68))?;
        for n in &self.networks {
            writeln!(
                w,
                "{:<12} {:<24} {:<10} {:<8} {}",
                short_id(&n.id),
                truncate(&n.name, 24),
                n.driver,
                n.scope,
                n.containers.len()
            )?;
        }
        Ok(())
    }
}
