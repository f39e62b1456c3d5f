//! `scoutpost volumes` command handler

use std::io::Write;

use serde::Serialize;

use scoutpost_core::config::ScoutpostConfig;
use scoutpost_core::types::VolumeInfo;
use scoutpost_engine::EngineClient;

use crate::commands::connect_engine;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, truncate};

/// Execute the `volumes` command.
pub async fn execute(config: &ScoutpostConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let engine = connect_engine(config).await?;
    writer.render(&list(&engine).await?)
}

#[derive(Debug, Serialize)]
pub struct VolumeList {
    pub volumes: Vec<VolumeInfo>,
}

pub(crate) async fn list<E: EngineClient>(engine: &E) -> Result<VolumeList, CliError> {
    Ok(VolumeList {
        volumes: engine.list_volumes().await?,
    })
}

impl Render for VolumeList {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        if self.volumes.is_empty() {
            return writeln!(w, "No volumes.");
        }
        writeln!(w, "{:<32} {:<10} Mountpoint", "Name", "Driver")?;
        writeln!(w, "{}", "-".repeat(72))?;
        for v in &self.volumes {
            writeln!(w, "{:<32} {:<10} {}", truncate(&v.name, 32), v.driver, v.mountpoint)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fake::FakeEngine;

    #[tokio::test]
    async fn test_list_volumes() {
        let engine = FakeEngine {
            volumes: vec![VolumeInfo {
                name: "pgdata".to_owned(),
                driver: "local".to_owned(),
                mountpoint: "/var/lib/docker/volumes/pgdata/_data".to_owned(),
            }],
            ..Default::default()
        };
        let report = list(&engine).await.unwrap();
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("pgdata"));
        assert!(text.contains("/var/lib/docker/volumes/pgdata/_data"));
    }

    #[tokio::test]
    async fn test_empty_volume_list() {
        let report = list(&FakeEngine::default()).await.unwrap();
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "No volumes.\n");
    }
}
