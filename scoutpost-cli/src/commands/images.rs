//! `scoutpost images` command handler

use std::io::Write;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use scoutpost_core::config::ScoutpostConfig;
use scoutpost_core::types::{ImageInfo, ImageReference, short_id};
use scoutpost_engine::EngineClient;

use crate::cli::{ImagesAction, ImagesArgs};
use crate::commands::connect_engine;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `images` command.
pub async fn execute(
    args: ImagesArgs,
    config: &ScoutpostConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let engine = connect_engine(config).await?;
    let output = run(&engine, args.action).await?;
    writer.render(&output)
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ImagesOutput {
    List { images: Vec<ImageInfo> },
    Pulled { repository: String, tag: String },
}

pub(crate) async fn run<E: EngineClient>(
    engine: &E,
    action: ImagesAction,
) -> Result<ImagesOutput, CliError> {
    match action {
        ImagesAction::List => Ok(ImagesOutput::List {
            images: engine.list_images().await?,
        }),
        ImagesAction::Pull { image } => {
            let image = ImageReference::parse(&image)
                .map_err(|e| CliError::Command(format!("invalid image reference: {e}")))?;
            let (repository, tag) = image.split_tag();
            engine.pull_image(repository, tag).await?;
            info!(%image, "image pulled");
            Ok(ImagesOutput::Pulled {
                repository: repository.to_owned(),
                tag: tag.to_owned(),
            })
        }
    }
}

/// Human-readable byte size (`1.5 MB`).
fn human_size(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes.max(0) as f64;
    let mut unit = 0;
    while size >= 1000.0 && unit < UNITS.len() - 1 {
        size /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

impl Render for ImagesOutput {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        match self {
            Self::List { images } => {
                if images.is_empty() {
                    return writeln!(w, "No images.");
                }
                writeln!(w, "{:<12} {:>10}  Tags", "ID", "Size")?;
                writeln!(w, "{}", "-".repeat(60))?;
                for image in images {
                    let tags = if image.tags.is_empty() {
                        "<none>".to_owned()
                    } else {
                        image.tags.join(", ")
                    };
                    writeln!(
                        w,
                        "{:<12} {:>10}  {tags}",
                        short_id(&image.id),
                        human_size(image.size)
                    )?;
                }
                Ok(())
            }
            Self::Pulled { repository, tag } => {
                writeln!(w, "{} Pulled {}:{tag}", "✓".green(), repository.bold())
            }
        }
    }
}
