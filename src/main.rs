use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mini_engine::{config::EngineConfig, demo::Demo, scene::SceneLoader};

#[derive(Debug, Parser)]
#[command(author, version, about = "Mini engine ECS demo runner")]
struct Cli {
    /// Path to the engine config YAML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the scene YAML file
    #[arg(long, default_value = "scenes/floating_islands.yaml")]
    scene: PathBuf,

    /// Override frame count
    #[arg(long)]
    frames: Option<u64>,

    /// Override the fixed timestep in seconds
    #[arg(long)]
    dt: Option<f32>,

    /// Write a JSON run summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_yaml(path)?,
        None => EngineConfig::default(),
    };
    if let Some(frames) = cli.frames {
        config.frames.count = frames;
    }
    if let Some(dt) = cli.dt {
        config.frames.dt_seconds = dt;
    }
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    let scene = SceneLoader::new(".").load(&cli.scene)?;
    let frames = config.frames.count;
    let dt = config.frames.dt_seconds;

    let mut demo = Demo::build(config, &scene)?;
    let summary = demo.run(frames, dt)?;
    demo.shutdown()?;

    if let Some(path) = &cli.summary {
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write summary {}", path.display()))?;
    }

    println!(
        "Scene '{}' ran {} frames. {} entities alive, {} draw calls, {}/{} buffers released.",
        summary.scene,
        summary.frames,
        summary.living_entities,
        summary.draw_calls,
        demo.ledger().released(),
        demo.ledger().allocated()
    );
    Ok(())
}
