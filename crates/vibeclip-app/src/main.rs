//! VibeClip - headless timeline runner
//!
//! Loads an edit/playback script, runs it through an editor session with
//! in-memory playback handles and prints the final snapshot as JSON.
//!
//! Usage: `vibeclip <script.json> [config.json]`

mod script;

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vibeclip_core::EditorConfig;

use crate::script::{Runner, Script};

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let Some(script_path) = std::env::args().nth(1).map(PathBuf::from) else {
        bail!("usage: vibeclip <script.json> [config.json]");
    };
    let config = match std::env::args().nth(2).map(PathBuf::from) {
        Some(path) => EditorConfig::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EditorConfig::default(),
    };
    config.validate()?;

    let script = Script::load(&script_path)?;
    info!(
        script = %script_path.display(),
        assets = script.assets.len(),
        manifest = ?script.manifest,
        steps = script.steps.len(),
        "VibeClip starting"
    );

    let base_dir = script_path.parent().unwrap_or_else(|| Path::new("."));
    let registry = script.registry(base_dir)?;
    let mut runner = Runner::new(config, registry);
    runner.run(script.steps);

    let snapshot = runner.session().snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
