//! goapkit demo - drives action templates through a single agent's update loop

mod demo;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use settings::DemoSettings;

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(DemoSettings::default_path);

    let loaded = match &path {
        Some(path) => DemoSettings::read(path),
        None => Ok(None),
    };
    let settings = match &loaded {
        Ok(Some(settings)) => settings.clone(),
        _ => DemoSettings::default(),
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match (&loaded, &path) {
        (Ok(Some(_)), Some(path)) => info!("Loaded settings from {:?}", path),
        (Ok(_), _) => info!("No settings file found, using defaults"),
        (Err(e), _) => warn!("Failed to load settings: {}, using defaults", e),
    }

    let (blackboard, outcomes) = demo::run(&settings).context("Door scenario failed")?;
    for (name, outcome) in &outcomes {
        info!("{name}: {outcome:?}");
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&blackboard).context("Failed to serialize blackboard")?
    );
    Ok(())
}
