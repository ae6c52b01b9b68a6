//! Demo settings
//!
//! Read from `~/.config/goapkit/demo.toml` unless a path is given on the
//! command line.

use std::fs;
use std::path::{Path, PathBuf};

use goapkit_core::Blackboard;
use serde::{Deserialize, Serialize};

/// Everything the demo loop can be tuned with
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Seconds of simulated time per update tick
    pub tick_seconds: f32,
    /// Ticks an action may run before the loop gives up on it
    pub max_ticks: u32,
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
    /// How long unlocking the door takes
    pub unlock_seconds: f32,
    /// Facts the agent starts with
    pub initial_facts: Blackboard,
}

impl Default for DemoSettings {
    fn default() -> Self {
        let mut initial_facts = Blackboard::new();
        initial_facts.set_bool("door_closed", true);
        initial_facts.set_bool("door_locked", true);
        initial_facts.set_bool("has_key", true);

        Self {
            tick_seconds: 0.25,
            max_ticks: 40,
            log_filter: "info".to_string(),
            unlock_seconds: 1.0,
            initial_facts,
        }
    }
}

impl DemoSettings {
    /// Get the default settings file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("goapkit").join("demo.toml"))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Read settings from disk. `Ok(None)` if the file doesn't exist.
    pub fn read(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(Self::parse(&content)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_seed_door_scenario() {
        let settings = DemoSettings::default();
        assert_eq!(settings.max_ticks, 40);
        assert_eq!(settings.initial_facts.get_bool("door_closed"), Some(true));
        assert_eq!(settings.initial_facts.get_bool("has_key"), Some(true));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let settings = DemoSettings::parse("tick_seconds = 0.5\n").unwrap();
        assert_eq!(settings.tick_seconds, 0.5);
        assert_eq!(settings.max_ticks, 40);
        assert_eq!(settings.log_filter, "info");
    }

    #[test]
    fn initial_facts_table() {
        let settings = DemoSettings::parse(
            "max_ticks = 3\n[initial_facts]\ndoor_closed = true\nhas_key = false\n",
        )
        .unwrap();
        assert_eq!(settings.max_ticks, 3);
        assert_eq!(settings.initial_facts.get_bool("has_key"), Some(false));
        assert!(!settings.initial_facts.contains("door_locked"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(DemoSettings::parse("max_ticks = \"many\"").is_err());
    }

    #[test]
    fn missing_file_reads_as_none() {
        let path = std::env::temp_dir().join("goapkit-missing-settings.toml");
        assert!(DemoSettings::read(&path).unwrap().is_none());
    }
}
