//! Configuration management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Serial port path or "auto" for auto-detection
    #[serde(default = "default_port")]
    pub port: String,

    /// Rainbow frame interval in milliseconds
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,

    /// Channel layout
    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelConfig>,
}

/// Layout of a single channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel number (1-4)
    pub channel: usize,

    /// Number of pixels on the stick or strip
    #[serde(default = "default_pixels")]
    pub pixels: usize,

    /// Enable gamma correction on the dock
    #[serde(default)]
    pub gamma: bool,
}

// Default value functions
fn default_port() -> String {
    "auto".to_string()
}

fn default_frame_interval() -> u64 {
    10
}

fn default_pixels() -> usize {
    16
}

fn default_channels() -> Vec<ChannelConfig> {
    (1..=mote_hw::NUM_CHANNELS)
        .map(|channel| ChannelConfig {
            channel,
            pixels: default_pixels(),
            gamma: false,
        })
        .collect()
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(path.as_ref(), content).context("Failed to write configuration file")?;
        Ok(())
    }

    /// Returns the explicit port path, or `None` to auto-detect.
    pub fn port_path(&self) -> Option<&str> {
        match self.port.as_str() {
            "" | "auto" => None,
            path => Some(path),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            frame_interval_ms: default_frame_interval(),
            channels: default_channels(),
        }
    }
}
