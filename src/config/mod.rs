//! Configuration management for Tessera
//!
//! This module handles loading, parsing, and validating configuration
//! from TOML files. It covers the window, frame pacing, and buffer
//! handling settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration struct containing all Tessera settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TesseraConfig {
    /// Window settings
    #[serde(default)]
    pub window: WindowConfig,

    /// Frame pacing settings
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Buffer handling settings
    #[serde(default)]
    pub buffers: BufferConfig,
}

/// Window settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowConfig {
    /// Title shown by the compositor
    pub title: String,

    /// Initial width before the compositor proposes a size (pixels)
    pub width: u32,

    /// Initial height before the compositor proposes a size (pixels)
    pub height: u32,
}

/// Frame pacing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PacingConfig {
    /// Checkerboard scroll speed (pattern units per second)
    pub scroll_speed: f64,
}

/// Buffer handling settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BufferConfig {
    /// Reuse released buffers instead of destroying them
    pub recycle: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Tessera".to_string(),
            width: 640,
            height: 480,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self { scroll_speed: 24.0 }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self { recycle: false }
    }
}

impl TesseraConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Expand ~ to home directory
        let expanded_path = if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            Path::new(&home).join(path.strip_prefix("~").unwrap_or(path))
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: TesseraConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            anyhow::bail!("Invalid window extent: width and height must be non-zero");
        }

        if self.window.title.is_empty() {
            anyhow::bail!("Invalid window title: must not be empty");
        }

        if self.pacing.scroll_speed <= 0.0 || !self.pacing.scroll_speed.is_finite() {
            anyhow::bail!("Invalid scroll_speed: must be a positive number");
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests;
