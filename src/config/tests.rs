//! Unit tests for configuration module
//!
//! Tests configuration parsing, validation, serialization/deserialization,
//! and edge cases in configuration handling.

use super::*;
use anyhow::Result;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_default_configuration_is_valid() {
    let config = TesseraConfig::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.window.width, 640);
    assert_eq!(config.window.height, 480);
    assert!(!config.window.title.is_empty());
    assert_eq!(config.pacing.scroll_speed, 24.0);
    assert!(!config.buffers.recycle);
}

#[test]
fn test_configuration_serialization_roundtrip() -> Result<()> {
    let original_config = TesseraConfig::default();

    // Serialize to TOML
    let toml_string = toml::to_string(&original_config)?;

    // Deserialize back
    let deserialized_config: TesseraConfig = toml::from_str(&toml_string)?;

    assert_eq!(original_config.window, deserialized_config.window);
    assert_eq!(original_config.pacing, deserialized_config.pacing);
    assert_eq!(original_config.buffers, deserialized_config.buffers);

    Ok(())
}

#[test]
fn test_configuration_from_file() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("test_config.toml");

    // Write test configuration
    let test_config = r#"
[window]
title = "checkerboard"
width = 800
height = 600

[pacing]
scroll_speed = 48.0

[buffers]
recycle = true
"#;

    fs::write(&file_path, test_config)?;

    let config = TesseraConfig::load(&file_path)?;
    assert_eq!(config.window.title, "checkerboard");
    assert_eq!(config.window.width, 800);
    assert_eq!(config.window.height, 600);
    assert_eq!(config.pacing.scroll_speed, 48.0);
    assert!(config.buffers.recycle);

    Ok(())
}

#[test]
fn test_partial_file_fills_defaults() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("partial.toml");

    fs::write(&file_path, "[window]\ntitle = \"small\"\nwidth = 320\nheight = 240\n")?;

    let config = TesseraConfig::load(&file_path)?;
    assert_eq!(config.window.width, 320);

    // Unmentioned sections keep their defaults
    assert_eq!(config.pacing.scroll_speed, 24.0);
    assert!(!config.buffers.recycle);

    Ok(())
}

#[test]
fn test_zero_extent_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("bad.toml");

    fs::write(
        &file_path,
        "[window]\ntitle = \"flat\"\nwidth = 0\nheight = 480\n",
    )?;

    assert!(TesseraConfig::load(&file_path).is_err());

    Ok(())
}

#[test]
fn test_invalid_scroll_speed_is_rejected() {
    let mut config = TesseraConfig::default();
    config.pacing.scroll_speed = 0.0;
    assert!(config.validate().is_err());

    config.pacing.scroll_speed = -3.0;
    assert!(config.validate().is_err());

    config.pacing.scroll_speed = f64::NAN;
    assert!(config.validate().is_err());
}

#[test]
fn test_save_and_reload() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("saved.toml");

    let mut config = TesseraConfig::default();
    config.window.title = "saved".to_string();
    config.buffers.recycle = true;
    config.save(&file_path)?;

    let reloaded = TesseraConfig::load(&file_path)?;
    assert_eq!(reloaded.window.title, "saved");
    assert!(reloaded.buffers.recycle);

    Ok(())
}

#[test]
fn test_missing_file_is_an_error() {
    let result = TesseraConfig::load("/nonexistent/path/tessera.toml");
    assert!(result.is_err());
}
