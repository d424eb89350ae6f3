//! # Tessera - Wayland Checkerboard Client
//!
//! Connects to the running compositor, negotiates a toplevel window and
//! paints a scrolling checkerboard into shared-memory buffers, redrawing in
//! step with the compositor's frame callbacks.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use tessera::{Session, TesseraConfig};

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "A minimal Wayland client that paints a scrolling checkerboard through shared memory")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/tessera/tessera.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Window title
    #[arg(short, long)]
    title: Option<String>,

    /// Window width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Window height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Checkerboard scroll speed in pattern units per second
    #[arg(long)]
    scroll_speed: Option<f64>,

    /// Reuse released buffers instead of destroying them
    #[arg(long)]
    recycle_buffers: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    info!("🚀 Starting Tessera - Wayland checkerboard client");
    info!(
        "📄 Version: {} ({}, built {})",
        tessera::VERSION,
        env!("GIT_COMMIT"),
        env!("BUILD_DATE")
    );

    // Load configuration
    let mut config = match TesseraConfig::load(&cli.config) {
        Ok(config) => {
            info!("✅ Configuration loaded from: {}", cli.config);
            config
        }
        Err(e) => {
            error!("❌ Failed to load configuration: {}", e);
            info!("📝 Using default configuration");
            TesseraConfig::default()
        }
    };

    // Override config with CLI flags
    if let Some(title) = cli.title {
        config.window.title = title;
    }
    if let Some(width) = cli.width {
        config.window.width = width;
    }
    if let Some(height) = cli.height {
        config.window.height = height;
    }
    if let Some(scroll_speed) = cli.scroll_speed {
        config.pacing.scroll_speed = scroll_speed;
    }
    if cli.recycle_buffers {
        config.buffers.recycle = true;
        info!("♻️ Reusing released buffers via CLI flag");
    }
    config
        .validate()
        .context("Invalid configuration after CLI overrides")?;

    let mut session =
        Session::establish(&config).context("Failed to establish the Wayland session")?;
    info!("✨ Tessera is ready! Close the window to quit.");

    session.run()?;

    info!("👋 Tessera shutting down");
    Ok(())
}
