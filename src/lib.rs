//! # Tessera Wayland Client Library
//!
//! A minimal Wayland client that negotiates a toplevel window and paints a
//! scrolling checkerboard into shared-memory buffers, paced by the
//! compositor's frame callbacks.
//!
//! ## Architecture
//!
//! Tessera is built from small single-purpose modules:
//! - `client`: Session establishment, dispatch loop and the redraw cycle
//! - `registry`: Global discovery and capability binding
//! - `window`: Surface creation and the configure/acknowledge handshake
//! - `buffer`: Shared-memory pixel buffers and their release lifecycle
//! - `renderer`: Frame painting and redraw pacing
//! - `input`: Pointer event aggregation into atomic frames
//! - `shm`: Anonymous shared-memory allocation
//! - `config`: Configuration parsing and management
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tessera::{Session, TesseraConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = TesseraConfig::default();
//!     let mut session = Session::establish(&config)?;
//!     session.run()?;
//!     Ok(())
//! }
//! ```

pub mod buffer;
pub mod client;
pub mod config;
pub mod error;
pub mod input;
pub mod registry;
pub mod renderer;
pub mod shm;
pub mod window;

// Re-export main types for easy access
pub use client::{ClientState, Session};
pub use config::TesseraConfig;
pub use error::ClientError;
pub use input::{PointerEvents, PointerFrame};
pub use renderer::{Checkerboard, FramePainter};
pub use window::ShellRole;

// Re-export common error types
pub use anyhow::{Context, Error, Result};

/// Version information for Tessera
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
