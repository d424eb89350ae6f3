//! Failure taxonomy for the client.
//!
//! Everything that can go wrong during registry negotiation, shared-memory
//! allocation, and event dispatch funnels into [`ClientError`]. Startup
//! failures are fatal; allocation failures during the redraw loop are not
//! (the frame is skipped and the loop keeps running).

use thiserror::Error;
use wayland_client::{ConnectError, DispatchError};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The compositor socket could not be reached.
    #[error("failed to reach the compositor: {0}")]
    ConnectFailed(#[from] ConnectError),

    /// A mandatory global was not advertised by the registry.
    #[error("compositor does not advertise {0}")]
    MissingCapability(&'static str),

    /// Shared memory could not be created, sized, or mapped.
    #[error("shared memory allocation failed: {0}")]
    AllocationFailed(#[source] std::io::Error),

    /// Every randomized shm name collided with an existing object.
    #[error("could not reserve a unique shm name after {0} attempts")]
    NameExhaustion(u32),

    /// The server sent something the protocol does not allow.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Event dispatch failed below the protocol layer.
    #[error("event dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}
