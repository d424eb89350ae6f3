//! Registry discovery and capability binding.
//!
//! The registry announces every global the compositor offers; this module
//! classifies the four this client uses, binds each at most once at a fixed
//! protocol version, and verifies after the initial roundtrip that the
//! mandatory ones are present. Globals that disappear mid-session are noted
//! and otherwise ignored.

use log::{debug, trace};
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::protocol::wl_registry::{self, WlRegistry};
use wayland_client::protocol::wl_seat::WlSeat;
use wayland_client::protocol::wl_shm::WlShm;
use wayland_client::{Connection, Dispatch, QueueHandle};
use wayland_protocols::xdg::shell::client::xdg_wm_base::XdgWmBase;

use crate::client::ClientState;
use crate::error::ClientError;

/// The globals this client knows how to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalKind {
    Compositor,
    Shm,
    WmBase,
    Seat,
}

/// Everything the client can bind.
const NEEDED: [GlobalKind; 4] = [
    GlobalKind::Compositor,
    GlobalKind::Shm,
    GlobalKind::WmBase,
    GlobalKind::Seat,
];

/// Globals the client cannot start without.
const MANDATORY: [GlobalKind; 2] = [GlobalKind::Compositor, GlobalKind::WmBase];

impl GlobalKind {
    /// Wire name of the interface.
    pub const fn interface(self) -> &'static str {
        match self {
            GlobalKind::Compositor => "wl_compositor",
            GlobalKind::Shm => "wl_shm",
            GlobalKind::WmBase => "xdg_wm_base",
            GlobalKind::Seat => "wl_seat",
        }
    }

    /// Version requested at bind time. Fixed per capability, not negotiated
    /// from the advertisement.
    pub const fn version(self) -> u32 {
        match self {
            GlobalKind::Compositor => 4,
            GlobalKind::Shm => 1,
            GlobalKind::WmBase => 1,
            GlobalKind::Seat => 5,
        }
    }

    fn classify(interface: &str) -> Option<Self> {
        NEEDED.into_iter().find(|kind| kind.interface() == interface)
    }
}

/// One advertised global this client classified.
#[derive(Debug, Clone, Copy)]
pub struct GlobalEntry {
    pub name: u32,
    pub kind: GlobalKind,
    pub advertised: u32,
}

/// Record of the classified globals the registry has advertised so far.
#[derive(Debug, Default)]
pub struct GlobalDirectory {
    entries: Vec<GlobalEntry>,
}

impl GlobalDirectory {
    /// Classifies and records an advertisement.
    ///
    /// Returns the kind when it should be bound. Repeat advertisements keep
    /// the first entry; each capability binds at most once.
    pub fn record(&mut self, name: u32, interface: &str, advertised: u32) -> Option<GlobalKind> {
        let kind = match GlobalKind::classify(interface) {
            Some(kind) => kind,
            None => {
                trace!("unused global: {interface} v{advertised} (name {name})");
                return None;
            }
        };
        if self.lookup(kind).is_some() {
            debug!("ignoring duplicate {interface} advertisement (name {name})");
            return None;
        }
        self.entries.push(GlobalEntry {
            name,
            kind,
            advertised,
        });
        Some(kind)
    }

    pub fn lookup(&self, kind: GlobalKind) -> Option<&GlobalEntry> {
        self.entries.iter().find(|entry| entry.kind == kind)
    }

    /// Forgets a removed global, returning what it was.
    pub fn remove(&mut self, name: u32) -> Option<GlobalKind> {
        let index = self.entries.iter().position(|entry| entry.name == name)?;
        Some(self.entries.remove(index).kind)
    }

    /// Checks that every mandatory capability was advertised.
    pub fn verify(&self) -> Result<(), ClientError> {
        for kind in MANDATORY {
            if self.lookup(kind).is_none() {
                return Err(ClientError::MissingCapability(kind.interface()));
            }
        }
        Ok(())
    }
}

/// Proxies bound from the registry.
///
/// The seat and shell factory are released on drop; the surface factory and
/// shm factory have no release request at the bound versions.
#[derive(Debug, Default)]
pub struct BoundGlobals {
    pub compositor: Option<WlCompositor>,
    pub shm: Option<WlShm>,
    pub wm_base: Option<XdgWmBase>,
    pub seat: Option<WlSeat>,
}

impl Drop for BoundGlobals {
    fn drop(&mut self) {
        if let Some(seat) = self.seat.take() {
            seat.release();
        }
        if let Some(wm_base) = self.wm_base.take() {
            wm_base.destroy();
        }
    }
}

impl Dispatch<WlRegistry, ()> for ClientState {
    fn event(
        state: &mut Self,
        registry: &WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                if let Some(kind) = state.directory.record(name, &interface, version) {
                    debug!("binding {} v{} (name {name})", kind.interface(), kind.version());
                    match kind {
                        GlobalKind::Compositor => {
                            state.globals.compositor =
                                Some(registry.bind(name, kind.version(), qh, ()));
                        }
                        GlobalKind::Shm => {
                            state.globals.shm = Some(registry.bind(name, kind.version(), qh, ()));
                        }
                        GlobalKind::WmBase => {
                            state.globals.wm_base =
                                Some(registry.bind(name, kind.version(), qh, ()));
                        }
                        GlobalKind::Seat => {
                            state.globals.seat = Some(registry.bind(name, kind.version(), qh, ()));
                        }
                    }
                }
            }
            wl_registry::Event::GlobalRemove { name } => {
                // Bookkeeping only; no live capability revocation handling.
                if let Some(kind) = state.directory.remove(name) {
                    debug!("global {} went away (name {name})", kind.interface());
                }
            }
            _ => {}
        }
    }
}
