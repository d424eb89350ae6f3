//! Surface creation and shell-role negotiation.
//!
//! A bare surface becomes a window by taking the xdg toplevel role. The
//! compositor then drives a configure/acknowledge handshake: every configure
//! carries a serial the client must ack before its next buffer commit counts.
//! [`ShellRole`] tracks that handshake; nothing commits a buffer until it
//! reports the surface ready.

use log::{debug, trace};
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{delegate_noop, Connection, Dispatch, QueueHandle};
use wayland_protocols::xdg::shell::client::xdg_surface::{self, XdgSurface};
use wayland_protocols::xdg::shell::client::xdg_toplevel::{self, XdgToplevel};
use wayland_protocols::xdg::shell::client::xdg_wm_base::{self, XdgWmBase};

use crate::client::ClientState;

/// Where the surface stands in the configure/acknowledge handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolePhase {
    /// No configure received yet; the surface may not carry a buffer.
    Unconfigured,
    /// A configure with this serial awaits acknowledgement.
    ConfigurePending(u32),
    /// The latest configure was acked; buffer commits are valid.
    Acknowledged,
    /// At least one buffer was committed under the current configure.
    Committed,
    /// The compositor asked the window to close. Terminal.
    Closed,
}

/// What an acknowledgement changed.
#[derive(Debug, Clone, Copy)]
pub struct ConfigureOutcome {
    /// This was the first configure of the surface's lifetime.
    pub first: bool,
    /// The acknowledged configure applied a new extent.
    pub resized: bool,
}

/// State machine for one toplevel surface.
#[derive(Debug)]
pub struct ShellRole {
    phase: RolePhase,
    pending_extent: Option<(u32, u32)>,
    extent: (u32, u32),
    acked_serial: Option<u32>,
}

impl ShellRole {
    pub fn new(extent: (u32, u32)) -> Self {
        Self {
            phase: RolePhase::Unconfigured,
            pending_extent: None,
            extent,
            acked_serial: None,
        }
    }

    /// Records the compositor's size proposal for the next acknowledge.
    ///
    /// A zero or negative extent means "no geometry constraint" and is
    /// ignored, as is a proposal equal to the current extent.
    pub fn offer_extent(&mut self, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            return;
        }
        let offered = (width as u32, height as u32);
        if offered != self.extent {
            self.pending_extent = Some(offered);
        }
    }

    /// Notes a configure serial awaiting acknowledgement.
    pub fn configure(&mut self, serial: u32) {
        if self.phase == RolePhase::Closed {
            trace!("configure {serial} after close, ignored");
            return;
        }
        self.phase = RolePhase::ConfigurePending(serial);
    }

    /// Acknowledges the pending configure, applying any pending extent.
    ///
    /// Returns `None` unless a configure was actually pending.
    pub fn acknowledge(&mut self) -> Option<ConfigureOutcome> {
        let serial = match self.phase {
            RolePhase::ConfigurePending(serial) => serial,
            _ => return None,
        };
        let first = self.acked_serial.is_none();
        let resized = match self.pending_extent.take() {
            Some(extent) => {
                self.extent = extent;
                true
            }
            None => false,
        };
        self.acked_serial = Some(serial);
        self.phase = RolePhase::Acknowledged;
        Some(ConfigureOutcome { first, resized })
    }

    /// Marks that a buffer was committed under the acknowledged configure.
    pub fn mark_committed(&mut self) {
        if matches!(self.phase, RolePhase::Acknowledged | RolePhase::Committed) {
            self.phase = RolePhase::Committed;
        }
    }

    /// Whether buffer commits are currently valid.
    pub fn ready(&self) -> bool {
        matches!(self.phase, RolePhase::Acknowledged | RolePhase::Committed)
    }

    pub fn request_close(&mut self) {
        self.phase = RolePhase::Closed;
    }

    pub fn is_closed(&self) -> bool {
        self.phase == RolePhase::Closed
    }

    pub fn phase(&self) -> RolePhase {
        self.phase
    }

    pub fn extent(&self) -> (u32, u32) {
        self.extent
    }

    pub fn acked_serial(&self) -> Option<u32> {
        self.acked_serial
    }
}

/// The protocol objects making up one toplevel window.
#[derive(Debug)]
pub struct Window {
    toplevel: XdgToplevel,
    xdg_surface: XdgSurface,
    surface: WlSurface,
}

impl Window {
    /// Creates the surface, gives it the toplevel role and commits once.
    ///
    /// The initial commit carries no buffer; it prompts the compositor to
    /// send the first configure.
    pub fn create(
        compositor: &WlCompositor,
        wm_base: &XdgWmBase,
        qh: &QueueHandle<ClientState>,
        title: &str,
    ) -> Window {
        let surface = compositor.create_surface(qh, ());
        let xdg_surface = wm_base.get_xdg_surface(&surface, qh, ());
        let toplevel = xdg_surface.get_toplevel(qh, ());
        toplevel.set_title(title.to_owned());
        surface.commit();
        Window {
            toplevel,
            xdg_surface,
            surface,
        }
    }

    pub fn surface(&self) -> &WlSurface {
        &self.surface
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        // Role objects must go before the surface they wrap.
        self.toplevel.destroy();
        self.xdg_surface.destroy();
        self.surface.destroy();
    }
}

impl Dispatch<XdgWmBase, ()> for ClientState {
    fn event(
        _: &mut Self,
        wm_base: &XdgWmBase,
        event: xdg_wm_base::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            trace!("pong {serial}");
            wm_base.pong(serial);
        }
    }
}

impl Dispatch<XdgSurface, ()> for ClientState {
    fn event(
        state: &mut Self,
        xdg_surface: &XdgSurface,
        event: xdg_surface::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            state.shell.configure(serial);
            if let Some(outcome) = state.shell.acknowledge() {
                // The ack must reach the wire before the commit below.
                xdg_surface.ack_configure(serial);
                if outcome.first {
                    debug!("surface configured, extent {:?}", state.shell.extent());
                } else if outcome.resized {
                    debug!("extent now {:?}", state.shell.extent());
                }
                state.redraw(qh);
            }
        }
    }
}

impl Dispatch<XdgToplevel, ()> for ClientState {
    fn event(
        state: &mut Self,
        _: &XdgToplevel,
        event: xdg_toplevel::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            xdg_toplevel::Event::Configure { width, height, .. } => {
                state.shell.offer_extent(width, height);
            }
            xdg_toplevel::Event::Close => {
                debug!("close requested");
                state.shell.request_close();
            }
            _ => {}
        }
    }
}

delegate_noop!(ClientState: WlCompositor);
delegate_noop!(ClientState: ignore WlSurface);
