//! Session establishment and the dispatch loop.
//!
//! Everything runs on one thread: a single blocking dispatch call drains the
//! queue and re-enters the handlers in the other modules. The redraw cycle
//! lives here because it spans them all: shell readiness gates it, the clock
//! paces it, the ledger feeds it buffers, the painter fills them.

use log::{debug, info, trace, warn};
use wayland_client::backend::WaylandError;
use wayland_client::protocol::wl_callback::{self, WlCallback};
use wayland_client::{Connection, Dispatch, DispatchError, EventQueue, QueueHandle};

use crate::buffer::BufferLedger;
use crate::config::TesseraConfig;
use crate::error::ClientError;
use crate::input::PointerState;
use crate::registry::{BoundGlobals, GlobalDirectory};
use crate::renderer::pacing::FrameClock;
use crate::renderer::{Checkerboard, FramePainter};
use crate::window::{ShellRole, Window};

/// All client-side state the event queue dispatches into.
///
/// Field order is teardown order: the pointer releases before the seat goes,
/// the window's role objects before the globals that made them.
pub struct ClientState {
    pub(crate) pointer: PointerState,
    pub(crate) window: Option<Window>,
    pub(crate) buffers: BufferLedger,
    pub(crate) globals: BoundGlobals,
    pub(crate) directory: GlobalDirectory,
    pub(crate) shell: ShellRole,
    pub(crate) clock: FrameClock,
    pub(crate) painter: Box<dyn FramePainter>,
    pub(crate) fatal: Option<ClientError>,
}

impl ClientState {
    pub fn new(config: &TesseraConfig) -> Self {
        Self {
            pointer: PointerState::default(),
            window: None,
            buffers: BufferLedger::new(config.buffers.recycle),
            globals: BoundGlobals::default(),
            directory: GlobalDirectory::default(),
            shell: ShellRole::new((config.window.width, config.window.height)),
            clock: FrameClock::new(config.pacing.scroll_speed),
            painter: Box::new(Checkerboard),
            fatal: None,
        }
    }

    pub fn shell(&self) -> &ShellRole {
        &self.shell
    }

    /// Records a fatal server-side violation for the dispatch loop to
    /// surface on its next turn. The first violation wins.
    pub(crate) fn protocol_violation(&mut self, message: String) {
        warn!("{message}");
        if self.fatal.is_none() {
            self.fatal = Some(ClientError::ProtocolViolation(message));
        }
    }

    /// Paints and commits one frame.
    ///
    /// The next frame callback is requested before the commit; the commit is
    /// what activates it. When buffer acquisition fails the attach is
    /// skipped but the commit still happens, keeping the callback chain
    /// alive with the previous content on screen.
    pub(crate) fn redraw(&mut self, qh: &QueueHandle<Self>) {
        if !self.shell.ready() {
            return;
        }
        let surface = match self.window.as_ref() {
            Some(window) => window.surface().clone(),
            None => return,
        };
        let shm = match self.globals.shm.as_ref() {
            Some(shm) => shm.clone(),
            None => return,
        };

        if self.clock.try_arm() {
            surface.frame(qh, ());
        }

        let (width, height) = self.shell.extent();
        match self.buffers.acquire(&shm, qh, width, height) {
            Ok(mut buffer) => {
                self.painter
                    .paint(buffer.canvas(), width, height, self.clock.phase());
                surface.attach(Some(buffer.wl()), 0, 0);
                surface.damage_buffer(0, 0, i32::MAX, i32::MAX);
                self.buffers.submit(buffer);
            }
            Err(err) => {
                warn!("frame skipped: {err}");
            }
        }
        surface.commit();
        self.shell.mark_committed();
    }
}

impl Dispatch<WlCallback, ()> for ClientState {
    fn event(
        state: &mut Self,
        _: &WlCallback,
        event: wl_callback::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let wl_callback::Event::Done { callback_data } = event {
            let phase = state.clock.fired(callback_data);
            trace!("frame callback @ {callback_data}, phase {phase:.3}");
            state.redraw(qh);
        }
    }
}

/// An established connection with a mapped window.
pub struct Session {
    state: ClientState,
    queue: EventQueue<ClientState>,
    conn: Connection,
}

impl Session {
    /// Connects to the compositor, binds the needed globals and sets up the
    /// window.
    ///
    /// The registry roundtrip completes before capabilities are verified, so
    /// every global advertised up front has been seen. Missing mandatory
    /// capabilities fail here; no window is created in that case.
    pub fn establish(config: &TesseraConfig) -> Result<Self, ClientError> {
        let conn = Connection::connect_to_env()?;
        let display = conn.display();

        let mut queue = conn.new_event_queue();
        let qh = queue.handle();

        let mut state = ClientState::new(config);
        let _registry = display.get_registry(&qh, ());
        queue.roundtrip(&mut state)?;

        state.directory.verify()?;
        let compositor = state
            .globals
            .compositor
            .clone()
            .ok_or(ClientError::MissingCapability("wl_compositor"))?;
        let wm_base = state
            .globals
            .wm_base
            .clone()
            .ok_or(ClientError::MissingCapability("xdg_wm_base"))?;
        if state.globals.shm.is_none() {
            return Err(ClientError::MissingCapability("wl_shm"));
        }

        let window = Window::create(&compositor, &wm_base, &qh, &config.window.title);
        // The creation commit was bare; the callback requested here becomes
        // active at the first buffer commit.
        if state.clock.try_arm() {
            window.surface().frame(&qh, ());
        }
        state.window = Some(window);

        debug!("session established, awaiting first configure");
        Ok(Self { state, queue, conn })
    }

    /// Dispatches events until the window closes or the connection ends.
    ///
    /// A severed connection is a graceful exit; a protocol error from the
    /// server is not.
    pub fn run(&mut self) -> Result<(), ClientError> {
        loop {
            if let Some(err) = self.state.fatal.take() {
                return Err(err);
            }
            if self.state.shell.is_closed() {
                info!("window closed");
                return Ok(());
            }
            match self.queue.blocking_dispatch(&mut self.state) {
                Ok(_) => {}
                Err(DispatchError::Backend(WaylandError::Io(err))) => {
                    info!("connection closed: {err}");
                    return Ok(());
                }
                Err(DispatchError::Backend(WaylandError::Protocol(err))) => {
                    return Err(ClientError::ProtocolViolation(err.to_string()));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Dispatches one batch of events, blocking until at least one arrives.
    pub fn dispatch_once(&mut self) -> Result<usize, ClientError> {
        Ok(self.queue.blocking_dispatch(&mut self.state)?)
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
