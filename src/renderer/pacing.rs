//! Redraw cadence bookkeeping.
//!
//! The compositor paces redraws through one-shot frame callbacks: at most one
//! may be outstanding per surface, and a new one is requested only after the
//! previous one fired. [`FrameClock`] owns that single-flight state and turns
//! fired callback timestamps into animation phase advancement.

/// Tracks the outstanding frame callback and the animation phase.
#[derive(Debug)]
pub struct FrameClock {
    /// Phase units advanced per second of callback time.
    rate: f64,
    /// Accumulated animation phase.
    phase: f64,
    /// Whether a requested callback has not fired yet.
    pending: bool,
    /// Timestamp of the previous firing, if any.
    last_tick: Option<u32>,
}

impl FrameClock {
    /// Creates a clock advancing `rate` phase units per second.
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            phase: 0.0,
            pending: false,
            last_tick: None,
        }
    }

    /// Claims the right to request the next frame callback.
    ///
    /// Returns false while a previous callback is still in flight, keeping
    /// the chain strictly one deep.
    pub fn try_arm(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    /// Records a fired callback and returns the updated phase.
    ///
    /// The first firing has no predecessor and does not advance the phase.
    /// Timestamps are millisecond counters that wrap at the u32 boundary.
    pub fn fired(&mut self, tick_ms: u32) -> f64 {
        self.pending = false;
        if let Some(last) = self.last_tick {
            let elapsed = tick_ms.wrapping_sub(last);
            self.phase += self.rate * f64::from(elapsed) / 1000.0;
        }
        self.last_tick = Some(tick_ms);
        self.phase
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn in_flight(&self) -> bool {
        self.pending
    }
}
