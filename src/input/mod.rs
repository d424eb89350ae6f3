//! Pointer input aggregation.
//!
//! Pointer state arrives fragmented: enter, leave, motion, button and axis
//! sub-events each carry one facet, and a terminating `frame` signal marks
//! the preceding group as one logically atomic hardware event. Sub-events
//! accumulate into a [`PointerFrame`]; the frame signal takes the record
//! whole and leaves the accumulator reset, so no frame ever bleeds into the
//! next.

use std::fmt;
use std::mem;

use bitflags::bitflags;
use log::{debug, warn};
use wayland_client::protocol::wl_pointer::{self, WlPointer};
use wayland_client::protocol::wl_seat::{self, WlSeat};
use wayland_client::{Connection, Dispatch, QueueHandle, WEnum};

use crate::client::ClientState;

/// Vertical scroll axis slot.
pub const VERTICAL: usize = 0;
/// Horizontal scroll axis slot.
pub const HORIZONTAL: usize = 1;

bitflags! {
    /// Which sub-events contributed to the frame being accumulated.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PointerEvents: u32 {
        const ENTER = 1 << 0;
        const LEAVE = 1 << 1;
        const MOTION = 1 << 2;
        const BUTTON = 1 << 3;
        const AXIS = 1 << 4;
        const AXIS_SOURCE = 1 << 5;
        const AXIS_STOP = 1 << 6;
        const AXIS_DISCRETE = 1 << 7;
    }
}

/// Accumulated scroll state for one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisMotion {
    pub valid: bool,
    pub value: f64,
    pub discrete: i32,
}

/// What kind of device produced a scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollSource {
    Wheel,
    Finger,
    Continuous,
    WheelTilt,
}

impl fmt::Display for ScrollSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScrollSource::Wheel => "wheel",
            ScrollSource::Finger => "finger",
            ScrollSource::Continuous => "continuous",
            ScrollSource::WheelTilt => "wheel tilt",
        };
        f.write_str(name)
    }
}

/// One in-progress pointer frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerFrame {
    pub events: PointerEvents,
    pub serial: u32,
    pub time: u32,
    pub surface_x: f64,
    pub surface_y: f64,
    pub button: u32,
    pub pressed: bool,
    pub axes: [AxisMotion; 2],
    pub source: Option<ScrollSource>,
}

impl PointerFrame {
    pub fn enter(&mut self, serial: u32, x: f64, y: f64) {
        self.events |= PointerEvents::ENTER;
        self.serial = serial;
        self.surface_x = x;
        self.surface_y = y;
    }

    pub fn leave(&mut self, serial: u32) {
        self.events |= PointerEvents::LEAVE;
        self.serial = serial;
    }

    pub fn motion(&mut self, time: u32, x: f64, y: f64) {
        self.events |= PointerEvents::MOTION;
        self.time = time;
        self.surface_x = x;
        self.surface_y = y;
    }

    pub fn button(&mut self, serial: u32, time: u32, button: u32, pressed: bool) {
        self.events |= PointerEvents::BUTTON;
        self.serial = serial;
        self.time = time;
        self.button = button;
        self.pressed = pressed;
    }

    /// Records continuous scroll on an axis.
    ///
    /// Returns false when the axis slot does not exist.
    pub fn axis(&mut self, time: u32, index: usize, value: f64) -> bool {
        match self.axes.get_mut(index) {
            Some(slot) => {
                slot.valid = true;
                slot.value = value;
                self.time = time;
                self.events |= PointerEvents::AXIS;
                true
            }
            None => false,
        }
    }

    pub fn axis_source(&mut self, source: ScrollSource) {
        self.events |= PointerEvents::AXIS_SOURCE;
        self.source = Some(source);
    }

    pub fn axis_stop(&mut self, time: u32, index: usize) -> bool {
        match self.axes.get_mut(index) {
            Some(slot) => {
                slot.valid = true;
                self.time = time;
                self.events |= PointerEvents::AXIS_STOP;
                true
            }
            None => false,
        }
    }

    pub fn axis_discrete(&mut self, index: usize, steps: i32) -> bool {
        match self.axes.get_mut(index) {
            Some(slot) => {
                slot.valid = true;
                slot.discrete = steps;
                self.events |= PointerEvents::AXIS_DISCRETE;
                true
            }
            None => false,
        }
    }

    /// Takes the accumulated frame, leaving the accumulator reset.
    pub fn take(&mut self) -> PointerFrame {
        mem::take(self)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl fmt::Display for PointerFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pointer frame @ {}:", self.time)?;
        if self.events.contains(PointerEvents::ENTER) {
            write!(f, " entered {}, {}", self.surface_x, self.surface_y)?;
        }
        if self.events.contains(PointerEvents::LEAVE) {
            write!(f, " leave")?;
        }
        if self.events.contains(PointerEvents::MOTION) {
            write!(f, " motion {}, {}", self.surface_x, self.surface_y)?;
        }
        if self.events.contains(PointerEvents::BUTTON) {
            let action = if self.pressed { "pressed" } else { "released" };
            write!(f, " button {} {}", self.button, action)?;
        }
        for (index, axis) in self.axes.iter().enumerate() {
            if !axis.valid {
                continue;
            }
            let which = if index == VERTICAL {
                "vertical"
            } else {
                "horizontal"
            };
            write!(f, " {which} axis")?;
            if self.events.contains(PointerEvents::AXIS) {
                write!(f, " value {}", axis.value)?;
            }
            if self.events.contains(PointerEvents::AXIS_DISCRETE) {
                write!(f, " discrete {}", axis.discrete)?;
            }
            if self.events.contains(PointerEvents::AXIS_SOURCE) {
                if let Some(source) = self.source {
                    write!(f, " via {source}")?;
                }
            }
            if self.events.contains(PointerEvents::AXIS_STOP) {
                write!(f, " (stopped)")?;
            }
        }
        Ok(())
    }
}

/// The pointer device, if the seat currently offers one, plus its
/// accumulator.
#[derive(Debug, Default)]
pub struct PointerState {
    device: Option<WlPointer>,
    pub frame: PointerFrame,
}

impl PointerState {
    /// Requests the pointer when the seat gains the capability. No-op if
    /// already listening.
    pub fn attach(&mut self, seat: &WlSeat, qh: &QueueHandle<ClientState>) {
        if self.device.is_none() {
            debug!("listening to pointer");
            self.device = Some(seat.get_pointer(qh, ()));
        }
    }

    /// Releases the pointer when the capability is lost. No-op if already
    /// detached. Drops anything mid-accumulation.
    pub fn detach(&mut self) {
        if let Some(device) = self.device.take() {
            debug!("pointer released");
            device.release();
            self.frame = PointerFrame::default();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.device.is_some()
    }
}

impl Drop for PointerState {
    fn drop(&mut self) {
        self.detach();
    }
}

fn axis_index(axis: WEnum<wl_pointer::Axis>) -> Option<usize> {
    match axis {
        WEnum::Value(wl_pointer::Axis::VerticalScroll) => Some(VERTICAL),
        WEnum::Value(wl_pointer::Axis::HorizontalScroll) => Some(HORIZONTAL),
        _ => None,
    }
}

fn scroll_source(source: wl_pointer::AxisSource) -> Option<ScrollSource> {
    match source {
        wl_pointer::AxisSource::Wheel => Some(ScrollSource::Wheel),
        wl_pointer::AxisSource::Finger => Some(ScrollSource::Finger),
        wl_pointer::AxisSource::Continuous => Some(ScrollSource::Continuous),
        wl_pointer::AxisSource::WheelTilt => Some(ScrollSource::WheelTilt),
        _ => None,
    }
}

impl Dispatch<WlSeat, ()> for ClientState {
    fn event(
        state: &mut Self,
        seat: &WlSeat,
        event: wl_seat::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_seat::Event::Capabilities { capabilities } => match capabilities {
                WEnum::Value(caps) => {
                    if caps.contains(wl_seat::Capability::Pointer) {
                        state.pointer.attach(seat, qh);
                    } else {
                        state.pointer.detach();
                    }
                }
                WEnum::Unknown(raw) => warn!("unknown seat capabilities {raw:#x}"),
            },
            wl_seat::Event::Name { name } => {
                debug!("seat name: {name}");
            }
            _ => {}
        }
    }
}

impl Dispatch<WlPointer, ()> for ClientState {
    fn event(
        state: &mut Self,
        _: &WlPointer,
        event: wl_pointer::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            wl_pointer::Event::Enter {
                serial,
                surface_x,
                surface_y,
                ..
            } => {
                state.pointer.frame.enter(serial, surface_x, surface_y);
            }
            wl_pointer::Event::Leave { serial, .. } => {
                state.pointer.frame.leave(serial);
            }
            wl_pointer::Event::Motion {
                time,
                surface_x,
                surface_y,
            } => {
                state.pointer.frame.motion(time, surface_x, surface_y);
            }
            wl_pointer::Event::Button {
                serial,
                time,
                button,
                state: button_state,
            } => {
                let pressed =
                    matches!(button_state, WEnum::Value(wl_pointer::ButtonState::Pressed));
                state.pointer.frame.button(serial, time, button, pressed);
            }
            wl_pointer::Event::Axis { time, axis, value } => match axis_index(axis) {
                Some(index) => {
                    state.pointer.frame.axis(time, index, value);
                }
                None => state.protocol_violation(format!("scroll on unknown axis {axis:?}")),
            },
            wl_pointer::Event::AxisSource { axis_source } => match axis_source {
                WEnum::Value(source) => match scroll_source(source) {
                    Some(source) => state.pointer.frame.axis_source(source),
                    None => debug!("unhandled axis source {source:?}"),
                },
                WEnum::Unknown(raw) => debug!("unknown axis source {raw}"),
            },
            wl_pointer::Event::AxisStop { time, axis } => match axis_index(axis) {
                Some(index) => {
                    state.pointer.frame.axis_stop(time, index);
                }
                None => state.protocol_violation(format!("axis stop on unknown axis {axis:?}")),
            },
            wl_pointer::Event::AxisDiscrete { axis, discrete } => match axis_index(axis) {
                Some(index) => {
                    state.pointer.frame.axis_discrete(index, discrete);
                }
                None => {
                    state.protocol_violation(format!("discrete scroll on unknown axis {axis:?}"))
                }
            },
            wl_pointer::Event::Frame => {
                // Emitted even when empty, exactly once per frame signal.
                let frame = state.pointer.frame.take();
                debug!("{frame}");
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_and_button_form_one_atomic_frame() {
        let mut frame = PointerFrame::default();
        frame.motion(1, 10.0, 20.0);
        frame.button(3, 1, 1, true);

        let taken = frame.take();
        assert_eq!(
            taken.events,
            PointerEvents::MOTION | PointerEvents::BUTTON
        );
        assert_eq!(taken.surface_x, 10.0);
        assert_eq!(taken.surface_y, 20.0);
        assert_eq!(taken.button, 1);
        assert!(taken.pressed);

        // The accumulator is fully reset afterwards.
        assert_eq!(frame, PointerFrame::default());
        assert!(frame.is_empty());
    }

    #[test]
    fn test_axis_marks_slot_valid() {
        let mut frame = PointerFrame::default();
        assert!(frame.axis(5, VERTICAL, 2.5));
        assert!(frame.axes[VERTICAL].valid);
        assert_eq!(frame.axes[VERTICAL].value, 2.5);
        assert!(!frame.axes[HORIZONTAL].valid);
        assert!(frame.events.contains(PointerEvents::AXIS));
    }

    #[test]
    fn test_out_of_range_axis_is_rejected() {
        let mut frame = PointerFrame::default();
        assert!(!frame.axis(5, 2, 1.0));
        assert!(!frame.axis_stop(5, 2));
        assert!(!frame.axis_discrete(2, 1));
        assert!(frame.is_empty(), "rejected sub-events must not accumulate");
    }

    #[test]
    fn test_axis_stop_and_discrete_mark_validity() {
        let mut frame = PointerFrame::default();
        assert!(frame.axis_stop(7, HORIZONTAL));
        assert!(frame.axis_discrete(VERTICAL, -1));
        assert!(frame.axes[HORIZONTAL].valid);
        assert!(frame.axes[VERTICAL].valid);
        assert_eq!(frame.axes[VERTICAL].discrete, -1);
        assert!(frame
            .events
            .contains(PointerEvents::AXIS_STOP | PointerEvents::AXIS_DISCRETE));
    }

    #[test]
    fn test_display_mirrors_accumulated_parts() {
        let mut frame = PointerFrame::default();
        frame.enter(2, 4.0, 8.0);
        frame.motion(9, 10.0, 20.0);
        frame.axis(9, VERTICAL, 1.5);
        frame.axis_source(ScrollSource::WheelTilt);

        let line = frame.to_string();
        assert!(line.starts_with("pointer frame @ 9:"), "line was {line:?}");
        assert!(line.contains("entered 4, 8"));
        assert!(line.contains("motion 10, 20"));
        assert!(line.contains("vertical axis value 1.5"));
        assert!(line.contains("via wheel tilt"));
        assert!(!line.contains("horizontal"));
    }

    #[test]
    fn test_empty_frame_still_renders_header() {
        let frame = PointerFrame::default();
        assert_eq!(frame.to_string(), "pointer frame @ 0:");
    }

    #[test]
    fn test_detach_without_device_is_noop() {
        let mut pointer = PointerState::default();
        assert!(!pointer.is_attached());
        pointer.detach();
        assert!(!pointer.is_attached());
    }
}
