//! Single-pointer drag state machine.
//!
//! The controller only turns input into [`GestureEffect`]s; applying them
//! (pointer capture, cursor, window updates) belongs to the caller, so the
//! same transitions work for callback, polled, or test-driven input.

use derive_more::Display;
use strum::{AsRefStr, EnumIter, EnumString, IntoStaticStr};

use crate::config::GestureConfig;
use crate::domain::window::DragDelta;

/// Input kinds, named after the DOM events they come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, IntoStaticStr, EnumIter)]
pub enum PointerEventKind {
    #[display(fmt = "down")]
    #[strum(serialize = "pointerdown")]
    Down,
    #[display(fmt = "move")]
    #[strum(serialize = "pointermove")]
    Move,
    #[display(fmt = "up")]
    #[strum(serialize = "pointerup")]
    Up,
    #[display(fmt = "cancel")]
    #[strum(serialize = "pointercancel")]
    Cancel,
    #[display(fmt = "leave")]
    #[strum(serialize = "pointerleave")]
    Leave,
    #[display(fmt = "double-click")]
    #[strum(serialize = "dblclick")]
    DoubleClick,
}

impl PointerEventKind {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Up | Self::Cancel | Self::Leave)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum PointerKind {
    #[default]
    #[display(fmt = "mouse")]
    #[strum(serialize = "mouse")]
    Mouse,
    #[display(fmt = "pen")]
    #[strum(serialize = "pen")]
    Pen,
    #[display(fmt = "touch")]
    #[strum(serialize = "touch")]
    Touch,
}

/// Cursor affordance shown over an attached plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum Cursor {
    #[display(fmt = "grab")]
    #[strum(serialize = "grab")]
    Grab,
    #[display(fmt = "grabbing")]
    #[strum(serialize = "grabbing")]
    Grabbing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub pointer_id: i32,
    pub kind: PointerKind,
    pub x: f64,
    pub y: f64,
    /// Event timestamp in milliseconds.
    pub time_ms: f64,
}

impl PointerSample {
    pub fn new(pointer_id: i32, kind: PointerKind, x: f64, y: f64, time_ms: f64) -> Self {
        Self { pointer_id, kind, x, y, time_ms }
    }

    pub fn mouse(x: f64, y: f64) -> Self {
        Self::new(1, PointerKind::Mouse, x, y, 0.0)
    }

    fn distance_to(&self, x: f64, y: f64) -> f64 {
        (self.x - x).hypot(self.y - y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureInput {
    pub event: PointerEventKind,
    pub sample: PointerSample,
}

impl GestureInput {
    pub fn new(event: PointerEventKind, sample: PointerSample) -> Self {
        Self { event, sample }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging {
        pointer_id: i32,
        last_x: f64,
        last_y: f64,
    },
}

/// What the caller has to do in response to one input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEffect {
    Ignored,
    /// Capture `pointer_id` and show [`Cursor::Grabbing`].
    DragStarted { pointer_id: i32 },
    /// Apply the delta to the window and re-render.
    Dragged(DragDelta),
    /// Restore [`Cursor::Grab`]; `double_tap` also asks for a reset.
    DragEnded { double_tap: bool },
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tap {
    x: f64,
    y: f64,
    time_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GestureController {
    state: GestureState,
    double_tap_ms: f64,
    double_tap_slop_px: f64,
    // where the active drag started, for tap detection
    origin: Option<PointerSample>,
    travelled: f64,
    last_tap: Option<Tap>,
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new(&GestureConfig::default())
    }
}

impl GestureController {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            state: GestureState::Idle,
            double_tap_ms: config.double_tap_ms,
            double_tap_slop_px: config.double_tap_slop_px,
            origin: None,
            travelled: 0.0,
            last_tap: None,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    pub fn handle(&mut self, input: GestureInput) -> GestureEffect {
        let sample = input.sample;
        match (input.event, self.state) {
            (PointerEventKind::DoubleClick, _) => GestureEffect::Reset,

            (PointerEventKind::Down, GestureState::Idle) => {
                self.state = GestureState::Dragging {
                    pointer_id: sample.pointer_id,
                    last_x: sample.x,
                    last_y: sample.y,
                };
                self.origin = Some(sample);
                self.travelled = 0.0;
                GestureEffect::DragStarted { pointer_id: sample.pointer_id }
            }
            // one active pointer at a time
            (PointerEventKind::Down, GestureState::Dragging { .. }) => GestureEffect::Ignored,

            (PointerEventKind::Move, GestureState::Dragging { pointer_id, last_x, last_y })
                if pointer_id == sample.pointer_id =>
            {
                let delta = DragDelta::new(sample.x - last_x, sample.y - last_y);
                self.state = GestureState::Dragging { pointer_id, last_x: sample.x, last_y: sample.y };
                self.travelled = self.travelled.max(
                    self.origin.map_or(0.0, |origin| origin.distance_to(sample.x, sample.y)),
                );
                GestureEffect::Dragged(delta)
            }

            (event, GestureState::Dragging { pointer_id, .. })
                if event.is_terminal() && pointer_id == sample.pointer_id =>
            {
                self.state = GestureState::Idle;
                let double_tap = self.finish_tap(sample);
                GestureEffect::DragEnded { double_tap }
            }

            _ => GestureEffect::Ignored,
        }
    }

    /// Records a completed tap and reports whether it closes a double tap.
    /// Mouse input is left to the native double-click event.
    fn finish_tap(&mut self, end: PointerSample) -> bool {
        let Some(origin) = self.origin.take() else {
            return false;
        };
        let travelled = self.travelled.max(origin.distance_to(end.x, end.y));
        if origin.kind == PointerKind::Mouse || travelled > self.double_tap_slop_px {
            self.last_tap = None;
            return false;
        }

        let tap = Tap { x: origin.x, y: origin.y, time_ms: end.time_ms };
        match self.last_tap.take() {
            Some(prev)
                if tap.time_ms - prev.time_ms <= self.double_tap_ms
                    && (tap.x - prev.x).hypot(tap.y - prev.y) <= self.double_tap_slop_px =>
            {
                true
            }
            _ => {
                self.last_tap = Some(tap);
                false
            }
        }
    }
}
