//! Window/level model and the drag-to-window mapping.

use serde::Serialize;

use crate::config::{GestureConfig, WidthLimitsConfig};
use crate::domain::logging::LogComponent;
use crate::domain::sampling::BaseRange;
use crate::log_warn;

/// Pointer movement since the previous event, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragDelta {
    pub dx: f64,
    pub dy: f64,
}

impl DragDelta {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

/// Display window pushed to the renderer. `zmin`/`zmax` may lie outside the
/// data range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayRange {
    pub zmin: f64,
    pub zmax: f64,
}

impl DisplayRange {
    pub fn from_window(center: f64, width: f64) -> Self {
        let half = width / 2.0;
        Self { zmin: center - half, zmax: center + half }
    }
}

/// Live `(center, width)` pair with the bounds `width` must stay in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub center: f64,
    pub width: f64,
    pub min_width: f64,
    pub max_width: f64,
}

impl Window {
    pub fn clamp_width(&self, width: f64) -> f64 {
        width.max(self.min_width).min(self.max_width)
    }

    /// Both ends of the display range are finite numbers.
    pub fn range_is_finite(&self) -> bool {
        let half = self.width / 2.0;
        (self.center - half).is_finite() && (self.center + half).is_finite()
    }

    fn has_valid_bounds(&self) -> bool {
        self.min_width > 0.0 && self.max_width.is_finite() && self.range_is_finite()
    }
}

/// Pure drag → window transform.
///
/// Horizontal motion scales the width exponentially, so it can never reach
/// zero; vertical motion shifts the center proportionally to the width.
/// A step that would push either end of the display range out of `f64`
/// leaves the window unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowMapper {
    pub contrast_sensitivity: f64,
    pub brightness_sensitivity: f64,
}

impl Default for WindowMapper {
    fn default() -> Self {
        Self::new(&GestureConfig::default())
    }
}

impl WindowMapper {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            contrast_sensitivity: config.contrast_sensitivity,
            brightness_sensitivity: config.brightness_sensitivity,
        }
    }

    pub fn map(&self, window: Window, delta: DragDelta) -> Window {
        if !delta.dx.is_finite() || !delta.dy.is_finite() {
            return window;
        }
        let width = window.clamp_width(window.width * (delta.dx * self.contrast_sensitivity).exp());
        // screen y grows downward
        let center = window.center + (-delta.dy) * width * self.brightness_sensitivity;
        let next = Window { center, width, ..window };
        if next.range_is_finite() { next } else { window }
    }
}

/// Per-instance window/level state.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowState {
    base: BaseRange,
    base_center: f64,
    base_width: f64,
    window: Window,
}

impl WindowState {
    /// Falls back to the `[0, 1]` base when `base` is too extreme for its
    /// width bounds: `min_width` underflowing to zero, `max_width`
    /// overflowing, or a center that is not representable.
    pub fn new(base: BaseRange, limits: &WidthLimitsConfig) -> Self {
        let window = Self::window_for(base, limits);
        if window.has_valid_bounds() {
            return Self { base, base_center: window.center, base_width: window.width, window };
        }
        log_warn!(
            LogComponent::Domain("WindowState"),
            "⚠️ range [{}, {}] out of bounds, using [0, 1]",
            base.min,
            base.max
        );
        let base = BaseRange::default();
        let window = Self::window_for(base, limits);
        Self { base, base_center: window.center, base_width: window.width, window }
    }

    fn window_for(base: BaseRange, limits: &WidthLimitsConfig) -> Window {
        let width = base.width();
        Window {
            center: base.center(),
            width,
            min_width: width / limits.min_width_divisor,
            max_width: width * limits.max_width_factor,
        }
    }

    pub fn base(&self) -> BaseRange {
        self.base
    }

    pub fn base_center(&self) -> f64 {
        self.base_center
    }

    pub fn base_width(&self) -> f64 {
        self.base_width
    }

    pub fn center(&self) -> f64 {
        self.window.center
    }

    pub fn width(&self) -> f64 {
        self.window.width
    }

    pub fn min_width(&self) -> f64 {
        self.window.min_width
    }

    pub fn max_width(&self) -> f64 {
        self.window.max_width
    }

    pub fn display_range(&self) -> DisplayRange {
        DisplayRange::from_window(self.window.center, self.window.width)
    }

    pub fn apply_drag(&mut self, mapper: &WindowMapper, delta: DragDelta) -> DisplayRange {
        self.window = mapper.map(self.window, delta);
        self.display_range()
    }

    /// Back to the data-derived center and width.
    pub fn reset(&mut self) -> DisplayRange {
        self.window.center = self.base_center;
        self.window.width = self.base_width;
        self.display_range()
    }

    pub fn is_at_base(&self) -> bool {
        self.window.center == self.base_center && self.window.width == self.base_width
    }
}
