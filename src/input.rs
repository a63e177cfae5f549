//! Input model: buttons, keys, events, and the gesture state machine.
//!
//! These types decouple the engine from any particular UI toolkit: the host
//! translates its native pointer/keyboard/wheel events into [`InputEvent`]s
//! and feeds them to the engine. [`InputState`] is the active gesture being
//! tracked between pointer-down and pointer-up; [`PendingLabel`] is the
//! sub-state holding a placed point or drawn rectangle while the user is
//! asked for its label.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::viewport::Point;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button.
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button.
    Secondary,
}

/// A keyboard key as reported by the host (e.g. `"z"`, `"ArrowLeft"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    /// Case-insensitive comparison against a key name.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down = zoom out).
    pub dy: f64,
}

/// A host input event. Positions are CSS pixels relative to the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { at: Point, button: Button },
    PointerMove { at: Point },
    PointerUp { at: Point, button: Button },
    Wheel { at: Point, delta: WheelDelta },
    KeyDown(Key),
    /// Container resized (or the engine is being told its size for the
    /// first time). `width`/`height` in CSS pixels.
    Resize { width: f64, height: f64, dpr: f64 },
}

/// Active gesture being tracked between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Middle-drag pan; `last_screen` is the previous pointer position in
    /// CSS pixels, used to compute the incremental pan delta.
    Panning { last_screen: Point },
    /// Primary-drag rectangle in rectangle mode. Corners are canvas
    /// (physical pixel) space; `end` stays `None` until the first move.
    DrawingRect { start: Point, end: Option<Point> },
}

/// Geometry awaiting its label.
///
/// Entered by the gesture that fixed the geometry; resolved by
/// `submit_label` / `cancel_label` on the engine. While pending, all other
/// input is ignored (the prompt is modal).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingLabel {
    /// A single point, already mapped and rounded to image-space pixels.
    Point { x: i32, y: i32 },
    /// A drawn rectangle, corners in canvas space; mapped to image space
    /// when the label arrives.
    Rectangle { start: Point, end: Point },
}
