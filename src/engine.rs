//! Input-driven annotation engine.
//!
//! [`EngineCore`] is a synchronous state machine: the host (or the session
//! layer) feeds it [`InputEvent`]s and label submissions, and every handler
//! returns the [`Action`]s the caller must carry out — redraws, persists,
//! notices, backend rectangle round trips, navigation requests. Keeping the
//! engine free of I/O is what makes the whole pointer/keyboard protocol
//! testable without a UI or a server.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use crate::consts::{LABEL_MAX, LABEL_MIN, ZOOM_STEP_IN, ZOOM_STEP_OUT};
use crate::input::{Button, InputEvent, InputState, Key, PendingLabel, WheelDelta};
use crate::marks::{Mark, MarkList};
use crate::viewport::{ContainerSize, DrawTransform, Point, Viewport};

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Actions returned from engine handlers for the caller to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The scene must be redrawn.
    RenderNeeded,
    /// The current mark list must be persisted to the backend.
    PersistNeeded,
    /// Show a transient message to the user.
    Notice { level: NoticeLevel, message: String },
    /// Ask the user for a target label in `[1, 9]`; resolved by
    /// [`EngineCore::submit_label`] or [`EngineCore::cancel_label`].
    LabelPrompt,
    /// Send the rectangle corners (image space) to the backend for point
    /// extraction; the reply feeds [`EngineCore::apply_rectangle_points`].
    ProcessRectangle { corners: [[i32; 2]; 2], label: u8 },
    /// Navigate to the previous image (silent persist-then-load).
    NavigatePrev,
    /// Navigate to the next image (requires a confirmation summary).
    NavigateNext,
    /// The user asked to quit.
    QuitRequested,
    /// The host should switch the pointer cursor.
    SetCursor(&'static str),
    /// The host must suppress the platform default for the triggering event
    /// (context menu, arrow-key scroll, wheel scroll).
    SuppressDefault,
}

fn notice(level: NoticeLevel, message: impl Into<String>) -> Action {
    Action::Notice { level, message: message.into() }
}

/// Core interaction state: mark list, viewport, and the gesture machine.
pub struct EngineCore {
    /// Marks for the image currently displayed.
    pub marks: MarkList,
    /// User pan/zoom state; reset on every image load.
    pub viewport: Viewport,
    container: ContainerSize,
    dpr: f64,
    image_dims: Option<(u32, u32)>,
    rect_mode: bool,
    input: InputState,
    pending: Option<PendingLabel>,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            marks: MarkList::new(),
            viewport: Viewport::default(),
            container: ContainerSize::default(),
            dpr: 1.0,
            image_dims: None,
            rect_mode: false,
            input: InputState::Idle,
            pending: None,
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Data inputs ---

    /// Install a freshly loaded image: reset the view to identity, drop any
    /// in-flight gesture or pending label, and adopt its mark list.
    pub fn load_image(&mut self, dims: (u32, u32), marks: MarkList) {
        self.image_dims = Some(dims);
        self.marks = marks;
        self.viewport.reset();
        self.input = InputState::Idle;
        self.pending = None;
    }

    /// Show the empty-state placeholder: no image, no marks, identity view.
    pub fn show_placeholder(&mut self) {
        self.image_dims = None;
        self.marks = MarkList::new();
        self.viewport.reset();
        self.input = InputState::Idle;
        self.pending = None;
    }

    // --- Queries ---

    /// The current image-to-canvas transform; degenerate while no image is
    /// loaded. Callers must not draw through a degenerate transform.
    #[must_use]
    pub fn transform(&self) -> DrawTransform {
        let Some(dims) = self.image_dims else {
            return DrawTransform::DEGENERATE;
        };
        DrawTransform::compute(self.container, dims, &self.viewport, self.dpr)
    }

    /// Original pixel dimensions of the loaded image, if any.
    #[must_use]
    pub fn image_dims(&self) -> Option<(u32, u32)> {
        self.image_dims
    }

    /// Whether rectangle-draw mode is toggled on.
    #[must_use]
    pub fn rect_mode(&self) -> bool {
        self.rect_mode
    }

    /// The active gesture.
    #[must_use]
    pub fn input_state(&self) -> InputState {
        self.input
    }

    /// The in-progress rectangle overlay (canvas space), for the renderer.
    #[must_use]
    pub fn rect_in_progress(&self) -> Option<(Point, Point)> {
        match self.input {
            InputState::DrawingRect { start, end: Some(end) } => Some((start, end)),
            _ => None,
        }
    }

    /// Whether a label prompt is outstanding.
    #[must_use]
    pub fn awaiting_label(&self) -> bool {
        self.pending.is_some()
    }

    // --- Input events ---

    /// Dispatch a host input event.
    pub fn handle(&mut self, event: InputEvent) -> Vec<Action> {
        match event {
            InputEvent::PointerDown { at, button } => self.on_pointer_down(at, button),
            InputEvent::PointerMove { at } => self.on_pointer_move(at),
            InputEvent::PointerUp { at, button } => self.on_pointer_up(at, button),
            InputEvent::Wheel { at, delta } => self.on_wheel(at, delta),
            InputEvent::KeyDown(key) => self.on_key_down(&key),
            InputEvent::Resize { width, height, dpr } => self.on_resize(width, height, dpr),
        }
    }

    pub fn on_resize(&mut self, width: f64, height: f64, dpr: f64) -> Vec<Action> {
        self.container = ContainerSize::new(width, height);
        self.dpr = dpr;
        vec![Action::RenderNeeded]
    }

    pub fn on_pointer_down(&mut self, at: Point, button: Button) -> Vec<Action> {
        if self.pending.is_some() {
            // The context menu stays suppressed even while the prompt is up.
            return match button {
                Button::Secondary => vec![Action::SuppressDefault],
                _ => Vec::new(),
            };
        }

        match button {
            Button::Primary if self.rect_mode => {
                if self.image_dims.is_none() {
                    return vec![notice(NoticeLevel::Info, "no image to annotate")];
                }
                self.input = InputState::DrawingRect { start: self.to_canvas(at), end: None };
                vec![Action::SuppressDefault]
            }
            Button::Primary => self.place_point(at),
            Button::Middle => {
                self.input = InputState::Panning { last_screen: at };
                vec![Action::SetCursor("move"), Action::SuppressDefault]
            }
            Button::Secondary => {
                // The native context menu is suppressed unconditionally.
                let mut actions = self.remove_nearest(at);
                actions.push(Action::SuppressDefault);
                actions
            }
        }
    }

    pub fn on_pointer_move(&mut self, at: Point) -> Vec<Action> {
        if self.pending.is_some() {
            return Vec::new();
        }

        match &mut self.input {
            InputState::Idle => Vec::new(),
            InputState::Panning { last_screen } => {
                let (dx, dy) = (at.x - last_screen.x, at.y - last_screen.y);
                *last_screen = at;
                self.viewport.pan_by(dx, dy);
                vec![Action::RenderNeeded, Action::SuppressDefault]
            }
            InputState::DrawingRect { end, .. } => {
                *end = Some(Point::new(at.x * self.dpr, at.y * self.dpr));
                vec![Action::RenderNeeded]
            }
        }
    }

    pub fn on_pointer_up(&mut self, _at: Point, button: Button) -> Vec<Action> {
        match button {
            Button::Primary => match self.input {
                InputState::DrawingRect { start, end: Some(end) } => {
                    self.input = InputState::Idle;
                    self.pending = Some(PendingLabel::Rectangle { start, end });
                    vec![Action::LabelPrompt]
                }
                // Press without a drag: nothing was outlined.
                InputState::DrawingRect { end: None, .. } => {
                    self.input = InputState::Idle;
                    Vec::new()
                }
                _ => Vec::new(),
            },
            Button::Middle | Button::Secondary => {
                if matches!(self.input, InputState::Panning { .. }) {
                    self.input = InputState::Idle;
                }
                vec![Action::SetCursor("crosshair")]
            }
        }
    }

    pub fn on_wheel(&mut self, at: Point, delta: WheelDelta) -> Vec<Action> {
        if self.pending.is_some() {
            return Vec::new();
        }
        let Some(dims) = self.image_dims else {
            return vec![Action::SuppressDefault];
        };

        let factor = if delta.dy > 0.0 { ZOOM_STEP_OUT } else { ZOOM_STEP_IN };
        let changed = self
            .viewport
            .zoom_about_cursor(at, factor, self.container, dims, self.dpr);
        if changed {
            vec![Action::RenderNeeded, Action::SuppressDefault]
        } else {
            vec![Action::SuppressDefault]
        }
    }

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        if self.pending.is_some() {
            return Vec::new();
        }

        if key.is("z") {
            self.undo_last()
        } else if key.is("ArrowLeft") {
            vec![Action::SuppressDefault, Action::NavigatePrev]
        } else if key.is("ArrowRight") {
            vec![Action::SuppressDefault, Action::NavigateNext]
        } else if key.is("r") {
            self.viewport.reset();
            vec![
                Action::RenderNeeded,
                notice(NoticeLevel::Info, "zoom and pan reset"),
            ]
        } else if key.is("m") {
            self.toggle_rect_mode()
        } else if key.is("q") {
            vec![Action::QuitRequested]
        } else {
            Vec::new()
        }
    }

    // --- Label entry ---

    /// Complete a pending annotation with the user's label input.
    ///
    /// Rejects anything that is not an integer in `[LABEL_MIN, LABEL_MAX]`;
    /// rejection abandons the pending geometry without mutating the marks.
    pub fn submit_label(&mut self, text: &str) -> Vec<Action> {
        let Some(pending) = self.pending.take() else {
            return Vec::new();
        };

        let label = match text.trim().parse::<i64>() {
            Ok(n) if (i64::from(LABEL_MIN)..=i64::from(LABEL_MAX)).contains(&n) => n as u8,
            _ => {
                return vec![notice(
                    NoticeLevel::Error,
                    format!("enter an integer label between {LABEL_MIN} and {LABEL_MAX}"),
                )];
            }
        };

        match pending {
            PendingLabel::Point { x, y } => {
                self.marks.add(Mark::new(x, y, label));
                vec![Action::RenderNeeded, Action::PersistNeeded]
            }
            PendingLabel::Rectangle { start, end } => {
                let t = self.transform();
                let a = t.canvas_to_image(start);
                let b = t.canvas_to_image(end);
                let corners = [
                    [a.x.round() as i32, a.y.round() as i32],
                    [b.x.round() as i32, b.y.round() as i32],
                ];
                vec![Action::ProcessRectangle { corners, label }]
            }
        }
    }

    /// Abandon the pending annotation without mutating anything.
    pub fn cancel_label(&mut self) -> Vec<Action> {
        self.pending = None;
        vec![Action::RenderNeeded]
    }

    /// Append the backend's extracted rectangle points, in reply order.
    pub fn apply_rectangle_points(&mut self, points: &[[i32; 2]], label: u8) -> Vec<Action> {
        for [x, y] in points {
            self.marks.add(Mark::new(*x, *y, label));
        }
        vec![
            Action::RenderNeeded,
            Action::PersistNeeded,
            notice(NoticeLevel::Success, "rectangle processed"),
        ]
    }

    // --- Mark operations ---

    /// Undo the most recent mark.
    pub fn undo_last(&mut self) -> Vec<Action> {
        if self.marks.undo_last().is_some() {
            vec![
                Action::RenderNeeded,
                Action::PersistNeeded,
                notice(NoticeLevel::Info, "last mark undone"),
            ]
        } else {
            vec![notice(NoticeLevel::Info, "no marks to undo")]
        }
    }

    /// Drop every mark on the current image.
    pub fn clear_all(&mut self) -> Vec<Action> {
        self.marks.clear_all();
        vec![
            Action::RenderNeeded,
            Action::PersistNeeded,
            notice(NoticeLevel::Success, "all marks cleared"),
        ]
    }

    // --- Internals ---

    fn to_canvas(&self, css_pt: Point) -> Point {
        Point::new(css_pt.x * self.dpr, css_pt.y * self.dpr)
    }

    fn place_point(&mut self, at: Point) -> Vec<Action> {
        let Some(dims) = self.image_dims else {
            return vec![notice(NoticeLevel::Info, "no image to annotate")];
        };

        let t = self.transform();
        let Some(p) = t.canvas_to_image_bounded(self.to_canvas(at), dims) else {
            return vec![notice(NoticeLevel::Info, "click is outside the image bounds")];
        };

        // Rounding can bump a coordinate in [w-0.5, w) up to w; clamp back.
        let x = (p.x.round() as i32).min(dims.0 as i32 - 1);
        let y = (p.y.round() as i32).min(dims.1 as i32 - 1);
        self.pending = Some(PendingLabel::Point { x, y });
        vec![Action::LabelPrompt]
    }

    fn remove_nearest(&mut self, at: Point) -> Vec<Action> {
        if self.marks.is_empty() {
            return vec![notice(NoticeLevel::Info, "no marks to remove")];
        }

        let t = self.transform();
        match self.marks.remove_nearest(self.to_canvas(at), &t) {
            Some(_) => vec![
                Action::RenderNeeded,
                Action::PersistNeeded,
                notice(NoticeLevel::Info, "nearest mark removed"),
            ],
            None => vec![notice(NoticeLevel::Info, "no marks to remove")],
        }
    }

    fn toggle_rect_mode(&mut self) -> Vec<Action> {
        self.rect_mode = !self.rect_mode;
        if self.rect_mode {
            vec![notice(
                NoticeLevel::Info,
                "rectangle mode on: hold the primary button to outline",
            )]
        } else {
            // Leaving the mode abandons any half-drawn rectangle.
            if matches!(self.input, InputState::DrawingRect { .. }) {
                self.input = InputState::Idle;
            }
            vec![notice(NoticeLevel::Info, "rectangle mode off")]
        }
    }
}
