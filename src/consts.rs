//! Shared numeric constants for the annotation engine.

// ── Zoom ────────────────────────────────────────────────────────

/// Lower zoom bound; 1.0 is the letterboxed fit.
pub const MIN_ZOOM: f64 = 1.0;

/// Upper zoom bound.
pub const MAX_ZOOM: f64 = 10.0;

/// Multiplicative zoom step per wheel notch toward the image.
pub const ZOOM_STEP_IN: f64 = 1.1;

/// Multiplicative zoom step per wheel notch away from the image.
pub const ZOOM_STEP_OUT: f64 = 0.9;

// ── Labels ──────────────────────────────────────────────────────

/// Smallest accepted target label.
pub const LABEL_MIN: u8 = 1;

/// Largest accepted target label.
pub const LABEL_MAX: u8 = 9;
