//! Pan/zoom viewport and the affine map between image and canvas space.
//!
//! Image space is the pixel grid of the original, unscaled image (origin
//! top-left). Canvas space is the physical pixel grid of the rendering
//! surface, after device-pixel-ratio scaling. [`Viewport`] holds the
//! user-controlled zoom and pan; [`DrawTransform`] is the derived map
//! `canvas = origin + image * scale`, recomputed whenever the container
//! size, image dimensions, or viewport change.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::consts::{MAX_ZOOM, MIN_ZOOM};

/// A point in either image or canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Canvas container size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// User-controlled view state for the current image.
///
/// `pan_x` / `pan_y` are in CSS pixels. `zoom` is a factor on top of the
/// letterboxed base fit, clamped to `[MIN_ZOOM, MAX_ZOOM]`. Reset to the
/// identity on every image load; never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { zoom: 1.0, pan_x: 0.0, pan_y: 0.0 }
    }
}

impl Viewport {
    /// Restore the identity view (fit, no pan).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Set zoom, clamped to the allowed range.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Accumulate a pan delta in CSS pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Apply a multiplicative zoom step keeping the image point under
    /// `cursor_css` visually fixed.
    ///
    /// Single-step: the pre-zoom image point under the cursor is computed
    /// once, the new zoom applied, and the pan adjusted by the resulting
    /// canvas displacement (converted back to CSS pixels). Pan is only
    /// compensated while the cursor ray actually hits the image; zooming
    /// from the letterbox gutter leaves the pan untouched.
    ///
    /// Returns `true` if the zoom changed.
    pub fn zoom_about_cursor(
        &mut self,
        cursor_css: Point,
        factor: f64,
        container: ContainerSize,
        image: (u32, u32),
        dpr: f64,
    ) -> bool {
        let before = DrawTransform::compute(container, image, self, dpr);
        if before.is_degenerate() {
            return false;
        }

        let new_zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return false;
        }

        let cursor = Point::new(cursor_css.x * dpr, cursor_css.y * dpr);
        let under_cursor = before.canvas_to_image(cursor);
        self.zoom = new_zoom;

        let (iw, ih) = image;
        let in_image = under_cursor.x >= 0.0
            && under_cursor.x <= f64::from(iw)
            && under_cursor.y >= 0.0
            && under_cursor.y <= f64::from(ih);
        if in_image {
            let after = DrawTransform::compute(container, image, self, dpr);
            let moved = after.image_to_canvas(under_cursor);
            self.pan_x += (cursor.x - moved.x) / dpr;
            self.pan_y += (cursor.y - moved.y) / dpr;
        }
        true
    }
}

/// Derived affine map from image space to canvas (physical pixel) space:
/// `canvas = origin + image * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub scale: f64,
}

impl DrawTransform {
    /// The "nothing to draw" transform, produced when no image is loaded or
    /// either image dimension is zero.
    pub const DEGENERATE: Self = Self { origin_x: 0.0, origin_y: 0.0, scale: 0.0 };

    /// Compute the transform for an image letterboxed into the container.
    ///
    /// `scale = min(cw/iw, ch/ih) * zoom * dpr`; the scaled image is centered
    /// in the container and then shifted by the pan offset (CSS pixels).
    #[must_use]
    pub fn compute(
        container: ContainerSize,
        image: (u32, u32),
        viewport: &Viewport,
        dpr: f64,
    ) -> Self {
        let (iw, ih) = image;
        if iw == 0 || ih == 0 {
            return Self::DEGENERATE;
        }
        let (iw, ih) = (f64::from(iw), f64::from(ih));

        let base_fit = (container.width / iw).min(container.height / ih);
        let css_scale = base_fit * viewport.zoom;
        let origin_x = (container.width - iw * css_scale) / 2.0 + viewport.pan_x;
        let origin_y = (container.height - ih * css_scale) / 2.0 + viewport.pan_y;

        Self {
            origin_x: origin_x * dpr,
            origin_y: origin_y * dpr,
            scale: css_scale * dpr,
        }
    }

    /// Whether this transform maps nothing (no image to draw through it).
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.scale <= 0.0
    }

    /// Map an image-space point to canvas space.
    #[must_use]
    pub fn image_to_canvas(&self, image_pt: Point) -> Point {
        Point {
            x: self.origin_x + image_pt.x * self.scale,
            y: self.origin_y + image_pt.y * self.scale,
        }
    }

    /// Map a canvas-space point back to image space.
    #[must_use]
    pub fn canvas_to_image(&self, canvas_pt: Point) -> Point {
        Point {
            x: (canvas_pt.x - self.origin_x) / self.scale,
            y: (canvas_pt.y - self.origin_y) / self.scale,
        }
    }

    /// Map a canvas-space point to image space, rejecting results outside
    /// `[0, w) × [0, h)` and anything mapped through a degenerate transform.
    #[must_use]
    pub fn canvas_to_image_bounded(&self, canvas_pt: Point, image: (u32, u32)) -> Option<Point> {
        if self.is_degenerate() {
            return None;
        }
        let p = self.canvas_to_image(canvas_pt);
        let (iw, ih) = (f64::from(image.0), f64::from(image.1));
        if p.x >= 0.0 && p.x < iw && p.y >= 0.0 && p.y < ih {
            Some(p)
        } else {
            None
        }
    }
}
