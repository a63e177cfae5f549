//! Mark list: the ordered set of labeled points on the current image.
//!
//! Marks live in image-space pixel coordinates. Insertion order is display
//! order and decides the undo target (the last element); it carries no
//! spatial meaning. The persisted format cannot represent a bare empty list,
//! so [`MarkList::to_persisted`] emits a single `null` sentinel when there
//! are zero marks and [`MarkList::from_persisted`] drops sentinels on the
//! way back in.

#[cfg(test)]
#[path = "marks_test.rs"]
mod marks_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::viewport::{DrawTransform, Point};

/// A labeled point annotation in image-space pixels.
///
/// Serialized as the `[x, y, label]` tuple used by the coordinate sidecar
/// format; the "no marks" sentinel is a bare `null` (`Option<Mark>` on the
/// wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i32, i32, u8)", into = "(i32, i32, u8)")]
pub struct Mark {
    pub x: i32,
    pub y: i32,
    pub label: u8,
}

impl Mark {
    #[must_use]
    pub fn new(x: i32, y: i32, label: u8) -> Self {
        Self { x, y, label }
    }
}

impl From<(i32, i32, u8)> for Mark {
    fn from((x, y, label): (i32, i32, u8)) -> Self {
        Self { x, y, label }
    }
}

impl From<Mark> for (i32, i32, u8) {
    fn from(mark: Mark) -> Self {
        (mark.x, mark.y, mark.label)
    }
}

/// Ordered, mutable list of marks for the image currently displayed.
///
/// In memory this is a plain vector; the `[null]` sentinel exists only at
/// the persistence boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkList {
    marks: Vec<Mark>,
}

impl MarkList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the persisted coordinate list, dropping sentinel entries.
    #[must_use]
    pub fn from_persisted(coordinates: Vec<Option<Mark>>) -> Self {
        Self { marks: coordinates.into_iter().flatten().collect() }
    }

    /// The list in persisted form. Never empty: a mark-less image persists
    /// as the single sentinel `[null]`.
    #[must_use]
    pub fn to_persisted(&self) -> Vec<Option<Mark>> {
        if self.marks.is_empty() {
            vec![None]
        } else {
            self.marks.iter().copied().map(Some).collect()
        }
    }

    /// Append a mark. Label range is the caller's responsibility.
    pub fn add(&mut self, mark: Mark) {
        self.marks.push(mark);
    }

    /// Remove and return the most recently added mark, if any.
    pub fn undo_last(&mut self) -> Option<Mark> {
        self.marks.pop()
    }

    /// Drop every mark.
    pub fn clear_all(&mut self) {
        self.marks.clear();
    }

    /// Remove the mark closest to `target` (canvas space), measured through
    /// `transform`. Ties go to the lowest index. Returns the removed mark,
    /// or `None` when there is nothing to remove or nothing is drawable.
    pub fn remove_nearest(&mut self, target: Point, transform: &DrawTransform) -> Option<Mark> {
        if transform.is_degenerate() {
            return None;
        }

        let mut nearest: Option<(usize, f64)> = None;
        for (index, mark) in self.marks.iter().enumerate() {
            let on_canvas = transform.image_to_canvas(Point::new(f64::from(mark.x), f64::from(mark.y)));
            let (dx, dy) = (on_canvas.x - target.x, on_canvas.y - target.y);
            let dist_sq = dx * dx + dy * dy;
            // Strict `<` keeps the first minimum found.
            if nearest.is_none_or(|(_, best)| dist_sq < best) {
                nearest = Some((index, dist_sq));
            }
        }

        nearest.map(|(index, _)| self.marks.remove(index))
    }

    /// Per-label mark counts, in ascending label order.
    #[must_use]
    pub fn label_tally(&self) -> BTreeMap<u8, usize> {
        let mut tally = BTreeMap::new();
        for mark in &self.marks {
            *tally.entry(mark.label).or_insert(0) += 1;
        }
        tally
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// The marks in insertion order.
    #[must_use]
    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }
}
