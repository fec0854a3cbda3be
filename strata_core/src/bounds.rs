// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-aligned bounds accumulator.
//!
//! [`Bounds`] is grown by points and rectangles (optionally mapped through an
//! [`Affine`]) and snapshots to a [`Rect`]. The empty state uses inverted
//! infinities so that the first addition always wins the min/max comparison.

use kurbo::{Affine, Point, Rect};

/// A growable axis-aligned bounding region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Bounds {
    /// The empty accumulator.
    pub const EMPTY: Self = Self {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    /// Creates an empty accumulator.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Resets to the empty state.
    #[inline]
    pub fn clear(&mut self) {
        *self = Self::EMPTY;
    }

    /// Returns whether nothing has been accumulated.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.min_x > self.max_x
    }

    /// Grows the region to include `point`.
    pub fn add_point(&mut self, point: Point) {
        self.min_x = self.min_x.min(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_x = self.max_x.max(point.x);
        self.max_y = self.max_y.max(point.y);
    }

    /// Grows the region to include `rect`.
    pub fn add_rect(&mut self, rect: Rect) {
        self.add_point(Point::new(rect.x0, rect.y0));
        self.add_point(Point::new(rect.x1, rect.y1));
    }

    /// Grows the region to include the rectangle `(x0, y0)..(x1, y1)` mapped
    /// through `matrix`.
    ///
    /// All four corners are transformed, so the result is the axis-aligned
    /// hull of the mapped (possibly rotated) frame.
    pub fn add_frame(&mut self, matrix: Affine, x0: f64, y0: f64, x1: f64, y1: f64) {
        self.add_point(matrix * Point::new(x0, y0));
        self.add_point(matrix * Point::new(x1, y0));
        self.add_point(matrix * Point::new(x0, y1));
        self.add_point(matrix * Point::new(x1, y1));
    }

    /// Grows the region to include another accumulated region.
    pub fn add_bounds(&mut self, other: &Self) {
        if other.is_empty() {
            return;
        }
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Returns the accumulated rectangle, or [`Rect::ZERO`] when empty.
    #[inline]
    #[must_use]
    pub fn rect(&self) -> Rect {
        if self.is_empty() {
            Rect::ZERO
        } else {
            Rect::new(self.min_x, self.min_y, self.max_x, self.max_y)
        }
    }
}

impl Default for Bounds {
    #[inline]
    fn default() -> Self {
        Self::EMPTY
    }
}
