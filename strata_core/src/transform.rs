// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decomposed 2D node transform.
//!
//! A [`Transform`] holds the caller-facing components (position, scale,
//! rotation, skew, pivot) and the two matrices derived from them. The local
//! matrix is rebuilt lazily behind a version counter; the world matrix is the
//! parent's world matrix times the local matrix and is recomputed on every
//! [`update`](Transform::update).

use kurbo::{Affine, Point, Vec2};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Position, scale, rotation, skew, and pivot with cached local and world
/// matrices.
///
/// The matrices returned by [`local`](Self::local) and [`world`](Self::world)
/// are only valid after the last [`update`](Self::update) (or, for the local
/// matrix alone, [`update_local`](Self::update_local)).
///
/// Equality compares the five components, not the cached matrices.
#[derive(Clone, Copy, Debug)]
pub struct Transform {
    position: Point,
    scale: Vec2,
    pivot: Point,
    skew: Vec2,
    rotation: f64,
    // Cached trig of rotation/skew, refreshed only when either changes.
    cx: f64,
    sx: f64,
    cy: f64,
    sy: f64,
    local: Affine,
    world: Affine,
    version: u32,
    built_version: u32,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        position: Point::ZERO,
        scale: Vec2::new(1.0, 1.0),
        pivot: Point::ZERO,
        skew: Vec2::ZERO,
        rotation: 0.0,
        cx: 1.0,
        sx: 0.0,
        cy: 0.0,
        sy: 1.0,
        local: Affine::IDENTITY,
        world: Affine::IDENTITY,
        version: 0,
        built_version: 0,
    };

    /// Creates a transform translated to `(x, y)`.
    #[inline]
    #[must_use]
    pub const fn from_position(x: f64, y: f64) -> Self {
        let mut t = Self::IDENTITY;
        t.position = Point::new(x, y);
        t.version = 1;
        t
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64) -> Self {
        let mut t = Self::IDENTITY;
        t.scale = Vec2::new(sx, sy);
        t.version = 1;
        t
    }

    /// Creates a rotation transform (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation(radians: f64) -> Self {
        let mut t = Self::IDENTITY;
        t.set_rotation(radians);
        t
    }

    // -- Component accessors --

    /// Returns the position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Returns the scale.
    #[inline]
    #[must_use]
    pub const fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Returns the pivot (the origin rotation and scale are applied around).
    #[inline]
    #[must_use]
    pub const fn pivot(&self) -> Point {
        self.pivot
    }

    /// Returns the skew angles (radians).
    #[inline]
    #[must_use]
    pub const fn skew(&self) -> Vec2 {
        self.skew
    }

    /// Returns the rotation (radians).
    #[inline]
    #[must_use]
    pub const fn rotation(&self) -> f64 {
        self.rotation
    }

    // -- Component mutators --

    /// Sets the position.
    #[inline]
    pub const fn set_position(&mut self, position: Point) {
        self.position = position;
        self.version = self.version.wrapping_add(1);
    }

    /// Sets the scale.
    #[inline]
    pub const fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
        self.version = self.version.wrapping_add(1);
    }

    /// Sets the pivot.
    #[inline]
    pub const fn set_pivot(&mut self, pivot: Point) {
        self.pivot = pivot;
        self.version = self.version.wrapping_add(1);
    }

    /// Sets the skew angles (radians).
    #[inline]
    pub fn set_skew(&mut self, skew: Vec2) {
        self.skew = skew;
        self.refresh_trig();
        self.version = self.version.wrapping_add(1);
    }

    /// Sets the rotation (radians).
    #[inline]
    pub fn set_rotation(&mut self, rotation: f64) {
        self.rotation = rotation;
        self.refresh_trig();
        self.version = self.version.wrapping_add(1);
    }

    fn refresh_trig(&mut self) {
        self.cx = (self.rotation + self.skew.y).cos();
        self.sx = (self.rotation + self.skew.y).sin();
        self.cy = -(self.rotation - self.skew.x).sin();
        self.sy = (self.rotation - self.skew.x).cos();
    }

    // -- Matrices --

    /// Returns the local matrix.
    ///
    /// Only valid after the last [`update_local`](Self::update_local) or
    /// [`update`](Self::update).
    #[inline]
    #[must_use]
    pub const fn local(&self) -> Affine {
        self.local
    }

    /// Returns the world matrix.
    ///
    /// Only valid after the last [`update`](Self::update).
    #[inline]
    #[must_use]
    pub const fn world(&self) -> Affine {
        self.world
    }

    /// Rebuilds the local matrix from the components if any changed since the
    /// last build.
    pub fn update_local(&mut self) {
        if self.built_version == self.version {
            return;
        }
        let a = self.cx * self.scale.x;
        let b = self.sx * self.scale.x;
        let c = self.cy * self.scale.y;
        let d = self.sy * self.scale.y;
        let tx = self.position.x - (self.pivot.x * a + self.pivot.y * c);
        let ty = self.position.y - (self.pivot.x * b + self.pivot.y * d);
        self.local = Affine::new([a, b, c, d, tx, ty]);
        self.built_version = self.version;
    }

    /// Recomputes the world matrix from the parent's world state.
    ///
    /// Rebuilds the local matrix first if stale, then composes
    /// `parent.world() * local`.
    pub fn update(&mut self, parent: &Self) {
        self.update_local();
        self.world = parent.world * self.local;
    }
}

impl Default for Transform {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
            && self.scale == other.scale
            && self.pivot == other.pivot
            && self.skew == other.skew
            && self.rotation == other.rotation
    }
}
