//! Geometry primitives: points, sizes, rectangles, and the crop quadrilateral.
//!
//! Nothing in here knows which coordinate space a value lives in. Callers keep
//! screen, canvas, and image points apart and only cross between them through
//! [`crate::transform`].

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Errors raised when constructing or indexing a [`Quad`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// Two corners share the exact same position.
    #[error("crop area corners {0:?} and {1:?} coincide")]
    DuplicateCorners(Corner, Corner),
    /// A corner index outside `0..4`.
    #[error("corner index {0} out of range (expected 0..4)")]
    CornerIndex(usize),
}

/// A point in screen, canvas, or image space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Whether `other` lies within `threshold` of this point (inclusive).
    #[must_use]
    pub fn is_near(self, other: Point, threshold: f64) -> bool {
        self.distance(other) <= threshold
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Point;

    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

/// Width and height of a surface or image, in that surface's own pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either side is zero, negative, or not finite.
    #[must_use]
    pub fn is_empty(self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn origin(self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

/// Clamp `value` into `[min, max]`.
///
/// Unlike [`f64::clamp`] this never panics when `min > max`; `max` wins, matching
/// `max(min, min(max, value))`.
#[must_use]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    min.max(max.min(value))
}

/// Constrain `p` into the box `[0, width] × [0, height]`.
#[must_use]
pub fn constrain_point(p: Point, width: f64, height: f64) -> Point {
    Point::new(clamp(p.x, 0.0, width), clamp(p.y, 0.0, height))
}

/// One of the four named corners of a [`Quad`], in clockwise order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    /// All corners in index order. Hit-testing iterates in this order.
    pub const ALL: [Corner; 4] = [Corner::TopLeft, Corner::TopRight, Corner::BottomRight, Corner::BottomLeft];

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::TopLeft => 0,
            Self::TopRight => 1,
            Self::BottomRight => 2,
            Self::BottomLeft => 3,
        }
    }

    /// Look up a corner by its position in [`Corner::ALL`].
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::CornerIndex`] for indices outside `0..4`.
    pub fn from_index(index: usize) -> Result<Self, GeometryError> {
        Self::ALL.get(index).copied().ok_or(GeometryError::CornerIndex(index))
    }
}

/// The four-corner crop region, stored in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl Quad {
    /// Build a quad, rejecting any pair of coincident corners.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DuplicateCorners`] naming the first clashing pair.
    pub fn new(top_left: Point, top_right: Point, bottom_right: Point, bottom_left: Point) -> Result<Self, GeometryError> {
        let quad = Self { top_left, top_right, bottom_right, bottom_left };
        match quad.duplicate_pair() {
            Some((a, b)) => Err(GeometryError::DuplicateCorners(a, b)),
            None => Ok(quad),
        }
    }

    /// Build a quad from four points in index order.
    ///
    /// # Errors
    ///
    /// Same as [`Quad::new`].
    pub fn from_points(points: [Point; 4]) -> Result<Self, GeometryError> {
        let [tl, tr, br, bl] = points;
        Self::new(tl, tr, br, bl)
    }

    /// Default crop area for a `width × height` surface: a rectangle inset by
    /// 10% of the smaller dimension on every side.
    #[must_use]
    pub fn default_for(width: f64, height: f64) -> Self {
        let margin = width.min(height) * 0.1;
        Self {
            top_left: Point::new(margin, margin),
            top_right: Point::new(width - margin, margin),
            bottom_right: Point::new(width - margin, height - margin),
            bottom_left: Point::new(margin, height - margin),
        }
    }

    #[must_use]
    pub fn corner(&self, corner: Corner) -> Point {
        match corner {
            Corner::TopLeft => self.top_left,
            Corner::TopRight => self.top_right,
            Corner::BottomRight => self.bottom_right,
            Corner::BottomLeft => self.bottom_left,
        }
    }

    /// Move one corner, leaving the other three untouched.
    ///
    /// No shape validation happens here; a drag may produce a self-intersecting quad.
    pub fn set_corner(&mut self, corner: Corner, p: Point) {
        match corner {
            Corner::TopLeft => self.top_left = p,
            Corner::TopRight => self.top_right = p,
            Corner::BottomRight => self.bottom_right = p,
            Corner::BottomLeft => self.bottom_left = p,
        }
    }

    /// Corners in index (clockwise from top-left) order.
    #[must_use]
    pub fn points(&self) -> [Point; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    /// Mean of the four corners.
    #[must_use]
    pub fn center(&self) -> Point {
        let sum = self.points().into_iter().fold(Point::default(), |acc, p| acc + p);
        sum / 4.0
    }

    /// Whether all four corners are pairwise distinct.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.duplicate_pair().is_none()
    }

    /// Map every corner through `f`, keeping order.
    #[must_use]
    pub fn map(&self, mut f: impl FnMut(Point) -> Point) -> Self {
        Self {
            top_left: f(self.top_left),
            top_right: f(self.top_right),
            bottom_right: f(self.bottom_right),
            bottom_left: f(self.bottom_left),
        }
    }

    fn duplicate_pair(&self) -> Option<(Corner, Corner)> {
        for (i, a) in Corner::ALL.iter().enumerate() {
            for b in &Corner::ALL[i + 1..] {
                if self.corner(*a) == self.corner(*b) {
                    return Some((*a, *b));
                }
            }
        }
        None
    }
}
