//! Core geometric types and their operations/attributes.

use std::cmp::Ordering;
use std::fmt::Display;

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use transform::{Transform, Transformation, Translate};

use self::bbox::BoundBox;

pub mod bbox;
pub mod orientation;
pub mod split;
pub mod transform;

/// A point in two-dimensional layout-space.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    /// Creates a new [`Point`] from (x,y) coordinates.
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Returns the origin, (0, 0).
    #[inline]
    pub fn zero() -> Self {
        Self { x: 0, y: 0 }
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl std::ops::Add<Point> for Point {
    type Output = Self;
    fn add(self, rhs: Point) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl From<(i64, i64)> for Point {
    fn from(value: (i64, i64)) -> Self {
        Self {
            x: value.0,
            y: value.1,
        }
    }
}

/// A one-dimensional span.
#[derive(
    Debug, Default, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize, PartialEq, Eq,
)]
pub struct Span {
    start: i64,
    stop: i64,
}

impl Span {
    /// Creates a new [`Span`] between two integers, in either order.
    pub fn new(start: i64, stop: i64) -> Self {
        Self {
            start: start.min(stop),
            stop: start.max(stop),
        }
    }

    #[inline]
    pub fn start(&self) -> i64 {
        self.start
    }

    #[inline]
    pub fn stop(&self) -> i64 {
        self.stop
    }

    /// Gets the center of the span, rounded towards negative infinity.
    #[inline]
    pub fn center(&self) -> i64 {
        (self.start + self.stop).div_euclid(2)
    }

    #[inline]
    pub fn length(&self) -> i64 {
        self.stop - self.start
    }
}

/// A closed n-sided polygon with arbitrary number of vertices.
///
/// Closure from the last point back to the first is implied;
/// the initial point need not be repeated at the end.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    /// Creates a polygon from its vertices.
    pub fn new(points: impl IntoIterator<Item = impl Into<Point>>) -> Self {
        Self {
            points: points.into_iter().map(Into::into).collect(),
        }
    }

    /// Iterates over the polygon's edges, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Returns `true` if every edge is horizontal or vertical.
    pub fn is_rectilinear(&self) -> bool {
        self.points.len() >= 4 && self.edges().all(|(a, b)| a.x == b.x || a.y == b.y)
    }
}

/// An axis-aligned rectangle, specified by lower-left and upper-right corners.
#[derive(
    Debug, Default, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Rect {
    /// The lower-left corner.
    pub p0: Point,
    /// The upper-right corner.
    pub p1: Point,
}

impl Rect {
    /// Creates a new rectangle from any two opposite corners.
    pub fn new(p0: Point, p1: Point) -> Self {
        Self {
            p0: Point::new(p0.x.min(p1.x), p0.y.min(p1.y)),
            p1: Point::new(p0.x.max(p1.x), p0.y.max(p1.y)),
        }
    }

    /// Creates a rectangle from horizontal and vertical [`Span`]s.
    pub fn from_spans(h: Span, v: Span) -> Self {
        Self {
            p0: Point::new(h.start(), v.start()),
            p1: Point::new(h.stop(), v.stop()),
        }
    }

    /// Returns the center point of the rectangle.
    pub fn center(&self) -> Point {
        Point::new(self.hspan().center(), self.vspan().center())
    }

    #[inline]
    pub fn top(&self) -> i64 {
        self.p1.y
    }

    #[inline]
    pub fn hspan(&self) -> Span {
        Span::new(self.p0.x, self.p1.x)
    }

    #[inline]
    pub fn vspan(&self) -> Span {
        Span::new(self.p0.y, self.p1.y)
    }

    #[inline]
    pub fn width(&self) -> i64 {
        self.hspan().length()
    }

    #[inline]
    pub fn height(&self) -> i64 {
        self.vspan().length()
    }

    #[inline]
    pub fn area(&self) -> i64 {
        self.width() * self.height()
    }
}

/// The primary geometric primitive comprising raw layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[enum_dispatch(ShapeTrait)]
pub enum Shape {
    Rect(Rect),
    Polygon(Polygon),
}

impl Transform for Shape {
    fn transform(&self, trans: Transformation) -> Self {
        match self {
            Self::Rect(s) => Self::Rect(s.transform(trans)),
            Self::Polygon(s) => Self::Polygon(s.transform(trans)),
        }
    }
}

impl Translate for Shape {
    fn translate(&mut self, p: Point) {
        match self {
            Self::Rect(s) => s.translate(p),
            Self::Polygon(s) => s.translate(p),
        }
    }
}

impl Shape {
    /// Decomposes the shape into rectangles.
    ///
    /// Rectangles are returned as-is. Rectilinear polygons are split into
    /// horizontal slabs; other polygons produce no rectangles.
    pub fn split_rects(&self) -> Vec<Rect> {
        match self {
            Self::Rect(r) => vec![*r],
            Self::Polygon(p) => split::split_rectilinear(p),
        }
    }
}

/// Common shape operations, dispatched from the [`Shape`] enum to its variants by [mod@enum_dispatch].
#[enum_dispatch]
pub trait ShapeTrait {
    /// Returns our "origin", an arbitrary [`Point`] on the shape.
    fn point0(&self) -> Point;
    /// Returns `true` if the [`Shape`] contains [`Point`] `pt`.
    ///
    /// Containment is *inclusive*: points on the boundary are inside the shape.
    fn contains(&self, pt: Point) -> bool;
    /// Converts the shape to a [`Polygon`], the most general of shapes.
    fn to_poly(&self) -> Polygon;
}

impl ShapeTrait for Rect {
    fn point0(&self) -> Point {
        self.p0
    }
    fn contains(&self, pt: Point) -> bool {
        self.p0.x <= pt.x && self.p1.x >= pt.x && self.p0.y <= pt.y && self.p1.y >= pt.y
    }
    fn to_poly(&self) -> Polygon {
        Polygon {
            points: vec![
                self.p0,
                Point::new(self.p1.x, self.p0.y),
                self.p1,
                Point::new(self.p0.x, self.p1.y),
            ],
        }
    }
}

impl ShapeTrait for Polygon {
    fn point0(&self) -> Point {
        self.points.first().copied().unwrap_or_default()
    }
    fn contains(&self, pt: Point) -> bool {
        if self.points.is_empty() || !self.points.bbox().contains(pt) {
            return false;
        }

        // Winding number test; points on an edge count as inside.
        let mut winding_num: isize = 0;
        for (past, next) in self.edges() {
            if past.y.min(next.y) > pt.y || past.y.max(next.y) < pt.y {
                continue;
            }
            if next.y == past.y {
                if past.x.min(next.x) <= pt.x && past.x.max(next.x) >= pt.x {
                    return true;
                }
                continue;
            }
            let xsolve = (next.x - past.x) * (pt.y - past.y) / (next.y - past.y) + past.x;
            match xsolve.cmp(&pt.x) {
                Ordering::Equal => return true,
                Ordering::Greater => {
                    // Count each crossing once: include the lower endpoint only.
                    if pt.y == past.y.max(next.y) {
                        continue;
                    }
                    winding_num += if next.y > past.y { 1 } else { -1 };
                }
                Ordering::Less => (),
            }
        }
        winding_num != 0
    }
    fn to_poly(&self) -> Polygon {
        self.clone()
    }
}
