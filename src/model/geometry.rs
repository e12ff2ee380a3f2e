//! Geometry in normalized image coordinates.
//!
//! Coordinates live in the image's valid drawing area, `[0, 1]²`. Boxes are
//! stored center/size, so a box's reference point is its center.

use serde::{Deserialize, Serialize};

use super::AnnotationType;

/// A 2D point in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An axis-aligned bounding box given by its center and size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Center X coordinate
    pub x: f32,
    /// Center Y coordinate
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A zero-size box at `point`.
    pub fn at(point: Point) -> Self {
        Self::new(point.x, point.y, 0.0, 0.0)
    }

    /// Create a box spanning two corner points (in any order).
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        let width = (p1.x - p2.x).abs();
        let height = (p1.y - p2.y).abs();
        Self {
            x: p1.x.min(p2.x) + width / 2.0,
            y: p1.y.min(p2.y) + height / 2.0,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn left(&self) -> f32 {
        self.x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn top(&self) -> f32 {
        self.y - self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Check if a point is inside the box (edges included).
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }
}

/// Shape of a primitive. Labels are image-wide and carry no coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    Label,
    Point(Point),
    BoundingBox(BoundingBox),
}

impl Geometry {
    pub fn annotation_type(&self) -> AnnotationType {
        match self {
            Geometry::Label => AnnotationType::Label,
            Geometry::Point(_) => AnnotationType::Point,
            Geometry::BoundingBox(_) => AnnotationType::BoundingBox,
        }
    }

    /// The point used for distance queries: the point itself or the box center.
    pub fn reference_point(&self) -> Option<Point> {
        match self {
            Geometry::Label => None,
            Geometry::Point(p) => Some(*p),
            Geometry::BoundingBox(b) => Some(b.center()),
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            Geometry::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_box(&self) -> Option<BoundingBox> {
        match self {
            Geometry::BoundingBox(b) => Some(*b),
            _ => None,
        }
    }

    /// Describe why this geometry is unusable, if it is.
    pub(crate) fn problem(&self) -> Option<&'static str> {
        match self {
            Geometry::Label => None,
            Geometry::Point(p) if !p.is_finite() => Some("non-finite point coordinates"),
            Geometry::Point(_) => None,
            Geometry::BoundingBox(b) => {
                if !b.center().is_finite() || !b.width.is_finite() || !b.height.is_finite() {
                    Some("non-finite box coordinates")
                } else if b.width < 0.0 || b.height < 0.0 {
                    Some("negative box size")
                } else {
                    None
                }
            }
        }
    }
}
