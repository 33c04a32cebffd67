//! Rectangle shape.

use super::{ShapeId, ShapeTrait, new_shape_id, point_to_outline_dist};
use crate::text_layout::TextMeasure;
use kurbo::{BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub(crate) id: ShapeId,
    /// Top-left corner.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

impl Rectangle {
    /// Create a new rectangle.
    pub fn new(origin: Point, width: f64, height: f64, color: impl Into<String>) -> Self {
        Self {
            id: new_shape_id(),
            x: origin.x,
            y: origin.y,
            width,
            height,
            color: color.into(),
        }
    }

    /// Create a rectangle from two corner points, normalizing so width and
    /// height are non-negative.
    pub fn from_corners(p1: Point, p2: Point, color: impl Into<String>) -> Self {
        let rect = Rect::from_points(p1, p2);
        Self::new(rect.origin(), rect.width(), rect.height(), color)
    }

    /// Get the rectangle as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub(crate) fn corners(&self) -> [Point; 4] {
        let r = self.as_rect();
        [
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
            Point::new(r.x0, r.y1),
        ]
    }
}

impl ShapeTrait for Rectangle {
    fn id(&self) -> &str {
        &self.id
    }

    fn color(&self) -> &str {
        &self.color
    }

    fn bounds(&self, _measure: &dyn TextMeasure) -> Option<Rect> {
        Some(self.as_rect())
    }

    fn near_boundary(&self, point: Point, tolerance: f64, _measure: &dyn TextMeasure) -> bool {
        point_to_outline_dist(point, &self.corners()) <= tolerance
    }

    fn to_path(&self) -> BezPath {
        self.as_rect().to_path(0.1)
    }
}
