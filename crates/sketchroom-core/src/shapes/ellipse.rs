//! Ellipse shape.

use super::{ShapeId, ShapeTrait, new_shape_id};
use crate::text_layout::TextMeasure;
use kurbo::{BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// An axis-aligned ellipse inscribed in its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub(crate) id: ShapeId,
    /// Top-left corner of the bounding box.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

impl Ellipse {
    /// Create a new ellipse from its bounding box.
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

    /// Create an ellipse whose bounding box spans two corner points.
    pub fn from_corners(p1: Point, p2: Point, color: impl Into<String>) -> Self {
        let rect = Rect::from_points(p1, p2);
        Self::new(rect.origin(), rect.width(), rect.height(), color)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn radii(&self) -> (f64, f64) {
        ((self.width / 2.0).abs(), (self.height / 2.0).abs())
    }

    pub fn as_kurbo(&self) -> kurbo::Ellipse {
        let (rx, ry) = self.radii();
        kurbo::Ellipse::new(self.center(), (rx, ry), 0.0)
    }
}

impl ShapeTrait for Ellipse {
    fn id(&self) -> &str {
        &self.id
    }

    fn color(&self) -> &str {
        &self.color
    }

    fn bounds(&self, _measure: &dyn TextMeasure) -> Option<Rect> {
        Some(Rect::new(self.x, self.y, self.x + self.width, self.y + self.height))
    }

    /// The normalized quadratic form `dx²/rx² + dy²/ry²` must fall within a
    /// band around 1 whose half-width is `tolerance / rx`.
    fn near_boundary(&self, point: Point, tolerance: f64, _measure: &dyn TextMeasure) -> bool {
        let (rx, ry) = self.radii();
        if rx <= 0.0 || ry <= 0.0 {
            return false;
        }
        let d = point - self.center();
        let value = (d.x * d.x) / (rx * rx) + (d.y * d.y) / (ry * ry);
        let band = tolerance / rx;
        value >= 1.0 - band && value <= 1.0 + band
    }

    fn to_path(&self) -> BezPath {
        self.as_kurbo().to_path(0.1)
    }
}
