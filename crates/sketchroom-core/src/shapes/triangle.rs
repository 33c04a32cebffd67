//! Triangle shape.

use super::{ShapeId, ShapeTrait, new_shape_id, point_to_outline_dist};
use crate::text_layout::TextMeasure;
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A triangle given by three free vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub(crate) id: ShapeId,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub x3: f64,
    pub y3: f64,
    pub color: String,
}

impl Triangle {
    pub fn new(vertices: [Point; 3], color: impl Into<String>) -> Self {
        let [a, b, c] = vertices;
        Self {
            id: new_shape_id(),
            x1: a.x,
            y1: a.y,
            x2: b.x,
            y2: b.y,
            x3: c.x,
            y3: c.y,
            color: color.into(),
        }
    }

    /// Isosceles triangle from a drag: apex at the horizontal midpoint of the
    /// start row, base along the end row from start x to end x.
    pub fn from_drag(start: Point, end: Point, color: impl Into<String>) -> Self {
        let apex = Point::new(start.x + (end.x - start.x) / 2.0, start.y);
        Self::new(
            [apex, Point::new(start.x, end.y), Point::new(end.x, end.y)],
            color,
        )
    }

    pub fn vertices(&self) -> [Point; 3] {
        [
            Point::new(self.x1, self.y1),
            Point::new(self.x2, self.y2),
            Point::new(self.x3, self.y3),
        ]
    }

    pub(crate) fn set_vertices(&mut self, vertices: [Point; 3]) {
        let [a, b, c] = vertices;
        (self.x1, self.y1) = (a.x, a.y);
        (self.x2, self.y2) = (b.x, b.y);
        (self.x3, self.y3) = (c.x, c.y);
    }

    pub(crate) fn translated(&self, delta: Vec2) -> [Point; 3] {
        self.vertices().map(|p| p + delta)
    }

    pub fn bounding_rect(&self) -> Rect {
        let [a, b, c] = self.vertices();
        Rect::from_points(a, b).union_pt(c)
    }
}

impl ShapeTrait for Triangle {
    fn id(&self) -> &str {
        &self.id
    }

    fn color(&self) -> &str {
        &self.color
    }

    fn bounds(&self, _measure: &dyn TextMeasure) -> Option<Rect> {
        Some(self.bounding_rect())
    }

    fn near_boundary(&self, point: Point, tolerance: f64, _measure: &dyn TextMeasure) -> bool {
        point_to_outline_dist(point, &self.vertices()) <= tolerance
    }

    fn to_path(&self) -> BezPath {
        let [a, b, c] = self.vertices();
        let mut path = BezPath::new();
        path.move_to(a);
        path.line_to(b);
        path.line_to(c);
        path.close_path();
        path
    }
}
