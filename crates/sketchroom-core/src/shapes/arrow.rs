//! Arrow shape.

use super::{ShapeId, ShapeTrait, new_shape_id, point_to_segment_dist};
use crate::text_layout::TextMeasure;
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_6;

/// A straight arrow from start to end. The head is drawn at the end point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrow {
    pub(crate) id: ShapeId,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub color: String,
}

impl Arrow {
    pub fn new(start: Point, end: Point, color: impl Into<String>) -> Self {
        Self {
            id: new_shape_id(),
            start_x: start.x,
            start_y: start.y,
            end_x: end.x,
            end_y: end.y,
            color: color.into(),
        }
    }

    pub fn start(&self) -> Point {
        Point::new(self.start_x, self.start_y)
    }

    pub fn end(&self) -> Point {
        Point::new(self.end_x, self.end_y)
    }

    /// Two head strokes of `head_length`, 30° either side of the shaft.
    pub fn head_path(&self, head_length: f64) -> BezPath {
        let (start, end) = (self.start(), self.end());
        let angle = (end.y - start.y).atan2(end.x - start.x);
        let mut path = BezPath::new();
        for side in [angle - FRAC_PI_6, angle + FRAC_PI_6] {
            path.move_to(end);
            path.line_to(Point::new(
                end.x - head_length * side.cos(),
                end.y - head_length * side.sin(),
            ));
        }
        path
    }
}

impl ShapeTrait for Arrow {
    fn id(&self) -> &str {
        &self.id
    }

    fn color(&self) -> &str {
        &self.color
    }

    /// Arrows are selected by neither box nor handle.
    fn bounds(&self, _measure: &dyn TextMeasure) -> Option<Rect> {
        None
    }

    fn near_boundary(&self, point: Point, tolerance: f64, _measure: &dyn TextMeasure) -> bool {
        point_to_segment_dist(point, self.start(), self.end()) <= tolerance
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.start());
        path.line_to(self.end());
        path
    }
}
