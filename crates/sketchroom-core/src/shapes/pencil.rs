//! Freehand pencil stroke.

use super::{ShapeId, ShapeTrait, new_shape_id, point_to_polyline_dist};
use crate::text_layout::TextMeasure;
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

/// A polyline recorded from pointer movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pencil {
    pub(crate) id: ShapeId,
    pub points: Vec<Point>,
    pub color: String,
}

impl Pencil {
    pub fn new(points: Vec<Point>, color: impl Into<String>) -> Self {
        Self {
            id: new_shape_id(),
            points,
            color: color.into(),
        }
    }
}

impl ShapeTrait for Pencil {
    fn id(&self) -> &str {
        &self.id
    }

    fn color(&self) -> &str {
        &self.color
    }

    /// Strokes are not box-selectable.
    fn bounds(&self, _measure: &dyn TextMeasure) -> Option<Rect> {
        None
    }

    fn near_boundary(&self, point: Point, tolerance: f64, _measure: &dyn TextMeasure) -> bool {
        point_to_polyline_dist(point, &self.points) <= tolerance
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        if let Some((first, rest)) = self.points.split_first() {
            path.move_to(*first);
            for p in rest {
                path.line_to(*p);
            }
        }
        path
    }
}
