//! Shape definitions for the canvas.
//!
//! Shapes travel over the wire as JSON objects tagged by `type`, with
//! camelCase geometry fields. The same representation is used for
//! persistence and for history snapshots.

mod arrow;
mod ellipse;
mod pencil;
mod rectangle;
mod text;
mod triangle;

pub use arrow::Arrow;
pub use ellipse::Ellipse;
pub use pencil::Pencil;
pub use rectangle::Rectangle;
pub use text::Text;
pub use triangle::Triangle;

use crate::text_layout::TextMeasure;
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shape identity, shared across peers.
pub type ShapeId = String;

/// Generate a fresh shape identity.
pub fn new_shape_id() -> ShapeId {
    Uuid::new_v4().simple().to_string()
}

/// Standard point-to-segment distance. A degenerate segment falls back to
/// the distance between the two points.
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    point.distance(a + seg * t)
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => point.distance(*only),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Minimum distance from a point to a closed polygon outline.
pub(crate) fn point_to_outline_dist(point: Point, vertices: &[Point]) -> f64 {
    let n = vertices.len();
    (0..n)
        .map(|i| point_to_segment_dist(point, vertices[i], vertices[(i + 1) % n]))
        .fold(f64::INFINITY, f64::min)
}

/// Behaviour shared by every shape variant.
pub trait ShapeTrait {
    /// Identity of the shape.
    fn id(&self) -> &str;

    /// Stroke/fill color as a CSS color string.
    fn color(&self) -> &str;

    /// Axis-aligned bounding box, if the shape has one.
    fn bounds(&self, measure: &dyn TextMeasure) -> Option<Rect>;

    /// Whether `point` lies within `tolerance` of the shape's outline.
    fn near_boundary(&self, point: Point, tolerance: f64, measure: &dyn TextMeasure) -> bool;

    /// Outline path for rendering. Text has no path.
    fn to_path(&self) -> BezPath;
}

/// A drawable primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Shape {
    #[serde(rename = "rect")]
    Rectangle(Rectangle),
    #[serde(rename = "ellipse")]
    Ellipse(Ellipse),
    #[serde(rename = "pencil")]
    Pencil(Pencil),
    #[serde(rename = "arrow")]
    Arrow(Arrow),
    #[serde(rename = "triangle")]
    Triangle(Triangle),
    #[serde(rename = "text")]
    Text(Text),
}

impl Shape {
    fn inner(&self) -> &dyn ShapeTrait {
        match self {
            Shape::Rectangle(s) => s,
            Shape::Ellipse(s) => s,
            Shape::Pencil(s) => s,
            Shape::Arrow(s) => s,
            Shape::Triangle(s) => s,
            Shape::Text(s) => s,
        }
    }

    pub fn id(&self) -> &str {
        self.inner().id()
    }

    pub fn color(&self) -> &str {
        self.inner().color()
    }

    pub fn bounds(&self, measure: &dyn TextMeasure) -> Option<Rect> {
        self.inner().bounds(measure)
    }

    pub fn near_boundary(&self, point: Point, tolerance: f64, measure: &dyn TextMeasure) -> bool {
        self.inner().near_boundary(point, tolerance, measure)
    }

    pub fn to_path(&self) -> BezPath {
        self.inner().to_path()
    }

    /// Wire tag of this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Rectangle(_) => "rect",
            Shape::Ellipse(_) => "ellipse",
            Shape::Pencil(_) => "pencil",
            Shape::Arrow(_) => "arrow",
            Shape::Triangle(_) => "triangle",
            Shape::Text(_) => "text",
        }
    }

    /// Point-in-bounds test used for selection. Shapes without bounds are
    /// never selected this way.
    pub fn contains(&self, point: Point, measure: &dyn TextMeasure) -> bool {
        self.bounds(measure).is_some_and(|b| {
            point.x >= b.x0 && point.x <= b.x1 && point.y >= b.y0 && point.y <= b.y1
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_layout::MonospaceMeasure;

    #[test]
    fn test_segment_distance_on_segment() {
        let d = point_to_segment_dist(Point::new(0.0, 5.0), Point::ZERO, Point::new(0.0, 10.0));
        assert!(d.abs() < f64::EPSILON);
    }

    #[test]
    fn test_segment_distance_perpendicular() {
        let d = point_to_segment_dist(Point::new(5.0, 5.0), Point::ZERO, Point::new(0.0, 10.0));
        assert!((d - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_segment_distance_past_endpoint() {
        let d = point_to_segment_dist(Point::new(3.0, 14.0), Point::ZERO, Point::new(0.0, 10.0));
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_segment_distance_degenerate() {
        let a = Point::new(1.0, 1.0);
        let d = point_to_segment_dist(Point::new(4.0, 5.0), a, a);
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_polyline_single_point() {
        let d = point_to_polyline_dist(Point::new(3.0, 4.0), &[Point::ZERO]);
        assert!((d - 5.0).abs() < 1e-9);
        assert!(point_to_polyline_dist(Point::ZERO, &[]).is_infinite());
    }

    #[test]
    fn test_wire_format_rect() {
        let json = r##"{"id":"s1","type":"rect","x":10,"y":10,"width":30,"height":20,"color":"#fff"}"##;
        let shape: Shape = serde_json::from_str(json).unwrap();
        let Shape::Rectangle(rect) = &shape else {
            panic!("expected rect, got {shape:?}");
        };
        assert_eq!(rect.id, "s1");
        assert!((rect.width - 30.0).abs() < f64::EPSILON);

        let value = serde_json::to_value(&shape).unwrap();
        assert_eq!(value["type"], "rect");
        assert_eq!(value["height"], 20.0);
    }

    #[test]
    fn test_wire_format_camel_case_fields() {
        let arrow = Shape::Arrow(Arrow::new(Point::ZERO, Point::new(5.0, 6.0), "red"));
        let value = serde_json::to_value(&arrow).unwrap();
        assert_eq!(value["type"], "arrow");
        assert_eq!(value["endX"], 5.0);
        assert_eq!(value["endY"], 6.0);

        let pencil = Shape::Pencil(Pencil::new(vec![Point::new(1.0, 2.0)], "red"));
        let value = serde_json::to_value(&pencil).unwrap();
        assert_eq!(value["points"][0]["x"], 1.0);
        assert_eq!(value["points"][0]["y"], 2.0);
    }

    #[test]
    fn test_wire_round_trip_every_variant() {
        let shapes = vec![
            Shape::Rectangle(Rectangle::new(Point::new(1.0, 2.0), 3.0, 4.0, "#fff")),
            Shape::Ellipse(Ellipse::new(Point::new(1.0, 2.0), 3.0, 4.0, "#0f0")),
            Shape::Pencil(Pencil::new(vec![Point::ZERO, Point::new(4.0, 4.0)], "#00f")),
            Shape::Arrow(Arrow::new(Point::ZERO, Point::new(9.0, 1.0), "#f00")),
            Shape::Triangle(Triangle::from_drag(Point::ZERO, Point::new(10.0, 10.0), "#ff0")),
            Shape::Text(Text::new(Point::new(3.0, 3.0), "hi there", "#eee")),
        ];
        for shape in shapes {
            let json = serde_json::to_string(&shape).unwrap();
            let back: Shape = serde_json::from_str(&json).unwrap();
            assert_eq!(back, shape, "round trip of {json}");
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let json = r##"{"id":"x","type":"hexagon","color":"#fff"}"##;
        assert!(serde_json::from_str::<Shape>(json).is_err());
    }

    #[test]
    fn test_contains_uses_bounds() {
        let measure = MonospaceMeasure::default();
        let rect = Shape::Rectangle(Rectangle::new(Point::new(10.0, 10.0), 30.0, 20.0, "#fff"));
        assert!(rect.contains(Point::new(25.0, 20.0), &measure));
        assert!(rect.contains(Point::new(40.0, 30.0), &measure));
        assert!(!rect.contains(Point::new(41.0, 20.0), &measure));

        let pencil = Shape::Pencil(Pencil::new(vec![Point::ZERO, Point::new(10.0, 10.0)], "#fff"));
        assert!(!pencil.contains(Point::new(5.0, 5.0), &measure));
    }

    #[test]
    fn test_new_shape_ids_are_unique() {
        assert_ne!(new_shape_id(), new_shape_id());
    }
}
