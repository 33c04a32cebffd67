//! Text shape.

use super::{ShapeId, ShapeTrait, new_shape_id};
use crate::text_layout::{FontSpec, TextLine, TextMeasure, wrap_text};
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

/// Default font size in world units.
pub const DEFAULT_FONT_SIZE: f64 = 20.0;
/// Default font family.
pub const DEFAULT_FONT_FAMILY: &str = "monospace";
/// Default wrap width in world units.
pub const DEFAULT_WRAP_WIDTH: f64 = 300.0;

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

fn default_wrap_width() -> f64 {
    DEFAULT_WRAP_WIDTH
}

/// A block of word-wrapped text anchored at its top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    pub(crate) id: ShapeId,
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub color: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    /// Wrap width.
    #[serde(default = "default_wrap_width")]
    pub width: f64,
}

impl Text {
    /// Create a text shape with the default font and wrap width.
    pub fn new(origin: Point, text: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: new_shape_id(),
            x: origin.x,
            y: origin.y,
            text: text.into(),
            color: color.into(),
            font_size: DEFAULT_FONT_SIZE,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            width: DEFAULT_WRAP_WIDTH,
        }
    }

    pub fn font(&self) -> FontSpec<'_> {
        FontSpec {
            size: self.font_size,
            family: &self.font_family,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Lay out the text with the given metrics.
    pub fn lines(&self, measure: &dyn TextMeasure) -> Vec<TextLine> {
        wrap_text(&self.text, self.width, self.font(), self.origin(), measure)
    }

    /// Tight box around the laid-out glyph runs.
    fn ink_rect(&self, measure: &dyn TextMeasure) -> Option<Rect> {
        let lines = self.lines(measure);
        let (first, last) = (lines.first()?, lines.last()?);
        let widest = lines
            .iter()
            .map(|l| measure.measure(&l.text, self.font_size, &self.font_family))
            .fold(0.0, f64::max);
        let height = last.origin.y - first.origin.y + self.font().line_height();
        Some(Rect::new(self.x, self.y, self.x + widest, self.y + height))
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> &str {
        &self.id
    }

    fn color(&self) -> &str {
        &self.color
    }

    /// The wrap width by the number of laid-out lines.
    fn bounds(&self, measure: &dyn TextMeasure) -> Option<Rect> {
        let line_count = self.lines(measure).len() as f64;
        let height = line_count * self.font().line_height();
        Some(Rect::new(self.x, self.y, self.x + self.width, self.y + height))
    }

    fn near_boundary(&self, point: Point, tolerance: f64, measure: &dyn TextMeasure) -> bool {
        self.ink_rect(measure).is_some_and(|r| {
            let r = r.inflate(tolerance, tolerance);
            point.x >= r.x0 && point.x <= r.x1 && point.y >= r.y0 && point.y <= r.y1
        })
    }

    fn to_path(&self) -> BezPath {
        BezPath::new()
    }
}
