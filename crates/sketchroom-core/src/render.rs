//! Immediate-mode scene rendering against an abstract surface.
//!
//! Every state change redraws the whole frame. The host supplies a
//! [`Surface`]; [`DisplayList`] is a recording surface for headless use.

use crate::camera::Camera;
use crate::scene::Scene;
use crate::selection::handle_rects;
use crate::shapes::Shape;
use crate::text_layout::{MonospaceMeasure, TextMeasure};
use kurbo::{Affine, BezPath, Circle, Point, Rect, Shape as KurboShape, Size};

/// Stroke width of shapes in screen pixels.
pub const STROKE_WIDTH: f64 = 2.0;
/// Arrow head length in screen pixels.
pub const ARROW_HEAD_LENGTH: f64 = 15.0;
/// Selection outline and handle color.
pub const SELECTION_COLOR: &str = "#ffffff";
/// Eraser cursor outline color.
pub const ERASER_PREVIEW_COLOR: &str = "rgba(255, 255, 255, 0.7)";

/// A 2D drawing target. Colors are CSS color strings.
///
/// The surface also measures text, so wrapping matches what is drawn.
pub trait Surface: TextMeasure {
    /// Viewport size in screen pixels.
    fn size(&self) -> Size;

    /// Fill the whole viewport, ignoring the current transform.
    fn clear(&mut self, color: &str);

    /// Transform applied to subsequent drawing.
    fn set_transform(&mut self, transform: Affine);

    /// Stroke a path. `width` is in the current transform's units.
    fn stroke_path(&mut self, path: &BezPath, color: &str, width: f64);

    fn fill_rect(&mut self, rect: Rect, color: &str);

    /// Draw one line of text with its top-left corner at `origin`.
    fn fill_text(&mut self, text: &str, origin: Point, font_size: f64, font_family: &str, color: &str);
}

/// Everything needed to draw one frame.
pub struct RenderContext<'a> {
    pub scene: &'a Scene,
    pub camera: &'a Camera,
    pub background: &'a str,
    /// Shape to outline with selection handles.
    pub selected: Option<&'a Shape>,
    /// Shape being drawn, not yet in the scene.
    pub preview: Option<&'a Shape>,
    /// Eraser cursor: screen position and diameter in pixels.
    pub eraser: Option<(Point, f64)>,
}

/// Draw a complete frame.
pub fn render_frame<S: Surface>(surface: &mut S, ctx: &RenderContext<'_>) {
    surface.clear(ctx.background);
    surface.set_transform(ctx.camera.transform());

    let zoom = ctx.camera.zoom();
    for shape in ctx.scene.all() {
        draw_shape(surface, shape, zoom);
    }
    if let Some(selected) = ctx.selected {
        draw_selection(surface, selected, zoom);
    }
    if let Some(preview) = ctx.preview {
        draw_shape(surface, preview, zoom);
    }

    surface.set_transform(Affine::IDENTITY);
    if let Some((center, diameter)) = ctx.eraser {
        let circle = Circle::new(center, diameter / 2.0).to_path(0.1);
        surface.stroke_path(&circle, ERASER_PREVIEW_COLOR, 1.0);
    }
}

/// Draw one shape in world coordinates.
pub fn draw_shape<S: Surface>(surface: &mut S, shape: &Shape, zoom: f64) {
    let width = STROKE_WIDTH / zoom;
    match shape {
        Shape::Text(text) => {
            for line in text.lines(&*surface) {
                surface.fill_text(
                    &line.text,
                    line.origin,
                    text.font_size,
                    &text.font_family,
                    &text.color,
                );
            }
        }
        Shape::Arrow(arrow) => {
            surface.stroke_path(&shape.to_path(), &arrow.color, width);
            surface.stroke_path(&arrow.head_path(ARROW_HEAD_LENGTH / zoom), &arrow.color, width);
        }
        Shape::Pencil(pencil) if pencil.points.len() < 2 => {}
        _ => surface.stroke_path(&shape.to_path(), shape.color(), width),
    }
}

fn draw_selection<S: Surface>(surface: &mut S, shape: &Shape, zoom: f64) {
    let Some(bounds) = shape.bounds(&*surface) else {
        return;
    };
    surface.stroke_path(&bounds.to_path(0.1), SELECTION_COLOR, 1.0 / zoom);
    for (_, handle) in handle_rects(bounds, zoom) {
        surface.fill_rect(handle, SELECTION_COLOR);
    }
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear {
        color: String,
    },
    SetTransform(Affine),
    StrokePath {
        path: BezPath,
        color: String,
        width: f64,
    },
    FillRect {
        rect: Rect,
        color: String,
    },
    FillText {
        text: String,
        origin: Point,
        font_size: f64,
        font_family: String,
        color: String,
    },
}

/// A surface that records draw calls instead of rasterizing them.
///
/// Only the current frame is kept: `clear` starts a new frame and drops
/// the commands of the previous one.
#[derive(Debug, Clone)]
pub struct DisplayList {
    size: Size,
    measure: MonospaceMeasure,
    commands: Vec<DrawCommand>,
    frames: usize,
}

impl DisplayList {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            measure: MonospaceMeasure::default(),
            commands: Vec::new(),
            frames: 0,
        }
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    /// Commands of the current frame, starting at its `Clear`.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of frames started since creation.
    pub fn frame_count(&self) -> usize {
        self.frames
    }
}

impl TextMeasure for DisplayList {
    fn measure(&self, text: &str, font_size: f64, font_family: &str) -> f64 {
        self.measure.measure(text, font_size, font_family)
    }
}

impl Surface for DisplayList {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self, color: &str) {
        self.frames += 1;
        self.commands.clear();
        self.commands.push(DrawCommand::Clear {
            color: color.to_string(),
        });
    }

    fn set_transform(&mut self, transform: Affine) {
        self.commands.push(DrawCommand::SetTransform(transform));
    }

    fn stroke_path(&mut self, path: &BezPath, color: &str, width: f64) {
        self.commands.push(DrawCommand::StrokePath {
            path: path.clone(),
            color: color.to_string(),
            width,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: &str) {
        self.commands.push(DrawCommand::FillRect {
            rect,
            color: color.to_string(),
        });
    }

    fn fill_text(&mut self, text: &str, origin: Point, font_size: f64, font_family: &str, color: &str) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            origin,
            font_size,
            font_family: font_family.to_string(),
            color: color.to_string(),
        });
    }
}
