//! Tool state machine.
//!
//! Tracks the selected tool, the gesture in progress, the transient pan
//! override and the open text edit. Geometry of committed shapes is decided
//! here; applying them to the scene is the engine's job.

use crate::input::MouseButton;
use crate::selection::{Action, Handle};
use crate::shapes::{Arrow, Ellipse, Pencil, Rectangle, Shape, Triangle};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Select,
    Pan,
    Eraser,
    Text,
    Rectangle,
    Ellipse,
    #[default]
    Pencil,
    Arrow,
    Triangle,
}

impl ToolKind {
    /// Tools that create a shape from a drag.
    pub fn is_drawable(self) -> bool {
        matches!(
            self,
            ToolKind::Rectangle
                | ToolKind::Ellipse
                | ToolKind::Pencil
                | ToolKind::Arrow
                | ToolKind::Triangle
        )
    }
}

/// Pointer cursor the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorIcon {
    Default,
    Move,
    NwseResize,
    NeswResize,
    Grab,
    Grabbing,
    Crosshair,
    Text,
    /// The engine draws its own cursor.
    Hidden,
}

/// Gesture progress for the drawing tools.
#[derive(Debug, Clone, Default)]
pub enum ToolState {
    /// Waiting for a pointer press.
    #[default]
    Idle,
    /// Dragging out a new shape.
    Drawing { start: Point, current: Point },
    /// Eraser button held.
    Erasing,
    /// Dragging the camera. `grab` is the pointer position minus the camera
    /// offset at press time, in screen pixels.
    Panning { grab: Vec2 },
    /// Moving or resizing the selected shape.
    Transforming(Action),
    /// Text tool pressed; the release opens an edit.
    TextPress,
}

/// An open text-input overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEdit {
    /// Anchor of the new text in world coordinates.
    pub world: Point,
    /// Where the host should place the overlay, in screen pixels.
    pub screen: Point,
    /// Current contents of the overlay.
    pub buffer: String,
}

/// Active tool plus the gesture it is tracking.
#[derive(Debug, Clone)]
pub struct ToolManager {
    /// Active tool.
    pub current_tool: ToolKind,
    /// In-progress gesture, if any.
    pub state: ToolState,
    /// Color applied to new shapes.
    pub color: String,
    pencil_points: Vec<Point>,
    pan_hold: bool,
    text_edit: Option<TextEdit>,
}

impl ToolManager {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            current_tool: ToolKind::default(),
            state: ToolState::Idle,
            color: color.into(),
            pencil_points: Vec::new(),
            pan_hold: false,
            text_edit: None,
        }
    }

    /// Select a tool, abandoning any gesture. Returns the text edit that was
    /// open, so the caller can commit it.
    pub fn set_tool(&mut self, tool: ToolKind) -> Option<TextEdit> {
        self.current_tool = tool;
        self.cancel();
        self.text_edit.take()
    }

    /// Abandon the gesture in progress.
    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
        self.pencil_points.clear();
    }

    /// Space bar held or released.
    pub fn set_pan_hold(&mut self, held: bool) {
        self.pan_hold = held;
    }

    pub fn pan_hold(&self) -> bool {
        self.pan_hold
    }

    /// Whether a press with `button` pans regardless of the selected tool.
    pub fn pans_with(&self, button: MouseButton) -> bool {
        self.current_tool == ToolKind::Pan || button == MouseButton::Middle || self.pan_hold
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, ToolState::Idle)
    }

    pub fn begin_pan(&mut self, pointer: Point, offset: Vec2) {
        self.state = ToolState::Panning {
            grab: pointer.to_vec2() - offset,
        };
    }

    pub fn begin_drawing(&mut self, start: Point) {
        if self.current_tool == ToolKind::Pencil {
            self.pencil_points = vec![start];
        }
        self.state = ToolState::Drawing {
            start,
            current: start,
        };
    }

    /// Track the pointer during a drawing gesture.
    pub fn update_drawing(&mut self, point: Point) {
        if let ToolState::Drawing { current, .. } = &mut self.state {
            *current = point;
            if self.current_tool == ToolKind::Pencil {
                self.pencil_points.push(point);
            }
        }
    }

    /// End a drawing gesture at `end`, producing the committed shape unless
    /// it is degenerate.
    pub fn finish_drawing(&mut self, end: Point) -> Option<Shape> {
        let ToolState::Drawing { start, .. } = std::mem::take(&mut self.state) else {
            return None;
        };
        let points = std::mem::take(&mut self.pencil_points);
        if self.current_tool == ToolKind::Pencil {
            return (points.len() >= 2).then(|| Shape::Pencil(Pencil::new(points, &self.color)));
        }
        if start == end {
            return None;
        }
        create_shape(self.current_tool, start, end, &self.color)
    }

    /// Live preview of the shape being drawn.
    pub fn preview_shape(&self) -> Option<Shape> {
        let ToolState::Drawing { start, current } = self.state else {
            return None;
        };
        if self.current_tool == ToolKind::Pencil {
            return Some(Shape::Pencil(Pencil::new(
                self.pencil_points.clone(),
                &self.color,
            )));
        }
        create_shape(self.current_tool, start, current, &self.color)
    }

    pub fn open_text_edit(&mut self, world: Point, screen: Point) -> &TextEdit {
        self.text_edit.insert(TextEdit {
            world,
            screen,
            buffer: String::new(),
        })
    }

    pub fn text_edit(&self) -> Option<&TextEdit> {
        self.text_edit.as_ref()
    }

    /// Replace the contents of the open text edit, if any.
    pub fn set_text_buffer(&mut self, text: &str) -> bool {
        match &mut self.text_edit {
            Some(edit) => {
                edit.buffer = text.to_string();
                true
            }
            None => false,
        }
    }

    pub fn take_text_edit(&mut self) -> Option<TextEdit> {
        self.text_edit.take()
    }

    /// Cursor for the current tool. `hover` is the select-tool hit under the
    /// pointer: a handle, or `Handle::Body` over a shape.
    pub fn cursor(&self, hover: Option<Handle>) -> CursorIcon {
        if matches!(self.state, ToolState::Panning { .. }) {
            return CursorIcon::Grabbing;
        }
        if self.pan_hold {
            return CursorIcon::Grab;
        }
        match self.current_tool {
            ToolKind::Select => match hover {
                Some(Handle::TopLeft | Handle::BottomRight) => CursorIcon::NwseResize,
                Some(Handle::TopRight | Handle::BottomLeft) => CursorIcon::NeswResize,
                Some(Handle::Body) => CursorIcon::Move,
                None => CursorIcon::Default,
            },
            ToolKind::Pan => CursorIcon::Grab,
            ToolKind::Eraser => CursorIcon::Hidden,
            ToolKind::Text => CursorIcon::Text,
            _ => CursorIcon::Crosshair,
        }
    }
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new("#ffffff")
    }
}

/// Shape for a drag from `start` to `end` with a box-like or two-point tool.
pub fn create_shape(tool: ToolKind, start: Point, end: Point, color: &str) -> Option<Shape> {
    let shape = match tool {
        ToolKind::Rectangle => Shape::Rectangle(Rectangle::from_corners(start, end, color)),
        ToolKind::Ellipse => Shape::Ellipse(Ellipse::from_corners(start, end, color)),
        ToolKind::Arrow => Shape::Arrow(Arrow::new(start, end, color)),
        ToolKind::Triangle => Shape::Triangle(Triangle::from_drag(start, end, color)),
        _ => return None,
    };
    Some(shape)
}
