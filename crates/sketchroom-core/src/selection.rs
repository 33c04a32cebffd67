//! Selection handles and move/resize transforms.
//!
//! A gesture keeps a copy of the shape as it was at press time. Every pointer
//! move recomputes the live shape from that copy plus the total delta, so
//! the result never accumulates rounding from intermediate frames.

use crate::shapes::{Shape, ShapeId, Triangle};
use crate::text_layout::TextMeasure;
use kurbo::{Point, Rect, Vec2};

/// Handle side length in screen pixels.
pub const HANDLE_SIZE: f64 = 8.0;
/// Minimum width and height of a resized rectangle or ellipse.
pub const MIN_BOX_SIZE: f64 = 10.0;
/// Minimum wrap width of a resized text block.
pub const MIN_TEXT_WIDTH: f64 = 50.0;

/// Part of a selected shape grabbed by the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Body,
}

impl Handle {
    pub const CORNERS: [Handle; 4] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomLeft,
        Handle::BottomRight,
    ];

    fn is_left(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::BottomLeft)
    }

    fn is_top(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::TopRight)
    }
}

/// Square handles centered on the corners of `bounds`, sized so they appear
/// [`HANDLE_SIZE`] pixels wide at `zoom`.
pub fn handle_rects(bounds: Rect, zoom: f64) -> [(Handle, Rect); 4] {
    let half = HANDLE_SIZE / zoom / 2.0;
    Handle::CORNERS.map(|handle| {
        let x = if handle.is_left() { bounds.x0 } else { bounds.x1 };
        let y = if handle.is_top() { bounds.y0 } else { bounds.y1 };
        (handle, Rect::new(x - half, y - half, x + half, y + half))
    })
}

/// Corner handle of `shape` under `point`, if any.
pub fn handle_at(shape: &Shape, point: Point, zoom: f64, measure: &dyn TextMeasure) -> Option<Handle> {
    let bounds = shape.bounds(measure)?;
    handle_rects(bounds, zoom)
        .into_iter()
        .find(|(_, r)| point.x >= r.x0 && point.x <= r.x1 && point.y >= r.y0 && point.y <= r.y1)
        .map(|(handle, _)| handle)
}

/// Kind of transform a gesture applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Moving,
    Resizing,
}

/// An in-progress move or resize of one shape.
#[derive(Debug, Clone)]
pub struct Action {
    pub shape_id: ShapeId,
    pub kind: ActionKind,
    pub handle: Handle,
    /// Shape state at gesture start.
    pub initial: Shape,
    /// Pointer position at gesture start, in world coordinates.
    pub start: Point,
}

impl Action {
    /// Start a gesture on `shape`. Grabbing the body moves; grabbing a corner
    /// resizes.
    pub fn begin(shape: &Shape, handle: Handle, start: Point) -> Self {
        let kind = match handle {
            Handle::Body => ActionKind::Moving,
            _ => ActionKind::Resizing,
        };
        Self {
            shape_id: shape.id().to_string(),
            kind,
            handle,
            initial: shape.clone(),
            start,
        }
    }

    /// Recompute `shape` for the pointer at `current`.
    pub fn apply(&self, shape: &mut Shape, current: Point) {
        let delta = current - self.start;
        match self.kind {
            ActionKind::Moving => apply_move(shape, &self.initial, delta),
            ActionKind::Resizing => apply_resize(shape, &self.initial, self.handle, delta),
        }
    }
}

/// Offset the initial state by `delta`.
pub fn apply_move(shape: &mut Shape, initial: &Shape, delta: Vec2) {
    match (shape, initial) {
        (Shape::Rectangle(s), Shape::Rectangle(i)) => (s.x, s.y) = (i.x + delta.x, i.y + delta.y),
        (Shape::Ellipse(s), Shape::Ellipse(i)) => (s.x, s.y) = (i.x + delta.x, i.y + delta.y),
        (Shape::Text(s), Shape::Text(i)) => (s.x, s.y) = (i.x + delta.x, i.y + delta.y),
        (Shape::Triangle(s), Shape::Triangle(i)) => s.set_vertices(i.translated(delta)),
        // Strokes and arrows have no bounds and cannot be grabbed.
        (Shape::Pencil(_), _) | (Shape::Arrow(_), _) => {}
        _ => log::warn!("move applied across mismatched shape variants"),
    }
}

/// Edit the initial state for a drag of `handle` by `delta`.
pub fn apply_resize(shape: &mut Shape, initial: &Shape, handle: Handle, delta: Vec2) {
    match (shape, initial) {
        (Shape::Rectangle(s), Shape::Rectangle(i)) => {
            (s.x, s.y, s.width, s.height) = resize_box((i.x, i.y, i.width, i.height), handle, delta);
        }
        (Shape::Ellipse(s), Shape::Ellipse(i)) => {
            (s.x, s.y, s.width, s.height) = resize_box((i.x, i.y, i.width, i.height), handle, delta);
        }
        (Shape::Text(s), Shape::Text(i)) => {
            if handle.is_left() {
                s.x = i.x + delta.x;
                s.width = (i.width - delta.x).max(MIN_TEXT_WIDTH);
            } else {
                s.width = (i.width + delta.x).max(MIN_TEXT_WIDTH);
            }
        }
        (Shape::Triangle(s), Shape::Triangle(i)) => resize_triangle(s, i, handle, delta),
        (Shape::Pencil(_), _) | (Shape::Arrow(_), _) => {}
        _ => log::warn!("resize applied across mismatched shape variants"),
    }
}

type BoxGeometry = (f64, f64, f64, f64);

fn resize_box((x, y, w, h): BoxGeometry, handle: Handle, d: Vec2) -> BoxGeometry {
    match handle {
        Handle::BottomRight => (x, y, (w + d.x).max(MIN_BOX_SIZE), (h + d.y).max(MIN_BOX_SIZE)),
        Handle::BottomLeft => (
            x + d.x,
            y,
            (w - d.x).max(MIN_BOX_SIZE),
            (h + d.y).max(MIN_BOX_SIZE),
        ),
        Handle::TopRight => (
            x,
            y + d.y,
            (w + d.x).max(MIN_BOX_SIZE),
            (h - d.y).max(MIN_BOX_SIZE),
        ),
        Handle::TopLeft => (
            x + d.x,
            y + d.y,
            (w - d.x).max(MIN_BOX_SIZE),
            (h - d.y).max(MIN_BOX_SIZE),
        ),
        Handle::Body => (x, y, w, h),
    }
}

/// Scale the vertices per axis about the corner opposite `handle`.
fn resize_triangle(shape: &mut Triangle, initial: &Triangle, handle: Handle, d: Vec2) {
    if handle == Handle::Body {
        return;
    }
    let bounds = initial.bounding_rect();
    let (left, top) = (handle.is_left(), handle.is_top());

    let scale = |extent: f64, grow: f64| {
        if extent.abs() < f64::EPSILON {
            1.0
        } else {
            (extent + grow) / extent
        }
    };
    let sx = scale(bounds.width(), if left { -d.x } else { d.x });
    let sy = scale(bounds.height(), if top { -d.y } else { d.y });
    let anchor = Point::new(
        if left { bounds.x1 } else { bounds.x0 },
        if top { bounds.y1 } else { bounds.y0 },
    );

    shape.set_vertices(initial.vertices().map(|p| {
        Point::new(
            anchor.x + (p.x - anchor.x) * sx,
            anchor.y + (p.y - anchor.y) * sy,
        )
    }));
}
