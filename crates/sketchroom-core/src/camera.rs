//! Viewport camera: a uniform zoom followed by a translation.

use kurbo::{Affine, Point, Size, Vec2};

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.1;
/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 5.0;
/// Zoom change per unit of ctrl+wheel delta, relative to the current zoom.
pub const WHEEL_ZOOM_SPEED: f64 = 0.01;

/// Maps between world and screen coordinates.
///
/// `offset` is the screen position of the world origin, in pixels. World
/// coordinates map to screen as `world * zoom + offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub offset: Vec2,
    zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    /// Identity camera: zoom 1, world origin at the screen origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// A camera at zoom 1 with the world origin at the viewport center.
    pub fn centered(viewport: Size) -> Self {
        Self {
            offset: Vec2::new(viewport.width / 2.0, viewport.height / 2.0),
            zoom: 1.0,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom directly, clamped to the allowed range.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// World-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Screen-to-world transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Shift the view by `delta` screen pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Set a new zoom level, keeping the world point under `screen_point`
    /// fixed on screen.
    pub fn zoom_at(&mut self, screen_point: Point, new_zoom: f64) {
        let anchor = self.screen_to_world(screen_point);
        self.set_zoom(new_zoom);
        self.offset = screen_point.to_vec2() - anchor.to_vec2() * self.zoom;
    }

    /// Apply a wheel gesture: zoom about the cursor with ctrl held, pan
    /// otherwise.
    pub fn apply_wheel(&mut self, screen_point: Point, delta: Vec2, ctrl: bool) {
        if ctrl {
            let new_zoom = self.zoom - delta.y * WHEEL_ZOOM_SPEED * self.zoom;
            self.zoom_at(screen_point, new_zoom);
        } else {
            self.pan(-delta);
        }
    }
}
