//! Scene store: the ordered set of shapes visible in a room.

use crate::shapes::Shape;
use crate::text_layout::TextMeasure;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Shapes in draw order (back to front), unique by identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scene {
    shapes: Vec<Shape>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from a shape sequence. Later duplicates of an identity
    /// replace earlier ones in place.
    pub fn from_shapes(shapes: impl IntoIterator<Item = Shape>) -> Self {
        let mut scene = Self::new();
        for shape in shapes {
            scene.upsert(shape);
        }
        scene
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.shapes.iter().position(|s| s.id() == id)
    }

    /// Replace the shape with the same identity, or append it.
    pub fn upsert(&mut self, shape: Shape) {
        match self.position(shape.id()) {
            Some(index) => self.shapes[index] = shape,
            None => self.shapes.push(shape),
        }
    }

    /// Remove a shape by identity, returning it if present.
    pub fn remove(&mut self, id: &str) -> Option<Shape> {
        self.position(id).map(|index| self.shapes.remove(index))
    }

    /// All shapes in draw order.
    pub fn all(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn get(&self, id: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Topmost shape whose bounding box contains `point`.
    pub fn shape_at(&self, point: Point, measure: &dyn TextMeasure) -> Option<&Shape> {
        self.shapes
            .iter()
            .rev()
            .find(|s| s.contains(point, measure))
    }

    /// Remove every shape whose outline lies within `tolerance` of `point`,
    /// scanning topmost first. Returns the removed shapes in that order.
    pub fn remove_near(
        &mut self,
        point: Point,
        tolerance: f64,
        measure: &dyn TextMeasure,
    ) -> Vec<Shape> {
        let mut removed = Vec::new();
        for index in (0..self.shapes.len()).rev() {
            if self.shapes[index].near_boundary(point, tolerance, measure) {
                removed.push(self.shapes.remove(index));
            }
        }
        removed
    }
}
