//! Linear undo/redo over full scene snapshots.

use crate::scene::Scene;

/// Undo/redo availability, reported after every history change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryState {
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Snapshot stack with a cursor pointing at the snapshot that matches the
/// live scene.
#[derive(Debug, Clone, Default)]
pub struct History {
    snapshots: Vec<Scene>,
    cursor: usize,
    limit: Option<usize>,
}

impl History {
    /// Create an empty history. Call [`History::save`] once with the initial
    /// scene before any undo can happen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` snapshots, discarding the oldest.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit: limit.map(|l| l.max(1)),
            ..Self::default()
        }
    }

    /// Drop everything after the cursor and push a copy of `scene`.
    pub fn save(&mut self, scene: &Scene) -> HistoryState {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.snapshots.push(scene.clone());
        if let Some(limit) = self.limit {
            let excess = self.snapshots.len().saturating_sub(limit);
            self.snapshots.drain(..excess);
        }
        self.cursor = self.snapshots.len() - 1;
        HistoryState {
            can_undo: self.cursor > 0,
            can_redo: false,
        }
    }

    /// Step back one snapshot. Returns the restored scene and new state, or
    /// `None` when already at the oldest snapshot.
    pub fn undo(&mut self) -> Option<(Scene, HistoryState)> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some((self.snapshots[self.cursor].clone(), self.state()))
    }

    /// Step forward one snapshot. Returns `None` at the newest snapshot.
    pub fn redo(&mut self) -> Option<(Scene, HistoryState)> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        Some((self.snapshots[self.cursor].clone(), self.state()))
    }

    pub fn state(&self) -> HistoryState {
        HistoryState {
            can_undo: self.cursor > 0,
            can_redo: self.cursor + 1 < self.snapshots.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
