use super::{Scene, SceneError, SceneSnapshot};

/// Snapshot-based undo/redo for a [`Scene`].
///
/// Call [`SceneHistory::record`] right before a modification. Undo and redo
/// swap whole snapshots, so any identity held across them must be re-resolved
/// with [`Scene::get`]; a `None` there means the selection was lost.
#[derive(Debug, Default)]
pub struct SceneHistory {
    undo: Vec<SceneSnapshot>,
    redo: Vec<SceneSnapshot>,
    limit: Option<usize>,
}

impl SceneHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `limit` undo steps; the oldest are discarded first.
    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit), ..Self::default() }
    }

    /// Saves the current state as an undo step and invalidates redo.
    pub fn record(&mut self, scene: &Scene) {
        self.redo.clear();
        self.undo.push(scene.snapshot());
        if let Some(limit) = self.limit
            && self.undo.len() > limit
        {
            let excess = self.undo.len() - limit;
            self.undo.drain(..excess);
        }
    }

    /// Restores the previous state. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self, scene: &mut Scene) -> Result<bool, SceneError> {
        let Some(previous) = self.undo.pop() else {
            return Ok(false);
        };
        self.redo.push(scene.snapshot());
        scene.restore(previous)?;
        Ok(true)
    }

    /// Re-applies the last undone state. Returns `false` when there is nothing to redo.
    pub fn redo(&mut self, scene: &mut Scene) -> Result<bool, SceneError> {
        let Some(next) = self.redo.pop() else {
            return Ok(false);
        };
        self.undo.push(scene.snapshot());
        scene.restore(next)?;
        Ok(true)
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::scene::{ObjectId, SceneObject};

    #[test]
    fn undo_redo_add() {
        let mut scene = Scene::new();
        let mut history = SceneHistory::new();

        history.record(&scene);
        let id = scene.add(SceneObject::circle(Vec2::new(5.0, 5.0), 3.0)).unwrap();

        scene.set_dirty(false);
        assert!(history.undo(&mut scene).unwrap());
        assert!(scene.is_empty());
        assert!(scene.is_dirty());
        // Selection held by identity is gone after undo.
        assert!(scene.get(id).is_none());

        assert!(history.redo(&mut scene).unwrap());
        assert_eq!(scene.get(id).unwrap().position, Vec2::new(5.0, 5.0));
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_restores_identity_counter() {
        let mut scene = Scene::new();
        let mut history = SceneHistory::new();

        history.record(&scene);
        scene.add(SceneObject::circle(Vec2::ZERO, 1.0)).unwrap();
        history.undo(&mut scene).unwrap();

        assert_eq!(scene.next_identity(), ObjectId(0));
    }

    #[test]
    fn record_clears_redo() {
        let mut scene = Scene::new();
        let mut history = SceneHistory::new();
        history.record(&scene);
        scene.add(SceneObject::circle(Vec2::ZERO, 1.0)).unwrap();
        history.undo(&mut scene).unwrap();
        assert!(history.can_redo());

        history.record(&scene);
        assert!(!history.can_redo());
    }

    #[test]
    fn empty_history_is_a_noop() {
        let mut scene = Scene::new();
        let mut history = SceneHistory::new();
        assert!(!history.undo(&mut scene).unwrap());
        assert!(!history.redo(&mut scene).unwrap());
    }

    #[test]
    fn limit_drops_oldest() {
        let mut scene = Scene::new();
        let mut history = SceneHistory::with_limit(2);
        for i in 0..4 {
            history.record(&scene);
            scene.add(SceneObject::circle(Vec2::splat(i as f32), 1.0)).unwrap();
        }
        assert!(history.undo(&mut scene).unwrap());
        assert!(history.undo(&mut scene).unwrap());
        assert!(!history.undo(&mut scene).unwrap());
        assert_eq!(scene.len(), 2);
    }
}
