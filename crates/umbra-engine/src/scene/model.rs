use super::{ObjectId, SceneError, SceneObject, SceneSnapshot, ShapeKind};

/// The mutable scene: ordered objects, dirty flag and identity counter.
///
/// The scene exclusively owns its objects. Collaborators (tools, gizmos,
/// history) keep [`ObjectId`]s and resolve them with [`Scene::get`] /
/// [`Scene::get_mut`] when needed, since the whole object set can be
/// replaced by [`Scene::restore`].
///
/// Dirty discipline:
/// - every structural or transform mutation sets the flag
/// - only the renderer clears it, after rebuilding its device buffers
#[derive(Debug)]
pub struct Scene {
    objects: Vec<SceneObject>,
    next_id: u32,
    dirty: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates an empty scene. It starts dirty so the first frame renders.
    pub fn new() -> Self {
        Self { objects: Vec::new(), next_id: 0, dirty: true }
    }

    /// Appends an object, assigning an identity if it has none.
    ///
    /// An explicit identity is kept (re-inserting a removed object, restoring
    /// from a tool's copy) and the counter moves past it so it is never handed
    /// out again. `u32::MAX` is never a valid identity: the counter could not
    /// move past it.
    pub fn add(&mut self, mut obj: SceneObject) -> Result<ObjectId, SceneError> {
        let id = match obj.id {
            Some(id) if self.contains(id) => return Err(SceneError::DuplicateId(id)),
            Some(id) => id,
            None => ObjectId(self.next_id),
        };
        let after = id.0.checked_add(1).ok_or(SceneError::IdentitiesExhausted)?;
        self.next_id = self.next_id.max(after);

        obj.id = Some(id);
        self.objects.push(obj);
        self.dirty = true;
        Ok(id)
    }

    /// Removes the object with identity `id`.
    ///
    /// Returns `None` (and leaves the scene untouched) when no such object
    /// exists; callers that need to treat that as an error can.
    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let Some(index) = self.index_of(id) else {
            log::debug!("remove: no object {id} in scene");
            return None;
        };
        let obj = self.objects.remove(index);
        self.dirty = true;
        Some(obj)
    }

    /// Removes every object. Identities are not recycled.
    pub fn clear(&mut self) {
        if !self.objects.is_empty() {
            self.objects.clear();
            self.dirty = true;
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == Some(id))
    }

    /// Mutable access for in-place edits. Marks the scene dirty when the
    /// object exists.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        let index = self.index_of(id)?;
        self.dirty = true;
        Some(&mut self.objects[index])
    }

    #[inline]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.index_of(id).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Identity that the next anonymous [`Scene::add`] will assign.
    #[inline]
    pub fn next_identity(&self) -> ObjectId {
        ObjectId(self.next_id)
    }

    /// All objects in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    /// Objects of one kind, in scene order.
    pub fn iter_of_kind(&self, kind: ShapeKind) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(move |o| o.kind() == kind)
    }

    /// Visits objects of one kind in scene order. The second argument is the
    /// index among objects of that kind.
    pub fn for_each_of_kind<F>(&self, kind: ShapeKind, mut visit: F)
    where
        F: FnMut(&SceneObject, usize),
    {
        for (i, obj) in self.iter_of_kind(kind).enumerate() {
            visit(obj, i);
        }
    }

    pub fn count_of_kind(&self, kind: ShapeKind) -> usize {
        self.iter_of_kind(kind).count()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    // ── snapshots ─────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot { next_identity: self.next_id, objects: self.objects.clone() }
    }

    /// Replaces the whole object set with `snapshot`.
    ///
    /// The snapshot is validated first; on error the scene is unchanged.
    /// Objects without an identity receive fresh ones, and the counter is
    /// raised past the largest identity present. Always marks the scene dirty.
    pub fn restore(&mut self, snapshot: SceneSnapshot) -> Result<(), SceneError> {
        let SceneSnapshot { next_identity, mut objects } = snapshot;

        let mut seen: Vec<ObjectId> = objects.iter().filter_map(|o| o.id).collect();
        seen.sort_unstable();
        if let Some(w) = seen.windows(2).find(|w| w[0] == w[1]) {
            return Err(SceneError::DuplicateId(w[0]));
        }

        let mut next_id = match seen.last() {
            Some(max) => {
                let after = max.0.checked_add(1).ok_or(SceneError::IdentitiesExhausted)?;
                next_identity.max(after)
            }
            None => next_identity,
        };
        for obj in objects.iter_mut().filter(|o| o.id.is_none()) {
            obj.id = Some(ObjectId(next_id));
            next_id = next_id.checked_add(1).ok_or(SceneError::IdentitiesExhausted)?;
        }

        log::debug!("scene restored: {} objects, next identity {}", objects.len(), next_id);
        self.objects = objects;
        self.next_id = next_id;
        self.dirty = true;
        Ok(())
    }

    /// Encodes [`Scene::snapshot`] as JSON.
    pub fn serialize(&self) -> Result<String, SceneError> {
        self.snapshot().to_json()
    }

    /// Decodes a JSON snapshot and [`Scene::restore`]s it.
    pub fn deserialize(&mut self, data: &str) -> Result<(), SceneError> {
        self.restore(SceneSnapshot::from_json(data)?)
    }

    fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec4};

    use super::*;
    use crate::scene::Shape;

    fn rect() -> SceneObject {
        SceneObject::rect(Vec2::new(100.0, 100.0), Vec2::new(50.0, 50.0))
    }

    #[test]
    fn new_scene_is_empty_and_dirty() {
        let scene = Scene::new();
        assert!(scene.is_empty());
        assert!(scene.is_dirty());
        assert_eq!(scene.next_identity(), ObjectId(0));
    }

    #[test]
    fn add_then_remove_leaves_empty_dirty_scene() {
        let mut scene = Scene::new();
        let id = scene.add(rect()).unwrap();
        scene.set_dirty(false);

        let removed = scene.remove(id).unwrap();
        assert_eq!(removed.id, Some(id));
        assert_eq!(scene.len(), 0);
        assert!(scene.is_dirty());
    }

    #[test]
    fn identities_are_never_reused() {
        let mut scene = Scene::new();
        let a = scene.add(rect()).unwrap();
        let b = scene.add(SceneObject::circle(Vec2::ZERO, 4.0)).unwrap();
        assert_eq!((a, b), (ObjectId(0), ObjectId(1)));

        scene.remove(a).unwrap();
        let c = scene.add(rect()).unwrap();
        assert_eq!(c, ObjectId(2));
    }

    #[test]
    fn explicit_identity_is_kept_and_counter_moves_past_it() {
        let mut scene = Scene::new();
        let id = scene.add(rect().with_id(ObjectId(10))).unwrap();
        assert_eq!(id, ObjectId(10));
        assert_eq!(scene.add(rect()).unwrap(), ObjectId(11));
    }

    #[test]
    fn duplicate_identity_rejected() {
        let mut scene = Scene::new();
        let id = scene.add(rect()).unwrap();
        let err = scene.add(rect().with_id(id)).unwrap_err();
        assert!(matches!(err, SceneError::DuplicateId(dup) if dup == id));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn removing_missing_object_is_a_noop() {
        let mut scene = Scene::new();
        scene.add(rect()).unwrap();
        scene.set_dirty(false);

        assert!(scene.remove(ObjectId(42)).is_none());
        assert_eq!(scene.len(), 1);
        assert!(!scene.is_dirty());
    }

    #[test]
    fn get_mut_marks_dirty() {
        let mut scene = Scene::new();
        let id = scene.add(rect()).unwrap();
        scene.set_dirty(false);

        scene.get_mut(id).unwrap().rotation = 45.0;
        assert!(scene.is_dirty());
        assert_eq!(scene.get(id).unwrap().rotation, 45.0);

        scene.set_dirty(false);
        assert!(scene.get_mut(ObjectId(99)).is_none());
        assert!(!scene.is_dirty());
    }

    #[test]
    fn traversal_by_kind_is_filtered_and_ordered() {
        let mut scene = Scene::new();
        scene.add(SceneObject::circle(Vec2::new(1.0, 0.0), 1.0)).unwrap();
        scene.add(rect()).unwrap();
        scene.add(SceneObject::circle(Vec2::new(2.0, 0.0), 2.0)).unwrap();
        scene.add(SceneObject::light(Vec2::ZERO, Vec4::ONE)).unwrap();
        scene.add(SceneObject::circle(Vec2::new(3.0, 0.0), 3.0)).unwrap();

        let mut seen = Vec::new();
        scene.for_each_of_kind(ShapeKind::Circle, |obj, i| seen.push((i, obj.position.x)));
        assert_eq!(seen, vec![(0, 1.0), (1, 2.0), (2, 3.0)]);
        assert_eq!(scene.count_of_kind(ShapeKind::Rect), 1);
        assert_eq!(scene.count_of_kind(ShapeKind::Light), 1);
    }

    #[test]
    fn serialize_round_trip() {
        let mut scene = Scene::new();
        scene.add(rect().with_rotation(12.5).with_scale(Vec2::new(0.3, 1.7))).unwrap();
        let gone = scene.add(SceneObject::circle(Vec2::new(-4.25, 9.0), 0.1)).unwrap();
        scene.add(SceneObject::light(Vec2::new(90.0, 90.0), Vec4::new(2.7, 1.3, 5.9, 1.0))).unwrap();
        scene.remove(gone).unwrap();

        let blob = scene.serialize().unwrap();
        let mut other = Scene::new();
        other.set_dirty(false);
        other.deserialize(&blob).unwrap();

        assert_eq!(other.snapshot(), scene.snapshot());
        assert_eq!(other.next_identity(), ObjectId(3));
        assert!(other.is_dirty());
    }

    #[test]
    fn restore_repairs_stale_counter_and_fills_missing_ids() {
        let mut scene = Scene::new();
        scene
            .restore(SceneSnapshot {
                next_identity: 0,
                objects: vec![rect().with_id(ObjectId(5)), rect()],
            })
            .unwrap();
        let ids: Vec<_> = scene.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![Some(ObjectId(5)), Some(ObjectId(6))]);
        assert_eq!(scene.add(rect()).unwrap(), ObjectId(7));
    }

    #[test]
    fn restore_with_duplicates_leaves_scene_untouched() {
        let mut scene = Scene::new();
        scene.add(SceneObject::circle(Vec2::ZERO, 1.0)).unwrap();
        let before = scene.snapshot();

        let err = scene
            .restore(SceneSnapshot {
                next_identity: 9,
                objects: vec![rect().with_id(ObjectId(1)), rect().with_id(ObjectId(1))],
            })
            .unwrap_err();
        assert!(matches!(err, SceneError::DuplicateId(ObjectId(1))));
        assert_eq!(scene.snapshot(), before);
    }

    #[test]
    fn restore_never_hands_out_the_last_identity_twice() {
        let mut scene = Scene::new();
        scene.add(rect()).unwrap();
        let before = scene.snapshot();

        let err = scene
            .restore(SceneSnapshot {
                next_identity: 0,
                objects: vec![
                    SceneObject::circle(Vec2::ZERO, 1.0).with_id(ObjectId(u32::MAX)),
                    SceneObject::circle(Vec2::ZERO, 1.0),
                ],
            })
            .unwrap_err();
        assert!(matches!(err, SceneError::IdentitiesExhausted));
        assert_eq!(scene.snapshot(), before);
    }

    #[test]
    fn exhausted_counter_rejects_anonymous_adds() {
        let mut scene = Scene::new();
        scene
            .restore(SceneSnapshot {
                next_identity: u32::MAX - 1,
                objects: vec![rect()],
            })
            .unwrap();
        assert_eq!(scene.iter().next().and_then(|o| o.id), Some(ObjectId(u32::MAX - 1)));
        assert_eq!(scene.next_identity(), ObjectId(u32::MAX));

        scene.set_dirty(false);
        assert!(matches!(scene.add(rect()), Err(SceneError::IdentitiesExhausted)));
        assert!(matches!(scene.add(rect().with_id(ObjectId(u32::MAX))), Err(SceneError::IdentitiesExhausted)));
        assert_eq!(scene.len(), 1);
        assert!(!scene.is_dirty());
    }

    #[test]
    fn in_place_shape_edit() {
        let mut scene = Scene::new();
        let id = scene.add(SceneObject::circle(Vec2::ZERO, 1.0)).unwrap();
        if let Shape::Circle { radius } = &mut scene.get_mut(id).unwrap().shape {
            *radius = 8.0;
        }
        assert_eq!(scene.get(id).unwrap().shape, Shape::Circle { radius: 8.0 });
    }
}
