//! Scene → device record marshaling.
//!
//! Each kind with a device slot (rects, circles, lights) is packed into a
//! dense byte array of `capacity × stride` bytes, objects in scene order, each
//! record laid out per [`RecordLayouts`]. The live count travels alongside so
//! the consuming pass only iterates the live prefix.

use super::error::CapacityError;
use super::records::{RecordLayouts, write_f32s, write_mat3, write_vec2, write_vec4};
use crate::scene::{Scene, SceneObject, Shape, ShapeKind};

/// What happens when a kind has more live objects than its slot holds.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum OverflowPolicy {
    /// Capacity doubles until everything fits; the device buffer is reallocated.
    #[default]
    Grow,
    /// The first `capacity` objects are written, the rest are reported dropped.
    Truncate,
    /// Packing fails with [`CapacityError`] and no slot is touched.
    Reject,
}

/// CPU staging area of one device slot.
#[derive(Debug)]
pub struct ShapeSlot {
    kind: ShapeKind,
    stride: usize,
    capacity: usize,
    data: Vec<u8>,
    live: usize,

    /// Set while the slot keeps overflowing; warnings are emitted once per episode.
    overflowing: bool,
}

impl ShapeSlot {
    /// Capacity is at least one record so the device binding is never empty.
    pub fn new(kind: ShapeKind, stride: usize, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            kind,
            stride,
            capacity,
            data: vec![0; capacity * stride],
            live: 0,
            overflowing: false,
        }
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records written by the last pack.
    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }

    /// Size of the device buffer backing this slot.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Bytes of the live records; the only part that needs uploading.
    #[inline]
    pub fn live_bytes(&self) -> &[u8] {
        &self.data[..self.live * self.stride]
    }

    /// Grows capacity to the next power of two holding `needed` records.
    /// Returns whether the slot was reallocated.
    fn reserve(&mut self, needed: usize) -> bool {
        if needed <= self.capacity {
            return false;
        }
        self.capacity = needed.next_power_of_two();
        self.data.resize(self.capacity * self.stride, 0);
        log::debug!("{} slot grown to {} records", self.kind, self.capacity);
        true
    }

    fn note_overflow(&mut self, live: usize, dropped: usize) {
        if dropped == 0 {
            self.overflowing = false;
            return;
        }
        if !self.overflowing {
            log::warn!(
                "{} slot holds {} records; {} of {} objects are not rendered",
                self.kind,
                self.capacity,
                dropped,
                live
            );
            self.overflowing = true;
        }
    }
}

/// Outcome of packing one slot.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SlotReport {
    /// Records written.
    pub written: usize,
    /// Live objects that did not fit (Truncate only).
    pub dropped: usize,
    /// The slot was reallocated (Grow only); its device buffer must be too.
    pub grown: bool,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct MarshalReport {
    pub rects: SlotReport,
    pub circles: SlotReport,
    pub lights: SlotReport,
}

impl MarshalReport {
    pub fn get(&self, kind: ShapeKind) -> SlotReport {
        match kind {
            ShapeKind::Rect => self.rects,
            ShapeKind::Circle => self.circles,
            ShapeKind::Light => self.lights,
        }
    }

    pub fn dropped(&self) -> usize {
        self.rects.dropped + self.circles.dropped + self.lights.dropped
    }
}

/// Slot capacities, in records.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SlotCapacities {
    pub rects: usize,
    pub circles: usize,
    pub lights: usize,
}

/// Packs a [`Scene`] into per-kind staging slots.
#[derive(Debug)]
pub struct Marshaler {
    layouts: RecordLayouts,
    policy: OverflowPolicy,
    rects: ShapeSlot,
    circles: ShapeSlot,
    lights: ShapeSlot,
}

impl Marshaler {
    pub fn new(layouts: RecordLayouts, capacities: SlotCapacities, policy: OverflowPolicy) -> Self {
        Self {
            rects: ShapeSlot::new(ShapeKind::Rect, layouts.rect.stride, capacities.rects),
            circles: ShapeSlot::new(ShapeKind::Circle, layouts.circle.stride, capacities.circles),
            lights: ShapeSlot::new(ShapeKind::Light, layouts.light.stride, capacities.lights),
            layouts,
            policy,
        }
    }

    #[inline]
    pub fn layouts(&self) -> &RecordLayouts {
        &self.layouts
    }

    #[inline]
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn slot(&self, kind: ShapeKind) -> &ShapeSlot {
        match kind {
            ShapeKind::Rect => &self.rects,
            ShapeKind::Circle => &self.circles,
            ShapeKind::Light => &self.lights,
        }
    }

    /// Packs every slot from `scene`.
    ///
    /// Under [`OverflowPolicy::Reject`] all kinds are checked before anything
    /// is written, so an error leaves every slot as it was.
    pub fn pack(&mut self, scene: &Scene) -> Result<MarshalReport, CapacityError> {
        if self.policy == OverflowPolicy::Reject {
            for kind in ShapeKind::ALL {
                let live = scene.count_of_kind(kind);
                let capacity = self.slot(kind).capacity;
                if live > capacity {
                    return Err(CapacityError { kind, live, capacity });
                }
            }
        }

        Ok(MarshalReport {
            rects: pack_slot(&self.layouts, self.policy, &mut self.rects, scene),
            circles: pack_slot(&self.layouts, self.policy, &mut self.circles, scene),
            lights: pack_slot(&self.layouts, self.policy, &mut self.lights, scene),
        })
    }
}

fn pack_slot(
    layouts: &RecordLayouts,
    policy: OverflowPolicy,
    slot: &mut ShapeSlot,
    scene: &Scene,
) -> SlotReport {
    let live = scene.count_of_kind(slot.kind);
    let grown = policy == OverflowPolicy::Grow && slot.reserve(live);

    let written = live.min(slot.capacity);
    let dropped = live - written;
    slot.note_overflow(live, dropped);

    let stride = slot.stride;
    let data = &mut slot.data[..written * stride];
    data.fill(0);
    for (obj, record) in scene.iter_of_kind(slot.kind).zip(data.chunks_exact_mut(stride)) {
        write_record(layouts, obj, record);
    }
    slot.live = written;

    SlotReport { written, dropped, grown }
}

/// Writes one object's record into `out` (exactly one stride long).
fn write_record(layouts: &RecordLayouts, obj: &SceneObject, out: &mut [u8]) {
    match &obj.shape {
        Shape::Rect { size } => {
            write_mat3(out, layouts.rect.inv_transform, obj.inverse_transform());
            write_vec2(out, layouts.rect.size, *size);
        }
        Shape::Circle { radius } => {
            write_mat3(out, layouts.circle.inv_transform, obj.inverse_transform());
            write_f32s(out, layouts.circle.radius, &[*radius]);
        }
        Shape::Light { color } => {
            // Scaling a light scales its intensity, not its footprint.
            let k = obj.scale.x.max(obj.scale.y);
            let scaled = (color.truncate() * k).extend(color.w);
            write_vec4(out, layouts.light.color, scaled);
            write_vec2(out, layouts.light.position, obj.position);
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat3, Vec2, Vec4};

    use super::*;

    fn f32_at(bytes: &[u8], offset: usize) -> f32 {
        f32::from_ne_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    }

    fn marshaler(capacity: usize, policy: OverflowPolicy) -> Marshaler {
        let caps = SlotCapacities { rects: capacity, circles: capacity, lights: capacity };
        Marshaler::new(RecordLayouts::builtin().unwrap(), caps, policy)
    }

    fn scene_with_circles(n: usize) -> Scene {
        let mut scene = Scene::new();
        for i in 0..n {
            scene.add(SceneObject::circle(Vec2::new(i as f32, 0.0), 1.0 + i as f32)).unwrap();
        }
        scene
    }

    #[test]
    fn exactly_capacity_fills_slot() {
        let mut m = marshaler(4, OverflowPolicy::Truncate);
        let report = m.pack(&scene_with_circles(4)).unwrap();

        let slot = m.slot(ShapeKind::Circle);
        assert_eq!(report.circles, SlotReport { written: 4, dropped: 0, grown: false });
        assert_eq!(slot.live(), 4);
        assert_eq!(slot.live_bytes().len(), slot.byte_len());
        let radius = m.layouts().circle.radius.offset;
        assert_eq!(f32_at(slot.live_bytes(), 3 * slot.stride() + radius), 4.0);
    }

    #[test]
    fn overflow_grows_by_default() {
        let mut m = marshaler(4, OverflowPolicy::default());
        let report = m.pack(&scene_with_circles(5)).unwrap();

        let slot = m.slot(ShapeKind::Circle);
        assert!(report.circles.grown);
        assert_eq!(report.circles.written, 5);
        assert_eq!(slot.capacity(), 8);
        assert_eq!(slot.byte_len(), 8 * slot.stride());

        // Second pack fits without another reallocation.
        let report = m.pack(&scene_with_circles(5)).unwrap();
        assert!(!report.circles.grown);
    }

    #[test]
    fn overflow_truncates_and_reports() {
        let mut m = marshaler(4, OverflowPolicy::Truncate);
        let report = m.pack(&scene_with_circles(5)).unwrap();

        let slot = m.slot(ShapeKind::Circle);
        assert_eq!(report.circles, SlotReport { written: 4, dropped: 1, grown: false });
        assert_eq!(report.dropped(), 1);
        assert_eq!(slot.capacity(), 4);
        assert_eq!(slot.byte_len(), 4 * slot.stride());
        assert_eq!(slot.live_bytes().len(), slot.byte_len());
    }

    #[test]
    fn overflow_rejects_without_touching_slots() {
        let mut m = marshaler(4, OverflowPolicy::Reject);
        let mut scene = scene_with_circles(2);
        m.pack(&scene).unwrap();
        let before = m.slot(ShapeKind::Circle).live_bytes().to_vec();

        for _ in 0..3 {
            scene.add(SceneObject::circle(Vec2::ZERO, 9.0)).unwrap();
        }
        let err = m.pack(&scene).unwrap_err();
        assert_eq!(err, CapacityError { kind: ShapeKind::Circle, live: 5, capacity: 4 });
        assert_eq!(m.slot(ShapeKind::Circle).live(), 2);
        assert_eq!(m.slot(ShapeKind::Circle).live_bytes(), &before[..]);
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let m = marshaler(0, OverflowPolicy::Truncate);
        for kind in ShapeKind::ALL {
            assert_eq!(m.slot(kind).capacity(), 1);
        }
    }

    #[test]
    fn rect_record_offsets() {
        let mut m = marshaler(2, OverflowPolicy::Grow);
        let mut scene = Scene::new();
        scene.add(SceneObject::circle(Vec2::ZERO, 1.0)).unwrap();
        scene.add(SceneObject::rect(Vec2::new(100.0, 100.0), Vec2::new(50.0, 30.0))).unwrap();
        m.pack(&scene).unwrap();

        let layout = m.layouts().rect;
        let bytes = m.slot(ShapeKind::Rect).live_bytes();
        assert_eq!(bytes.len(), 64);

        // Inverse of a pure translation by (100, 100).
        let inv = Mat3::from_translation(Vec2::new(-100.0, -100.0));
        let col2 = layout.inv_transform.offset + 2 * layout.inv_transform.column_stride;
        assert_eq!(f32_at(bytes, col2), inv.z_axis.x);
        assert_eq!(f32_at(bytes, col2 + 4), inv.z_axis.y);
        assert_eq!(f32_at(bytes, layout.size.offset), 50.0);
        assert_eq!(f32_at(bytes, layout.size.offset + 4), 30.0);
    }

    #[test]
    fn light_intensity_scales_with_max_scale() {
        let mut m = marshaler(1, OverflowPolicy::Grow);
        let mut scene = Scene::new();
        scene
            .add(
                SceneObject::light(Vec2::new(90.0, 40.0), Vec4::new(1.0, 2.0, 3.0, 0.5))
                    .with_scale(Vec2::new(0.5, 2.0)),
            )
            .unwrap();
        m.pack(&scene).unwrap();

        let layout = m.layouts().light;
        let bytes = m.slot(ShapeKind::Light).live_bytes();
        let color: Vec<f32> = (0..4).map(|i| f32_at(bytes, layout.color.offset + i * 4)).collect();
        assert_eq!(color, vec![2.0, 4.0, 6.0, 0.5]);
        assert_eq!(f32_at(bytes, layout.position.offset), 90.0);
        assert_eq!(f32_at(bytes, layout.position.offset + 4), 40.0);
    }

    #[test]
    fn removed_objects_shrink_live_prefix() {
        let mut m = marshaler(8, OverflowPolicy::Grow);
        let mut scene = scene_with_circles(3);
        m.pack(&scene).unwrap();
        assert_eq!(m.slot(ShapeKind::Circle).live(), 3);

        let first = scene.iter().next().and_then(|o| o.id).unwrap();
        scene.remove(first).unwrap();
        m.pack(&scene).unwrap();

        let slot = m.slot(ShapeKind::Circle);
        assert_eq!(slot.live(), 2);
        let radius = m.layouts().circle.radius.offset;
        assert_eq!(f32_at(slot.live_bytes(), radius), 2.0);
    }
}
